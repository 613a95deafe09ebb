//! Commands installed by well-known Wolfi/Alpine packages.
//!
//! A static knowledge base, not derived from any live system. Coverage is
//! limited to packages commonly found in minimal images.

use std::collections::HashSet;

use phf::phf_map;

pub static PACKAGE_PROVIDES: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "busybox" => &[
        "sh", "ash",
        "cat", "cp", "mv", "rm", "ln", "ls", "mkdir", "rmdir", "touch",
        "chmod", "chown", "chgrp", "stat", "readlink", "realpath",
        "find", "xargs", "file",
        "grep", "egrep", "fgrep", "sed", "awk", "cut", "sort", "uniq",
        "head", "tail", "wc", "tr", "tee", "comm", "diff", "patch",
        "tar", "gzip", "gunzip", "zcat", "bzip2", "bunzip2", "bzcat",
        "xz", "unxz", "xzcat",
        "wget", "nc", "netstat", "hostname", "ip", "ifconfig", "route",
        "ping", "traceroute", "nslookup",
        "ps", "kill", "killall", "pgrep", "pkill", "nice", "nohup",
        "timeout", "watch",
        "uname", "uptime", "free", "df", "du", "mount", "umount",
        "id", "whoami", "groups", "date", "cal",
        "env", "printenv", "which", "dirname", "basename", "expr",
        "seq", "sleep", "true", "false", "yes", "nproc",
        "vi", "less", "more",
        "md5sum", "sha256sum", "sha512sum", "base64", "od", "hexdump",
        "strings", "mktemp", "sync", "logger",
    ],
    "coreutils" => &[
        "cat", "cp", "mv", "rm", "ln", "ls", "mkdir", "rmdir", "touch",
        "chmod", "chown", "chgrp", "stat", "readlink", "realpath",
        "cut", "sort", "uniq", "head", "tail", "wc", "tr", "tee",
        "comm", "diff", "df", "du", "date", "env", "printenv",
        "dirname", "basename", "expr", "seq", "sleep", "true", "false",
        "yes", "nproc", "md5sum", "sha256sum", "sha512sum", "base64",
        "od", "mktemp", "sync", "id", "whoami", "groups", "uname",
        "nice", "nohup", "timeout", "install", "shred", "truncate",
        "numfmt", "factor", "expand", "unexpand", "fold", "fmt",
        "join", "paste", "split", "csplit", "nl", "pr", "ptx",
        "stty", "tty",
    ],

    // shells
    "bash" => &["bash"],
    "dash" => &["dash"],

    // text
    "grep" => &["grep", "egrep", "fgrep"],
    "gawk" => &["awk", "gawk"],
    "mawk" => &["awk", "mawk"],
    "sed" => &["sed"],
    "diffutils" => &["diff", "diff3", "sdiff", "cmp"],

    // network
    "curl" => &["curl"],
    "wget" => &["wget"],
    "bind-tools" => &["dig", "nslookup", "host", "nsupdate"],
    "iputils" => &["ping", "ping6", "tracepath", "clockdiff", "arping"],
    "iproute2" => &["ip", "ss", "tc", "bridge", "devlink", "rtmon"],
    "net-tools" => &["netstat", "ifconfig", "route", "arp", "hostname"],
    "netcat-openbsd" => &["nc", "netcat"],
    "socat" => &["socat"],
    "openssh" => &["ssh", "scp", "sftp", "ssh-keygen", "ssh-keyscan"],
    "openssh-client" => &["ssh", "scp", "sftp", "ssh-keygen", "ssh-keyscan"],
    "rsync" => &["rsync"],

    // compression and archives
    "gzip" => &["gzip", "gunzip", "zcat"],
    "bzip2" => &["bzip2", "bunzip2", "bzcat"],
    "xz" => &["xz", "unxz", "xzcat", "lzma", "unlzma"],
    "zstd" => &["zstd", "unzstd", "zstdcat", "zstdmt"],
    "zip" => &["zip"],
    "unzip" => &["unzip"],
    "tar" => &["tar"],
    "cpio" => &["cpio"],

    // system
    "procps" => &[
        "ps", "top", "free", "vmstat", "pgrep", "pkill", "pidof", "watch", "sysctl", "uptime", "w",
    ],
    "psmisc" => &["killall", "fuser", "pstree", "peekfd"],
    "util-linux" => &[
        "mount", "umount", "fdisk", "mkfs", "fsck", "lsblk", "blkid", "findmnt", "losetup",
        "swapon", "swapoff",
    ],
    "shadow" => &[
        "useradd", "userdel", "usermod", "groupadd", "groupdel", "groupmod", "passwd", "chpasswd",
    ],

    // languages
    "python3" => &["python3", "python"],
    "python-3.11" => &["python3.11"],
    "python-3.12" => &["python3.12"],
    "python-3.13" => &["python3.13"],
    "perl" => &["perl"],
    "ruby" => &["ruby", "irb", "gem"],
    "nodejs" => &["node", "npm", "npx"],

    // build tools
    "git" => &["git"],
    "make" => &["make"],
    "cmake" => &["cmake", "ctest", "cpack"],
    "gcc" => &["gcc", "g++", "cpp"],
    "clang" => &["clang", "clang++"],
    "go" => &["go", "gofmt"],

    // data
    "jq" => &["jq"],
    "yq" => &["yq"],
    "postgresql-client" => &["psql", "pg_dump", "pg_restore", "pg_isready"],
    "postgresql-16-client" => &["psql", "pg_dump", "pg_restore", "pg_isready"],
    "mysql-client" => &["mysql", "mysqldump", "mysqladmin"],
    "mariadb-client" => &["mysql", "mariadb", "mysqldump", "mariadb-dump"],
    "redis" => &["redis-cli", "redis-server", "redis-benchmark"],
    "valkey" => &["valkey-cli", "valkey-server", "valkey-benchmark"],
    "valkey-cli" => &["valkey-cli"],

    // containers and cloud
    "kubectl" => &["kubectl"],
    "helm" => &["helm"],
    "docker-cli" => &["docker"],
    "podman" => &["podman"],
    "skopeo" => &["skopeo"],
    "crane" => &["crane", "gcrane"],
    "aws-cli" => &["aws"],
    "aws-cli-v2" => &["aws"],
    "gcloud" => &["gcloud", "gsutil", "bq"],
    "azure-cli" => &["az"],

    // misc
    "file" => &["file"],
    "findutils" => &["find", "xargs", "locate", "updatedb"],
    "which" => &["which"],
    "tree" => &["tree"],
    "less" => &["less"],
    "vim" => &["vim", "vi"],
    "nano" => &["nano"],
    "openssl" => &["openssl"],
    "ca-certificates" => &[],
    "posix-libc-utils" => &["getent", "iconv", "locale", "localedef"],
};

/// Commands available once all `packages` are installed.
///
/// Unknown package names contribute nothing.
pub fn resolve_commands<S: AsRef<str>>(packages: &[S]) -> HashSet<&'static str> {
    packages
        .iter()
        .filter_map(|p| PACKAGE_PROVIDES.get(p.as_ref()))
        .flat_map(|cmds| cmds.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_commands_union() {
        let cmds = resolve_commands(&["grep", "curl"]);
        assert!(cmds.contains("egrep"));
        assert!(cmds.contains("curl"));
        assert!(!cmds.contains("jq"));
    }

    #[test]
    fn test_unknown_and_empty_packages() {
        assert!(resolve_commands(&["no-such-package"]).is_empty());
        assert!(resolve_commands(&["ca-certificates"]).is_empty());
        assert!(resolve_commands::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_busybox_lacks_gnu_only_tools() {
        let cmds = resolve_commands(&["busybox"]);
        assert!(cmds.contains("realpath"));
        assert!(!cmds.contains("install"));
        assert!(resolve_commands(&["coreutils"]).contains("install"));
    }
}
