//! shelldeps CLI entry point.

use std::io::{self, Write};

use clap::Parser;
use shelldeps::cli::{self, Cli, Commands, EXIT_ERROR};
use shelldeps::logging;

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = match &cli.command {
        Commands::Show(args) => cli::run_show(args, cli.json, &mut out),
        Commands::Scan(args) => cli::run_scan(args, cli.json, &mut out),
        Commands::Check(args) => cli::run_check(args, cli.json, &mut out),
        Commands::CheckPackage(args) => cli::run_check_package(args, cli.json, &mut out),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    let _ = out.flush();
    std::process::exit(exit_code);
}
