//! Cross-referencing dependencies against a target system.
//!
//! - `provider`: BusyBox vs coreutils resolution on a search path
//! - `missing`: unsatisfied dependencies (search path, package set, image tree)
//! - `provides`: static package to command table

pub mod missing;
pub mod provider;
pub mod provides;

pub use missing::{find_missing_commands, find_missing_in_path, find_missing_in_tree};
pub use provider::{filter_by_provider, has_gnu_coreutils, resolve_provider, Provider, ProviderInfo};
pub use provides::{resolve_commands, PACKAGE_PROVIDES};
