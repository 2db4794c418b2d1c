//! One module per subcommand.
//!
//! Commands share one way of reaching the store (`open_service`) and one way
//! of printing JSON (`print_json`), so `--json` output matches the HTTP API
//! body for body.

pub mod create;
pub mod delete;
pub mod init;
pub mod list;
pub mod projects;
pub mod serve;
pub mod update;
pub mod version;

use crate::config::{CliOverrides, DeskConfig};
use crate::error::Result;
use crate::service::IssueService;
use crate::storage::IssueStore;
use serde::Serialize;

/// The service type every command works against.
pub type DynService = IssueService<Box<dyn IssueStore + Send>>;

/// Resolve configuration and open the configured store.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the store cannot be opened.
pub fn open_service(cli: &CliOverrides) -> Result<DynService> {
    let config = DeskConfig::load(cli)?;
    Ok(IssueService::new(config.open_store()?))
}

/// Print a value as a single JSON line on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string(value)?;
    println!("{payload}");
    Ok(())
}
