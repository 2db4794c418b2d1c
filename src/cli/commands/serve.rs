//! Serve command implementation.

use crate::cli::ServeArgs;
use crate::config::{CliOverrides, DeskConfig, StoreKind};
use crate::error::Result;
use crate::server;
use crate::service::IssueService;
use tracing::info;

/// Execute the serve command.
///
/// Blocks until Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the store cannot be opened,
/// or the listen address cannot be bound.
pub fn execute(args: &ServeArgs, cli: &CliOverrides) -> Result<()> {
    let mut overrides = cli.clone();
    if args.listen.is_some() {
        overrides.listen = args.listen;
    }
    if args.memory {
        overrides.store = Some(StoreKind::Memory);
    }

    let config = DeskConfig::load(&overrides)?;
    let service = IssueService::new(config.open_store()?);
    info!(store = %config.store, "starting server");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::run(config.listen, service))
}
