//! Projects command implementation.

use super::{open_service, print_json};
use crate::config::CliOverrides;
use crate::error::Result;

/// Execute the projects command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or read.
pub fn execute(json: bool, cli: &CliOverrides) -> Result<()> {
    let service = open_service(cli)?;
    let projects = service.projects()?;

    if json {
        return print_json(&projects);
    }
    for project in &projects {
        println!("{project}");
    }
    Ok(())
}
