//! Delete command implementation.

use super::{open_service, print_json};
use crate::cli::DeleteArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::model::IssueFields;

/// Execute the delete command.
///
/// # Errors
///
/// Returns `could not delete` for a malformed or unknown id, or an error if
/// the store cannot be opened.
pub fn execute(args: &DeleteArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut service = open_service(cli)?;
    let receipt = service.delete(&args.project, &IssueFields::with_id(args.id.clone()))?;

    if json {
        print_json(&receipt)?;
    } else {
        println!("{} {}", receipt.result, receipt.id);
    }
    Ok(())
}
