//! Update command implementation.

use super::{open_service, print_json};
use crate::cli::UpdateArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::model::IssueFields;

/// Execute the update command.
///
/// # Errors
///
/// Returns the service's business errors (`no update field(s) sent`,
/// `could not update`) or an error if the store cannot be opened.
pub fn execute(args: &UpdateArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut service = open_service(cli)?;
    let receipt = service.update(&args.project, &update_fields(args))?;

    if json {
        print_json(&receipt)?;
    } else {
        println!("{} {}", receipt.result, receipt.id);
    }
    Ok(())
}

/// Map CLI arguments onto an update request.
#[must_use]
pub fn update_fields(args: &UpdateArgs) -> IssueFields {
    let open = if args.close {
        Some("false".to_string())
    } else if args.reopen {
        Some("true".to_string())
    } else {
        None
    };
    IssueFields {
        issue_title: args.title.clone(),
        issue_text: args.text.clone(),
        assigned_to: args.assigned_to.clone(),
        status_text: args.status_text.clone(),
        open,
        ..IssueFields::with_id(args.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_maps_to_open_false() {
        let args = UpdateArgs {
            project: "p".to_string(),
            id: "6423308a046cbee7a8a106b1".to_string(),
            close: true,
            ..UpdateArgs::default()
        };
        let fields = update_fields(&args);
        assert_eq!(fields.open.as_deref(), Some("false"));
        assert!(fields.has_update_fields());
    }

    #[test]
    fn bare_id_sends_nothing() {
        let args = UpdateArgs {
            project: "p".to_string(),
            id: "6423308a046cbee7a8a106b1".to_string(),
            ..UpdateArgs::default()
        };
        assert!(!update_fields(&args).has_update_fields());
    }
}
