//! Create command implementation.

use super::{open_service, print_json};
use crate::cli::CreateArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::model::{Issue, IssueFields};
use crate::service::IssueService;
use crate::storage::IssueStore;

/// Execute the create command.
///
/// # Errors
///
/// Returns `RequiredFieldsMissing` for blank title, text or reporter, or an
/// error if the store cannot be opened or written.
pub fn execute(args: &CreateArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut service = open_service(cli)?;
    let issue = create(&mut service, args)?;

    if json {
        print_json(&issue)?;
    } else {
        println!("Created {}: {}", issue.id, issue.issue_title);
    }
    Ok(())
}

/// Map CLI arguments onto a create request.
///
/// # Errors
///
/// Propagates service errors.
pub fn create<S: IssueStore>(service: &mut IssueService<S>, args: &CreateArgs) -> Result<Issue> {
    let fields = IssueFields {
        issue_title: args.title.clone(),
        issue_text: args.text.clone(),
        created_by: args.created_by.clone(),
        assigned_to: args.assigned_to.clone(),
        status_text: args.status_text.clone(),
        ..IssueFields::default()
    };
    service.create(&args.project, &fields)
}
