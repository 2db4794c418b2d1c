//! List command implementation.

use super::{open_service, print_json};
use crate::cli::ListArgs;
use crate::config::CliOverrides;
use crate::error::{DeskError, Result};
use crate::model::{Issue, IssueField, IssueFilter};

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if a `--filter` is not `key=value` or the store fails.
pub fn execute(args: &ListArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let filter = build_filter(args)?;
    let service = open_service(cli)?;
    let issues = service.list(&args.project, &filter)?;

    if json {
        return print_json(&issues);
    }
    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }
    for issue in &issues {
        println!("{}", format_issue_line(issue));
    }
    Ok(())
}

/// Merge `--filter` pairs and the typed flags; typed flags win.
///
/// # Errors
///
/// Returns `InvalidRequest` for a pair without `=`.
pub fn build_filter(args: &ListArgs) -> Result<IssueFilter> {
    let mut filter = IssueFilter::default();
    for raw in &args.filters {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| DeskError::invalid_request(format!("filter '{raw}' is not key=value")))?;
        filter.set(key.trim().to_string(), value.to_string());
    }

    let typed = [
        (IssueField::Id, &args.id),
        (IssueField::IssueTitle, &args.title),
        (IssueField::IssueText, &args.text),
        (IssueField::CreatedBy, &args.created_by),
        (IssueField::AssignedTo, &args.assigned_to),
        (IssueField::StatusText, &args.status_text),
        (IssueField::Open, &args.open),
    ];
    for (field, value) in typed {
        if let Some(value) = value {
            filter.set(field.as_str().to_string(), value.clone());
        }
    }
    Ok(filter)
}

fn format_issue_line(issue: &Issue) -> String {
    let state = if issue.open { "open" } else { "closed" };
    let mut line = format!(
        "{} [{state}] {} (by {}",
        issue.id, issue.issue_title, issue.created_by
    );
    if !issue.assigned_to.is_empty() {
        line.push_str(", assigned to ");
        line.push_str(&issue.assigned_to);
    }
    line.push(')');
    if !issue.status_text.is_empty() {
        line.push_str(" - ");
        line.push_str(&issue.status_text);
    }
    line
}
