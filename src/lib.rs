//! `issue_desk` - a project-scoped issue tracker.
//!
//! Clients create, list, update and delete issue records grouped under a
//! free-form project name, over HTTP (`desk serve`) or from the CLI.
//! Records persist in `SQLite` by default.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod server;
pub mod service;
pub mod storage;
pub mod util;

pub use error::{DeskError, ErrorCode, Result, StructuredError};
pub use model::{Issue, IssueFields, IssueFilter, MutationReceipt};
pub use service::IssueService;
