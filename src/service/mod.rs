//! Issue lifecycle logic.
//!
//! `IssueService` owns the validation and merge rules for the four
//! operations and delegates persistence to an injected `IssueStore`.

use crate::error::{DeskError, Mutation, Result};
use crate::model::{Issue, IssueField, IssueFields, IssueFilter, MutationReceipt, parse_open};
use crate::storage::IssueStore;
use crate::util::id::{IdGenerator, ObjectId, generate_id_seed};
use crate::util::time::{next_update_stamp, now_millis};
use tracing::{debug, info, warn};

const REQUIRED: [IssueField; 3] = [
    IssueField::IssueTitle,
    IssueField::IssueText,
    IssueField::CreatedBy,
];

/// Create, list, update and delete issues scoped to a project.
#[derive(Debug)]
pub struct IssueService<S> {
    store: S,
    ids: IdGenerator,
}

impl<S: IssueStore> IssueService<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            ids: IdGenerator::new(),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Create a new open issue.
    ///
    /// # Errors
    ///
    /// Returns `RequiredFieldsMissing` if any of `issue_title`, `issue_text`,
    /// `created_by` is absent or blank; storage errors propagate.
    pub fn create(&mut self, project: &str, fields: &IssueFields) -> Result<Issue> {
        debug!(project, "create");

        let (Some(title), Some(text), Some(creator)) = (
            fields.supplied(REQUIRED[0]),
            fields.supplied(REQUIRED[1]),
            fields.supplied(REQUIRED[2]),
        ) else {
            debug!(project, "create rejected: required field(s) missing");
            return Err(DeskError::RequiredFieldsMissing);
        };

        let now = now_millis();
        let seed = generate_id_seed(project, title, text, creator, now);
        let store = &self.store;
        let id = self
            .ids
            .generate(&seed, now, |candidate| store.contains(project, candidate))?;

        let issue = Issue {
            issue_title: title.to_string(),
            issue_text: text.to_string(),
            created_on: now,
            updated_on: now,
            created_by: creator.to_string(),
            assigned_to: fields
                .supplied(IssueField::AssignedTo)
                .unwrap_or_default()
                .to_string(),
            open: true,
            status_text: fields
                .supplied(IssueField::StatusText)
                .unwrap_or_default()
                .to_string(),
            id,
        };

        self.store.insert(project, &issue)?;
        info!(project, id = %issue.id, "created issue");
        Ok(issue)
    }

    /// Records matching every filter, in insertion order.
    ///
    /// # Errors
    ///
    /// Storage errors propagate.
    pub fn list(&self, project: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        debug!(project, ?filter, "list");
        if filter.is_unsatisfiable() {
            debug!(project, "filter can never match; skipping store");
            return Ok(Vec::new());
        }
        self.store.find(project, filter)
    }

    /// Merge the supplied mutable fields into an existing record.
    ///
    /// # Errors
    ///
    /// `MissingId`, `NoUpdateFields`, or `LookupFailed` for every failure
    /// past validation, including storage errors.
    pub fn update(&mut self, project: &str, fields: &IssueFields) -> Result<MutationReceipt> {
        debug!(project, "update");
        let raw_id = fields.supplied(IssueField::Id).ok_or(DeskError::MissingId)?;
        if !fields.has_update_fields() {
            return Err(DeskError::NoUpdateFields);
        }
        let Some(id) = ObjectId::parse(raw_id) else {
            return Err(collapse(Mutation::Update, raw_id, "malformed id"));
        };

        match self.apply_update(project, &id, fields) {
            Ok(true) => {
                info!(project, %id, "updated issue");
                Ok(MutationReceipt::updated(id))
            }
            Ok(false) => Err(collapse(Mutation::Update, raw_id, "no such record")),
            Err(err) => Err(collapse(Mutation::Update, raw_id, err)),
        }
    }

    fn apply_update(&mut self, project: &str, id: &ObjectId, fields: &IssueFields) -> Result<bool> {
        let Some(mut issue) = self.store.get(project, id)? else {
            return Ok(false);
        };

        for field in IssueField::ALL.into_iter().filter(|f| f.is_mutable()) {
            let Some(value) = fields.supplied(field) else {
                continue;
            };
            match field {
                IssueField::IssueTitle => issue.issue_title = value.to_string(),
                IssueField::IssueText => issue.issue_text = value.to_string(),
                IssueField::AssignedTo => issue.assigned_to = value.to_string(),
                IssueField::StatusText => issue.status_text = value.to_string(),
                IssueField::Open => {
                    issue.open = parse_open(value).ok_or_else(|| {
                        DeskError::invalid_request(format!("open must be true or false, got '{value}'"))
                    })?;
                }
                _ => {}
            }
        }
        issue.updated_on = next_update_stamp(issue.updated_on, now_millis());

        self.store.replace(project, &issue)
    }

    /// Hard-delete one record.
    ///
    /// # Errors
    ///
    /// `MissingId`, or `LookupFailed` for a malformed id, an absent record,
    /// or a storage error.
    pub fn delete(&mut self, project: &str, fields: &IssueFields) -> Result<MutationReceipt> {
        debug!(project, "delete");
        let raw_id = fields.supplied(IssueField::Id).ok_or(DeskError::MissingId)?;
        let Some(id) = ObjectId::parse(raw_id) else {
            return Err(collapse(Mutation::Delete, raw_id, "malformed id"));
        };

        match self.store.remove(project, &id) {
            Ok(true) => {
                info!(project, %id, "deleted issue");
                Ok(MutationReceipt::deleted(id))
            }
            Ok(false) => Err(collapse(Mutation::Delete, raw_id, "no such record")),
            Err(err) => Err(collapse(Mutation::Delete, raw_id, err)),
        }
    }

    /// Known project names in order of first write.
    ///
    /// # Errors
    ///
    /// Storage errors propagate.
    pub fn projects(&self) -> Result<Vec<String>> {
        self.store.projects()
    }
}

fn collapse(op: Mutation, id: &str, detail: impl std::fmt::Display) -> DeskError {
    let err = DeskError::lookup_failed(op, id, detail);
    if let DeskError::LookupFailed { detail, .. } = &err {
        warn!(%op, id, detail = %detail, "lookup failed");
    }
    err
}
