//! Persistence collaborators.
//!
//! The service talks to storage only through `IssueStore`, a project-scoped
//! collection interface. Two implementations ship:
//!
//! - `SqliteStore` - durable, one database file holding every project
//! - `MemoryStore` - in-process, for tests and throwaway servers

mod memory;
pub mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::{Issue, IssueFilter};
use crate::util::id::ObjectId;

/// A store of issue records partitioned by project name.
///
/// Every method acts on exactly one project's collection. Unknown projects
/// behave as empty collections; the first insert creates one. Each call is
/// atomic on its own; no method spans more than one record write.
pub trait IssueStore {
    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the id is already taken.
    fn insert(&mut self, project: &str, issue: &Issue) -> Result<()>;

    /// Records matching every filter term, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn find(&self, project: &str, filter: &IssueFilter) -> Result<Vec<Issue>>;

    /// Fetch one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn get(&self, project: &str, id: &ObjectId) -> Result<Option<Issue>>;

    /// Overwrite the record with the same id. Returns `false` if it is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn replace(&mut self, project: &str, issue: &Issue) -> Result<bool>;

    /// Remove a record. Returns `false` if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn remove(&mut self, project: &str, id: &ObjectId) -> Result<bool>;

    /// Number of records in a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn count(&self, project: &str) -> Result<usize>;

    /// Project names in order of first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn projects(&self) -> Result<Vec<String>>;

    /// Is the id taken within the project?
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn contains(&self, project: &str, id: &ObjectId) -> Result<bool> {
        Ok(self.get(project, id)?.is_some())
    }
}

impl<T: IssueStore + ?Sized> IssueStore for Box<T> {
    fn insert(&mut self, project: &str, issue: &Issue) -> Result<()> {
        (**self).insert(project, issue)
    }

    fn find(&self, project: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        (**self).find(project, filter)
    }

    fn get(&self, project: &str, id: &ObjectId) -> Result<Option<Issue>> {
        (**self).get(project, id)
    }

    fn replace(&mut self, project: &str, issue: &Issue) -> Result<bool> {
        (**self).replace(project, issue)
    }

    fn remove(&mut self, project: &str, id: &ObjectId) -> Result<bool> {
        (**self).remove(project, id)
    }

    fn count(&self, project: &str) -> Result<usize> {
        (**self).count(project)
    }

    fn projects(&self) -> Result<Vec<String>> {
        (**self).projects()
    }

    fn contains(&self, project: &str, id: &ObjectId) -> Result<bool> {
        (**self).contains(project, id)
    }
}
