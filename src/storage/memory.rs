//! In-memory storage implementation.

use crate::error::{DeskError, Result};
use crate::model::{Issue, IssueFilter};
use crate::storage::IssueStore;
use crate::util::id::ObjectId;
use std::collections::HashMap;

/// Vector-per-project store; vectors keep insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Issue>>,
    order: Vec<String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, project: &str) -> &[Issue] {
        self.collections.get(project).map(Vec::as_slice).unwrap_or_default()
    }
}

impl IssueStore for MemoryStore {
    fn insert(&mut self, project: &str, issue: &Issue) -> Result<()> {
        if self.collection(project).iter().any(|i| i.id == issue.id) {
            return Err(DeskError::Storage(format!(
                "duplicate id {} in project '{project}'",
                issue.id
            )));
        }
        if !self.collections.contains_key(project) {
            self.order.push(project.to_string());
        }
        self.collections
            .entry(project.to_string())
            .or_default()
            .push(issue.clone());
        Ok(())
    }

    fn find(&self, project: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let terms = filter.terms();
        Ok(self
            .collection(project)
            .iter()
            .filter(|issue| terms.iter().all(|term| term.matches(issue)))
            .cloned()
            .collect())
    }

    fn get(&self, project: &str, id: &ObjectId) -> Result<Option<Issue>> {
        Ok(self
            .collection(project)
            .iter()
            .find(|issue| issue.id == *id)
            .cloned())
    }

    fn replace(&mut self, project: &str, issue: &Issue) -> Result<bool> {
        let Some(slot) = self
            .collections
            .get_mut(project)
            .and_then(|issues| issues.iter_mut().find(|i| i.id == issue.id))
        else {
            return Ok(false);
        };
        *slot = issue.clone();
        Ok(true)
    }

    fn remove(&mut self, project: &str, id: &ObjectId) -> Result<bool> {
        let Some(issues) = self.collections.get_mut(project) else {
            return Ok(false);
        };
        let before = issues.len();
        issues.retain(|issue| issue.id != *id);
        Ok(issues.len() < before)
    }

    fn count(&self, project: &str) -> Result<usize> {
        Ok(self.collection(project).len())
    }

    fn projects(&self) -> Result<Vec<String>> {
        Ok(self.order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::time::now_millis;

    fn make_issue(id: &str, title: &str) -> Issue {
        let now = now_millis();
        Issue {
            issue_title: title.to_string(),
            issue_text: "text".to_string(),
            created_on: now,
            updated_on: now,
            created_by: "tester".to_string(),
            assigned_to: String::new(),
            open: true,
            status_text: String::new(),
            id: ObjectId::parse(id).unwrap(),
        }
    }

    #[test]
    fn projects_are_isolated() {
        let mut store = MemoryStore::new();
        let issue = make_issue("000000000000000000000001", "a");
        store.insert("alpha", &issue).unwrap();

        assert_eq!(store.count("alpha").unwrap(), 1);
        assert_eq!(store.count("beta").unwrap(), 0);
        assert!(store.get("beta", &issue.id).unwrap().is_none());
        assert!(!store.remove("beta", &issue.id).unwrap());
        assert_eq!(store.projects().unwrap(), vec!["alpha".to_string()]);
    }

    #[test]
    fn find_keeps_insertion_order() {
        let mut store = MemoryStore::new();
        for (n, title) in ["c", "a", "b"].iter().enumerate() {
            let id = format!("{:024x}", n + 1);
            store.insert("p", &make_issue(&id, title)).unwrap();
        }
        let titles: Vec<String> = store
            .find("p", &IssueFilter::default())
            .unwrap()
            .into_iter()
            .map(|i| i.issue_title)
            .collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }

    #[test]
    fn duplicate_ids_rejected_within_project_only() {
        let mut store = MemoryStore::new();
        let issue = make_issue("000000000000000000000001", "a");
        store.insert("p", &issue).unwrap();
        assert!(store.insert("p", &issue).is_err());
        store.insert("q", &issue).unwrap();
    }

    #[test]
    fn replace_and_remove_report_presence() {
        let mut store = MemoryStore::new();
        let mut issue = make_issue("000000000000000000000001", "a");
        assert!(!store.replace("p", &issue).unwrap());
        store.insert("p", &issue).unwrap();
        issue.issue_title = "b".to_string();
        assert!(store.replace("p", &issue).unwrap());
        assert_eq!(store.get("p", &issue.id).unwrap().unwrap().issue_title, "b");
        assert!(store.remove("p", &issue.id).unwrap());
        assert!(!store.remove("p", &issue.id).unwrap());
    }
}
