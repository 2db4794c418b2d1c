//! List filters.
//!
//! A filter is a set of equality constraints combined with AND. Filters
//! arrive as text (query strings, CLI flags) and are normalized into
//! `FilterTerm`s, which every store evaluates the same way.

use super::{Issue, IssueField, parse_open};
use crate::util::id::ObjectId;
use crate::util::time::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Equality filters for a list request.
///
/// Keys that name no issue attribute are collected in `unsupported`; a
/// filter with any of them matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IssueFilter {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub issue_title: Option<String>,
    #[serde(default)]
    pub issue_text: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub open: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
    #[serde(flatten)]
    pub unsupported: BTreeMap<String, String>,
}

/// A normalized equality constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterTerm {
    /// `_id` equals this id.
    Id(ObjectId),
    /// A text attribute equals this value exactly.
    Text(IssueField, String),
    /// `open` equals this flag.
    Open(bool),
    /// A timestamp attribute equals this instant.
    ///
    /// Only whole milliseconds; finer stamps become `Never`, since no
    /// stored record carries them.
    Stamp(IssueField, DateTime<Utc>),
    /// A constraint no record can satisfy.
    Never,
}

impl FilterTerm {
    /// Does the record satisfy this term?
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        match self {
            Self::Id(id) => issue.id == *id,
            Self::Text(field, value) => issue.text_of(*field) == Some(value.as_str()),
            Self::Open(open) => issue.open == *open,
            Self::Stamp(IssueField::CreatedOn, at) => issue.created_on == *at,
            Self::Stamp(IssueField::UpdatedOn, at) => issue.updated_on == *at,
            Self::Stamp(..) | Self::Never => false,
        }
    }
}

impl IssueFilter {
    /// Build a filter from `key=value` pairs.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            filter.set(key.into(), value.into());
        }
        filter
    }

    /// Set one constraint; later values for the same key win.
    pub fn set(&mut self, key: String, value: String) {
        let Ok(field) = key.parse::<IssueField>() else {
            self.unsupported.insert(key, value);
            return;
        };
        let slot = match field {
            IssueField::Id => &mut self.id,
            IssueField::IssueTitle => &mut self.issue_title,
            IssueField::IssueText => &mut self.issue_text,
            IssueField::CreatedBy => &mut self.created_by,
            IssueField::AssignedTo => &mut self.assigned_to,
            IssueField::StatusText => &mut self.status_text,
            IssueField::Open => &mut self.open,
            IssueField::CreatedOn => &mut self.created_on,
            IssueField::UpdatedOn => &mut self.updated_on,
        };
        *slot = Some(value);
    }

    /// No constraints at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unsupported.is_empty() && self.constrained().next().is_none()
    }

    fn constrained(&self) -> impl Iterator<Item = (IssueField, &str)> {
        [
            (IssueField::Id, &self.id),
            (IssueField::IssueTitle, &self.issue_title),
            (IssueField::IssueText, &self.issue_text),
            (IssueField::CreatedBy, &self.created_by),
            (IssueField::AssignedTo, &self.assigned_to),
            (IssueField::StatusText, &self.status_text),
            (IssueField::Open, &self.open),
            (IssueField::CreatedOn, &self.created_on),
            (IssueField::UpdatedOn, &self.updated_on),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
    }

    /// Normalize into terms, in attribute order.
    #[must_use]
    pub fn terms(&self) -> Vec<FilterTerm> {
        let mut terms: Vec<FilterTerm> = self
            .constrained()
            .map(|(field, value)| match field {
                IssueField::Id => ObjectId::parse(value).map_or(FilterTerm::Never, FilterTerm::Id),
                IssueField::Open => parse_open(value).map_or(FilterTerm::Never, FilterTerm::Open),
                IssueField::CreatedOn | IssueField::UpdatedOn => parse_timestamp(value)
                    .filter(|at| at.timestamp_subsec_nanos() % 1_000_000 == 0)
                    .map_or(FilterTerm::Never, |at| FilterTerm::Stamp(field, at)),
                _ => FilterTerm::Text(field, value.to_string()),
            })
            .collect();
        if !self.unsupported.is_empty() {
            terms.push(FilterTerm::Never);
        }
        terms
    }

    /// True when no record can ever match.
    #[must_use]
    pub fn is_unsatisfiable(&self) -> bool {
        self.terms().contains(&FilterTerm::Never)
    }

    /// Does the record satisfy every constraint?
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        self.terms().iter().all(|term| term.matches(issue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::time::now_millis;

    fn issue(title: &str, text: &str, open: bool) -> Issue {
        let now = now_millis();
        Issue {
            issue_title: title.to_string(),
            issue_text: text.to_string(),
            created_on: now,
            updated_on: now,
            created_by: "tester".to_string(),
            assigned_to: String::new(),
            open,
            status_text: String::new(),
            id: ObjectId::parse("642330a2046cbee7a8a106b7").unwrap(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = IssueFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&issue("a", "b", true)));
    }

    #[test]
    fn all_keys_must_match() {
        let filter = IssueFilter::from_pairs([("issue_title", "test"), ("issue_text", "testing")]);
        assert!(filter.matches(&issue("test", "testing", true)));
        assert!(!filter.matches(&issue("test", "other", true)));
        assert!(!filter.matches(&issue("other", "testing", true)));
    }

    #[test]
    fn open_filter_parses_text() {
        let closed = issue("a", "b", false);
        assert!(IssueFilter::from_pairs([("open", "false")]).matches(&closed));
        assert!(!IssueFilter::from_pairs([("open", "true")]).matches(&closed));
        assert!(!IssueFilter::from_pairs([("open", "nah")]).matches(&closed));
    }

    #[test]
    fn unknown_keys_match_nothing() {
        let filter = IssueFilter::from_pairs([("priority", "high")]);
        assert!(!filter.is_empty());
        assert!(filter.is_unsatisfiable());
        assert!(!filter.matches(&issue("a", "b", true)));
    }

    #[test]
    fn id_and_timestamp_filters() {
        let record = issue("a", "b", true);
        let by_id = IssueFilter::from_pairs([("_id", "642330a2046cbee7a8a106b7")]);
        assert!(by_id.matches(&record));
        let malformed = IssueFilter::from_pairs([("_id", "642330a2")]);
        assert!(malformed.is_unsatisfiable());

        let stamp = crate::util::time::format_millis(&record.created_on);
        assert!(IssueFilter::from_pairs([("created_on", stamp.as_str())]).matches(&record));
    }

    #[test]
    fn sub_millisecond_stamps_match_nothing() {
        let record = issue("a", "b", true);
        let stamp = crate::util::time::format_millis(&record.created_on);
        let finer = stamp.replace('Z', "4Z");
        let filter = IssueFilter::from_pairs([("created_on", finer.as_str())]);
        assert!(filter.is_unsatisfiable());
        assert!(!filter.matches(&record));

        let padded = stamp.replace('Z', "000Z");
        assert!(IssueFilter::from_pairs([("created_on", padded.as_str())]).matches(&record));
    }

    #[test]
    fn empty_value_is_an_equality_constraint() {
        let filter = IssueFilter::from_pairs([("assigned_to", "")]);
        assert!(filter.matches(&issue("a", "b", true)));
        let mut assigned = issue("a", "b", true);
        assigned.assigned_to = "DOM".to_string();
        assert!(!filter.matches(&assigned));
    }

    #[test]
    fn decodes_from_query_strings() {
        let filter: IssueFilter =
            serde_urlencoded::from_str("issue_title=test&issue_text=testing&sort=asc").unwrap();
        assert_eq!(filter.issue_title.as_deref(), Some("test"));
        assert_eq!(filter.unsupported.get("sort").map(String::as_str), Some("asc"));
    }
}
