//! Core data types for `issue_desk`.
//!
//! - `Issue` - the stored record
//! - `IssueField` - the recognized attribute names
//! - `IssueFields` - the field map a create/update/delete request carries
//! - `IssueFilter` - the equality filters a list request carries
//! - `MutationReceipt` - the body returned by a successful update/delete

mod filter;

pub use filter::{FilterTerm, IssueFilter};

use crate::util::id::ObjectId;
use crate::util::time::millis;
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An issue record.
///
/// Field order follows the wire format clients already consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_title: String,
    pub issue_text: String,
    #[serde(with = "millis")]
    pub created_on: DateTime<Utc>,
    #[serde(with = "millis")]
    pub updated_on: DateTime<Utc>,
    pub created_by: String,
    pub assigned_to: String,
    pub open: bool,
    pub status_text: String,
    #[serde(rename = "_id")]
    pub id: ObjectId,
}

impl Issue {
    /// Textual value of an attribute, as a filter would compare it.
    #[must_use]
    pub fn text_of(&self, field: IssueField) -> Option<&str> {
        match field {
            IssueField::IssueTitle => Some(&self.issue_title),
            IssueField::IssueText => Some(&self.issue_text),
            IssueField::CreatedBy => Some(&self.created_by),
            IssueField::AssignedTo => Some(&self.assigned_to),
            IssueField::StatusText => Some(&self.status_text),
            IssueField::Id => Some(self.id.as_str()),
            IssueField::Open | IssueField::CreatedOn | IssueField::UpdatedOn => None,
        }
    }
}

/// Recognized issue attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueField {
    Id,
    IssueTitle,
    IssueText,
    CreatedBy,
    AssignedTo,
    StatusText,
    Open,
    CreatedOn,
    UpdatedOn,
}

impl IssueField {
    pub const ALL: [Self; 9] = [
        Self::Id,
        Self::IssueTitle,
        Self::IssueText,
        Self::CreatedBy,
        Self::AssignedTo,
        Self::StatusText,
        Self::Open,
        Self::CreatedOn,
        Self::UpdatedOn,
    ];

    /// Wire name, which is also the storage column name (except `_id`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "_id",
            Self::IssueTitle => "issue_title",
            Self::IssueText => "issue_text",
            Self::CreatedBy => "created_by",
            Self::AssignedTo => "assigned_to",
            Self::StatusText => "status_text",
            Self::Open => "open",
            Self::CreatedOn => "created_on",
            Self::UpdatedOn => "updated_on",
        }
    }

    /// Fields an update may overwrite.
    #[must_use]
    pub const fn is_mutable(self) -> bool {
        matches!(
            self,
            Self::IssueTitle | Self::IssueText | Self::AssignedTo | Self::StatusText | Self::Open
        )
    }
}

impl fmt::Display for IssueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

/// The field map carried by create, update and delete requests.
///
/// Every recognized key is enumerated; anything else in a request body is
/// ignored. Values may arrive as strings, booleans or numbers and are kept
/// as text. An empty (or all-whitespace) value counts as not supplied.
///
/// | key | create | update |
/// |---|---|---|
/// | `_id` | ignored | required |
/// | `issue_title`, `issue_text` | required | merged |
/// | `created_by` | required | never merged |
/// | `assigned_to`, `status_text` | default `""` | merged |
/// | `open` | ignored, always `true` | merged (`true`/`false`) |
/// | `created_on`, `updated_on` | ignored | never merged |
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IssueFields {
    #[serde(rename = "_id", default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub issue_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub issue_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_by: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub open: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_on: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub updated_on: Option<String>,
}

impl IssueFields {
    /// Field map carrying only an id, as a delete request does.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// The raw value of a field.
    #[must_use]
    pub fn raw(&self, field: IssueField) -> Option<&str> {
        let value = match field {
            IssueField::Id => &self.id,
            IssueField::IssueTitle => &self.issue_title,
            IssueField::IssueText => &self.issue_text,
            IssueField::CreatedBy => &self.created_by,
            IssueField::AssignedTo => &self.assigned_to,
            IssueField::StatusText => &self.status_text,
            IssueField::Open => &self.open,
            IssueField::CreatedOn => &self.created_on,
            IssueField::UpdatedOn => &self.updated_on,
        };
        value.as_deref()
    }

    /// The value of a field if it was supplied non-empty.
    #[must_use]
    pub fn supplied(&self, field: IssueField) -> Option<&str> {
        self.raw(field).filter(|value| !value.trim().is_empty())
    }

    /// Does anything besides `_id` carry a value?
    #[must_use]
    pub fn has_update_fields(&self) -> bool {
        IssueField::ALL
            .into_iter()
            .filter(|field| *field != IssueField::Id)
            .any(|field| self.supplied(field).is_some())
    }
}

/// Body of a successful update or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReceipt {
    pub result: String,
    #[serde(rename = "_id")]
    pub id: ObjectId,
}

impl MutationReceipt {
    pub const UPDATED: &'static str = "successfully updated";
    pub const DELETED: &'static str = "successfully deleted";

    #[must_use]
    pub fn updated(id: ObjectId) -> Self {
        Self {
            result: Self::UPDATED.to_string(),
            id,
        }
    }

    #[must_use]
    pub fn deleted(id: ObjectId) -> Self {
        Self {
            result: Self::DELETED.to_string(),
            id,
        }
    }
}

/// Parse the textual forms of `open`.
#[must_use]
pub fn parse_open(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Accept a string, boolean, number or null and keep it as optional text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, boolean, number or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_issue() -> Issue {
        let at = Utc.with_ymd_and_hms(2023, 3, 28, 18, 23, 6).unwrap()
            + chrono::Duration::milliseconds(930);
        Issue {
            issue_title: "get".to_string(),
            issue_text: "issue".to_string(),
            created_on: at,
            updated_on: at,
            created_by: "mushu".to_string(),
            assigned_to: String::new(),
            open: true,
            status_text: String::new(),
            id: ObjectId::parse("6423308a046cbee7a8a106b1").unwrap(),
        }
    }

    #[test]
    fn issue_serializes_in_wire_format() {
        let json = serde_json::to_value(sample_issue()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "issue_title": "get",
                "issue_text": "issue",
                "created_on": "2023-03-28T18:23:06.930Z",
                "updated_on": "2023-03-28T18:23:06.930Z",
                "created_by": "mushu",
                "assigned_to": "",
                "open": true,
                "status_text": "",
                "_id": "6423308a046cbee7a8a106b1",
            })
        );
    }

    #[test]
    fn fields_accept_mixed_json_types_and_ignore_unknown_keys() {
        let fields: IssueFields = serde_json::from_str(
            r#"{"_id": "abc", "open": false, "issue_text": 42, "assigned_to": null, "color": "red"}"#,
        )
        .unwrap();
        assert_eq!(fields.id.as_deref(), Some("abc"));
        assert_eq!(fields.open.as_deref(), Some("false"));
        assert_eq!(fields.issue_text.as_deref(), Some("42"));
        assert_eq!(fields.assigned_to, None);
    }

    #[test]
    fn fields_decode_from_form_bodies() {
        let fields: IssueFields =
            serde_urlencoded::from_str("_id=6423308a046cbee7a8a106b1&open=false&issue_title=")
                .unwrap();
        assert_eq!(fields.id.as_deref(), Some("6423308a046cbee7a8a106b1"));
        assert_eq!(fields.open.as_deref(), Some("false"));
        assert_eq!(fields.issue_title.as_deref(), Some(""));
    }

    #[test]
    fn empty_and_blank_values_are_not_supplied() {
        let fields = IssueFields {
            id: Some("x".to_string()),
            issue_title: Some(String::new()),
            status_text: Some("   ".to_string()),
            ..IssueFields::default()
        };
        assert_eq!(fields.supplied(IssueField::IssueTitle), None);
        assert_eq!(fields.supplied(IssueField::StatusText), None);
        assert!(!fields.has_update_fields());

        let fields = IssueFields {
            assigned_to: Some("DOM".to_string()),
            ..IssueFields::with_id("x")
        };
        assert!(fields.has_update_fields());
    }

    #[test]
    fn field_names_round_trip() {
        for field in IssueField::ALL {
            assert_eq!(field.as_str().parse::<IssueField>(), Ok(field));
        }
        assert!("color".parse::<IssueField>().is_err());
        assert!(!IssueField::CreatedBy.is_mutable());
        assert!(IssueField::Open.is_mutable());
    }

    #[test]
    fn receipt_wire_format() {
        let id = ObjectId::parse("642336fd43e6adf6c43d8fd1").unwrap();
        let json = serde_json::to_value(MutationReceipt::updated(id)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"result": "successfully updated", "_id": "642336fd43e6adf6c43d8fd1"})
        );
    }

    #[test]
    fn open_parsing() {
        assert_eq!(parse_open("false"), Some(false));
        assert_eq!(parse_open("TRUE"), Some(true));
        assert_eq!(parse_open("0"), Some(false));
        assert_eq!(parse_open("maybe"), None);
    }
}
