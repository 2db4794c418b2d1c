//! Record identifiers.
//!
//! An id is a 24-character lowercase hexadecimal token: 8 hex digits of
//! the creation time in seconds followed by 16 hex digits taken from a
//! SHA-256 digest of the record seed. The codec half of this module only
//! checks syntax; whether a record with that id exists is the store's
//! business.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write as _};
use std::str::FromStr;

/// Length of every well-formed id.
pub const ID_LEN: usize = 24;

/// A syntactically valid record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse an externally supplied id.
    ///
    /// Returns `None` for anything that is not exactly 24 hex digits.
    /// Upper-case digits are accepted and normalized to lower case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != ID_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(raw.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creation time encoded in the leading 8 hex digits.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = u32::from_str_radix(&self.0[..8], 16).ok()?;
        DateTime::from_timestamp(i64::from(secs), 0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid id '{s}'"))
    }
}

impl TryFrom<String> for ObjectId {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// Check if a string is a well-formed id.
#[must_use]
pub fn is_valid_id_format(raw: &str) -> bool {
    ObjectId::parse(raw).is_some()
}

/// ID generator that produces unique record ids.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generate a candidate id for the given seed and nonce.
    #[must_use]
    pub fn generate_candidate(&self, seed: &str, created_at: DateTime<Utc>, nonce: u32) -> ObjectId {
        // Timestamps outside the u32 range wrap; only the hash half carries entropy.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let secs = created_at.timestamp() as u32;
        let mut id = format!("{secs:08x}");
        id.push_str(&compute_id_hash(&format!("{seed}|{nonce}")));
        ObjectId(id)
    }

    /// Generate an id, re-drawing while `exists` reports a collision.
    ///
    /// # Errors
    ///
    /// Returns an error if the existence check fails.
    pub fn generate<F>(&self, seed: &str, created_at: DateTime<Utc>, mut exists: F) -> Result<ObjectId>
    where
        F: FnMut(&ObjectId) -> Result<bool>,
    {
        let mut nonce = 0u32;
        loop {
            let id = self.generate_candidate(seed, created_at, nonce);
            if !exists(&id)? {
                return Ok(id);
            }
            tracing::debug!(id = %id, nonce, "id collision, re-drawing");
            nonce = nonce.wrapping_add(1);
        }
    }
}

/// Build the seed string for id generation.
///
/// Inputs: `project | title | text | creator | created_at (ns)`
#[must_use]
pub fn generate_id_seed(
    project: &str,
    title: &str,
    text: &str,
    creator: &str,
    created_at: DateTime<Utc>,
) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        project,
        title,
        text,
        creator,
        created_at.timestamp_nanos_opt().unwrap_or(0)
    )
}

/// Hex-encode the first 8 bytes of the SHA-256 digest of `input`.
#[must_use]
pub fn compute_id_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();

    let mut out = String::with_capacity(16);
    for byte in result.iter().take(8) {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
