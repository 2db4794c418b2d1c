//! Shared utilities for `issue_desk`.
//!
//! - Record id codec and generation
//! - Millisecond timestamps

pub mod id;
pub mod time;

pub use id::{IdGenerator, ObjectId, generate_id_seed, is_valid_id_format};
pub use time::{format_millis, next_update_stamp, now_millis, parse_timestamp};
