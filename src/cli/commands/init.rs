//! Init command implementation.

use crate::config;
use crate::error::Result;
use serde_json::json;
use std::path::Path;

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the workspace exists (without `force`) or cannot be
/// created.
pub fn execute(force: bool, root_dir: Option<&Path>, json: bool) -> Result<()> {
    let base_dir = root_dir.unwrap_or_else(|| Path::new("."));
    let dir = config::init_workspace(base_dir, force)?;

    if json {
        super::print_json(&json!({ "path": dir.display().to_string() }))?;
    } else {
        println!("Initialized issue desk workspace in {}", dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CONFIG_FILENAME, WORKSPACE_DIR_NAME};
    use crate::error::DeskError;
    use tempfile::TempDir;

    #[test]
    fn creates_workspace_once() {
        let temp = TempDir::new().expect("tempdir");
        execute(false, Some(temp.path()), false).unwrap();
        assert!(temp.path().join(WORKSPACE_DIR_NAME).join(CONFIG_FILENAME).is_file());

        let err = execute(false, Some(temp.path()), true).unwrap_err();
        assert!(matches!(err, DeskError::AlreadyInitialized { .. }));
        execute(true, Some(temp.path()), true).unwrap();
    }
}
