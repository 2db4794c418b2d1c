//! Configuration management for `issue_desk`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`ISSUE_DESK_*`)
//! 3. Project config (.issue_desk/config.yaml)
//! 4. User config (~/.config/issue_desk/config.yaml)
//! 5. Defaults

use crate::error::{DeskError, Result};
use crate::storage::{IssueStore, MemoryStore, SqliteStore};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Name of the workspace directory.
pub const WORKSPACE_DIR_NAME: &str = ".issue_desk";
/// Config file inside the workspace (and the user config dir).
pub const CONFIG_FILENAME: &str = "config.yaml";
/// Database file created by `init`.
pub const DEFAULT_DB_FILENAME: &str = "issues.db";
/// Environment variable that pins the workspace directory.
pub const DIR_ENV_VAR: &str = "ISSUE_DESK_DIR";

const ENV_PREFIX: &str = "ISSUE_DESK_";
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

const CONFIG_TEMPLATE: &str = "\
# issue desk configuration
#
# db: .issue_desk/issues.db
# lock-timeout: 30000
# listen: 127.0.0.1:3000
# store: sqlite
";

/// Which `IssueStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Sqlite,
    Memory,
}

impl StoreKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreKind {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(DeskError::Config(format!(
                "unknown store '{other}' (expected sqlite or memory)"
            ))),
        }
    }
}

/// Discover the active `.issue_desk` directory.
///
/// Honors `ISSUE_DESK_DIR` when set, otherwise walks up from `start` (or CWD).
///
/// # Errors
///
/// Returns `NotInitialized` if no workspace is found, or an I/O error if the
/// CWD cannot be read.
pub fn discover_workspace_dir(start: Option<&Path>) -> Result<PathBuf> {
    let env_override = env::var(DIR_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from);
    discover_workspace_dir_with_env(start, env_override.as_deref())
}

fn discover_workspace_dir_with_env(
    start: Option<&Path>,
    env_override: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = env_override {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
    }

    let mut current = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };

    loop {
        let candidate = current.join(WORKSPACE_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            break;
        }
    }

    Err(DeskError::NotInitialized)
}

/// Create the workspace directory under `root`.
///
/// Writes a commented `config.yaml` and creates the database. With `force`,
/// an existing workspace is reused and its config rewritten; the database
/// and its records are kept.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the workspace exists and `force` is off,
/// or an error if files cannot be written.
pub fn init_workspace(root: &Path, force: bool) -> Result<PathBuf> {
    let dir = root.join(WORKSPACE_DIR_NAME);
    if dir.exists() && !force {
        return Err(DeskError::AlreadyInitialized { path: dir });
    }

    fs::create_dir_all(&dir)?;
    fs::write(dir.join(CONFIG_FILENAME), CONFIG_TEMPLATE)?;
    SqliteStore::open(&dir.join(DEFAULT_DB_FILENAME))?;
    debug!(path = %dir.display(), "initialized workspace");
    Ok(dir)
}

/// A flat map of config keys to raw values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        let mut flat = HashMap::new();
        flatten_yaml(&value, "", &mut flat);

        let mut layer = Self::default();
        for (key, value) in flat {
            layer.set(&key, value);
        }
        Ok(layer)
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from `ISSUE_DESK_*` pairs; other names are skipped.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if key == DIR_ENV_VAR {
                continue;
            }
            layer.set(stripped, value);
        }
        layer
    }

    /// Insert a value under its normalized key.
    pub fn set(&mut self, key: &str, value: String) {
        self.values.insert(normalize_key(key), value);
    }

    /// Look up a value by key (any spelling).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&normalize_key(key))
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub lock_timeout: Option<u64>,
    pub listen: Option<SocketAddr>,
    pub store: Option<StoreKind>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.db {
            layer.set("db", path.to_string_lossy().to_string());
        }
        if let Some(lock_timeout) = self.lock_timeout {
            layer.set("lock-timeout", lock_timeout.to_string());
        }
        if let Some(listen) = self.listen {
            layer.set("listen", listen.to_string());
        }
        if let Some(store) = self.store {
            layer.set("store", store.to_string());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.set("lock-timeout", DEFAULT_LOCK_TIMEOUT_MS.to_string());
    layer.set("listen", DEFAULT_LISTEN.to_string());
    layer.set("store", StoreKind::default().to_string());
    layer
}

/// Load project config (.issue_desk/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(workspace_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&workspace_dir.join(CONFIG_FILENAME))
}

/// Load user config (~/.config/issue_desk/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("issue_desk")
        .join(CONFIG_FILENAME);
    ConfigLayer::from_yaml(&path)
}

/// Merge every layer in precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_config(workspace_dir: Option<&Path>, cli: &CliOverrides) -> Result<ConfigLayer> {
    let project = match workspace_dir {
        Some(dir) => load_project_config(dir)?,
        None => ConfigLayer::default(),
    };

    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        load_user_config()?,
        project,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]))
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    /// Database path; `None` only for the memory store.
    pub db_path: Option<PathBuf>,
    pub lock_timeout_ms: u64,
    pub listen: SocketAddr,
    pub store: StoreKind,
}

impl DeskConfig {
    /// Resolve a merged layer into typed settings.
    ///
    /// Without an explicit `db`, the database lives in the workspace.
    ///
    /// # Errors
    ///
    /// Returns `Config` for unparseable values, or `NotInitialized` when a
    /// SQLite store has neither a `db` setting nor a workspace.
    pub fn from_layer(layer: &ConfigLayer, workspace_dir: Option<&Path>) -> Result<Self> {
        let store = layer
            .get("store")
            .map_or(Ok(StoreKind::default()), StoreKind::from_str)?;

        let lock_timeout_ms = match layer.get("lock-timeout") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| DeskError::Config(format!("lock-timeout '{raw}': {e}")))?,
            None => DEFAULT_LOCK_TIMEOUT_MS,
        };

        let listen_raw = layer.get("listen").unwrap_or(DEFAULT_LISTEN);
        let listen = listen_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| DeskError::Config(format!("listen '{listen_raw}': {e}")))?;

        let db_path = match (store, layer.get("db")) {
            (StoreKind::Memory, _) => None,
            (StoreKind::Sqlite, Some(db)) => Some(PathBuf::from(db.trim())),
            (StoreKind::Sqlite, None) => Some(
                workspace_dir
                    .ok_or(DeskError::NotInitialized)?
                    .join(DEFAULT_DB_FILENAME),
            ),
        };

        Ok(Self {
            db_path,
            lock_timeout_ms,
            listen,
            store,
        })
    }

    /// Discover the workspace, merge every layer and resolve.
    ///
    /// A missing workspace is only an error when the database location
    /// cannot be determined otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if config files are unreadable or values invalid.
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let workspace_dir = match discover_workspace_dir(None) {
            Ok(dir) => Some(dir),
            Err(DeskError::NotInitialized) => None,
            Err(err) => return Err(err),
        };
        let layer = load_config(workspace_dir.as_deref(), cli)?;
        Self::from_layer(&layer, workspace_dir.as_deref())
    }

    /// Open the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open_store(&self) -> Result<Box<dyn IssueStore + Send>> {
        match (self.store, &self.db_path) {
            (StoreKind::Sqlite, Some(path)) => {
                debug!(path = %path.display(), "opening sqlite store");
                Ok(Box::new(SqliteStore::open_with_timeout(
                    path,
                    Some(self.lock_timeout_ms),
                )?))
            }
            (StoreKind::Sqlite, None) => Err(DeskError::NotInitialized),
            (StoreKind::Memory, _) => {
                debug!("using in-memory store");
                Ok(Box::new(MemoryStore::new()))
            }
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
