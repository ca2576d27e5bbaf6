use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// How `delete_account` and `update_account` match the given username.
///
/// Account creation always rejects case-variant duplicates; deletion and
/// update historically matched the exact spelling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UsernameMatch {
    #[default]
    Exact,
    CaseInsensitive,
}

/// What happens to task references when their account is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DanglingReferences {
    /// Leave `assigned_to` / `manager` pointing at the deleted username
    #[default]
    Preserve,
    /// Null out matching `assigned_to` / `manager` in the same transaction
    Clear,
}

/// Contents of `staffdesk.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaffdeskConfig {
    pub database: Option<String>,
    pub busy_timeout_ms: Option<u64>,
    pub username_match: Option<UsernameMatch>,
    pub on_account_delete: Option<DanglingReferences>,
}

impl StaffdeskConfig {
    /// Resolve into a store configuration. `database` overrides the file.
    pub fn resolve(&self, database: Option<&Path>) -> StoreConfig {
        let path = database
            .map(Path::to_path_buf)
            .or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| default_database_path_in(Path::new(".")));

        StoreConfig {
            path,
            busy_timeout: Duration::from_millis(
                self.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
            ),
            username_match: self.username_match.unwrap_or_default(),
            on_account_delete: self.on_account_delete.unwrap_or_default(),
        }
    }
}

/// Everything the store needs to open a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Upper bound on waiting for a locked database
    pub busy_timeout: Duration,
    pub username_match: UsernameMatch,
    pub on_account_delete: DanglingReferences,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            username_match: UsernameMatch::default(),
            on_account_delete: DanglingReferences::default(),
        }
    }

    pub fn with_username_match(mut self, username_match: UsernameMatch) -> Self {
        self.username_match = username_match;
        self
    }

    pub fn with_dangling_references(mut self, policy: DanglingReferences) -> Self {
        self.on_account_delete = policy;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("staffdesk.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".staffdesk").join("staffdesk.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<StaffdeskConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: StaffdeskConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &StaffdeskConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
