use crate::validate::ValidationMode;
use chrono::Duration;

pub const DEFAULT_STORAGE_KEY_PREFIX: &str = "pending-edits";
pub const DEFAULT_MAX_SNAPSHOT_AGE_HOURS: i64 = 24;

/// Edit session configuration
///
/// One session per scope (for example a project); the scope id is part of
/// the storage key so sessions never share persisted edits.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Owner of the pending edits
    pub scope_id: String,

    /// Prefix of the persisted snapshot key
    pub storage_key_prefix: String,

    /// Persisted snapshots older than this are discarded on restore
    pub max_snapshot_age: Duration,

    /// Send staged sub-item edits along with the record patch
    pub include_sub_items: bool,

    /// Whether required-field rules apply on save
    pub validation_mode: ValidationMode,
}

impl SessionConfig {
    /// Create a configuration for one scope
    pub fn new(scope_id: &str) -> Self {
        Self {
            scope_id: scope_id.to_string(),
            storage_key_prefix: DEFAULT_STORAGE_KEY_PREFIX.to_string(),
            max_snapshot_age: Duration::hours(DEFAULT_MAX_SNAPSHOT_AGE_HOURS),
            include_sub_items: true,
            validation_mode: ValidationMode::Edit,
        }
    }

    /// Set the storage key prefix
    pub fn storage_key_prefix(mut self, prefix: &str) -> Self {
        self.storage_key_prefix = prefix.to_string();
        self
    }

    /// Set the snapshot age limit
    pub fn max_snapshot_age(mut self, age: Duration) -> Self {
        self.max_snapshot_age = age;
        self
    }

    /// Include or leave out staged sub-item edits when saving
    pub fn include_sub_items(mut self, include: bool) -> Self {
        self.include_sub_items = include;
        self
    }

    /// Set the validation mode
    pub fn validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    /// Key the persisted snapshot is stored under: `<prefix>:<scope_id>`
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.storage_key_prefix, self.scope_id)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.scope_id.is_empty() {
            return Err("scope_id cannot be empty".to_string());
        }

        if self.storage_key_prefix.is_empty() {
            return Err("storage_key_prefix cannot be empty".to_string());
        }

        if self.max_snapshot_age <= Duration::zero() {
            return Err("max_snapshot_age must be > 0".to_string());
        }

        Ok(())
    }
}
