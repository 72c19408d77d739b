//! Per-group settings persistence.

pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;

pub use sqlite::SqliteStore;

/// Settings store consulted by the handlers.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Channel bound for channel-play in `group_id`, if any.
    async fn get_cmode(&self, group_id: i64) -> Result<Option<i64>>;

    /// Bind (`Some`) or clear (`None`) the channel-play target of a group.
    async fn set_cmode(&self, group_id: i64, channel_id: Option<i64>) -> Result<()>;

    /// Whether play logging is switched on.
    async fn is_logger(&self) -> Result<bool>;

    async fn set_logger(&self, enabled: bool) -> Result<()>;

    /// Whether a voice session is currently active in `destination`.
    async fn get_call(&self, destination: i64) -> bool;

    async fn set_call(&self, destination: i64, active: bool);
}
