//! Ladder Constants
//!
//! Centralized defaults shared by the cache, the list and the client.

/// Rows per page fetched from the players endpoint
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Row height in pixels
pub const DEFAULT_ROW_HEIGHT: u32 = 30;

/// Rows rendered beyond each edge of the viewport
pub const DEFAULT_OVERSCAN: usize = 20;

/// Rows printed by the command-line viewer
pub const DEFAULT_VIEWPORT_ROWS: usize = 20;

/// Stand-in ladder rank for players without one when sorting challenges
pub const UNRANKED_SORT_KEY: i64 = 1_000_000_000;

/// HTTP defaults
pub const DEFAULT_BASE_URL: &str = "https://online-go.com/api/v1/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Push notification event that invalidates a ladder
pub const PLAYERS_UPDATED_EVENT: &str = "players-updated";

/// Note attached to moderator rank overrides
pub const MODERATION_NOTE: &str = "Adjusting ladder position";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "ladder-view.toml";

/// Log file name inside the data directory
pub const LOG_FILE_NAME: &str = "ladder-view.log";
