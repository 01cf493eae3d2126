//! Config - Application Configuration

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_OVERSCAN, DEFAULT_PAGE_SIZE, DEFAULT_ROW_HEIGHT,
    DEFAULT_TIMEOUT_SECS, DEFAULT_VIEWPORT_ROWS,
};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// REST server configuration
    pub server: ServerConfig,
    /// List paging and layout
    pub list: ListConfig,
}

/// REST server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// API root, ending with a slash (e.g., "https://online-go.com/api/v1/")
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header
    pub user_agent: String,
    /// Bearer token for authenticated actions (join, leave, challenge)
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("ladder-view/{}", env!("CARGO_PKG_VERSION")),
            api_token: None,
        }
    }
}

/// Paging and virtual list layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListConfig {
    /// Rows per fetched page
    pub page_size: usize,
    /// Row height in pixels
    pub row_height: u32,
    /// Rows kept bound beyond each edge of the viewport
    pub overscan: usize,
    /// Visible rows for the terminal viewer
    pub viewport_rows: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
            viewport_rows: DEFAULT_VIEWPORT_ROWS,
        }
    }
}

impl AppConfig {
    /// Point at another API root, adding the trailing slash if missing
    pub fn set_base_url(&mut self, base_url: &str) {
        self.server.base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
    }

    /// Reject values the cache and viewport cannot work with
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.list.page_size == 0 {
            return Err(crate::error::Error::Invalid {
                message: "list.page_size must be at least 1".to_string(),
            });
        }
        if self.list.row_height == 0 {
            return Err(crate::error::Error::Invalid {
                message: "list.row_height must be at least 1".to_string(),
            });
        }
        if !self.server.base_url.ends_with('/') {
            return Err(crate::error::Error::Invalid {
                message: format!("server.base_url must end with '/': {}", self.server.base_url),
            });
        }
        Ok(())
    }
}
