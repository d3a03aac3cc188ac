//! Error types shared by every loop in the dashboard.
//!
//! Only [`DashError::Config`] and [`DashError::Terminal`] are fatal, and only
//! at startup.  Everything else is raised per cycle; the loop that hit it logs
//! it and carries on (see [`DashError::is_retryable`]).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(std::io::Error),

    #[error("No browser handler for platform '{0}'")]
    UnsupportedPlatform(String),

    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::Decode(err.to_string())
    }
}

impl DashError {
    /// Whether the poller should keep its cursor and try again next cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DashError::Network(_) | DashError::Api { .. } | DashError::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
