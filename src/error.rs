use thiserror::Error;

/// Errors surfaced to the user as alerts.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A required field is missing or malformed; nothing was sent to the store
    #[error("{0}")]
    Validation(String),

    /// The record store rejected or failed the request
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Sign-in or sign-out failed
    #[error("{0}")]
    Auth(String),

    /// Invoice document could not be written
    #[error("Export failed: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DashboardError::Validation(_))
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Auth(err.to_string())
    }
}
