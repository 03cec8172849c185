use std::path::PathBuf;

/// Problems found while building [`crate::config::Config`]. All of them stop
/// the process before any site is visited.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID to send notifications")]
    MissingCredentials,
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("invalid selector {pattern:?}: {reason}")]
    InvalidSelector { pattern: String, reason: String },
    #[error("cannot read sites file {}: {source}", path.display())]
    SitesFileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("sites file {} is not a JSON site list: {source}", path.display())]
    SitesFileFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no sites configured")]
    NoSites,
}
