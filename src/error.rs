use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid duration {0}s, expected one of 15, 30, 60 or 120")]
    InvalidDuration(u64),
    #[error("settings cannot change while a session is running")]
    SessionRunning,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history storage failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("history file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}
