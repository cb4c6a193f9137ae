use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HunterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Subtitle provider error: {0}")]
    Provider(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Translation error: {0}")]
    Translation(String),

    /// The translation backend answered with an HTML page instead of JSON,
    /// which in practice means it is rate limiting or blocking us.
    #[error("Translation backend throttled: {0}")]
    BackendThrottled(String),

    #[error("Write failure: {0}")]
    Write(String),
}

/// Coarse classification reported to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    TransientProvider,
    Translation,
    WriteFailure,
    Catalog,
    Config,
    Internal,
}

impl HunterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Provider(_) | Self::Http(_) => ErrorKind::TransientProvider,
            Self::Translation(_) | Self::BackendThrottled(_) => ErrorKind::Translation,
            Self::Write(_) => ErrorKind::WriteFailure,
            Self::Catalog(_) => ErrorKind::Catalog,
            Self::Config(_) | Self::Toml(_) => ErrorKind::Config,
            Self::Io(_) | Self::Json(_) => ErrorKind::Internal,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// `{kind, message}` pair handed to callers when a request fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, HunterError>;
