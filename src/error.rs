use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Feed writing failed: {0}")]
    Rss(#[from] rss::Error),

    #[error("Invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// A category-scoped problem. Recorded in the run report, never raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineFailure {
    #[error("document acquisition failed: {0}")]
    Acquisition(String),

    #[error("no strategy produced any offers")]
    ExtractionEmpty,

    #[error("publishing feed failed: {0}")]
    Publish(String),
}
