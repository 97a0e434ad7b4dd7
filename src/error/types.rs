use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Unified result type for the writer crate.
pub type Result<T> = std::result::Result<T, WriterError>;

/// Errors surfaced while reading a glyph source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open glyph source `{}`: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed record on line {line} (`{record}`): {reason}")]
    MalformedRecord {
        line: usize,
        record: String,
        reason: String,
    },
    #[error(
        "glyph {code} on line {line} declares {declared} strokes but only {found} follow (truncated input)"
    )]
    UnknownMarker {
        code: u32,
        declared: usize,
        found: usize,
        line: usize,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating user supplied settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("requested height {requested}mm is outside the supported range [4, 10]mm")]
    HeightOutOfRange { requested: f32 },
    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
    #[error("cannot read config `{}`: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by the transport or the pacing protocol layered on it.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport `{endpoint}` unavailable: {source}")]
    Unavailable {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
    #[error("transport is not open")]
    NotOpen,
    #[error("robot did not report ready within {waited:?}")]
    NotReady { waited: Duration },
    #[error("no acknowledgement for command #{index} `{command}` within {waited:?}")]
    AckTimeout {
        command: String,
        index: usize,
        waited: Duration,
    },
    #[error("robot rejected command #{index} `{command}`: {reply}")]
    Rejected {
        command: String,
        index: usize,
        reply: String,
    },
    #[error("streaming cancelled after {sent} commands")]
    Cancelled { sent: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the end-to-end writer pipeline.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("glyph source error: {0}")]
    Load(#[from] LoadError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("cannot read text `{}`: {source}", path.display())]
    Text {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
