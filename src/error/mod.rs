//! Error taxonomy for the writer pipeline.
//!
//! Each stage owns its error enum; `WriterError` folds them together for
//! callers that drive the whole load, layout, and stream sequence.

mod types;

pub use types::{ConfigError, LoadError, Result, TransportError, WriterError};
