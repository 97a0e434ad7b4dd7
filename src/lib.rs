//! Text-to-plotter compiler and command streamer for a two-axis writing robot.
//!
//! Text is laid out with stroke glyphs (`glyph`, `layout`), encoded as
//! G-code lines (`encode`, `wire`), and paced to the robot one
//! acknowledged line at a time (`stream`, `transport`).

pub mod config;
pub mod driver;
pub mod encode;
pub mod error;
pub mod glyph;
pub mod job;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod stream;
pub mod transport;
pub mod wire;

pub use config::{HeightMm, WriterConfig};
pub use encode::{EncoderSettings, GcodeEncoder, Program};
pub use error::{ConfigError, LoadError, Result, TransportError, WriterError};
pub use glyph::{BASE_FONT_HEIGHT, Glyph, GlyphDatabase, Pen, Stroke};
pub use job::{CompiledText, compile};
pub use layout::{GlyphMiss, LayoutCursor, LayoutEngine, LayoutReport, LayoutSettings, MotionCommand};
pub use logging::{FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, NullSink};
pub use metrics::{MetricSnapshot, StreamMetrics};
pub use stream::{
    BufferedStreamAudit, CancelToken, CommandStreamer, NullStreamAudit, StreamAudit,
    StreamAuditEvent, StreamAuditStage, StreamReport, StreamerConfig,
};
pub use transport::{EchoTransport, Endpoint, LineTransport, Reply, Transport};
