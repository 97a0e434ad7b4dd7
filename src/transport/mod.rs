//! Transport capability consumed by the streamer.
//!
//! A transport moves text lines to the robot and surfaces its replies. Byte
//! framing belongs to the transport; the pacing protocol lives in `stream`.

pub mod echo;
pub mod line;

use std::time::Duration;

use crate::error::TransportError;
use crate::wire;

pub use echo::EchoTransport;
pub use line::{Endpoint, LineTransport};

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Classified reply line from the robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The previous command was processed.
    Ack,
    /// Controller banner containing the ready token.
    Ready,
    /// The previous command was rejected.
    Error(String),
    /// Anything else (status chatter, echoes).
    Other(String),
}

impl Reply {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.eq_ignore_ascii_case(wire::ACK_REPLY) {
            Reply::Ack
        } else if line.to_ascii_lowercase().starts_with(wire::ERROR_PREFIX) {
            Reply::Error(line.to_string())
        } else if line.contains(wire::READY_TOKEN) {
            Reply::Ready
        } else {
            Reply::Other(line.to_string())
        }
    }
}

/// Line-oriented link to the robot.
pub trait Transport {
    /// Human readable endpoint, used in logs and errors.
    fn describe(&self) -> String;

    fn open(&mut self) -> TransportResult<()>;

    /// Send one command line. The transport appends the terminator.
    fn send(&mut self, line: &str) -> TransportResult<()>;

    /// Wait up to `timeout` for the next reply line.
    fn poll_reply(&mut self, timeout: Duration) -> TransportResult<Option<Reply>>;

    /// Release the link. Must be safe to call more than once.
    fn close(&mut self);
}
