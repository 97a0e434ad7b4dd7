use std::collections::VecDeque;
use std::io::Write;
use std::time::Duration;

use super::{Reply, Transport, TransportResult};
use crate::error::TransportError;

/// Dry-run transport: writes each command line to `writer` and answers at once.
///
/// The blank wake line is answered with the ready banner and not written, so
/// the output is exactly the program the robot would receive.
pub struct EchoTransport<W: Write> {
    writer: W,
    open: bool,
    pending: VecDeque<Reply>,
}

impl<W: Write> EchoTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            open: false,
            pending: VecDeque::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for EchoTransport<W> {
    fn describe(&self) -> String {
        "dry-run".to_string()
    }

    fn open(&mut self) -> TransportResult<()> {
        self.open = true;
        Ok(())
    }

    fn send(&mut self, line: &str) -> TransportResult<()> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        if line.is_empty() {
            self.pending.push_back(Reply::Ready);
            return Ok(());
        }
        writeln!(self.writer, "{line}")?;
        self.pending.push_back(Reply::Ack);
        Ok(())
    }

    fn poll_reply(&mut self, _timeout: Duration) -> TransportResult<Option<Reply>> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        Ok(self.pending.pop_front())
    }

    fn close(&mut self) {
        if self.open {
            self.writer.flush().ok();
            self.open = false;
        }
    }
}
