//! Command streaming with strict one-in-flight pacing.
//!
//! The robot has no input queue, so every line waits for its acknowledgement
//! and a settle delay before the next one goes out. Every wait is sliced by
//! `poll_interval` so a `CancelToken` is honoured promptly, and the transport
//! is closed on every exit path.

pub mod audit;
mod cancel;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;

use crate::encode::Program;
use crate::error::TransportError;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::{MetricSnapshot, StreamMetrics};
use crate::transport::{Reply, Transport};
use crate::wire;

pub use audit::{
    BufferedStreamAudit, NullStreamAudit, StreamAudit, StreamAuditEvent, StreamAuditStage,
};
pub use cancel::CancelToken;

const LOG_TARGET: &str = "robo_writer::stream";

/// Pacing and observability knobs for the streamer.
#[derive(Clone)]
pub struct StreamerConfig {
    /// Pause after each acknowledged command.
    pub settle_delay: Duration,
    /// Longest wait for a command acknowledgement.
    pub ack_timeout: Duration,
    /// Longest wait for the ready token after the wake line.
    pub ready_timeout: Duration,
    /// Granularity of every wait; bounds cancellation latency.
    pub poll_interval: Duration,
    pub logger: Option<Logger>,
    /// Interval between metrics snapshots. Zero disables periodic snapshots.
    pub metrics_interval: Duration,
    pub metrics_target: String,
    pub audit: Arc<dyn StreamAudit>,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(100),
            ack_timeout: Duration::from_secs(5),
            ready_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(20),
            logger: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "robo_writer::stream.metrics".to_string(),
            audit: Arc::new(NullStreamAudit),
        }
    }
}

/// Outcome of a completed stream.
#[derive(Debug, Clone)]
pub struct StreamReport {
    pub sent: usize,
    pub elapsed: Duration,
    pub metrics: MetricSnapshot,
}

pub struct CommandStreamer {
    config: StreamerConfig,
    metrics: StreamMetrics,
    sent: usize,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl CommandStreamer {
    pub fn new(config: StreamerConfig) -> Self {
        Self {
            config,
            metrics: StreamMetrics::new(),
            sent: 0,
            start_instant: None,
            last_metrics_emit: None,
        }
    }

    /// Open `transport`, run the wake/ready handshake, then send `program`
    /// one acknowledged line at a time.
    ///
    /// An open failure returns before anything is sent. Any later failure
    /// halts transmission; lines already sent are not undone.
    pub fn stream<T>(
        &mut self,
        transport: &mut T,
        program: &Program,
        cancel: &CancelToken,
    ) -> Result<StreamReport, TransportError>
    where
        T: Transport + ?Sized,
    {
        self.reset();
        let endpoint = transport.describe();

        if let Err(err) = transport.open() {
            self.log(
                LogLevel::Error,
                "transport_unavailable",
                [
                    json_kv("endpoint", json!(endpoint)),
                    json_kv("error", json!(err.to_string())),
                ],
            );
            return Err(err);
        }
        self.audit(
            StreamAuditEvent::new(StreamAuditStage::TransportOpened).detail("endpoint", endpoint.clone()),
        );
        self.log(
            LogLevel::Info,
            "stream_started",
            [
                json_kv("endpoint", json!(endpoint)),
                json_kv("commands", json!(program.len())),
            ],
        );

        let outcome = self.run_protocol(transport, program, cancel);
        match &outcome {
            Ok(()) => self.audit(
                StreamAuditEvent::new(StreamAuditStage::StreamCompleted).detail("sent", self.sent),
            ),
            Err(err) => self.audit(
                StreamAuditEvent::new(StreamAuditStage::StreamHalted)
                    .detail("sent", self.sent)
                    .detail("error", err.to_string()),
            ),
        }

        transport.close();
        self.audit(StreamAuditEvent::new(StreamAuditStage::TransportClosed));

        let elapsed = self.uptime();
        let snapshot = self.metrics.snapshot(elapsed);
        self.emit_snapshot(&snapshot);

        match outcome {
            Ok(()) => {
                self.log(
                    LogLevel::Info,
                    "stream_completed",
                    [
                        json_kv("sent", json!(self.sent)),
                        json_kv("elapsed_ms", json!(elapsed.as_millis() as u64)),
                    ],
                );
                Ok(StreamReport {
                    sent: self.sent,
                    elapsed,
                    metrics: snapshot,
                })
            }
            Err(err) => {
                let level = match &err {
                    TransportError::Cancelled { .. } => LogLevel::Warn,
                    _ => LogLevel::Error,
                };
                self.log(
                    level,
                    "stream_halted",
                    [
                        json_kv("sent", json!(self.sent)),
                        json_kv("error", json!(err.to_string())),
                    ],
                );
                Err(err)
            }
        }
    }

    fn run_protocol<T>(
        &mut self,
        transport: &mut T,
        program: &Program,
        cancel: &CancelToken,
    ) -> Result<(), TransportError>
    where
        T: Transport + ?Sized,
    {
        self.check_cancel(cancel)?;
        transport.send(wire::wake())?;
        self.audit(StreamAuditEvent::new(StreamAuditStage::RobotWoken));
        self.settle(cancel)?;

        self.await_ready(transport, cancel)?;
        self.audit(StreamAuditEvent::new(StreamAuditStage::RobotReady));
        self.log(LogLevel::Info, "robot_ready", std::iter::empty());

        let total = program.len();
        for (index, line) in program.lines().enumerate() {
            self.check_cancel(cancel)?;
            transport.send(line)?;
            self.metrics.record_sent(line);
            self.audit(
                StreamAuditEvent::new(StreamAuditStage::CommandSent)
                    .detail("index", index)
                    .detail("total", total)
                    .detail("command", line),
            );

            self.await_ack(transport, index, line, cancel)?;
            self.metrics.record_ack();
            self.sent += 1;
            self.audit(
                StreamAuditEvent::new(StreamAuditStage::CommandAcknowledged)
                    .detail("index", index)
                    .detail("total", total),
            );

            self.settle(cancel)?;
            self.maybe_emit_metrics();
        }
        Ok(())
    }

    fn await_ready<T>(&mut self, transport: &mut T, cancel: &CancelToken) -> Result<(), TransportError>
    where
        T: Transport + ?Sized,
    {
        let waited = self.config.ready_timeout;
        let deadline = Instant::now() + waited;
        loop {
            self.check_cancel(cancel)?;
            match self.poll_until(transport, deadline)? {
                Poll::Reply(Reply::Ready) => return Ok(()),
                Poll::Reply(other) => self.log_ignored(&other),
                Poll::Idle => {}
                Poll::Expired => return Err(TransportError::NotReady { waited }),
            }
        }
    }

    fn await_ack<T>(
        &mut self,
        transport: &mut T,
        index: usize,
        command: &str,
        cancel: &CancelToken,
    ) -> Result<(), TransportError>
    where
        T: Transport + ?Sized,
    {
        let waited = self.config.ack_timeout;
        let deadline = Instant::now() + waited;
        loop {
            self.check_cancel(cancel)?;
            match self.poll_until(transport, deadline)? {
                Poll::Reply(Reply::Ack) => return Ok(()),
                Poll::Reply(Reply::Error(reply)) => {
                    return Err(TransportError::Rejected {
                        command: command.to_string(),
                        index,
                        reply,
                    });
                }
                Poll::Reply(other) => self.log_ignored(&other),
                Poll::Idle => {}
                Poll::Expired => {
                    return Err(TransportError::AckTimeout {
                        command: command.to_string(),
                        index,
                        waited,
                    });
                }
            }
        }
    }

    /// One slice of a wait. Sleeps out the slice when the transport returns
    /// empty-handed early, so waits never spin.
    fn poll_until<T>(&self, transport: &mut T, deadline: Instant) -> Result<Poll, TransportError>
    where
        T: Transport + ?Sized,
    {
        let now = Instant::now();
        if now >= deadline {
            return Ok(Poll::Expired);
        }
        let slice = (deadline - now).min(self.config.poll_interval);
        match transport.poll_reply(slice)? {
            Some(reply) => Ok(Poll::Reply(reply)),
            None => {
                let spent = now.elapsed();
                if spent < slice {
                    thread::sleep(slice - spent);
                }
                Ok(Poll::Idle)
            }
        }
    }

    fn settle(&self, cancel: &CancelToken) -> Result<(), TransportError> {
        let deadline = Instant::now() + self.config.settle_delay;
        loop {
            self.check_cancel(cancel)?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep((deadline - now).min(self.config.poll_interval));
        }
    }

    fn check_cancel(&self, cancel: &CancelToken) -> Result<(), TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled { sent: self.sent });
        }
        Ok(())
    }

    fn reset(&mut self) {
        let now = Instant::now();
        self.metrics = StreamMetrics::new();
        self.sent = 0;
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
    }

    fn uptime(&self) -> Duration {
        self.start_instant
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }

    fn audit(&self, event: StreamAuditEvent) {
        self.config.audit.record(event);
    }

    fn log_ignored(&self, reply: &Reply) {
        self.log(
            LogLevel::Debug,
            "reply_ignored",
            [json_kv("reply", json!(format!("{reply:?}")))],
        );
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval == Duration::ZERO {
            return;
        }
        let now = Instant::now();
        match self.last_metrics_emit {
            Some(last) if now.duration_since(last) < self.config.metrics_interval => return,
            _ => self.last_metrics_emit = Some(now),
        }
        let snapshot = self.metrics.snapshot(self.uptime());
        self.emit_snapshot(&snapshot);
    }

    fn emit_snapshot(&self, snapshot: &MetricSnapshot) {
        if let Some(logger) = self.config.logger.as_ref() {
            let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
        }
    }
}

enum Poll {
    Reply(Reply),
    Idle,
    Expired,
}
