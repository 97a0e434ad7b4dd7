//! Streaming lifecycle audit hooks.
//!
//! The streamer reports each protocol checkpoint here so callers can render
//! progress or keep a trace without reaching into the pacing loop. Records
//! carry a stage plus structured details.

use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

/// Protocol checkpoints emitted by `CommandStreamer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamAuditStage {
    /// Transport opened successfully.
    TransportOpened,
    /// Wake line written.
    RobotWoken,
    /// Ready token received.
    RobotReady,
    /// A command line was handed to the transport.
    CommandSent,
    /// The robot acknowledged the last command.
    CommandAcknowledged,
    /// Every command was sent and acknowledged.
    StreamCompleted,
    /// Streaming stopped early on an error or cancellation.
    StreamHalted,
    /// Transport released.
    TransportClosed,
}

#[derive(Debug, Clone)]
pub struct StreamAuditEvent {
    pub timestamp: SystemTime,
    pub stage: StreamAuditStage,
    pub details: Vec<(String, Value)>,
}

impl StreamAuditEvent {
    pub fn new(stage: StreamAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Receiver of audit events.
pub trait StreamAudit: Send + Sync {
    fn record(&self, event: StreamAuditEvent);
}

/// Default no-op audit.
#[derive(Debug, Default)]
pub struct NullStreamAudit;

impl StreamAudit for NullStreamAudit {
    fn record(&self, _event: StreamAuditEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct BufferedStreamAudit {
    events: Mutex<Vec<StreamAuditEvent>>,
}

impl BufferedStreamAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> Vec<StreamAuditStage> {
        self.events
            .lock()
            .expect("audit mutex poisoned")
            .iter()
            .map(|event| event.stage)
            .collect()
    }

    pub fn events(&self) -> Vec<StreamAuditEvent> {
        self.events.lock().expect("audit mutex poisoned").clone()
    }
}

impl StreamAudit for BufferedStreamAudit {
    fn record(&self, event: StreamAuditEvent) {
        self.events.lock().expect("audit mutex poisoned").push(event);
    }
}
