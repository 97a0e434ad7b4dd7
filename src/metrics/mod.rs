use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters accumulated while streaming a program.
#[derive(Debug, Default, Clone)]
pub struct StreamMetrics {
    commands_sent: u64,
    acks: u64,
    pen_changes: u64,
    rapid_moves: u64,
    linear_moves: u64,
    bytes_sent: u64,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one line handed to the transport, classified by its command word.
    pub fn record_sent(&mut self, line: &str) {
        self.commands_sent = self.commands_sent.saturating_add(1);
        self.bytes_sent = self.bytes_sent.saturating_add(line.len() as u64 + 1);
        match line.split_whitespace().next() {
            Some("G0") => self.rapid_moves = self.rapid_moves.saturating_add(1),
            Some("G1") => self.linear_moves = self.linear_moves.saturating_add(1),
            Some(word) if word.starts_with('S') => {
                self.pen_changes = self.pen_changes.saturating_add(1)
            }
            _ => {}
        }
    }

    pub fn record_ack(&mut self) {
        self.acks = self.acks.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            commands_sent: self.commands_sent,
            acks: self.acks,
            pen_changes: self.pen_changes,
            rapid_moves: self.rapid_moves,
            linear_moves: self.linear_moves,
            bytes_sent: self.bytes_sent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub commands_sent: u64,
    pub acks: u64,
    pub pen_changes: u64,
    pub rapid_moves: u64,
    pub linear_moves: u64,
    pub bytes_sent: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "stream_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("commands_sent".to_string(), json!(self.commands_sent));
        map.insert("acks".to_string(), json!(self.acks));
        map.insert("pen_changes".to_string(), json!(self.pen_changes));
        map.insert("rapid_moves".to_string(), json!(self.rapid_moves));
        map.insert("linear_moves".to_string(), json!(self.linear_moves));
        map.insert("bytes_sent".to_string(), json!(self.bytes_sent));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sent_lines_are_classified() {
        let mut metrics = StreamMetrics::new();
        for line in ["G1 X0 Y0 F1000", "M3", "S0", "G0 X1.00 Y0.00", "S1000"] {
            metrics.record_sent(line);
        }
        metrics.record_ack();

        let snapshot = metrics.snapshot(Duration::from_millis(1500));
        assert_eq!(snapshot.commands_sent, 5);
        assert_eq!(snapshot.linear_moves, 1);
        assert_eq!(snapshot.rapid_moves, 1);
        assert_eq!(snapshot.pen_changes, 2);
        assert_eq!(snapshot.acks, 1);
        assert_eq!(snapshot.uptime_ms, 1500);
        assert_eq!(snapshot.bytes_sent, 14 + 2 + 2 + 14 + 5 + 5);
    }

    #[test]
    fn snapshot_event_carries_counters() {
        let snapshot = StreamMetrics::new().snapshot(Duration::ZERO);
        let event = snapshot.to_log_event("robo_writer::stream.metrics");
        assert_eq!(event.message, "stream_metrics");
        assert_eq!(event.fields["commands_sent"], json!(0));
    }
}
