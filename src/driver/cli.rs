use std::io::{self, Write};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};

use crate::error::{Result, WriterError};
use crate::stream::{CancelToken, StreamAudit, StreamAuditEvent, StreamAuditStage};

const KEY_POLL: Duration = Duration::from_millis(50);
const BAR_WIDTH: usize = 30;

/// Puts the terminal in raw mode and trips a `CancelToken` when Esc or
/// Ctrl-C is pressed. Raw mode is restored when the watcher stops or drops.
pub struct InterruptWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InterruptWatcher {
    pub fn spawn(cancel: CancelToken) -> Result<Self> {
        terminal::enable_raw_mode().map_err(|err| WriterError::Terminal(err.to_string()))?;
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("robo-writer-keys".to_string())
            .spawn(move || watch(&cancel, &thread_stop));
        match handle {
            Ok(handle) => Ok(Self {
                stop,
                handle: Some(handle),
            }),
            Err(err) => {
                terminal::disable_raw_mode().ok();
                Err(WriterError::Io(err))
            }
        }
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
            terminal::disable_raw_mode().ok();
        }
    }
}

impl Drop for InterruptWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn watch(cancel: &CancelToken, stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) && !cancel.is_cancelled() {
        match event::poll(KEY_POLL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if is_interrupt(&key) => cancel.cancel(),
                Ok(_) => {}
                Err(_) => break,
            },
            Ok(false) => {}
            Err(_) => break,
        }
    }
}

/// Esc or Ctrl-C, ignoring key releases.
pub fn is_interrupt(key: &KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') | KeyCode::Char('C') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Renders streaming progress from audit events onto a terminal writer.
///
/// Output uses `\r\n` line ends so it stays aligned while raw mode is on.
pub struct ProgressRenderer<W: Write + Send> {
    out: Mutex<W>,
}

impl ProgressRenderer<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> ProgressRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().expect("progress mutex poisoned")
    }

    fn render(&self, event: &StreamAuditEvent) -> io::Result<()> {
        let mut guard = self.out.lock().expect("progress mutex poisoned");
        let out = &mut *guard;
        let count = |key: &str| event.get(key).and_then(|value| value.as_u64()).unwrap_or(0);
        let text = |key: &str| {
            event
                .get(key)
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string()
        };

        match event.stage {
            StreamAuditStage::TransportOpened => {
                queue!(out, Print(format!("connected to {}\r\n", text("endpoint"))))?;
            }
            StreamAuditStage::RobotReady => {
                queue!(out, Print("robot ready, press Esc to stop\r\n"))?;
            }
            StreamAuditStage::CommandAcknowledged => {
                let line = progress_line(count("index") as usize + 1, count("total") as usize);
                queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line))?;
            }
            StreamAuditStage::StreamCompleted => {
                queue!(out, Print(format!("\r\ndone: {} commands\r\n", count("sent"))))?;
            }
            StreamAuditStage::StreamHalted => {
                queue!(
                    out,
                    Print(format!(
                        "\r\nhalted after {} commands: {}\r\n",
                        count("sent"),
                        text("error")
                    ))
                )?;
            }
            _ => return Ok(()),
        }
        out.flush()
    }
}

impl<W: Write + Send> StreamAudit for ProgressRenderer<W> {
    fn record(&self, event: StreamAuditEvent) {
        self.render(&event).ok();
    }
}

/// `[#####.....] done/total` with a fixed-width bar.
pub fn progress_line(done: usize, total: usize) -> String {
    let filled = if total == 0 {
        BAR_WIDTH
    } else {
        (done.min(total) * BAR_WIDTH) / total
    };
    format!(
        "[{}{}] {done}/{total}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn esc_and_ctrl_c_interrupt() {
        assert!(is_interrupt(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_interrupt(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!is_interrupt(&KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::NONE
        )));
        assert!(!is_interrupt(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn progress_bar_scales_with_completion() {
        assert_eq!(progress_line(0, 10), format!("[{}] 0/10", ".".repeat(30)));
        assert_eq!(
            progress_line(5, 10),
            format!("[{}{}] 5/10", "#".repeat(15), ".".repeat(15))
        );
        assert_eq!(progress_line(10, 10), format!("[{}] 10/10", "#".repeat(30)));
    }

    #[test]
    fn renderer_reports_progress_and_outcome() {
        let renderer = ProgressRenderer::new(Vec::new());
        renderer.record(
            StreamAuditEvent::new(StreamAuditStage::TransportOpened).detail("endpoint", "tcp://robot:23"),
        );
        renderer.record(
            StreamAuditEvent::new(StreamAuditStage::CommandAcknowledged)
                .detail("index", 2)
                .detail("total", 4),
        );
        renderer.record(StreamAuditEvent::new(StreamAuditStage::StreamCompleted).detail("sent", 4));

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(output.contains("connected to tcp://robot:23"));
        assert!(output.contains("3/4"));
        assert!(output.contains("done: 4 commands"));
    }
}
