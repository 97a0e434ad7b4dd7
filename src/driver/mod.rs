//! Terminal-facing pieces used by the `robo-writer` binary.

pub mod cli;

pub use cli::{InterruptWatcher, ProgressRenderer, is_interrupt, progress_line};
