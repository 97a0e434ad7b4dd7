//! Layout module orchestrator.
//!
//! Callers import layout types from here while the word-wrap engine lives in
//! the private `core` module.

mod core;

pub use self::core::{
    GlyphMiss, LayoutCursor, LayoutEngine, LayoutReport, LayoutSettings, MotionCommand,
};
