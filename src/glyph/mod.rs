//! Glyph database: stroke programs keyed by character code.
//!
//! The database is built once from a line-structured source and is read-only
//! afterwards, so it can be shared by reference with any number of layout runs.

mod core;
mod source;

pub use self::core::{BASE_FONT_HEIGHT, Glyph, GlyphDatabase, Pen, Stroke};
pub use source::SENTINEL;
