//! Motion command to wire command encoding.

mod core;

pub use self::core::{EncoderSettings, GcodeEncoder, Program};
