//! Text-to-program compilation: font and text loading, layout, encoding.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde_json::json;

use crate::config::WriterConfig;
use crate::encode::{GcodeEncoder, Program};
use crate::error::{Result, WriterError};
use crate::glyph::GlyphDatabase;
use crate::layout::{GlyphMiss, LayoutEngine};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

const LOG_TARGET: &str = "robo_writer::job";

/// A program ready for streaming plus what layout had to say about it.
#[derive(Debug, Clone)]
pub struct CompiledText {
    pub program: Program,
    pub misses: Vec<GlyphMiss>,
    pub lines: usize,
}

/// Load the glyph database and log its size and fingerprint.
pub fn load_font(path: impl AsRef<Path>, logger: Option<&Logger>) -> Result<GlyphDatabase> {
    let path = path.as_ref();
    let glyphs = GlyphDatabase::load(path)?;
    log(
        logger,
        LogLevel::Info,
        "font_loaded",
        [
            json_kv("path", json!(path.display().to_string())),
            json_kv("glyphs", json!(glyphs.len())),
            json_kv("fingerprint", json!(glyphs.fingerprint())),
        ],
    );
    Ok(glyphs)
}

/// Read the text to write. `-` reads standard input.
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let unreadable = |source: io::Error| WriterError::Text {
        path: path.to_path_buf(),
        source,
    };
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map_err(unreadable)?;
        return Ok(text);
    }
    fs::read_to_string(path).map_err(unreadable)
}

/// Lay `text` out with `glyphs` and encode it for the robot.
///
/// Missing glyphs are skipped and reported, never fatal.
pub fn compile(
    glyphs: &GlyphDatabase,
    text: &str,
    config: &WriterConfig,
    logger: Option<&Logger>,
) -> Result<CompiledText> {
    let settings = config.layout_settings()?;
    let report = LayoutEngine::new(glyphs, settings).layout(text);

    for miss in &report.misses {
        log(
            logger,
            LogLevel::Warn,
            "glyph_missing",
            [
                json_kv("char", json!(miss.ch.to_string())),
                json_kv("code", json!(miss.ch as u32)),
                json_kv("position", json!(miss.position)),
            ],
        );
    }

    let program = GcodeEncoder::new(config.encoder_settings()).program(&report.commands);
    log(
        logger,
        LogLevel::Info,
        "layout_finished",
        [
            json_kv("commands", json!(report.commands.len())),
            json_kv("lines", json!(report.lines)),
            json_kv("misses", json!(report.misses.len())),
            json_kv("program_lines", json!(program.len())),
        ],
    );

    Ok(CompiledText {
        program,
        misses: report.misses,
        lines: report.lines,
    })
}

fn log<I>(logger: Option<&Logger>, level: LogLevel, message: &str, fields: I)
where
    I: IntoIterator<Item = (String, serde_json::Value)>,
{
    if let Some(logger) = logger {
        let _ = logger.log_event(event_with_fields(level, LOG_TARGET, message, fields));
    }
}
