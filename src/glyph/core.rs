use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use blake3::Hash;

use crate::error::LoadError;

/// Height of a glyph in font design units. Fixed by the font format.
pub const BASE_FONT_HEIGHT: f32 = 18.0;

/// Pen state carried by every stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pen {
    Up,
    Down,
}

impl Pen {
    /// Map the font's numeric pen field (`0` up, `1` down).
    pub fn from_flag(flag: i64) -> Option<Self> {
        match flag {
            0 => Some(Pen::Up),
            1 => Some(Pen::Down),
            _ => None,
        }
    }

    pub fn flag(self) -> u8 {
        match self {
            Pen::Up => 0,
            Pen::Down => 1,
        }
    }

    pub fn is_down(self) -> bool {
        matches!(self, Pen::Down)
    }
}

/// One move of a glyph program, in font design units relative to the glyph origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub dx: i32,
    pub dy: i32,
    pub pen: Pen,
}

impl Stroke {
    pub fn new(dx: i32, dy: i32, pen: Pen) -> Self {
        Self { dx, dy, pen }
    }
}

/// Stroke program for one character code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub code: u32,
    strokes: Vec<Stroke>,
}

impl Glyph {
    pub fn new(code: u32, strokes: Vec<Stroke>) -> Self {
        Self { code, strokes }
    }

    /// Strokes in draw order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Horizontal travel to the next glyph: the x of the final stroke.
    pub fn advance_width(&self) -> i32 {
        self.strokes.last().map(|stroke| stroke.dx).unwrap_or(0)
    }
}

/// Read-only mapping from character code to glyph.
#[derive(Debug, Clone)]
pub struct GlyphDatabase {
    glyphs: HashMap<u32, Glyph>,
    fingerprint: Hash,
}

impl GlyphDatabase {
    /// Build a database from already decoded glyphs. Later duplicates win.
    pub fn from_glyphs(glyphs: impl IntoIterator<Item = Glyph>) -> Self {
        let glyphs: HashMap<u32, Glyph> = glyphs
            .into_iter()
            .map(|glyph| (glyph.code, glyph))
            .collect();
        let fingerprint = digest(&glyphs);
        Self {
            glyphs,
            fingerprint,
        }
    }

    /// Load a glyph source file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse an in-memory glyph source.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        Self::from_reader(source.as_bytes())
    }

    /// Glyph for `code`, or `None` when the code is unknown or has no strokes.
    pub fn lookup(&self, code: u32) -> Option<&Glyph> {
        self.glyphs.get(&code).filter(|glyph| !glyph.is_empty())
    }

    pub fn lookup_char(&self, ch: char) -> Option<&Glyph> {
        self.lookup(ch as u32)
    }

    /// True when `code` was declared by the source, even with zero strokes.
    pub fn contains(&self, code: u32) -> bool {
        self.glyphs.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Hex blake3 digest of the decoded glyph table.
    pub fn fingerprint(&self) -> String {
        self.fingerprint.to_hex().to_string()
    }
}

fn digest(glyphs: &HashMap<u32, Glyph>) -> Hash {
    let mut codes: Vec<&u32> = glyphs.keys().collect();
    codes.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for code in codes {
        let glyph = &glyphs[code];
        hasher.update(&glyph.code.to_le_bytes());
        hasher.update(&(glyph.strokes.len() as u64).to_le_bytes());
        for stroke in &glyph.strokes {
            hasher.update(&stroke.dx.to_le_bytes());
            hasher.update(&stroke.dy.to_le_bytes());
            hasher.update(&[stroke.pen.flag()]);
        }
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph_a() -> Glyph {
        Glyph::new(
            'A' as u32,
            vec![
                Stroke::new(0, 0, Pen::Up),
                Stroke::new(5, 10, Pen::Down),
                Stroke::new(10, 0, Pen::Down),
            ],
        )
    }

    #[test]
    fn advance_width_is_last_stroke_x() {
        assert_eq!(glyph_a().advance_width(), 10);
        assert_eq!(Glyph::new(1, Vec::new()).advance_width(), 0);
    }

    #[test]
    fn zero_stroke_glyph_is_a_miss() {
        let db = GlyphDatabase::from_glyphs([glyph_a(), Glyph::new(' ' as u32, Vec::new())]);
        assert!(db.contains(' ' as u32));
        assert!(db.lookup_char(' ').is_none());
        assert!(db.lookup_char('A').is_some());
        assert!(db.lookup_char('Z').is_none());
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn fingerprint_ignores_insertion_order() {
        let b = Glyph::new('B' as u32, vec![Stroke::new(6, 8, Pen::Down)]);
        let first = GlyphDatabase::from_glyphs([glyph_a(), b.clone()]);
        let second = GlyphDatabase::from_glyphs([b, glyph_a()]);
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = GlyphDatabase::load("/nonexistent/robo_writer/font.txt").unwrap_err();
        assert!(matches!(err, LoadError::SourceUnavailable { .. }));
    }
}
