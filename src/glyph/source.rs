use std::io::BufRead;

use super::core::{Glyph, GlyphDatabase, Pen, Stroke};
use crate::error::LoadError;

/// Marker value opening a glyph group: `999 <code> <count>`.
pub const SENTINEL: &str = "999";

impl GlyphDatabase {
    /// Decode a glyph source from any buffered reader.
    ///
    /// Lines outside a group that are not sentinels are ignored. Inside a
    /// group every non-blank line must be a `<dx> <dy> <pen>` record until
    /// the declared count is reached.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, LoadError> {
        let mut glyphs = Vec::new();
        let mut pending: Option<PendingGlyph> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let record = line.trim();
            if record.is_empty() {
                continue;
            }

            match pending.take() {
                Some(mut group) => {
                    if is_sentinel(record) {
                        return Err(group.truncated());
                    }
                    group.strokes.push(parse_stroke(record, line_no)?);
                    if group.is_complete() {
                        glyphs.push(group.finish());
                    } else {
                        pending = Some(group);
                    }
                }
                None if is_sentinel(record) => {
                    let group = parse_header(record, line_no)?;
                    if group.is_complete() {
                        glyphs.push(group.finish());
                    } else {
                        pending = Some(group);
                    }
                }
                None => {}
            }
        }

        if let Some(group) = pending {
            return Err(group.truncated());
        }

        Ok(GlyphDatabase::from_glyphs(glyphs))
    }
}

struct PendingGlyph {
    code: u32,
    declared: usize,
    line: usize,
    strokes: Vec<Stroke>,
}

impl PendingGlyph {
    fn is_complete(&self) -> bool {
        self.strokes.len() == self.declared
    }

    fn finish(self) -> Glyph {
        Glyph::new(self.code, self.strokes)
    }

    fn truncated(self) -> LoadError {
        LoadError::UnknownMarker {
            code: self.code,
            declared: self.declared,
            found: self.strokes.len(),
            line: self.line,
        }
    }
}

fn is_sentinel(record: &str) -> bool {
    record.split_whitespace().next() == Some(SENTINEL)
}

fn parse_header(record: &str, line: usize) -> Result<PendingGlyph, LoadError> {
    let fields = split_fields(record, line)?;
    let code = u32::try_from(fields[1])
        .map_err(|_| malformed(record, line, "character code must be non-negative"))?;
    let declared = usize::try_from(fields[2])
        .map_err(|_| malformed(record, line, "stroke count must be non-negative"))?;
    Ok(PendingGlyph {
        code,
        declared,
        line,
        strokes: Vec::new(),
    })
}

fn parse_stroke(record: &str, line: usize) -> Result<Stroke, LoadError> {
    let fields = split_fields(record, line)?;
    let dx = i32::try_from(fields[0]).map_err(|_| malformed(record, line, "x out of range"))?;
    let dy = i32::try_from(fields[1]).map_err(|_| malformed(record, line, "y out of range"))?;
    let pen = Pen::from_flag(fields[2])
        .ok_or_else(|| malformed(record, line, "pen must be 0 or 1"))?;
    Ok(Stroke::new(dx, dy, pen))
}

fn split_fields(record: &str, line: usize) -> Result<[i64; 3], LoadError> {
    let mut fields = [0i64; 3];
    let mut count = 0;
    for token in record.split_whitespace() {
        if count == fields.len() {
            return Err(malformed(record, line, "expected exactly three fields"));
        }
        fields[count] = token
            .parse()
            .map_err(|_| malformed(record, line, &format!("`{token}` is not an integer")))?;
        count += 1;
    }
    if count != fields.len() {
        return Err(malformed(record, line, "expected exactly three fields"));
    }
    Ok(fields)
}

fn malformed(record: &str, line: usize, reason: &str) -> LoadError {
    LoadError::MalformedRecord {
        line,
        record: record.to_string(),
        reason: reason.to_string(),
    }
}
