use crate::glyph::{Glyph, GlyphDatabase, Pen};

/// Abstract motion produced by the layout engine, before wire encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommand {
    SetPen(Pen),
    Move { x: f32, y: f32, drawing: bool },
}

/// Geometry used for one layout run, all in millimetres except `scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSettings {
    /// Font design units to millimetres.
    pub scale: f32,
    pub max_line_width: f32,
    pub line_height: f32,
    /// Horizontal gap added after every word.
    pub word_gap: f32,
}

impl LayoutSettings {
    /// Settings with the standard gap of four design units between words.
    pub fn new(scale: f32, max_line_width: f32, line_height: f32) -> Self {
        Self {
            scale,
            max_line_width,
            line_height,
            word_gap: scale * 4.0,
        }
    }
}

/// Pen position and last emitted pen state for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutCursor {
    pub x_offset: f32,
    pub y_offset: f32,
    /// `None` until the first pen command of the run.
    pub previous_pen: Option<Pen>,
}

impl LayoutCursor {
    pub fn new() -> Self {
        Self::default()
    }

    fn line_break(&mut self, line_height: f32) {
        self.x_offset = 0.0;
        self.y_offset -= line_height;
    }
}

/// A character with no drawable glyph. Skipped, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphMiss {
    pub ch: char,
    /// Character index within the input text.
    pub position: usize,
}

/// Output of one layout run.
#[derive(Debug, Clone, Default)]
pub struct LayoutReport {
    pub commands: Vec<MotionCommand>,
    pub misses: Vec<GlyphMiss>,
    /// Number of text lines touched, counting wraps and explicit newlines.
    pub lines: usize,
}

/// Word-wrapping text layout over a borrowed glyph database.
pub struct LayoutEngine<'a> {
    glyphs: &'a GlyphDatabase,
    settings: LayoutSettings,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(glyphs: &'a GlyphDatabase, settings: LayoutSettings) -> Self {
        Self { glyphs, settings }
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn commands(&self, text: &str) -> Vec<MotionCommand> {
        self.layout(text).commands
    }

    /// Lay out `text` and return the full motion sequence.
    ///
    /// Words are separated by spaces, tabs, carriage returns, and newlines.
    /// A newline always starts a new line; otherwise a word moves to the next
    /// line only when it would cross `max_line_width` and the cursor is not
    /// already at the start of a line. The run always ends pen-up at the
    /// origin.
    pub fn layout(&self, text: &str) -> LayoutReport {
        let mut run = Run {
            cursor: LayoutCursor::new(),
            report: LayoutReport {
                lines: 1,
                ..LayoutReport::default()
            },
        };

        let mut word: Option<(usize, usize)> = None;
        for (position, (byte_idx, ch)) in text.char_indices().enumerate() {
            if is_delimiter(ch) {
                if let Some((start, first)) = word.take() {
                    self.place_word(&text[start..byte_idx], first, &mut run);
                }
                if ch == '\n' {
                    run.line_break(self.settings.line_height);
                }
            } else if word.is_none() {
                word = Some((byte_idx, position));
            }
        }
        if let Some((start, first)) = word {
            self.place_word(&text[start..], first, &mut run);
        }

        run.finish()
    }

    fn place_word(&self, word: &str, first_position: usize, run: &mut Run) {
        let width = self.word_width(word);
        let cursor = &run.cursor;
        if cursor.x_offset > 0.0 && cursor.x_offset + width > self.settings.max_line_width {
            run.line_break(self.settings.line_height);
        }

        for (idx, ch) in word.chars().enumerate() {
            match self.glyphs.lookup_char(ch) {
                Some(glyph) => self.draw_glyph(glyph, run),
                None => run.report.misses.push(GlyphMiss {
                    ch,
                    position: first_position + idx,
                }),
            }
        }

        run.cursor.x_offset += self.settings.word_gap;
    }

    fn draw_glyph(&self, glyph: &Glyph, run: &mut Run) {
        let scale = self.settings.scale;
        for stroke in glyph.strokes() {
            let x = run.cursor.x_offset + stroke.dx as f32 * scale;
            let y = run.cursor.y_offset + stroke.dy as f32 * scale;
            run.set_pen(stroke.pen);
            run.report.commands.push(MotionCommand::Move {
                x,
                y,
                drawing: stroke.pen.is_down(),
            });
        }
        run.cursor.x_offset += glyph.advance_width() as f32 * scale;
    }

    /// Scaled advance of every drawable character in `word`.
    pub fn word_width(&self, word: &str) -> f32 {
        word.chars()
            .filter_map(|ch| self.glyphs.lookup_char(ch))
            .map(|glyph| glyph.advance_width() as f32 * self.settings.scale)
            .sum()
    }
}

struct Run {
    cursor: LayoutCursor,
    report: LayoutReport,
}

impl Run {
    fn set_pen(&mut self, pen: Pen) {
        if self.cursor.previous_pen != Some(pen) {
            self.report.commands.push(MotionCommand::SetPen(pen));
            self.cursor.previous_pen = Some(pen);
        }
    }

    fn line_break(&mut self, line_height: f32) {
        self.cursor.line_break(line_height);
        self.report.lines += 1;
    }

    fn finish(mut self) -> LayoutReport {
        self.set_pen(Pen::Up);
        self.report.commands.push(MotionCommand::Move {
            x: 0.0,
            y: 0.0,
            drawing: false,
        });
        self.report
    }
}

fn is_delimiter(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\t' | '\r')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::Stroke;

    use super::MotionCommand::{Move, SetPen};

    fn font() -> GlyphDatabase {
        GlyphDatabase::from_glyphs([
            Glyph::new(
                'A' as u32,
                vec![
                    Stroke::new(0, 0, Pen::Up),
                    Stroke::new(5, 10, Pen::Down),
                    Stroke::new(10, 0, Pen::Down),
                ],
            ),
            Glyph::new(
                'B' as u32,
                vec![Stroke::new(0, 0, Pen::Up), Stroke::new(6, 8, Pen::Down)],
            ),
            Glyph::new(
                'W' as u32,
                vec![Stroke::new(0, 0, Pen::Up), Stroke::new(60, 0, Pen::Down)],
            ),
        ])
    }

    fn mv(x: f32, y: f32, drawing: bool) -> MotionCommand {
        Move { x, y, drawing }
    }

    fn unit_settings(max_line_width: f32) -> LayoutSettings {
        LayoutSettings::new(1.0, max_line_width, 18.0)
    }

    fn moves(commands: &[MotionCommand]) -> Vec<(f32, f32)> {
        commands
            .iter()
            .filter_map(|command| match command {
                Move { x, y, .. } => Some((*x, *y)),
                SetPen(_) => None,
            })
            .collect()
    }

    #[test]
    fn two_glyph_word_lays_out_side_by_side() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(100.0));
        let report = engine.layout("AB");

        assert_eq!(
            report.commands,
            vec![
                SetPen(Pen::Up),
                mv(0.0, 0.0, false),
                SetPen(Pen::Down),
                mv(5.0, 10.0, true),
                mv(10.0, 0.0, true),
                SetPen(Pen::Up),
                mv(10.0, 0.0, false),
                SetPen(Pen::Down),
                mv(16.0, 8.0, true),
                SetPen(Pen::Up),
                mv(0.0, 0.0, false),
            ]
        );
        assert_eq!(report.lines, 1);
        assert!(report.misses.is_empty());
    }

    #[test]
    fn empty_text_only_parks_the_pen() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(100.0));
        assert_eq!(
            engine.commands(""),
            vec![SetPen(Pen::Up), mv(0.0, 0.0, false)]
        );
        assert_eq!(
            engine.commands("  \n "),
            vec![SetPen(Pen::Up), mv(0.0, 0.0, false)]
        );
    }

    #[test]
    fn overflowing_second_word_wraps_before_drawing() {
        let db = font();
        // A is 10 wide, gap 4, B would end at 20 > 15.
        let engine = LayoutEngine::new(&db, unit_settings(15.0));
        let report = engine.layout("A B");

        assert_eq!(report.lines, 2);
        let points = moves(&report.commands);
        assert_eq!(points[3], (0.0, -18.0));
        assert_eq!(points[4], (6.0, -10.0));
    }

    #[test]
    fn fitting_words_share_a_line() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(100.0));
        let report = engine.layout("A B");

        assert_eq!(report.lines, 1);
        // B starts after A's advance plus the four unit gap.
        assert_eq!(moves(&report.commands)[3], (14.0, 0.0));
    }

    #[test]
    fn newline_forces_a_break_independent_of_width() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(1000.0));
        let report = engine.layout("A\nB");

        assert_eq!(report.lines, 2);
        assert_eq!(moves(&report.commands)[3], (0.0, -18.0));
    }

    #[test]
    fn blank_lines_each_advance_the_baseline() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(1000.0));
        let report = engine.layout("A\n\nB");
        assert_eq!(moves(&report.commands)[3], (0.0, -36.0));
    }

    #[test]
    fn oversized_word_is_drawn_whole_without_blank_line() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(50.0));
        let report = engine.layout("WW");

        assert_eq!(report.lines, 1);
        let points = moves(&report.commands);
        assert_eq!(points[1], (60.0, 0.0));
        assert_eq!(points[2], (60.0, 0.0));
        assert_eq!(points[3], (120.0, 0.0));
    }

    #[test]
    fn oversized_word_after_text_gets_its_own_line() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(50.0));
        let report = engine.layout("A WW B");

        assert_eq!(report.lines, 3);
        let points = moves(&report.commands);
        assert_eq!(points[3], (0.0, -18.0));
        assert_eq!(points[6], (120.0, -18.0));
        assert_eq!(points[7], (0.0, -36.0));
    }

    #[test]
    fn unknown_character_is_skipped_with_zero_width() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(100.0));
        let with_miss = engine.layout("A?B");
        let without = engine.layout("AB");

        assert_eq!(with_miss.commands, without.commands);
        assert_eq!(with_miss.misses, vec![GlyphMiss { ch: '?', position: 1 }]);
    }

    #[test]
    fn lone_unknown_character_leaves_cursor_at_origin() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(100.0));
        assert_eq!(engine.word_width("é"), 0.0);
        let report = engine.layout("é");
        assert_eq!(report.commands, vec![SetPen(Pen::Up), mv(0.0, 0.0, false)]);
        assert_eq!(report.misses.len(), 1);
    }

    #[test]
    fn pen_state_is_only_emitted_on_transitions() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(40.0));
        for text in ["", "A", "AB BA", "A\nB\n\nWW A", "?? A?B W"] {
            let commands = engine.commands(text);
            let pens: Vec<Pen> = commands
                .iter()
                .filter_map(|command| match command {
                    SetPen(pen) => Some(*pen),
                    Move { .. } => None,
                })
                .collect();
            for pair in pens.windows(2) {
                assert_ne!(pair[0], pair[1], "repeated pen state for {text:?}");
            }
        }
    }

    #[test]
    fn every_run_ends_pen_up_at_origin() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(40.0));
        for text in ["", "A", "AB BA", "A\nB", "W W W"] {
            let commands = engine.commands(text);
            let tail = &commands[commands.len() - 2..];
            assert_eq!(tail, &[SetPen(Pen::Up), mv(0.0, 0.0, false)], "{text:?}");
        }
    }

    #[test]
    fn drawing_flag_follows_stroke_pen() {
        let db = font();
        let engine = LayoutEngine::new(&db, unit_settings(100.0));
        let mut pen = None;
        for command in engine.commands("AB A") {
            match command {
                SetPen(next) => pen = Some(next),
                Move { drawing, .. } => assert_eq!(Some(drawing), pen.map(Pen::is_down)),
            }
        }
    }

    #[test]
    fn scale_multiplies_stroke_offsets() {
        let db = font();
        let settings = LayoutSettings::new(0.5, 100.0, 9.0);
        let engine = LayoutEngine::new(&db, settings);
        let points = moves(&engine.commands("A A"));
        assert_eq!(points[1], (2.5, 5.0));
        // 10 * 0.5 advance plus 4 * 0.5 gap.
        assert_eq!(points[3], (7.0, 0.0));
    }
}
