use crate::glyph::Pen;
use crate::layout::MotionCommand;
use crate::wire;

/// Machine parameters baked into the encoded commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    /// `S` value that lowers the pen.
    pub pen_down_power: u32,
    pub feed_rate: u32,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            pen_down_power: 1000,
            feed_rate: 1000,
        }
    }
}

/// Stateless G-code encoder.
#[derive(Debug, Clone, Default)]
pub struct GcodeEncoder {
    settings: EncoderSettings,
}

impl GcodeEncoder {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    pub fn encode(&self, command: &MotionCommand) -> String {
        match *command {
            MotionCommand::SetPen(Pen::Down) => wire::pen_power(self.settings.pen_down_power),
            MotionCommand::SetPen(Pen::Up) => wire::pen_power(0),
            MotionCommand::Move { x, y, drawing: true } => wire::linear_move(x, y),
            MotionCommand::Move { x, y, drawing: false } => wire::rapid_move(x, y),
        }
    }

    /// Setup issued once before any drawing: feed rate, actuator on, pen up.
    pub fn preamble(&self) -> Vec<String> {
        vec![
            wire::feed_move_home(self.settings.feed_rate),
            wire::spindle_on().to_string(),
            wire::pen_power(0),
        ]
    }

    /// Encode `commands` after the preamble. A leading pen-up is dropped
    /// since the preamble already leaves the pen up.
    pub fn program(&self, commands: &[MotionCommand]) -> Program {
        let commands = match commands.split_first() {
            Some((MotionCommand::SetPen(Pen::Up), rest)) => rest,
            _ => commands,
        };
        Program {
            preamble: self.preamble(),
            body: commands.iter().map(|command| self.encode(command)).collect(),
        }
    }
}

/// Encoded lines ready for streaming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub preamble: Vec<String>,
    pub body: Vec<String>,
}

impl Program {
    /// Preamble followed by body, in send order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.preamble
            .iter()
            .chain(self.body.iter())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.preamble.len() + self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
