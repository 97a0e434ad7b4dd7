//! G-code line helpers for the plotting robot.
//!
//! These wrap the handful of commands the robot understands so call sites do
//! not hand-roll command text. Lines carry no trailing newline; transports
//! add the line terminator.

/// Move without marking, at rapid speed.
pub fn rapid_move(x: f32, y: f32) -> String {
    format!("G0 X{x:.2} Y{y:.2}")
}

/// Move in a straight line at the programmed feed rate.
pub fn linear_move(x: f32, y: f32) -> String {
    format!("G1 X{x:.2} Y{y:.2}")
}

/// Set the pen actuator power. Zero lifts the pen.
pub fn pen_power(power: u32) -> String {
    format!("S{power}")
}

/// Linear move to the origin that also programs the feed rate.
pub fn feed_move_home(feed_rate: u32) -> String {
    format!("G1 X0 Y0 F{feed_rate}")
}

/// Enable the pen actuator.
pub fn spindle_on() -> &'static str {
    "M3"
}

/// Bare line sent to wake the controller before the ready handshake.
pub fn wake() -> &'static str {
    ""
}

/// Substring the controller prints once it is ready for commands.
pub const READY_TOKEN: char = '$';

/// Reply acknowledging a processed command.
pub const ACK_REPLY: &str = "ok";

/// Prefix of a reply rejecting a command.
pub const ERROR_PREFIX: &str = "error";
