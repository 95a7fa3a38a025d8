// Differential drive mapping for the two-motor base
// Converts a whole-unit direction + speed into one command word per motor.
//
// The motors are mounted facing opposite ways, so driving the unit forward
// spins the left motor with RunForward and the right motor with RunReverse.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::smsd::{CommandWord, Opcode, SmsdError, MAX_SPEED, MIN_SPEED};

/// Whole-unit travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    Stop,
}

impl Direction {
    /// Console key: f/F, b/B, s/S
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'f' => Some(Self::Forward),
            'b' => Some(Self::Backward),
            's' => Some(Self::Stop),
            _ => None,
        }
    }
}

impl FromStr for Direction {
    type Err = SmsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f" | "forward" => Ok(Self::Forward),
            "b" | "backward" => Ok(Self::Backward),
            "s" | "stop" => Ok(Self::Stop),
            _ => Err(SmsdError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// Command words for the two motors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelCommands {
    pub left: CommandWord,  // channel A
    pub right: CommandWord, // channel B
}

impl WheelCommands {
    pub fn new(left: CommandWord, right: CommandWord) -> Self {
        Self { left, right }
    }

    /// Immediate stop on both motors
    pub fn stop() -> Self {
        Self::new(CommandWord::stop(), CommandWord::stop())
    }
}

/// Clamp a requested speed to the range the controllers accept
pub fn clamp_speed(speed: u32) -> u32 {
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// Convert a whole-unit direction and speed to per-motor command words
///
/// Speeds are clamped to `[MIN_SPEED, MAX_SPEED]`. `Stop` ignores the speed
/// and yields the immediate-stop opcode with operand 0 on both motors.
pub fn direction_to_wheel_commands(direction: Direction, speed: u32) -> WheelCommands {
    match direction {
        Direction::Forward => WheelCommands::new(
            CommandWord::run(Opcode::RunForward, speed),
            CommandWord::run(Opcode::RunReverse, speed),
        ),
        Direction::Backward => WheelCommands::new(
            CommandWord::run(Opcode::RunReverse, speed),
            CommandWord::run(Opcode::RunForward, speed),
        ),
        Direction::Stop => WheelCommands::stop(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_mapping() {
        let wheels = direction_to_wheel_commands(Direction::Forward, 500);
        assert_eq!(wheels.left.opcode, 0x0E);
        assert_eq!(wheels.right.opcode, 0x0F);
        assert_eq!(wheels.left.operand, 500);
        assert_eq!(wheels.right.operand, 500);
    }

    #[test]
    fn test_backward_mapping() {
        let wheels = direction_to_wheel_commands(Direction::Backward, 500);
        assert_eq!(wheels.left.opcode, 0x0F);
        assert_eq!(wheels.right.opcode, 0x0E);
    }

    #[test]
    fn test_stop_ignores_speed() {
        let wheels = direction_to_wheel_commands(Direction::Stop, 9000);
        assert_eq!(wheels, WheelCommands::stop());
        assert_eq!(wheels.left.opcode, 0x22);
        assert_eq!(wheels.left.operand, 0);
        assert_eq!(wheels.right.operand, 0);
    }

    #[test]
    fn test_speed_clamped() {
        assert_eq!(clamp_speed(0), 15);
        assert_eq!(clamp_speed(100), 100);
        assert_eq!(clamp_speed(1_000_000), 15600);

        let wheels = direction_to_wheel_commands(Direction::Forward, 0);
        assert_eq!(wheels.left.operand, 15);
        let wheels = direction_to_wheel_commands(Direction::Backward, 1_000_000);
        assert_eq!(wheels.right.operand, 15600);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(Direction::from_key('F'), Some(Direction::Forward));
        assert_eq!(Direction::from_key('b'), Some(Direction::Backward));
        assert_eq!(Direction::from_key('S'), Some(Direction::Stop));
        assert_eq!(Direction::from_key('x'), None);

        assert_eq!("Forward".parse::<Direction>().unwrap(), Direction::Forward);
        assert_eq!(" stop ".parse::<Direction>().unwrap(), Direction::Stop);
        assert!(matches!(
            "left".parse::<Direction>(),
            Err(SmsdError::InvalidDirection(_))
        ));
    }
}
