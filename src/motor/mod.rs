// Motor control module for the SMSD two-motor base
//
// Provides:
// - SMSD TCP protocol (frames, checksum, command words, login)
// - Direction mapping (whole-unit direction -> per-motor command words)
// - High-level dual-channel driver API

mod driver;
pub mod kinematics;
pub mod smsd;

pub use driver::DualMotorDriver;
pub use kinematics::{direction_to_wheel_commands, Direction, WheelCommands};
pub use smsd::{open_channel, ChannelSession, LoginState, Result, SmsdError};
