// Message types for the console runtime

use serde::{Deserialize, Serialize};

use crate::motor::{ChannelSession, Direction, LoginState};

// Drive request accepted in JSON console mode
// e.g. {"direction": "forward", "speed": 400}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveCommand {
    pub direction: Direction,
    #[serde(default)]
    pub speed: u32,
}

/// Which motor a channel drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSide {
    Left,
    Right,
}

/// Login status of one channel, as reported by the `status` console command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReport {
    pub channel: ChannelSide,
    pub peer: String,
    pub login: LoginState,
    pub access_code: u8,
}

impl ChannelReport {
    pub fn from_session<S>(channel: ChannelSide, session: &ChannelSession<S>) -> Self {
        Self {
            channel,
            peer: session.peer_addr().to_string(),
            login: session.login_state(),
            access_code: session.access_code(),
        }
    }
}
