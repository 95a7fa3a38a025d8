// High-level motor driver for the two-motor SMSD base
//
// Owns one channel per controller and drives them in lockstep:
// the left exchange (send + status reply) always completes before
// the right channel is touched.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use tracing::{debug, info};

use super::kinematics::{clamp_speed, direction_to_wheel_commands, Direction, WheelCommands};
use super::smsd::{open_channel, ChannelSession, Frame, LoginState, Result, STATUS_REPLY_LEN};

/// Dual-channel driver for the left (A) and right (B) motor controllers
pub struct DualMotorDriver<S = TcpStream> {
    left: ChannelSession<S>,
    right: ChannelSession<S>,
}

impl DualMotorDriver<TcpStream> {
    /// Connect and log in to both controllers, left first
    pub fn connect(left: SocketAddr, right: SocketAddr) -> Result<Self> {
        info!("Opening controller channels [{}] and [{}]", left, right);
        let left = open_channel(&left.ip().to_string(), left.port())?;
        let right = open_channel(&right.ip().to_string(), right.port())?;
        Ok(Self::new(left, right))
    }
}

impl<S: Read + Write> DualMotorDriver<S> {
    pub fn new(left: ChannelSession<S>, right: ChannelSession<S>) -> Self {
        Self { left, right }
    }

    /// Drive the whole unit in a direction
    ///
    /// # Arguments
    /// * `direction` - Forward, Backward or Stop
    /// * `speed` - Motor speed, clamped to the controller limits (ignored for Stop)
    pub fn drive(&mut self, direction: Direction, speed: u32) -> Result<()> {
        if direction == Direction::Stop {
            return self.stop();
        }

        debug!("Driving {} at {} (requested {})", direction, clamp_speed(speed), speed);
        self.set_wheel_commands(direction_to_wheel_commands(direction, speed))
    }

    /// Drive from a console key (f/b/s, any case). Unknown keys are ignored.
    pub fn drive_key(&mut self, key: char, speed: u32) -> Result<()> {
        match Direction::from_key(key) {
            Some(direction) => self.drive(direction, speed),
            None => {
                debug!("Ignoring unknown direction key {:?}", key);
                Ok(())
            }
        }
    }

    /// Stop both motors immediately
    pub fn stop(&mut self) -> Result<()> {
        info!("Stopping both motors");
        self.set_wheel_commands(WheelCommands::stop())
    }

    /// Send raw command words: left fully, then right fully
    pub fn set_wheel_commands(&mut self, commands: WheelCommands) -> Result<()> {
        debug!(
            "Setting wheel commands: left={:?}, right={:?}",
            commands.left, commands.right
        );

        self.left
            .send_and_await(&Frame::command(commands.left), STATUS_REPLY_LEN)?;
        self.right
            .send_and_await(&Frame::command(commands.right), STATUS_REPLY_LEN)?;
        Ok(())
    }
}

impl<S> DualMotorDriver<S> {
    /// Login outcome of (left, right)
    pub fn login_states(&self) -> (LoginState, LoginState) {
        (self.left.login_state(), self.right.login_state())
    }

    pub fn left(&self) -> &ChannelSession<S> {
        &self.left
    }

    pub fn right(&self) -> &ChannelSession<S> {
        &self.right
    }

    pub fn into_channels(self) -> (ChannelSession<S>, ChannelSession<S>) {
        (self.left, self.right)
    }
}
