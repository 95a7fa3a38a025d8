// SMSD stepper driver TCP protocol implementation
//
// Every message shares one envelope:
// [Checksum, Version=3, CommandType, CommandId, DataLength (u16 LE), Payload...]
// The checksum covers Version through the last payload byte.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::net::TcpStream;
use tracing::{debug, info, warn};

/// Size of the fixed frame header
pub const HEADER_LEN: usize = 6;

/// Protocol revision spoken by the controllers
pub const PROTOCOL_VERSION: u8 = 3;

/// Device unlock key sent during login
pub const UNLOCK_KEY: [u8; 8] = [0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01];

/// Access-result code meaning the controller accepted the unlock key
pub const ACCESS_GRANTED: u8 = 0x01;

/// Bytes read for the unsolicited greeting (bare header, no payload)
pub const GREETING_LEN: usize = HEADER_LEN;
/// Bytes read for the login reply (header + 7 byte payload)
pub const LOGIN_REPLY_LEN: usize = HEADER_LEN + 7;
/// Bytes read for the status reply to every motor command (header + 7 byte payload)
pub const STATUS_REPLY_LEN: usize = HEADER_LEN + 7;

/// Offset of the access-result byte within the login reply
const ACCESS_BYTE_OFFSET: usize = 8;

/// Motion operand limits (steps/s)
pub const MIN_SPEED: u32 = 15;
pub const MAX_SPEED: u32 = 15600;

// Command word bit layout, least significant bit first:
// [reserved:3][action:1][opcode:6][operand:22]
const ACTION_SHIFT: u32 = 3;
const OPCODE_SHIFT: u32 = 4;
const OPCODE_MASK: u32 = 0x3F;
const OPERAND_SHIFT: u32 = 10;
const OPERAND_MASK: u32 = 0x3F_FFFF;

/// Frame command types
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Unlock = 0,
    LoginReply = 1,
    Motor = 2,
}

impl CommandType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unlock),
            1 => Some(Self::LoginReply),
            2 => Some(Self::Motor),
            _ => None,
        }
    }
}

/// Motor opcodes carried in a command word
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    RunForward = 0x0E, // motor-relative rotation direction
    RunReverse = 0x0F,
    Stop = 0x22, // immediate stop
}

/// Error types for SMSD communication
#[derive(Debug, thiserror::Error)]
pub enum SmsdError {
    #[error("Failed to connect to controller at {addr}: {source}")]
    ConnectFailure {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Controller at {addr} denied access (code 0x{code:02X})")]
    HandshakeDenied { addr: String, code: u8 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated frame header: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Invalid direction: {0:?}")]
    InvalidDirection(String),
}

pub type Result<T> = std::result::Result<T, SmsdError>;

/// 8-bit additive checksum with final inversion.
///
/// Starts from 0xFF, adds every byte with wraparound and returns the complement.
pub fn checksum(span: &[u8]) -> u8 {
    span.iter().fold(0xFF_u8, |acc, &b| acc.wrapping_add(b)) ^ 0xFF
}

/// Parsed fixed header of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub checksum: u8,
    pub protocol_version: u8,
    pub command_type: u8,
    pub command_id: u8,
    pub data_length: u16,
}

impl FrameHeader {
    /// Parse the 6-byte header prefix. The checksum is not verified.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(SmsdError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            checksum: bytes[0],
            protocol_version: bytes[1],
            command_type: bytes[2],
            command_id: bytes[3],
            data_length: u16::from_le_bytes([bytes[4], bytes[5]]),
        })
    }

    pub fn kind(&self) -> Option<CommandType> {
        CommandType::from_u8(self.command_type)
    }
}

/// An outgoing protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command_type: CommandType,
    command_id: u8,
    payload: Vec<u8>,
}

impl Frame {
    pub fn new(command_type: CommandType, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > u16::MAX as usize {
            return Err(SmsdError::PayloadTooLarge {
                size: payload.len(),
                max: u16::MAX as usize,
            });
        }

        Ok(Self {
            command_type,
            command_id: 0,
            payload,
        })
    }

    /// Login credential frame carrying the fixed unlock key
    pub fn unlock() -> Self {
        Self {
            command_type: CommandType::Unlock,
            command_id: 0,
            payload: UNLOCK_KEY.to_vec(),
        }
    }

    /// Motor command frame carrying one packed command word
    pub fn command(word: CommandWord) -> Self {
        Self {
            command_type: CommandType::Motor,
            command_id: 0,
            payload: word.to_le_bytes().to_vec(),
        }
    }

    pub fn with_command_id(mut self, command_id: u8) -> Self {
        self.command_id = command_id;
        self
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn data_length(&self) -> u16 {
        // Bounded by the constructors
        self.payload.len() as u16
    }

    /// Total size on the wire (header + payload)
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Serialize to wire bytes, filling in the checksum
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.wire_len());

        bytes.push(0); // checksum placeholder
        bytes.push(PROTOCOL_VERSION);
        bytes.push(self.command_type as u8);
        bytes.push(self.command_id);
        bytes.extend_from_slice(&self.data_length().to_le_bytes());
        bytes.extend_from_slice(&self.payload);

        bytes[0] = checksum(&bytes[1..]);
        bytes
    }
}

/// Recompute the checksum of an encoded frame and compare it with the stored one.
///
/// Diagnostic helper only; replies from the controller are never checked.
pub fn verify_checksum(bytes: &[u8]) -> bool {
    let Ok(header) = FrameHeader::decode(bytes) else {
        return false;
    };
    let end = HEADER_LEN + header.data_length as usize;
    if bytes.len() < end {
        return false;
    }
    checksum(&bytes[1..end]) == header.checksum
}

/// One packed motor instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandWord {
    pub action: bool,
    pub opcode: u8,
    pub operand: u32,
}

impl CommandWord {
    /// Build a motion command; opcode and operand are truncated to their field widths.
    pub fn new(opcode: u8, operand: u32) -> Self {
        Self {
            action: false,
            opcode: opcode & OPCODE_MASK as u8,
            operand: operand & OPERAND_MASK,
        }
    }

    /// Run command with the speed clamped to the controller limits
    pub fn run(opcode: Opcode, speed: u32) -> Self {
        Self::new(opcode as u8, speed.clamp(MIN_SPEED, MAX_SPEED))
    }

    /// Immediate stop; operand 0 bypasses the speed clamp
    pub fn stop() -> Self {
        Self::new(Opcode::Stop as u8, 0)
    }

    pub fn pack(&self) -> u32 {
        ((self.action as u32) << ACTION_SHIFT)
            | ((self.opcode as u32 & OPCODE_MASK) << OPCODE_SHIFT)
            | ((self.operand & OPERAND_MASK) << OPERAND_SHIFT)
    }

    pub fn unpack(word: u32) -> Self {
        Self {
            action: (word >> ACTION_SHIFT) & 1 == 1,
            opcode: ((word >> OPCODE_SHIFT) & OPCODE_MASK) as u8,
            operand: (word >> OPERAND_SHIFT) & OPERAND_MASK,
        }
    }

    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.pack().to_le_bytes()
    }
}

/// Result of the login handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginState {
    Ready,
    Degraded,
}

/// One TCP channel to one SMSD controller
pub struct ChannelSession<S = TcpStream> {
    stream: S,
    peer: String,
    login: LoginState,
    access_code: u8,
}

/// Connect to a controller and run the login handshake
pub fn open_channel(address: &str, port: u16) -> Result<ChannelSession<TcpStream>> {
    let peer = format!("{}:{}", address, port);
    let stream = TcpStream::connect((address, port)).map_err(|source| SmsdError::ConnectFailure {
        addr: peer.clone(),
        source,
    })?;
    info!("Connected to controller on [{}]", peer);

    ChannelSession::handshake(stream, peer)
}

impl<S: Read + Write> ChannelSession<S> {
    /// Take ownership of an established transport and log in.
    ///
    /// A denied login is not an error: the session comes back `Degraded`
    /// with the connection still open.
    pub fn handshake(stream: S, peer: impl Into<String>) -> Result<Self> {
        let mut session = Self {
            stream,
            peer: peer.into(),
            login: LoginState::Degraded,
            access_code: 0,
        };

        // Greeting only signals the controller is waiting for credentials
        session.receive(GREETING_LEN)?;

        let code = session.send_and_await(&Frame::unlock(), LOGIN_REPLY_LEN)?;
        session.access_code = code;

        if code == ACCESS_GRANTED {
            info!("Controller on [{}] ready to work", session.peer);
            session.login = LoginState::Ready;
        } else {
            warn!(
                "Controller on [{}] failed to login (code 0x{:02X})",
                session.peer, code
            );
        }

        Ok(session)
    }

    /// Write a frame, then block until `reply_len` bytes have been read.
    ///
    /// Returns the byte at offset 8 of the reply when the reply is long
    /// enough to contain it, otherwise 0.
    pub fn send_and_await(&mut self, frame: &Frame, reply_len: usize) -> Result<u8> {
        self.send(frame)?;
        self.receive(reply_len)
    }

    fn send(&mut self, frame: &Frame) -> Result<()> {
        let bytes = frame.encode();
        debug!("[{}] send {:02X?}", self.peer, bytes);
        self.stream.write_all(&bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self, len: usize) -> Result<u8> {
        let mut buffer = vec![0u8; len];
        self.stream.read_exact(&mut buffer)?;
        debug!("[{}] recv {:02X?}", self.peer, buffer);

        if len > ACCESS_BYTE_OFFSET {
            Ok(buffer[ACCESS_BYTE_OFFSET])
        } else {
            Ok(0)
        }
    }

    /// Fail with `HandshakeDenied` unless the login was accepted
    pub fn ensure_ready(&self) -> Result<()> {
        match self.login {
            LoginState::Ready => Ok(()),
            LoginState::Degraded => Err(SmsdError::HandshakeDenied {
                addr: self.peer.clone(),
                code: self.access_code,
            }),
        }
    }
}

impl<S> ChannelSession<S> {
    pub fn login_state(&self) -> LoginState {
        self.login
    }

    /// Access-result byte returned by the controller during login
    pub fn access_code(&self) -> u8 {
        self.access_code
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
