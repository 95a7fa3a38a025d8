// Interactive console loop
// Reads one command per line and dispatches it to the motor driver.
// Text mode: "F 400", "B 120", "S", "E", "status" (case-insensitive)
// JSON mode: {"direction": "forward", "speed": 400} per line

use std::io::{BufRead, Write};
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_SPEED, PROMPT};
use crate::messages::{ChannelReport, ChannelSide, DriveCommand};
use crate::motor::{Direction, DualMotorDriver, LoginState, Result};

/// How console lines are parsed and status is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Text,
    Json,
}

/// A parsed console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Drive(Direction, u32),
    Stop,
    Status,
    Exit,
}

impl From<DriveCommand> for ConsoleCommand {
    fn from(cmd: DriveCommand) -> Self {
        match cmd.direction {
            Direction::Stop => Self::Stop,
            direction => Self::Drive(direction, cmd.speed),
        }
    }
}

/// Parse a text console line. Unknown input yields `None` and is ignored.
pub fn parse_line(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("status") {
        return Some(ConsoleCommand::Status);
    }

    let mut chars = line.chars();
    let key = chars.next()?;
    let rest = chars.as_str().trim();

    match key.to_ascii_lowercase() {
        'e' => Some(ConsoleCommand::Exit),
        's' => Some(ConsoleCommand::Stop),
        'f' | 'b' => {
            let direction = Direction::from_key(key)?;
            let speed = if rest.is_empty() {
                DEFAULT_SPEED
            } else {
                match rest.parse::<u32>() {
                    Ok(speed) => speed,
                    Err(e) => {
                        warn!("Invalid speed {:?}: {}", rest, e);
                        return None;
                    }
                }
            };
            Some(ConsoleCommand::Drive(direction, speed))
        }
        _ => None,
    }
}

/// Parse a JSON console line; bare text commands are still accepted
pub fn parse_json_line(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    if !line.starts_with('{') {
        return parse_line(line);
    }

    match serde_json::from_str::<DriveCommand>(line) {
        Ok(cmd) => Some(cmd.into()),
        Err(e) => {
            warn!("Failed to parse command: {}", e);
            None
        }
    }
}

pub struct Runtime<S> {
    driver: DualMotorDriver<S>,
    mode: InputMode,
}

impl<S: std::io::Read + Write> Runtime<S> {
    pub fn new(driver: DualMotorDriver<S>, mode: InputMode) -> Self {
        Self { driver, mode }
    }

    /// Process one command. Returns false once the console should exit.
    fn on_command<W: Write>(&mut self, cmd: ConsoleCommand, output: &mut W) -> Result<bool> {
        debug!("Console command: {:?}", cmd);
        match cmd {
            ConsoleCommand::Drive(direction, speed) => self.driver.drive(direction, speed)?,
            ConsoleCommand::Stop => self.driver.stop()?,
            ConsoleCommand::Status => self.write_status(output)?,
            ConsoleCommand::Exit => return Ok(false),
        }
        Ok(true)
    }

    fn write_status<W: Write>(&self, output: &mut W) -> Result<()> {
        let reports = [
            ChannelReport::from_session(ChannelSide::Left, self.driver.left()),
            ChannelReport::from_session(ChannelSide::Right, self.driver.right()),
        ];

        for report in &reports {
            match self.mode {
                InputMode::Json => {
                    let json = serde_json::to_string(report).map_err(std::io::Error::from)?;
                    writeln!(output, "{}", json)?;
                }
                InputMode::Text => {
                    let state = match report.login {
                        LoginState::Ready => "ready to work",
                        LoginState::Degraded => "failed to login",
                    };
                    writeln!(output, "Controller on [{}] {}", report.peer, state)?;
                }
            }
        }
        Ok(())
    }

    /// Run until `E`, end of input, or the first I/O failure
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        info!("Console started ({:?} mode)", self.mode);
        let mut lines = input.lines();

        loop {
            if self.mode == InputMode::Text {
                write!(output, "{}", PROMPT)?;
                output.flush()?;
            }

            let Some(line) = lines.next() else {
                info!("End of input, leaving console");
                return Ok(());
            };
            let line = line?;

            let cmd = match self.mode {
                InputMode::Text => parse_line(&line),
                InputMode::Json => parse_json_line(&line),
            };
            let Some(cmd) = cmd else {
                continue;
            };

            if !self.on_command(cmd, &mut output)? {
                info!("Exit requested");
                return Ok(());
            }
        }
    }

    pub fn into_driver(self) -> DualMotorDriver<S> {
        self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::smsd::tests::{login_script, ScriptedStream};
    use crate::motor::smsd::{CommandWord, ACCESS_GRANTED, STATUS_REPLY_LEN};
    use crate::motor::ChannelSession;

    fn runtime(replies: usize, mode: InputMode) -> Runtime<ScriptedStream> {
        let make = |name: &str, access: u8| {
            let mut script = login_script(access);
            script.extend_from_slice(&vec![0u8; STATUS_REPLY_LEN * replies]);
            ChannelSession::handshake(ScriptedStream::new(script), name).unwrap()
        };
        let driver = DualMotorDriver::new(make("left:1", ACCESS_GRANTED), make("right:2", 0x00));
        Runtime::new(driver, mode)
    }

    fn left_opcodes(runtime: Runtime<ScriptedStream>) -> Vec<(u8, u32)> {
        let (left, _) = runtime.into_driver().into_channels();
        let stream = left.into_inner();
        stream.written[14..]
            .chunks(10)
            .map(|frame| {
                let word = CommandWord::unpack(u32::from_le_bytes([
                    frame[6], frame[7], frame[8], frame[9],
                ]));
                (word.opcode, word.operand)
            })
            .collect()
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("F 100"),
            Some(ConsoleCommand::Drive(Direction::Forward, 100))
        );
        assert_eq!(
            parse_line("b250"),
            Some(ConsoleCommand::Drive(Direction::Backward, 250))
        );
        assert_eq!(
            parse_line("f"),
            Some(ConsoleCommand::Drive(Direction::Forward, DEFAULT_SPEED))
        );
        assert_eq!(parse_line(" s "), Some(ConsoleCommand::Stop));
        assert_eq!(parse_line("E"), Some(ConsoleCommand::Exit));
        assert_eq!(parse_line("STATUS"), Some(ConsoleCommand::Status));
        assert_eq!(parse_line("F fast"), None);
        assert_eq!(parse_line("x 10"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_parse_json_line() {
        assert_eq!(
            parse_json_line(r#"{"direction": "backward", "speed": 77}"#),
            Some(ConsoleCommand::Drive(Direction::Backward, 77))
        );
        assert_eq!(
            parse_json_line(r#"{"direction": "stop"}"#),
            Some(ConsoleCommand::Stop)
        );
        assert_eq!(parse_json_line(r#"{"direction": "up"}"#), None);
        assert_eq!(parse_json_line("e"), Some(ConsoleCommand::Exit));
    }

    #[test]
    fn test_run_text_session() {
        let mut rt = runtime(3, InputMode::Text);
        let input = "F 100\nhello\nB 20000\nS\nE\nF 300\n";
        let mut output = Vec::new();
        rt.run(input.as_bytes(), &mut output).unwrap();

        // Commands after E are never sent
        assert_eq!(
            left_opcodes(rt),
            vec![(0x0E, 100), (0x0F, 15600), (0x22, 0)]
        );
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches(PROMPT).count(), 5);
    }

    #[test]
    fn test_run_stops_at_end_of_input() {
        let mut rt = runtime(1, InputMode::Json);
        let input = "{\"direction\":\"forward\",\"speed\":5}\n";
        rt.run(input.as_bytes(), Vec::new()).unwrap();
        assert_eq!(left_opcodes(rt), vec![(0x0E, 15)]);
    }

    #[test]
    fn test_run_propagates_io_failure() {
        // No status replies scripted: the first command hits end of stream
        let mut rt = runtime(0, InputMode::Text);
        let result = rt.run("F 100\nS\n".as_bytes(), Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_status_text_and_json() {
        let mut rt = runtime(0, InputMode::Text);
        let mut output = Vec::new();
        rt.run("status\n".as_bytes(), &mut output).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Controller on [left:1] ready to work"));
        assert!(output.contains("Controller on [right:2] failed to login"));

        let mut rt = runtime(0, InputMode::Json);
        let mut output = Vec::new();
        rt.run("status\n".as_bytes(), &mut output).unwrap();
        let reports: Vec<ChannelReport> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].channel, ChannelSide::Left);
        assert_eq!(reports[0].login, LoginState::Ready);
        assert_eq!(reports[1].login, LoginState::Degraded);
        assert_eq!(reports[1].access_code, 0);
    }
}
