// Keyboard teleop: F forward, B backward, space/S stop, +/- speed, Q quit
//
// Usage: cargo run --example teleop -- [left address:port] [right address:port]
//
// Commands are sent once per key press; the controllers keep running at the
// last speed until told otherwise, so Q always stops both motors on the way out.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use smsd_link::config::{LEFT_ENDPOINT, RIGHT_ENDPOINT};
use smsd_link::motor::{Direction, DualMotorDriver};
use std::net::SocketAddr;
use tracing::info;

const SPEEDS: [u32; 3] = [200, 1000, 4000]; // steps/s
const SPEED_LABELS: [&str; 3] = ["LOW", "MED", "HIGH"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let mut args = std::env::args().skip(1);
    let left: SocketAddr = args
        .next()
        .unwrap_or_else(|| LEFT_ENDPOINT.to_string())
        .parse()?;
    let right: SocketAddr = args
        .next()
        .unwrap_or_else(|| RIGHT_ENDPOINT.to_string())
        .parse()?;

    let mut driver = DualMotorDriver::connect(left, right)?;
    info!("Login states: {:?}", driver.login_states());
    info!("Controls: F=forward, B=backward, Space/S=stop, +/-=speed, Q=quit");
    print_speed(0);

    enable_raw_mode()?;
    let result = run_teleop(&mut driver);
    disable_raw_mode()?;

    result
}

fn run_teleop(driver: &mut DualMotorDriver) -> Result<(), Box<dyn std::error::Error>> {
    let mut speed_idx: usize = 0;

    loop {
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }

        match code {
            KeyCode::Char('f') | KeyCode::Up => driver.drive(Direction::Forward, SPEEDS[speed_idx])?,
            KeyCode::Char('b') | KeyCode::Down => {
                driver.drive(Direction::Backward, SPEEDS[speed_idx])?
            }
            KeyCode::Char('s') | KeyCode::Char(' ') => driver.stop()?,

            // Speed control
            KeyCode::Char('+') | KeyCode::Char('=') => {
                speed_idx = (speed_idx + 1).min(SPEEDS.len() - 1);
                print_speed(speed_idx);
            }
            KeyCode::Char('-') => {
                speed_idx = speed_idx.saturating_sub(1);
                print_speed(speed_idx);
            }

            // Quit
            KeyCode::Char('q') | KeyCode::Esc => {
                driver.stop()?;
                break;
            }

            _ => {}
        }
    }

    Ok(())
}

fn print_speed(idx: usize) {
    info!("Speed: {} ({} steps/s)", SPEED_LABELS[idx], SPEEDS[idx]);
}
