use std::io;
use std::net::SocketAddr;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use smsd_link::config::{LEFT_ENDPOINT, RIGHT_ENDPOINT};
use smsd_link::motor::{DualMotorDriver, LoginState, Result};
use smsd_link::runtime::{InputMode, Runtime};

/// Console control for a pair of SMSD stepper controllers
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Left motor controller (channel A)
    #[arg(long, default_value = LEFT_ENDPOINT)]
    left: SocketAddr,

    /// Right motor controller (channel B)
    #[arg(long, default_value = RIGHT_ENDPOINT)]
    right: SocketAddr,

    /// Abort if either controller rejects the login
    #[arg(long)]
    require_login: bool,

    /// Read JSON drive commands and print status as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("Runtime error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let driver = DualMotorDriver::connect(args.left, args.right)?;

    for (endpoint, session) in [(args.left, driver.left()), (args.right, driver.right())] {
        match session.login_state() {
            LoginState::Ready => println!("Controller on [{}] ready to work", endpoint),
            LoginState::Degraded => println!("Controller on [{}] failed to login", endpoint),
        }
        if args.require_login {
            session.ensure_ready()?;
        }
    }

    let mode = if args.json {
        InputMode::Json
    } else {
        InputMode::Text
    };

    let stdin = io::stdin();
    Runtime::new(driver, mode).run(stdin.lock(), io::stdout())
}
