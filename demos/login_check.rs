// Login check: connect to a single controller and report the handshake result
//
// Sends only the unlock frame, never a motor command - no movement.
//
// Usage: cargo run --example login_check -- [address:port]
// Example: cargo run --example login_check -- 192.168.1.3:5001

use smsd_link::config::LEFT_ENDPOINT;
use smsd_link::motor::smsd::ACCESS_GRANTED;
use smsd_link::motor::{open_channel, LoginState};
use std::net::SocketAddr;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    // Get endpoint from args or use default
    let endpoint: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| LEFT_ENDPOINT.to_string())
        .parse()?;

    println!("SMSD login check (no motor commands are sent)");
    println!("Controller: {}", endpoint);
    println!();

    println!("Step 1: Connecting and sending unlock key...");
    let session = match open_channel(&endpoint.ip().to_string(), endpoint.port()) {
        Ok(session) => session,
        Err(e) => {
            println!("  ✗ {}", e);
            println!();
            println!("Troubleshooting:");
            println!("  - Check the controller is powered and on the same subnet");
            println!("  - Verify the address and port in the controller settings");
            return Err(e.into());
        }
    };
    println!();

    println!("Step 2: Login result");
    match session.login_state() {
        LoginState::Ready => println!("  ✓ Access granted"),
        LoginState::Degraded => println!(
            "  ✗ Access denied: code 0x{:02X} (expected 0x{:02X})",
            session.access_code(),
            ACCESS_GRANTED
        ),
    }

    Ok(())
}
