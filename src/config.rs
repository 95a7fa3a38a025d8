// Endpoints and console settings

// Controller endpoints: left motor is channel A, right motor is channel B
pub const LEFT_ENDPOINT: &str = "192.168.1.2:5000";
pub const RIGHT_ENDPOINT: &str = "192.168.1.3:5001";

// Console prompt shown before each command in text mode
pub const PROMPT: &str = "Enter command (B - backward, S - stop, F - forward, E - exit) : ";

// Speed used when a drive command omits one (clamped up to the controller minimum)
pub const DEFAULT_SPEED: u32 = 0;
