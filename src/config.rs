// Serial port, loop timing and CLI overrides
use std::time::Duration;

use clap::Parser;

use crate::terminal::HoldTimeouts;

// Serial device the radio bridge enumerates as
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUDRATE: u32 = 9600;

// Writes blocked for longer than this are treated as a dead link
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

// Minimum spacing between two polls of the keyboard (busy-waited, not slept)
pub const THROTTLE_MS: u64 = 10;

// Terminals without key release reporting: a key counts as held until no
// press/repeat arrived in time. Before the first repeat the wait must exceed
// the auto-repeat delay (X11 default 660 ms); once repeating, it must exceed
// the repeat period (X11 default 40 ms).
pub const FIRST_REPEAT_TIMEOUT_MS: u64 = 1000;
pub const HOLD_TIMEOUT_MS: u64 = 150;

/// Drive a PisiBot over serial with the keyboard.
///
/// Keys: k=forward, j=backward, l=turn right, h=turn left,
/// 9=drive 2 m forward, 8=drive 2 m backward, q=quit
#[derive(Debug, Clone, Parser)]
#[command(name = "pisibot-teleop", version)]
pub struct Config {
    /// Serial device path
    #[arg(long, default_value = DEFAULT_PORT)]
    pub port: String,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUDRATE)]
    pub baud_rate: u32,

    /// Minimum milliseconds between keyboard polls
    #[arg(long, default_value_t = THROTTLE_MS)]
    pub throttle_ms: u64,

    /// Milliseconds to wait for the first auto-repeat of a fresh key press
    /// (only used when the terminal cannot report releases)
    #[arg(long, default_value_t = FIRST_REPEAT_TIMEOUT_MS)]
    pub first_repeat_ms: u64,

    /// Milliseconds between repeats before a repeating key counts as released
    /// (only used when the terminal cannot report releases)
    #[arg(long, default_value_t = HOLD_TIMEOUT_MS)]
    pub hold_timeout_ms: u64,
}

impl Config {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn hold_timeouts(&self) -> HoldTimeouts {
        HoldTimeouts {
            first_repeat: Duration::from_millis(self.first_repeat_ms),
            repeat: Duration::from_millis(self.hold_timeout_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUDRATE,
            throttle_ms: THROTTLE_MS,
            first_repeat_ms: FIRST_REPEAT_TIMEOUT_MS,
            hold_timeout_ms: HOLD_TIMEOUT_MS,
        }
    }
}
