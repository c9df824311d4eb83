// Send a single command frame to the robot, then stop it
//
// Usage:
//   cargo run --example send_frame -- stop
//   cargo run --example send_frame -- forward --hold-ms 500
//   cargo run --example send_frame -- --motors 100,-100 --hold-ms 300
//
// Safety features:
// - Explicit confirmation before any write
// - Continuous commands are always followed by a stop frame

use clap::Parser;
use pisibot_teleop::config::{DEFAULT_BAUDRATE, DEFAULT_PORT, WRITE_TIMEOUT};
use pisibot_teleop::dispatch::FrameSink;
use pisibot_teleop::frame::{self, CommandKind, Frame, ROBOT_ID};
use pisibot_teleop::serial::SerialLink;
use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

#[derive(Debug, Parser)]
struct Args {
    /// forward, backward, right, left, 2m-forward, 2m-backward or stop
    #[arg(required_unless_present = "motors")]
    frame: Option<String>,

    /// Custom motor_set "LEFT,RIGHT" instead of a named frame
    #[arg(long, conflicts_with = "frame", value_delimiter = ',', allow_hyphen_values = true)]
    motors: Option<Vec<i16>>,

    /// How long to keep a continuous command running before the stop frame
    #[arg(long, default_value_t = 300)]
    hold_ms: u64,

    #[arg(long, default_value = DEFAULT_PORT)]
    port: String,

    #[arg(long, default_value_t = DEFAULT_BAUDRATE)]
    baud_rate: u32,
}

fn named_frame(name: &str) -> Option<Frame> {
    match name {
        "forward" => Some(frame::FORWARD),
        "backward" => Some(frame::BACKWARD),
        "right" => Some(frame::TURN_RIGHT),
        "left" => Some(frame::TURN_LEFT),
        "2m-forward" => Some(frame::DISTANCE_FORWARD),
        "2m-backward" => Some(frame::DISTANCE_BACKWARD),
        "stop" => Some(frame::STOP),
        _ => None,
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // (bytes, needs a stop frame afterwards)
    let (bytes, continuous) = match (&args.frame, &args.motors) {
        (_, Some(motors)) => {
            if motors.len() != 2 {
                return Err("--motors takes exactly two values: LEFT,RIGHT".into());
            }
            (frame::encode(ROBOT_ID, CommandKind::Motors, motors)?, true)
        }
        (Some(name), None) => {
            let named = named_frame(name).ok_or_else(|| format!("Unknown frame: {}", name))?;
            let continuous = ![frame::STOP, frame::DISTANCE_FORWARD, frame::DISTANCE_BACKWARD]
                .contains(&named);
            (named.bytes.to_vec(), continuous)
        }
        (None, None) => return Err("Nothing to send".into()),
    };

    println!("Serial port: {}", args.port);
    println!("Frame:       {}", String::from_utf8_lossy(&bytes));
    if continuous {
        println!("Stop after:  {}ms", args.hold_ms);
    }
    println!();

    if !confirm("Is the robot free to move?")? {
        println!("Aborted.");
        return Ok(());
    }

    let mut link = SerialLink::open(&args.port, args.baud_rate, WRITE_TIMEOUT)?;
    link.send(&bytes)?;
    println!("✓ Sent");

    if continuous {
        sleep(Duration::from_millis(args.hold_ms));
        link.send(frame::STOP.bytes)?;
        println!("✓ Stop sent");
    }

    link.close()?;
    Ok(())
}
