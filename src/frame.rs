// PisiBot radio command frames
//
// Frame format (ASCII): [preamble "0000", ID, Type, Length, Data..., Checksum, 'G']
// ID, Type, Length and Checksum are one byte each, written as two uppercase hex digits.
// Data is a comma-separated list of signed hex arguments ("12C,-C8").
// Checksum = sum of the ASCII codes from ID through the end of Data, mod 255.

use std::fmt::Write as _;

use crate::keys::Key;

pub const PREAMBLE: &[u8; 4] = b"0000";
pub const TERMINATOR: u8 = b'G';

/// Robot ID the continuous drive frames are addressed to
pub const ROBOT_ID: u8 = 0x45;

/// Command types understood by the robot firmware
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    End = 0,
    Drive = 1,
    Turn = 2,
    Motors = 3,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame needs at least one data argument")]
    NoData,

    #[error("Data section is {len} characters, the length byte holds at most 255")]
    DataTooLong { len: usize },
}

/// A pre-encoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub name: &'static str,
    pub bytes: &'static [u8],
}

impl Frame {
    /// Frame text for logging (frames are plain ASCII)
    pub fn as_str(&self) -> &'static str {
        std::str::from_utf8(self.bytes).unwrap_or("<non-ascii frame>")
    }
}

// motor_set 300,300
pub const FORWARD: Frame = Frame {
    name: "forward",
    bytes: b"000045030712C,12CADG",
};

// motor_set -300,-300
pub const BACKWARD: Frame = Frame {
    name: "backward",
    bytes: b"0000450309-12C,-12C0AG",
};

// motor_set 200,-200
pub const TURN_RIGHT: Frame = Frame {
    name: "turn right",
    bytes: b"0000450306C8,-C883G",
};

// motor_set -200,200
pub const TURN_LEFT: Frame = Frame {
    name: "turn left",
    bytes: b"0000450306-C8,C883G",
};

// drive_mm 2000 at power 500, addressed to robot 0x69
pub const DISTANCE_FORWARD: Frame = Frame {
    name: "drive 2 m forward",
    bytes: b"00006901077D0,1F4BBG",
};

// drive_mm -2000 at power 500, addressed to robot 0x69
pub const DISTANCE_BACKWARD: Frame = Frame {
    name: "drive 2 m backward",
    bytes: b"0000690108-7D0,1F4E9G",
};

// END command: drop the active command and stop
pub const STOP: Frame = Frame {
    name: "stop",
    bytes: b"000045000105BG",
};

/// Frame sent on the rising edge of a key (`None` for quit)
pub fn for_key(key: Key) -> Option<Frame> {
    match key {
        Key::Forward => Some(FORWARD),
        Key::Backward => Some(BACKWARD),
        Key::TurnRight => Some(TURN_RIGHT),
        Key::TurnLeft => Some(TURN_LEFT),
        Key::DistanceForward => Some(DISTANCE_FORWARD),
        Key::DistanceBackward => Some(DISTANCE_BACKWARD),
        Key::Quit => None,
    }
}

/// Checksum over ID, type, length and data characters
pub fn checksum(body: &[u8]) -> u8 {
    let sum: u32 = body.iter().map(|&b| b as u32).sum();
    (sum % 255) as u8
}

/// Encode a command frame, terminator included
pub fn encode(robot_id: u8, kind: CommandKind, args: &[i16]) -> Result<Vec<u8>, FrameError> {
    if args.is_empty() {
        return Err(FrameError::NoData);
    }

    let data = args
        .iter()
        .map(|&arg| encode_arg(arg))
        .collect::<Vec<_>>()
        .join(",");
    if data.len() > u8::MAX as usize {
        return Err(FrameError::DataTooLong { len: data.len() });
    }

    let mut body = String::with_capacity(6 + data.len());
    // Writing into a String cannot fail
    let _ = write!(body, "{:02X}{:02X}{:02X}{}", robot_id, kind as u8, data.len(), data);

    let mut frame = Vec::with_capacity(PREAMBLE.len() + body.len() + 3);
    frame.extend_from_slice(PREAMBLE);
    frame.extend_from_slice(body.as_bytes());
    frame.extend_from_slice(format!("{:02X}", checksum(body.as_bytes())).as_bytes());
    frame.push(TERMINATOR);

    Ok(frame)
}

/// Signed hex: magnitude in uppercase hex, '-' prefix when negative
fn encode_arg(value: i16) -> String {
    if value < 0 {
        format!("-{:X}", value.unsigned_abs())
    } else {
        format!("{:X}", value)
    }
}
