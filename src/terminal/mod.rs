// Terminal side of the teleop
//
// Provides:
// - Echo suppression for the lifetime of the drive loop (raw mode)
// - Keyboard snapshots built from crossterm key events
// - The "press enter" acknowledgment before shutdown

mod echo;
pub mod keyboard;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::io::{stdout, Write};

use crate::error::{Error, Result};

pub use echo::{EchoGuard, RestoreEcho};
pub use keyboard::{HeldKeys, HoldTimeouts, TerminalKeyboard};

/// Block until the user presses Enter
pub fn wait_for_enter() -> Result<()> {
    let mut out = stdout();
    write!(out, "Press enter to continue...")
        .and_then(|_| out.flush())
        .map_err(Error::Terminal)?;

    loop {
        if let Event::Key(KeyEvent {
            code: KeyCode::Enter,
            kind: KeyEventKind::Press,
            ..
        }) = event::read().map_err(Error::Terminal)?
        {
            break;
        }
    }

    // Raw mode: newline needs an explicit carriage return
    write!(out, "\r\n")
        .and_then(|_| out.flush())
        .map_err(Error::Terminal)
}
