// Echo suppression while the drive loop owns the keyboard

use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement};
use std::io::stdout;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Something that turns terminal echo back on at shutdown
pub trait RestoreEcho {
    fn restore(self) -> Result<()>;
}

/// Terminal in raw mode (no echo, unbuffered keys) until `restore` is called
///
/// No `Drop` impl: a panic leaves the terminal without echo
/// (`stty sane` or `reset` recovers it).
#[derive(Debug)]
pub struct EchoGuard {
    reports_releases: bool,
}

impl EchoGuard {
    /// Disable echo. Also asks for key release events when the terminal
    /// speaks the kitty keyboard protocol.
    pub fn engage() -> Result<Self> {
        enable_raw_mode().map_err(Error::Terminal)?;

        let reports_releases = match supports_keyboard_enhancement() {
            Ok(supported) => supported,
            Err(e) => {
                warn!("Could not query keyboard enhancement support: {}", e);
                false
            }
        };

        if reports_releases {
            let pushed = execute!(
                stdout(),
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            );
            leave_raw_mode_on_err(pushed, disable_raw_mode)?;
        }

        info!(
            "Terminal echo disabled (key releases {})",
            if reports_releases { "reported" } else { "inferred from repeats" }
        );
        Ok(Self { reports_releases })
    }

    /// Whether the terminal sends key release events
    pub fn reports_releases(&self) -> bool {
        self.reports_releases
    }
}

impl RestoreEcho for EchoGuard {
    /// Re-enable echo
    fn restore(self) -> Result<()> {
        if self.reports_releases {
            execute!(stdout(), PopKeyboardEnhancementFlags).map_err(Error::Terminal)?;
        }
        disable_raw_mode().map_err(Error::Terminal)?;
        info!("Terminal echo restored");
        Ok(())
    }
}

/// Setup step failed after raw mode was entered: leave raw mode (best effort)
/// before reporting the original error
fn leave_raw_mode_on_err<T, F>(result: std::io::Result<T>, leave: F) -> Result<T>
where
    F: FnOnce() -> std::io::Result<()>,
{
    result.map_err(|e| {
        if let Err(restore_err) = leave() {
            warn!("Failed to leave raw mode: {}", restore_err);
        }
        Error::Terminal(e)
    })
}
