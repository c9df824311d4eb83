// Startup, drive loop and shutdown ordering
//
// 1. Open the serial link (fatal on failure, before touching the terminal)
// 2. Disable echo
// 3. Poll the keyboard until quit
// 4. Wait for Enter, restore echo, close the link
//
// A loop error skips the Enter prompt and the close, but echo is still restored.

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::{Config, WRITE_TIMEOUT};
use crate::dispatch::{drive, Dispatcher, FrameSink, Throttle};
use crate::error::{Error, Result};
use crate::keys::KeyState;
use crate::serial::SerialLink;
use crate::terminal::{wait_for_enter, EchoGuard, RestoreEcho, TerminalKeyboard};

pub fn run(config: &Config) -> Result<()> {
    let link = SerialLink::open(&config.port, config.baud_rate, WRITE_TIMEOUT)?;
    info!(
        "Connected to {}",
        link.name().unwrap_or_else(|| config.port.clone())
    );

    // Raw mode from here on: keep the banner ahead of it
    info!("Controls: k/j=forward/backward, l/h=turn right/left, 9/8=2 m forward/backward, q=quit");
    info!("Polling every {}ms", config.throttle().as_millis());

    let echo = EchoGuard::engage()?;
    let mut keyboard = TerminalKeyboard::new(echo.reports_releases(), config.hold_timeouts());

    run_with(
        link,
        &mut keyboard,
        echo,
        config.throttle(),
        Instant::now,
        wait_for_enter,
    )
}

/// Drive loop plus shutdown, with every resource passed in
///
/// `ack` runs after a clean quit, before echo is restored.
pub fn run_with<S, K, E, C, A>(
    sink: S,
    keys: &mut K,
    echo: E,
    throttle: Duration,
    clock: C,
    ack: A,
) -> Result<()>
where
    S: FrameSink,
    K: KeyState + ?Sized,
    E: RestoreEcho,
    C: FnMut() -> Instant,
    A: FnOnce() -> Result<()>,
{
    let mut dispatcher = Dispatcher::new(sink);
    let mut throttle = Throttle::new(throttle);

    let result = drive(keys, &mut dispatcher, &mut throttle, clock).and_then(|()| ack());

    // Restore is best effort; the loop's own error wins
    if let Err(e) = echo.restore() {
        warn!("Failed to restore terminal echo: {}", e);
    }
    result?;

    dispatcher.into_sink().close().map_err(Error::Write)
}
