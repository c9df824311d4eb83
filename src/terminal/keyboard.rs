// Keyboard state from terminal key events
//
// Terminals report key presses, not key state. Held keys are tracked from the
// event stream: press/repeat marks a key down, release marks it up. Without
// release events a key is up once its repeats stop arriving. A fresh press
// gets the longer `first_repeat` window since auto-repeat starts late.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::keys::{Key, KeyState};

/// How long a key stays held without a release event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldTimeouts {
    /// From the initial press to the first auto-repeat
    pub first_repeat: Duration,
    /// Between two auto-repeats
    pub repeat: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Held {
    last_seen: Instant,
    repeating: bool,
}

/// Bound keys currently down
#[derive(Debug, Default)]
pub struct HeldKeys {
    keys: HashMap<Key, Held>,
    timeouts: Option<HoldTimeouts>,
}

impl HeldKeys {
    /// `timeouts` is `None` when release events are reported
    pub fn new(timeouts: Option<HoldTimeouts>) -> Self {
        Self {
            keys: HashMap::new(),
            timeouts,
        }
    }

    pub fn apply(&mut self, key: Key, kind: KeyEventKind, at: Instant) {
        match kind {
            // Legacy terminals report repeats as presses
            KeyEventKind::Press | KeyEventKind::Repeat => {
                let repeating = kind == KeyEventKind::Repeat || self.keys.contains_key(&key);
                self.keys.insert(
                    key,
                    Held {
                        last_seen: at,
                        repeating,
                    },
                );
            }
            KeyEventKind::Release => {
                self.keys.remove(&key);
            }
        }
    }

    /// Drop keys whose repeats stopped arriving
    pub fn expire(&mut self, now: Instant) {
        if let Some(timeouts) = self.timeouts {
            self.keys.retain(|_, held| {
                let window = if held.repeating {
                    timeouts.repeat
                } else {
                    timeouts.first_repeat
                };
                now.saturating_duration_since(held.last_seen) < window
            });
        }
    }

    pub fn contains(&self, key: Key) -> bool {
        self.keys.contains_key(&key)
    }
}

impl KeyState for HeldKeys {
    fn is_pressed(&self, key: Key) -> bool {
        self.contains(key)
    }
}

/// `KeyState` backed by the crossterm event queue (needs raw mode)
pub struct TerminalKeyboard {
    held: HeldKeys,
}

impl TerminalKeyboard {
    pub fn new(reports_releases: bool, timeouts: HoldTimeouts) -> Self {
        let timeouts = if reports_releases { None } else { Some(timeouts) };
        Self {
            held: HeldKeys::new(timeouts),
        }
    }
}

impl KeyState for TerminalKeyboard {
    fn refresh(&mut self) -> std::io::Result<()> {
        let now = Instant::now();

        // Drain everything queued since the last poll without blocking
        while event::poll(Duration::ZERO)? {
            if let Event::Key(KeyEvent {
                code: KeyCode::Char(c),
                kind,
                ..
            }) = event::read()?
            {
                if let Some(key) = Key::from_binding(c.to_ascii_lowercase()) {
                    debug!("{:?} {:?}", key, kind);
                    self.held.apply(key, kind, now);
                }
            }
        }

        self.held.expire(now);
        Ok(())
    }

    fn is_pressed(&self, key: Key) -> bool {
        self.held.contains(key)
    }
}
