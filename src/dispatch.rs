// Edge-triggered key -> frame dispatch
// The loop busy-polls; the throttle only spaces out keyboard reads.

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::frame::{self, Frame};
use crate::keys::{current_key, Key, KeyState};

/// Where frames go: the serial link in production, a recorder in tests
pub trait FrameSink {
    fn send(&mut self, frame: &[u8]) -> std::io::Result<()>;

    /// Flush and release the sink once the loop is done
    fn close(self) -> std::io::Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// What a poll decided to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed (key held, or still idle)
    Hold,
    /// Rising edge of a drive key
    Drive(Key),
    /// A continuous key was released
    Stop,
    Quit,
}

/// Edge detection against the last active key
///
/// Releasing a one-shot distance key is a `Hold`: the robot stops on its own
/// and the key stays latched as last active until another key is pressed.
pub fn transition(last: Option<Key>, current: Option<Key>, quit: bool) -> Transition {
    if quit {
        return Transition::Quit;
    }

    match (last, current) {
        (last, Some(key)) if last != Some(key) => Transition::Drive(key),
        (Some(last), None) if last.is_continuous() => Transition::Stop,
        _ => Transition::Hold,
    }
}

/// Minimum spacing between polls, measured on a monotonic clock
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_poll: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_poll: None,
        }
    }

    /// True (and restarts the interval) when enough time passed since the last poll
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last_poll {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_poll = Some(now);
                true
            }
        }
    }
}

/// Owns the frame sink and the last active key
pub struct Dispatcher<S: FrameSink> {
    sink: S,
    last: Option<Key>,
}

impl<S: FrameSink> Dispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, last: None }
    }

    /// Key currently considered driving the robot
    pub fn last_active(&self) -> Option<Key> {
        self.last
    }

    /// Evaluate one keyboard snapshot and send at most one frame
    pub fn poll<K: KeyState + ?Sized>(&mut self, keys: &K) -> Result<Transition> {
        let step = transition(self.last, current_key(keys), keys.is_pressed(Key::Quit));

        match step {
            Transition::Drive(key) => {
                if let Some(frame) = frame::for_key(key) {
                    self.send(frame)?;
                }
                self.last = Some(key);
            }
            Transition::Stop => {
                self.send(frame::STOP)?;
                self.last = None;
            }
            Transition::Hold | Transition::Quit => {}
        }

        Ok(step)
    }

    fn send(&mut self, frame: Frame) -> Result<()> {
        debug!("Sending {} frame: {}", frame.name, frame.as_str());
        self.sink.send(frame.bytes).map_err(Error::Write)
    }

    /// Give back the sink (closing it is up to the caller)
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Poll until the quit key is seen
///
/// `now` is the monotonic clock; polls closer together than the throttle
/// interval are skipped without touching the keyboard.
pub fn drive<K, S, C>(
    keys: &mut K,
    dispatcher: &mut Dispatcher<S>,
    throttle: &mut Throttle,
    mut now: C,
) -> Result<()>
where
    K: KeyState + ?Sized,
    S: FrameSink,
    C: FnMut() -> Instant,
{
    loop {
        if !throttle.ready(now()) {
            std::hint::spin_loop();
            continue;
        }

        keys.refresh().map_err(Error::Terminal)?;
        if dispatcher.poll(&*keys)? == Transition::Quit {
            info!("Exiting...");
            return Ok(());
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Records each sent frame separately
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub frames: Vec<Vec<u8>>,
    }

    impl FrameSink for Recorder {
        fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
            self.frames.push(frame.to_vec());
            Ok(())
        }
    }

    struct BrokenLink;

    impl FrameSink for BrokenLink {
        fn send(&mut self, _frame: &[u8]) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"))
        }
    }

    /// Plays back one snapshot per refresh, then holds quit
    pub(crate) struct ScriptedKeys {
        script: VecDeque<Vec<Key>>,
        held: Vec<Key>,
        pub refreshes: usize,
    }

    impl ScriptedKeys {
        pub(crate) fn new(script: Vec<Vec<Key>>) -> Self {
            Self {
                script: script.into(),
                held: Vec::new(),
                refreshes: 0,
            }
        }
    }

    impl KeyState for ScriptedKeys {
        fn refresh(&mut self) -> std::io::Result<()> {
            self.refreshes += 1;
            self.held = self.script.pop_front().unwrap_or_else(|| vec![Key::Quit]);
            Ok(())
        }

        fn is_pressed(&self, key: Key) -> bool {
            self.held.contains(&key)
        }
    }

    /// Fake monotonic clock advancing a fixed step per reading
    pub(crate) fn stepping_clock(step: Duration) -> impl FnMut() -> Instant {
        let mut t = Instant::now();
        move || {
            t += step;
            t
        }
    }

    fn run_script(script: Vec<Vec<Key>>) -> Vec<Vec<u8>> {
        let mut keys = ScriptedKeys::new(script);
        let mut dispatcher = Dispatcher::new(Recorder::default());
        let mut throttle = Throttle::new(Duration::from_millis(10));
        drive(
            &mut keys,
            &mut dispatcher,
            &mut throttle,
            stepping_clock(Duration::from_millis(10)),
        )
        .unwrap();
        dispatcher.into_sink().frames
    }

    fn frames(list: &[Frame]) -> Vec<Vec<u8>> {
        list.iter().map(|f| f.bytes.to_vec()).collect()
    }

    #[test]
    fn test_transition_table() {
        use Transition::*;

        assert_eq!(transition(None, None, false), Hold);
        assert_eq!(transition(None, Some(Key::Forward), false), Drive(Key::Forward));
        assert_eq!(transition(Some(Key::Forward), Some(Key::Forward), false), Hold);
        assert_eq!(
            transition(Some(Key::Forward), Some(Key::TurnLeft), false),
            Drive(Key::TurnLeft)
        );
        assert_eq!(transition(Some(Key::TurnRight), None, false), Stop);
        assert_eq!(transition(Some(Key::DistanceForward), None, false), Hold);
        assert_eq!(transition(Some(Key::DistanceBackward), None, false), Hold);
        assert_eq!(transition(Some(Key::Forward), Some(Key::Forward), true), Quit);
    }

    #[test]
    fn test_holding_a_key_sends_once() {
        let sent = run_script(vec![
            vec![Key::Backward],
            vec![Key::Backward],
            vec![Key::Backward],
            vec![Key::Backward],
        ]);
        assert_eq!(sent, frames(&[frame::BACKWARD]));
    }

    #[test]
    fn test_release_of_continuous_key_sends_stop_once() {
        let sent = run_script(vec![vec![Key::TurnLeft], vec![], vec![], vec![]]);
        assert_eq!(sent, frames(&[frame::TURN_LEFT, frame::STOP]));
    }

    #[test]
    fn test_release_of_distance_key_sends_nothing() {
        let sent = run_script(vec![vec![Key::DistanceForward], vec![], vec![]]);
        assert_eq!(sent, frames(&[frame::DISTANCE_FORWARD]));
    }

    #[test]
    fn test_distance_key_latched_until_another_key() {
        let sent = run_script(vec![
            vec![Key::DistanceBackward],
            vec![],
            vec![Key::DistanceBackward],
            vec![],
            vec![Key::Forward],
            vec![],
            vec![Key::DistanceBackward],
        ]);
        assert_eq!(
            sent,
            frames(&[
                frame::DISTANCE_BACKWARD,
                frame::FORWARD,
                frame::STOP,
                frame::DISTANCE_BACKWARD,
            ])
        );
    }

    #[test]
    fn test_switching_keys_sends_new_frame_without_stop() {
        let sent = run_script(vec![vec![Key::Forward], vec![Key::TurnRight], vec![]]);
        assert_eq!(sent, frames(&[frame::FORWARD, frame::TURN_RIGHT, frame::STOP]));
    }

    #[test]
    fn test_simultaneous_keys_resolve_by_priority() {
        let sent = run_script(vec![vec![Key::Backward, Key::Forward]]);
        assert_eq!(sent, frames(&[frame::FORWARD]));
    }

    #[test]
    fn test_quit_sends_nothing() {
        let sent = run_script(vec![vec![Key::Forward, Key::Quit]]);
        assert!(sent.is_empty());
    }

    #[test]
    fn test_forward_release_quit() {
        let sent = run_script(vec![vec![Key::Forward], vec![], vec![Key::Quit]]);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], b"000045030712C,12CADG");
        assert_eq!(sent[1], frame::STOP.bytes);
    }

    #[test]
    fn test_throttle_coalesces_fast_polls() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(10));

        assert!(throttle.ready(start));
        assert!(!throttle.ready(start + Duration::from_millis(4)));
        assert!(!throttle.ready(start + Duration::from_millis(9)));
        assert!(throttle.ready(start + Duration::from_millis(10)));
        assert!(!throttle.ready(start + Duration::from_millis(15)));
    }

    #[test]
    fn test_loop_skips_keyboard_between_throttle_ticks() {
        // Clock ticks 1 ms per reading, polls every 10 ms: key snapshots are
        // consumed one per interval, not one per loop pass
        let mut keys = ScriptedKeys::new(vec![vec![Key::Forward], vec![], vec![Key::Forward]]);
        let mut dispatcher = Dispatcher::new(Recorder::default());
        let mut throttle = Throttle::new(Duration::from_millis(10));

        drive(
            &mut keys,
            &mut dispatcher,
            &mut throttle,
            stepping_clock(Duration::from_millis(1)),
        )
        .unwrap();

        assert_eq!(keys.refreshes, 4);
        assert_eq!(
            dispatcher.into_sink().frames,
            frames(&[frame::FORWARD, frame::STOP, frame::FORWARD])
        );
    }

    #[test]
    fn test_write_failure_is_fatal() {
        let mut keys = ScriptedKeys::new(vec![vec![Key::Forward]]);
        let mut dispatcher = Dispatcher::new(BrokenLink);
        let mut throttle = Throttle::new(Duration::from_millis(10));

        let result = drive(
            &mut keys,
            &mut dispatcher,
            &mut throttle,
            stepping_clock(Duration::from_millis(10)),
        );
        assert!(matches!(result, Err(Error::Write(_))));
        // Last active key is not updated when the frame never left
        assert_eq!(dispatcher.last_active(), None);
    }
}
