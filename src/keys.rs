// Bound keys and the keyboard capability the dispatcher polls

/// One of the keys the teleop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Backward,
    TurnRight,
    TurnLeft,
    /// One-shot: drive 2 m forward, the robot stops by itself
    DistanceForward,
    /// One-shot: drive 2 m backward, the robot stops by itself
    DistanceBackward,
    Quit,
}

impl Key {
    /// Drive keys in resolution order: when several are held, the first wins
    pub const PRIORITY: [Key; 6] = [
        Key::Forward,
        Key::Backward,
        Key::TurnRight,
        Key::TurnLeft,
        Key::DistanceForward,
        Key::DistanceBackward,
    ];

    /// Keyboard character bound to this key (vim-style movement)
    pub fn binding(self) -> char {
        match self {
            Key::Forward => 'k',
            Key::Backward => 'j',
            Key::TurnRight => 'l',
            Key::TurnLeft => 'h',
            Key::DistanceForward => '9',
            Key::DistanceBackward => '8',
            Key::Quit => 'q',
        }
    }

    pub fn from_binding(c: char) -> Option<Key> {
        match c {
            'k' => Some(Key::Forward),
            'j' => Some(Key::Backward),
            'l' => Some(Key::TurnRight),
            'h' => Some(Key::TurnLeft),
            '9' => Some(Key::DistanceForward),
            '8' => Some(Key::DistanceBackward),
            'q' => Some(Key::Quit),
            _ => None,
        }
    }

    /// Continuous keys drive until released and need a stop frame afterwards
    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            Key::Forward | Key::Backward | Key::TurnRight | Key::TurnLeft
        )
    }
}

/// Snapshot of which keys are currently down
pub trait KeyState {
    /// Take a fresh snapshot. Called once per poll, before any `is_pressed`.
    fn refresh(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn is_pressed(&self, key: Key) -> bool;
}

/// Resolve the active drive key, `None` when no drive key is held
pub fn current_key<K: KeyState + ?Sized>(keys: &K) -> Option<Key> {
    Key::PRIORITY.into_iter().find(|&key| keys.is_pressed(key))
}
