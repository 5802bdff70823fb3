use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keys that can drive a movement axis, independent of the windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
}

/// Two keys pulling one axis in opposite directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisBinding {
    pub positive: Key,
    pub negative: Key,
}

impl AxisBinding {
    pub const fn new(positive: Key, negative: Key) -> Self {
        Self { positive, negative }
    }

    /// -1, 0 or 1. Holding both keys cancels out.
    pub fn value(&self, keys: &KeyState) -> i32 {
        i32::from(keys.is_held(self.positive)) - i32::from(keys.is_held(self.negative))
    }
}

/// Key bindings for the three movement axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBindings {
    pub x: AxisBinding,
    pub y: AxisBinding,
    pub z: AxisBinding,
}

impl Default for InputBindings {
    /// D/A strafe on x, W/S lift on y, Q/E push on z.
    fn default() -> Self {
        Self {
            x: AxisBinding::new(Key::D, Key::A),
            y: AxisBinding::new(Key::W, Key::S),
            z: AxisBinding::new(Key::Q, Key::E),
        }
    }
}

impl InputBindings {
    /// Arrow keys and page up/down, for hosts where WASD is taken.
    pub fn arrows() -> Self {
        Self {
            x: AxisBinding::new(Key::ArrowRight, Key::ArrowLeft),
            y: AxisBinding::new(Key::ArrowUp, Key::ArrowDown),
            z: AxisBinding::new(Key::PageUp, Key::PageDown),
        }
    }
}

/// Set of keys currently held down.
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    held: HashSet<Key>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: Key, pressed: bool) {
        if pressed {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}
