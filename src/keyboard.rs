use fixedbitset::FixedBitSet;
use std::collections::HashSet;
use std::iter::FromIterator;

use serde::{Deserialize, Serialize};

pub const NUM_KEYS: usize = 16;

/// Key's variants are the 16 keys from the CHIP-8's hexadecimal keyboard.
/// The recommended key mapping is:
///
/// Keypad                   Keyboard
/// +-+-+-+-+                +-+-+-+-+
/// |1|2|3|C|                |1|2|3|4|
/// +-+-+-+-+                +-+-+-+-+
/// |4|5|6|D|                |Q|W|E|R|
/// +-+-+-+-+       =>       +-+-+-+-+
/// |7|8|9|E|                |A|S|D|F|
/// +-+-+-+-+                +-+-+-+-+
/// |A|0|B|F|                |Z|X|C|V|
/// +-+-+-+-+                +-+-+-+-+
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Serialize, Deserialize)]
pub enum Key {
    Key1,
    Key2,
    Key3,
    C,
    Key4,
    Key5,
    Key6,
    D,
    Key7,
    Key8,
    Key9,
    E,
    A,
    Key0,
    B,
    F,
}

impl Key {
    /// The keypad value (0x0 - 0xF) this key produces
    pub fn index(self) -> usize {
        match self {
            Key::Key0 => 0x0,
            Key::Key1 => 0x1,
            Key::Key2 => 0x2,
            Key::Key3 => 0x3,
            Key::Key4 => 0x4,
            Key::Key5 => 0x5,
            Key::Key6 => 0x6,
            Key::Key7 => 0x7,
            Key::Key8 => 0x8,
            Key::Key9 => 0x9,
            Key::A => 0xA,
            Key::B => 0xB,
            Key::C => 0xC,
            Key::D => 0xD,
            Key::E => 0xE,
            Key::F => 0xF,
        }
    }

    pub fn from_index(idx: usize) -> Option<Key> {
        let key = match idx {
            0x0 => Key::Key0,
            0x1 => Key::Key1,
            0x2 => Key::Key2,
            0x3 => Key::Key3,
            0x4 => Key::Key4,
            0x5 => Key::Key5,
            0x6 => Key::Key6,
            0x7 => Key::Key7,
            0x8 => Key::Key8,
            0x9 => Key::Key9,
            0xA => Key::A,
            0xB => Key::B,
            0xC => Key::C,
            0xD => Key::D,
            0xE => Key::E,
            0xF => Key::F,
            _ => return None,
        };
        Some(key)
    }
}

/// Implemented by whatever polls the host's input devices. The emulator asks it for the
/// full set of keys currently held down.
pub trait AsKeyboard {
    fn keys_down(&self) -> Vec<Key>;
}

/// Contains the state (up or down) of the CHIP-8's 16 keys
#[derive(Debug)]
pub struct Keyboard {
    key_input: FixedBitSet, // one bit per key, 1 when held down
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard {
            key_input: FixedBitSet::with_capacity(NUM_KEYS),
        }
    }

    /// Handle the key down event for one of the 16 possible keys
    pub fn handle_key_down(&mut self, k: Key) {
        self.key_input.insert(k.index());
    }

    /// Handle the key up event for one of the 16 possible keys
    pub fn handle_key_up(&mut self, k: Key) {
        self.key_input.set(k.index(), false);
    }

    /// Given the keys held down on the host, mark exactly those keys as down
    pub fn update_keyboard(&mut self, keys: &[Key]) {
        let set: HashSet<usize> = HashSet::from_iter(keys.iter().map(|k| k.index()));

        for idx in 0..NUM_KEYS {
            self.key_input.set(idx, set.contains(&idx));
        }
    }

    /// Return the state of the key with the given keypad value. Only the low nibble of
    /// `idx` is used, so register values above 0xF alias onto the 16 keys.
    pub fn get_key_state(&self, idx: usize) -> bool {
        self.key_input[idx & 0xF]
    }

    /// The lowest-numbered key that is currently down
    pub fn first_pressed(&self) -> Option<usize> {
        self.key_input.ones().next()
    }
}
