//! Fixed-size normalized input reports.
//!
//! Reports are plain `Copy` values that travel through the queues by
//! value. Their layout mirrors HID boot-protocol reports so they can be
//! handed to a virtual device as-is.

// Mouse button masks
/// Left mouse button.
pub const BUTTON_LEFT: u8 = 1 << 0;
/// Right mouse button.
pub const BUTTON_RIGHT: u8 = 1 << 1;
/// Middle mouse button.
pub const BUTTON_MIDDLE: u8 = 1 << 2;

// Keyboard modifier masks
/// Either Control key.
pub const MOD_CTRL: u8 = 1 << 0;
/// Either Shift key.
pub const MOD_SHIFT: u8 = 1 << 1;
/// Either Alt key.
pub const MOD_ALT: u8 = 1 << 2;
/// Either Windows/Meta key.
pub const MOD_META: u8 = 1 << 3;

/// Maximum number of simultaneously reported non-modifier keys.
pub const MAX_KEYS: usize = 6;

/// One discrete mouse change since the previous report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseReport {
    /// Currently held buttons (`BUTTON_*` bits).
    pub buttons: u8,
    /// Horizontal movement since the previous report.
    pub dx: i16,
    /// Vertical movement since the previous report.
    pub dy: i16,
    /// Wheel steps: `1` away from the user, `-1` toward, `0` none.
    pub wheel: i8,
    /// Monotonic millisecond tick of the source event.
    pub timestamp: u32,
}

impl MouseReport {
    /// Whether this report carries relative movement.
    pub fn has_motion(&self) -> bool {
        self.dx != 0 || self.dy != 0
    }

    /// Whether a given button bit is set.
    pub fn is_pressed(&self, button: u8) -> bool {
        self.buttons & button != 0
    }
}

/// Snapshot of the keyboard at a state transition.
///
/// This is the complete set of non-modifier keys held at the moment the
/// state changed, not a single key delta. A consumer that needs per-key
/// press/release semantics has to diff successive snapshots itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    /// Held modifiers (`MOD_*` bits).
    pub modifiers: u8,
    /// Held virtual key codes in ascending order; `0` marks an empty slot.
    pub keys: [u8; MAX_KEYS],
    /// Monotonic millisecond tick of the source event.
    pub timestamp: u32,
}

impl KeyboardReport {
    /// Iterate over the occupied key slots.
    pub fn pressed_keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys.iter().copied().filter(|&k| k != 0)
    }

    /// Whether a modifier bit is set.
    pub fn has_modifier(&self, modifier: u8) -> bool {
        self.modifiers & modifier != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_report_helpers() {
        let report = MouseReport {
            buttons: BUTTON_LEFT | BUTTON_MIDDLE,
            ..Default::default()
        };
        assert!(!report.has_motion());
        assert!(report.is_pressed(BUTTON_LEFT));
        assert!(!report.is_pressed(BUTTON_RIGHT));
        assert!(report.is_pressed(BUTTON_MIDDLE));
    }

    #[test]
    fn test_pressed_keys_skips_empty_slots() {
        let report = KeyboardReport {
            modifiers: MOD_SHIFT,
            keys: [0x41, 0x42, 0, 0, 0, 0],
            timestamp: 7,
        };
        assert_eq!(report.pressed_keys().collect::<Vec<_>>(), vec![0x41, 0x42]);
        assert!(report.has_modifier(MOD_SHIFT));
        assert!(!report.has_modifier(MOD_CTRL));
    }
}
