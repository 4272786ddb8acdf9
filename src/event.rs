//! Raw captured events, hook decisions and synthesized input primitives.

use crate::report::{BUTTON_LEFT, BUTTON_MIDDLE, BUTTON_RIGHT};

/// Marker placed in the extra-info field of every event we inject.
///
/// Built from the loopback device's USB vendor and product ids.
pub const INJECTION_SIGNATURE: usize = 0x0C45_7403;

/// Notification code delivered with each hook invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookCode {
    /// A real input event that the hook may inspect.
    Action,
    /// Anything else; must be passed on untouched.
    Skip,
}

impl HookCode {
    /// Map a low-level hook `nCode` to a [`HookCode`].
    pub fn from_raw(code: i32) -> Self {
        if code == 0 { Self::Action } else { Self::Skip }
    }
}

/// What the hook tells the OS to do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Pass the event to the rest of the system.
    Forward,
    /// Swallow the event.
    Consume,
}

/// Tracked mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Left mouse button.
    Left,
    /// Right mouse button.
    Right,
    /// Middle mouse button.
    Middle,
}

impl Button {
    /// Every tracked button, in the order the replay engine emits them.
    pub const ALL: [Button; 3] = [Button::Left, Button::Right, Button::Middle];

    /// The report bit for this button.
    pub fn mask(&self) -> u8 {
        match self {
            Button::Left => BUTTON_LEFT,
            Button::Right => BUTTON_RIGHT,
            Button::Middle => BUTTON_MIDDLE,
        }
    }
}

/// The kind of a raw mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    /// Cursor moved to the event's absolute position.
    Move,
    /// A button went down.
    Pressed(Button),
    /// A button went up.
    Released(Button),
    /// Vertical wheel rotation with the raw hardware delta.
    Wheel(i16),
    /// Any other mouse message (extra buttons, horizontal wheel).
    Other,
}

/// A mouse event as delivered by the capture facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMouseEvent {
    /// What happened.
    pub action: MouseAction,
    /// Absolute cursor x in screen coordinates.
    pub x: i32,
    /// Absolute cursor y in screen coordinates.
    pub y: i32,
    /// Monotonic millisecond tick.
    pub time: u32,
    /// Extra-info value attached by whoever generated the event.
    pub extra_info: usize,
}

impl RawMouseEvent {
    /// Create an event of the given kind with no extra info.
    pub fn new(action: MouseAction, x: i32, y: i32, time: u32) -> Self {
        Self {
            action,
            x,
            y,
            time,
            extra_info: 0,
        }
    }

    /// Create a move event.
    pub fn moved(x: i32, y: i32, time: u32) -> Self {
        Self::new(MouseAction::Move, x, y, time)
    }

    /// Create a button-down event.
    pub fn pressed(button: Button, x: i32, y: i32, time: u32) -> Self {
        Self::new(MouseAction::Pressed(button), x, y, time)
    }

    /// Create a button-up event.
    pub fn released(button: Button, x: i32, y: i32, time: u32) -> Self {
        Self::new(MouseAction::Released(button), x, y, time)
    }

    /// Create a vertical wheel event.
    pub fn wheel(delta: i16, x: i32, y: i32, time: u32) -> Self {
        Self::new(MouseAction::Wheel(delta), x, y, time)
    }

    /// Attach an extra-info value.
    pub fn with_extra_info(mut self, extra_info: usize) -> Self {
        self.extra_info = extra_info;
        self
    }

    /// Whether this event was synthesized by this program.
    pub fn is_own_injection(&self) -> bool {
        self.extra_info == INJECTION_SIGNATURE
    }
}

/// A keyboard event as delivered by the capture facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    /// Virtual key code.
    pub vk_code: u32,
    /// `true` for key-down (including system key-down), `false` for key-up.
    pub pressed: bool,
    /// Monotonic millisecond tick.
    pub time: u32,
    /// Extra-info value attached by whoever generated the event.
    pub extra_info: usize,
}

impl RawKeyEvent {
    /// Create a key-down event.
    pub fn down(vk_code: u32, time: u32) -> Self {
        Self {
            vk_code,
            pressed: true,
            time,
            extra_info: 0,
        }
    }

    /// Create a key-up event.
    pub fn up(vk_code: u32, time: u32) -> Self {
        Self {
            pressed: false,
            ..Self::down(vk_code, time)
        }
    }

    /// Attach an extra-info value.
    pub fn with_extra_info(mut self, extra_info: usize) -> Self {
        self.extra_info = extra_info;
        self
    }

    /// Whether this event was synthesized by this program.
    pub fn is_own_injection(&self) -> bool {
        self.extra_info == INJECTION_SIGNATURE
    }
}

/// One entry of an injection batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPrimitive {
    /// Relative cursor movement.
    MouseMove {
        /// Horizontal delta.
        dx: i32,
        /// Vertical delta.
        dy: i32,
    },
    /// Button transition.
    MouseButton {
        /// Which button.
        button: Button,
        /// `true` for down, `false` for up.
        pressed: bool,
    },
    /// Vertical wheel rotation in whole notches.
    Wheel {
        /// Signed notch count.
        steps: i32,
    },
    /// Key press.
    KeyDown {
        /// Virtual key code.
        vk_code: u16,
    },
}

impl InputPrimitive {
    /// Whether this primitive targets the mouse.
    pub fn is_mouse(&self) -> bool {
        !matches!(self, InputPrimitive::KeyDown { .. })
    }
}
