//! Windows input injection using SendInput.

use crate::config::BATCH_CAPACITY;
use crate::error::{Error, Result};
use crate::event::{Button, INJECTION_SIGNATURE, InputPrimitive};
use crate::replay::Injector;
use std::mem::size_of;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBD_EVENT_FLAGS, KEYBDINPUT,
    MOUSE_EVENT_FLAGS, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN,
    MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_MOVE, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP,
    MOUSEEVENTF_WHEEL, MOUSEINPUT, SendInput, VIRTUAL_KEY,
};

const WHEEL_DELTA: i32 = 120;

fn mouse_input(flags: MOUSE_EVENT_FLAGS, data: i32, dx: i32, dy: i32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: data as u32,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: INJECTION_SIGNATURE,
            },
        },
    }
}

fn keyboard_input(vk_code: u16) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk_code),
                wScan: 0,
                dwFlags: KEYBD_EVENT_FLAGS(0),
                time: 0,
                dwExtraInfo: INJECTION_SIGNATURE,
            },
        },
    }
}

fn button_flags(button: Button, pressed: bool) -> MOUSE_EVENT_FLAGS {
    match (button, pressed) {
        (Button::Left, true) => MOUSEEVENTF_LEFTDOWN,
        (Button::Left, false) => MOUSEEVENTF_LEFTUP,
        (Button::Right, true) => MOUSEEVENTF_RIGHTDOWN,
        (Button::Right, false) => MOUSEEVENTF_RIGHTUP,
        (Button::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
        (Button::Middle, false) => MOUSEEVENTF_MIDDLEUP,
    }
}

/// Build the SendInput entry for one primitive.
fn to_input(primitive: &InputPrimitive) -> INPUT {
    match *primitive {
        InputPrimitive::MouseMove { dx, dy } => mouse_input(MOUSEEVENTF_MOVE, 0, dx, dy),
        InputPrimitive::MouseButton { button, pressed } => {
            mouse_input(button_flags(button, pressed), 0, 0, 0)
        }
        InputPrimitive::Wheel { steps } => {
            mouse_input(MOUSEEVENTF_WHEEL, steps.saturating_mul(WHEEL_DELTA), 0, 0)
        }
        InputPrimitive::KeyDown { vk_code } => keyboard_input(vk_code),
    }
}

/// Submits batches through a single SendInput call each.
pub struct NativeInjector {
    inputs: Vec<INPUT>,
}

impl Default for NativeInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeInjector {
    /// Create an injector with room for a full batch.
    pub fn new() -> Self {
        Self {
            inputs: Vec::with_capacity(BATCH_CAPACITY),
        }
    }
}

impl Injector for NativeInjector {
    fn inject(&mut self, batch: &[InputPrimitive]) -> Result<usize> {
        self.inputs.clear();
        self.inputs.extend(batch.iter().map(to_input));

        let sent = unsafe { SendInput(&self.inputs, size_of::<INPUT>() as i32) } as usize;
        if sent == 0 && !batch.is_empty() {
            return Err(Error::InjectFailed(format!(
                "SendInput accepted none of {} inputs",
                batch.len()
            )));
        }
        Ok(sent)
    }
}
