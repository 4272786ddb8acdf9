//! Virtual key codes used by the capture pipeline.

use crate::report::{MOD_ALT, MOD_CTRL, MOD_META, MOD_SHIFT};

/// Escape.
pub const VK_ESCAPE: u32 = 0x1B;
/// Space bar.
pub const VK_SPACE: u32 = 0x20;
/// F1; F2 through F24 follow consecutively.
pub const VK_F1: u32 = 0x70;
/// F11.
pub const VK_F11: u32 = 0x7A;
/// F12.
pub const VK_F12: u32 = 0x7B;
/// Left Windows key.
pub const VK_LWIN: u32 = 0x5B;
/// Right Windows key.
pub const VK_RWIN: u32 = 0x5C;
/// Left Shift.
pub const VK_LSHIFT: u32 = 0xA0;
/// Right Shift.
pub const VK_RSHIFT: u32 = 0xA1;
/// Left Control.
pub const VK_LCONTROL: u32 = 0xA2;
/// Right Control.
pub const VK_RCONTROL: u32 = 0xA3;
/// Left Alt.
pub const VK_LMENU: u32 = 0xA4;
/// Right Alt.
pub const VK_RMENU: u32 = 0xA5;

/// Size of the key-state table; every virtual key code is below this.
pub const KEY_TABLE_SIZE: usize = 256;

/// The report modifier bit for a sided modifier key, or `None`.
pub fn modifier_bit(vk_code: u32) -> Option<u8> {
    match vk_code {
        VK_LCONTROL | VK_RCONTROL => Some(MOD_CTRL),
        VK_LSHIFT | VK_RSHIFT => Some(MOD_SHIFT),
        VK_LMENU | VK_RMENU => Some(MOD_ALT),
        VK_LWIN | VK_RWIN => Some(MOD_META),
        _ => None,
    }
}

/// Whether a key is reported through the modifier mask instead of a key slot.
#[inline]
pub fn is_modifier(vk_code: u32) -> bool {
    modifier_bit(vk_code).is_some()
}

/// Human-readable name for the keys that can be bound as controls.
pub fn key_name(vk_code: u32) -> String {
    match vk_code {
        VK_ESCAPE => "Esc".to_string(),
        VK_SPACE => "Space".to_string(),
        0x30..=0x39 | 0x41..=0x5A => char::from(vk_code as u8).to_string(),
        code if (VK_F1..VK_F1 + 24).contains(&code) => format!("F{}", code - VK_F1 + 1),
        code => format!("VK 0x{code:02X}"),
    }
}
