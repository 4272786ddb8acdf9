//! Capture producers.
//!
//! The capture facility calls into this module synchronously for every raw
//! mouse and keyboard event, on a thread we do not control, with a tight
//! time budget. Everything here is O(1): normalize the event into a report,
//! push it, and tell the OS to forward the event. Nothing blocks, allocates
//! or performs I/O, except the rare control-key branch which logs a line.

use crate::config::ControlKeys;
use crate::event::{Decision, HookCode, MouseAction, RawKeyEvent, RawMouseEvent};
use crate::keycode::{self, KEY_TABLE_SIZE};
use crate::queue::Producer;
use crate::report::{KeyboardReport, MAX_KEYS, MouseReport};
use crate::state::SharedState;
use std::sync::Arc;

/// Saturate a screen-space delta into a report field.
#[inline]
fn clamp_delta(delta: i32) -> i16 {
    delta.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Builds [`MouseReport`]s from raw mouse events.
pub struct MouseProducer {
    queue: Producer<MouseReport>,
    last_position: (i32, i32),
    buttons: u8,
}

impl MouseProducer {
    /// Create a producer seeded with the current absolute cursor position.
    pub fn new(queue: Producer<MouseReport>, origin: (i32, i32)) -> Self {
        Self {
            queue,
            last_position: origin,
            buttons: 0,
        }
    }

    /// Held buttons as last observed.
    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    /// Reports dropped because the mouse queue was full.
    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }

    /// Normalize one raw event, updating the tracked cursor and button state.
    ///
    /// Returns `None` for events that carry no change: zero-delta moves,
    /// zero wheel deltas and untracked messages.
    pub fn observe(&mut self, event: &RawMouseEvent) -> Option<MouseReport> {
        let mut report = MouseReport {
            buttons: self.buttons,
            timestamp: event.time,
            ..Default::default()
        };

        match event.action {
            MouseAction::Move => {
                let (last_x, last_y) = self.last_position;
                report.dx = clamp_delta(event.x - last_x);
                report.dy = clamp_delta(event.y - last_y);
                self.last_position = (event.x, event.y);
                if !report.has_motion() {
                    return None;
                }
            }
            MouseAction::Pressed(button) => {
                self.buttons |= button.mask();
                report.buttons = self.buttons;
            }
            MouseAction::Released(button) => {
                self.buttons &= !button.mask();
                report.buttons = self.buttons;
            }
            // One report is one notch regardless of magnitude.
            MouseAction::Wheel(delta) => {
                report.wheel = delta.signum() as i8;
                if report.wheel == 0 {
                    return None;
                }
            }
            MouseAction::Other => return None,
        }

        Some(report)
    }

    /// Hook body for one raw mouse event. Always forwards.
    pub fn handle(&mut self, state: &SharedState, code: HookCode, event: &RawMouseEvent) -> Decision {
        if code != HookCode::Action {
            return Decision::Forward;
        }

        if state.is_suppressed() || event.is_own_injection() {
            // Keep the reference point current so injected or blocked
            // motion is not replayed again by the next real move.
            if event.action == MouseAction::Move {
                self.last_position = (event.x, event.y);
            }
            return Decision::Forward;
        }

        if let Some(report) = self.observe(event) {
            // A full queue drops the report; the event still goes through.
            let _ = self.queue.push(report);
        }
        Decision::Forward
    }
}

/// Which key is down, indexed by virtual key code.
pub struct KeyStateTable {
    down: [bool; KEY_TABLE_SIZE],
}

impl Default for KeyStateTable {
    fn default() -> Self {
        Self {
            down: [false; KEY_TABLE_SIZE],
        }
    }
}

impl KeyStateTable {
    /// Record a transition. Returns `false` if the key was already in that
    /// state (auto-repeat) or the code is out of range.
    pub fn set(&mut self, vk_code: u32, down: bool) -> bool {
        let Some(slot) = self.down.get_mut(vk_code as usize) else {
            return false;
        };
        if *slot == down {
            return false;
        }
        *slot = down;
        true
    }

    /// Whether a key is currently down.
    pub fn is_down(&self, vk_code: u32) -> bool {
        self.down.get(vk_code as usize).copied().unwrap_or(false)
    }

    /// Modifier mask for the held keys.
    pub fn modifiers(&self) -> u8 {
        self.down
            .iter()
            .enumerate()
            .filter(|(_, down)| **down)
            .filter_map(|(code, _)| keycode::modifier_bit(code as u32))
            .fold(0, |mask, bit| mask | bit)
    }

    /// Full snapshot: modifiers plus the first six held non-modifier keys
    /// in ascending key-code order.
    pub fn snapshot(&self, timestamp: u32) -> KeyboardReport {
        let mut report = KeyboardReport {
            modifiers: self.modifiers(),
            timestamp,
            ..Default::default()
        };

        let held = self
            .down
            .iter()
            .enumerate()
            .filter(|(code, down)| **down && !keycode::is_modifier(*code as u32))
            .map(|(code, _)| code as u8);
        for (slot, code) in report.keys.iter_mut().zip(held.take(MAX_KEYS)) {
            *slot = code;
        }
        report
    }
}

/// Program controls reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Flip the block-all-input switch.
    ToggleBlock,
    /// Flip throughput reporting.
    ToggleProfiling,
    /// Stop the loopback.
    Shutdown,
}

impl ControlAction {
    /// Apply the action to the shared flags.
    pub fn apply(self, state: &SharedState) {
        match self {
            ControlAction::ToggleBlock => {
                let on = state.toggle_blocked();
                log::info!("Input blocking: {}", if on { "ON" } else { "OFF" });
            }
            ControlAction::ToggleProfiling => {
                let on = state.toggle_profiling();
                log::info!("Profiling: {}", if on { "ON" } else { "OFF" });
            }
            ControlAction::Shutdown => {
                if state.request_shutdown() {
                    log::info!("Exiting...");
                }
            }
        }
    }
}

/// Builds [`KeyboardReport`]s from raw keyboard events.
pub struct KeyboardProducer {
    queue: Producer<KeyboardReport>,
    keys: KeyStateTable,
    controls: ControlKeys,
}

impl KeyboardProducer {
    /// Create a producer with the given control bindings.
    pub fn new(queue: Producer<KeyboardReport>, controls: ControlKeys) -> Self {
        Self {
            queue,
            keys: KeyStateTable::default(),
            controls,
        }
    }

    /// The key-state table.
    pub fn keys(&self) -> &KeyStateTable {
        &self.keys
    }

    /// Reports dropped because the keyboard queue was full.
    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }

    /// The control bound to a key-down, if any.
    pub fn control_action(&self, event: &RawKeyEvent) -> Option<ControlAction> {
        if !event.pressed {
            return None;
        }
        match event.vk_code {
            code if code == self.controls.toggle_block => Some(ControlAction::ToggleBlock),
            code if code == self.controls.toggle_profiling => Some(ControlAction::ToggleProfiling),
            code if code == self.controls.shutdown => Some(ControlAction::Shutdown),
            _ => None,
        }
    }

    /// Update the key-state table and snapshot it if something changed.
    pub fn observe(&mut self, event: &RawKeyEvent) -> Option<KeyboardReport> {
        if !self.keys.set(event.vk_code, event.pressed) {
            return None;
        }
        Some(self.keys.snapshot(event.time))
    }

    /// Hook body for one raw keyboard event.
    ///
    /// Control keys are consumed; everything else is forwarded.
    pub fn handle(&mut self, state: &SharedState, code: HookCode, event: &RawKeyEvent) -> Decision {
        if code != HookCode::Action || state.is_replaying() || event.is_own_injection() {
            return Decision::Forward;
        }

        // Controls stay live while blocked so the block can be lifted.
        if let Some(action) = self.control_action(event) {
            action.apply(state);
            return Decision::Consume;
        }

        if state.is_blocked() {
            return Decision::Forward;
        }

        if let Some(report) = self.observe(event) {
            let _ = self.queue.push(report);
        }
        Decision::Forward
    }
}

/// The handler registered with the capture facility: both producers plus
/// the shared flags they consult.
pub struct Capture {
    state: Arc<SharedState>,
    mouse: MouseProducer,
    keyboard: KeyboardProducer,
}

impl Capture {
    /// Bundle both producers with the shared flags.
    pub fn new(state: Arc<SharedState>, mouse: MouseProducer, keyboard: KeyboardProducer) -> Self {
        Self {
            state,
            mouse,
            keyboard,
        }
    }

    /// Dispatch a raw mouse event.
    #[inline]
    pub fn on_mouse(&mut self, code: HookCode, event: &RawMouseEvent) -> Decision {
        self.mouse.handle(&self.state, code, event)
    }

    /// Dispatch a raw keyboard event.
    #[inline]
    pub fn on_keyboard(&mut self, code: HookCode, event: &RawKeyEvent) -> Decision {
        self.keyboard.handle(&self.state, code, event)
    }

    /// The shared flags.
    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Total reports dropped on full queues.
    pub fn dropped(&self) -> u64 {
        self.mouse.dropped() + self.keyboard.dropped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Button, INJECTION_SIGNATURE};
    use crate::keycode::{VK_ESCAPE, VK_F11, VK_F12, VK_LCONTROL, VK_LSHIFT, VK_RMENU};
    use crate::queue::{self, Consumer};
    use crate::report::{BUTTON_LEFT, BUTTON_RIGHT, MOD_ALT, MOD_CTRL, MOD_SHIFT};

    fn mouse() -> (MouseProducer, Consumer<MouseReport>) {
        let (tx, rx) = queue::channel();
        (MouseProducer::new(tx, (100, 100)), rx)
    }

    fn keyboard() -> (KeyboardProducer, Consumer<KeyboardReport>) {
        let (tx, rx) = queue::channel();
        (KeyboardProducer::new(tx, ControlKeys::default()), rx)
    }

    #[test]
    fn test_move_reports_relative_delta() {
        let state = SharedState::default();
        let (mut producer, mut rx) = mouse();

        let decision = producer.handle(&state, HookCode::Action, &RawMouseEvent::moved(103, 98, 1));
        assert_eq!(decision, Decision::Forward);
        producer.handle(&state, HookCode::Action, &RawMouseEvent::moved(110, 98, 2));

        let first = rx.pop().unwrap();
        assert_eq!((first.dx, first.dy, first.timestamp), (3, -2, 1));
        let second = rx.pop().unwrap();
        assert_eq!((second.dx, second.dy), (7, 0));
        assert!(rx.pop().is_none());
    }

    #[test]
    fn test_zero_move_is_discarded() {
        let state = SharedState::default();
        let (mut producer, rx) = mouse();

        let decision = producer.handle(&state, HookCode::Action, &RawMouseEvent::moved(100, 100, 1));
        assert_eq!(decision, Decision::Forward);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_large_delta_saturates() {
        let (mut producer, _rx) = mouse();
        let report = producer.observe(&RawMouseEvent::moved(100_000, -100_000, 1)).unwrap();
        assert_eq!(report.dx, i16::MAX);
        assert_eq!(report.dy, i16::MIN);
    }

    #[test]
    fn test_button_mask_persists_across_reports() {
        let state = SharedState::default();
        let (mut producer, mut rx) = mouse();

        producer.handle(&state, HookCode::Action, &RawMouseEvent::pressed(Button::Left, 100, 100, 1));
        producer.handle(&state, HookCode::Action, &RawMouseEvent::pressed(Button::Right, 100, 100, 2));
        producer.handle(&state, HookCode::Action, &RawMouseEvent::moved(105, 100, 3));
        producer.handle(&state, HookCode::Action, &RawMouseEvent::released(Button::Left, 105, 100, 4));

        let buttons: Vec<u8> = rx.by_ref().map(|r| r.buttons).collect();
        assert_eq!(
            buttons,
            vec![
                BUTTON_LEFT,
                BUTTON_LEFT | BUTTON_RIGHT,
                BUTTON_LEFT | BUTTON_RIGHT,
                BUTTON_RIGHT
            ]
        );
        assert_eq!(producer.buttons(), BUTTON_RIGHT);
    }

    #[test]
    fn test_click_without_motion() {
        let state = SharedState::default();
        let (mut producer, mut rx) = mouse();

        producer.handle(&state, HookCode::Action, &RawMouseEvent::pressed(Button::Left, 100, 100, 1));
        producer.handle(&state, HookCode::Action, &RawMouseEvent::released(Button::Left, 100, 100, 2));

        let down = rx.pop().unwrap();
        let up = rx.pop().unwrap();
        assert_eq!(down.buttons ^ up.buttons, BUTTON_LEFT);
        assert!(!down.has_motion() && !up.has_motion());
    }

    #[test]
    fn test_wheel_is_sign_only() {
        let (mut producer, _rx) = mouse();
        assert_eq!(producer.observe(&RawMouseEvent::wheel(360, 0, 0, 1)).unwrap().wheel, 1);
        assert_eq!(producer.observe(&RawMouseEvent::wheel(-120, 0, 0, 2)).unwrap().wheel, -1);
        assert!(producer.observe(&RawMouseEvent::wheel(0, 0, 0, 3)).is_none());
    }

    #[test]
    fn test_other_messages_are_forwarded_without_report() {
        let state = SharedState::default();
        let (mut producer, rx) = mouse();
        let event = RawMouseEvent::new(MouseAction::Other, 100, 100, 1);
        assert_eq!(producer.handle(&state, HookCode::Action, &event), Decision::Forward);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_skip_code_is_ignored() {
        let state = SharedState::default();
        let (mut producer, rx) = mouse();
        producer.handle(&state, HookCode::Skip, &RawMouseEvent::moved(150, 150, 1));
        assert!(rx.is_empty());
    }

    #[test]
    fn test_replaying_suppresses_mouse_capture() {
        let state = SharedState::default();
        let (mut producer, mut rx) = mouse();

        state.set_replaying(true);
        let decision = producer.handle(&state, HookCode::Action, &RawMouseEvent::moved(120, 100, 1));
        assert_eq!(decision, Decision::Forward);
        producer.handle(&state, HookCode::Action, &RawMouseEvent::pressed(Button::Left, 120, 100, 2));
        assert!(rx.is_empty());
        assert_eq!(producer.buttons(), 0);

        // The injected displacement is not counted against the next real move.
        state.set_replaying(false);
        producer.handle(&state, HookCode::Action, &RawMouseEvent::moved(121, 100, 3));
        assert_eq!(rx.pop().unwrap().dx, 1);
    }

    #[test]
    fn test_signed_injection_is_ignored() {
        let state = SharedState::default();
        let (mut producer, rx) = mouse();
        let event = RawMouseEvent::moved(130, 100, 1).with_extra_info(INJECTION_SIGNATURE);
        producer.handle(&state, HookCode::Action, &event);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_blocked_forwards_until_toggled_back() {
        let state = SharedState::default();
        let (mut producer, mut rx) = mouse();

        state.toggle_blocked();
        for x in 101..110 {
            let decision = producer.handle(&state, HookCode::Action, &RawMouseEvent::moved(x, 100, 1));
            assert_eq!(decision, Decision::Forward);
        }
        assert!(rx.is_empty());

        state.toggle_blocked();
        producer.handle(&state, HookCode::Action, &RawMouseEvent::moved(111, 100, 2));
        assert_eq!(rx.pop().unwrap().dx, 2);
    }

    #[test]
    fn test_key_down_repeat_is_ignored() {
        let state = SharedState::default();
        let (mut producer, mut rx) = keyboard();

        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(0x41, 1));
        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(0x41, 2));

        let report = rx.pop().unwrap();
        assert_eq!(report.keys[0], 0x41);
        assert_eq!(report.timestamp, 1);
        assert!(rx.pop().is_none());
    }

    #[test]
    fn test_release_produces_updated_snapshot() {
        let state = SharedState::default();
        let (mut producer, mut rx) = keyboard();

        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(0x42, 1));
        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(0x41, 2));
        producer.handle(&state, HookCode::Action, &RawKeyEvent::up(0x42, 3));
        producer.handle(&state, HookCode::Action, &RawKeyEvent::up(0x42, 4));

        let snapshots: Vec<[u8; MAX_KEYS]> = rx.by_ref().map(|r| r.keys).collect();
        assert_eq!(
            snapshots,
            vec![
                [0x42, 0, 0, 0, 0, 0],
                [0x41, 0x42, 0, 0, 0, 0],
                [0x41, 0, 0, 0, 0, 0],
            ]
        );
    }

    #[test]
    fn test_modifiers_go_to_mask_not_slots() {
        let state = SharedState::default();
        let (mut producer, mut rx) = keyboard();

        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(VK_LCONTROL, 1));
        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(VK_LSHIFT, 2));
        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(VK_RMENU, 3));
        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(0x43, 4));

        let last = rx.by_ref().last().unwrap();
        assert_eq!(last.modifiers, MOD_CTRL | MOD_SHIFT | MOD_ALT);
        assert_eq!(last.keys, [0x43, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_snapshot_caps_at_six_keys() {
        let mut table = KeyStateTable::default();
        for code in 0x41..0x49 {
            assert!(table.set(code, true));
        }
        let report = table.snapshot(5);
        assert_eq!(report.keys, [0x41, 0x42, 0x43, 0x44, 0x45, 0x46]);
        assert!(table.is_down(0x48));
    }

    #[test]
    fn test_out_of_range_code_is_ignored() {
        let mut table = KeyStateTable::default();
        assert!(!table.set(0x1FF, true));
        assert!(!table.is_down(0x1FF));
    }

    #[test]
    fn test_control_keys_are_swallowed() {
        let state = SharedState::default();
        let (mut producer, rx) = keyboard();

        let decision = producer.handle(&state, HookCode::Action, &RawKeyEvent::down(VK_F11, 1));
        assert_eq!(decision, Decision::Consume);
        assert!(state.is_profiling());

        let decision = producer.handle(&state, HookCode::Action, &RawKeyEvent::down(VK_ESCAPE, 2));
        assert_eq!(decision, Decision::Consume);
        assert!(!state.is_running());

        // Release of a control key is not a control and changes nothing.
        let decision = producer.handle(&state, HookCode::Action, &RawKeyEvent::up(VK_F11, 3));
        assert_eq!(decision, Decision::Forward);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_block_toggle_gates_keyboard() {
        let state = SharedState::default();
        let (mut producer, mut rx) = keyboard();

        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(VK_F12, 1));
        assert!(state.is_blocked());

        let decision = producer.handle(&state, HookCode::Action, &RawKeyEvent::down(0x41, 2));
        assert_eq!(decision, Decision::Forward);
        assert!(rx.is_empty());

        let decision = producer.handle(&state, HookCode::Action, &RawKeyEvent::down(VK_F12, 3));
        assert_eq!(decision, Decision::Consume);
        assert!(!state.is_blocked());

        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(0x42, 4));
        assert_eq!(rx.pop().unwrap().keys[0], 0x42);
    }

    #[test]
    fn test_replaying_suppresses_keyboard_and_controls() {
        let state = SharedState::default();
        let (mut producer, rx) = keyboard();

        state.set_replaying(true);
        producer.handle(&state, HookCode::Action, &RawKeyEvent::down(0x41, 1));
        let decision = producer.handle(&state, HookCode::Action, &RawKeyEvent::down(VK_ESCAPE, 2));
        assert_eq!(decision, Decision::Forward);
        assert!(state.is_running());
        assert!(rx.is_empty());
        assert!(!producer.keys().is_down(0x41));
    }

    #[test]
    fn test_full_keyboard_queue_still_forwards() {
        let state = SharedState::default();
        let (mut producer, _rx) = keyboard();

        for i in 0..40u32 {
            let decision = producer.handle(&state, HookCode::Action, &RawKeyEvent::down(0x41, i));
            assert_eq!(decision, Decision::Forward);
            producer.handle(&state, HookCode::Action, &RawKeyEvent::up(0x41, i));
        }
        assert_eq!(producer.dropped(), 80 - 31);
    }

    #[test]
    fn test_custom_control_bindings() {
        let state = SharedState::default();
        let (tx, rx) = queue::channel();
        let controls = ControlKeys {
            toggle_block: 0x70,
            toggle_profiling: 0x71,
            shutdown: 0x72,
        };
        let mut producer = KeyboardProducer::new(tx, controls);

        assert_eq!(
            producer.handle(&state, HookCode::Action, &RawKeyEvent::down(VK_ESCAPE, 1)),
            Decision::Forward
        );
        assert_eq!(
            producer.handle(&state, HookCode::Action, &RawKeyEvent::down(0x72, 2)),
            Decision::Consume
        );
        assert!(!state.is_running());
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_capture_dispatches_to_both_producers() {
        let state = Arc::new(SharedState::default());
        let (mtx, mut mrx) = queue::channel();
        let (ktx, mut krx) = queue::channel();
        let mut capture = Capture::new(
            Arc::clone(&state),
            MouseProducer::new(mtx, (0, 0)),
            KeyboardProducer::new(ktx, ControlKeys::default()),
        );

        capture.on_mouse(HookCode::Action, &RawMouseEvent::moved(4, 4, 1));
        capture.on_keyboard(HookCode::Action, &RawKeyEvent::down(0x44, 2));

        assert_eq!(mrx.pop().unwrap().dx, 4);
        assert_eq!(krx.pop().unwrap().keys[0], 0x44);
        assert_eq!(capture.dropped(), 0);
        assert!(capture.state().is_running());
    }
}
