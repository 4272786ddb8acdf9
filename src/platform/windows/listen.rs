//! Windows input capture using SetWindowsHookEx.

use crate::capture::Capture;
use crate::error::{Error, Result};
use crate::event::{Button, Decision, HookCode, MouseAction, RawKeyEvent, RawMouseEvent};
use crate::hook::HookBackend;
use crate::state::SharedState;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};
use windows::Win32::Foundation::{LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetCursorPos, GetMessageW, HHOOK, KBDLLHOOKSTRUCT, MSG,
    MSLLHOOKSTRUCT, PostQuitMessage, PostThreadMessageW, SetWindowsHookExW, TranslateMessage,
    UnhookWindowsHookEx, WH_KEYBOARD_LL, WH_MOUSE_LL, WM_KEYDOWN, WM_LBUTTONDOWN, WM_LBUTTONUP,
    WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEMOVE, WM_MOUSEWHEEL, WM_QUIT, WM_RBUTTONDOWN,
    WM_RBUTTONUP, WM_SYSKEYDOWN,
};

thread_local! {
    /// Capture invoked by the hook callbacks on the dispatch thread.
    static CAPTURE: RefCell<Option<Capture>> = const { RefCell::new(None) };
}

/// Thread running the message loop, for [`stop_hook`].
static THREAD_ID: AtomicU32 = AtomicU32::new(0);

/// Both installed hooks.
pub struct Registration {
    mouse: HHOOK,
    keyboard: HHOOK,
}

/// Low-level mouse and keyboard hooks on the calling thread.
#[derive(Debug, Default)]
pub struct NativeHooks;

impl NativeHooks {
    /// Create the backend. Nothing is installed until `register`.
    pub fn new() -> Self {
        Self
    }
}

impl HookBackend for NativeHooks {
    type Handle = Registration;

    fn cursor_position(&self) -> Result<(i32, i32)> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| Error::Platform(format!("failed to read cursor position: {e}")))?;
        Ok((point.x, point.y))
    }

    fn register(&mut self, capture: Capture) -> Result<Registration> {
        CAPTURE.with(|slot| *slot.borrow_mut() = Some(capture));
        THREAD_ID.store(unsafe { GetCurrentThreadId() }, Ordering::SeqCst);

        let mouse = match unsafe { SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_callback), None, 0) } {
            Ok(hook) => hook,
            Err(e) => {
                release_capture();
                return Err(Error::HookStartFailed(format!("failed to set mouse hook: {e}")));
            }
        };

        let keyboard =
            match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_callback), None, 0) } {
                Ok(hook) => hook,
                Err(e) => {
                    let _ = unsafe { UnhookWindowsHookEx(mouse) };
                    release_capture();
                    return Err(Error::HookStartFailed(format!(
                        "failed to set keyboard hook: {e}"
                    )));
                }
            };

        log::debug!("low-level hooks installed");
        Ok(Registration { mouse, keyboard })
    }

    fn unregister(&mut self, handle: Registration) -> Result<()> {
        let mouse = unsafe { UnhookWindowsHookEx(handle.mouse) };
        let keyboard = unsafe { UnhookWindowsHookEx(handle.keyboard) };

        if let Some(capture) = release_capture()
            && capture.dropped() > 0
        {
            log::warn!("{} reports dropped on full queues", capture.dropped());
        }

        mouse.map_err(|e| Error::HookStopFailed(format!("failed to remove mouse hook: {e}")))?;
        keyboard
            .map_err(|e| Error::HookStopFailed(format!("failed to remove keyboard hook: {e}")))?;
        log::debug!("low-level hooks removed");
        Ok(())
    }

    fn dispatch(&mut self, state: &SharedState) -> Result<()> {
        let mut msg = MSG::default();
        while state.is_running() {
            let ret = unsafe { GetMessageW(&mut msg, None, 0, 0) };
            match ret.0 {
                0 => break,
                -1 => return Err(Error::Platform("GetMessageW failed".into())),
                _ => unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                },
            }
        }
        Ok(())
    }
}

/// Request the message loop to exit from any thread.
pub fn stop_hook() -> Result<()> {
    let thread_id = THREAD_ID.load(Ordering::SeqCst);
    if thread_id != 0 {
        // Fails harmlessly when the loop has already exited.
        let _ = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };
    }
    Ok(())
}

fn release_capture() -> Option<Capture> {
    THREAD_ID.store(0, Ordering::SeqCst);
    CAPTURE.with(|slot| slot.borrow_mut().take())
}

/// Run `f` against the installed capture and end the message loop once
/// shutdown has been requested.
fn with_capture(f: impl FnOnce(&mut Capture) -> Decision) -> Decision {
    CAPTURE.with(|slot| {
        let Ok(mut guard) = slot.try_borrow_mut() else {
            return Decision::Forward;
        };
        let Some(capture) = guard.as_mut() else {
            return Decision::Forward;
        };

        let decision = f(capture);
        if !capture.state().is_running() {
            unsafe { PostQuitMessage(0) };
        }
        decision
    })
}

fn to_lresult(decision: Decision, code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match decision {
        Decision::Consume => LRESULT(1),
        Decision::Forward => unsafe { CallNextHookEx(None, code, wparam, lparam) },
    }
}

/// Convert a low-level mouse message.
fn mouse_event(message: u32, info: &MSLLHOOKSTRUCT) -> RawMouseEvent {
    let action = match message {
        WM_MOUSEMOVE => MouseAction::Move,
        WM_LBUTTONDOWN => MouseAction::Pressed(Button::Left),
        WM_LBUTTONUP => MouseAction::Released(Button::Left),
        WM_RBUTTONDOWN => MouseAction::Pressed(Button::Right),
        WM_RBUTTONUP => MouseAction::Released(Button::Right),
        WM_MBUTTONDOWN => MouseAction::Pressed(Button::Middle),
        WM_MBUTTONUP => MouseAction::Released(Button::Middle),
        // High word of mouseData is the signed wheel delta.
        WM_MOUSEWHEEL => MouseAction::Wheel((info.mouseData >> 16) as u16 as i16),
        _ => MouseAction::Other,
    };
    RawMouseEvent::new(action, info.pt.x, info.pt.y, info.time).with_extra_info(info.dwExtraInfo)
}

/// Convert a low-level keyboard message.
fn key_event(message: u32, info: &KBDLLHOOKSTRUCT) -> RawKeyEvent {
    let event = if matches!(message, WM_KEYDOWN | WM_SYSKEYDOWN) {
        RawKeyEvent::down(info.vkCode, info.time)
    } else {
        RawKeyEvent::up(info.vkCode, info.time)
    };
    event.with_extra_info(info.dwExtraInfo)
}

unsafe extern "system" fn mouse_callback(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let hook_code = HookCode::from_raw(code);
    let decision = if hook_code == HookCode::Action {
        let info = unsafe { &*(lparam.0 as *const MSLLHOOKSTRUCT) };
        let event = mouse_event(wparam.0 as u32, info);
        with_capture(|capture| capture.on_mouse(hook_code, &event))
    } else {
        Decision::Forward
    };
    to_lresult(decision, code, wparam, lparam)
}

unsafe extern "system" fn keyboard_callback(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let hook_code = HookCode::from_raw(code);
    let decision = if hook_code == HookCode::Action {
        let info = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
        let event = key_event(wparam.0 as u32, info);
        with_capture(|capture| capture.on_keyboard(hook_code, &event))
    } else {
        Decision::Forward
    };
    to_lresult(decision, code, wparam, lparam)
}
