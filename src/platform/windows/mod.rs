//! Windows capture and injection using low-level hooks and SendInput.

mod listen;
mod simulate;

pub use listen::{NativeHooks, Registration, stop_hook};
pub use simulate::NativeInjector;

use windows::Win32::System::Threading::{
    GetCurrentThread, SetThreadPriority, THREAD_PRIORITY_TIME_CRITICAL,
};

/// Raise the calling thread to time-critical priority.
///
/// Failure is logged and otherwise ignored.
pub fn raise_thread_priority() {
    if let Err(e) = unsafe { SetThreadPriority(GetCurrentThread(), THREAD_PRIORITY_TIME_CRITICAL) }
    {
        log::debug!("failed to raise replay thread priority: {e}");
    }
}
