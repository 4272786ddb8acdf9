//! Fallback for platforms without low-level hooks.

use crate::capture::Capture;
use crate::error::{Error, Result};
use crate::event::InputPrimitive;
use crate::hook::HookBackend;
use crate::replay::Injector;
use crate::state::SharedState;

const UNSUPPORTED: &str = "global input hooks are only available on Windows";

/// Native hooks are unavailable on this platform; every call fails.
#[derive(Debug, Default)]
pub struct NativeHooks;

impl NativeHooks {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

impl HookBackend for NativeHooks {
    type Handle = ();

    fn cursor_position(&self) -> Result<(i32, i32)> {
        Err(Error::NotSupported(UNSUPPORTED.into()))
    }

    fn register(&mut self, _capture: Capture) -> Result<()> {
        Err(Error::NotSupported(UNSUPPORTED.into()))
    }

    fn unregister(&mut self, _handle: ()) -> Result<()> {
        Ok(())
    }

    fn dispatch(&mut self, _state: &SharedState) -> Result<()> {
        Err(Error::NotSupported(UNSUPPORTED.into()))
    }
}

/// Native injection is unavailable on this platform; every batch fails.
#[derive(Debug, Default)]
pub struct NativeInjector;

impl NativeInjector {
    /// Create the injector.
    pub fn new() -> Self {
        Self
    }
}

impl Injector for NativeInjector {
    fn inject(&mut self, _batch: &[InputPrimitive]) -> Result<usize> {
        Err(Error::NotSupported(UNSUPPORTED.into()))
    }
}

/// No-op.
pub fn raise_thread_priority() {}

/// No-op; there is no native loop to wake.
pub fn stop_hook() -> Result<()> {
    Ok(())
}
