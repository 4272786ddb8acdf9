//! Platform-specific implementations.

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
pub use self::windows::*;

// Low-level hooks and SendInput only exist on Windows. Elsewhere the
// library still builds so the pipeline can run against other backends.
#[cfg(not(target_os = "windows"))]
mod stub;
#[cfg(not(target_os = "windows"))]
pub use self::stub::*;
