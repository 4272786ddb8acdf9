//! # inputloop
//!
//! Low-latency loopback of system-wide mouse and keyboard input.
//!
//! Global low-level hooks turn raw input into fixed-size reports and push
//! them onto two lock-free single-producer/single-consumer queues. A replay
//! engine on its own high-priority thread drains both queues and
//! resynthesizes the input in batches.
//!
//! ## Feedback suppression
//!
//! Replayed input passes through the same hooks it was captured by. The
//! producers ignore events while the engine is replaying, and every
//! injected event carries [`INJECTION_SIGNATURE`] so it is recognized even
//! when it arrives after the gate has closed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use inputloop::{Config, Loopback};
//!
//! let loopback = Loopback::new(Config::load_default()?);
//! let stats = inputloop::run(&loopback)?;
//! println!("replayed {} reports", stats.reports);
//! # Ok::<(), inputloop::Error>(())
//! ```
//!
//! ## Architecture
//!
//! The OS side is abstracted behind two traits. [`HookBackend`] installs
//! the interceptors and drives the event loop; [`Injector`] submits
//! synthesized input. Both have native Windows implementations and can be
//! replaced for testing.

pub mod capture;
pub mod config;
pub mod error;
pub mod event;
pub mod hook;
pub mod keycode;
pub mod queue;
pub mod replay;
pub mod report;
pub mod state;
pub mod statistics;

mod platform;

// Re-exports
pub use capture::{Capture, ControlAction, KeyStateTable, KeyboardProducer, MouseProducer};
pub use config::{Config, ControlKeys, ReplayConfig, StartupConfig};
pub use error::{Error, Result};
pub use event::{
    Button, Decision, HookCode, INJECTION_SIGNATURE, InputPrimitive, MouseAction, RawKeyEvent,
    RawMouseEvent,
};
pub use hook::{HookBackend, Loopback, run};
pub use queue::{Consumer, Producer, QUEUE_CAPACITY};
pub use replay::{EngineStats, Injector, ReplayEngine};
pub use report::{KeyboardReport, MouseReport};
pub use state::SharedState;
pub use statistics::{Throughput, ThroughputSample};

// Native facilities
pub use platform::{NativeHooks, NativeInjector, stop_hook};
