//! Capture facility interface and the loopback lifecycle.

use crate::capture::{Capture, KeyboardProducer, MouseProducer};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::platform;
use crate::queue;
use crate::replay::{EngineStats, Injector, ReplayEngine};
use crate::state::SharedState;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// OS facility that delivers raw input events to a [`Capture`].
///
/// `register` and `dispatch` are called on the same thread; the
/// registered capture is invoked from inside `dispatch`, one event at a
/// time, and its [`Decision`](crate::Decision) tells the facility whether
/// to forward or swallow each event.
pub trait HookBackend {
    /// Opaque registration handle.
    type Handle;

    /// Current absolute cursor position, used to seed relative movement.
    fn cursor_position(&self) -> Result<(i32, i32)>;

    /// Install global low-level mouse and keyboard interceptors.
    ///
    /// On failure nothing stays installed.
    fn register(&mut self, capture: Capture) -> Result<Self::Handle>;

    /// Remove the interceptors installed by `register`.
    fn unregister(&mut self, handle: Self::Handle) -> Result<()>;

    /// Deliver events until `state` stops running.
    fn dispatch(&mut self, state: &SharedState) -> Result<()>;
}

/// Input loopback: wires the capture producers, the queues and the replay
/// engine together and runs them until shutdown.
///
/// A `Loopback` runs to completion at most once; shutdown is final.
pub struct Loopback {
    config: Config,
    state: Arc<SharedState>,
    started: AtomicBool,
}

impl Default for Loopback {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Loopback {
    /// Create a loopback with toggles seeded from `config.startup`.
    pub fn new(config: Config) -> Self {
        let state = SharedState::new(config.startup.blocked, config.startup.profiling);
        Self {
            config,
            state: Arc::new(state),
            started: AtomicBool::new(false),
        }
    }

    /// Shared flags, e.g. for a signal handler.
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the pipeline (blocking).
    ///
    /// Registers the capture with `backend`, starts the replay engine on
    /// its own thread, and dispatches events on the calling thread until
    /// shutdown is requested by the shutdown key or [`Loopback::stop`].
    /// Setup failures are returned before anything is started and leave
    /// the loopback ready for another attempt; a run that got as far as
    /// dispatching is final.
    pub fn run<B, I>(&self, backend: &mut B, injector: I) -> Result<EngineStats>
    where
        B: HookBackend,
        I: Injector + 'static,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyRunning);
        }

        let (mouse_tx, mouse_rx) = queue::channel();
        let (keyboard_tx, keyboard_rx) = queue::channel();

        // Nothing is running until registration succeeds, so a failed
        // setup leaves the loopback startable again.
        let origin = match backend.cursor_position() {
            Ok(origin) => origin,
            Err(e) => {
                self.started.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        let capture = Capture::new(
            Arc::clone(&self.state),
            MouseProducer::new(mouse_tx, origin),
            KeyboardProducer::new(keyboard_tx, self.config.controls),
        );
        let handle = match backend.register(capture) {
            Ok(handle) => handle,
            Err(e) => {
                self.started.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let engine = ReplayEngine::new(
            Arc::clone(&self.state),
            mouse_rx,
            keyboard_rx,
            injector,
            self.config.replay,
        );
        let worker = match engine.spawn() {
            Ok(worker) => worker,
            Err(e) => {
                let _ = backend.unregister(handle);
                self.started.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        log::info!("loopback running");

        let dispatched = backend.dispatch(&self.state);

        // Whatever ended dispatch, both sides go down together.
        self.state.request_shutdown();
        let unregistered = backend.unregister(handle);
        let stats = worker
            .join()
            .map_err(|_| Error::ThreadError("failed to join replay thread".into()))?;
        log::info!("loopback stopped");

        dispatched?;
        unregistered?;
        Ok(stats)
    }

    /// Request shutdown from any thread and wake the native dispatch loop.
    pub fn stop(&self) -> Result<()> {
        self.state.request_shutdown();
        platform::stop_hook()
    }

    /// Check if the pipeline is still running.
    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst) && self.state.is_running()
    }
}

/// Run a loopback with the native capture and injection facilities.
///
/// Blocks until the shutdown key is pressed or the state is stopped from
/// another thread.
pub fn run(loopback: &Loopback) -> Result<EngineStats> {
    let mut backend = platform::NativeHooks::new();
    loopback.run(&mut backend, platform::NativeInjector::new())
}
