//! Replay engine: drains the report queues and synthesizes input.
//!
//! An iteration that finds reports waiting raises the `replaying` gate,
//! drains the mouse queue and then the keyboard queue into a fixed-size
//! batch, submits the batch to the [`Injector`] whenever it reaches the
//! flush threshold, flushes the remainder and lowers the gate again. An
//! iteration that drained nothing sleeps for the poll interval; otherwise
//! the engine loops immediately.

use crate::config::{BATCH_CAPACITY, ReplayConfig};
use crate::error::{Error, Result};
use crate::event::{Button, InputPrimitive};
use crate::platform;
use crate::queue::Consumer;
use crate::report::{KeyboardReport, MouseReport};
use crate::state::SharedState;
use crate::statistics::Throughput;
use heapless::Vec as HVec;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// OS facility that injects synthesized input.
///
/// A batch is submitted as one ordered, atomic unit. Returns how many
/// primitives were accepted.
pub trait Injector: Send {
    /// Inject a batch of primitives.
    fn inject(&mut self, batch: &[InputPrimitive]) -> Result<usize>;
}

/// Implement Injector for closures.
impl<F> Injector for F
where
    F: FnMut(&[InputPrimitive]) -> Result<usize> + Send,
{
    fn inject(&mut self, batch: &[InputPrimitive]) -> Result<usize> {
        self(batch)
    }
}

/// Pending primitives in submission order.
pub type Batch = HVec<InputPrimitive, BATCH_CAPACITY>;

/// Totals accumulated by a replay engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Loop iterations performed.
    pub iterations: u64,
    /// Reports drained from both queues.
    pub reports: u64,
    /// Primitives accepted by the injector.
    pub injected: u64,
    /// Batches the injector rejected fully or partially.
    pub failed_batches: u64,
}

/// Consumer side of the loopback.
pub struct ReplayEngine<I: Injector> {
    state: Arc<SharedState>,
    mouse: Consumer<MouseReport>,
    keyboard: Consumer<KeyboardReport>,
    injector: I,
    config: ReplayConfig,
    batch: Batch,
    last_buttons: u8,
    throughput: Throughput,
    was_profiling: bool,
    stats: EngineStats,
}

impl<I: Injector> ReplayEngine<I> {
    /// Create an engine over the consumer halves of both queues.
    pub fn new(
        state: Arc<SharedState>,
        mouse: Consumer<MouseReport>,
        keyboard: Consumer<KeyboardReport>,
        injector: I,
        config: ReplayConfig,
    ) -> Self {
        Self {
            state,
            mouse,
            keyboard,
            injector,
            throughput: Throughput::new(config.profile_interval()),
            config,
            batch: Batch::new(),
            last_buttons: 0,
            was_profiling: false,
            stats: EngineStats::default(),
        }
    }

    /// Totals so far.
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Run one drain cycle and return the number of reports drained.
    pub fn run_once(&mut self) -> usize {
        self.stats.iterations += 1;

        // Idle iterations never raise the gate, so real input arriving
        // between bursts is not mistaken for our own.
        if self.mouse.is_empty() && self.keyboard.is_empty() {
            return 0;
        }
        self.state.set_replaying(true);

        let mut drained = 0;
        while let Some(report) = self.mouse.pop() {
            self.emit_mouse(&report);
            drained += 1;
        }
        while let Some(report) = self.keyboard.pop() {
            self.emit_keyboard(&report);
            drained += 1;
        }
        self.flush();

        self.state.set_replaying(false);

        self.stats.reports += drained as u64;
        drained
    }

    /// Loop until shutdown is requested and return the totals.
    pub fn run(mut self) -> EngineStats {
        log::debug!("replay engine started");
        let poll_interval = self.config.poll_interval();

        while self.state.is_running() {
            let drained = self.run_once();
            self.profile(drained);

            if drained == 0 {
                thread::sleep(poll_interval);
            }
        }

        log::debug!(
            "replay engine stopped after {} iterations, {} reports, {} primitives",
            self.stats.iterations,
            self.stats.reports,
            self.stats.injected
        );
        self.stats
    }

    /// Run the engine on a dedicated thread at the highest available priority.
    pub fn spawn(self) -> Result<JoinHandle<EngineStats>>
    where
        I: 'static,
    {
        thread::Builder::new()
            .name("inputloop-replay".into())
            .spawn(move || {
                platform::raise_thread_priority();
                self.run()
            })
            .map_err(|e| Error::ThreadError(format!("failed to spawn replay thread: {e}")))
    }

    fn profile(&mut self, drained: usize) {
        let profiling = self.state.is_profiling();
        let now = Instant::now();
        if profiling && !self.was_profiling {
            self.throughput.reset(now);
        }
        self.was_profiling = profiling;

        if profiling && let Some(sample) = self.throughput.record(drained, now) {
            log::info!("Performance: {sample}");
        }
    }

    fn emit_mouse(&mut self, report: &MouseReport) {
        if report.has_motion() {
            self.push(InputPrimitive::MouseMove {
                dx: report.dx.into(),
                dy: report.dy.into(),
            });
        }

        let changed = report.buttons ^ self.last_buttons;
        for button in Button::ALL {
            if changed & button.mask() != 0 {
                self.push(InputPrimitive::MouseButton {
                    button,
                    pressed: report.is_pressed(button.mask()),
                });
            }
        }

        if report.wheel != 0 {
            self.push(InputPrimitive::Wheel {
                steps: report.wheel.into(),
            });
        }

        self.last_buttons = report.buttons;

        if self.batch.len() >= self.config.flush_threshold {
            self.flush();
        }
    }

    fn emit_keyboard(&mut self, report: &KeyboardReport) {
        for vk_code in report.pressed_keys() {
            self.push(InputPrimitive::KeyDown {
                vk_code: vk_code.into(),
            });
            if self.batch.len() >= self.config.flush_threshold {
                self.flush();
            }
        }
    }

    fn push(&mut self, primitive: InputPrimitive) {
        if self.batch.push(primitive).is_err() {
            self.flush();
            let _ = self.batch.push(primitive);
        }
    }

    fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let submitted = self.batch.len();
        match self.injector.inject(self.batch.as_slice()) {
            Ok(accepted) => {
                self.stats.injected += accepted as u64;
                if accepted < submitted {
                    self.stats.failed_batches += 1;
                    log::warn!("injector accepted {accepted} of {submitted} primitives");
                }
            }
            Err(e) => {
                self.stats.failed_batches += 1;
                log::warn!("dropping batch of {submitted} primitives: {e}");
            }
        }
        self.batch.clear();
    }
}
