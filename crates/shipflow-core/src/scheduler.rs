//! The tick scheduler: drives every registered part's two update channels
//! at a configured cadence.
//!
//! # Tick pipeline
//!
//! Each tick runs:
//! 1. **Collect** -- advance every active part's per-channel skip counters
//!    and pick the parts that are due on the any-thread channel.
//! 2. **Any-thread** -- run the due updates, in parallel under the
//!    `parallel` feature, sequentially otherwise.
//! 3. **Main-thread** -- run due main-thread updates serially, in
//!    registration order.
//! 4. **Bookkeeping** -- bump the tick counter.
//!
//! A part that returns an error or panics inside an update is reported as a
//! [`PartFault`] and logged; the rest of the tick proceeds.
//!
//! # Interval skips
//!
//! A channel with skip count `n` runs on every `(n + 1)`-th tick. The `dt`
//! handed to a subsampled update is the time accumulated since that channel
//! last ran, so rate-based parts keep their throughput.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::ConfigError;
use crate::fixed::{Fixed64, Seconds, Ticks, f64_to_fixed64};
use crate::part::{Channel, Lifecycle, Part, PartId};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How the scheduler advances time. Chosen at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationStrategy {
    /// Exactly one tick per `advance()` call; the elapsed argument is ignored.
    Tick,

    /// Real-time mode. Elapsed seconds accumulate and as many fixed ticks
    /// run as fit, carrying the remainder forward.
    Delta,
}

/// Upper bound on ticks a single Delta-mode `advance` will run. Time beyond
/// it stays in the accumulator for later calls.
pub const MAX_TICKS_PER_ADVANCE: u64 = 1024;

/// Scheduler cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub strategy: SimulationStrategy,
    /// Simulated seconds covered by one tick.
    pub tick_seconds: Seconds,
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_seconds <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveTick(self.tick_seconds));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            strategy: SimulationStrategy::Tick,
            tick_seconds: f64_to_fixed64(1.0 / 60.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A failed part update, captured so the tick could continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartFault {
    pub part: PartId,
    pub name: String,
    pub channel: Channel,
    pub message: String,
}

/// What a single tick did.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// The tick number that just completed (first tick is 1).
    pub tick: Ticks,
    pub any_thread_runs: usize,
    pub main_thread_runs: usize,
    pub faults: Vec<PartFault>,
}

/// Result of a [`TickScheduler::advance`] call.
#[derive(Debug, Default)]
pub struct AdvanceResult {
    /// Number of ticks actually executed.
    pub steps_run: u64,
    /// One report per executed tick.
    pub reports: Vec<TickReport>,
    /// Seconds still waiting in the accumulator afterwards.
    pub pending: Seconds,
}

impl AdvanceResult {
    pub fn faults(&self) -> impl Iterator<Item = &PartFault> {
        self.reports.iter().flat_map(|r| r.faults.iter())
    }
}

// ---------------------------------------------------------------------------
// Per-part bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct ChannelCounter {
    skipped: u32,
    accumulated: Seconds,
}

impl ChannelCounter {
    /// Count one tick of `dt`. Returns the accumulated time when the
    /// channel is due.
    fn tick(&mut self, skips: Option<u32>, dt: Seconds) -> Option<Seconds> {
        self.accumulated = self.accumulated.saturating_add(dt);
        if self.skipped >= skips.unwrap_or(0) {
            self.skipped = 0;
            Some(std::mem::replace(&mut self.accumulated, Fixed64::ZERO))
        } else {
            self.skipped += 1;
            None
        }
    }
}

#[derive(Debug)]
struct PartSlot {
    part: Arc<dyn Part>,
    lifecycle: Lifecycle,
    any_thread: ChannelCounter,
    main_thread: ChannelCounter,
}

/// Mutable state tracked across ticks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimState {
    /// Completed tick count.
    pub tick: Ticks,
    /// Seconds carried over in delta mode.
    pub accumulator: Seconds,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct TickScheduler {
    config: SchedulerConfig,
    pub sim_state: SimState,
    paused: bool,
    parts: SlotMap<PartId, PartSlot>,
    /// Registration order, used for main-thread dispatch.
    order: Vec<PartId>,
}

impl TickScheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            sim_state: SimState::default(),
            paused: false,
            parts: SlotMap::with_key(),
            order: Vec::new(),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Part management
    // -----------------------------------------------------------------------

    pub fn add_part(&mut self, part: Arc<dyn Part>) -> PartId {
        let lifecycle = if part.is_destroyed() {
            Lifecycle::Destroyed
        } else {
            Lifecycle::Active
        };
        let id = self.parts.insert(PartSlot {
            part,
            lifecycle,
            any_thread: ChannelCounter::default(),
            main_thread: ChannelCounter::default(),
        });
        self.order.push(id);
        id
    }

    /// Unregister a part. Returns it so the caller can keep using it.
    pub fn remove_part(&mut self, id: PartId) -> Option<Arc<dyn Part>> {
        let slot = self.parts.remove(id)?;
        self.order.retain(|p| *p != id);
        Some(slot.part)
    }

    /// Destroy a part: notify it synchronously and stop dispatching to it.
    /// Returns `false` for an unknown id.
    pub fn destroy_part(&mut self, id: PartId) -> bool {
        let Some(slot) = self.parts.get_mut(id) else {
            return false;
        };
        if slot.lifecycle == Lifecycle::Active {
            slot.part.destroy();
            slot.lifecycle = Lifecycle::Destroyed;
            tracing::debug!(part = slot.part.name(), "part destroyed");
        }
        true
    }

    pub fn lifecycle(&self, id: PartId) -> Option<Lifecycle> {
        self.parts.get(id).map(|s| s.lifecycle)
    }

    pub fn part(&self, id: PartId) -> Option<&Arc<dyn Part>> {
        self.parts.get(id).map(|s| &s.part)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn active_part_count(&self) -> usize {
        self.parts
            .values()
            .filter(|s| s.lifecycle == Lifecycle::Active)
            .count()
    }

    // -----------------------------------------------------------------------
    // Pause
    // -----------------------------------------------------------------------

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Completed tick count.
    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Advance according to the configured strategy.
    ///
    /// - **Tick mode**: `elapsed` is ignored; exactly one tick runs.
    /// - **Delta mode**: `elapsed` accumulates; as many ticks run as fit,
    ///   up to [`MAX_TICKS_PER_ADVANCE`]. Negative elapsed time is ignored.
    pub fn advance(&mut self, elapsed: Seconds) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        if self.paused {
            return result;
        }

        match self.config.strategy {
            SimulationStrategy::Tick => {
                result.reports.push(self.step_internal());
                result.steps_run += 1;
            }
            SimulationStrategy::Delta => {
                if elapsed > Fixed64::ZERO {
                    self.sim_state.accumulator = self.sim_state.accumulator.saturating_add(elapsed);
                }
                while self.sim_state.accumulator >= self.config.tick_seconds {
                    if result.steps_run == MAX_TICKS_PER_ADVANCE {
                        tracing::warn!(
                            steps = result.steps_run,
                            pending = %self.sim_state.accumulator,
                            "tick cap reached; carrying the rest forward"
                        );
                        break;
                    }
                    self.sim_state.accumulator -= self.config.tick_seconds;
                    result.reports.push(self.step_internal());
                    result.steps_run += 1;
                }
            }
        }

        result.pending = self.sim_state.accumulator;
        result
    }

    /// Run a single tick regardless of strategy. Ignores pause.
    pub fn step(&mut self) -> TickReport {
        self.step_internal()
    }

    fn step_internal(&mut self) -> TickReport {
        let dt = self.config.tick_seconds;
        let mut report = TickReport::default();

        // Phase 1: collect due parts.
        let mut due_any: Vec<(PartId, Arc<dyn Part>, Seconds)> = Vec::new();
        let mut due_main: Vec<(PartId, Arc<dyn Part>, Seconds)> = Vec::new();
        for &id in &self.order {
            let Some(slot) = self.parts.get_mut(id) else {
                continue;
            };
            if slot.lifecycle == Lifecycle::Destroyed {
                continue;
            }
            if slot.part.is_destroyed() {
                slot.lifecycle = Lifecycle::Destroyed;
                continue;
            }
            let part = slot.part.as_ref();
            if let Some(elapsed) = slot
                .any_thread
                .tick(Channel::AnyThread.interval_skips(part), dt)
            {
                due_any.push((id, Arc::clone(&slot.part), elapsed));
            }
            let part = slot.part.as_ref();
            if let Some(elapsed) = slot
                .main_thread
                .tick(Channel::MainThread.interval_skips(part), dt)
            {
                due_main.push((id, Arc::clone(&slot.part), elapsed));
            }
        }

        // Phase 2: any-thread updates.
        report.any_thread_runs = due_any.len();
        report.faults.extend(dispatch_any_thread(&due_any));

        // Phase 3: main-thread updates, serialized.
        report.main_thread_runs = due_main.len();
        for (id, part, elapsed) in &due_main {
            if let Some(fault) = run_isolated(*id, part.as_ref(), Channel::MainThread, *elapsed) {
                report.faults.push(fault);
            }
        }

        // Phase 4: bookkeeping.
        self.sim_state.tick += 1;
        report.tick = self.sim_state.tick;
        tracing::trace!(
            tick = report.tick,
            any_thread = report.any_thread_runs,
            main_thread = report.main_thread_runs,
            faults = report.faults.len(),
            "tick complete"
        );
        report
    }
}

#[cfg(feature = "parallel")]
fn dispatch_any_thread(due: &[(PartId, Arc<dyn Part>, Seconds)]) -> Vec<PartFault> {
    use rayon::prelude::*;

    due.par_iter()
        .filter_map(|(id, part, elapsed)| {
            run_isolated(*id, part.as_ref(), Channel::AnyThread, *elapsed)
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn dispatch_any_thread(due: &[(PartId, Arc<dyn Part>, Seconds)]) -> Vec<PartFault> {
    due.iter()
        .filter_map(|(id, part, elapsed)| {
            run_isolated(*id, part.as_ref(), Channel::AnyThread, *elapsed)
        })
        .collect()
}

/// Run one update, converting an error or a panic into a [`PartFault`].
fn run_isolated(id: PartId, part: &dyn Part, channel: Channel, dt: Seconds) -> Option<PartFault> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match channel {
        Channel::AnyThread => part.update_any_thread(dt),
        Channel::MainThread => part.update_main_thread(dt),
    }));

    let message = match outcome {
        Ok(Ok(())) => return None,
        Ok(Err(err)) => err.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };

    tracing::warn!(
        part = part.name(),
        %channel,
        error = %message,
        "part update failed; continuing tick"
    );
    Some(PartFault {
        part: id,
        name: part.name().to_string(),
        channel,
        message,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "part update panicked".to_string()
    }
}
