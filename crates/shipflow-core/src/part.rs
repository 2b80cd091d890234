//! The part contract the tick scheduler drives.
//!
//! A part is any ship component that owns or references resource
//! primitives. Parts are shared with the scheduler as `Arc<dyn Part>` and
//! take `&self` everywhere: each part protects its own state, and the
//! containers and ledgers it touches carry their own locks.

use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::error::PartError;
use crate::fixed::Seconds;

new_key_type! {
    /// Identifies a part registered with a [`TickScheduler`](crate::scheduler::TickScheduler).
    pub struct PartId;
}

/// Lifecycle of a registered part. `Destroyed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    Active,
    Destroyed,
}

/// The two update channels a part can be driven on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// May run on a worker thread, concurrently with other parts.
    AnyThread,
    /// Always serialized on the thread that calls the scheduler.
    MainThread,
}

/// A ship part driven by the tick scheduler.
///
/// Interval skips subsample a channel: `None` or `Some(0)` runs every tick,
/// `Some(n)` runs once every `n + 1` ticks.
pub trait Part: Send + Sync + fmt::Debug {
    /// Human-readable name used in fault reports and logs.
    fn name(&self) -> &str;

    fn interval_skips_any_thread(&self) -> Option<u32> {
        None
    }

    fn interval_skips_main_thread(&self) -> Option<u32> {
        None
    }

    /// Per-tick work that is safe to run concurrently with other parts.
    fn update_any_thread(&self, dt: Seconds) -> Result<(), PartError> {
        let _ = dt;
        Ok(())
    }

    /// Per-tick work that needs affinity with thread-unsafe collaborators.
    fn update_main_thread(&self, dt: Seconds) -> Result<(), PartError> {
        let _ = dt;
        Ok(())
    }

    /// Terminal transition. Zeroes every container and ledger the part owns.
    fn destroy(&self);

    fn is_destroyed(&self) -> bool;
}

impl Channel {
    pub(crate) fn interval_skips(self, part: &dyn Part) -> Option<u32> {
        match self {
            Channel::AnyThread => part.interval_skips_any_thread(),
            Channel::MainThread => part.interval_skips_main_thread(),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::AnyThread => f.write_str("any-thread"),
            Channel::MainThread => f.write_str("main-thread"),
        }
    }
}
