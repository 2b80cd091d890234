//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::container::Container;
use crate::error::PartError;
use crate::fixed::{Fixed64, Seconds};
use crate::ledger::{MatterLedger, Parcel};
use crate::part::Part;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Primitive constructors
// ===========================================================================

/// A continuous container with `max` capacity holding `current`.
pub fn tank(max: f64, current: f64) -> Container {
    Container::new(fixed(max))
        .expect("test tank capacity must be positive")
        .with_contents(fixed(current))
}

pub fn shared_tank(max: f64, current: f64) -> Arc<Container> {
    Arc::new(tank(max, current))
}

pub fn parcel(volume: f64, density: f64) -> Parcel {
    Parcel::new(fixed(volume), fixed(density)).expect("test parcel must be valid")
}

/// A ledger pre-loaded with `(volume, density)` parcels.
pub fn loaded_ledger(max_volume: f64, parcels: &[(f64, f64)]) -> MatterLedger {
    let ledger = MatterLedger::new(fixed(max_volume)).expect("test ledger volume must be positive");
    for &(volume, density) in parcels {
        assert!(ledger.add(parcel(volume, density)), "test parcel overflowed ledger");
    }
    ledger
}

// ===========================================================================
// Instrumented part
// ===========================================================================

/// A part that counts its updates and can be told to fail.
#[derive(Debug)]
pub struct CountingPart {
    name: String,
    any_thread_skips: Option<u32>,
    main_thread_skips: Option<u32>,
    failure: Option<PartError>,
    panics: bool,
    any_thread_calls: AtomicU64,
    main_thread_calls: AtomicU64,
    last_any_thread_dt: Mutex<Seconds>,
    destroyed: AtomicBool,
}

impl CountingPart {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            any_thread_skips: None,
            main_thread_skips: None,
            failure: None,
            panics: false,
            any_thread_calls: AtomicU64::new(0),
            main_thread_calls: AtomicU64::new(0),
            last_any_thread_dt: Mutex::new(Fixed64::ZERO),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn with_any_thread_skips(mut self, skips: u32) -> Self {
        self.any_thread_skips = Some(skips);
        self
    }

    pub fn with_main_thread_skips(mut self, skips: u32) -> Self {
        self.main_thread_skips = Some(skips);
        self
    }

    /// Return `err` from every any-thread update.
    pub fn failing_with(mut self, err: PartError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Panic in every any-thread update.
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn any_thread_calls(&self) -> u64 {
        self.any_thread_calls.load(Ordering::SeqCst)
    }

    pub fn main_thread_calls(&self) -> u64 {
        self.main_thread_calls.load(Ordering::SeqCst)
    }

    pub fn last_any_thread_dt(&self) -> Seconds {
        *self.last_any_thread_dt.lock()
    }
}

impl Part for CountingPart {
    fn name(&self) -> &str {
        &self.name
    }

    fn interval_skips_any_thread(&self) -> Option<u32> {
        self.any_thread_skips
    }

    fn interval_skips_main_thread(&self) -> Option<u32> {
        self.main_thread_skips
    }

    fn update_any_thread(&self, dt: Seconds) -> Result<(), PartError> {
        self.any_thread_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_any_thread_dt.lock() = dt;
        if self.panics {
            panic!("{} exploded", self.name);
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn update_main_thread(&self, _dt: Seconds) -> Result<(), PartError> {
        self.main_thread_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}
