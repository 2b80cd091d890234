//! Reactors, refineries, and injectors: parts whose per-tick work is one
//! converter transfer.
//!
//! Efficiency scales throughput without touching the converter's constant
//! rates, which is how damage is modelled. A converter part owns nothing it
//! draws from or fills, so destroying it only stops it.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use shipflow_core::converter::{Converter, TransferReport};
use shipflow_core::error::{ConverterError, PartError};
use shipflow_core::fixed::{Fixed64, Seconds};
use shipflow_core::part::Part;

#[derive(Debug)]
pub struct ConverterPart {
    name: String,
    converter: Converter,
    efficiency: Mutex<Fixed64>,
    interval_skips: Option<u32>,
    last_report: Mutex<TransferReport>,
    destroyed: AtomicBool,
}

impl ConverterPart {
    pub fn new(name: impl Into<String>, converter: Converter) -> Self {
        Self {
            name: name.into(),
            converter,
            efficiency: Mutex::new(Fixed64::ONE),
            interval_skips: None,
            last_report: Mutex::new(TransferReport::default()),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Subsample this part's updates (see [`Part::interval_skips_any_thread`]).
    pub fn with_interval_skips(mut self, skips: u32) -> Self {
        self.interval_skips = Some(skips);
        self
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn efficiency(&self) -> Fixed64 {
        *self.efficiency.lock()
    }

    /// Set the throughput fraction in `[0, 1]`.
    pub fn set_efficiency(&self, percent: Fixed64) -> Result<(), ConverterError> {
        if percent < Fixed64::ZERO || percent > Fixed64::ONE {
            return Err(ConverterError::PercentOutOfRange(percent));
        }
        *self.efficiency.lock() = percent;
        Ok(())
    }

    /// What the most recent update moved.
    pub fn last_report(&self) -> TransferReport {
        *self.last_report.lock()
    }
}

impl Part for ConverterPart {
    fn name(&self) -> &str {
        &self.name
    }

    fn interval_skips_any_thread(&self) -> Option<u32> {
        self.interval_skips
    }

    fn update_any_thread(&self, dt: Seconds) -> Result<(), PartError> {
        if self.is_destroyed() {
            return Ok(());
        }
        let report = self.converter.transfer(dt, self.efficiency())?;
        *self.last_report.lock() = report;
        Ok(())
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::Release);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}
