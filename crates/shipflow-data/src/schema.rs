//! Serde data file structs for per-item-type and per-part-kind constants.
//!
//! These structs define the on-disk format. They are deserialized from RON,
//! JSON, or TOML data files and then validated into a
//! [`RateTable`](crate::table::RateTable) by the loader.

use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

/// Rate constants for one item type a converter can process.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRateData {
    pub name: String,
    /// Output produced per unit drawn from the source.
    pub conversion_rate: f64,
    /// Item option rate: units drawn per second per unit of part volume.
    pub draw_rate: f64,
}

// ===========================================================================
// Storage
// ===========================================================================

/// Capacity constants for one kind of storage part.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageData {
    pub name: String,
    /// Capacity per unit of part volume (quantity for containers, volume
    /// for matter bays).
    pub capacity_per_volume: f64,
    /// Discrete removal step, for ammunition-like stores.
    #[serde(default)]
    pub removal_multiple: Option<f64>,
    /// Density used when mass is added to a matter bay through its provider.
    #[serde(default)]
    pub fill_density: Option<f64>,
}

// ===========================================================================
// Scheduler
// ===========================================================================

/// How the scheduler advances time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyData {
    #[default]
    Tick,
    Delta,
}

/// Scheduler cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerData {
    pub tick_seconds: f64,
    #[serde(default)]
    pub strategy: StrategyData,
}

// ===========================================================================
// Top level
// ===========================================================================

/// A complete rate file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateFileData {
    #[serde(default)]
    pub items: Vec<ItemRateData>,
    #[serde(default)]
    pub storage: Vec<StorageData>,
    #[serde(default)]
    pub scheduler: Option<SchedulerData>,
}
