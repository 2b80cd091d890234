//! Validated, fixed-point view of a rate file.
//!
//! Invalid configuration is rejected here, once, so part construction never
//! sees a zero or negative rate.

use std::collections::HashMap;
use std::path::Path;

use shipflow_core::fixed::{Fixed64, checked_mul_64};
use shipflow_core::scheduler::{SchedulerConfig, SimulationStrategy};

use crate::loader::DataLoadError;
use crate::schema::{RateFileData, StrategyData};

/// Rate constants for one item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRate {
    pub conversion_rate: Fixed64,
    /// Units drawn per second per unit of part volume.
    pub draw_rate: Fixed64,
}

impl ItemRate {
    /// Draw per second for a part of the given volume, or `None` if it
    /// leaves the fixed-point range.
    pub fn draw_per_second(&self, part_volume: Fixed64) -> Option<Fixed64> {
        checked_mul_64(self.draw_rate, part_volume)
    }
}

/// Capacity constants for one kind of storage part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageSpec {
    pub capacity_per_volume: Fixed64,
    pub removal_multiple: Option<Fixed64>,
    pub fill_density: Option<Fixed64>,
}

impl StorageSpec {
    /// Capacity for a part of the given volume, or `None` if it leaves the
    /// fixed-point range.
    pub fn capacity_for(&self, part_volume: Fixed64) -> Option<Fixed64> {
        checked_mul_64(self.capacity_per_volume, part_volume)
    }
}

/// All item rates and storage specs, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    items: HashMap<String, ItemRate>,
    storage: HashMap<String, StorageSpec>,
    scheduler: SchedulerConfig,
}

fn positive(
    value: f64,
    file: &Path,
    kind: &'static str,
    name: &str,
    field: &'static str,
) -> Result<Fixed64, DataLoadError> {
    if !(value.is_finite() && value > 0.0) {
        tracing::debug!(file = %file.display(), kind, name, field, value, "rejected constant");
        return Err(DataLoadError::NonPositive {
            file: file.to_path_buf(),
            kind,
            name: name.to_string(),
            field,
            value,
        });
    }
    // Too large overflows; too small rounds to zero.
    match Fixed64::checked_from_num(value) {
        Some(fixed) if fixed > Fixed64::ZERO => Ok(fixed),
        _ => {
            tracing::debug!(file = %file.display(), kind, name, field, value, "constant out of range");
            Err(DataLoadError::OutOfRange {
                file: file.to_path_buf(),
                kind,
                name: name.to_string(),
                field,
                value,
            })
        }
    }
}

impl RateTable {
    /// Validate raw file data. `file` labels errors.
    pub fn resolve(data: RateFileData, file: &Path) -> Result<Self, DataLoadError> {
        let mut items = HashMap::with_capacity(data.items.len());
        for item in &data.items {
            if items.contains_key(&item.name) {
                return Err(DataLoadError::DuplicateName {
                    file: file.to_path_buf(),
                    kind: "item",
                    name: item.name.clone(),
                });
            }
            let rate = ItemRate {
                conversion_rate: positive(item.conversion_rate, file, "item", &item.name, "conversion_rate")?,
                draw_rate: positive(item.draw_rate, file, "item", &item.name, "draw_rate")?,
            };
            items.insert(item.name.clone(), rate);
        }

        let mut storage = HashMap::with_capacity(data.storage.len());
        for spec in &data.storage {
            if storage.contains_key(&spec.name) {
                return Err(DataLoadError::DuplicateName {
                    file: file.to_path_buf(),
                    kind: "storage",
                    name: spec.name.clone(),
                });
            }
            let removal_multiple = spec
                .removal_multiple
                .map(|m| positive(m, file, "storage", &spec.name, "removal_multiple"))
                .transpose()?;
            let fill_density = spec
                .fill_density
                .map(|d| positive(d, file, "storage", &spec.name, "fill_density"))
                .transpose()?;
            let resolved = StorageSpec {
                capacity_per_volume: positive(
                    spec.capacity_per_volume,
                    file,
                    "storage",
                    &spec.name,
                    "capacity_per_volume",
                )?,
                removal_multiple,
                fill_density,
            };
            storage.insert(spec.name.clone(), resolved);
        }

        let scheduler = match &data.scheduler {
            Some(s) => SchedulerConfig {
                strategy: match s.strategy {
                    StrategyData::Tick => SimulationStrategy::Tick,
                    StrategyData::Delta => SimulationStrategy::Delta,
                },
                tick_seconds: positive(s.tick_seconds, file, "scheduler", "scheduler", "tick_seconds")?,
            },
            None => SchedulerConfig::default(),
        };

        Ok(Self {
            items,
            storage,
            scheduler,
        })
    }

    pub fn item(&self, name: &str) -> Result<&ItemRate, DataLoadError> {
        self.items.get(name).ok_or_else(|| DataLoadError::UnknownEntry {
            kind: "item",
            name: name.to_string(),
        })
    }

    pub fn storage(&self, name: &str) -> Result<&StorageSpec, DataLoadError> {
        self.storage.get(name).ok_or_else(|| DataLoadError::UnknownEntry {
            kind: "storage",
            name: name.to_string(),
        })
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        self.scheduler
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn storage_count(&self) -> usize {
        self.storage.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ItemRateData, SchedulerData, StorageData};
    use shipflow_core::fixed::f64_to_fixed64;

    fn origin() -> &'static Path {
        Path::new("test.ron")
    }

    fn item(name: &str, conversion_rate: f64, draw_rate: f64) -> ItemRateData {
        ItemRateData {
            name: name.to_string(),
            conversion_rate,
            draw_rate,
        }
    }

    fn store(name: &str, capacity_per_volume: f64) -> StorageData {
        StorageData {
            name: name.to_string(),
            capacity_per_volume,
            removal_multiple: None,
            fill_density: None,
        }
    }

    #[test]
    fn resolves_to_fixed_point() {
        let data = RateFileData {
            items: vec![item("fuel", 2.0, 0.5)],
            storage: vec![store("tank", 40.0)],
            scheduler: None,
        };
        let table = RateTable::resolve(data, origin()).unwrap();
        let rate = table.item("fuel").unwrap();
        assert_eq!(rate.conversion_rate, f64_to_fixed64(2.0));
        assert_eq!(rate.draw_per_second(f64_to_fixed64(4.0)), Some(f64_to_fixed64(2.0)));
        let spec = table.storage("tank").unwrap();
        assert_eq!(spec.capacity_for(f64_to_fixed64(0.5)), Some(f64_to_fixed64(20.0)));
        assert_eq!(table.scheduler(), SchedulerConfig::default());
    }

    #[test]
    fn duplicate_item_rejected() {
        let data = RateFileData {
            items: vec![item("fuel", 1.0, 1.0), item("fuel", 2.0, 1.0)],
            ..Default::default()
        };
        let err = RateTable::resolve(data, origin()).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateName { kind: "item", .. }));
    }

    #[test]
    fn non_positive_rate_rejected() {
        let data = RateFileData {
            items: vec![item("fuel", 0.0, 1.0)],
            ..Default::default()
        };
        let err = RateTable::resolve(data, origin()).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::NonPositive {
                field: "conversion_rate",
                ..
            }
        ));
    }

    #[test]
    fn nan_capacity_rejected() {
        let data = RateFileData {
            storage: vec![store("tank", f64::NAN)],
            ..Default::default()
        };
        assert!(RateTable::resolve(data, origin()).is_err());
    }

    #[test]
    fn scheduler_section_applied() {
        let data = RateFileData {
            scheduler: Some(SchedulerData {
                tick_seconds: 0.5,
                strategy: StrategyData::Delta,
            }),
            ..Default::default()
        };
        let table = RateTable::resolve(data, origin()).unwrap();
        assert_eq!(table.scheduler().strategy, SimulationStrategy::Delta);
        assert_eq!(table.scheduler().tick_seconds, f64_to_fixed64(0.5));
    }

    #[test]
    fn out_of_range_constants_rejected() {
        let huge = RateFileData {
            storage: vec![store("tank", 1e10)],
            ..Default::default()
        };
        let err = RateTable::resolve(huge, origin()).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::OutOfRange {
                field: "capacity_per_volume",
                ..
            }
        ));

        let tiny = RateFileData {
            items: vec![item("fuel", 1e-12, 1.0)],
            ..Default::default()
        };
        let err = RateTable::resolve(tiny, origin()).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::OutOfRange {
                field: "conversion_rate",
                ..
            }
        ));
    }

    #[test]
    fn sizing_past_range_is_none() {
        let table = RateTable::resolve(
            RateFileData {
                items: vec![item("fuel", 1.0, 100_000.0)],
                storage: vec![store("tank", 100_000.0)],
                scheduler: None,
            },
            origin(),
        )
        .unwrap();
        let volume = f64_to_fixed64(100_000.0);
        assert_eq!(table.item("fuel").unwrap().draw_per_second(volume), None);
        assert_eq!(table.storage("tank").unwrap().capacity_for(volume), None);
    }

    #[test]
    fn unknown_lookup_reports_kind() {
        let table = RateTable::default();
        let err = table.storage("nope").unwrap_err();
        assert_eq!(err.to_string(), "unknown storage 'nope'");
    }
}
