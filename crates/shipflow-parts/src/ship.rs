//! The ship aggregate: a scheduler plus the rate table its parts are sized
//! from.
//!
//! Every builder takes a part volume and looks its constants up by name, so
//! a ship description only ever says "a 4 m³ fuel tank", never "a tank of
//! 320 units".

use std::path::Path;
use std::sync::Arc;

use shipflow_core::container::Container;
use shipflow_core::converter::Converter;
use shipflow_core::error::ConfigError;
use shipflow_core::fixed::{Fixed64, Seconds};
use shipflow_core::part::{Lifecycle, Part, PartId};
use shipflow_core::provider::ResourceProvider;
use shipflow_core::scheduler::{AdvanceResult, TickReport, TickScheduler};
use shipflow_data::{DataLoadError, RateTable, load_rate_table};

use crate::ammo::AmmoFeed;
use crate::converter_part::ConverterPart;
use crate::matter_bay::MatterBay;
use crate::sensor::Sensor;
use crate::tank::{Tank, TankKind};

/// Errors raised while assembling a ship.
#[derive(Debug, thiserror::Error)]
pub enum ShipError {
    #[error(transparent)]
    Data(#[from] DataLoadError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A matter bay was built from a storage entry with no fill density.
    #[error("storage '{storage}' has no fill_density")]
    MissingFillDensity { storage: String },
    /// An ammo feed was built from a storage entry with no removal multiple.
    #[error("storage '{storage}' has no removal_multiple")]
    MissingRemovalMultiple { storage: String },
}

#[derive(Debug)]
pub struct Ship {
    rates: RateTable,
    scheduler: TickScheduler,
}

impl Ship {
    /// A ship whose scheduler runs at the table's configured cadence.
    pub fn new(rates: RateTable) -> Result<Self, ShipError> {
        let scheduler = TickScheduler::new(rates.scheduler())?;
        Ok(Self { rates, scheduler })
    }

    /// Load a rate file and build an empty ship from it.
    pub fn from_rate_file(path: &Path) -> Result<Self, ShipError> {
        Self::new(load_rate_table(path)?)
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut TickScheduler {
        &mut self.scheduler
    }

    /// Register an already-built part. Returns its id and a typed handle.
    pub fn add_part<P: Part + 'static>(&mut self, part: P) -> (PartId, Arc<P>) {
        let part = Arc::new(part);
        let id = self.scheduler.add_part(part.clone());
        tracing::debug!(part = part.name(), "part added");
        (id, part)
    }

    fn sized(
        value: Option<Fixed64>,
        name: &'static str,
        part_volume: Fixed64,
    ) -> Result<Fixed64, ShipError> {
        value.ok_or(ShipError::Config(ConfigError::OutOfRange {
            name,
            value: part_volume,
        }))
    }

    pub fn add_tank(
        &mut self,
        name: impl Into<String>,
        kind: TankKind,
        storage: &str,
        part_volume: Fixed64,
    ) -> Result<(PartId, Arc<Tank>), ShipError> {
        let spec = *self.rates.storage(storage)?;
        let capacity = Self::sized(spec.capacity_for(part_volume), "capacity", part_volume)?;
        let container = match spec.removal_multiple {
            Some(multiple) => Container::discrete(capacity, multiple)?,
            None => Container::new(capacity)?,
        };
        Ok(self.add_part(Tank::new(name, kind, container)))
    }

    pub fn add_matter_bay(
        &mut self,
        name: impl Into<String>,
        storage: &str,
        part_volume: Fixed64,
    ) -> Result<(PartId, Arc<MatterBay>), ShipError> {
        let spec = *self.rates.storage(storage)?;
        let fill_density = spec.fill_density.ok_or_else(|| ShipError::MissingFillDensity {
            storage: storage.to_string(),
        })?;
        let capacity = Self::sized(spec.capacity_for(part_volume), "capacity", part_volume)?;
        let bay = MatterBay::new(name, capacity, fill_density)?;
        Ok(self.add_part(bay))
    }

    /// A converter processing `item`, drawing at the item's rate scaled by
    /// `part_volume`. Either endpoint may be absent; the part is then inert.
    pub fn add_converter(
        &mut self,
        name: impl Into<String>,
        item: &str,
        source: Option<Arc<dyn ResourceProvider>>,
        destination: Option<Arc<dyn ResourceProvider>>,
        part_volume: Fixed64,
    ) -> Result<(PartId, Arc<ConverterPart>), ShipError> {
        let rate = *self.rates.item(item)?;
        let converter = Converter::from_item_rate(
            source,
            destination,
            rate.conversion_rate,
            rate.draw_rate,
            part_volume,
        )?;
        Ok(self.add_part(ConverterPart::new(name, converter)))
    }

    /// A sensor whose power draw is `item`'s draw rate scaled by `part_volume`.
    pub fn add_sensor(
        &mut self,
        name: impl Into<String>,
        item: &str,
        supply: Arc<dyn ResourceProvider>,
        part_volume: Fixed64,
    ) -> Result<(PartId, Arc<Sensor>), ShipError> {
        let rate = *self.rates.item(item)?;
        let power = Self::sized(
            rate.draw_per_second(part_volume),
            "power_per_second",
            part_volume,
        )?;
        let sensor = Sensor::new(name, supply, power)?;
        Ok(self.add_part(sensor))
    }

    pub fn add_ammo_feed(
        &mut self,
        name: impl Into<String>,
        storage: &str,
        part_volume: Fixed64,
        feed: Option<Arc<dyn ResourceProvider>>,
    ) -> Result<(PartId, Arc<AmmoFeed>), ShipError> {
        let spec = *self.rates.storage(storage)?;
        let round_size = spec
            .removal_multiple
            .ok_or_else(|| ShipError::MissingRemovalMultiple {
                storage: storage.to_string(),
            })?;
        let capacity = Self::sized(spec.capacity_for(part_volume), "capacity", part_volume)?;
        let mut ammo = AmmoFeed::new(name, capacity, round_size)?;
        if let Some(feed) = feed {
            ammo = ammo.with_feed(feed);
        }
        Ok(self.add_part(ammo))
    }

    /// Destroy a part. Returns `false` for an unknown id.
    pub fn destroy_part(&mut self, id: PartId) -> bool {
        self.scheduler.destroy_part(id)
    }

    pub fn lifecycle(&self, id: PartId) -> Option<Lifecycle> {
        self.scheduler.lifecycle(id)
    }

    pub fn advance(&mut self, elapsed: Seconds) -> AdvanceResult {
        self.scheduler.advance(elapsed)
    }

    pub fn step(&mut self) -> TickReport {
        self.scheduler.step()
    }
}
