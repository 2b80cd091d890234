//! Powered sensors: draw a fixed power per second from an energy provider
//! and switch off when the draw comes up short.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shipflow_core::error::{ConfigError, PartError};
use shipflow_core::fixed::{Fixed64, Seconds};
use shipflow_core::part::Part;
use shipflow_core::provider::{self, ResourceProvider};

#[derive(Debug)]
pub struct Sensor {
    name: String,
    supply: Arc<dyn ResourceProvider>,
    power_per_second: Fixed64,
    interval_skips: Option<u32>,
    powered: AtomicBool,
    destroyed: AtomicBool,
}

impl Sensor {
    pub fn new(
        name: impl Into<String>,
        supply: Arc<dyn ResourceProvider>,
        power_per_second: Fixed64,
    ) -> Result<Self, ConfigError> {
        if power_per_second <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveRate {
                name: "power_per_second",
                value: power_per_second,
            });
        }
        Ok(Self {
            name: name.into(),
            supply,
            power_per_second,
            interval_skips: None,
            powered: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        })
    }

    pub fn with_interval_skips(mut self, skips: u32) -> Self {
        self.interval_skips = Some(skips);
        self
    }

    /// Whether the last update got all the power it asked for.
    pub fn is_powered(&self) -> bool {
        self.powered.load(Ordering::Acquire)
    }

    pub fn power_per_second(&self) -> Fixed64 {
        self.power_per_second
    }
}

impl Part for Sensor {
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
        let draw = provider::draw_from(self.supply.as_ref(), self.power_per_second.saturating_mul(dt))?;
        let powered = draw.is_satisfied();
        if self.powered.swap(powered, Ordering::AcqRel) != powered {
            tracing::debug!(sensor = %self.name, powered, shortfall = %draw.shortfall(), "sensor power changed");
        }
        Ok(())
    }

    fn destroy(&self) {
        self.powered.store(false, Ordering::Release);
        self.destroyed.store(true, Ordering::Release);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipflow_core::test_utils::{fixed, shared_tank};

    #[test]
    fn sensor_powered_while_supply_lasts() {
        let battery = shared_tank(10.0, 3.0);
        let sensor = Sensor::new("radar", battery.clone(), fixed(2.0)).unwrap();

        sensor.update_any_thread(fixed(1.0)).unwrap();
        assert!(sensor.is_powered());
        assert_eq!(battery.quantity_current(), fixed(1.0));

        sensor.update_any_thread(fixed(1.0)).unwrap();
        assert!(!sensor.is_powered());
        assert_eq!(battery.quantity_current(), Fixed64::ZERO);
    }

    #[test]
    fn sensor_recovers_when_recharged() {
        let battery = shared_tank(10.0, 0.0);
        let sensor = Sensor::new("radar", battery.clone(), fixed(1.0)).unwrap();
        sensor.update_any_thread(fixed(1.0)).unwrap();
        assert!(!sensor.is_powered());

        let _ = battery.add_quantity(fixed(5.0), false);
        sensor.update_any_thread(fixed(1.0)).unwrap();
        assert!(sensor.is_powered());
    }

    #[test]
    fn zero_power_rejected() {
        let battery = shared_tank(10.0, 0.0);
        assert!(Sensor::new("radar", battery, Fixed64::ZERO).is_err());
    }

    #[test]
    fn destroyed_sensor_stops_drawing() {
        let battery = shared_tank(10.0, 10.0);
        let sensor = Sensor::new("radar", battery.clone(), fixed(1.0)).unwrap();
        sensor.destroy();
        sensor.update_any_thread(fixed(1.0)).unwrap();
        assert_eq!(battery.quantity_current(), fixed(10.0));
        assert!(!sensor.is_powered());
    }
}
