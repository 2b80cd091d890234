//! Rate-limited one-directional transfer between two providers.
//!
//! A [`Converter`] holds no mutable state of its own: two optional provider
//! handles and two constants. Each call to [`Converter::transfer`] draws
//! `draw_amount_per_second * elapsed * percent` from the source (best
//! effort), multiplies what it got by the conversion rate, and offers the
//! result to the destination. Output the destination cannot hold is lost,
//! not refunded.
//!
//! A converter built without a source or without a destination is inert:
//! every transfer is an empty no-op.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConverterError};
use crate::fixed::{Fixed64, Seconds, checked_mul_64};
use crate::provider::ResourceProvider;

/// What one transfer actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    /// Taken from the source.
    pub drawn: Fixed64,
    /// `drawn * conversion_rate`.
    pub produced: Fixed64,
    /// Accepted by the destination.
    pub accepted: Fixed64,
    /// Produced but discarded because the destination was full.
    pub lost: Fixed64,
}

#[derive(Debug, Clone)]
pub struct Converter {
    source: Option<Arc<dyn ResourceProvider>>,
    destination: Option<Arc<dyn ResourceProvider>>,
    conversion_rate: Fixed64,
    draw_amount_per_second: Fixed64,
}

impl Converter {
    pub fn new(
        source: Option<Arc<dyn ResourceProvider>>,
        destination: Option<Arc<dyn ResourceProvider>>,
        conversion_rate: Fixed64,
        draw_amount_per_second: Fixed64,
    ) -> Result<Self, ConfigError> {
        if conversion_rate <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveRate {
                name: "conversion_rate",
                value: conversion_rate,
            });
        }
        if draw_amount_per_second <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveRate {
                name: "draw_amount_per_second",
                value: draw_amount_per_second,
            });
        }
        Ok(Self {
            source,
            destination,
            conversion_rate,
            draw_amount_per_second,
        })
    }

    /// Build a converter whose draw rate scales with the part's volume:
    /// `draw_amount_per_second = item_option_rate * part_volume`.
    pub fn from_item_rate(
        source: Option<Arc<dyn ResourceProvider>>,
        destination: Option<Arc<dyn ResourceProvider>>,
        conversion_rate: Fixed64,
        item_option_rate: Fixed64,
        part_volume: Fixed64,
    ) -> Result<Self, ConfigError> {
        if part_volume <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveCapacity(part_volume));
        }
        let draw = checked_mul_64(item_option_rate, part_volume).ok_or(ConfigError::OutOfRange {
            name: "draw_amount_per_second",
            value: part_volume,
        })?;
        Self::new(source, destination, conversion_rate, draw)
    }

    pub fn conversion_rate(&self) -> Fixed64 {
        self.conversion_rate
    }

    pub fn draw_amount_per_second(&self) -> Fixed64 {
        self.draw_amount_per_second
    }

    pub fn source(&self) -> Option<&Arc<dyn ResourceProvider>> {
        self.source.as_ref()
    }

    pub fn destination(&self) -> Option<&Arc<dyn ResourceProvider>> {
        self.destination.as_ref()
    }

    /// True when an endpoint is missing; such a converter never moves anything.
    pub fn is_inert(&self) -> bool {
        self.source.is_none() || self.destination.is_none()
    }

    /// Run one transfer at full throughput.
    pub fn transfer_full(&self, elapsed: Seconds) -> Result<TransferReport, ConverterError> {
        self.transfer(elapsed, Fixed64::ONE)
    }

    /// Run one transfer covering `elapsed` seconds, scaled by `percent`.
    pub fn transfer(
        &self,
        elapsed: Seconds,
        percent: Fixed64,
    ) -> Result<TransferReport, ConverterError> {
        if elapsed < Fixed64::ZERO {
            return Err(ConverterError::NegativeElapsed(elapsed));
        }
        if percent < Fixed64::ZERO || percent > Fixed64::ONE {
            return Err(ConverterError::PercentOutOfRange(percent));
        }

        let (Some(source), Some(destination)) = (&self.source, &self.destination) else {
            return Ok(TransferReport::default());
        };

        // Saturate: long elapsed spans just ask for everything available.
        let desired = self
            .draw_amount_per_second
            .saturating_mul(elapsed)
            .saturating_mul(percent);
        if desired <= Fixed64::ZERO {
            return Ok(TransferReport::default());
        }

        let drawn = source.remove_quantity(desired, false)?;
        let produced = drawn.saturating_mul(self.conversion_rate);
        let accepted = destination.add_quantity(produced, false);

        Ok(TransferReport {
            drawn,
            produced,
            accepted,
            lost: produced - accepted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::test_utils::{fixed, shared_tank};

    fn converter(source: &Arc<Container>, destination: &Arc<Container>) -> Converter {
        Converter::new(
            Some(source.clone() as Arc<dyn ResourceProvider>),
            Some(destination.clone() as Arc<dyn ResourceProvider>),
            fixed(0.5),
            fixed(10.0),
        )
        .unwrap()
    }

    #[test]
    fn throughput_at_full_supply() {
        let src = shared_tank(1000.0, 100.0);
        let dst = shared_tank(1000.0, 0.0);
        let report = converter(&src, &dst).transfer(fixed(2.0), Fixed64::ONE).unwrap();

        assert_eq!(report.drawn, fixed(20.0));
        assert_eq!(report.produced, fixed(10.0));
        assert_eq!(src.quantity_current(), fixed(80.0));
        assert_eq!(dst.quantity_current(), fixed(10.0));
    }

    #[test]
    fn starved_source_draws_what_it_has() {
        let src = shared_tank(1000.0, 5.0);
        let dst = shared_tank(1000.0, 0.0);
        let report = converter(&src, &dst).transfer_full(fixed(2.0)).unwrap();

        assert_eq!(report.drawn, fixed(5.0));
        assert_eq!(src.quantity_current(), Fixed64::ZERO);
        assert_eq!(dst.quantity_current(), fixed(2.5));
    }

    #[test]
    fn overflow_is_lost_not_refunded() {
        let src = shared_tank(1000.0, 100.0);
        let dst = shared_tank(4.0, 0.0);
        let report = converter(&src, &dst).transfer_full(fixed(2.0)).unwrap();

        assert_eq!(report.accepted, fixed(4.0));
        assert_eq!(report.lost, fixed(6.0));
        assert_eq!(src.quantity_current(), fixed(80.0));
    }

    #[test]
    fn percent_scales_throughput() {
        let src = shared_tank(1000.0, 100.0);
        let dst = shared_tank(1000.0, 0.0);
        let report = converter(&src, &dst).transfer(fixed(2.0), fixed(0.25)).unwrap();
        assert_eq!(report.drawn, fixed(5.0));
        assert_eq!(dst.quantity_current(), fixed(2.5));
    }

    #[test]
    fn zero_elapsed_is_a_no_op() {
        let src = shared_tank(1000.0, 100.0);
        let dst = shared_tank(1000.0, 0.0);
        let report = converter(&src, &dst).transfer_full(Fixed64::ZERO).unwrap();
        assert_eq!(report, TransferReport::default());
        assert_eq!(src.quantity_current(), fixed(100.0));
    }

    #[test]
    fn contract_violations_rejected() {
        let src = shared_tank(1000.0, 100.0);
        let dst = shared_tank(1000.0, 0.0);
        let c = converter(&src, &dst);
        assert_eq!(
            c.transfer_full(fixed(-1.0)),
            Err(ConverterError::NegativeElapsed(fixed(-1.0)))
        );
        assert!(matches!(
            c.transfer(fixed(1.0), fixed(1.5)),
            Err(ConverterError::PercentOutOfRange(_))
        ));
        assert_eq!(src.quantity_current(), fixed(100.0));
    }

    #[test]
    fn missing_endpoint_is_inert() {
        let src = shared_tank(1000.0, 100.0);
        let c = Converter::new(
            Some(src.clone() as Arc<dyn ResourceProvider>),
            None,
            fixed(1.0),
            fixed(10.0),
        )
        .unwrap();
        assert!(c.is_inert());
        assert_eq!(c.transfer_full(fixed(5.0)).unwrap(), TransferReport::default());
        assert_eq!(src.quantity_current(), fixed(100.0));
    }

    #[test]
    fn non_positive_rates_rejected() {
        assert!(Converter::new(None, None, Fixed64::ZERO, fixed(1.0)).is_err());
        assert!(Converter::new(None, None, fixed(1.0), fixed(-1.0)).is_err());
        assert!(Converter::from_item_rate(None, None, fixed(1.0), fixed(1.0), Fixed64::ZERO).is_err());
    }

    #[test]
    fn draw_rate_scales_with_part_volume() {
        let c = Converter::from_item_rate(None, None, fixed(1.0), fixed(0.5), fixed(8.0)).unwrap();
        assert_eq!(c.draw_amount_per_second(), fixed(4.0));
    }

    #[test]
    fn oversized_part_volume_rejected() {
        let err = Converter::from_item_rate(None, None, fixed(1.0), fixed(100_000.0), fixed(100_000.0))
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn huge_elapsed_saturates_to_available_supply() {
        let src = shared_tank(10_000.0, 600.0);
        let dst = shared_tank(2_000_000_000.0, 0.0);
        let c = Converter::new(
            Some(src.clone() as Arc<dyn ResourceProvider>),
            Some(dst.clone() as Arc<dyn ResourceProvider>),
            fixed(1_000_000.0),
            fixed(100_000.0),
        )
        .unwrap();

        let report = c.transfer_full(fixed(100_000.0)).unwrap();
        assert_eq!(report.drawn, fixed(600.0));
        assert_eq!(report.produced, fixed(600_000_000.0));
        assert_eq!(report.lost, Fixed64::ZERO);
        assert_eq!(src.quantity_current(), Fixed64::ZERO);

        // 5000 * 1e6 does not fit; output saturates and the excess is lost.
        assert_eq!(src.add_quantity(fixed(5_000.0), false), fixed(5_000.0));
        let report = c.transfer_full(fixed(1.0)).unwrap();
        assert_eq!(report.drawn, fixed(5_000.0));
        assert_eq!(report.produced, Fixed64::MAX);
        assert_eq!(dst.quantity_current(), fixed(2_000_000_000.0));
        assert_eq!(report.lost, Fixed64::MAX - fixed(1_400_000_000.0));
    }
}
