//! Density-ordered cargo store for parts that consume bulk matter.
//!
//! A [`MatterLedger`] holds parcels of matter sorted by non-decreasing
//! density, bounded by a fixed volume. Consumption is by mass and always
//! starts at the light end: cheap, light matter burns first.
//!
//! Parcels whose density equals an existing parcel's are merged into it,
//! so the parcel list grows only with the number of distinct densities.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ResourceError};
use crate::fixed::{Fixed64, QUANTITY_EPSILON, checked_div_64, checked_mul_64, non_negative};
use crate::provider::{ProviderGuard, ProviderId, ResourceProvider};

// ---------------------------------------------------------------------------
// Parcel
// ---------------------------------------------------------------------------

/// A homogeneous lump of matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    pub volume: Fixed64,
    pub density: Fixed64,
}

impl Parcel {
    pub fn new(volume: Fixed64, density: Fixed64) -> Result<Self, ConfigError> {
        if volume <= Fixed64::ZERO {
            return Err(ConfigError::InvalidParcel {
                field: "volume",
                value: volume,
            });
        }
        if density <= Fixed64::ZERO {
            return Err(ConfigError::InvalidParcel {
                field: "density",
                value: density,
            });
        }
        Ok(Self { volume, density })
    }

    /// Saturates at `Fixed64::MAX`; ledgers refuse parcels whose mass does
    /// not fit.
    pub fn mass(&self) -> Fixed64 {
        self.volume.saturating_mul(self.density)
    }
}

// ---------------------------------------------------------------------------
// Locked state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct LedgerState {
    parcels: Vec<Parcel>,
    max_volume: Fixed64,
    destroyed: bool,
}

impl LedgerState {
    fn used_volume(&self) -> Fixed64 {
        self.parcels
            .iter()
            .fold(Fixed64::ZERO, |acc, p| acc + p.volume)
    }

    fn free_volume(&self) -> Fixed64 {
        if self.destroyed {
            return Fixed64::ZERO;
        }
        non_negative(self.max_volume - self.used_volume())
    }

    fn mass(&self) -> Fixed64 {
        self.parcels
            .iter()
            .fold(Fixed64::ZERO, |acc, p| acc.saturating_add(p.mass()))
    }

    fn add(&mut self, parcel: Parcel) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(used) = self.used_volume().checked_add(parcel.volume) else {
            return false;
        };
        if used > self.max_volume.saturating_add(QUANTITY_EPSILON) {
            return false;
        }
        // Total mass must stay representable.
        let fits = checked_mul_64(parcel.volume, parcel.density)
            .and_then(|m| self.mass().checked_add(m))
            .is_some();
        if !fits {
            tracing::debug!(volume = %parcel.volume, density = %parcel.density, "rejected parcel mass out of range");
            return false;
        }

        // First parcel at least as dense as the newcomer.
        let idx = self.parcels.partition_point(|p| p.density < parcel.density);
        match self.parcels.get_mut(idx) {
            Some(existing) if existing.density == parcel.density => {
                existing.volume += parcel.volume;
            }
            _ => self.parcels.insert(idx, parcel),
        }
        true
    }

    fn remove_mass(&mut self, requested: Fixed64) -> Fixed64 {
        let mut remaining = non_negative(requested);
        let mut removed = Fixed64::ZERO;

        while remaining > Fixed64::ZERO {
            let Some(front) = self.parcels.first_mut() else {
                break;
            };
            let parcel_mass = front.mass();
            if parcel_mass <= remaining {
                removed += parcel_mass;
                remaining -= parcel_mass;
                self.parcels.remove(0);
                continue;
            }

            let consumed = checked_div_64(remaining, front.density)
                .map_or(front.volume, |v| v.min(front.volume));
            front.volume -= consumed;
            removed += remaining;
            remaining = Fixed64::ZERO;
            if front.volume <= QUANTITY_EPSILON {
                self.parcels.remove(0);
            }
        }

        removed
    }
}

// ---------------------------------------------------------------------------
// MatterLedger
// ---------------------------------------------------------------------------

/// Bounded, density-ordered collection of matter parcels.
#[derive(Debug)]
pub struct MatterLedger {
    /// Shared by every [`LedgerProvider`] over this ledger, so a move
    /// between two adapters of one ledger is recognised as a self-move.
    id: ProviderId,
    state: Mutex<LedgerState>,
}

impl MatterLedger {
    pub fn new(max_volume: Fixed64) -> Result<Self, ConfigError> {
        if max_volume <= Fixed64::ZERO {
            tracing::debug!(%max_volume, "rejected ledger volume");
            return Err(ConfigError::NonPositiveCapacity(max_volume));
        }
        Ok(Self {
            id: ProviderId::next(),
            state: Mutex::new(LedgerState {
                parcels: Vec::new(),
                max_volume,
                destroyed: false,
            }),
        })
    }

    /// Insert `parcel` in density order. Returns `false`, leaving the ledger
    /// unchanged, if it would overflow the volume bound.
    #[must_use = "a rejected parcel was not stored"]
    pub fn add(&self, parcel: Parcel) -> bool {
        self.state.lock().add(parcel)
    }

    /// Consume up to `mass`, lightest parcels first. Returns the mass removed.
    ///
    /// Ledgers only support best-effort draws; `exact_amount_only` reports
    /// [`ResourceError::ExactRemovalUnsupported`].
    pub fn remove_quantity(
        &self,
        mass: Fixed64,
        exact_amount_only: bool,
    ) -> Result<Fixed64, ResourceError> {
        if exact_amount_only {
            return Err(ResourceError::ExactRemovalUnsupported { provider: "ledger" });
        }
        Ok(self.state.lock().remove_mass(mass))
    }

    pub fn used_volume(&self) -> Fixed64 {
        self.state.lock().used_volume()
    }

    /// Remaining volume, or `0` once destroyed.
    pub fn free_volume(&self) -> Fixed64 {
        self.state.lock().free_volume()
    }

    pub fn max_volume(&self) -> Fixed64 {
        self.state.lock().max_volume
    }

    pub fn current_mass_equivalent(&self) -> Fixed64 {
        self.state.lock().mass()
    }

    pub fn parcel_count(&self) -> usize {
        self.state.lock().parcels.len()
    }

    /// Copy of the parcels, lightest first.
    pub fn parcels(&self) -> Vec<Parcel> {
        self.state.lock().parcels.clone()
    }

    /// Fraction of volume in use, for display.
    pub fn fill_ratio(&self) -> Fixed64 {
        let state = self.state.lock();
        state.used_volume() / state.max_volume
    }

    /// Terminal transition: discard all matter and refuse further parcels.
    pub fn destroy(&self) {
        let mut state = self.state.lock();
        if !state.destroyed {
            tracing::debug!(parcels = state.parcels.len(), "ledger destroyed");
        }
        state.parcels.clear();
        state.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }
}

// ---------------------------------------------------------------------------
// Provider adapter
// ---------------------------------------------------------------------------

/// Exposes a [`MatterLedger`] as a [`ResourceProvider`] measured in mass.
///
/// Current is the ledger's mass equivalent. Mass added through the adapter
/// is stored as a parcel of `fill_density`, so max is the current mass plus
/// the free volume at that density.
#[derive(Debug, Clone)]
pub struct LedgerProvider {
    ledger: Arc<MatterLedger>,
    fill_density: Fixed64,
}

impl LedgerProvider {
    pub fn new(ledger: Arc<MatterLedger>, fill_density: Fixed64) -> Result<Self, ConfigError> {
        if fill_density <= Fixed64::ZERO {
            return Err(ConfigError::InvalidParcel {
                field: "density",
                value: fill_density,
            });
        }
        Ok(Self {
            ledger,
            fill_density,
        })
    }

    pub fn ledger(&self) -> &Arc<MatterLedger> {
        &self.ledger
    }

    pub fn fill_density(&self) -> Fixed64 {
        self.fill_density
    }
}

struct LedgerGuard<'a> {
    state: parking_lot::MutexGuard<'a, LedgerState>,
    fill_density: Fixed64,
}

impl ProviderGuard for LedgerGuard<'_> {
    fn current(&self) -> Fixed64 {
        self.state.mass()
    }

    fn max(&self) -> Fixed64 {
        self.state.mass().saturating_add(self.free())
    }

    fn free(&self) -> Fixed64 {
        self.state.free_volume().saturating_mul(self.fill_density)
    }

    fn removable(&self, amount: Fixed64) -> Fixed64 {
        non_negative(amount).min(self.state.mass())
    }

    fn add(&mut self, amount: Fixed64, exact_amount_only: bool) -> Fixed64 {
        let amount = non_negative(amount);
        let free = self.free();
        if exact_amount_only && amount > free {
            return Fixed64::ZERO;
        }
        let accepted = amount.min(free);
        if accepted <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        let Some(volume) = checked_div_64(accepted, self.fill_density) else {
            return Fixed64::ZERO;
        };
        let parcel = Parcel {
            volume,
            density: self.fill_density,
        };
        if self.state.add(parcel) { accepted } else { Fixed64::ZERO }
    }

    fn remove(&mut self, amount: Fixed64, exact_amount_only: bool) -> Result<Fixed64, ResourceError> {
        if exact_amount_only {
            return Err(ResourceError::ExactRemovalUnsupported { provider: "ledger" });
        }
        Ok(self.state.remove_mass(amount))
    }
}

impl ResourceProvider for LedgerProvider {
    fn provider_id(&self) -> ProviderId {
        self.ledger.id
    }

    fn lock_provider(&self) -> Box<dyn ProviderGuard + '_> {
        Box::new(LedgerGuard {
            state: self.ledger.state.lock(),
            fill_density: self.fill_density,
        })
    }
}
