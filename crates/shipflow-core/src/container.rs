//! Bounded scalar store for a homogeneous resource (energy, fuel, plasma,
//! rounds of ammunition).
//!
//! A [`Container`] owns its state behind a single lock and is shared between
//! parts as `Arc<Container>`. The invariant `0 <= current <= max` holds after
//! every call: adds clamp to free space, removals clamp to what is stored.
//!
//! # Removal convention
//!
//! `remove_quantity` returns the amount actually removed. Callers that need
//! to know whether a draw was fully met use [`Container::draw`], which
//! reports requested and removed amounts side by side.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ResourceError};
use crate::fixed::{Fixed64, checked_div_64, non_negative};
use crate::provider::{self, Draw, ProviderGuard, ProviderId, ResourceProvider};

// ---------------------------------------------------------------------------
// Locked state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ContainerState {
    current: Fixed64,
    max: Fixed64,
    /// `Some(m)` restricts removals to whole multiples of `m`.
    removal_multiple: Option<Fixed64>,
    destroyed: bool,
}

impl ContainerState {
    fn usable_current(&self) -> Fixed64 {
        if self.destroyed { Fixed64::ZERO } else { self.current }
    }

    fn usable_max(&self) -> Fixed64 {
        if self.destroyed { Fixed64::ZERO } else { self.max }
    }

    fn free(&self) -> Fixed64 {
        if self.destroyed {
            Fixed64::ZERO
        } else {
            non_negative(self.max - self.current)
        }
    }

    fn removable(&self, amount: Fixed64) -> Fixed64 {
        let wanted = non_negative(amount).min(self.usable_current());
        match self.removal_multiple {
            // In range: `discrete` guarantees `max / multiple` fits.
            Some(multiple) => match checked_div_64(wanted, multiple) {
                Some(steps) => steps.floor() * multiple,
                None => Fixed64::ZERO,
            },
            None => wanted,
        }
    }

    fn add(&mut self, amount: Fixed64, exact_amount_only: bool) -> Fixed64 {
        let amount = non_negative(amount);
        let free = self.free();
        if exact_amount_only && amount > free {
            return Fixed64::ZERO;
        }
        let accepted = amount.min(free);
        self.current += accepted;
        accepted
    }

    fn remove(&mut self, amount: Fixed64, exact_amount_only: bool) -> Result<Fixed64, ResourceError> {
        if exact_amount_only {
            return Err(ResourceError::ExactRemovalUnsupported {
                provider: "container",
            });
        }
        let removed = self.removable(amount);
        self.current -= removed;
        Ok(removed)
    }
}

struct ContainerGuard<'a> {
    state: parking_lot::MutexGuard<'a, ContainerState>,
}

impl ProviderGuard for ContainerGuard<'_> {
    fn current(&self) -> Fixed64 {
        self.state.usable_current()
    }

    fn max(&self) -> Fixed64 {
        self.state.usable_max()
    }

    fn free(&self) -> Fixed64 {
        self.state.free()
    }

    fn removable(&self, amount: Fixed64) -> Fixed64 {
        self.state.removable(amount)
    }

    fn add(&mut self, amount: Fixed64, exact_amount_only: bool) -> Fixed64 {
        self.state.add(amount, exact_amount_only)
    }

    fn remove(&mut self, amount: Fixed64, exact_amount_only: bool) -> Result<Fixed64, ResourceError> {
        self.state.remove(amount, exact_amount_only)
    }
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// A bounded, lock-protected quantity.
#[derive(Debug)]
pub struct Container {
    id: ProviderId,
    state: Mutex<ContainerState>,
}

impl Container {
    /// Create an empty continuous container holding at most `max`.
    pub fn new(max: Fixed64) -> Result<Self, ConfigError> {
        Self::build(max, None)
    }

    /// Create an empty container whose removals are whole multiples of
    /// `removal_multiple` (ammunition, discrete cells).
    pub fn discrete(max: Fixed64, removal_multiple: Fixed64) -> Result<Self, ConfigError> {
        if removal_multiple <= Fixed64::ZERO {
            tracing::debug!(%removal_multiple, "rejected container removal multiple");
            return Err(ConfigError::NonPositiveMultiple(removal_multiple));
        }
        if checked_div_64(max, removal_multiple).is_none() {
            tracing::debug!(%max, %removal_multiple, "rejected container removal multiple");
            return Err(ConfigError::OutOfRange {
                name: "capacity / removal multiple",
                value: removal_multiple,
            });
        }
        Self::build(max, Some(removal_multiple))
    }

    fn build(max: Fixed64, removal_multiple: Option<Fixed64>) -> Result<Self, ConfigError> {
        if max <= Fixed64::ZERO {
            tracing::debug!(%max, "rejected container capacity");
            return Err(ConfigError::NonPositiveCapacity(max));
        }
        Ok(Self {
            id: ProviderId::next(),
            state: Mutex::new(ContainerState {
                current: Fixed64::ZERO,
                max,
                removal_multiple,
                destroyed: false,
            }),
        })
    }

    /// Pre-fill a freshly built container. The fill is clamped to `max`.
    pub fn with_contents(self, initial: Fixed64) -> Self {
        let _ = self.add_quantity(initial, false);
        self
    }

    /// Add up to `amount`. Returns the amount accepted.
    ///
    /// With `exact_amount_only`, an amount larger than the free space is
    /// rejected outright and `0` is returned.
    #[must_use = "returns the amount accepted, which may be less than requested"]
    pub fn add_quantity(&self, amount: Fixed64, exact_amount_only: bool) -> Fixed64 {
        self.state.lock().add(amount, exact_amount_only)
    }

    /// Move up to `amount` out of `pull_from` into this container as one
    /// critical section. Returns the amount moved.
    #[must_use = "returns the amount moved, which may be less than requested"]
    pub fn add_quantity_from(
        &self,
        pull_from: &dyn ResourceProvider,
        amount: Fixed64,
        exact_amount_only: bool,
    ) -> Fixed64 {
        provider::move_quantity(self, pull_from, amount, exact_amount_only)
    }

    /// Remove up to `amount`, rounded down to the removal multiple when the
    /// container is discrete. Returns the amount actually removed.
    ///
    /// Exact-amount removal is not supported and reports
    /// [`ResourceError::ExactRemovalUnsupported`].
    pub fn remove_quantity(
        &self,
        amount: Fixed64,
        exact_amount_only: bool,
    ) -> Result<Fixed64, ResourceError> {
        self.state.lock().remove(amount, exact_amount_only)
    }

    /// Best-effort removal of `amount` that also reports whether it was met.
    pub fn draw(&self, amount: Fixed64) -> Draw {
        let requested = non_negative(amount);
        let mut state = self.state.lock();
        let removed = state.removable(requested);
        state.current -= removed;
        Draw { requested, removed }
    }

    pub fn quantity_current(&self) -> Fixed64 {
        self.state.lock().usable_current()
    }

    /// Configured capacity. Unlike [`ResourceProvider::quantity_max`], this
    /// keeps reporting the raw capacity after [`destroy`](Self::destroy).
    pub fn quantity_max(&self) -> Fixed64 {
        self.state.lock().max
    }

    /// Free space, or `0` once destroyed. Same as [`usable_free`](Self::usable_free).
    pub fn quantity_max_minus_current(&self) -> Fixed64 {
        self.state.lock().free()
    }

    /// Current contents, or `0` once destroyed.
    pub fn usable_current(&self) -> Fixed64 {
        self.state.lock().usable_current()
    }

    /// Capacity, or `0` once destroyed.
    pub fn usable_max(&self) -> Fixed64 {
        self.state.lock().usable_max()
    }

    /// Free space, or `0` once destroyed.
    pub fn usable_free(&self) -> Fixed64 {
        self.state.lock().free()
    }

    /// Fraction full in `[0, 1]`, for display.
    pub fn fill_ratio(&self) -> Fixed64 {
        let state = self.state.lock();
        if state.destroyed {
            return Fixed64::ZERO;
        }
        state.current / state.max
    }

    pub fn removal_multiple(&self) -> Option<Fixed64> {
        self.state.lock().removal_multiple
    }

    /// Terminal transition: zero the contents and refuse further changes.
    pub fn destroy(&self) {
        let mut state = self.state.lock();
        if !state.destroyed {
            tracing::debug!(provider = self.id.0, discarded = %state.current, "container destroyed");
        }
        state.current = Fixed64::ZERO;
        state.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    /// Read model for display collaborators.
    pub fn snapshot(&self) -> ContainerSnapshot {
        let state = self.state.lock();
        ContainerSnapshot {
            current: state.usable_current(),
            max: state.max,
            removal_multiple: state.removal_multiple,
            destroyed: state.destroyed,
        }
    }
}

impl ResourceProvider for Container {
    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn lock_provider(&self) -> Box<dyn ProviderGuard + '_> {
        Box::new(ContainerGuard {
            state: self.state.lock(),
        })
    }

    fn quantity_current(&self) -> Fixed64 {
        self.usable_current()
    }

    fn quantity_max(&self) -> Fixed64 {
        self.usable_max()
    }

    fn quantity_max_minus_current(&self) -> Fixed64 {
        self.usable_free()
    }
}

/// Point-in-time view of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub current: Fixed64,
    pub max: Fixed64,
    pub removal_multiple: Option<Fixed64>,
    pub destroyed: bool,
}
