//! The resource-provider contract shared by containers and ledger adapters.
//!
//! Converters and two-sided moves only ever see `dyn ResourceProvider`.
//! Each provider guards its own state with one lock; [`lock_provider`]
//! exposes that locked state as a [`ProviderGuard`] so that a move between
//! two providers can hold both locks at once. Locks are always taken in
//! ascending [`ProviderId`] order, which makes concurrent moves in opposite
//! directions deadlock-free.
//!
//! [`lock_provider`]: ResourceProvider::lock_provider

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ResourceError;
use crate::fixed::{Fixed64, non_negative};

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a provider. Defines the global lock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderId(pub u64);

impl ProviderId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        Self(NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Locked view of a provider's state.
///
/// Values are the *usable* ones: a destroyed provider reports zero current
/// and zero max through its guard.
pub trait ProviderGuard {
    fn current(&self) -> Fixed64;

    fn max(&self) -> Fixed64;

    fn free(&self) -> Fixed64 {
        non_negative(self.max() - self.current())
    }

    /// How much a best-effort removal of `amount` would actually take,
    /// after clamping and any discreteness rounding. Does not mutate.
    fn removable(&self, amount: Fixed64) -> Fixed64;

    /// Add up to `amount`. Returns the amount accepted.
    fn add(&mut self, amount: Fixed64, exact_amount_only: bool) -> Fixed64;

    /// Remove up to `amount`. Returns the amount removed.
    fn remove(&mut self, amount: Fixed64, exact_amount_only: bool) -> Result<Fixed64, ResourceError>;
}

/// Anything that stores a homogeneous quantity and can be drawn from or
/// filled by a converter.
pub trait ResourceProvider: Send + Sync + fmt::Debug {
    fn provider_id(&self) -> ProviderId;

    /// Acquire this provider's lock.
    fn lock_provider(&self) -> Box<dyn ProviderGuard + '_>;

    fn quantity_current(&self) -> Fixed64 {
        self.lock_provider().current()
    }

    fn quantity_max(&self) -> Fixed64 {
        self.lock_provider().max()
    }

    fn quantity_max_minus_current(&self) -> Fixed64 {
        self.lock_provider().free()
    }

    fn add_quantity(&self, amount: Fixed64, exact_amount_only: bool) -> Fixed64 {
        self.lock_provider().add(amount, exact_amount_only)
    }

    fn remove_quantity(
        &self,
        amount: Fixed64,
        exact_amount_only: bool,
    ) -> Result<Fixed64, ResourceError> {
        self.lock_provider().remove(amount, exact_amount_only)
    }
}

/// Move up to `amount` from `from` into `to` as one critical section.
///
/// The moved amount is `min(amount, removable from source, free in
/// destination)`, rounded to the source's removal multiple if it has one.
/// With `exact_amount_only`, anything short of the full `amount` moves
/// nothing. Moving a provider into itself moves nothing.
pub fn move_quantity(
    to: &dyn ResourceProvider,
    from: &dyn ResourceProvider,
    amount: Fixed64,
    exact_amount_only: bool,
) -> Fixed64 {
    let zero = Fixed64::ZERO;
    let to_id = to.provider_id();
    let from_id = from.provider_id();
    if to_id == from_id {
        return zero;
    }

    let amount = non_negative(amount);
    let (mut to_guard, mut from_guard) = if to_id < from_id {
        let t = to.lock_provider();
        let f = from.lock_provider();
        (t, f)
    } else {
        let f = from.lock_provider();
        let t = to.lock_provider();
        (t, f)
    };

    let capped = amount.min(to_guard.free());
    let movable = from_guard.removable(capped);
    if exact_amount_only && movable < amount {
        return zero;
    }
    if movable <= zero {
        return zero;
    }

    let removed = match from_guard.remove(movable, false) {
        Ok(removed) => removed,
        Err(_) => return zero,
    };
    let accepted = to_guard.add(removed, false);
    if accepted < removed {
        // The destination refused part of it; hand the rest back.
        let _ = from_guard.add(removed - accepted, false);
    }
    accepted
}

/// Outcome of a draw that the caller needs to judge for sufficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub requested: Fixed64,
    pub removed: Fixed64,
}

impl Draw {
    /// True when the full requested amount was removed.
    pub fn is_satisfied(&self) -> bool {
        self.removed >= self.requested
    }

    /// How much of the request could not be met.
    pub fn shortfall(&self) -> Fixed64 {
        non_negative(self.requested - self.removed)
    }
}

/// Best-effort draw of `amount` from any provider, reporting sufficiency.
pub fn draw_from(provider: &dyn ResourceProvider, amount: Fixed64) -> Result<Draw, ResourceError> {
    let requested = non_negative(amount);
    let removed = provider.remove_quantity(requested, false)?;
    Ok(Draw { requested, removed })
}
