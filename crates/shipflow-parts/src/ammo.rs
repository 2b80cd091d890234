//! Ammunition feeds: a discrete magazine that only ever gives up whole
//! rounds, optionally topped up each tick from a shared ammo store.

use std::sync::Arc;

use shipflow_core::container::Container;
use shipflow_core::error::{ConfigError, PartError};
use shipflow_core::fixed::{Fixed64, Seconds, checked_div_64};
use shipflow_core::part::Part;
use shipflow_core::provider::ResourceProvider;

#[derive(Debug)]
pub struct AmmoFeed {
    name: String,
    magazine: Arc<Container>,
    round_size: Fixed64,
    feed: Option<Arc<dyn ResourceProvider>>,
}

impl AmmoFeed {
    /// A magazine holding `capacity` worth of rounds of `round_size` each.
    pub fn new(
        name: impl Into<String>,
        capacity: Fixed64,
        round_size: Fixed64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.into(),
            magazine: Arc::new(Container::discrete(capacity, round_size)?),
            round_size,
            feed: None,
        })
    }

    /// Reload automatically from `feed` on every update.
    pub fn with_feed(mut self, feed: Arc<dyn ResourceProvider>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn magazine(&self) -> &Arc<Container> {
        &self.magazine
    }

    /// Whole rounds in `amount`, saturating when the count leaves the
    /// fixed-point range.
    fn whole_rounds(&self, amount: Fixed64) -> Fixed64 {
        checked_div_64(amount, self.round_size).map_or(Fixed64::MAX, |n| n.floor())
    }

    /// Whole rounds currently loaded.
    pub fn rounds(&self) -> u32 {
        self.whole_rounds(self.magazine.usable_current())
            .saturating_to_num::<u32>()
    }

    /// Fire up to `rounds`. Returns how many were actually fired.
    pub fn fire(&self, rounds: u32) -> u32 {
        let wanted = self
            .round_size
            .saturating_mul(Fixed64::saturating_from_num(rounds));
        match self.magazine.remove_quantity(wanted, false) {
            Ok(removed) => self.whole_rounds(removed).saturating_to_num::<u32>(),
            Err(_) => 0,
        }
    }

    /// Pull up to `rounds` whole rounds from `store`. Returns rounds loaded.
    ///
    /// The move is all-or-nothing, so a store drained concurrently never
    /// leaves a partial round in the magazine.
    pub fn reload_from(&self, store: &dyn ResourceProvider, rounds: u32) -> u32 {
        let room = self.whole_rounds(self.magazine.usable_free());
        let stocked = self.whole_rounds(store.quantity_current());
        let wanted = room
            .min(stocked)
            .min(Fixed64::saturating_from_num(rounds))
            * self.round_size;
        if wanted <= Fixed64::ZERO {
            return 0;
        }
        let moved = self.magazine.add_quantity_from(store, wanted, true);
        self.whole_rounds(moved).saturating_to_num::<u32>()
    }
}

impl Part for AmmoFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_any_thread(&self, _dt: Seconds) -> Result<(), PartError> {
        let Some(feed) = &self.feed else {
            return Ok(());
        };
        if self.is_destroyed() {
            return Ok(());
        }
        let _ = self.reload_from(feed.as_ref(), u32::MAX);
        Ok(())
    }

    fn destroy(&self) {
        self.magazine.destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.magazine.is_destroyed()
    }
}
