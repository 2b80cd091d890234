//! Cargo bay for bulk matter, backed by a density-ordered ledger.

use std::sync::Arc;

use shipflow_core::error::ConfigError;
use shipflow_core::fixed::Fixed64;
use shipflow_core::ledger::{LedgerProvider, MatterLedger, Parcel};
use shipflow_core::part::Part;
use shipflow_core::provider::ResourceProvider;

#[derive(Debug)]
pub struct MatterBay {
    name: String,
    ledger: Arc<MatterLedger>,
    provider: Arc<LedgerProvider>,
}

impl MatterBay {
    /// Build a bay of `max_volume`. Mass pushed in through the provider is
    /// stored at `fill_density`.
    pub fn new(
        name: impl Into<String>,
        max_volume: Fixed64,
        fill_density: Fixed64,
    ) -> Result<Self, ConfigError> {
        let ledger = Arc::new(MatterLedger::new(max_volume)?);
        let provider = Arc::new(LedgerProvider::new(Arc::clone(&ledger), fill_density)?);
        Ok(Self {
            name: name.into(),
            ledger,
            provider,
        })
    }

    /// Stow a parcel. Returns `false` if it does not fit.
    #[must_use = "a rejected parcel was not stowed"]
    pub fn load(&self, parcel: Parcel) -> bool {
        self.ledger.add(parcel)
    }

    pub fn ledger(&self) -> &Arc<MatterLedger> {
        &self.ledger
    }

    /// Mass-denominated handle for converters.
    pub fn provider(&self) -> Arc<dyn ResourceProvider> {
        self.provider.clone()
    }

    pub fn mass(&self) -> Fixed64 {
        self.ledger.current_mass_equivalent()
    }

    /// Display value: fraction of the bay's volume in use.
    pub fn fill_ratio(&self) -> Fixed64 {
        self.ledger.fill_ratio()
    }
}

impl Part for MatterBay {
    fn name(&self) -> &str {
        &self.name
    }

    fn destroy(&self) {
        self.ledger.destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.ledger.is_destroyed()
    }
}
