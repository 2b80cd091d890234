//! Energy, fuel, and plasma tanks: parts that own one container and do no
//! per-tick work of their own.

use std::sync::Arc;

use shipflow_core::container::{Container, ContainerSnapshot};
use shipflow_core::fixed::Fixed64;
use shipflow_core::part::Part;
use shipflow_core::provider::ResourceProvider;

/// What a tank holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TankKind {
    Energy,
    Fuel,
    Plasma,
}

#[derive(Debug)]
pub struct Tank {
    name: String,
    kind: TankKind,
    container: Arc<Container>,
}

impl Tank {
    pub fn new(name: impl Into<String>, kind: TankKind, container: Container) -> Self {
        Self {
            name: name.into(),
            kind,
            container: Arc::new(container),
        }
    }

    pub fn kind(&self) -> TankKind {
        self.kind
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Handle for converters and other parts to draw from or fill this tank.
    pub fn provider(&self) -> Arc<dyn ResourceProvider> {
        self.container.clone()
    }

    /// Display value: current contents (zero once destroyed).
    pub fn level(&self) -> Fixed64 {
        self.container.usable_current()
    }

    pub fn snapshot(&self) -> ContainerSnapshot {
        self.container.snapshot()
    }
}

impl Part for Tank {
    fn name(&self) -> &str {
        &self.name
    }

    fn destroy(&self) {
        self.container.destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.container.is_destroyed()
    }
}
