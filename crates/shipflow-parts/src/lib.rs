//! Concrete ship parts built on the resource core, and the [`Ship`] that
//! sizes them from a rate table and drives them on a tick scheduler.
//!
//! Each part owns what it stores and only references what it draws from or
//! fills, so [`Part::destroy`](shipflow_core::part::Part::destroy) empties a
//! tank or bay but leaves a destroyed reactor's fuel tank untouched.

pub mod ammo;
pub mod converter_part;
pub mod matter_bay;
pub mod sensor;
pub mod ship;
pub mod tank;

pub use ammo::AmmoFeed;
pub use converter_part::ConverterPart;
pub use matter_bay::MatterBay;
pub use sensor::Sensor;
pub use ship::{Ship, ShipError};
pub use tank::{Tank, TankKind};
