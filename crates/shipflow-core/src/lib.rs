//! Shipflow Core -- the resource-economy engine for real-time ship simulation.
//!
//! Every ship part that stores or moves a physical quantity (energy, fuel,
//! plasma, ammunition, raw matter) does so through three primitives:
//!
//! - [`container::Container`] -- bounded scalar store with exact-or-partial
//!   fill policy and optional discrete removal.
//! - [`ledger::MatterLedger`] -- bounded, density-ordered cargo consumed by
//!   mass, lightest parcels first.
//! - [`converter::Converter`] -- rate-limited, one-directional transfer
//!   between two [`provider::ResourceProvider`]s with a conversion ratio.
//!
//! Parts implement [`part::Part`] and are driven by the
//! [`scheduler::TickScheduler`], which separates work that may run on a
//! worker thread from work that must stay on the main thread.
//!
//! # Data flow
//!
//! ```text
//! TickScheduler -> Part::update_any_thread(dt) -> Converter::transfer(dt, percent)
//!     -> source.remove_quantity -> destination.add_quantity
//! ```
//!
//! Parts never touch each other's state; every cross-part flow goes through
//! a provider, whose own lock keeps `0 <= current <= max` under concurrent
//! access.
//!
//! All quantities are [`fixed::Fixed64`] so that additions from different
//! threads commute exactly.

pub mod container;
pub mod converter;
pub mod error;
pub mod fixed;
pub mod ledger;
pub mod part;
pub mod provider;
pub mod scheduler;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
