//! External configuration for the resource core: per-item-type rate
//! constants, per-part-kind capacity constants, and scheduler cadence,
//! loaded from RON, TOML, or JSON.

pub mod loader;
pub mod schema;
pub mod table;

pub use loader::{DataLoadError, Format, load_rate_table, parse_rate_table};
pub use table::{ItemRate, RateTable, StorageSpec};
