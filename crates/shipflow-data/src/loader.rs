//! Loading pipeline: reads a rate file, detects its format, deserializes it,
//! and validates it into a [`RateTable`].

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::schema::RateFileData;
use crate::table::RateTable;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A duplicate name was found.
    #[error("duplicate {kind} '{name}' in {file}")]
    DuplicateName {
        file: PathBuf,
        kind: &'static str,
        name: String,
    },

    /// A constant that must be positive was zero, negative, or not finite.
    #[error("{kind} '{name}' in {file}: {field} must be positive, got {value}")]
    NonPositive {
        file: PathBuf,
        kind: &'static str,
        name: String,
        field: &'static str,
        value: f64,
    },

    /// A constant that cannot be represented in fixed point: too large, or
    /// so small it rounds to zero.
    #[error("{kind} '{name}' in {file}: {field} is out of range, got {value}")]
    OutOfRange {
        file: PathBuf,
        kind: &'static str,
        name: String,
        field: &'static str,
        value: f64,
    },

    /// A lookup named an entry the table does not have.
    #[error("unknown {kind} '{name}'")]
    UnknownEntry { kind: &'static str, name: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` in the given format. `origin` only labels errors.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, DataLoadError> {
    let parse_err = |detail: String| DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Entry points
// ===========================================================================

/// Load and validate a rate file from disk.
pub fn load_rate_table(path: &Path) -> Result<RateTable, DataLoadError> {
    let data: RateFileData = deserialize_file(path)?;
    let table = RateTable::resolve(data, path)?;
    tracing::debug!(
        file = %path.display(),
        items = table.item_count(),
        storage = table.storage_count(),
        "loaded rate table"
    );
    Ok(table)
}

/// Parse and validate rate data held in memory.
pub fn parse_rate_table(content: &str, format: Format) -> Result<RateTable, DataLoadError> {
    let origin = Path::new("<inline>");
    let data: RateFileData = deserialize_str(content, format, origin)?;
    RateTable::resolve(data, origin)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "shipflow_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const RON_RATES: &str = r#"(
        items: [
            (name: "deuterium", conversion_rate: 4.0, draw_rate: 0.5),
            (name: "ore", conversion_rate: 0.25, draw_rate: 2.0),
        ],
        storage: [
            (name: "energy_tank", capacity_per_volume: 100.0),
            (name: "magazine", capacity_per_volume: 10.0, removal_multiple: Some(1.0)),
            (name: "matter_bay", capacity_per_volume: 1.0, fill_density: Some(2.5)),
        ],
        scheduler: Some((tick_seconds: 0.25, strategy: delta)),
    )"#;

    const TOML_RATES: &str = r#"
        [[items]]
        name = "deuterium"
        conversion_rate = 4.0
        draw_rate = 0.5

        [[storage]]
        name = "energy_tank"
        capacity_per_volume = 100.0

        [scheduler]
        tick_seconds = 0.5
    "#;

    const JSON_RATES: &str = r#"{
        "items": [{ "name": "deuterium", "conversion_rate": 4.0, "draw_rate": 0.5 }],
        "storage": [{ "name": "fuel_tank", "capacity_per_volume": 20.0 }]
    }"#;

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("rates.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("rates.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("rates.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("rates.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn parse_ron_rates() {
        let table = parse_rate_table(RON_RATES, Format::Ron).unwrap();
        assert_eq!(table.item_count(), 2);
        assert_eq!(table.storage_count(), 3);
        assert!(table.storage("magazine").unwrap().removal_multiple.is_some());
    }

    #[test]
    fn parse_toml_rates() {
        let table = parse_rate_table(TOML_RATES, Format::Toml).unwrap();
        assert_eq!(table.item_count(), 1);
        assert!(table.storage("energy_tank").is_ok());
    }

    #[test]
    fn parse_json_rates() {
        let table = parse_rate_table(JSON_RATES, Format::Json).unwrap();
        assert!(table.item("deuterium").is_ok());
        assert!(table.storage("fuel_tank").is_ok());
    }

    #[test]
    fn oversized_capacity_is_an_error_not_a_panic() {
        let err = parse_rate_table(
            r#"(storage: [(name: "t", capacity_per_volume: 1e10)])"#,
            Format::Ron,
        )
        .unwrap_err();
        assert!(matches!(err, DataLoadError::OutOfRange { .. }));
    }

    #[test]
    fn malformed_content_reports_parse_error() {
        let err = parse_rate_table("(items: [", Format::Ron).unwrap_err();
        assert!(matches!(err, DataLoadError::Parse { .. }));
    }

    #[test]
    fn load_from_disk() {
        let dir = make_test_dir("load");
        let path = dir.join("rates.ron");
        fs::write(&path, RON_RATES).unwrap();

        let table = load_rate_table(&path).unwrap();
        assert_eq!(table.item_count(), 2);

        cleanup(&dir);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = make_test_dir("missing");
        let err = load_rate_table(&dir.join("absent.toml")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io(_)));
        cleanup(&dir);
    }
}
