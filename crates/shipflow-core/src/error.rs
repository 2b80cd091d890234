//! Error taxonomy for the resource core.
//!
//! Capacity violations are prevented by clamping and never surface here.
//! Partial fills are returned as data. What remains is invalid
//! configuration (rejected at construction) and programmer misuse.

use crate::fixed::Fixed64;

/// Invalid construction parameters. Raised once, at part-creation time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A capacity (container max or ledger max volume) was zero or negative.
    #[error("capacity must be positive, got {0}")]
    NonPositiveCapacity(Fixed64),
    /// A rate (conversion ratio or draw per second) was zero or negative.
    #[error("{name} must be positive, got {value}")]
    NonPositiveRate { name: &'static str, value: Fixed64 },
    /// A discrete container was given a zero or negative removal multiple.
    #[error("removal multiple must be positive, got {0}")]
    NonPositiveMultiple(Fixed64),
    /// A matter parcel had a zero or negative volume or density.
    #[error("parcel {field} must be positive, got {value}")]
    InvalidParcel { field: &'static str, value: Fixed64 },
    /// A derived quantity would leave the fixed-point range.
    #[error("{name} is out of range (got {value})")]
    OutOfRange { name: &'static str, value: Fixed64 },
    /// The scheduler tick length was zero or negative.
    #[error("tick length must be positive, got {0}")]
    NonPositiveTick(Fixed64),
}

/// Misuse of a resource provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// Exact-amount removal was requested from a provider that only
    /// supports best-effort draws.
    #[error("exact-amount removal is not supported by {provider}")]
    ExactRemovalUnsupported { provider: &'static str },
}

/// Contract violations when driving a converter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConverterError {
    #[error("elapsed time must not be negative, got {0}")]
    NegativeElapsed(Fixed64),
    #[error("percent must lie in [0, 1], got {0}")]
    PercentOutOfRange(Fixed64),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// A failure raised inside a part's update. The scheduler isolates it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PartError {
    #[error(transparent)]
    Converter(#[from] ConverterError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_error_converts_through_converter_error() {
        let err: PartError = ConverterError::from(ResourceError::ExactRemovalUnsupported {
            provider: "container",
        })
        .into();
        assert_eq!(
            err.to_string(),
            "exact-amount removal is not supported by container"
        );
    }

    #[test]
    fn config_error_messages_name_the_field() {
        let err = ConfigError::NonPositiveRate {
            name: "conversion_rate",
            value: Fixed64::ZERO,
        };
        assert!(err.to_string().starts_with("conversion_rate must be positive"));
    }
}
