//! Configuration errors
//!
//! The simulation itself never fails; everything that can go wrong is caught
//! when a layout is loaded or validated.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons a layout can be rejected
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: String, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: String, value: f32 },

    #[error("{field} must be greater than zero, got {value}")]
    NonPositive { field: String, value: f32 },

    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: String,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{field} must be -1 or 1, got {value}")]
    BadDirection { field: String, value: f32 },

    #[error("wheel must have at least one slot")]
    EmptyWheel,

    #[error("unknown shape type {0:?}")]
    UnknownShape(String),

    #[error("failed to read layout {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reject NaN and infinities
pub(crate) fn finite(field: &str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite {
            field: field.to_string(),
            value,
        })
    }
}

/// Finite and `>= 0`
pub(crate) fn non_negative(field: &str, value: f32) -> Result<f32, ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative {
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}

/// Finite and `> 0`
pub(crate) fn positive(field: &str, value: f32) -> Result<f32, ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NonPositive {
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}

/// Finite and inside `[min, max]`
pub(crate) fn in_range(field: &str, value: f32, min: f32, max: f32) -> Result<f32, ConfigError> {
    finite(field, value)?;
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(value)
}

/// Exactly -1 or 1
pub(crate) fn direction(field: &str, value: f32) -> Result<f32, ConfigError> {
    if value == 1.0 || value == -1.0 {
        Ok(value)
    } else {
        Err(ConfigError::BadDirection {
            field: field.to_string(),
            value,
        })
    }
}
