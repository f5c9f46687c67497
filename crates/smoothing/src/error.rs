//! Construction-time configuration validation.
//!
//! Runtime degradation (insufficient history, non-monotonic timestamps) is
//! never surfaced as an `Err` — it is encoded in the result types themselves
//! (`is_reliable`, `confidence`, ...). Only malformed configuration fails the
//! constructor, per the core's error-handling design.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("responsiveness alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f32),
    #[error("window size must be at least 1, got {0}")]
    InvalidWindowSize(usize),
    #[error("outlier threshold must be positive, got {0}")]
    InvalidOutlierThreshold(f32),
    #[error("{name} threshold must be positive, got {value}")]
    InvalidThreshold { name: &'static str, value: f32 },
    #[error("min correction factor ({min}) must be <= max correction factor ({max})")]
    InvalidCorrectionBounds { min: f32, max: f32 },
    #[error("confidence threshold must be in [0, 1], got {0}")]
    InvalidConfidenceThreshold(f32),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
