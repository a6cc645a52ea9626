//! Error taxonomy for the engine.
//!
//! Only genuinely invalid input is an error. A sun that never reaches a
//! twilight angle is not: the calculator substitutes a fallback time and
//! records it in [`crate::prayer::EventMethod`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Latitude outside [-90, 90] or longitude outside [-180, 180].
    #[error("Invalid coordinates ({latitude}, {longitude}). Lat: -90..90, Lon: -180..180")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("Unknown timezone '{0}'. Use IANA format (e.g. Asia/Riyadh)")]
    UnknownTimezone(String),

    #[error("Unknown calculation method '{0}'")]
    UnknownMethod(String),

    #[error("Unknown asr school '{0}'. Use 'shafi' or 'hanafi'")]
    UnknownAsrSchool(String),

    #[error("Location not found: '{0}'")]
    LocationNotFound(String),

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings format error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidCoordinate { .. } | Self::InvalidDate { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
