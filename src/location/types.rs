//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A validated point on the Earth's surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Build a coordinate, rejecting values outside [-90, 90] × [-180, 180] (and NaN).
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinate { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_coords(self.latitude, self.longitude))
    }
}

/// Format coordinates as "21.4225°N, 39.8262°E".
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lon.abs(), ew)
}

/// How a location was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationSource {
    /// Built-in city dataset.
    Builtin,
    /// Explicit --lat/--lon.
    Manual,
    /// Last-known-good location from the settings file.
    Settings,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => write!(f, "Built-in"),
            Self::Manual => write!(f, "Manual"),
            Self::Settings => write!(f, "Settings"),
        }
    }
}

/// A location with a name, an IANA timezone and its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub name: String,
    pub coord: GeoCoordinate,
    pub tz: String,
    pub source: LocationSource,
    #[serde(default)]
    pub country_code: Option<String>,
}

impl ResolvedLocation {
    pub fn manual(coord: GeoCoordinate, tz: &str) -> Self {
        Self {
            name: format!("{:.4}, {:.4}", coord.latitude, coord.longitude),
            coord,
            tz: tz.to_string(),
            source: LocationSource::Manual,
            country_code: None,
        }
    }

    pub fn display_line(&self) -> String {
        let country_part = match &self.country_code {
            Some(cc) => format!(" ({})", cc),
            None => String::new(),
        };
        format!(
            "\u{1F4CD} {}{}\n  \u{1F552} {} (Local Time)\n  \u{1F4D0} {}",
            self.name, country_part, self.tz, self.coord
        )
    }
}
