//! Location resolver: orchestrates the offline fallback chain.
//!
//! Manual coordinates → built-in city (with "City, Country" hint) → last-known
//! location from settings → Makkah.

use chrono_tz::Tz;

use super::cities;
use super::types::{GeoCoordinate, LocationSource, ResolvedLocation};
use crate::error::{Error, Result};

/// What the caller asked for. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct LocationRequest {
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tz: Option<String>,
}

/// Parse an IANA timezone name.
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::UnknownTimezone(name.to_string()))
}

/// The location used when nothing else is known.
pub fn default_location() -> ResolvedLocation {
    ResolvedLocation {
        name: "Makkah".into(),
        coord: GeoCoordinate { latitude: 21.4225, longitude: 39.8262 },
        tz: "Asia/Riyadh".into(),
        source: LocationSource::Builtin,
        country_code: Some("SA".into()),
    }
}

/// Resolve a request through the fallback chain.
///
/// An explicit `tz` always overrides the one that came with the location.
/// Latitude without longitude (or vice versa) is rejected.
pub fn resolve(request: &LocationRequest, last_known: Option<&ResolvedLocation>) -> Result<ResolvedLocation> {
    let mut loc = match (request.latitude, request.longitude) {
        (Some(lat), Some(lon)) => {
            let coord = GeoCoordinate::new(lat, lon)?;
            let tz = request.tz.as_deref().unwrap_or("UTC");
            ResolvedLocation::manual(coord, tz)
        }
        (Some(lat), None) | (None, Some(lat)) => {
            return Err(Error::InvalidCoordinate { latitude: lat, longitude: f64::NAN });
        }
        (None, None) => match &request.city {
            Some(query) => resolve_city(query)?,
            None => match last_known {
                Some(prev) => ResolvedLocation { source: LocationSource::Settings, ..prev.clone() },
                None => {
                    tracing::debug!("no location given, falling back to Makkah");
                    default_location()
                }
            },
        },
    };

    if let Some(tz) = &request.tz {
        parse_tz(tz)?;
        loc.tz = tz.trim().to_string();
    }
    tracing::debug!(name = %loc.name, tz = %loc.tz, source = %loc.source, "location resolved");
    Ok(loc)
}

/// Resolve a city name against the built-in dataset.
pub fn resolve_city(query: &str) -> Result<ResolvedLocation> {
    let (city_query, country_hint) = parse_query_with_hint(query);
    match cities::lookup_with_country(&city_query, country_hint.as_deref()) {
        Ok(loc) => Ok(loc),
        Err(_) => {
            let simplified = simplify_query(&city_query);
            cities::lookup_with_country(&simplified, country_hint.as_deref())
                .map_err(|_| Error::LocationNotFound(query.to_string()))
        }
    }
}

/// Parse "Medina, Saudi Arabia" → ("Medina", Some("SA"))
/// Parse "Medina" → ("Medina", None)
fn parse_query_with_hint(query: &str) -> (String, Option<String>) {
    let parts: Vec<&str> = query.splitn(2, ',').collect();
    if parts.len() == 2 {
        let city = parts[0].trim().to_string();
        let hint_raw = parts[1].trim();
        if hint_raw.len() == 2 && hint_raw.chars().all(|c| c.is_ascii_alphabetic()) {
            return (city, Some(hint_raw.to_uppercase()));
        }
        if let Some(code) = country_name_to_hint(hint_raw) {
            return (city, Some(code.to_string()));
        }
        return (query.to_string(), None);
    }
    (query.to_string(), None)
}

fn country_name_to_hint(name: &str) -> Option<&'static str> {
    let code = match name.to_lowercase().as_str() {
        "saudi arabia" | "saudi" | "ksa" | "السعودية" => "SA",
        "uae" | "emirates" | "united arab emirates" => "AE",
        "egypt" | "مصر" => "EG",
        "kuwait" => "KW",
        "qatar" => "QA",
        "iraq" => "IQ",
        "iran" => "IR",
        "turkey" | "türkiye" => "TR",
        "pakistan" => "PK",
        "india" => "IN",
        "bangladesh" => "BD",
        "indonesia" => "ID",
        "malaysia" => "MY",
        "singapore" => "SG",
        "morocco" => "MA",
        "nigeria" => "NG",
        "kenya" => "KE",
        "united kingdom" | "uk" | "britain" | "england" => "GB",
        "france" => "FR",
        "germany" => "DE",
        "sweden" | "sverige" => "SE",
        "norway" | "norge" => "NO",
        "russia" => "RU",
        "united states" | "usa" | "us" | "america" => "US",
        "canada" => "CA",
        "japan" => "JP",
        "australia" => "AU",
        _ => return None,
    };
    Some(code)
}

/// Lowercase, strip common diacritics, collapse spaces.
fn simplify_query(q: &str) -> String {
    q.to_lowercase()
        .replace('ø', "o")
        .replace('å', "a")
        .replace('ä', "a")
        .replace('ö', "o")
        .replace('ü', "u")
        .replace('é', "e")
        .replace('è', "e")
        .replace('ç', "c")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
