//! Built-in city dataset with fuzzy name lookup.

use serde::Serialize;

use super::types::{GeoCoordinate, LocationSource, ResolvedLocation};
use crate::error::{Error, Result};

struct BuiltinCity {
    names: &'static [&'static str], // canonical + aliases
    lat: f64,
    lon: f64,
    tz: &'static str,
    country_code: &'static str,
}

const BUILTIN_CITIES: &[BuiltinCity] = &[
    BuiltinCity {
        names: &["makkah", "mecca", "mekka", "مكة"],
        lat: 21.4225, lon: 39.8262, tz: "Asia/Riyadh",
        country_code: "SA",
    },
    BuiltinCity {
        names: &["medina", "madinah", "al-madinah", "المدينة"],
        lat: 24.4686, lon: 39.6142, tz: "Asia/Riyadh",
        country_code: "SA",
    },
    BuiltinCity {
        names: &["riyadh", "الرياض"],
        lat: 24.7136, lon: 46.6753, tz: "Asia/Riyadh",
        country_code: "SA",
    },
    BuiltinCity {
        names: &["jeddah", "jiddah", "جدة"],
        lat: 21.5433, lon: 39.1728, tz: "Asia/Riyadh",
        country_code: "SA",
    },
    BuiltinCity {
        names: &["dubai", "دبي"],
        lat: 25.2048, lon: 55.2708, tz: "Asia/Dubai",
        country_code: "AE",
    },
    BuiltinCity {
        names: &["kuwait city", "kuwait", "الكويت"],
        lat: 29.3759, lon: 47.9774, tz: "Asia/Kuwait",
        country_code: "KW",
    },
    BuiltinCity {
        names: &["doha", "الدوحة"],
        lat: 25.2854, lon: 51.5310, tz: "Asia/Qatar",
        country_code: "QA",
    },
    BuiltinCity {
        names: &["cairo", "al-qahirah", "القاهرة"],
        lat: 30.0444, lon: 31.2357, tz: "Africa/Cairo",
        country_code: "EG",
    },
    BuiltinCity {
        names: &["istanbul"],
        lat: 41.0082, lon: 28.9784, tz: "Europe/Istanbul",
        country_code: "TR",
    },
    BuiltinCity {
        names: &["tehran"],
        lat: 35.6892, lon: 51.3890, tz: "Asia/Tehran",
        country_code: "IR",
    },
    BuiltinCity {
        names: &["baghdad", "بغداد"],
        lat: 33.3152, lon: 44.3661, tz: "Asia/Baghdad",
        country_code: "IQ",
    },
    BuiltinCity {
        names: &["jerusalem", "al-quds", "القدس"],
        lat: 31.7683, lon: 35.2137, tz: "Asia/Jerusalem",
        country_code: "IL",
    },
    BuiltinCity {
        names: &["karachi"],
        lat: 24.8607, lon: 67.0011, tz: "Asia/Karachi",
        country_code: "PK",
    },
    BuiltinCity {
        names: &["dhaka", "dacca"],
        lat: 23.8103, lon: 90.4125, tz: "Asia/Dhaka",
        country_code: "BD",
    },
    BuiltinCity {
        names: &["mumbai", "bombay"],
        lat: 19.0760, lon: 72.8777, tz: "Asia/Kolkata",
        country_code: "IN",
    },
    BuiltinCity {
        names: &["delhi", "new delhi"],
        lat: 28.6139, lon: 77.2090, tz: "Asia/Kolkata",
        country_code: "IN",
    },
    BuiltinCity {
        names: &["jakarta"],
        lat: -6.2088, lon: 106.8456, tz: "Asia/Jakarta",
        country_code: "ID",
    },
    BuiltinCity {
        names: &["kuala lumpur", "kl"],
        lat: 3.1390, lon: 101.6869, tz: "Asia/Kuala_Lumpur",
        country_code: "MY",
    },
    BuiltinCity {
        names: &["singapore"],
        lat: 1.3521, lon: 103.8198, tz: "Asia/Singapore",
        country_code: "SG",
    },
    BuiltinCity {
        names: &["casablanca", "dar el beida"],
        lat: 33.5731, lon: -7.5898, tz: "Africa/Casablanca",
        country_code: "MA",
    },
    BuiltinCity {
        names: &["lagos"],
        lat: 6.5244, lon: 3.3792, tz: "Africa/Lagos",
        country_code: "NG",
    },
    BuiltinCity {
        names: &["nairobi"],
        lat: -1.2921, lon: 36.8219, tz: "Africa/Nairobi",
        country_code: "KE",
    },
    BuiltinCity {
        names: &["london"],
        lat: 51.5074, lon: -0.1278, tz: "Europe/London",
        country_code: "GB",
    },
    BuiltinCity {
        names: &["paris"],
        lat: 48.8566, lon: 2.3522, tz: "Europe/Paris",
        country_code: "FR",
    },
    BuiltinCity {
        names: &["berlin"],
        lat: 52.5200, lon: 13.4050, tz: "Europe/Berlin",
        country_code: "DE",
    },
    BuiltinCity {
        names: &["stockholm", "stokholm"],
        lat: 59.3293, lon: 18.0686, tz: "Europe/Stockholm",
        country_code: "SE",
    },
    BuiltinCity {
        names: &["oslo"],
        lat: 59.9139, lon: 10.7522, tz: "Europe/Oslo",
        country_code: "NO",
    },
    BuiltinCity {
        names: &["tromso", "tromsø", "tromsoe"],
        lat: 69.6492, lon: 18.9553, tz: "Europe/Oslo",
        country_code: "NO",
    },
    BuiltinCity {
        names: &["svalbard", "longyearbyen"],
        lat: 78.2232, lon: 15.6267, tz: "Arctic/Longyearbyen",
        country_code: "NO",
    },
    BuiltinCity {
        names: &["moscow", "moskva"],
        lat: 55.7558, lon: 37.6173, tz: "Europe/Moscow",
        country_code: "RU",
    },
    BuiltinCity {
        names: &["new york", "newyork", "nyc"],
        lat: 40.7128, lon: -74.0060, tz: "America/New_York",
        country_code: "US",
    },
    BuiltinCity {
        names: &["los angeles", "la"],
        lat: 34.0522, lon: -118.2437, tz: "America/Los_Angeles",
        country_code: "US",
    },
    BuiltinCity {
        names: &["toronto"],
        lat: 43.6532, lon: -79.3832, tz: "America/Toronto",
        country_code: "CA",
    },
    BuiltinCity {
        names: &["tokyo"],
        lat: 35.6762, lon: 139.6503, tz: "Asia/Tokyo",
        country_code: "JP",
    },
    BuiltinCity {
        names: &["sydney"],
        lat: -33.8688, lon: 151.2093, tz: "Australia/Sydney",
        country_code: "AU",
    },
];

/// Compute edit distance between two strings (Levenshtein).
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// Look a city up by name or alias: exact, then substring, then edit distance ≤ 2.
pub fn lookup(query: &str) -> Result<ResolvedLocation> {
    lookup_with_country(query, None)
}

/// Same as [`lookup`], restricted to one ISO country code.
pub fn lookup_with_country(query: &str, country: Option<&str>) -> Result<ResolvedLocation> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Err(Error::LocationNotFound(query.to_string()));
    }
    let country_filter = country.map(|c| c.to_uppercase());

    let candidates: Vec<&BuiltinCity> = match country_filter {
        Some(ref cc) => BUILTIN_CITIES.iter().filter(|c| c.country_code == cc.as_str()).collect(),
        None => BUILTIN_CITIES.iter().collect(),
    };

    if let Some(city) = candidates.iter().find(|c| c.names.iter().any(|n| *n == q)) {
        return Ok(to_resolved(city));
    }

    // Short aliases like "la" would swallow any query containing them
    let substring_hit = candidates.iter().find(|c| {
        c.names
            .iter()
            .any(|n| (q.chars().count() >= 3 && n.contains(q.as_str())) || (n.chars().count() >= 4 && q.contains(n)))
    });
    if let Some(city) = substring_hit {
        return Ok(to_resolved(city));
    }

    let mut best: Option<(&BuiltinCity, usize)> = None;
    for city in &candidates {
        for name in city.names {
            let dist = edit_distance(&q, name);
            if dist <= 2 && best.map_or(true, |(_, d)| dist < d) {
                best = Some((city, dist));
            }
        }
    }

    best.map(|(city, _)| to_resolved(city))
        .ok_or_else(|| Error::LocationNotFound(query.to_string()))
}

fn to_resolved(city: &BuiltinCity) -> ResolvedLocation {
    ResolvedLocation {
        name: title_case(city.names[0]),
        coord: GeoCoordinate { latitude: city.lat, longitude: city.lon },
        tz: city.tz.to_string(),
        source: LocationSource::Builtin,
        country_code: Some(city.country_code.to_string()),
    }
}

fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// A city entry for listing.
#[derive(Debug, Clone, Serialize)]
pub struct CityInfo {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub tz: String,
}

/// Return the full built-in city list.
pub fn city_list() -> Vec<CityInfo> {
    BUILTIN_CITIES
        .iter()
        .map(|c| CityInfo {
            name: title_case(c.names[0]),
            country: c.country_code.to_string(),
            lat: c.lat,
            lon: c.lon,
            tz: c.tz.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        let loc = lookup("Makkah").unwrap();
        assert_eq!(loc.name, "Makkah");
        assert!((loc.coord.latitude - 21.4225).abs() < 0.01);
        assert_eq!(loc.tz, "Asia/Riyadh");
        assert_eq!(loc.source, LocationSource::Builtin);
        assert_eq!(loc.country_code, Some("SA".to_string()));
    }

    #[test]
    fn test_case_insensitive_and_alias() {
        assert_eq!(lookup("STOCKHOLM").unwrap().name, "Stockholm");
        assert_eq!(lookup("mecca").unwrap().name, "Makkah");
        assert_eq!(lookup("NYC").unwrap().name, "New York");
    }

    #[test]
    fn test_arabic_alias() {
        let loc = lookup("الرياض").unwrap();
        assert_eq!(loc.name, "Riyadh");
        assert_eq!(lookup("القاهرة").unwrap().tz, "Africa/Cairo");
    }

    #[test]
    fn test_fuzzy() {
        assert_eq!(lookup("stokholmm").unwrap().name, "Stockholm");
        assert_eq!(lookup("riyadth").unwrap().name, "Riyadh");
    }

    #[test]
    fn test_short_alias_does_not_swallow_queries() {
        // "la" must not match "lagos" queries through the substring pass
        assert_eq!(lookup("lagos").unwrap().name, "Lagos");
        assert_eq!(lookup("kuala lumpur").unwrap().tz, "Asia/Kuala_Lumpur");
    }

    #[test]
    fn test_not_found() {
        assert!(matches!(lookup("xyznonexistent"), Err(Error::LocationNotFound(_))));
        assert!(lookup("   ").is_err());
    }

    #[test]
    fn test_country_filter() {
        let loc = lookup_with_country("medina", Some("sa")).unwrap();
        assert_eq!(loc.tz, "Asia/Riyadh");
        assert!(lookup_with_country("medina", Some("US")).is_err());
    }

    #[test]
    fn test_every_city_has_valid_data() {
        for city in city_list() {
            assert!(GeoCoordinate::new(city.lat, city.lon).is_ok(), "{}", city.name);
            assert!(city.tz.parse::<chrono_tz::Tz>().is_ok(), "{}", city.tz);
        }
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("stockholm", "stokholm"), 1);
        assert_eq!(edit_distance("abc", "abc"), 0);
    }
}
