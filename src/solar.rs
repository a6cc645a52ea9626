//! Solar position math (NOAA / Meeus low-precision series).
//!
//! Provides declination, equation of time, hour angles for a target
//! altitude and the instantaneous altitude/azimuth of the sun.
//! Accuracy: ~0.01° for dates within ±50 years of J2000.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::f64::consts::PI;

pub(crate) const DEG: f64 = PI / 180.0;
const ATMOSPHERIC_REFRACTION: f64 = 0.833;

/// Refraction-adjusted horizon angle used for sunrise and sunset.
pub const HORIZON_ANGLE: f64 = -ATMOSPHERIC_REFRACTION;

/// Declination and equation of time for one Julian date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarCoordinates {
    /// Degrees north of the celestial equator.
    pub declination: f64,
    /// Apparent minus mean solar time, in minutes.
    pub equation_of_time: f64,
}

/// Solar position at a specific instant.
#[derive(Debug, Clone, Copy)]
pub struct SolarPosition {
    pub altitude: f64,
    pub azimuth: f64,
    pub declination: f64,
    pub equation_of_time: f64,
}

/// Convert a NaiveDateTime (assumed UTC) to Julian Date.
pub fn julian_date(dt: &NaiveDateTime) -> f64 {
    let y = dt.year() as f64;
    let m = dt.month() as f64;
    let d = dt.day() as f64;
    let h = dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0;

    let (y2, m2) = if m <= 2.0 {
        (y - 1.0, m + 12.0)
    } else {
        (y, m)
    };

    let a = (y2 / 100.0_f64).floor();
    let b = 2.0 - a + (a / 4.0_f64).floor();

    (365.25_f64 * (y2 + 4716.0)).floor()
        + (30.6001_f64 * (m2 + 1.0)).floor()
        + d
        + h / 24.0
        + b
        - 1524.5
}

/// Julian Date at 00:00 UTC of a calendar date.
pub fn julian_day(date: NaiveDate) -> f64 {
    julian_date(&date.and_time(chrono::NaiveTime::MIN))
}

fn julian_century(jd: f64) -> f64 {
    (jd - 2451545.0) / 36525.0
}

pub(crate) fn normalize_degrees(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d < 0.0 {
        d += 360.0;
    }
    d
}

fn sun_mean_longitude(t: f64) -> f64 {
    normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032))
}

fn sun_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(357.52911 + t * (35999.05029 - t * 0.0001537))
}

fn earth_eccentricity(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + t * 0.0000001267)
}

fn sun_equation_of_center(t: f64) -> f64 {
    let m = sun_mean_anomaly(t) * DEG;
    m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289
}

fn sun_true_longitude(t: f64) -> f64 {
    sun_mean_longitude(t) + sun_equation_of_center(t)
}

fn sun_apparent_longitude(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    sun_true_longitude(t) - 0.00569 - 0.00478 * (omega * DEG).sin()
}

fn mean_obliquity(t: f64) -> f64 {
    23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0
}

fn obliquity_corrected(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    mean_obliquity(t) + 0.00256 * (omega * DEG).cos()
}

fn solar_declination(t: f64) -> f64 {
    let e = obliquity_corrected(t) * DEG;
    let lambda = sun_apparent_longitude(t) * DEG;
    (e.sin() * lambda.sin()).asin() / DEG
}

fn equation_of_time(t: f64) -> f64 {
    let e = obliquity_corrected(t) * DEG;
    let l0 = sun_mean_longitude(t) * DEG;
    let ecc = earth_eccentricity(t);
    let m = sun_mean_anomaly(t) * DEG;

    let y = (e / 2.0).tan().powi(2);

    let eq = y * (2.0 * l0).sin() - 2.0 * ecc * m.sin()
        + 4.0 * ecc * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * ecc * ecc * (2.0 * m).sin();

    4.0 * eq / DEG
}

/// Declination and equation of time at a Julian date.
pub fn solar_coordinates(jd: f64) -> SolarCoordinates {
    let t = julian_century(jd);
    SolarCoordinates {
        declination: solar_declination(t),
        equation_of_time: equation_of_time(t),
    }
}

/// Solar transit (apparent noon) in UTC hours for the given coordinates.
pub fn transit_hours(coords: &SolarCoordinates, lon: f64) -> f64 {
    12.0 - lon / 15.0 - coords.equation_of_time / 60.0
}

/// Hour angle, in hours, at which the sun sits at `altitude` degrees.
///
/// Returns `None` when the sun never reaches that altitude on this day
/// (polar day/night, or a twilight angle that is never crossed).
pub fn hour_angle(altitude: f64, declination: f64, lat: f64) -> Option<f64> {
    let lat_r = lat * DEG;
    let decl_r = declination * DEG;
    let denom = lat_r.cos() * decl_r.cos();
    if denom.abs() < 1e-12 {
        return None;
    }
    let cos_h = ((altitude * DEG).sin() - lat_r.sin() * decl_r.sin()) / denom;
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }
    Some(cos_h.acos() / DEG / 15.0)
}

/// Altitude of the sun at Asr for a shadow-length multiplier.
///
/// Asr begins when an object's shadow equals `shadow` times its height plus
/// the noon shadow: alt = arccot(shadow + tan(|lat - decl|)).
pub fn asr_altitude(shadow: f64, declination: f64, lat: f64) -> f64 {
    let noon_zenith = ((lat - declination).abs() * DEG).tan();
    (1.0 / (shadow + noon_zenith)).atan() / DEG
}

/// Compute the solar position for a given UTC datetime, latitude, and longitude.
pub fn solar_position(dt: &NaiveDateTime, lat: f64, lon: f64) -> SolarPosition {
    let jd = julian_date(dt);
    let t = julian_century(jd);

    let decl = solar_declination(t);
    let eqt = equation_of_time(t);

    let hour = dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0;
    let solar_time = hour * 60.0 + eqt + 4.0 * lon;
    let hour_angle = solar_time / 4.0 - 180.0;

    let lat_r = lat * DEG;
    let decl_r = decl * DEG;
    let ha_r = hour_angle * DEG;

    let sin_alt = lat_r.sin() * decl_r.sin() + lat_r.cos() * decl_r.cos() * ha_r.cos();
    let altitude = sin_alt.asin() / DEG;

    let zenith = sin_alt.asin();
    let azimuth = if lat_r.cos().abs() > 1e-10 {
        let cos_az = (decl_r.sin() - zenith.sin() * lat_r.sin()) / (zenith.cos() * lat_r.cos());
        let az = cos_az.clamp(-1.0, 1.0).acos() / DEG;
        if hour_angle > 0.0 { 360.0 - az } else { az }
    } else if decl > 0.0 {
        180.0
    } else {
        0.0
    };

    SolarPosition {
        altitude,
        azimuth: normalize_degrees(azimuth),
        declination: decl,
        equation_of_time: eqt,
    }
}
