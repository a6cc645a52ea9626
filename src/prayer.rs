//! Daily prayer-time computation.
//!
//! All six checkpoints are first solved in fractional UTC hours from the
//! sun's declination and equation of time, then adjusted, rounded to the
//! minute and turned into instants in the caller's timezone.
//!
//! Core rule: a checkpoint is never NaN and never out of order. When the sun
//! does not reach an angle, the time is projected or bounded and its
//! [`EventMethod`] says so.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::location::GeoCoordinate;
use crate::method::{CalculationConfig, IshaRule};
use crate::solar::{self, SolarCoordinates, HORIZON_ANGLE};

/// Fraction of the dhuhr → sunset arc at which asr is placed when the
/// shadow angle has no solution.
const ASR_ARC_RATIO: f64 = 0.55;

/// One of the six daily checkpoints, or `None` once isha has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Prayer {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
    None,
}

impl Prayer {
    /// The checkpoints of a day, in chronological order.
    pub const CHECKPOINTS: [Prayer; 6] = [
        Self::Fajr,
        Self::Sunrise,
        Self::Dhuhr,
        Self::Asr,
        Self::Maghrib,
        Self::Isha,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fajr => "Fajr",
            Self::Sunrise => "Sunrise",
            Self::Dhuhr => "Dhuhr",
            Self::Asr => "Asr",
            Self::Maghrib => "Maghrib",
            Self::Isha => "Isha",
            Self::None => "None",
        }
    }

    pub fn name_ar(&self) -> &'static str {
        match self {
            Self::Fajr => "الفجر",
            Self::Sunrise => "الشروق",
            Self::Dhuhr => "الظهر",
            Self::Asr => "العصر",
            Self::Maghrib => "المغرب",
            Self::Isha => "العشاء",
            Self::None => "",
        }
    }

    /// Sunrise marks the end of fajr; it is not itself a prayer.
    pub fn is_prayer(&self) -> bool {
        !matches!(self, Self::Sunrise | Self::None)
    }

    fn index(&self) -> Option<usize> {
        Self::CHECKPOINTS.iter().position(|p| p == self)
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How a checkpoint was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventMethod {
    /// Direct solution of the sun-angle equation.
    Standard,
    /// Sunrise/sunset borrowed from a reference latitude where the sun does cross the horizon.
    Projected,
    /// Night-portion bound, arc ratio or ordering repair.
    Virtual,
}

impl fmt::Display for EventMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "Standard"),
            Self::Projected => write!(f, "Projected"),
            Self::Virtual => write!(f, "Virtual"),
        }
    }
}

/// The state of the solar day at the coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayState {
    /// Sun rises and sets normally.
    Normal,
    /// Sun never sets.
    MidnightSun,
    /// Sun never rises.
    PolarNight,
}

impl fmt::Display for DayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::MidnightSun => write!(f, "MidnightSun"),
            Self::PolarNight => write!(f, "PolarNight"),
        }
    }
}

/// The six checkpoints of one civil day, strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPrayerTimes {
    pub date: NaiveDate,
    pub fajr: DateTime<Tz>,
    pub sunrise: DateTime<Tz>,
    pub dhuhr: DateTime<Tz>,
    pub asr: DateTime<Tz>,
    pub maghrib: DateTime<Tz>,
    pub isha: DateTime<Tz>,
    pub day_state: DayState,
    methods: [EventMethod; 6],
}

impl DailyPrayerTimes {
    /// The instant of a checkpoint; `None` for [`Prayer::None`].
    pub fn time(&self, prayer: Prayer) -> Option<DateTime<Tz>> {
        match prayer {
            Prayer::Fajr => Some(self.fajr),
            Prayer::Sunrise => Some(self.sunrise),
            Prayer::Dhuhr => Some(self.dhuhr),
            Prayer::Asr => Some(self.asr),
            Prayer::Maghrib => Some(self.maghrib),
            Prayer::Isha => Some(self.isha),
            Prayer::None => None,
        }
    }

    pub fn checkpoints(&self) -> [(Prayer, DateTime<Tz>); 6] {
        [
            (Prayer::Fajr, self.fajr),
            (Prayer::Sunrise, self.sunrise),
            (Prayer::Dhuhr, self.dhuhr),
            (Prayer::Asr, self.asr),
            (Prayer::Maghrib, self.maghrib),
            (Prayer::Isha, self.isha),
        ]
    }

    pub fn method_for(&self, prayer: Prayer) -> Option<EventMethod> {
        prayer.index().map(|i| self.methods[i])
    }

    /// True when any checkpoint is not a direct solution.
    pub fn is_approximate(&self) -> bool {
        self.methods.iter().any(|m| *m != EventMethod::Standard)
    }
}

/// A checkpoint in fractional UTC hours, relative to the day's base instant.
#[derive(Debug, Clone, Copy)]
struct RawTime {
    hours: f64,
    method: EventMethod,
}

impl RawTime {
    fn standard(hours: f64) -> Self {
        Self { hours, method: EventMethod::Standard }
    }

    fn with(hours: f64, method: EventMethod) -> Self {
        Self { hours, method }
    }
}

/// Sun geometry for one UTC day, anchored at `jd0` (00:00 UTC).
struct SolarDay {
    jd0: f64,
    longitude: f64,
}

impl SolarDay {
    fn sun_at(&self, hours: f64) -> SolarCoordinates {
        solar::solar_coordinates(self.jd0 + hours / 24.0)
    }

    fn transit(&self) -> f64 {
        let mut t = 12.0 - self.longitude / 15.0;
        for _ in 0..2 {
            t = solar::transit_hours(&self.sun_at(t), self.longitude);
        }
        t
    }

    /// Time at which the sun is at `altitude`, before or after transit.
    fn time_for_altitude(&self, latitude: f64, altitude: f64, after_transit: bool, approx: f64) -> Option<f64> {
        let mut t = approx;
        for _ in 0..2 {
            let sun = self.sun_at(t);
            let transit = solar::transit_hours(&sun, self.longitude);
            let h = solar::hour_angle(altitude, sun.declination, latitude)?;
            t = if after_transit { transit + h } else { transit - h };
        }
        Some(t)
    }

    fn sunrise_sunset(&self, latitude: f64, transit: f64) -> Option<(f64, f64)> {
        let rise = self.time_for_altitude(latitude, HORIZON_ANGLE, false, transit - 6.0)?;
        let set = self.time_for_altitude(latitude, HORIZON_ANGLE, true, transit + 6.0)?;
        Some((rise, set))
    }
}

/// Starting latitude for sunrise/sunset projection (nearest place with a normal day).
///
/// - |lat| < 30: 45°
/// - 30–60: the latitude itself
/// - > 60: |lat| − 15
pub fn reference_latitude(lat: f64) -> f64 {
    let abs_lat = lat.abs();
    let ref_abs = if abs_lat < 30.0 {
        45.0
    } else if abs_lat < 60.0 {
        abs_lat
    } else {
        abs_lat - 15.0
    };
    if lat >= 0.0 { ref_abs } else { -ref_abs }
}

/// Project sunrise/sunset from the reference latitude, stepping 5° toward 45°.
fn projected_sunrise_sunset(day: &SolarDay, latitude: f64, transit: f64) -> (f64, f64, f64) {
    let mut ref_lat = reference_latitude(latitude);
    loop {
        if let Some((rise, set)) = day.sunrise_sunset(ref_lat, transit) {
            return (rise, set, ref_lat);
        }
        if ref_lat.abs() <= 45.0 {
            // The sun crosses the horizon every day at 45°, so this is unreachable in practice
            return (transit - 6.0, transit + 6.0, ref_lat);
        }
        ref_lat -= 5.0 * ref_lat.signum();
    }
}

/// Shift, in days, that puts local solar noon on the requested civil date.
///
/// Zones far from their meridian (UTC+13/+14 in the Pacific) would otherwise
/// land the UTC day's transit on the next local day.
fn day_shift(date: NaiveDate, tz: &Tz, longitude: f64) -> i64 {
    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN));
    let offset_hours = tz.offset_from_utc_datetime(&noon).fix().local_minus_utc() as f64 / 3600.0;
    let local_transit = 12.0 - longitude / 15.0 + offset_hours;
    -((local_transit - 12.0) / 24.0).round() as i64
}

/// Compute one civil day's checkpoints at `coord`, expressed in `tz`.
///
/// Out-of-range coordinates are rejected. Degenerate geometry is not an error:
/// affected times are projected or bounded and tagged in their [`EventMethod`].
pub fn compute(coord: GeoCoordinate, date: NaiveDate, tz: Tz, config: &CalculationConfig) -> Result<DailyPrayerTimes> {
    let coord = GeoCoordinate::new(coord.latitude, coord.longitude)?;
    let lat = coord.latitude;
    let params = &config.params;

    let shift = day_shift(date, &tz, coord.longitude);
    let day = SolarDay {
        jd0: solar::julian_day(date) + shift as f64,
        longitude: coord.longitude,
    };

    let transit = day.transit();
    let declination = day.sun_at(transit).declination;
    let dhuhr = RawTime::standard(transit);

    let (sunrise, sunset, day_state) = match day.sunrise_sunset(lat, transit) {
        Some((rise, set)) => (RawTime::standard(rise), RawTime::standard(set), DayState::Normal),
        None => {
            let (rise, set, ref_lat) = projected_sunrise_sunset(&day, lat, transit);
            let noon_altitude = 90.0 - (lat - declination).abs();
            let state = if noon_altitude > HORIZON_ANGLE { DayState::MidnightSun } else { DayState::PolarNight };
            tracing::debug!(latitude = lat, reference = ref_lat, state = %state, "sunrise/sunset projected");
            (
                RawTime::with(rise, EventMethod::Projected),
                RawTime::with(set, EventMethod::Projected),
                state,
            )
        }
    };

    let night = 24.0 - (sunset.hours - sunrise.hours);
    let rule = config.high_latitude_rule;

    let asr_alt = solar::asr_altitude(config.asr_school.shadow_multiplier(), declination, lat);
    let asr = match day.time_for_altitude(lat, asr_alt, true, transit + 3.0) {
        Some(t) if t <= sunset.hours => RawTime::standard(t),
        _ => {
            tracing::debug!(latitude = lat, "asr placed on the dhuhr-sunset arc");
            RawTime::with(transit + (sunset.hours - transit) * ASR_ARC_RATIO, EventMethod::Virtual)
        }
    };

    let safe_fajr = sunrise.hours - rule.night_portion(params.fajr_angle) * night;
    let fajr = match day.time_for_altitude(lat, -params.fajr_angle, false, sunrise.hours - 1.5) {
        Some(t) if t >= safe_fajr && t < sunrise.hours => RawTime::standard(t),
        _ => RawTime::with(safe_fajr, EventMethod::Virtual),
    };

    let maghrib = match params.maghrib_angle {
        Some(angle) => match day.time_for_altitude(lat, -angle, true, sunset.hours + 0.5) {
            Some(t) if t > sunset.hours => RawTime::standard(t),
            _ => RawTime::with(sunset.hours + rule.night_portion(angle) * night, EventMethod::Virtual),
        },
        None => RawTime::with(sunset.hours + params.maghrib_interval_minutes as f64 / 60.0, sunset.method),
    };

    let isha = match params.isha {
        IshaRule::Interval(minutes) => RawTime::with(sunset.hours + minutes as f64 / 60.0, sunset.method),
        IshaRule::Angle(angle) => {
            let safe_isha = sunset.hours + rule.night_portion(angle) * night;
            match day.time_for_altitude(lat, -angle, true, sunset.hours + 1.5) {
                Some(t) if t <= safe_isha && t > sunset.hours => RawTime::standard(t),
                _ => RawTime::with(safe_isha, EventMethod::Virtual),
            }
        }
    };

    if fajr.method == EventMethod::Virtual || isha.method == EventMethod::Virtual {
        tracing::debug!(latitude = lat, rule = ?rule, "twilight bounded by night portion");
    }

    let ma = params.method_adjustments;
    let user = config.adjustments;
    let raw = [fajr, sunrise, dhuhr, asr, maghrib, isha];
    let offsets = [
        ma.fajr + user.fajr,
        ma.sunrise,
        ma.dhuhr,
        ma.asr,
        ma.maghrib,
        ma.isha + user.isha,
    ];

    let base = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)) + Duration::days(shift);
    let mut instants = [base; 6];
    let mut methods = [EventMethod::Standard; 6];
    for i in 0..6 {
        let minutes = (raw[i].hours * 60.0).round() as i64 + offsets[i];
        instants[i] = base + Duration::minutes(minutes);
        methods[i] = raw[i].method;
    }

    // Ordering repair: rounding and preset offsets can collapse neighbours
    for i in 1..6 {
        if instants[i] <= instants[i - 1] {
            instants[i] = instants[i - 1] + Duration::minutes(1);
            methods[i] = EventMethod::Virtual;
        }
    }

    let local = instants.map(|t| t.with_timezone(&tz));
    Ok(DailyPrayerTimes {
        date,
        fajr: local[0],
        sunrise: local[1],
        dhuhr: local[2],
        asr: local[3],
        maghrib: local[4],
        isha: local[5],
        day_state,
        methods,
    })
}
