//! Prayer alert planning.
//!
//! Turns a day's checkpoints into the list of alerts a host should arm. Only
//! alerts strictly in the future and less than 24 hours away are kept; the
//! host re-plans after every rollover.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::prayer::{DailyPrayerTimes, Prayer};

/// Minutes after the prayer time for the post-prayer adhkar reminder.
pub const AFTER_PRAYER_DELAY_MINUTES: i64 = 20;

const PLANNING_WINDOW_HOURS: i64 = 24;

/// The five prayers that get alerts; sunrise is informational only.
const ALERTED: [Prayer; 5] = [Prayer::Fajr, Prayer::Dhuhr, Prayer::Asr, Prayer::Maghrib, Prayer::Isha];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Before,
    AtTime,
    After,
}

/// How the host should present an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMode {
    #[default]
    Sound,
    Vibrate,
    Silent,
    Adhan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerPrayerModes {
    pub fajr: AlertMode,
    pub dhuhr: AlertMode,
    pub asr: AlertMode,
    pub maghrib: AlertMode,
    pub isha: AlertMode,
}

impl PerPrayerModes {
    pub fn for_prayer(&self, prayer: Prayer) -> AlertMode {
        match prayer {
            Prayer::Fajr => self.fajr,
            Prayer::Dhuhr => self.dhuhr,
            Prayer::Asr => self.asr,
            Prayer::Maghrib => self.maghrib,
            Prayer::Isha => self.isha,
            Prayer::Sunrise | Prayer::None => AlertMode::Silent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPreferences {
    pub enabled: bool,
    /// Lead time of the `Before` alert; 0 disables it.
    pub before_minutes: i64,
    pub at_time: bool,
    pub after_prayer: bool,
    pub modes: PerPrayerModes,
}

impl Default for AlertPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            before_minutes: 10,
            at_time: true,
            after_prayer: false,
            modes: PerPrayerModes::default(),
        }
    }
}

/// One alert to arm.
#[derive(Debug, Clone, PartialEq)]
pub struct PrayerAlert {
    pub prayer: Prayer,
    pub kind: AlertKind,
    pub at: DateTime<Tz>,
    pub mode: AlertMode,
    pub message: String,
    /// Stable key so a re-plan replaces rather than duplicates.
    pub tag: String,
}

fn message(prayer: Prayer, kind: AlertKind, before_minutes: i64) -> String {
    let name = prayer.name_ar();
    match kind {
        AlertKind::Before => format!("بقي {} دقيقة على صلاة {} 🌿", before_minutes, name),
        AlertKind::AtTime => format!("حان وقت صلاة {}", name),
        AlertKind::After => "تقبّل الله… لا تنس أذكار ما بعد الصلاة 🤍".to_string(),
    }
}

/// Plan alerts for one day's prayers, sorted by time.
pub fn plan_prayer_alerts(times: &DailyPrayerTimes, now: DateTime<Utc>, prefs: &AlertPreferences) -> Vec<PrayerAlert> {
    if !prefs.enabled {
        return Vec::new();
    }

    let horizon = now + Duration::hours(PLANNING_WINDOW_HOURS);
    let mut alerts = Vec::new();

    for prayer in ALERTED {
        let Some(prayer_at) = times.time(prayer) else { continue };

        let mut candidates = Vec::with_capacity(3);
        if prefs.before_minutes > 0 {
            candidates.push((AlertKind::Before, prayer_at - Duration::minutes(prefs.before_minutes)));
        }
        if prefs.at_time {
            candidates.push((AlertKind::AtTime, prayer_at));
        }
        if prefs.after_prayer {
            candidates.push((AlertKind::After, prayer_at + Duration::minutes(AFTER_PRAYER_DELAY_MINUTES)));
        }

        for (kind, at) in candidates {
            if at <= now || at >= horizon {
                continue;
            }
            alerts.push(PrayerAlert {
                prayer,
                kind,
                at,
                mode: prefs.modes.for_prayer(prayer),
                message: message(prayer, kind, prefs.before_minutes),
                tag: format!("prayer-{}-{}-{:?}", times.date, prayer.name().to_lowercase(), kind).to_lowercase(),
            });
        }
    }

    alerts.sort_by_key(|a| a.at);
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::GeoCoordinate;
    use crate::method::{CalculationConfig, CalculationMethod};
    use crate::prayer;
    use chrono::NaiveDate;

    fn cairo() -> DailyPrayerTimes {
        let coord = GeoCoordinate::new(30.0444, 31.2357).unwrap();
        let config = CalculationConfig::new(CalculationMethod::Egyptian);
        let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        prayer::compute(coord, date, chrono_tz::Africa::Cairo, &config).unwrap()
    }

    fn utc(t: DateTime<Tz>) -> DateTime<Utc> {
        t.with_timezone(&Utc)
    }

    #[test]
    fn test_defaults_before_and_at() {
        let times = cairo();
        let now = utc(times.fajr) - Duration::hours(1);
        let alerts = plan_prayer_alerts(&times, now, &AlertPreferences::default());

        assert_eq!(alerts.len(), 10);
        assert!(alerts.iter().all(|a| a.prayer != Prayer::Sunrise));
        assert!(alerts.iter().all(|a| a.kind != AlertKind::After));
        assert_eq!(alerts[0].kind, AlertKind::Before);
        assert_eq!(alerts[0].at, times.fajr - Duration::minutes(10));
        assert_eq!(alerts[1].kind, AlertKind::AtTime);
        assert_eq!(alerts[1].at, times.fajr);
        assert!(alerts.windows(2).all(|w| w[0].at <= w[1].at));
    }

    #[test]
    fn test_past_alerts_dropped() {
        let times = cairo();
        let now = utc(times.asr);
        let alerts = plan_prayer_alerts(&times, now, &AlertPreferences::default());
        assert!(alerts.iter().all(|a| a.at > times.asr));
        // Asr itself is not strictly in the future
        assert!(!alerts.iter().any(|a| a.prayer == Prayer::Asr));
        assert!(alerts.iter().any(|a| a.prayer == Prayer::Maghrib));
    }

    #[test]
    fn test_window_excludes_far_alerts() {
        let times = cairo();
        let now = utc(times.fajr) - Duration::hours(30);
        assert!(plan_prayer_alerts(&times, now, &AlertPreferences::default()).is_empty());
    }

    #[test]
    fn test_after_prayer_and_modes() {
        let times = cairo();
        let prefs = AlertPreferences {
            before_minutes: 0,
            at_time: false,
            after_prayer: true,
            modes: PerPrayerModes { fajr: AlertMode::Adhan, ..Default::default() },
            ..Default::default()
        };
        let alerts = plan_prayer_alerts(&times, utc(times.fajr) - Duration::hours(1), &prefs);
        assert_eq!(alerts.len(), 5);
        assert_eq!(alerts[0].at, times.fajr + Duration::minutes(AFTER_PRAYER_DELAY_MINUTES));
        assert_eq!(alerts[0].mode, AlertMode::Adhan);
        assert_eq!(alerts[1].mode, AlertMode::Sound);
    }

    #[test]
    fn test_disabled_plans_nothing() {
        let times = cairo();
        let prefs = AlertPreferences { enabled: false, ..Default::default() };
        assert!(plan_prayer_alerts(&times, utc(times.fajr) - Duration::hours(1), &prefs).is_empty());
    }

    #[test]
    fn test_messages_and_tags() {
        let times = cairo();
        let alerts = plan_prayer_alerts(&times, utc(times.fajr) - Duration::hours(1), &AlertPreferences::default());
        assert_eq!(alerts[0].message, "بقي 10 دقيقة على صلاة الفجر 🌿");
        assert_eq!(alerts[1].message, "حان وقت صلاة الفجر");
        assert_eq!(alerts[0].tag, "prayer-2024-03-20-fajr-before");
        assert_eq!(alerts[1].tag, "prayer-2024-03-20-fajr-attime");
    }

    #[test]
    fn test_preferences_deserialize_partial() {
        let prefs: AlertPreferences = serde_json::from_str(r#"{"before_minutes": 15, "modes": {"isha": "vibrate"}}"#).unwrap();
        assert_eq!(prefs.before_minutes, 15);
        assert!(prefs.at_time);
        assert_eq!(prefs.modes.isha, AlertMode::Vibrate);
        assert_eq!(prefs.modes.fajr, AlertMode::Sound);
    }
}
