//! Next-prayer resolution over already-computed checkpoints.
//!
//! Cheap enough to call every second: no astronomy, only comparisons.
//! Day rollover is the caller's job (see [`crate::solver::next_prayer_across_days`]).

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::prayer::{DailyPrayerTimes, Prayer};

/// Result of resolving "now" against one day's checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextPrayer {
    /// First checkpoint strictly after `now`, or `Prayer::None` after isha.
    pub prayer: Prayer,
    /// Last checkpoint at or before `now`, or `Prayer::None` before fajr.
    pub current: Prayer,
    /// Zero when `prayer` is `None`.
    pub remaining: Duration,
    pub at: Option<DateTime<Tz>>,
}

/// Resolve the next checkpoint.
///
/// A checkpoint equal to `now` counts as started: at exactly fajr the next
/// one is sunrise.
pub fn resolve(times: &DailyPrayerTimes, now: DateTime<Utc>) -> NextPrayer {
    let mut current = Prayer::None;
    for (prayer, at) in times.checkpoints() {
        if at > now {
            return NextPrayer {
                prayer,
                current,
                remaining: at.with_timezone(&Utc) - now,
                at: Some(at),
            };
        }
        current = prayer;
    }
    NextPrayer {
        prayer: Prayer::None,
        current,
        remaining: Duration::zero(),
        at: None,
    }
}

/// Countdown as `HH:MM:SS`; hours may exceed 24.
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Countdown for a resolved next prayer; `--:--:--` when nothing is left today.
pub fn countdown(next: &NextPrayer) -> String {
    match next.prayer {
        Prayer::None => "--:--:--".to_string(),
        _ => format_countdown(next.remaining),
    }
}

/// How close the next checkpoint is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Proximity {
    /// 5 minutes or less.
    Imminent,
    /// 15 minutes or less.
    Close,
    /// 30 minutes or less.
    Medium,
    Far,
}

impl Proximity {
    pub fn from_remaining(remaining: Duration) -> Self {
        let secs = remaining.num_seconds();
        if secs <= 5 * 60 {
            Self::Imminent
        } else if secs <= 15 * 60 {
            Self::Close
        } else if secs <= 30 * 60 {
            Self::Medium
        } else {
            Self::Far
        }
    }

    /// `None` when there is no next prayer today.
    pub fn of(next: &NextPrayer) -> Option<Self> {
        match next.prayer {
            Prayer::None => None,
            _ => Some(Self::from_remaining(next.remaining)),
        }
    }
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imminent => write!(f, "imminent"),
            Self::Close => write!(f, "close"),
            Self::Medium => write!(f, "medium"),
            Self::Far => write!(f, "far"),
        }
    }
}

/// One-shot trigger for the "entering imminent" side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HapticGuard {
    #[default]
    Armed,
    Fired,
}

impl HapticGuard {
    /// Feed the current tier; returns true exactly once per entry into `Imminent`.
    pub fn observe(&mut self, tier: Option<Proximity>) -> bool {
        match (*self, tier) {
            (Self::Armed, Some(Proximity::Imminent)) => {
                *self = Self::Fired;
                true
            }
            (Self::Fired, Some(Proximity::Imminent)) => false,
            _ => {
                *self = Self::Armed;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::GeoCoordinate;
    use crate::method::{CalculationConfig, CalculationMethod};
    use crate::prayer;
    use chrono::NaiveDate;

    fn riyadh() -> DailyPrayerTimes {
        let coord = GeoCoordinate::new(24.7136, 46.6753).unwrap();
        let config = CalculationConfig::new(CalculationMethod::MuslimWorldLeague);
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        prayer::compute(coord, date, chrono_tz::Asia::Riyadh, &config).unwrap()
    }

    fn utc(t: DateTime<Tz>) -> DateTime<Utc> {
        t.with_timezone(&Utc)
    }

    #[test]
    fn test_before_fajr() {
        let times = riyadh();
        let next = resolve(&times, utc(times.fajr) - Duration::minutes(30));
        assert_eq!(next.prayer, Prayer::Fajr);
        assert_eq!(next.current, Prayer::None);
        assert_eq!(next.remaining, Duration::minutes(30));
        assert_eq!(next.at, Some(times.fajr));
    }

    #[test]
    fn test_exactly_at_fajr_next_is_sunrise() {
        let times = riyadh();
        let next = resolve(&times, utc(times.fajr));
        assert_eq!(next.prayer, Prayer::Sunrise);
        assert_eq!(next.current, Prayer::Fajr);
        assert_eq!(next.remaining, times.sunrise - times.fajr);
    }

    #[test]
    fn test_between_checkpoints() {
        let times = riyadh();
        let now = utc(times.dhuhr) + Duration::minutes(1);
        let next = resolve(&times, now);
        assert_eq!(next.prayer, Prayer::Asr);
        assert_eq!(next.current, Prayer::Dhuhr);
    }

    #[test]
    fn test_after_isha_is_none() {
        let times = riyadh();
        let next = resolve(&times, utc(times.isha) + Duration::seconds(1));
        assert_eq!(next.prayer, Prayer::None);
        assert_eq!(next.current, Prayer::Isha);
        assert_eq!(next.remaining, Duration::zero());
        assert_eq!(countdown(&next), "--:--:--");
        assert_eq!(Proximity::of(&next), None);

        let at_isha = resolve(&times, utc(times.isha));
        assert_eq!(at_isha.prayer, Prayer::None);
    }

    #[test]
    fn test_idempotent() {
        let times = riyadh();
        let now = utc(times.asr) - Duration::seconds(17);
        assert_eq!(resolve(&times, now), resolve(&times, now));
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(Duration::seconds(3725)), "01:02:05");
        assert_eq!(format_countdown(Duration::seconds(0)), "00:00:00");
        assert_eq!(format_countdown(Duration::seconds(-5)), "00:00:00");
        assert_eq!(format_countdown(Duration::hours(26)), "26:00:00");
    }

    #[test]
    fn test_proximity_tiers() {
        assert_eq!(Proximity::from_remaining(Duration::minutes(5)), Proximity::Imminent);
        assert_eq!(Proximity::from_remaining(Duration::seconds(301)), Proximity::Close);
        assert_eq!(Proximity::from_remaining(Duration::minutes(15)), Proximity::Close);
        assert_eq!(Proximity::from_remaining(Duration::minutes(30)), Proximity::Medium);
        assert_eq!(Proximity::from_remaining(Duration::minutes(31)), Proximity::Far);
    }

    #[test]
    fn test_haptic_guard_fires_once_and_rearms() {
        let mut guard = HapticGuard::default();
        assert!(!guard.observe(Some(Proximity::Close)));
        assert!(guard.observe(Some(Proximity::Imminent)));
        assert_eq!(guard, HapticGuard::Fired);
        assert!(!guard.observe(Some(Proximity::Imminent)));
        assert!(!guard.observe(Some(Proximity::Far)));
        assert_eq!(guard, HapticGuard::Armed);
        assert!(guard.observe(Some(Proximity::Imminent)));
        assert!(!guard.observe(None));
        assert_eq!(guard, HapticGuard::Armed);
    }
}
