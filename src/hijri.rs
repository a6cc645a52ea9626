//! Hijri calendar conversion and calendar predicates.
//!
//! Two calendars are available:
//! - Umm al-Qura, the Saudi civil calendar, from the `hijri_date` table
//!   (Gregorian 1938–2076).
//! - The tabular civil calendar (30-year cycle, epoch 16 July 622 Julian),
//!   valid for any date and used outside the table's range.
//!
//! Real moon-sighting announcements can differ by a day or two from both;
//! the caller's day adjustment exists to correct for that.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// First and last Gregorian years covered by the Umm al-Qura table.
pub const UMM_AL_QURA_MIN_YEAR: i32 = 1938;
pub const UMM_AL_QURA_MAX_YEAR: i32 = 2076;

/// Julian Day Number of 1 Muharram 1 AH in the civil (Friday) epoch.
const HIJRI_EPOCH_JDN: i64 = 1948440;

/// Julian Day Number of 0001-01-01 (proleptic Gregorian) minus one.
const CE_JDN_OFFSET: i64 = 1721425;

/// Days in one 30-year tabular cycle.
const CYCLE_DAYS: i64 = 10631;

/// Years in a 30-year cycle that have 355 days.
const LEAP_YEARS: [i64; 11] = [2, 5, 7, 10, 13, 16, 18, 21, 24, 26, 29];

const MONTH_NAMES: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabi al-Awwal",
    "Rabi al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Shaban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qadah",
    "Dhu al-Hijjah",
];

const MONTH_NAMES_AR: [&str; 12] = [
    "محرم",
    "صفر",
    "ربيع الأول",
    "ربيع الآخر",
    "جمادى الأولى",
    "جمادى الآخرة",
    "رجب",
    "شعبان",
    "رمضان",
    "شوال",
    "ذو القعدة",
    "ذو الحجة",
];

/// A Hijri date. Field order gives the lexicographic (year, month, day) ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HijriDate {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl HijriDate {
    /// Build a date, checking month 1–12 and day 1–30.
    pub fn new(year: u32, month: u32, day: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(1..=30).contains(&day) || year == 0 {
            return Err(Error::InvalidDate {
                input: format!("{}-{:02}-{:02} AH", year, month, day),
                reason: "month must be 1-12 and day 1-30".into(),
            });
        }
        Ok(Self { year, month, day })
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month as usize).clamp(1, 12) - 1]
    }

    pub fn month_name_ar(&self) -> &'static str {
        MONTH_NAMES_AR[(self.month as usize).clamp(1, 12) - 1]
    }

    /// 13th, 14th or 15th of any month.
    pub fn is_white_day(&self) -> bool {
        (13..=15).contains(&self.day)
    }

    pub fn is_first_of_month(&self) -> bool {
        self.day == 1
    }

    pub fn is_ramadan(&self) -> bool {
        self.month == 9
    }

    pub fn is_last_ten_of_ramadan(&self) -> bool {
        self.is_ramadan() && self.day >= 21
    }

    pub fn is_dhul_hijjah(&self) -> bool {
        self.month == 12
    }

    pub fn is_first_ten_of_dhul_hijjah(&self) -> bool {
        self.is_dhul_hijjah() && self.day <= 10
    }
}

impl fmt::Display for HijriDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} AH", self.day, self.month_name(), self.year)
    }
}

/// Which Islamic calendar to convert with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HijriCalendar {
    /// Umm al-Qura inside its table range, tabular outside it.
    #[default]
    UmmAlQura,
    Tabular,
}

/// Convert a Gregorian date, shifted by `adjustment_days`, with the default calendar.
pub fn to_hijri(date: NaiveDate, adjustment_days: i64) -> Result<HijriDate> {
    to_hijri_with(HijriCalendar::default(), date, adjustment_days)
}

/// Convert a Gregorian date, shifted by `adjustment_days`.
pub fn to_hijri_with(calendar: HijriCalendar, date: NaiveDate, adjustment_days: i64) -> Result<HijriDate> {
    let adjusted = date
        .checked_add_signed(Duration::days(adjustment_days))
        .ok_or_else(|| Error::InvalidDate {
            input: date.to_string(),
            reason: format!("adjustment of {} days is out of range", adjustment_days),
        })?;

    let hijri = match calendar {
        HijriCalendar::UmmAlQura => umm_al_qura(adjusted).unwrap_or_else(|| tabular_from_gregorian(adjusted)),
        HijriCalendar::Tabular => tabular_from_gregorian(adjusted),
    };
    Ok(hijri)
}

/// Umm al-Qura lookup; `None` outside the table.
fn umm_al_qura(date: NaiveDate) -> Option<HijriDate> {
    if !(UMM_AL_QURA_MIN_YEAR..=UMM_AL_QURA_MAX_YEAR).contains(&date.year()) {
        return None;
    }
    match hijri_date::HijriDate::from_gr(date.year() as usize, date.month() as usize, date.day() as usize) {
        Ok(h) => Some(HijriDate {
            year: h.year() as u32,
            month: h.month() as u32,
            day: h.day() as u32,
        }),
        Err(e) => {
            tracing::debug!(%date, error = %e, "umm al-qura lookup failed, using tabular calendar");
            None
        }
    }
}

fn is_tabular_leap(year: i64) -> bool {
    LEAP_YEARS.contains(&(year % 30))
}

fn tabular_year_days(year: i64) -> i64 {
    if is_tabular_leap(year) { 355 } else { 354 }
}

fn tabular_month_days(year: i64, month: i64) -> i64 {
    // Odd months have 30 days, even months 29; Dhu al-Hijjah has 30 in leap years
    if month % 2 == 1 || (month == 12 && is_tabular_leap(year)) {
        30
    } else {
        29
    }
}

fn julian_day_number(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64 + CE_JDN_OFFSET
}

/// Tabular (civil) Hijri date for a Gregorian date. Dates before the epoch clamp to 1/1/1.
pub fn tabular_from_gregorian(date: NaiveDate) -> HijriDate {
    let days_since_epoch = julian_day_number(date) - HIJRI_EPOCH_JDN;
    if days_since_epoch < 0 {
        return HijriDate { year: 1, month: 1, day: 1 };
    }

    let mut year = (days_since_epoch / CYCLE_DAYS) * 30 + 1;
    let mut remaining = days_since_epoch % CYCLE_DAYS;

    while remaining >= tabular_year_days(year) {
        remaining -= tabular_year_days(year);
        year += 1;
    }

    let mut month = 1;
    while month < 12 && remaining >= tabular_month_days(year, month) {
        remaining -= tabular_month_days(year, month);
        month += 1;
    }

    HijriDate {
        year: year as u32,
        month: month as u32,
        day: remaining as u32 + 1,
    }
}

/// Gregorian date of a tabular Hijri date.
pub fn hijri_to_gregorian(hijri: HijriDate) -> Result<NaiveDate> {
    let year = hijri.year as i64;
    let month = hijri.month as i64;
    let invalid = |reason: &str| Error::InvalidDate {
        input: format!("{}-{:02}-{:02} AH", hijri.year, hijri.month, hijri.day),
        reason: reason.to_string(),
    };
    if year < 1 || !(1..=12).contains(&month) {
        return Err(invalid("month must be 1-12"));
    }
    if hijri.day < 1 || hijri.day as i64 > tabular_month_days(year, month) {
        return Err(invalid("day exceeds month length"));
    }

    let full_cycles = (year - 1) / 30;
    let mut days = full_cycles * CYCLE_DAYS;
    days += (full_cycles * 30 + 1..year).map(tabular_year_days).sum::<i64>();
    days += (1..month).map(|m| tabular_month_days(year, m)).sum::<i64>();
    days += hijri.day as i64 - 1;

    let from_ce = i32::try_from(HIJRI_EPOCH_JDN + days - CE_JDN_OFFSET).map_err(|_| invalid("year out of range"))?;
    NaiveDate::from_num_days_from_ce_opt(from_ce).ok_or_else(|| invalid("year out of range"))
}

pub fn is_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri
}

pub fn is_thursday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Thu
}

pub fn is_monday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Mon
}

/// Every calendar predicate for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CalendarFlags {
    pub white_day: bool,
    pub first_of_month: bool,
    pub ramadan: bool,
    pub last_ten_of_ramadan: bool,
    pub dhul_hijjah: bool,
    pub first_ten_of_dhul_hijjah: bool,
    pub friday: bool,
    pub thursday: bool,
    pub monday: bool,
}

impl CalendarFlags {
    /// Hijri flags come from `hijri`; weekday flags from the Gregorian `date`.
    pub fn new(date: NaiveDate, hijri: &HijriDate) -> Self {
        Self {
            white_day: hijri.is_white_day(),
            first_of_month: hijri.is_first_of_month(),
            ramadan: hijri.is_ramadan(),
            last_ten_of_ramadan: hijri.is_last_ten_of_ramadan(),
            dhul_hijjah: hijri.is_dhul_hijjah(),
            first_ten_of_dhul_hijjah: hijri.is_first_ten_of_dhul_hijjah(),
            friday: is_friday(date),
            thursday: is_thursday(date),
            monday: is_monday(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tabular(y: i32, m: u32, d: u32) -> (u32, u32, u32) {
        let h = tabular_from_gregorian(date(y, m, d));
        (h.year, h.month, h.day)
    }

    #[test]
    fn test_tabular_known_dates() {
        assert_eq!(tabular(2024, 3, 11), (1445, 9, 1));
        assert_eq!(tabular(2024, 4, 10), (1445, 10, 1));
        assert_eq!(tabular(2024, 6, 15), (1445, 12, 8));
        assert_eq!(tabular(2024, 7, 7), (1445, 12, 30));
        assert_eq!(tabular(2025, 3, 1), (1446, 9, 1));
        assert_eq!(tabular(2026, 2, 17), (1447, 8, 29));
        assert_eq!(tabular(2026, 2, 18), (1447, 9, 1));
        assert_eq!(tabular(2000, 1, 1), (1420, 9, 24));
    }

    #[test]
    fn test_tabular_epoch() {
        // 1 Muharram 1 AH = 19 July 622 proleptic Gregorian
        assert_eq!(tabular(622, 7, 19), (1, 1, 1));
        assert_eq!(tabular(622, 7, 18), (1, 1, 1));
    }

    #[test]
    fn test_tabular_round_trip() {
        for (y, m, d) in [(1445, 9, 1), (1445, 12, 30), (1447, 1, 1), (1, 1, 1), (1500, 6, 29)] {
            let h = HijriDate::new(y, m, d).unwrap();
            let g = hijri_to_gregorian(h).unwrap();
            assert_eq!(tabular_from_gregorian(g), h, "{}", h);
        }
        assert_eq!(hijri_to_gregorian(HijriDate::new(1445, 9, 1).unwrap()).unwrap(), date(2024, 3, 11));
    }

    #[test]
    fn test_hijri_to_gregorian_rejects_bad_day() {
        // 1446 is not a leap year, so Dhu al-Hijjah has 29 days
        let h = HijriDate { year: 1446, month: 12, day: 30 };
        assert!(hijri_to_gregorian(h).is_err());
        assert!(hijri_to_gregorian(HijriDate { year: 1446, month: 2, day: 30 }).is_err());
    }

    #[test]
    fn test_umm_al_qura_mid_month() {
        // Mid-month dates are robust to a one-day disagreement between calendars
        let h = to_hijri(date(2024, 3, 25), 0).unwrap();
        assert_eq!((h.year, h.month), (1445, 9));
        let h = to_hijri(date(2024, 6, 15), 0).unwrap();
        assert_eq!((h.year, h.month), (1445, 12));
        assert!((8..=10).contains(&h.day), "day {}", h.day);
    }

    #[test]
    fn test_adjustment_shifts_day() {
        let base = to_hijri(date(2024, 3, 25), 0).unwrap();
        let plus = to_hijri(date(2024, 3, 25), 1).unwrap();
        let minus = to_hijri(date(2024, 3, 25), -1).unwrap();
        assert_eq!(plus.day, base.day + 1);
        assert_eq!(minus.day, base.day - 1);
        assert_eq!(to_hijri(date(2024, 3, 26), 0).unwrap(), plus);
    }

    #[test]
    fn test_outside_table_uses_tabular() {
        let d = date(1900, 5, 1);
        assert_eq!(to_hijri(d, 0).unwrap(), tabular_from_gregorian(d));
        let d = date(2100, 5, 1);
        assert_eq!(to_hijri(d, 0).unwrap(), tabular_from_gregorian(d));
    }

    #[test]
    fn test_umm_al_qura_monotonic_and_valid() {
        let mut prev = to_hijri(date(2022, 12, 31), 0).unwrap();
        let mut d = date(2023, 1, 1);
        while d <= date(2026, 12, 31) {
            let h = to_hijri(d, 0).unwrap();
            assert!(h > prev, "{} -> {} at {}", prev, h, d);
            assert!((1..=30).contains(&h.day));
            if h.day == 1 {
                assert!(h.month == prev.month % 12 + 1, "month wrap at {}", d);
            } else {
                assert_eq!(h.day, prev.day + 1, "day step at {}", d);
            }
            prev = h;
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_white_days() {
        for day in 1..=30 {
            let h = HijriDate::new(1445, 5, day).unwrap();
            assert_eq!(h.is_white_day(), (13..=15).contains(&day), "day {}", day);
        }
    }

    #[test]
    fn test_predicates() {
        let h = HijriDate::new(1445, 9, 21).unwrap();
        assert!(h.is_ramadan() && h.is_last_ten_of_ramadan());
        assert!(!HijriDate::new(1445, 9, 20).unwrap().is_last_ten_of_ramadan());
        let h = HijriDate::new(1445, 12, 10).unwrap();
        assert!(h.is_dhul_hijjah() && h.is_first_ten_of_dhul_hijjah());
        assert!(!HijriDate::new(1445, 12, 11).unwrap().is_first_ten_of_dhul_hijjah());
        assert!(HijriDate::new(1446, 1, 1).unwrap().is_first_of_month());
    }

    #[test]
    fn test_month_names() {
        let h = HijriDate::new(1445, 9, 1).unwrap();
        assert_eq!(h.month_name(), "Ramadan");
        assert_eq!(h.month_name_ar(), "رمضان");
        assert_eq!(h.to_string(), "1 Ramadan 1445 AH");
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(HijriDate::new(1445, 13, 1).is_err());
        assert!(HijriDate::new(1445, 1, 0).is_err());
        assert!(HijriDate::new(1445, 1, 31).is_err());
    }

    #[test]
    fn test_weekday_flags_use_gregorian() {
        // 2024-03-15 was a Friday
        let d = date(2024, 3, 15);
        let flags = CalendarFlags::new(d, &HijriDate::new(1445, 9, 5).unwrap());
        assert!(flags.friday && flags.ramadan);
        assert!(!flags.thursday && !flags.monday && !flags.white_day);
        assert!(is_thursday(date(2024, 3, 14)));
        assert!(is_monday(date(2024, 3, 11)));
    }

    proptest! {
        #[test]
        fn prop_tabular_monotonic(days in 0i64..(365 * 600)) {
            let d = date(1700, 1, 1) + Duration::days(days);
            let today = tabular_from_gregorian(d);
            let tomorrow = tabular_from_gregorian(d + Duration::days(1));
            prop_assert!(tomorrow > today);
            if tomorrow.day == 1 {
                prop_assert_eq!(tomorrow.month, today.month % 12 + 1);
                if tomorrow.month == 1 {
                    prop_assert_eq!(tomorrow.year, today.year + 1);
                }
            } else {
                prop_assert_eq!(tomorrow.day, today.day + 1);
            }
        }
    }
}
