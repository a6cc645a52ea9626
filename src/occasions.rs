//! Hijri occasion matching and calendar reminders.
//!
//! Everything here is a pure function of already-converted dates: deciding
//! *which* occasion or reminder applies. Delivering it is the caller's job.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::hijri::{self, HijriDate};

/// Grouping used by the per-category notification toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccasionCategory {
    Ramadan,
    Eid,
    DhulHijjah,
    Ashura,
    NewYear,
}

/// A fixed (Hijri month, day) occasion with its message pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IslamicOccasion {
    pub id: &'static str,
    pub name: &'static str,
    pub name_en: &'static str,
    pub hijri_month: u32,
    pub hijri_day: u32,
    /// Never empty.
    pub messages: &'static [&'static str],
    /// Also announce on the day before.
    pub reminder_before: bool,
    pub category: OccasionCategory,
}

impl IslamicOccasion {
    fn falls_on(&self, date: &HijriDate) -> bool {
        date.month == self.hijri_month && date.day == self.hijri_day
    }
}

const RAMADAN_START: &[&str] = &[
    "رمضان كريم 🌙 تقبّل الله طاعاتكم",
    "دخل شهر الرحمة… نية جديدة وبداية مباركة",
];

const LAYLATUL_QADR: &[&str] = &[
    "ليلة القدر… خيرٌ من ألف شهر 🌌",
    "اللهم إنك عفو تحب العفو فاعفُ عنا",
];

const EID_FITR: &[&str] = &[
    "عيدكم مبارك 🤍 تقبّل الله صيامكم",
    "لا تنس زكاة الفطر قبل الصلاة",
];

const DHUL_HIJJAH: &[&str] = &[
    "دخلت عشر ذي الحجة… أيام عظيمة 🕋",
    "أكثروا من الذكر في هذه الأيام المباركة",
];

const ARAFA: &[&str] = &[
    "يوم عرفة… دعاء لا يُرد 🤲",
    "صيام يوم عرفة يكفّر سنتين",
];

const EID_ADHA: &[&str] = &[
    "عيدكم مبارك 🤍 تقبّل الله طاعاتكم",
    "سنّة الأضحية… تقبّل الله منكم",
];

const ASHURA: &[&str] = &[
    "غدًا عاشوراء… صيام يكفّر سنة",
    "لا تنس صيام تاسوعاء مع عاشوراء",
];

const NEW_HIJRI_YEAR: &[&str] = &[
    "عام هجري جديد… نية جديدة 🌙",
    "كل عام وأنتم بخير",
];

const fn occasion(
    id: &'static str,
    name: &'static str,
    name_en: &'static str,
    (hijri_month, hijri_day): (u32, u32),
    messages: &'static [&'static str],
    reminder_before: bool,
    category: OccasionCategory,
) -> IslamicOccasion {
    IslamicOccasion { id, name, name_en, hijri_month, hijri_day, messages, reminder_before, category }
}

/// The built-in occasion table, in announcement order.
pub const ISLAMIC_OCCASIONS: &[IslamicOccasion] = &[
    occasion("ramadan_start", "بداية رمضان", "Start of Ramadan", (9, 1), RAMADAN_START, true, OccasionCategory::Ramadan),
    occasion("laylatul_qadr_21", "ليلة 21 رمضان", "Night of 21 Ramadan", (9, 21), LAYLATUL_QADR, false, OccasionCategory::Ramadan),
    occasion("laylatul_qadr_23", "ليلة 23 رمضان", "Night of 23 Ramadan", (9, 23), LAYLATUL_QADR, false, OccasionCategory::Ramadan),
    occasion("laylatul_qadr_25", "ليلة 25 رمضان", "Night of 25 Ramadan", (9, 25), LAYLATUL_QADR, false, OccasionCategory::Ramadan),
    occasion("laylatul_qadr_27", "ليلة 27 رمضان", "Night of 27 Ramadan", (9, 27), LAYLATUL_QADR, false, OccasionCategory::Ramadan),
    occasion("laylatul_qadr_29", "ليلة 29 رمضان", "Night of 29 Ramadan", (9, 29), LAYLATUL_QADR, false, OccasionCategory::Ramadan),
    occasion("eid_fitr", "عيد الفطر", "Eid al-Fitr", (10, 1), EID_FITR, true, OccasionCategory::Eid),
    occasion("dhul_hijjah_start", "بداية عشر ذي الحجة", "First ten days of Dhu al-Hijjah", (12, 1), DHUL_HIJJAH, false, OccasionCategory::DhulHijjah),
    occasion("arafa", "يوم عرفة", "Day of Arafah", (12, 9), ARAFA, true, OccasionCategory::DhulHijjah),
    occasion("eid_adha", "عيد الأضحى", "Eid al-Adha", (12, 10), EID_ADHA, true, OccasionCategory::Eid),
    occasion("ashura", "عاشوراء", "Ashura", (1, 10), ASHURA, true, OccasionCategory::Ashura),
    occasion("new_hijri_year", "رأس السنة الهجرية", "Islamic New Year", (1, 1), NEW_HIJRI_YEAR, false, OccasionCategory::NewYear),
];

/// Occasions to announce today, and reminders for tomorrow's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OccasionMatches<'a> {
    pub fire_today: Vec<&'a IslamicOccasion>,
    pub remind_tomorrow: Vec<&'a IslamicOccasion>,
}

impl<'a> OccasionMatches<'a> {
    pub fn is_empty(&self) -> bool {
        self.fire_today.is_empty() && self.remind_tomorrow.is_empty()
    }

    /// Drop everything the user switched off.
    pub fn filter(mut self, prefs: &OccasionPreferences) -> Self {
        self.fire_today.retain(|o| prefs.allows(o.category));
        self.remind_tomorrow.retain(|o| prefs.reminder_before && prefs.allows(o.category));
        self
    }
}

/// Match `today` and `tomorrow` against `table`, preserving table order.
///
/// Entries sharing a (month, day) are all reported.
pub fn match_occasions<'a>(today: &HijriDate, tomorrow: &HijriDate, table: &'a [IslamicOccasion]) -> OccasionMatches<'a> {
    OccasionMatches {
        fire_today: table.iter().filter(|o| o.falls_on(today)).collect(),
        remind_tomorrow: table
            .iter()
            .filter(|o| o.reminder_before && o.falls_on(tomorrow))
            .collect(),
    }
}

/// Deterministic pick from a message pool; the caller supplies the seed
/// (for example the day's ordinal) so repeated calls agree.
pub fn pick_message(pool: &[&'static str], seed: u64) -> Option<&'static str> {
    if pool.is_empty() {
        return None;
    }
    Some(pool[(seed % pool.len() as u64) as usize])
}

/// Per-category switches for occasion notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccasionPreferences {
    pub enabled: bool,
    pub ramadan: bool,
    pub eid: bool,
    pub dhul_hijjah: bool,
    pub ashura: bool,
    pub new_year: bool,
    pub reminder_before: bool,
}

impl Default for OccasionPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            ramadan: true,
            eid: true,
            dhul_hijjah: true,
            ashura: true,
            new_year: true,
            reminder_before: true,
        }
    }
}

impl OccasionPreferences {
    pub fn allows(&self, category: OccasionCategory) -> bool {
        self.enabled
            && match category {
                OccasionCategory::Ramadan => self.ramadan,
                OccasionCategory::Eid => self.eid,
                OccasionCategory::DhulHijjah => self.dhul_hijjah,
                OccasionCategory::Ashura => self.ashura,
                OccasionCategory::NewYear => self.new_year,
            }
    }
}

// ─── Calendar reminders ─────────────────────────────────────────

const NEW_HIJRI_MONTH: &[&str] = &[
    "دخل شهر هجري جديد… نية جديدة وبداية مباركة 🌙",
    "شهر جديد… فرصة جديدة للطاعة",
];

const WHITE_DAYS: &[&str] = &[
    "غدًا من الأيام البيض 🌕 فرصة صيام",
    "الأيام البيض… صيام يعدل صيام الدهر",
];

const FRIDAY: &[&str] = &[
    "الجمعة… لا تنس سورة الكهف 📖",
    "ليلة الجمعة… أكثروا من الصلاة على النبي ﷺ",
    "ساعة استجابة اليوم… أكثر من الدعاء 🤲",
    "جمعة مباركة 🤍",
];

const MONDAY_THURSDAY: &[&str] = &[
    "غدًا الاثنين… تُرفع الأعمال",
    "الخميس… صيام وذكر",
];

/// Recurring reminders driven by the calendar rather than a fixed occasion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CalendarReminder {
    /// Today is the first of a Hijri month.
    NewHijriMonth,
    /// Tomorrow is the 13th, the first white day.
    WhiteDaysTomorrow,
    Friday,
    /// Tomorrow is a Monday or Thursday, the sunnah fasting days.
    FastTomorrow(Weekday),
}

impl CalendarReminder {
    pub fn messages(&self) -> &'static [&'static str] {
        match self {
            Self::NewHijriMonth => NEW_HIJRI_MONTH,
            Self::WhiteDaysTomorrow => WHITE_DAYS,
            Self::Friday => FRIDAY,
            Self::FastTomorrow(_) => MONDAY_THURSDAY,
        }
    }
}

/// Switches for the weekly and monthly reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarReminderPreferences {
    pub weekly: bool,
    pub friday: bool,
    pub monday_thursday: bool,
    pub monthly: bool,
    pub new_hijri_month: bool,
    pub white_days: bool,
}

impl Default for CalendarReminderPreferences {
    fn default() -> Self {
        Self {
            weekly: true,
            friday: true,
            monday_thursday: false,
            monthly: true,
            new_hijri_month: true,
            white_days: true,
        }
    }
}

/// Reminders due on Gregorian `date`, whose Hijri dates are `today`/`tomorrow`.
pub fn calendar_reminders(
    date: NaiveDate,
    today: &HijriDate,
    tomorrow: &HijriDate,
    prefs: &CalendarReminderPreferences,
) -> Vec<CalendarReminder> {
    let mut out = Vec::new();
    if prefs.monthly {
        if prefs.new_hijri_month && today.is_first_of_month() {
            out.push(CalendarReminder::NewHijriMonth);
        }
        if prefs.white_days && tomorrow.day == 13 {
            out.push(CalendarReminder::WhiteDaysTomorrow);
        }
    }
    if prefs.weekly {
        if prefs.friday && hijri::is_friday(date) {
            out.push(CalendarReminder::Friday);
        }
        if prefs.monday_thursday {
            if let Some(next) = date.succ_opt() {
                if hijri::is_monday(next) || hijri::is_thursday(next) {
                    out.push(CalendarReminder::FastTomorrow(next.weekday()));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(month: u32, day: u32) -> HijriDate {
        HijriDate::new(1445, month, day).unwrap()
    }

    fn ids(list: &[&IslamicOccasion]) -> Vec<&'static str> {
        list.iter().map(|o| o.id).collect()
    }

    #[test]
    fn test_table_shape() {
        assert_eq!(ISLAMIC_OCCASIONS.len(), 12);
        for o in ISLAMIC_OCCASIONS {
            assert!(!o.messages.is_empty(), "{}", o.id);
            assert!(HijriDate::new(1445, o.hijri_month, o.hijri_day).is_ok(), "{}", o.id);
        }
    }

    #[test]
    fn test_ramadan_start_fires_today() {
        let m = match_occasions(&h(9, 1), &h(9, 2), ISLAMIC_OCCASIONS);
        assert_eq!(ids(&m.fire_today), vec!["ramadan_start"]);
        assert!(m.remind_tomorrow.is_empty());
    }

    #[test]
    fn test_arafa_reminder_tomorrow() {
        let m = match_occasions(&h(12, 8), &h(12, 9), ISLAMIC_OCCASIONS);
        assert!(m.fire_today.is_empty());
        assert_eq!(ids(&m.remind_tomorrow), vec!["arafa"]);
    }

    #[test]
    fn test_no_reminder_without_flag() {
        let table = [IslamicOccasion { reminder_before: false, ..ISLAMIC_OCCASIONS[8] }];
        assert_eq!(table[0].id, "arafa");
        let m = match_occasions(&h(12, 8), &h(12, 9), &table);
        assert!(m.remind_tomorrow.is_empty());
        // Laylat al-Qadr nights never get a day-before reminder
        let m = match_occasions(&h(9, 26), &h(9, 27), ISLAMIC_OCCASIONS);
        assert!(m.remind_tomorrow.is_empty());
    }

    #[test]
    fn test_same_day_and_eve() {
        // 9 Dhu al-Hijjah: Arafah today, Eid al-Adha tomorrow
        let m = match_occasions(&h(12, 9), &h(12, 10), ISLAMIC_OCCASIONS);
        assert_eq!(ids(&m.fire_today), vec!["arafa"]);
        assert_eq!(ids(&m.remind_tomorrow), vec!["eid_adha"]);
    }

    #[test]
    fn test_duplicates_not_merged() {
        let dup = [ISLAMIC_OCCASIONS[1], ISLAMIC_OCCASIONS[1]];
        let m = match_occasions(&h(9, 21), &h(9, 22), &dup);
        assert_eq!(m.fire_today.len(), 2);
    }

    #[test]
    fn test_new_year_and_ashura_eve() {
        let m = match_occasions(&h(1, 1), &h(1, 2), ISLAMIC_OCCASIONS);
        assert_eq!(ids(&m.fire_today), vec!["new_hijri_year"]);
        let m = match_occasions(&h(1, 9), &h(1, 10), ISLAMIC_OCCASIONS);
        assert_eq!(ids(&m.remind_tomorrow), vec!["ashura"]);
    }

    #[test]
    fn test_preferences_filter() {
        let m = match_occasions(&h(12, 9), &h(12, 10), ISLAMIC_OCCASIONS);
        let prefs = OccasionPreferences { eid: false, ..Default::default() };
        let f = m.clone().filter(&prefs);
        assert_eq!(ids(&f.fire_today), vec!["arafa"]);
        assert!(f.remind_tomorrow.is_empty());

        let prefs = OccasionPreferences { reminder_before: false, ..Default::default() };
        let f = m.clone().filter(&prefs);
        assert_eq!(f.fire_today.len(), 1);
        assert!(f.remind_tomorrow.is_empty());

        let off = OccasionPreferences { enabled: false, ..Default::default() };
        assert!(m.filter(&off).is_empty());
    }

    #[test]
    fn test_pick_message_deterministic() {
        let pool = ISLAMIC_OCCASIONS[0].messages;
        assert_eq!(pick_message(pool, 0), Some(pool[0]));
        assert_eq!(pick_message(pool, 3), Some(pool[1]));
        assert_eq!(pick_message(pool, 7), pick_message(pool, 7));
        assert_eq!(pick_message(&[], 1), None);
    }

    #[test]
    fn test_calendar_reminders() {
        let prefs = CalendarReminderPreferences { monday_thursday: true, ..Default::default() };
        // 2024-03-10 was a Sunday; tomorrow is Monday
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let r = calendar_reminders(sunday, &h(9, 1), &h(9, 2), &prefs);
        assert_eq!(r, vec![CalendarReminder::NewHijriMonth, CalendarReminder::FastTomorrow(Weekday::Mon)]);

        let friday = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let r = calendar_reminders(friday, &h(9, 12), &h(9, 13), &prefs);
        assert_eq!(r, vec![CalendarReminder::WhiteDaysTomorrow, CalendarReminder::Friday]);
    }

    #[test]
    fn test_calendar_reminders_defaults_skip_fasting_days() {
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let r = calendar_reminders(sunday, &h(9, 2), &h(9, 3), &CalendarReminderPreferences::default());
        assert!(r.is_empty());
        let off = CalendarReminderPreferences { monthly: false, ..Default::default() };
        assert!(calendar_reminders(sunday, &h(9, 1), &h(9, 2), &off).is_empty());
    }

    #[test]
    fn test_reminder_messages_non_empty() {
        for r in [
            CalendarReminder::NewHijriMonth,
            CalendarReminder::WhiteDaysTomorrow,
            CalendarReminder::Friday,
            CalendarReminder::FastTomorrow(Weekday::Thu),
        ] {
            assert!(!r.messages().is_empty());
        }
    }
}
