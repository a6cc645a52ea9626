//! The Solver: caller-side facade for Aqim.
//!
//! Composes prayer times, next-prayer resolution, Qibla, Hijri date, occasions
//! and alerts into one serializable report, plus an ASCII timeline.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::alerts::{self, AlertKind, AlertMode, AlertPreferences, PrayerAlert};
use crate::error::{Error, Result};
use crate::hijri::{self, CalendarFlags, HijriCalendar, HijriDate};
use crate::location::{format_coords, parse_tz, GeoCoordinate, LocationSource, ResolvedLocation};
use crate::method::{AsrSchool, CalculationConfig, HighLatitudeRule};
use crate::next::{self, NextPrayer, Proximity};
use crate::occasions::{
    self, CalendarReminder, CalendarReminderPreferences, IslamicOccasion, OccasionPreferences, ISLAMIC_OCCASIONS,
};
use crate::prayer::{self, DailyPrayerTimes, DayState, EventMethod, Prayer};
use crate::qibla;
use crate::solar;
use crate::settings::Settings;

/// Full solver output.
#[derive(Debug, Clone, Serialize)]
pub struct SolverOutput {
    pub location: LocationInfo,
    pub date: String,
    pub method: String,
    pub asr_school: AsrSchool,
    pub high_latitude_rule: HighLatitudeRule,
    pub state: DayState,
    /// True when any event is projected or virtual.
    pub approximate: bool,
    pub events: Events,
    pub solar: SolarInfo,
    pub hijri: HijriInfo,
    pub calendar: CalendarFlags,
    pub qibla: QiblaInfo,
    pub occasions: OccasionInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<AlertInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationInfo {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub tz_label: String,
    pub source: LocationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    pub formatted_coords: String,
}

/// One checkpoint as local wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrayerEvent {
    /// `HH:MM` in the location's timezone.
    pub time: String,
    pub method: EventMethod,
    /// Days relative to the report date; non-zero only when a bounded
    /// twilight spills across local midnight.
    #[serde(skip_serializing_if = "is_zero")]
    pub day_offset: i64,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Events {
    pub fajr: PrayerEvent,
    pub sunrise: PrayerEvent,
    pub dhuhr: PrayerEvent,
    pub asr: PrayerEvent,
    pub maghrib: PrayerEvent,
    pub isha: PrayerEvent,
}

impl Events {
    fn from_times(times: &DailyPrayerTimes) -> Self {
        let event = |prayer: Prayer, at: DateTime<Tz>| PrayerEvent {
            time: hh_mm(&at),
            method: times.method_for(prayer).unwrap_or(EventMethod::Standard),
            day_offset: (at.date_naive() - times.date).num_days(),
        };
        Self {
            fajr: event(Prayer::Fajr, times.fajr),
            sunrise: event(Prayer::Sunrise, times.sunrise),
            dhuhr: event(Prayer::Dhuhr, times.dhuhr),
            asr: event(Prayer::Asr, times.asr),
            maghrib: event(Prayer::Maghrib, times.maghrib),
            isha: event(Prayer::Isha, times.isha),
        }
    }

    fn items(&self) -> [(Prayer, &PrayerEvent); 6] {
        [
            (Prayer::Fajr, &self.fajr),
            (Prayer::Sunrise, &self.sunrise),
            (Prayer::Dhuhr, &self.dhuhr),
            (Prayer::Asr, &self.asr),
            (Prayer::Maghrib, &self.maghrib),
            (Prayer::Isha, &self.isha),
        ]
    }
}

/// Sun geometry at dhuhr.
#[derive(Debug, Clone, Serialize)]
pub struct SolarInfo {
    pub declination: f64,
    /// Minutes.
    pub equation_of_time: f64,
    pub noon_altitude: f64,
    pub noon_azimuth: f64,
}

impl SolarInfo {
    fn at_dhuhr(times: &DailyPrayerTimes, coord: GeoCoordinate) -> Self {
        let noon = times.dhuhr.with_timezone(&Utc).naive_utc();
        let pos = solar::solar_position(&noon, coord.latitude, coord.longitude);
        let round2 = |v: f64| (v * 100.0).round() / 100.0;
        Self {
            declination: round2(pos.declination),
            equation_of_time: round2(pos.equation_of_time),
            noon_altitude: round2(pos.altitude),
            noon_azimuth: round2(pos.azimuth),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HijriInfo {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub month_name: &'static str,
    pub month_name_ar: &'static str,
    pub formatted: String,
    pub calendar: HijriCalendar,
    pub adjustment_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QiblaInfo {
    pub bearing: f64,
    pub compass: &'static str,
    pub distance_km: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degenerate: bool,
    /// Needle angle relative to the device heading, or to true north without one.
    pub needle_rotation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OccasionEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub name_en: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderEntry {
    pub reminder: CalendarReminder,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OccasionInfo {
    pub today: Vec<OccasionEntry>,
    pub tomorrow: Vec<OccasionEntry>,
    pub reminders: Vec<ReminderEntry>,
}

/// Current prayer state (--now mode).
#[derive(Debug, Clone, Serialize)]
pub struct CurrentState {
    pub prayer: Prayer,
    pub next: Prayer,
    pub next_at: String,
    /// The next checkpoint is tomorrow's fajr.
    pub next_is_tomorrow: bool,
    pub remaining_seconds: i64,
    pub countdown: String,
    pub proximity: Proximity,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertInfo {
    pub prayer: Prayer,
    pub kind: AlertKind,
    pub at: String,
    pub mode: AlertMode,
    pub message: String,
    pub tag: String,
}

impl From<&PrayerAlert> for AlertInfo {
    fn from(a: &PrayerAlert) -> Self {
        Self {
            prayer: a.prayer,
            kind: a.kind,
            at: a.at.to_rfc3339(),
            mode: a.mode,
            message: a.message.clone(),
            tag: a.tag.clone(),
        }
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| Error::InvalidDate {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Next prayer, looking into tomorrow once today's isha has passed.
///
/// After isha the result is tomorrow's fajr with `current` still isha.
pub fn next_prayer_across_days(today: &DailyPrayerTimes, tomorrow: &DailyPrayerTimes, now: DateTime<Utc>) -> NextPrayer {
    let next = next::resolve(today, now);
    if next.prayer != Prayer::None {
        return next;
    }
    let rolled = next::resolve(tomorrow, now);
    NextPrayer { current: next.current, ..rolled }
}

fn hh_mm(t: &DateTime<Tz>) -> String {
    t.format("%H:%M").to_string()
}

/// The Solver.
pub struct Solver {
    location: ResolvedLocation,
    tz: Tz,
    config: CalculationConfig,
    hijri_calendar: HijriCalendar,
    hijri_adjustment: i64,
    heading: Option<f64>,
    alerts: AlertPreferences,
    occasions: OccasionPreferences,
    reminders: CalendarReminderPreferences,
}

impl Solver {
    pub fn new(location: ResolvedLocation, config: CalculationConfig) -> Result<Self> {
        let tz = parse_tz(&location.tz)?;
        Ok(Self {
            location,
            tz,
            config,
            hijri_calendar: HijriCalendar::default(),
            hijri_adjustment: 0,
            heading: None,
            alerts: AlertPreferences::default(),
            occasions: OccasionPreferences::default(),
            reminders: CalendarReminderPreferences::default(),
        })
    }

    /// Create a solver carrying every preference from `settings`.
    pub fn from_settings(location: ResolvedLocation, settings: &Settings) -> Result<Self> {
        Ok(Self::new(location, settings.calculation_config())?
            .with_hijri(settings.hijri_calendar, settings.hijri_adjustment)
            .with_preferences(settings.alerts, settings.occasions, settings.reminders))
    }

    pub fn with_hijri(mut self, calendar: HijriCalendar, adjustment_days: i64) -> Self {
        self.hijri_calendar = calendar;
        self.hijri_adjustment = adjustment_days;
        self
    }

    /// Device compass heading, for the Qibla needle.
    pub fn with_heading(mut self, heading: Option<f64>) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_preferences(
        mut self,
        alerts: AlertPreferences,
        occasions: OccasionPreferences,
        reminders: CalendarReminderPreferences,
    ) -> Self {
        self.alerts = alerts;
        self.occasions = occasions;
        self.reminders = reminders;
        self
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn times_for(&self, date: NaiveDate) -> Result<DailyPrayerTimes> {
        prayer::compute(self.location.coord, date, self.tz, &self.config)
    }

    /// Today's local date at `now`, in the location's timezone.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// Next prayer at `now`, rolling over to tomorrow after isha.
    pub fn next_prayer(&self, now: DateTime<Utc>) -> Result<NextPrayer> {
        let today = self.times_for(self.local_date(now))?;
        let next = next::resolve(&today, now);
        if next.prayer != Prayer::None {
            return Ok(next);
        }
        let tomorrow = self.times_for(today.date + Duration::days(1))?;
        Ok(next_prayer_across_days(&today, &tomorrow, now))
    }

    /// Alerts to arm at `now`, across today and tomorrow.
    pub fn plan_alerts(&self, now: DateTime<Utc>) -> Result<Vec<PrayerAlert>> {
        let today = self.times_for(self.local_date(now))?;
        let tomorrow = self.times_for(today.date + Duration::days(1))?;
        let mut planned = alerts::plan_prayer_alerts(&today, now, &self.alerts);
        planned.extend(alerts::plan_prayer_alerts(&tomorrow, now, &self.alerts));
        planned.sort_by_key(|a| a.at);
        Ok(planned)
    }

    /// Solve one date. With `now`, the report also carries the live state and planned alerts.
    pub fn solve(&self, date: NaiveDate, now: Option<DateTime<Utc>>) -> Result<SolverOutput> {
        let times = self.times_for(date)?;
        let hijri = hijri::to_hijri_with(self.hijri_calendar, date, self.hijri_adjustment)?;

        let (current, alerts) = match now {
            Some(now) => {
                let next = self.next_prayer(now)?;
                let current = next.at.map(|at| CurrentState {
                    prayer: next.current,
                    next: next.prayer,
                    next_at: hh_mm(&at),
                    next_is_tomorrow: at.date_naive() > self.local_date(now),
                    remaining_seconds: next.remaining.num_seconds(),
                    countdown: next::countdown(&next),
                    proximity: Proximity::from_remaining(next.remaining),
                });
                let alerts = self.plan_alerts(now)?.iter().map(AlertInfo::from).collect();
                (current, alerts)
            }
            None => (None, Vec::new()),
        };

        Ok(SolverOutput {
            location: self.location_info(),
            date: date.to_string(),
            method: self.config.params.method.name().to_string(),
            asr_school: self.config.asr_school,
            high_latitude_rule: self.config.high_latitude_rule,
            state: times.day_state,
            approximate: times.is_approximate(),
            events: Events::from_times(&times),
            solar: SolarInfo::at_dhuhr(&times, self.location.coord),
            hijri: self.hijri_info(&hijri),
            calendar: CalendarFlags::new(date, &hijri),
            qibla: self.qibla_info(),
            occasions: self.occasion_info(date, &hijri)?,
            current,
            alerts,
        })
    }

    fn location_info(&self) -> LocationInfo {
        let r = &self.location;
        LocationInfo {
            name: r.name.clone(),
            latitude: r.coord.latitude,
            longitude: r.coord.longitude,
            timezone: self.tz.to_string(),
            tz_label: format!("{} (Local Time)", self.tz),
            source: r.source,
            country_code: r.country_code.clone(),
            formatted_coords: format_coords(r.coord.latitude, r.coord.longitude),
        }
    }

    fn hijri_info(&self, hijri: &HijriDate) -> HijriInfo {
        HijriInfo {
            year: hijri.year,
            month: hijri.month,
            day: hijri.day,
            month_name: hijri.month_name(),
            month_name_ar: hijri.month_name_ar(),
            formatted: hijri.to_string(),
            calendar: self.hijri_calendar,
            adjustment_days: self.hijri_adjustment,
        }
    }

    fn qibla_info(&self) -> QiblaInfo {
        let coord = self.location.coord;
        let bearing = qibla::compute_bearing(coord);
        QiblaInfo {
            bearing: (bearing.degrees * 100.0).round() / 100.0,
            compass: bearing.compass_point(),
            distance_km: qibla::distance_km(coord).round(),
            degenerate: bearing.degenerate,
            needle_rotation: (qibla::needle_rotation(bearing.degrees, self.heading) * 100.0).round() / 100.0,
        }
    }

    fn occasion_info(&self, date: NaiveDate, hijri: &HijriDate) -> Result<OccasionInfo> {
        let tomorrow_date = date + Duration::days(1);
        let tomorrow = hijri::to_hijri_with(self.hijri_calendar, tomorrow_date, self.hijri_adjustment)?;
        let seed = date.num_days_from_ce() as u64;

        let entry = |o: &IslamicOccasion| OccasionEntry {
            id: o.id,
            name: o.name,
            name_en: o.name_en,
            message: occasions::pick_message(o.messages, seed).unwrap_or_default(),
        };

        let matches = occasions::match_occasions(hijri, &tomorrow, ISLAMIC_OCCASIONS).filter(&self.occasions);
        let reminders = occasions::calendar_reminders(date, hijri, &tomorrow, &self.reminders)
            .into_iter()
            .map(|reminder| ReminderEntry {
                reminder,
                message: occasions::pick_message(reminder.messages(), seed).unwrap_or_default(),
            })
            .collect();

        Ok(OccasionInfo {
            today: matches.fire_today.into_iter().map(&entry).collect(),
            tomorrow: matches.remind_tomorrow.into_iter().map(&entry).collect(),
            reminders,
        })
    }
}

// ─── ASCII Visualization ────────────────────────────────────────

fn minute_of_day(hhmm: &str) -> u32 {
    let mut parts = hhmm.split(':').map(|p| p.parse::<u32>().unwrap_or(0));
    let h = parts.next().unwrap_or(0);
    let m = parts.next().unwrap_or(0);
    h * 60 + m
}

pub fn render_ascii_timeline(events: &Events, state: DayState) -> String {
    let mut out = String::new();

    out.push_str(&format!("  Solar Day: {}\n", state));
    out.push_str("  ╔══════════════════════════════════════════════════════════════╗\n");

    // Timeline bar (60 chars = 24 hours)
    let bar_width = 60;
    let items = events.items();
    let markers: Vec<(usize, &str)> = items
        .iter()
        .map(|(prayer, event)| {
            let pos = (minute_of_day(&event.time) as usize * bar_width) / (24 * 60);
            (pos.min(bar_width - 1), prayer.name())
        })
        .collect();

    let mut bar = vec!['─'; bar_width];
    let mut label_line = vec![' '; bar_width];
    for (pos, name) in &markers {
        bar[*pos] = '│';
        label_line[*pos] = name.chars().next().unwrap_or('?');
    }
    out.push_str("  ║ ");
    out.push_str(&bar.iter().collect::<String>());
    out.push_str(" ║\n");
    out.push_str("  ║ ");
    out.push_str(&label_line.iter().collect::<String>());
    out.push_str(" ║\n");

    out.push_str("  ╠══════════════════════════════════════════════════════════════╣\n");

    for (prayer, event) in items {
        let time_str = match event.day_offset {
            0 => event.time.clone(),
            d => format!("{} ({:+}d)", event.time, d),
        };
        let method_tag = match event.method {
            EventMethod::Standard => "",
            EventMethod::Virtual => " [V]",
            EventMethod::Projected => " [P]",
        };
        let line = format!("  ║  {:<8} {}{}", prayer.name(), time_str, method_tag);
        out.push_str(&line);
        // Pad to the right border; the prefix "  ║" is 3 columns wide
        let used = line.chars().count();
        out.push_str(&" ".repeat(66usize.saturating_sub(used).max(1)));
        out.push_str("║\n");
    }

    out.push_str("  ╚══════════════════════════════════════════════════════════════╝\n");
    out.push_str("  00:00          06:00          12:00          18:00       23:59\n");

    out
}

/// One-line live status for --watch.
pub fn render_status_line(next: &NextPrayer) -> String {
    match (next.at, Proximity::of(next)) {
        (Some(at), Some(tier)) => format!(
            "{} → {} at {} in {} [{}]",
            next.current,
            next.prayer,
            hh_mm(&at),
            next::countdown(next),
            tier
        ),
        _ => format!("{} → {}", next.current, next::countdown(next)),
    }
}
