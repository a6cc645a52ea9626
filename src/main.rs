use std::time::Duration as StdDuration;

use aqim::location::{self, parse_tz, LocationRequest, ResolvedLocation};
use aqim::method::{AdjustmentSet, AsrSchool, CalculationMethod, HighLatitudeRule};
use aqim::next::{HapticGuard, Proximity};
use aqim::prayer::DailyPrayerTimes;
use aqim::settings::Settings;
use aqim::solver::{self, next_prayer_across_days, render_ascii_timeline, render_status_line, Solver};
use aqim::Result;
use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use tracing::Level;

/// Aqim: prayer times, Qibla and Hijri calendar
///
/// Computes the day's prayer times, the Qibla bearing, the Hijri date and the
/// Islamic occasions for a built-in city or raw coordinates. Works offline.
///
/// Examples:
///   aqim Riyadh
///   aqim --city "Kuala Lumpur" --date 2025-03-01 --method Singapore
///   aqim --city Medina --country SA --now
///   aqim --lat 21.4225 --lon 39.8262 --tz Asia/Riyadh
///   aqim --watch
#[derive(Parser)]
#[command(name = "aqim", version, about, long_about = None)]
struct Cli {
    /// City name (positional). Example: aqim Cairo
    #[arg(index = 1)]
    city_positional: Option<String>,

    /// City name (named). Example: --city "New York"
    #[arg(long)]
    city: Option<String>,

    /// Country hint (name or ISO 3166-1 alpha-2, e.g. SA).
    #[arg(long)]
    country: Option<String>,

    /// Latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// IANA timezone override (e.g. Europe/Oslo).
    #[arg(long)]
    tz: Option<String>,

    /// Date (YYYY-MM-DD). Defaults to today at the location.
    #[arg(long, short = 'd')]
    date: Option<String>,

    /// Calculation method (e.g. UmmAlQura, MWL, ISNA, Egyptian).
    #[arg(long, short = 'm')]
    method: Option<String>,

    /// Asr school: shafi or hanafi.
    #[arg(long)]
    asr: Option<String>,

    /// High-latitude rule: middle, seventh or angle.
    #[arg(long = "high-lat", value_parser = clap::value_parser!(HighLatitudeRule))]
    high_lat: Option<HighLatitudeRule>,

    /// Minutes added to fajr.
    #[arg(long, allow_hyphen_values = true)]
    fajr_adjust: Option<i64>,

    /// Minutes added to isha.
    #[arg(long, allow_hyphen_values = true)]
    isha_adjust: Option<i64>,

    /// Days added before Hijri conversion (moon-sighting correction).
    #[arg(long, allow_hyphen_values = true)]
    hijri_adjust: Option<i64>,

    /// Device compass heading in degrees, for the Qibla needle.
    #[arg(long)]
    heading: Option<f64>,

    /// Show current prayer, time to next and planned alerts.
    #[arg(long)]
    now: bool,

    /// Live countdown to the next prayer until Ctrl+C.
    #[arg(long, short = 'w')]
    watch: bool,

    /// Persist the location and preferences used for this run.
    #[arg(long)]
    save: bool,

    /// List the built-in cities and exit.
    #[arg(long)]
    list_cities: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(if e.is_invalid_input() { 2 } else { 1 });
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list_cities {
        for c in location::city_list() {
            println!("{:<16} {:<4} {:>9.4} {:>10.4}  {}", c.name, c.country, c.lat, c.lon, c.tz);
        }
        return Ok(());
    }

    let stored = Settings::load();

    // ── Resolve location ────────────────────────────────────────

    let resolved = resolve_location(&cli, stored.location.as_ref())?;
    let tz = parse_tz(&resolved.tz)?;

    // ── Merge CLI overrides into the stored settings ────────────

    let settings = merge_settings(&cli, stored)?;

    // ── Parse date ──────────────────────────────────────────────

    let date = match &cli.date {
        Some(d) => solver::parse_date(d)?,
        None => Utc::now().with_timezone(&tz).date_naive(),
    };

    // ── Solve ───────────────────────────────────────────────────

    let solver = Solver::from_settings(resolved.clone(), &settings)?.with_heading(cli.heading);
    let now = (cli.now || cli.watch).then(Utc::now);
    let output = solver.solve(date, now)?;

    eprintln!("  {}", resolved.display_line());
    eprintln!("  \u{1F319} {} ({} {})", output.hijri.formatted, output.hijri.day, output.hijri.month_name_ar);
    if output.qibla.degenerate {
        eprintln!("  \u{1F54B} Qibla: you are at the Kaaba");
    } else {
        eprintln!(
            "  \u{1F54B} Qibla: {:.2}\u{00B0} {} ({:.0} km)",
            output.qibla.bearing, output.qibla.compass, output.qibla.distance_km
        );
    }
    for o in &output.occasions.today {
        eprintln!("  \u{2728} {} / {}: {}", o.name_en, o.name, o.message);
    }
    for o in &output.occasions.tomorrow {
        eprintln!("  \u{23F0} Tomorrow: {} / {}", o.name_en, o.name);
    }

    // ASCII timeline to stderr
    eprint!("{}", render_ascii_timeline(&output.events, output.state));

    // JSON to stdout
    println!("{}", serde_json::to_string_pretty(&output)?);

    // Only reached when everything above succeeded, so bad input never overwrites good settings
    if cli.save {
        let to_save = Settings { location: Some(resolved), ..settings };
        to_save.save()?;
        eprintln!("  Settings saved to {}", Settings::default_path().display());
    }

    if cli.watch {
        watch(&solver).await?;
    }

    Ok(())
}

fn resolve_location(cli: &Cli, last_known: Option<&ResolvedLocation>) -> Result<ResolvedLocation> {
    // Priority: --lat/--lon > --city > positional city > saved location > Makkah
    let city = cli.city.clone().or_else(|| cli.city_positional.clone());
    let city = match (city, &cli.country) {
        (Some(c), Some(cc)) => Some(format!("{}, {}", c, cc)),
        (c, _) => c,
    };
    let request = LocationRequest {
        city,
        latitude: cli.lat,
        longitude: cli.lon,
        tz: cli.tz.clone(),
    };
    location::resolve(&request, last_known)
}

fn merge_settings(cli: &Cli, mut settings: Settings) -> Result<Settings> {
    // Explicit flags are validated strictly; only stored names fall back silently
    if let Some(m) = &cli.method {
        settings.method = m.parse::<CalculationMethod>()?.name().to_string();
    }
    if let Some(a) = &cli.asr {
        settings.asr_school = a.parse::<AsrSchool>()?;
    }
    if let Some(rule) = cli.high_lat {
        settings.high_latitude_rule = rule;
    }
    settings.adjustments = AdjustmentSet {
        fajr: cli.fajr_adjust.unwrap_or(settings.adjustments.fajr),
        isha: cli.isha_adjust.unwrap_or(settings.adjustments.isha),
    };
    if let Some(h) = cli.hijri_adjust {
        settings.hijri_adjustment = h;
    }
    Ok(settings)
}

/// Countdown loop. Times are recomputed only when the local date changes.
async fn watch(solver: &Solver) -> Result<()> {
    let mut ticker = tokio::time::interval(StdDuration::from_secs(1));
    let mut guard = HapticGuard::default();
    let mut days: Option<(NaiveDate, DailyPrayerTimes, DailyPrayerTimes)> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let local = solver.local_date(now);
                if days.as_ref().map(|(d, _, _)| *d) != Some(local) {
                    tracing::debug!(date = %local, "computing times for new day");
                    let today = solver.times_for(local)?;
                    let tomorrow = solver.times_for(local + Duration::days(1))?;
                    days = Some((local, today, tomorrow));
                }
                let Some((_, today, tomorrow)) = &days else { continue };

                let next = next_prayer_across_days(today, tomorrow, now);
                if guard.observe(Proximity::of(&next)) {
                    eprint!("\x07");
                }
                eprint!("\r  {}    ", render_status_line(&next));
            }
            _ = &mut ctrl_c => {
                eprintln!();
                break;
            }
        }
    }
    Ok(())
}
