//! Persisted user settings at ~/.aqim/settings.json.
//!
//! Every field has a serde default, so files written by older versions (or
//! edited by hand down to a single key) still load.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::alerts::AlertPreferences;
use crate::error::Result;
use crate::hijri::HijriCalendar;
use crate::location::ResolvedLocation;
use crate::method::{AdjustmentSet, AsrSchool, CalculationConfig, CalculationMethod, HighLatitudeRule};
use crate::occasions::{CalendarReminderPreferences, OccasionPreferences};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Last known good location.
    pub location: Option<ResolvedLocation>,
    /// Method name as entered; unknown names fall back at use time.
    pub method: String,
    pub asr_school: AsrSchool,
    pub high_latitude_rule: HighLatitudeRule,
    pub adjustments: AdjustmentSet,
    pub hijri_calendar: HijriCalendar,
    pub hijri_adjustment: i64,
    pub alerts: AlertPreferences,
    pub occasions: OccasionPreferences,
    pub reminders: CalendarReminderPreferences,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location: None,
            method: CalculationMethod::default().name().to_string(),
            asr_school: AsrSchool::default(),
            high_latitude_rule: HighLatitudeRule::default(),
            adjustments: AdjustmentSet::default(),
            hijri_calendar: HijriCalendar::default(),
            hijri_adjustment: 0,
            alerts: AlertPreferences::default(),
            occasions: OccasionPreferences::default(),
            reminders: CalendarReminderPreferences::default(),
        }
    }
}

impl Settings {
    /// Load from the default path. A missing or unreadable file yields defaults.
    pub fn load() -> Self {
        let path = Self::default_path();
        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Self::default()
        })
    }

    /// Load from a specific path. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".aqim")
            .join("settings.json")
    }

    /// The stored method, falling back to the default for unknown names.
    pub fn calculation_method(&self) -> CalculationMethod {
        CalculationMethod::from_name_or_default(&self.method)
    }

    pub fn calculation_config(&self) -> CalculationConfig {
        CalculationConfig::new(self.calculation_method())
            .with_asr_school(self.asr_school)
            .with_high_latitude_rule(self.high_latitude_rule)
            .with_adjustments(self.adjustments)
    }
}
