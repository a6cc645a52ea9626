//! Calculation conventions: named method presets, Asr juristic school and
//! high-latitude rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Named calculation convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationMethod {
    MuslimWorldLeague,
    Egyptian,
    Karachi,
    UmmAlQura,
    Dubai,
    MoonsightingCommittee,
    NorthAmerica,
    Kuwait,
    Qatar,
    Singapore,
    Tehran,
    Turkey,
}

impl Default for CalculationMethod {
    fn default() -> Self {
        Self::UmmAlQura
    }
}

impl CalculationMethod {
    pub const ALL: [CalculationMethod; 12] = [
        Self::MuslimWorldLeague,
        Self::Egyptian,
        Self::Karachi,
        Self::UmmAlQura,
        Self::Dubai,
        Self::MoonsightingCommittee,
        Self::NorthAmerica,
        Self::Kuwait,
        Self::Qatar,
        Self::Singapore,
        Self::Tehran,
        Self::Turkey,
    ];

    /// Canonical name, as persisted in settings.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MuslimWorldLeague => "MuslimWorldLeague",
            Self::Egyptian => "Egyptian",
            Self::Karachi => "Karachi",
            Self::UmmAlQura => "UmmAlQura",
            Self::Dubai => "Dubai",
            Self::MoonsightingCommittee => "MoonsightingCommittee",
            Self::NorthAmerica => "NorthAmerica",
            Self::Kuwait => "Kuwait",
            Self::Qatar => "Qatar",
            Self::Singapore => "Singapore",
            Self::Tehran => "Tehran",
            Self::Turkey => "Turkey",
        }
    }

    /// Parse a persisted method name, falling back to the default preset.
    ///
    /// An unknown name almost always comes from a stale settings file, so it
    /// is logged and replaced rather than reported as an error.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            let fallback = Self::default();
            tracing::warn!(method = name, fallback = fallback.name(), "unknown calculation method, using default");
            fallback
        })
    }

    /// Resolve the preset into concrete angles and intervals.
    pub fn params(&self) -> MethodParams {
        let base = MethodParams {
            method: *self,
            fajr_angle: 18.0,
            isha: IshaRule::Angle(17.0),
            maghrib_interval_minutes: 0,
            maghrib_angle: None,
            method_adjustments: MethodAdjustments::default(),
        };
        match self {
            Self::MuslimWorldLeague => MethodParams {
                method_adjustments: MethodAdjustments { dhuhr: 1, ..Default::default() },
                ..base
            },
            Self::Egyptian => MethodParams {
                fajr_angle: 19.5,
                isha: IshaRule::Angle(17.5),
                method_adjustments: MethodAdjustments { dhuhr: 1, ..Default::default() },
                ..base
            },
            Self::Karachi => MethodParams {
                isha: IshaRule::Angle(18.0),
                method_adjustments: MethodAdjustments { dhuhr: 1, ..Default::default() },
                ..base
            },
            Self::UmmAlQura => MethodParams {
                fajr_angle: 18.5,
                isha: IshaRule::Interval(90),
                ..base
            },
            Self::Dubai => MethodParams {
                fajr_angle: 18.2,
                isha: IshaRule::Angle(18.2),
                method_adjustments: MethodAdjustments { sunrise: -3, dhuhr: 3, asr: 3, maghrib: 3, ..Default::default() },
                ..base
            },
            Self::MoonsightingCommittee => MethodParams {
                isha: IshaRule::Angle(18.0),
                method_adjustments: MethodAdjustments { dhuhr: 5, maghrib: 3, ..Default::default() },
                ..base
            },
            Self::NorthAmerica => MethodParams {
                fajr_angle: 15.0,
                isha: IshaRule::Angle(15.0),
                method_adjustments: MethodAdjustments { dhuhr: 1, ..Default::default() },
                ..base
            },
            Self::Kuwait => MethodParams {
                isha: IshaRule::Angle(17.5),
                ..base
            },
            Self::Qatar => MethodParams {
                isha: IshaRule::Interval(90),
                ..base
            },
            Self::Singapore => MethodParams {
                fajr_angle: 20.0,
                isha: IshaRule::Angle(18.0),
                method_adjustments: MethodAdjustments { dhuhr: 1, ..Default::default() },
                ..base
            },
            Self::Tehran => MethodParams {
                fajr_angle: 17.7,
                isha: IshaRule::Angle(14.0),
                maghrib_angle: Some(4.5),
                ..base
            },
            Self::Turkey => MethodParams {
                method_adjustments: MethodAdjustments { sunrise: -7, dhuhr: 5, asr: 4, maghrib: 7, ..Default::default() },
                ..base
            },
        }
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CalculationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        let method = match key.as_str() {
            "muslimworldleague" | "mwl" => Self::MuslimWorldLeague,
            "egyptian" | "egypt" => Self::Egyptian,
            "karachi" => Self::Karachi,
            "ummalqura" | "makkah" => Self::UmmAlQura,
            "dubai" => Self::Dubai,
            "moonsightingcommittee" | "moonsighting" => Self::MoonsightingCommittee,
            "northamerica" | "isna" => Self::NorthAmerica,
            "kuwait" => Self::Kuwait,
            "qatar" => Self::Qatar,
            "singapore" => Self::Singapore,
            "tehran" => Self::Tehran,
            "turkey" | "diyanet" => Self::Turkey,
            _ => return Err(Error::UnknownMethod(s.to_string())),
        };
        Ok(method)
    }
}

/// How isha is derived: a twilight depression angle or a fixed interval after sunset.
///
/// Modelling it as an enum keeps "exactly one of angle or interval" true by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IshaRule {
    /// Degrees below the horizon.
    Angle(f64),
    /// Minutes after sunset.
    Interval(i64),
}

/// Per-method minute offsets baked into some presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodAdjustments {
    pub fajr: i64,
    pub sunrise: i64,
    pub dhuhr: i64,
    pub asr: i64,
    pub maghrib: i64,
    pub isha: i64,
}

/// Resolved calculation parameters for one preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodParams {
    pub method: CalculationMethod,
    /// Fajr depression angle in degrees.
    pub fajr_angle: f64,
    pub isha: IshaRule,
    /// Minutes added to sunset for maghrib (ignored when `maghrib_angle` is set).
    pub maghrib_interval_minutes: i64,
    /// Maghrib depression angle, for conventions that use one.
    pub maghrib_angle: Option<f64>,
    pub method_adjustments: MethodAdjustments,
}

/// Asr juristic school. Determines the shadow-length multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AsrSchool {
    #[default]
    Shafi,
    Hanafi,
}

impl AsrSchool {
    pub fn shadow_multiplier(&self) -> f64 {
        match self {
            Self::Shafi => 1.0,
            Self::Hanafi => 2.0,
        }
    }
}

impl fmt::Display for AsrSchool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shafi => write!(f, "Shafi"),
            Self::Hanafi => write!(f, "Hanafi"),
        }
    }
}

impl FromStr for AsrSchool {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shafi" | "standard" => Ok(Self::Shafi),
            "hanafi" => Ok(Self::Hanafi),
            _ => Err(Error::UnknownAsrSchool(s.to_string())),
        }
    }
}

/// Bound applied to fajr and isha when the twilight angle is never reached
/// or falls implausibly far into the night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HighLatitudeRule {
    /// Fajr no earlier than the middle of the night, isha no later.
    #[default]
    MiddleOfTheNight,
    /// Fajr in the last seventh of the night, isha in the first seventh.
    SeventhOfTheNight,
    /// Night portion proportional to the twilight angle (angle / 60).
    TwilightAngle,
}

impl HighLatitudeRule {
    /// Fraction of the night allotted to a twilight of `angle` degrees.
    pub fn night_portion(&self, angle: f64) -> f64 {
        match self {
            Self::MiddleOfTheNight => 1.0 / 2.0,
            Self::SeventhOfTheNight => 1.0 / 7.0,
            Self::TwilightAngle => angle / 60.0,
        }
    }
}

impl FromStr for HighLatitudeRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "middle" | "middleofthenight" => Ok(Self::MiddleOfTheNight),
            "seventh" | "seventhofthenight" => Ok(Self::SeventhOfTheNight),
            "angle" | "twilightangle" => Ok(Self::TwilightAngle),
            _ => Err(format!("Unknown high-latitude rule '{}'. Use 'middle', 'seventh' or 'angle'.", s)),
        }
    }
}

/// User-controlled additive minute offsets, applied once after computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSet {
    #[serde(default)]
    pub fajr: i64,
    #[serde(default)]
    pub isha: i64,
}

/// Everything besides location and date that shapes a day's times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationConfig {
    pub params: MethodParams,
    pub asr_school: AsrSchool,
    pub high_latitude_rule: HighLatitudeRule,
    pub adjustments: AdjustmentSet,
}

impl CalculationConfig {
    pub fn new(method: CalculationMethod) -> Self {
        Self {
            params: method.params(),
            asr_school: AsrSchool::default(),
            high_latitude_rule: HighLatitudeRule::default(),
            adjustments: AdjustmentSet::default(),
        }
    }

    pub fn with_asr_school(mut self, school: AsrSchool) -> Self {
        self.asr_school = school;
        self
    }

    pub fn with_high_latitude_rule(mut self, rule: HighLatitudeRule) -> Self {
        self.high_latitude_rule = rule;
        self
    }

    pub fn with_adjustments(mut self, adjustments: AdjustmentSet) -> Self {
        self.adjustments = adjustments;
        self
    }
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self::new(CalculationMethod::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_aliases() {
        for m in CalculationMethod::ALL {
            assert_eq!(m.name().parse::<CalculationMethod>().unwrap(), m);
        }
        assert_eq!("mwl".parse::<CalculationMethod>().unwrap(), CalculationMethod::MuslimWorldLeague);
        assert_eq!("Umm al-Qura".parse::<CalculationMethod>().unwrap(), CalculationMethod::UmmAlQura);
        assert_eq!("ISNA".parse::<CalculationMethod>().unwrap(), CalculationMethod::NorthAmerica);
    }

    #[test]
    fn test_unknown_method_is_error_when_strict() {
        let err = "Martian".parse::<CalculationMethod>().unwrap_err();
        assert!(matches!(err, Error::UnknownMethod(ref s) if s == "Martian"));
    }

    #[test]
    fn test_unknown_method_falls_back_to_umm_al_qura() {
        assert_eq!(CalculationMethod::from_name_or_default("corrupted"), CalculationMethod::UmmAlQura);
        assert_eq!(CalculationMethod::from_name_or_default("Egyptian"), CalculationMethod::Egyptian);
    }

    #[test]
    fn test_interval_presets() {
        assert_eq!(CalculationMethod::UmmAlQura.params().isha, IshaRule::Interval(90));
        assert_eq!(CalculationMethod::Qatar.params().isha, IshaRule::Interval(90));
        assert_eq!(CalculationMethod::MuslimWorldLeague.params().isha, IshaRule::Angle(17.0));
    }

    #[test]
    fn test_preset_angles() {
        let egypt = CalculationMethod::Egyptian.params();
        assert_eq!(egypt.fajr_angle, 19.5);
        assert_eq!(egypt.isha, IshaRule::Angle(17.5));
        let tehran = CalculationMethod::Tehran.params();
        assert_eq!(tehran.maghrib_angle, Some(4.5));
        let turkey = CalculationMethod::Turkey.params();
        assert_eq!(turkey.method_adjustments.sunrise, -7);
        assert_eq!(turkey.method_adjustments.maghrib, 7);
    }

    #[test]
    fn test_asr_school() {
        assert_eq!(AsrSchool::Shafi.shadow_multiplier(), 1.0);
        assert_eq!(AsrSchool::Hanafi.shadow_multiplier(), 2.0);
        assert_eq!("Hanafi".parse::<AsrSchool>().unwrap(), AsrSchool::Hanafi);
        assert!("maliki".parse::<AsrSchool>().is_err());
    }

    #[test]
    fn test_night_portion() {
        assert_eq!(HighLatitudeRule::MiddleOfTheNight.night_portion(18.0), 0.5);
        assert!((HighLatitudeRule::SeventhOfTheNight.night_portion(18.0) - 1.0 / 7.0).abs() < 1e-12);
        assert!((HighLatitudeRule::TwilightAngle.night_portion(18.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_method_serde_uses_names() {
        let json = serde_json::to_string(&CalculationMethod::MoonsightingCommittee).unwrap();
        assert_eq!(json, "\"MoonsightingCommittee\"");
    }
}
