//! Aqim: prayer times, Qibla bearing, Hijri calendar and occasion engine.
//!
//! Everything in the library is a synchronous pure function of its inputs.
//! Timers, persistence and presentation belong to the caller; the `aqim`
//! binary is one such caller.

pub mod alerts;
pub mod error;
pub mod hijri;
pub mod location;
pub mod method;
pub mod next;
pub mod occasions;
pub mod prayer;
pub mod qibla;
pub mod settings;
pub mod solar;
pub mod solver;

pub use error::{Error, Result};
pub use hijri::{to_hijri, HijriDate};
pub use location::GeoCoordinate;
pub use method::{AsrSchool, CalculationConfig, CalculationMethod, HighLatitudeRule};
pub use next::NextPrayer;
pub use prayer::{compute, DailyPrayerTimes, Prayer};
pub use qibla::{compute_bearing, QiblaBearing};
pub use solver::Solver;
