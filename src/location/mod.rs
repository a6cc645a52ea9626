//! Location subsystem: validated coordinates, the built-in city dataset and
//! the offline resolver chain.

pub mod cities;
pub mod resolver;
pub mod types;

pub use cities::{city_list, CityInfo};
pub use resolver::{default_location, parse_tz, resolve, LocationRequest};
pub use types::{format_coords, GeoCoordinate, LocationSource, ResolvedLocation};
