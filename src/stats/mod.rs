//! Stats module - derived reporting views

mod calculator;
mod country;

pub use calculator::{
    CareerPoint, CountryStats, MapMetric, StatsCalculator, TechnologyCount,
    COMPENSATION_CEILING, COMPENSATION_FLOOR, DEFAULT_TOP_TECHNOLOGIES, MAX_YEARS_EXPERIENCE,
};
pub use country::{lookup_iso, resolve_iso};
