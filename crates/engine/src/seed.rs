//! Default service points for a fresh installation.

use boothline_core::point::PointSpec;

/// `(name, sector, avg_service_time_sec)` of the stock points.
const DEFAULT_POINTS: [(&str, &str, u32); 5] = [
    ("Attraction", "Sector 1", 60),
    ("T-City", "Sector 2", 90),
    ("T-Education", "Sector 3", 60),
    ("T-Launch", "Sector 4", 70),
    ("T-Business", "Sector 5", 50),
];

/// Specs for the stock points, unbounded and active.
pub fn default_points() -> Vec<PointSpec> {
    DEFAULT_POINTS
        .iter()
        .map(|&(name, sector, avg)| PointSpec {
            name: name.to_string(),
            sector: sector.to_string(),
            description: String::new(),
            avg_service_time_sec: avg,
            max_queue: 0,
            is_active: Some(true),
        })
        .collect()
}
