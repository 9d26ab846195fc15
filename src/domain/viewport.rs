// Viewport domain model - center and zoom that fit every sample
use super::telemetry::Sample;

/// Most zoomed-in level, used when every sample sits on the same spot.
pub const MAX_ZOOM: u8 = 20;

/// Level used when the samples spread wider than every threshold.
pub const FALLBACK_ZOOM: u8 = 9;

/// `(half_range upper bound, zoom)` walked in order; first strict match wins.
const ZOOM_THRESHOLDS: [(f64, u8); 11] = [
    (0.00025, MAX_ZOOM),
    (0.0005, 19),
    (0.001, 18),
    (0.003, 17),
    (0.005, 16),
    (0.011, 15),
    (0.022, 14),
    (0.044, 13),
    (0.088, 12),
    (0.176, 11),
    (0.352, 10),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

/// Pick the zoom level for half of the larger coordinate extent.
pub fn zoom_for_half_range(half_range: f64) -> u8 {
    ZOOM_THRESHOLDS
        .iter()
        .find(|(limit, _)| half_range < *limit)
        .map(|&(_, zoom)| zoom)
        .unwrap_or(FALLBACK_ZOOM)
}

/// Center on the mean position and zoom so the whole extent stays visible.
///
/// Returns `None` for an empty sample set; callers skip rendering then.
pub fn compute_viewport(samples: &[Sample]) -> Option<Viewport> {
    if samples.is_empty() {
        return None;
    }

    let count = samples.len() as f64;
    let mut lat_sum = 0.0;
    let mut lon_sum = 0.0;
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut min_lon = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;

    for s in samples {
        lat_sum += s.latitude;
        lon_sum += s.longitude;
        min_lat = min_lat.min(s.latitude);
        max_lat = max_lat.max(s.latitude);
        min_lon = min_lon.min(s.longitude);
        max_lon = max_lon.max(s.longitude);
    }

    let half_range = (max_lat - min_lat).max(max_lon - min_lon) / 2.0;

    Some(Viewport {
        center_lat: lat_sum / count,
        center_lon: lon_sum / count,
        zoom: zoom_for_half_range(half_range),
    })
}
