//! Hex-grid location helpers
//!
//! Hotspot locations are stored as H3 cell indexes in their hex string form.

use std::str::FromStr;

use h3o::{CellIndex, LatLng};
use tracing::debug;

fn center(index: &str) -> Option<LatLng> {
    match CellIndex::from_str(index.trim()) {
        Ok(cell) => Some(LatLng::from(cell)),
        Err(e) => {
            if !index.is_empty() {
                debug!(index, error = %e, "unresolvable cell index");
            }
            None
        }
    }
}

/// Great-circle distance in meters between the centers of two cells.
///
/// Returns 0 when either index is empty or not a valid cell.
pub fn distance_meters(a: &str, b: &str) -> f64 {
    match (center(a), center(b)) {
        (Some(a), Some(b)) => a.distance_m(b),
        _ => 0.0,
    }
}

/// Latitude and longitude of the cell center, in degrees.
pub fn to_lat_lon(index: &str) -> Option<(f64, f64)> {
    center(index).map(|ll| (ll.lat(), ll.lng()))
}
