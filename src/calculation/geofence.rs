//! Geofence validation.
//!
//! Great-circle (haversine) distance from a reported coordinate to every
//! registered worksite, and the work-location decision built on it.

use crate::config::Worksite;
use crate::error::{EngineError, EngineResult};
use crate::models::{Coordinate, GeofenceCheck, LocationConfidence, WorkLocationTag};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in metres.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::haversine_distance_m;
/// use attendance_engine::models::Coordinate;
///
/// let a = Coordinate::new(0.0, 0.0);
/// let b = Coordinate::new(0.0, 1.0);
/// let d = haversine_distance_m(&a, &b);
/// assert!((d - 111_195.0).abs() < 1.0);
/// ```
pub fn haversine_distance_m(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

fn validate_coordinate(coordinate: &Coordinate) -> EngineResult<()> {
    if !coordinate.latitude.is_finite() || !(-90.0..=90.0).contains(&coordinate.latitude) {
        return Err(EngineError::validation(
            "latitude",
            format!("{} is outside -90..90", coordinate.latitude),
        ));
    }
    if !coordinate.longitude.is_finite() || !(-180.0..=180.0).contains(&coordinate.longitude) {
        return Err(EngineError::validation(
            "longitude",
            format!("{} is outside -180..180", coordinate.longitude),
        ));
    }
    if let Some(accuracy) = coordinate.accuracy_m {
        if !accuracy.is_finite() || accuracy < 0.0 {
            return Err(EngineError::validation(
                "accuracy_m",
                format!("{} is not a usable accuracy", accuracy),
            ));
        }
    }
    Ok(())
}

/// Checks a coordinate against the worksite registry.
///
/// The nearest site decides the outcome; each site's own radius applies,
/// falling back to `default_radius_m`. An empty registry yields no nearest
/// site and `within_radius = false`.
pub fn check_geofence(
    coordinate: &Coordinate,
    worksites: &[Worksite],
    default_radius_m: f64,
) -> EngineResult<GeofenceCheck> {
    validate_coordinate(coordinate)?;

    let confidence = match coordinate.accuracy_m {
        Some(accuracy) if accuracy > 0.0 => LocationConfidence::Normal,
        _ => LocationConfidence::Low,
    };

    let nearest = worksites
        .iter()
        .map(|site| {
            let centre = Coordinate::new(site.latitude, site.longitude);
            (site, haversine_distance_m(coordinate, &centre))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1));

    Ok(match nearest {
        Some((site, distance)) => GeofenceCheck {
            nearest_site_id: Some(site.id.clone()),
            distance_m: Some(distance),
            within_radius: distance <= site.radius_m.unwrap_or(default_radius_m),
            confidence,
        },
        None => GeofenceCheck {
            nearest_site_id: None,
            distance_m: None,
            within_radius: false,
            confidence,
        },
    })
}

/// Decides the work-location tag for a start-day request.
///
/// Inside a geofence the tag is always `Office`. Outside, the caller must
/// assert `Home` or `Remote`. With no registered sites every location is
/// `Remote`, whatever the caller asserted.
pub fn classify_work_location(
    check: &GeofenceCheck,
    asserted: Option<WorkLocationTag>,
) -> EngineResult<WorkLocationTag> {
    if check.within_radius {
        return Ok(WorkLocationTag::Office);
    }

    match (check.distance_m, asserted) {
        (None, _) | (_, Some(WorkLocationTag::Remote)) => Ok(WorkLocationTag::Remote),
        (_, Some(WorkLocationTag::Home)) => Ok(WorkLocationTag::Home),
        (Some(distance_m), _) => Err(EngineError::LocationRequired { distance_m }),
    }
}
