//! Location models: coordinates, work-location tags and geofence outcomes.

use serde::{Deserialize, Serialize};

/// A reported GPS position.
///
/// # Example
///
/// ```
/// use attendance_engine::models::Coordinate;
///
/// let here = Coordinate::new(23.8103, 90.4125).with_accuracy(12.0);
/// assert_eq!(here.accuracy_m, Some(12.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Reported horizontal accuracy in metres, if the device supplied one.
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl Coordinate {
    /// Creates a coordinate without accuracy information.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
        }
    }

    /// Returns a copy with the given accuracy in metres.
    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }
}

/// Where the employee worked on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkLocationTag {
    /// Within the radius of a registered worksite.
    Office,
    /// Working from home.
    Home,
    /// Working from anywhere else.
    Remote,
}

/// How much a geofence decision can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationConfidence {
    /// The device reported a usable accuracy.
    Normal,
    /// Accuracy was missing or zero.
    Low,
}

/// The outcome of checking a coordinate against the worksite registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceCheck {
    /// The nearest worksite, if any are registered.
    pub nearest_site_id: Option<String>,
    /// Distance to the nearest worksite in metres.
    pub distance_m: Option<f64>,
    /// Whether the coordinate lies within the nearest site's radius.
    pub within_radius: bool,
    /// Confidence annotation derived from the reported accuracy.
    pub confidence: LocationConfidence,
}

/// A coordinate together with its geofence outcome, as captured on a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckedLocation {
    /// The reported coordinate.
    pub coordinate: Coordinate,
    /// The geofence outcome at the time of the report.
    pub geofence: GeofenceCheck,
}
