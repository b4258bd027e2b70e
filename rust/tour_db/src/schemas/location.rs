use serde::{Deserialize, Serialize};

use crate::error::ValidationReport;

/// GeoJSON geometry type. Only points are stored.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointType {
    #[default]
    Point,
}

/// A GeoJSON point with the descriptive fields a tour attaches to it.
///
/// `coordinates` follow GeoJSON order: `[longitude, latitude]`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Location {
    #[serde(rename = "type", default)]
    pub kind: PointType,
    pub coordinates: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Day of the tour this stop is visited on; unset for a start location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<i32>,
}

impl Location {
    pub fn point(lng: f64, lat: f64) -> Self {
        Self {
            coordinates: [lng, lat],
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn on_day(mut self, day: i32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }

    /// Records a violation under `field` when the point cannot be stored
    /// under a 2dsphere index.
    pub(crate) fn check(&self, field: &str, report: &mut ValidationReport) {
        if !(-180.0..=180.0).contains(&self.lng()) {
            report.add(
                field,
                format!("Longitude ({}) must be between -180 and 180", self.lng()),
            );
        }
        if !(-90.0..=90.0).contains(&self.lat()) {
            report.add(
                field,
                format!("Latitude ({}) must be between -90 and 90", self.lat()),
            );
        }
    }
}
