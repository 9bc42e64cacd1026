use serde::Serialize;
use tracing::debug;

use crate::geo::{Coordinates, Located};
use crate::gtfs_rt::FeedMessage;

/// Where a single vehicle is right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePosition {
    pub vehicle_id: String,
    pub trip_id: String,
    pub latitude: f32,
    pub longitude: f32,
}

impl VehiclePosition {
    /// Non-blank vehicle and trip ids, coordinates on the globe.
    pub fn is_valid(&self) -> bool {
        !self.vehicle_id.trim().is_empty()
            && !self.trip_id.trim().is_empty()
            && self.coordinates().in_bounds()
    }

    pub fn coordinates_string(&self) -> String {
        format!("{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl Located for VehiclePosition {
    fn coordinates(&self) -> Coordinates {
        Coordinates::new(f64::from(self.latitude), f64::from(self.longitude))
    }
}

impl Located for &VehiclePosition {
    fn coordinates(&self) -> Coordinates {
        (*self).coordinates()
    }
}

/// Projects every vehicle-position entity of `feed`, in feed order.
///
/// Entities without a vehicle payload are skipped, as are records that fail
/// [`VehiclePosition::is_valid`]. Vehicles reported twice come out twice.
pub fn vehicle_positions(feed: &FeedMessage) -> Vec<VehiclePosition> {
    let mut skipped = 0usize;

    let positions: Vec<VehiclePosition> = feed
        .entity
        .iter()
        .filter_map(|e| e.vehicle.as_ref())
        .filter_map(|v| {
            let position = VehiclePosition {
                vehicle_id: v
                    .vehicle
                    .as_ref()
                    .and_then(|d| d.id.clone())
                    .unwrap_or_default(),
                trip_id: v
                    .trip
                    .as_ref()
                    .and_then(|t| t.trip_id.clone())
                    .unwrap_or_default(),
                latitude: v.position.as_ref().map_or(0.0, |p| p.latitude),
                longitude: v.position.as_ref().map_or(0.0, |p| p.longitude),
            };
            if position.is_valid() {
                Some(position)
            } else {
                skipped += 1;
                None
            }
        })
        .collect();

    debug!(count = positions.len(), skipped, "Vehicle positions extracted");
    positions
}
