//! Joins vehicle positions with trip delays into one record per vehicle.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::delay::{self, DelayClass};
use crate::extract::{TripUpdate, VehiclePosition};
use crate::geo::{Coordinates, Located};

pub const UNKNOWN_SCHEDULE_RELATIONSHIP: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleCurrentState {
    pub vehicle_id: String,
    pub trip_id: String,
    pub route_id: String,
    pub latitude: f32,
    pub longitude: f32,
    #[serde(rename = "delay")]
    pub delay_seconds: i32,
    pub schedule_relationship: String,
    pub delay_description: String,
}

impl VehicleCurrentState {
    /// State for `position`, enriched by `update` when one exists.
    ///
    /// Without an update the vehicle is assumed on time with an unknown
    /// schedule relationship and no route.
    pub fn from_parts(position: &VehiclePosition, update: Option<&TripUpdate>) -> Self {
        match update {
            Some(update) => Self {
                vehicle_id: position.vehicle_id.clone(),
                trip_id: position.trip_id.clone(),
                route_id: update.route_id.clone(),
                latitude: position.latitude,
                longitude: position.longitude,
                delay_seconds: update.delay_seconds,
                schedule_relationship: update.schedule_relationship.clone(),
                delay_description: update.delay_class().description,
            },
            None => Self {
                vehicle_id: position.vehicle_id.clone(),
                trip_id: position.trip_id.clone(),
                route_id: String::new(),
                latitude: position.latitude,
                longitude: position.longitude,
                delay_seconds: 0,
                schedule_relationship: UNKNOWN_SCHEDULE_RELATIONSHIP.to_string(),
                delay_description: delay::ON_TIME.to_string(),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.vehicle_id.trim().is_empty()
            && !self.trip_id.trim().is_empty()
            && self.coordinates().in_bounds()
    }

    pub fn delay_class(&self) -> DelayClass {
        delay::classify(self.delay_seconds)
    }

    pub fn is_significantly_delayed(&self) -> bool {
        self.delay_class().is_significant
    }

    pub fn coordinates_string(&self) -> String {
        format!("{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl Located for VehicleCurrentState {
    fn coordinates(&self) -> Coordinates {
        Coordinates::new(f64::from(self.latitude), f64::from(self.longitude))
    }
}

/// Builds one state per position, in position order.
///
/// Updates are indexed by trip id; when two updates share a trip id the
/// later one wins. States failing [`VehicleCurrentState::is_valid`] are
/// dropped.
pub fn correlate(positions: &[VehiclePosition], updates: &[TripUpdate]) -> Vec<VehicleCurrentState> {
    let by_trip: HashMap<&str, &TripUpdate> = updates
        .iter()
        .map(|u| (u.trip_id.as_str(), u))
        .collect();

    let states: Vec<VehicleCurrentState> = positions
        .iter()
        .map(|p| VehicleCurrentState::from_parts(p, by_trip.get(p.trip_id.as_str()).copied()))
        .filter(VehicleCurrentState::is_valid)
        .collect();

    debug!(
        positions = positions.len(),
        updates = updates.len(),
        distinct_trips = by_trip.len(),
        states = states.len(),
        "Correlated vehicle state"
    );
    states
}
