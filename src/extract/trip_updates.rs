use serde::Serialize;
use tracing::debug;

use crate::delay::{DelayClass, classify};
use crate::gtfs_rt::{self, FeedMessage};

/// Delay status of a single trip, taken from its first stop-time update.
///
/// `route_id` is empty when the feed does not name a route; `vehicle_id` is
/// `None` (serialized as `null`) when the feed does not name a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripUpdate {
    pub trip_id: String,
    pub route_id: String,
    pub vehicle_id: Option<String>,
    #[serde(rename = "delay")]
    pub delay_seconds: i32,
    pub schedule_relationship: String,
}

impl TripUpdate {
    pub fn is_valid(&self) -> bool {
        !self.trip_id.trim().is_empty() && !self.schedule_relationship.is_empty()
    }

    pub fn delay_class(&self) -> DelayClass {
        classify(self.delay_seconds)
    }

    pub fn is_significantly_delayed(&self) -> bool {
        self.delay_class().is_significant
    }
}

/// Delay of the first stop-time update: arrival if it has one, else
/// departure, else zero. Later stops are never consulted.
fn first_stop_delay(update: &gtfs_rt::TripUpdate) -> i32 {
    let Some(first) = update.stop_time_update.first() else {
        return 0;
    };

    first
        .arrival
        .as_ref()
        .and_then(|a| a.delay)
        .or_else(|| first.departure.as_ref().and_then(|d| d.delay))
        .unwrap_or(0)
}

/// Projects every trip-update entity of `feed`, in feed order.
pub fn trip_updates(feed: &FeedMessage) -> Vec<TripUpdate> {
    let updates: Vec<TripUpdate> = feed
        .entity
        .iter()
        .filter_map(|e| e.trip_update.as_ref())
        .map(|tu| TripUpdate {
            trip_id: tu.trip.trip_id.clone().unwrap_or_default(),
            route_id: tu.trip.route_id.clone().unwrap_or_default(),
            vehicle_id: tu.vehicle.as_ref().and_then(|v| v.id.clone()),
            delay_seconds: first_stop_delay(tu),
            schedule_relationship: tu.trip.schedule_relationship().as_str_name().to_string(),
        })
        .filter(TripUpdate::is_valid)
        .collect();

    debug!(count = updates.len(), "Trip updates extracted");
    updates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::trip_descriptor::ScheduleRelationship;
    use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
    use crate::gtfs_rt::{FeedEntity, FeedHeader, TripDescriptor, VehicleDescriptor};

    fn event(delay: Option<i32>) -> Option<StopTimeEvent> {
        Some(StopTimeEvent {
            delay,
            ..Default::default()
        })
    }

    fn stop(arrival: Option<StopTimeEvent>, departure: Option<StopTimeEvent>) -> StopTimeUpdate {
        StopTimeUpdate {
            arrival,
            departure,
            ..Default::default()
        }
    }

    fn update_entity(trip_id: &str, stops: Vec<StopTimeUpdate>) -> FeedEntity {
        FeedEntity {
            id: format!("tu-{trip_id}"),
            trip_update: Some(gtfs_rt::TripUpdate {
                trip: TripDescriptor {
                    trip_id: Some(trip_id.to_string()),
                    ..Default::default()
                },
                stop_time_update: stops,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn feed(entity: Vec<FeedEntity>) -> FeedMessage {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_string(),
                ..Default::default()
            },
            entity,
        }
    }

    #[test]
    fn test_arrival_delay_preferred() {
        let updates = trip_updates(&feed(vec![update_entity(
            "trip-1",
            vec![stop(event(Some(420)), event(Some(60)))],
        )]));
        assert_eq!(updates[0].delay_seconds, 420);
        assert_eq!(updates[0].delay_class().minutes, 7);
        assert!(updates[0].is_significantly_delayed());
    }

    #[test]
    fn test_departure_used_when_arrival_has_no_delay() {
        let updates = trip_updates(&feed(vec![
            update_entity("trip-1", vec![stop(event(None), event(Some(-120)))]),
            update_entity("trip-2", vec![stop(None, event(Some(90)))]),
        ]));
        assert_eq!(updates[0].delay_seconds, -120);
        assert_eq!(updates[1].delay_seconds, 90);
    }

    #[test]
    fn test_only_first_stop_counts() {
        let updates = trip_updates(&feed(vec![
            update_entity(
                "trip-1",
                vec![stop(None, None), stop(event(Some(600)), None)],
            ),
            update_entity("trip-2", vec![]),
        ]));
        assert_eq!(updates[0].delay_seconds, 0);
        assert_eq!(updates[1].delay_seconds, 0);
    }

    #[test]
    fn test_optional_fields() {
        let mut entity = update_entity("trip-1", vec![]);
        if let Some(tu) = entity.trip_update.as_mut() {
            tu.trip.route_id = Some("160013".to_string());
            tu.trip.set_schedule_relationship(ScheduleRelationship::Canceled);
            tu.vehicle = Some(VehicleDescriptor {
                id: Some("M:401".to_string()),
                ..Default::default()
            });
        }

        let updates = trip_updates(&feed(vec![entity, update_entity("trip-2", vec![])]));

        assert_eq!(updates[0].route_id, "160013");
        assert_eq!(updates[0].vehicle_id.as_deref(), Some("M:401"));
        assert_eq!(updates[0].schedule_relationship, "CANCELED");

        assert_eq!(updates[1].route_id, "");
        assert_eq!(updates[1].vehicle_id, None);
        assert_eq!(updates[1].schedule_relationship, "SCHEDULED");
    }

    #[test]
    fn test_skips_updates_without_trip_id() {
        let mut entity = update_entity("", vec![]);
        if let Some(tu) = entity.trip_update.as_mut() {
            tu.trip.trip_id = None;
        }
        assert!(trip_updates(&feed(vec![entity])).is_empty());
    }

    #[test]
    fn test_serializes_with_consumer_field_names() {
        let update = TripUpdate {
            trip_id: "trip_124".to_string(),
            route_id: "ROUTE_002".to_string(),
            vehicle_id: None,
            delay_seconds: -60,
            schedule_relationship: "SCHEDULED".to_string(),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "tripId": "trip_124",
                "routeId": "ROUTE_002",
                "vehicleId": null,
                "delay": -60,
                "scheduleRelationship": "SCHEDULED"
            })
        );
    }
}
