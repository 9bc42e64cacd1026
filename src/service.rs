//! Request-scoped access to the realtime feeds.
//!
//! Every call re-fetches the feeds it needs; nothing is cached or shared
//! between calls, so concurrent callers never observe each other's data.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::error::RealtimeError;
use crate::extract::{TripUpdate, VehiclePosition, trip_updates, vehicle_positions};
use crate::fetch::{HttpClient, fetch_bytes};
use crate::geo::SearchArea;
use crate::parser::decode_feed;
use crate::state::{VehicleCurrentState, correlate};
use crate::stats::RealtimeSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub vehicles: usize,
    pub message: String,
}

pub struct RealtimeService<C: HttpClient> {
    client: C,
    config: FeedConfig,
}

impl<C: HttpClient> RealtimeService<C> {
    pub fn new(client: C, config: FeedConfig) -> Self {
        Self { client, config }
    }

    #[tracing::instrument(skip(self), fields(url = %self.config.vehicle_positions_url))]
    pub async fn fetch_vehicle_positions(&self) -> Result<Vec<VehiclePosition>, RealtimeError> {
        let bytes = fetch_bytes(&self.client, &self.config.vehicle_positions_url).await?;
        let feed = decode_feed(&bytes)?;
        let positions = vehicle_positions(&feed);
        info!(count = positions.len(), "Fetched vehicle positions");
        Ok(positions)
    }

    #[tracing::instrument(skip(self), fields(url = %self.config.trip_updates_url))]
    pub async fn fetch_trip_updates(&self) -> Result<Vec<TripUpdate>, RealtimeError> {
        let bytes = fetch_bytes(&self.client, &self.config.trip_updates_url).await?;
        let feed = decode_feed(&bytes)?;
        let updates = trip_updates(&feed);
        info!(count = updates.len(), "Fetched trip updates");
        Ok(updates)
    }

    /// Fetches both feeds concurrently. Either failing fails the pair.
    async fn fetch_both(&self) -> Result<(Vec<VehiclePosition>, Vec<TripUpdate>), RealtimeError> {
        tokio::try_join!(self.fetch_vehicle_positions(), self.fetch_trip_updates())
    }

    #[tracing::instrument(skip(self))]
    pub async fn fetch_current_state(&self) -> Result<Vec<VehicleCurrentState>, RealtimeError> {
        let (positions, updates) = self.fetch_both().await?;
        let states = correlate(&positions, &updates);
        info!(count = states.len(), "Correlated current vehicle state");
        Ok(states)
    }

    pub async fn active_vehicle_count(&self) -> Result<usize, RealtimeError> {
        Ok(self.fetch_vehicle_positions().await?.len())
    }

    /// Probes the vehicle-position feed. Failures are reported in the
    /// returned status rather than as an error.
    #[tracing::instrument(skip(self))]
    pub async fn health(&self) -> HealthStatus {
        match self.fetch_vehicle_positions().await {
            Ok(positions) => {
                let message = format!(
                    "OK - Service healthy, {} vehicles reporting",
                    positions.len()
                );
                info!(%message, "Health check passed");
                HealthStatus {
                    healthy: true,
                    vehicles: positions.len(),
                    message,
                }
            }
            Err(e) => {
                warn!(error = %e, "Health check failed");
                HealthStatus {
                    healthy: false,
                    vehicles: 0,
                    message: format!("Service unhealthy - {e}"),
                }
            }
        }
    }

    /// Trip updates more than five (rounded) minutes late.
    pub async fn delayed_trips(&self) -> Result<Vec<TripUpdate>, RealtimeError> {
        let all = self.fetch_trip_updates().await?;
        let total = all.len();
        let delayed: Vec<TripUpdate> = all
            .into_iter()
            .filter(TripUpdate::is_significantly_delayed)
            .collect();
        info!(delayed = delayed.len(), total, "Filtered significantly delayed trips");
        Ok(delayed)
    }

    /// Number of trip updates with any positive delay.
    pub async fn delayed_trip_count(&self) -> Result<usize, RealtimeError> {
        let all = self.fetch_trip_updates().await?;
        Ok(all.iter().filter(|u| u.delay_seconds > 0).count())
    }

    pub async fn trip_updates_for_route(
        &self,
        route_id: &str,
    ) -> Result<Vec<TripUpdate>, RealtimeError> {
        let all = self.fetch_trip_updates().await?;
        let on_route: Vec<TripUpdate> = all.into_iter().filter(|u| u.route_id == route_id).collect();
        info!(route_id, count = on_route.len(), "Filtered trip updates by route");
        Ok(on_route)
    }

    #[tracing::instrument(skip(self), fields(
        lat = area.center().latitude,
        lon = area.center().longitude,
        radius_km = area.radius_km()
    ))]
    pub async fn nearby_positions(
        &self,
        area: &SearchArea,
    ) -> Result<Vec<VehiclePosition>, RealtimeError> {
        let all = self.fetch_vehicle_positions().await?;
        let total = all.len();
        let nearby = area.filter(all);
        info!(nearby = nearby.len(), total, "Filtered vehicle positions by radius");
        Ok(nearby)
    }

    #[tracing::instrument(skip(self), fields(
        lat = area.center().latitude,
        lon = area.center().longitude,
        radius_km = area.radius_km()
    ))]
    pub async fn nearby_current_state(
        &self,
        area: &SearchArea,
    ) -> Result<Vec<VehicleCurrentState>, RealtimeError> {
        let all = self.fetch_current_state().await?;
        let total = all.len();
        let nearby = area.filter(all);
        info!(nearby = nearby.len(), total, "Filtered vehicle state by radius");
        Ok(nearby)
    }

    /// Significantly delayed trips with a matching vehicle inside `area`.
    ///
    /// A position matches an update by trip id, or by vehicle id when the
    /// update names one.
    #[tracing::instrument(skip(self), fields(
        lat = area.center().latitude,
        lon = area.center().longitude,
        radius_km = area.radius_km()
    ))]
    pub async fn nearby_delayed_trips(
        &self,
        area: &SearchArea,
    ) -> Result<Vec<TripUpdate>, RealtimeError> {
        let (positions, updates) = self.fetch_both().await?;
        let nearby = delayed_trips_near(area, &positions, updates);
        info!(nearby = nearby.len(), "Filtered delayed trips by radius");
        Ok(nearby)
    }

    #[tracing::instrument(skip(self))]
    pub async fn summary(&self) -> Result<RealtimeSummary, RealtimeError> {
        let (positions, updates) = self.fetch_both().await?;
        let states = correlate(&positions, &updates);
        Ok(RealtimeSummary::from_snapshot(&positions, &updates, &states))
    }
}

pub fn delayed_trips_near(
    area: &SearchArea,
    positions: &[VehiclePosition],
    updates: Vec<TripUpdate>,
) -> Vec<TripUpdate> {
    let nearby_positions = area.filter(positions);

    updates
        .into_iter()
        .filter(TripUpdate::is_significantly_delayed)
        .filter(|u| {
            nearby_positions.iter().any(|p| {
                p.trip_id == u.trip_id || u.vehicle_id.as_deref() == Some(p.vehicle_id.as_str())
            })
        })
        .collect()
}
