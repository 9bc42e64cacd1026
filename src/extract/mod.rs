//! Projections from decoded feed entities to the flat records served to
//! callers.

pub mod positions;
pub mod trip_updates;

pub use positions::{VehiclePosition, vehicle_positions};
pub use trip_updates::{TripUpdate, trip_updates};
