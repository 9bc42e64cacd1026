use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::extract::{TripUpdate, VehiclePosition};
use crate::state::{UNKNOWN_SCHEDULE_RELATIONSHIP, VehicleCurrentState};

/// Point-in-time counts over one fetch of both feeds.
#[derive(Debug, Default, Serialize)]
pub struct RealtimeSummary {
    pub timestamp: DateTime<Utc>,

    // feed sizes
    pub vehicles: usize,
    pub trip_updates: usize,

    // join coverage
    pub matched_vehicles: usize,
    pub unmatched_vehicles: usize,

    // trip update delays
    pub delayed: usize,
    pub significantly_delayed: usize,
    pub early: usize,
    pub on_time: usize,
}

impl RealtimeSummary {
    pub fn from_snapshot(
        positions: &[VehiclePosition],
        updates: &[TripUpdate],
        states: &[VehicleCurrentState],
    ) -> Self {
        let mut s = RealtimeSummary {
            timestamp: Utc::now(),
            vehicles: positions.len(),
            trip_updates: updates.len(),
            ..Default::default()
        };

        for state in states {
            if state.schedule_relationship == UNKNOWN_SCHEDULE_RELATIONSHIP {
                s.unmatched_vehicles += 1;
            } else {
                s.matched_vehicles += 1;
            }
        }

        for update in updates {
            if update.delay_seconds > 0 {
                s.delayed += 1;
            }

            let class = update.delay_class();
            if class.is_significant {
                s.significantly_delayed += 1;
            }
            match class.minutes {
                0 => s.on_time += 1,
                m if m < 0 => s.early += 1,
                _ => {}
            }
        }

        s
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn match_pct(&self) -> f64 {
        Self::pct(self.matched_vehicles, self.matched_vehicles + self.unmatched_vehicles)
    }

    pub fn significantly_delayed_pct(&self) -> f64 {
        Self::pct(self.significantly_delayed, self.trip_updates)
    }
}
