//! Great-circle distance and radius filtering.

use serde::Serialize;
use thiserror::Error;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const MAX_RADIUS_KM: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude in [-90, 90] and longitude in [-180, 180]. NaN is out of bounds.
    pub fn in_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Haversine distance in kilometres on a sphere of radius [`EARTH_RADIUS_KM`].
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Anything with a point on the map.
pub trait Located {
    fn coordinates(&self) -> Coordinates;
}

/// Keeps the records whose distance from `center` is at most `radius_km`.
///
/// Inputs are trusted; validate them with [`SearchArea::new`] first.
pub fn within_radius<T, I>(center: Coordinates, radius_km: f64, records: I) -> Vec<T>
where
    T: Located,
    I: IntoIterator<Item = T>,
{
    records
        .into_iter()
        .filter(|r| haversine_km(center, r.coordinates()) <= radius_km)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("radius {0} km is outside (0, 100]")]
    Radius(f64),
    #[error("latitude, longitude and radius must be given together")]
    IncompleteArea,
}

/// A validated center point and radius for proximity queries.
///
/// The only way to build one is [`SearchArea::new`], so holding a
/// `SearchArea` means the inputs were checked before any feed was fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    center: Coordinates,
    radius_km: f64,
}

impl SearchArea {
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Result<Self, ValidationError> {
        // NaN fails every range check below.
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::Longitude(longitude));
        }
        if !(radius_km > 0.0 && radius_km <= MAX_RADIUS_KM) {
            return Err(ValidationError::Radius(radius_km));
        }

        Ok(Self {
            center: Coordinates::new(latitude, longitude),
            radius_km,
        })
    }

    /// Builds an area from optional parts: all three or none.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius_km: Option<f64>,
    ) -> Result<Option<Self>, ValidationError> {
        match (latitude, longitude, radius_km) {
            (None, None, None) => Ok(None),
            (Some(lat), Some(lon), Some(radius)) => Self::new(lat, lon, radius).map(Some),
            _ => Err(ValidationError::IncompleteArea),
        }
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn filter<T, I>(&self, records: I) -> Vec<T>
    where
        T: Located,
        I: IntoIterator<Item = T>,
    {
        within_radius(self.center, self.radius_km, records)
    }
}
