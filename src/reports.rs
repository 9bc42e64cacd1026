//! Incident reports filed against the transit network.
//!
//! The only rule beyond plain storage is that a report naming a route must
//! name one that exists.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::gtfs::Route;
use crate::storage::{Entity, Repository, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentKind {
    ServiceDisruption,
    Delay,
    EquipmentFailure,
    Weather,
    Emergency,
    Construction,
    Other,
}

impl IncidentKind {
    pub fn display_name(self) -> &'static str {
        match self {
            IncidentKind::ServiceDisruption => "Service disruption",
            IncidentKind::Delay => "Delay",
            IncidentKind::EquipmentFailure => "Equipment failure",
            IncidentKind::Weather => "Weather",
            IncidentKind::Emergency => "Emergency",
            IncidentKind::Construction => "Construction",
            IncidentKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentReport {
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: IncidentKind,
    pub type_display_name: String,
    pub description: String,
    pub route_id: Option<String>,
    pub is_emergency: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub version: u64,
}

impl IncidentReport {
    pub fn new(kind: IncidentKind, description: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            type_display_name: kind.display_name().to_string(),
            description: description.into(),
            route_id: None,
            is_emergency: false,
            timestamp: None,
            latitude: None,
            longitude: None,
            version: 0,
        }
    }

    pub fn on_route(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    pub fn emergency(mut self, is_emergency: bool) -> Self {
        self.is_emergency = is_emergency;
        self
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    fn route_ref(&self) -> Option<&str> {
        self.route_id.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}

impl Entity for IncidentReport {
    type Id = u64;

    fn id(&self) -> Option<&u64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Route with ID '{0}' does not exist")]
    UnknownRoute(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct ReportService<RR, PR>
where
    RR: Repository<Route>,
    PR: Repository<IncidentReport>,
{
    routes: Arc<RR>,
    reports: Arc<PR>,
}

impl<RR, PR> ReportService<RR, PR>
where
    RR: Repository<Route>,
    PR: Repository<IncidentReport>,
{
    pub fn new(routes: Arc<RR>, reports: Arc<PR>) -> Self {
        Self { routes, reports }
    }

    /// Validates the route reference, stamps the report if it has no
    /// timestamp yet, and stores it.
    #[tracing::instrument(skip(self, report), fields(kind = ?report.kind, route_id = ?report.route_id))]
    pub async fn create(&self, mut report: IncidentReport) -> Result<IncidentReport, ReportError> {
        if let Some(route_id) = report.route_ref() {
            if !self.routes.exists(&route_id.to_string()).await? {
                warn!(route_id, "Rejected report for unknown route");
                return Err(ReportError::UnknownRoute(route_id.to_string()));
            }
        }

        if report.timestamp.is_none() {
            report.timestamp = Some(Utc::now());
        }
        report.type_display_name = report.kind.display_name().to_string();

        let saved = self.reports.save(report).await?;
        info!(id = ?saved.id, "Report stored");
        Ok(saved)
    }

    pub async fn is_valid_route_id(&self, route_id: &str) -> Result<bool, ReportError> {
        let route_id = route_id.trim();
        if route_id.is_empty() {
            return Ok(false);
        }
        Ok(self.routes.exists(&route_id.to_string()).await?)
    }

    pub async fn find_by_route(&self, route_id: &str) -> Result<Vec<IncidentReport>, ReportError> {
        self.filtered(|r| r.route_id.as_deref() == Some(route_id)).await
    }

    pub async fn find_emergency(&self) -> Result<Vec<IncidentReport>, ReportError> {
        self.filtered(|r| r.is_emergency).await
    }

    pub async fn find_by_kind(&self, kind: IncidentKind) -> Result<Vec<IncidentReport>, ReportError> {
        self.filtered(|r| r.kind == kind).await
    }

    /// Reports stamped within the last `hours` hours.
    pub async fn find_recent(&self, hours: i64) -> Result<Vec<IncidentReport>, ReportError> {
        let end = Utc::now();
        // Windows reaching past the representable range cover everything.
        let start = Duration::try_hours(hours)
            .and_then(|window| end.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.filtered(|r| r.timestamp.is_some_and(|t| t >= start && t <= end))
            .await
    }

    pub async fn count_by_kind(&self, kind: IncidentKind) -> Result<usize, ReportError> {
        Ok(self.find_by_kind(kind).await?.len())
    }

    async fn filtered<F>(&self, keep: F) -> Result<Vec<IncidentReport>, ReportError>
    where
        F: Fn(&IncidentReport) -> bool,
    {
        Ok(self
            .reports
            .find_all()
            .await?
            .into_iter()
            .filter(|r| keep(r))
            .collect())
    }
}
