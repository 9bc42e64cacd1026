//! CLI entry point for the GTFS-RT tracker.
//!
//! Fetches the live vehicle-position and trip-update feeds, correlates them
//! and prints the result, optionally narrowed to an area around a point.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use gtfs_rt_tracker::{
    config::FeedConfig,
    delay::classify,
    error::RealtimeError,
    fetch::BasicClient,
    geo::SearchArea,
    gtfs::{Route, load_routes_csv, seed_routes},
    output::{append_records, print_json},
    reports::{IncidentKind, IncidentReport, ReportService},
    service::RealtimeService,
    storage::InMemoryRepository,
};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gtfs_rt_tracker")]
#[command(about = "Live vehicle positions and delays from a GTFS-RT feed", long_about = None)]
struct Cli {
    /// Vehicle positions feed URL (overrides VEHICLE_POSITIONS_URL)
    #[arg(long, global = true)]
    vehicle_positions_url: Option<String>,

    /// Trip updates feed URL (overrides TRIP_UPDATES_URL)
    #[arg(long, global = true)]
    trip_updates_url: Option<String>,

    /// Request timeout in seconds (overrides FEED_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Optional proximity filter; give all three or none.
#[derive(Args, Debug)]
struct AreaArgs {
    /// Latitude of the center point
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the center point
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Radius around the center point, in kilometres (max 100)
    #[arg(long)]
    radius_km: Option<f64>,
}

impl AreaArgs {
    fn search_area(&self) -> Result<Option<SearchArea>, RealtimeError> {
        Ok(SearchArea::from_parts(self.lat, self.lon, self.radius_km)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Current vehicle positions
    Positions {
        #[command(flatten)]
        area: AreaArgs,

        /// CSV file to append results to instead of printing JSON
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Current trip updates and their delays
    TripUpdates {
        /// Only updates for this route
        #[arg(long)]
        route: Option<String>,

        /// Only trips more than five minutes late
        #[arg(long, default_value_t = false)]
        delayed: bool,

        #[arg(short, long)]
        output: Option<String>,
    },
    /// Vehicle positions joined with their trip delays
    State {
        #[command(flatten)]
        area: AreaArgs,

        #[arg(short, long)]
        output: Option<String>,
    },
    /// Significantly delayed trips, optionally only those near a point
    Delays {
        #[command(flatten)]
        area: AreaArgs,

        #[arg(short, long)]
        output: Option<String>,
    },
    /// Number of vehicles reporting and of trips running late
    Count,
    /// Check that the vehicle positions feed is reachable
    Health,
    /// Snapshot counts over both feeds
    Summary {
        /// CSV file to append the snapshot to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Classify a delay given in seconds
    Classify {
        #[arg(value_name = "DELAY_SECONDS", allow_hyphen_values = true)]
        delay_seconds: i32,
    },
    /// File an incident report, validated against a GTFS routes.txt
    Report {
        /// GTFS routes.txt used to validate the route reference
        #[arg(long, default_value = "routes.txt")]
        routes_file: String,

        #[arg(long, value_enum)]
        kind: KindArg,

        #[arg(long)]
        description: String,

        #[arg(long)]
        route_id: Option<String>,

        #[arg(long, default_value_t = false)]
        emergency: bool,

        #[command(flatten)]
        location: LocationArgs,
    },
}

#[derive(Args, Debug)]
struct LocationArgs {
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    ServiceDisruption,
    Delay,
    EquipmentFailure,
    Weather,
    Emergency,
    Construction,
    Other,
}

impl From<KindArg> for IncidentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::ServiceDisruption => IncidentKind::ServiceDisruption,
            KindArg::Delay => IncidentKind::Delay,
            KindArg::EquipmentFailure => IncidentKind::EquipmentFailure,
            KindArg::Weather => IncidentKind::Weather,
            KindArg::Emergency => IncidentKind::Emergency,
            KindArg::Construction => IncidentKind::Construction,
            KindArg::Other => IncidentKind::Other,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gtfs_rt_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_rt_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = FeedConfig::from_env();
    if let Some(url) = cli.vehicle_positions_url.clone() {
        config = config.with_vehicle_positions_url(url);
    }
    if let Some(url) = cli.trip_updates_url.clone() {
        config = config.with_trip_updates_url(url);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(secs);
    }

    if let Err(e) = run(cli.command, config).await {
        match e.downcast_ref::<RealtimeError>() {
            Some(rt) => {
                let class = rt.failure_class();
                error!(error = %rt, class = ?class, status = class.http_status(), "Request failed");
            }
            None => error!(error = %e, "Command failed"),
        }
        return Err(e);
    }

    Ok(())
}

async fn run(command: Commands, config: FeedConfig) -> Result<()> {
    let client = BasicClient::new(&config)?;
    let service = RealtimeService::new(client, config);

    match command {
        Commands::Positions { area, output } => {
            // Validate before fetching anything.
            let positions = match area.search_area()? {
                Some(area) => service.nearby_positions(&area).await?,
                None => service.fetch_vehicle_positions().await?,
            };
            emit(&positions, output.as_deref())?;
        }
        Commands::TripUpdates {
            route,
            delayed,
            output,
        } => {
            let mut updates = match route {
                Some(route) => service.trip_updates_for_route(&route).await?,
                None => service.fetch_trip_updates().await?,
            };
            if delayed {
                updates.retain(|u| u.is_significantly_delayed());
            }
            emit(&updates, output.as_deref())?;
        }
        Commands::State { area, output } => {
            let states = match area.search_area()? {
                Some(area) => service.nearby_current_state(&area).await?,
                None => service.fetch_current_state().await?,
            };
            emit(&states, output.as_deref())?;
        }
        Commands::Delays { area, output } => {
            let delayed = match area.search_area()? {
                Some(area) => service.nearby_delayed_trips(&area).await?,
                None => service.delayed_trips().await?,
            };
            emit(&delayed, output.as_deref())?;
        }
        Commands::Count => {
            let (vehicles, delayed) = tokio::try_join!(
                service.active_vehicle_count(),
                service.delayed_trip_count()
            )?;
            info!(vehicles, delayed, "Counts fetched");
            print_json(&serde_json::json!({ "vehicles": vehicles, "delayedTrips": delayed }))?;
        }
        Commands::Health => {
            let status = service.health().await;
            print_json(&status)?;
            if !status.healthy {
                anyhow::bail!(status.message);
            }
        }
        Commands::Summary { output } => {
            let summary = service.summary().await?;
            info!(
                vehicles = summary.vehicles,
                trip_updates = summary.trip_updates,
                match_pct = summary.match_pct(),
                significantly_delayed_pct = summary.significantly_delayed_pct(),
                "Realtime summary"
            );
            match output {
                Some(path) => append_records(&path, &[summary])?,
                None => print_json(&summary)?,
            }
        }
        Commands::Classify { delay_seconds } => {
            print_json(&classify(delay_seconds))?;
        }
        Commands::Report {
            routes_file,
            kind,
            description,
            route_id,
            emergency,
            location,
        } => {
            file_report(&routes_file, kind.into(), description, route_id, emergency, location)
                .await?;
        }
    }

    Ok(())
}

fn emit<T: Serialize>(records: &[T], output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            append_records(path, records)?;
            info!(path, rows = records.len(), "Records appended");
            Ok(())
        }
        None => print_json(records),
    }
}

async fn file_report(
    routes_file: &str,
    kind: IncidentKind,
    description: String,
    route_id: Option<String>,
    emergency: bool,
    location: LocationArgs,
) -> Result<()> {
    let routes: Arc<InMemoryRepository<Route>> = Arc::new(InMemoryRepository::new());
    seed_routes(routes.as_ref(), load_routes_csv(routes_file)?).await?;

    let service = ReportService::new(routes, Arc::new(InMemoryRepository::new()));

    let mut report = IncidentReport::new(kind, description).emergency(emergency);
    if let Some(route_id) = route_id {
        report = report.on_route(route_id);
    }
    if let (Some(lat), Some(lon)) = (location.lat, location.lon) {
        report = report.at(lat, lon);
    }

    let saved = service.create(report).await?;
    print_json(&saved)
}
