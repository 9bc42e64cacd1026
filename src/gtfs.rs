//! GTFS static entities consulted by the realtime side.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::{Entity, Repository, StorageError};

/// A row of GTFS `routes.txt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    #[serde(default)]
    pub agency_id: Option<String>,
    #[serde(default)]
    pub route_short_name: Option<String>,
    #[serde(default)]
    pub route_long_name: Option<String>,
    #[serde(default)]
    pub route_desc: Option<String>,
    pub route_type: i32,
    #[serde(default)]
    pub route_url: Option<String>,
    #[serde(default)]
    pub route_color: Option<String>,
    #[serde(default)]
    pub route_text_color: Option<String>,
    #[serde(default)]
    pub route_sort_order: Option<i32>,
    #[serde(skip)]
    pub version: u64,
}

impl Route {
    pub fn new(route_id: impl Into<String>, route_type: i32) -> Self {
        Self {
            route_id: route_id.into(),
            agency_id: None,
            route_short_name: None,
            route_long_name: None,
            route_desc: None,
            route_type,
            route_url: None,
            route_color: None,
            route_text_color: None,
            route_sort_order: None,
            version: 0,
        }
    }
}

impl Entity for Route {
    type Id = String;

    fn id(&self) -> Option<&String> {
        Some(&self.route_id)
    }

    fn set_id(&mut self, id: String) {
        self.route_id = id;
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

/// Reads a GTFS `routes.txt`. Columns beyond the ones on [`Route`] are ignored.
pub fn read_routes<R: std::io::Read>(reader: R) -> Result<Vec<Route>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut routes = Vec::new();
    for row in rdr.deserialize() {
        routes.push(row?);
    }
    Ok(routes)
}

pub fn load_routes_csv(path: impl AsRef<Path>) -> Result<Vec<Route>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open routes file '{}'", path.display()))?;
    let routes = read_routes(file)
        .with_context(|| format!("failed to parse routes file '{}'", path.display()))?;
    info!(count = routes.len(), path = %path.display(), "Loaded GTFS routes");
    Ok(routes)
}

/// Saves every route into `repo`, returning how many were stored.
pub async fn seed_routes<R: Repository<Route>>(
    repo: &R,
    routes: Vec<Route>,
) -> Result<usize, StorageError> {
    let mut stored = 0;
    for route in routes {
        repo.save(route).await?;
        stored += 1;
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRepository;

    const ROUTES_TXT: &str = "\
route_id,agency_id,route_short_name,route_long_name,route_type,route_color
160013,1,52,Os. Piastów - Czerwone Maki P+R,3,
ROUTE_001,1, 4 ,Bronowice Małe - Wzgórza Krzesławickie,0,0000FF
";

    #[test]
    fn test_read_routes() {
        let routes = read_routes(ROUTES_TXT.as_bytes()).unwrap();

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].route_id, "160013");
        assert_eq!(routes[0].route_type, 3);
        assert_eq!(routes[0].route_color, None);
        assert_eq!(routes[1].route_short_name.as_deref(), Some("4"));
        assert_eq!(routes[1].route_color.as_deref(), Some("0000FF"));
        assert_eq!(routes[1].route_url, None);
    }

    #[test]
    fn test_read_routes_rejects_missing_route_type() {
        let bad = "route_id,route_short_name\nR1,1\n";
        assert!(read_routes(bad.as_bytes()).is_err());
    }

    #[tokio::test]
    async fn test_seed_routes() {
        let repo: InMemoryRepository<Route> = InMemoryRepository::new();
        let stored = seed_routes(&repo, read_routes(ROUTES_TXT.as_bytes()).unwrap())
            .await
            .unwrap();

        assert_eq!(stored, 2);
        assert!(repo.exists(&"160013".to_string()).await.unwrap());
        assert!(!repo.exists(&"999".to_string()).await.unwrap());
    }
}
