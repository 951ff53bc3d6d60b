//! Catalog cache.
//!
//! Saves and loads the rated player catalog to/from a JSON file so squads
//! can be built offline between API refreshes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::sources::PlayerSource;
use crate::types::Player;

/// Default cache file path.
pub const DEFAULT_CATALOG_FILE: &str = "gaffer_catalog.json";

/// Catalog as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub players: Vec<Player>,
}

impl CatalogSnapshot {
    pub fn new(players: Vec<Player>) -> Self {
        Self {
            fetched_at: Utc::now(),
            players,
        }
    }

    /// Age of the snapshot.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }

    pub fn is_stale(&self, max_age: chrono::Duration) -> bool {
        self.age() > max_age
    }
}

/// Save a catalog to a JSON file.
pub fn save_catalog(snapshot: &CatalogSnapshot, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_CATALOG_FILE);
    let json = serde_json::to_string_pretty(snapshot)
        .context("Failed to serialise player catalog")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write catalog to {path}"))?;

    debug!(path, players = snapshot.players.len(), "Catalog saved");
    Ok(())
}

/// Load a catalog from a JSON file.
/// Returns None if the file doesn't exist (never refreshed).
pub fn load_catalog(path: Option<&str>) -> Result<Option<CatalogSnapshot>> {
    let path = path.unwrap_or(DEFAULT_CATALOG_FILE);

    if !Path::new(path).exists() {
        info!(path, "No cached catalog found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read catalog from {path}"))?;

    let snapshot: CatalogSnapshot = serde_json::from_str(&json)
        .context(format!("Failed to parse catalog from {path}"))?;

    info!(
        path,
        players = snapshot.players.len(),
        fetched_at = %snapshot.fetched_at,
        "Catalog loaded from disk"
    );

    Ok(Some(snapshot))
}

/// Delete the cache file.
pub fn delete_catalog(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_CATALOG_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete catalog file {path}"))?;
    }
    Ok(())
}

/// The cached catalog as a player source.
pub struct CachedCatalog {
    path: String,
    max_age: Option<chrono::Duration>,
}

impl CachedCatalog {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            max_age: None,
        }
    }

    /// Warn when the cache is older than `hours`. Stale data is still served.
    pub fn with_max_age_hours(mut self, hours: i64) -> Self {
        self.max_age = Some(chrono::Duration::hours(hours));
        self
    }

    /// Load the snapshot, warning if it is past its max age.
    pub fn snapshot(&self) -> Result<Option<CatalogSnapshot>> {
        let snapshot = load_catalog(Some(&self.path))?;
        if let (Some(snap), Some(max_age)) = (&snapshot, self.max_age) {
            if snap.is_stale(max_age) {
                warn!(
                    path = %self.path,
                    age_hours = snap.age().num_hours(),
                    "Cached catalog is stale; run `gaffer refresh`"
                );
            }
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl PlayerSource for CachedCatalog {
    async fn fetch_players(&self) -> Result<Vec<Player>> {
        match self.snapshot()? {
            Some(snapshot) => Ok(snapshot.players),
            None => anyhow::bail!("No cached catalog at {}; run `gaffer refresh` first", self.path),
        }
    }

    fn name(&self) -> &str {
        "cache"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
