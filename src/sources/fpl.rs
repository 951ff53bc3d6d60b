//! Fantasy Premier League public API.
//!
//! Unauthenticated endpoints only:
//! - `bootstrap-static/`: every player (`elements`) and the gameweek calendar
//! - `entry/{id}/`: a manager's overall rank and classic leagues
//! - `leagues-classic/{id}/standings/`: one page of a classic league table
//!
//! Base URL: https://fantasy.premierleague.com/api/
//! Auth: Not required.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{number_or_string, tenths, PlayerSource};
use crate::rating::RatingEngine;
use crate::types::{Player, Position};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://fantasy.premierleague.com/api";
const SOURCE_NAME: &str = "fpl";

// ---------------------------------------------------------------------------
// API response types (bootstrap-static JSON → Rust)
// ---------------------------------------------------------------------------

/// `bootstrap-static` response. Only the fields we need.
#[derive(Debug, Deserialize)]
pub struct BootstrapStatic {
    pub elements: Vec<Element>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// A player entry.
#[derive(Debug, Deserialize)]
pub struct Element {
    pub id: u32,
    pub web_name: String,
    /// Price in tenths.
    pub now_cost: i64,
    #[serde(default)]
    pub total_points: i32,
    /// 1 = GK, 2 = DEF, 3 = MID, 4 = FWD (5 = manager in some seasons).
    pub element_type: u8,
    pub team: u32,
    #[serde(default, deserialize_with = "number_or_string")]
    pub points_per_game: f64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub selected_by_percent: f64,
}

/// A gameweek.
#[derive(Debug, Deserialize)]
pub struct Event {
    pub id: u32,
    #[serde(default)]
    pub is_current: bool,
}

impl BootstrapStatic {
    /// The gameweek currently in progress, if the season has started.
    pub fn current_gameweek(&self) -> Option<u32> {
        self.events.iter().find(|e| e.is_current).map(|e| e.id)
    }

    /// Convert elements into rated players. Entries with an unknown
    /// `element_type` are skipped.
    pub fn into_players(self, rating: &RatingEngine) -> Vec<Player> {
        let total = self.elements.len();
        let mut players: Vec<Player> = self
            .elements
            .into_iter()
            .filter_map(|e| {
                let Some(position) = Position::from_id(e.element_type) else {
                    debug!(id = e.id, element_type = e.element_type, "Skipping non-player element");
                    return None;
                };
                Some(Player {
                    id: e.id,
                    name: e.web_name,
                    cost: tenths(e.now_cost),
                    total_points: e.total_points,
                    position,
                    team: e.team,
                    ppg: e.points_per_game,
                    ownership: e.selected_by_percent,
                    composite_score: 0.0,
                    sell_cost: None,
                })
            })
            .collect();
        if players.len() < total {
            warn!(skipped = total - players.len(), "Elements without a playing position");
        }
        rating.refresh(&mut players);
        players
    }
}

/// Parse a raw `bootstrap-static` body.
pub fn parse_bootstrap(json: &str) -> Result<BootstrapStatic> {
    serde_json::from_str(json).context("Failed to parse bootstrap-static response")
}

// ---------------------------------------------------------------------------
// API response types (entry + league standings)
// ---------------------------------------------------------------------------

/// `entry/{id}/` response: a manager's public summary.
#[derive(Debug, Clone, Deserialize)]
pub struct EntrySummary {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// `None` before the first gameweek is scored.
    #[serde(default)]
    pub summary_overall_rank: Option<u64>,
    #[serde(default)]
    pub leagues: EntryLeagues,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryLeagues {
    #[serde(default)]
    pub classic: Vec<ClassicLeague>,
}

/// A classic league the manager belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassicLeague {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub entry_rank: Option<u64>,
}

/// `leagues-classic/{id}/standings/` response.
#[derive(Debug, Deserialize)]
pub struct LeagueStandings {
    pub standings: StandingsPage,
}

#[derive(Debug, Deserialize)]
pub struct StandingsPage {
    #[serde(default)]
    pub has_next: bool,
    pub results: Vec<Standing>,
}

/// One row of a league table.
#[derive(Debug, Clone, Deserialize)]
pub struct Standing {
    /// Manager (entry) id.
    pub entry: u64,
    pub entry_name: String,
    pub player_name: String,
    pub rank: u64,
    pub total: i64,
}

/// Parse a raw `entry/{id}/` body.
pub fn parse_entry(json: &str) -> Result<EntrySummary> {
    serde_json::from_str(json).context("Failed to parse entry response")
}

/// Parse a raw league standings body into its result rows.
pub fn parse_league_standings(json: &str) -> Result<Vec<Standing>> {
    let page: LeagueStandings =
        serde_json::from_str(json).context("Failed to parse league standings response")?;
    if page.standings.has_next {
        debug!(rows = page.standings.results.len(), "Standings truncated to the first page");
    }
    Ok(page.standings.results)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Fantasy Premier League API client.
pub struct FplClient {
    http: Client,
    base_url: String,
    rating: RatingEngine,
}

impl FplClient {
    pub fn new(base_url: Option<String>, timeout_secs: u64, rating: RatingEngine) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent("GAFFER/0.1.0 (squad-optimizer)")
            .build()
            .context("Failed to build HTTP client for the FPL API")?;

        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            rating,
        })
    }

    /// GET `{base}/{path}` and hand the body to `parse`.
    async fn get<T>(&self, path: &str, parse: fn(&str) -> Result<T>) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        debug!(url = %url, "Fetching from FPL API");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("FPL API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("FPL API error {status} for {path}: {body}");
        }

        let body = resp
            .text()
            .await
            .with_context(|| format!("Failed to read {path} body"))?;
        parse(&body)
    }

    /// Fetch and parse `bootstrap-static`.
    pub async fn bootstrap(&self) -> Result<BootstrapStatic> {
        self.get("bootstrap-static/", parse_bootstrap).await
    }

    /// A manager's public summary.
    pub async fn entry(&self, entry_id: u64) -> Result<EntrySummary> {
        self.get(&format!("entry/{entry_id}/"), parse_entry).await
    }

    /// Classic leagues the manager is in.
    pub async fn current_user_leagues(&self, entry_id: u64) -> Result<Vec<ClassicLeague>> {
        Ok(self.entry(entry_id).await?.leagues.classic)
    }

    /// The manager's overall rank, `None` before any gameweek is scored.
    pub async fn current_user_rank(&self, entry_id: u64) -> Result<Option<u64>> {
        Ok(self.entry(entry_id).await?.summary_overall_rank)
    }

    /// First page of a classic league table.
    pub async fn league_standings(&self, league_id: u64) -> Result<Vec<Standing>> {
        let rows = self
            .get(
                &format!("leagues-classic/{league_id}/standings/"),
                parse_league_standings,
            )
            .await?;
        info!(league = league_id, rows = rows.len(), "League standings fetched");
        Ok(rows)
    }
}

#[async_trait]
impl PlayerSource for FplClient {
    async fn fetch_players(&self) -> Result<Vec<Player>> {
        let data = self.bootstrap().await?;
        let gameweek = data.current_gameweek();
        let players = data.into_players(&self.rating);
        info!(
            players = players.len(),
            gameweek = ?gameweek,
            "Player catalog fetched"
        );
        Ok(players)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
