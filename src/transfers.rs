//! Transfer recommender.
//!
//! Enumerates one-for-one swaps between the current squad and the best
//! unowned players in each position, keeps the legal ones and ranks them by
//! composite-score gain.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::rules::team_counts;
use crate::types::{Player, Position, TransferCandidate};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Candidates considered per position. Bounds the squad × pool search.
pub const CANDIDATES_PER_POSITION: usize = 20;
/// Suggestions shown to the user by default.
pub const DISPLAY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub candidates_per_position: usize,
    pub display_limit: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            candidates_per_position: CANDIDATES_PER_POSITION,
            display_limit: DISPLAY_LIMIT,
        }
    }
}

// ---------------------------------------------------------------------------
// Recommender
// ---------------------------------------------------------------------------

pub struct TransferRecommender {
    config: TransferConfig,
    team_max: usize,
}

impl TransferRecommender {
    pub fn new(config: TransferConfig, team_max: usize) -> Self {
        Self { config, team_max }
    }

    /// All legal swaps, best gain first. Empty when nothing is legal.
    ///
    /// `spare_budget` is the cash in the bank; the outgoing player's price is
    /// added on top of it.
    pub fn recommend(
        &self,
        squad: &[Player],
        pool: &[Player],
        spare_budget: Decimal,
    ) -> Vec<TransferCandidate> {
        let available = unused_players(squad, pool);
        let shortlists: Vec<(Position, Vec<&Player>)> = Position::ALL
            .iter()
            .map(|&pos| (pos, self.top_candidates(pos, &available)))
            .collect();

        let mut transfers = Vec::new();
        let mut rejected = 0usize;
        for out in squad {
            let Some((_, candidates)) = shortlists.iter().find(|(pos, _)| *pos == out.position)
            else {
                continue;
            };
            for &candidate in candidates {
                if self.is_valid_transfer(candidate, out, squad, spare_budget) {
                    transfers.push(TransferCandidate {
                        player_out: out.clone(),
                        player_in: candidate.clone(),
                    });
                } else {
                    rejected += 1;
                }
            }
        }

        transfers.sort_by(|a, b| b.gain().total_cmp(&a.gain()));

        info!(
            squad = squad.len(),
            pool = available.len(),
            legal = transfers.len(),
            rejected,
            "Transfer candidates ranked"
        );
        transfers
    }

    /// Like [`recommend`](Self::recommend), truncated to the display limit.
    pub fn top(&self, squad: &[Player], pool: &[Player], spare_budget: Decimal) -> Vec<TransferCandidate> {
        let mut transfers = self.recommend(squad, pool, spare_budget);
        transfers.truncate(self.config.display_limit);
        transfers
    }

    /// Highest-scoring players at `position`, at most
    /// `candidates_per_position` of them.
    pub fn top_candidates<'a>(&self, position: Position, players: &[&'a Player]) -> Vec<&'a Player> {
        let mut valid: Vec<&Player> = players
            .iter()
            .copied()
            .filter(|p| p.position == position)
            .collect();
        valid.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
        valid.truncate(self.config.candidates_per_position);
        valid
    }

    /// Legality of swapping `player_out` for `player_in`:
    /// same position, the incoming club stays within `team_max`, and the
    /// outgoing price plus `spare_budget` covers the incoming price.
    pub fn is_valid_transfer(
        &self,
        player_in: &Player,
        player_out: &Player,
        squad: &[Player],
        spare_budget: Decimal,
    ) -> bool {
        if player_in.position != player_out.position {
            return false;
        }

        let occupancy = team_counts(squad).get(&player_in.team).copied().unwrap_or(0);
        let remaining = occupancy - usize::from(player_out.team == player_in.team && occupancy > 0);
        if remaining >= self.team_max {
            debug!(
                player_in = player_in.id,
                team = player_in.team,
                remaining,
                "Transfer breaks team limit"
            );
            return false;
        }

        if player_in.cost > player_out.cost + spare_budget {
            return false;
        }

        true
    }
}

/// Pool players not already in the squad (by id).
pub fn unused_players<'a>(squad: &[Player], pool: &'a [Player]) -> Vec<&'a Player> {
    let owned: HashSet<u32> = squad.iter().map(|p| p.id).collect();
    pool.iter().filter(|p| !owned.contains(&p.id)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::tenths;
    use rust_decimal_macros::dec;

    // ---- helpers -----------------------------------------------------------

    /// 2 GK, 5 DEF, 5 MID, 3 FWD; one player per team (teams 1..=15),
    /// every player costs 6.0 and scores 50.0.
    fn make_squad() -> Vec<Player> {
        let layout = [
            (Position::Goalkeeper, 2),
            (Position::Defender, 5),
            (Position::Midfielder, 5),
            (Position::Forward, 3),
        ];
        let mut squad = Vec::new();
        let mut id = 1;
        for (pos, n) in layout {
            for _ in 0..n {
                squad.push(Player::sample(id, pos, id, dec!(6.0), 50.0));
                id += 1;
            }
        }
        squad
    }

    fn recommender() -> TransferRecommender {
        TransferRecommender::new(TransferConfig::default(), 3)
    }

    // ---- tests -------------------------------------------------------------

    #[test]
    fn test_empty_pool_no_transfers() {
        assert!(recommender().recommend(&make_squad(), &[], dec!(5)).is_empty());
    }

    #[test]
    fn test_owned_players_not_suggested() {
        let squad = make_squad();
        let transfers = recommender().recommend(&squad, &squad, dec!(100));
        assert!(transfers.is_empty());
    }

    #[test]
    fn test_position_must_match() {
        let squad = make_squad();
        let pool = vec![Player::sample(100, Position::Forward, 20, dec!(6.0), 90.0)];
        let transfers = recommender().recommend(&squad, &pool, Decimal::ZERO);
        assert_eq!(transfers.len(), 3);
        assert!(transfers.iter().all(|t| t.player_out.position == Position::Forward));
    }

    #[test]
    fn test_fourth_player_from_team_rejected() {
        let mut squad = make_squad();
        // Three defenders from team 16.
        for p in squad.iter_mut().filter(|p| p.position == Position::Defender).take(3) {
            p.team = 16;
        }
        let pool = vec![Player::sample(100, Position::Defender, 16, dec!(5.0), 99.0)];
        let transfers = recommender().recommend(&squad, &pool, dec!(10));
        // Only swaps that send out one of the team-16 defenders are legal.
        assert_eq!(transfers.len(), 3);
        assert!(transfers.iter().all(|t| t.player_out.team == 16));

        // Midfielders and forwards from team 16 can never come in.
        let pool = vec![Player::sample(101, Position::Midfielder, 16, dec!(5.0), 99.0)];
        assert!(recommender().recommend(&squad, &pool, dec!(10)).is_empty());
    }

    #[test]
    fn test_third_player_from_team_allowed() {
        let mut squad = make_squad();
        for p in squad.iter_mut().filter(|p| p.position == Position::Defender).take(2) {
            p.team = 16;
        }
        let pool = vec![Player::sample(100, Position::Midfielder, 16, dec!(5.0), 99.0)];
        assert_eq!(recommender().recommend(&squad, &pool, dec!(10)).len(), 5);
    }

    #[test]
    fn test_budget_covers_price() {
        let squad = make_squad();
        let rec = recommender();
        let expensive = Player::sample(100, Position::Forward, 20, dec!(9.0), 90.0);
        let out = &squad[12];
        assert!(!rec.is_valid_transfer(&expensive, out, &squad, dec!(2.9)));
        assert!(rec.is_valid_transfer(&expensive, out, &squad, dec!(3.0)));
    }

    #[test]
    fn test_exactly_affordable_swap_allowed() {
        // 5.1 out plus 0.1 in the bank buys a 5.2 player with nothing left.
        let mut squad = make_squad();
        squad[12].cost = tenths(51);
        let out = squad[12].clone();
        let incoming = Player::sample(100, Position::Forward, 20, tenths(52), 90.0);
        let rec = recommender();
        assert!(rec.is_valid_transfer(&incoming, &out, &squad, tenths(1)));
        assert!(!rec.is_valid_transfer(&incoming, &out, &squad, Decimal::ZERO));

        let transfers = rec.recommend(&squad, &[incoming], tenths(1));
        assert!(transfers.iter().any(|t| t.player_out.id == out.id));
    }

    #[test]
    fn test_clear_upgrade_ranked_first() {
        let mut squad = make_squad();
        squad[8].composite_score = 5.0; // a weak midfielder, team 9
        let pool = vec![
            Player::sample(100, Position::Midfielder, 20, dec!(6.0), 95.0),
            Player::sample(101, Position::Midfielder, 19, dec!(6.0), 55.0),
            Player::sample(102, Position::Forward, 18, dec!(6.0), 60.0),
        ];
        let transfers = recommender().recommend(&squad, &pool, dec!(0.5));
        assert_eq!(transfers[0].player_out.id, squad[8].id);
        assert_eq!(transfers[0].player_in.id, 100);
        assert!(transfers.windows(2).all(|w| w[0].gain() >= w[1].gain()));
    }

    #[test]
    fn test_top_candidates_truncated() {
        let rec = TransferRecommender::new(
            TransferConfig {
                candidates_per_position: 3,
                ..TransferConfig::default()
            },
            3,
        );
        let pool: Vec<Player> = (1..=10)
            .map(|id| Player::sample(id, Position::Defender, id, dec!(5.0), f64::from(id)))
            .collect();
        let refs: Vec<&Player> = pool.iter().collect();
        let top = rec.top_candidates(Position::Defender, &refs);
        let ids: Vec<u32> = top.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![10, 9, 8]);
        assert!(rec.top_candidates(Position::Forward, &refs).is_empty());
    }

    #[test]
    fn test_display_limit() {
        let squad = make_squad();
        let pool: Vec<Player> = (100..130)
            .map(|id| Player::sample(id, Position::Defender, 20, dec!(6.0), f64::from(id)))
            .collect();
        let rec = recommender();
        // 5 defenders × 20 shortlisted candidates
        assert_eq!(rec.recommend(&squad, &pool, Decimal::ZERO).len(), 100);
        assert_eq!(rec.top(&squad, &pool, Decimal::ZERO).len(), DISPLAY_LIMIT);
    }

    #[test]
    fn test_defaults() {
        let config = TransferConfig::default();
        assert_eq!(config.candidates_per_position, 20);
        assert_eq!(config.display_limit, 10);
    }
}
