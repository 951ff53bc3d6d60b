//! Full pipeline: fetch players, build a squad, recommend transfers.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use gaffer::optimizer::chips::{bench_boost_value, choose_captains, ChipType};
use gaffer::optimizer::SquadOptimizer;
use gaffer::rules::{team_counts, SquadRules};
use gaffer::sources::{PlayerSource, SquadSource};
use gaffer::storage::{self, CachedCatalog, CatalogSnapshot};
use gaffer::transfers::{TransferConfig, TransferRecommender};
use gaffer::types::{EngineError, OwnedSquad, Player, Position, Squad};

use crate::fixtures::{league, player, InMemorySource, TEAM_A};
use crate::mock_sources::{MockPlayers, MockSquad};

fn build(players: &[Player], budget: Decimal, chip: ChipType) -> Result<Squad, EngineError> {
    SquadOptimizer::new(SquadRules::default()).build_squad(players, budget, 0.5, chip)
}

/// An owned squad made from a built one: everything sells for 0.1 under
/// its price.
fn owned_from(squad: &Squad, bank: Decimal) -> OwnedSquad {
    let players = squad
        .players()
        .cloned()
        .map(|mut p| {
            p.sell_cost = Some(p.cost - dec!(0.1));
            p
        })
        .collect();
    OwnedSquad { players, bank }
}

#[tokio::test]
async fn test_squad_from_source() {
    let source = InMemorySource::new(league(10));
    let players = source.fetch_players().await.unwrap();

    let started = Instant::now();
    let squad = build(&players, dec!(100), ChipType::FreeHit).unwrap();
    assert!(started.elapsed() < Duration::from_secs(60));
    let rules = SquadRules::default();
    rules.validate(&squad, dec!(100)).unwrap();
    assert_eq!(squad.starters.len(), 11);
    assert_eq!(squad.bench.len(), 4);
    assert!(squad.starter_cost <= squad.starter_budget);

    let captains = choose_captains(&squad.starters).unwrap();
    let best = squad
        .starters
        .iter()
        .map(|p| p.composite_score)
        .fold(f64::MIN, f64::max);
    assert_eq!(captains.captain.composite_score, best);
    assert_ne!(captains.captain.id, captains.vice_captain.id);

    let all = squad.clone().into_players();
    let bench_total: f64 = squad.bench.iter().map(|p| p.composite_score).sum();
    assert!((bench_boost_value(&all, rules.lineup_size) - bench_total).abs() < 1e-9);
}

#[tokio::test]
async fn test_mocked_player_source() {
    let mut source = MockPlayers::new();
    source
        .expect_fetch_players()
        .times(1)
        .returning(|| Ok(league(8)));

    let players = source.fetch_players().await.unwrap();
    let squad = build(&players, dec!(100), ChipType::FreeHit).unwrap();
    SquadRules::default().validate(&squad, dec!(100)).unwrap();
}

#[tokio::test]
async fn test_source_error_propagates() {
    let mut source = MockPlayers::new();
    source
        .expect_fetch_players()
        .returning(|| Err(anyhow::anyhow!("bootstrap-static returned 503")));

    let err = source.fetch_players().await.unwrap_err();
    assert!(err.to_string().contains("503"));
}

#[test]
fn test_wildcard_has_no_scoring() {
    let players = league(10);
    let err = build(&players, dec!(100), ChipType::Wildcard).unwrap_err();
    assert_eq!(err, EngineError::UnknownScoringVariant("wildcard".into()));
}

#[test]
fn test_thin_pool_is_infeasible() {
    // Two clubs cannot supply fifteen players under a three-per-club cap.
    let players = league(2);
    let err = build(&players, dec!(100), ChipType::FreeHit).unwrap_err();
    assert!(matches!(err, EngineError::Infeasible { .. }));
}

#[tokio::test]
async fn test_rebuild_budget_free_hit() {
    let pool = league(10);
    let current = build(&pool, dec!(95), ChipType::FreeHit).unwrap();

    let mut squad_source = MockSquad::new();
    let owned = owned_from(&current, dec!(1.5));
    squad_source
        .expect_fetch_squad()
        .times(1)
        .returning(move || Ok(owned.clone()));

    let owned = squad_source.fetch_squad().await.unwrap();
    let budget = owned.rebuild_budget();
    assert_eq!(budget, current.total_cost() - dec!(1.5) + dec!(1.5));

    let rebuilt = build(&pool, budget, ChipType::FreeHit).unwrap();
    SquadRules::default().validate(&rebuilt, budget).unwrap();
}

#[tokio::test]
async fn test_transfers_from_owned_squad() {
    let pool = league(10);
    let current = build(&pool, dec!(90), ChipType::FreeHit).unwrap();
    let source = InMemorySource::new(pool.clone()).with_squad(owned_from(&current, dec!(0.5)));
    let owned = source.fetch_squad().await.unwrap();

    let recommender = TransferRecommender::new(TransferConfig::default(), 3);
    let transfers = recommender.recommend(&owned.players, &pool, owned.bank);
    assert!(!transfers.is_empty());

    let owned_ids: HashSet<u32> = owned.players.iter().map(|p| p.id).collect();
    for t in &transfers {
        assert_eq!(t.player_in.position, t.player_out.position);
        assert!(!owned_ids.contains(&t.player_in.id));
        assert!(t.player_in.cost <= t.player_out.cost + owned.bank);

        let after: Vec<&Player> = owned
            .players
            .iter()
            .filter(|p| p.id != t.player_out.id)
            .chain(std::iter::once(&t.player_in))
            .collect();
        assert!(team_counts(after).values().all(|&n| n <= 3));
    }
    for pair in transfers.windows(2) {
        assert!(pair[0].gain() >= pair[1].gain());
    }

    let top = recommender.top(&owned.players, &pool, owned.bank);
    assert!(top.len() <= 10);
    assert_eq!(top[0].gain(), transfers[0].gain());
}

/// Three team-A players already owned: a team-A signing is only legal when
/// it replaces one of them.
#[test]
fn test_full_team_only_swaps_within_team() {
    let mut squad = Vec::new();
    let mut id = 100;
    let layout = [
        (Position::Goalkeeper, 2),
        (Position::Defender, 5),
        (Position::Midfielder, 5),
        (Position::Forward, 3),
    ];
    let mut team = 2;
    for (pos, n) in layout {
        for _ in 0..n {
            squad.push(player(id, pos, team, dec!(6.0), 40.0));
            id += 1;
            team += 1;
        }
    }
    // Make one defender, one midfielder and one forward team A.
    for p in squad.iter_mut() {
        if p.id == 102 || p.id == 107 || p.id == 112 {
            p.team = TEAM_A;
        }
    }
    assert_eq!(team_counts(&squad).get(&TEAM_A), Some(&3));

    let star = player(1, Position::Forward, TEAM_A, dec!(5.0), 200.0);
    let pricey = player(2, Position::Forward, 30, dec!(15.0), 300.0);
    let mut pool = squad.clone();
    pool.push(star.clone());
    pool.push(pricey.clone());

    let recommender = TransferRecommender::new(TransferConfig::default(), 3);
    let transfers = tokio_test::block_on(async {
        let source = InMemorySource::new(pool);
        let pool = source.fetch_players().await.unwrap();
        recommender.recommend(&squad, &pool, dec!(0.5))
    });

    let with_star: Vec<_> = transfers
        .iter()
        .filter(|t| t.player_in.id == star.id)
        .collect();
    assert_eq!(with_star.len(), 1);
    assert_eq!(with_star[0].player_out.id, 112);
    assert_eq!(transfers[0].player_in.id, star.id);

    assert!(transfers.iter().all(|t| t.player_in.id != pricey.id));
}

#[tokio::test]
async fn test_cached_catalog_feeds_optimizer() {
    let mut path = std::env::temp_dir();
    path.push(format!("gaffer_it_catalog_{}.json", uuid::Uuid::new_v4()));
    let path = path.to_string_lossy().to_string();

    storage::save_catalog(&CatalogSnapshot::new(league(10)), Some(&path)).unwrap();
    let players = CachedCatalog::new(path.clone()).fetch_players().await.unwrap();
    assert_eq!(players.len(), 100);

    let squad = build(&players, dec!(100), ChipType::FreeHit).unwrap();
    SquadRules::default().validate(&squad, dec!(100)).unwrap();

    storage::delete_catalog(Some(&path)).unwrap();
}
