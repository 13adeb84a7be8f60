//! Reputation fixed point and batch reprocessing behavior.

use chrono::{Duration, Utc};
use crowdrank::{
    ComparisonRecord, ItemId, MemoryStore, RankerConfig, RankingEngine, ReputationParams,
    UserId,
};

fn engine_with(store: MemoryStore) -> RankingEngine<MemoryStore> {
    let config = RankerConfig { seed: Some(7), ..RankerConfig::default() };
    RankingEngine::with_config(store, config)
}

fn comparison(reviewer: UserId, highest_first: Vec<ItemId>, offset: i64) -> ComparisonRecord {
    ComparisonRecord {
        reviewer,
        ordering: highest_first,
        new_item: None,
        is_valid: None,
        date: Utc::now() + Duration::seconds(offset),
    }
}

/// Six items whose id equals their true quality, authored by users 1..=6.
fn seeded_venue(store: &MemoryStore) {
    for item in 1..=6 {
        store.add_item(1, item, item);
    }
}

#[tokio::test]
async fn oracle_reputation_beats_noise() {
    let store = MemoryStore::new();
    seeded_venue(&store);
    // The oracle (101) and a partial helper (102) rank truthfully; the noise
    // source (103) inverts the scale.
    store.add_comparison(1, comparison(101, vec![6, 5, 4, 3, 2, 1], 1));
    store.add_comparison(1, comparison(102, vec![5, 3, 1], 2));
    store.add_comparison(1, comparison(103, vec![1, 2, 3, 4, 5, 6], 3));
    let engine = engine_with(store);

    engine
        .run_reputation(
            1,
            ReputationParams { annealing: 0.5, iterations: 4, last_comparisons: Some(10) },
        )
        .await
        .unwrap();

    let oracle = engine.store().accuracy(1, 101).unwrap();
    let noise = engine.store().accuracy(1, 103).unwrap();
    assert!(
        oracle.reputation.unwrap() > noise.reputation.unwrap(),
        "oracle {:?} vs noise {:?}",
        oracle.reputation,
        noise.reputation
    );
    assert!(oracle.accuracy > noise.accuracy);
    assert_eq!(oracle.n_ratings, 6);

    // Every submitter or reviewer holds exactly one grade row, and the
    // percentiles partition the ladder.
    let grades = engine.store().grades(1);
    assert_eq!(grades.len(), 9);
    let mut percentiles: Vec<f64> = grades.iter().map(|g| g.percentile).collect();
    percentiles.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for (i, p) in percentiles.iter().enumerate() {
        let expected = 100.0 * (i + 1) as f64 / 9.0;
        assert!((p - expected).abs() < 1e-9, "percentile {p} != {expected}");
    }

    let meta = engine.store().venue_meta(1).unwrap();
    assert!(meta.latest_rank_update_date.is_some());
    assert!(meta.latest_reviewers_evaluation_date.is_some());
    assert!(meta.latest_final_grades_evaluation_date.is_some());
    assert_eq!(
        meta.ranking_algo_description.as_deref(),
        Some("Reputation system with small alpha and only last comparisons")
    );
}

#[tokio::test]
async fn truthful_orderings_rank_the_items() {
    let store = MemoryStore::new();
    seeded_venue(&store);
    store.add_comparison(1, comparison(101, vec![6, 5, 4, 3, 2, 1], 1));
    store.add_comparison(1, comparison(102, vec![6, 4, 2], 2));
    let engine = engine_with(store);

    engine.run_reputation(1, ReputationParams::default()).await.unwrap();

    let top = engine.store().item(1, 6).unwrap();
    let bottom = engine.store().item(1, 1).unwrap();
    assert!(top.mean.unwrap() > bottom.mean.unwrap());
    assert_eq!(top.percentile, Some(100.0));
    assert!(top.stdev.unwrap() > 0.0);
}

#[tokio::test]
async fn venue_without_comparisons_stays_untouched() {
    let store = MemoryStore::new();
    seeded_venue(&store);
    let engine = engine_with(store);

    engine.run_reputation(1, ReputationParams::default()).await.unwrap();

    assert!(engine.store().grades(1).is_empty());
    let meta = engine.store().venue_meta(1).unwrap();
    assert!(meta.latest_final_grades_evaluation_date.is_none());
    assert!(engine.store().item(1, 1).unwrap().mean.is_none());
}

#[tokio::test]
async fn invalid_and_short_comparisons_are_ignored() {
    let store = MemoryStore::new();
    seeded_venue(&store);
    let mut invalid = comparison(101, vec![1, 2, 3, 4, 5, 6], 1);
    invalid.is_valid = Some(false);
    store.add_comparison(1, invalid);
    store.add_comparison(1, comparison(102, vec![4], 2));
    store.add_comparison(1, comparison(103, vec![6, 5], 3));
    let engine = engine_with(store);

    engine.run_reputation(1, ReputationParams::default()).await.unwrap();

    // Only reviewer 103 contributed, so only its ordering shaped the model.
    let grades = engine.store().grades(1);
    assert_eq!(grades.len(), 7);
    assert!(engine.store().accuracy(1, 103).is_some());
    assert!(engine.store().accuracy(1, 101).is_none());
    let top = engine.store().item(1, 6).unwrap();
    let runner_up = engine.store().item(1, 5).unwrap();
    assert!(top.mean.unwrap() > runner_up.mean.unwrap());
}

#[tokio::test]
async fn reprocess_matches_one_iteration_chronological_run() {
    let fixture = || {
        let store = MemoryStore::new();
        seeded_venue(&store);
        store.add_comparison(1, comparison(101, vec![6, 5, 4, 3, 2, 1], 1));
        store.add_comparison(1, comparison(102, vec![5, 3, 1], 2));
        store.add_comparison(1, comparison(103, vec![2, 4, 6], 3));
        store
    };

    let replay = engine_with(fixture());
    replay.reprocess(1, Some(0.5), false).await.unwrap();

    let single_pass = engine_with(fixture());
    single_pass
        .run_reputation(
            1,
            ReputationParams { annealing: 0.5, iterations: 1, last_comparisons: None },
        )
        .await
        .unwrap();

    for item in 1..=6 {
        let a = replay.store().item(1, item).unwrap();
        let b = single_pass.store().item(1, item).unwrap();
        assert!((a.mean.unwrap() - b.mean.unwrap()).abs() < 1e-9);
        assert!((a.stdev.unwrap() - b.stdev.unwrap()).abs() < 1e-9);
        assert_eq!(a.percentile, b.percentile);
    }
    assert_eq!(
        single_pass.store().venue_meta(1).unwrap().ranking_algo_description.as_deref(),
        Some("Ranking without reputation system. All comparisons are used in chronological order")
    );
}

#[tokio::test]
async fn rank_without_rep_sys_is_the_chronological_single_pass() {
    let store = MemoryStore::new();
    seeded_venue(&store);
    store.add_comparison(1, comparison(101, vec![6, 5, 4, 3, 2, 1], 1));
    let engine = engine_with(store);

    engine.rank_without_rep_sys(1).await.unwrap();

    assert_eq!(engine.store().grades(1).len(), 7);
    assert_eq!(
        engine.store().venue_meta(1).unwrap().ranking_algo_description.as_deref(),
        Some("Ranking without reputation system. All comparisons are used in chronological order")
    );
}

#[tokio::test]
async fn compute_grades_is_idempotent() {
    let store = MemoryStore::new();
    seeded_venue(&store);
    store.add_comparison(1, comparison(101, vec![6, 5, 4, 3, 2, 1], 1));
    store.add_comparison(1, comparison(102, vec![5, 3, 1], 2));
    let engine = engine_with(store);
    engine.run_reputation(1, ReputationParams::default()).await.unwrap();

    engine.compute_grades(1).await.unwrap();
    let mut first = engine.store().grades(1);
    engine.compute_grades(1).await.unwrap();
    let mut second = engine.store().grades(1);

    first.sort_by_key(|g| g.user);
    second.sort_by_key(|g| g.user);
    assert_eq!(first, second);
}

#[tokio::test]
async fn reviewer_scoring_upserts_and_deletes() {
    let store = MemoryStore::new();
    seeded_venue(&store);
    store.add_comparison(1, comparison(101, vec![6, 5, 4], 1));
    let mut retracted = comparison(102, vec![1, 2, 3], 2);
    retracted.is_valid = Some(false);
    store.add_comparison(1, retracted);
    store.seed_accuracy(
        1,
        102,
        crowdrank::UserAccuracyRecord { accuracy: 0.9, reputation: None, n_ratings: 3 },
    );
    let engine = engine_with(store);

    engine.score_reviewers(1).await.unwrap();

    let row = engine.store().accuracy(1, 101).unwrap();
    assert!(row.accuracy >= 0.0 && row.accuracy <= 1.0);
    assert_eq!(row.reputation, None);
    assert_eq!(row.n_ratings, 3);
    let meta = engine.store().venue_meta(1).unwrap();
    assert!(meta.latest_reviewers_evaluation_date.is_some());

    // Under the explicit all-comparisons scope, a reviewer left with no
    // valid ordering loses their stale accuracy row.
    engine
        .score_reviewers_with(1, crowdrank::AccuracyScope::All)
        .await
        .unwrap();
    assert!(engine.store().accuracy(1, 102).is_none());
    assert!(engine.store().accuracy(1, 101).is_some());
}
