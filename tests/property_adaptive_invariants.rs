use proptest::prelude::*;

use adaptive_backend::adaptive::config::{IrtConfig, KMeansConfig};
use adaptive_backend::adaptive::types::{
    AttemptMetrics, DifficultyTier, PlayerFeatureVector, StruggleStatus,
};
use adaptive_backend::adaptive::{dda, irt, kmeans};

fn tier_strategy() -> impl Strategy<Value = DifficultyTier> {
    prop_oneof![
        Just(DifficultyTier::Easy),
        Just(DifficultyTier::Medium),
        Just(DifficultyTier::Hard),
    ]
}

fn status_strategy() -> impl Strategy<Value = StruggleStatus> {
    prop_oneof![
        Just(StruggleStatus::NotStruggling),
        Just(StruggleStatus::MediumStruggling),
        Just(StruggleStatus::SuperStruggling),
    ]
}

fn players_strategy() -> impl Strategy<Value = Vec<PlayerFeatureVector>> {
    prop::collection::vec((0.0_f64..1.0, 0.0_f64..1.0), 1..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (theta, win))| PlayerFeatureVector {
                id: format!("p{i}"),
                adjusted_theta: theta,
                probability: win,
                success_rate: win,
                fail_rate: 1.0 - win,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn pt_probability_stays_in_unit_interval(
        time in 0.0_f64..100_000.0,
        errors in 0_u32..10_000,
        hints in 0_u32..10_000,
    ) {
        let cfg = IrtConfig::default();
        let r = irt::estimate(&AttemptMetrics { time, errors, hints }, &cfg);
        prop_assert!(r.probability >= 0.0 && r.probability <= 1.0);
        prop_assert!(r.theta <= 0.0);
    }

    #[test]
    fn pt_more_errors_never_raise_probability(
        time in 0.0_f64..600.0,
        errors in 0_u32..50,
        hints in 0_u32..50,
        extra in 1_u32..20,
    ) {
        let cfg = IrtConfig::default();
        let base = irt::estimate(&AttemptMetrics { time, errors, hints }, &cfg);
        let worse = irt::estimate(&AttemptMetrics { time, errors: errors + extra, hints }, &cfg);
        prop_assert!(worse.probability <= base.probability);
    }

    #[test]
    fn pt_more_hints_or_time_never_raise_probability(
        time in 0.0_f64..600.0,
        extra_time in 0.0_f64..600.0,
        errors in 0_u32..50,
        hints in 0_u32..50,
        extra_hints in 0_u32..20,
    ) {
        let cfg = IrtConfig::default();
        let base = irt::estimate(&AttemptMetrics { time, errors, hints }, &cfg);
        let worse = irt::estimate(
            &AttemptMetrics { time: time + extra_time, errors, hints: hints + extra_hints },
            &cfg,
        );
        prop_assert!(worse.probability <= base.probability);
    }

    #[test]
    fn pt_clean_fast_attempt_is_not_struggling(time in 0.0_f64..=60.0) {
        let cfg = IrtConfig::default();
        let r = irt::estimate(&AttemptMetrics { time, errors: 0, hints: 0 }, &cfg);
        prop_assert_eq!(r.status, StruggleStatus::NotStruggling);
    }

    #[test]
    fn pt_dda_moves_at_most_one_step(status in status_strategy(), current in tier_strategy()) {
        let result = dda::adjust(status, current);
        let delta = result.new_difficulty.index() - current.index();
        prop_assert!((-1..=1).contains(&delta));
        prop_assert_eq!(result.difficulty_changed, result.new_difficulty != current);
        match status {
            StruggleStatus::SuperStruggling => prop_assert!(result.new_difficulty <= current),
            StruggleStatus::MediumStruggling => prop_assert_eq!(result.new_difficulty, current),
            StruggleStatus::NotStruggling => prop_assert!(result.new_difficulty >= current),
        }
    }

    #[test]
    fn pt_kmeans_is_deterministic_and_bounded(players in players_strategy(), k in 1_usize..8) {
        let cfg = KMeansConfig::default();
        let first = kmeans::cluster(&players, k, &cfg).unwrap();
        let second = kmeans::cluster(&players, k, &cfg).unwrap();

        prop_assert_eq!(&first.players, &second.players);
        prop_assert!(first.cluster_count >= 1);
        prop_assert!(first.cluster_count <= k.min(players.len()));
        prop_assert_eq!(first.players.len(), players.len());
        prop_assert!(first.players.iter().all(|a| a.cluster < first.cluster_count));
    }
}
