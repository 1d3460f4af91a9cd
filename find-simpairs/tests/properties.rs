//! Property-based and statistical tests across the signature pipeline.
use band_join::banding::candidate_pairs;
use band_join::{LshParams, SignatureMatrix};
use find_simpairs::evaluation::{compare, estimate_curve, recommend_num_hashes};
use find_simpairs::shingling::{KGramMode, ShingleConfig};
use find_simpairs::MinHashConfig;
use hashbrown::HashSet;
use lsh::{jaccard_of_sets, jaccard_similarity};
use proptest::prelude::*;

fn range_set(start: u64, end: u64) -> HashSet<u64> {
    (start..end).collect()
}

fn estimate(config: MinHashConfig, x: &HashSet<u64>, y: &HashSet<u64>) -> f64 {
    let hasher = config.hasher().unwrap();
    hasher
        .signature(x.iter())
        .estimate_jaccard(&hasher.signature(y.iter()))
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn jaccard_symmetric_and_bounded(
        x in prop::collection::vec(0u64..50, 0..30),
        y in prop::collection::vec(0u64..50, 0..30),
    ) {
        let xy = jaccard_similarity(x.iter(), y.iter());
        let yx = jaccard_similarity(y.iter(), x.iter());
        prop_assert_eq!(xy, yx);
        prop_assert!((0. ..=1.).contains(&xy));
        prop_assert_eq!(jaccard_similarity(x.iter(), x.iter()), 1.);
    }

    #[test]
    fn identical_sets_estimate_one(
        x in prop::collection::vec(any::<u64>(), 0..40),
        seed in any::<u64>(),
    ) {
        let config = MinHashConfig::new(32).seed(seed);
        let x: HashSet<u64> = x.into_iter().collect();
        let mut y: Vec<u64> = x.iter().copied().collect();
        y.reverse();
        let y: HashSet<u64> = y.into_iter().collect();
        prop_assert_eq!(estimate(config, &x, &y), 1.);
    }

    #[test]
    fn shorter_signature_is_prefix(
        x in prop::collection::vec(any::<u64>(), 1..40),
        seed in any::<u64>(),
        short in 1usize..20,
    ) {
        let config = MinHashConfig::new(40).seed(seed);
        let long = config.hasher().unwrap().signature(x.iter());
        let short_sig = config.num_hashes(short).hasher().unwrap().signature(x.iter());
        prop_assert_eq!(&long[..short], short_sig.values());
    }

    #[test]
    fn identical_signatures_are_candidates(
        signature in prop::collection::vec(0u64..100, 24),
        other in prop::collection::vec(0u64..100, 24),
        rows in prop::sample::select(vec![1usize, 2, 3, 4, 6, 8, 12, 24]),
    ) {
        let mut matrix = SignatureMatrix::new(24);
        matrix.add(0, signature.clone()).unwrap();
        matrix.add(1, other).unwrap();
        matrix.add(2, signature).unwrap();
        let params = LshParams::new(24 / rows, rows).unwrap();
        let candidates = candidate_pairs(&matrix, params).unwrap();
        prop_assert!(candidates.contains(&0, &2));
    }

    #[test]
    fn error_counts_partition_predictions(
        predicted in prop::collection::hash_set((0u8..10, 0u8..10), 0..30),
        truth in prop::collection::hash_set((0u8..10, 0u8..10), 0..30),
    ) {
        let predicted: HashSet<_> = predicted.into_iter().collect();
        let truth: HashSet<_> = truth.into_iter().collect();
        let counts = compare(&predicted, &truth);
        let true_positives = predicted.intersection(&truth).count();
        prop_assert_eq!(counts.false_positives + true_positives, predicted.len());
        prop_assert_eq!(counts.false_negatives + true_positives, truth.len());
    }
}

#[test]
fn test_sentence_trigrams() {
    let shingler = ShingleConfig::new(KGramMode::Char, 3).unwrap();
    let x = shingler.extract("the cat sat");
    let y = shingler.extract("the cat ran");
    assert_eq!(jaccard_of_sets(&x, &y), 0.5);

    let hasher = MinHashConfig::new(600).seed(42).hasher().unwrap();
    let approx = hasher
        .signature(x.iter())
        .estimate_jaccard(&hasher.signature(y.iter()))
        .unwrap();
    assert!((approx - 0.5).abs() <= 0.05, "approx={approx}");
}

#[test]
fn test_error_shrinks_with_signature_length() {
    // Exact similarity is 0.5.
    let x = range_set(0, 120);
    let y = range_set(40, 160);
    let mean_error = |t: usize| {
        let total: f64 = (0..30)
            .map(|seed| (estimate(MinHashConfig::new(t).seed(seed), &x, &y) - 0.5).abs())
            .sum();
        total / 30.
    };
    let bounds = [(20, 0.10), (60, 0.07), (150, 0.05), (300, 0.045), (600, 0.045)];
    let errors: Vec<f64> = bounds.iter().map(|&(t, _)| mean_error(t)).collect();
    for (&(t, bound), &error) in bounds.iter().zip(&errors) {
        assert!(error <= bound, "t={t}, error={error}, bound={bound}");
    }
    assert!(errors[4] < errors[0], "errors={errors:?}");
}

#[test]
fn test_banding_rate_follows_s_curve() {
    // (sets, bands, rows); exact similarities are 0.5, 1/3 and 0.8.
    let cases = [
        ((0, 120, 40, 160), 20, 5),
        ((0, 120, 40, 160), 25, 4),
        ((0, 100, 50, 150), 25, 4),
        ((0, 100, 50, 150), 10, 10),
        ((0, 180, 20, 200), 20, 5),
    ];
    let trials = 200;
    for ((x_start, x_end, y_start, y_end), bands, rows) in cases {
        let x = range_set(x_start, x_end);
        let y = range_set(y_start, y_end);
        let params = LshParams::new(bands, rows).unwrap();
        let expected = params.probability(jaccard_of_sets(&x, &y)).unwrap();

        let mut hits = 0;
        for seed in 0..trials {
            let hasher = MinHashConfig::new(100).seed(seed).hasher().unwrap();
            let mut matrix = SignatureMatrix::new(100);
            matrix.add("x", hasher.signature(x.iter()).into_inner()).unwrap();
            matrix.add("y", hasher.signature(y.iter()).into_inner()).unwrap();
            if !candidate_pairs(&matrix, params).unwrap().is_empty() {
                hits += 1;
            }
        }
        let rate = hits as f64 / trials as f64;
        assert!(
            (rate - expected).abs() < 0.15,
            "bands={bands}, rows={rows}, rate={rate}, expected={expected}"
        );
    }
}

#[test]
fn test_recommended_length_is_in_grid() {
    let x = range_set(0, 120);
    let y = range_set(40, 160);
    let grid = [20, 60, 150, 300, 600];
    let rows = estimate_curve(&x, &y, &grid, MinHashConfig::default()).unwrap();
    assert!(rows.iter().all(|row| row.exact == 0.5));
    let t = recommend_num_hashes(&rows).unwrap();
    assert!(grid[1..].contains(&t));
}
