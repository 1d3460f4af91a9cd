mod common;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use hashbrown::HashSet;

use band_join::LshParams;
use find_simpairs::config::{DEFAULT_RANGE, DEFAULT_SEED};
use find_simpairs::dataset::load_rating_sets;
use find_simpairs::evaluation::{
    exact_similarities, exact_similarities_in_parallel, pairs_at_least, Pair, TrialSummary,
};
use find_simpairs::{MinHashConfig, Predictor, Trials};

use common::Table;

const SIM_THRESHOLD: f64 = 0.5;
const NUM_HASHES_GRID: [usize; 3] = [50, 100, 200];
const LSH_THRESHOLDS: [f64; 2] = [0.6, 0.8];
/// `(t, bands, rows)`.
const LSH_CONFIGS: [(usize, usize, usize); 4] =
    [(50, 5, 10), (100, 5, 20), (200, 5, 40), (200, 10, 20)];

#[derive(Parser, Debug)]
#[clap(
    name = "find-simpairs-ratings",
    about = "A program to evaluate MinHash and LSH on user rating sets."
)]
struct Args {
    /// Path to MovieLens u.data, or a directory containing it.
    #[clap(short = 'i', long, default_value = "data/movielens/ml-100k/u.data")]
    ratings_path: PathBuf,

    /// Directory to write result files.
    #[clap(short = 'o', long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Base seed value. Run i uses seed+i.
    #[clap(short = 's', long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Number of independent runs to average.
    #[clap(short = 'n', long, default_value = "5")]
    runs: usize,

    /// Output range m of hash functions (must be more than 10000).
    #[clap(short = 'm', long, default_value_t = DEFAULT_RANGE)]
    minhash_m: u64,

    /// Disables printing results to stdout.
    #[clap(long)]
    no_print: bool,

    /// Max rows to print for large tables (0 for all).
    #[clap(long, default_value = "10")]
    print_limit: usize,

    /// Disables parallel construction and evaluation.
    #[clap(short = 'p', long)]
    disable_parallel: bool,
}

fn main() -> Result<()> {
    common::init_tracing();
    let args = Args::parse();
    common::check_range(args.minhash_m)?;

    let output_dir = args.output_dir;
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let parallel = !args.disable_parallel;
    let print_limit = (args.print_limit != 0).then(|| args.print_limit);

    let entities: Vec<(u64, HashSet<u64>)> = load_rating_sets(&args.ratings_path)
        .with_context(|| format!("failed to load {}", args.ratings_path.display()))?
        .into_iter()
        .collect();

    let start = Instant::now();
    let exact = if parallel {
        exact_similarities_in_parallel(&entities)
    } else {
        exact_similarities(&entities)
    };
    tracing::info!(
        "Computed exact similarities of {} pairs in {} sec",
        exact.len(),
        start.elapsed().as_secs_f64()
    );

    let mut truth_by_threshold: BTreeMap<String, HashSet<Pair<u64>>> = BTreeMap::new();
    for threshold in [SIM_THRESHOLD].into_iter().chain(LSH_THRESHOLDS) {
        truth_by_threshold.insert(threshold_key(threshold), pairs_at_least(&exact, threshold));
    }
    let exact_pairs = &truth_by_threshold[&threshold_key(SIM_THRESHOLD)];

    let exact_triplets: Vec<(u64, u64, f64)> = exact
        .iter()
        .filter(|(pair, _)| exact_pairs.contains(pair))
        .map(|(&(u, v), &sim)| (u, v, sim))
        .collect();
    pair_table(&["user_a", "user_b", "jaccard"], &exact_triplets)
        .write_csv(output_dir.join("part4_exact_pairs_ge_0_5.csv"))?;
    let exact_table = pair_table(
        &["user_a", "user_b", "jaccard"],
        &ranked_by_similarity(exact_triplets),
    );

    let base = MinHashConfig::default()
        .range(args.minhash_m)
        .seed(args.seed);
    let mut trials_by_len = BTreeMap::new();
    for t in NUM_HASHES_GRID {
        let start = Instant::now();
        let config = base.num_hashes(t);
        let trials = if parallel {
            Trials::build_in_parallel(&entities, config, args.runs)?
        } else {
            Trials::build(&entities, config, args.runs)?
        };
        tracing::info!(
            "Built {} runs of t={t} in {} sec",
            trials.runs(),
            start.elapsed().as_secs_f64()
        );
        trials_by_len.insert(t, trials);
    }

    let mut minhash_table = Table::new(&["t", "avg_false_positives", "avg_false_negatives"]);
    let mut run1_tables = vec![];
    for (&t, trials) in &trials_by_len {
        let predictor = Predictor::Estimate {
            threshold: SIM_THRESHOLD,
        };
        let summary = evaluate(trials, predictor, exact_pairs, parallel)?;
        minhash_table.push(summary_row(vec![t.to_string()], &summary));

        let pairs = trials.predict(0, predictor)?;
        pair_table(&["user_a", "user_b", "estimate"], &pairs)
            .write_csv(output_dir.join(format!("part4_minhash_pairs_t{t}_run1.csv")))?;
        let ranked = pair_table(
            &["user_a", "user_b", "estimate"],
            &ranked_by_similarity(pairs),
        );
        run1_tables.push((t, ranked));
    }
    minhash_table.write_csv(output_dir.join("part4_minhash_summary.csv"))?;

    let mut lsh_tables = vec![];
    for tau in LSH_THRESHOLDS {
        let truth = &truth_by_threshold[&threshold_key(tau)];
        let mut summary_table =
            Table::new(&["t", "r", "b", "avg_false_positives", "avg_false_negatives"]);
        let mut count_table = Table::new(&["t", "r", "b", "run1_candidate_count"]);
        let mut candidate_tables = vec![];
        for (t, bands, rows) in LSH_CONFIGS {
            let trials = trials_by_len
                .get(&t)
                .with_context(|| format!("signatures of t={t} are not built"))?;
            let predictor = Predictor::Banding(LshParams::new(bands, rows)?);
            let summary = evaluate(trials, predictor, truth, parallel)?;
            summary_table.push(summary_row(
                vec![t.to_string(), bands.to_string(), rows.to_string()],
                &summary,
            ));

            let candidates = trials.predict(0, predictor)?;
            let mut candidate_table = Table::new(&["user_a", "user_b"]);
            for &(u, v, _) in &candidates {
                candidate_table.push(vec![u.to_string(), v.to_string()]);
            }
            candidate_table.write_csv(output_dir.join(format!(
                "part5_lsh_candidates_tau_{tau:.1}_t{t}_r{bands}_b{rows}_run1.csv"
            )))?;
            count_table.push(vec![
                t.to_string(),
                bands.to_string(),
                rows.to_string(),
                candidates.len().to_string(),
            ]);
            candidate_tables.push(((t, bands, rows), candidate_table));
        }
        summary_table.write_csv(output_dir.join(format!("part5_lsh_summary_tau_{tau:.1}.csv")))?;
        lsh_tables.push((tau, summary_table, count_table, candidate_tables));
    }

    if !args.no_print {
        let num_users = entities.len();
        println!("\n=== Rating Sets Summary ===");
        println!("Users: {num_users}");
        println!("Total pairs: {}", num_users * num_users.saturating_sub(1) / 2);
        println!("Pairs with Jaccard >= {SIM_THRESHOLD}: {}", exact_pairs.len());

        println!("\n--- Exact pairs ---");
        exact_table.print(print_limit);
        println!("\n--- MinHash summary ---");
        minhash_table.print(None);
        for (t, table) in &run1_tables {
            println!("\n--- MinHash pairs of run 1 (t={t}) ---");
            table.print(print_limit);
        }
        for (tau, summary_table, count_table, candidate_tables) in &lsh_tables {
            println!("\n--- LSH summary (tau={tau:.1}) ---");
            summary_table.print(None);
            println!("\n--- LSH candidate counts of run 1 (tau={tau:.1}) ---");
            count_table.print(None);
            println!("\n--- LSH candidate pairs of run 1 (tau={tau:.1}) ---");
            for ((t, bands, rows), table) in candidate_tables {
                println!("\nConfig t={t}, r={bands}, b={rows}");
                table.print(None);
            }
        }
    }

    tracing::info!("Outputs written to {}", output_dir.display());
    Ok(())
}

fn threshold_key(threshold: f64) -> String {
    format!("{threshold:.2}")
}

fn evaluate(
    trials: &Trials<u64>,
    predictor: Predictor,
    truth: &HashSet<Pair<u64>>,
    parallel: bool,
) -> Result<TrialSummary> {
    let summary = if parallel {
        trials.evaluate_in_parallel(predictor, truth)?
    } else {
        trials.evaluate(predictor, truth)?
    };
    tracing::info!(
        "{predictor:?}: avg_fp={:.2}, avg_fn={:.2}",
        summary.mean_false_positives(),
        summary.mean_false_negatives()
    );
    Ok(summary)
}

/// Sorts pairs by similarity in descending order. Ties keep their input order.
fn ranked_by_similarity(mut pairs: Vec<(u64, u64, f64)>) -> Vec<(u64, u64, f64)> {
    pairs.sort_by(|a, b| b.2.total_cmp(&a.2));
    pairs
}

fn pair_table(headers: &[&'static str], pairs: &[(u64, u64, f64)]) -> Table {
    let mut table = Table::new(headers);
    for &(u, v, sim) in pairs {
        table.push(vec![u.to_string(), v.to_string(), format!("{sim:.6}")]);
    }
    table
}

fn summary_row(mut head: Vec<String>, summary: &TrialSummary) -> Vec<String> {
    head.push(format!("{:.2}", summary.mean_false_positives()));
    head.push(format!("{:.2}", summary.mean_false_negatives()));
    head
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_by_similarity() {
        let pairs = vec![(1, 2, 0.5), (1, 3, 0.9), (2, 3, 0.5), (3, 4, 0.75)];
        assert_eq!(
            ranked_by_similarity(pairs),
            vec![(1, 3, 0.9), (3, 4, 0.75), (1, 2, 0.5), (2, 3, 0.5)]
        );
    }
}
