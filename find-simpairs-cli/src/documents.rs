mod common;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use hashbrown::HashSet;

use band_join::choose_params;
use find_simpairs::config::{DEFAULT_RANGE, DEFAULT_SEED};
use find_simpairs::dataset::load_documents;
use find_simpairs::evaluation::{estimate_curve, exact_similarities, recommend_num_hashes};
use find_simpairs::shingling::{KGramMode, ShingleConfig};
use find_simpairs::MinHashConfig;

use common::Table;

const DOC_NAMES: [&str; 4] = ["D1.txt", "D2.txt", "D3.txt", "D4.txt"];
const KGRAM_SPECS: [(KGramMode, usize); 3] =
    [(KGramMode::Char, 2), (KGramMode::Char, 3), (KGramMode::Word, 2)];
const NUM_HASHES_GRID: [usize; 5] = [20, 60, 150, 300, 600];
const LSH_NUM_HASHES: usize = 160;
const LSH_TARGET: f64 = 0.7;

#[derive(Parser, Debug)]
#[clap(
    name = "find-simpairs-documents",
    about = "A program to compare k-gram sets of documents with MinHash and LSH."
)]
struct Args {
    /// Directory containing D1.txt to D4.txt.
    #[clap(short = 'i', long, default_value = "data/minhash")]
    data_dir: PathBuf,

    /// Directory to write result files.
    #[clap(short = 'o', long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Seed value for hash families.
    #[clap(short = 's', long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Output range m of hash functions (must be more than 10000).
    #[clap(short = 'm', long, default_value_t = DEFAULT_RANGE)]
    minhash_m: u64,

    /// Disables printing results to stdout.
    #[clap(long)]
    no_print: bool,
}

fn main() -> Result<()> {
    common::init_tracing();
    let args = Args::parse();
    common::check_range(args.minhash_m)?;

    let output_dir = args.output_dir;
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let documents = load_documents(&args.data_dir, DOC_NAMES)
        .with_context(|| format!("failed to load documents in {}", args.data_dir.display()))?;
    tracing::info!("Loaded {} documents", documents.len());

    let mut shingles_by_label = BTreeMap::new();
    let mut kgram_table = Table::new(&["kgram_type", "doc_a", "doc_b", "jaccard"]);
    for (mode, k) in KGRAM_SPECS {
        let shingler = ShingleConfig::new(mode, k)?;
        let entities: Vec<(String, HashSet<String>)> = documents
            .iter()
            .map(|(id, text)| (id.clone(), shingler.extract(text)))
            .collect();
        let label = shingler.label();
        for ((a, b), sim) in exact_similarities(&entities) {
            kgram_table.push(vec![label.clone(), a, b, format!("{sim:.6}")]);
        }
        shingles_by_label.insert(label, entities);
    }
    kgram_table.write_csv(output_dir.join("part1_kgrams_jaccard.csv"))?;

    let trigrams = &shingles_by_label["char_3"];
    let shingles_of = |id: &str| {
        trigrams
            .iter()
            .find(|(doc, _)| doc == id)
            .map(|(_, set)| set)
            .with_context(|| format!("{id} is not loaded"))
    };

    let start = Instant::now();
    let config = MinHashConfig::default()
        .range(args.minhash_m)
        .seed(args.seed);
    let rows = estimate_curve(shingles_of("D1")?, shingles_of("D2")?, &NUM_HASHES_GRID, config)?;
    tracing::info!(
        "Estimated D1/D2 for {} lengths in {} sec",
        rows.len(),
        start.elapsed().as_secs_f64()
    );
    let mut minhash_table = Table::new(&["t", "estimate", "exact", "abs_error"]);
    for row in &rows {
        minhash_table.push(vec![
            row.num_hashes.to_string(),
            format!("{:.6}", row.estimate),
            format!("{:.6}", row.exact),
            format!("{:.6}", row.abs_error),
        ]);
    }
    minhash_table.write_csv(output_dir.join("part2_minhash_d1_d2.csv"))?;

    let recommended = recommend_num_hashes(&rows)?;
    let recommendation = format!(
        "Recommended t based on diminishing error improvement:\nt = {recommended}\n\n\
         Justification: smallest t where additional error reduction < 0.01.\n"
    );
    fs::write(output_dir.join("part2_t_recommendation.txt"), &recommendation)?;

    let choice = choose_params(LSH_NUM_HASHES, LSH_TARGET)?;
    let params = choice.params;
    let params_text = format!(
        "LSH parameters (t={LSH_NUM_HASHES}, tau={LSH_TARGET}):\n\
         r (bands) = {}\n\
         b (rows per band) = {}\n\
         f(tau) = {:.6}\n\
         slope(tau) = {:.6}\n",
        params.bands(),
        params.rows(),
        choice.probability,
        choice.slope
    );
    fs::write(output_dir.join("part3_lsh_params.txt"), &params_text)?;

    let mut lsh_table = Table::new(&["doc_a", "doc_b", "jaccard_3gram", "probability"]);
    for ((a, b), sim) in exact_similarities(trigrams) {
        let prob = params.probability(sim)?;
        lsh_table.push(vec![a, b, format!("{sim:.6}"), format!("{prob:.6}")]);
    }
    lsh_table.write_csv(output_dir.join("part3_lsh_probabilities.csv"))?;

    if !args.no_print {
        println!("\n=== K-grams Jaccard ===");
        kgram_table.print(None);
        println!("\n=== MinHash Estimates (D1 vs D2) ===");
        minhash_table.print(None);
        println!("\n{}", recommendation.trim());
        println!("\n=== LSH Parameters ===");
        println!("{}", params_text.trim());
        println!("\n=== LSH Probabilities (3-grams) ===");
        lsh_table.print(None);
    }

    tracing::info!("Outputs written to {}", output_dir.display());
    Ok(())
}
