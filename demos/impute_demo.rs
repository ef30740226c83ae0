//! Chained-equations imputation of a synthetic Friedman #1 table.
//!
//! Builds 500 rows of the Friedman #1 regression problem, turns the first
//! feature into a 0/1 flag and the second into `classN` labels, knocks out
//! half of all cells and imputes them with the default random forests.
//!
//! Run with: `cargo run --release --bin impute_demo [rows]`
//!
//! Settings are read from `./mice.toml` when present and can be overridden
//! with `MICE_*` environment variables, e.g.
//! `MICE_MODEL_FAMILY=linear MICE_MAX_PASSES=3`.

use anyhow::{Context, Result};
use mice_impute::{Dataset, ImputeConfig, Value};
use rand::prelude::*;
use std::f64::consts::PI;
use std::time::Instant;

const NUM_FEATURES: usize = 10;
const MISSING_RATE: f64 = 0.5;

/// Friedman #1: `10 sin(pi x0 x1) + 20 (x2 - 0.5)^2 + 10 x3 + 5 x4 + N(0, 1)`;
/// the remaining features are noise.
fn friedman1(rng: &mut StdRng, num_samples: usize) -> Vec<(Vec<f64>, f64)> {
    (0..num_samples)
        .map(|_| {
            let x: Vec<f64> = (0..NUM_FEATURES).map(|_| rng.gen::<f64>()).collect();
            // Box-Muller
            let noise = (-2.0 * rng.gen::<f64>().max(f64::MIN_POSITIVE).ln()).sqrt()
                * (2.0 * PI * rng.gen::<f64>()).cos();
            let y = 10.0 * (PI * x[0] * x[1]).sin() + 20.0 * (x[2] - 0.5).powi(2) + 10.0 * x[3] + 5.0 * x[4] + noise;
            (x, y)
        })
        .collect()
}

fn complete_rows(samples: Vec<(Vec<f64>, f64)>) -> Vec<Vec<Value>> {
    samples
        .into_iter()
        .map(|(x, y)| {
            let mut row: Vec<Value> = Vec::with_capacity(NUM_FEATURES + 1);
            row.push(Value::from(if x[0] > 0.5 { 1.0 } else { 0.0 }));
            row.push(Value::from(format!("class{}", ((x[1] * 10.0).round() as i64) % 10)));
            row.extend(x[2..].iter().map(|&v| Value::from(v)));
            row.push(Value::from(y));
            row
        })
        .collect()
}

fn main() -> Result<()> {
    mice_impute::init();

    let num_samples: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse().with_context(|| format!("invalid row count '{}'", arg))?,
        None => 500,
    };

    let mut config = ImputeConfig::discover(".").context("reading mice.toml")?;
    config
        .apply_environment_overrides()
        .context("reading MICE_* environment")?;
    config.verbose = true;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let complete = complete_rows(friedman1(&mut rng, num_samples));

    println!("First rows:");
    for row in complete.iter().take(5) {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("  [{}]", cells.join(", "));
    }

    let with_missing: Vec<Vec<Value>> = complete
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| if rng.gen::<f64>() < MISSING_RATE { Value::Missing } else { v.clone() })
                .collect()
        })
        .collect();
    let dataset = Dataset::new(with_missing).context("building dataset")?;
    println!(
        "Removed {} of {} cells",
        dataset.missing_count(),
        dataset.num_rows() * dataset.num_columns()
    );

    let start = Instant::now();
    let result = mice_impute::impute(&dataset, config).context("imputation failed")?;
    println!("Imputed in {:.2?}", start.elapsed());
    println!("{}", result.summary());

    println!("Results:");
    println!("{}", serde_json::to_string_pretty(&result.importance_matrix)?);

    Ok(())
}
