//! Benchmark harness binary: generate networks, time the engine, then
//! parse the log back and print the aggregated averages.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

use wardrop_engine::engine::EquilibriumEngine;
use wardrop_engine::evaluation::{self, analysis, EvaluationSettings};
use wardrop_engine::telemetry;

fn main() -> Result<()> {
    telemetry::init_tracing();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "performance_summary.txt".to_string());
    let settings = EvaluationSettings::default();
    let engine = EquilibriumEngine::default();

    {
        let file = File::create(&path).with_context(|| format!("creating {path}"))?;
        let mut out = BufWriter::new(file);
        evaluation::run(&engine, &settings, &mut out)?;
        out.flush()?;
    }

    let text = std::fs::read_to_string(&path)?;
    let averages = analysis::compute_averages(&analysis::parse_summary(&text));
    print!("{}", analysis::render_report(&averages));

    Ok(())
}
