// Single lunar magma ocean run.
//
//   cargo run --release --example lunar_magma_ocean [params.json]
//
// Without an argument the bundled demos/data/params.json is used. Set
// RUST_LOG=info (or debug) for engine diagnostics.

use imagma_rust::sim::sim_op::{CsvWriterOp, ProgressReporterOp, ScoreCardOp};
use imagma_rust::sim::{SimProps, Simulation};
use imagma_rust::{SimParams, SimResult};
use std::process::ExitCode;

const DEFAULT_PARAMS: &str = "demos/data/params.json";
const REPORT_INTERVAL: i32 = 100;

fn run(params_path: &str) -> SimResult<()> {
    let params = SimParams::load_json(params_path)?;
    println!("📄 Parameters from {}", params_path);

    let mut sim = Simulation::new(SimProps {
        name: "lunar_magma_ocean",
        params,
        impact_table: None,
        ops: vec![
            ProgressReporterOp::handle(REPORT_INTERVAL),
            CsvWriterOp::handle(None),
            ScoreCardOp::handle(None),
        ],
        debug: true,
    })?;

    let summary = sim.run()?;
    println!(
        "🌕 Final averaged crust {:.2} km after {:.3e} yr",
        summary.averaged_crust_thickness_m / 1000.0,
        summary.elapsed_yr
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let params_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_PARAMS.to_string());
    match run(&params_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
