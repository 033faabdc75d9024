// Sweep the impactor mass-to-area ratio against one shared impact table.
//
//   cargo run --release --example impact_sweep
//
// Each run appends a row to output/impact_sweep/scoreCard.csv. A run that
// fails is reported and skipped; the rest of the sweep carries on.

use imagma_rust::physics::ImpactTable;
use imagma_rust::sim::sim_op::ScoreCardOp;
use imagma_rust::sim::{SimProps, Simulation};
use imagma_rust::{SimParams, SimResult};
use std::path::PathBuf;
use std::sync::Arc;

const TABLE_PATH: &str = "demos/data/impact_rates.csv";
const MASS_TO_AREA_KG_PER_M2: [f64; 4] = [1.0e6, 1.0e7, 1.0e8, 1.0e9];
const VOL_INCREMENTS: usize = 300;

fn sweep_run(run_number: u32, mass_to_area: f64, table: &Arc<ImpactTable>) -> SimResult<()> {
    let params = SimParams {
        run_number,
        impacts_enabled: true,
        kinetic_energy_enabled: true,
        mass_to_area_kg_per_m2: mass_to_area,
        vol_increments: VOL_INCREMENTS,
        output_dir: PathBuf::from("output/impact_sweep"),
        ..SimParams::default()
    };

    let mut sim = Simulation::new(SimProps {
        name: "impact_sweep",
        params,
        impact_table: Some(Arc::clone(table)),
        ops: vec![ScoreCardOp::handle(None)],
        debug: false,
    })?;
    let summary = sim.run()?;

    println!(
        "   run {:>2} | m/A {:>8.1e} kg/m² | holes {:>7.4}% | crust {:>6.2} km | {:>9.3e} yr",
        run_number,
        mass_to_area,
        summary.hole_surface_percent,
        summary.averaged_crust_thickness_m / 1000.0,
        summary.elapsed_yr
    );
    Ok(())
}

fn main() {
    env_logger::init();

    let table = match ImpactTable::load_cached(TABLE_PATH) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("❌ {}", e);
            return;
        }
    };
    println!("☄️  Impact sweep over {} rows from {}", table.rows().len(), table.source_name());

    for (i, mass_to_area) in MASS_TO_AREA_KG_PER_M2.iter().enumerate() {
        if let Err(e) = sweep_run(i as u32 + 1, *mass_to_area, &table) {
            eprintln!("   run {} failed: {}", i + 1, e);
        }
    }
}
