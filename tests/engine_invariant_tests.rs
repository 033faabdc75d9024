// Whole-run invariants of the solidification engine.
// Each test runs the engine end to end and checks the recorded series.

use approx::assert_relative_eq;
use imagma_rust::physics::{ImpactRateRow, ImpactTable};
use imagma_rust::sim::record::RunSummary;
use imagma_rust::sim::sim_op::{SimOp, SimOpHandle};
use imagma_rust::sim::state::HeatLossMode;
use imagma_rust::sim::{SimProps, Simulation};
use imagma_rust::{assert_deviation, SimParams};
use more_asserts::{assert_gt, assert_le};
use std::sync::Arc;

fn test_params() -> SimParams {
    SimParams {
        vol_increments: 120,
        ..SimParams::default()
    }
}

fn table(rows: &[(f64, f64, f64)]) -> Arc<ImpactTable> {
    let rows = rows
        .iter()
        .map(|&(time_yr, mass_rate_kg_per_yr, energy_rate_j_per_yr)| ImpactRateRow {
            time_yr,
            mass_rate_kg_per_yr,
            energy_rate_j_per_yr,
        })
        .collect();
    Arc::new(ImpactTable::new("test", rows).unwrap())
}

fn decaying_table() -> Arc<ImpactTable> {
    table(&[
        (1.0, 1.0e12, 1.0e20),
        (100.0, 2.0e11, 2.0e19),
        (1.0e4, 3.0e10, 3.0e18),
        (1.0e6, 3.0e9, 3.0e17),
    ])
}

fn run_with(params: SimParams, impact_table: Option<Arc<ImpactTable>>, ops: Vec<SimOpHandle>) -> Simulation {
    let mut sim = Simulation::new(SimProps {
        name: "invariant_test",
        params,
        impact_table,
        ops,
        debug: false,
    })
    .unwrap();
    sim.run().unwrap();
    sim
}

fn without_duration(summary: &RunSummary) -> RunSummary {
    RunSummary {
        duration_s: 0.0,
        ..summary.clone()
    }
}

/// Checks the hole bookkeeping after every committed increment.
struct HoleInvariantOp {
    checked: usize,
}

impl SimOp for HoleInvariantOp {
    fn name(&self) -> &str {
        "HoleInvariantOp"
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        let reference = sim.state.hole_reference_thickness_m();
        for hole in sim.state.holes.iter() {
            assert!(
                hole.thickness_m < reference,
                "hole {:.4}m thick kept next to a {:.4}m reference",
                hole.thickness_m,
                reference
            );
        }
        assert_le!(sim.state.holes.total_area_m2(), sim.surface_area_m2());
        self.checked += 1;
    }

    fn after_sim(&mut self, sim: &mut Simulation) {
        assert_eq!(self.checked, sim.record.len());
    }
}

#[test]
fn test_volume_falls_and_boundary_rises() {
    println!("🌋 Testing monotone magma volume and CMB radius");
    let sim = run_with(test_params(), None, vec![]);
    let samples = &sim.record.samples;
    assert_gt!(samples.len(), 100);

    for pair in samples.windows(2) {
        assert!(
            pair[1].magma_ocean_volume_m3 <= pair[0].magma_ocean_volume_m3,
            "volume grew at t = {:.3e}s",
            pair[1].time_s
        );
        assert!(pair[1].cmb_radius_m >= pair[0].cmb_radius_m);
        assert!(pair[1].time_s > pair[0].time_s);
    }
    println!("   ✅ {} samples, all monotone", samples.len());
}

#[test]
fn test_liquid_fraction_tracks_volume() {
    let sim = run_with(test_params(), None, vec![]);

    for sample in &sim.record.samples {
        assert_relative_eq!(
            sample.liquid_fraction,
            sample.magma_ocean_volume_m3 / sim.state.initial_volume_m3,
            max_relative = 1e-12
        );
        assert!(sample.liquid_fraction > 0.0 && sample.liquid_fraction <= 1.0);
    }
}

#[test]
fn test_mass_is_accounted_for() {
    let sim = run_with(test_params(), None, vec![]);
    let summary = sim.summary().unwrap();

    // only the thin quench layer is unaccounted for
    assert_deviation!(summary.mass.final_kg(), summary.mass.initial_kg, 0.01, "mass budget");
    assert_gt!(summary.mass.crust_unimpacted_kg, 0.0);
    assert_eq!(summary.mass.crust_in_holes_kg, 0.0);
}

#[test]
fn test_holes_tracked_only_below_reference() {
    println!("☄️ Testing hole tracking against the reference thickness");
    let mut params = test_params();
    params.impacts_enabled = true;
    params.mass_to_area_kg_per_m2 = 1.0e6;

    let sim = run_with(
        params,
        Some(decaying_table()),
        vec![SimOpHandle::new(Box::new(HoleInvariantOp { checked: 0 }))],
    );

    assert!(!sim.record.holes.is_empty(), "impacts should have opened holes");
    for sample in &sim.record.holes {
        assert_le!(sample.area_percent, 100.0);
        assert_gt!(sample.count, 0);
    }
    assert_gt!(sim.state.counters.impact_mass_kg, 0.0);
    println!("   ✅ {} hole samples", sim.record.holes.len());
}

#[test]
fn test_impacts_disabled_ignores_table() {
    let quiet = run_with(test_params(), None, vec![]);
    let with_table = run_with(test_params(), Some(decaying_table()), vec![]);

    assert!(quiet.state.holes.is_empty());
    assert!(quiet.record.holes.is_empty());
    assert!(quiet.record.impacted_crust.is_empty());
    assert_eq!(quiet.record, with_table.record);
    assert_eq!(
        without_duration(quiet.summary().unwrap()),
        without_duration(with_table.summary().unwrap())
    );
    assert_eq!(quiet.state.counters.impact_mass_kg, 0.0);
}

#[test]
fn test_no_quench_no_impacts_goes_straight_to_crust() {
    let params = SimParams {
        quench_enabled: false,
        ..test_params()
    };
    let sim = run_with(params, None, vec![]);

    let modes: Vec<HeatLossMode> = sim.record.mode_changes().into_iter().map(|(_, mode)| mode).collect();
    assert_eq!(modes, vec![HeatLossMode::BareRadiation, HeatLossMode::CrustConduction]);
    assert!(sim.record.samples.iter().all(|s| s.quench_thickness_m == 0.0));
}

#[test]
fn test_crust_build_is_irreversible() {
    let sim = run_with(test_params(), None, vec![]);
    let samples = &sim.record.samples;

    let first_crust = samples
        .iter()
        .position(|s| s.heat_loss_mode == HeatLossMode::CrustConduction)
        .expect("crust should form");
    assert!(samples[first_crust..]
        .iter()
        .all(|s| s.heat_loss_mode == HeatLossMode::CrustConduction));
    for pair in samples[first_crust..].windows(2) {
        assert!(pair[1].crust_thickness_m >= pair[0].crust_thickness_m);
    }
    assert!(sim.state.crust_build_start_s.is_some());
}

#[test]
fn test_identical_inputs_identical_outputs() {
    let mut params = test_params();
    params.impacts_enabled = true;
    params.kinetic_energy_enabled = true;

    let table = decaying_table();
    let a = run_with(params.clone(), Some(Arc::clone(&table)), vec![]);
    let b = run_with(params, Some(table), vec![]);

    assert_eq!(a.record, b.record);
    assert_eq!(a.state, b.state);
    assert_eq!(
        without_duration(a.summary().unwrap()),
        without_duration(b.summary().unwrap())
    );
}

#[test]
fn test_late_impacts_never_arrive() {
    let mut params = test_params();
    params.impacts_enabled = true;

    // first row long after the magma ocean has solidified
    let sim = run_with(params, Some(table(&[(1.0e12, 1.0e15, 1.0e23)])), vec![]);

    assert!(sim.record.holes.is_empty());
    assert_eq!(sim.summary().unwrap().hole_surface_percent, 0.0);
    assert_eq!(sim.state.counters.impact_mass_kg, 0.0);
}

#[test]
fn test_general_heating_slows_solidification() {
    let cold = run_with(test_params(), None, vec![]);
    let heated = run_with(
        SimParams {
            general_heating_enabled: true,
            heating_rate_w: 1.0e12,
            ..test_params()
        },
        None,
        vec![],
    );

    let cold_summary = cold.summary().unwrap();
    let heated_summary = heated.summary().unwrap();
    assert_gt!(heated_summary.elapsed_yr, cold_summary.elapsed_yr);
    assert_gt!(heated_summary.cumulative_general_heating_j, 0.0);
    assert_eq!(cold_summary.cumulative_general_heating_j, 0.0);
}
