use crate::error::{SimError, SimResult};
use crate::params::SimParams;
use crate::physics::{rayleigh_number, solidus_temperature_k, ImpactTable};
use crate::planet::{radius_for_volume_m, sphere_volume_m3, Planet};
use crate::sim::record::{HoleSample, ImpactedCrustSample, RunSummary, Sample, TimeSeries};
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::state::SimulationState;
use crate::sim::timestep::{resolve_timestep, Partition, ThermalSnapshot, TrialContext};
use crate::temp_utils::{adiabat_top_temperature_k, seconds_to_years};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct OpTiming {
    pub op_name: String,
    pub init_time: Duration,
    pub total_update_time: Duration,
    pub update_call_count: u32,
    pub after_time: Duration,
}

impl OpTiming {
    pub fn new(op_name: String) -> Self {
        Self {
            op_name,
            init_time: Duration::ZERO,
            total_update_time: Duration::ZERO,
            update_call_count: 0,
            after_time: Duration::ZERO,
        }
    }

    pub fn avg_update_time(&self) -> Duration {
        if self.update_call_count > 0 {
            self.total_update_time / self.update_call_count
        } else {
            Duration::ZERO
        }
    }

    pub fn total_time(&self) -> Duration {
        self.init_time + self.total_update_time + self.after_time
    }
}

/// Why the increment loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Remaining liquid dropped below the configured floor.
    LiquidFloorReached,
    /// Every volume increment was used up.
    IncrementsExhausted,
}

enum Advance {
    Committed,
    Stopped(Termination),
}

pub struct Simulation {
    pub name: String,
    pub params: SimParams,
    pub planet: Planet,
    pub impact_table: Option<Arc<ImpactTable>>,
    pub state: SimulationState,
    pub record: TimeSeries,
    pub ops: Vec<Box<dyn SimOp>>,
    pub op_timings: Vec<OpTiming>,
    pub step: i32,
    pub debug: bool,
    surface_area_m2: f64,
    volume_increment_m3: f64,
    termination: Option<Termination>,
    summary: Option<RunSummary>,
}

pub struct SimProps {
    pub name: &'static str,
    pub params: SimParams,
    /// Required when `params.impacts_enabled`; loaded from
    /// `params.impact_table_path` when left out.
    pub impact_table: Option<Arc<ImpactTable>>,
    pub ops: Vec<SimOpHandle>,
    pub debug: bool,
}

impl Simulation {
    pub fn new(props: SimProps) -> SimResult<Simulation> {
        props.params.validate()?;

        let impact_table = match (props.impact_table, &props.params.impact_table_path) {
            (Some(table), _) => Some(table),
            (None, Some(path)) if props.params.impacts_enabled => Some(ImpactTable::load_cached(path)?),
            (None, _) => None,
        };
        if props.params.impacts_enabled && impact_table.is_none() {
            return Err(SimError::InvalidParameter {
                name: "impact_table_path",
                reason: "an impact table is required when impacts are enabled".to_string(),
            });
        }

        let planet = props.params.planet();
        let state = SimulationState::new(&props.params)?;
        let ops: Vec<Box<dyn SimOp>> = props.ops.into_iter().map(|handle| handle.op).collect();
        let op_timings = ops.iter().map(|op| OpTiming::new(op.name().to_string())).collect();

        Ok(Simulation {
            name: props.name.to_string(),
            surface_area_m2: planet.surface_area_m2(),
            volume_increment_m3: state.initial_volume_m3 / props.params.vol_increments as f64,
            params: props.params,
            planet,
            impact_table,
            state,
            record: TimeSeries::new(),
            ops,
            op_timings,
            step: -1,
            debug: props.debug,
            termination: None,
            summary: None,
        })
    }

    /// Plain run with no observers.
    pub fn from_params(params: SimParams) -> SimResult<Simulation> {
        Simulation::new(SimProps {
            name: "imagma",
            params,
            impact_table: None,
            ops: vec![],
            debug: false,
        })
    }

    pub fn current_step(&self) -> i32 {
        self.step
    }

    pub fn surface_area_m2(&self) -> f64 {
        self.surface_area_m2
    }

    pub fn volume_increment_m3(&self) -> f64 {
        self.volume_increment_m3
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Available once `run` has returned `Ok`.
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    /// Run every increment. Observers see `after_sim` only when the run
    /// completes; any fatal condition returns early with the error.
    pub fn run(&mut self) -> SimResult<RunSummary> {
        if self.step > -1 {
            return Err(SimError::AlreadyRun);
        }
        let started = Instant::now();
        self.step = 0;
        self.simulate_init();

        let termination = loop {
            if self.step as usize >= self.params.vol_increments {
                break Termination::IncrementsExhausted;
            }
            self.step += 1;

            match self.advance()? {
                Advance::Committed => self.simulate_step(),
                Advance::Stopped(termination) => break termination,
            }
        };

        log::info!(
            "{}: {:?} after {} increments, {:.4e} yr",
            self.name,
            termination,
            self.step,
            seconds_to_years(self.state.elapsed_s)
        );
        let summary = RunSummary::new(
            &self.params,
            &self.state,
            self.surface_area_m2,
            started.elapsed().as_secs_f64(),
        );
        self.termination = Some(termination);
        self.summary = Some(summary.clone());

        self.simulate_end();
        if self.debug {
            self.print_timing_report();
        }

        Ok(summary)
    }

    fn liquid_floor_m3(&self) -> f64 {
        self.params.min_remaining_percent / 100.0 * self.state.initial_volume_m3
    }

    /// Solidify one volume increment and commit the accepted timestep.
    fn advance(&mut self) -> SimResult<Advance> {
        let p = &self.params;
        let planet_radius = self.planet.radius_m;
        let surface = self.surface_area_m2;
        let volume_increment = self.volume_increment_m3;
        let floor = self.liquid_floor_m3();

        // nothing is committed on the increment that would cross the floor
        if self.state.magma_ocean_volume_m3 - volume_increment < floor {
            return Ok(Advance::Stopped(Termination::LiquidFloorReached));
        }

        // where this increment's solid goes
        let mut partition = Partition::all_interior();
        if self.state.cmb_radius_m >= planet_radius - p.plag_build_depth_m {
            let state = &mut self.state;
            if !state.crust_build_active {
                state.crust_build_active = true;
                state.crust_build_start_s = Some(state.elapsed_s);
                state.global_crust_thickness_m = state.global_quench_thickness_m;
                log::info!(
                    "plagioclase crust starts at {:.1} yr (CMB {:.1} km)",
                    seconds_to_years(state.elapsed_s),
                    state.cmb_radius_m / 1000.0
                );
            }

            let hole_area = state.holes.total_area_m2();
            partition = Partition::crust_building(p.plag_fraction, p.hole_fill_weight, hole_area, surface);
            if partition.global_crust > 0.0 {
                state.global_crust_thickness_m += partition.global_crust * (p.mo_density_kg_m3 / p.crust_density_kg_m3)
                    * volume_increment
                    / (surface - hole_area);
            }
        }

        let state = &mut self.state;
        let interior_volume = sphere_volume_m3(state.cmb_radius_m) + partition.interior * volume_increment;
        state.cmb_radius_m = radius_for_volume_m(interior_volume);
        state.magma_ocean_volume_m3 -= volume_increment;
        state.liquid_fraction = state.magma_ocean_volume_m3 / state.initial_volume_m3;

        let solidus = solidus_temperature_k(state.cmb_radius_m, state.liquid_fraction)?;
        let cooled_by = state.cmb_temperature_k - solidus;
        state.cmb_temperature_k = solidus;

        let mo_height = planet_radius - state.cmb_radius_m;
        let mo_top = adiabat_top_temperature_k(solidus, p.adiabat_slope_k_per_m, mo_height);
        let mo_depth = mo_height - state.averaged_crust_thickness_m;
        if mo_depth <= 0.0 {
            return Err(SimError::InvalidState(format!(
                "magma ocean depth {:.3e} m is not positive (CMB {:.1} m, crust {:.1} m)",
                mo_depth, state.cmb_radius_m, state.averaged_crust_thickness_m
            )));
        }

        let thermal = ThermalSnapshot {
            cmb_temperature_k: solidus,
            mo_top_temperature_k: mo_top,
            mo_depth_m: mo_depth,
            rayleigh_number: rayleigh_number(
                p.gravity_m_s2,
                p.mo_density_kg_m3,
                p.mo_thermal_expansion_per_k,
                solidus - mo_top,
                mo_depth,
                p.mo_viscosity_pa_s,
                p.mo_diffusivity_m2_s,
            ),
            solidification_energy_j: volume_increment * p.mo_density_kg_m3 * p.mo_heat_fusion_j_per_kg,
            cooling_energy_j: p.mo_density_kg_m3
                * (state.magma_ocean_volume_m3 + volume_increment)
                * p.mo_heat_capacity_j_per_kg_k
                * cooled_by,
        };

        let ctx = TrialContext {
            params: p,
            impact_table: self.impact_table.as_deref(),
            surface_area_m2: surface,
            volume_increment_m3: volume_increment,
            partition,
            thermal,
        };
        let resolved = resolve_timestep(&ctx, state)?;
        let outcome = resolved.outcome;

        // commit
        state.time_step_s = resolved.timestep_s;
        state.holes = outcome.holes;

        if !state.crust_build_active && state.global_quench_thickness_m < p.max_quench_thickness_m {
            if let Some(quench) = outcome.quench_candidate_m {
                state.global_quench_thickness_m = quench;
            }
        }
        if p.quench_enabled {
            state.magma_ocean_volume_m3 -= outcome.quench_mass_added_kg / p.mo_density_kg_m3;
            // quench took the last of the melt: the increment goes unrecorded and
            // the liquid fraction keeps its pre-quench value
            if state.magma_ocean_volume_m3 < floor {
                log::debug!(
                    "increment {}: quench growth left {:.4e} m³ of melt, under the {:.4e} m³ floor",
                    self.step,
                    state.magma_ocean_volume_m3,
                    floor
                );
                return Ok(Advance::Stopped(Termination::LiquidFloorReached));
            }
            state.liquid_fraction = state.magma_ocean_volume_m3 / state.initial_volume_m3;
        }
        if state.crust_build_active {
            state.global_crust_thickness_m += outcome.crust_redistributed_m;
        }

        let hole_area = state.holes.total_area_m2();
        let impacted_thickness = if state.crust_build_active && !state.holes.is_empty() {
            Some(state.holes.area_weighted_thickness_m())
        } else {
            None
        };
        state.averaged_crust_thickness_m = match impacted_thickness {
            Some(impacted) => {
                state.global_crust_thickness_m * (surface - hole_area) / surface + impacted * hole_area / surface
            }
            None => state.global_crust_thickness_m,
        };

        let reference = state.hole_reference_thickness_m();
        state.holes.retain_thinner_than(reference);

        let counters = &mut state.counters;
        counters.impact_mass_kg += outcome.impact.mass_kg;
        counters.impact_energy_j += p.ke_efficiency * outcome.impact.energy_j;
        counters.general_heating_j += outcome.general_heating_j;
        counters.energy_dumped_j += outcome.energy_to_dump_j;
        counters.hole_area_created_m2 += outcome.impact.area_m2;

        state.elapsed_s += outcome.time_to_dump_s;

        self.record.samples.push(Sample {
            time_s: state.elapsed_s,
            timestep_s: resolved.timestep_s,
            liquid_fraction: state.liquid_fraction,
            magma_ocean_volume_m3: state.magma_ocean_volume_m3,
            cmb_radius_m: state.cmb_radius_m,
            cmb_temperature_k: state.cmb_temperature_k,
            crust_thickness_m: state.global_crust_thickness_m,
            averaged_crust_thickness_m: state.averaged_crust_thickness_m,
            quench_thickness_m: state.global_quench_thickness_m,
            heat_loss_mode: outcome.mode,
            timestep_iterations: resolved.iterations,
        });

        if !state.holes.is_empty() {
            let total_area = state.holes.total_area_m2();
            self.record.holes.push(HoleSample {
                time_s: state.elapsed_s,
                total_area_m2: total_area,
                area_percent: total_area / surface * 100.0,
                mean_thickness_m: state.holes.mean_thickness_m(),
                mean_surface_temperature_k: state.holes.mean_surface_temperature_k(),
                creation_rate_m2_per_yr: outcome.impact.area_m2 / seconds_to_years(resolved.timestep_s),
                cumulative_area_percent: state.counters.hole_area_created_m2 / surface * 100.0,
                count: state.holes.len(),
            });
        }
        if let Some(impacted) = impacted_thickness {
            self.record.impacted_crust.push(ImpactedCrustSample {
                time_s: state.elapsed_s,
                impacted_thickness_m: impacted,
                averaged_crust_thickness_m: state.averaged_crust_thickness_m,
            });
        }

        log::debug!(
            "increment {}: f = {:.4}, dt = {:.4e} s ({} trials), {}",
            self.step,
            state.liquid_fraction,
            resolved.timestep_s,
            resolved.iterations,
            outcome.mode.as_str()
        );

        Ok(Advance::Committed)
    }

    fn simulate_init(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);

        for (i, op) in ops.iter_mut().enumerate() {
            let start = Instant::now();
            op.init_sim(self);
            self.op_timings[i].init_time = start.elapsed();
        }
        self.ops = ops;
    }

    fn simulate_end(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);

        for (i, op) in ops.iter_mut().enumerate() {
            let start = Instant::now();
            op.after_sim(self);
            self.op_timings[i].after_time = start.elapsed();
        }
        self.ops = ops;
    }

    fn simulate_step(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);

        for (i, op) in ops.iter_mut().enumerate() {
            let start = Instant::now();
            op.update_sim(self);
            self.op_timings[i].total_update_time += start.elapsed();
            self.op_timings[i].update_call_count += 1;
        }
        self.ops = ops;
    }

    pub fn print_timing_report(&self) {
        println!("\n📊 === SIMULATION TIMING REPORT ===");
        println!("🔄 Increments run: {}", self.step);
        println!("⏱️  Simulated time: {:.4e} yr", seconds_to_years(self.state.elapsed_s));
        println!();

        let total_time: Duration = self.op_timings.iter().map(|t| t.total_time()).sum();

        println!("📈 PER-OPERATION BREAKDOWN:");
        for timing in &self.op_timings {
            let total_op_time = timing.total_time();
            let percentage = if total_time.as_micros() > 0 {
                (total_op_time.as_micros() as f64 / total_time.as_micros() as f64) * 100.0
            } else {
                0.0
            };

            println!(
                "  🔧 {:<25} | Total: {:>8}µs | Avg/step: {:>8}µs | Init: {:>6}µs | After: {:>6}µs | Share: {:>5.1}%",
                timing.op_name,
                total_op_time.as_micros(),
                timing.avg_update_time().as_micros(),
                timing.init_time.as_micros(),
                timing.after_time.as_micros(),
                percentage
            );
        }

        println!();
        println!("📊 === END TIMING REPORT ===\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{CumulativeCounters, HeatLossMode};
    use more_asserts::{assert_ge, assert_gt, assert_le, assert_lt};

    fn small_params() -> SimParams {
        SimParams {
            vol_increments: 200,
            ..SimParams::default()
        }
    }

    struct CountingOp {
        inits: usize,
        updates: usize,
        afters: usize,
    }

    impl SimOp for CountingOp {
        fn name(&self) -> &str {
            "CountingOp"
        }

        fn init_sim(&mut self, _sim: &mut Simulation) {
            self.inits += 1;
        }

        fn update_sim(&mut self, sim: &mut Simulation) {
            self.updates += 1;
            assert_eq!(sim.record.len(), self.updates);
        }

        fn after_sim(&mut self, sim: &mut Simulation) {
            self.afters += 1;
            assert!(sim.summary().is_some());
            assert_eq!(self.inits, 1);
            assert_eq!(self.updates, sim.record.len());
        }
    }

    #[test]
    fn runs_to_liquid_floor() {
        let mut sim = Simulation::from_params(small_params()).unwrap();
        let summary = sim.run().unwrap();

        assert_eq!(sim.termination(), Some(Termination::LiquidFloorReached));
        assert_le!(sim.state.liquid_fraction, 0.06);
        assert_ge!(sim.state.liquid_fraction, 0.049);
        assert_gt!(summary.elapsed_yr, 1.0e6);
        assert!(summary.crust_build_start_yr.is_some());
        assert_gt!(summary.averaged_crust_thickness_m, 1000.0);
    }

    #[test]
    fn passes_through_every_heat_loss_mode() {
        let mut sim = Simulation::from_params(small_params()).unwrap();
        sim.run().unwrap();

        let modes: Vec<HeatLossMode> = sim.record.mode_changes().into_iter().map(|(_, mode)| mode).collect();
        assert_eq!(
            modes,
            vec![
                HeatLossMode::BareRadiation,
                HeatLossMode::QuenchConduction,
                HeatLossMode::CrustConduction
            ]
        );
    }

    #[test]
    fn observers_see_every_committed_increment() {
        let mut sim = Simulation::new(SimProps {
            name: "observed",
            params: small_params(),
            impact_table: None,
            ops: vec![SimOpHandle::new(Box::new(CountingOp {
                inits: 0,
                updates: 0,
                afters: 0,
            }))],
            debug: false,
        })
        .unwrap();
        sim.run().unwrap();

        assert_eq!(sim.op_timings.len(), 1);
        assert_eq!(sim.op_timings[0].update_call_count as usize, sim.record.len());
    }

    #[test]
    fn runs_only_once() {
        let mut sim = Simulation::from_params(small_params()).unwrap();
        sim.run().unwrap();
        assert!(matches!(sim.run(), Err(SimError::AlreadyRun)));
    }

    #[test]
    fn impacts_need_a_table() {
        let mut params = small_params();
        params.impacts_enabled = true;
        params.impact_table_path = None;
        assert!(matches!(
            Simulation::from_params(params),
            Err(SimError::InvalidParameter { name: "impact_table_path", .. })
        ));
    }

    #[test]
    fn stops_at_a_raised_floor() {
        let params = SimParams {
            vol_increments: 200,
            min_remaining_percent: 50.0,
            ..SimParams::default()
        };
        let mut sim = Simulation::from_params(params).unwrap();
        sim.run().unwrap();

        assert_eq!(sim.termination(), Some(Termination::LiquidFloorReached));
        assert_gt!(sim.state.liquid_fraction, 0.49);
        assert_lt!(sim.state.liquid_fraction, 0.51);
        assert_lt!(sim.record.len(), 101);
        // the floor comes long before the crust
        assert!(!sim.state.crust_build_active);
    }

    #[test]
    fn quench_crossing_the_floor_ends_the_run_unrecorded() {
        // the first increment clears the floor, its quench layer does not
        let params = SimParams {
            vol_increments: 1000,
            min_remaining_percent: 99.8999985,
            ..SimParams::default()
        };
        let floor_fraction = params.min_remaining_percent / 100.0;
        let mut sim = Simulation::new(SimProps {
            name: "quench_floor",
            params,
            impact_table: None,
            ops: vec![SimOpHandle::new(Box::new(CountingOp {
                inits: 0,
                updates: 0,
                afters: 0,
            }))],
            debug: false,
        })
        .unwrap();
        let summary = sim.run().unwrap();

        assert_eq!(sim.termination(), Some(Termination::LiquidFloorReached));
        assert_eq!(sim.current_step(), 1);
        assert!(sim.record.is_empty());
        assert_eq!(sim.op_timings[0].update_call_count, 0);
        assert_lt!(sim.state.magma_ocean_volume_m3, floor_fraction * sim.state.initial_volume_m3);

        assert_eq!(sim.state.elapsed_s, 0.0);
        assert_eq!(sim.state.counters, CumulativeCounters::default());
        approx::assert_relative_eq!(sim.state.liquid_fraction, 0.999, max_relative = 1e-12);
        approx::assert_relative_eq!(summary.final_liquid_percent, 99.9, max_relative = 1e-12);
        assert_eq!(summary.elapsed_yr, 0.0);
    }
}
