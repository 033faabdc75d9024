use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::state::HeatLossMode;
use crate::sim::Simulation;
use crate::temp_utils::{kelvin_to_celsius, seconds_to_years};
use colored::Colorize;

/// Progress Reporter Operator
///
/// Prints the magma ocean's progress every `report_interval` increments and
/// whenever the heat-loss mechanism changes.
#[derive(Debug, Clone)]
pub struct ProgressReporterOp {
    pub name: String,
    pub report_interval: i32,
    pub show_holes: bool,
    last_mode: Option<HeatLossMode>,
}

fn format_years(years: f64) -> String {
    if years >= 1_000_000.0 {
        format!("{:.2} Myr", years / 1_000_000.0)
    } else if years >= 1_000.0 {
        format!("{:.1} kyr", years / 1_000.0)
    } else {
        format!("{:.0} yr", years)
    }
}

impl ProgressReporterOp {
    pub fn new(report_interval: i32) -> Self {
        Self {
            name: "ProgressReporterOp".to_string(),
            report_interval: report_interval.max(1),
            show_holes: true,
            last_mode: None,
        }
    }

    pub fn new_with_options(report_interval: i32, show_holes: bool) -> Self {
        Self {
            show_holes,
            ..Self::new(report_interval)
        }
    }

    pub fn handle(report_interval: i32) -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new(report_interval)))
    }

    pub fn handle_with_options(report_interval: i32, show_holes: bool) -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new_with_options(report_interval, show_holes)))
    }

    fn status_line(&self, sim: &Simulation) -> String {
        let state = &sim.state;
        format!(
            "   Step {}: t = {}, liquid = {:.1}%, CMB T = {:.1}K ({:.1}°C), crust = {:.2}km, quench = {:.3}m",
            sim.current_step(),
            format_years(seconds_to_years(state.elapsed_s)),
            state.liquid_fraction * 100.0,
            state.cmb_temperature_k,
            kelvin_to_celsius(state.cmb_temperature_k),
            state.averaged_crust_thickness_m / 1000.0,
            state.global_quench_thickness_m
        )
    }
}

impl SimOp for ProgressReporterOp {
    fn name(&self) -> &str {
        &self.name
    }

    fn init_sim(&mut self, sim: &mut Simulation) {
        let p = &sim.params;
        println!("{}", format!("🌋 Starting magma ocean run {} ({})", p.run_number, p.switch_label()).bold());
        println!(
            "   Depth {:.0}km, {} increments, liquid floor {:.1}%",
            p.initial_depth_m / 1000.0,
            p.vol_increments,
            p.min_remaining_percent
        );
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        if let Some(sample) = sim.record.last() {
            if self.last_mode != Some(sample.heat_loss_mode) {
                let label = format!(
                    "   ➡️  {} from {}",
                    sample.heat_loss_mode.as_str(),
                    format_years(seconds_to_years(sample.time_s))
                );
                println!("{}", label.cyan());
                self.last_mode = Some(sample.heat_loss_mode);
            }
        }

        if sim.current_step() % self.report_interval == 0 {
            println!("{}", self.status_line(sim));

            if self.show_holes && !sim.state.holes.is_empty() {
                let holes = &sim.state.holes;
                println!(
                    "      holes: {} open, {:.4}% of surface, mean {:.2}m thick",
                    holes.len(),
                    holes.total_area_m2() / sim.surface_area_m2() * 100.0,
                    holes.mean_thickness_m()
                );
            }
        }
    }

    fn after_sim(&mut self, sim: &mut Simulation) {
        println!("\n{}", "📈 Simulation Complete!".green().bold());
        println!("{}", self.status_line(sim));

        if let Some(summary) = sim.summary() {
            match summary.crust_build_start_yr {
                Some(start) => println!("   Plagioclase crust began at {}", format_years(start)),
                None => println!("   {}", "Plagioclase crust never began".yellow()),
            }
            println!(
                "   Mass in: {:.4e} kg, mass out: {:.4e} kg",
                summary.mass.initial_kg,
                summary.mass.final_kg()
            );
            println!("   Wall clock: {:.2}s", summary.duration_s);
        }
    }
}
