//! One increment's implicit timestep search.
//!
//! Every trial works on a copy of the committed hole population and reads the
//! committed state without touching it. Only the accepted trial's outcome is
//! handed back to the engine for commit.

use crate::constants::MIN_UNIMPACTED_SURFACE_FRACTION;
use crate::error::{SimError, SimResult};
use crate::material::{LidKind, MaterialProfile};
use crate::math_utils::within_relative_tolerance;
use crate::params::SimParams;
use crate::physics::{
    general_heating_j, quench_thickness, surface_temperature_k, ImpactDelivery, ImpactTable, LidSurface,
    QuenchEstimate, QuenchInputs,
};
use crate::sim::state::{HeatLossMode, Hole, HoleTracker, SimulationState};
use crate::temp_utils::{radiative_flux_w_m2, seconds_to_years};

/// How one increment's solidified volume is shared out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partition {
    pub interior: f64,
    pub global_crust: f64,
    pub hole_fill: f64,
}

impl Partition {
    pub fn all_interior() -> Partition {
        Partition {
            interior: 1.0,
            global_crust: 0.0,
            hole_fill: 0.0,
        }
    }

    /// Plagioclase goes to the lid; while holes are open part of it is steered
    /// into them, in proportion to `fill_weight` times their share of the surface.
    pub fn crust_building(plag_fraction: f64, fill_weight: f64, hole_area_m2: f64, surface_area_m2: f64) -> Partition {
        if hole_area_m2 <= 0.0 {
            return Partition {
                interior: 1.0 - plag_fraction,
                global_crust: plag_fraction,
                hole_fill: 0.0,
            };
        }

        let hole_share = (fill_weight * hole_area_m2 / surface_area_m2).min(1.0);
        let hole_fill = plag_fraction * hole_share;
        let unimpacted = (surface_area_m2 - hole_area_m2) / surface_area_m2;
        let global_crust = if unimpacted <= MIN_UNIMPACTED_SURFACE_FRACTION {
            0.0
        } else {
            plag_fraction - hole_fill
        };

        Partition {
            interior: 1.0 - plag_fraction,
            global_crust,
            hole_fill,
        }
    }
}

/// Thermal state of the magma ocean after the boundary moved this increment.
#[derive(Debug, Clone, Copy)]
pub struct ThermalSnapshot {
    pub cmb_temperature_k: f64,
    pub mo_top_temperature_k: f64,
    pub mo_depth_m: f64,
    pub rayleigh_number: f64,
    pub solidification_energy_j: f64,
    pub cooling_energy_j: f64,
}

/// Everything fixed for the duration of one increment's timestep search.
pub struct TrialContext<'a> {
    pub params: &'a SimParams,
    pub impact_table: Option<&'a ImpactTable>,
    pub surface_area_m2: f64,
    pub volume_increment_m3: f64,
    pub partition: Partition,
    pub thermal: ThermalSnapshot,
}

/// Candidate values produced by one trial timestep.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub holes: HoleTracker,
    pub quench_candidate_m: Option<f64>,
    pub quench_mass_added_kg: f64,
    pub crust_redistributed_m: f64,
    pub impact: ImpactDelivery,
    pub general_heating_j: f64,
    pub energy_to_dump_j: f64,
    pub luminosity_w: f64,
    pub time_to_dump_s: f64,
    pub mode: HeatLossMode,
}

#[derive(Debug, Clone)]
pub struct ResolvedStep {
    pub outcome: TrialOutcome,
    pub timestep_s: f64,
    pub iterations: usize,
}

impl<'a> TrialContext<'a> {
    fn material(&self, kind: LidKind) -> MaterialProfile {
        match kind {
            LidKind::Quench => self.params.quench_material(),
            LidKind::Crust => self.params.crust_material(),
        }
    }

    fn lid(&self, kind: LidKind, thickness_m: f64) -> LidSurface {
        LidSurface {
            thickness_m,
            material: self.material(kind),
            emissivity: self.params.emissivity,
            equilibrium_temperature_k: self.params.equilibrium_temperature_k,
        }
    }

    /// Temperature at the bottom of a lid: the quench melting point under
    /// quench, the magma ocean top under plagioclase crust.
    fn lid_base_k(&self, kind: LidKind) -> f64 {
        match kind {
            LidKind::Quench => self.params.melt_temperature_k,
            LidKind::Crust => self.thermal.mo_top_temperature_k,
        }
    }

    fn surface_temperature(&self, kind: LidKind, thickness_m: f64, guess_k: f64) -> SimResult<f64> {
        surface_temperature_k(
            self.lid_base_k(kind),
            guess_k,
            &self.lid(kind, thickness_m),
            self.params.max_surface_temperature_iterations,
        )
    }

    fn bare_flux_w_m2(&self) -> f64 {
        radiative_flux_w_m2(
            self.params.emissivity,
            self.thermal.mo_top_temperature_k,
            self.params.equilibrium_temperature_k,
        )
    }

    /// Flux through a lid of `thickness_m`; an absent lid radiates from the
    /// magma ocean top directly.
    fn lid_flux_w_m2(&self, kind: LidKind, thickness_m: f64, surface_k: f64) -> f64 {
        if thickness_m == 0.0 {
            self.bare_flux_w_m2()
        } else {
            self.material(kind)
                .conductive_flux_w_m2(self.lid_base_k(kind), surface_k, thickness_m)
        }
    }

    fn quench_estimate(&self) -> QuenchEstimate {
        let p = self.params;
        quench_thickness(&QuenchInputs {
            cmb_temperature_k: self.thermal.cmb_temperature_k,
            mo_depth_m: self.thermal.mo_depth_m,
            mo: p.mo_material(),
            rayleigh_number: self.thermal.rayleigh_number,
            emissivity: p.emissivity,
            equilibrium_temperature_k: p.equilibrium_temperature_k,
            quench: p.quench_material(),
            melt_temperature_k: p.melt_temperature_k,
            max_thickness_m: p.max_quench_thickness_m,
        })
    }
}

/// Evaluate one trial timestep against the committed `state`.
pub fn run_trial(ctx: &TrialContext, state: &SimulationState, trial_s: f64) -> SimResult<TrialOutcome> {
    if !trial_s.is_finite() {
        return Err(SimError::NonFiniteTimestep(trial_s));
    }

    let p = ctx.params;
    let surface = ctx.surface_area_m2;
    let quench_density = p.quench_density_kg_m3;
    let committed_hole_area = state.holes.total_area_m2();
    let lid_kind = if state.crust_build_active { LidKind::Crust } else { LidKind::Quench };

    let estimate = ctx.quench_estimate();
    let mut holes = state.holes.clone();
    let mut quench_mass_kg = 0.0;

    // existing holes either re-equilibrate their quench or take their share of plagioclase
    if !state.crust_build_active {
        for hole in holes.iter_mut() {
            if hole.thickness_m < p.max_quench_thickness_m {
                let surface_k = ctx.surface_temperature(LidKind::Quench, estimate.thickness_m, hole.surface_temperature_k)?;
                quench_mass_kg += (estimate.thickness_m - hole.thickness_m) * hole.area_m2 * quench_density;
                hole.thickness_m = estimate.thickness_m;
                hole.surface_temperature_k = surface_k;
            } else {
                hole.thickness_m = p.max_quench_thickness_m;
            }
        }
    } else if committed_hole_area > 0.0 {
        let thickening = ctx.partition.hole_fill * (p.mo_density_kg_m3 / p.crust_density_kg_m3) * ctx.volume_increment_m3
            / committed_hole_area;
        for hole in holes.iter_mut() {
            hole.thickness_m += thickening;
            hole.surface_temperature_k =
                ctx.surface_temperature(LidKind::Crust, hole.thickness_m, hole.surface_temperature_k)?;
        }
    }

    let mut quench_candidate_m = None;
    if !state.crust_build_active && p.quench_enabled {
        quench_candidate_m = Some(estimate.thickness_m);
        if state.global_quench_thickness_m < p.max_quench_thickness_m {
            quench_mass_kg += (estimate.thickness_m - state.global_quench_thickness_m)
                * (surface - committed_hole_area)
                * quench_density;
        }
    }

    let mut impact = ImpactDelivery::default();
    let mut crust_redistributed_m = 0.0;
    if p.impacts_enabled && state.has_lid() {
        if let Some(table) = ctx.impact_table {
            impact = table.delivery(
                seconds_to_years(state.elapsed_s),
                seconds_to_years(trial_s),
                p.mass_to_area_kg_per_m2,
            );
        }

        let new_area = impact.area_m2;
        if new_area > 0.0 {
            let excavated_m3 = (committed_hole_area / surface) * new_area * state.holes.area_weighted_thickness_m()
                + ((surface - committed_hole_area) / surface) * new_area * state.hole_reference_thickness_m();
            let shrink = 1.0 - new_area / surface;

            if state.crust_build_active {
                // ejecta blankets the whole surface evenly
                crust_redistributed_m = excavated_m3 / surface;
                for hole in holes.iter_mut() {
                    hole.thickness_m += crust_redistributed_m;
                    hole.area_m2 *= shrink;
                }
            } else {
                for hole in holes.iter_mut() {
                    hole.area_m2 *= shrink;
                }
                quench_mass_kg -= quench_density * excavated_m3;
            }

            let base_k = ctx.lid_base_k(lid_kind);
            holes.push(Hole {
                area_m2: new_area,
                thickness_m: estimate.thickness_m,
                surface_temperature_k: ctx.surface_temperature(lid_kind, estimate.thickness_m, base_k)?,
            });
            quench_mass_kg += estimate.thickness_m * new_area * quench_density;
        }
    }

    let general_heating = general_heating_j(p.general_heating_enabled, p.heating_rate_w, trial_s)?;
    let mut energy_to_dump_j = ctx.thermal.solidification_energy_j + ctx.thermal.cooling_energy_j
        - quench_mass_kg * p.mo_heat_fusion_j_per_kg
        + general_heating;
    if p.kinetic_energy_enabled {
        energy_to_dump_j += p.ke_efficiency * impact.energy_j;
    }

    let (mode, luminosity_w) = heat_loss(ctx, state, &holes)?;
    let time_to_dump_s = energy_to_dump_j / luminosity_w;
    if !(time_to_dump_s.is_finite() && time_to_dump_s > 0.0) {
        return Err(SimError::InvalidHeatLoss {
            mechanism: mode.as_str(),
            luminosity_w,
            energy_j: energy_to_dump_j,
        });
    }

    Ok(TrialOutcome {
        holes,
        quench_candidate_m,
        quench_mass_added_kg: quench_mass_kg,
        crust_redistributed_m,
        impact,
        general_heating_j: general_heating,
        energy_to_dump_j,
        luminosity_w,
        time_to_dump_s,
        mode,
    })
}

/// Total heat loss (W) of the candidate surface and the mechanism behind it.
fn heat_loss(ctx: &TrialContext, state: &SimulationState, holes: &HoleTracker) -> SimResult<(HeatLossMode, f64)> {
    let surface = ctx.surface_area_m2;

    if !state.has_lid() {
        return Ok((HeatLossMode::BareRadiation, surface * ctx.bare_flux_w_m2()));
    }

    let (mode, kind, lid_thickness_m) = if state.crust_build_active {
        (HeatLossMode::CrustConduction, LidKind::Crust, state.global_crust_thickness_m)
    } else {
        (HeatLossMode::QuenchConduction, LidKind::Quench, state.global_quench_thickness_m)
    };

    let hole_area = holes.total_area_m2();
    if hole_area > surface {
        return Err(SimError::HoleAreaExceedsSurface {
            phase: kind.as_str(),
            hole_area_m2: hole_area,
            surface_area_m2: surface,
        });
    }

    let base_k = ctx.lid_base_k(kind);
    let lid_surface_k = ctx.surface_temperature(kind, lid_thickness_m, base_k)?;
    let unimpacted_w = (surface - hole_area) * ctx.lid_flux_w_m2(kind, lid_thickness_m, lid_surface_k);
    let holes_w: f64 = holes
        .iter()
        .map(|hole| hole.area_m2 * ctx.lid_flux_w_m2(kind, hole.thickness_m, hole.surface_temperature_k))
        .sum();

    Ok((mode, unimpacted_w + holes_w))
}

/// Iterate trials until the timestep reproduces itself within the tolerance.
pub fn resolve_timestep(ctx: &TrialContext, state: &SimulationState) -> SimResult<ResolvedStep> {
    let p = ctx.params;
    let mut trial_s = state.time_step_s;
    let mut time_to_dump_s = f64::NAN;

    for iterations in 1..=p.max_timestep_iterations {
        let outcome = run_trial(ctx, state, trial_s)?;
        time_to_dump_s = outcome.time_to_dump_s;

        if within_relative_tolerance(trial_s, time_to_dump_s, p.timestep_tolerance) {
            return Ok(ResolvedStep {
                outcome,
                timestep_s: trial_s,
                iterations,
            });
        }
        log::trace!(
            "trial {} rejected: {:.4e} s vs {:.4e} s to dump",
            iterations,
            trial_s,
            time_to_dump_s
        );
        trial_s = time_to_dump_s;
    }

    Err(SimError::TimestepNonConvergence {
        iterations: p.max_timestep_iterations,
        trial_s,
        time_to_dump_s,
    })
}
