//! Per-increment time series and the end-of-run summary row.

use crate::constants::IMAGMA_VERSION;
use crate::params::SimParams;
use crate::planet::sphere_volume_m3;
use crate::sim::state::{HeatLossMode, SimulationState};
use crate::temp_utils::seconds_to_years;
use serde::Serialize;

/// Committed state after one increment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub time_s: f64,
    pub timestep_s: f64,
    pub liquid_fraction: f64,
    pub magma_ocean_volume_m3: f64,
    pub cmb_radius_m: f64,
    pub cmb_temperature_k: f64,
    pub crust_thickness_m: f64,
    pub averaged_crust_thickness_m: f64,
    pub quench_thickness_m: f64,
    pub heat_loss_mode: HeatLossMode,
    pub timestep_iterations: usize,
}

/// Hole population statistics, recorded on increments that end with open holes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoleSample {
    pub time_s: f64,
    pub total_area_m2: f64,
    pub area_percent: f64,
    pub mean_thickness_m: f64,
    pub mean_surface_temperature_k: f64,
    pub creation_rate_m2_per_yr: f64,
    pub cumulative_area_percent: f64,
    pub count: usize,
}

/// Area-weighted crust thickness on increments where holes exist during crust building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactedCrustSample {
    pub time_s: f64,
    pub impacted_thickness_m: f64,
    pub averaged_crust_thickness_m: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub samples: Vec<Sample>,
    pub holes: Vec<HoleSample>,
    pub impacted_crust: Vec<ImpactedCrustSample>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn mode_changes(&self) -> Vec<(f64, HeatLossMode)> {
        let mut changes: Vec<(f64, HeatLossMode)> = Vec::new();
        for sample in &self.samples {
            if changes.last().map(|(_, mode)| *mode) != Some(sample.heat_loss_mode) {
                changes.push((sample.time_s, sample.heat_loss_mode));
            }
        }
        changes
    }
}

/// Where the initial magma ocean mass ended up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MassBudget {
    pub initial_kg: f64,
    pub solid_interior_kg: f64,
    pub crust_in_holes_kg: f64,
    pub crust_unimpacted_kg: f64,
    pub remaining_liquid_kg: f64,
}

impl MassBudget {
    pub fn from_state(params: &SimParams, state: &SimulationState, surface_area_m2: f64) -> MassBudget {
        let planet = params.planet();
        let initial_cmb_m = planet.radius_m - params.initial_depth_m;
        let hole_area = state.holes.total_area_m2();

        MassBudget {
            initial_kg: state.initial_volume_m3 * params.mo_density_kg_m3,
            solid_interior_kg: params.mo_density_kg_m3
                * (sphere_volume_m3(state.cmb_radius_m) - sphere_volume_m3(initial_cmb_m)),
            crust_in_holes_kg: state.holes.lid_volume_m3() * params.crust_density_kg_m3,
            crust_unimpacted_kg: state.global_crust_thickness_m
                * (surface_area_m2 - hole_area)
                * params.crust_density_kg_m3,
            remaining_liquid_kg: state.liquid_fraction * state.initial_volume_m3 * params.mo_density_kg_m3,
        }
    }

    pub fn final_kg(&self) -> f64 {
        self.solid_interior_kg + self.crust_in_holes_kg + self.crust_unimpacted_kg + self.remaining_liquid_kg
    }
}

/// One score-card row: the run's configuration followed by its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_number: u32,
    pub version: f64,
    pub duration_s: f64,
    pub vol_increments: usize,
    pub tolerance_percent: f64,
    pub impacts_enabled: bool,
    pub quench_enabled: bool,
    pub general_heating_enabled: bool,
    pub kinetic_energy_enabled: bool,
    pub largest_impactor_size_m: f64,
    pub debris_location: f64,
    pub mass_to_area_kg_per_m2: f64,
    pub initial_depth_m: f64,
    pub plag_build_depth_m: f64,
    pub plag_fraction: f64,
    pub min_remaining_percent: f64,
    pub max_quench_thickness_m: f64,
    pub mo_density_kg_m3: f64,
    pub crust_density_kg_m3: f64,
    pub quench_density_kg_m3: f64,
    pub mo_heat_fusion_j_per_kg: f64,
    pub mo_heat_capacity_j_per_kg_k: f64,
    pub crust_heat_capacity_j_per_kg_k: f64,
    pub quench_heat_capacity_j_per_kg_k: f64,
    pub mo_thermal_expansion_per_k: f64,
    pub mo_diffusivity_m2_s: f64,
    pub crust_diffusivity_m2_s: f64,
    pub quench_diffusivity_m2_s: f64,
    pub mo_viscosity_pa_s: f64,
    pub adiabat_slope_k_per_m: f64,
    pub melt_temperature_k: f64,
    pub equilibrium_temperature_k: f64,
    pub emissivity: f64,
    pub ke_efficiency: f64,
    pub mass: MassBudget,
    pub cumulative_impact_mass_kg: f64,
    pub cumulative_impact_energy_j: f64,
    pub heating_rate_w: f64,
    pub cumulative_general_heating_j: f64,
    pub cumulative_energy_dumped_j: f64,
    pub final_liquid_percent: f64,
    pub crust_build_start_yr: Option<f64>,
    pub hole_surface_percent: f64,
    pub elapsed_yr: f64,
    pub averaged_crust_thickness_m: f64,
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

impl RunSummary {
    pub fn new(params: &SimParams, state: &SimulationState, surface_area_m2: f64, duration_s: f64) -> RunSummary {
        let p = params;
        RunSummary {
            run_number: p.run_number,
            version: IMAGMA_VERSION,
            duration_s,
            vol_increments: p.vol_increments,
            tolerance_percent: p.timestep_tolerance * 100.0,
            impacts_enabled: p.impacts_enabled,
            quench_enabled: p.quench_enabled,
            general_heating_enabled: p.general_heating_enabled,
            kinetic_energy_enabled: p.kinetic_energy_enabled,
            largest_impactor_size_m: p.largest_impactor_size_m,
            debris_location: p.debris_location,
            mass_to_area_kg_per_m2: p.mass_to_area_kg_per_m2,
            initial_depth_m: p.initial_depth_m,
            plag_build_depth_m: p.plag_build_depth_m,
            plag_fraction: p.plag_fraction,
            min_remaining_percent: p.min_remaining_percent,
            max_quench_thickness_m: p.max_quench_thickness_m,
            mo_density_kg_m3: p.mo_density_kg_m3,
            crust_density_kg_m3: p.crust_density_kg_m3,
            quench_density_kg_m3: p.quench_density_kg_m3,
            mo_heat_fusion_j_per_kg: p.mo_heat_fusion_j_per_kg,
            mo_heat_capacity_j_per_kg_k: p.mo_heat_capacity_j_per_kg_k,
            crust_heat_capacity_j_per_kg_k: p.crust_heat_capacity_j_per_kg_k,
            quench_heat_capacity_j_per_kg_k: p.quench_heat_capacity_j_per_kg_k,
            mo_thermal_expansion_per_k: p.mo_thermal_expansion_per_k,
            mo_diffusivity_m2_s: p.mo_diffusivity_m2_s,
            crust_diffusivity_m2_s: p.crust_diffusivity_m2_s,
            quench_diffusivity_m2_s: p.quench_diffusivity_m2_s,
            mo_viscosity_pa_s: p.mo_viscosity_pa_s,
            adiabat_slope_k_per_m: p.adiabat_slope_k_per_m,
            melt_temperature_k: p.melt_temperature_k,
            equilibrium_temperature_k: p.equilibrium_temperature_k,
            emissivity: p.emissivity,
            ke_efficiency: p.ke_efficiency,
            mass: MassBudget::from_state(p, state, surface_area_m2),
            cumulative_impact_mass_kg: state.counters.impact_mass_kg,
            cumulative_impact_energy_j: state.counters.impact_energy_j,
            heating_rate_w: p.heating_rate_w,
            cumulative_general_heating_j: state.counters.general_heating_j,
            cumulative_energy_dumped_j: state.counters.energy_dumped_j,
            final_liquid_percent: state.liquid_fraction * 100.0,
            crust_build_start_yr: state.crust_build_start_s.map(seconds_to_years),
            hole_surface_percent: state.holes.total_area_m2() / surface_area_m2 * 100.0,
            elapsed_yr: seconds_to_years(state.elapsed_s),
            averaged_crust_thickness_m: state.averaged_crust_thickness_m,
        }
    }

    /// Column names and values in score-card order.
    pub fn columns(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("run", self.run_number as f64),
            ("version", self.version),
            ("duration_s", self.duration_s),
            ("vol_increments", self.vol_increments as f64),
            ("tolerance_pct", self.tolerance_percent),
            ("impacts", flag(self.impacts_enabled)),
            ("quench", flag(self.quench_enabled)),
            ("general_heating", flag(self.general_heating_enabled)),
            ("kinetic_energy", flag(self.kinetic_energy_enabled)),
            ("largest_impactor_m", self.largest_impactor_size_m),
            ("debris_location", self.debris_location),
            ("mass_to_area_kg_m2", self.mass_to_area_kg_per_m2),
            ("initial_depth_m", self.initial_depth_m),
            ("plag_build_depth_m", self.plag_build_depth_m),
            ("plag_fraction", self.plag_fraction),
            ("min_remaining_pct", self.min_remaining_percent),
            ("max_quench_m", self.max_quench_thickness_m),
            ("rho_mo", self.mo_density_kg_m3),
            ("rho_crust", self.crust_density_kg_m3),
            ("rho_quench", self.quench_density_kg_m3),
            ("heat_fusion", self.mo_heat_fusion_j_per_kg),
            ("c_mo", self.mo_heat_capacity_j_per_kg_k),
            ("c_crust", self.crust_heat_capacity_j_per_kg_k),
            ("c_quench", self.quench_heat_capacity_j_per_kg_k),
            ("alpha_mo", self.mo_thermal_expansion_per_k),
            ("kappa_mo", self.mo_diffusivity_m2_s),
            ("kappa_crust", self.crust_diffusivity_m2_s),
            ("kappa_quench", self.quench_diffusivity_m2_s),
            ("viscosity", self.mo_viscosity_pa_s),
            ("adiabat_k_m", self.adiabat_slope_k_per_m),
            ("melt_temp_k", self.melt_temperature_k),
            ("eq_temp_k", self.equilibrium_temperature_k),
            ("emissivity", self.emissivity),
            ("ke_efficiency", self.ke_efficiency),
            ("initial_mass_kg", self.mass.initial_kg),
            ("final_mass_kg", self.mass.final_kg()),
            ("cum_impact_mass_kg", self.cumulative_impact_mass_kg),
            ("cum_impact_energy_j", self.cumulative_impact_energy_j),
            ("heating_rate_w", self.heating_rate_w),
            ("cum_general_heating_j", self.cumulative_general_heating_j),
            ("cum_energy_dumped_j", self.cumulative_energy_dumped_j),
            ("liquid_pct", self.final_liquid_percent),
            ("crust_start_yr", self.crust_build_start_yr.unwrap_or(f64::NAN)),
            ("hole_surface_pct", self.hole_surface_percent),
            ("elapsed_yr", self.elapsed_yr),
            ("averaged_crust_m", self.averaged_crust_thickness_m),
        ]
    }

    pub fn csv_header(&self) -> String {
        self.columns().iter().map(|(name, _)| *name).collect::<Vec<_>>().join(",")
    }

    pub fn csv_row(&self) -> String {
        self.columns()
            .iter()
            .map(|(_, value)| format!("{:.7e}", value))
            .collect::<Vec<_>>()
            .join(",")
    }
}
