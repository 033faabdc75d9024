//! Run parameters: loaded once from JSON, validated, then passed by reference
//! to every component for the rest of the run.

use crate::constants::{
    DEFAULT_MAX_SURFACE_TEMP_ITERATIONS, DEFAULT_MAX_TIMESTEP_ITERATIONS,
    DEFAULT_TIMESTEP_TOLERANCE, MOON_RADIUS_M,
};
use crate::error::{SimError, SimResult};
use crate::material::MaterialProfile;
use crate::planet::Planet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub run_number: u32,

    // switches
    pub impacts_enabled: bool,
    pub quench_enabled: bool,
    pub general_heating_enabled: bool,
    pub kinetic_energy_enabled: bool,

    // geometry
    pub planet_radius_m: f64,
    pub initial_depth_m: f64,
    pub plag_build_depth_m: f64,

    // magma ocean
    pub mo_density_kg_m3: f64,
    pub mo_heat_fusion_j_per_kg: f64,
    pub mo_heat_capacity_j_per_kg_k: f64,
    pub mo_thermal_expansion_per_k: f64,
    pub mo_diffusivity_m2_s: f64,
    pub mo_viscosity_pa_s: f64,
    pub adiabat_slope_k_per_m: f64,
    pub gravity_m_s2: f64,

    // plagioclase crust
    pub crust_diffusivity_m2_s: f64,
    pub crust_density_kg_m3: f64,
    pub crust_heat_capacity_j_per_kg_k: f64,
    pub plag_fraction: f64,
    pub hole_fill_weight: f64,

    // quench crust
    pub quench_diffusivity_m2_s: f64,
    pub quench_density_kg_m3: f64,
    pub quench_heat_capacity_j_per_kg_k: f64,
    pub max_quench_thickness_m: f64,
    pub melt_temperature_k: f64,

    // surface
    pub emissivity: f64,
    pub equilibrium_temperature_k: f64,

    // impacts
    pub mass_to_area_kg_per_m2: f64,
    pub largest_impactor_size_m: f64,
    pub debris_location: f64,
    pub ke_efficiency: f64,
    pub impact_table_path: Option<PathBuf>,

    // extra heating
    pub heating_rate_w: f64,

    // numerics
    pub vol_increments: usize,
    pub min_remaining_percent: f64,
    pub timestep_tolerance: f64,
    pub max_timestep_iterations: usize,
    pub max_surface_temperature_iterations: usize,

    pub output_dir: PathBuf,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            run_number: 1,
            impacts_enabled: false,
            quench_enabled: true,
            general_heating_enabled: false,
            kinetic_energy_enabled: false,
            planet_radius_m: MOON_RADIUS_M,
            initial_depth_m: 1000e3,
            plag_build_depth_m: 100e3,
            mo_density_kg_m3: 3000.0,
            mo_heat_fusion_j_per_kg: 4.0e5,
            mo_heat_capacity_j_per_kg_k: 1256.0,
            mo_thermal_expansion_per_k: 3.0e-5,
            mo_diffusivity_m2_s: 1.0e-6,
            mo_viscosity_pa_s: 0.1,
            adiabat_slope_k_per_m: 1.0e-4,
            gravity_m_s2: 1.62,
            crust_diffusivity_m2_s: 1.0e-6,
            crust_density_kg_m3: 2900.0,
            crust_heat_capacity_j_per_kg_k: 1000.0,
            plag_fraction: 0.2,
            hole_fill_weight: 1.0,
            quench_diffusivity_m2_s: 1.0e-6,
            quench_density_kg_m3: 2900.0,
            quench_heat_capacity_j_per_kg_k: 1000.0,
            max_quench_thickness_m: 10.0,
            melt_temperature_k: 1200.0,
            emissivity: 0.87,
            equilibrium_temperature_k: 250.0,
            mass_to_area_kg_per_m2: 1.0e7,
            largest_impactor_size_m: 100e3,
            debris_location: 10.0,
            ke_efficiency: 1.0,
            impact_table_path: None,
            heating_rate_w: 0.0,
            vol_increments: 1000,
            min_remaining_percent: 5.0,
            timestep_tolerance: DEFAULT_TIMESTEP_TOLERANCE,
            max_timestep_iterations: DEFAULT_MAX_TIMESTEP_ITERATIONS,
            max_surface_temperature_iterations: DEFAULT_MAX_SURFACE_TEMP_ITERATIONS,
            output_dir: PathBuf::from("output"),
        }
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> SimError {
    SimError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn require_positive(name: &'static str, value: f64) -> SimResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(name, format!("must be positive and finite, got {}", value)));
    }
    Ok(())
}

fn require_non_negative(name: &'static str, value: f64) -> SimResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(name, format!("must be non-negative and finite, got {}", value)));
    }
    Ok(())
}

impl SimParams {
    /// Load parameters from a JSON file. Missing fields take their defaults.
    pub fn load_json<P: AsRef<Path>>(file_path: P) -> SimResult<SimParams> {
        let json_str = fs::read_to_string(file_path.as_ref())?;
        Self::from_json_str(&json_str)
    }

    pub fn from_json_str(json_str: &str) -> SimResult<SimParams> {
        let params: SimParams = serde_json::from_str(json_str)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json_string(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> SimResult<()> {
        for (name, value) in [
            ("planet_radius_m", self.planet_radius_m),
            ("initial_depth_m", self.initial_depth_m),
            ("plag_build_depth_m", self.plag_build_depth_m),
            ("mo_density_kg_m3", self.mo_density_kg_m3),
            ("mo_heat_fusion_j_per_kg", self.mo_heat_fusion_j_per_kg),
            ("mo_heat_capacity_j_per_kg_k", self.mo_heat_capacity_j_per_kg_k),
            ("mo_thermal_expansion_per_k", self.mo_thermal_expansion_per_k),
            ("mo_diffusivity_m2_s", self.mo_diffusivity_m2_s),
            ("mo_viscosity_pa_s", self.mo_viscosity_pa_s),
            ("gravity_m_s2", self.gravity_m_s2),
            ("crust_diffusivity_m2_s", self.crust_diffusivity_m2_s),
            ("crust_density_kg_m3", self.crust_density_kg_m3),
            ("crust_heat_capacity_j_per_kg_k", self.crust_heat_capacity_j_per_kg_k),
            ("quench_diffusivity_m2_s", self.quench_diffusivity_m2_s),
            ("quench_density_kg_m3", self.quench_density_kg_m3),
            ("quench_heat_capacity_j_per_kg_k", self.quench_heat_capacity_j_per_kg_k),
            ("max_quench_thickness_m", self.max_quench_thickness_m),
            ("melt_temperature_k", self.melt_temperature_k),
            ("emissivity", self.emissivity),
            ("equilibrium_temperature_k", self.equilibrium_temperature_k),
            ("mass_to_area_kg_per_m2", self.mass_to_area_kg_per_m2),
            ("timestep_tolerance", self.timestep_tolerance),
        ] {
            require_positive(name, value)?;
        }

        for (name, value) in [
            ("adiabat_slope_k_per_m", self.adiabat_slope_k_per_m),
            ("hole_fill_weight", self.hole_fill_weight),
            ("ke_efficiency", self.ke_efficiency),
            ("heating_rate_w", self.heating_rate_w),
            ("largest_impactor_size_m", self.largest_impactor_size_m),
            ("debris_location", self.debris_location),
        ] {
            require_non_negative(name, value)?;
        }

        if self.emissivity > 1.0 {
            return Err(invalid("emissivity", format!("must not exceed 1, got {}", self.emissivity)));
        }
        if self.initial_depth_m >= self.planet_radius_m {
            return Err(invalid("initial_depth_m", "must be shallower than the planet radius"));
        }
        if self.plag_build_depth_m >= self.initial_depth_m {
            return Err(invalid("plag_build_depth_m", "must be shallower than the initial magma ocean depth"));
        }
        if !(0.0..=1.0).contains(&self.plag_fraction) {
            return Err(invalid("plag_fraction", format!("must lie in [0, 1], got {}", self.plag_fraction)));
        }
        if !(self.min_remaining_percent > 0.0 && self.min_remaining_percent < 100.0) {
            return Err(invalid(
                "min_remaining_percent",
                format!("must lie in (0, 100), got {}", self.min_remaining_percent),
            ));
        }
        if self.vol_increments == 0 {
            return Err(invalid("vol_increments", "must be at least 1"));
        }
        if self.max_timestep_iterations == 0 {
            return Err(invalid("max_timestep_iterations", "must be at least 1"));
        }
        if self.max_surface_temperature_iterations == 0 {
            return Err(invalid("max_surface_temperature_iterations", "must be at least 1"));
        }
        if self.equilibrium_temperature_k >= self.melt_temperature_k {
            return Err(invalid("equilibrium_temperature_k", "must be colder than the melt temperature"));
        }
        Ok(())
    }

    pub fn planet(&self) -> Planet {
        Planet::new(self.planet_radius_m)
    }

    pub fn mo_material(&self) -> MaterialProfile {
        MaterialProfile::new(
            self.mo_diffusivity_m2_s,
            self.mo_density_kg_m3,
            self.mo_heat_capacity_j_per_kg_k,
        )
    }

    pub fn crust_material(&self) -> MaterialProfile {
        MaterialProfile::new(
            self.crust_diffusivity_m2_s,
            self.crust_density_kg_m3,
            self.crust_heat_capacity_j_per_kg_k,
        )
    }

    pub fn quench_material(&self) -> MaterialProfile {
        MaterialProfile::new(
            self.quench_diffusivity_m2_s,
            self.quench_density_kg_m3,
            self.quench_heat_capacity_j_per_kg_k,
        )
    }

    /// Prefix used for the time-series files of this switch combination.
    pub fn switch_label(&self) -> &'static str {
        match (self.impacts_enabled, self.quench_enabled) {
            (true, true) => "wImpacts_wQuench",
            (true, false) => "wImpacts_noQuench",
            (false, true) => "noImpacts_wQuench",
            (false, false) => "noImpacts_noQuench",
        }
    }
}
