use crate::error::SimResult;
use crate::math_utils::{mean, weighted_mean};
use crate::params::SimParams;
use crate::physics::solidus_temperature_k;
use crate::constants::INITIAL_TIMESTEP_S;
use serde::{Deserialize, Serialize};

/// A surface patch where an impact thinned or removed the lid. Tracked on its
/// own until its lid catches up with the surrounding surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub area_m2: f64,
    pub thickness_m: f64,
    pub surface_temperature_k: f64,
}

/// Unordered population of holes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoleTracker {
    holes: Vec<Hole>,
}

impl HoleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hole: Hole) {
        self.holes.push(hole);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hole> {
        self.holes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Hole> {
        self.holes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.holes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    pub fn total_area_m2(&self) -> f64 {
        self.holes.iter().map(|h| h.area_m2).sum()
    }

    /// Lid volume sitting in holes, Σ area · thickness.
    pub fn lid_volume_m3(&self) -> f64 {
        self.holes.iter().map(|h| h.area_m2 * h.thickness_m).sum()
    }

    pub fn area_weighted_thickness_m(&self) -> f64 {
        weighted_mean(self.holes.iter().map(|h| (h.area_m2, h.thickness_m)))
    }

    pub fn mean_thickness_m(&self) -> f64 {
        mean(&self.holes.iter().map(|h| h.thickness_m).collect::<Vec<_>>())
    }

    pub fn mean_surface_temperature_k(&self) -> f64 {
        mean(&self.holes.iter().map(|h| h.surface_temperature_k).collect::<Vec<_>>())
    }

    /// Drop holes whose lid has caught up with `reference_thickness_m`.
    pub fn retain_thinner_than(&mut self, reference_thickness_m: f64) {
        self.holes.retain(|h| h.thickness_m < reference_thickness_m);
    }
}

impl FromIterator<Hole> for HoleTracker {
    fn from_iter<I: IntoIterator<Item = Hole>>(iter: I) -> Self {
        HoleTracker {
            holes: iter.into_iter().collect(),
        }
    }
}

/// How the magma ocean is losing heat during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeatLossMode {
    BareRadiation,
    QuenchConduction,
    CrustConduction,
}

impl HeatLossMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeatLossMode::BareRadiation => "bare radiation",
            HeatLossMode::QuenchConduction => "quench conduction",
            HeatLossMode::CrustConduction => "crust conduction",
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            HeatLossMode::BareRadiation => 0,
            HeatLossMode::QuenchConduction => 1,
            HeatLossMode::CrustConduction => 2,
        }
    }
}

/// Running totals over the whole run; never decrease.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CumulativeCounters {
    pub impact_mass_kg: f64,
    pub impact_energy_j: f64,
    pub energy_dumped_j: f64,
    pub general_heating_j: f64,
    pub hole_area_created_m2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub cmb_radius_m: f64,
    pub initial_volume_m3: f64,
    pub magma_ocean_volume_m3: f64,
    pub liquid_fraction: f64,
    pub cmb_temperature_k: f64,

    pub global_crust_thickness_m: f64,
    pub global_quench_thickness_m: f64,
    pub averaged_crust_thickness_m: f64,

    pub crust_build_active: bool,
    pub crust_build_start_s: Option<f64>,

    pub elapsed_s: f64,
    pub time_step_s: f64,

    pub holes: HoleTracker,
    pub counters: CumulativeCounters,
}

impl SimulationState {
    pub fn new(params: &SimParams) -> SimResult<SimulationState> {
        let planet = params.planet();
        let initial_volume_m3 = planet.shell_volume_m3(params.initial_depth_m);
        let cmb_radius_m = planet.radius_m - params.initial_depth_m;

        Ok(SimulationState {
            cmb_radius_m,
            initial_volume_m3,
            magma_ocean_volume_m3: initial_volume_m3,
            liquid_fraction: 1.0,
            cmb_temperature_k: solidus_temperature_k(cmb_radius_m, 1.0)?,
            global_crust_thickness_m: 0.0,
            global_quench_thickness_m: 0.0,
            averaged_crust_thickness_m: 0.0,
            crust_build_active: false,
            crust_build_start_s: None,
            elapsed_s: 0.0,
            time_step_s: INITIAL_TIMESTEP_S,
            holes: HoleTracker::new(),
            counters: CumulativeCounters::default(),
        })
    }

    /// Thickness a hole has to reach to merge back into the uniform surface.
    pub fn hole_reference_thickness_m(&self) -> f64 {
        if self.crust_build_active {
            self.global_crust_thickness_m
        } else {
            self.global_quench_thickness_m
        }
    }

    /// True once there is a lid of any kind over the unimpacted surface.
    pub fn has_lid(&self) -> bool {
        self.crust_build_active || self.global_quench_thickness_m > 0.0
    }
}
