//! Crate-level error type. Every model returns `Result<_, SimError>` and the
//! engine is the only place that decides to abort a run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("liquid fraction must be positive, got {0}")]
    NonPositiveLiquidFraction(f64),

    #[error("timestep is not finite: {0}")]
    NonFiniteTimestep(f64),

    #[error("total hole area {hole_area_m2:.6e} m² exceeds surface area {surface_area_m2:.6e} m² ({phase} phase)")]
    HoleAreaExceedsSurface {
        phase: &'static str,
        hole_area_m2: f64,
        surface_area_m2: f64,
    },

    #[error("invalid heat loss in {mechanism}: luminosity {luminosity_w:e} W, energy to dump {energy_j:e} J")]
    InvalidHeatLoss {
        mechanism: &'static str,
        luminosity_w: f64,
        energy_j: f64,
    },

    #[error("timestep search did not converge after {iterations} trials (last trial {trial_s:e} s, time to dump {time_to_dump_s:e} s)")]
    TimestepNonConvergence {
        iterations: usize,
        trial_s: f64,
        time_to_dump_s: f64,
    },

    #[error("surface temperature did not converge after {iterations} iterations (lid {lid_thickness_m} m, last {last_k} K)")]
    SurfaceTemperatureNonConvergence {
        iterations: usize,
        lid_thickness_m: f64,
        last_k: f64,
    },

    #[error("inconsistent simulation state: {0}")]
    InvalidState(String),

    #[error("simulation has already been run")]
    AlreadyRun,

    #[error("impact table {source_name}: {reason}")]
    ImpactTable { source_name: String, reason: String },

    #[error("failed to parse parameters: {0}")]
    Params(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
