//! The solidification engine: committed state, the per-increment timestep
//! search, the recorded time series and the observer hooks.

pub mod record;
pub mod sim_op;
pub mod state;
pub mod timestep;
mod simulation;

pub use simulation::{OpTiming, SimProps, Simulation, Termination};
