pub mod constants;
pub mod error;
pub mod material;
pub mod math_utils;
pub mod params;
pub mod physics;
pub mod planet;
pub mod sim;
pub mod temp_utils;

pub use error::{SimError, SimResult};
pub use params::SimParams;
pub use sim::{SimProps, Simulation};
