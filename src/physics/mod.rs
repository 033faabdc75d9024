pub mod general_heating;
pub mod impacts;
pub mod quench_crust;
pub mod rayleigh;
pub mod solidus;
pub mod surface_temperature;

pub use general_heating::general_heating_j;
pub use impacts::{ImpactDelivery, ImpactRateRow, ImpactTable};
pub use quench_crust::{QuenchEstimate, QuenchInputs, quench_thickness};
pub use rayleigh::rayleigh_number;
pub use solidus::solidus_temperature_k;
pub use surface_temperature::{LidSurface, surface_temperature_k};
