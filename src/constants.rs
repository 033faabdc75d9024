pub const IMAGMA_VERSION: f64 = 4.95;

pub const MOON_RADIUS_M: f64 = 1737.4e3;
pub const STEFAN_BOLTZMANN: f64 = 5.670367e-8; // W/(m²·K⁴)
pub const SECONDS_PER_YEAR: f64 = 3.154e7;
pub const TO_KELVIN: f64 = 273.15;

// Timestep search
pub const INITIAL_TIMESTEP_S: f64 = SECONDS_PER_YEAR; // first trial, re-solved every increment
pub const DEFAULT_TIMESTEP_TOLERANCE: f64 = 0.02; // 2% relative
pub const DEFAULT_MAX_TIMESTEP_ITERATIONS: usize = 500;

// Lid surface temperature solver
pub const SURFACE_TEMP_TOLERANCE: f64 = 0.01; // 1% relative
pub const DEFAULT_MAX_SURFACE_TEMP_ITERATIONS: usize = 200;

// Nusselt correlation, Niemela et al. 2000
pub const NUSSELT_COEFFICIENT: f64 = 0.124;
pub const NUSSELT_EXPONENT: f64 = 0.309;

// Solidus fit, Elkins-Tanton et al. 2011 (eq. 3), radius in km
pub const SOLIDUS_R2_COEFF: f64 = -1.3714e-4;
pub const SOLIDUS_R1_COEFF: f64 = -0.1724;
pub const SOLIDUS_CONSTANT_C: f64 = 1861.0;
pub const SOLIDUS_LIQUID_NUMERATOR: f64 = 4.4;
pub const SOLIDUS_LIQUID_SLOPE: f64 = 0.2;
pub const SOLIDUS_LIQUID_OFFSET: f64 = 0.01;

// Below this unimpacted surface fraction no plagioclase builds global crust
pub const MIN_UNIMPACTED_SURFACE_FRACTION: f64 = 1e-6;
