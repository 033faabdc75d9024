use crate::constants::{
    SOLIDUS_CONSTANT_C, SOLIDUS_LIQUID_NUMERATOR, SOLIDUS_LIQUID_OFFSET, SOLIDUS_LIQUID_SLOPE,
    SOLIDUS_R1_COEFF, SOLIDUS_R2_COEFF,
};
use crate::error::{SimError, SimResult};
use crate::temp_utils::celsius_to_kelvin;

/// Solidus temperature (K) at `radius_m` inside the Moon when `liquid_fraction`
/// of the magma ocean remains. Polynomial fit in radius (km) with a liquid
/// fraction term that diverges as the melt runs out.
pub fn solidus_temperature_k(radius_m: f64, liquid_fraction: f64) -> SimResult<f64> {
    if !liquid_fraction.is_finite() || liquid_fraction <= 0.0 {
        return Err(SimError::NonPositiveLiquidFraction(liquid_fraction));
    }
    let radius_km = radius_m / 1000.0;

    let solidus_c = SOLIDUS_R2_COEFF * radius_km.powi(2) + SOLIDUS_R1_COEFF * radius_km + SOLIDUS_CONSTANT_C
        - SOLIDUS_LIQUID_NUMERATOR / (SOLIDUS_LIQUID_SLOPE * liquid_fraction + SOLIDUS_LIQUID_OFFSET);
    Ok(celsius_to_kelvin(solidus_c))
}
