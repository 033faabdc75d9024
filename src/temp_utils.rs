//! Temperature, radiation and time-unit helpers shared by the models and the
//! solidification engine.

use crate::constants::{SECONDS_PER_YEAR, STEFAN_BOLTZMANN, TO_KELVIN};

/// Converts Celsius to Kelvin.
pub fn celsius_to_kelvin(temp_c: f64) -> f64 {
    temp_c + TO_KELVIN
}

/// Converts Kelvin to Celsius.
pub fn kelvin_to_celsius(temp_k: f64) -> f64 {
    temp_k - TO_KELVIN
}

pub fn seconds_to_years(seconds: f64) -> f64 {
    seconds / SECONDS_PER_YEAR
}

/// Net grey-body flux (W/m²) from a surface at `temp_k` into surroundings at
/// `equilibrium_k`.
pub fn radiative_flux_w_m2(emissivity: f64, temp_k: f64, equilibrium_k: f64) -> f64 {
    emissivity * STEFAN_BOLTZMANN * (temp_k.powi(4) - equilibrium_k.powi(4))
}

/// Surface temperature that radiates `flux_w_m2` into surroundings at
/// `equilibrium_k`. Inverse of `radiative_flux_w_m2`.
pub fn radiating_temperature_k(emissivity: f64, flux_w_m2: f64, equilibrium_k: f64) -> f64 {
    (flux_w_m2 / (emissivity * STEFAN_BOLTZMANN) + equilibrium_k.powi(4)).powf(0.25)
}

/// Temperature at the top of the magma ocean, following the adiabat up from
/// the solid-interior boundary.
pub fn adiabat_top_temperature_k(cmb_temperature_k: f64, adiabat_slope_k_per_m: f64, mo_height_m: f64) -> f64 {
    cmb_temperature_k - adiabat_slope_k_per_m * mo_height_m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_celsius_kelvin_conversion() {
        let test_cases = vec![
            (0.0, 273.15),
            (100.0, 373.15),
            (1588.0, 1861.15), // solidus constant of the lunar fit
        ];

        for (celsius, expected_kelvin) in test_cases {
            let kelvin = celsius_to_kelvin(celsius);
            assert_abs_diff_eq!(kelvin, expected_kelvin, epsilon = 0.01);
            assert_abs_diff_eq!(kelvin_to_celsius(kelvin), celsius, epsilon = 0.01);
        }
    }

    #[test]
    fn test_year_conversion() {
        assert_abs_diff_eq!(seconds_to_years(SECONDS_PER_YEAR * 2.5), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_radiation_inverse() {
        let flux = radiative_flux_w_m2(0.87, 1500.0, 250.0);
        assert!(flux > 0.0);
        assert_abs_diff_eq!(radiating_temperature_k(0.87, flux, 250.0), 1500.0, epsilon = 1e-6);
    }

    #[test]
    fn test_no_flux_at_equilibrium() {
        assert_abs_diff_eq!(radiative_flux_w_m2(1.0, 250.0, 250.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_adiabat() {
        assert_abs_diff_eq!(adiabat_top_temperature_k(1900.0, 1e-4, 1_000_000.0), 1800.0, epsilon = 1e-9);
    }
}
