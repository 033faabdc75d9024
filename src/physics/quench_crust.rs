//! Equilibrium quench-crust thickness.
//!
//! The magma ocean's conductive flux is scaled to a convective flux through a
//! Nusselt correlation. That flux has to cross the quench crust and then leave
//! its top by radiation, which fixes the crust's top temperature and hence its
//! thickness.

use crate::constants::{NUSSELT_COEFFICIENT, NUSSELT_EXPONENT};
use crate::material::MaterialProfile;
use crate::temp_utils::radiating_temperature_k;

/// The lid is the steady equilibrium one; how long it takes to grow is not
/// modelled, so neither the timestep nor the heat of fusion enters.
#[derive(Debug, Clone, Copy)]
pub struct QuenchInputs {
    pub cmb_temperature_k: f64,
    pub mo_depth_m: f64,
    pub mo: MaterialProfile,
    pub rayleigh_number: f64,
    pub emissivity: f64,
    pub equilibrium_temperature_k: f64,
    pub quench: MaterialProfile,
    pub melt_temperature_k: f64,
    pub max_thickness_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuenchEstimate {
    pub thickness_m: f64,
    pub conductive_flux_w_m2: f64,
    pub convective_flux_w_m2: f64,
}

impl QuenchEstimate {
    /// A negative conductive flux means the melt below is colder than the
    /// quench melting point.
    pub fn has_inverted_gradient(&self) -> bool {
        self.conductive_flux_w_m2 < 0.0
    }
}

pub fn nusselt_number(rayleigh_number: f64) -> f64 {
    NUSSELT_COEFFICIENT * rayleigh_number.powf(NUSSELT_EXPONENT)
}

pub fn quench_thickness(inputs: &QuenchInputs) -> QuenchEstimate {
    let conductive_flux = inputs.mo.conductive_flux_w_m2(
        inputs.cmb_temperature_k,
        inputs.melt_temperature_k,
        inputs.mo_depth_m,
    );
    let convective_flux = nusselt_number(inputs.rayleigh_number) * conductive_flux;

    if conductive_flux < 0.0 {
        log::warn!(
            "negative conductive flux {:.3e} W/m² (CMB {:.1} K, melt {:.1} K, depth {:.0} m)",
            conductive_flux,
            inputs.cmb_temperature_k,
            inputs.melt_temperature_k,
            inputs.mo_depth_m
        );
    }

    // no upward heat to hold the lid thin
    if convective_flux <= 0.0 {
        return QuenchEstimate {
            thickness_m: inputs.max_thickness_m,
            conductive_flux_w_m2: conductive_flux,
            convective_flux_w_m2: convective_flux,
        };
    }

    let top_temperature = radiating_temperature_k(
        inputs.emissivity,
        convective_flux,
        inputs.equilibrium_temperature_k,
    );
    let equilibrium_thickness =
        inputs.quench.conductive_flux_w_m2(inputs.melt_temperature_k, top_temperature, 1.0) / convective_flux;

    // thick quench founders, so it is capped; a radiating top above the melt point keeps none
    QuenchEstimate {
        thickness_m: equilibrium_thickness.clamp(0.0, inputs.max_thickness_m),
        conductive_flux_w_m2: conductive_flux,
        convective_flux_w_m2: convective_flux,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::rayleigh_number;
    use approx::assert_relative_eq;
    use more_asserts::{assert_gt, assert_lt};

    fn inputs() -> QuenchInputs {
        let mo = MaterialProfile::new(1e-6, 3000.0, 1256.0);
        let depth = 1.0e6;
        QuenchInputs {
            cmb_temperature_k: 1900.0,
            mo_depth_m: depth,
            mo,
            rayleigh_number: rayleigh_number(1.62, 3000.0, 3e-5, 100.0, depth, 0.1, 1e-6),
            emissivity: 0.87,
            equilibrium_temperature_k: 250.0,
            quench: MaterialProfile::new(1e-6, 2900.0, 1000.0),
            melt_temperature_k: 1200.0,
            max_thickness_m: 10.0,
        }
    }

    #[test]
    fn nusselt_correlation() {
        assert_relative_eq!(nusselt_number(1.0), 0.124);
        assert_relative_eq!(nusselt_number(1e10), 0.124 * 1e10f64.powf(0.309), max_relative = 1e-12);
    }

    #[test]
    fn thin_equilibrium_lid() {
        let estimate = quench_thickness(&inputs());
        assert_gt!(estimate.conductive_flux_w_m2, 0.0);
        assert_gt!(estimate.convective_flux_w_m2, estimate.conductive_flux_w_m2);
        assert_gt!(estimate.thickness_m, 0.0);
        assert_lt!(estimate.thickness_m, 1.0);

        // the lid transmits exactly the convective flux
        let top = radiating_temperature_k(0.87, estimate.convective_flux_w_m2, 250.0);
        let through = MaterialProfile::new(1e-6, 2900.0, 1000.0).conductive_flux_w_m2(1200.0, top, estimate.thickness_m);
        assert_relative_eq!(through, estimate.convective_flux_w_m2, max_relative = 1e-9);
    }

    #[test]
    fn capped_at_max_thickness() {
        let mut sluggish = inputs();
        sluggish.rayleigh_number = 1.0;
        sluggish.max_thickness_m = 0.001;
        let estimate = quench_thickness(&sluggish);
        assert_eq!(estimate.thickness_m, 0.001);
    }

    #[test]
    fn inverted_gradient_is_flagged_not_fatal() {
        let mut cold = inputs();
        cold.cmb_temperature_k = 1100.0;
        let estimate = quench_thickness(&cold);
        assert!(estimate.has_inverted_gradient());
        assert_eq!(estimate.thickness_m, cold.max_thickness_m);
    }

    #[test]
    fn idempotent() {
        let a = quench_thickness(&inputs());
        let b = quench_thickness(&inputs());
        assert_eq!(a.thickness_m.to_bits(), b.thickness_m.to_bits());
    }
}
