//! Surface temperature of a conducting lid (quench crust or plagioclase crust)
//! whose conductive flux matches what its top radiates away.

use crate::constants::SURFACE_TEMP_TOLERANCE;
use crate::error::{SimError, SimResult};
use crate::material::MaterialProfile;
use crate::temp_utils::{radiating_temperature_k, radiative_flux_w_m2};

#[derive(Debug, Clone, Copy)]
pub struct LidSurface {
    pub thickness_m: f64,
    pub material: MaterialProfile,
    pub emissivity: f64,
    pub equilibrium_temperature_k: f64,
}

impl LidSurface {
    /// Conductive minus radiative flux; positive when `surface_k` is too cold.
    fn imbalance(&self, base_k: f64, surface_k: f64) -> f64 {
        self.material.conductive_flux_w_m2(base_k, surface_k, self.thickness_m)
            - radiative_flux_w_m2(self.emissivity, surface_k, self.equilibrium_temperature_k)
    }

    fn radiate_conducted(&self, base_k: f64, surface_k: f64) -> f64 {
        let flux = self.material.conductive_flux_w_m2(base_k, surface_k, self.thickness_m);
        radiating_temperature_k(self.emissivity, flux, self.equilibrium_temperature_k)
    }
}

/// Fixed-point iteration on `T = radiating(k (T_base − T) / L)` starting from
/// `guess_k`, kept inside a shrinking bracket `[T_eq, T_base]`. A step that
/// leaves the bracket is replaced by bisection, which keeps thin, highly
/// conductive lids from oscillating. Stops at a 1% relative change.
pub fn surface_temperature_k(
    base_k: f64,
    guess_k: f64,
    lid: &LidSurface,
    max_iterations: usize,
) -> SimResult<f64> {
    if lid.thickness_m == 0.0 || base_k <= lid.equilibrium_temperature_k {
        return Ok(base_k);
    }

    let mut lo = lid.equilibrium_temperature_k;
    let mut hi = base_k;
    let mut surface = if guess_k.is_finite() { guess_k.clamp(lo, hi) } else { hi };

    for _ in 0..max_iterations {
        if lid.imbalance(base_k, surface) > 0.0 {
            lo = surface;
        } else {
            hi = surface;
        }

        let mut next = lid.radiate_conducted(base_k, surface);
        if !(next > lo && next < hi) {
            next = 0.5 * (lo + hi);
        }

        if ((next - surface) / surface).abs() <= SURFACE_TEMP_TOLERANCE {
            return Ok(next);
        }
        surface = next;
    }

    Err(SimError::SurfaceTemperatureNonConvergence {
        iterations: max_iterations,
        lid_thickness_m: lid.thickness_m,
        last_k: surface,
    })
}
