// src/material.rs - thermal properties of the layers that cap the magma ocean

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LidKind {
    Quench,
    Crust,
}

impl LidKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LidKind::Quench => "quench",
            LidKind::Crust => "crust",
        }
    }
}

/// Thermal profile of a conducting lid (or of the melt itself).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialProfile {
    pub diffusivity_m2_s: f64,
    pub density_kg_m3: f64,
    pub heat_capacity_j_per_kg_k: f64,
}

impl MaterialProfile {
    pub fn new(diffusivity_m2_s: f64, density_kg_m3: f64, heat_capacity_j_per_kg_k: f64) -> Self {
        Self {
            diffusivity_m2_s,
            density_kg_m3,
            heat_capacity_j_per_kg_k,
        }
    }

    /// k = κ·ρ·c
    pub fn conductivity_w_m_k(&self) -> f64 {
        self.diffusivity_m2_s * self.density_kg_m3 * self.heat_capacity_j_per_kg_k
    }

    /// Steady conductive flux across a slab of `thickness_m`.
    pub fn conductive_flux_w_m2(&self, hot_k: f64, cold_k: f64, thickness_m: f64) -> f64 {
        self.conductivity_w_m_k() * (hot_k - cold_k) / thickness_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn conductivity_is_product() {
        let quench = MaterialProfile::new(1e-6, 2900.0, 1000.0);
        assert_abs_diff_eq!(quench.conductivity_w_m_k(), 2.9, epsilon = 1e-12);
    }

    #[test]
    fn flux_scales_inversely_with_thickness() {
        let crust = MaterialProfile::new(1e-6, 2900.0, 1000.0);
        let thin = crust.conductive_flux_w_m2(1400.0, 400.0, 10.0);
        let thick = crust.conductive_flux_w_m2(1400.0, 400.0, 20.0);
        assert_abs_diff_eq!(thin, 2.0 * thick, epsilon = 1e-9);
        assert_abs_diff_eq!(thin, 290.0, epsilon = 1e-9);
    }
}
