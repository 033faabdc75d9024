/// Rayleigh number of a convecting layer without internal heating:
/// `Ra = g ρ α ΔT L³ / (η κ)`.
pub fn rayleigh_number(
    gravity_m_s2: f64,
    density_kg_m3: f64,
    thermal_expansion_per_k: f64,
    temperature_diff_k: f64,
    length_scale_m: f64,
    viscosity_pa_s: f64,
    diffusivity_m2_s: f64,
) -> f64 {
    (gravity_m_s2 * density_kg_m3 * thermal_expansion_per_k * temperature_diff_k * length_scale_m.powi(3))
        / (viscosity_pa_s * diffusivity_m2_s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unit_inputs() {
        assert_relative_eq!(rayleigh_number(1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn cubic_in_length() {
        let base = rayleigh_number(1.62, 3000.0, 3e-5, 100.0, 1e5, 0.1, 1e-6);
        let doubled = rayleigh_number(1.62, 3000.0, 3e-5, 100.0, 2e5, 0.1, 1e-6);
        assert_relative_eq!(doubled / base, 8.0, max_relative = 1e-12);
    }

    #[test]
    fn magma_ocean_scale() {
        let ra = rayleigh_number(1.62, 3000.0, 3e-5, 100.0, 1e6, 0.1, 1e-6);
        assert_relative_eq!(ra, 1.458e26, max_relative = 1e-9);
    }

    #[test]
    fn idempotent() {
        let a = rayleigh_number(1.62, 3000.0, 3e-5, 42.0, 3.3e5, 0.1, 1e-6);
        let b = rayleigh_number(1.62, 3000.0, 3e-5, 42.0, 3.3e5, 0.1, 1e-6);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
