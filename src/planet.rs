use crate::constants::MOON_RADIUS_M;
use std::f64::consts::PI;

/// Spherical body hosting the magma ocean. All geometry the engine needs
/// (surface area, shell volumes, boundary radius from interior volume) comes
/// from here so it is computed in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Planet {
    pub radius_m: f64,
}

impl Planet {
    pub fn new(radius_m: f64) -> Planet {
        Planet { radius_m }
    }

    pub fn moon() -> Planet {
        Planet::new(MOON_RADIUS_M)
    }

    pub fn surface_area_m2(&self) -> f64 {
        4.0 * PI * self.radius_m.powi(2)
    }

    /// Volume of the shell between the surface and `depth_m` below it.
    pub fn shell_volume_m3(&self, depth_m: f64) -> f64 {
        sphere_volume_m3(self.radius_m) - sphere_volume_m3(self.radius_m - depth_m)
    }
}

pub fn sphere_volume_m3(radius_m: f64) -> f64 {
    (4.0 / 3.0) * PI * radius_m.powi(3)
}

/// Inverse of `sphere_volume_m3`.
pub fn radius_for_volume_m(volume_m3: f64) -> f64 {
    (3.0 * volume_m3 / (4.0 * PI)).cbrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn moon_surface_area() {
        let moon = Planet::moon();
        assert_relative_eq!(moon.surface_area_m2(), 3.7932e13, max_relative = 1e-4);
    }

    #[test]
    fn shell_volume_of_whole_body_is_sphere() {
        let moon = Planet::moon();
        assert_relative_eq!(
            moon.shell_volume_m3(moon.radius_m),
            sphere_volume_m3(moon.radius_m),
            max_relative = 1e-12
        );
    }

    #[test]
    fn radius_volume_inverse() {
        for r in [1.0, 737.4e3, 1737.4e3] {
            assert_relative_eq!(radius_for_volume_m(sphere_volume_m3(r)), r, max_relative = 1e-12);
        }
    }
}
