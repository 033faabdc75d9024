use crate::error::{SimError, SimResult};

/// Energy (J) added to the magma ocean over `timestep_s` by a constant extra
/// heat source (tidal, radiogenic, ...) of `heating_rate_w`.
pub fn general_heating_j(enabled: bool, heating_rate_w: f64, timestep_s: f64) -> SimResult<f64> {
    if !timestep_s.is_finite() {
        return Err(SimError::NonFiniteTimestep(timestep_s));
    }
    if !enabled {
        return Ok(0.0);
    }
    Ok(heating_rate_w * timestep_s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_adds_nothing() {
        assert_eq!(general_heating_j(false, 1e12, 3.154e7).unwrap(), 0.0);
    }

    #[test]
    fn constant_rate() {
        assert_eq!(general_heating_j(true, 2.0e12, 10.0).unwrap(), 2.0e13);
    }

    #[test]
    fn infinite_timestep_fails_fast() {
        assert!(matches!(
            general_heating_j(true, 1.0, f64::INFINITY),
            Err(SimError::NonFiniteTimestep(_))
        ));
        assert!(general_heating_j(false, 1.0, f64::NAN).is_err());
    }
}
