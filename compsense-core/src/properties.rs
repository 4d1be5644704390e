//! R410A thermodynamic state correlations
//!
//! Closed-form correlations mapping absolute pressure (and, where needed,
//! gas temperature) to saturation temperature, enthalpy, specific volume
//! and density. Every function here is pure and operates on absolute kPa
//! and Celsius - gauge/absolute conversion is the estimation engine's job
//! and happens exactly once at its public boundary.
//!
//! The correlation set applies to R410A only. Coefficients are reproduced
//! verbatim from the fitted source so results stay bit-compatible with the
//! data the compressor map was regressed against; do not "tidy" them.
//!
//! ## Math functions
//!
//! All transcendental math goes through `libm` so the module works without
//! `std`. The superheated-density solve uses the trigonometric form of the
//! real-root cubic solution; within the fitted envelope the cubic always
//! has three real roots and this branch of `acos`/`cos` selects the
//! physically correct one without case analysis.

use crate::{
    constants::PRESSURE_ENVELOPE_MAX_KPA,
    errors::{EstimationError, EstimationResult},
};

/// Coefficients of the implicit equation of state for superheated R410A.
///
/// Used by [`superheated_gas_density`]: indices 0..=2 build the linear
/// virial group, 3..=6 the quadratic group, 7..=10 the cubic group, each
/// evaluated at an absolute temperature.
const COE: [f64; 11] = [
    0.0169347786859482,
    -0.0000391263315032514,
    0.0000000436416993794122,
    1.75371690212062,
    -0.0204274840559141,
    0.0000393230641090647,
    -0.0000000457868739196494,
    -1.20806074268803,
    0.00655504316587795,
    -0.00000837195897399936,
    0.00000000979938358453164,
];

/// Guard an absolute pressure against the correlation envelope.
///
/// The saturation correlation takes `ln(p * 1000)`; a non-positive pressure
/// would feed the logarithm garbage, and anything above the envelope is
/// outside the fitted range. Rejecting here keeps NaN out of every
/// downstream polynomial.
fn check_pressure(p_abs_kpa: f64) -> EstimationResult<()> {
    if !(p_abs_kpa > 0.0) || p_abs_kpa > PRESSURE_ENVELOPE_MAX_KPA {
        return Err(EstimationError::NonPhysicalPressure {
            pressure: p_abs_kpa,
        });
    }
    Ok(())
}

/// Saturation temperature (°C) at an absolute pressure (kPa).
///
/// `t_sat = -2107.935 / (ln(p·1000) - 21.8205) - 256.2377`
pub fn saturation_temperature(p_abs_kpa: f64) -> EstimationResult<f64> {
    check_pressure(p_abs_kpa)?;
    Ok(-2107.935 / (libm::log(p_abs_kpa * 1000.0) - 21.8205) - 256.2377)
}

/// Enthalpy of saturated gas (J/kg) at an absolute pressure (kPa).
///
/// Cubic in saturation temperature:
/// `h = 280998.3 + 332.614·t - 4.699265·t² - 51.2569e-3·t³`
pub fn saturated_gas_enthalpy(p_abs_kpa: f64) -> EstimationResult<f64> {
    let t_sat = saturation_temperature(p_abs_kpa)?;
    Ok(280998.3 + 332.614 * t_sat - 4.699265 * t_sat * t_sat
        - 51.2569e-3 * t_sat * t_sat * t_sat)
}

/// Enthalpy of superheated gas (J/kg) at an absolute pressure (kPa) and gas
/// temperature (°C).
///
/// Multiplies the saturated enthalpy by a six-term correction polynomial in
/// the superheat `dt = t - t_sat` and the saturation temperature itself.
/// Also valid slightly below saturation (the correction is continuous
/// through `dt = 0`), which the pressure search relies on.
pub fn superheated_gas_enthalpy(p_abs_kpa: f64, t_c: f64) -> EstimationResult<f64> {
    let t_sat = saturation_temperature(p_abs_kpa)?;
    let h_sat = saturated_gas_enthalpy(p_abs_kpa)?;
    let dt = t_c - t_sat;

    let correction = 1.0
        + 3.3247e-3 * dt
        + 3.62592e-7 * dt * dt
        + 30.40633e-6 * dt * t_sat
        - 18.47693e-8 * dt * dt * t_sat
        + 76.64206e-8 * dt * t_sat * t_sat
        - 60.2765e-10 * dt * dt * t_sat * t_sat;

    Ok(correction * h_sat)
}

/// Specific volume of saturated gas (m³/kg) at an absolute pressure (kPa).
///
/// `v = exp(-11.93809 + 1873.567/(t_sat + 273.15)) · poly(t_sat)`
///
/// Callers inverting this into a density must treat a non-positive result
/// as a domain failure; the estimation engine maps that onto
/// [`EstimationError::SpecificVolumeDomain`].
pub fn saturated_gas_specific_volume(p_abs_kpa: f64) -> EstimationResult<f64> {
    let t_sat = saturation_temperature(p_abs_kpa)?;
    let t_sat_k = t_sat + 273.15;

    let poly = 5.24253 - 369.32461e-4 * t_sat + 111.95294e-6 * t_sat * t_sat
        - 31.84587e-7 * t_sat * t_sat * t_sat;

    Ok(libm::exp(-11.93809 + 1873.567 / t_sat_k) * poly)
}

/// Virial groups of the superheated equation of state at an absolute
/// temperature (K): the linear, quadratic and cubic density coefficients.
fn virial_groups(t_k: f64) -> (f64, f64, f64) {
    let t2 = t_k * t_k;
    let t3 = t2 * t_k;
    (
        1.0 + COE[0] * t_k + COE[1] * t2 + COE[2] * t3,
        COE[3] + COE[4] * t_k + COE[5] * t2 + COE[6] * t3,
        COE[7] + COE[8] * t_k + COE[9] * t2 + COE[10] * t3,
    )
}

/// Density of superheated gas (kg/m³) at an absolute pressure (kPa) and gas
/// temperature (°C).
///
/// Solves the implicit equation of state for the transformed density
/// variable `y` and maps back through `rho = (y - 0.75)^(-2.5)`. The cubic
/// `a·y³ + b·y² + c·y + d = 0` is anchored so that `y` at the saturated
/// state is an exact root: `a` is built from the virial groups at the
/// saturation temperature divided by the transformed saturated density, so
/// `superheated_gas_density(p, t_sat(p))` reproduces the saturated density.
pub fn superheated_gas_density(p_abs_kpa: f64, t_c: f64) -> EstimationResult<f64> {
    let t_sat = saturation_temperature(p_abs_kpa)?;
    let v_sat = saturated_gas_specific_volume(p_abs_kpa)?;
    if v_sat <= 0.0 {
        return Err(EstimationError::SpecificVolumeDomain);
    }

    // Transformed saturated density: (1/v)^(-0.4) + 0.75 = v^0.4 + 0.75
    let y_sat = libm::pow(1.0 / v_sat, -0.4) + 0.75;

    let (sb, sc, sd) = virial_groups(t_sat + 273.15);
    let a = -(sb / y_sat + sc / (y_sat * y_sat) + sd / (y_sat * y_sat * y_sat));

    let (b, c, d) = virial_groups(t_c + 273.15);

    // Trigonometric solution of the real-root cubic. The discriminant term
    // under the square root is positive throughout the fitted envelope.
    let p_term = (b * b / (3.0 * a * a) - c / a) / 3.0;
    let q_term = d / a + 2.0 * b * b * b / (27.0 * a * a * a) - b * c / (3.0 * a * a);
    let y = 2.0 * libm::sqrt(p_term)
        * libm::cos(libm::acos(-q_term / (2.0 * libm::pow(p_term, 1.5))) / 3.0)
        - b / (3.0 * a);

    Ok(libm::pow(y - 0.75, -2.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn saturation_temperature_anchors() {
        // Hand-checked against the correlation at three pressures spanning
        // the operating range.
        assert!((saturation_temperature(200.0).unwrap() - (-36.99)).abs() < 0.05);
        assert!((saturation_temperature(1000.0).unwrap() - 7.09).abs() < 0.05);
        assert!((saturation_temperature(4300.0).unwrap() - 65.76).abs() < 0.05);
    }

    #[test]
    fn saturation_temperature_rejects_non_physical_pressure() {
        assert!(matches!(
            saturation_temperature(0.0),
            Err(EstimationError::NonPhysicalPressure { .. })
        ));
        assert!(matches!(
            saturation_temperature(-50.0),
            Err(EstimationError::NonPhysicalPressure { .. })
        ));
        assert!(matches!(
            saturation_temperature(5000.0),
            Err(EstimationError::NonPhysicalPressure { .. })
        ));
        assert!(saturation_temperature(f64::NAN).is_err());
    }

    #[test]
    fn saturated_enthalpy_anchor() {
        let h = saturated_gas_enthalpy(1000.0).unwrap();
        assert!((h - 283102.0).abs() < 10.0);
    }

    #[test]
    fn saturated_specific_volume_anchor() {
        let v = saturated_gas_specific_volume(1000.0).unwrap();
        assert!((v - 0.026094).abs() < 1e-4);
        // Specific volume shrinks as pressure rises
        assert!(saturated_gas_specific_volume(2000.0).unwrap() < v);
    }

    #[test]
    fn superheated_enthalpy_dominates_saturated() {
        for &p in &[200.0, 1000.0, 2500.0, 4000.0] {
            let t_sat = saturation_temperature(p).unwrap();
            let h_sat = saturated_gas_enthalpy(p).unwrap();
            let h_sh = superheated_gas_enthalpy(p, t_sat + 20.0).unwrap();
            assert!(h_sh > h_sat, "p = {p}");
        }
    }

    #[test]
    fn superheated_enthalpy_matches_saturated_at_zero_superheat() {
        let h_sat = saturated_gas_enthalpy(1500.0).unwrap();
        let t_sat = saturation_temperature(1500.0).unwrap();
        let h_sh = superheated_gas_enthalpy(1500.0, t_sat).unwrap();
        assert!((h_sh - h_sat).abs() < 1e-6);
    }

    #[test]
    fn density_reduces_to_saturated_at_saturation() {
        // The cubic is anchored so the saturated state is an exact root.
        for &p in &[500.0, 1000.0, 2500.0] {
            let t_sat = saturation_temperature(p).unwrap();
            let rho_sat = 1.0 / saturated_gas_specific_volume(p).unwrap();
            let rho = superheated_gas_density(p, t_sat).unwrap();
            assert!(
                (rho - rho_sat).abs() / rho_sat < 0.1,
                "p = {p}: {rho} vs {rho_sat}"
            );
        }
    }

    #[test]
    fn density_falls_with_superheat() {
        let t_sat = saturation_temperature(1000.0).unwrap();
        let near_sat = superheated_gas_density(1000.0, t_sat + 2.0).unwrap();
        let hot = superheated_gas_density(1000.0, t_sat + 40.0).unwrap();
        assert!(hot < near_sat);
        assert!(hot > 0.0);
    }

    proptest! {
        #[test]
        fn saturation_temperature_strictly_increasing(p in 10.0f64..4500.0) {
            let lower = saturation_temperature(p).unwrap();
            let upper = saturation_temperature(p * 1.02).unwrap();
            prop_assert!(upper > lower);
        }

        #[test]
        fn superheat_correction_exceeds_unity(
            p in 200.0f64..4000.0,
            dt in 2.0f64..60.0,
        ) {
            let t_sat = saturation_temperature(p).unwrap();
            let h_sat = saturated_gas_enthalpy(p).unwrap();
            let h_sh = superheated_gas_enthalpy(p, t_sat + dt).unwrap();
            prop_assert!(h_sh > h_sat);
        }
    }
}
