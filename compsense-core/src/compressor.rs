//! Compressor performance model
//!
//! The estimation engine treats the compressor as an opaque physical model
//! behind the [`CompressorModel`] trait: volumetric flow rate, shaft power
//! and drive current as functions of the two absolute pressures, speed and
//! (for current) supply voltage. Anything that satisfies the trait can
//! drive the engine - a fitted polynomial map, a lookup table, or a mock in
//! tests.
//!
//! [`CoefficientMap`] is the production implementation: a 32-coefficient
//! regression map fitted per compressor family. All intermediate
//! coefficients are polynomials in the speed ratio (actual over rated
//! speed); flow and power then depend on the pressure ratio. Pressures are
//! absolute kPa throughout - the engine converts from gauge before calling.

use crate::constants::RATED_SPEED_RPM;

/// Performance map of a compressor, consumed by the estimation engine.
///
/// All methods are pure and deterministic, defined over the same absolute
/// pressure bracket the engine searches, [100, 4300] kPa. Zero speed is a
/// valid input (compressor off).
pub trait CompressorModel {
    /// Volumetric flow rate (m³/s) at discharge/suction pressure (kPa
    /// absolute) and speed (rpm).
    fn volume_flow_rate(&self, p_dis_abs: f64, p_suc_abs: f64, speed_rpm: f64) -> f64;

    /// Shaft power (W) at discharge/suction pressure (kPa absolute) and
    /// speed (rpm).
    fn power(&self, p_dis_abs: f64, p_suc_abs: f64, speed_rpm: f64) -> f64;

    /// Drive current (A) at discharge/suction pressure (kPa absolute),
    /// speed (rpm) and supply voltage (V).
    fn current(&self, p_dis_abs: f64, p_suc_abs: f64, speed_rpm: f64, voltage: f64) -> f64;
}

/// Conversion from the map's native CFM regression to m³/s.
const CFM_TO_M3_PER_S: f64 = 4.719476965e-4 / 60.0;

/// Floor for volumetric flow rate (m³/s).
///
/// The flow regression can dip negative outside its fitted corner; the map
/// clamps to a small positive value so downstream mass-flow divisions stay
/// finite.
const MIN_FLOW_M3_PER_S: f64 = 1e-8;

/// Fitted 32-coefficient polynomial compressor map.
///
/// The default table describes the rated 3600 rpm unit the estimation
/// engine was validated against. Custom tables can be supplied for other
/// compressor families via [`CoefficientMap::new`].
#[derive(Debug, Clone)]
pub struct CoefficientMap {
    coefficients: [f64; 32],
    rated_speed_rpm: f64,
}

impl Default for CoefficientMap {
    fn default() -> Self {
        Self {
            coefficients: [
                97.067, -177.99, 297.6, 20.081, 11.098, -1.8449, 0.44883, 0.0,
                0.0, 0.65281, 0.0, 0.0, 0.096619, -0.029134, 0.011636, -0.11126,
                0.073423, -0.024061, 2.4395, 0.029512, -119.08, -85.79, 12.689,
                -0.00026992, 0.00047164, -0.00019762, 0.3311, -0.53155, 0.18157,
                0.0000024884, 390.25, -150.24,
            ],
            rated_speed_rpm: RATED_SPEED_RPM,
        }
    }
}

impl CoefficientMap {
    /// Create a map from a custom coefficient table and rated speed.
    pub fn new(coefficients: [f64; 32], rated_speed_rpm: f64) -> Self {
        Self {
            coefficients,
            rated_speed_rpm,
        }
    }

    /// Rated speed of the mapped compressor (rpm).
    pub fn rated_speed_rpm(&self) -> f64 {
        self.rated_speed_rpm
    }

    fn speed_ratio(&self, speed_rpm: f64) -> f64 {
        speed_rpm / self.rated_speed_rpm
    }

    /// Flow-map coefficients (a, b, c): `flow_cfm = a - b·pr^c`.
    fn flow_coefficients(&self, sr: f64) -> (f64, f64, f64) {
        let k = &self.coefficients;
        let sr2 = sr * sr;
        (
            k[0] + k[1] * libm::sqrt(sr) + k[2] * sr,
            k[3] + k[4] * sr2 + k[5] * sr2 * sr2,
            k[6] + k[7] * sr + k[8] * sr2,
        )
    }

    /// Power-map coefficients (d, e, f, g):
    /// `power = (e + f·pr^d)·ps·0.145·flow_cfm + g`.
    ///
    /// `e` and `f` are pinned through two reference pressure ratios stored
    /// in the table (indices 18 and 19), matching the regression procedure
    /// the map was fitted with.
    fn power_coefficients(&self, sr: f64) -> (f64, f64, f64, f64) {
        let k = &self.coefficients;
        let sr2 = sr * sr;
        let d = k[9] + k[10] * libm::sqrt(sr) + k[11] * sr;
        let y1 = k[12] + k[13] * sr + k[14] * sr2;
        let y2 = k[15] + k[16] * sr + k[17] * sr2;
        let f = (y1 - y2) / (libm::pow(k[18], d) - libm::pow(k[19], d));
        let e = y1 - f * libm::pow(k[18], d);
        let g = k[20] + k[21] * sr2 + k[22] * sr2 * sr2;
        (d, e, f, g)
    }

    /// Current-map coefficients (q, r, s):
    /// `current = power / ((q·power + r)·power + s)`.
    fn current_coefficients(&self, sr: f64) -> (f64, f64, f64) {
        let k = &self.coefficients;
        let sr2 = sr * sr;
        (
            k[23] + k[24] * sr + k[25] * sr2,
            k[26] + k[27] * sr2 + k[28] * sr2 * sr2,
            k[29] + k[30] * sr2 + k[31] * sr2 * sr2,
        )
    }
}

impl CompressorModel for CoefficientMap {
    fn volume_flow_rate(&self, p_dis_abs: f64, p_suc_abs: f64, speed_rpm: f64) -> f64 {
        let pr = p_dis_abs / p_suc_abs;
        let (a, b, c) = self.flow_coefficients(self.speed_ratio(speed_rpm));

        let flow = (a - b * libm::pow(pr, c)) * CFM_TO_M3_PER_S;
        if flow < 0.0 {
            MIN_FLOW_M3_PER_S
        } else {
            flow
        }
    }

    fn power(&self, p_dis_abs: f64, p_suc_abs: f64, speed_rpm: f64) -> f64 {
        let pr = p_dis_abs / p_suc_abs;
        let (d, e, f, g) = self.power_coefficients(self.speed_ratio(speed_rpm));

        // The power regression is in terms of the raw CFM flow term, so the
        // unit conversion applied by volume_flow_rate is undone here.
        let flow_cfm = self.volume_flow_rate(p_dis_abs, p_suc_abs, speed_rpm) / CFM_TO_M3_PER_S;
        let power = (e + f * libm::pow(pr, d)) * p_suc_abs * 0.000145 * 1000.0 * flow_cfm + g;
        power.max(0.0)
    }

    fn current(&self, p_dis_abs: f64, p_suc_abs: f64, speed_rpm: f64, _voltage: f64) -> f64 {
        // This map family absorbs the supply voltage into the fitted q/r/s
        // coefficients; the parameter stays on the trait for maps that
        // model it explicitly.
        let (q, r, s) = self.current_coefficients(self.speed_ratio(speed_rpm));
        let power = self.power(p_dis_abs, p_suc_abs, speed_rpm);

        let current = power / ((q * power + r) * power + s);
        current.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> CoefficientMap {
        CoefficientMap::default()
    }

    #[test]
    fn flow_is_positive_at_rated_point() {
        // Reference operating point from the map's regression data set.
        let flow = map().volume_flow_rate(1883.58288520969, 480.0, 3600.0);
        assert!(flow > 0.0);
        assert!(flow < 0.01, "flow {flow} m³/s out of scale for this frame");
    }

    #[test]
    fn flow_falls_with_pressure_ratio() {
        let m = map();
        let low_pr = m.volume_flow_rate(1500.0, 1000.0, 3600.0);
        let high_pr = m.volume_flow_rate(3000.0, 1000.0, 3600.0);
        assert!(high_pr < low_pr);
    }

    #[test]
    fn flow_clamps_instead_of_going_negative() {
        // Far outside the fitted corner the regression dips negative;
        // the clamp keeps mass-flow division finite.
        let flow = map().volume_flow_rate(4300.0, 100.0, 0.0);
        assert_eq!(flow, MIN_FLOW_M3_PER_S);
    }

    #[test]
    fn power_is_positive_when_running() {
        let power = map().power(1883.58288520969, 480.0, 3600.0);
        assert!(power > 0.0);
    }

    #[test]
    fn power_clamps_to_zero() {
        // At zero speed and low pressure ratio the regression goes
        // negative; a compressor never generates power.
        let power = map().power(200.0, 1685.654, 0.0);
        assert_eq!(power, 0.0);
    }

    #[test]
    fn current_is_zero_when_power_is_zero() {
        let m = map();
        assert_eq!(m.power(200.0, 1685.654, 0.0), 0.0);
        assert_eq!(m.current(200.0, 1685.654, 0.0, 220.0), 0.0);
    }

    #[test]
    fn current_is_positive_when_running() {
        let current = map().current(2253.94, 1492.23, 1740.0, 220.0);
        assert!(current > 0.0);
    }

    #[test]
    fn custom_table_uses_given_rated_speed() {
        let m = CoefficientMap::new(map().coefficients, 7200.0);
        assert_eq!(m.rated_speed_rpm(), 7200.0);
        // Same physical speed is half the speed ratio, so the map must
        // evaluate differently from the rated-3600 table.
        let rated = map().volume_flow_rate(2000.0, 1000.0, 3600.0);
        let derated = m.volume_flow_rate(2000.0, 1000.0, 3600.0);
        assert!((rated - derated).abs() > 1e-9);
    }
}
