//! Discharge-side estimation engine
//!
//! ## Overview
//!
//! Four operations over one compressor:
//!
//! 1. **Discharge temperature** - closed form. A heat balance across the
//!    compressor gives the discharge enthalpy; inverting the superheated
//!    enthalpy correlation for temperature at the known discharge pressure
//!    reduces to a quadratic.
//! 2. **Discharge temperature, lag-filtered** - the same estimate smoothed
//!    by a first-order exponential lag that models the thermal inertia of
//!    the sensor mount. The filter state is an explicit [`LagFilter`] value
//!    owned by the caller, one per physical compressor.
//! 3. **Discharge pressure from a measured discharge temperature** -
//!    bisection over the pressure bracket until the enthalpy implied by the
//!    candidate pressure matches the heat-balance enthalpy.
//! 4. **Discharge pressure from a measured drive current** - bisection over
//!    the same bracket against the compressor map's current model.
//!
//! ## Units at the boundary
//!
//! Public operations take gauge pressure in kPa, Celsius, rpm, seconds and
//! amperes. The engine converts gauge to absolute exactly once, here;
//! the property and compressor modules only ever see absolute pressure.
//!
//! ## Latency
//!
//! Everything is synchronous and allocation-free. The bisection budgets in
//! [`SearchConfig`] are the worst-case latency bound of a call; a search
//! that runs out of budget returns its best midpoint flagged
//! `converged: false` rather than failing.

use crate::{
    compressor::CompressorModel,
    constants::{
        ATMOSPHERE_KPA, CURRENT_SEARCH_MAX_ITERATIONS, CURRENT_TOLERANCE_A,
        ENTHALPY_TOLERANCE_J_PER_KG, HEAT_LOSS_FRACTION, HEAT_LOSS_RAMP_OFFSET,
        HEAT_LOSS_RAMP_SLOPE, SEARCH_BRACKET_MAX_KPA, SEARCH_BRACKET_MIN_KPA,
        SUPERHEAT_DRY_THRESHOLD_C, SUPERHEAT_INSULATED_THRESHOLD_C, TAU_PRE_START_S,
        TAU_RUNNING_S, TAU_SHUTDOWN_S, TEMPERATURE_SEARCH_MAX_ITERATIONS,
    },
    errors::{EstimationError, EstimationResult},
    properties,
};

/// Bracket, budget and tolerance of one bisection search.
///
/// Kept as explicit data rather than hard-coded literals so the worst-case
/// latency of an estimation call stays auditable and tunable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Lower bracket end, kPa absolute
    pub bracket_min_kpa: f64,
    /// Upper bracket end, kPa absolute
    pub bracket_max_kpa: f64,
    /// Hard iteration cap
    pub max_iterations: u32,
    /// Convergence tolerance, in the residual's own unit (J/kg enthalpy
    /// for the temperature search, A for the current search)
    pub tolerance: f64,
}

impl SearchConfig {
    /// Default configuration of the temperature-driven pressure search.
    pub const fn temperature_search() -> Self {
        Self {
            bracket_min_kpa: SEARCH_BRACKET_MIN_KPA,
            bracket_max_kpa: SEARCH_BRACKET_MAX_KPA,
            max_iterations: TEMPERATURE_SEARCH_MAX_ITERATIONS,
            tolerance: ENTHALPY_TOLERANCE_J_PER_KG,
        }
    }

    /// Default configuration of the current-driven pressure search.
    pub const fn current_search() -> Self {
        Self {
            bracket_min_kpa: SEARCH_BRACKET_MIN_KPA,
            bracket_max_kpa: SEARCH_BRACKET_MAX_KPA,
            max_iterations: CURRENT_SEARCH_MAX_ITERATIONS,
            tolerance: CURRENT_TOLERANCE_A,
        }
    }
}

/// Result of a discharge-pressure search.
///
/// The legacy interface returned the bare midpoint whether or not the
/// search had converged; here exhaustion of the iteration budget is
/// visible, and the value is still the best available estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PressureEstimate {
    /// Estimated discharge pressure, kPa gauge
    pub gauge_kpa: f64,
    /// Whether the residual fell inside the tolerance before the budget
    /// ran out
    pub converged: bool,
    /// Iterations actually spent
    pub iterations: u32,
}

/// Operating regime of the discharge-temperature lag filter.
///
/// Each regime carries the thermal time constant of the sensor mount in
/// that phase of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeConstant {
    /// First minutes after power-on, before the compressor starts (300 s)
    PreStart,
    /// Steady running (100 s)
    Running,
    /// Shutdown, compressor speed zero (200 s)
    Shutdown,
}

impl TimeConstant {
    /// Validate a raw time constant in seconds against the three
    /// admissible regimes.
    pub fn from_seconds(tau_s: u32) -> EstimationResult<Self> {
        match tau_s {
            TAU_PRE_START_S => Ok(Self::PreStart),
            TAU_RUNNING_S => Ok(Self::Running),
            TAU_SHUTDOWN_S => Ok(Self::Shutdown),
            tau => Err(EstimationError::InvalidTimeConstant { tau }),
        }
    }

    /// The regime's time constant in seconds.
    pub fn seconds(self) -> u32 {
        match self {
            Self::PreStart => TAU_PRE_START_S,
            Self::Running => TAU_RUNNING_S,
            Self::Shutdown => TAU_SHUTDOWN_S,
        }
    }

    /// Select the regime from elapsed compressor runtime in minutes, the
    /// policy the offline validation harness uses: no recorded runtime
    /// means the unit is off, under five minutes is warm-up, anything
    /// longer is steady running.
    pub fn for_runtime_minutes(minutes: f64) -> Self {
        if minutes < 0.001 {
            Self::Shutdown
        } else if minutes < 5.0 {
            Self::PreStart
        } else {
            Self::Running
        }
    }
}

/// First-order lag filter state for the discharge-temperature estimate.
///
/// This is the only persistent state in the engine. It is a plain value
/// owned by the caller - allocate one per physical compressor and pass it
/// to every lagged estimate for that unit. A fresh filter seeds itself
/// from the first instantaneous estimate it sees, so the first lagged
/// output equals the unfiltered one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LagFilter {
    previous: Option<f64>,
}

impl LagFilter {
    /// Fresh, unseeded filter.
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Filter pre-seeded with a known discharge temperature, e.g. a real
    /// sensor reading taken before the sensor went offline.
    pub const fn seeded(t_dis_c: f64) -> Self {
        Self {
            previous: Some(t_dis_c),
        }
    }

    /// Last filtered output, if any estimate has been made.
    pub fn value(&self) -> Option<f64> {
        self.previous
    }

    /// Forget the filter history.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Advance the filter by `dt_s` seconds toward `instant`:
    /// `out = prev + (instant - prev)·(1 - e^(-dt/tau))`.
    pub fn advance(&mut self, instant: f64, tau: TimeConstant, dt_s: f64) -> f64 {
        let output = match self.previous {
            None => instant,
            Some(prev) => {
                prev + (instant - prev) * (1.0 - libm::exp(-dt_s / tau.seconds() as f64))
            }
        };
        self.previous = Some(output);
        output
    }
}

/// Virtual-sensor estimation engine for one compressor family.
///
/// Owns the compressor performance model and the two bisection
/// configurations. Stateless apart from what the caller passes in; safe to
/// share across as many compressors as run the same model.
#[derive(Debug, Clone)]
pub struct DischargeEstimator<M: CompressorModel> {
    model: M,
    temperature_search: SearchConfig,
    current_search: SearchConfig,
}

impl<M: CompressorModel> DischargeEstimator<M> {
    /// Create an engine over a compressor model with default search
    /// configurations.
    pub fn new(model: M) -> Self {
        Self {
            model,
            temperature_search: SearchConfig::temperature_search(),
            current_search: SearchConfig::current_search(),
        }
    }

    /// Override the temperature-driven search configuration.
    pub fn with_temperature_search(mut self, config: SearchConfig) -> Self {
        self.temperature_search = config;
        self
    }

    /// Override the current-driven search configuration.
    pub fn with_current_search(mut self, config: SearchConfig) -> Self {
        self.current_search = config;
        self
    }

    /// The underlying compressor model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Suction-side gas state: mass flow rate (kg/s), suction enthalpy
    /// (J/kg) and superheat (°C), for a given volumetric flow rate.
    ///
    /// Above [`SUPERHEAT_DRY_THRESHOLD_C`] the gas is dry superheated
    /// vapor; at or below it the suction line may carry two-phase flow and
    /// the saturated-gas correlations apply, with the specific volume
    /// guarded against its domain edge before inversion.
    fn suction_state(
        &self,
        p_suc_abs: f64,
        t_suc: f64,
        volume_flow: f64,
    ) -> EstimationResult<(f64, f64, f64)> {
        let t_sat_suc = properties::saturation_temperature(p_suc_abs)?;
        let ssh = t_suc - t_sat_suc;

        let (density, h_suc) = if ssh > SUPERHEAT_DRY_THRESHOLD_C {
            (
                properties::superheated_gas_density(p_suc_abs, t_suc)?,
                properties::superheated_gas_enthalpy(p_suc_abs, t_suc)?,
            )
        } else {
            let v_sat = properties::saturated_gas_specific_volume(p_suc_abs)?;
            if v_sat <= 0.0 {
                return Err(EstimationError::SpecificVolumeDomain);
            }
            (1.0 / v_sat, properties::saturated_gas_enthalpy(p_suc_abs)?)
        };

        Ok((volume_flow * density, h_suc, ssh))
    }

    /// Estimate discharge gas temperature (°C) from suction state,
    /// discharge pressure and speed.
    ///
    /// Inputs are gauge kPa, Celsius and rpm. Fails with
    /// [`EstimationError::CorrelationOutOfRange`] when the heat balance
    /// lands outside the fitted envelope of the enthalpy correlation
    /// (negative discriminant); the legacy 150 °C ceiling is available via
    /// [`EstimationError::legacy_value`].
    pub fn discharge_temperature(
        &self,
        p_suc_gauge: f64,
        t_suc: f64,
        p_dis_gauge: f64,
        speed_rpm: f64,
    ) -> EstimationResult<f64> {
        let p_dis = p_dis_gauge + ATMOSPHERE_KPA;
        let p_suc = p_suc_gauge + ATMOSPHERE_KPA;

        let flow = self.model.volume_flow_rate(p_dis, p_suc, speed_rpm);
        let power = self.model.power(p_dis, p_suc, speed_rpm);
        let (mass_flow, h_suc, ssh) = self.suction_state(p_suc, t_suc, flow)?;

        // Low superheat means liquid carry-over absorbs part of the
        // compression heat; the ramp fades that correction in.
        let z_fw = if ssh < SUPERHEAT_INSULATED_THRESHOLD_C {
            HEAT_LOSS_RAMP_SLOPE * ssh + HEAT_LOSS_RAMP_OFFSET
        } else {
            1.0
        };

        let h_dis = power * HEAT_LOSS_FRACTION * z_fw / mass_flow + h_suc;

        // Invert the superheated-enthalpy correlation for temperature at
        // the known discharge pressure: quadratic in t_dis with
        // coefficients polynomial in the discharge saturation temperature.
        let ts = properties::saturation_temperature(p_dis)?;
        let hs_dis = properties::saturated_gas_enthalpy(p_dis)?;
        let ts2 = ts * ts;
        let ts3 = ts2 * ts;
        let ts4 = ts2 * ts2;

        let a = 3.62592e-7 - 18.47693e-8 * ts - 60.2765e-10 * ts2;
        let b = 3.3247e-3 - 2.0 * 3.62592e-7 * ts
            + 30.40633e-6 * ts
            + 2.0 * 18.47693e-8 * ts2
            + 76.64206e-8 * ts2
            + 2.0 * 60.2765e-10 * ts3;
        let c = 1.0 - 3.3247e-3 * ts + 3.62592e-7 * ts2
            - 30.40633e-6 * ts2
            - 18.47693e-8 * ts3
            - 76.64206e-8 * ts3
            - 60.2765e-10 * ts4
            - h_dis / hs_dis;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            #[cfg(feature = "log")]
            log::debug!(
                "discharge quadratic has no real root (disc {discriminant:.3e}), \
                 operating point outside correlation envelope"
            );
            return Err(EstimationError::CorrelationOutOfRange);
        }

        // The + root is the physical branch across the validated envelope;
        // kept as fitted, not derived from first principles.
        Ok((-b + libm::sqrt(discriminant)) / (2.0 * a))
    }

    /// Estimate discharge gas temperature (°C) smoothed by the sensor-mount
    /// lag filter, selecting the regime by a raw time constant in seconds.
    ///
    /// `tau_s` must be one of 100, 200 or 300 (see [`TimeConstant`]); an
    /// invalid value is rejected before the filter state is touched.
    #[allow(clippy::too_many_arguments)]
    pub fn discharge_temperature_lagged(
        &self,
        p_suc_gauge: f64,
        t_suc: f64,
        p_dis_gauge: f64,
        speed_rpm: f64,
        tau_s: u32,
        dt_s: f64,
        filter: &mut LagFilter,
    ) -> EstimationResult<f64> {
        let tau = TimeConstant::from_seconds(tau_s)?;
        self.discharge_temperature_filtered(
            p_suc_gauge,
            t_suc,
            p_dis_gauge,
            speed_rpm,
            tau,
            dt_s,
            filter,
        )
    }

    /// Estimate discharge gas temperature (°C) smoothed by the sensor-mount
    /// lag filter.
    ///
    /// The filter is caller-owned state, one per physical compressor. Any
    /// estimation failure leaves it untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn discharge_temperature_filtered(
        &self,
        p_suc_gauge: f64,
        t_suc: f64,
        p_dis_gauge: f64,
        speed_rpm: f64,
        tau: TimeConstant,
        dt_s: f64,
        filter: &mut LagFilter,
    ) -> EstimationResult<f64> {
        let instant = self.discharge_temperature(p_suc_gauge, t_suc, p_dis_gauge, speed_rpm)?;
        Ok(filter.advance(instant, tau, dt_s))
    }

    /// Estimate discharge pressure (kPa gauge) from a measured discharge
    /// temperature, by bisection on the enthalpy balance.
    ///
    /// No heat-loss ramp is applied here: the caller supplies a concrete
    /// discharge temperature, so the saturated/superheated ambiguity the
    /// ramp corrects for in the forward direction does not arise.
    pub fn discharge_pressure_from_temperature(
        &self,
        p_suc_gauge: f64,
        t_suc: f64,
        t_dis: f64,
        speed_rpm: f64,
    ) -> EstimationResult<PressureEstimate> {
        let p_suc = p_suc_gauge + ATMOSPHERE_KPA;
        let cfg = self.temperature_search;

        let mut lo = cfg.bracket_min_kpa;
        let mut hi = cfg.bracket_max_kpa;
        let mut mid = 0.5 * (lo + hi);
        let mut converged = false;
        let mut iterations = 0;

        for i in 0..cfg.max_iterations {
            iterations = i + 1;
            mid = 0.5 * (lo + hi);

            let flow = self.model.volume_flow_rate(mid, p_suc, speed_rpm);
            let power = self.model.power(mid, p_suc, speed_rpm);
            let (mass_flow, h_suc, _ssh) = self.suction_state(p_suc, t_suc, flow)?;

            let h_balance = power * HEAT_LOSS_FRACTION / mass_flow + h_suc;
            let h_candidate = properties::superheated_gas_enthalpy(mid, t_dis)?;
            let residual = h_candidate - h_balance;

            #[cfg(feature = "log")]
            log::trace!("pressure search iter {iterations}: mid {mid:.2} kPa, residual {residual:.3} J/kg");

            if libm::fabs(residual) < cfg.tolerance {
                converged = true;
                break;
            }
            // The implied enthalpy rises as candidate pressure falls, so a
            // low implied enthalpy means the candidate is too high.
            if residual < 0.0 {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        #[cfg(feature = "log")]
        if !converged {
            log::debug!("pressure search budget exhausted after {iterations} iterations");
        }

        Ok(PressureEstimate {
            gauge_kpa: mid - ATMOSPHERE_KPA,
            converged,
            iterations,
        })
    }

    /// Estimate discharge pressure (kPa gauge) from a measured drive
    /// current, by bisection on the compressor map's current model.
    ///
    /// Always returns an estimate: current is steeply sensitive to
    /// pressure, so even on budget exhaustion the midpoint brackets the
    /// crossing tightly. `converged` reports whether the residual actually
    /// fell inside the tolerance.
    pub fn discharge_pressure_from_current(
        &self,
        p_suc_gauge: f64,
        current_a: f64,
        speed_rpm: f64,
        voltage: f64,
    ) -> PressureEstimate {
        let p_suc = p_suc_gauge + ATMOSPHERE_KPA;
        let cfg = self.current_search;

        let mut lo = cfg.bracket_min_kpa;
        let mut hi = cfg.bracket_max_kpa;
        let mut mid = 0.5 * (lo + hi);
        let mut converged = false;
        let mut iterations = 0;

        for i in 0..cfg.max_iterations {
            iterations = i + 1;
            mid = 0.5 * (lo + hi);

            let modeled = self.model.current(mid, p_suc, speed_rpm, voltage);
            let residual = modeled - current_a;

            #[cfg(feature = "log")]
            log::trace!("current search iter {iterations}: mid {mid:.2} kPa, residual {residual:.5} A");

            if libm::fabs(residual) < cfg.tolerance {
                converged = true;
                break;
            }
            // Model current rises with discharge pressure.
            if residual < 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        PressureEstimate {
            gauge_kpa: mid - ATMOSPHERE_KPA,
            converged,
            iterations,
        }
    }
}
