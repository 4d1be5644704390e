//! Constants for the Compsense Estimation Engine
//!
//! This module centralizes every tuning value of the engine. The bisection
//! budgets and tolerances are deliberately constants rather than buried
//! literals: they bound the worst-case latency of an estimation call inside
//! an embedded control loop, and a reviewer must be able to audit them in
//! one place.
//!
//! Correlation coefficients (the R410A polynomials and the compressor map)
//! live next to the code that evaluates them, in [`crate::properties`] and
//! [`crate::compressor`].

// ===== PRESSURE CONVENTIONS =====

/// Standard atmospheric pressure (kPa).
///
/// Field sensors report gauge pressure; every correlation in this crate is
/// defined over absolute pressure. The estimation engine adds this offset
/// exactly once at its public boundary - property and compressor functions
/// never convert.
pub const ATMOSPHERE_KPA: f64 = 101.35;

/// Upper bound of the valid absolute-pressure envelope (kPa).
///
/// The R410A correlations were fitted up to this pressure, just below the
/// critical point. Inputs above it are a sensor or caller fault.
pub const PRESSURE_ENVELOPE_MAX_KPA: f64 = 4600.0;

// ===== SUCTION GAS STATE =====

/// Superheat above which suction gas is treated as dry superheated vapor (°C).
///
/// At or below this the suction line may carry two-phase flow and the
/// saturated-gas correlations are used instead of the superheated ones.
pub const SUPERHEAT_DRY_THRESHOLD_C: f64 = 1.0;

/// Superheat above which the compression heat-loss factor saturates (°C).
///
/// Below this the heat-loss correction ramps linearly; see
/// [`HEAT_LOSS_RAMP_SLOPE`] and [`HEAT_LOSS_RAMP_OFFSET`].
pub const SUPERHEAT_INSULATED_THRESHOLD_C: f64 = 2.0;

// ===== COMPRESSION HEAT BALANCE =====

/// Fraction of shaft power that ends up in the discharge gas.
///
/// The remainder is lost through the shell to ambient. Fitted against the
/// same data set as the compressor map.
pub const HEAT_LOSS_FRACTION: f64 = 0.8;

/// Slope of the low-superheat heat-loss ramp (per °C).
///
/// `z_fw = SLOPE * ssh + OFFSET` for superheat below
/// [`SUPERHEAT_INSULATED_THRESHOLD_C`], clamped to 1 above it. Models the
/// extra heat absorbed evaporating liquid carry-over near saturation.
pub const HEAT_LOSS_RAMP_SLOPE: f64 = 0.2;

/// Offset of the low-superheat heat-loss ramp.
pub const HEAT_LOSS_RAMP_OFFSET: f64 = 0.6;

// ===== BISECTION SEARCHES =====

/// Lower end of the discharge-pressure search bracket (kPa absolute).
pub const SEARCH_BRACKET_MIN_KPA: f64 = 100.0;

/// Upper end of the discharge-pressure search bracket (kPa absolute).
pub const SEARCH_BRACKET_MAX_KPA: f64 = 4300.0;

/// Iteration budget for the temperature-driven pressure search.
///
/// 100 halvings reduce the bracket far below the enthalpy tolerance, so in
/// practice the search converges long before the budget runs out. The cap
/// exists to bound latency, not accuracy.
pub const TEMPERATURE_SEARCH_MAX_ITERATIONS: u32 = 100;

/// Convergence tolerance of the temperature-driven search (J/kg).
///
/// The search brackets discharge pressure until the enthalpy implied by the
/// candidate pressure matches the heat-balance enthalpy this closely.
pub const ENTHALPY_TOLERANCE_J_PER_KG: f64 = 0.1;

/// Iteration budget for the current-driven pressure search.
///
/// Drive current is steeply sensitive to pressure, so a short budget is
/// enough to pin the crossing; the search reports best-effort on exhaustion.
pub const CURRENT_SEARCH_MAX_ITERATIONS: u32 = 20;

/// Convergence tolerance of the current-driven search (A).
pub const CURRENT_TOLERANCE_A: f64 = 0.001;

// ===== FALLBACKS AND LEGACY SENTINELS =====

/// Discharge temperature reported when the quadratic inversion has no real
/// root (°C).
///
/// A negative discriminant means the heat balance asks for a state outside
/// the superheated-enthalpy correlation's fitted envelope. The legacy
/// interface reported this fixed ceiling instead of failing; the value is
/// preserved on [`crate::errors::EstimationError::legacy_value`].
pub const QUADRATIC_FALLBACK_TEMP_C: f64 = 150.0;

// ===== LAG FILTER TIME CONSTANTS =====

/// Lag time constant during pre-start warm-up (s).
pub const TAU_PRE_START_S: u32 = 300;

/// Lag time constant during steady running (s).
pub const TAU_RUNNING_S: u32 = 100;

/// Lag time constant after shutdown, compressor speed zero (s).
pub const TAU_SHUTDOWN_S: u32 = 200;

// ===== COMPRESSOR =====

/// Rated speed of the mapped compressor (rpm).
///
/// The compressor map is parameterized over the ratio of actual to rated
/// speed; zero speed (compressor off) is a valid input.
pub const RATED_SPEED_RPM: f64 = 3600.0;
