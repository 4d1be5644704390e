//! Error Types for Estimation Failures
//!
//! ## Design Philosophy
//!
//! The engine runs once per control-loop tick on small targets, so errors
//! follow the same rules as the rest of the crate:
//!
//! 1. **Small Size**: every variant carries at most one scalar; the enum
//!    stays register-friendly and cheap to return from hot paths.
//!
//! 2. **No Heap Allocation**: no `String`, no boxed sources - all data is
//!    inline and `Copy`.
//!
//! 3. **Legacy Sentinels Preserved**: the C-era interface signaled failure
//!    through overloaded return values (`0` for a rejected time constant or
//!    a specific-volume domain fault, `150` °C for a quadratic inversion
//!    with no real root). Those numbers are ambiguous - `0` is also a valid
//!    near-atmospheric gauge pressure - so this crate reports a typed error
//!    instead, and [`EstimationError::legacy_value`] exposes the old number
//!    for consumers that still persist or transmit it.
//!
//! ## Failure Categories
//!
//! - `NonPhysicalPressure`: an absolute pressure outside the correlation
//!   envelope reached a property function (upstream sensor fault).
//! - `SpecificVolumeDomain`: the saturated specific-volume correlation
//!   returned a non-positive value, so suction density is undefined.
//! - `CorrelationOutOfRange`: the discharge-temperature quadratic has a
//!   negative discriminant; the operating point is outside the fitted
//!   envelope of the superheated-enthalpy correlation.
//! - `InvalidTimeConstant`: the lag filter was asked for a time constant
//!   outside the three admissible regimes.
//!
//! Bisection searches that exhaust their iteration budget are deliberately
//! NOT errors: they return the best midpoint with a `converged: false` flag
//! (see [`crate::estimator::PressureEstimate`]) because the budget is a
//! latency bound, not a correctness bound.

use thiserror_no_std::Error;

use crate::constants::QUADRATIC_FALLBACK_TEMP_C;

/// Result type for estimation operations
pub type EstimationResult<T> = Result<T, EstimationError>;

/// Estimation errors - kept small and `Copy` for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum EstimationError {
    /// Absolute pressure outside the correlation envelope (0, 4600] kPa
    #[error("Pressure {pressure} kPa outside correlation envelope")]
    NonPhysicalPressure {
        /// The offending absolute pressure in kPa
        pressure: f64,
    },

    /// Saturated specific volume came out non-positive, density undefined
    #[error("Saturated specific volume non-positive at suction pressure")]
    SpecificVolumeDomain,

    /// Discharge-temperature quadratic has no real root
    #[error("Discharge state outside correlation envelope (negative discriminant)")]
    CorrelationOutOfRange,

    /// Lag time constant is not one of the admissible regimes
    #[error("Time constant {tau}s not in {{100, 200, 300}}")]
    InvalidTimeConstant {
        /// The rejected time constant in seconds
        tau: u32,
    },
}

impl EstimationError {
    /// The sentinel the legacy C interface returned for this failure.
    ///
    /// `CorrelationOutOfRange` maps to the 150 °C ceiling; everything else
    /// maps to `0`. Only useful for consumers that still speak the old
    /// wire format - new code should match on the variant.
    pub fn legacy_value(&self) -> f64 {
        match self {
            Self::CorrelationOutOfRange => QUADRATIC_FALLBACK_TEMP_C,
            _ => 0.0,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EstimationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NonPhysicalPressure { pressure } => {
                defmt::write!(fmt, "Pressure {} kPa outside envelope", pressure)
            }
            Self::SpecificVolumeDomain => {
                defmt::write!(fmt, "Specific volume non-positive")
            }
            Self::CorrelationOutOfRange => {
                defmt::write!(fmt, "Negative discriminant in discharge quadratic")
            }
            Self::InvalidTimeConstant { tau } => {
                defmt::write!(fmt, "Time constant {}s invalid", tau)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_sentinels() {
        assert_eq!(EstimationError::CorrelationOutOfRange.legacy_value(), 150.0);
        assert_eq!(
            EstimationError::InvalidTimeConstant { tau: 150 }.legacy_value(),
            0.0
        );
        assert_eq!(EstimationError::SpecificVolumeDomain.legacy_value(), 0.0);
    }

    #[test]
    fn errors_are_copy_and_small() {
        let e = EstimationError::NonPhysicalPressure { pressure: -1.0 };
        let copy = e;
        assert_eq!(e, copy);
        assert!(core::mem::size_of::<EstimationError>() <= 16);
    }
}
