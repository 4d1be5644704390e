//! Virtual-sensor engine for vapor-compression refrigeration compressors
//!
//! Estimates discharge-side quantities that are expensive or impossible to
//! measure directly - discharge gas temperature and discharge gas pressure -
//! from the measurements a real unit already has: suction pressure, suction
//! temperature, compressor speed and optionally drive current. The engine
//! combines closed-form R410A state correlations with a polynomial compressor
//! map and bounded numerical root-finding.
//!
//! Key constraints:
//! - Runs inside a synchronous control loop tick, no heap allocation
//! - Worst-case latency bounded by fixed bisection iteration budgets
//! - One explicit piece of state (the discharge-temperature lag filter),
//!   owned by the caller so multiple compressors can run side by side
//!
//! ```
//! use compsense_core::{CoefficientMap, DischargeEstimator, LagFilter, TimeConstant};
//!
//! let estimator = DischargeEstimator::new(CoefficientMap::default());
//! let mut filter = LagFilter::new();
//!
//! // One control-loop tick: gauge kPa, Celsius, rpm, a 2 s tick in the
//! // steady-running lag regime
//! let t_dis = estimator.discharge_temperature_filtered(
//!     1390.88, 20.54, 2152.59, 1740.0,
//!     TimeConstant::Running, 2.0, &mut filter,
//! )?;
//! assert!(t_dis > 20.54);
//! # Ok::<(), compsense_core::EstimationError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod compressor;
pub mod constants;
pub mod errors;
pub mod estimator;
pub mod properties;

#[cfg(feature = "replay")]
pub mod replay;

// Public API
pub use compressor::{CoefficientMap, CompressorModel};
pub use errors::{EstimationError, EstimationResult};
pub use estimator::{
    DischargeEstimator, LagFilter, PressureEstimate, SearchConfig, TimeConstant,
};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
