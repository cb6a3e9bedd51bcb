//! # Parameter System
//!
//! Named model parameters with bounds, priors, and ties.
//!
//! ## Core Components
//!
//! - [`Parameter`]: Individual parameters with values, bounds, prior, and fixed/tied state
//! - [`ParameterStore`]: The ordered parameters of one model component
//! - [`Bounds`]: Support of a parameter's prior
//! - [`Prior`]: Uniform and Gaussian priors used by Bayesian fitters
//! - [`Tie`] and [`Expression`]: Derive a parameter from other parameters
//!
//! ## Example Usage
//!
//! ```rust
//! use galkin_rs::parameters::{Parameter, ParameterStore, Prior};
//!
//! let store = ParameterStore::new()
//!     .with(Parameter::with_bounds("inc", 45.0, 0.0, 90.0).unwrap())
//!     .with(
//!         Parameter::with_bounds("pa", 0.0, -180.0, 180.0)
//!             .unwrap()
//!             .with_prior(Prior::Gaussian { center: 0.0, stddev: 10.0 }),
//!     );
//!
//! assert_eq!(store.value_of("inc").unwrap(), 45.0);
//! ```

pub mod bounds;
pub mod expression;
pub mod parameter;
pub mod prior;
pub mod store;
pub mod tie;

// Re-export key types
pub use bounds::{Bounds, BoundsError};
pub use expression::{EvaluationContext, Expression, ExpressionError, SimpleContext};
pub use parameter::{Parameter, ParameterError};
pub use prior::{Prior, PriorError};
pub use store::ParameterStore;
pub use tie::{Tie, TieFn};
