//! Parameter definition and implementation
//!
//! This module provides the Parameter struct, the unit of the model parameter
//! system. A parameter is free, fixed, or tied to other parameters, carries
//! bounds and a prior, and remembers its initial value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parameters::bounds::{Bounds, BoundsError};
use crate::parameters::prior::{Prior, PriorError};
use crate::parameters::tie::Tie;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Bounds error: {0}")]
    BoundsError(#[from] BoundsError),

    #[error("Prior error for parameter '{name}': {source}")]
    Prior { name: String, source: PriorError },

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },

    #[error("Parameter '{name}' already exists")]
    DuplicateParameter { name: String },

    #[error("Parameter '{name}' is tied and cannot be set free")]
    TiedNotFree { name: String },
}

/// A model parameter
///
/// The parameter is *free* when it is neither fixed nor tied; only free
/// parameters enter the flat vector exchanged with a fitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter
    pub name: String,

    /// Current value of the parameter
    value: f64,

    /// Value at construction (for reset operations)
    init_value: f64,

    /// Whether the parameter is held at its current value
    fixed: bool,

    /// Support of the prior
    bounds: Bounds,

    /// Prior distribution used by Bayesian fitters
    #[serde(default)]
    prior: Prior,

    /// Tie to other parameters, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tied: Option<Tie>,
}

impl Parameter {
    /// Create a new free, unbounded parameter with a uniform prior
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the parameter
    /// * `value` - Initial value of the parameter
    ///
    /// # Examples
    ///
    /// ```
    /// use galkin_rs::parameters::parameter::Parameter;
    ///
    /// let param = Parameter::new("sigma0", 30.0);
    /// assert_eq!(param.name(), "sigma0");
    /// assert_eq!(param.value(), 30.0);
    /// assert!(param.is_free());
    /// ```
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            init_value: value,
            fixed: false,
            bounds: Bounds::default(),
            prior: Prior::default(),
            tied: None,
        }
    }

    /// Create a new parameter with the given name, value, and bounds
    ///
    /// Unlike a clamp-on-assign optimizer parameter, the value is stored as
    /// given even if it lies outside the bounds; the prior reports it.
    ///
    /// # Examples
    ///
    /// ```
    /// use galkin_rs::parameters::parameter::Parameter;
    ///
    /// let param = Parameter::with_bounds("inc", 45.0, 0.0, 90.0).unwrap();
    /// assert_eq!(param.min(), 0.0);
    /// assert_eq!(param.max(), 90.0);
    /// ```
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let bounds = Bounds::new(min, max)?;
        let mut param = Self::new(name, value);
        param.bounds = bounds;
        Ok(param)
    }

    /// Builder: mark the parameter fixed (or free)
    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Builder: replace the bounds with an already validated [`Bounds`]
    pub fn bounded(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Builder: attach a prior
    pub fn with_prior(mut self, prior: Prior) -> Self {
        self.prior = prior;
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value without bounds checking
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub fn init_value(&self) -> f64 {
        self.init_value
    }

    pub fn reset(&mut self) {
        self.value = self.init_value;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
    }

    pub fn is_tied(&self) -> bool {
        self.tied.is_some()
    }

    pub fn tied(&self) -> Option<&Tie> {
        self.tied.as_ref()
    }

    pub fn set_tied(&mut self, tie: Option<Tie>) {
        self.tied = tie;
    }

    /// A parameter is free when it is neither fixed nor tied
    pub fn is_free(&self) -> bool {
        !self.fixed && self.tied.is_none()
    }

    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<(), ParameterError> {
        self.bounds = Bounds::new(min, max)?;
        Ok(())
    }

    pub fn prior(&self) -> &Prior {
        &self.prior
    }

    pub fn set_prior(&mut self, prior: Prior) {
        self.prior = prior;
    }

    /// Log-prior of the current value
    pub fn log_prior(&self) -> f64 {
        self.prior.log_prior(self.value, &self.bounds)
    }

    /// Map a unit-cube coordinate to a value through the prior
    pub fn prior_transform(&self, u: f64) -> Result<f64, ParameterError> {
        self.prior
            .prior_transform(u, &self.bounds)
            .map_err(|source| ParameterError::Prior {
                name: self.name.clone(),
                source,
            })
    }

    /// Draw a value from the prior
    pub fn sample_prior<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, ParameterError> {
        self.prior
            .sample(rng, &self.bounds)
            .map_err(|source| ParameterError::Prior {
                name: self.name.clone(),
                source,
            })
    }
}
