//! Parameter priors
//!
//! Each model parameter carries a prior distribution which a Bayesian fitter
//! consults through [`Prior::log_prior`] (for MCMC) or [`Prior::prior_transform`]
//! (for nested sampling, which maps the unit interval onto the parameter).

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};
use statrs::function::erf::{erf, erf_inv};
use std::f64::consts::{PI, SQRT_2};
use thiserror::Error;

use crate::parameters::bounds::Bounds;

/// Errors raised when a prior cannot be evaluated or sampled
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriorError {
    #[error("Uniform prior requires finite bounds, got [{min}, {max}]")]
    OpenBounds { min: f64, max: f64 },

    #[error("Gaussian prior requires a positive standard deviation, got {0}")]
    InvalidStddev(f64),

    #[error("Unit-cube coordinate {0} is outside [0, 1]")]
    OutsideUnitInterval(f64),
}

/// Prior distribution of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prior {
    /// Flat within the parameter bounds
    Uniform,

    /// Normal distribution ignoring the parameter bounds
    Gaussian { center: f64, stddev: f64 },

    /// Normal distribution truncated to the parameter bounds
    BoundedGaussian { center: f64, stddev: f64 },
}

impl Default for Prior {
    fn default() -> Self {
        Prior::Uniform
    }
}

impl Prior {
    /// Natural log of the (unnormalized) prior density at `value`.
    ///
    /// # Arguments
    ///
    /// * `value` - Parameter value
    /// * `bounds` - Bounds of the parameter the prior belongs to
    ///
    /// # Returns
    ///
    /// The log-prior, `-inf` where the prior has no support
    ///
    /// # Examples
    ///
    /// ```
    /// use galkin_rs::parameters::{Bounds, Prior};
    ///
    /// let bounds = Bounds::new(0.0, 90.0).unwrap();
    /// assert_eq!(Prior::Uniform.log_prior(45.0, &bounds), 0.0);
    /// assert_eq!(Prior::Uniform.log_prior(95.0, &bounds), f64::NEG_INFINITY);
    /// ```
    pub fn log_prior(&self, value: f64, bounds: &Bounds) -> f64 {
        match *self {
            Prior::Uniform => {
                if bounds.is_within_bounds(value) {
                    0.0
                } else {
                    f64::NEG_INFINITY
                }
            }
            Prior::Gaussian { center, stddev } => normal_ln_pdf(value, center, stddev),
            Prior::BoundedGaussian { center, stddev } => {
                if bounds.is_within_bounds(value) {
                    normal_ln_pdf(value, center, stddev)
                } else {
                    f64::NEG_INFINITY
                }
            }
        }
    }

    /// Map a unit-interval coordinate onto the parameter's prior.
    ///
    /// # Arguments
    ///
    /// * `u` - Coordinate in `[0, 1]`
    /// * `bounds` - Bounds of the parameter
    ///
    /// # Returns
    ///
    /// The value whose prior CDF equals `u`
    pub fn prior_transform(&self, u: f64, bounds: &Bounds) -> Result<f64, PriorError> {
        if !(0.0..=1.0).contains(&u) {
            return Err(PriorError::OutsideUnitInterval(u));
        }

        match *self {
            Prior::Uniform => {
                check_finite(bounds)?;
                Ok(bounds.min + u * (bounds.max - bounds.min))
            }
            Prior::Gaussian { center, stddev } => {
                check_stddev(stddev)?;
                Ok(normal_quantile(u, center, stddev))
            }
            Prior::BoundedGaussian { center, stddev } => {
                check_stddev(stddev)?;
                let lo = normal_cdf(bounds.min, center, stddev);
                let hi = normal_cdf(bounds.max, center, stddev);
                Ok(bounds.clamp(normal_quantile(lo + u * (hi - lo), center, stddev)))
            }
        }
    }

    /// Draw a random value from the prior.
    ///
    /// Bounded Gaussians are sampled by rejection, falling back to the clamped
    /// centre if the bounds sit far in the tails.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, bounds: &Bounds) -> Result<f64, PriorError> {
        match *self {
            Prior::Uniform => {
                check_finite(bounds)?;
                if bounds.min == bounds.max {
                    return Ok(bounds.min);
                }
                Ok(Uniform::new_inclusive(bounds.min, bounds.max).sample(rng))
            }
            Prior::Gaussian { center, stddev } => {
                let normal = Normal::new(center, stddev)
                    .map_err(|_| PriorError::InvalidStddev(stddev))?;
                Ok(normal.sample(rng))
            }
            Prior::BoundedGaussian { center, stddev } => {
                let normal = Normal::new(center, stddev)
                    .map_err(|_| PriorError::InvalidStddev(stddev))?;
                for _ in 0..1000 {
                    let value = normal.sample(rng);
                    if bounds.is_within_bounds(value) {
                        return Ok(value);
                    }
                }
                Ok(bounds.clamp(center))
            }
        }
    }
}

fn check_finite(bounds: &Bounds) -> Result<(), PriorError> {
    if bounds.is_finite() {
        Ok(())
    } else {
        Err(PriorError::OpenBounds {
            min: bounds.min,
            max: bounds.max,
        })
    }
}

fn check_stddev(stddev: f64) -> Result<(), PriorError> {
    if stddev > 0.0 && stddev.is_finite() {
        Ok(())
    } else {
        Err(PriorError::InvalidStddev(stddev))
    }
}

fn normal_ln_pdf(x: f64, center: f64, stddev: f64) -> f64 {
    let z = (x - center) / stddev;
    -0.5 * z * z - (stddev * (2.0 * PI).sqrt()).ln()
}

fn normal_cdf(x: f64, center: f64, stddev: f64) -> f64 {
    if x == f64::NEG_INFINITY {
        return 0.0;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    0.5 * (1.0 + erf((x - center) / (stddev * SQRT_2)))
}

fn normal_quantile(p: f64, center: f64, stddev: f64) -> f64 {
    center + stddev * SQRT_2 * erf_inv(2.0 * p - 1.0)
}
