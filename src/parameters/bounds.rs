//! Parameter bounds
//!
//! Bounds describe the allowed range of a model parameter. They are not used to
//! clamp values on assignment; instead they define the support of the parameter
//! prior, so that a sampler stepping outside them sees a log-prior of `-inf`.

use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Bounds [{min}, {max}] are not finite; a finite range is required")]
    NotFinite { min: f64, max: f64 },
}

/// Represents the bounds constraints on a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Bounds", 2)?;

        // Open ends are written as null
        if self.min.is_infinite() && self.min.is_sign_negative() {
            state.serialize_field("min", &Option::<f64>::None)?;
        } else {
            state.serialize_field("min", &self.min)?;
        }

        if self.max.is_infinite() && self.max.is_sign_positive() {
            state.serialize_field("max", &Option::<f64>::None)?;
        } else {
            state.serialize_field("max", &self.max)?;
        }

        state.end()
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BoundsHelper {
            #[serde(default)]
            min: Option<f64>,

            #[serde(default)]
            max: Option<f64>,
        }

        let helper = BoundsHelper::deserialize(deserializer)?;

        let min = helper.min.unwrap_or(NEG_INFINITY);
        let max = helper.max.unwrap_or(INFINITY);

        Ok(Bounds { min, max })
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create a new bounds constraint with min and max values
    ///
    /// # Arguments
    ///
    /// * `min` - Minimum allowed value for the parameter
    /// * `max` - Maximum allowed value for the parameter
    ///
    /// # Returns
    ///
    /// A new `Bounds` object if min <= max, or an error otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use galkin_rs::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 90.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert_eq!(bounds.max, 90.0);
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Create an unbounded constraint (negative infinity to positive infinity)
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Create a bounds constraint with only a minimum value
    pub fn min_only(min: f64) -> Self {
        Self { min, max: INFINITY }
    }

    /// Create a bounds constraint with only a maximum value
    pub fn max_only(max: f64) -> Self {
        Self {
            min: NEG_INFINITY,
            max,
        }
    }

    /// Check if a value is within the bounds (inclusive at both ends)
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if the bounds are finite (both min and max are finite)
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Clamp a value to be within the bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Width of a finite range.
    ///
    /// # Returns
    ///
    /// `max - min`, or an error if either end is open
    pub fn width(&self) -> Result<f64, BoundsError> {
        if !self.is_finite() {
            return Err(BoundsError::NotFinite {
                min: self.min,
                max: self.max,
            });
        }
        Ok(self.max - self.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_creation() {
        let bounds = Bounds::new(0.0, 10.0).unwrap();
        assert_eq!(bounds.min, 0.0);
        assert_eq!(bounds.max, 10.0);

        // Invalid bounds (min > max)
        assert!(Bounds::new(10.0, 0.0).is_err());

        let bounds = Bounds::unbounded();
        assert_eq!(bounds.min, NEG_INFINITY);
        assert_eq!(bounds.max, INFINITY);

        let bounds = Bounds::min_only(5.0);
        assert_eq!(bounds.min, 5.0);
        assert_eq!(bounds.max, INFINITY);

        let bounds = Bounds::max_only(15.0);
        assert_eq!(bounds.min, NEG_INFINITY);
        assert_eq!(bounds.max, 15.0);
    }

    #[test]
    fn test_is_within_bounds() {
        let bounds = Bounds::new(0.0, 90.0).unwrap();

        assert!(bounds.is_within_bounds(0.0));
        assert!(bounds.is_within_bounds(45.0));
        assert!(bounds.is_within_bounds(90.0));

        assert!(!bounds.is_within_bounds(-1.0));
        assert!(!bounds.is_within_bounds(91.0));
        assert!(!bounds.is_within_bounds(f64::NAN));
    }

    #[test]
    fn test_width() {
        assert_eq!(Bounds::new(5.0, 14.0).unwrap().width().unwrap(), 9.0);
        assert!(Bounds::min_only(0.0).width().is_err());
    }

    #[test]
    fn test_serde_open_ends() {
        let bounds = Bounds::min_only(0.0);
        let json = serde_json::to_string(&bounds).unwrap();
        assert_eq!(json, r#"{"min":0.0,"max":null}"#);

        let back: Bounds = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bounds);

        let empty: Bounds = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Bounds::unbounded());
    }
}
