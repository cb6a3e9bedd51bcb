//! Tied parameters
//!
//! A tied parameter takes its value from other parameters of the model set
//! instead of being sampled. Ties are stored by name only; the owning
//! [`ModelSet`](crate::model_set::ModelSet) resolves them after every update.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::model_set::ModelSet;

/// Function signature for closure-based ties
pub type TieFunction = dyn Fn(&ModelSet) -> f64 + Send + Sync;

/// Shared handle to a tie function, cloned along with the model set
#[derive(Clone)]
pub struct TieFn(pub Arc<TieFunction>);

impl TieFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ModelSet) -> f64 + Send + Sync + 'static,
    {
        TieFn(Arc::new(f))
    }

    pub fn call(&self, model: &ModelSet) -> f64 {
        (self.0)(model)
    }
}

impl fmt::Debug for TieFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TieFn(<closure>)")
    }
}

/// How a tied parameter obtains its value
///
/// # Examples
///
/// ```
/// use galkin_rs::parameters::Tie;
///
/// // Keep the bulge as compact as a tenth of the disk
/// let tie = Tie::expression("0.1 * disk.r_eff");
/// assert!(tie.is_expression());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tie {
    /// Arithmetic expression over `component.param` identifiers
    Expression(String),

    /// Arbitrary function of the whole model set; not serializable
    #[serde(skip)]
    Function(TieFn),
}

impl Tie {
    pub fn expression(expr: &str) -> Self {
        Tie::Expression(expr.to_string())
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&ModelSet) -> f64 + Send + Sync + 'static,
    {
        Tie::Function(TieFn::new(f))
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Tie::Expression(_))
    }
}
