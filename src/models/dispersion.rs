//! Velocity dispersion profiles

use ndarray::Array1;
use std::fmt::Debug;

use crate::models::{Parameterized, RadialProfile1D};
use crate::parameters::{Bounds, Parameter, ParameterStore};

/// Intrinsic velocity dispersion as a function of radius [km/s]
pub trait DispersionProfile: Parameterized + RadialProfile1D + Debug + Send + Sync {
    fn clone_box(&self) -> Box<dyn DispersionProfile>;
}

impl Clone for Box<dyn DispersionProfile> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

const SIGMA0: usize = 0;

/// Radially constant dispersion
#[derive(Debug, Clone)]
pub struct DispersionConst {
    params: ParameterStore,
}

impl DispersionConst {
    /// `sigma0` in km/s; starts fixed
    pub fn new(sigma0: f64) -> Self {
        let params = ParameterStore::new().with(
            Parameter::new("sigma0", sigma0)
                .bounded(Bounds::min_only(0.0))
                .fixed(true),
        );
        Self { params }
    }

    pub fn sigma0(&self) -> f64 {
        self.params.value(SIGMA0)
    }
}

impl Parameterized for DispersionConst {
    fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }
}

impl RadialProfile1D for DispersionConst {
    fn evaluate(&self, r: &Array1<f64>) -> Array1<f64> {
        Array1::from_elem(r.len(), self.sigma0())
    }
}

impl DispersionProfile for DispersionConst {
    fn clone_box(&self) -> Box<dyn DispersionProfile> {
        Box::new(self.clone())
    }
}
