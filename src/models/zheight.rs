//! Vertical light profiles

use ndarray::Array1;
use std::fmt::Debug;

use crate::models::{Parameterized, RadialProfile1D};
use crate::parameters::{Bounds, Parameter, ParameterStore};

/// Relative light as a function of height above the midplane [kpc].
///
/// Profiles are normalized to one in the midplane.
pub trait ZHeightProfile: Parameterized + RadialProfile1D + Debug + Send + Sync {
    /// Characteristic thickness [kpc], used to size the truncated z window
    fn z_scalelength(&self) -> f64;

    fn clone_box(&self) -> Box<dyn ZHeightProfile>;
}

impl Clone for Box<dyn ZHeightProfile> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Gaussian vertical profile with dispersion `sigmaz`
#[derive(Debug, Clone)]
pub struct ZHeightGauss {
    params: ParameterStore,
}

impl ZHeightGauss {
    pub fn new(sigmaz: f64) -> Self {
        let params = ParameterStore::new().with(
            Parameter::new("sigmaz", sigmaz)
                .bounded(Bounds { min: 0.0, max: 10.0 })
                .fixed(true),
        );
        Self { params }
    }

    pub fn sigmaz(&self) -> f64 {
        self.params.value(0)
    }
}

impl Parameterized for ZHeightGauss {
    fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }
}

impl RadialProfile1D for ZHeightGauss {
    fn evaluate(&self, z: &Array1<f64>) -> Array1<f64> {
        let sigmaz = self.sigmaz();
        z.mapv(|z| (-0.5 * (z / sigmaz).powi(2)).exp())
    }
}

impl ZHeightProfile for ZHeightGauss {
    fn z_scalelength(&self) -> f64 {
        self.sigmaz()
    }

    fn clone_box(&self) -> Box<dyn ZHeightProfile> {
        Box::new(self.clone())
    }
}

/// Exponential vertical profile with scale height `hz`
#[derive(Debug, Clone)]
pub struct ZHeightExp {
    params: ParameterStore,
}

impl ZHeightExp {
    pub fn new(hz: f64) -> Self {
        let params = ParameterStore::new().with(
            Parameter::new("hz", hz)
                .bounded(Bounds { min: 0.0, max: 10.0 })
                .fixed(true),
        );
        Self { params }
    }

    pub fn hz(&self) -> f64 {
        self.params.value(0)
    }
}

impl Parameterized for ZHeightExp {
    fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }
}

impl RadialProfile1D for ZHeightExp {
    fn evaluate(&self, z: &Array1<f64>) -> Array1<f64> {
        let hz = self.hz();
        z.mapv(|z| (-z.abs() / hz).exp())
    }
}

impl ZHeightProfile for ZHeightExp {
    fn z_scalelength(&self) -> f64 {
        self.hz()
    }

    fn clone_box(&self) -> Box<dyn ZHeightProfile> {
        Box::new(self.clone())
    }
}
