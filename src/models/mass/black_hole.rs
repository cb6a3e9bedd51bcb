//! Central point mass

use ndarray::Array1;

use crate::models::{MassProfile, MassSubtype, Parameterized};
use crate::parameters::{Bounds, Parameter, ParameterStore};

const BH_MASS: usize = 0;

/// Point mass at the galaxy centre, parameterized by `log10` mass
#[derive(Debug, Clone)]
pub struct BlackHole {
    params: ParameterStore,
}

impl BlackHole {
    pub fn new(bh_mass: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("BH_mass", bh_mass).bounded(Bounds { min: 0.0, max: 12.0 }));
        Self { params }
    }

    pub fn mass(&self) -> f64 {
        10f64.powf(self.params.value(BH_MASS))
    }
}

impl Parameterized for BlackHole {
    fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }
}

impl MassProfile for BlackHole {
    fn type_name(&self) -> &'static str {
        "BlackHole"
    }

    fn subtype(&self) -> MassSubtype {
        MassSubtype::Baryonic
    }

    fn enclosed_mass(&self, r: &Array1<f64>) -> Array1<f64> {
        Array1::from_elem(r.len(), self.mass())
    }

    fn light_profile(&self, r: &Array1<f64>) -> Option<Array1<f64>> {
        Some(Array1::zeros(r.len()))
    }

    fn clone_box(&self) -> Box<dyn MassProfile> {
        Box::new(self.clone())
    }
}
