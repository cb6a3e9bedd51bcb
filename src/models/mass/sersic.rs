//! Sersic mass profile

use ndarray::Array1;
use std::f64::consts::PI;
use std::sync::Arc;

use statrs::function::gamma::gamma;

use crate::error::{GalkinError, Result};
use crate::models::mass::noordermeer::{apply_noord_flat, NoordermeerTables};
use crate::models::{MassProfile, MassSubtype, Parameterized};
use crate::parameters::{Bounds, Parameter, ParameterStore};
use crate::utils::special::{gammainc, sersic_bn};

const TOTAL_MASS: usize = 0;
const R_EFF: usize = 1;
const N: usize = 2;

/// Shape of a Sersic profile with `b_n` and the density normalization
/// computed once, for evaluation over many radii
#[derive(Debug, Clone, Copy)]
pub(crate) struct SersicShape {
    n: f64,
    r_eff: f64,
    bn: f64,
    norm: f64,
}

impl SersicShape {
    pub(crate) fn new(n: f64, r_eff: f64) -> Self {
        let bn = sersic_bn(n);
        let alpha = r_eff / bn.powf(n);
        let norm = 1.0 / (2.0 * PI) / alpha.powi(2) / n / gamma(2.0 * n);
        Self { n, r_eff, bn, norm }
    }

    fn scaled(&self, r: f64) -> f64 {
        self.bn * (r.abs() / self.r_eff).powf(1.0 / self.n)
    }

    pub(crate) fn surface_density(&self, r: f64, mass: f64) -> f64 {
        mass * self.norm * (-self.scaled(r)).exp()
    }

    pub(crate) fn enclosed_fraction(&self, r: f64) -> f64 {
        gammainc(2.0 * self.n, self.scaled(r))
    }

    /// `-2 (b_n / n) (r / r_eff)^(1/n)`
    pub(crate) fn dlnrho_dlnr(&self, r: f64) -> f64 {
        -2.0 * self.scaled(r) / self.n
    }
}

/// Surface mass density of a Sersic profile of total mass `mass` [Msun/kpc^2]
pub fn sersic_mr(r: f64, mass: f64, n: f64, r_eff: f64) -> f64 {
    SersicShape::new(n, r_eff).surface_density(r, mass)
}

/// Mass of a Sersic profile enclosed within `r`
pub fn sersic_menc(r: f64, mass: f64, n: f64, r_eff: f64) -> f64 {
    mass * SersicShape::new(n, r_eff).enclosed_fraction(r)
}

/// Sersic mass profile parameterized by `log10` total mass, effective radius
/// and Sersic index
///
/// With Noordermeer flattening enabled the circular velocity is read from the
/// injected rotation-curve tables for the profile's intrinsic axis ratio.
#[derive(Debug, Clone)]
pub struct Sersic {
    params: ParameterStore,
    subtype: MassSubtype,
    invq: f64,
    noord_flat: bool,
    tables: Option<Arc<dyn NoordermeerTables>>,
}

impl Sersic {
    pub fn new(total_mass: f64, r_eff: f64, n: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("total_mass", total_mass).bounded(Bounds { min: 5.0, max: 14.0 }))
            .with(Parameter::new("r_eff", r_eff).bounded(Bounds { min: 0.0, max: 50.0 }))
            .with(Parameter::new("n", n).bounded(Bounds { min: 0.0, max: 8.0 }));
        Self {
            params,
            subtype: MassSubtype::Baryonic,
            invq: 1.0,
            noord_flat: false,
            tables: None,
        }
    }

    pub fn with_subtype(mut self, subtype: MassSubtype) -> Self {
        self.subtype = subtype;
        self
    }

    /// Use Noordermeer-flattened circular velocities for an inverse axis ratio `invq`
    pub fn with_noordermeer(mut self, invq: f64, tables: Arc<dyn NoordermeerTables>) -> Self {
        self.invq = invq;
        self.noord_flat = true;
        self.tables = Some(tables);
        self
    }

    pub fn total_mass(&self) -> f64 {
        10f64.powf(self.params.value(TOTAL_MASS))
    }

    pub fn r_eff(&self) -> f64 {
        self.params.value(R_EFF)
    }

    pub fn n(&self) -> f64 {
        self.params.value(N)
    }

    pub fn invq(&self) -> f64 {
        self.invq
    }

    pub fn noord_flat(&self) -> bool {
        self.noord_flat
    }
}

impl Parameterized for Sersic {
    fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }
}

impl MassProfile for Sersic {
    fn type_name(&self) -> &'static str {
        "Sersic"
    }

    fn subtype(&self) -> MassSubtype {
        self.subtype
    }

    fn enclosed_mass(&self, r: &Array1<f64>) -> Array1<f64> {
        let mass = self.total_mass();
        let shape = SersicShape::new(self.n(), self.r_eff());
        r.mapv(|r| mass * shape.enclosed_fraction(r))
    }

    fn circular_velocity(&self, r: &Array1<f64>) -> Result<Array1<f64>> {
        if !self.noord_flat {
            return Ok(crate::models::velocity_from_enclosed_mass(r, &self.enclosed_mass(r)));
        }
        let tables = self.tables.as_deref().ok_or_else(|| {
            GalkinError::MissingCollaborator("Noordermeer tables for a flattened Sersic profile".to_string())
        })?;
        apply_noord_flat(r, self.r_eff(), self.total_mass(), self.n(), self.invq, tables)
    }

    fn light_profile(&self, r: &Array1<f64>) -> Option<Array1<f64>> {
        let shape = SersicShape::new(self.n(), self.r_eff());
        Some(r.mapv(|r| shape.surface_density(r, 1.0)))
    }

    fn dlnrho_dlnr(&self, r: &Array1<f64>) -> Option<Array1<f64>> {
        let shape = SersicShape::new(self.n(), self.r_eff());
        Some(r.mapv(|r| shape.dlnrho_dlnr(r)))
    }

    fn disk_reference(&self) -> Option<(f64, f64)> {
        Some((self.r_eff(), self.n()))
    }

    fn clone_box(&self) -> Box<dyn MassProfile> {
        Box::new(self.clone())
    }
}
