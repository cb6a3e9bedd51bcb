//! Razor-thin exponential (Freeman) disk

use ndarray::Array1;
use std::f64::consts::PI;

use crate::constants::{G_PC_MSUN_KMS2, RE_TO_RD_EXP};
use crate::error::Result;
use crate::models::{MassProfile, MassSubtype, Parameterized};
use crate::parameters::{Bounds, Parameter, ParameterStore};
use crate::utils::special::{bessel_i0e, bessel_i1e, bessel_k0e, bessel_k1e};
use crate::utils::sqrt_clipped;

const TOTAL_MASS: usize = 0;
const R_EFF: usize = 1;

/// Exponential disk parameterized by `log10` total mass and effective radius.
///
/// The circular velocity is the exact thin-disk result
/// `v^2 = 4 pi G Sigma0 rd y^2 [I0(y) K0(y) - I1(y) K1(y)]` with `y = r / (2 rd)`,
/// not the spherical `sqrt(G M(<r) / r)`.
#[derive(Debug, Clone)]
pub struct ExpDisk {
    params: ParameterStore,
    subtype: MassSubtype,
}

impl ExpDisk {
    pub fn new(total_mass: f64, r_eff: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("total_mass", total_mass).bounded(Bounds { min: 5.0, max: 14.0 }))
            .with(Parameter::new("r_eff", r_eff).bounded(Bounds { min: 0.0, max: 50.0 }));
        Self {
            params,
            subtype: MassSubtype::Baryonic,
        }
    }

    pub fn with_subtype(mut self, subtype: MassSubtype) -> Self {
        self.subtype = subtype;
        self
    }

    pub fn total_mass(&self) -> f64 {
        10f64.powf(self.params.value(TOTAL_MASS))
    }

    pub fn r_eff(&self) -> f64 {
        self.params.value(R_EFF)
    }

    /// Scale length [kpc]
    pub fn rd(&self) -> f64 {
        self.r_eff() / RE_TO_RD_EXP
    }

    /// Central surface density [Msun/kpc^2]
    pub fn sigma0(&self) -> f64 {
        self.total_mass() / (2.0 * PI * self.rd().powi(2))
    }

    /// Surface density [Msun/kpc^2]
    pub fn surface_density(&self, r: &Array1<f64>) -> Array1<f64> {
        let (sigma0, rd) = (self.sigma0(), self.rd());
        r.mapv(|r| sigma0 * (-r.abs() / rd).exp())
    }
}

impl Parameterized for ExpDisk {
    fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }
}

impl MassProfile for ExpDisk {
    fn type_name(&self) -> &'static str {
        "ExpDisk"
    }

    fn subtype(&self) -> MassSubtype {
        self.subtype
    }

    fn enclosed_mass(&self, r: &Array1<f64>) -> Array1<f64> {
        let (mass, rd) = (self.total_mass(), self.rd());
        r.mapv(|r| {
            let x = r.abs() / rd;
            mass * (1.0 - (1.0 + x) * (-x).exp())
        })
    }

    fn circular_velocity(&self, r: &Array1<f64>) -> Result<Array1<f64>> {
        let rd = self.rd();
        let amp = 4.0 * PI * G_PC_MSUN_KMS2 * 1e-3 * self.sigma0() * rd;
        Ok(r.mapv(|r| {
            let y = r.abs() / (2.0 * rd);
            if y == 0.0 {
                return 0.0;
            }
            // The exponential scalings of I and K cancel in each product
            let bessel = bessel_i0e(y) * bessel_k0e(y) - bessel_i1e(y) * bessel_k1e(y);
            sqrt_clipped(amp * y * y * bessel)
        }))
    }

    fn light_profile(&self, r: &Array1<f64>) -> Option<Array1<f64>> {
        let rd = self.rd();
        let norm = 1.0 / (2.0 * PI * rd * rd);
        Some(r.mapv(|r| norm * (-r.abs() / rd).exp()))
    }

    fn dlnrho_dlnr(&self, r: &Array1<f64>) -> Option<Array1<f64>> {
        let rd = self.rd();
        Some(r.mapv(|r| -2.0 * r.abs() / rd))
    }

    fn disk_reference(&self) -> Option<(f64, f64)> {
        Some((self.r_eff(), 1.0))
    }

    fn clone_box(&self) -> Box<dyn MassProfile> {
        Box::new(self.clone())
    }
}
