//! Kinematic corrections to the circular velocity.
//!
//! Two options act on the rotation curve before it is projected:
//!
//! - **Adiabatic contraction** of the dark-matter halo in response to the
//!   baryons, solved per radius with Newton's method.
//! - **Pressure support** (asymmetric drift), which lowers the rotation
//!   velocity of a dispersion-supported disk.

use log::{debug, warn};
use ndarray::{Array1, Zip};
use roots::{find_root_newton_raphson, SimpleConvergency};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GalkinError, Result};
use crate::model_set::ModelSet;
use crate::models::{Context, MassSubtype, RadialProfile1D};
use crate::utils::special::sersic_bn;
use crate::utils::{interp_array, interp_extrapolate, sqrt_clipped};

/// Maximum Newton iterations per radius
const NEWTON_MAX_ITER: usize = 50;

/// Fraction of failed radii above which only converged radii are interpolated
const MAX_FAILED_FRACTION: f64 = 0.1;

/// Drift coefficient of a self-gravitating exponential disk
const EXP_DISK_DRIFT: f64 = 3.36;

/// Form of the asymmetric-drift term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PressureSupportType {
    /// `3.36 (r / Re) sigma^2`
    #[default]
    ExponentialDisk,
    /// `2 (b_n / n) (r / Re)^(1/n) sigma^2`
    Sersic,
    /// `-sigma^2 dln(rho)/dln(r)` from the baryonic density slope
    DensitySlope,
}

impl TryFrom<u8> for PressureSupportType {
    type Error = GalkinError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(PressureSupportType::ExponentialDisk),
            2 => Ok(PressureSupportType::Sersic),
            3 => Ok(PressureSupportType::DensitySlope),
            other => Err(GalkinError::Configuration(format!(
                "pressure support type {} not recognized; expected 1, 2 or 3",
                other
            ))),
        }
    }
}

impl From<PressureSupportType> for u8 {
    fn from(kind: PressureSupportType) -> u8 {
        match kind {
            PressureSupportType::ExponentialDisk => 1,
            PressureSupportType::Sersic => 2,
            PressureSupportType::DensitySlope => 3,
        }
    }
}

impl fmt::Display for PressureSupportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Outcome of an adiabatic-contraction solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractionReport {
    pub n_radii: usize,
    pub n_failed: usize,
    /// Whether too many radii failed and `r'(r)` was interpolated from the
    /// converged ones only
    pub used_converged_subset: bool,
}

/// Options applied when turning circular velocities into rotation velocities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicOptions {
    pub adiabatic_contract: bool,
    pub pressure_support: bool,
    pub pressure_support_type: PressureSupportType,
    /// Effective radius for the drift term [kpc]; taken from the disk if unset
    pub pressure_support_re: Option<f64>,
    /// Sersic index for the drift term; taken from the disk if unset
    pub pressure_support_n: Option<f64>,
    /// Radial step of the contraction grid [kpc]
    pub adiabatic_contract_step: f64,
    /// Outer radius of the contraction grid [kpc]
    pub adiabatic_contract_rmax: f64,
}

impl Default for KinematicOptions {
    fn default() -> Self {
        Self {
            adiabatic_contract: false,
            pressure_support: false,
            pressure_support_type: PressureSupportType::ExponentialDisk,
            pressure_support_re: None,
            pressure_support_n: None,
            adiabatic_contract_step: 0.2,
            adiabatic_contract_rmax: 100.0,
        }
    }
}

/// Effective radius and Sersic index used by the drift term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftReference {
    pub re: f64,
    pub n: f64,
    /// True when neither the options nor a disk component supplied them
    pub defaulted: bool,
}

impl KinematicOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Radii of the 1D contraction grid, `0..=rmax`. Step and rmax must be
    /// finite and positive, with `step <= rmax`.
    pub fn contraction_grid(&self) -> Result<Array1<f64>> {
        let step = self.adiabatic_contract_step;
        let rmax = self.adiabatic_contract_rmax;
        if !(step.is_finite() && step > 0.0) {
            return Err(GalkinError::Configuration(format!(
                "adiabatic_contract_step must be finite and > 0, got {}",
                step
            )));
        }
        if !(rmax.is_finite() && rmax >= step) {
            return Err(GalkinError::Configuration(format!(
                "adiabatic_contract_rmax must be finite and >= the step ({}), got {}",
                step, rmax
            )));
        }
        let n = (rmax / step + 1e-9).floor() as usize + 1;
        Ok(Array1::from_shape_fn(n, |i| i as f64 * step))
    }

    /// Re and n for the drift term: explicit options first, then the first
    /// baryonic disk-like component, then `Re = 1`, `n = 1`
    pub fn drift_reference(&self, model: &ModelSet) -> DriftReference {
        let disk = model
            .mass_components()
            .filter(|(_, m)| m.subtype() == MassSubtype::Baryonic)
            .find_map(|(_, m)| m.disk_reference());

        let re = self.pressure_support_re.or(disk.map(|(re, _)| re));
        let n = self.pressure_support_n.or(disk.map(|(_, n)| n));
        DriftReference {
            re: re.unwrap_or(1.0),
            n: n.unwrap_or(1.0),
            defaulted: re.is_none() || n.is_none(),
        }
    }

    /// Squared drift velocity `v_drift(r)^2` [km^2/s^2]
    pub fn drift_velocity_sq(&self, model: &ModelSet, r: &Array1<f64>) -> Result<Array1<f64>> {
        let dispersion = model.dispersion(Context::Galaxy).ok_or_else(|| {
            GalkinError::Configuration("pressure support requires a galaxy dispersion profile".to_string())
        })?;
        let sigma = dispersion.evaluate(r);

        let reference = self.drift_reference(model);
        if reference.defaulted && self.pressure_support_type != PressureSupportType::DensitySlope {
            warn!("No disk component found for pressure support; using default Re = 1 kpc, n = 1");
        }
        let drift = match self.pressure_support_type {
            PressureSupportType::ExponentialDisk => {
                let re = reference.re;
                let mut out = Array1::zeros(r.len());
                Zip::from(&mut out)
                    .and(r)
                    .and(&sigma)
                    .for_each(|o, &r, &s| *o = EXP_DISK_DRIFT * (r.abs() / re) * s * s);
                out
            }
            PressureSupportType::Sersic => {
                let DriftReference { re, n, .. } = reference;
                let bn = sersic_bn(n);
                let mut out = Array1::zeros(r.len());
                Zip::from(&mut out)
                    .and(r)
                    .and(&sigma)
                    .for_each(|o, &r, &s| *o = 2.0 * (bn / n) * (r.abs() / re).powf(1.0 / n) * s * s);
                out
            }
            PressureSupportType::DensitySlope => {
                let slope = model
                    .mass_components()
                    .filter(|(_, m)| m.subtype() == MassSubtype::Baryonic)
                    .find_map(|(_, m)| m.dlnrho_dlnr(r))
                    .ok_or_else(|| {
                        GalkinError::MissingCollaborator(
                            "no baryonic component provides a density slope for pressure support".to_string(),
                        )
                    })?;
                let mut out = Array1::zeros(r.len());
                Zip::from(&mut out)
                    .and(&slope)
                    .and(&sigma)
                    .for_each(|o, &k, &s| *o = -s * s * k);
                out
            }
        };
        Ok(drift)
    }

    /// `v_rot = sqrt(max(v_circ^2 - v_drift^2, 0))` when pressure support is on
    pub fn apply_pressure_support(&self, model: &ModelSet, r: &Array1<f64>, vel: &Array1<f64>) -> Result<Array1<f64>> {
        if !self.pressure_support {
            return Ok(vel.clone());
        }
        let drift = self.drift_velocity_sq(model, r)?;
        let mut out = Array1::zeros(vel.len());
        Zip::from(&mut out)
            .and(vel)
            .and(&drift)
            .for_each(|o, &v, &d| *o = sqrt_clipped(v * v - d));
        Ok(out)
    }

    /// Inverse of [`KinematicOptions::apply_pressure_support`]:
    /// `v_circ = sqrt(v_rot^2 + v_drift^2)`
    pub fn correct_for_pressure_support(
        &self,
        model: &ModelSet,
        r: &Array1<f64>,
        vel: &Array1<f64>,
    ) -> Result<Array1<f64>> {
        if !self.pressure_support {
            return Ok(vel.clone());
        }
        let drift = self.drift_velocity_sq(model, r)?;
        let mut out = Array1::zeros(vel.len());
        Zip::from(&mut out)
            .and(vel)
            .and(&drift)
            .for_each(|o, &v, &d| *o = sqrt_clipped(v * v + d));
        Ok(out)
    }
}

/// Contracted halo velocity on the grid `r`.
///
/// Solves `r' = r (1 + r v_bar(r)^2 / (r' v_halo(r')^2))` at each radius and
/// evaluates the original halo curve at `r'`. `r` must be increasing and have
/// at least two entries.
pub fn adiabatic_contraction(
    r: &Array1<f64>,
    vbaryon: &Array1<f64>,
    vhalo: &Array1<f64>,
) -> (Array1<f64>, ContractionReport) {
    let rs = r.to_vec();
    let vh = vhalo.to_vec();
    let rmin = rs.get(1).copied().unwrap_or(0.0);

    let halo_at = |rp: f64| -> (f64, f64) {
        let rp = if rp < 0.0 { 0.1 } else { rp };
        let rp = rp.max(rmin);
        (rp, interp_extrapolate(&rs, &vh, rp))
    };

    let mut rprime = Array1::zeros(rs.len());
    let mut converged = vec![true; rs.len()];
    for (i, (&ri, &vb)) in r.iter().zip(vbaryon.iter()).enumerate() {
        if ri == 0.0 {
            continue;
        }
        let residual = |rp: f64| {
            let (rp, vh) = halo_at(rp);
            ri + ri * (ri * vb * vb) / (rp * vh * vh) - rp
        };
        let derivative = |rp: f64| {
            let h = 1e-6 * rp.abs().max(1.0);
            (residual(rp + h) - residual(rp - h)) / (2.0 * h)
        };
        let mut convergency = SimpleConvergency {
            eps: 1e-8,
            max_iter: NEWTON_MAX_ITER,
        };
        match find_root_newton_raphson(ri + 1.0, residual, derivative, &mut convergency) {
            Ok(root) if root.is_finite() => rprime[i] = root,
            _ => {
                rprime[i] = ri;
                converged[i] = false;
            }
        }
    }

    let n_failed = converged.iter().filter(|&&c| !c).count();
    let used_converged_subset = (n_failed as f64) > MAX_FAILED_FRACTION * rs.len() as f64;
    if used_converged_subset {
        let (rc, rpc): (Vec<f64>, Vec<f64>) = rs
            .iter()
            .zip(rprime.iter())
            .zip(converged.iter())
            .filter(|&(_, &c)| c)
            .map(|((&r, &rp), _)| (r, rp))
            .unzip();
        rprime = interp_array(&rc, &rpc, r);
    }
    debug!(
        "Adiabatic contraction: {} radii, {} failed{}",
        rs.len(),
        n_failed,
        if used_converged_subset { ", interpolating converged subset" } else { "" }
    );

    let vhalo_adi = interp_array(&rs, &vh, &rprime);
    let report = ContractionReport {
        n_radii: rs.len(),
        n_failed,
        used_converged_subset,
    };
    (vhalo_adi, report)
}
