//! Outflow components.
//!
//! A resolved bicone is evaluated in its own geometry: the cone axis is the
//! `z` axis of that frame and the velocity is radial from the centre. An
//! unresolved outflow adds a single Gaussian spectrum at the centre pixel.

use ndarray::{Array1, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GalkinError, Result};
use crate::models::geometry::SkyFrame;
use crate::models::{Parameterized, SpatialField3D};
use crate::parameters::{Bounds, Parameter, ParameterStore};

/// FWHM of a unit-dispersion Gaussian
const FWHM_PER_SIGMA: f64 = 2.3548;

/// Radial run of the bicone velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutflowProfile {
    /// Rises as `(r / rturn)^n` to `vmax` at `rturn`, then declines
    #[default]
    Both,
    Increase,
    Decrease,
    Constant,
}

impl FromStr for OutflowProfile {
    type Err = GalkinError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "both" => Ok(OutflowProfile::Both),
            "increase" => Ok(OutflowProfile::Increase),
            "decrease" => Ok(OutflowProfile::Decrease),
            "constant" => Ok(OutflowProfile::Constant),
            other => Err(GalkinError::Configuration(format!("unknown outflow profile type '{}'", other))),
        }
    }
}

impl fmt::Display for OutflowProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutflowProfile::Both => "both",
            OutflowProfile::Increase => "increase",
            OutflowProfile::Decrease => "decrease",
            OutflowProfile::Constant => "constant",
        })
    }
}

mod bicone {
    pub const N: usize = 0;
    pub const VMAX: usize = 1;
    pub const RTURN: usize = 2;
    pub const THETAIN: usize = 3;
    pub const DTHETA: usize = 4;
    pub const REND: usize = 5;
    pub const NORM_FLUX: usize = 6;
    pub const TAU_FLUX: usize = 7;
}

/// Biconical outflow filling polar angles `thetain..thetain + dtheta` [deg]
/// out to `rend` [kpc]
#[derive(Debug, Clone)]
pub struct BiconicalOutflow {
    params: ParameterStore,
    profile_type: OutflowProfile,
}

impl BiconicalOutflow {
    pub fn new(n: f64, vmax: f64, rturn: f64, thetain: f64, dtheta: f64, rend: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("n", n).fixed(true))
            .with(Parameter::new("vmax", vmax).bounded(Bounds::min_only(0.0)))
            .with(Parameter::new("rturn", rturn).bounded(Bounds::min_only(0.0)))
            .with(Parameter::new("thetain", thetain).bounded(Bounds { min: 0.0, max: 90.0 }))
            .with(Parameter::new("dtheta", dtheta).bounded(Bounds { min: 0.0, max: 90.0 }))
            .with(Parameter::new("rend", rend).bounded(Bounds::min_only(0.0)))
            .with(Parameter::new("norm_flux", 0.0).fixed(true))
            .with(Parameter::new("tau_flux", 5.0).fixed(true));
        Self {
            params,
            profile_type: OutflowProfile::Both,
        }
    }

    pub fn with_profile_type(mut self, profile_type: OutflowProfile) -> Self {
        self.profile_type = profile_type;
        self
    }

    /// Builder: `log10` flux normalization and exponential decay constant
    pub fn with_flux(mut self, norm_flux: f64, tau_flux: f64) -> Self {
        if let Some(p) = self.params.at_mut(bicone::NORM_FLUX) {
            p.set_value(norm_flux);
        }
        if let Some(p) = self.params.at_mut(bicone::TAU_FLUX) {
            p.set_value(tau_flux);
        }
        self
    }

    pub fn profile_type(&self) -> OutflowProfile {
        self.profile_type
    }

    /// Outflow speed at radius `r` [kpc]; never negative
    pub fn velocity(&self, r: f64) -> f64 {
        let p = &self.params;
        let (n, vmax, rturn, rend) = (
            p.value(bicone::N),
            p.value(bicone::VMAX),
            p.value(bicone::RTURN),
            p.value(bicone::REND),
        );
        let r = r.abs();
        let v = match self.profile_type {
            OutflowProfile::Increase => vmax * (r / rend).powf(n),
            OutflowProfile::Decrease => vmax * (2.0 - (r / rend).powf(n)),
            OutflowProfile::Constant => vmax,
            OutflowProfile::Both => {
                if r <= rturn {
                    vmax * (r / rturn).powf(n)
                } else {
                    vmax * (2.0 - (r / rturn).powf(n))
                }
            }
        };
        if v < 0.0 {
            0.0
        } else {
            v
        }
    }

    /// Whether a frame position [kpc] lies inside the cones
    pub fn in_cone(&self, x: f64, y: f64, z: f64) -> bool {
        let r = (x * x + y * y + z * z).sqrt();
        if r == 0.0 || r > self.params.value(bicone::REND) {
            return false;
        }
        let thetain = self.params.value(bicone::THETAIN);
        let theta_out = thetain + self.params.value(bicone::DTHETA);
        let theta = (z.abs() / r).acos().to_degrees();
        theta >= thetain && theta <= theta_out
    }

    fn flux_at(&self, x: f64, y: f64, z: f64) -> f64 {
        if !self.in_cone(x, y, z) {
            return 0.0;
        }
        let r = (x * x + y * y + z * z).sqrt();
        let amp = 10f64.powf(self.params.value(bicone::NORM_FLUX));
        amp * (-self.params.value(bicone::TAU_FLUX) * r / self.params.value(bicone::REND)).exp()
    }

    /// Line-of-sight velocity of a frame position [kpc] seen through `frame`
    pub fn los_velocity(&self, frame: &SkyFrame, x: f64, y: f64, z: f64) -> f64 {
        let r = (x * x + y * y + z * z).sqrt();
        if r == 0.0 {
            return 0.0;
        }
        let v = self.velocity(r) / r;
        frame.los_projection(v * x, v * y, v * z)
    }
}

impl SpatialField3D for BiconicalOutflow {
    fn evaluate_3d(&self, x: &Array1<f64>, y: &Array1<f64>, z: &Array1<f64>) -> Array1<f64> {
        let mut flux = Array1::zeros(x.len());
        Zip::from(&mut flux)
            .and(x)
            .and(y)
            .and(z)
            .for_each(|f, &x, &y, &z| *f = self.flux_at(x, y, z));
        flux
    }
}

/// Spatially unresolved outflow: a Gaussian line at the centre pixel
#[derive(Debug, Clone)]
pub struct UnresolvedOutflow {
    params: ParameterStore,
}

impl UnresolvedOutflow {
    pub fn new(vcenter: f64, fwhm: f64, amplitude: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("vcenter", vcenter))
            .with(Parameter::new("fwhm", fwhm).bounded(Bounds::min_only(0.0)))
            .with(Parameter::new("amplitude", amplitude).bounded(Bounds::min_only(0.0)));
        Self { params }
    }

    pub fn vcenter(&self) -> f64 {
        self.params.value(0)
    }

    pub fn fwhm(&self) -> f64 {
        self.params.value(1)
    }

    pub fn amplitude(&self) -> f64 {
        self.params.value(2)
    }

    /// Line profile over the spectral axis, shifted by `vel_shift` [km/s]
    pub fn spectrum(&self, vspec: &Array1<f64>, vel_shift: f64) -> Array1<f64> {
        let sigma = self.fwhm() / FWHM_PER_SIGMA;
        let vc = self.vcenter() + vel_shift;
        let amp = self.amplitude();
        vspec.mapv(|v| amp * (-0.5 * ((v - vc) / sigma).powi(2)).exp())
    }
}

/// An outflow component
#[derive(Debug, Clone)]
pub enum Outflow {
    Biconical(BiconicalOutflow),
    Unresolved(UnresolvedOutflow),
}

impl Outflow {
    pub fn type_name(&self) -> &'static str {
        match self {
            Outflow::Biconical(_) => "BiconicalOutflow",
            Outflow::Unresolved(_) => "UnresolvedOutflow",
        }
    }

    /// Resolved outflows need their own geometry and dispersion
    pub fn is_resolved(&self) -> bool {
        matches!(self, Outflow::Biconical(_))
    }
}

impl Parameterized for Outflow {
    fn parameters(&self) -> &ParameterStore {
        match self {
            Outflow::Biconical(o) => &o.params,
            Outflow::Unresolved(o) => &o.params,
        }
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        match self {
            Outflow::Biconical(o) => &mut o.params,
            Outflow::Unresolved(o) => &mut o.params,
        }
    }
}

impl From<BiconicalOutflow> for Outflow {
    fn from(outflow: BiconicalOutflow) -> Self {
        Outflow::Biconical(outflow)
    }
}

impl From<UnresolvedOutflow> for Outflow {
    fn from(outflow: UnresolvedOutflow) -> Self {
        Outflow::Unresolved(outflow)
    }
}
