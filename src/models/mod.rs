//! Model components.
//!
//! A galaxy model is assembled from components of several categories: mass
//! profiles, geometry, dispersion and z-height profiles, light profiles,
//! outflows, flows and dust extinction. Every component owns a
//! [`ParameterStore`]; what it can compute is expressed through small
//! capability traits:
//!
//! - [`MassProfile`]: enclosed mass and circular velocity
//! - [`RadialProfile1D`]: a function of radius (or height) only
//! - [`SpatialField3D`]: a function of galaxy-frame position
//! - [`mass::DarkMatterHalo`]: virial quantities and the fdm inversion

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{G_CGS, MSUN_G, PC_CM};
use crate::error::{GalkinError, Result};
use crate::parameters::ParameterStore;

pub mod dispersion;
pub mod extinction;
pub mod flow;
pub mod geometry;
pub mod light;
pub mod mass;
pub mod outflow;
pub mod zheight;

pub use dispersion::{DispersionConst, DispersionProfile};
pub use extinction::ThinCentralPlaneDustExtinction;
pub use flow::{Flow, PlanarRadialFlow, UniformRadialFlow};
pub use geometry::Geometry;
pub use light::{
    LightClump, LightGaussianRing, LightGaussianRingAzimuthal, LightProfile, LightTruncateSersic,
};
pub use mass::{
    BlackHole, Burkert, DarkMatterHalo, DekelZhao, DiskBulge, Einasto, ExpDisk, InMemoryNoordermeerTables,
    LightComponent, LinearDiskBulge, LinearNfw, NoordermeerTables, Nfw, RotationCurveTable, Sersic, TwoPowerHalo,
};
pub use outflow::{BiconicalOutflow, Outflow, OutflowProfile, UnresolvedOutflow};
pub use zheight::{ZHeightExp, ZHeightGauss, ZHeightProfile};

/// Access to the parameters a component owns
pub trait Parameterized {
    fn parameters(&self) -> &ParameterStore;

    fn parameters_mut(&mut self) -> &mut ParameterStore;
}

/// A profile depending on a single coordinate (radius or height) in kpc
pub trait RadialProfile1D {
    fn evaluate(&self, r: &Array1<f64>) -> Array1<f64>;
}

/// A field over galaxy-frame positions in kpc
pub trait SpatialField3D {
    fn evaluate_3d(&self, x: &Array1<f64>, y: &Array1<f64>, z: &Array1<f64>) -> Array1<f64>;
}

/// Role of a mass component when velocities are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassSubtype {
    Baryonic,
    DarkMatter,
    Combined,
}

impl FromStr for MassSubtype {
    type Err = GalkinError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "baryonic" => Ok(MassSubtype::Baryonic),
            "dark_matter" => Ok(MassSubtype::DarkMatter),
            "combined" => Ok(MassSubtype::Combined),
            other => Err(GalkinError::InvalidSubtype(other.to_string())),
        }
    }
}

impl fmt::Display for MassSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MassSubtype::Baryonic => "baryonic",
            MassSubtype::DarkMatter => "dark_matter",
            MassSubtype::Combined => "combined",
        };
        f.write_str(name)
    }
}

/// Which geometry/dispersion slot a component fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    #[default]
    Galaxy,
    Outflow,
    Flow,
}

/// A mass profile.
///
/// Radii are in kpc, masses in Msun and velocities in km/s. Negative radii are
/// treated as their absolute value.
pub trait MassProfile: Parameterized + fmt::Debug + Send + Sync {
    /// Short type name used in log messages
    fn type_name(&self) -> &'static str;

    fn subtype(&self) -> MassSubtype;

    fn enclosed_mass(&self, r: &Array1<f64>) -> Array1<f64>;

    /// Circular velocity; defaults to `sqrt(G M(<r) / r)`
    fn circular_velocity(&self, r: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(velocity_from_enclosed_mass(r, &self.enclosed_mass(r)))
    }

    /// Relative light distribution when the component also traces light
    fn light_profile(&self, _r: &Array1<f64>) -> Option<Array1<f64>> {
        None
    }

    /// Logarithmic density slope, if the profile defines one
    fn dlnrho_dlnr(&self, _r: &Array1<f64>) -> Option<Array1<f64>> {
        None
    }

    /// Effective radius and Sersic index of the disk, for disk-like profiles
    fn disk_reference(&self) -> Option<(f64, f64)> {
        None
    }

    fn as_halo(&self) -> Option<&dyn DarkMatterHalo> {
        None
    }

    fn clone_box(&self) -> Box<dyn MassProfile>;
}

impl Clone for Box<dyn MassProfile> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// `v = sqrt(G M / r)` in km/s for `r` in kpc and `M` in Msun; zero at `r = 0`.
pub fn velocity_from_enclosed_mass(r: &Array1<f64>, menc: &Array1<f64>) -> Array1<f64> {
    let mut v = Array1::zeros(r.len());
    ndarray::Zip::from(&mut v)
        .and(r)
        .and(menc)
        .for_each(|v, &r, &m| {
            let r = r.abs();
            *v = if r == 0.0 {
                0.0
            } else {
                (G_CGS * m * MSUN_G / (r * 1000.0 * PC_CM)).sqrt() / 1e5
            };
        });
    v
}

/// One component of a model set
#[derive(Debug, Clone)]
pub enum Component {
    Mass(Box<dyn MassProfile>),
    Geometry(Geometry),
    Dispersion(Box<dyn DispersionProfile>),
    ZHeight(Box<dyn ZHeightProfile>),
    Light(Box<dyn LightProfile>),
    Outflow(Outflow),
    Flow(Flow),
    Extinction(ThinCentralPlaneDustExtinction),
}

impl Component {
    pub fn parameters(&self) -> &ParameterStore {
        match self {
            Component::Mass(c) => c.parameters(),
            Component::Geometry(c) => c.parameters(),
            Component::Dispersion(c) => c.parameters(),
            Component::ZHeight(c) => c.parameters(),
            Component::Light(c) => c.parameters(),
            Component::Outflow(c) => c.parameters(),
            Component::Flow(c) => c.parameters(),
            Component::Extinction(c) => c.parameters(),
        }
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterStore {
        match self {
            Component::Mass(c) => c.parameters_mut(),
            Component::Geometry(c) => c.parameters_mut(),
            Component::Dispersion(c) => c.parameters_mut(),
            Component::ZHeight(c) => c.parameters_mut(),
            Component::Light(c) => c.parameters_mut(),
            Component::Outflow(c) => c.parameters_mut(),
            Component::Flow(c) => c.parameters_mut(),
            Component::Extinction(c) => c.parameters_mut(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Component::Mass(_) => "mass",
            Component::Geometry(_) => "geometry",
            Component::Dispersion(_) => "dispersion",
            Component::ZHeight(_) => "zheight",
            Component::Light(_) => "light",
            Component::Outflow(_) => "outflow",
            Component::Flow(_) => "flow",
            Component::Extinction(_) => "extinction",
        }
    }

    pub fn as_mass(&self) -> Option<&dyn MassProfile> {
        match self {
            Component::Mass(m) => Some(m.as_ref()),
            _ => None,
        }
    }
}

macro_rules! into_component {
    ($variant:ident boxed: $($ty:ty),+) => {
        $(impl From<$ty> for Component {
            fn from(model: $ty) -> Self {
                Component::$variant(Box::new(model))
            }
        })+
    };
    ($variant:ident: $($ty:ty),+) => {
        $(impl From<$ty> for Component {
            fn from(model: $ty) -> Self {
                Component::$variant(model.into())
            }
        })+
    };
}

into_component!(Mass boxed: Sersic, DiskBulge, LinearDiskBulge, ExpDisk, BlackHole, Nfw, LinearNfw,
    TwoPowerHalo, Burkert, Einasto, DekelZhao);
into_component!(Dispersion boxed: DispersionConst);
into_component!(ZHeight boxed: ZHeightGauss, ZHeightExp);
into_component!(Light boxed: LightTruncateSersic, LightGaussianRing, LightClump, LightGaussianRingAzimuthal);
into_component!(Geometry: Geometry);
into_component!(Outflow: BiconicalOutflow, UnresolvedOutflow);
into_component!(Flow: UniformRadialFlow, PlanarRadialFlow);
into_component!(Extinction: ThinCentralPlaneDustExtinction);
