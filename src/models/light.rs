//! Pure light profiles.
//!
//! These components carry no mass. They are evaluated at galaxy-frame
//! positions [kpc]; axisymmetric profiles ignore the height and are weighted
//! by the z-height profile of the model set, while 3D profiles supply their
//! own vertical structure.

use ndarray::{Array1, Zip};
use statrs::function::erf::erf;
use std::f64::consts::PI;
use std::fmt::Debug;

use crate::models::mass::sersic::SersicShape;
use crate::models::{Parameterized, SpatialField3D};
use crate::parameters::{Bounds, Parameter, ParameterStore};

pub trait LightProfile: Parameterized + SpatialField3D + Debug + Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Axisymmetric profiles depend on the in-plane radius only
    fn is_axisymmetric(&self) -> bool {
        true
    }

    /// Whether the profile already includes the vertical distribution
    fn includes_z(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn LightProfile>;
}

impl Clone for Box<dyn LightProfile> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

fn planar_radius(x: &Array1<f64>, y: &Array1<f64>) -> Array1<f64> {
    let mut r = Array1::zeros(x.len());
    Zip::from(&mut r).and(x).and(y).for_each(|r, &x, &y| *r = x.hypot(y));
    r
}

macro_rules! light_parameterized {
    ($($ty:ty),+) => {
        $(impl Parameterized for $ty {
            fn parameters(&self) -> &ParameterStore {
                &self.params
            }

            fn parameters_mut(&mut self) -> &mut ParameterStore {
                &mut self.params
            }
        })+
    };
}

light_parameterized!(LightTruncateSersic, LightGaussianRing, LightClump, LightGaussianRingAzimuthal);

/// Sersic light truncated to `r_inner <= r <= r_outer`
#[derive(Debug, Clone)]
pub struct LightTruncateSersic {
    params: ParameterStore,
}

impl LightTruncateSersic {
    pub fn new(l_tot: f64, r_eff: f64, n: f64, r_inner: f64, r_outer: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("L_tot", l_tot).bounded(Bounds::min_only(0.0)).fixed(true))
            .with(Parameter::new("r_eff", r_eff).bounded(Bounds { min: 0.0, max: 50.0 }))
            .with(Parameter::new("n", n).bounded(Bounds { min: 0.0, max: 8.0 }))
            .with(Parameter::new("r_inner", r_inner).bounded(Bounds::min_only(0.0)).fixed(true))
            .with(Parameter::new("r_outer", r_outer).bounded(Bounds::min_only(0.0)).fixed(true));
        Self { params }
    }

    pub fn radial(&self, r: &Array1<f64>) -> Array1<f64> {
        let p = &self.params;
        let (l_tot, r_eff, n, r_inner, r_outer) = (p.value(0), p.value(1), p.value(2), p.value(3), p.value(4));
        let shape = SersicShape::new(n, r_eff);
        r.mapv(|r| {
            let r = r.abs();
            if r < r_inner || r > r_outer {
                0.0
            } else {
                shape.surface_density(r, l_tot)
            }
        })
    }
}

impl SpatialField3D for LightTruncateSersic {
    fn evaluate_3d(&self, x: &Array1<f64>, y: &Array1<f64>, _z: &Array1<f64>) -> Array1<f64> {
        self.radial(&planar_radius(x, y))
    }
}

impl LightProfile for LightTruncateSersic {
    fn type_name(&self) -> &'static str {
        "LightTruncateSersic"
    }

    fn clone_box(&self) -> Box<dyn LightProfile> {
        Box::new(self.clone())
    }
}

/// `2 pi \int_0^inf r exp(-(r - r_peak)^2 / (2 sigma^2)) dr`
fn gaussian_ring_area(r_peak: f64, sigma_r: f64) -> f64 {
    let s2 = sigma_r * sigma_r;
    let tail = s2 * (-r_peak * r_peak / (2.0 * s2)).exp();
    let core = r_peak * sigma_r * (PI / 2.0).sqrt() * (1.0 + erf(r_peak / (sigma_r * 2f64.sqrt())));
    2.0 * PI * (tail + core)
}

/// Gaussian ring with total light `L_tot`
#[derive(Debug, Clone)]
pub struct LightGaussianRing {
    params: ParameterStore,
}

impl LightGaussianRing {
    pub fn new(r_peak: f64, sigma_r: f64, l_tot: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("r_peak", r_peak).bounded(Bounds::min_only(0.0)))
            .with(Parameter::new("sigma_r", sigma_r).bounded(Bounds::min_only(0.0)))
            .with(Parameter::new("L_tot", l_tot).bounded(Bounds::min_only(0.0)).fixed(true));
        Self { params }
    }

    pub fn radial(&self, r: &Array1<f64>) -> Array1<f64> {
        ring_radial(self.params.value(0), self.params.value(1), self.params.value(2), r)
    }
}

fn ring_radial(r_peak: f64, sigma_r: f64, l_tot: f64, r: &Array1<f64>) -> Array1<f64> {
    let norm = l_tot / gaussian_ring_area(r_peak, sigma_r);
    r.mapv(|r| norm * (-0.5 * ((r.abs() - r_peak) / sigma_r).powi(2)).exp())
}

impl SpatialField3D for LightGaussianRing {
    fn evaluate_3d(&self, x: &Array1<f64>, y: &Array1<f64>, _z: &Array1<f64>) -> Array1<f64> {
        self.radial(&planar_radius(x, y))
    }
}

impl LightProfile for LightGaussianRing {
    fn type_name(&self) -> &'static str {
        "LightGaussianRing"
    }

    fn clone_box(&self) -> Box<dyn LightProfile> {
        Box::new(self.clone())
    }
}

/// Spherical Sersic clump centred at `(r_center, phi, theta)`.
///
/// `phi` is the azimuth in the disk plane measured from the galaxy x axis and
/// `theta` the polar angle from the disk normal, both in degrees; `theta = 90`
/// places the clump in the midplane.
#[derive(Debug, Clone)]
pub struct LightClump {
    params: ParameterStore,
}

impl LightClump {
    pub fn new(l_tot: f64, r_eff: f64, n: f64, r_center: f64, phi: f64, theta: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("L_tot", l_tot).bounded(Bounds::min_only(0.0)).fixed(true))
            .with(Parameter::new("r_eff", r_eff).bounded(Bounds::min_only(0.0)))
            .with(Parameter::new("n", n).bounded(Bounds { min: 0.0, max: 8.0 }).fixed(true))
            .with(Parameter::new("r_center", r_center).bounded(Bounds::min_only(0.0)))
            .with(Parameter::new("phi", phi).bounded(Bounds { min: 0.0, max: 360.0 }))
            .with(Parameter::new("theta", theta).bounded(Bounds { min: 0.0, max: 180.0 }).fixed(true));
        Self { params }
    }

    /// Galaxy-frame position of the clump centre [kpc]
    pub fn center(&self) -> (f64, f64, f64) {
        let r = self.params.value(3);
        let phi = self.params.value(4).to_radians();
        let theta = self.params.value(5).to_radians();
        (r * theta.sin() * phi.cos(), r * theta.sin() * phi.sin(), r * theta.cos())
    }
}

impl SpatialField3D for LightClump {
    fn evaluate_3d(&self, x: &Array1<f64>, y: &Array1<f64>, z: &Array1<f64>) -> Array1<f64> {
        let (l_tot, r_eff, n) = (self.params.value(0), self.params.value(1), self.params.value(2));
        let shape = SersicShape::new(n, r_eff);
        let (xc, yc, zc) = self.center();
        let mut out = Array1::zeros(x.len());
        Zip::from(&mut out).and(x).and(y).and(z).for_each(|o, &x, &y, &z| {
            let d = ((x - xc).powi(2) + (y - yc).powi(2) + (z - zc).powi(2)).sqrt();
            *o = shape.surface_density(d, l_tot);
        });
        out
    }
}

impl LightProfile for LightClump {
    fn type_name(&self) -> &'static str {
        "LightClump"
    }

    fn is_axisymmetric(&self) -> bool {
        false
    }

    fn includes_z(&self) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn LightProfile> {
        Box::new(self.clone())
    }
}

/// Gaussian ring whose brightness is modulated in azimuth.
///
/// The weight at azimuth `a` is `(1 - contrast) + contrast ((1 + cos(a - phi)) / 2)^gamma`,
/// peaking at `phi` [deg].
#[derive(Debug, Clone)]
pub struct LightGaussianRingAzimuthal {
    params: ParameterStore,
}

impl LightGaussianRingAzimuthal {
    pub fn new(r_peak: f64, sigma_r: f64, l_tot: f64, phi: f64, contrast: f64, gamma: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("r_peak", r_peak).bounded(Bounds::min_only(0.0)))
            .with(Parameter::new("sigma_r", sigma_r).bounded(Bounds::min_only(0.0)))
            .with(Parameter::new("L_tot", l_tot).bounded(Bounds::min_only(0.0)).fixed(true))
            .with(Parameter::new("phi", phi).bounded(Bounds { min: 0.0, max: 360.0 }))
            .with(Parameter::new("contrast", contrast).bounded(Bounds { min: 0.0, max: 1.0 }))
            .with(Parameter::new("gamma", gamma).bounded(Bounds::min_only(0.0)).fixed(true));
        Self { params }
    }

    fn azimuthal_weight(&self, x: f64, y: f64) -> f64 {
        let phi = self.params.value(3).to_radians();
        let contrast = self.params.value(4);
        let gamma = self.params.value(5);
        let a = y.atan2(x);
        (1.0 - contrast) + contrast * (0.5 * (1.0 + (a - phi).cos())).powf(gamma)
    }
}

impl SpatialField3D for LightGaussianRingAzimuthal {
    fn evaluate_3d(&self, x: &Array1<f64>, y: &Array1<f64>, _z: &Array1<f64>) -> Array1<f64> {
        let p = &self.params;
        let mut light = ring_radial(p.value(0), p.value(1), p.value(2), &planar_radius(x, y));
        Zip::from(&mut light).and(x).and(y).for_each(|l, &x, &y| *l *= self.azimuthal_weight(x, y));
        light
    }
}

impl LightProfile for LightGaussianRingAzimuthal {
    fn type_name(&self) -> &'static str {
        "LightGaussianRingAzimuthal"
    }

    fn is_axisymmetric(&self) -> bool {
        false
    }

    fn clone_box(&self) -> Box<dyn LightProfile> {
        Box::new(self.clone())
    }
}
