//! Sky <-> galaxy frame geometry.
//!
//! Sky coordinates are pixels with `z` along the line of sight. The galaxy
//! frame has the disk in the `x`-`y` plane with `x` along the major axis.

use ndarray::{Array3, Axis, Zip};
use rayon::prelude::*;

use crate::models::Parameterized;
use crate::parameters::{Bounds, Parameter, ParameterStore};

const INC: usize = 0;
const PA: usize = 1;
const XSHIFT: usize = 2;
const YSHIFT: usize = 3;
const VEL_SHIFT: usize = 4;

/// Inclination, position angle, centre shift and systemic velocity
#[derive(Debug, Clone)]
pub struct Geometry {
    params: ParameterStore,
}

impl Geometry {
    /// Angles in degrees; the shifts and systemic velocity start at zero
    pub fn new(inc: f64, pa: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("inc", inc).bounded(Bounds { min: 0.0, max: 90.0 }))
            .with(Parameter::new("pa", pa).bounded(Bounds { min: -180.0, max: 180.0 }))
            .with(Parameter::new("xshift", 0.0))
            .with(Parameter::new("yshift", 0.0))
            .with(Parameter::new("vel_shift", 0.0).fixed(true));
        Self { params }
    }

    /// Builder: centre offset in sky pixels
    pub fn with_shift(mut self, xshift: f64, yshift: f64) -> Self {
        if let Some(p) = self.params.at_mut(XSHIFT) {
            p.set_value(xshift);
        }
        if let Some(p) = self.params.at_mut(YSHIFT) {
            p.set_value(yshift);
        }
        self
    }

    /// Builder: systemic velocity [km/s]
    pub fn with_vel_shift(mut self, vel_shift: f64) -> Self {
        if let Some(p) = self.params.at_mut(VEL_SHIFT) {
            p.set_value(vel_shift);
        }
        self
    }

    pub fn inc(&self) -> f64 {
        self.params.value(INC)
    }

    pub fn pa(&self) -> f64 {
        self.params.value(PA)
    }

    pub fn xshift(&self) -> f64 {
        self.params.value(XSHIFT)
    }

    pub fn yshift(&self) -> f64 {
        self.params.value(YSHIFT)
    }

    pub fn vel_shift(&self) -> f64 {
        self.params.value(VEL_SHIFT)
    }

    /// Precomputed transform with the shifts multiplied by `shift_scale`
    /// (the oversampling factor when working on an oversampled grid)
    pub fn frame(&self, shift_scale: f64) -> SkyFrame {
        let inc = self.inc().to_radians();
        let pa = (self.pa() - 90.0).to_radians();
        SkyFrame {
            sin_i: inc.sin(),
            cos_i: inc.cos(),
            sin_pa: pa.sin(),
            cos_pa: pa.cos(),
            xshift: self.xshift() * shift_scale,
            yshift: self.yshift() * shift_scale,
        }
    }

    /// Sky to galaxy frame for a single point
    pub fn to_galaxy(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        self.frame(1.0).to_galaxy(x, y, z)
    }

    /// Galaxy to sky frame for a single point
    pub fn to_sky(&self, xgal: f64, ygal: f64, zgal: f64) -> (f64, f64, f64) {
        self.frame(1.0).to_sky(xgal, ygal, zgal)
    }
}

impl Parameterized for Geometry {
    fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }
}

/// Sky <-> galaxy transform with the trigonometry evaluated once
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyFrame {
    pub sin_i: f64,
    pub cos_i: f64,
    sin_pa: f64,
    cos_pa: f64,
    xshift: f64,
    yshift: f64,
}

impl SkyFrame {
    /// Shift, rotate by `pa - 90` and tilt by the inclination
    #[inline]
    pub fn to_galaxy(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let xsky = x - self.xshift;
        let ysky = y - self.yshift;

        let xtmp = xsky * self.cos_pa + ysky * self.sin_pa;
        let ytmp = -xsky * self.sin_pa + ysky * self.cos_pa;

        let xgal = xtmp;
        let ygal = ytmp * self.cos_i - z * self.sin_i;
        let zgal = ytmp * self.sin_i + z * self.cos_i;
        (xgal, ygal, zgal)
    }

    /// Exact inverse of [`SkyFrame::to_galaxy`]
    #[inline]
    pub fn to_sky(&self, xgal: f64, ygal: f64, zgal: f64) -> (f64, f64, f64) {
        let xtmp = xgal;
        let ytmp = ygal * self.cos_i + zgal * self.sin_i;
        let z = -ygal * self.sin_i + zgal * self.cos_i;

        let xsky = xtmp * self.cos_pa - ytmp * self.sin_pa;
        let ysky = xtmp * self.sin_pa + ytmp * self.cos_pa;
        (xsky + self.xshift, ysky + self.yshift, z)
    }

    /// Line-of-sight component of a galaxy-frame vector
    #[inline]
    pub fn los_projection(&self, _vx: f64, vy: f64, vz: f64) -> f64 {
        -vy * self.sin_i + vz * self.cos_i
    }

    /// Resample a field tabulated on a cubic galaxy-frame grid onto a sky grid.
    ///
    /// `galaxy` is indexed `(z, y, x)` and centred on its middle voxel; the sky
    /// grid has shape `sky_shape = (nz, ny, nx)` and centre `sky_center`
    /// `(zc, yc, xc)`. Each sky voxel takes the trilinear interpolation of the
    /// galaxy field at its galaxy-frame position, zero outside the grid.
    pub fn resample_to_sky(
        &self,
        galaxy: &Array3<f64>,
        sky_shape: (usize, usize, usize),
        sky_center: (f64, f64, f64),
    ) -> Array3<f64> {
        let (gz, gy, gx) = galaxy.dim();
        let gcenter = ((gz as f64 - 1.0) / 2.0, (gy as f64 - 1.0) / 2.0, (gx as f64 - 1.0) / 2.0);
        let (zc, yc, xc) = sky_center;

        let mut sky = Array3::zeros(sky_shape);
        sky.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(k, mut plane)| {
                let z = k as f64 - zc;
                for ((j, i), out) in plane.indexed_iter_mut() {
                    let (xg, yg, zg) = self.to_galaxy(i as f64 - xc, j as f64 - yc, z);
                    *out = trilinear(galaxy, zg + gcenter.0, yg + gcenter.1, xg + gcenter.2);
                }
            });
        sky
    }
}

/// Trilinear interpolation at fractional index `(z, y, x)`; zero outside
fn trilinear(field: &Array3<f64>, z: f64, y: f64, x: f64) -> f64 {
    let (nz, ny, nx) = field.dim();
    if !(z >= 0.0 && y >= 0.0 && x >= 0.0) {
        return 0.0;
    }
    let (z0, y0, x0) = (z.floor() as usize, y.floor() as usize, x.floor() as usize);
    if z0 >= nz || y0 >= ny || x0 >= nx {
        return 0.0;
    }
    let (dz, dy, dx) = (z - z0 as f64, y - y0 as f64, x - x0 as f64);
    let z1 = (z0 + 1).min(nz - 1);
    let y1 = (y0 + 1).min(ny - 1);
    let x1 = (x0 + 1).min(nx - 1);

    let c00 = field[[z0, y0, x0]] * (1.0 - dx) + field[[z0, y0, x1]] * dx;
    let c01 = field[[z0, y1, x0]] * (1.0 - dx) + field[[z0, y1, x1]] * dx;
    let c10 = field[[z1, y0, x0]] * (1.0 - dx) + field[[z1, y0, x1]] * dx;
    let c11 = field[[z1, y1, x0]] * (1.0 - dx) + field[[z1, y1, x1]] * dx;
    let c0 = c00 * (1.0 - dy) + c01 * dy;
    let c1 = c10 * (1.0 - dy) + c11 * dy;
    c0 * (1.0 - dz) + c1 * dz
}

/// Sky coordinates of every voxel of an `(nz, ny, nx)` grid relative to `center`
pub fn sky_grid(shape: (usize, usize, usize), center: (f64, f64, f64)) -> (Array3<f64>, Array3<f64>, Array3<f64>) {
    let (zc, yc, xc) = center;
    let x = Array3::from_shape_fn(shape, |(_, _, i)| i as f64 - xc);
    let y = Array3::from_shape_fn(shape, |(_, j, _)| j as f64 - yc);
    let z = Array3::from_shape_fn(shape, |(k, _, _)| k as f64 - zc);
    (x, y, z)
}

/// Galaxy-frame coordinates of every sky voxel
pub fn galaxy_grid(
    frame: &SkyFrame,
    shape: (usize, usize, usize),
    center: (f64, f64, f64),
) -> (Array3<f64>, Array3<f64>, Array3<f64>) {
    let (xs, ys, zs) = sky_grid(shape, center);
    let mut xg = Array3::zeros(shape);
    let mut yg = Array3::zeros(shape);
    let mut zg = Array3::zeros(shape);
    Zip::from(&mut xg)
        .and(&mut yg)
        .and(&mut zg)
        .and(&xs)
        .and(&ys)
        .and(&zs)
        .par_for_each(|xg, yg, zg, &x, &y, &z| {
            let (a, b, c) = frame.to_galaxy(x, y, z);
            *xg = a;
            *yg = b;
            *zg = c;
        });
    (xg, yg, zg)
}
