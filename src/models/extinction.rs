//! Dust extinction by a thin central plane

use ndarray::{Array1, Zip};

use crate::models::geometry::SkyFrame;
use crate::models::{Geometry, Parameterized, SpatialField3D};
use crate::parameters::{Bounds, Parameter, ParameterStore};

const INC: usize = 0;
const PA: usize = 1;
const XSHIFT: usize = 2;
const YSHIFT: usize = 3;
const R_INNER: usize = 4;
const R_OUTER: usize = 5;
const AMP_EXTINCT: usize = 6;

/// Infinitely thin dust annulus `r_inner <= r <= r_outer` with its own
/// inclination and position angle.
///
/// Light behind the plane (further along the line of sight) is scaled by
/// `1 - amp_extinct`. Positions and shifts are sky-frame kpc relative to the
/// grid centre.
#[derive(Debug, Clone)]
pub struct ThinCentralPlaneDustExtinction {
    params: ParameterStore,
}

impl ThinCentralPlaneDustExtinction {
    pub fn new(inc: f64, pa: f64, r_inner: f64, r_outer: f64, amp_extinct: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("inc", inc).bounded(Bounds { min: 0.0, max: 90.0 }).fixed(true))
            .with(Parameter::new("pa", pa).bounded(Bounds { min: -180.0, max: 180.0 }).fixed(true))
            .with(Parameter::new("xshift", 0.0).fixed(true))
            .with(Parameter::new("yshift", 0.0).fixed(true))
            .with(Parameter::new("r_inner", r_inner).bounded(Bounds::min_only(0.0)).fixed(true))
            .with(Parameter::new("r_outer", r_outer).bounded(Bounds::min_only(0.0)).fixed(true))
            .with(Parameter::new("amp_extinct", amp_extinct).bounded(Bounds { min: 0.0, max: 1.0 }));
        Self { params }
    }

    /// Offset the dust plane centre by `(xshift, yshift)` in sky kpc.
    ///
    /// Unlike [`Geometry::with_shift`], which takes sampled-pixel shifts, the
    /// dust screen lives in kpc so that it does not depend on the pixel scale.
    pub fn with_shift(mut self, xshift: f64, yshift: f64) -> Self {
        if let Some(p) = self.params.at_mut(XSHIFT) {
            p.set_value(xshift);
        }
        if let Some(p) = self.params.at_mut(YSHIFT) {
            p.set_value(yshift);
        }
        self
    }

    fn frame(&self) -> SkyFrame {
        Geometry::new(self.params.value(INC), self.params.value(PA))
            .with_shift(self.params.value(XSHIFT), self.params.value(YSHIFT))
            .frame(1.0)
    }

    fn transmission(&self, frame: &SkyFrame, x: f64, y: f64, z: f64) -> f64 {
        if frame.cos_i == 0.0 {
            return 1.0;
        }
        let (xd, _, zd) = frame.to_galaxy(x, y, z);
        if zd <= 0.0 {
            return 1.0;
        }
        // where the sight line pierces the plane
        let (_, yd0, zd0) = frame.to_galaxy(x, y, 0.0);
        let ytmp = yd0 * frame.cos_i + zd0 * frame.sin_i;
        let r = xd.hypot(ytmp / frame.cos_i);
        if r >= self.params.value(R_INNER) && r <= self.params.value(R_OUTER) {
            1.0 - self.params.value(AMP_EXTINCT)
        } else {
            1.0
        }
    }
}

impl Parameterized for ThinCentralPlaneDustExtinction {
    fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }
}

impl SpatialField3D for ThinCentralPlaneDustExtinction {
    /// Transmitted fraction of the light at each sky position
    fn evaluate_3d(&self, x: &Array1<f64>, y: &Array1<f64>, z: &Array1<f64>) -> Array1<f64> {
        let frame = self.frame();
        let mut out = Array1::ones(x.len());
        Zip::from(&mut out)
            .and(x)
            .and(y)
            .and(z)
            .for_each(|t, &x, &y, &z| *t = self.transmission(&frame, x, y, z));
        out
    }
}
