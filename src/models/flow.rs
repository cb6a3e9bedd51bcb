//! Radial gas flows.
//!
//! Positive `vr` is outward. A [`UniformRadialFlow`] only adds a kinematic
//! term to the galaxy velocity field; a [`PlanarRadialFlow`] is a separate,
//! resolved emitter in its own geometry.

use ndarray::{Array1, Zip};

use crate::models::geometry::SkyFrame;
use crate::models::{Parameterized, SpatialField3D};
use crate::parameters::{Bounds, Parameter, ParameterStore};

/// In-plane line-of-sight velocity of a radial flow of speed `vr`
#[inline]
fn planar_radial_los(frame: &SkyFrame, vr: f64, x: f64, y: f64) -> f64 {
    let r = x.hypot(y);
    if r == 0.0 {
        return 0.0;
    }
    frame.los_projection(vr * x / r, vr * y / r, 0.0)
}

/// Radial in-plane flow of constant speed, added to the galaxy velocities
#[derive(Debug, Clone)]
pub struct UniformRadialFlow {
    params: ParameterStore,
}

impl UniformRadialFlow {
    pub fn new(vr: f64) -> Self {
        Self {
            params: ParameterStore::new().with(Parameter::new("vr", vr)),
        }
    }

    pub fn vr(&self) -> f64 {
        self.params.value(0)
    }

    /// Line-of-sight velocity at a galaxy-frame position
    pub fn los_velocity(&self, frame: &SkyFrame, x: f64, y: f64) -> f64 {
        planar_radial_los(frame, self.vr(), x, y)
    }
}

mod planar {
    pub const VR: usize = 0;
    pub const R_INNER: usize = 1;
    pub const R_OUTER: usize = 2;
    pub const H_Z: usize = 3;
    pub const NORM_FLUX: usize = 4;
}

/// Radial flow confined to an annulus `r_inner <= r <= r_outer` [kpc] with a
/// Gaussian vertical extent `h_z`
#[derive(Debug, Clone)]
pub struct PlanarRadialFlow {
    params: ParameterStore,
}

impl PlanarRadialFlow {
    pub fn new(vr: f64, r_inner: f64, r_outer: f64) -> Self {
        let params = ParameterStore::new()
            .with(Parameter::new("vr", vr))
            .with(Parameter::new("r_inner", r_inner).bounded(Bounds::min_only(0.0)).fixed(true))
            .with(Parameter::new("r_outer", r_outer).bounded(Bounds::min_only(0.0)).fixed(true))
            .with(Parameter::new("h_z", 0.2).bounded(Bounds::min_only(0.0)).fixed(true))
            .with(Parameter::new("norm_flux", 0.0).fixed(true));
        Self { params }
    }

    pub fn with_thickness(mut self, h_z: f64) -> Self {
        if let Some(p) = self.params.at_mut(planar::H_Z) {
            p.set_value(h_z);
        }
        self
    }

    /// Builder: `log10` flux normalization
    pub fn with_norm_flux(mut self, norm_flux: f64) -> Self {
        if let Some(p) = self.params.at_mut(planar::NORM_FLUX) {
            p.set_value(norm_flux);
        }
        self
    }

    pub fn vr(&self) -> f64 {
        self.params.value(planar::VR)
    }

    pub fn h_z(&self) -> f64 {
        self.params.value(planar::H_Z)
    }

    pub fn los_velocity(&self, frame: &SkyFrame, x: f64, y: f64) -> f64 {
        planar_radial_los(frame, self.vr(), x, y)
    }

    fn flux_at(&self, x: f64, y: f64, z: f64) -> f64 {
        let r = x.hypot(y);
        if r < self.params.value(planar::R_INNER) || r > self.params.value(planar::R_OUTER) {
            return 0.0;
        }
        10f64.powf(self.params.value(planar::NORM_FLUX)) * (-0.5 * (z / self.h_z()).powi(2)).exp()
    }
}

impl SpatialField3D for PlanarRadialFlow {
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

/// A flow component
#[derive(Debug, Clone)]
pub enum Flow {
    UniformRadial(UniformRadialFlow),
    PlanarRadial(PlanarRadialFlow),
}

impl Flow {
    pub fn type_name(&self) -> &'static str {
        match self {
            Flow::UniformRadial(_) => "UniformRadialFlow",
            Flow::PlanarRadial(_) => "PlanarRadialFlow",
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Flow::PlanarRadial(_))
    }
}

impl Parameterized for Flow {
    fn parameters(&self) -> &ParameterStore {
        match self {
            Flow::UniformRadial(f) => &f.params,
            Flow::PlanarRadial(f) => &f.params,
        }
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        match self {
            Flow::UniformRadial(f) => &mut f.params,
            Flow::PlanarRadial(f) => &mut f.params,
        }
    }
}

impl From<UniformRadialFlow> for Flow {
    fn from(flow: UniformRadialFlow) -> Self {
        Flow::UniformRadial(flow)
    }
}

impl From<PlanarRadialFlow> for Flow {
    fn from(flow: PlanarRadialFlow) -> Self {
        Flow::PlanarRadial(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Geometry;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_uniform_inflow_projection() {
        let flow = UniformRadialFlow::new(-50.0);
        let frame = Geometry::new(90.0, 0.0).frame(1.0);
        // along the minor axis only
        assert_relative_eq!(flow.los_velocity(&frame, 0.0, 2.0), 50.0, max_relative = 1e-12);
        assert_relative_eq!(flow.los_velocity(&frame, 0.0, -2.0), -50.0, max_relative = 1e-12);
        assert_relative_eq!(flow.los_velocity(&frame, 3.0, 0.0), 0.0, epsilon = 1e-12);
        assert_eq!(flow.los_velocity(&frame, 0.0, 0.0), 0.0);

        let face_on = Geometry::new(0.0, 0.0).frame(1.0);
        assert_relative_eq!(flow.los_velocity(&face_on, 0.0, 2.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_planar_flux_annulus() {
        let flow = PlanarRadialFlow::new(30.0, 1.0, 4.0).with_thickness(0.5).with_norm_flux(1.0);
        let f = flow.evaluate_3d(&array![0.5, 2.0, 2.0, 5.0], &Array1::zeros(4), &array![0.0, 0.0, 0.5, 0.0]);
        assert_eq!(f[0], 0.0);
        assert_relative_eq!(f[1], 10.0);
        assert_relative_eq!(f[2], 10.0 * (-0.5f64).exp(), max_relative = 1e-12);
        assert_eq!(f[3], 0.0);

        let comp: Flow = flow.into();
        assert!(comp.is_resolved());
        assert_eq!(comp.type_name(), "PlanarRadialFlow");
    }
}
