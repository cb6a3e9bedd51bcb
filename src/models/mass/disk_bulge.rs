//! Composite disk + bulge mass profile.
//!
//! Both components are Sersic profiles sharing a total mass split by the
//! bulge-to-total ratio `bt`.

use ndarray::Array1;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{GalkinError, Result};
use crate::models::mass::forward_mass_profile;
use crate::models::mass::noordermeer::{apply_noord_flat, NoordermeerTables};
use crate::models::mass::sersic::SersicShape;
use crate::models::mass::MassScale;
use crate::models::{velocity_from_enclosed_mass, MassProfile, MassSubtype, Parameterized};
use crate::parameters::{Bounds, Parameter, ParameterStore};

const TOTAL_MASS: usize = 0;
const R_EFF_DISK: usize = 1;
const N_DISK: usize = 2;
const R_EFF_BULGE: usize = 3;
const N_BULGE: usize = 4;
const BT: usize = 5;

/// Which part of a [`DiskBulge`] traces the light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightComponent {
    #[default]
    Disk,
    Bulge,
    Total,
}

impl FromStr for LightComponent {
    type Err = GalkinError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disk" => Ok(LightComponent::Disk),
            "bulge" => Ok(LightComponent::Bulge),
            "total" => Ok(LightComponent::Total),
            other => Err(GalkinError::Configuration(format!(
                "light_component '{}' not recognized; expected 'disk', 'bulge' or 'total'",
                other
            ))),
        }
    }
}

/// Disk and bulge Sersic components with a shared total mass
#[derive(Debug, Clone)]
pub struct DiskBulge {
    params: ParameterStore,
    subtype: MassSubtype,
    scale: MassScale,
    /// Inverse axis ratio of the disk, used with Noordermeer flattening
    pub invq_disk: f64,
    /// Inverse axis ratio of the bulge, used with Noordermeer flattening
    pub invq_bulge: f64,
    light_component: LightComponent,
    noord_flat: bool,
    tables: Option<Arc<dyn NoordermeerTables>>,
}

impl DiskBulge {
    /// `total_mass` is `log10(M / Msun)`; both Sersic indices start fixed.
    pub fn new(total_mass: f64, r_eff_disk: f64, n_disk: f64, r_eff_bulge: f64, n_bulge: f64, bt: f64) -> Self {
        Self::with_scale(total_mass, r_eff_disk, n_disk, r_eff_bulge, n_bulge, bt, MassScale::Log10)
    }

    fn with_scale(
        total_mass: f64,
        r_eff_disk: f64,
        n_disk: f64,
        r_eff_bulge: f64,
        n_bulge: f64,
        bt: f64,
        scale: MassScale,
    ) -> Self {
        let mass_bounds = match scale {
            MassScale::Log10 => Bounds { min: 5.0, max: 14.0 },
            MassScale::Linear => Bounds { min: 1e5, max: 1e14 },
        };
        let params = ParameterStore::new()
            .with(Parameter::new("total_mass", total_mass).bounded(mass_bounds))
            .with(Parameter::new("r_eff_disk", r_eff_disk).bounded(Bounds { min: 0.0, max: 50.0 }))
            .with(Parameter::new("n_disk", n_disk).bounded(Bounds { min: 0.0, max: 8.0 }).fixed(true))
            .with(Parameter::new("r_eff_bulge", r_eff_bulge).bounded(Bounds { min: 0.0, max: 50.0 }))
            .with(Parameter::new("n_bulge", n_bulge).bounded(Bounds { min: 0.0, max: 8.0 }).fixed(true))
            .with(Parameter::new("bt", bt).bounded(Bounds { min: 0.0, max: 1.0 }));
        Self {
            params,
            subtype: MassSubtype::Baryonic,
            scale,
            invq_disk: 5.0,
            invq_bulge: 1.0,
            light_component: LightComponent::Disk,
            noord_flat: false,
            tables: None,
        }
    }

    pub fn with_subtype(mut self, subtype: MassSubtype) -> Self {
        self.subtype = subtype;
        self
    }

    pub fn with_light_component(mut self, light_component: LightComponent) -> Self {
        self.light_component = light_component;
        self
    }

    /// Flatten both components with Noordermeer rotation curves
    pub fn with_noordermeer(mut self, tables: Arc<dyn NoordermeerTables>) -> Self {
        self.noord_flat = true;
        self.tables = Some(tables);
        self
    }

    pub fn light_component(&self) -> LightComponent {
        self.light_component
    }

    pub fn total_mass(&self) -> f64 {
        self.scale.to_msun(self.params.value(TOTAL_MASS))
    }

    pub fn bt(&self) -> f64 {
        self.params.value(BT)
    }

    pub fn disk_mass(&self) -> f64 {
        self.total_mass() * (1.0 - self.bt())
    }

    pub fn bulge_mass(&self) -> f64 {
        self.total_mass() * self.bt()
    }

    fn disk_shape(&self) -> SersicShape {
        SersicShape::new(self.params.value(N_DISK), self.params.value(R_EFF_DISK))
    }

    fn bulge_shape(&self) -> SersicShape {
        SersicShape::new(self.params.value(N_BULGE), self.params.value(R_EFF_BULGE))
    }

    /// Surface mass density [Msun/kpc^2]
    pub fn surface_density(&self, r: &Array1<f64>) -> Array1<f64> {
        let (disk, bulge) = (self.disk_shape(), self.bulge_shape());
        let (md, mb) = (self.disk_mass(), self.bulge_mass());
        r.mapv(|r| disk.surface_density(r, md) + bulge.surface_density(r, mb))
    }
}

impl Parameterized for DiskBulge {
    fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }
}

impl MassProfile for DiskBulge {
    fn type_name(&self) -> &'static str {
        "DiskBulge"
    }

    fn subtype(&self) -> MassSubtype {
        self.subtype
    }

    fn enclosed_mass(&self, r: &Array1<f64>) -> Array1<f64> {
        let (disk, bulge) = (self.disk_shape(), self.bulge_shape());
        let (md, mb) = (self.disk_mass(), self.bulge_mass());
        r.mapv(|r| md * disk.enclosed_fraction(r) + mb * bulge.enclosed_fraction(r))
    }

    fn circular_velocity(&self, r: &Array1<f64>) -> Result<Array1<f64>> {
        if !self.noord_flat {
            return Ok(velocity_from_enclosed_mass(r, &self.enclosed_mass(r)));
        }
        let tables = self.tables.as_deref().ok_or_else(|| {
            GalkinError::MissingCollaborator("Noordermeer tables for a flattened disk + bulge".to_string())
        })?;
        let vbulge = apply_noord_flat(
            r,
            self.params.value(R_EFF_BULGE),
            self.bulge_mass(),
            self.params.value(N_BULGE),
            self.invq_bulge,
            tables,
        )?;
        let vdisk = apply_noord_flat(
            r,
            self.params.value(R_EFF_DISK),
            self.disk_mass(),
            self.params.value(N_DISK),
            self.invq_disk,
            tables,
        )?;
        Ok((&vbulge * &vbulge + &vdisk * &vdisk).mapv(f64::sqrt))
    }

    fn light_profile(&self, r: &Array1<f64>) -> Option<Array1<f64>> {
        let (disk, bulge) = (self.disk_shape(), self.bulge_shape());
        let bt = self.bt();
        let light = match self.light_component {
            LightComponent::Disk => r.mapv(|r| disk.surface_density(r, 1.0)),
            LightComponent::Bulge => r.mapv(|r| bulge.surface_density(r, 1.0)),
            LightComponent::Total => {
                r.mapv(|r| disk.surface_density(r, 1.0 - bt) + bulge.surface_density(r, bt))
            }
        };
        Some(light)
    }

    /// Mass-weighted slope of the two components
    fn dlnrho_dlnr(&self, r: &Array1<f64>) -> Option<Array1<f64>> {
        let (disk, bulge) = (self.disk_shape(), self.bulge_shape());
        let (md, mb) = (self.disk_mass(), self.bulge_mass());
        Some(r.mapv(|r| {
            let sd = disk.surface_density(r, md);
            let sb = bulge.surface_density(r, mb);
            let total = sd + sb;
            if total > 0.0 {
                (sd * disk.dlnrho_dlnr(r) + sb * bulge.dlnrho_dlnr(r)) / total
            } else {
                disk.dlnrho_dlnr(r)
            }
        }))
    }

    fn disk_reference(&self) -> Option<(f64, f64)> {
        Some((self.params.value(R_EFF_DISK), self.params.value(N_DISK)))
    }

    fn clone_box(&self) -> Box<dyn MassProfile> {
        Box::new(self.clone())
    }
}

/// [`DiskBulge`] with the total mass in Msun rather than `log10`
#[derive(Debug, Clone)]
pub struct LinearDiskBulge(DiskBulge);

impl LinearDiskBulge {
    pub fn new(total_mass: f64, r_eff_disk: f64, n_disk: f64, r_eff_bulge: f64, n_bulge: f64, bt: f64) -> Self {
        Self(DiskBulge::with_scale(
            total_mass,
            r_eff_disk,
            n_disk,
            r_eff_bulge,
            n_bulge,
            bt,
            MassScale::Linear,
        ))
    }

    pub fn with_light_component(self, light_component: LightComponent) -> Self {
        Self(self.0.with_light_component(light_component))
    }

    pub fn with_subtype(self, subtype: MassSubtype) -> Self {
        Self(self.0.with_subtype(subtype))
    }

    pub fn inner(&self) -> &DiskBulge {
        &self.0
    }
}

forward_mass_profile!(LinearDiskBulge, "LinearDiskBulge");
