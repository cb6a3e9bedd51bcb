//! Mass profiles: Sersic family, exponential disk, black hole and dark matter halos.

use serde::{Deserialize, Serialize};

pub mod black_hole;
pub mod disk_bulge;
pub mod exp_disk;
pub mod halos;
pub mod noordermeer;
pub mod sersic;

pub use black_hole::BlackHole;
pub use disk_bulge::{DiskBulge, LightComponent, LinearDiskBulge};
pub use exp_disk::ExpDisk;
pub use halos::{mvirial_from_fdm, Burkert, DarkMatterHalo, DekelZhao, Einasto, LinearNfw, Nfw, TwoPowerHalo};
pub use noordermeer::{apply_noord_flat, InMemoryNoordermeerTables, NoordermeerTables, RotationCurveTable};
pub use sersic::{sersic_menc, sersic_mr, Sersic};

/// How a mass parameter is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassScale {
    /// `log10(M / Msun)`
    #[default]
    Log10,
    /// `M / Msun`
    Linear,
}

impl MassScale {
    pub fn to_msun(self, value: f64) -> f64 {
        match self {
            MassScale::Log10 => 10f64.powf(value),
            MassScale::Linear => value,
        }
    }

    pub fn to_log10(self, value: f64) -> f64 {
        match self {
            MassScale::Log10 => value,
            MassScale::Linear => value.log10(),
        }
    }

    pub fn from_log10(self, log_mass: f64) -> f64 {
        match self {
            MassScale::Log10 => log_mass,
            MassScale::Linear => 10f64.powf(log_mass),
        }
    }
}

/// Implements the component traits of a newtype wrapper by forwarding to the
/// wrapped profile, only overriding the type name.
macro_rules! forward_mass_profile {
    ($wrapper:ident, $name:literal) => {
        impl $crate::models::Parameterized for $wrapper {
            fn parameters(&self) -> &$crate::parameters::ParameterStore {
                $crate::models::Parameterized::parameters(&self.0)
            }

            fn parameters_mut(&mut self) -> &mut $crate::parameters::ParameterStore {
                $crate::models::Parameterized::parameters_mut(&mut self.0)
            }
        }

        impl $crate::models::MassProfile for $wrapper {
            fn type_name(&self) -> &'static str {
                $name
            }

            fn subtype(&self) -> $crate::models::MassSubtype {
                $crate::models::MassProfile::subtype(&self.0)
            }

            fn enclosed_mass(&self, r: &ndarray::Array1<f64>) -> ndarray::Array1<f64> {
                $crate::models::MassProfile::enclosed_mass(&self.0, r)
            }

            fn circular_velocity(&self, r: &ndarray::Array1<f64>) -> $crate::error::Result<ndarray::Array1<f64>> {
                $crate::models::MassProfile::circular_velocity(&self.0, r)
            }

            fn light_profile(&self, r: &ndarray::Array1<f64>) -> Option<ndarray::Array1<f64>> {
                $crate::models::MassProfile::light_profile(&self.0, r)
            }

            fn dlnrho_dlnr(&self, r: &ndarray::Array1<f64>) -> Option<ndarray::Array1<f64>> {
                $crate::models::MassProfile::dlnrho_dlnr(&self.0, r)
            }

            fn disk_reference(&self) -> Option<(f64, f64)> {
                $crate::models::MassProfile::disk_reference(&self.0)
            }

            fn as_halo(&self) -> Option<&dyn $crate::models::mass::DarkMatterHalo> {
                $crate::models::MassProfile::as_halo(&self.0)
            }

            fn clone_box(&self) -> Box<dyn $crate::models::MassProfile> {
                Box::new(self.clone())
            }
        }
    };
}

pub(crate) use forward_mass_profile;
