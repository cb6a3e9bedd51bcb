//! Flat Lambda-CDM cosmology.
//!
//! Only what the kinematic model needs: the Hubble parameter (for halo virial
//! radii) and the angular scale at a redshift (for converting pixels to kpc).

use serde::{Deserialize, Serialize};

use crate::constants::{ARCSEC_PER_RAD, C_KMS, G_PC_MSUN_KMS2};

/// Flat Lambda-CDM model without radiation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatLambdaCdm {
    /// Hubble constant at z=0 [km/s/Mpc]
    pub h0: f64,

    /// Matter density parameter at z=0
    pub om0: f64,
}

impl Default for FlatLambdaCdm {
    fn default() -> Self {
        Self { h0: 70.0, om0: 0.3 }
    }
}

impl FlatLambdaCdm {
    pub fn new(h0: f64, om0: f64) -> Self {
        Self { h0, om0 }
    }

    /// Dimensionless expansion rate E(z) = H(z)/H0
    pub fn efunc(&self, z: f64) -> f64 {
        (self.om0 * (1.0 + z).powi(3) + (1.0 - self.om0)).sqrt()
    }

    /// Hubble parameter H(z) [km/s/Mpc]
    pub fn hubble(&self, z: f64) -> f64 {
        self.h0 * self.efunc(z)
    }

    /// Comoving distance [Mpc], integrated with composite Simpson's rule
    pub fn comoving_distance(&self, z: f64) -> f64 {
        if z <= 0.0 {
            return 0.0;
        }
        let n = 512;
        let h = z / n as f64;
        let mut sum = 1.0 / self.efunc(0.0) + 1.0 / self.efunc(z);
        for i in 1..n {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight / self.efunc(i as f64 * h);
        }
        C_KMS / self.h0 * sum * h / 3.0
    }

    /// Angular diameter distance [Mpc]
    pub fn angular_diameter_distance(&self, z: f64) -> f64 {
        self.comoving_distance(z) / (1.0 + z)
    }

    /// Proper angular scale [arcsec/kpc]
    pub fn arcsec_per_kpc_proper(&self, z: f64) -> f64 {
        ARCSEC_PER_RAD / (self.angular_diameter_distance(z) * 1.0e3)
    }

    /// Virial radius [kpc] of a halo of mass `10^log_mvir` Msun, defined by
    /// `Mvir = 100 H(z)^2 Rvir^3 / G`
    pub fn virial_radius(&self, log_mvir: f64, z: f64) -> f64 {
        let hz = self.hubble(z);
        (10f64.powf(log_mvir) * (G_PC_MSUN_KMS2 * 1e-3) / (10.0 * hz * 1e-3).powi(2)).cbrt()
    }
}
