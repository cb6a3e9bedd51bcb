//! Physical constants (CODATA 2018 / IAU 2015 values).

/// Newtonian constant of gravitation [cm^3 g^-1 s^-2]
pub const G_CGS: f64 = 6.6743e-8;

/// Solar mass [g]
pub const MSUN_G: f64 = 1.988_409_870_698_051e33;

/// Parsec [cm]
pub const PC_CM: f64 = 3.085_677_581_491_367_3e18;

/// G in pc Msun^-1 (km/s)^2
pub const G_PC_MSUN_KMS2: f64 = G_CGS * MSUN_G / PC_CM / 1.0e10;

/// Speed of light [km/s]
pub const C_KMS: f64 = 299_792.458;

/// Arcseconds per radian
pub const ARCSEC_PER_RAD: f64 = 206_264.806_247_096_36;

/// Megaparsec [km]
pub const MPC_KM: f64 = PC_CM * 1.0e6 / 1.0e5;

/// Ratio of the effective radius to the scale length of an exponential disk
pub const RE_TO_RD_EXP: f64 = 1.678_346_990_016_661_2;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gravitational_constant_units() {
        assert_relative_eq!(G_PC_MSUN_KMS2, 4.30091e-3, max_relative = 1e-5);
    }
}
