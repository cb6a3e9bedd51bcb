//! # galkin-rs
//!
//! `galkin-rs` is a forward model for the kinematics of disk galaxies. It
//! builds a parameterized model of a galaxy and projects it into a simulated
//! spectral data cube that can be compared with integral-field observations.
//!
//! The library provides:
//! - Mass components (Sérsic, disk+bulge, exponential disk, black hole and dark
//!   matter halos) with enclosed mass and circular velocity
//! - Geometry, dispersion, z-height and light profiles, biconical outflows,
//!   radial flows and dust extinction
//! - A [`ModelSet`] registry with free, fixed and tied parameters and priors
//! - Adiabatic contraction and pressure-support (asymmetric drift) corrections
//! - Cube simulation on an oversampled sky grid with a parallel line-population
//!   kernel
//! - A [`Galaxy`] layer that rebins, convolves and scores model data
//!
//! ## Basic Usage
//!
//! ```
//! use galkin_rs::cube::{SimulationConfig, SpectralAxis};
//! use galkin_rs::model_set::{ComponentOptions, ModelSet};
//! use galkin_rs::models::{DispersionConst, Geometry, Sersic, ZHeightGauss};
//!
//! let mut model = ModelSet::new();
//! model
//!     .add_component_with("disk", Sersic::new(10.5, 4.0, 1.0), ComponentOptions::light())
//!     .unwrap();
//! model.add_component("geom", Geometry::new(60.0, 30.0)).unwrap();
//! model.add_component("disp", DispersionConst::new(40.0)).unwrap();
//! model.add_component("zheight", ZHeightGauss::new(0.8)).unwrap();
//!
//! let config = SimulationConfig {
//!     nx_sky: 11,
//!     ny_sky: 11,
//!     spectral: SpectralAxis { start: -300.0, step: 30.0, nspec: 21, ..SpectralAxis::default() },
//!     ..SimulationConfig::default()
//! };
//! let cube = model.simulate_cube(&config).unwrap();
//! assert_eq!(cube.cube.dim(), (21, 11, 11));
//! ```

pub mod constants;
pub mod cosmology;
pub mod cube;
pub mod error;
pub mod galaxy;
pub mod kinematics;
pub mod model_set;
pub mod models;
pub mod parameters;
pub mod utils;

// Re-exports for convenience
pub use cosmology::FlatLambdaCdm;
pub use cube::{SimulatedCube, SimulationConfig, SpectralAxis};
pub use error::{GalkinError, Result};
pub use galaxy::{Convolver, Galaxy, ModelData, ObservedData};
pub use kinematics::{KinematicOptions, PressureSupportType};
pub use model_set::{ComponentOptions, ModelSet};
pub use parameters::{Bounds, Parameter, Prior, Tie};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
