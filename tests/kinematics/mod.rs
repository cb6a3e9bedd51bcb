//! Mass models, the model set and kinematic corrections

mod halo_tests;
mod model_set_tests;
mod pressure_support_tests;
