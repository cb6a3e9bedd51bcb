//! Cube simulation and the galaxy layer

mod cube_tests;
mod galaxy_tests;
