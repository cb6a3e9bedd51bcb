//! Parameter system tests

mod expression_tests;
mod parameter_tests;
