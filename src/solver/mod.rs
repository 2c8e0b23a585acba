//! Spring solver - advances one chain by one simulated step

pub mod limits;
pub mod spring;

pub use spring::{step_chain, StepParams};
