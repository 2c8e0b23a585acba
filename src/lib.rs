//! Tiered Dynamic Bones - spring-bone secondary motion with device-tier budgets

pub mod chain;
pub mod collision;
pub mod core;
pub mod culling;
pub mod scheduler;
pub mod simulation;
pub mod skeleton;
pub mod solver;
pub mod tier;
