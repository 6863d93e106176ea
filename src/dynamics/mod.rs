//! Spring smoothing for procedural offsets.

mod spring;

pub use spring::{SecondOrderDynamics, SpringParams, SpringPreset};
