// pendula_core/src/utils/mod.rs

pub mod integrators;
pub mod jacobian;
pub mod matrix;
