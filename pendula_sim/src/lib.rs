// pendula_sim/src/lib.rs

//! Offline harness around `pendula_core`: scenario configuration, a
//! reference-trajectory generator, a noisy sensor, the estimation run loop
//! and history export.

// This prelude is for convenience for other files WITHIN the pendula_sim crate.
pub mod prelude;

pub mod cli;
pub mod error;
pub mod simulation;

pub use error::SimError;
