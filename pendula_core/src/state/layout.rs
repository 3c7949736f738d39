// pendula_core/src/state/layout.rs
use crate::state::{Link, StateVariable};

/// Dimension of the double-pendulum state vector.
pub const DOUBLE_PENDULUM_STATE_DIM: usize = 4;

/// Dimension of the single-pendulum state vector.
pub const SINGLE_PENDULUM_STATE_DIM: usize = 2;

/// Returns the double-pendulum layout `[θ1, θ1̇, θ2, θ2̇]`.
///
/// Each angle is immediately followed by its rate, so the observed angles
/// sit at indices 0 and 2.
pub fn double_pendulum_layout() -> Vec<StateVariable> {
    vec![
        StateVariable::Angle(Link::First),
        StateVariable::AngularRate(Link::First),
        StateVariable::Angle(Link::Second),
        StateVariable::AngularRate(Link::Second),
    ]
}

/// Returns the single-pendulum layout `[θ, θ̇]`.
pub fn single_pendulum_layout() -> Vec<StateVariable> {
    vec![
        StateVariable::Angle(Link::First),
        StateVariable::AngularRate(Link::First),
    ]
}
