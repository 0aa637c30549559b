//! Linear structural dynamics solvers for `M*a + C*v + K*u = f(t)`.
//!
//! [`trapezoidal`] advances the equations of motion in time with the
//! constant-average-acceleration rule, [`modal`] computes steady-state
//! harmonic response in a truncated modal basis.

pub mod modal;
pub mod trapezoidal;

pub use modal::{
    sweep, sweep_parallel, sweep_sequential, FrequencyResponse, FrequencyUnit, ModalBasis,
    ReducedSystem,
};
pub use trapezoidal::{integrate, Sample, State, TimeSeries, TrapezoidalSolver};
