pub mod trajectory;
pub mod ensemble;

mod error;
mod ssa;
mod tau_leap;
mod ode;

pub use ensemble::*;
pub use error::*;
pub use ssa::*;
pub use tau_leap::*;
pub use ode::*;
pub use trajectory::{Trajectory, validate_checkpoints};
