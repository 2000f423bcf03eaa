//! # wellmixed
//!
//! Unified API for simulating well-mixed chemical reaction networks.
//!
//! This crate re-exports the main functionality from its submodules.

pub mod system_parsers;
pub mod simulation_parsers;

pub mod network {
    pub use ::wm_network::*;
}

pub mod kinetics {
    pub use ::wm_kinetics::*;
}
