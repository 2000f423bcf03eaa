use std::fmt;

use wm_network::ModelError;

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Malformed model surfaced at simulation time (lazy rate-law
    /// validation, parameter/state shape mismatches, bad checkpoints).
    Model(ModelError),
    /// A state update would drive a species count negative. In the
    /// exact simulator this indicates a propensity bug; in tau-leaping
    /// it means the step size is too large. Fatal for this run either
    /// way; retrying with a smaller step is the caller's policy.
    NegativeCount { species: String, time: f64 },
    /// Tau-leaping step that is not a positive finite number.
    InvalidStep(f64),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Model(e) => write!(f, "Model error: {}", e),
            SimulationError::NegativeCount { species, time } => write!(
                f,
                "Species '{}' driven negative at t = {}",
                species, time
            ),
            SimulationError::InvalidStep(dt) => {
                write!(f, "Tau-leaping step must be positive and finite, got {}", dt)
            }
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ModelError> for SimulationError {
    fn from(e: ModelError) -> Self {
        Self::Model(e)
    }
}
