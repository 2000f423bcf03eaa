use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    UnknownSpecies(String),        // name does not appear in any clause
    UnknownParameter(String),      // rate law references an undeclared parameter
    DuplicateParameter(String),    // same name declared twice on the builder
    EmptyNetwork,                  // build() with zero reaction clauses
    InvalidRate { reaction: usize, value: f64 },   // rate law produced a negative or non-finite value
    ParameterCount { found: usize, expected: usize },
    StateLength { found: usize, expected: usize },
    NegativeInitial { species: String, value: i64 },
    InvalidCheckpoints(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownSpecies(name) => {
                write!(f, "Unknown species '{}'", name)
            }
            ModelError::UnknownParameter(name) => {
                write!(f, "Unknown parameter '{}' (declare it on the builder)", name)
            }
            ModelError::DuplicateParameter(name) => {
                write!(f, "Parameter '{}' declared more than once", name)
            }
            ModelError::EmptyNetwork => {
                write!(f, "A reaction network needs at least one reaction")
            }
            ModelError::InvalidRate { reaction, value } => {
                write!(f, "Rate law of reaction {} evaluated to {}", reaction, value)
            }
            ModelError::ParameterCount { found, expected } => {
                write!(f, "Got {} parameter values, the network declares {}", found, expected)
            }
            ModelError::StateLength { found, expected } => {
                write!(f, "State vector has {} entries, the network has {} species", found, expected)
            }
            ModelError::NegativeInitial { species, value } => {
                write!(f, "Initial count {} for species '{}' is negative", value, species)
            }
            ModelError::InvalidCheckpoints(reason) => {
                write!(f, "Invalid checkpoint times: {}", reason)
            }
        }
    }
}

impl std::error::Error for ModelError {}
