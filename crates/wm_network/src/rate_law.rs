use std::fmt;
use std::sync::Arc;

/// A custom rate-law function. The first slice holds the referenced
/// species quantities (counts cast to reals for stochastic callers,
/// concentrations for deterministic ones) in the order they were
/// listed, the second slice the referenced parameter values. Must
/// return a non-negative rate, and 0 whenever its inputs are
/// exhausted if the model requires that.
pub type RateFn = Arc<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>;

/// The kinetics of one reaction clause, with symbols referenced by
/// name. Resolved to table indices by `NetworkBuilder::build`.
#[derive(Clone)]
pub enum RateLaw {
    /// Law of mass action with the named rate-constant parameter.
    MassAction { rate: String },
    /// User-supplied kinetics over the named species and parameters.
    Custom {
        name: String,
        species: Vec<String>,
        parameters: Vec<String>,
        f: RateFn,
    },
}

impl RateLaw {
    pub fn mass_action(rate: &str) -> Self {
        RateLaw::MassAction { rate: rate.to_string() }
    }

    pub fn custom<F>(name: &str, species: &[&str], parameters: &[&str], f: F) -> Self
    where
        F: Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    {
        RateLaw::Custom {
            name: name.to_string(),
            species: species.iter().map(|s| s.to_string()).collect(),
            parameters: parameters.iter().map(|s| s.to_string()).collect(),
            f: Arc::new(f),
        }
    }

    /// Hill-type repression of the given species:
    /// `vmax * K^n / (K^n + x^n)`. Full rate at zero copies of the
    /// repressor, half rate at `x == K`.
    pub fn hill_repression(species: &str, vmax: &str, k_half: &str, n: &str) -> Self {
        Self::custom("hill_repression", &[species], &[vmax, k_half, n], |s, p| {
            let x = s[0].max(0.0);
            let (vmax, k_half, n) = (p[0], p[1], p[2]);
            let kn = k_half.powf(n);
            let denom = kn + x.powf(n);
            if denom == 0.0 { 0.0 } else { vmax * kn / denom }
        })
    }
}

impl fmt::Debug for RateLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLaw::MassAction { rate } => {
                f.debug_struct("MassAction").field("rate", rate).finish()
            }
            RateLaw::Custom { name, species, parameters, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("species", species)
                .field("parameters", parameters)
                .finish(),
        }
    }
}
