use std::fmt;

use crate::rate_law::{RateFn, RateLaw};
use crate::{ParameterId, SpeciesId};

/// Builder input: one reaction with name-based stoichiometry and rate
/// law. Coefficients are unsigned, so a negative stoichiometric
/// coefficient is unrepresentable.
#[derive(Debug, Clone)]
pub struct ReactionClause {
    pub reactants: Vec<(String, u32)>,
    pub products: Vec<(String, u32)>,
    pub rate: RateLaw,
}

impl ReactionClause {
    pub fn new(reactants: &[(&str, u32)], products: &[(&str, u32)], rate: RateLaw) -> Self {
        Self {
            reactants: reactants.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            products: products.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
            rate,
        }
    }

    /// Mass-action shorthand, `reactants --k--> products`.
    pub fn mass_action(reactants: &[(&str, u32)], products: &[(&str, u32)], rate: &str) -> Self {
        Self::new(reactants, products, RateLaw::mass_action(rate))
    }
}

/// Rate law with symbol names resolved to table indices.
#[derive(Clone)]
pub(crate) enum CompiledRate {
    MassAction { rate: ParameterId },
    Custom {
        name: String,
        species: Vec<SpeciesId>,
        parameters: Vec<ParameterId>,
        f: RateFn,
    },
}

/// One compiled reaction: resolved stoichiometry plus the sparse net
/// change applied when it fires.
#[derive(Clone)]
pub struct Reaction {
    pub(crate) reactants: Vec<(SpeciesId, u32)>,
    pub(crate) products: Vec<(SpeciesId, u32)>,
    /// Products minus reactants, one entry per affected species.
    pub(crate) net: Vec<(SpeciesId, i64)>,
    pub(crate) rate: CompiledRate,
}

impl Reaction {
    pub fn reactants(&self) -> &[(SpeciesId, u32)] {
        &self.reactants
    }

    pub fn products(&self) -> &[(SpeciesId, u32)] {
        &self.products
    }

    /// Sparse net stoichiometric change (zero entries omitted).
    pub fn net_change(&self) -> &[(SpeciesId, i64)] {
        &self.net
    }

    /// Discrete stochastic propensity at the given species counts.
    ///
    /// Mass action uses the combinatorial form `k * prod C(n_i, c_i)`,
    /// which is exactly 0 whenever any reactant count is below its
    /// coefficient. Custom laws are called as supplied, with counts
    /// cast to reals; no combinatorial correction is applied.
    pub fn propensity(&self, counts: &[i64], params: &[f64]) -> f64 {
        match &self.rate {
            CompiledRate::MassAction { rate } => {
                let mut a = params[*rate];
                for &(species, coeff) in &self.reactants {
                    a *= binomial(counts[species], coeff);
                    if a == 0.0 {
                        return 0.0;
                    }
                }
                a
            }
            CompiledRate::Custom { species, parameters, f, .. } => {
                let s: Vec<f64> = species.iter().map(|&i| counts[i] as f64).collect();
                let p: Vec<f64> = parameters.iter().map(|&i| params[i]).collect();
                f(&s, &p)
            }
        }
    }

    /// Continuous mass-action rate at the given concentrations,
    /// `k * prod x_i^c_i` (power law, no combinatorial correction).
    /// Custom laws evaluate exactly as in the stochastic form.
    pub fn rate(&self, conc: &[f64], params: &[f64]) -> f64 {
        match &self.rate {
            CompiledRate::MassAction { rate } => {
                let mut a = params[*rate];
                for &(species, coeff) in &self.reactants {
                    a *= conc[species].powi(coeff as i32);
                }
                a
            }
            CompiledRate::Custom { species, parameters, f, .. } => {
                let s: Vec<f64> = species.iter().map(|&i| conc[i]).collect();
                let p: Vec<f64> = parameters.iter().map(|&i| params[i]).collect();
                f(&s, &p)
            }
        }
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rate = match &self.rate {
            CompiledRate::MassAction { rate } => format!("mass_action(p{})", rate),
            CompiledRate::Custom { name, .. } => name.clone(),
        };
        f.debug_struct("Reaction")
            .field("reactants", &self.reactants)
            .field("products", &self.products)
            .field("net", &self.net)
            .field("rate", &rate)
            .finish()
    }
}

/// Number of distinct ways to pick `c` molecules out of `n`.
/// Returns 0 for `n < c`, 1 for `c == 0`.
fn binomial(n: i64, c: u32) -> f64 {
    if n < c as i64 {
        return 0.0;
    }
    let mut acc = 1.0;
    for i in 0..c as i64 {
        acc *= (n - i) as f64;
    }
    for i in 2..=c as i64 {
        acc /= i as f64;
    }
    acc
}
