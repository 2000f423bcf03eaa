use std::collections::HashMap;

use crate::error::ModelError;
use crate::rate_law::RateLaw;
use crate::reaction::{CompiledRate, Reaction, ReactionClause};
use crate::{ParameterId, SpeciesId};

/// An immutable, validated reaction network. Shared read-only by all
/// simulators; simulation state lives with the simulators, never here.
#[derive(Debug)]
pub struct ReactionNetwork {
    species: Vec<String>,
    parameters: Vec<String>,
    reactions: Vec<Reaction>,
}

impl ReactionNetwork {
    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::new()
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn n_parameters(&self) -> usize {
        self.parameters.len()
    }

    pub fn n_reactions(&self) -> usize {
        self.reactions.len()
    }

    /// Species names in index order (first appearance across clauses).
    pub fn species_names(&self) -> &[String] {
        &self.species
    }

    /// Parameter names in index order (declaration order).
    pub fn parameter_names(&self) -> &[String] {
        &self.parameters
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn species_index(&self, name: &str) -> Result<SpeciesId, ModelError> {
        self.species
            .iter()
            .position(|s| s == name)
            .ok_or_else(|| ModelError::UnknownSpecies(name.to_string()))
    }

    pub fn parameter_index(&self, name: &str) -> Result<ParameterId, ModelError> {
        self.parameters
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| ModelError::UnknownParameter(name.to_string()))
    }

    /// Sparse net stoichiometric change of reaction `r`.
    pub fn net_change(&self, r: usize) -> &[(SpeciesId, i64)] {
        self.reactions[r].net_change()
    }

    /// Discrete stochastic propensity of reaction `r`; see
    /// [`Reaction::propensity`].
    pub fn propensity(&self, r: usize, counts: &[i64], params: &[f64]) -> f64 {
        self.reactions[r].propensity(counts, params)
    }

    /// Continuous mass-action rate of reaction `r`; see
    /// [`Reaction::rate`].
    pub fn rate(&self, r: usize, conc: &[f64], params: &[f64]) -> f64 {
        self.reactions[r].rate(conc, params)
    }

    /// Check a parameter vector supplied at solve time.
    pub fn check_parameters(&self, params: &[f64]) -> Result<(), ModelError> {
        if params.len() != self.parameters.len() {
            return Err(ModelError::ParameterCount {
                found: params.len(),
                expected: self.parameters.len(),
            });
        }
        Ok(())
    }

    /// Check a state vector supplied at solve time.
    pub fn check_state_len(&self, len: usize) -> Result<(), ModelError> {
        if len != self.species.len() {
            return Err(ModelError::StateLength { found: len, expected: self.species.len() });
        }
        Ok(())
    }

    /// Dense initial count vector from name/value pairs; species not
    /// listed start at zero.
    pub fn initial_counts(&self, counts: &[(&str, i64)]) -> Result<Vec<i64>, ModelError> {
        let mut state = vec![0i64; self.species.len()];
        for &(name, value) in counts {
            if value < 0 {
                return Err(ModelError::NegativeInitial {
                    species: name.to_string(),
                    value,
                });
            }
            state[self.species_index(name)?] = value;
        }
        Ok(state)
    }

    /// Dense initial concentration vector from name/value pairs.
    pub fn initial_concentrations(&self, conc: &[(&str, f64)]) -> Result<Vec<f64>, ModelError> {
        let mut state = vec![0.0; self.species.len()];
        for &(name, value) in conc {
            state[self.species_index(name)?] = value;
        }
        Ok(state)
    }

    /// Dense parameter vector from name/value pairs. Every declared
    /// parameter must be supplied.
    pub fn parameter_values(&self, values: &[(&str, f64)]) -> Result<Vec<f64>, ModelError> {
        if values.len() != self.parameters.len() {
            return Err(ModelError::ParameterCount {
                found: values.len(),
                expected: self.parameters.len(),
            });
        }
        let mut params = vec![0.0; self.parameters.len()];
        for &(name, value) in values {
            params[self.parameter_index(name)?] = value;
        }
        Ok(params)
    }
}

/// Collects parameter declarations and reaction clauses, then compiles
/// and validates them in one pass. Species are discovered by first
/// appearance (reactants, products, then rate-law references, clause
/// by clause); parameters must be declared up front.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    parameters: Vec<String>,
    clauses: Vec<ReactionClause>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one parameter. Declaration order fixes its index.
    pub fn parameter(mut self, name: &str) -> Self {
        self.parameters.push(name.to_string());
        self
    }

    pub fn parameters(mut self, names: &[&str]) -> Self {
        for name in names {
            self.parameters.push(name.to_string());
        }
        self
    }

    pub fn reaction(mut self, clause: ReactionClause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn build(self) -> Result<ReactionNetwork, ModelError> {
        if self.clauses.is_empty() {
            return Err(ModelError::EmptyNetwork);
        }
        for (i, name) in self.parameters.iter().enumerate() {
            if self.parameters[..i].contains(name) {
                return Err(ModelError::DuplicateParameter(name.clone()));
            }
        }

        let mut species: Vec<String> = Vec::new();
        let mut index: HashMap<String, SpeciesId> = HashMap::new();
        let mut intern = |name: &str, species: &mut Vec<String>| -> SpeciesId {
            if let Some(&i) = index.get(name) {
                return i;
            }
            let i = species.len();
            species.push(name.to_string());
            index.insert(name.to_string(), i);
            i
        };
        let param_index = |name: &str| -> Result<ParameterId, ModelError> {
            self.parameters
                .iter()
                .position(|p| p == name)
                .ok_or_else(|| ModelError::UnknownParameter(name.to_string()))
        };

        let mut reactions = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            let reactants: Vec<(SpeciesId, u32)> = clause
                .reactants
                .iter()
                .map(|(name, coeff)| (intern(name, &mut species), *coeff))
                .collect();
            let products: Vec<(SpeciesId, u32)> = clause
                .products
                .iter()
                .map(|(name, coeff)| (intern(name, &mut species), *coeff))
                .collect();

            let rate = match &clause.rate {
                RateLaw::MassAction { rate } => CompiledRate::MassAction {
                    rate: param_index(rate)?,
                },
                RateLaw::Custom { name, species: srefs, parameters: prefs, f } => {
                    CompiledRate::Custom {
                        name: name.clone(),
                        species: srefs.iter().map(|s| intern(s, &mut species)).collect(),
                        parameters: prefs
                            .iter()
                            .map(|p| param_index(p))
                            .collect::<Result<_, _>>()?,
                        f: f.clone(),
                    }
                }
            };

            // Net change: products minus reactants, zero rows dropped.
            let mut net: Vec<(SpeciesId, i64)> = Vec::new();
            let mut bump = |s: SpeciesId, delta: i64, net: &mut Vec<(SpeciesId, i64)>| {
                if let Some(entry) = net.iter_mut().find(|(i, _)| *i == s) {
                    entry.1 += delta;
                } else {
                    net.push((s, delta));
                }
            };
            for &(s, c) in &reactants {
                bump(s, -(c as i64), &mut net);
            }
            for &(s, c) in &products {
                bump(s, c as i64, &mut net);
            }
            net.retain(|&(_, delta)| delta != 0);

            reactions.push(Reaction { reactants, products, net, rate });
        }

        Ok(ReactionNetwork {
            species,
            parameters: self.parameters,
            reactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn birth_death() -> ReactionNetwork {
        NetworkBuilder::new()
            .parameters(&["b", "d"])
            .reaction(ReactionClause::mass_action(&[], &[("S", 1)], "b"))
            .reaction(ReactionClause::mass_action(&[("S", 1)], &[], "d"))
            .build()
            .unwrap()
    }

    #[test]
    fn species_first_appearance_order() {
        let net = NetworkBuilder::new()
            .parameters(&["k1", "k2"])
            .reaction(ReactionClause::mass_action(&[("B", 1)], &[("A", 1)], "k1"))
            .reaction(ReactionClause::mass_action(&[("A", 1), ("C", 1)], &[("B", 2)], "k2"))
            .build()
            .unwrap();
        assert_eq!(net.species_names(), &["B", "A", "C"]);
        assert_eq!(net.species_index("C").unwrap(), 2);
        assert!(matches!(
            net.species_index("D"),
            Err(ModelError::UnknownSpecies(_))
        ));
    }

    #[test]
    fn parameters_keep_declaration_order() {
        let net = birth_death();
        assert_eq!(net.parameter_names(), &["b", "d"]);
        assert_eq!(net.parameter_index("d").unwrap(), 1);
    }

    #[test]
    fn undeclared_parameter_fails_eagerly() {
        let err = NetworkBuilder::new()
            .parameter("b")
            .reaction(ReactionClause::mass_action(&[], &[("S", 1)], "missing"))
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::UnknownParameter("missing".into()));
    }

    #[test]
    fn duplicate_parameter_fails() {
        let err = NetworkBuilder::new()
            .parameters(&["b", "b"])
            .reaction(ReactionClause::mass_action(&[], &[("S", 1)], "b"))
            .build()
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicateParameter("b".into()));
    }

    #[test]
    fn empty_network_fails() {
        assert_eq!(
            NetworkBuilder::new().build().unwrap_err(),
            ModelError::EmptyNetwork
        );
    }

    #[test]
    fn net_change_is_products_minus_reactants() {
        let net = NetworkBuilder::new()
            .parameter("k")
            // Catalytic production: the catalyst cancels out of the net change.
            .reaction(ReactionClause::mass_action(
                &[("E", 1), ("S", 1)],
                &[("E", 1), ("P", 1)],
                "k",
            ))
            .build()
            .unwrap();
        let s = net.species_index("S").unwrap();
        let p = net.species_index("P").unwrap();
        let mut net_change = net.net_change(0).to_vec();
        net_change.sort();
        assert_eq!(net_change, vec![(s, -1), (p, 1)]);
    }

    #[test]
    fn mass_action_propensity_is_combinatorial() {
        let net = NetworkBuilder::new()
            .parameter("k")
            .reaction(ReactionClause::mass_action(&[("A", 2)], &[], "k"))
            .build()
            .unwrap();
        // C(5, 2) = 10 pairs.
        assert_eq!(net.propensity(0, &[5], &[0.5]), 5.0);
        // Below the needed coefficient the propensity is exactly zero.
        assert_eq!(net.propensity(0, &[1], &[0.5]), 0.0);
        assert_eq!(net.propensity(0, &[0], &[0.5]), 0.0);
    }

    #[test]
    fn continuous_rate_is_power_law() {
        let net = NetworkBuilder::new()
            .parameter("k")
            .reaction(ReactionClause::mass_action(&[("A", 2)], &[], "k"))
            .build()
            .unwrap();
        assert!((net.rate(0, &[5.0], &[0.5]) - 0.5 * 25.0).abs() < 1e-12);
    }

    #[test]
    fn propensity_never_negative_on_reachable_states() {
        let net = birth_death();
        let params = [10.0, 0.1];
        for n in 0..200 {
            for r in 0..net.n_reactions() {
                assert!(net.propensity(r, &[n], &params) >= 0.0);
            }
        }
    }

    #[test]
    fn custom_law_sees_referenced_species_only() {
        let net = NetworkBuilder::new()
            .parameters(&["vmax", "K", "n"])
            .reaction(ReactionClause::new(
                &[],
                &[("mRNA", 1)],
                RateLaw::hill_repression("P", "vmax", "K", "n"),
            ))
            .reaction(ReactionClause::mass_action(&[("P", 1)], &[], "vmax"))
            .build()
            .unwrap();
        // "P" was first seen in the rate law of the first clause.
        assert_eq!(net.species_names(), &["mRNA", "P"]);
        let params = [200.0, 50.0, 2.0];
        assert_eq!(net.propensity(0, &[0, 0], &params), 200.0);
        let half = net.propensity(0, &[0, 50], &params);
        assert!((half - 100.0).abs() < 1e-9);
    }

    #[test]
    fn initial_vectors_and_checks() {
        let net = birth_death();
        assert_eq!(net.initial_counts(&[("S", 7)]).unwrap(), vec![7]);
        assert!(matches!(
            net.initial_counts(&[("X", 1)]),
            Err(ModelError::UnknownSpecies(_))
        ));
        assert!(matches!(
            net.initial_counts(&[("S", -1)]),
            Err(ModelError::NegativeInitial { .. })
        ));
        assert!(matches!(
            net.check_parameters(&[1.0]),
            Err(ModelError::ParameterCount { found: 1, expected: 2 })
        ));
        assert!(net.check_parameters(&[1.0, 2.0]).is_ok());
        assert_eq!(
            net.parameter_values(&[("d", 0.1), ("b", 10.0)]).unwrap(),
            vec![10.0, 0.1]
        );
    }
}
