use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, stdin};
use std::path::Path;

use anyhow::{Context, Result};
use paste::paste;
use serde::Deserialize;

use wm_network::{NetworkBuilder, RateLaw, ReactionClause, ReactionNetwork};

// ============================================================
//  JSON system format
// ============================================================

/// Rate law of one reaction in a system file.
///
/// ```json
/// { "mass_action": "k_bind" }
/// { "hill_repression": { "species": "P", "vmax": "v", "k": "K", "n": "n" } }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RateSpec {
    MassAction(String),
    HillRepression { species: String, vmax: String, k: String, n: String },
}

#[derive(Debug, Deserialize)]
struct ReactionSpec {
    #[serde(default)]
    reactants: Vec<(String, u32)>,
    #[serde(default)]
    products: Vec<(String, u32)>,
    rate: RateSpec,
}

#[derive(Debug, Deserialize)]
struct ParameterSpec {
    name: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct SystemFile {
    parameters: Vec<ParameterSpec>,
    reactions: Vec<ReactionSpec>,
    #[serde(default)]
    initial: Vec<(String, i64)>,
}

/// A parsed system file: the network plus the parameter values and
/// initial counts that go with it. Species missing from `initial`
/// start at zero.
#[derive(Debug)]
pub struct ChemicalSystem {
    pub network: ReactionNetwork,
    pub params: Vec<f64>,
    pub initial: Vec<i64>,
}

impl ChemicalSystem {
    /// Initial counts reinterpreted as real-valued concentrations.
    pub fn initial_concentrations(&self) -> Vec<f64> {
        self.initial.iter().map(|&c| c as f64).collect()
    }
}

fn as_str_pairs(pairs: &[(String, u32)]) -> Vec<(&str, u32)> {
    pairs.iter().map(|(name, coeff)| (name.as_str(), *coeff)).collect()
}

/// Read a JSON system description into a validated [`ChemicalSystem`].
pub fn read_system<R: BufRead>(reader: R) -> Result<ChemicalSystem> {
    let file: SystemFile = serde_json::from_reader(reader).context("Malformed system file")?;

    let mut builder = NetworkBuilder::new();
    for param in &file.parameters {
        builder = builder.parameter(&param.name);
    }
    for spec in &file.reactions {
        let rate = match &spec.rate {
            RateSpec::MassAction(param) => RateLaw::mass_action(param),
            RateSpec::HillRepression { species, vmax, k, n } => {
                RateLaw::hill_repression(species, vmax, k, n)
            }
        };
        builder = builder.reaction(ReactionClause::new(
            &as_str_pairs(&spec.reactants),
            &as_str_pairs(&spec.products),
            rate,
        ));
    }
    let network = builder.build()?;
    log::debug!(
        "parsed system: {} species, {} parameters, {} reactions",
        network.n_species(),
        network.n_parameters(),
        network.n_reactions()
    );

    let params: Vec<f64> = file.parameters.iter().map(|p| p.value).collect();
    let counts: Vec<(&str, i64)> =
        file.initial.iter().map(|(name, count)| (name.as_str(), *count)).collect();
    let initial = network.initial_counts(&counts)?;

    Ok(ChemicalSystem { network, params, initial })
}

// ============================================================
//  Macro generating file/string/stdin/input helpers
// ============================================================

/// Generate input adapters for a base parser function `fn base<R: BufRead>(R) -> Result<T>`.
///
/// This expands into:
/// - `base_string(&str)`
/// - `base_file<P: AsRef<Path>>(P)`
/// - `base_stdin()`
/// - `base_input(&str)`  (dispatches "-" → stdin, otherwise → file)
macro_rules! define_input_variants {
    ($base:ident, $ret:ty) => {
        paste! {
            /// Read from a string buffer.
            pub fn [<$base _string>](s: &str) -> $ret {
                $base(Cursor::new(s))
            }

            /// Read from a file path.
            pub fn [<$base _file>]<P: AsRef<Path>>(path: P) -> $ret {
                let reader = BufReader::new(File::open(path)?);
                $base(reader)
            }

            /// Read from stdin.
            pub fn [<$base _stdin>]() -> $ret {
                let reader = BufReader::new(stdin());
                $base(reader)
            }

            /// Read either from stdin ("-") or a file path.
            pub fn [<$base _input>](s: &str) -> $ret {
                if s == "-" {
                    [<$base _stdin>]()
                } else {
                    [<$base _file>](s)
                }
            }
        }
    };
}

define_input_variants!(read_system, Result<ChemicalSystem>);

// ============================================================
//  Unit tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    const BIRTH_DEATH: &str = r#"{
        "parameters": [
            { "name": "b", "value": 10.0 },
            { "name": "d", "value": 0.1 }
        ],
        "reactions": [
            { "products": [["S", 1]], "rate": { "mass_action": "b" } },
            { "reactants": [["S", 1]], "rate": { "mass_action": "d" } }
        ],
        "initial": [["S", 5]]
    }"#;

    #[test]
    fn test_read_system_basic() {
        let system = read_system_string(BIRTH_DEATH).unwrap();
        assert_eq!(system.network.n_species(), 1);
        assert_eq!(system.network.n_reactions(), 2);
        assert_eq!(system.params, vec![10.0, 0.1]);
        assert_eq!(system.initial, vec![5]);
        assert_eq!(system.initial_concentrations(), vec![5.0]);
    }

    #[test]
    fn test_initial_defaults_to_zero() {
        let input = r#"{
            "parameters": [{ "name": "b", "value": 1.0 }],
            "reactions": [{ "products": [["S", 1]], "rate": { "mass_action": "b" } }]
        }"#;
        let system = read_system_string(input).unwrap();
        assert_eq!(system.initial, vec![0]);
    }

    #[test]
    fn test_hill_repression_rate() {
        let input = r#"{
            "parameters": [
                { "name": "v", "value": 4.0 },
                { "name": "K", "value": 10.0 },
                { "name": "n", "value": 2.0 },
                { "name": "d", "value": 0.1 }
            ],
            "reactions": [
                { "products": [["P", 1]],
                  "rate": { "hill_repression": { "species": "P", "vmax": "v", "k": "K", "n": "n" } } },
                { "reactants": [["P", 1]], "rate": { "mass_action": "d" } }
            ]
        }"#;
        let system = read_system_string(input).unwrap();
        // half-maximal production at P == K
        let a = system.network.propensity(0, &[10], &system.params);
        assert!((a - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_parameter_is_rejected() {
        let input = r#"{
            "parameters": [],
            "reactions": [{ "products": [["S", 1]], "rate": { "mass_action": "b" } }]
        }"#;
        assert!(read_system_string(input).is_err());
    }

    #[test]
    fn test_unknown_initial_species_is_rejected() {
        let input = r#"{
            "parameters": [{ "name": "b", "value": 1.0 }],
            "reactions": [{ "products": [["S", 1]], "rate": { "mass_action": "b" } }],
            "initial": [["X", 3]]
        }"#;
        assert!(read_system_string(input).is_err());
    }
}
