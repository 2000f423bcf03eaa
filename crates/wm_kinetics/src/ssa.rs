use log::debug;
use rand::Rng;

use wm_network::{ModelError, ReactionNetwork};

use crate::error::SimulationError;
use crate::trajectory::{CheckpointSampler, Trajectory, validate_checkpoints};

/// Outcome of one attempt to advance the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The indexed reaction fired and the state was updated.
    Fired(usize),
    /// Total propensity reached zero: nothing can ever fire again.
    /// The clock jumps to the horizon; this is not an error.
    Absorbed,
    /// The next waiting time would pass the horizon; the clock is set
    /// to the horizon and the pending reaction is discarded.
    Horizon,
}

/// Gillespie's Direct Method: exact sampling of the continuous-time
/// Markov jump process defined by a reaction network.
///
/// Owns its clock, its count vector, and a propensity scratch buffer;
/// the network is shared read-only, so independent simulators can run
/// in parallel against the same network.
pub struct GillespieSsa<'a> {
    network: &'a ReactionNetwork,
    params: Vec<f64>,
    state: Vec<i64>,
    time: f64,
    propensities: Vec<f64>,
}

impl<'a> GillespieSsa<'a> {
    pub fn new(
        network: &'a ReactionNetwork,
        initial: &[i64],
        params: &[f64],
    ) -> Result<Self, SimulationError> {
        network.check_state_len(initial.len())?;
        network.check_parameters(params)?;
        for (s, &count) in initial.iter().enumerate() {
            if count < 0 {
                return Err(ModelError::NegativeInitial {
                    species: network.species_names()[s].clone(),
                    value: count,
                }
                .into());
            }
        }
        Ok(Self {
            network,
            params: params.to_vec(),
            state: initial.to_vec(),
            time: 0.0,
            propensities: vec![0.0; network.n_reactions()],
        })
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> &[i64] {
        &self.state
    }

    /// Recompute every propensity from the current state and return
    /// the total. A negative or non-finite value is a malformed rate
    /// law, caught here on first evaluation.
    fn refresh_propensities(&mut self) -> Result<f64, SimulationError> {
        let mut total = 0.0;
        for r in 0..self.propensities.len() {
            let a = self.network.propensity(r, &self.state, &self.params);
            if !a.is_finite() || a < 0.0 {
                return Err(ModelError::InvalidRate { reaction: r, value: a }.into());
            }
            self.propensities[r] = a;
            total += a;
        }
        Ok(total)
    }

    /// Advance to the next event, but never past `horizon`.
    pub fn step<R>(&mut self, rng: &mut R, horizon: f64) -> Result<Step, SimulationError>
    where
        R: Rng + ?Sized,
    {
        let total = self.refresh_propensities()?;
        if total == 0.0 {
            debug!("propensity exhausted at t = {}, holding state to horizon", self.time);
            self.time = horizon;
            return Ok(Step::Absorbed);
        }

        // Waiting time from a single uniform draw, tau ~ Exp(total).
        let mut u1: f64 = rng.random();
        if u1 == 0.0 {
            u1 = f64::MIN_POSITIVE;
        }
        let tau = -u1.ln() / total;
        if self.time + tau >= horizon {
            self.time = horizon;
            return Ok(Step::Horizon);
        }

        // Smallest index whose cumulative propensity reaches the
        // threshold; index order is the tie-break. Zero-propensity
        // reactions are skipped, so they are unselectable even when
        // the draw is exactly 0 or rounding leaves `acc` short.
        let threshold = rng.random::<f64>() * total;
        let mut acc = 0.0;
        let mut chosen = self.propensities.len() - 1;
        for (r, &a) in self.propensities.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            acc += a;
            chosen = r;
            if acc >= threshold {
                break;
            }
        }

        self.time += tau;
        for &(s, delta) in self.network.net_change(chosen) {
            self.state[s] += delta;
            if self.state[s] < 0 {
                return Err(SimulationError::NegativeCount {
                    species: self.network.species_names()[s].clone(),
                    time: self.time,
                });
            }
        }
        Ok(Step::Fired(chosen))
    }

    /// Run until the horizon, invoking `callback(time, reaction,
    /// state)` after every applied event.
    pub fn simulate<R, F>(
        &mut self,
        rng: &mut R,
        horizon: f64,
        mut callback: F,
    ) -> Result<(), SimulationError>
    where
        R: Rng + ?Sized,
        F: FnMut(f64, usize, &[i64]),
    {
        while self.time < horizon {
            match self.step(rng, horizon)? {
                Step::Fired(r) => callback(self.time, r, &self.state),
                Step::Absorbed | Step::Horizon => break,
            }
        }
        Ok(())
    }

    /// Run until the horizon recording every post-jump `(time, state)`
    /// pair, starting with the initial state.
    pub fn trajectory<R>(&mut self, rng: &mut R, horizon: f64) -> Result<Trajectory, SimulationError>
    where
        R: Rng + ?Sized,
    {
        let mut traj = Trajectory::with_capacity(self.state.len(), 16);
        traj.push_counts(self.time, &self.state);
        self.simulate(rng, horizon, |t, _, state| traj.push_counts(t, state))?;
        Ok(traj)
    }

    /// Run until the horizon, reporting the state only at the given
    /// checkpoint times (piecewise-constant interpolation between
    /// jumps).
    pub fn sample<R>(
        &mut self,
        rng: &mut R,
        horizon: f64,
        checkpoints: &[f64],
    ) -> Result<Trajectory, SimulationError>
    where
        R: Rng + ?Sized,
    {
        validate_checkpoints(checkpoints, horizon)?;
        let mut sampler = CheckpointSampler::new(checkpoints, self.state.len());
        let mut before = self.state.clone();
        while self.time < horizon {
            before.copy_from_slice(&self.state);
            match self.step(rng, horizon)? {
                Step::Fired(_) => sampler.record_counts_before(self.time, &before),
                Step::Absorbed | Step::Horizon => break,
            }
        }
        Ok(sampler.finish_counts(&self.state))
    }
}
