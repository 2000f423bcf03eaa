use rand::Rng;
use rand_distr::{Distribution, Poisson};

use wm_network::{ModelError, ReactionNetwork};

use crate::error::SimulationError;
use crate::trajectory::{CheckpointSampler, Trajectory, validate_checkpoints};

/// Explicit fixed-step tau-leaping: every `dt`, each reaction fires a
/// Poisson-distributed number of times with its start-of-step
/// propensity, and all firings are applied in one shot.
///
/// Faster than the exact method but biased: a step large relative to
/// the fastest reaction can drive a count negative, which fails the
/// run with [`SimulationError::NegativeCount`]. Choosing `dt` small
/// enough is the caller's responsibility; there is no automatic retry.
pub struct TauLeap<'a> {
    network: &'a ReactionNetwork,
    params: Vec<f64>,
    state: Vec<i64>,
    time: f64,
    dt: f64,
    delta: Vec<i64>,
}

impl<'a> TauLeap<'a> {
    pub fn new(
        network: &'a ReactionNetwork,
        initial: &[i64],
        params: &[f64],
        dt: f64,
    ) -> Result<Self, SimulationError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimulationError::InvalidStep(dt));
        }
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
            dt,
            delta: vec![0; initial.len()],
        })
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> &[i64] {
        &self.state
    }

    /// Advance one leap of `dt`. The aggregate update is checked
    /// before it is committed, so a failed step leaves the state as it
    /// was at the start of the step.
    pub fn step<R>(&mut self, rng: &mut R) -> Result<(), SimulationError>
    where
        R: Rng + ?Sized,
    {
        self.delta.fill(0);
        for r in 0..self.network.n_reactions() {
            let a = self.network.propensity(r, &self.state, &self.params);
            if !a.is_finite() || a < 0.0 {
                return Err(ModelError::InvalidRate { reaction: r, value: a }.into());
            }
            if a == 0.0 {
                continue;
            }
            let mean = a * self.dt;
            let poisson = Poisson::new(mean)
                .map_err(|_| ModelError::InvalidRate { reaction: r, value: mean })?;
            let firings = poisson.sample(rng) as i64;
            if firings == 0 {
                continue;
            }
            for &(s, d) in self.network.net_change(r) {
                self.delta[s] += firings * d;
            }
        }

        for (s, (&count, &delta)) in self.state.iter().zip(&self.delta).enumerate() {
            if count + delta < 0 {
                return Err(SimulationError::NegativeCount {
                    species: self.network.species_names()[s].clone(),
                    time: self.time + self.dt,
                });
            }
        }
        for (count, &delta) in self.state.iter_mut().zip(&self.delta) {
            *count += delta;
        }
        self.time += self.dt;
        Ok(())
    }

    /// Leap until the horizon, reporting the state at the given
    /// checkpoint times (state is constant within a step and jumps at
    /// step boundaries).
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
            self.step(rng)?;
            sampler.record_counts_before(self.time, &before);
        }
        Ok(sampler.finish_counts(&self.state))
    }
}
