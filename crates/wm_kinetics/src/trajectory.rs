use serde::{Deserialize, Serialize};
use wm_network::ModelError;

/// One simulation run: `(time, state)` samples in time order, stored
/// flat row-major (one row of `n_species` values per time point).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    times: Vec<f64>,
    n_species: usize,
    states: Vec<f64>,
}

impl Trajectory {
    pub fn with_capacity(n_species: usize, n_points: usize) -> Self {
        Self {
            times: Vec::with_capacity(n_points),
            n_species,
            states: Vec::with_capacity(n_points * n_species),
        }
    }

    pub fn push(&mut self, time: f64, state: &[f64]) {
        debug_assert_eq!(state.len(), self.n_species);
        self.times.push(time);
        self.states.extend_from_slice(state);
    }

    pub fn push_counts(&mut self, time: f64, counts: &[i64]) {
        debug_assert_eq!(counts.len(), self.n_species);
        self.times.push(time);
        self.states.extend(counts.iter().map(|&c| c as f64));
    }

    pub fn n_species(&self) -> usize {
        self.n_species
    }

    pub fn n_points(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// All species at time point `i`.
    pub fn state_at(&self, i: usize) -> &[f64] {
        let start = i * self.n_species;
        &self.states[start..start + self.n_species]
    }

    pub fn final_state(&self) -> &[f64] {
        if self.states.is_empty() {
            &[]
        } else {
            &self.states[self.states.len() - self.n_species..]
        }
    }

    pub fn final_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// The time series of one species across all points.
    pub fn species_series(&self, s: usize) -> impl Iterator<Item = f64> + '_ {
        self.states
            .iter()
            .skip(s)
            .step_by(self.n_species.max(1))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &[f64])> {
        self.times
            .iter()
            .copied()
            .zip(self.states.chunks_exact(self.n_species))
    }
}

/// Checkpoint times must be finite, non-negative, sorted ascending,
/// and not past the horizon.
pub fn validate_checkpoints(checkpoints: &[f64], horizon: f64) -> Result<(), ModelError> {
    if checkpoints.iter().any(|t| !t.is_finite()) {
        return Err(ModelError::InvalidCheckpoints("times must be finite".into()));
    }
    if checkpoints.first().is_some_and(|&t| t < 0.0) {
        return Err(ModelError::InvalidCheckpoints("times must be non-negative".into()));
    }
    if checkpoints.windows(2).any(|w| w[0] > w[1]) {
        return Err(ModelError::InvalidCheckpoints("times must be sorted ascending".into()));
    }
    if checkpoints.last().is_some_and(|&t| t > horizon) {
        return Err(ModelError::InvalidCheckpoints("times must not exceed the horizon".into()));
    }
    Ok(())
}

/// Samples a jump process at fixed checkpoint times using its
/// piecewise-constant interpolation: the state between jumps is
/// constant, so a checkpoint takes the state of the last jump at or
/// before it.
pub(crate) struct CheckpointSampler<'a> {
    checkpoints: &'a [f64],
    next: usize,
    trajectory: Trajectory,
}

impl<'a> CheckpointSampler<'a> {
    pub fn new(checkpoints: &'a [f64], n_species: usize) -> Self {
        Self {
            checkpoints,
            next: 0,
            trajectory: Trajectory::with_capacity(n_species, checkpoints.len()),
        }
    }

    /// Record `counts` for every pending checkpoint strictly before
    /// `t` (the time of the next jump).
    pub fn record_counts_before(&mut self, t: f64, counts: &[i64]) {
        while self.next < self.checkpoints.len() && self.checkpoints[self.next] < t {
            self.trajectory.push_counts(self.checkpoints[self.next], counts);
            self.next += 1;
        }
    }

    /// No further jumps: every remaining checkpoint sees `counts`.
    pub fn finish_counts(mut self, counts: &[i64]) -> Trajectory {
        while self.next < self.checkpoints.len() {
            self.trajectory.push_counts(self.checkpoints[self.next], counts);
            self.next += 1;
        }
        self.trajectory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_storage_roundtrip() {
        let mut traj = Trajectory::with_capacity(2, 3);
        traj.push(0.0, &[1.0, 10.0]);
        traj.push(1.5, &[2.0, 20.0]);
        traj.push(3.0, &[3.0, 30.0]);
        assert_eq!(traj.n_points(), 3);
        assert_eq!(traj.state_at(1), &[2.0, 20.0]);
        assert_eq!(traj.final_state(), &[3.0, 30.0]);
        assert_eq!(traj.final_time(), 3.0);
        assert_eq!(traj.species_series(1).collect::<Vec<_>>(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn checkpoint_validation() {
        assert!(validate_checkpoints(&[0.0, 1.0, 2.0], 2.0).is_ok());
        assert!(validate_checkpoints(&[], 2.0).is_ok());
        assert!(validate_checkpoints(&[1.0, 0.5], 2.0).is_err());
        assert!(validate_checkpoints(&[-1.0, 0.5], 2.0).is_err());
        assert!(validate_checkpoints(&[0.0, 3.0], 2.0).is_err());
        assert!(validate_checkpoints(&[f64::NAN], 2.0).is_err());
    }

    #[test]
    fn sampler_is_piecewise_constant() {
        let checkpoints = [0.0, 1.0, 2.0, 3.0];
        let mut sampler = CheckpointSampler::new(&checkpoints, 1);
        // Jump at t = 1.2: checkpoints 0 and 1 see the pre-jump state.
        sampler.record_counts_before(1.2, &[5]);
        // Jump at t = 2.0: checkpoint 2.0 is not strictly before it.
        sampler.record_counts_before(2.0, &[6]);
        let traj = sampler.finish_counts(&[7]);
        assert_eq!(traj.times(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(traj.species_series(0).collect::<Vec<_>>(), vec![5.0, 5.0, 7.0, 7.0]);
    }

    #[test]
    fn serde_roundtrip() {
        let mut traj = Trajectory::with_capacity(1, 2);
        traj.push_counts(0.0, &[4]);
        traj.push_counts(1.0, &[5]);
        let json = serde_json::to_string(&traj).unwrap();
        let back: Trajectory = serde_json::from_str(&json).unwrap();
        assert_eq!(traj, back);
    }
}
