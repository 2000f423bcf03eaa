use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use wm_network::ReactionNetwork;

use crate::error::SimulationError;
use crate::ssa::GillespieSsa;
use crate::tau_leap::TauLeap;
use crate::trajectory::Trajectory;

/// Running per-species sums over ensemble members at one output time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Timepoint {
    pub time: f64,
    sums: Vec<f64>,
    counter: u64,
}

impl Timepoint {
    pub fn new(time: f64, n_species: usize) -> Self {
        Self { time, sums: vec![0.0; n_species], counter: 0 }
    }

    pub fn add(&mut self, state: &[f64]) {
        for (sum, &x) in self.sums.iter_mut().zip(state) {
            *sum += x;
        }
        self.counter += 1;
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn mean(&self) -> Vec<f64> {
        let n = self.counter.max(1) as f64;
        self.sums.iter().map(|&s| s / n).collect()
    }
}

/// Ensemble-averaged time course on a fixed checkpoint grid.
///
/// Individual trajectories are accumulated as per-timepoint sums, so
/// partial results from parallel workers can be merged cheaply.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Timecourse {
    species: Vec<String>,
    points: Vec<Timepoint>,
}

impl Timecourse {
    pub fn new(times: &[f64], species: &[String]) -> Self {
        let points = times.iter().map(|&t| Timepoint::new(t, species.len())).collect();
        Self { species: species.to_vec(), points }
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn points(&self) -> &[Timepoint] {
        &self.points
    }

    /// Number of ensemble members accumulated so far.
    pub fn counter(&self) -> u64 {
        self.points.first().map_or(0, Timepoint::counter)
    }

    pub fn add_trajectory(&mut self, trajectory: &Trajectory) {
        assert_eq!(
            self.points.len(),
            trajectory.n_points(),
            "trajectory does not match the output grid"
        );
        for (point, (t, state)) in self.points.iter_mut().zip(trajectory.iter()) {
            assert!(point.time == t, "trajectory does not match the output grid");
            point.add(state);
        }
    }

    pub fn merge(&mut self, other: Timecourse) {
        assert_eq!(self.species, other.species, "cannot merge timecourses over different species");
        assert_eq!(
            self.points.len(),
            other.points.len(),
            "cannot merge timecourses with different numbers of timepoints"
        );
        for (point, other_point) in self.points.iter_mut().zip(other.points) {
            for (sum, other_sum) in point.sums.iter_mut().zip(other_point.sums) {
                *sum += other_sum;
            }
            point.counter += other_point.counter;
        }
    }

    /// Ensemble mean as a real-valued trajectory.
    pub fn mean(&self) -> Trajectory {
        let mut trajectory = Trajectory::with_capacity(self.species.len(), self.points.len());
        for point in &self.points {
            trajectory.push(point.time, &point.mean());
        }
        trajectory
    }
}

impl fmt::Display for Timecourse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>13}", "time")?;
        for name in &self.species {
            write!(f, " {:>14}", name)?;
        }
        writeln!(f)?;
        for point in &self.points {
            write!(f, "{:>13.6}", point.time)?;
            for mean in point.mean() {
                write!(f, " {:>14.6}", mean)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Stream seed for run `run` of an ensemble seeded with `seed`.
///
/// SplitMix64 output scrambling over `seed ^ run * gamma`, so
/// consecutive run indices produce statistically independent seeds.
pub fn derive_seed(seed: u64, run: u64) -> u64 {
    const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;
    let mut z = (seed ^ run.wrapping_mul(GOLDEN_GAMMA)).wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Run `n_runs` independent exact simulations in parallel and
/// accumulate them on the checkpoint grid. Any failing run fails the
/// whole ensemble.
pub fn sample_ssa_ensemble(
    network: &ReactionNetwork,
    initial: &[i64],
    params: &[f64],
    horizon: f64,
    checkpoints: &[f64],
    n_runs: u64,
    seed: u64,
) -> Result<Timecourse, SimulationError> {
    log::debug!("SSA ensemble: {} runs to t = {}, seed {}", n_runs, horizon, seed);
    let trajectories: Vec<Trajectory> = (0..n_runs)
        .into_par_iter()
        .map(|run| {
            let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(seed, run));
            GillespieSsa::new(network, initial, params)?.sample(&mut rng, horizon, checkpoints)
        })
        .collect::<Result<_, _>>()?;
    Ok(accumulate(network, checkpoints, &trajectories))
}

/// Tau-leaping counterpart of [`sample_ssa_ensemble`] with fixed leap
/// size `dt`.
pub fn sample_tau_leap_ensemble(
    network: &ReactionNetwork,
    initial: &[i64],
    params: &[f64],
    dt: f64,
    horizon: f64,
    checkpoints: &[f64],
    n_runs: u64,
    seed: u64,
) -> Result<Timecourse, SimulationError> {
    log::debug!(
        "tau-leap ensemble: {} runs to t = {} with dt = {}, seed {}",
        n_runs,
        horizon,
        dt,
        seed
    );
    let trajectories: Vec<Trajectory> = (0..n_runs)
        .into_par_iter()
        .map(|run| {
            let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(seed, run));
            TauLeap::new(network, initial, params, dt)?.sample(&mut rng, horizon, checkpoints)
        })
        .collect::<Result<_, _>>()?;
    Ok(accumulate(network, checkpoints, &trajectories))
}

fn accumulate(
    network: &ReactionNetwork,
    checkpoints: &[f64],
    trajectories: &[Trajectory],
) -> Timecourse {
    let mut timecourse = Timecourse::new(checkpoints, network.species_names());
    for trajectory in trajectories {
        timecourse.add_trajectory(trajectory);
    }
    timecourse
}
