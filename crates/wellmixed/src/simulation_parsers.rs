use anyhow::Result;
use anyhow::bail;
use clap::Args;

#[derive(Debug, Args)]
pub struct OutputGrid {
    /// Simulation stop time.
    #[arg(long, default_value_t = 10.0)]
    pub t_end: f64,

    /// Number of evenly spaced output times in (0, t-end].
    #[arg(long, default_value_t = 20)]
    pub t_points: usize,
}

impl OutputGrid {
    /// Validate that all parameters make sense.
    pub fn validate(&self) -> Result<()> {
        if !self.t_end.is_finite() || self.t_end <= 0.0 {
            bail!("t_end ({}) must be positive and finite", self.t_end);
        }
        if self.t_points == 0 {
            bail!("t_points must be > 0");
        }
        Ok(())
    }

    /// Output times: 0, then `t_points` evenly spaced points up to and
    /// including `t_end`.
    pub fn output_times(&self) -> Vec<f64> {
        let mut times = vec![0.0];
        let step = self.t_end / self.t_points as f64;
        for i in 1..self.t_points {
            times.push(i as f64 * step);
        }
        times.push(self.t_end);
        times
    }
}

#[derive(Debug, Args)]
pub struct EnsembleParameters {
    /// Number of independent simulations.
    #[arg(short, long, default_value_t = 1)]
    pub num_sims: u64,

    /// Base seed; each run derives its own stream from it. Random if
    /// not given.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl EnsembleParameters {
    pub fn base_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_times_cover_the_grid() {
        let grid = OutputGrid { t_end: 10.0, t_points: 4 };
        assert!(grid.validate().is_ok());
        assert_eq!(grid.output_times(), vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_degenerate_grids_are_rejected() {
        assert!(OutputGrid { t_end: 0.0, t_points: 4 }.validate().is_err());
        assert!(OutputGrid { t_end: f64::NAN, t_points: 4 }.validate().is_err());
        assert!(OutputGrid { t_end: 1.0, t_points: 0 }.validate().is_err());
    }
}
