use wm_network::{ModelError, ReactionNetwork};

use crate::error::SimulationError;
use crate::trajectory::{Trajectory, validate_checkpoints};

/// Fixed-grid integrator for `dy/dt = f(y, t)`.
///
/// `checkpoints` must be finite, non-negative and non-decreasing; the
/// solver lands exactly on each one and records the state there.
pub trait OdeSolver {
    fn solve<F>(
        &self,
        f: F,
        y0: &[f64],
        checkpoints: &[f64],
    ) -> Result<Trajectory, SimulationError>
    where
        F: Fn(&[f64], f64, &mut [f64]);
}

/// Classical fixed-step Runge-Kutta 4. The nominal step is shortened
/// as needed to land exactly on every checkpoint.
pub struct Rk4 {
    dt: f64,
}

impl Rk4 {
    pub fn new(dt: f64) -> Result<Self, SimulationError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimulationError::InvalidStep(dt));
        }
        Ok(Self { dt })
    }
}

impl OdeSolver for Rk4 {
    fn solve<F>(
        &self,
        f: F,
        y0: &[f64],
        checkpoints: &[f64],
    ) -> Result<Trajectory, SimulationError>
    where
        F: Fn(&[f64], f64, &mut [f64]),
    {
        let horizon = checkpoints.last().copied().unwrap_or(0.0);
        validate_checkpoints(checkpoints, horizon)?;

        let n = y0.len();
        let mut y = y0.to_vec();
        let mut t = 0.0;
        let mut k1 = vec![0.0; n];
        let mut k2 = vec![0.0; n];
        let mut k3 = vec![0.0; n];
        let mut k4 = vec![0.0; n];
        let mut ytmp = vec![0.0; n];

        let mut trajectory = Trajectory::with_capacity(n, checkpoints.len());
        for &cp in checkpoints {
            while t < cp {
                let h = self.dt.min(cp - t);
                let half_h = 0.5 * h;

                f(&y, t, &mut k1);
                for i in 0..n {
                    ytmp[i] = half_h.mul_add(k1[i], y[i]);
                }
                f(&ytmp, t + half_h, &mut k2);
                for i in 0..n {
                    ytmp[i] = half_h.mul_add(k2[i], y[i]);
                }
                f(&ytmp, t + half_h, &mut k3);
                for i in 0..n {
                    ytmp[i] = h.mul_add(k3[i], y[i]);
                }
                f(&ytmp, t + h, &mut k4);

                let sixth_h = h / 6.0;
                for i in 0..n {
                    let slope = 2.0f64.mul_add(k2[i] + k3[i], k1[i] + k4[i]);
                    y[i] = sixth_h.mul_add(slope, y[i]);
                }
                t += h;
            }
            trajectory.push(cp, &y);
        }
        Ok(trajectory)
    }
}

/// Mass-action right-hand side for a reaction network:
/// `dy_s/dt = sum_r net(r, s) * rate_r(y)`.
pub struct MassActionRhs<'a> {
    network: &'a ReactionNetwork,
    params: Vec<f64>,
}

impl<'a> MassActionRhs<'a> {
    pub fn new(network: &'a ReactionNetwork, params: &[f64]) -> Result<Self, SimulationError> {
        network.check_parameters(params)?;
        Ok(Self { network, params: params.to_vec() })
    }

    pub fn eval(&self, conc: &[f64], _t: f64, dydt: &mut [f64]) {
        dydt.fill(0.0);
        for r in 0..self.network.n_reactions() {
            let rate = self.network.rate(r, conc, &self.params);
            for &(s, d) in self.network.net_change(r) {
                dydt[s] += d as f64 * rate;
            }
        }
    }
}

/// Solve the deterministic mass-action rendition of a network over
/// real-valued concentrations. Rate laws are checked at the initial
/// state only; concentrations are never clamped, so a species decaying
/// to zero can undershoot by an amount bounded by the local truncation
/// error.
pub fn solve_deterministic<S: OdeSolver>(
    network: &ReactionNetwork,
    y0: &[f64],
    params: &[f64],
    horizon: f64,
    checkpoints: &[f64],
    solver: &S,
) -> Result<Trajectory, SimulationError> {
    network.check_state_len(y0.len())?;
    validate_checkpoints(checkpoints, horizon)?;
    let rhs = MassActionRhs::new(network, params)?;
    for r in 0..network.n_reactions() {
        let rate = network.rate(r, y0, params);
        if !rate.is_finite() || rate < 0.0 {
            return Err(ModelError::InvalidRate { reaction: r, value: rate }.into());
        }
    }
    solver.solve(|y, t, dydt| rhs.eval(y, t, dydt), y0, checkpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wm_network::{NetworkBuilder, RateLaw, ReactionClause};

    #[test]
    fn invalid_step_is_rejected() {
        for dt in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(Rk4::new(dt), Err(SimulationError::InvalidStep(_))));
        }
    }

    #[test]
    fn exponential_decay_matches_closed_form() {
        let net = NetworkBuilder::new()
            .parameter("d")
            .reaction(ReactionClause::mass_action(&[("S", 1)], &[], "d"))
            .build()
            .unwrap();
        let solver = Rk4::new(0.01).unwrap();
        let checkpoints = [0.0, 1.0, 5.0, 10.0];
        let traj =
            solve_deterministic(&net, &[1.0], &[0.5], 10.0, &checkpoints, &solver).unwrap();
        for (t, state) in traj.iter() {
            let expected = (-0.5 * t).exp();
            assert!(
                (state[0] - expected).abs() < 1e-8,
                "t = {t}: got {}, expected {expected}",
                state[0]
            );
        }
    }

    #[test]
    fn birth_death_relaxes_to_ratio() {
        // dx/dt = b - d x  from x(0) = 0  →  x(t) = (b/d)(1 - e^{-dt})
        let net = NetworkBuilder::new()
            .parameters(&["b", "d"])
            .reaction(ReactionClause::mass_action(&[], &[("S", 1)], "b"))
            .reaction(ReactionClause::mass_action(&[("S", 1)], &[], "d"))
            .build()
            .unwrap();
        let solver = Rk4::new(0.001).unwrap();
        let checkpoints = [2.0, 50.0];
        let traj =
            solve_deterministic(&net, &[0.0], &[10.0, 0.1], 50.0, &checkpoints, &solver).unwrap();
        let expect = |t: f64| 100.0 * (1.0 - (-0.1 * t).exp());
        assert!((traj.state_at(0)[0] - expect(2.0)).abs() < 1e-6);
        assert!((traj.state_at(1)[0] - expect(50.0)).abs() < 1e-4);
    }

    #[test]
    fn checkpoints_land_exactly() {
        let net = NetworkBuilder::new()
            .parameter("d")
            .reaction(ReactionClause::mass_action(&[("S", 1)], &[], "d"))
            .build()
            .unwrap();
        let solver = Rk4::new(0.3).unwrap();
        let checkpoints = [0.0, 0.7, 1.0];
        let traj =
            solve_deterministic(&net, &[1.0], &[1.0], 1.0, &checkpoints, &solver).unwrap();
        assert_eq!(traj.times(), &checkpoints);
        // 0.3 does not divide 0.7; landing exactly still keeps accuracy
        assert!((traj.state_at(1)[0] - (-0.7f64).exp()).abs() < 1e-5);
    }

    #[test]
    fn bad_rate_at_initial_state_is_reported() {
        let net = NetworkBuilder::new()
            .parameter("k")
            .reaction(ReactionClause::new(
                &[("S", 1)],
                &[],
                RateLaw::custom("inverse", &["S"], &["k"], |x, p| p[0] / x[0]),
            ))
            .build()
            .unwrap();
        let solver = Rk4::new(0.01).unwrap();
        let err = solve_deterministic(&net, &[0.0], &[1.0], 1.0, &[1.0], &solver).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Model(ModelError::InvalidRate { reaction: 0, .. })
        ));
    }
}
