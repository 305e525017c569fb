//! Simple regression model specification.
//!
//! Relates adjusted recruits directly to observed spawners via the
//! Beverton-Holt curve, with no latent-state machinery: the observed series
//! is treated as if it were the true state. Any unmodeled noise, process
//! variability and observation error alike, is absorbed into the single
//! fitted precision, which is therefore an inflated-variance estimator
//! whenever real process variability is present. The comparative panel
//! exists to demonstrate exactly this.

use serde::{Deserialize, Serialize};

use crate::error::{RecruitError, RecruitResult};
use crate::model::{lognormal_log_density, shared_parameters, ParameterDecl};
use crate::simulator::{bevholt, Simulation};

/// Prepared data bindings and priors for the simple regression model.
///
/// `spawners[i]` is the observed series with the last element dropped;
/// `recruits[i]` is the observed series shifted by one year and adjusted for
/// harvest and hatchery origin:
///
/// ```text
/// recruits[i] = Sobs[i+1] * (1 - hatchery[i]) / (1 - harvest[i])
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleModel {
    /// Observed spawner counts, years 1..N-1.
    pub spawners: Vec<f64>,
    /// Adjusted recruit counts, years 2..N mapped back one step.
    pub recruits: Vec<f64>,
}

impl SimpleModel {
    /// Prepare the model's data bindings from a simulation's observed
    /// series and its harvest/hatchery schedules.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the run is shorter than two years
    /// (no spawner/recruit pair exists).
    pub fn prepare(sim: &Simulation) -> RecruitResult<Self> {
        let n = sim.observed.len();
        if n < 2 {
            return Err(RecruitError::config(
                "simple model needs at least two observed years",
            ));
        }

        let spawners = sim.observed[..n - 1].to_vec();
        let recruits = (0..n - 1)
            .map(|i| {
                sim.observed[i + 1] * (1.0 - sim.scenario.hatchery_proportion[i])
                    / (1.0 - sim.scenario.harvest_rate[i])
            })
            .collect();

        Ok(Self { spawners, recruits })
    }

    /// Number of spawner/recruit pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spawners.len()
    }

    /// True when no pairs are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spawners.is_empty()
    }

    /// Declared parameters with their priors.
    #[must_use]
    pub fn parameters(&self) -> Vec<ParameterDecl> {
        shared_parameters()
    }

    /// Log-likelihood of the data under `(productivity, capacity, tau)`.
    ///
    /// Each recruit count is lognormal around the Beverton-Holt prediction
    /// of its spawner count, with precision `tau` in log-space.
    #[must_use]
    pub fn log_likelihood(&self, productivity: f64, capacity: f64, tau: f64) -> f64 {
        if productivity <= 0.0 || capacity <= 0.0 || tau <= 0.0 {
            return f64::NEG_INFINITY;
        }
        self.spawners
            .iter()
            .zip(&self.recruits)
            .map(|(&s, &r)| {
                lognormal_log_density(r, bevholt(s, productivity, capacity).ln(), tau)
            })
            .sum()
    }

    /// Sum of squared log-space residuals, the sufficient statistic for the
    /// conjugate Gamma update of `tau`.
    #[must_use]
    pub fn residual_sum_squares(&self, productivity: f64, capacity: f64) -> f64 {
        self.spawners
            .iter()
            .zip(&self.recruits)
            .map(|(&s, &r)| {
                let z = r.ln() - bevholt(s, productivity, capacity).ln();
                z * z
            })
            .sum()
    }

    /// Unnormalized log-posterior.
    #[must_use]
    pub fn log_posterior(&self, productivity: f64, capacity: f64, tau: f64) -> f64 {
        let params = self.parameters();
        let prior: f64 = params[0].prior.log_density(productivity)
            + params[1].prior.log_density(capacity)
            + params[2].prior.log_density(tau);
        if prior == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        prior + self.log_likelihood(productivity, capacity, tau)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::rng::StockRng;
    use crate::scenario::ScenarioConfig;
    use crate::simulator::simulate_config;

    fn noiseless_sim(n: usize, harvest: f64, hatchery: f64) -> Simulation {
        let config = ScenarioConfig::builder()
            .num_years(n)
            .harvest_rate(vec![harvest; n])
            .hatchery_proportion(vec![hatchery; n])
            .process_error_sd(0.0)
            .observation_error_sd(0.0)
            .build();
        simulate_config(&config, &mut StockRng::new(3)).unwrap()
    }

    #[test]
    fn test_prepare_lengths() {
        let sim = noiseless_sim(10, 0.2, 0.1);
        let model = SimpleModel::prepare(&sim).unwrap();
        assert_eq!(model.len(), 9);
        assert_eq!(model.recruits.len(), 9);
    }

    #[test]
    fn test_recruit_adjustment_inverts_simulator_scaling() {
        // With zero noise, the adjusted recruit equals bevholt(spawner)
        // exactly: the harvest/hatchery scaling cancels.
        let sim = noiseless_sim(8, 0.3, 0.4);
        let model = SimpleModel::prepare(&sim).unwrap();

        for (s, r) in model.spawners.iter().zip(&model.recruits) {
            let predicted = bevholt(*s, 2.5, 1200.0);
            assert!(
                (r - predicted).abs() / predicted < 1e-9,
                "recruit {r} vs prediction {predicted}"
            );
        }
    }

    #[test]
    fn test_log_likelihood_peaks_at_truth_when_noiseless() {
        let sim = noiseless_sim(20, 0.2, 0.1);
        let model = SimpleModel::prepare(&sim).unwrap();

        let tau = 1.0 / (0.1 * 0.1);
        let at_truth = model.log_likelihood(2.5, 1200.0, tau);
        for (prod, cap) in [(1.5, 1200.0), (4.0, 1200.0), (2.5, 700.0), (2.5, 2500.0)] {
            assert!(
                at_truth > model.log_likelihood(prod, cap, tau),
                "truth not preferred over ({prod}, {cap})"
            );
        }
    }

    #[test]
    fn test_log_posterior_rejects_out_of_support() {
        let sim = noiseless_sim(5, 0.0, 0.0);
        let model = SimpleModel::prepare(&sim).unwrap();
        assert_eq!(model.log_posterior(-1.0, 1200.0, 1.0), f64::NEG_INFINITY);
        assert_eq!(model.log_posterior(2.5, 1200.0, 0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_too_short_series_rejected() {
        let sim = noiseless_sim(2, 0.0, 0.0);
        let mut short = sim;
        short.observed.truncate(1);
        short.states.truncate(1);
        assert!(SimpleModel::prepare(&short).is_err());
    }

    #[test]
    fn test_residual_sum_squares_zero_at_truth_when_noiseless() {
        let sim = noiseless_sim(10, 0.1, 0.2);
        let model = SimpleModel::prepare(&sim).unwrap();
        assert!(model.residual_sum_squares(2.5, 1200.0) < 1e-12);
        assert!(model.residual_sum_squares(2.0, 1200.0) > 1e-6);
    }
}
