//! State-space model specification.
//!
//! Treats the true population state as a latent first-order Markov chain:
//! process variability lives in the state transition, observation error in
//! the state-to-observation mapping, and the two are never conflated. The
//! observation SD is treated as known and fixed (default 0.15) rather than
//! estimated, mirroring the assumption that measurement precision has been
//! independently characterized; the fitted process precision `tau` is
//! therefore an estimate of process variability alone.

use serde::{Deserialize, Serialize};

use crate::error::{RecruitError, RecruitResult};
use crate::model::{
    lognormal_log_density, normal_log_density, shared_parameters, ParameterDecl,
};
use crate::simulator::{bevholt, Simulation};

/// Precision of the near-flat lognormal prior on the first latent state
/// (log-space SD 100).
pub const INITIAL_STATE_PRECISION: f64 = 1e-4;

/// Fixed observation-error SD in log-space.
pub const DEFAULT_OBSERVATION_SD: f64 = 0.15;

/// Prepared data bindings for the state-space model.
///
/// The latent chain, in log-space `x[i] = ln state[i]`:
///
/// ```text
/// x[0]   ~ Normal(0, sd from precision 1e-4)
/// x[i+1] ~ Normal(ln(bevholt(exp(x[i])) * (1-harvest[i]) / (1-hatchery[i])), sd from tau)
/// Sobs[i] ~ Lognormal(x[i], fixed observation sd)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSpaceModel {
    /// Observed series, all N years.
    pub observed: Vec<f64>,
    /// Harvest rate per year; the first N-1 entries drive transitions.
    pub harvest_rate: Vec<f64>,
    /// Hatchery-origin proportion per year; first N-1 entries drive
    /// transitions.
    pub hatchery_proportion: Vec<f64>,
    /// Known observation-error SD, log-space.
    pub observation_sd: f64,
}

impl StateSpaceModel {
    /// Prepare the model's data bindings from a simulation's observed
    /// series and schedules, with the fixed default observation SD.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for runs shorter than two years.
    pub fn prepare(sim: &Simulation) -> RecruitResult<Self> {
        if sim.observed.len() < 2 {
            return Err(RecruitError::config(
                "state-space model needs at least two observed years",
            ));
        }
        Ok(Self {
            observed: sim.observed.clone(),
            harvest_rate: sim.scenario.harvest_rate.clone(),
            hatchery_proportion: sim.scenario.hatchery_proportion.clone(),
            observation_sd: DEFAULT_OBSERVATION_SD,
        })
    }

    /// Number of observed years (and latent states).
    #[must_use]
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    /// True when no years are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Declared parameters with their priors. `tau` here is the process
    /// precision; the latent states are declared by the chain structure.
    #[must_use]
    pub fn parameters(&self) -> Vec<ParameterDecl> {
        shared_parameters()
    }

    /// Observation precision `1 / observation_sd^2`.
    #[must_use]
    pub fn observation_precision(&self) -> f64 {
        1.0 / (self.observation_sd * self.observation_sd)
    }

    /// Log-space mean of the transition out of year `i` at latent log-state
    /// `x`.
    #[must_use]
    pub fn transition_log_mean(&self, x: f64, productivity: f64, capacity: f64, i: usize) -> f64 {
        (bevholt(x.exp(), productivity, capacity) * (1.0 - self.harvest_rate[i])
            / (1.0 - self.hatchery_proportion[i]))
            .ln()
    }

    /// Sum of squared transition residuals in log-space, the sufficient
    /// statistic for the conjugate Gamma update of `tau`.
    #[must_use]
    pub fn process_rss(&self, log_states: &[f64], productivity: f64, capacity: f64) -> f64 {
        (0..log_states.len() - 1)
            .map(|i| {
                let z = log_states[i + 1]
                    - self.transition_log_mean(log_states[i], productivity, capacity, i);
                z * z
            })
            .sum()
    }

    /// Unnormalized log-posterior over `(productivity, capacity, tau,
    /// log_states)`. The latent chain is integrated in log-space, so normal
    /// densities appear here (lognormal plus Jacobian); the data layer stays
    /// a lognormal density in the observations.
    #[must_use]
    pub fn log_posterior(
        &self,
        productivity: f64,
        capacity: f64,
        tau: f64,
        log_states: &[f64],
    ) -> f64 {
        let params = self.parameters();
        let prior = params[0].prior.log_density(productivity)
            + params[1].prior.log_density(capacity)
            + params[2].prior.log_density(tau);
        if prior == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }

        let mut lp = prior + normal_log_density(log_states[0], 0.0, INITIAL_STATE_PRECISION);
        for i in 0..log_states.len() - 1 {
            let mean = self.transition_log_mean(log_states[i], productivity, capacity, i);
            lp += normal_log_density(log_states[i + 1], mean, tau);
        }
        let obs_tau = self.observation_precision();
        for (i, &obs) in self.observed.iter().enumerate() {
            lp += lognormal_log_density(obs, log_states[i], obs_tau);
        }
        lp
    }

    /// Log-density terms touched by the single latent log-state `x[i]`:
    /// its observation term, the transition into it, the transition out of
    /// it, and the initial-state prior when `i == 0`. Used by single-site
    /// Metropolis updates so a sweep stays O(N).
    #[must_use]
    pub fn local_log_density(
        &self,
        i: usize,
        log_states: &[f64],
        productivity: f64,
        capacity: f64,
        tau: f64,
    ) -> f64 {
        let n = log_states.len();
        let mut lp = lognormal_log_density(
            self.observed[i],
            log_states[i],
            self.observation_precision(),
        );

        if i == 0 {
            lp += normal_log_density(log_states[0], 0.0, INITIAL_STATE_PRECISION);
        } else {
            let mean = self.transition_log_mean(log_states[i - 1], productivity, capacity, i - 1);
            lp += normal_log_density(log_states[i], mean, tau);
        }
        if i < n - 1 {
            let mean = self.transition_log_mean(log_states[i], productivity, capacity, i);
            lp += normal_log_density(log_states[i + 1], mean, tau);
        }
        lp
    }

    /// Log-density of every transition plus the parameter priors, the part
    /// of the posterior that depends on `(productivity, capacity)` for
    /// fixed states and `tau`.
    #[must_use]
    pub fn curve_log_density(
        &self,
        productivity: f64,
        capacity: f64,
        tau: f64,
        log_states: &[f64],
    ) -> f64 {
        let params = self.parameters();
        let prior =
            params[0].prior.log_density(productivity) + params[1].prior.log_density(capacity);
        if prior == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        let mut lp = prior;
        for i in 0..log_states.len() - 1 {
            let mean = self.transition_log_mean(log_states[i], productivity, capacity, i);
            lp += normal_log_density(log_states[i + 1], mean, tau);
        }
        lp
    }
}
