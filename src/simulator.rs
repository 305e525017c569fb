//! Stochastic stock-recruitment process simulator.
//!
//! Generates a synthetic true population state sequence under Beverton-Holt
//! dynamics with harvest and hatchery-origin adjustments, plus a noisy
//! observed series. The state recursion, for years i = 1 .. N-1:
//!
//! ```text
//! mean[i+1] = bevholt(S[i]) * (1 - harvest[i]) / (1 - hatchery[i])
//! S[i+1]   ~ Lognormal(log(mean[i+1]), process_error_sd)
//! ```
//!
//! and the observation layer, for every year:
//!
//! ```text
//! Sobs[i] ~ Lognormal(log(S[i]), observation_error_sd)
//! ```
//!
//! All lognormal draws are parameterized by log-mean and log-space SD; the
//! model specifications downstream use precision instead, and the two
//! conventions must never be mixed.

use serde::{Deserialize, Serialize};

use crate::engine::rng::StockRng;
use crate::error::{RecruitError, RecruitResult};
use crate::scenario::{ResolvedScenario, ScenarioConfig};

/// Beverton-Holt stock-recruitment function.
///
/// `s / (1/prod + s/cap)`: monotone increasing and concave in `s`,
/// asymptoting to `cap`; `prod` is the slope at the origin (recruits per
/// spawner at low density).
#[must_use]
pub fn bevholt(s: f64, prod: f64, cap: f64) -> f64 {
    s / (1.0 / prod + s / cap)
}

/// Output of one simulation run.
///
/// `states` is the latent truth, kept for validation only; `observed` is the
/// sole input handed to the model specifications. Both are immutable once
/// produced and have length `num_years` with strictly positive elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    /// Latent true population state per year.
    pub states: Vec<f64>,
    /// Noisy lognormal observation of each state.
    pub observed: Vec<f64>,
    /// The concrete scenario that produced this run.
    pub scenario: ResolvedScenario,
}

impl Simulation {
    /// Number of simulated years.
    #[must_use]
    pub fn num_years(&self) -> usize {
        self.states.len()
    }
}

/// Run the stochastic process for a fully resolved scenario.
///
/// # Errors
///
/// Returns [`RecruitError::DegenerateState`] if any generated state is
/// non-positive or non-finite. The run is not retried: the process is
/// deterministic given its draws, so a retry would need a new seed, which
/// the caller must supply explicitly.
pub fn simulate(scenario: &ResolvedScenario, rng: &mut StockRng) -> RecruitResult<Simulation> {
    let n = scenario.num_years;
    let mut states = Vec::with_capacity(n);

    states.push(check_state(0, scenario.initial_state)?);
    for i in 0..n - 1 {
        let next_mean = bevholt(states[i], scenario.true_productivity, scenario.true_capacity)
            * (1.0 - scenario.harvest_rate[i])
            / (1.0 - scenario.hatchery_proportion[i]);
        let next = rng.gen_lognormal(next_mean.ln(), scenario.process_error_sd);
        states.push(check_state(i + 1, next)?);
    }

    let mut observed = Vec::with_capacity(n);
    for (i, &state) in states.iter().enumerate() {
        let obs = rng.gen_lognormal(state.ln(), scenario.observation_error_sd);
        observed.push(check_state(i, obs)?);
    }

    Ok(Simulation {
        states,
        observed,
        scenario: scenario.clone(),
    })
}

/// Resolve a [`ScenarioConfig`] and run the simulator in one call.
///
/// # Errors
///
/// Configuration errors are reported before any random draw is consumed by
/// the process itself; degeneracy errors as in [`simulate`].
pub fn simulate_config(config: &ScenarioConfig, rng: &mut StockRng) -> RecruitResult<Simulation> {
    let scenario = config.resolve(rng)?;
    simulate(&scenario, rng)
}

fn check_state(year: usize, value: f64) -> RecruitResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RecruitError::DegenerateState { year, value })
    }
}
