//! Posterior sampling engine binding.
//!
//! The model specifications are declarative; this module is the bundled
//! engine collaborator that consumes them. `GibbsSampler` implements
//! Metropolis-within-Gibbs:
//!
//! - conjugate Gamma draws for the noise precision (the conditional given
//!   residuals is available in closed form);
//! - adaptive random-walk Metropolis in log-space for productivity and
//!   capacity;
//! - single-site random-walk updates for the latent log-states of the
//!   state-space model, so one sweep stays O(N).
//!
//! Chains run on partitioned RNG streams and their post-warmup draws are
//! pooled. Degenerate output (non-finite draws, a Metropolis move that never
//! accepted) is reported as [`RecruitError::NonConvergence`]; no silent
//! repair is attempted, and convergence diagnostics beyond this check are
//! out of scope.

use serde::{Deserialize, Serialize};

use crate::engine::rng::StockRng;
use crate::error::{RecruitError, RecruitResult};
use crate::model::{
    ModelSpec, SimpleModel, StateSpaceModel, PRECISION_PRIOR_RATE, PRECISION_PRIOR_SHAPE,
};

/// Engine configuration: chain count and iteration schedule.
///
/// These are parameters of the engine collaborator, not of the models. The
/// reference configuration is 3 chains, 5000 adaptation iterations, and
/// 10000 post-warmup draws per chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of independent sampling chains.
    pub chains: usize,
    /// Adaptation (warm-up) iterations per chain, discarded.
    pub warmup: usize,
    /// Post-warmup draws kept per chain.
    pub iterations: usize,
    /// Keep latent state draws for state-space fits.
    pub keep_states: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chains: 3,
            warmup: 5000,
            iterations: 10_000,
            keep_states: true,
        }
    }
}

impl EngineConfig {
    /// A reduced schedule for smoke tests and panel sweeps.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            chains: 2,
            warmup: 1000,
            iterations: 2000,
            keep_states: false,
        }
    }
}

/// Pooled posterior draws, keyed by parameter name.
///
/// `states` is present only for state-space fits (and only when requested):
/// one latent state series per draw, natural scale.
#[derive(Debug, Clone, Serialize)]
pub struct PosteriorSample {
    /// Which model specification produced these draws.
    pub model: &'static str,
    /// Productivity draws.
    pub productivity: Vec<f64>,
    /// Capacity draws.
    pub capacity: Vec<f64>,
    /// Noise-precision draws (process precision for the state-space model).
    pub precision: Vec<f64>,
    /// Latent state series draws, if any.
    pub states: Option<Vec<Vec<f64>>>,
}

impl PosteriorSample {
    /// Total number of pooled draws.
    #[must_use]
    pub fn len(&self) -> usize {
        self.productivity.len()
    }

    /// True when no draws are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.productivity.is_empty()
    }
}

/// Engine seam: anything that can turn a model spec into posterior draws.
///
/// The bundled [`GibbsSampler`] is one binding; an external
/// probabilistic-programming engine would implement this same trait.
pub trait InferenceEngine {
    /// Fit the model and return pooled posterior draws.
    ///
    /// # Errors
    ///
    /// Returns [`RecruitError::NonConvergence`] on degenerate output.
    fn fit(&self, spec: &ModelSpec, rng: &mut StockRng) -> RecruitResult<PosteriorSample>;
}

/// Adaptive random-walk scale, tuned toward a target acceptance rate
/// during warmup with a Robbins-Monro decaying adjustment.
///
/// Adaptation looks at the acceptance rate of the most recent window only,
/// so a scale knocked off course early in warmup still corrects quickly.
#[derive(Debug, Clone)]
struct AdaptiveScale {
    scale: f64,
    accepted: u64,
    window_accepted: u64,
    window_attempted: u64,
    windows_done: u64,
    window: u64,
}

const TARGET_ACCEPTANCE: f64 = 0.44;

impl AdaptiveScale {
    fn new(scale: f64) -> Self {
        Self {
            scale,
            accepted: 0,
            window_accepted: 0,
            window_attempted: 0,
            windows_done: 0,
            window: 50,
        }
    }

    fn record(&mut self, accepted: bool, adapting: bool) {
        if accepted {
            self.accepted += 1;
        }
        if !adapting {
            return;
        }
        self.window_attempted += 1;
        if accepted {
            self.window_accepted += 1;
        }
        if self.window_attempted == self.window {
            self.windows_done += 1;
            let recent = self.window_accepted as f64 / self.window as f64;
            let step = (self.windows_done as f64).powf(-0.5);
            self.scale *= ((recent - TARGET_ACCEPTANCE) * step).exp();
            self.scale = self.scale.clamp(1e-4, 10.0);
            self.window_accepted = 0;
            self.window_attempted = 0;
        }
    }

    fn total_accepted(&self) -> u64 {
        self.accepted
    }
}

/// Bundled Metropolis-within-Gibbs sampler.
#[derive(Debug, Clone, Default)]
pub struct GibbsSampler {
    /// Iteration schedule.
    pub config: EngineConfig,
}

impl GibbsSampler {
    /// Create a sampler with the given schedule.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn fit_simple(&self, model: &SimpleModel, rng: &mut StockRng) -> RecruitResult<PosteriorSample> {
        let cfg = &self.config;
        let mut pooled = PosteriorSample {
            model: "simple",
            productivity: Vec::with_capacity(cfg.chains * cfg.iterations),
            capacity: Vec::with_capacity(cfg.chains * cfg.iterations),
            precision: Vec::with_capacity(cfg.chains * cfg.iterations),
            states: None,
        };

        for mut chain_rng in rng.partition(cfg.chains) {
            run_simple_chain(model, cfg, &mut chain_rng, &mut pooled)?;
        }
        check_draws("simple", &pooled)?;
        Ok(pooled)
    }

    fn fit_state_space(
        &self,
        model: &StateSpaceModel,
        rng: &mut StockRng,
    ) -> RecruitResult<PosteriorSample> {
        let cfg = &self.config;
        let mut pooled = PosteriorSample {
            model: "state_space",
            productivity: Vec::with_capacity(cfg.chains * cfg.iterations),
            capacity: Vec::with_capacity(cfg.chains * cfg.iterations),
            precision: Vec::with_capacity(cfg.chains * cfg.iterations),
            states: if cfg.keep_states {
                Some(Vec::with_capacity(cfg.chains * cfg.iterations))
            } else {
                None
            },
        };

        for mut chain_rng in rng.partition(cfg.chains) {
            run_state_space_chain(model, cfg, &mut chain_rng, &mut pooled)?;
        }
        check_draws("state_space", &pooled)?;
        Ok(pooled)
    }
}

impl InferenceEngine for GibbsSampler {
    fn fit(&self, spec: &ModelSpec, rng: &mut StockRng) -> RecruitResult<PosteriorSample> {
        match spec {
            ModelSpec::Simple(model) => self.fit_simple(model, rng),
            ModelSpec::StateSpace(model) => self.fit_state_space(model, rng),
        }
    }
}

/// Log-space random-walk Metropolis step for a positive scalar. Returns the
/// (possibly unchanged) value; the Jacobian of the log transform is folded
/// into the acceptance ratio.
fn log_walk_step<F>(
    current: f64,
    log_density: F,
    scale: &mut AdaptiveScale,
    adapting: bool,
    rng: &mut StockRng,
) -> f64
where
    F: Fn(f64) -> f64,
{
    let proposal = (current.ln() + scale.scale * rng.gen_standard_normal()).exp();
    let log_ratio =
        log_density(proposal) - log_density(current) + proposal.ln() - current.ln();
    let accept = log_ratio >= 0.0 || rng.gen_f64().ln() < log_ratio;
    scale.record(accept, adapting);
    if accept {
        proposal
    } else {
        current
    }
}

fn run_simple_chain(
    model: &SimpleModel,
    cfg: &EngineConfig,
    rng: &mut StockRng,
    pooled: &mut PosteriorSample,
) -> RecruitResult<()> {
    let n = model.len() as f64;

    // Data-informed starting point; the warmup washes out the remainder.
    let mut productivity = 3.0;
    let mut capacity = model
        .recruits
        .iter()
        .fold(f64::MIN, |a, &b| a.max(b))
        .max(1.0);
    let rss0 = model.residual_sum_squares(productivity, capacity).max(1e-6);
    let mut tau = n / rss0;

    let mut prod_scale = AdaptiveScale::new(0.2);
    let mut cap_scale = AdaptiveScale::new(0.2);

    for iter in 0..cfg.warmup + cfg.iterations {
        let adapting = iter < cfg.warmup;

        productivity = log_walk_step(
            productivity,
            |p| model.log_posterior(p, capacity, tau),
            &mut prod_scale,
            adapting,
            rng,
        );
        capacity = log_walk_step(
            capacity,
            |c| model.log_posterior(productivity, c, tau),
            &mut cap_scale,
            adapting,
            rng,
        );

        // Conjugate update: tau | rest ~ Gamma(a0 + n/2, b0 + rss/2)
        let rss = model.residual_sum_squares(productivity, capacity);
        tau = rng.gen_gamma(
            PRECISION_PRIOR_SHAPE + 0.5 * n,
            PRECISION_PRIOR_RATE + 0.5 * rss,
        );

        if !adapting {
            pooled.productivity.push(productivity);
            pooled.capacity.push(capacity);
            pooled.precision.push(tau);
        }
    }

    if prod_scale.total_accepted() == 0 || cap_scale.total_accepted() == 0 {
        return Err(RecruitError::non_convergence(
            "simple",
            "a Metropolis move never accepted",
        ));
    }
    Ok(())
}

fn run_state_space_chain(
    model: &StateSpaceModel,
    cfg: &EngineConfig,
    rng: &mut StockRng,
    pooled: &mut PosteriorSample,
) -> RecruitResult<()> {
    let n = model.len();
    let transitions = (n - 1) as f64;

    // The observed series is an excellent chain initializer: it sits within
    // observation error of the truth by construction.
    let mut log_states: Vec<f64> = model.observed.iter().map(|o| o.ln()).collect();
    let mut productivity = 3.0;
    let mut capacity = model
        .observed
        .iter()
        .fold(f64::MIN, |a, &b| a.max(b))
        .max(1.0);
    let rss0 = model
        .process_rss(&log_states, productivity, capacity)
        .max(1e-6);
    let mut tau = transitions / rss0;

    let mut prod_scale = AdaptiveScale::new(0.2);
    let mut cap_scale = AdaptiveScale::new(0.2);
    let mut site_scales: Vec<AdaptiveScale> =
        (0..n).map(|_| AdaptiveScale::new(0.1)).collect();

    for iter in 0..cfg.warmup + cfg.iterations {
        let adapting = iter < cfg.warmup;

        // Single-site sweep over the latent chain.
        for i in 0..n {
            let before = model.local_log_density(i, &log_states, productivity, capacity, tau);
            let old = log_states[i];
            log_states[i] = old + site_scales[i].scale * rng.gen_standard_normal();
            let after = model.local_log_density(i, &log_states, productivity, capacity, tau);

            let log_ratio = after - before;
            let accept = log_ratio >= 0.0 || rng.gen_f64().ln() < log_ratio;
            if !accept {
                log_states[i] = old;
            }
            site_scales[i].record(accept, adapting);
        }

        productivity = log_walk_step(
            productivity,
            |p| model.curve_log_density(p, capacity, tau, &log_states),
            &mut prod_scale,
            adapting,
            rng,
        );
        capacity = log_walk_step(
            capacity,
            |c| model.curve_log_density(productivity, c, tau, &log_states),
            &mut cap_scale,
            adapting,
            rng,
        );

        // Conjugate update for the process precision.
        let rss = model.process_rss(&log_states, productivity, capacity);
        tau = rng.gen_gamma(
            PRECISION_PRIOR_SHAPE + 0.5 * transitions,
            PRECISION_PRIOR_RATE + 0.5 * rss,
        );

        if !adapting {
            pooled.productivity.push(productivity);
            pooled.capacity.push(capacity);
            pooled.precision.push(tau);
            if let Some(states) = pooled.states.as_mut() {
                states.push(log_states.iter().map(|x| x.exp()).collect());
            }
        }
    }

    if prod_scale.total_accepted() == 0 || cap_scale.total_accepted() == 0 {
        return Err(RecruitError::non_convergence(
            "state_space",
            "a Metropolis move never accepted",
        ));
    }
    Ok(())
}

fn check_draws(model: &'static str, sample: &PosteriorSample) -> RecruitResult<()> {
    if sample.is_empty() {
        return Err(RecruitError::non_convergence(model, "no draws produced"));
    }
    let finite = sample.productivity.iter().all(|x| x.is_finite() && *x > 0.0)
        && sample.capacity.iter().all(|x| x.is_finite() && *x > 0.0)
        && sample.precision.iter().all(|x| x.is_finite() && *x > 0.0);
    if finite {
        Ok(())
    } else {
        Err(RecruitError::non_convergence(
            model,
            "non-finite or non-positive posterior draws",
        ))
    }
}
