//! Declarative Bayesian model specifications.
//!
//! The two competing models, simple regression and state-space, are data,
//! not imperative code: each carries its
//! prepared input bindings, its parameter declarations with priors, and
//! log-density evaluation. Any inference engine binding (the bundled
//! Gibbs/Metropolis sampler, or an external probabilistic-programming
//! system) consumes this surface without the core depending on a specific
//! engine API.
//!
//! Convention note: priors and likelihoods here are parameterized by
//! precision (`tau = 1 / sigma^2`), while the simulator draws with a
//! log-space SD. The translation happens exactly once, in
//! [`Prior::sd_from_precision`].

pub mod simple;
pub mod state_space;

use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;

pub use simple::SimpleModel;
pub use state_space::StateSpaceModel;

/// Log-mean of the productivity prior (both models).
pub const PRODUCTIVITY_PRIOR_LOG_MEAN: f64 = 1.098_612_288_668_109_8; // ln 3
/// Precision of the productivity prior.
pub const PRODUCTIVITY_PRIOR_PRECISION: f64 = 0.01;
/// Log-mean of the capacity prior (both models).
pub const CAPACITY_PRIOR_LOG_MEAN: f64 = 9.615_805_480_084_347; // ln 15000
/// Precision of the capacity prior.
pub const CAPACITY_PRIOR_PRECISION: f64 = 0.001;
/// Shape of the Gamma prior on the noise precision (both models).
pub const PRECISION_PRIOR_SHAPE: f64 = 0.001;
/// Rate of the Gamma prior on the noise precision.
pub const PRECISION_PRIOR_RATE: f64 = 0.001;

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// A prior distribution over one scalar parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Prior {
    /// Lognormal prior given by log-space mean and log-space precision.
    Lognormal {
        /// Mean in log-space.
        log_mean: f64,
        /// Precision (inverse variance) in log-space.
        precision: f64,
    },
    /// Gamma prior in shape/rate parameterization (mean = shape / rate).
    Gamma {
        /// Shape parameter.
        shape: f64,
        /// Rate parameter.
        rate: f64,
    },
}

impl Prior {
    /// Convert a precision into the log-space SD the simulator convention
    /// uses. The only sanctioned crossing between the two conventions.
    #[must_use]
    pub fn sd_from_precision(precision: f64) -> f64 {
        (1.0 / precision).sqrt()
    }

    /// Log-density at `x` on the natural scale.
    ///
    /// Returns negative infinity outside the support, so Metropolis
    /// proposals that leave the support are rejected with certainty.
    #[must_use]
    pub fn log_density(&self, x: f64) -> f64 {
        if x <= 0.0 || !x.is_finite() {
            return f64::NEG_INFINITY;
        }
        match *self {
            Self::Lognormal { log_mean, precision } => {
                lognormal_log_density(x, log_mean, precision)
            }
            Self::Gamma { shape, rate } => {
                shape * rate.ln() - ln_gamma(shape) + (shape - 1.0) * x.ln() - rate * x
            }
        }
    }
}

/// Lognormal log-density with log-mean and log-space precision.
#[must_use]
pub fn lognormal_log_density(x: f64, log_mean: f64, precision: f64) -> f64 {
    if x <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let z = x.ln() - log_mean;
    0.5 * (precision.ln() - LN_2PI) - x.ln() - 0.5 * precision * z * z
}

/// Normal log-density with mean and precision, used for the latent chain in
/// log-space (a lognormal state density plus its log-transform Jacobian).
#[must_use]
pub fn normal_log_density(x: f64, mean: f64, precision: f64) -> f64 {
    let z = x - mean;
    0.5 * (precision.ln() - LN_2PI) - 0.5 * precision * z * z
}

/// One latent parameter: a name the posterior sample is keyed by, plus its
/// prior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDecl {
    /// Parameter name (`productivity`, `capacity`, `precision`).
    pub name: &'static str,
    /// Prior distribution.
    pub prior: Prior,
}

/// The prior block shared by both model variants.
#[must_use]
pub fn shared_parameters() -> Vec<ParameterDecl> {
    vec![
        ParameterDecl {
            name: "productivity",
            prior: Prior::Lognormal {
                log_mean: PRODUCTIVITY_PRIOR_LOG_MEAN,
                precision: PRODUCTIVITY_PRIOR_PRECISION,
            },
        },
        ParameterDecl {
            name: "capacity",
            prior: Prior::Lognormal {
                log_mean: CAPACITY_PRIOR_LOG_MEAN,
                precision: CAPACITY_PRIOR_PRECISION,
            },
        },
        ParameterDecl {
            name: "precision",
            prior: Prior::Gamma {
                shape: PRECISION_PRIOR_SHAPE,
                rate: PRECISION_PRIOR_RATE,
            },
        },
    ]
}

/// Tagged union of the two model specifications.
///
/// The variants share prior forms for productivity, capacity, and the noise
/// precision; they differ in observability: `Simple` regresses adjusted
/// recruits on observed spawners directly, `StateSpace` carries an explicit
/// latent Markov chain separating process variability from observation
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Regression model on the observed series.
    Simple(SimpleModel),
    /// Latent-chain model.
    StateSpace(StateSpaceModel),
}

impl ModelSpec {
    /// Stable name used in error reports and panel tables.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Simple(_) => "simple",
            Self::StateSpace(_) => "state_space",
        }
    }

    /// Declared latent parameters with their priors.
    #[must_use]
    pub fn parameters(&self) -> Vec<ParameterDecl> {
        // Identical prior block; the state-space variant additionally
        // carries its latent states, which are declared implicitly by the
        // chain structure rather than as named scalars.
        shared_parameters()
    }

    /// Whether fitting this spec yields latent state draws.
    #[must_use]
    pub const fn has_latent_states(&self) -> bool {
        matches!(self, Self::StateSpace(_))
    }
}
