//! # recruitsim
//!
//! Stock-recruitment simulation and Bayesian estimation for fisheries
//! management.
//!
//! Simulates spawner/recruit time series under Beverton-Holt dynamics with
//! harvest and hatchery-origin adjustments, then fits two competing Bayesian
//! models to the noisy observations:
//! - a simple regression model that treats the observed series as truth;
//! - a state-space model with an explicit latent Markov chain separating
//!   process variability from observation error.
//!
//! Posterior samples feed a model-agnostic summarization stage that derives
//! management quantities, notably the harvest rate at maximum sustainable
//! yield `U = 1 - 1/sqrt(productivity)`. The comparative panel sweeps
//! process-error magnitudes to show where the simple model's single
//! precision conflates the two noise sources.
//!
//! ## Example
//!
//! ```rust
//! use recruitsim::prelude::*;
//!
//! let mut rng = StockRng::new(123);
//! let config = ScenarioConfig::builder()
//!     .process_error_sd(0.1)
//!     .build();
//! let sim = simulate_config(&config, &mut rng).unwrap();
//! assert_eq!(sim.observed.len(), 100);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Numerical code choices are intentional
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,  // Many functions can't be const in stable Rust
    clippy::needless_range_loop,   // Sometimes range loops are clearer
)]

pub mod engine;
pub mod error;
pub mod inference;
pub mod model;
pub mod panel;
pub mod scenario;
pub mod simulator;
pub mod summary;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::engine::rng::StockRng;
    pub use crate::error::{RecruitError, RecruitResult};
    pub use crate::inference::{EngineConfig, GibbsSampler, InferenceEngine, PosteriorSample};
    pub use crate::model::{ModelSpec, SimpleModel, StateSpaceModel};
    pub use crate::panel::{run_panel, PanelConfig};
    pub use crate::scenario::{ScenarioConfig, ScenarioConfigBuilder};
    pub use crate::simulator::{bevholt, simulate, simulate_config, Simulation};
    pub use crate::summary::{summarize, ParameterSummary, PosteriorSummary};
}

/// Re-export for public API
pub use error::{RecruitError, RecruitResult};
