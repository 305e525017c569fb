//! Comparative-analysis mode.
//!
//! Runs both model specifications against a panel of simulated datasets
//! that differ only in process-error SD, with the fixed seed re-applied
//! before each level so distinct error levels stay comparable. Produces the
//! core empirical finding of the system: both models degrade as process
//! error grows, but the state-space model's credible intervals stay tighter
//! and it alone recovers a meaningful process-error estimate.
//!
//! A failed simulation or fit records a failure marker for its cell and the
//! sweep continues; one bad level never aborts the batch.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::engine::rng::StockRng;
use crate::error::RecruitResult;
use crate::inference::{EngineConfig, GibbsSampler, InferenceEngine, PosteriorSample};
use crate::model::{ModelSpec, SimpleModel, StateSpaceModel};
use crate::scenario::ScenarioConfig;
use crate::simulator::{simulate_config, Simulation};
use crate::summary::{summarize, PosteriorSummary};

/// Reference seed of the comparative analysis.
pub const PANEL_SEED: u64 = 123;

/// Process-error levels of the reference panel: 0.1 to 0.7 in 0.1 steps.
pub const PANEL_ERROR_LEVELS: [f64; 7] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7];

/// Configuration for one panel sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Seed re-applied before each level's simulation.
    pub seed: u64,
    /// Process-error SDs to sweep.
    pub error_levels: Vec<f64>,
    /// Engine schedule shared by every fit.
    pub engine: EngineConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            seed: PANEL_SEED,
            error_levels: PANEL_ERROR_LEVELS.to_vec(),
            engine: EngineConfig::default(),
        }
    }
}

/// One cell of the panel: a summarized fit, or a failure marker.
#[derive(Debug, Clone, Serialize)]
pub enum PanelCell {
    /// Successful fit.
    Fit(PosteriorSummary),
    /// Simulation or fit failure, reported as-is.
    Failed(String),
}

impl PanelCell {
    /// The summary, if the cell succeeded.
    #[must_use]
    pub const fn summary(&self) -> Option<&PosteriorSummary> {
        match self {
            Self::Fit(summary) => Some(summary),
            Self::Failed(_) => None,
        }
    }
}

/// Both models' results at one process-error level.
#[derive(Debug, Clone, Serialize)]
pub struct PanelRow {
    /// Process-error SD used for this level's simulation.
    pub process_error_sd: f64,
    /// Simple-model cell.
    pub simple: PanelCell,
    /// State-space-model cell.
    pub state_space: PanelCell,
}

/// Run the comparative panel.
///
/// Per level: reseed, simulate the canonical scenario at that process-error
/// SD, fit both models on the same observed series, summarize. Cell
/// failures are recorded, not propagated.
///
/// # Errors
///
/// Only configuration errors in `config` itself abort the sweep.
pub fn run_panel(config: &PanelConfig) -> RecruitResult<Vec<PanelRow>> {
    let sampler = GibbsSampler::new(config.engine.clone());
    let mut rows = Vec::with_capacity(config.error_levels.len());

    for &level in &config.error_levels {
        // Fresh stream per level: identical draws underneath each error
        // magnitude keep the levels comparable.
        let mut rng = StockRng::new(config.seed);
        let scenario = ScenarioConfig::builder().process_error_sd(level).build();

        let row = match simulate_config(&scenario, &mut rng) {
            Ok(sim) => {
                let mut fit_rngs = rng.partition(2);
                PanelRow {
                    process_error_sd: level,
                    simple: fit_cell(
                        prepare_simple(&sim),
                        &sampler,
                        &mut fit_rngs[0],
                    ),
                    state_space: fit_cell(
                        prepare_state_space(&sim),
                        &sampler,
                        &mut fit_rngs[1],
                    ),
                }
            }
            Err(err) => PanelRow {
                process_error_sd: level,
                simple: PanelCell::Failed(err.to_string()),
                state_space: PanelCell::Failed(err.to_string()),
            },
        };
        rows.push(row);
    }

    Ok(rows)
}

fn prepare_simple(sim: &Simulation) -> RecruitResult<ModelSpec> {
    Ok(ModelSpec::Simple(SimpleModel::prepare(sim)?))
}

fn prepare_state_space(sim: &Simulation) -> RecruitResult<ModelSpec> {
    Ok(ModelSpec::StateSpace(StateSpaceModel::prepare(sim)?))
}

fn fit_cell(
    spec: RecruitResult<ModelSpec>,
    sampler: &GibbsSampler,
    rng: &mut StockRng,
) -> PanelCell {
    let result: RecruitResult<PosteriorSummary> = spec.and_then(|spec| {
        let sample: PosteriorSample = sampler.fit(&spec, rng)?;
        summarize(&sample)
    });
    match result {
        Ok(summary) => PanelCell::Fit(summary),
        Err(err) => PanelCell::Failed(err.to_string()),
    }
}

/// Render the panel as a plain-text table for the CLI. Anything fancier is
/// the reporting collaborator's job.
#[must_use]
pub fn render_table(rows: &[PanelRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>8}  {:>11}  {:>12} {:>10}  {:>12} {:>10}  {:>12}",
        "proc_sd", "model", "prod_median", "prod_sd", "cap_median", "cap_sd", "proc_sd_est"
    );

    for row in rows {
        for (name, cell, show_process_sd) in [
            ("simple", &row.simple, false),
            ("state_space", &row.state_space, true),
        ] {
            match cell {
                PanelCell::Fit(summary) => {
                    let process_sd = if show_process_sd {
                        format!("{:12.4}", summary.noise_sd.median)
                    } else {
                        format!("{:>12}", "-")
                    };
                    let _ = writeln!(
                        out,
                        "{:>8.1}  {:>11}  {:>12.4} {:>10.4}  {:>12.1} {:>10.1}  {}",
                        row.process_error_sd,
                        name,
                        summary.productivity.median,
                        summary.productivity.sd,
                        summary.capacity.median,
                        summary.capacity.sd,
                        process_sd,
                    );
                }
                PanelCell::Failed(reason) => {
                    let _ = writeln!(
                        out,
                        "{:>8.1}  {:>11}  FAILED: {reason}",
                        row.process_error_sd, name,
                    );
                }
            }
        }
    }
    out
}
