//! Posterior summarization and derived-quantity computation.
//!
//! Operates purely on arrays of posterior draws; it knows nothing about
//! which model produced them beyond the named parameters present. Latent
//! state draws are ignored unless explicitly requested through
//! [`latent_state_summary`].

use serde::{Deserialize, Serialize};

use crate::error::{RecruitError, RecruitResult};
use crate::inference::PosteriorSample;

/// Point estimate, dispersion, and credible interval for one parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSummary {
    /// Posterior median.
    pub median: f64,
    /// Posterior standard deviation.
    pub sd: f64,
    /// 2.5% empirical quantile.
    pub q025: f64,
    /// 50% empirical quantile.
    pub q500: f64,
    /// 97.5% empirical quantile.
    pub q975: f64,
}

impl ParameterSummary {
    /// Summarize a set of draws.
    ///
    /// # Errors
    ///
    /// Returns a non-convergence style configuration error on an empty set.
    pub fn from_draws(draws: &[f64]) -> RecruitResult<Self> {
        if draws.is_empty() {
            return Err(RecruitError::config("cannot summarize zero draws"));
        }
        let mut sorted = draws.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / draws.len() as f64;
        let q500 = quantile(&sorted, 0.5);

        Ok(Self {
            median: q500,
            sd: var.sqrt(),
            q025: quantile(&sorted, 0.025),
            q500,
            q975: quantile(&sorted, 0.975),
        })
    }

    /// Width of the 95% credible interval.
    #[must_use]
    pub fn interval_width(&self) -> f64 {
        self.q975 - self.q025
    }
}

/// Empirical quantile with linear interpolation over a sorted slice.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Harvest rate at maximum sustainable yield for one productivity draw:
/// `U = 1 - 1/sqrt(productivity)`.
///
/// # Errors
///
/// The lognormal prior keeps productivity strictly positive by construction,
/// so a non-positive draw signals a specification or engine defect and is
/// surfaced as [`RecruitError::DerivedQuantityDomain`] rather than masked.
pub fn umsy(productivity: f64, index: usize) -> RecruitResult<f64> {
    if productivity > 0.0 {
        Ok(1.0 - 1.0 / productivity.sqrt())
    } else {
        Err(RecruitError::DerivedQuantityDomain {
            index,
            value: productivity,
        })
    }
}

/// Full standard summary of one posterior sample.
#[derive(Debug, Clone, Serialize)]
pub struct PosteriorSummary {
    /// Which model the sample came from.
    pub model: &'static str,
    /// Productivity summary.
    pub productivity: ParameterSummary,
    /// Capacity summary.
    pub capacity: ParameterSummary,
    /// Noise SD summary (`sqrt(1/precision)` elementwise over draws). For
    /// the state-space model this is the recovered process-error SD; for
    /// the simple model it conflates process and observation noise.
    pub noise_sd: ParameterSummary,
    /// Harvest rate at MSY, derived per draw.
    pub umsy: ParameterSummary,
}

/// Compute the standard summary for a posterior sample.
///
/// Latent state draws, when present, are ignored here.
///
/// # Errors
///
/// Propagates empty-draw and derived-quantity domain errors.
pub fn summarize(sample: &PosteriorSample) -> RecruitResult<PosteriorSummary> {
    let noise_sd: Vec<f64> = sample
        .precision
        .iter()
        .map(|&tau| (1.0 / tau).sqrt())
        .collect();

    let umsy_draws = sample
        .productivity
        .iter()
        .enumerate()
        .map(|(i, &p)| umsy(p, i))
        .collect::<RecruitResult<Vec<f64>>>()?;

    Ok(PosteriorSummary {
        model: sample.model,
        productivity: ParameterSummary::from_draws(&sample.productivity)?,
        capacity: ParameterSummary::from_draws(&sample.capacity)?,
        noise_sd: ParameterSummary::from_draws(&noise_sd)?,
        umsy: ParameterSummary::from_draws(&umsy_draws)?,
    })
}

/// Per-year summaries of the latent state draws, for callers that
/// explicitly want them. Returns `None` when the sample carries no states.
///
/// # Errors
///
/// Returns an error on empty draw sets.
pub fn latent_state_summary(
    sample: &PosteriorSample,
) -> RecruitResult<Option<Vec<ParameterSummary>>> {
    let Some(states) = sample.states.as_ref() else {
        return Ok(None);
    };
    if states.is_empty() {
        return Err(RecruitError::config("state draws present but empty"));
    }

    let years = states[0].len();
    let mut summaries = Vec::with_capacity(years);
    let mut column = Vec::with_capacity(states.len());
    for year in 0..years {
        column.clear();
        column.extend(states.iter().map(|draw| draw[year]));
        summaries.push(ParameterSummary::from_draws(&column)?);
    }
    Ok(Some(summaries))
}
