//! Error types for recruitsim.
//!
//! All fallible library functions return `Result<T, RecruitError>` instead of
//! panicking. Configuration errors are raised before any simulation or
//! sampling cost is incurred; per-run failures (degenerate simulations,
//! non-converged fits) are reported to the caller without aborting an
//! enclosing batch.

use thiserror::Error;

/// Result type alias for recruitsim operations.
pub type RecruitResult<T> = Result<T, RecruitError>;

/// Unified error type for all recruitsim operations.
#[derive(Debug, Error)]
pub enum RecruitError {
    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A per-year schedule does not match the configured number of years.
    #[error("Configuration error: {schedule} has length {found}, expected {expected}")]
    ScheduleLength {
        /// Which schedule is malformed.
        schedule: &'static str,
        /// Length found.
        found: usize,
        /// Length required (`num_years`).
        expected: usize,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== Simulation Errors =====
    /// A generated population state became non-positive or non-finite.
    ///
    /// Fatal for the simulation run. The process is deterministic given its
    /// random draws, so no retry is attempted; the caller must supply a new
    /// seed explicitly.
    #[error("Simulation degeneracy: state {value:.6e} at year {year} is not strictly positive and finite")]
    DegenerateState {
        /// Zero-based year index of the offending state.
        year: usize,
        /// The degenerate value.
        value: f64,
    },

    // ===== Inference Errors =====
    /// The sampling engine produced degenerate posterior draws.
    ///
    /// Reported as-is; no silent repair. Convergence diagnostics beyond this
    /// degeneracy check are the inference engine's responsibility.
    #[error("Fit non-convergence for {model}: {reason}")]
    NonConvergence {
        /// Which model specification was being fit.
        model: &'static str,
        /// What was observed (e.g. non-finite draws, zero acceptance).
        reason: String,
    },

    /// A posterior draw left the domain of a derived quantity.
    ///
    /// `U = 1 - 1/sqrt(productivity)` is undefined for non-positive
    /// productivity. The lognormal prior constrains productivity to be
    /// strictly positive, so this signals a specification or engine defect
    /// and is surfaced immediately rather than masked.
    #[error("Derived quantity domain error: productivity draw {value:.6e} at index {index} is not strictly positive")]
    DerivedQuantityDomain {
        /// Draw index within the posterior sample.
        index: usize,
        /// The offending draw.
        value: f64,
    },

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecruitError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a non-convergence error for the named model.
    #[must_use]
    pub fn non_convergence(model: &'static str, reason: impl Into<String>) -> Self {
        Self::NonConvergence {
            model,
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error (including schedule shape).
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::ScheduleLength { .. } | Self::Validation(_)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = RecruitError::config("hatchery proportion must be below 1");
        assert!(err.to_string().contains("hatchery proportion"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_schedule_length_display() {
        let err = RecruitError::ScheduleLength {
            schedule: "harvest_rate",
            found: 5,
            expected: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("harvest_rate"), "message: {msg}");
        assert!(msg.contains('5') && msg.contains("10"), "message: {msg}");
        assert!(err.is_config_error());
    }

    #[test]
    fn test_degenerate_state_is_not_config() {
        let err = RecruitError::DegenerateState {
            year: 3,
            value: f64::NAN,
        };
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecruitError>();
    }
}
