//! Scenario configuration with YAML schema and validation.
//!
//! Mistake-proofing through:
//! - Type-safe configuration structs
//! - Compile-time validation via serde
//! - Runtime semantic validation, applied before any simulation cost
//!
//! A `ScenarioConfig` describes one simulation run: year count, per-year
//! harvest and hatchery-origin schedules, error magnitudes, and the fixed
//! ground-truth parameters used only by the simulator. Resolution into a
//! concrete [`ResolvedScenario`] fills in the canonical default scenario
//! where schedule fields are absent.

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::engine::rng::StockRng;
use crate::error::{RecruitError, RecruitResult};

/// Canonical default year count when the schedule fields are absent.
pub const DEFAULT_NUM_YEARS: usize = 100;

/// Harvest-rate levels of the canonical default scenario: 0 to 0.63 in
/// steps of 0.07, each level held for `num_years / 10` years.
pub const DEFAULT_HARVEST_LEVELS: [f64; 10] =
    [0.0, 0.07, 0.14, 0.21, 0.28, 0.35, 0.42, 0.49, 0.56, 0.63];

/// Hatchery-proportion levels of the canonical default scenario: 0 to 0.9
/// in steps of 0.1, each level held for `num_years / 10` years.
pub const DEFAULT_HATCHERY_LEVELS: [f64; 10] =
    [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

fn default_process_error_sd() -> f64 {
    0.1
}

fn default_observation_error_sd() -> f64 {
    0.15
}

fn default_initial_state() -> f64 {
    1000.0
}

fn default_true_productivity() -> f64 {
    2.5
}

fn default_true_capacity() -> f64 {
    1200.0
}

/// Configuration for one stock-recruitment simulation run.
///
/// Loaded from YAML with schema validation, or assembled with the builder.
///
/// # Defaulting quirk (preserved from the reference design)
///
/// `num_years`, `harvest_rate`, and `hatchery_proportion` default
/// all-or-nothing: if ANY of the three is absent, the canonical 100-year
/// scenario replaces ALL three (a schedule supplied alongside a missing
/// `num_years` is therefore discarded). The two error SDs default
/// independently of that substitution and of each other. Do not unify the
/// two strategies; downstream analyses depend on the observed behavior.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Number of time steps (years). Absent: canonical default scenario.
    #[serde(default)]
    pub num_years: Option<usize>,

    /// Fraction of the population removed by harvest, one entry per year,
    /// each in [0, 1). Absent: canonical default scenario.
    #[serde(default)]
    pub harvest_rate: Option<Vec<f64>>,

    /// Fraction of spawners of hatchery origin, one entry per year, each in
    /// [0, 1). Absent: canonical default scenario.
    #[serde(default)]
    pub hatchery_proportion: Option<Vec<f64>>,

    /// Standard deviation of process noise, log-space.
    #[serde(default = "default_process_error_sd")]
    #[validate(range(min = 0.0))]
    pub process_error_sd: f64,

    /// Standard deviation of observation noise, log-space.
    #[serde(default = "default_observation_error_sd")]
    #[validate(range(min = 0.0))]
    pub observation_error_sd: f64,

    /// Population state at year 1.
    #[serde(default = "default_initial_state")]
    #[validate(range(min = 1e-12))]
    pub initial_state: f64,

    /// Ground-truth productivity, used only by the simulator.
    #[serde(default = "default_true_productivity")]
    #[validate(range(min = 1e-12))]
    pub true_productivity: f64,

    /// Ground-truth capacity, used only by the simulator.
    #[serde(default = "default_true_capacity")]
    #[validate(range(min = 1e-12))]
    pub true_capacity: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            num_years: None,
            harvest_rate: None,
            hatchery_proportion: None,
            process_error_sd: default_process_error_sd(),
            observation_error_sd: default_observation_error_sd(),
            initial_state: default_initial_state(),
            true_productivity: default_true_productivity(),
            true_capacity: default_true_capacity(),
        }
    }
}

impl ScenarioConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, YAML parsing fails, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> RecruitResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> RecruitResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        config.validate_semantic()?;
        Ok(config)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> ScenarioConfigBuilder {
        ScenarioConfigBuilder::default()
    }

    /// Validate semantic constraints beyond schema ranges.
    ///
    /// Rejects, before any simulation begins:
    /// - schedule lengths that do not match `num_years`;
    /// - harvest or hatchery entries outside [0, 1), in particular a
    ///   hatchery proportion of exactly 1, which would divide by zero in
    ///   the process recurrence;
    /// - non-finite error magnitudes or ground-truth parameters.
    pub fn validate_semantic(&self) -> RecruitResult<()> {
        if let (Some(n), Some(harvest)) = (self.num_years, self.harvest_rate.as_ref()) {
            if harvest.len() != n {
                return Err(RecruitError::ScheduleLength {
                    schedule: "harvest_rate",
                    found: harvest.len(),
                    expected: n,
                });
            }
        }
        if let (Some(n), Some(hatchery)) = (self.num_years, self.hatchery_proportion.as_ref()) {
            if hatchery.len() != n {
                return Err(RecruitError::ScheduleLength {
                    schedule: "hatchery_proportion",
                    found: hatchery.len(),
                    expected: n,
                });
            }
        }

        if let Some(harvest) = &self.harvest_rate {
            validate_rates("harvest_rate", harvest)?;
        }
        if let Some(hatchery) = &self.hatchery_proportion {
            validate_rates("hatchery_proportion", hatchery)?;
        }

        if let Some(n) = self.num_years {
            if n == 0 {
                return Err(RecruitError::config("num_years must be at least 1"));
            }
        }

        for (name, value) in [
            ("process_error_sd", self.process_error_sd),
            ("observation_error_sd", self.observation_error_sd),
            ("initial_state", self.initial_state),
            ("true_productivity", self.true_productivity),
            ("true_capacity", self.true_capacity),
        ] {
            if !value.is_finite() {
                return Err(RecruitError::config(format!("{name} must be finite")));
            }
        }

        Ok(())
    }

    /// Resolve into a concrete scenario, substituting canonical defaults.
    ///
    /// If any of `num_years` / `harvest_rate` / `hatchery_proportion` is
    /// absent, ALL three are replaced by the canonical default scenario:
    /// 100 years, harvest levels [`DEFAULT_HARVEST_LEVELS`] and hatchery
    /// levels [`DEFAULT_HATCHERY_LEVELS`], each level held for a tenth of
    /// the run and then globally shuffled via [`leveled_schedule`]. Error
    /// SDs are never substituted here; their serde defaults apply
    /// independently.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before any stochastic work if the
    /// config fails [`Self::validate_semantic`].
    pub fn resolve(&self, rng: &mut StockRng) -> RecruitResult<ResolvedScenario> {
        self.validate()?;
        self.validate_semantic()?;

        let (num_years, harvest_rate, hatchery_proportion) = match (
            self.num_years,
            self.harvest_rate.clone(),
            self.hatchery_proportion.clone(),
        ) {
            (Some(n), Some(harvest), Some(hatchery)) => (n, harvest, hatchery),
            _ => {
                let n = DEFAULT_NUM_YEARS;
                let repeats = n / DEFAULT_HARVEST_LEVELS.len();
                let harvest = leveled_schedule(&DEFAULT_HARVEST_LEVELS, repeats, rng);
                let hatchery = leveled_schedule(&DEFAULT_HATCHERY_LEVELS, repeats, rng);
                (n, harvest, hatchery)
            }
        };

        Ok(ResolvedScenario {
            num_years,
            harvest_rate,
            hatchery_proportion,
            process_error_sd: self.process_error_sd,
            observation_error_sd: self.observation_error_sd,
            initial_state: self.initial_state,
            true_productivity: self.true_productivity,
            true_capacity: self.true_capacity,
        })
    }
}

fn validate_rates(name: &'static str, values: &[f64]) -> RecruitResult<()> {
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() || !(0.0..1.0).contains(&v) {
            return Err(RecruitError::config(format!(
                "{name}[{i}] = {v} is outside [0, 1)"
            )));
        }
    }
    Ok(())
}

/// Generate a leveled schedule: each level repeated `repeats_per_level`
/// times, then one full random permutation of the whole sequence.
///
/// The permutation guarantees the exact multiset of levels appears while
/// randomizing their temporal assignment, avoiding artificial clustering of
/// similar years. It is a full shuffle, not a per-element redraw.
#[must_use]
pub fn leveled_schedule(levels: &[f64], repeats_per_level: usize, rng: &mut StockRng) -> Vec<f64> {
    let mut schedule: Vec<f64> = levels
        .iter()
        .flat_map(|&level| std::iter::repeat(level).take(repeats_per_level))
        .collect();
    rng.shuffle(&mut schedule);
    schedule
}

/// A fully concrete scenario: every schedule materialized, every default
/// applied. Immutable input to the simulator; must not be mutated after
/// generation so repeated runs stay comparable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedScenario {
    /// Number of time steps.
    pub num_years: usize,
    /// Harvest rate per year, each in [0, 1).
    pub harvest_rate: Vec<f64>,
    /// Hatchery-origin proportion per year, each in [0, 1).
    pub hatchery_proportion: Vec<f64>,
    /// Process noise SD, log-space.
    pub process_error_sd: f64,
    /// Observation noise SD, log-space.
    pub observation_error_sd: f64,
    /// Population state at year 1.
    pub initial_state: f64,
    /// Ground-truth productivity.
    pub true_productivity: f64,
    /// Ground-truth capacity.
    pub true_capacity: f64,
}

/// Builder for [`ScenarioConfig`].
#[derive(Debug, Default)]
pub struct ScenarioConfigBuilder {
    config: ScenarioConfig,
}

impl ScenarioConfigBuilder {
    /// Set the number of years.
    #[must_use]
    pub fn num_years(mut self, n: usize) -> Self {
        self.config.num_years = Some(n);
        self
    }

    /// Set the harvest-rate schedule.
    #[must_use]
    pub fn harvest_rate(mut self, schedule: Vec<f64>) -> Self {
        self.config.harvest_rate = Some(schedule);
        self
    }

    /// Set the hatchery-proportion schedule.
    #[must_use]
    pub fn hatchery_proportion(mut self, schedule: Vec<f64>) -> Self {
        self.config.hatchery_proportion = Some(schedule);
        self
    }

    /// Set the process-noise SD (log-space).
    #[must_use]
    pub fn process_error_sd(mut self, sd: f64) -> Self {
        self.config.process_error_sd = sd;
        self
    }

    /// Set the observation-noise SD (log-space).
    #[must_use]
    pub fn observation_error_sd(mut self, sd: f64) -> Self {
        self.config.observation_error_sd = sd;
        self
    }

    /// Set the initial population state.
    #[must_use]
    pub fn initial_state(mut self, state: f64) -> Self {
        self.config.initial_state = state;
        self
    }

    /// Set the ground-truth productivity.
    #[must_use]
    pub fn true_productivity(mut self, productivity: f64) -> Self {
        self.config.true_productivity = productivity;
        self
    }

    /// Set the ground-truth capacity.
    #[must_use]
    pub fn true_capacity(mut self, capacity: f64) -> Self {
        self.config.true_capacity = capacity;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> ScenarioConfig {
        self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_resolves_to_canonical_scenario() {
        let config = ScenarioConfig::default();
        let mut rng = StockRng::new(123);
        let scenario = config.resolve(&mut rng).unwrap();

        assert_eq!(scenario.num_years, 100);
        assert_eq!(scenario.harvest_rate.len(), 100);
        assert_eq!(scenario.hatchery_proportion.len(), 100);
        assert!((scenario.process_error_sd - 0.1).abs() < f64::EPSILON);
        assert!((scenario.observation_error_sd - 0.15).abs() < f64::EPSILON);
        assert!((scenario.initial_state - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_canonical_harvest_schedule_multiset() {
        let config = ScenarioConfig::default();
        let mut rng = StockRng::new(123);
        let scenario = config.resolve(&mut rng).unwrap();

        // Exactly 10 of each harvest level must survive the shuffle
        for level in DEFAULT_HARVEST_LEVELS {
            let count = scenario
                .harvest_rate
                .iter()
                .filter(|&&h| (h - level).abs() < 1e-12)
                .count();
            assert_eq!(count, 10, "level {level} appears {count} times");
        }
    }

    #[test]
    fn test_partial_schedule_triggers_full_substitution() {
        // num_years given but schedules absent: the quirk replaces all three
        let config = ScenarioConfig::builder().num_years(30).build();
        let mut rng = StockRng::new(1);
        let scenario = config.resolve(&mut rng).unwrap();

        assert_eq!(scenario.num_years, 100, "canonical scenario must win");
    }

    #[test]
    fn test_error_sds_default_independently() {
        let config = ScenarioConfig::builder().process_error_sd(0.4).build();
        let mut rng = StockRng::new(1);
        let scenario = config.resolve(&mut rng).unwrap();

        assert!((scenario.process_error_sd - 0.4).abs() < f64::EPSILON);
        // observation SD keeps its own default regardless of substitution
        assert!((scenario.observation_error_sd - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hatchery_proportion_of_one_rejected() {
        let config = ScenarioConfig::builder()
            .num_years(3)
            .harvest_rate(vec![0.1, 0.1, 0.1])
            .hatchery_proportion(vec![0.0, 1.0, 0.0])
            .build();
        let mut rng = StockRng::new(1);

        let err = config.resolve(&mut rng).unwrap_err();
        assert!(err.is_config_error(), "got: {err}");
        assert!(err.to_string().contains("hatchery_proportion"), "got: {err}");
    }

    #[test]
    fn test_schedule_length_mismatch_rejected() {
        let config = ScenarioConfig::builder()
            .num_years(5)
            .harvest_rate(vec![0.1, 0.2])
            .hatchery_proportion(vec![0.0; 5])
            .build();
        let mut rng = StockRng::new(1);

        let err = config.resolve(&mut rng).unwrap_err();
        assert!(
            matches!(
                err,
                RecruitError::ScheduleLength {
                    schedule: "harvest_rate",
                    found: 2,
                    expected: 5,
                }
            ),
            "got: {err}"
        );
    }

    #[test]
    fn test_leveled_schedule_length_and_multiset() {
        let mut rng = StockRng::new(42);
        let schedule = leveled_schedule(&[0.0, 0.5], 4, &mut rng);

        assert_eq!(schedule.len(), 8);
        assert_eq!(schedule.iter().filter(|&&x| x == 0.0).count(), 4);
        assert_eq!(schedule.iter().filter(|&&x| x == 0.5).count(), 4);
    }

    #[test]
    fn test_leveled_schedule_reproducible() {
        let mut rng1 = StockRng::new(7);
        let mut rng2 = StockRng::new(7);

        let s1 = leveled_schedule(&DEFAULT_HARVEST_LEVELS, 10, &mut rng1);
        let s2 = leveled_schedule(&DEFAULT_HARVEST_LEVELS, 10, &mut rng2);
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r"
num_years: 4
harvest_rate: [0.0, 0.1, 0.2, 0.3]
hatchery_proportion: [0.0, 0.0, 0.5, 0.5]
process_error_sd: 0.2
";
        let config = ScenarioConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.num_years, Some(4));
        assert!((config.process_error_sd - 0.2).abs() < f64::EPSILON);
        // unspecified fields get serde defaults
        assert!((config.observation_error_sd - 0.15).abs() < f64::EPSILON);

        let round = serde_yaml::to_string(&config).unwrap();
        let back = ScenarioConfig::from_yaml(&round).unwrap();
        assert_eq!(back.num_years, config.num_years);
    }

    #[test]
    fn test_yaml_unknown_field_rejected() {
        let yaml = "num_years: 4\nbogus_field: 1\n";
        assert!(ScenarioConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_negative_sd_rejected() {
        let config = ScenarioConfig::builder().process_error_sd(-0.1).build();
        let mut rng = StockRng::new(1);
        assert!(config.resolve(&mut rng).is_err());
    }
}
