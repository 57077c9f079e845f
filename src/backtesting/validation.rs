//! Statistical validation of backtest results
//!
//! - one-sided exact binomial test of a rule's hit rate
//! - chronological train/test split
//! - rule acceptance against minimum sample, win rate and ROI
//! - calibration of expected confidence against observed win rate

use serde::{Deserialize, Serialize};
use statrs::distribution::{Binomial, DiscreteCDF};
use tracing::{debug, info};

use super::engine::{BacktestResult, BacktestResults};
use crate::config::BacktestConfig;
use crate::data::Dataset;
use crate::error::{validate_probability, BacktestError, Result};

/// Outcome of a significance test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignificanceOutcome {
    pub p_value: f64,
    pub is_significant: bool,
}

impl SignificanceOutcome {
    /// No evidence, no claim
    pub fn no_evidence() -> Self {
        Self {
            p_value: 1.0,
            is_significant: false,
        }
    }
}

/// P(X >= hits) for X ~ Binomial(triggers, null_prob)
///
/// # Examples
/// ```
/// use footbet::backtesting::validation::binomial_p_value;
/// let p = binomial_p_value(20, 30, 0.5).unwrap();
/// assert!((p - 0.0494).abs() < 1e-4);
/// ```
pub fn binomial_p_value(hits: usize, triggers: usize, null_prob: f64) -> Result<f64> {
    if hits > triggers {
        return Err(BacktestError::InvalidCounts { hits, triggers });
    }
    validate_probability(null_prob)?;

    if hits == 0 {
        return Ok(1.0);
    }
    // Degenerate nulls: statrs' beta_reg is not needed to answer these
    if null_prob == 0.0 {
        return Ok(0.0);
    }
    if null_prob == 1.0 {
        return Ok(1.0);
    }

    let dist = Binomial::new(null_prob, triggers as u64)
        .map_err(|e| BacktestError::InvalidConfig(e.to_string()))?;

    // sf(k) = P(X > k), so P(X >= hits) = sf(hits - 1)
    Ok(dist.sf(hits as u64 - 1).clamp(0.0, 1.0))
}

/// One-sided exact binomial test
///
/// H0: hit probability = `null_prob`; H1: hit probability > `null_prob`.
/// Zero triggers gives p = 1.0, not significant.
pub fn test_significance(
    hits: usize,
    triggers: usize,
    null_prob: f64,
    alpha: f64,
) -> Result<SignificanceOutcome> {
    if hits > triggers {
        return Err(BacktestError::InvalidCounts { hits, triggers });
    }
    if triggers == 0 {
        return Ok(SignificanceOutcome::no_evidence());
    }

    let p_value = binomial_p_value(hits, triggers, null_prob)?;
    Ok(SignificanceOutcome {
        p_value,
        is_significant: p_value < alpha,
    })
}

/// Acceptance verdict for one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub rule_name: String,
    pub enough_samples: bool,
    pub win_rate_ok: bool,
    pub roi_ok: bool,
    pub significance: SignificanceOutcome,
}

impl RuleVerdict {
    pub fn is_valid(&self) -> bool {
        self.enough_samples && self.win_rate_ok && self.roi_ok && self.significance.is_significant
    }
}

/// Expected-versus-observed win rate for one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEntry {
    pub rule_name: String,
    pub expected: f64,
    pub observed: f64,
    pub error: f64,
}

/// Calibration summary over rules that triggered at least once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Mean absolute error; 0 when no rule triggered
    pub mae: f64,
    pub entries: Vec<CalibrationEntry>,
}

/// Validator bound to one configuration
#[derive(Debug, Clone)]
pub struct Validator {
    config: BacktestConfig,
}

impl Validator {
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Significance at the configured null probability and alpha
    pub fn test_significance(&self, hits: usize, triggers: usize) -> Result<SignificanceOutcome> {
        test_significance(
            hits,
            triggers,
            self.config.null_hypothesis_prob,
            self.config.alpha,
        )
    }

    /// Split at the configured boundaries. Either side may be empty.
    pub fn split(&self, dataset: &Dataset) -> (Dataset, Dataset) {
        let (train, test) = dataset.split(self.config.train_end_date, self.config.test_start_date);

        info!(
            "Temporal split: train {} matches (up to {}), test {} matches (from {})",
            train.len(),
            self.config.train_end_date,
            test.len(),
            self.config.test_start_date
        );

        (train, test)
    }

    /// Check one result against the acceptance thresholds
    pub fn accept(&self, result: &BacktestResult) -> Result<RuleVerdict> {
        let metrics = &result.metrics;
        let significance = self.test_significance(metrics.hits, metrics.triggers)?;

        let verdict = RuleVerdict {
            rule_name: result.rule_name.clone(),
            enough_samples: metrics.triggers >= self.config.min_sample_size,
            win_rate_ok: metrics.win_rate >= self.config.min_win_rate,
            roi_ok: metrics.roi >= self.config.min_roi,
            significance,
        };

        debug!(
            "{}: valid={} (p={:.4})",
            verdict.rule_name,
            verdict.is_valid(),
            significance.p_value
        );

        Ok(verdict)
    }

    /// Verdicts for every result, in rule-name order
    pub fn accept_all(&self, results: &BacktestResults) -> Result<Vec<RuleVerdict>> {
        results.values().map(|r| self.accept(r)).collect()
    }

    /// Compare each rule's expected confidence with its observed win rate
    pub fn calibration(&self, results: &BacktestResults) -> Calibration {
        let entries: Vec<CalibrationEntry> = results
            .values()
            .filter(|r| r.metrics.triggers > 0)
            .map(|r| CalibrationEntry {
                rule_name: r.rule_name.clone(),
                expected: r.expected_confidence,
                observed: r.metrics.win_rate,
                error: (r.expected_confidence - r.metrics.win_rate).abs(),
            })
            .collect();

        let mae = if entries.is_empty() {
            0.0
        } else {
            entries.iter().map(|e| e.error).sum::<f64>() / entries.len() as f64
        };

        Calibration { mae, entries }
    }
}
