//! Overfitting detection
//!
//! Compares each rule's train and test performance. A rule is flagged when
//! its win rate drops by more than the degradation threshold, or when a
//! clearly profitable train ROI turns negative on test.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::engine::BacktestResults;
use crate::config::BacktestConfig;
use crate::error::{BacktestError, Result};

/// Why a rule was left out of the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    MissingFromTrain,
    MissingFromTest,
    /// Zero triggers on both sides
    NoTriggers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRule {
    pub rule_name: String,
    pub reason: SkipReason,
}

/// Train/test comparison for one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDegradation {
    pub rule_name: String,
    pub train_win_rate: f64,
    pub test_win_rate: f64,
    pub train_roi: f64,
    pub test_roi: f64,
    /// train win rate - test win rate
    pub degradation: f64,
    pub overfit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverfittingReport {
    /// True if any compared rule is flagged
    pub overfitting: bool,
    pub rules: Vec<RuleDegradation>,
    pub skipped: Vec<SkippedRule>,
}

impl OverfittingReport {
    pub fn flagged(&self) -> impl Iterator<Item = &RuleDegradation> {
        self.rules.iter().filter(|r| r.overfit)
    }
}

/// Train-versus-test overfitting detector
#[derive(Debug, Clone)]
pub struct OverfittingDetector {
    degradation_threshold: f64,
    roi_collapse_train_min: f64,
}

impl Default for OverfittingDetector {
    fn default() -> Self {
        Self {
            degradation_threshold: 0.15,
            roi_collapse_train_min: 0.10,
        }
    }
}

impl OverfittingDetector {
    pub fn new(degradation_threshold: f64) -> Result<Self> {
        if !(degradation_threshold >= 0.0 && degradation_threshold.is_finite()) {
            return Err(BacktestError::InvalidConfig(format!(
                "degradation threshold must be non-negative, got {}",
                degradation_threshold
            )));
        }
        Ok(Self {
            degradation_threshold,
            ..Default::default()
        })
    }

    pub fn from_config(config: &BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            degradation_threshold: config.degradation_threshold,
            roi_collapse_train_min: config.roi_collapse_train_min,
        })
    }

    /// Whether any rule present in both maps overfits
    pub fn detect(&self, train: &BacktestResults, test: &BacktestResults) -> bool {
        self.analyze(train, test).overfitting
    }

    /// Per-rule comparison, including the rules that could not be compared
    pub fn analyze(&self, train: &BacktestResults, test: &BacktestResults) -> OverfittingReport {
        let mut rules = Vec::new();
        let mut skipped = Vec::new();

        for (name, train_result) in train {
            let Some(test_result) = test.get(name) else {
                warn!("{}: missing from test results, skipped", name);
                skipped.push(SkippedRule {
                    rule_name: name.clone(),
                    reason: SkipReason::MissingFromTest,
                });
                continue;
            };

            if train_result.metrics.triggers == 0 && test_result.metrics.triggers == 0 {
                skipped.push(SkippedRule {
                    rule_name: name.clone(),
                    reason: SkipReason::NoTriggers,
                });
                continue;
            }

            let tr = &train_result.metrics;
            let te = &test_result.metrics;
            let degradation = tr.win_rate - te.win_rate;
            let overfit = degradation > self.degradation_threshold
                || (tr.roi > self.roi_collapse_train_min && te.roi < 0.0);

            let status = if overfit { "OVERFIT" } else { "ok" };
            info!(
                "{} [{}] train WR={:.1}% ROI={:.1}% | test WR={:.1}% ROI={:.1}% | degradation {:.1}%",
                name,
                status,
                tr.win_rate * 100.0,
                tr.roi * 100.0,
                te.win_rate * 100.0,
                te.roi * 100.0,
                degradation * 100.0
            );

            rules.push(RuleDegradation {
                rule_name: name.clone(),
                train_win_rate: tr.win_rate,
                test_win_rate: te.win_rate,
                train_roi: tr.roi,
                test_roi: te.roi,
                degradation,
                overfit,
            });
        }

        for name in test.keys().filter(|k| !train.contains_key(*k)) {
            warn!("{}: missing from train results, skipped", name);
            skipped.push(SkippedRule {
                rule_name: name.clone(),
                reason: SkipReason::MissingFromTrain,
            });
        }

        let overfitting = rules.iter().any(|r| r.overfit);
        if overfitting {
            warn!("Possible overfitting detected; review rules with high train→test degradation");
        }

        OverfittingReport {
            overfitting,
            rules,
            skipped,
        }
    }
}
