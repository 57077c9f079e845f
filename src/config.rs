//! Backtest configuration
//!
//! A single explicit value threaded into the engine, validator, overfitting
//! detector and stake calculator. Defaults reproduce the historical setup:
//! train up to the end of 2023, test from 2024 onward.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{validate_odds, validate_probability, BacktestError, Result};

/// Decimal odds used when a market price cannot be read from a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OddsConfig {
    /// Fallback when the record has no home price
    pub home: f64,
    /// Fallback when the record has no away price
    pub away: f64,
    /// Fallback when the record has no draw price
    pub draw: f64,
    /// Fallback when the record has no both-teams-score price
    pub both_teams_score: f64,

    // Markets with no prices in the historical files
    pub favorite: f64,
    pub double_chance: f64,
    pub over_2_5: f64,
    pub under_2_5: f64,
    pub second_half_goal: f64,
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            home: 1.5,
            away: 2.5,
            draw: 3.0,
            both_teams_score: 1.8,
            favorite: 1.90,
            double_chance: 1.90,
            over_2_5: 1.90,
            under_2_5: 1.90,
            second_half_goal: 1.90,
        }
    }
}

impl OddsConfig {
    /// Set every placeholder price to the same value
    pub fn with_placeholder(mut self, odds: f64) -> Self {
        self.favorite = odds;
        self.double_chance = odds;
        self.over_2_5 = odds;
        self.under_2_5 = odds;
        self.second_half_goal = odds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for odds in [
            self.home,
            self.away,
            self.draw,
            self.both_teams_score,
            self.favorite,
            self.double_chance,
            self.over_2_5,
            self.under_2_5,
            self.second_half_goal,
        ] {
            validate_odds(odds)?;
        }
        Ok(())
    }
}

/// Backtest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    // Temporal split
    pub train_end_date: NaiveDate,
    pub test_start_date: NaiveDate,

    // Rule acceptance
    pub min_sample_size: usize,
    pub min_win_rate: f64,
    pub min_roi: f64,

    // Significance test
    pub alpha: f64,
    pub null_hypothesis_prob: f64,

    // Overfitting
    pub degradation_threshold: f64,
    /// Train ROI above which a negative test ROI is flagged
    pub roi_collapse_train_min: f64,

    /// Units staked per trigger
    pub stake: f64,

    // Stake sizing
    pub kelly_fraction: f64,
    pub max_stake_pct: f64,

    /// Evaluate rules on the rayon thread pool
    pub parallel: bool,

    pub odds: OddsConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            train_end_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            test_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            min_sample_size: 30,
            min_win_rate: 0.55,
            min_roi: 0.0,
            alpha: 0.05,
            null_hypothesis_prob: 0.5,
            degradation_threshold: 0.15,
            roi_collapse_train_min: 0.10,
            stake: 1.0,
            kelly_fraction: 0.25,
            max_stake_pct: 0.05,
            parallel: true,
            odds: OddsConfig::default(),
        }
    }
}

impl BacktestConfig {
    /// Load configuration from a JSON file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: BacktestConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every range the engine and validator rely on
    pub fn validate(&self) -> Result<()> {
        if self.test_start_date <= self.train_end_date {
            return Err(BacktestError::InvalidConfig(format!(
                "test_start_date ({}) must be after train_end_date ({})",
                self.test_start_date, self.train_end_date
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(BacktestError::InvalidConfig(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        validate_probability(self.null_hypothesis_prob)?;
        validate_probability(self.min_win_rate)?;
        validate_probability(self.kelly_fraction)?;
        validate_probability(self.max_stake_pct)?;
        if self.degradation_threshold < 0.0 || !self.degradation_threshold.is_finite() {
            return Err(BacktestError::InvalidConfig(format!(
                "degradation_threshold must be non-negative, got {}",
                self.degradation_threshold
            )));
        }
        if !(self.stake > 0.0 && self.stake.is_finite()) {
            return Err(BacktestError::InvalidConfig(format!(
                "stake must be positive, got {}",
                self.stake
            )));
        }
        self.odds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = BacktestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_sample_size, 30);
        assert!((config.alpha - 0.05).abs() < 1e-12);
        assert_eq!(
            config.train_end_date,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_overlapping_split_rejected() {
        let config = BacktestConfig {
            test_start_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BacktestError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        for alpha in [0.0, 1.0, -0.1, 1.5] {
            let config = BacktestConfig {
                alpha,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "alpha {} accepted", alpha);
        }
    }

    #[test]
    fn test_placeholder_odds_must_exceed_one() {
        let config = BacktestConfig {
            odds: OddsConfig::default().with_placeholder(1.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_placeholder() {
        let odds = OddsConfig::default().with_placeholder(2.2);
        assert_eq!(odds.favorite, 2.2);
        assert_eq!(odds.second_half_goal, 2.2);
        // Market fallbacks untouched
        assert_eq!(odds.home, 1.5);
    }

    #[test]
    fn test_from_file_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"alpha": 0.01, "test_start_date": "2024-02-01", "odds": {{"favorite": 1.65}}}}"#
        )
        .unwrap();

        let config = BacktestConfig::from_file(file.path()).unwrap();
        assert!((config.alpha - 0.01).abs() < 1e-12);
        assert_eq!(
            config.test_start_date,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert_eq!(config.odds.favorite, 1.65);
        assert_eq!(config.odds.draw, 3.0);
        assert_eq!(config.min_sample_size, 30);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"null_hypothesis_prob": 1.5}}"#).unwrap();
        assert!(BacktestConfig::from_file(file.path()).is_err());
    }
}
