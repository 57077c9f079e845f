//! Kelly Criterion Stake Sizing
//!
//! Stake recommendation from a rule's expected confidence and the offered odds.
//!
//! The Kelly criterion formula:
//!     f* = (b*p - q) / b = (p*odds - 1) / (odds - 1)
//!
//! Where:
//!     f* = fraction of bankroll to bet
//!     b = odds - 1 (net odds)
//!     p = probability of winning
//!     q = 1 - p (probability of losing)
//!     odds = decimal odds (e.g., 1.90 means 1.9x return)

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::BacktestConfig;
use crate::error::{validate_probability, Result};

/// Stake recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeRecommendation {
    pub stake: f64,
    /// Stake as a fraction of bankroll
    pub stake_pct: f64,
    pub edge: f64, // p * odds - 1
    pub implied_probability: f64,
    /// Confidence beats the bookmaker-implied probability
    pub is_value: bool,
}

/// Calculate Kelly fraction for a single bet
///
/// # Returns
/// Kelly fraction (negative when there is no edge, 0 for odds <= 1)
///
/// # Examples
/// ```
/// use footbet::core::kelly::calculate_kelly_fraction;
/// let kelly = calculate_kelly_fraction(0.60, 2.0); // edge = 0.20
/// assert!((kelly - 0.20).abs() < 1e-12);
/// ```
pub fn calculate_kelly_fraction(probability: f64, odds: f64) -> f64 {
    if odds <= 1.0 {
        return 0.0;
    }

    (probability * odds - 1.0) / (odds - 1.0)
}

/// Bookmaker-implied probability of decimal odds
pub fn implied_probability(odds: f64) -> f64 {
    if odds <= 1.0 {
        return 0.0;
    }
    1.0 / odds
}

/// Expected value minus one
pub fn calculate_edge(probability: f64, odds: f64) -> f64 {
    probability * odds - 1.0
}

/// Calculate the stake for one bet with fractional Kelly
///
/// # Arguments
/// * `probability` - Estimated probability of winning, strictly inside (0, 1)
/// * `odds` - Decimal odds, greater than 1
/// * `bankroll` - Current bankroll
/// * `kelly_multiplier` - Fraction of Kelly to use (0.25 = quarter Kelly)
/// * `max_stake_pct` - Cap on the stake as a fraction of bankroll
///
/// # Returns
/// Stake in bankroll units; 0 when inputs are invalid or there is no edge
pub fn calculate_optimal_stake(
    probability: f64,
    odds: f64,
    bankroll: f64,
    kelly_multiplier: f64,
    max_stake_pct: f64,
) -> f64 {
    if probability <= 0.0 || probability >= 1.0 {
        warn!("Invalid probability: {}", probability);
        return 0.0;
    }
    if odds <= 1.0 {
        warn!("Invalid odds: {}", odds);
        return 0.0;
    }

    let edge = calculate_edge(probability, odds);
    if edge <= 0.0 {
        return 0.0;
    }

    let fraction = (edge / (odds - 1.0) * kelly_multiplier).min(max_stake_pct);
    (bankroll * fraction).max(0.0)
}

/// Fractional Kelly calculator
#[derive(Debug, Clone)]
pub struct StakeCalculator {
    pub kelly_multiplier: f64,
    pub max_stake_pct: f64,
}

impl StakeCalculator {
    /// Create a new calculator
    ///
    /// # Arguments
    /// * `kelly_multiplier` - Fraction of Kelly to use, within [0, 1]
    /// * `max_stake_pct` - Maximum single bet as a fraction of bankroll, within [0, 1]
    pub fn new(kelly_multiplier: f64, max_stake_pct: f64) -> Result<Self> {
        validate_probability(kelly_multiplier)?;
        validate_probability(max_stake_pct)?;
        Ok(Self {
            kelly_multiplier,
            max_stake_pct,
        })
    }

    pub fn from_config(config: &BacktestConfig) -> Result<Self> {
        Self::new(config.kelly_fraction, config.max_stake_pct)
    }

    /// Recommend a stake for a rule with `confidence` at `odds`
    pub fn recommend(&self, confidence: f64, odds: f64, bankroll: f64) -> StakeRecommendation {
        let stake = calculate_optimal_stake(
            confidence,
            odds,
            bankroll,
            self.kelly_multiplier,
            self.max_stake_pct,
        );
        let implied = implied_probability(odds);

        StakeRecommendation {
            stake,
            stake_pct: if bankroll > 0.0 { stake / bankroll } else { 0.0 },
            edge: calculate_edge(confidence, odds),
            implied_probability: implied,
            is_value: confidence > implied,
        }
    }
}

impl Default for StakeCalculator {
    /// Quarter Kelly capped at 5% of bankroll
    fn default() -> Self {
        Self {
            kelly_multiplier: 0.25,
            max_stake_pct: 0.05,
        }
    }
}
