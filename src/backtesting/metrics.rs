//! Backtest Metrics
//!
//! Calculate win rate, ROI, profit factor, drawdown, etc.

use super::engine::BetRecord;
use serde::{Deserialize, Serialize};

/// Headline metrics for one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMetrics {
    pub hits: usize,
    pub triggers: usize,
    pub win_rate: f64,
    pub roi: f64,
    pub total_profit: f64,
    pub total_stake: f64,
    /// (profit + stake) / stake, i.e. total return per unit staked.
    ///
    /// Kept for compatibility with earlier reports. This is NOT gross
    /// profit / gross loss; see [`RiskMetrics::gross_profit_factor`].
    pub profit_factor: f64,
}

impl Default for RuleMetrics {
    fn default() -> Self {
        Self {
            hits: 0,
            triggers: 0,
            win_rate: 0.0,
            roi: 0.0,
            total_profit: 0.0,
            total_stake: 0.0,
            profit_factor: 0.0,
        }
    }
}

/// Calculate rule metrics from raw counts
///
/// Zero triggers yields all-zero metrics rather than NaN.
pub fn calculate_metrics(
    hits: usize,
    triggers: usize,
    total_profit: f64,
    total_stake: f64,
) -> RuleMetrics {
    if triggers == 0 {
        return RuleMetrics::default();
    }

    let win_rate = hits as f64 / triggers as f64;

    let (roi, profit_factor) = if total_stake > 0.0 {
        (
            total_profit / total_stake,
            (total_profit + total_stake) / total_stake,
        )
    } else {
        (0.0, 0.0)
    };

    RuleMetrics {
        hits,
        triggers,
        win_rate,
        roi,
        total_profit,
        total_stake,
        profit_factor,
    }
}

/// Risk metrics computed from the per-bet ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub gross_profit: f64,
    pub gross_loss: f64,
    /// Gross profit / gross loss
    pub gross_profit_factor: f64,
    /// Largest fall of cumulative profit from its running peak
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
}

impl Default for RiskMetrics {
    fn default() -> Self {
        Self {
            gross_profit: 0.0,
            gross_loss: 0.0,
            gross_profit_factor: 0.0,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
        }
    }
}

/// Calculate risk metrics from bet records (in chronological order)
pub fn calculate_risk_metrics(bets: &[BetRecord]) -> RiskMetrics {
    if bets.is_empty() {
        return RiskMetrics::default();
    }

    let profits: Vec<f64> = bets.iter().map(|b| b.profit).collect();
    let gross_profit: f64 = profits.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = profits.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();

    let gross_profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    RiskMetrics {
        gross_profit,
        gross_loss,
        gross_profit_factor,
        max_drawdown: calculate_max_drawdown(&profits),
        sharpe_ratio: calculate_sharpe_ratio(bets, 0.0),
    }
}

/// Maximum drawdown of the cumulative profit curve, starting from zero
pub fn calculate_max_drawdown(profits: &[f64]) -> f64 {
    let mut cumulative = 0.0;
    let mut peak = 0.0_f64;
    let mut max_drawdown = 0.0_f64;

    for &p in profits {
        cumulative += p;
        peak = peak.max(cumulative);
        max_drawdown = max_drawdown.max(peak - cumulative);
    }

    max_drawdown
}

/// Calculate Sharpe ratio from bet records
pub fn calculate_sharpe_ratio(bets: &[BetRecord], risk_free_rate: f64) -> f64 {
    if bets.is_empty() {
        return 0.0;
    }

    let returns: Vec<f64> = bets
        .iter()
        .filter(|b| b.stake > 0.0)
        .map(|b| b.profit / b.stake)
        .collect();

    if returns.is_empty() {
        return 0.0;
    }

    let mean_return: f64 = returns.iter().sum::<f64>() / returns.len() as f64;

    let variance: f64 = returns
        .iter()
        .map(|r| (r - mean_return).powi(2))
        .sum::<f64>()
        / returns.len() as f64;

    let std_return = variance.sqrt();

    if std_return == 0.0 {
        return 0.0;
    }

    (mean_return - risk_free_rate) / std_return
}

/// Coarse performance bucket used in logs and console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceTier {
    Strong,
    Moderate,
    Weak,
    NoTriggers,
}

impl PerformanceTier {
    pub fn classify(metrics: &RuleMetrics) -> Self {
        if metrics.triggers == 0 {
            PerformanceTier::NoTriggers
        } else if metrics.win_rate >= 0.70 && metrics.roi > 0.0 {
            PerformanceTier::Strong
        } else if metrics.win_rate >= 0.55 && metrics.roi > 0.0 {
            PerformanceTier::Moderate
        } else {
            PerformanceTier::Weak
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtesting::outcome::Outcome;
    use chrono::NaiveDate;

    fn bet(profit: f64) -> BetRecord {
        BetRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            home_team: "Home".to_string(),
            away_team: "Away".to_string(),
            odds: 2.0,
            stake: 1.0,
            outcome: if profit > 0.0 {
                Outcome::Win
            } else {
                Outcome::Loss
            },
            profit,
        }
    }

    #[test]
    fn test_calculate_metrics() {
        let metrics = calculate_metrics(55, 100, 10.0, 100.0);

        assert_eq!(metrics.hits, 55);
        assert_eq!(metrics.triggers, 100);
        assert_eq!(metrics.win_rate, 0.55);
        assert!((metrics.roi - 0.10).abs() < 1e-12);
        assert!((metrics.profit_factor - 1.10).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_metrics_empty() {
        let metrics = calculate_metrics(0, 0, 0.0, 0.0);

        assert_eq!(metrics, RuleMetrics::default());
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.roi, 0.0);
        assert!(!metrics.win_rate.is_nan());
    }

    #[test]
    fn test_win_rate_is_exact_ratio() {
        for triggers in 1..=40usize {
            for hits in 0..=triggers {
                let metrics = calculate_metrics(hits, triggers, 0.0, triggers as f64);
                assert_eq!(metrics.win_rate, hits as f64 / triggers as f64);
            }
        }
    }

    #[test]
    fn test_legacy_profit_factor_differs_from_gross() {
        // +1.5, -1, -1: net -0.5 on 3 staked
        let bets = vec![bet(1.5), bet(-1.0), bet(-1.0)];
        let metrics = calculate_metrics(1, 3, -0.5, 3.0);
        let risk = calculate_risk_metrics(&bets);

        assert!((metrics.profit_factor - 2.5 / 3.0).abs() < 1e-12);
        assert!((risk.gross_profit_factor - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_risk_metrics() {
        let bets = vec![bet(1.0), bet(-1.0), bet(0.8)];
        let risk = calculate_risk_metrics(&bets);

        assert!((risk.gross_profit - 1.8).abs() < 1e-12);
        assert!((risk.gross_loss - 1.0).abs() < 1e-12);
        assert!((risk.gross_profit_factor - 1.8).abs() < 1e-12);
        assert!(risk.sharpe_ratio > 0.0);
    }

    #[test]
    fn test_risk_metrics_all_wins() {
        let risk = calculate_risk_metrics(&[bet(0.9), bet(0.9)]);
        assert!(risk.gross_profit_factor.is_infinite());
        assert_eq!(risk.max_drawdown, 0.0);
    }

    #[test]
    fn test_risk_metrics_empty() {
        assert_eq!(calculate_risk_metrics(&[]), RiskMetrics::default());
    }

    #[test]
    fn test_max_drawdown() {
        // Cumulative: 9, 8, 7, 10, 6
        let profits = [9.0, -1.0, -1.0, 3.0, -4.0];
        assert!((calculate_max_drawdown(&profits) - 4.0).abs() < 1e-12);

        // Losing from the start counts from zero
        assert!((calculate_max_drawdown(&[-1.0, -1.0]) - 2.0).abs() < 1e-12);
        assert_eq!(calculate_max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_sharpe_ratio_constant_returns() {
        let bets = vec![bet(-1.0), bet(-1.0)];
        assert_eq!(calculate_sharpe_ratio(&bets, 0.0), 0.0);
    }

    #[test]
    fn test_performance_tier() {
        let strong = calculate_metrics(8, 10, 2.0, 10.0);
        let moderate = calculate_metrics(6, 10, 1.0, 10.0);
        let weak = calculate_metrics(8, 10, -1.0, 10.0);

        assert_eq!(PerformanceTier::classify(&strong), PerformanceTier::Strong);
        assert_eq!(PerformanceTier::classify(&moderate), PerformanceTier::Moderate);
        assert_eq!(PerformanceTier::classify(&weak), PerformanceTier::Weak);
        assert_eq!(
            PerformanceTier::classify(&RuleMetrics::default()),
            PerformanceTier::NoTriggers
        );
    }
}
