//! Backtest Engine
//!
//! Replays each rule over a chronologically ordered dataset at a fixed stake
//! per trigger and aggregates the results per rule.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use super::metrics::{
    calculate_metrics, calculate_risk_metrics, PerformanceTier, RiskMetrics, RuleMetrics,
};
use super::outcome::{resolve_odds, resolve_outcome, Outcome};
use crate::config::BacktestConfig;
use crate::data::Dataset;
use crate::error::{BacktestError, Result};
use crate::rules::{BetType, Rule};

/// One settled bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
    pub date: chrono::NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub odds: f64,
    pub stake: f64,
    pub outcome: Outcome,
    pub profit: f64,
}

impl BetRecord {
    pub fn won(&self) -> bool {
        self.outcome == Outcome::Win
    }
}

/// Result of replaying one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub rule_name: String,
    pub bet_type: BetType,
    pub expected_confidence: f64,
    pub metrics: RuleMetrics,
    pub risk: RiskMetrics,
    /// Predicate fired but the market did not apply (not counted as triggers)
    pub not_applicable: usize,
    pub bets: Vec<BetRecord>,
}

impl BacktestResult {
    pub fn triggers(&self) -> usize {
        self.metrics.triggers
    }

    pub fn hits(&self) -> usize {
        self.metrics.hits
    }

    pub fn win_rate(&self) -> f64 {
        self.metrics.win_rate
    }

    pub fn roi(&self) -> f64 {
        self.metrics.roi
    }

    pub fn tier(&self) -> PerformanceTier {
        PerformanceTier::classify(&self.metrics)
    }
}

/// Results keyed by rule name
pub type BacktestResults = BTreeMap<String, BacktestResult>;

/// Backtest engine
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    /// Create an engine; the configuration is validated here
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run every active rule over `dataset`
    ///
    /// Rules are independent; with `parallel` set they are spread over the
    /// rayon pool, each worker owning its own tally.
    pub fn run(&self, dataset: &Dataset, rules: &[Rule]) -> Result<BacktestResults> {
        let mut seen = HashSet::new();
        for rule in rules {
            if !seen.insert(rule.name()) {
                return Err(BacktestError::InvalidRule {
                    name: rule.name().to_string(),
                    reason: "duplicate rule name".to_string(),
                });
            }
        }

        let active: Vec<&Rule> = rules.iter().filter(|r| r.is_active()).collect();
        info!(
            "Backtesting {} rules ({} inactive) over {} matches",
            active.len(),
            rules.len() - active.len(),
            dataset.len()
        );

        let results: Vec<BacktestResult> = if self.config.parallel {
            active
                .par_iter()
                .map(|rule| self.evaluate_rule(dataset, rule))
                .collect()
        } else {
            active
                .iter()
                .map(|rule| self.evaluate_rule(dataset, rule))
                .collect()
        };

        for result in &results {
            log_result(result);
        }

        Ok(results
            .into_iter()
            .map(|r| (r.rule_name.clone(), r))
            .collect())
    }

    /// Replay a single rule over the dataset
    pub fn evaluate_rule(&self, dataset: &Dataset, rule: &Rule) -> BacktestResult {
        let stake = self.config.stake;
        let bet_type = rule.bet_type();

        let mut hits = 0usize;
        let mut triggers = 0usize;
        let mut not_applicable = 0usize;
        let mut total_stake = 0.0;
        let mut total_profit = 0.0;
        let mut bets = Vec::new();

        for record in dataset.iter() {
            if !rule.evaluate(record) {
                continue;
            }

            let outcome = resolve_outcome(record, bet_type);
            let odds = resolve_odds(record, bet_type, &self.config.odds);

            let profit = match outcome {
                Outcome::Win => stake * (odds - 1.0),
                Outcome::Loss => -stake,
                Outcome::NotApplicable => {
                    not_applicable += 1;
                    continue;
                }
            };

            triggers += 1;
            if outcome == Outcome::Win {
                hits += 1;
            }
            total_stake += stake;
            total_profit += profit;

            bets.push(BetRecord {
                date: record.date,
                home_team: record.home_team.clone(),
                away_team: record.away_team.clone(),
                odds,
                stake,
                outcome,
                profit,
            });
        }

        debug!(
            "{}: {} triggers, {} hits, {} not applicable",
            rule.name(),
            triggers,
            hits,
            not_applicable
        );

        BacktestResult {
            rule_name: rule.name().to_string(),
            bet_type,
            expected_confidence: rule.expected_confidence(),
            metrics: calculate_metrics(hits, triggers, total_profit, total_stake),
            risk: calculate_risk_metrics(&bets),
            not_applicable,
            bets,
        }
    }
}

fn log_result(result: &BacktestResult) {
    let m = &result.metrics;
    match result.tier() {
        PerformanceTier::NoTriggers => info!("{}: no triggers", result.rule_name),
        tier => info!(
            "[{:?}] {}: {}/{} ({:.1}%) | ROI: {:.1}%",
            tier,
            result.rule_name,
            m.hits,
            m.triggers,
            m.win_rate * 100.0,
            m.roi * 100.0
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchRecord;
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 8, 11).unwrap()
    }

    /// 100 matches at even money, home wins in the first 55
    fn home_win_dataset() -> Dataset {
        let records = (0..100)
            .map(|i| {
                let (h, a) = if i < 55 { (2, 0) } else { (0, 1) };
                MatchRecord::new(start() + Duration::days(i), "Home", "Away", h, a)
                    .with_odds(2.0, 3.2, 2.0)
            })
            .collect::<Vec<_>>();
        Dataset::new(records)
    }

    fn always_home() -> Rule {
        Rule::new("Always_Home", "", BetType::Home, 0.5, |_| Some(true)).unwrap()
    }

    fn engine() -> BacktestEngine {
        BacktestEngine::new(BacktestConfig::default()).unwrap()
    }

    #[test]
    fn test_always_true_home_rule() {
        let results = engine().run(&home_win_dataset(), &[always_home()]).unwrap();
        let r = &results["Always_Home"];

        assert_eq!(r.triggers(), 100);
        assert_eq!(r.hits(), 55);
        assert!((r.win_rate() - 0.55).abs() < 1e-12);
        assert!((r.metrics.total_profit - 10.0).abs() < 1e-9);
        assert!((r.metrics.total_stake - 100.0).abs() < 1e-9);
        assert!((r.roi() - 0.10).abs() < 1e-9);
        assert_eq!(r.bets.len(), 100);
        assert!(r.bets.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_leader_rule_scenario() {
        let leader = Rule::new(
            "Leader_Holds",
            "",
            BetType::DoubleChanceHalftimeLeader,
            0.8,
            |m| {
                let ht = m.halftime()?;
                Some(ht == (1, 0) || ht == (0, 1))
            },
        )
        .unwrap();

        let level = MatchRecord::new(start(), "A", "B", 1, 1).with_halftime(1, 1);
        let led = MatchRecord::new(start(), "C", "D", 1, 1).with_halftime(1, 0);

        assert!(!leader.evaluate(&level));
        assert!(leader.evaluate(&led));

        let results = engine()
            .run(&Dataset::new(vec![level, led]), &[leader])
            .unwrap();
        let r = &results["Leader_Holds"];
        assert_eq!(r.triggers(), 1);
        assert_eq!(r.hits(), 1);
        let expected = BacktestConfig::default().odds.double_chance - 1.0;
        assert!((r.metrics.total_profit - expected).abs() < 1e-12);
    }

    #[test]
    fn test_not_applicable_is_not_a_trigger() {
        // Predicate fires on everything, but level half-times settle as no decision
        let rule = Rule::new(
            "Any_Leader",
            "",
            BetType::DoubleChanceHalftimeLeader,
            0.8,
            |_| Some(true),
        )
        .unwrap();

        let records = vec![
            MatchRecord::new(start(), "A", "B", 1, 1).with_halftime(0, 0),
            MatchRecord::new(start(), "C", "D", 2, 2).with_halftime(1, 1),
            MatchRecord::new(start(), "E", "F", 0, 2).with_halftime(1, 0),
        ];

        let results = engine().run(&Dataset::new(records), &[rule]).unwrap();
        let r = &results["Any_Leader"];
        assert_eq!(r.triggers(), 1);
        assert_eq!(r.hits(), 0);
        assert_eq!(r.not_applicable, 2);
        assert!((r.metrics.total_profit + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_triggers_yields_zero_metrics() {
        let never = Rule::new("Never", "", BetType::Draw, 0.3, |_| Some(false)).unwrap();
        let results = engine().run(&home_win_dataset(), &[never]).unwrap();
        let r = &results["Never"];

        assert_eq!(r.metrics, RuleMetrics::default());
        assert_eq!(r.tier(), PerformanceTier::NoTriggers);
        assert!(r.bets.is_empty());
    }

    #[test]
    fn test_empty_dataset_runs() {
        let results = engine().run(&Dataset::default(), &[always_home()]).unwrap();
        assert_eq!(results["Always_Home"].triggers(), 0);
        assert_eq!(results["Always_Home"].roi(), 0.0);
    }

    #[test]
    fn test_inactive_rules_are_skipped() {
        let inactive = always_home().with_active(false);
        let results = engine().run(&home_win_dataset(), &[inactive]).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_duplicate_rule_names_rejected() {
        let err = engine()
            .run(&home_win_dataset(), &[always_home(), always_home()])
            .unwrap_err();
        assert!(matches!(err, BacktestError::InvalidRule { .. }));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let rules = vec![
            always_home(),
            Rule::new("Always_Away", "", BetType::Away, 0.3, |_| Some(true)).unwrap(),
            Rule::new("Over", "", BetType::Over, 0.5, |_| Some(true)).unwrap(),
        ];
        let dataset = home_win_dataset();

        let parallel = engine().run(&dataset, &rules).unwrap();
        let sequential = BacktestEngine::new(BacktestConfig {
            parallel: false,
            ..Default::default()
        })
        .unwrap()
        .run(&dataset, &rules)
        .unwrap();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 3);
    }

    #[test]
    fn test_stake_scales_profit() {
        let engine = BacktestEngine::new(BacktestConfig {
            stake: 10.0,
            ..Default::default()
        })
        .unwrap();
        let results = engine.run(&home_win_dataset(), &[always_home()]).unwrap();
        let r = &results["Always_Home"];

        assert!((r.metrics.total_profit - 100.0).abs() < 1e-9);
        assert!((r.roi() - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BacktestConfig {
            stake: 0.0,
            ..Default::default()
        };
        assert!(BacktestEngine::new(config).is_err());
    }
}
