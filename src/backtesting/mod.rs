//! Backtesting engine and statistical validation of betting rules

pub mod engine;
pub mod metrics;
pub mod outcome;
pub mod overfitting;
pub mod validation;

pub use engine::{BacktestEngine, BacktestResult, BacktestResults, BetRecord};
pub use metrics::{calculate_metrics, PerformanceTier, RiskMetrics, RuleMetrics};
pub use outcome::{resolve_odds, resolve_outcome, Outcome};
pub use overfitting::{OverfittingDetector, OverfittingReport, RuleDegradation, SkipReason};
pub use validation::{test_significance, RuleVerdict, SignificanceOutcome, Validator};
