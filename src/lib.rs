//! Footbet - Rule-based football betting backtester
//!
//! This library provides:
//! - Betting rules over historical match records (half-time and form rule sets)
//! - Per-rule backtesting at a fixed stake with win rate, ROI and risk metrics
//! - Temporal train/test split, exact binomial significance test and
//!   overfitting detection
//! - Kelly criterion stake recommendations
//! - CSV loading of football-data.co.uk season files
//!
//! # Example
//!
//! ```no_run
//! use footbet::backtesting::{BacktestEngine, Validator};
//! use footbet::data::load_matches;
//! use footbet::rules::RuleSet;
//! use footbet::BacktestConfig;
//!
//! let config = BacktestConfig::default();
//! let (dataset, _) = load_matches("data/laliga").unwrap();
//! let (train, test) = Validator::new(config.clone()).unwrap().split(&dataset);
//!
//! let engine = BacktestEngine::new(config).unwrap();
//! let rules = RuleSet::All.build().unwrap();
//! let results = engine.run(&test, &rules).unwrap();
//! println!("{} rules on {} train matches", results.len(), train.len());
//! ```

pub mod backtesting;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod report;
pub mod rules;

// Re-export commonly used types
pub use backtesting::{BacktestEngine, BacktestResult, BacktestResults, OverfittingDetector, Validator};
pub use config::{BacktestConfig, OddsConfig};
pub use data::{load_matches, Dataset};
pub use error::{BacktestError, Result};
pub use models::{MatchRecord, MatchResult};
pub use rules::{BetType, Rule, RuleSet};
