use thiserror::Error;

/// Library error types
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Rule definition rejected at construction time
    #[error("Invalid rule '{name}': {reason}")]
    InvalidRule { name: String, reason: String },

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Hit/trigger counts that cannot come from a backtest
    #[error("Invalid counts: {hits} hits out of {triggers} triggers")]
    InvalidCounts { hits: usize, triggers: usize },

    #[error("Data error: {0}")]
    Data(#[from] polars::prelude::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, BacktestError>;

/// Validation functions
pub fn validate_odds(odds: f64) -> Result<()> {
    if !odds.is_finite() || odds <= 1.0 {
        return Err(BacktestError::InvalidConfig(format!(
            "Decimal odds must be greater than 1.0, got {}",
            odds
        )));
    }
    Ok(())
}

pub fn validate_probability(prob: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&prob) {
        return Err(BacktestError::InvalidConfig(format!(
            "Probability must be between 0 and 1, got {}",
            prob
        )));
    }
    Ok(())
}
