//! Core business logic modules

pub mod kelly;

// Re-export commonly used types
pub use kelly::{
    calculate_edge, calculate_kelly_fraction, calculate_optimal_stake, implied_probability,
    StakeCalculator, StakeRecommendation,
};
