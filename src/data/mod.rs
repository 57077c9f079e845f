//! Match data loading

pub mod csv_loader;
pub mod dataset;

pub use csv_loader::{load_matches, parse_match_date, LoadSummary};
pub use dataset::Dataset;
