//! Declarative betting rules
//!
//! A rule pairs a pure predicate over a [`MatchRecord`] with the market it
//! bets on. Predicates return `Option<bool>` so a missing field can be
//! propagated with `?`; `None` means the rule does not trigger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{BacktestError, Result};
use crate::models::MatchRecord;

/// Market a rule bets on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetType {
    Home,
    Away,
    Draw,
    BothTeamsScore,
    /// Over 2.5 goals
    Over,
    /// Under 2.5 goals
    Under,
    /// Side with the shorter price wins outright
    Favorite,
    /// Half-time leader does not lose
    DoubleChanceHalftimeLeader,
    /// At least one goal after the break
    SecondHalfGoal,
}

impl BetType {
    pub const ALL: [BetType; 9] = [
        BetType::Home,
        BetType::Away,
        BetType::Draw,
        BetType::BothTeamsScore,
        BetType::Over,
        BetType::Under,
        BetType::Favorite,
        BetType::DoubleChanceHalftimeLeader,
        BetType::SecondHalfGoal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BetType::Home => "Home",
            BetType::Away => "Away",
            BetType::Draw => "Draw",
            BetType::BothTeamsScore => "BTTS",
            BetType::Over => "Over 2.5",
            BetType::Under => "Under 2.5",
            BetType::Favorite => "Favorite",
            BetType::DoubleChanceHalftimeLeader => "Double Chance (HT leader)",
            BetType::SecondHalfGoal => "2H Goal",
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BetType {
    type Err = BacktestError;

    /// Accepts the labels above plus the tags used by older rule files
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let bet_type = match normalized.as_str() {
            "home" | "local" | "h" => BetType::Home,
            "away" | "visitante" | "a" => BetType::Away,
            "draw" | "empate" | "d" => BetType::Draw,
            "btts" | "both teams score" | "bothteamsscore" => BetType::BothTeamsScore,
            "over" | "over 2.5" | "over25" => BetType::Over,
            "under" | "under 2.5" | "under25" => BetType::Under,
            "favorite" | "favourite" | "favorito" => BetType::Favorite,
            "double chance (ht leader)"
            | "doublechancehalftimeleader"
            | "doble chance (ganador ht)" => BetType::DoubleChanceHalftimeLeader,
            "2h goal" | "secondhalfgoal" | "gol en 2h" => BetType::SecondHalfGoal,
            _ => {
                return Err(BacktestError::InvalidRule {
                    name: String::new(),
                    reason: format!("unknown bet type '{}'", s),
                })
            }
        };
        Ok(bet_type)
    }
}

/// Predicate signature shared by all rules
pub type Predicate = Arc<dyn Fn(&MatchRecord) -> Option<bool> + Send + Sync>;

/// A named, validated betting rule
#[derive(Clone)]
pub struct Rule {
    name: String,
    description: String,
    predicate: Predicate,
    bet_type: BetType,
    expected_confidence: f64,
    active: bool,
}

impl Rule {
    /// Build a rule, rejecting empty names and confidences outside [0, 1]
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        bet_type: BetType,
        expected_confidence: f64,
        predicate: F,
    ) -> Result<Self>
    where
        F: Fn(&MatchRecord) -> Option<bool> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BacktestError::InvalidRule {
                name,
                reason: "name must not be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&expected_confidence) {
            return Err(BacktestError::InvalidRule {
                name,
                reason: format!(
                    "expected confidence must be within [0, 1], got {}",
                    expected_confidence
                ),
            });
        }

        Ok(Self {
            name,
            description: description.into(),
            predicate: Arc::new(predicate),
            bet_type,
            expected_confidence,
            active: true,
        })
    }

    /// Same as [`Rule::new`] with the bet type given as a tag string
    pub fn from_tag<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        bet_type: &str,
        expected_confidence: f64,
        predicate: F,
    ) -> Result<Self>
    where
        F: Fn(&MatchRecord) -> Option<bool> + Send + Sync + 'static,
    {
        let name = name.into();
        let bet_type = bet_type.parse::<BetType>().map_err(|e| match e {
            BacktestError::InvalidRule { reason, .. } => BacktestError::InvalidRule {
                name: name.clone(),
                reason,
            },
            other => other,
        })?;
        Self::new(name, description, bet_type, expected_confidence, predicate)
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Trigger decision for one match. Missing data never triggers.
    pub fn evaluate(&self, record: &MatchRecord) -> bool {
        (self.predicate)(record).unwrap_or(false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn bet_type(&self) -> BetType {
        self.bet_type
    }

    pub fn expected_confidence(&self) -> f64 {
        self.expected_confidence
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("bet_type", &self.bet_type)
            .field("expected_confidence", &self.expected_confidence)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.active { "✓" } else { "✗" };
        write!(
            f,
            "{} Rule('{}', {}, confidence={:.1}%)",
            state,
            self.name,
            self.bet_type,
            self.expected_confidence * 100.0
        )
    }
}
