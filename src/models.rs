use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Full-time result category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    #[serde(rename = "H")]
    HomeWin,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "A")]
    AwayWin,
}

impl MatchResult {
    /// Derive the result from a score line
    pub fn from_score(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => MatchResult::HomeWin,
            std::cmp::Ordering::Equal => MatchResult::Draw,
            std::cmp::Ordering::Less => MatchResult::AwayWin,
        }
    }

    /// Parse the single-letter code used by results files (H/D/A)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "H" => Some(MatchResult::HomeWin),
            "D" => Some(MatchResult::Draw),
            "A" => Some(MatchResult::AwayWin),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MatchResult::HomeWin => "H",
            MatchResult::Draw => "D",
            MatchResult::AwayWin => "A",
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One played fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub season: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    #[serde(default)]
    pub ht_home_goals: Option<u32>,
    #[serde(default)]
    pub ht_away_goals: Option<u32>,
    pub result: MatchResult,
    #[serde(default)]
    pub odds_home: Option<f64>,
    #[serde(default)]
    pub odds_draw: Option<f64>,
    #[serde(default)]
    pub odds_away: Option<f64>,
    #[serde(default)]
    pub odds_btts: Option<f64>,
    /// Externally engineered numeric features (team form, streaks, ...)
    #[serde(default)]
    pub features: BTreeMap<String, f64>,
}

impl MatchRecord {
    /// Create a record from the final score; the result is derived from it
    pub fn new(
        date: NaiveDate,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_goals: u32,
        away_goals: u32,
    ) -> Self {
        Self {
            date,
            season: None,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_goals,
            away_goals,
            ht_home_goals: None,
            ht_away_goals: None,
            result: MatchResult::from_score(home_goals, away_goals),
            odds_home: None,
            odds_draw: None,
            odds_away: None,
            odds_btts: None,
            features: BTreeMap::new(),
        }
    }

    pub fn with_halftime(mut self, home: u32, away: u32) -> Self {
        self.ht_home_goals = Some(home);
        self.ht_away_goals = Some(away);
        self
    }

    pub fn with_odds(mut self, home: f64, draw: f64, away: f64) -> Self {
        self.odds_home = Some(home);
        self.odds_draw = Some(draw);
        self.odds_away = Some(away);
        self
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: f64) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    /// Named feature lookup; `None` when the feature was not computed
    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }

    pub fn both_teams_scored(&self) -> bool {
        self.home_goals > 0 && self.away_goals > 0
    }

    pub fn total_goals(&self) -> u32 {
        self.home_goals + self.away_goals
    }

    pub fn goal_margin(&self) -> u32 {
        self.home_goals.abs_diff(self.away_goals)
    }

    /// Half-time score as (home, away), if both halves are known
    pub fn halftime(&self) -> Option<(u32, u32)> {
        Some((self.ht_home_goals?, self.ht_away_goals?))
    }

    pub fn halftime_goals(&self) -> Option<u32> {
        self.halftime().map(|(h, a)| h + a)
    }

    /// Goals scored after the break, summed over both sides
    pub fn second_half_goals(&self) -> Option<u32> {
        let (ht_home, ht_away) = self.halftime()?;
        let home = self.home_goals.checked_sub(ht_home)?;
        let away = self.away_goals.checked_sub(ht_away)?;
        Some(home + away)
    }
}
