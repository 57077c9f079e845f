//! Bet outcome and odds resolution
//!
//! Settles a triggered rule against the final score. Settlement is
//! three-valued: some markets do not apply to every match, and those matches
//! must not be counted as losses.

use serde::{Deserialize, Serialize};

use crate::config::OddsConfig;
use crate::models::{MatchRecord, MatchResult};
use crate::rules::BetType;

/// Goal line for the over/under markets
pub const GOAL_LINE: f64 = 2.5;

/// Settlement of one bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    /// The market does not apply to this match (no decision)
    NotApplicable,
}

impl Outcome {
    fn from_bool(won: bool) -> Self {
        if won {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }
}

/// Favorite side by price: the lower price wins, ties go to the away side
fn favorite(record: &MatchRecord) -> Option<MatchResult> {
    let home = record.odds_home?;
    let away = record.odds_away?;
    if home < away {
        Some(MatchResult::HomeWin)
    } else {
        Some(MatchResult::AwayWin)
    }
}

/// Decide whether a bet of `bet_type` on `record` won
pub fn resolve_outcome(record: &MatchRecord, bet_type: BetType) -> Outcome {
    let total = record.total_goals() as f64;

    match bet_type {
        BetType::Home => Outcome::from_bool(record.result == MatchResult::HomeWin),
        BetType::Away => Outcome::from_bool(record.result == MatchResult::AwayWin),
        BetType::Draw => Outcome::from_bool(record.result == MatchResult::Draw),
        BetType::BothTeamsScore => Outcome::from_bool(record.both_teams_scored()),
        BetType::Over => Outcome::from_bool(total > GOAL_LINE),
        BetType::Under => Outcome::from_bool(total < GOAL_LINE),
        BetType::Favorite => match favorite(record) {
            Some(MatchResult::HomeWin) => Outcome::from_bool(record.home_goals > record.away_goals),
            Some(_) => Outcome::from_bool(record.away_goals > record.home_goals),
            None => Outcome::NotApplicable,
        },
        BetType::DoubleChanceHalftimeLeader => match record.halftime() {
            Some((ht_home, ht_away)) if ht_home > ht_away => {
                Outcome::from_bool(record.home_goals >= record.away_goals)
            }
            Some((ht_home, ht_away)) if ht_away > ht_home => {
                Outcome::from_bool(record.away_goals >= record.home_goals)
            }
            // Level at the break, or unknown
            _ => Outcome::NotApplicable,
        },
        BetType::SecondHalfGoal => match record.second_half_goals() {
            Some(goals) => Outcome::from_bool(goals > 0),
            None => Outcome::NotApplicable,
        },
    }
}

/// A market price that can pay out; 1.0 and below are treated as missing
fn market_price(price: Option<f64>) -> Option<f64> {
    price.filter(|o| *o > 1.0)
}

/// Decimal odds that applied to a bet of `bet_type` on `record`
///
/// Market prices are read from the record when present; markets without
/// prices in the data settle at the configured placeholder.
pub fn resolve_odds(record: &MatchRecord, bet_type: BetType, odds: &OddsConfig) -> f64 {
    match bet_type {
        BetType::Home => market_price(record.odds_home).unwrap_or(odds.home),
        BetType::Away => market_price(record.odds_away).unwrap_or(odds.away),
        BetType::Draw => market_price(record.odds_draw).unwrap_or(odds.draw),
        BetType::BothTeamsScore => market_price(record.odds_btts).unwrap_or(odds.both_teams_score),
        BetType::Favorite => odds.favorite,
        BetType::DoubleChanceHalftimeLeader => odds.double_chance,
        BetType::Over => odds.over_2_5,
        BetType::Under => odds.under_2_5,
        BetType::SecondHalfGoal => odds.second_half_goal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn game(home_goals: u32, away_goals: u32) -> MatchRecord {
        MatchRecord::new(
            NaiveDate::from_ymd_opt(2024, 5, 19).unwrap(),
            "Betis",
            "Valencia",
            home_goals,
            away_goals,
        )
    }

    #[test]
    fn test_result_markets() {
        assert_eq!(resolve_outcome(&game(2, 1), BetType::Home), Outcome::Win);
        assert_eq!(resolve_outcome(&game(2, 1), BetType::Away), Outcome::Loss);
        assert_eq!(resolve_outcome(&game(1, 1), BetType::Draw), Outcome::Win);
        assert_eq!(resolve_outcome(&game(0, 1), BetType::Away), Outcome::Win);
    }

    #[test]
    fn test_goal_markets() {
        assert_eq!(resolve_outcome(&game(1, 1), BetType::BothTeamsScore), Outcome::Win);
        assert_eq!(resolve_outcome(&game(3, 0), BetType::BothTeamsScore), Outcome::Loss);
        assert_eq!(resolve_outcome(&game(2, 1), BetType::Over), Outcome::Win);
        assert_eq!(resolve_outcome(&game(1, 1), BetType::Over), Outcome::Loss);
        assert_eq!(resolve_outcome(&game(1, 1), BetType::Under), Outcome::Win);
        assert_eq!(resolve_outcome(&game(2, 1), BetType::Under), Outcome::Loss);
    }

    #[test]
    fn test_favorite_market() {
        let home_fav = game(2, 0).with_odds(1.5, 4.0, 6.0);
        assert_eq!(resolve_outcome(&home_fav, BetType::Favorite), Outcome::Win);

        let away_fav_drew = game(1, 1).with_odds(5.0, 3.8, 1.7);
        assert_eq!(resolve_outcome(&away_fav_drew, BetType::Favorite), Outcome::Loss);

        let away_fav_won = game(0, 2).with_odds(5.0, 3.8, 1.7);
        assert_eq!(resolve_outcome(&away_fav_won, BetType::Favorite), Outcome::Win);

        assert_eq!(resolve_outcome(&game(0, 2), BetType::Favorite), Outcome::NotApplicable);
    }

    #[test]
    fn test_double_chance_leader_holds() {
        // Led 1-0, drew 1-1: the leader did not lose
        let m = game(1, 1).with_halftime(1, 0);
        assert_eq!(resolve_outcome(&m, BetType::DoubleChanceHalftimeLeader), Outcome::Win);

        let m = game(1, 2).with_halftime(1, 0);
        assert_eq!(resolve_outcome(&m, BetType::DoubleChanceHalftimeLeader), Outcome::Loss);

        let m = game(0, 3).with_halftime(0, 1);
        assert_eq!(resolve_outcome(&m, BetType::DoubleChanceHalftimeLeader), Outcome::Win);
    }

    #[test]
    fn test_double_chance_level_halftime_is_no_decision() {
        let m = game(2, 1).with_halftime(1, 1);
        assert_eq!(
            resolve_outcome(&m, BetType::DoubleChanceHalftimeLeader),
            Outcome::NotApplicable
        );
        assert_eq!(
            resolve_outcome(&game(2, 1), BetType::DoubleChanceHalftimeLeader),
            Outcome::NotApplicable
        );
    }

    #[test]
    fn test_second_half_goal() {
        assert_eq!(
            resolve_outcome(&game(1, 1).with_halftime(1, 0), BetType::SecondHalfGoal),
            Outcome::Win
        );
        assert_eq!(
            resolve_outcome(&game(1, 0).with_halftime(1, 0), BetType::SecondHalfGoal),
            Outcome::Loss
        );
        assert_eq!(resolve_outcome(&game(1, 0), BetType::SecondHalfGoal), Outcome::NotApplicable);
    }

    #[test]
    fn test_resolve_odds_market_and_fallback() {
        let odds = OddsConfig::default();
        let priced = game(1, 0).with_odds(2.1, 3.3, 3.6);

        assert_eq!(resolve_odds(&priced, BetType::Home, &odds), 2.1);
        assert_eq!(resolve_odds(&priced, BetType::Draw, &odds), 3.3);
        assert_eq!(resolve_odds(&priced, BetType::Away, &odds), 3.6);
        assert_eq!(resolve_odds(&game(1, 0), BetType::Home, &odds), odds.home);
        assert_eq!(resolve_odds(&game(1, 0), BetType::BothTeamsScore, &odds), 1.8);
    }

    #[test]
    fn test_unplayable_market_price_uses_fallback() {
        let odds = OddsConfig::default();
        let zeroed = game(1, 0).with_odds(0.0, 1.0, 3.6);

        assert_eq!(resolve_odds(&zeroed, BetType::Home, &odds), odds.home);
        assert_eq!(resolve_odds(&zeroed, BetType::Draw, &odds), odds.draw);
        assert_eq!(resolve_odds(&zeroed, BetType::Away, &odds), 3.6);
    }

    #[test]
    fn test_resolve_odds_placeholders_are_configurable() {
        let odds = OddsConfig::default().with_placeholder(2.05);
        let priced = game(1, 0).with_odds(2.1, 3.3, 3.6);

        for bet_type in [
            BetType::Favorite,
            BetType::DoubleChanceHalftimeLeader,
            BetType::Over,
            BetType::Under,
            BetType::SecondHalfGoal,
        ] {
            assert_eq!(resolve_odds(&priced, bet_type, &odds), 2.05);
        }
    }
}
