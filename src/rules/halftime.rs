//! Half-time pattern rules
//!
//! Strategies keyed on the score at the break and on the second half.

use regex::Regex;

use super::rule::{BetType, Rule};
use crate::error::Result;

/// Clubs that reliably score after the break
const BIG_TEAMS_PATTERN: &str = r"Barcelona|Real Madrid|Sevilla|Granada|Valencia";

/// Build the half-time rule set
pub fn halftime_rules() -> Result<Vec<Rule>> {
    let big_teams = Regex::new(BIG_TEAMS_PATTERN)?;

    let rules = vec![
        Rule::new(
            "Under25_If_0-0_HT",
            "Under 2.5 when the match is goalless at half-time",
            BetType::Under,
            0.65,
            |m| Some(m.halftime()? == (0, 0)),
        )?,
        Rule::new(
            "Favorite_Holds_Lead",
            "A favorite leading at half-time goes on to win",
            BetType::Favorite,
            0.75,
            |m| {
                let (ht_home, ht_away) = m.halftime()?;
                let home_favorite = m.odds_home.is_some_and(|o| o < 2.0) && ht_home > ht_away;
                let away_favorite = m.odds_away.is_some_and(|o| o < 2.5) && ht_away > ht_home;
                Some(home_favorite || away_favorite)
            },
        )?,
        Rule::new(
            "Leading_1-0_HT_Does_Not_Lose",
            "A side one goal up at half-time rarely loses",
            BetType::DoubleChanceHalftimeLeader,
            0.80,
            |m| {
                let ht = m.halftime()?;
                Some(ht == (1, 0) || ht == (0, 1))
            },
        )?,
        Rule::new(
            "2H_Goal_Big_Teams",
            "Barcelona, Real Madrid, Sevilla, Granada or Valencia playing",
            BetType::SecondHalfGoal,
            0.70,
            move |m| Some(big_teams.is_match(&m.home_team) || big_teams.is_match(&m.away_team)),
        )?,
        Rule::new(
            "2H_Goal_If_1H_Goal",
            "At least one first-half goal means another after the break",
            BetType::SecondHalfGoal,
            0.68,
            |m| Some(m.halftime_goals()? >= 1),
        )?,
        Rule::new(
            "Over25_If_2_Goals_HT",
            "Over 2.5 when two or more goals came before the break",
            BetType::Over,
            0.72,
            |m| Some(m.halftime_goals()? >= 2),
        )?,
    ];

    Ok(rules)
}
