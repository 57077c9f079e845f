//! Team form and odds rules
//!
//! These rules read rolling-window features computed upstream and stored in
//! [`MatchRecord::features`](crate::models::MatchRecord). A record without
//! the feature simply does not trigger.

use super::rule::{BetType, Rule};
use crate::error::Result;

/// Points over the last five matches
pub const HOME_FORM_L5: &str = "home_form_l5";
pub const AWAY_FORM_L5: &str = "away_form_l5";
/// Losses over the last three matches
pub const HOME_LOSSES_L3: &str = "home_losses_l3";
pub const AWAY_LOSSES_L3: &str = "away_losses_l3";
/// Wins over the last three matches
pub const AWAY_WINS_L3: &str = "away_wins_l3";
/// Average goals scored over the last five matches
pub const HOME_GOALS_AVG_L5: &str = "home_goals_avg_l5";
pub const AWAY_GOALS_AVG_L5: &str = "away_goals_avg_l5";
/// Matches with both teams scoring among the last four
pub const HOME_BTTS_L4: &str = "home_btts_l4";
pub const AWAY_BTTS_L4: &str = "away_btts_l4";

/// Build the form rule set
pub fn form_rules() -> Result<Vec<Rule>> {
    let rules = vec![
        Rule::new(
            "Home_Favorite_In_Form",
            "Home price under 1.70 and at least 10 points from the last 5",
            BetType::Home,
            0.78,
            |m| Some(m.odds_home? < 1.70 && m.feature(HOME_FORM_L5)? >= 10.0),
        )?,
        Rule::new(
            "Away_Unbeaten",
            "Away side unbeaten in 3, priced under 3.0, 8+ points from the last 5",
            BetType::Away,
            0.72,
            |m| {
                Some(
                    m.feature(AWAY_LOSSES_L3)? == 0.0
                        && m.odds_away? < 3.0
                        && m.feature(AWAY_FORM_L5)? >= 8.0,
                )
            },
        )?,
        Rule::new(
            "BTTS_High_Scorers",
            "Both sides averaging more than 1.5 goals over the last 5",
            BetType::BothTeamsScore,
            0.68,
            |m| Some(m.feature(HOME_GOALS_AVG_L5)? > 1.5 && m.feature(AWAY_GOALS_AVG_L5)? > 1.5),
        )?,
        Rule::new(
            "Home_Dominant",
            "Home side with 12+ points from the last 5, priced under 2.0",
            BetType::Home,
            0.75,
            |m| Some(m.feature(HOME_FORM_L5)? >= 12.0 && m.odds_home? < 2.0),
        )?,
        Rule::new(
            "Away_Winning_Streak",
            "Away side with 2+ wins in the last 3, priced under 2.5",
            BetType::Away,
            0.70,
            |m| Some(m.feature(AWAY_WINS_L3)? >= 2.0 && m.odds_away? < 2.5),
        )?,
        Rule::new(
            "Over25_Attacking_Sides",
            "Combined scoring average above 3.5 over the last 5",
            BetType::Over,
            0.65,
            |m| Some(m.feature(HOME_GOALS_AVG_L5)? + m.feature(AWAY_GOALS_AVG_L5)? > 3.5),
        )?,
        Rule::new(
            "Home_Unbeaten_Favorite",
            "Home side unbeaten in 3, priced under 1.50",
            BetType::Home,
            0.82,
            |m| Some(m.feature(HOME_LOSSES_L3)? == 0.0 && m.odds_home? < 1.50),
        )?,
        Rule::new(
            "BTTS_History_High",
            "Both sides had BTTS in 3+ of their last 4",
            BetType::BothTeamsScore,
            0.71,
            |m| Some(m.feature(HOME_BTTS_L4)? >= 3.0 && m.feature(AWAY_BTTS_L4)? >= 3.0),
        )?,
    ];

    Ok(rules)
}
