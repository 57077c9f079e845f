//! Betting rules and built-in rule sets

pub mod form;
pub mod halftime;
pub mod rule;

pub use form::form_rules;
pub use halftime::halftime_rules;
pub use rule::{BetType, Predicate, Rule};

use crate::error::Result;

/// Built-in rule collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
    Halftime,
    Form,
    All,
}

impl RuleSet {
    pub fn build(self) -> Result<Vec<Rule>> {
        match self {
            RuleSet::Halftime => halftime_rules(),
            RuleSet::Form => form_rules(),
            RuleSet::All => {
                let mut rules = halftime_rules()?;
                rules.extend(form_rules()?);
                Ok(rules)
            }
        }
    }
}
