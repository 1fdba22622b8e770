//! Holds the transitions for one Turing machine. \
//! This is a table of 2 * n_states fields, having A0 A1 in the first line. The text
//! format is a whitespace-separated list of 3-character triples in the order
//! A0 A1 B0 B1 ..., see [crate::transition] for the triple notation. \
//! The table is immutable after construction; lookup is total and cannot fail.

use std::fmt::Display;

use crate::{
    config::{StateType, MAX_STATES, NUM_SYMBOLS},
    transition::{TransitionRule, TRANSITION_UNUSED},
};

type RuleTableArray = [[TransitionRule; NUM_SYMBOLS]; MAX_STATES];

/// The rule table defining one single-tape, 2-symbol machine with up to six states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleTable {
    /// rules\[state\]\[symbol\] is the transition for (state, read symbol).
    rules: RuleTableArray,
    n_states: usize,
}

impl RuleTable {
    /// Creates the rule table from the whitespace-separated triple notation or returns
    /// an error, e.g. "B1R B1L  A1L H1R" for BB2.
    ///
    /// # Examples
    /// ```
    /// use bb_prover::rule_table::RuleTable;
    /// let table_in = "B1R B1L  A1L H1R";
    /// let table = RuleTable::try_from_triple_text(table_in).unwrap();
    /// assert_eq!(table_in, table.to_string());
    /// ```
    pub fn try_from_triple_text(text: &str) -> Result<Self, &'static str> {
        let mut rules = [[TRANSITION_UNUSED; NUM_SYMBOLS]; MAX_STATES];
        let mut num_triples = 0;
        for triple in text.split_whitespace() {
            if num_triples / NUM_SYMBOLS >= MAX_STATES {
                return Err("rule table exceeds the limit of 6 states");
            }
            rules[num_triples / NUM_SYMBOLS][num_triples % NUM_SYMBOLS] =
                TransitionRule::try_from_triple(triple)?;
            num_triples += 1;
        }
        if num_triples == 0 {
            return Err("rule table is empty");
        }
        Ok(Self {
            rules,
            n_states: num_triples.div_ceil(NUM_SYMBOLS),
        })
    }

    /// Returns the transition for (state, read symbol). \
    /// A field never filled by the parser carries [STATE_NOHALT] as its next state,
    /// so stepping into it ends the run instead of running wild.
    #[inline]
    pub fn lookup(&self, state: StateType, symbol: u8) -> TransitionRule {
        self.rules[state as usize][symbol as usize]
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }
}

impl TryFrom<&str> for RuleTable {
    type Error = &'static str;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        RuleTable::try_from_triple_text(value)
    }
}

/// Displays the table in the triple notation it was parsed from; parsing the
/// output again yields the identical table.
impl Display for RuleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut state_texts = Vec::with_capacity(self.n_states);
        for state in 0..self.n_states {
            state_texts.push(format!(
                "{} {}",
                self.rules[state][0], self.rules[state][1]
            ));
        }
        write!(f, "{}", state_texts.join("  "))
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::transition::{STATE_A, STATE_B, STATE_HALT, STATE_NOHALT};

    #[test]
    fn rule_table_parses_bb2() {
        let table = RuleTable::try_from_triple_text("B1R B1L  A1L H1R").unwrap();
        assert_eq!(2, table.n_states());
        let a0 = table.lookup(STATE_A, 0);
        assert_eq!(STATE_B, a0.state_next);
        assert_eq!(1, a0.symbol_write);
        assert!(a0.move_right);
        let b1 = table.lookup(STATE_B, 1);
        assert_eq!(STATE_HALT, b1.state_next);
        assert!(b1.move_right);
    }

    #[test]
    fn rule_table_parses_state_first_notation() {
        // both common notations must yield the same table
        let t1 = RuleTable::try_from_triple_text("B1R B1L  A1L H1R").unwrap();
        let t2 = RuleTable::try_from_triple_text("1RB 1LB  1LA 1RH").unwrap();
        assert_eq!(t1, t2);
    }

    #[test]
    fn rule_table_display_round_trip() {
        let texts = [
            "B1R B1L  A1L H1R",
            "B1R H1R  C0R B1R  C1L A1L",
            "B1R B1L  A1L C0L  H1R D1L  D1R A0R",
            "B1R C1L  C1R B1R  D1R E0L  A1L D1L  H1R A0L",
        ];
        for text in texts {
            let table = RuleTable::try_from_triple_text(text).unwrap();
            let formatted = table.to_string();
            assert_eq!(text, formatted);
            let reparsed = RuleTable::try_from_triple_text(&formatted).unwrap();
            assert_eq!(table, reparsed);
        }
    }

    #[test]
    fn rule_table_rejects_malformed_input() {
        assert!(RuleTable::try_from_triple_text("").is_err());
        assert!(RuleTable::try_from_triple_text("B1R B1").is_err());
        assert!(RuleTable::try_from_triple_text("B1R X1L").is_err());
        // 7 states exceed the limit
        let seven_states = "B1R B1L ".repeat(7);
        assert!(RuleTable::try_from_triple_text(&seven_states).is_err());
    }

    #[test]
    fn rule_table_unused_field_is_nohalt() {
        // only state A defined, a reference into B must resolve to NOHALT
        let table = RuleTable::try_from_triple_text("B1R B1L").unwrap();
        assert_eq!(STATE_NOHALT, table.lookup(STATE_B, 0).state_next);
    }
}
