//! A single transition rule of the machine: what to write, where to move and which
//! state to enter next. \
//! The human readable notation is a 3-character triple carrying in any order one symbol
//! character ('0' or '1'), one direction character ('L' or 'R') and one next-state
//! character ('A'-'F' or 'H' for halt), e.g. "B1R" or "1RB". Parsing is case-insensitive.

use std::fmt::Display;

use crate::config::StateType;

/// States A-F as numeric values 0-5.
pub const STATE_A: StateType = 0;
pub const STATE_B: StateType = 1;
pub const STATE_C: StateType = 2;
pub const STATE_D: StateType = 3;
pub const STATE_E: StateType = 4;
pub const STATE_F: StateType = 5;
/// The machine reached its halt transition.
pub const STATE_HALT: StateType = 6;
/// The machine was proven to never halt.
pub const STATE_NOHALT: StateType = 7;
/// The run was aborted before a decision (span budget or memory exhausted).
pub const STATE_INCOMPLETE: StateType = 8;

/// Marker for table fields that were never filled by the parser. A machine stepping
/// into such a field is treated as non-halting, which also keeps the lookup total.
pub const TRANSITION_UNUSED: TransitionRule = TransitionRule {
    state_next: STATE_NOHALT,
    symbol_write: 0,
    move_right: true,
};

/// Single character for a state, e.g. for the status line.
pub fn state_char(state: StateType) -> char {
    match state {
        STATE_HALT => 'H',
        STATE_NOHALT => 'N',
        STATE_INCOMPLETE => '?',
        s => (b'A' + s) as char,
    }
}

/// One transition of the rule table. This is a human understandable working format,
/// the micro machine reads it directly as the table is tiny.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Next state of the machine, 0-5 for A-F or [STATE_HALT].
    pub state_next: StateType,
    /// Symbol 0 or 1 to write on the tape cell under the head.
    pub symbol_write: u8,
    /// Direction the head moves after writing.
    pub move_right: bool,
}

impl TransitionRule {
    /// Parses one 3-character triple. The three characters can come in any order,
    /// all three aspects (symbol, direction, state) must be present exactly once.
    pub fn try_from_triple(triple: &str) -> Result<Self, &'static str> {
        if triple.len() != 3 {
            return Err("transition triple must have a length of 3");
        }
        let mut symbol_write = None;
        let mut move_right = None;
        let mut state_next = None;
        for c in triple.chars() {
            match c.to_ascii_uppercase() {
                '0' | '1' => symbol_write = Some(c == '1'),
                'L' | 'R' => move_right = Some(c.to_ascii_uppercase() == 'R'),
                'H' => state_next = Some(STATE_HALT),
                s @ 'A'..='F' => state_next = Some(s as u8 - b'A'),
                _ => return Err("invalid character in transition triple"),
            }
        }
        match (symbol_write, move_right, state_next) {
            (Some(symbol), Some(right), Some(state)) => Ok(Self {
                state_next: state,
                symbol_write: symbol as u8,
                move_right: right,
            }),
            _ => Err("transition triple must carry one symbol, one direction and one state"),
        }
    }
}

impl TryFrom<&str> for TransitionRule {
    type Error = &'static str;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        TransitionRule::try_from_triple(value)
    }
}

/// Displays the transition as state-symbol-direction, e.g. "B1R".
impl Display for TransitionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}",
            state_char(self.state_next),
            self.symbol_write,
            if self.move_right { 'R' } else { 'L' }
        )
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn triple_parses_in_any_character_order() {
        let expected = TransitionRule {
            state_next: STATE_B,
            symbol_write: 1,
            move_right: true,
        };
        assert_eq!(expected, TransitionRule::try_from_triple("B1R").unwrap());
        assert_eq!(expected, TransitionRule::try_from_triple("1RB").unwrap());
        assert_eq!(expected, TransitionRule::try_from_triple("R1B").unwrap());
        assert_eq!(expected, TransitionRule::try_from_triple("b1r").unwrap());
    }

    #[test]
    fn triple_parses_halt() {
        let rule = TransitionRule::try_from_triple("H1R").unwrap();
        assert_eq!(STATE_HALT, rule.state_next);
        assert_eq!(1, rule.symbol_write);
        assert!(rule.move_right);
    }

    #[test]
    fn triple_rejects_malformed_input() {
        assert!(TransitionRule::try_from_triple("B1").is_err());
        assert!(TransitionRule::try_from_triple("B1RX").is_err());
        assert!(TransitionRule::try_from_triple("X1R").is_err());
        // direction missing, state doubled
        assert!(TransitionRule::try_from_triple("B1C").is_err());
    }

    #[test]
    fn triple_display_round_trip() {
        for text in ["B1R", "A0L", "H1R", "F0L"] {
            let rule = TransitionRule::try_from_triple(text).unwrap();
            assert_eq!(text, rule.to_string());
            assert_eq!(rule, TransitionRule::try_from_triple(&rule.to_string()).unwrap());
        }
    }
}
