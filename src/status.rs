//! Terminal outcome of a simulation run.

use std::fmt::Display;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::{
    config::{user_locale, StateType},
    transition::{state_char, STATE_HALT, STATE_INCOMPLETE, STATE_NOHALT},
    utils::ConciseBigInt,
};
use num_format::ToFormattedString;

/// Result of one full run. \
/// num_ones carries the sentinel value -1 unless the machine halted; NOHALT and
/// INCOMPLETE are terminal outcomes, not failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimResult {
    /// Number of ones on the tape after halting, -1 otherwise.
    pub num_ones: BigInt,
    /// Total number of micro steps taken.
    pub num_steps: BigInt,
    /// [STATE_HALT], [STATE_NOHALT] or [STATE_INCOMPLETE].
    pub state: StateType,
}

impl SimResult {
    pub fn is_halt(&self) -> bool {
        self.state == STATE_HALT
    }

    pub fn is_nohalt(&self) -> bool {
        self.state == STATE_NOHALT
    }

    pub fn is_incomplete(&self) -> bool {
        self.state == STATE_INCOMPLETE
    }
}

impl Display for SimResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state {
            STATE_INCOMPLETE => write!(f, "Program execution did not complete"),
            STATE_NOHALT => {
                let locale = user_locale();
                match self.num_steps.to_u64() {
                    Some(steps) => write!(
                        f,
                        "Program does not halt (proven after {} steps)",
                        steps.to_formatted_string(&locale)
                    ),
                    None => write!(
                        f,
                        "Program does not halt (proven after {} steps)",
                        ConciseBigInt(&self.num_steps)
                    ),
                }
            }
            STATE_HALT => write!(
                f,
                "{} ones in {} steps, ending in state HALT",
                ConciseBigInt(&self.num_ones),
                ConciseBigInt(&self.num_steps)
            ),
            _ => write!(
                f,
                "Stopped in state {} after {} steps",
                state_char(self.state),
                ConciseBigInt(&self.num_steps)
            ),
        }
    }
}
