//! Performs step-by-step simulation within a single macro symbol. \
//! The head enters the block at bit 0 (entering rightwards) or at bit w-1 (entering
//! leftwards) and ordinary Turing transitions run cell by cell until the head leaves
//! the block, the machine halts, or an in-block cycle proves it never will. \
//! Every result is memoized by (entry state, symbol, entry direction); for a fixed
//! rule table the cache is coherent and grows without eviction over the run. It is
//! the single largest memory consumer of the simulation.

use hashbrown::{HashMap, HashSet};

use crate::{
    config::{BlockStepType, MacroSymbol, StateType, MAX_MACRO_NBIT},
    rule_table::RuleTable,
    transition::{STATE_HALT, STATE_NOHALT},
};

/// Result of one block traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicroResult {
    /// Exit state, or [STATE_HALT] / [STATE_NOHALT].
    pub state: StateType,
    /// The (possibly modified) macro symbol the block holds afterwards.
    pub symbol: MacroSymbol,
    /// True if the head walked off the right edge. Remains true when the machine
    /// halted inside the block.
    pub exit_right: bool,
}

pub struct MicroMachine {
    rule_table: RuleTable,
    macro_nbit: u32,
    /// (entry state, symbol, entry direction) packed into 64 bits -> (result, steps).
    cache: HashMap<u64, (MicroResult, BlockStepType)>,
}

impl MicroMachine {
    pub fn new(rule_table: RuleTable, macro_nbit: u32) -> Self {
        debug_assert!(macro_nbit >= 1 && macro_nbit <= MAX_MACRO_NBIT);
        Self {
            rule_table,
            macro_nbit,
            cache: HashMap::new(),
        }
    }

    /// The symbol occupies at most 60 bits, the state 3 bits, the direction 1 bit.
    #[inline]
    fn cache_key(state: StateType, symbol: MacroSymbol, enter_right: bool) -> u64 {
        state as u64 | (symbol << 3) | ((enter_right as u64) << 63)
    }

    /// Runs the machine inside the given block until it leaves, halts or cycles.
    /// Returns the traversal result and the number of micro steps taken.
    pub fn step(
        &mut self,
        state: StateType,
        symbol: MacroSymbol,
        enter_right: bool,
    ) -> (MicroResult, BlockStepType) {
        let key = Self::cache_key(state, symbol, enter_right);
        if let Some(hit) = self.cache.get(&key) {
            return *hit;
        }

        let nbit = self.macro_nbit as i32;
        let mut cur_state = state;
        let mut tape = symbol;
        let mut pos: i32 = if enter_right { 0 } else { nbit - 1 };
        let mut exit_right = true;
        let mut num_steps: BlockStepType = 0;
        let mut visited: HashSet<(i32, MacroSymbol, StateType)> = HashSet::new();
        while cur_state < STATE_HALT {
            if !visited.insert((pos, tape, cur_state)) {
                // the block re-entered a previous situation, it loops forever
                cur_state = STATE_NOHALT;
                break;
            }
            let read = ((tape >> pos) & 1) as u8;
            let rule = self.rule_table.lookup(cur_state, read);
            cur_state = rule.state_next;
            if rule.symbol_write == 1 {
                tape |= 1 << pos;
            } else {
                tape &= !(1 << pos);
            }
            pos += if rule.move_right { 1 } else { -1 };
            num_steps += 1;
            if pos == -1 || pos == nbit {
                exit_right = pos == nbit;
                break;
            }
        }

        let result = MicroResult {
            state: cur_state,
            symbol: tape,
            exit_right,
        };
        self.cache.insert(key, (result, num_steps));
        (result, num_steps)
    }
}
