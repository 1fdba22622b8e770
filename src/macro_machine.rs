//! One simulation step over the run-length tape. \
//! The current span's symbol goes through the micro machine together with the control
//! state and the entry direction. When the block exits in the same state and direction
//! it entered with, the identical traversal replays across every repeat of the span,
//! so the cursor jumps the whole span in one step and the step counts are multiplied
//! by the span size. Otherwise a single macro symbol is rewritten, which may grow a
//! neighbor, split the current span or merge two spans. \
//! Equal-symbol neighbors merge as the cursor passes over them; the older identity
//! survives a merge, which keeps more patterns alive in the proof machine.

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::{
    config::{SpanId, StateType},
    micro_machine::MicroMachine,
    rule_table::RuleTable,
    span_tape::{SpanTape, TapeSpan},
    transition::{STATE_A, STATE_NOHALT},
};

/// Full state of the macro machine: control state, tape, cursor and entry direction.
///
/// Cursor semantics: with moving_right the head sits at the left edge of the current
/// span (the next cell to read is the span's first), with moving_right=false at the
/// right edge. The two size-0 spans at the tape ends represent the infinite blank
/// regions; they are never modified or merged.
#[derive(Debug, Clone)]
pub struct MacroMachineState {
    pub state: StateType,
    pub tape: SpanTape,
    /// Arena index of the span under the cursor.
    pub cur_span: usize,
    pub moving_right: bool,
    span_id_counter: SpanId,
}

impl MacroMachineState {
    pub fn new() -> Self {
        let mut tape = SpanTape::new();
        tape.push_back(TapeSpan::new(0, BigInt::zero(), 0));
        tape.push_back(TapeSpan::new(0, BigInt::zero(), 1));
        // moving_right=true means the head starts at the left edge of the current
        // span, which initially is the trailing blank-region sentinel.
        let cur_span = tape.back_idx();
        Self {
            state: STATE_A,
            tape,
            cur_span,
            moving_right: true,
            span_id_counter: 2,
        }
    }

    fn new_span_id(&mut self) -> SpanId {
        let id = self.span_id_counter;
        self.span_id_counter += 1;
        id
    }

    /// Zero-based position of the cursor span, counted from the front sentinel.
    /// This is the cursor part of the proof machine's pattern key.
    pub fn cur_span_index(&self) -> usize {
        let mut index = 0;
        let mut idx = self.tape.begin();
        while idx != self.cur_span {
            idx = self.tape.next(idx);
            index += 1;
        }
        index
    }
}

impl Default for MacroMachineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Deltas and observations of one macro step. The proof machine needs the deleted
/// span identity and the shrunk span to invalidate or tighten its patterns.
#[derive(Debug, Default)]
pub struct MacroStepResult {
    /// Micro steps taken by this macro step (multiplied by the span size on a jump).
    pub delta_micro: BigInt,
    /// Signed change of the macro position (the full span size on a jump).
    pub delta_macro: BigInt,
    /// Identity of a span erased by this step, if any.
    pub deleted_span_id: Option<SpanId>,
    /// Arena index of a span this step shrank by one, if any.
    pub shrunk_span: Option<usize>,
    /// Micro steps of a single block traversal. On a jump this is the per-repeat
    /// count, not the multiplied total; the proof machine's linear micro-step model
    /// is harvested from exactly this value.
    pub block_micro_steps: BigInt,
    pub did_jump: bool,
}

pub struct MacroMachine {
    micro_machine: MicroMachine,
}

impl MacroMachine {
    pub fn new(rule_table: RuleTable, macro_nbit: u32) -> Self {
        Self {
            micro_machine: MicroMachine::new(rule_table, macro_nbit),
        }
    }

    /// Performs one update step on the tape. The only non-advancing outcome is the
    /// transition to [STATE_NOHALT] (infinite micro loop or infinite walk), which
    /// leaves the counters untouched.
    pub fn step(&mut self, mstate: &mut MacroMachineState) -> MacroStepResult {
        let entry_state = mstate.state;
        let entry_right = mstate.moving_right;
        let cur = mstate.cur_span;
        let (r, block_steps) =
            self.micro_machine
                .step(entry_state, mstate.tape.get(cur).symbol, entry_right);
        let mut out = MacroStepResult {
            block_micro_steps: BigInt::from(block_steps),
            ..Default::default()
        };

        if r.state == STATE_NOHALT {
            // infinite micro loop inside the block
            mstate.state = STATE_NOHALT;
            return out;
        }

        if r.state == entry_state && r.exit_right == entry_right {
            // No state change, the traversal replays across every repeat: jump.
            self.jump_step(mstate, &r, block_steps, &mut out);
        } else {
            self.single_step(mstate, &r, block_steps, &mut out);
            mstate.state = r.state;
            mstate.moving_right = r.exit_right;
        }
        out
    }

    fn jump_step(
        &mut self,
        mstate: &mut MacroMachineState,
        r: &crate::micro_machine::MicroResult,
        block_steps: i64,
        out: &mut MacroStepResult,
    ) {
        let cur = mstate.cur_span;
        let tape = &mut mstate.tape;
        if (r.exit_right && cur == tape.back_idx()) || (!r.exit_right && cur == tape.begin()) {
            // walking into the blank region without a state change never ends
            mstate.state = STATE_NOHALT;
            return;
        }
        let jump = tape.get(cur).size.clone();
        out.did_jump = true;
        out.delta_micro = BigInt::from(block_steps) * &jump;
        out.delta_macro = if r.exit_right { jump } else { -jump };

        if r.exit_right && r.symbol == tape.get(tape.prev(cur)).symbol {
            // Keep the older span, erase the newer one (enables more proofs).
            let prev = tape.prev(cur);
            if tape.get(prev).id < tape.get(cur).id {
                // extend the previous span to encompass the current one
                let add = tape.get(cur).size.clone();
                tape.get_mut(prev).size += add;
                out.deleted_span_id = Some(tape.get(cur).id);
                mstate.cur_span = tape.erase(cur);
            } else {
                // extend the current span to encompass the previous one
                let add = tape.get(prev).size.clone();
                out.deleted_span_id = Some(tape.get(prev).id);
                let span = tape.get_mut(cur);
                span.symbol = r.symbol;
                span.size += add;
                tape.erase(prev);
                mstate.cur_span = tape.next(cur);
            }
        } else if !r.exit_right && r.symbol == tape.get(tape.next(cur)).symbol {
            let next = tape.next(cur);
            if tape.get(next).id < tape.get(cur).id {
                let add = tape.get(cur).size.clone();
                tape.get_mut(next).size += add;
                out.deleted_span_id = Some(tape.get(cur).id);
                let after = tape.erase(cur);
                mstate.cur_span = tape.prev(after);
            } else {
                let add = tape.get(next).size.clone();
                out.deleted_span_id = Some(tape.get(next).id);
                let span = tape.get_mut(cur);
                span.symbol = r.symbol;
                span.size += add;
                tape.erase(next);
                mstate.cur_span = tape.prev(cur);
            }
        } else {
            // change the current span's symbol (it may also stay the same)
            tape.get_mut(cur).symbol = r.symbol;
            mstate.cur_span = if r.exit_right {
                tape.next(cur)
            } else {
                tape.prev(cur)
            };
        }
    }

    /// Shrinks the span by one; erases it when empty and reports both to the caller.
    /// Returns the successor index when the span was erased.
    fn shrink_span(tape: &mut SpanTape, idx: usize, out: &mut MacroStepResult) -> Option<usize> {
        tape.get_mut(idx).size -= 1u32;
        out.shrunk_span = Some(idx);
        if tape.get(idx).size.is_zero() {
            out.deleted_span_id = Some(tape.get(idx).id);
            Some(tape.erase(idx))
        } else {
            None
        }
    }

    fn single_step(
        &mut self,
        mstate: &mut MacroMachineState,
        r: &crate::micro_machine::MicroResult,
        block_steps: i64,
        out: &mut MacroStepResult,
    ) {
        let entry_right = mstate.moving_right;
        let cur = mstate.cur_span;
        out.delta_micro = BigInt::from(block_steps);
        out.delta_macro = if r.exit_right {
            BigInt::one()
        } else {
            -BigInt::one()
        };

        if r.exit_right {
            let begin = mstate.tape.begin();
            let last = mstate.tape.back_idx();
            let prev = mstate.tape.prev(cur);
            let single_cell = mstate.tape.get(cur).size.is_one();
            if (entry_right || (single_cell && cur != begin))
                && r.symbol == mstate.tape.get(prev).symbol
            {
                // extend the previous span forward by one
                mstate.tape.get_mut(prev).size += 1u32;
                if cur != last {
                    if let Some(after) = Self::shrink_span(&mut mstate.tape, cur, out) {
                        mstate.cur_span = after;
                    }
                }
            } else if entry_right {
                // insert a new size-1 span before the current one
                let id = mstate.new_span_id();
                mstate
                    .tape
                    .insert_before(cur, TapeSpan::new(r.symbol, BigInt::one(), id));
                if cur != last {
                    if let Some(after) = Self::shrink_span(&mut mstate.tape, cur, out) {
                        mstate.cur_span = after;
                    }
                }
            } else {
                // the head entered leftwards and bounces off to the right
                if r.symbol != mstate.tape.get(cur).symbol {
                    let id = mstate.new_span_id();
                    let insert_at = mstate.tape.next(cur);
                    mstate.cur_span = mstate
                        .tape
                        .insert_before(insert_at, TapeSpan::new(r.symbol, BigInt::one(), id));
                    if cur != begin {
                        Self::shrink_span(&mut mstate.tape, cur, out);
                    }
                }
                mstate.cur_span = mstate.tape.next(mstate.cur_span);
            }
        } else {
            let begin = mstate.tape.begin();
            let last = mstate.tape.back_idx();
            let next = mstate.tape.next(cur);
            let single_cell = mstate.tape.get(cur).size.is_one();
            if (!entry_right || (single_cell && cur != last))
                && r.symbol == mstate.tape.get(next).symbol
            {
                // extend the next span backward by one
                mstate.tape.get_mut(next).size += 1u32;
                if cur != begin {
                    if let Some(after) = Self::shrink_span(&mut mstate.tape, cur, out) {
                        mstate.cur_span = mstate.tape.prev(after);
                    }
                }
            } else if !entry_right {
                // insert a new size-1 span after the current one
                let id = mstate.new_span_id();
                let insert_at = mstate.tape.next(cur);
                mstate
                    .tape
                    .insert_before(insert_at, TapeSpan::new(r.symbol, BigInt::one(), id));
                if cur != begin {
                    if let Some(after) = Self::shrink_span(&mut mstate.tape, cur, out) {
                        mstate.cur_span = mstate.tape.prev(after);
                    }
                }
            } else {
                // the head entered rightwards and bounces off to the left
                if r.symbol != mstate.tape.get(cur).symbol {
                    let id = mstate.new_span_id();
                    mstate.cur_span = mstate
                        .tape
                        .insert_before(cur, TapeSpan::new(r.symbol, BigInt::one(), id));
                    if cur != last {
                        Self::shrink_span(&mut mstate.tape, cur, out);
                    }
                }
                mstate.cur_span = mstate.tape.prev(mstate.cur_span);
            }
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::transition::{STATE_HALT, STATE_NOHALT};

    fn run_steps(machine: &mut MacroMachine, mstate: &mut MacroMachineState, steps: usize) {
        for _ in 0..steps {
            if mstate.state >= STATE_HALT {
                break;
            }
            machine.step(mstate);
        }
    }

    /// The blank-region sentinels must stay untouched and no interior span may sit
    /// around with size 0.
    fn assert_tape_invariants(mstate: &MacroMachineState) {
        let tape = &mstate.tape;
        let begin = tape.begin();
        let back = tape.back_idx();
        assert_eq!(0, tape.get(begin).symbol);
        assert!(tape.get(begin).size.is_zero());
        assert_eq!(0, tape.get(back).symbol);
        assert!(tape.get(back).size.is_zero());
        for idx in tape.indices() {
            if idx != begin && idx != back {
                assert!(
                    !tape.get(idx).size.is_zero(),
                    "interior span with size 0 was not erased"
                );
            }
        }
    }

    #[test]
    fn macro_machine_bb2_halts_with_correct_counts() {
        let table = RuleTable::try_from_triple_text("B1R B1L  A1L H1R").unwrap();
        let mut machine = MacroMachine::new(table, 2);
        let mut mstate = MacroMachineState::new();
        let mut micro = BigInt::zero();
        let mut macro_pos = BigInt::zero();
        for _ in 0..100 {
            if mstate.state >= STATE_HALT {
                break;
            }
            let r = machine.step(&mut mstate);
            micro += r.delta_micro;
            macro_pos += r.delta_macro;
            assert_tape_invariants(&mstate);
        }
        assert_eq!(STATE_HALT, mstate.state);
        assert_eq!(BigInt::from(6), micro);
        assert_eq!(BigInt::from(4), mstate.tape.count_ones());
    }

    #[test]
    fn macro_machine_detects_infinite_walk() {
        // A0 writes 1 and stays in A moving right: runs along the blank region forever
        let table = RuleTable::try_from_triple_text("A1R A1R").unwrap();
        let mut machine = MacroMachine::new(table, 4);
        let mut mstate = MacroMachineState::new();
        run_steps(&mut machine, &mut mstate, 10);
        assert_eq!(STATE_NOHALT, mstate.state);
    }

    #[test]
    fn macro_machine_merges_keep_older_identity() {
        let table = RuleTable::try_from_triple_text("B1R H1R  C0R B1R  C1L A1L").unwrap();
        let mut machine = MacroMachine::new(table, 2);
        let mut mstate = MacroMachineState::new();
        let mut last_counter = 2;
        for _ in 0..200 {
            if mstate.state >= STATE_HALT {
                break;
            }
            machine.step(&mut mstate);
            assert_tape_invariants(&mstate);
            // identities grow monotonically, erased ones never come back
            assert!(mstate.span_id_counter >= last_counter);
            last_counter = mstate.span_id_counter;
            let mut seen: Vec<SpanId> = mstate.tape.iter().map(|s| s.id).collect();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), mstate.tape.len());
        }
        assert_eq!(STATE_HALT, mstate.state);
    }

    #[test]
    fn macro_machine_width_one_matches_plain_simulation() {
        // with 1-bit blocks every macro symbol is a plain cell
        let table = RuleTable::try_from_triple_text("B1R B1L  A1L C0L  H1R D1L  D1R A0R").unwrap();
        let mut machine = MacroMachine::new(table, 1);
        let mut mstate = MacroMachineState::new();
        let mut micro = BigInt::zero();
        for _ in 0..100_000 {
            if mstate.state >= STATE_HALT {
                break;
            }
            let r = machine.step(&mut mstate);
            micro += r.delta_micro;
        }
        assert_eq!(STATE_HALT, mstate.state);
        assert_eq!(BigInt::from(107), micro);
        assert_eq!(BigInt::from(13), mstate.tape.count_ones());
    }
}
