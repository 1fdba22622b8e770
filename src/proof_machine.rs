//! Detects and extrapolates recurring tape behavior. \
//! Every proof step computes an abstract signature of the macro machine (control
//! state, all macro symbols, cursor index, direction) and records a snapshot under it.
//! When the same signature has been seen often enough, the latest historic snapshot is
//! compared span by span with the current one: matching identities prove the spans
//! survived the whole interval, so each span's size changes by a constant delta per
//! recurrence. A pattern that shrinks no span proves the machine never halts. A
//! shrinking pattern is replayed once more to establish per-span size lower bounds and
//! a linear micro-step model, then applied the maximum safe number of times in one
//! arithmetic update. \
//! Proofs are one-shot: a confirmed pattern clears the whole history and new patterns
//! accrue from scratch.

use hashbrown::HashMap;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::{
    config::{MacroSymbol, SpanId, StateType},
    macro_machine::{MacroMachine, MacroMachineState},
    rule_table::RuleTable,
    transition::{STATE_HALT, STATE_NOHALT},
};

/// Number of recorded snapshots of a signature before confirmation is attempted.
pub const PATTERN_INSTANCE_THRESHOLD: usize = 3;

/// Running totals of a simulation. The proof machine advances these either by single
/// macro steps or by whole pattern applications.
#[derive(Debug, Clone, Default)]
pub struct SimCounters {
    pub micro_steps: BigInt,
    /// Signed head position in macro symbols.
    pub macro_pos: BigInt,
    /// Macro iterations; one jump counts as one iteration.
    pub iterations: BigInt,
}

/// The hashable signature under which snapshots are recorded. Two snapshots with
/// equal keys describe tapes of identical shape up to span sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    state: StateType,
    symbols: Vec<MacroSymbol>,
    cur_span_idx: u32,
    moving_right: bool,
}

impl PatternKey {
    pub fn new(mstate: &MacroMachineState) -> Self {
        Self {
            state: mstate.state,
            symbols: mstate.tape.symbols(),
            cur_span_idx: mstate.cur_span_index() as u32,
            moving_right: mstate.moving_right,
        }
    }
}

/// A snapshot of the tape's span sizes and identities together with the step totals
/// at the moment a pattern key was observed.
#[derive(Debug, Clone)]
pub struct PatternInstance {
    micro_steps: BigInt,
    macro_pos: BigInt,
    iter_num: BigInt,
    /// (size, id) per span, in tape order, sentinels included.
    spans: Vec<(BigInt, SpanId)>,
}

impl PatternInstance {
    pub fn new(mstate: &MacroMachineState, counters: &SimCounters) -> Self {
        Self {
            micro_steps: counters.micro_steps.clone(),
            macro_pos: counters.macro_pos.clone(),
            iter_num: counters.iterations.clone(),
            spans: mstate.tape.sizes_and_ids(),
        }
    }

    fn num_spans(&self) -> usize {
        self.spans.len()
    }

    fn span_size(&self, span_idx: usize) -> &BigInt {
        &self.spans[span_idx].0
    }

    fn span_id(&self, span_idx: usize) -> SpanId {
        self.spans[span_idx].1
    }

    /// If the transition self -> later forms a proven pattern, returns the pattern
    /// and whether it is non-shrinking (which proves the machine never halts).
    ///
    /// Matching identities mean a span's size never reached 0 in between. That is
    /// sufficient to prove the same transition happens for any larger initial span
    /// size, because the evolution is independent of the absolute sizes as long as
    /// no span empties out and gets erased.
    pub fn confirm_pattern(&self, later: &PatternInstance) -> Option<(Pattern, bool)> {
        // equal keys imply an equal span count
        debug_assert_eq!(self.num_spans(), later.num_spans());
        if self.num_spans() != later.num_spans() {
            return None;
        }
        let mut lbounds_and_deltas = Vec::with_capacity(self.num_spans());
        let mut any_decreasing = false;
        for i in 0..self.num_spans() {
            if later.span_id(i) != self.span_id(i) && later.span_size(i) != self.span_size(i) {
                // the span was erased and recreated in between, no proof
                return None;
            }
            let size_lbound = self.span_size(i).clone();
            let size_delta = later.span_size(i) - self.span_size(i);
            if size_delta.is_negative() {
                any_decreasing = true;
            }
            lbounds_and_deltas.push((size_lbound, size_delta));
        }
        let nohalt = !any_decreasing;
        let num_spans = lbounds_and_deltas.len();
        let pattern = Pattern {
            lbounds_and_deltas,
            num_micro_steps: &later.micro_steps - &self.micro_steps,
            num_macro_steps: &later.macro_pos - &self.macro_pos,
            num_iters: &later.iter_num - &self.iter_num,
            span_micro_steps: vec![(BigInt::zero(), BigInt::zero()); num_spans],
        };
        Some((pattern, nohalt))
    }
}

/// A proven linear rule: per span a size lower bound and a size delta per
/// application, plus the aggregate step counts of one application and the per-span
/// linear micro-step model (steps = m * size + c).
#[derive(Debug, Clone)]
pub struct Pattern {
    lbounds_and_deltas: Vec<(BigInt, BigInt)>,
    num_micro_steps: BigInt,
    num_macro_steps: BigInt,
    num_iters: BigInt,
    /// For each span: (micro steps per repeated symbol, additive offset).
    span_micro_steps: Vec<(BigInt, BigInt)>,
}

impl Pattern {
    fn num_spans(&self) -> usize {
        self.lbounds_and_deltas.len()
    }

    pub fn num_iters(&self) -> &BigInt {
        &self.num_iters
    }

    fn span_size_delta(&self, span_idx: usize) -> &BigInt {
        &self.lbounds_and_deltas[span_idx].1
    }

    fn update_span_size_lower_bound(&mut self, span_idx: usize, lower_bound: BigInt) {
        self.lbounds_and_deltas[span_idx].0 = lower_bound;
    }

    fn update_num_micro_steps(&mut self, num_micro_steps: BigInt) {
        self.num_micro_steps = num_micro_steps;
    }

    fn update_span_micro_steps(&mut self, span_idx: usize, per_symbol: BigInt, offset: BigInt) {
        self.span_micro_steps[span_idx] = (per_symbol, offset);
    }

    /// How often the pattern applies to the current tape. Fixed spans must match
    /// their bound exactly, shrinking spans must not fall below theirs; growing
    /// spans impose no constraint. None when no span shrinks.
    fn num_times_applicable(&self, mstate: &MacroMachineState) -> Option<BigInt> {
        let mut min_num_times: Option<BigInt> = None;
        let mut span_idx = 0;
        for span in mstate.tape.iter() {
            let (lbound, delta) = &self.lbounds_and_deltas[span_idx];
            span_idx += 1;
            if delta.is_zero() {
                if span.size != *lbound {
                    return Some(BigInt::zero());
                }
            } else if delta.is_negative() {
                if span.size < *lbound {
                    return Some(BigInt::zero());
                }
                let num_times = (&span.size - lbound) / -delta + 1u32;
                min_num_times = Some(match min_num_times {
                    None => num_times,
                    Some(min) => min.min(num_times),
                });
            }
        }
        min_num_times
    }

    /// Applies the pattern as often as provably safe in one arithmetic update and
    /// returns the application count (0 when the pattern does not apply).
    pub fn apply(&self, mstate: &mut MacroMachineState, counters: &mut SimCounters) -> BigInt {
        if mstate.tape.len() != self.num_spans() {
            // the replay restructured the tape, the per-span data no longer lines up
            return BigInt::zero();
        }
        let num_times = match self.num_times_applicable(mstate) {
            Some(n) if n.is_positive() => n,
            _ => return BigInt::zero(),
        };
        counters.micro_steps += &self.num_micro_steps * &num_times;
        let mut span_idx = 0;
        let mut idx = mstate.tape.begin();
        while idx != crate::span_tape::END {
            let (_, delta) = &self.lbounds_and_deltas[span_idx];
            let (m, c) = &self.span_micro_steps[span_idx];
            let span = mstate.tape.get_mut(idx);
            if !delta.is_zero() {
                // the span's size while jumped over forms an arithmetic series
                let size_first = span.size.clone();
                let size_last = &size_first + delta * (&num_times - 1u32);
                let series_sum = &num_times * (size_first + size_last) / 2u32;
                counters.micro_steps += m * series_sum;
            }
            counters.micro_steps += c * &num_times;
            span.size += delta * &num_times;
            span_idx += 1;
            idx = mstate.tape.next(idx);
        }
        counters.macro_pos += &self.num_macro_steps * &num_times;
        counters.iterations += &self.num_iters * &num_times;
        num_times
    }
}

/// Per-span bookkeeping during the proof replay.
struct ReplaySpanInfo {
    span_idx: usize,
    min_size: BigInt,
    micro_per_symbol: BigInt,
    micro_offset: BigInt,
}

pub struct ProofMachine {
    macro_machine: MacroMachine,
    /// Maps tape signatures to their historic snapshots.
    history_map: HashMap<PatternKey, Vec<PatternInstance>>,
}

impl ProofMachine {
    pub fn new(rule_table: RuleTable, macro_nbit: u32) -> Self {
        Self {
            macro_machine: MacroMachine::new(rule_table, macro_nbit),
            history_map: HashMap::new(),
        }
    }

    /// One proof step: either a single macro step, or a whole pattern application
    /// covering many macro iterations, or the transition to [STATE_NOHALT] when a
    /// non-shrinking pattern is found.
    pub fn step(&mut self, mstate: &mut MacroMachineState, counters: &mut SimCounters) {
        let key = PatternKey::new(mstate);
        let current = PatternInstance::new(mstate, counters);

        let confirmed = match self.history_map.get(&key) {
            Some(instances) if instances.len() >= PATTERN_INSTANCE_THRESHOLD => instances
                .last()
                .and_then(|historic| historic.confirm_pattern(&current)),
            _ => None,
        };
        if let Some((mut pattern, nohalt)) = confirmed {
            if nohalt {
                // the signature recurred with no span smaller, sizes can never
                // reach 0, the machine cannot halt
                mstate.state = STATE_NOHALT;
                return;
            }
            self.replay_and_apply(&mut pattern, &current, mstate, counters);
            // proofs are one-shot, new patterns accrue from scratch
            self.history_map.clear();
            return;
        }

        self.history_map.entry(key).or_default().push(current);
        let step = self.macro_machine.step(mstate);
        counters.micro_steps += step.delta_micro;
        counters.macro_pos += step.delta_macro;
        counters.iterations += 1u32;
    }

    /// At this point the pattern has only been proven for span sizes larger than the
    /// current ones. Run forward for one more round of the pattern while tracking
    /// the minimum size each pattern span reaches; those minima determine the size
    /// lower bounds for which the pattern provably runs without deleting a span.
    /// The same replay harvests each span's linear micro-step model from the jump
    /// events on it. Returns the number of times the pattern was then applied (0
    /// when it broke during the replay).
    fn replay_and_apply(
        &mut self,
        pattern: &mut Pattern,
        current: &PatternInstance,
        mstate: &mut MacroMachineState,
        counters: &mut SimCounters,
    ) -> BigInt {
        let mut replay_spans: HashMap<SpanId, ReplaySpanInfo> = HashMap::new();
        for span_idx in 0..pattern.num_spans() {
            if !pattern.span_size_delta(span_idx).is_zero() {
                replay_spans.insert(
                    current.span_id(span_idx),
                    ReplaySpanInfo {
                        span_idx,
                        min_size: current.span_size(span_idx).clone(),
                        micro_per_symbol: BigInt::zero(),
                        micro_offset: BigInt::zero(),
                    },
                );
            }
        }

        let Some(replay_iters) = pattern.num_iters().to_u64() else {
            // snapshots lie further apart than actually executed iterations can be
            return BigInt::zero();
        };
        let mut base_micro_steps = BigInt::zero();
        for _ in 0..replay_iters {
            let entry_span_size = mstate.tape.get(mstate.cur_span).size.clone();
            let entry_span_id = mstate.tape.get(mstate.cur_span).id;
            let step = self.macro_machine.step(mstate);
            counters.micro_steps += step.delta_micro;
            counters.macro_pos += step.delta_macro;
            counters.iterations += 1u32;

            if mstate.state >= STATE_HALT {
                // the machine reached a terminal state inside the replay, keep the
                // progress made and abandon the pattern
                return BigInt::zero();
            }
            if let Some(deleted) = step.deleted_span_id {
                if replay_spans.contains_key(&deleted) {
                    // a pattern span emptied out, the pattern no longer applies
                    return BigInt::zero();
                }
            }
            if let Some(shrunk) = step.shrunk_span {
                let shrunk_id = mstate.tape.get(shrunk).id;
                if let Some(info) = replay_spans.get_mut(&shrunk_id) {
                    let size_now = &mstate.tape.get(shrunk).size;
                    if *size_now < info.min_size {
                        info.min_size = size_now.clone();
                    }
                }
            }
            match replay_spans.get_mut(&entry_span_id) {
                Some(info) if step.did_jump => {
                    // steps = m * size + c, harvested per jump over this span
                    info.micro_per_symbol += &step.block_micro_steps;
                    let size_start = current.span_size(info.span_idx);
                    info.micro_offset +=
                        &step.block_micro_steps * (&entry_span_size - size_start);
                }
                _ => base_micro_steps += &step.block_micro_steps,
            }
        }

        pattern.update_num_micro_steps(base_micro_steps);
        for info in replay_spans.values() {
            let size_start = current.span_size(info.span_idx);
            // smallest starting size for which no pattern span reaches 0
            let lower_bound = size_start - &info.min_size + 1u32;
            pattern.update_span_size_lower_bound(info.span_idx, lower_bound);
            pattern.update_span_micro_steps(
                info.span_idx,
                info.micro_per_symbol.clone(),
                info.micro_offset.clone(),
            );
        }
        pattern.apply(mstate, counters)
    }
}
