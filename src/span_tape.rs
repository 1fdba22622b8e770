//! Run-length representation of the tape. \
//! Instead of one cell per symbol, the tape is a doubly-linked sequence of spans,
//! each holding a macro symbol, an arbitrary-precision repeat count and a stable
//! identity. The proof machine keys its patterns on these identities, so a span must
//! stay pointer-equivalent from creation to deletion.
//!
//! All nodes live in a single contiguous arena with a free list for erased slots.
//! This avoids per-node allocation and keeps splice and erase at the cursor O(1).
//! Arena slot 0 is the list sentry: its next/prev refer to the first/last element of
//! the list (or to the sentry itself when the list is empty) and it never carries a
//! span. Node indices stay valid across unrelated inserts and erases; only dropping
//! the whole tape invalidates them.
//!
//! Note the sentry is not one of the *tape* sentinels: the two spans representing the
//! infinite blank regions are ordinary nodes pushed front and back by the macro
//! machine state.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::config::{MacroSymbol, SpanId};

/// List end marker: the arena index of the sentry node.
pub const END: usize = 0;

/// One maximal run of identical macro symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeSpan {
    /// The macro symbol repeated across this span.
    pub symbol: MacroSymbol,
    /// Number of times the symbol repeats. Can grow to thousands of decimal digits
    /// once patterns are applied arithmetically.
    pub size: BigInt,
    /// Unique for the lifetime of the tape, never reused.
    pub id: SpanId,
}

impl TapeSpan {
    pub fn new(symbol: MacroSymbol, size: BigInt, id: SpanId) -> Self {
        Self { symbol, size, id }
    }
}

#[derive(Debug, Clone)]
struct Node {
    next: usize,
    prev: usize,
    span: TapeSpan,
}

/// Doubly-linked span list backed by a contiguous arena, see the module description.
#[derive(Debug, Clone)]
pub struct SpanTape {
    nodes: Vec<Node>,
    free_head: Option<usize>,
    len: usize,
}

impl SpanTape {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                next: END,
                prev: END,
                // the sentry carries no span, this is filler
                span: TapeSpan::new(0, BigInt::zero(), SpanId::MAX),
            }],
            free_head: None,
            len: 0,
        }
    }

    /// Number of spans on the tape, the two blank-region sentinels included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the first span, or [END] when the tape is empty.
    #[inline]
    pub fn begin(&self) -> usize {
        self.nodes[END].next
    }

    /// Index of the last span, or [END] when the tape is empty.
    #[inline]
    pub fn back_idx(&self) -> usize {
        self.nodes[END].prev
    }

    #[inline]
    pub fn next(&self, idx: usize) -> usize {
        self.nodes[idx].next
    }

    #[inline]
    pub fn prev(&self, idx: usize) -> usize {
        self.nodes[idx].prev
    }

    #[inline]
    pub fn get(&self, idx: usize) -> &TapeSpan {
        debug_assert!(idx != END);
        &self.nodes[idx].span
    }

    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> &mut TapeSpan {
        debug_assert!(idx != END);
        &mut self.nodes[idx].span
    }

    /// Inserts a span before the given position (before [END] appends) and returns
    /// the new node's index. Erased slots are reused before the arena grows.
    pub fn insert_before(&mut self, idx: usize, span: TapeSpan) -> usize {
        let new_idx = match self.free_head {
            Some(free) => {
                self.free_head = match self.nodes[free].next {
                    END => None,
                    next_free => Some(next_free),
                };
                self.nodes[free].span = span;
                free
            }
            None => {
                self.nodes.push(Node {
                    next: 0,
                    prev: 0,
                    span,
                });
                self.nodes.len() - 1
            }
        };
        let prev_idx = self.nodes[idx].prev;
        self.nodes[new_idx].next = idx;
        self.nodes[new_idx].prev = prev_idx;
        self.nodes[idx].prev = new_idx;
        self.nodes[prev_idx].next = new_idx;
        self.len += 1;
        new_idx
    }

    pub fn push_back(&mut self, span: TapeSpan) -> usize {
        self.insert_before(END, span)
    }

    pub fn push_front(&mut self, span: TapeSpan) -> usize {
        let begin = self.begin();
        self.insert_before(begin, span)
    }

    /// Unlinks the node and returns the index of its successor. The slot goes onto
    /// the free list; its contents stay untouched until the slot is reused.
    pub fn erase(&mut self, idx: usize) -> usize {
        debug_assert!(idx != END && self.len > 0);
        let next_idx = self.nodes[idx].next;
        let prev_idx = self.nodes[idx].prev;
        self.nodes[next_idx].prev = prev_idx;
        self.nodes[prev_idx].next = next_idx;
        self.nodes[idx].next = self.free_head.unwrap_or(END);
        self.free_head = Some(idx);
        self.len -= 1;
        next_idx
    }

    /// Iterates the spans front to back.
    pub fn iter(&self) -> SpanIter<'_> {
        SpanIter {
            tape: self,
            idx: self.begin(),
        }
    }

    /// Iterates the arena indices front to back.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        let mut idx = self.begin();
        std::iter::from_fn(move || {
            if idx == END {
                None
            } else {
                let cur = idx;
                idx = self.next(idx);
                Some(cur)
            }
        })
    }

    /// All macro symbols in tape order, sentinels included. This is the symbol part
    /// of the proof machine's pattern key.
    pub fn symbols(&self) -> Vec<MacroSymbol> {
        self.iter().map(|span| span.symbol).collect()
    }

    /// Per-span (size, id) snapshot in tape order, sentinels included.
    pub fn sizes_and_ids(&self) -> Vec<(BigInt, SpanId)> {
        self.iter()
            .map(|span| (span.size.clone(), span.id))
            .collect()
    }

    /// Total number of ones written on the tape.
    pub fn count_ones(&self) -> BigInt {
        let mut num_ones = BigInt::zero();
        for span in self.iter() {
            if span.symbol != 0 {
                num_ones += &span.size * span.symbol.count_ones();
            }
        }
        num_ones
    }

    /// Number of macro symbols between the blank-region sentinels.
    pub fn num_macro_symbols(&self) -> BigInt {
        let mut length = BigInt::zero();
        let begin = self.begin();
        let back = self.back_idx();
        for idx in self.indices() {
            if idx != begin && idx != back {
                length += &self.get(idx).size;
            }
        }
        length
    }
}

impl Default for SpanTape {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SpanIter<'a> {
    tape: &'a SpanTape,
    idx: usize,
}

impl<'a> Iterator for SpanIter<'a> {
    type Item = &'a TapeSpan;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx == END {
            return None;
        }
        let span = self.tape.get(self.idx);
        self.idx = self.tape.next(self.idx);
        Some(span)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn span(symbol: MacroSymbol, size: u32, id: SpanId) -> TapeSpan {
        TapeSpan::new(symbol, BigInt::from(size), id)
    }

    fn collect_ids(tape: &SpanTape) -> Vec<SpanId> {
        tape.iter().map(|s| s.id).collect()
    }

    #[test]
    fn span_tape_push_and_order() {
        let mut tape = SpanTape::new();
        tape.push_back(span(0, 0, 0));
        tape.push_back(span(0, 0, 1));
        let mid = tape.next(tape.begin());
        tape.insert_before(mid, span(0b101, 3, 2));
        assert_eq!(3, tape.len());
        assert_eq!(vec![0, 2, 1], collect_ids(&tape));
    }

    #[test]
    fn span_tape_erase_relinks_neighbors() {
        let mut tape = SpanTape::new();
        let a = tape.push_back(span(1, 1, 0));
        let b = tape.push_back(span(0, 2, 1));
        let c = tape.push_back(span(1, 3, 2));
        let after = tape.erase(b);
        assert_eq!(c, after);
        assert_eq!(2, tape.len());
        assert_eq!(c, tape.next(a));
        assert_eq!(a, tape.prev(c));
        assert_eq!(vec![0, 2], collect_ids(&tape));
    }

    #[test]
    fn span_tape_reuses_freed_slots() {
        let mut tape = SpanTape::new();
        let a = tape.push_back(span(1, 1, 0));
        tape.push_back(span(0, 1, 1));
        tape.erase(a);
        let arena_size = tape.nodes.len();
        let c = tape.push_front(span(1, 1, 2));
        // the freed slot must be reused, not a fresh allocation
        assert_eq!(a, c);
        assert_eq!(arena_size, tape.nodes.len());
        assert_eq!(vec![2, 1], collect_ids(&tape));
    }

    #[test]
    fn span_tape_indices_stay_valid_across_unrelated_edits() {
        let mut tape = SpanTape::new();
        let a = tape.push_back(span(0b11, 5, 0));
        let b = tape.push_back(span(0, 1, 1));
        tape.push_back(span(0b1, 7, 2));
        tape.erase(b);
        tape.push_back(span(0, 2, 3));
        assert_eq!(0b11, tape.get(a).symbol);
        assert_eq!(BigInt::from(5), tape.get(a).size);
    }

    #[test]
    fn span_tape_count_ones_weights_by_size() {
        let mut tape = SpanTape::new();
        tape.push_back(span(0, 0, 0));
        tape.push_back(span(0b101, 4, 1)); // 2 ones, 4 repeats
        tape.push_back(span(0b1, 3, 2)); // 1 one, 3 repeats
        tape.push_back(span(0, 0, 3));
        assert_eq!(BigInt::from(11), tape.count_ones());
    }

    #[test]
    fn span_tape_num_macro_symbols_skips_sentinels() {
        let mut tape = SpanTape::new();
        tape.push_back(span(0, 0, 0));
        tape.push_back(span(0b1, 4, 1));
        tape.push_back(span(0b10, 2, 2));
        tape.push_back(span(0, 0, 3));
        assert_eq!(BigInt::from(6), tape.num_macro_symbols());
    }
}
