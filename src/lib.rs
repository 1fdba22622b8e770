//! Accelerated simulation of small single-tape, two-symbol Turing machines,
//! specifically Busy Beaver candidates. \
//! A naive simulator halts after at most ~10^1000 steps only in geologic time. This
//! library recognizes that certain tape configurations evolve linearly in span sizes
//! and skips ahead by arithmetic, which turns such runs into tractable wall-clock
//! time.
//!
//! The simulation is a three-tier stack:
//! * [micro_machine]: single transitions inside a fixed-width block of tape cells
//!   (a "macro symbol"), memoized per (entry state, block content, entry direction).
//! * [macro_machine]: the tape as a run-length-encoded sequence of spans; one macro
//!   step may jump across an entire span when the block traversal replays itself.
//! * [proof_machine]: snapshots of the macro machine keyed by an abstract signature;
//!   a recurring signature with surviving span identities proves a linear pattern
//!   which is applied the maximum safe number of times in one arithmetic update.
//!
//! # Example
//! ```
//! use bb_prover::{config::Config, rule_table::RuleTable, simulator};
//! use num_bigint::BigInt;
//!
//! // BB2, the 2-state Busy Beaver record holder
//! let table = RuleTable::try_from_triple_text("B1R B1L  A1L H1R").unwrap();
//! let config = Config::new_default(4).unwrap();
//! let result = simulator::run_machine(&table, &config);
//! assert!(result.is_halt());
//! assert_eq!(BigInt::from(4), result.num_ones);
//! assert_eq!(BigInt::from(6), result.num_steps);
//! ```

pub mod catalog;
pub mod config;
pub mod macro_machine;
pub mod micro_machine;
pub mod proof_machine;
pub mod reporter;
pub mod rule_table;
pub mod simulator;
pub mod span_tape;
pub mod status;
pub mod toml;
pub mod transition;
pub mod utils;
