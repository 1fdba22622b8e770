//! The driver loop: repeatedly invokes the proof machine until the machine halts,
//! is proven non-halting, or runs into a resource limit. \
//! The span budget is checked after every proof step (it is a cheap length read),
//! the free-memory floor rides the reporter cadence because the probe is a syscall.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::{
    config::Config,
    macro_machine::MacroMachineState,
    proof_machine::{ProofMachine, SimCounters},
    reporter::{ProgressInfo, Reporter},
    rule_table::RuleTable,
    status::SimResult,
    transition::{STATE_HALT, STATE_INCOMPLETE},
    utils::free_ram_fraction,
};

/// Runs the machine to a terminal state and returns the result. \
/// NOHALT and INCOMPLETE come back through the result state, not as errors. num_ones
/// is only counted after a halt; otherwise it carries the sentinel -1.
pub fn run_machine(rule_table: &RuleTable, config: &Config) -> SimResult {
    let mut proof_machine = ProofMachine::new(*rule_table, config.macro_nbit());
    let mut mstate = MacroMachineState::new();
    let mut counters = SimCounters::default();
    let mut num_proof_steps = BigInt::zero();
    let mut reporter = Reporter::new_default(config.macro_nbit(), config.report_interval());

    while mstate.state < STATE_HALT {
        proof_machine.step(&mut mstate, &mut counters);
        num_proof_steps += 1u32;

        if mstate.state < STATE_HALT && mstate.tape.len() >= config.max_spans() {
            mstate.state = STATE_INCOMPLETE;
            break;
        }
        if reporter.is_due() {
            if config.progress_output() {
                reporter.report(&ProgressInfo {
                    num_proof_steps: &num_proof_steps,
                    counters: &counters,
                    mstate: &mstate,
                    macro_nbit: config.macro_nbit(),
                });
            } else {
                reporter.reset();
            }
            if free_ram_fraction() < config.free_mem_fraction_min() {
                eprintln!("Error: RAM exhausted");
                mstate.state = STATE_INCOMPLETE;
                break;
            }
        }
    }

    if config.progress_output() {
        reporter.report_final(&ProgressInfo {
            num_proof_steps: &num_proof_steps,
            counters: &counters,
            mstate: &mstate,
            macro_nbit: config.macro_nbit(),
        });
    }

    let num_ones = if mstate.state == STATE_HALT {
        mstate.tape.count_ones()
    } else {
        BigInt::from(-1)
    };
    SimResult {
        num_ones,
        num_steps: counters.micro_steps,
        state: mstate.state,
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{catalog, utils::big_digits_summary};
    use hashbrown::HashMap;
    use crate::config::StateType;
    use crate::transition::STATE_NOHALT;

    const ALL_TEST_WIDTHS: [u32; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 20, 60];

    fn run(table_text: &str, macro_nbit: u32) -> SimResult {
        let table = RuleTable::try_from_triple_text(table_text).unwrap();
        let config = Config::new_default(macro_nbit).unwrap();
        run_machine(&table, &config)
    }

    /// Plain cell-by-cell simulation as ground truth for the small halters.
    fn naive_run(table: &RuleTable, step_limit: u64) -> Option<(u64, u64)> {
        let mut cells: HashMap<i64, u8> = HashMap::new();
        let mut pos: i64 = 0;
        let mut state: StateType = 0;
        let mut steps = 0u64;
        while state != STATE_HALT {
            if steps >= step_limit {
                return None;
            }
            let read = cells.get(&pos).copied().unwrap_or(0);
            let rule = table.lookup(state, read);
            cells.insert(pos, rule.symbol_write);
            pos += if rule.move_right { 1 } else { -1 };
            state = rule.state_next;
            steps += 1;
        }
        let ones = cells.values().filter(|&&c| c == 1).count() as u64;
        Some((ones, steps))
    }

    #[test]
    fn simulator_bb2_halts_for_every_block_width() {
        for macro_nbit in ALL_TEST_WIDTHS {
            let result = run("B1R B1L  A1L H1R", macro_nbit);
            assert!(result.is_halt(), "bb2 failed at width {macro_nbit}");
            assert_eq!(BigInt::from(4), result.num_ones, "width {macro_nbit}");
            assert_eq!(BigInt::from(6), result.num_steps, "width {macro_nbit}");
        }
    }

    #[test]
    fn simulator_bb3_halts_for_every_block_width() {
        for macro_nbit in ALL_TEST_WIDTHS {
            let result = run("B1R H1R  C0R B1R  C1L A1L", macro_nbit);
            assert!(result.is_halt(), "bb3 failed at width {macro_nbit}");
            assert_eq!(BigInt::from(6), result.num_ones, "width {macro_nbit}");
            assert_eq!(BigInt::from(14), result.num_steps, "width {macro_nbit}");
        }
    }

    #[test]
    fn simulator_bb4_halts_for_every_block_width() {
        for macro_nbit in ALL_TEST_WIDTHS {
            let result = run("B1R B1L  A1L C0L  H1R D1L  D1R A0R", macro_nbit);
            assert!(result.is_halt(), "bb4 failed at width {macro_nbit}");
            assert_eq!(BigInt::from(13), result.num_ones, "width {macro_nbit}");
            assert_eq!(BigInt::from(107), result.num_steps, "width {macro_nbit}");
        }
    }

    #[test]
    fn simulator_bb5_with_six_bit_blocks() {
        let result = run("B1R C1L  C1R B1R  D1R E0L  A1L D1L  H1R A0L", 6);
        assert!(result.is_halt());
        assert_eq!(BigInt::from(4098), result.num_ones);
        assert_eq!(BigInt::from(47_176_870u64), result.num_steps);
    }

    #[test]
    fn simulator_proves_nohalt_through_non_shrinking_pattern() {
        let result = run("B1L A1R  C0R B1L  H1L A1R", 3);
        assert!(result.is_nohalt());
        assert_eq!(BigInt::from(-1), result.num_ones);
        assert_eq!(BigInt::from(155), result.num_steps);
    }

    #[test]
    fn simulator_bb6_candidate_reaches_881_digit_ones_count() {
        // the pattern prover must extrapolate here, a step-by-step run would take
        // around 10^1762 steps
        let table = catalog::builtin("bb6_8").unwrap();
        let config = Config::builder(4).max_spans(100_000).build().unwrap();
        let result = run_machine(&table, &config);
        assert!(result.is_halt());
        assert_eq!(
            (250_010_283, 232_693_664, 881),
            big_digits_summary(&result.num_ones)
        );
        assert_eq!(
            (892_930_596, 430_817_336, 1762),
            big_digits_summary(&result.num_steps)
        );
    }

    #[test]
    fn simulator_span_budget_yields_incomplete() {
        let table = catalog::builtin("bb5").unwrap();
        let config = Config::builder(6).max_spans(4).build().unwrap();
        let result = run_machine(&table, &config);
        assert!(result.is_incomplete());
        assert_eq!(BigInt::from(-1), result.num_ones);
    }

    #[test]
    fn simulator_agrees_with_naive_simulation() {
        for table_text in [
            "B1R B1L  A1L H1R",
            "B1R H1R  C0R B1R  C1L A1L",
            "B1R B1L  A1L C0L  H1R D1L  D1R A0R",
        ] {
            let table = RuleTable::try_from_triple_text(table_text).unwrap();
            let (ones, steps) = naive_run(&table, 1_000_000).unwrap();
            for macro_nbit in [1, 3, 5] {
                let config = Config::new_default(macro_nbit).unwrap();
                let result = run_machine(&table, &config);
                assert_eq!(BigInt::from(ones), result.num_ones);
                assert_eq!(BigInt::from(steps), result.num_steps);
            }
        }
    }

    #[test]
    fn simulator_result_is_invariant_in_block_width() {
        // the same machine must produce the identical result for any legal width
        let mut results = Vec::new();
        for macro_nbit in [3, 6, 9] {
            let result = run("B1R C1L  C1R B1R  D1R E0L  A1L D1L  H1R A0L", macro_nbit);
            results.push((result.num_ones, result.num_steps, result.state));
        }
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn simulator_nohalt_state_is_not_incomplete() {
        let result = run("B1L A1R  C0R B1L  H1L A1R", 3);
        assert_eq!(STATE_NOHALT, result.state);
        assert!(!result.is_incomplete());
    }
}
