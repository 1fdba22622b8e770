//! Simple methods to track time and report progress of a running simulation. \
//! The driver loop asks [Reporter::is_due] between proof steps and hands over the
//! current machine state when the interval elapsed; nothing here suspends the run.

use std::time::{Duration, Instant};

use hashbrown::HashMap;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::{
    config::MacroSymbol,
    macro_machine::MacroMachineState,
    proof_machine::SimCounters,
    transition::state_char,
    utils::ConciseBigInt,
};

static REPORT_PROGRESS_STANDARD: ReportProgressStandard = ReportProgressStandard;

/// Data handed to the progress report.
pub struct ProgressInfo<'a> {
    pub num_proof_steps: &'a BigInt,
    pub counters: &'a SimCounters,
    pub mstate: &'a MacroMachineState,
    pub macro_nbit: u32,
}

/// Implement this to route progress somewhere other than stdout.
pub trait ReportProgress {
    fn report_progress(&self, info: &ProgressInfo, avg_speed: Option<&BigInt>, status_line: &str);
}

/// Renders the compressed tape, e.g. "A: |>101(@7)*13|0(@2)". \
/// The cursor marker sits left of the current span when moving right and right of it
/// when moving left. Blocks wider than 8 bits get stable aliases $0, $1, ... in
/// order of first appearance instead of their binary text.
pub struct TapeFormatter {
    macro_nbit: u32,
    symbol_alias: HashMap<MacroSymbol, usize>,
}

impl TapeFormatter {
    pub fn new(macro_nbit: u32) -> Self {
        Self {
            macro_nbit,
            symbol_alias: HashMap::new(),
        }
    }

    fn symbol_text(&mut self, symbol: MacroSymbol) -> String {
        if self.macro_nbit <= 8 {
            // bit 0 is the leftmost cell of the block
            (0..self.macro_nbit)
                .map(|bit| if symbol >> bit & 1 == 1 { '1' } else { '0' })
                .collect()
        } else {
            let next_alias = self.symbol_alias.len();
            let alias = *self.symbol_alias.entry(symbol).or_insert(next_alias);
            format!("${alias}")
        }
    }

    pub fn format_status(&mut self, mstate: &MacroMachineState) -> String {
        let cur_idx = mstate.cur_span_index();
        let mut line = format!("{}: ", state_char(mstate.state));
        let num_spans = mstate.tape.len();
        for (i, span) in mstate.tape.iter().enumerate() {
            let marker = if mstate.moving_right {
                if i == cur_idx {
                    ">"
                } else {
                    "|"
                }
            } else if i == cur_idx + 1 {
                "<"
            } else {
                "|"
            };
            line.push_str(marker);
            let symbol_text = self.symbol_text(span.symbol);
            line.push_str(&symbol_text);
            line.push_str(&format!("(@{})", span.id));
            if i != 0 && i + 1 != num_spans {
                line.push_str(&format!("*{}", ConciseBigInt(&span.size)));
            }
        }
        line
    }
}

/// Tracks the report interval and a smoothed micro-steps-per-second estimate.
pub struct Reporter<'a> {
    last_report_time: Instant,
    report_after: Duration,
    report_progress: &'a dyn ReportProgress,
    formatter: TapeFormatter,
    last_micro_steps: BigInt,
    avg_micro_steps_per_sec: Option<BigInt>,
}

impl Reporter<'_> {
    pub fn new_default(macro_nbit: u32, report_after: Duration) -> Reporter<'static> {
        Reporter {
            last_report_time: Instant::now(),
            report_after,
            report_progress: &REPORT_PROGRESS_STANDARD,
            formatter: TapeFormatter::new(macro_nbit),
            last_micro_steps: BigInt::zero(),
            avg_micro_steps_per_sec: None,
        }
    }

    /// True when the report interval elapsed. Calling this is cheap; the caller
    /// should pass the full state only when it returns true.
    pub fn is_due(&self) -> bool {
        self.last_report_time.elapsed() >= self.report_after
    }

    /// Restarts the interval without reporting.
    pub fn reset(&mut self) {
        self.last_report_time = Instant::now();
        self.last_micro_steps = BigInt::zero();
    }

    pub fn report(&mut self, info: &ProgressInfo) {
        let elapsed = self.last_report_time.elapsed();
        self.last_report_time = Instant::now();
        let elapsed_us = elapsed.as_micros().max(1) as u64;
        let steps_per_sec =
            (&info.counters.micro_steps - &self.last_micro_steps) * 1_000_000u64 / elapsed_us;
        // exponential smoothing, heavily weighted towards the history
        self.avg_micro_steps_per_sec = Some(match self.avg_micro_steps_per_sec.take() {
            None => steps_per_sec,
            Some(avg) => avg * 95u32 / 100u32 + steps_per_sec * 5u32 / 100u32,
        });
        self.last_micro_steps = info.counters.micro_steps.clone();
        let status_line = self.formatter.format_status(info.mstate);
        self.report_progress
            .report_progress(info, self.avg_micro_steps_per_sec.as_ref(), &status_line);
    }

    /// Final summary after the run ended, without speed tracking.
    pub fn report_final(&mut self, info: &ProgressInfo) {
        let status_line = self.formatter.format_status(info.mstate);
        self.report_progress
            .report_progress(info, self.avg_micro_steps_per_sec.as_ref(), &status_line);
    }
}

/// Prints the progress to stdout.
struct ReportProgressStandard;

impl ReportProgress for ReportProgressStandard {
    fn report_progress(&self, info: &ProgressInfo, avg_speed: Option<&BigInt>, status_line: &str) {
        println!("Proof steps: {}", ConciseBigInt(info.num_proof_steps));
        println!("Macro steps: {}", ConciseBigInt(&info.counters.iterations));
        match avg_speed {
            Some(speed) => println!(
                "Micro steps: {} (avg speed={}/s)",
                ConciseBigInt(&info.counters.micro_steps),
                ConciseBigInt(speed)
            ),
            None => println!("Micro steps: {}", ConciseBigInt(&info.counters.micro_steps)),
        }
        println!("Num spans:   {}", info.mstate.tape.len());
        let tape_cells = info.mstate.tape.num_macro_symbols() * info.macro_nbit;
        println!("Tape size:   {}", ConciseBigInt(&tape_cells));
        println!("Num ones:    {}", ConciseBigInt(&info.mstate.tape.count_ones()));
        let head_pos = &info.counters.macro_pos * info.macro_nbit;
        println!("Head pos:    {}", ConciseBigInt(&head_pos));
        println!("{status_line}");
        println!();
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{macro_machine::MacroMachine, rule_table::RuleTable};

    #[test]
    fn tape_formatter_marks_cursor_and_sizes() {
        let table = RuleTable::try_from_triple_text("B1R B1L  A1L H1R").unwrap();
        let mut machine = MacroMachine::new(table, 2);
        let mut mstate = MacroMachineState::new();
        machine.step(&mut mstate);
        let mut formatter = TapeFormatter::new(2);
        let line = formatter.format_status(&mstate);
        // state prefix, cursor marker and at least one span with identity
        assert!(line.starts_with("B: ") || line.starts_with("A: "));
        assert!(line.contains('>') || line.contains('<'));
        assert!(line.contains("(@"));
    }

    #[test]
    fn tape_formatter_aliases_wide_symbols() {
        let mut formatter = TapeFormatter::new(20);
        assert_eq!("$0", formatter.symbol_text(0xABCDE));
        assert_eq!("$1", formatter.symbol_text(0x12345));
        // repeated symbols keep their alias
        assert_eq!("$0", formatter.symbol_text(0xABCDE));
    }

    #[test]
    fn reporter_interval_gating() {
        let mut reporter = Reporter::new_default(4, Duration::from_secs(3600));
        assert!(!reporter.is_due());
        reporter.reset();
        assert!(!reporter.is_due());
    }
}
