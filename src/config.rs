//! This crate holds the Config struct which is used to configure a simulation run.

use std::time::{Duration, SystemTime};

// --- Below are program defining definitions, where changes may have a serious impact. ---

/// Number type for one macro symbol: a packed block of up to [MAX_MACRO_NBIT] tape cells,
/// where bit i is the cell at offset i within the block (bit 0 is the leftmost cell).
pub type MacroSymbol = u64;
/// Number type for the process-unique span identity. Assigned monotonically, never reused.
pub type SpanId = u64;
/// Number type for the machine state. 0-5 represent states A-F, higher values are
/// the terminal markers (see [crate::transition]).
pub type StateType = u8;
/// Number type for the micro steps of a single block traversal. \
/// The in-block cycle detection bounds this well below i64::MAX for any legal block width.
pub type BlockStepType = i64;

/// Number of states the program can handle (A-F). This is used for array definitions.
pub const MAX_STATES: usize = 6;
pub const NUM_SYMBOLS: usize = 2;
/// Width limit for a macro symbol. 60 bits keep the memoization key within 64 bits
/// (3 bits state, 1 bit direction).
pub const MAX_MACRO_NBIT: u32 = 60;

const MACRO_NBIT_DEFAULT: u32 = 60;
const MAX_SPANS_DEFAULT: usize = 10_000;
const FREE_MEM_FRACTION_MIN_DEFAULT: f64 = 0.05;
const REPORT_INTERVAL_DEFAULT: Duration = Duration::from_secs(1);

/// This sets the configuration for a simulation run. \
/// Use [Self::new_default] or the [Self::builder] to create a Config.
/// Since the config is designed immutable, one can use [Self::builder] to make changes.
/// # Example
/// ```
/// use bb_prover::config::Config;
///
/// let config = Config::new_default(6).unwrap();
/// assert_eq!(6, config.macro_nbit());
///
/// let config = Config::builder(6).max_spans(500).build().unwrap();
/// assert_eq!(500, config.max_spans());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of tape cells packed into one macro symbol, range [1, 60].
    macro_nbit: u32,
    /// If the tape holds this many spans (sentinels included), the run exits incomplete.
    max_spans: usize,
    /// If the free RAM fraction falls below this, the run exits incomplete.
    free_mem_fraction_min: f64,
    /// How often the progress reporter and the memory guard run.
    report_interval: Duration,
    /// When set, progress is printed to stdout while the run is ongoing.
    progress_output: bool,
    /// Creation time of this Config. Used for the run banner.
    creation_time: SystemTime,
}

impl Config {
    /// Builder to initialize required values.
    pub fn builder(macro_nbit: u32) -> ConfigBuilder {
        ConfigBuilder::new(macro_nbit)
    }

    /// Default values for the given block width. Better use builder.
    pub fn new_default(macro_nbit: u32) -> Result<Config, &'static str> {
        Self::builder(macro_nbit).build()
    }

    pub fn macro_nbit(&self) -> u32 {
        self.macro_nbit
    }

    pub fn max_spans(&self) -> usize {
        self.max_spans
    }

    pub fn free_mem_fraction_min(&self) -> f64 {
        self.free_mem_fraction_min
    }

    pub fn report_interval(&self) -> Duration {
        self.report_interval
    }

    pub fn progress_output(&self) -> bool {
        self.progress_output
    }

    pub fn creation_time(&self) -> SystemTime {
        self.creation_time
    }
}

/// Builder for [Config], allows to set values selectively. \
/// build() validates the ranges and is the only way to obtain a Config.
#[derive(Debug)]
pub struct ConfigBuilder {
    macro_nbit: u32,
    max_spans: usize,
    free_mem_fraction_min: f64,
    report_interval: Duration,
    progress_output: bool,
}

impl ConfigBuilder {
    fn new(macro_nbit: u32) -> Self {
        Self {
            macro_nbit,
            max_spans: MAX_SPANS_DEFAULT,
            free_mem_fraction_min: FREE_MEM_FRACTION_MIN_DEFAULT,
            report_interval: REPORT_INTERVAL_DEFAULT,
            progress_output: false,
        }
    }

    pub fn macro_nbit(mut self, macro_nbit: u32) -> Self {
        self.macro_nbit = macro_nbit;
        self
    }

    pub fn max_spans(mut self, max_spans: usize) -> Self {
        self.max_spans = max_spans;
        self
    }

    pub fn free_mem_fraction_min(mut self, fraction: f64) -> Self {
        self.free_mem_fraction_min = fraction;
        self
    }

    pub fn report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn progress_output(mut self, progress_output: bool) -> Self {
        self.progress_output = progress_output;
        self
    }

    pub fn build(self) -> Result<Config, &'static str> {
        if self.macro_nbit == 0 || self.macro_nbit > MAX_MACRO_NBIT {
            return Err("macro_nbit must be in the range [1, 60]");
        }
        // The two sentinels alone occupy two spans, anything below that can never run.
        if self.max_spans < 3 {
            return Err("max_spans must be at least 3");
        }
        if !(0.0..1.0).contains(&self.free_mem_fraction_min) {
            return Err("free_mem_fraction_min must be in the range [0, 1)");
        }
        Ok(Config {
            macro_nbit: self.macro_nbit,
            max_spans: self.max_spans,
            free_mem_fraction_min: self.free_mem_fraction_min,
            report_interval: self.report_interval,
            progress_output: self.progress_output,
            creation_time: SystemTime::now(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        // MACRO_NBIT_DEFAULT is always in range, build cannot fail here.
        match Self::new_default(MACRO_NBIT_DEFAULT) {
            Ok(config) => config,
            Err(_) => unreachable!(),
        }
    }
}

pub fn user_locale() -> num_format::Locale {
    // TODO get user locale
    // let locale = SystemLocale::default().unwrap(); // does not work on windows

    num_format::Locale::en
}
