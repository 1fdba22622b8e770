//! Command line runner. Accepts a rule table in the whitespace-separated triple
//! notation or the name of a built-in table and runs it to a terminal state, e.g.
//! `bb_prover -k 6 -b bb5` or `bb_prover -k 3 "B1R H1R  C0R B1R  C1L A1L"`.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use bb_prover::{
    catalog,
    config::{Config, MAX_MACRO_NBIT},
    rule_table::RuleTable,
    simulator,
    toml::ConfigToml,
    utils::duration_as_ms_rounded,
};

fn help_string() -> String {
    let mut s = String::new();
    s.push_str("This program accepts the following arguments:\n");
    s.push_str("-h, --help:                This help text\n");
    s.push_str("-k, --macro_nbit <int>:    Number of bits per macro symbol, range [1, 60]\n");
    s.push_str("-b, --builtin <name>:      Run the built-in rule table with this name\n");
    s.push_str("-l, --list_builtins:       List the built-in rule tables\n");
    s.push_str("-s, --max_spans <int>:     Span budget before the run exits incomplete\n");
    s.push_str("-v, --verbose:             Print all digits of the final results\n");
    s.push_str("Remaining arguments form a rule table, e.g. 'B1R B1L  A1L H1R'\n");
    s
}

struct Args {
    macro_nbit: Option<u32>,
    max_spans: Option<usize>,
    builtin_name: Option<String>,
    list_builtins: bool,
    verbose: bool,
    rule_table_text: String,
}

fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut parsed = Args {
        macro_nbit: None,
        max_spans: None,
        builtin_name: None,
        list_builtins: false,
        verbose: false,
        rule_table_text: String::new(),
    };
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_string());
                return Ok(None);
            }
            "-k" | "--macro_nbit" => {
                let value = iter.next().ok_or("expected a value after -k")?;
                let nbit: u32 = value
                    .parse()
                    .map_err(|_| format!("invalid macro_nbit: {value}"))?;
                if nbit == 0 || nbit > MAX_MACRO_NBIT {
                    return Err(format!(
                        "invalid macro_nbit ({nbit}), must be in the range [1, 60]"
                    ));
                }
                parsed.macro_nbit = Some(nbit);
            }
            "-s" | "--max_spans" => {
                let value = iter.next().ok_or("expected a value after -s")?;
                let max_spans: usize = value
                    .parse()
                    .map_err(|_| format!("invalid max_spans: {value}"))?;
                parsed.max_spans = Some(max_spans);
            }
            "-b" | "--builtin" => {
                let value = iter.next().ok_or("expected a name after -b")?;
                parsed.builtin_name = Some(value.clone());
            }
            "-l" | "--list_builtins" => parsed.list_builtins = true,
            "-v" | "--verbose" => parsed.verbose = true,
            other => {
                // everything else is part of the rule table text
                parsed.rule_table_text.push_str(other);
                parsed.rule_table_text.push(' ');
            }
        }
    }
    Ok(Some(parsed))
}

fn main() {
    let cli_args: Vec<String> = std::env::args().collect();
    let args = match parse_args(&cli_args) {
        Ok(Some(args)) => args,
        Ok(None) => return,
        Err(e) => {
            eprintln!("Invalid command line: {e}\n");
            eprintln!("{}", help_string());
            std::process::exit(1);
        }
    };

    if args.list_builtins {
        println!("Built-in rule tables:");
        for (name, text) in catalog::BUILTIN_RULE_TABLES {
            println!("{name:<16}{text}");
        }
        return;
    }

    let rule_table = if let Some(name) = &args.builtin_name {
        if !args.rule_table_text.is_empty() {
            eprintln!("Cannot specify both --builtin and a custom rule table");
            std::process::exit(1);
        }
        match catalog::builtin(name) {
            Some(table) => table,
            None => {
                eprintln!("Invalid builtin rule table: {name}");
                eprintln!("Use the --list_builtins flag to see the available tables.");
                std::process::exit(1);
            }
        }
    } else if !args.rule_table_text.is_empty() {
        match RuleTable::try_from_triple_text(&args.rule_table_text) {
            Ok(table) => table,
            Err(e) => {
                eprintln!("Invalid rule table: {e}");
                std::process::exit(1);
            }
        }
    } else {
        // default to BB5
        match catalog::builtin("bb5") {
            Some(table) => table,
            None => unreachable!(),
        }
    };

    let file_defaults = ConfigToml::read_toml();
    let config = Config::builder(args.macro_nbit.unwrap_or(file_defaults.macro_nbit()))
        .max_spans(args.max_spans.unwrap_or(file_defaults.max_spans()))
        .free_mem_fraction_min(file_defaults.free_mem_fraction_min())
        .report_interval(Duration::from_secs(file_defaults.report_interval_secs()))
        .progress_output(true)
        .build();
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let start_time: DateTime<Local> = config.creation_time().into();
    println!("-----------------------------------------");
    println!("{}", rule_table);
    println!(
        "Running with macro_nbit={}, started {}",
        config.macro_nbit(),
        start_time.format("%Y-%m-%d %H:%M:%S")
    );
    println!("-----------------------------------------");

    let run_start = Instant::now();
    let result = simulator::run_machine(&rule_table, &config);
    println!("{result}");
    println!(
        "Run time: {} ms",
        duration_as_ms_rounded(run_start.elapsed())
    );
    if args.verbose {
        println!("Num ones:");
        println!("{}", result.num_ones);
        println!("Num steps:");
        println!("{}", result.num_steps);
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn to_args(words: &[&str]) -> Vec<String> {
        std::iter::once("bb_prover")
            .chain(words.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn args_parse_builtin_and_width() {
        let args = parse_args(&to_args(&["-k", "6", "-b", "bb5"]))
            .unwrap()
            .unwrap();
        assert_eq!(Some(6), args.macro_nbit);
        assert_eq!(Some("bb5".to_string()), args.builtin_name);
    }

    #[test]
    fn args_collect_rule_table_text() {
        let args = parse_args(&to_args(&["B1R", "B1L", "A1L", "H1R"]))
            .unwrap()
            .unwrap();
        assert_eq!("B1R B1L A1L H1R ", args.rule_table_text);
        assert!(RuleTable::try_from_triple_text(&args.rule_table_text).is_ok());
    }

    #[test]
    fn args_reject_bad_macro_nbit() {
        assert!(parse_args(&to_args(&["-k", "0"])).is_err());
        assert!(parse_args(&to_args(&["-k", "61"])).is_err());
        assert!(parse_args(&to_args(&["-k", "abc"])).is_err());
    }
}
