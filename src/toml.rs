//! Very basic functionality to read some run defaults from a toml configuration file.
//! Command line arguments take precedence over these values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "bb_prover.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConfigToml {
    /// Block width used when no -k argument is given.
    #[serde(default = "default_macro_nbit")]
    macro_nbit: u32,

    /// Span budget; the run exits incomplete when the tape reaches this many spans.
    #[serde(default = "default_max_spans")]
    max_spans: usize,

    /// The run exits incomplete when the free RAM fraction falls below this.
    #[serde(default = "default_free_mem_fraction_min")]
    free_mem_fraction_min: f64,

    /// Progress report interval in seconds.
    #[serde(default = "default_report_interval_secs")]
    report_interval_secs: u64,
}

fn default_macro_nbit() -> u32 {
    60
}

fn default_max_spans() -> usize {
    10_000
}

fn default_free_mem_fraction_min() -> f64 {
    0.05
}

fn default_report_interval_secs() -> u64 {
    1
}

impl ConfigToml {
    /// Reads the config file from the working directory, falling back to the
    /// defaults when it does not exist or cannot be parsed.
    pub fn read_toml() -> ConfigToml {
        if Path::new(CONFIG_FILE).exists() {
            match fs::read_to_string(CONFIG_FILE) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Config file {CONFIG_FILE} could not be parsed ({e}), using default values.")
                    }
                },
                Err(e) => {
                    eprintln!("Config file {CONFIG_FILE} could not be read ({e}), using default values.")
                }
            }
        }
        ConfigToml::default()
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

    pub fn report_interval_secs(&self) -> u64 {
        self.report_interval_secs
    }
}

impl Default for ConfigToml {
    fn default() -> Self {
        Self {
            macro_nbit: default_macro_nbit(),
            max_spans: default_max_spans(),
            free_mem_fraction_min: default_free_mem_fraction_min(),
            report_interval_secs: default_report_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn config_toml_parses_partial_file() {
        let config: ConfigToml = toml::from_str("macro_nbit = 8").unwrap();
        assert_eq!(8, config.macro_nbit());
        // unset fields fall back to the serde defaults
        assert_eq!(default_max_spans(), config.max_spans());
    }

    #[test]
    fn config_toml_round_trip() {
        let config = ConfigToml::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let reparsed: ConfigToml = toml::from_str(&text).unwrap();
        assert_eq!(config.macro_nbit(), reparsed.macro_nbit());
        assert_eq!(config.max_spans(), reparsed.max_spans());
    }
}
