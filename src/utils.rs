//! Small helpers: free-RAM probe, duration rounding and concise display of numbers
//! that can carry thousands of decimal digits.

use std::fmt::Display;

use num_bigint::BigInt;
use num_format::ToFormattedString;
use num_traits::{Signed, ToPrimitive};
use sysinfo::System;

use crate::config::user_locale;

/// Fraction of physical memory currently available, in [0, 1]. \
/// The driver loop exits incomplete when this falls below the configured floor;
/// the micro-machine cache and the proof history can otherwise eat the machine.
pub fn free_ram_fraction() -> f64 {
    let mut system = System::new();
    system.refresh_memory();
    let total = system.total_memory();
    if total == 0 {
        // no reliable reading on this platform, never trigger the guard
        return 1.0;
    }
    system.available_memory() as f64 / total as f64
}

pub fn duration_as_ms_rounded(duration: std::time::Duration) -> f64 {
    (duration.as_nanos() as f64 / 1000.0).round() / 1000.0
}

/// Splits the decimal representation into (first 9 digits, last 9 digits, exponent),
/// where the exponent is number-of-digits - 1 as in scientific notation. \
/// This allows comparing results with hundreds of digits without storing them all.
pub fn big_digits_summary(value: &BigInt) -> (u64, u64, usize) {
    let digits = value.abs().to_string();
    let hi_len = digits.len().min(9);
    let hi: u64 = digits[..hi_len].parse().unwrap_or(0);
    let lo_start = digits.len().saturating_sub(9);
    let lo: u64 = digits[lo_start..].parse().unwrap_or(0);
    (hi, lo, digits.len() - 1)
}

/// Utility wrapper to print large values in concise scientific notation, e.g.
/// "2.50010..664e881". Values that fit an i64 are printed in full with thousands
/// separators.
pub struct ConciseBigInt<'a>(pub &'a BigInt);

impl Display for ConciseBigInt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(small) = self.0.to_i64() {
            let locale = user_locale();
            return write!(f, "{}", small.to_formatted_string(&locale));
        }
        let digits = self.0.abs().to_string();
        let sign = if self.0.is_negative() { "-" } else { "" };
        write!(
            f,
            "{}{}.{}..{}e{}",
            sign,
            &digits[..1],
            &digits[1..6],
            &digits[digits.len() - 3..],
            digits.len() - 1
        )
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn big_digits_summary_short_and_long() {
        assert_eq!((123, 123, 2), big_digits_summary(&BigInt::from(123)));
        let value: BigInt = BigInt::from(250_010_283u64) * BigInt::from(10u64).pow(12)
            + BigInt::from(232_693_664u64);
        // 250010283_000232693664 has 21 digits
        assert_eq!(
            (250_010_283, 232_693_664, 20),
            big_digits_summary(&value)
        );
    }

    #[test]
    fn concise_display_small_value_uses_separators() {
        let value = BigInt::from(47_176_870u64);
        assert_eq!("47,176,870", ConciseBigInt(&value).to_string());
    }

    #[test]
    fn concise_display_large_value_is_scientific() {
        let value: BigInt = BigInt::from(25_001u64) * BigInt::from(10u64).pow(96);
        let text = ConciseBigInt(&value).to_string();
        assert!(text.starts_with("2.5001"));
        assert!(text.ends_with("e100"));
    }

    #[test]
    fn free_ram_fraction_is_sane() {
        let fraction = free_ram_fraction();
        assert!((0.0..=1.0).contains(&fraction));
    }

    #[test]
    fn duration_rounding() {
        let one = std::time::Duration::from_millis(1);
        assert!((duration_as_ms_rounded(one) - 1.0).abs() < f64::EPSILON);
    }
}
