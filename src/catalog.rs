//! Built-in rule tables: the known Busy Beaver record holders and a set of notable
//! candidates and non-halters that exercise the pattern prover. \
//! Sources: Marxen/Buntrock 1990, Holkner 2004, Pascal Michel's Busy Beaver pages and
//! the skelet.ludost.net holdout list.

use crate::rule_table::RuleTable;

/// (name, rule table text) pairs, resolvable through [builtin].
pub const BUILTIN_RULE_TABLES: &[(&str, &str)] = &[
    ("bb1", "H1R"),
    ("bb2", "B1R B1L  A1L H1R"),
    ("bb3", "B1R H1R  C0R B1R  C1L A1L"),
    ("bb4", "B1R B1L  A1L C0L  H1R D1L  D1R A0R"),
    ("bb5", "B1R C1L  C1R B1R  D1R E0L  A1L D1L  H1R A0L"),
    // reasonably fast to compute with macro_nbit=6
    ("bb6", "B1R E1L  C1R F1R  D1L B0R  E1R C0L  A1L D0R  H1R C1R"),
    ("bb6_1", "B1L A1L  C1R B1R  F0R D1R  A1L E0R  A0L C1R  E1L H1L"),
    ("bb6_2", "B1R A1R  C1L B1L  F0R D1L  A1R E0L  H1R F1L  A0L C0L"),
    // 2.0e95 steps, very slow to compute
    ("bb6_3", "1RB 0RC  0LA 0RD  1RD 1RH  1LE 0LD  1RF 1LB  1RA 1RE"),
    // 5.3e42 steps, very slow to compute
    ("bb6_4", "1RB 0LC  1LA 1RD  0LB 0LE  1RA 0RB  1LF 1LC  1RD 1RH"),
    // > 1.4e60 ones, very fast to compute
    ("bb6_5", "1RB 0LC  1LA 1RC  1RA 0LD  1LE 1LC  1RF 1RH  1RA 1RE"),
    // > 6.4e462 ones, very slow to compute
    ("bb6_6", "1RB 0LB  0RC 1LB  1RD 0LA  1LE 1LF  1LA 0LD  1RH 1LE"),
    // > 1.2e865 ones, very slow to compute
    ("bb6_7", "1RB 0LF  0RC 0RD  1LD 1RE  0LE 0LD  0RA 1RC  1LA 1RH"),
    // > 2.5e881 ones, quite fast to compute
    ("bb6_8", "1RB 0RF  0LB 1LC  1LD 0RC  1LE 1RH  1LF 0LD  1RA 0LE"),
    // > 4.6e1439 ones, quite fast to compute
    ("bb6_9", "1RB 0LE  1LC 0RA  1LD 0RC  1LE 0LF  1LA 1LC  1LE 1RH"),
    // > 3.1e10566 ones, fairly fast to compute with macro_nbit=3
    ("bb6_a", "1RB 0LD  1RC 0RF  1LC 1LA  0LE 1RH  1LA 0RB  0RC 0RE"),
    ("mabu90_4", "B1L B1R  C1R E0L  D0R A0L  A1L D0R  A1L D0R"),
    ("mabu90_5", "B1L A1R  A0R C0L  A0R D1L  E0L B1R  B0R H1L"),
    // easy halter with macro_nbit=3
    ("mabu90_7", "B1L A1L  C1R B1R  F0R D1R  A1L E0R  A0L C1R E1L H1L"),
    // proven non-halting through a non-shrinking pattern
    ("mabu90_8", "B1L A1R  C0R B1L  H1L A1R"),
    ("bb5_hnr1", "C1L E1L  H1L D1L  D1R D0L  A1L E1R  B0L C0R"),
    ("bb5_hnr2", "C1L E0R  H1L C0R  D1R A0L  A1R D1R  A1L B0R"),
    ("bb5_hnr3", "C1L A0R  H1L E1L  D1R B0L  A1R C1R  C0L D1L"),
    ("bb5_hnr16", "B1L H1L  C0R D1L  D1R C1R  E1L E0L  A0L B0R"),
    ("bb5_hnr19", "B1L H1L  C0L B0L  C1R D0R  A1L E0R  A0R E0R"),
    ("bb5_hnr24", "C1L A1L  E1R H1L  D1R D0R  B0R E0L  A0L C1R"),
    ("bb5_hnr37", "C1L C0L  D1L H1L  B0L D0R  E0R A1L  A1R E1R"),
    ("bb5_hnr40", "B1L A0R  C1L H1L  D0L E1R  E1L A0L  C1R A0R"),
    ("bb5_hnr41", "B1L E0R  C1L H1L  D0L C0L  D1R A0R  B0R E0R"),
    ("bb5_hnr42", "B1L A0R  C0L H1L  C1R D1L  E1L A1R  B0L D0R"),
    ("bb5_nr1_1", "C1L B1L  H1L A0L  D1R C1L  A0L E0R  C1R E1R"),
    // extremely micro-machine intensive
    ("bb5_nr1_2", "C1L D1R  H1L D0R  D1R A1L  B0R E0R  A0L E1L"),
];

/// Returns the rule table text for a built-in name, case-insensitive.
pub fn builtin_text(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    BUILTIN_RULE_TABLES
        .iter()
        .find(|(n, _)| *n == lower)
        .map(|(_, text)| *text)
}

/// Returns the parsed rule table for a built-in name, case-insensitive.
pub fn builtin(name: &str) -> Option<RuleTable> {
    builtin_text(name).and_then(|text| RuleTable::try_from_triple_text(text).ok())
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        assert!(builtin("bb5").is_some());
        assert!(builtin("BB5").is_some());
        assert!(builtin("no_such_machine").is_none());
    }

    #[test]
    fn all_builtin_tables_parse_and_round_trip() {
        for (name, text) in BUILTIN_RULE_TABLES {
            let table = RuleTable::try_from_triple_text(text)
                .unwrap_or_else(|e| panic!("builtin {name} failed to parse: {e}"));
            let reparsed = RuleTable::try_from_triple_text(&table.to_string()).unwrap();
            assert_eq!(table, reparsed, "round trip failed for {name}");
        }
    }
}
