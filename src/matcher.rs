//! Fuzzy resolution of free-text airline names to canonical carrier names.
//!
//! A curated synonym table handles the shorthand people actually type
//! ("delta", "southwest"); everything else goes through a
//! longest-matching-block sequence ratio against the carrier names present
//! in the dataset.

use std::collections::HashMap;

use tracing::debug;

/// Minimum sequence ratio for a fuzzy match to be accepted.
const MATCH_CUTOFF: f64 = 0.4;

/// Common shorthand for major carriers, keyed by the lowercased user input.
/// Checked before any fuzzy scoring; an exact hit here wins outright.
static ALTERNATE_LOOKUP: &[(&str, &str)] = &[
    ("southwest", "Southwest Airlines"),
    ("delta", "Delta Air Lines Inc."),
    ("american", "American Airlines Inc."),
    ("united", "United Air Lines Inc."),
    ("alaska", "Alaska Airlines Inc."),
    ("spirit", "Spirit Airlines"),
];

/// Resolves a user-typed airline name against the canonical carrier names.
///
/// Returns the canonical name, or `None` when no synonym applies and no
/// candidate reaches the acceptance cutoff. Ties on the best score go to the
/// earliest candidate; callers pass candidates in dataset order, which makes
/// the tie-break deterministic but not otherwise meaningful.
pub fn resolve_airline<'a, I>(user_input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let folded = user_input.to_lowercase();
    for (alias, canonical) in ALTERNATE_LOOKUP {
        if folded == *alias {
            debug!(input = user_input, canonical, "Airline resolved via synonym table");
            return Some((*canonical).to_string());
        }
    }

    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let score = sequence_ratio(user_input, candidate);
        if score >= MATCH_CUTOFF && best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((name, score)) => {
            debug!(input = user_input, matched = name, score, "Airline resolved via fuzzy match");
            Some(name.to_string())
        }
        None => {
            debug!(input = user_input, "No airline match above cutoff");
            None
        }
    }
}

/// Ratcliff/Obershelp similarity of two strings on a 0–1 scale, where 1.0 is
/// identical: twice the total matched characters over the combined length.
/// Comparison is case-sensitive, matching the lookup behavior users see.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let combined = a.len() + b.len();
    if combined == 0 {
        return 1.0;
    }

    2.0 * matched_chars(&a, &b) as f64 / combined as f64
}

/// Total characters covered by matching blocks: the longest common block,
/// plus (recursively) the best blocks to its left and right.
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let (ai, bj, size) = longest_match(a, b);
    if size == 0 {
        return 0;
    }

    size + matched_chars(&a[..ai], &b[..bj])
        + matched_chars(&a[ai + size..], &b[bj + size..])
}

/// Finds the longest block of characters common to `a` and `b`, preferring
/// the earliest position in `a`, then in `b`. Returns (start_a, start_b, len).
fn longest_match(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut b_positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &ch) in b.iter().enumerate() {
        b_positions.entry(ch).or_default().push(j);
    }

    let (mut best_i, mut best_j, mut best_size) = (0, 0, 0);
    // run_lengths[j] = length of the common run ending at a[i-1], b[j]
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for (i, ch) in a.iter().enumerate() {
        let mut next_runs = HashMap::new();
        if let Some(positions) = b_positions.get(ch) {
            for &j in positions {
                let len = if j == 0 {
                    1
                } else {
                    run_lengths.get(&(j - 1)).copied().unwrap_or(0) + 1
                };
                next_runs.insert(j, len);
                if len > best_size {
                    best_i = i + 1 - len;
                    best_j = j + 1 - len;
                    best_size = len;
                }
            }
        }
        run_lengths = next_runs;
    }

    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARRIERS: &[&str] = &[
        "Delta Air Lines Inc.",
        "United Air Lines Inc.",
        "Southwest Airlines",
        "Alaska Airlines Inc.",
        "SkyWest Airlines Inc.",
    ];

    fn resolve(input: &str) -> Option<String> {
        resolve_airline(input, CARRIERS.iter().copied())
    }

    #[test]
    fn test_sequence_ratio_identical() {
        assert_eq!(sequence_ratio("delta", "delta"), 1.0);
    }

    #[test]
    fn test_sequence_ratio_disjoint() {
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_sequence_ratio_empty_inputs() {
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_sequence_ratio_partial_overlap() {
        // matched blocks: "ab" + "cd" = 4 of 9 chars -> 8/9
        let r = sequence_ratio("abxcd", "abcd");
        assert!((r - 8.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_sequence_ratio_is_order_sensitive_not_bag_of_chars() {
        // "ab" vs "ba": longest block is one char
        let r = sequence_ratio("ab", "ba");
        assert!((r - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_synonym_table_hit_any_case() {
        assert_eq!(resolve("delta"), Some("Delta Air Lines Inc.".to_string()));
        assert_eq!(resolve("DELTA"), Some("Delta Air Lines Inc.".to_string()));
        assert_eq!(resolve("Southwest"), Some("Southwest Airlines".to_string()));
    }

    #[test]
    fn test_synonym_table_wins_over_fuzzy_scan() {
        // "united" scores against several candidates, but the table entry is
        // authoritative even against a candidate pool that lacks the name
        let resolved = resolve_airline("united", ["Delta Air Lines Inc."].into_iter());
        assert_eq!(resolved, Some("United Air Lines Inc.".to_string()));
    }

    #[test]
    fn test_fuzzy_match_close_input() {
        assert_eq!(
            resolve("Delta Air Lines"),
            Some("Delta Air Lines Inc.".to_string())
        );
        assert_eq!(
            resolve("SkyWest"),
            Some("SkyWest Airlines Inc.".to_string())
        );
    }

    #[test]
    fn test_no_match_below_cutoff() {
        assert_eq!(resolve("zzzz"), None);
        assert_eq!(resolve("qx"), None);
    }

    #[test]
    fn test_tie_break_takes_first_candidate() {
        let candidates = ["ab", "ba"];
        // both score 2/3 against "a"; the first wins
        let resolved = resolve_airline("a", candidates.into_iter());
        assert_eq!(resolved, Some("ab".to_string()));
    }

    #[test]
    fn test_empty_input_no_candidates() {
        assert_eq!(resolve_airline("delta", std::iter::empty()), Some("Delta Air Lines Inc.".to_string()));
        assert_eq!(resolve_airline("somewhere", std::iter::empty()), None);
    }
}
