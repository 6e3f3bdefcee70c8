//! Trigram similarity for pattern keys
//!
//! Used to find merge candidates among patterns of the same type. Keys are
//! short, so a set-based trigram Jaccard is cheap and good enough.

use std::collections::HashSet;

/// Extract padded character trigrams from a string
fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let normalized: Vec<char> = std::iter::once(' ')
        .chain(text.to_lowercase().chars())
        .chain(std::iter::once(' '))
        .collect();
    let mut set = HashSet::new();
    for window in normalized.windows(3) {
        set.insert([window[0], window[1], window[2]]);
    }
    set
}

/// Trigram Jaccard similarity in [0, 1]
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let ta = trigrams(a);
    let tb = trigrams(b);
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        assert!((trigram_similarity("bash>edit", "bash>edit") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_disjoint_strings() {
        assert!(trigram_similarity("aaaa", "zzzz") < 0.01);
    }

    #[test]
    fn test_near_duplicates_score_high() {
        let sim = trigram_similarity("run tests before commit", "run tests before commits");
        assert!(sim >= 0.8, "near-duplicate keys should merge: {sim}");
    }

    #[test]
    fn test_case_insensitive() {
        let sim = trigram_similarity("Bash>Edit", "bash>edit");
        assert!((sim - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(trigram_similarity("", "abc"), 0.0);
        assert_eq!(trigram_similarity("", ""), 1.0);
    }
}
