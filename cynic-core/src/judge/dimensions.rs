//! The 25-dimension quality pass
//!
//! Dimensions are finer-grained lenses grouped under the four axioms. The
//! full pass runs for REFLECT and DELIBERATE judgments and always for
//! self-judgment; REFLEX judgments score axioms only.

use std::collections::BTreeMap;

use crate::judge::metrics::ContentMetrics;
use crate::types::Axiom;

/// All 25 dimensions with their owning axiom, in canonical order
pub const DIMENSIONS: [(&str, Axiom); 25] = [
    // PHI: ratio and harmony
    ("proportion", Axiom::Phi),
    ("balance", Axiom::Phi),
    ("rhythm", Axiom::Phi),
    ("symmetry", Axiom::Phi),
    ("cohesion", Axiom::Phi),
    ("modularity", Axiom::Phi),
    ("elegance", Axiom::Phi),
    // VERIFY: falsifiability
    ("testability", Axiom::Verify),
    ("falsifiability", Axiom::Verify),
    ("error_handling", Axiom::Verify),
    ("assertion_density", Axiom::Verify),
    ("observability", Axiom::Verify),
    ("reproducibility", Axiom::Verify),
    // CULTURE: pattern and consistency
    ("naming_consistency", Axiom::Culture),
    ("style_consistency", Axiom::Culture),
    ("idiom_adherence", Axiom::Culture),
    ("documentation", Axiom::Culture),
    ("convention_fit", Axiom::Culture),
    ("continuity", Axiom::Culture),
    // BURN: simplicity
    ("brevity", Axiom::Burn),
    ("depth_restraint", Axiom::Burn),
    ("duplication_avoidance", Axiom::Burn),
    ("dead_weight", Axiom::Burn),
    ("focus", Axiom::Burn),
    ("yagni", Axiom::Burn),
];

/// Score every dimension from the shared metrics, each in [0, 100].
///
/// The per-dimension formulas are deliberately small: a primitive metric
/// viewed through one lens, anchored to its axiom's base score so the
/// dimension pass refines rather than contradicts the axiom pass.
pub fn score_dimensions(
    m: &ContentMetrics,
    axiom_scores: &BTreeMap<Axiom, f64>,
) -> BTreeMap<String, f64> {
    let mut scores = BTreeMap::new();
    for (name, axiom) in DIMENSIONS {
        let base = axiom_scores.get(&axiom).copied().unwrap_or(50.0);
        let adjustment = dimension_adjustment(name, m);
        scores.insert(name.to_string(), (base + adjustment).clamp(0.0, 100.0));
    }
    scores
}

/// Signed adjustment in [−25, +25] a dimension applies over its axiom base
fn dimension_adjustment(name: &str, m: &ContentMetrics) -> f64 {
    let lines = m.line_count.max(1) as f64;
    match name {
        // PHI lenses
        "proportion" => {
            if m.avg_line_len > 0.0 {
                let cv = m.line_len_stddev / m.avg_line_len;
                12.0 - (cv.min(2.0) * 12.0)
            } else {
                0.0
            }
        }
        "balance" => 10.0 - (m.blank_lines as f64 / lines - 0.15).abs() * 40.0,
        "rhythm" => {
            if m.max_line_len == 0 {
                0.0
            } else {
                12.0 - ((m.max_line_len as f64 / m.avg_line_len.max(1.0)).min(6.0) - 1.0) * 3.0
            }
        }
        "symmetry" => {
            // Unclosed nesting at EOF reads as asymmetry
            if m.max_nesting > 6 { -10.0 } else { 5.0 }
        }
        "cohesion" => 10.0 - (m.duplicate_lines as f64 / lines) * 30.0,
        "modularity" => {
            if m.line_count > 80 { -12.0 } else { 8.0 }
        }
        "elegance" => (m.naming_consistency() - 0.5) * 20.0,
        // VERIFY lenses
        "testability" => m.test_signal_density() * 25.0 - 5.0,
        "falsifiability" => {
            if m.test_signals > 0 { 15.0 } else { -10.0 }
        }
        "error_handling" => (m.error_handling_signals as f64 * 4.0).min(20.0) - 5.0,
        "assertion_density" => (m.test_signals as f64 / lines * 100.0).min(20.0) - 5.0,
        "observability" => {
            if m.comment_ratio() > 0.05 { 8.0 } else { -4.0 }
        }
        "reproducibility" => {
            if m.danger_signals > 0 { -20.0 } else { 8.0 }
        }
        // CULTURE lenses
        "naming_consistency" => (m.naming_consistency() - 0.5) * 40.0,
        "style_consistency" => {
            if m.mixed_indentation { -18.0 } else { 10.0 }
        }
        "idiom_adherence" => (m.error_handling_signals as f64 * 3.0).min(12.0),
        "documentation" => (m.comment_ratio().min(0.4) * 50.0) - 5.0,
        "convention_fit" => {
            let trailing = m.trailing_whitespace_lines as f64 / lines;
            10.0 - trailing * 40.0
        }
        "continuity" => 5.0,
        // BURN lenses
        "brevity" => {
            if m.char_count > 400 {
                -((m.char_count - 400) as f64 / 80.0).min(20.0)
            } else {
                10.0
            }
        }
        "depth_restraint" => {
            if m.max_nesting > 3 {
                -(((m.max_nesting - 3) as f64) * 6.0).min(22.0)
            } else {
                10.0
            }
        }
        "duplication_avoidance" => -(m.duplicate_lines as f64 / lines * 50.0).min(20.0) + 8.0,
        "dead_weight" => {
            let blank_ratio = m.blank_lines as f64 / lines;
            if blank_ratio > 0.4 { -12.0 } else { 6.0 }
        }
        "focus" => {
            if m.line_count > 150 { -15.0 } else { 8.0 }
        }
        "yagni" => {
            if m.char_count > 2000 { -15.0 } else { 6.0 }
        }
        _ => 0.0,
    }
    .clamp(-25.0, 25.0)
}

/// The weakest dimensions, worst first, below the given score cutoff
pub fn weakest_dimensions(scores: &BTreeMap<String, f64>, cutoff: f64, limit: usize) -> Vec<String> {
    let mut weak: Vec<(&String, f64)> = scores
        .iter()
        .filter(|&(_, &score)| score < cutoff)
        .map(|(name, &score)| (name, score))
        .collect();
    weak.sort_by(|a, b| a.1.total_cmp(&b.1));
    weak.into_iter()
        .take(limit)
        .map(|(name, _)| name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::metrics::analyze;

    fn axiom_scores() -> BTreeMap<Axiom, f64> {
        Axiom::ALL.iter().map(|&a| (a, 60.0)).collect()
    }

    #[test]
    fn test_exactly_25_dimensions() {
        assert_eq!(DIMENSIONS.len(), 25);
        let phi = DIMENSIONS.iter().filter(|(_, a)| *a == Axiom::Phi).count();
        let verify = DIMENSIONS.iter().filter(|(_, a)| *a == Axiom::Verify).count();
        let culture = DIMENSIONS.iter().filter(|(_, a)| *a == Axiom::Culture).count();
        let burn = DIMENSIONS.iter().filter(|(_, a)| *a == Axiom::Burn).count();
        assert_eq!((phi, verify, culture, burn), (7, 6, 6, 6));
    }

    #[test]
    fn test_all_dimensions_scored_and_bounded() {
        let m = analyze("fn main() {\n    println!(\"hello\");\n}\n");
        let scores = score_dimensions(&m, &axiom_scores());
        assert_eq!(scores.len(), 25);
        for (name, score) in &scores {
            assert!((0.0..=100.0).contains(score), "{name} out of range: {score}");
        }
    }

    #[test]
    fn test_weakest_dimensions_ordering() {
        let mut scores = BTreeMap::new();
        scores.insert("a".to_string(), 20.0);
        scores.insert("b".to_string(), 10.0);
        scores.insert("c".to_string(), 80.0);
        let weak = weakest_dimensions(&scores, 50.0, 5);
        assert_eq!(weak, vec!["b".to_string(), "a".to_string()]);
    }
}
