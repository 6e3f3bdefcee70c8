//! Content metric primitives shared by the axiom and dimension scorers
//!
//! Everything here is pure and cheap: the REFLEX path budget is <10 ms, so
//! scoring is a single pass over the content plus O(lines) aggregation.

/// Aggregated metrics over one item's content text
#[derive(Debug, Clone, Default)]
pub struct ContentMetrics {
    pub char_count: usize,
    pub line_count: usize,
    pub avg_line_len: f64,
    pub max_line_len: usize,
    /// Standard deviation of line lengths
    pub line_len_stddev: f64,
    /// Deepest brace/bracket/paren nesting observed
    pub max_nesting: usize,
    /// Lines that look like comments
    pub comment_lines: usize,
    /// Blank lines
    pub blank_lines: usize,
    /// Count of verification signals (test/assert/expect/check markers)
    pub test_signals: usize,
    /// Count of error-handling signals (Result/try/catch/match-on-err)
    pub error_handling_signals: usize,
    /// Count of danger signals (rm -rf, force push, sudo, eval)
    pub danger_signals: usize,
    /// snake_case identifiers observed
    pub snake_case_idents: usize,
    /// camelCase identifiers observed
    pub camel_case_idents: usize,
    /// Repeated identical non-blank lines
    pub duplicate_lines: usize,
    /// Lines with trailing whitespace
    pub trailing_whitespace_lines: usize,
    /// Both tab- and space-indented lines present
    pub mixed_indentation: bool,
}

const TEST_SIGNALS: [&str; 8] = [
    "#[test]", "assert", "expect(", "pytest", "cargo test", " test_", "it(", "describe(",
];

const ERROR_SIGNALS: [&str; 8] = [
    "Result<", "?;", "try ", "catch", ".map_err", "if err", "rescue", "Err(",
];

const DANGER_SIGNALS: [&str; 7] = [
    "rm -rf", "force push", "--force", "sudo ", "eval(", "DROP TABLE", "chmod 777",
];

/// Single-pass metric extraction
pub fn analyze(content: &str) -> ContentMetrics {
    let mut m = ContentMetrics {
        char_count: content.chars().count(),
        ..ContentMetrics::default()
    };

    let lines: Vec<&str> = content.lines().collect();
    m.line_count = lines.len();

    let mut line_lens = Vec::with_capacity(lines.len());
    let mut seen_tab_indent = false;
    let mut seen_space_indent = false;
    let mut seen_lines: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    for line in &lines {
        let len = line.chars().count();
        line_lens.push(len);
        m.max_line_len = m.max_line_len.max(len);

        let trimmed = line.trim();
        if trimmed.is_empty() {
            m.blank_lines += 1;
            continue;
        }
        if trimmed.starts_with("//")
            || trimmed.starts_with('#')
            || trimmed.starts_with("/*")
            || trimmed.starts_with('*')
        {
            m.comment_lines += 1;
        }
        if line.starts_with('\t') {
            seen_tab_indent = true;
        } else if line.starts_with("    ") {
            seen_space_indent = true;
        }
        if line.len() != line.trim_end().len() {
            m.trailing_whitespace_lines += 1;
        }
        let count = seen_lines.entry(trimmed).or_insert(0);
        *count += 1;
        if *count > 1 {
            m.duplicate_lines += 1;
        }
    }
    m.mixed_indentation = seen_tab_indent && seen_space_indent;

    if !line_lens.is_empty() {
        let sum: usize = line_lens.iter().sum();
        m.avg_line_len = sum as f64 / line_lens.len() as f64;
        let variance = line_lens
            .iter()
            .map(|&len| {
                let d = len as f64 - m.avg_line_len;
                d * d
            })
            .sum::<f64>()
            / line_lens.len() as f64;
        m.line_len_stddev = variance.sqrt();
    }

    let mut depth: usize = 0;
    for c in content.chars() {
        match c {
            '{' | '[' | '(' => {
                depth += 1;
                m.max_nesting = m.max_nesting.max(depth);
            }
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    for signal in TEST_SIGNALS {
        m.test_signals += content.matches(signal).count();
    }
    for signal in ERROR_SIGNALS {
        m.error_handling_signals += content.matches(signal).count();
    }
    for signal in DANGER_SIGNALS {
        m.danger_signals += content.matches(signal).count();
    }

    count_ident_styles(content, &mut m);
    m
}

/// Count snake_case vs camelCase identifier styles for consistency scoring
fn count_ident_styles(content: &str, m: &mut ContentMetrics) {
    for word in content.split(|c: char| !c.is_alphanumeric() && c != '_') {
        if word.len() < 3 || word.chars().next().is_none_or(|c| !c.is_alphabetic()) {
            continue;
        }
        let has_underscore = word.contains('_');
        let has_inner_upper = word.chars().skip(1).any(|c| c.is_uppercase());
        if has_underscore && !has_inner_upper {
            m.snake_case_idents += 1;
        } else if has_inner_upper && !has_underscore {
            m.camel_case_idents += 1;
        }
    }
}

impl ContentMetrics {
    /// Fraction of non-blank lines that are comments
    pub fn comment_ratio(&self) -> f64 {
        let code_lines = self.line_count.saturating_sub(self.blank_lines);
        if code_lines == 0 {
            return 0.0;
        }
        self.comment_lines as f64 / code_lines as f64
    }

    /// Test signals per 100 lines, saturating at 1.0
    pub fn test_signal_density(&self) -> f64 {
        if self.line_count == 0 {
            return 0.0;
        }
        (self.test_signals as f64 * 100.0 / self.line_count as f64 / 10.0).min(1.0)
    }

    /// How uniformly one identifier style dominates, in [0, 1]
    pub fn naming_consistency(&self) -> f64 {
        let total = self.snake_case_idents + self.camel_case_idents;
        if total == 0 {
            return 1.0;
        }
        let dominant = self.snake_case_idents.max(self.camel_case_idents);
        dominant as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_counts_lines_and_nesting() {
        let m = analyze("fn main() {\n    if x {\n        y();\n    }\n}\n");
        assert_eq!(m.line_count, 5);
        assert!(m.max_nesting >= 3);
        assert_eq!(m.blank_lines, 0);
    }

    #[test]
    fn test_signal_detection() {
        let m = analyze("#[test]\nfn test_x() { assert!(x); }\nlet r: Result<(), E> = f()?;");
        assert!(m.test_signals >= 2);
        assert!(m.error_handling_signals >= 1);
        assert_eq!(m.danger_signals, 0);
    }

    #[test]
    fn test_danger_signals() {
        let m = analyze("sudo rm -rf / --force");
        assert!(m.danger_signals >= 2);
    }

    #[test]
    fn test_naming_consistency() {
        let consistent = analyze("let foo_bar = baz_qux + one_two;");
        assert!((consistent.naming_consistency() - 1.0).abs() < f64::EPSILON);
        let mixed = analyze("let fooBar = baz_qux; let barBaz = qux_one;");
        assert!(mixed.naming_consistency() < 1.0);
    }

    #[test]
    fn test_duplicate_lines() {
        let m = analyze("x += 1;\nx += 1;\nx += 1;\n");
        assert_eq!(m.duplicate_lines, 2);
    }

    #[test]
    fn test_empty_content() {
        let m = analyze("");
        assert_eq!(m.line_count, 0);
        assert_eq!(m.comment_ratio(), 0.0);
        assert_eq!(m.test_signal_density(), 0.0);
    }
}
