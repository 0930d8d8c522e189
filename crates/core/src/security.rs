//! Pattern scan of generated code for obviously unsafe constructs.
//!
//! This is a warning aid only; it does not analyse or execute the code.

use once_cell::sync::Lazy;
use regex::Regex;

static PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"eval\s*\(", "Use of eval() can be dangerous"),
        (r"document\.write\s*\(", "document.write() can be unsafe"),
        (
            r"innerHTML\s*=",
            "Setting innerHTML directly can lead to XSS vulnerabilities",
        ),
        (
            r#"setTimeout\s*\(\s*['"`]"#,
            "Passing strings to setTimeout can be unsafe",
        ),
        (
            r#"setInterval\s*\(\s*['"`]"#,
            "Passing strings to setInterval can be unsafe",
        ),
        (
            r"new\s+Function\s*\(",
            "Creating functions from strings can be unsafe",
        ),
    ]
    .into_iter()
    .filter_map(|(pattern, message)| Regex::new(pattern).ok().map(|re| (re, message)))
    .collect()
});

/// Result of scanning a block of code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanReport {
    pub warnings: Vec<String>,
}

impl ScanReport {
    pub fn is_safe(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Scan `code`, producing one warning per matched pattern kind.
pub fn scan_code(code: &str) -> ScanReport {
    let warnings = PATTERNS
        .iter()
        .filter(|(pattern, _)| pattern.is_match(code))
        .map(|(_, message)| message.to_string())
        .collect();
    ScanReport { warnings }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_code_is_safe() {
        let report = scan_code("fn main() {\n    println!(\"hello\");\n}");
        assert!(report.is_safe());
    }

    #[test]
    fn test_detects_each_pattern_once() {
        let code = r#"
            eval("1 + 1");
            eval (x);
            document.write("<p>");
            el.innerHTML = userInput;
            setTimeout("tick()", 10);
            setInterval('tick()', 10);
            const f = new Function("return 1");
        "#;
        let report = scan_code(code);
        assert_eq!(report.warnings.len(), 6);
        assert!(report.warnings[0].contains("eval()"));
    }

    #[test]
    fn test_function_argument_timeout_is_fine() {
        let report = scan_code("setTimeout(() => tick(), 10);");
        assert!(report.is_safe());
    }
}
