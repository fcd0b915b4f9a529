//! Heading candidate detection.

use std::sync::LazyLock;

use regex::Regex;

use docstruct_shared::{DetectionPayload, DetectionResult};

/// Maximum number of sample matches carried in a payload.
const MAX_SAMPLES: usize = 10;

/// `1.2 Title` or `IV. Title` on a line of its own.
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\d+(\.\d+)*\s+.+|[IVX]+\.\s+.+)$").expect("numbered heading regex")
});

/// Capitalized line without sentence punctuation.
static STYLED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-ZÄÖÜ][^.!?]{3,60}$").expect("styled heading regex"));

/// Numbered headings: `found` with 0.85 on the first match.
pub fn detect_numbered_headings(text: &str) -> DetectionResult {
    let matches: Vec<String> = NUMBERED_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .take(MAX_SAMPLES)
        .collect();

    if matches.is_empty() {
        return DetectionResult::not_found();
    }

    DetectionResult::found(0.85, DetectionPayload::NumberedHeadings { matches })
}

/// Short styled lines: `found` with 0.65 once more than three qualify.
pub fn detect_styling_headings(text: &str) -> DetectionResult {
    let matches: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| is_styled_heading(line))
        .map(str::to_string)
        .collect();

    if matches.len() <= 3 {
        return DetectionResult::not_found();
    }

    DetectionResult::found(
        0.65,
        DetectionPayload::StylingHeadings {
            matches: matches.into_iter().take(MAX_SAMPLES).collect(),
        },
    )
}

/// At most six words, and either all caps or capitalized without `.!?`.
pub fn is_styled_heading(line: &str) -> bool {
    if line.is_empty() || line.split_whitespace().count() > 6 {
        return false;
    }
    is_all_caps(line) || STYLED_RE.is_match(line)
}

/// Has letters and none of them are lower-case.
fn is_all_caps(line: &str) -> bool {
    line.chars().any(char::is_alphabetic) && line == line.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_headings_found() {
        let text = "Intro text\n1.2 Market Analysis\nmore text\nIV. Risks\n";
        let result = detect_numbered_headings(text);
        assert!(result.found);
        assert_eq!(result.confidence, 0.85);
        match result.content {
            Some(DetectionPayload::NumberedHeadings { matches }) => {
                assert_eq!(matches, vec!["1.2 Market Analysis", "IV. Risks"]);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn numbered_headings_absent() {
        let result = detect_numbered_headings("no numbers at line start\nstill none");
        assert!(!result.found);
        assert_eq!(result.confidence, 0.1);
    }

    #[test]
    fn styling_needs_more_than_three() {
        let three = "OVERVIEW\nMarket Outlook\nTeam Members\nthis is body text.";
        assert!(!detect_styling_headings(three).found);

        let four = "OVERVIEW\nMarket Outlook\nTeam Members\nFinancial Plan\nbody text.";
        let result = detect_styling_headings(four);
        assert!(result.found);
        assert_eq!(result.confidence, 0.65);
    }

    #[test]
    fn styled_heading_rules() {
        assert!(is_styled_heading("EXECUTIVE SUMMARY"));
        assert!(is_styled_heading("Market Outlook"));
        assert!(!is_styled_heading("This sentence ends with a period."));
        assert!(!is_styled_heading("One two three four five six seven"));
        assert!(!is_styled_heading("2024"));
        assert!(!is_styled_heading("Abc"));
    }
}
