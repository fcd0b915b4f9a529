//! Table-of-contents detection and TOC block location.
//!
//! The detector surfaces the TOC's entry titles so the splitter can use them
//! as section anchors.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use docstruct_shared::{DetectionPayload, DetectionResult};

use crate::special::DetectorVariant;

/// TOC vocabulary for plain text.
static TOC_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(table of contents|inhaltsverzeichnis|toc)\b").expect("toc keyword regex")
});

/// Broader vocabulary for structured blobs, where headings lose their layout.
static TOC_KEYWORD_STRUCTURED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(table of contents|table-of-contents|inhaltsverzeichnis|contents|inhalt|toc|content listing|chapter listing|section listing)\b",
    )
    .expect("structured toc keyword regex")
});

/// `Intro .... 4`
static DOT_LEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+\s*\.{2,}\s*\d+").expect("dot leader regex"));

/// A whole TOC entry line; captures the title before the leaders.
static ENTRY_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S.*?)\s*\.{2,}\s*\d+\s*$").expect("toc entry regex")
});

/// A line that is nothing but a TOC heading.
static TOC_HEADING_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(table\s+of\s+contents?|contents|inhaltsverzeichnis|toc)\s*:?\s*$")
        .expect("toc heading regex")
});

/// Leading `1.`, `2.3`, `IV.` numbering.
static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)*\.?|[IVX]+\.)[\s\u{a0}]+").expect("leading number regex")
});

/// Detect a table of contents.
///
/// Keyword hits score 0.9 in both variants. A dot-leader pattern alone scores
/// 0.9 on plain text but only 0.7 on structured blobs.
pub fn detect_toc(text: &str, variant: DetectorVariant) -> DetectionResult {
    let lower = text.to_lowercase();
    let entries = toc_entries(text);

    let keyword_hit = match variant {
        DetectorVariant::Text => TOC_KEYWORD_RE.is_match(&lower),
        DetectorVariant::Structured => TOC_KEYWORD_STRUCTURED_RE.is_match(&lower),
    };

    if keyword_hit {
        return DetectionResult::found(0.9, DetectionPayload::Toc { entries });
    }

    if DOT_LEADER_RE.is_match(&lower) {
        let confidence = match variant {
            DetectorVariant::Text => 0.9,
            DetectorVariant::Structured => 0.7,
        };
        return DetectionResult::found(confidence, DetectionPayload::Toc { entries });
    }

    DetectionResult::not_found()
}

/// Entry titles of every dot-leader line, leaders and page numbers removed.
pub fn toc_entries(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| ENTRY_LINE_RE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .filter(|title| !title.is_empty())
        .collect()
}

/// True for a dot-leader entry line such as `Vision .... 2`.
pub fn is_entry_line(line: &str) -> bool {
    ENTRY_LINE_RE.is_match(line)
}

/// Entry title without its leading numbering.
pub fn strip_numbering(title: &str) -> &str {
    match LEADING_NUMBER_RE.find(title) {
        Some(m) => title[m.end()..].trim(),
        None => title.trim(),
    }
}

/// Byte range of the TOC block: the TOC heading line (if any) through the
/// last entry line of the contiguous run that follows it. Blank lines inside
/// the run are allowed.
pub fn toc_block_range(text: &str) -> Option<Range<usize>> {
    let lines = lines_with_offsets(text);

    let heading = lines
        .iter()
        .position(|(_, line)| TOC_HEADING_LINE_RE.is_match(line));

    let first_entry = match heading {
        Some(idx) => idx + 1,
        None => lines
            .iter()
            .position(|(_, line)| ENTRY_LINE_RE.is_match(line))?,
    };

    let mut end: Option<usize> = None;
    for (offset, line) in lines.iter().skip(first_entry) {
        if ENTRY_LINE_RE.is_match(line) {
            end = Some(offset + line.len());
        } else if !line.trim().is_empty() {
            break;
        }
    }

    let start = lines[heading.unwrap_or(first_entry)].0;
    match (heading, end) {
        (_, Some(end)) => Some(start..end),
        (Some(idx), None) => Some(start..lines[idx].0 + lines[idx].1.len()),
        (None, None) => None,
    }
}

/// Lines paired with their byte offset, without line terminators.
pub fn lines_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|raw| {
            let start = offset;
            offset += raw.len();
            (start, raw.trim_end_matches(['\n', '\r']))
        })
        .collect()
}
