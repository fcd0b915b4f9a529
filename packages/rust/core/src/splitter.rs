//! Raw text to ordered section candidates.
//!
//! Strategies run in priority order and the first one that qualifies wins:
//! TOC-driven split, direct heading scan, then the fallback chain (TOC again,
//! numbered headings only, keyword anchors, one section re-chunked by size
//! when long).

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use docstruct_detection::{chunking, toc, DetectorVariant};
use docstruct_shared::{
    file_stem, DetectionPayload, DetectionResult, EngineConfig, IdGenerator, RawSubsection,
    Section, TocConfig,
};

/// Boundary rule of the heading scan: `1.2 Title`.
static NUMBERED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*\s+").expect("numbered line regex"));

/// Looser numbering used by the fallback chain; also accepts non-breaking spaces.
static NUMBERED_FALLBACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:\.\d+)*\.?[\s\u{a0}]+\p{Lu}").expect("numbered fallback regex")
});

/// Leading numbering removed from titles.
static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*\.?[\s\u{a0}]*").expect("leading number regex"));

/// Business-document anchors, scanned in this order.
const ANCHOR_KEYWORDS: [&str; 16] = [
    "executive summary",
    "problem",
    "solution",
    "market analysis",
    "financial",
    "competition",
    "strategy",
    "marketing",
    "sales",
    "team",
    "management",
    "operations",
    "risks",
    "conclusion",
    "references",
    "appendix",
];

static ANCHOR_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ANCHOR_KEYWORDS
        .iter()
        .map(|k| Regex::new(&format!(r"\b{}\b", regex::escape(k))).expect("anchor regex"))
        .collect()
});

/// Which strategy produced the sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    TableOfContents,
    HeadingScan,
    NumberedHeadings,
    KeywordAnchors,
    SingleSection,
    SizeChunks,
}

impl SplitStrategy {
    /// True for everything past the direct heading scan.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::TableOfContents | Self::HeadingScan)
    }

    /// Structure-level confidence (0-100) implied by the strategy.
    pub fn confidence_score(&self) -> u8 {
        match self {
            Self::TableOfContents | Self::HeadingScan => 90,
            Self::NumberedHeadings | Self::KeywordAnchors => 70,
            Self::SingleSection | Self::SizeChunks => 60,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TableOfContents => "table_of_contents",
            Self::HeadingScan => "heading_scan",
            Self::NumberedHeadings => "numbered_headings",
            Self::KeywordAnchors => "keyword_anchors",
            Self::SingleSection => "single_section",
            Self::SizeChunks => "size_chunks",
        }
    }
}

/// Sections plus the strategy that produced them.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub sections: Vec<Section>,
    pub strategy: SplitStrategy,
}

/// Title and body before an ID is assigned.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    title: String,
    content: String,
}

/// Split `text` into sections. Never returns an empty list.
#[instrument(skip_all, fields(file = file_name, len = text.len()))]
pub fn extract_sections(
    text: &str,
    file_name: &str,
    ids: &mut dyn IdGenerator,
    config: &EngineConfig,
) -> SplitOutcome {
    let stem = file_stem(file_name);
    let (candidates, strategy) = split_candidates(text, &stem, config);
    debug!(
        strategy = strategy.as_str(),
        sections = candidates.len(),
        "text split"
    );

    let sections = candidates
        .into_iter()
        .map(|c| into_section(c, ids))
        .collect();

    SplitOutcome { sections, strategy }
}

fn split_candidates(text: &str, stem: &str, config: &EngineConfig) -> (Vec<Candidate>, SplitStrategy) {
    let toc_detection = toc::detect_toc(text, DetectorVariant::Text);

    if let Some(sections) = toc_split(text, &toc_detection, &config.toc)
        .filter(|s| s.len() >= config.toc.min_entries)
    {
        return (sections, SplitStrategy::TableOfContents);
    }

    // a contents block the gate rejected must not turn into sections of its own
    let scan_text = if toc_detection.found {
        without_toc_block(text)
    } else {
        text.to_string()
    };
    if let Some(sections) = heading_scan(&scan_text, stem) {
        return (sections, SplitStrategy::HeadingScan);
    }

    debug!("heading scan found no boundaries, entering fallback chain");

    if let Some(sections) =
        toc_split(text, &toc_detection, &config.toc).filter(|s| !s.is_empty())
    {
        return (sections, SplitStrategy::TableOfContents);
    }

    if let Some(sections) = numbered_split(text, stem) {
        return (sections, SplitStrategy::NumberedHeadings);
    }

    if let Some(sections) = keyword_anchor_split(text, stem) {
        return (sections, SplitStrategy::KeywordAnchors);
    }

    if chunking::word_count(text) >= config.chunking.min_words {
        let chunks = chunking::fallback_chunks(text, &config.chunking);
        let sections = chunks
            .into_iter()
            .map(|c| Candidate {
                title: c.title,
                content: c.content,
            })
            .collect();
        return (sections, SplitStrategy::SizeChunks);
    }

    (
        vec![Candidate {
            title: stem.to_string(),
            content: text.to_string(),
        }],
        SplitStrategy::SingleSection,
    )
}

/// Use TOC entries as anchors in the body, with the TOC block cut out.
///
/// `None` unless the detector is confident enough and lists enough entries.
fn toc_split(
    text: &str,
    detection: &DetectionResult,
    config: &TocConfig,
) -> Option<Vec<Candidate>> {
    if !detection.passes(config.min_confidence) {
        return None;
    }
    let Some(DetectionPayload::Toc { entries }) = &detection.content else {
        return None;
    };
    if entries.len() < config.min_entries {
        debug!(entries = entries.len(), "too few TOC entries for a TOC split");
        return None;
    }

    let body = without_toc_block(text);
    let lines: Vec<&str> = body.lines().map(str::trim).collect();

    let mut anchors = Vec::new();
    let mut cursor = 0;
    for entry in entries {
        let title = toc::strip_numbering(entry);
        if title.is_empty() {
            continue;
        }
        let needle = title.to_lowercase();
        let found = lines[cursor..].iter().position(|line| {
            toc::strip_numbering(line)
                .to_lowercase()
                .starts_with(&needle)
        });
        if let Some(offset) = found {
            anchors.push((cursor + offset, title.to_string()));
            cursor += offset + 1;
        }
    }

    debug!(entries = entries.len(), located = anchors.len(), "TOC entries located");
    Some(slice_at_anchors(&lines, anchors, None))
}

/// `text` with its TOC block cut out, and any stray dot-leader entry lines.
fn without_toc_block(text: &str) -> String {
    let body = match toc::toc_block_range(text) {
        Some(range) => format!("{}{}", &text[..range.start], &text[range.end..]),
        None => text.to_string(),
    };
    body.lines()
        .filter(|line| !toc::is_entry_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Walk lines, opening a section at each numbered or short title line.
///
/// `None` when no line qualifies as a boundary.
fn heading_scan(text: &str, stem: &str) -> Option<Vec<Candidate>> {
    let mut sections: Vec<Candidate> = Vec::new();
    let mut current: Option<Candidate> = None;
    let mut saw_boundary = false;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_boundary(line) {
            saw_boundary = true;
            sections.extend(current.take());
            current = Some(Candidate {
                title: clean_title(line),
                content: String::new(),
            });
            continue;
        }

        let section = current.get_or_insert_with(|| Candidate {
            title: stem.to_string(),
            content: String::new(),
        });
        if !section.content.is_empty() {
            section.content.push('\n');
        }
        section.content.push_str(line);
    }
    sections.extend(current);

    saw_boundary.then_some(sections)
}

fn numbered_split(text: &str, stem: &str) -> Option<Vec<Candidate>> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let anchors: Vec<(usize, String)> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| NUMBERED_FALLBACK_RE.is_match(line))
        .map(|(i, line)| (i, clean_title(line)))
        .collect();

    if anchors.is_empty() {
        return None;
    }
    Some(slice_at_anchors(&lines, anchors, Some(stem)))
}

/// Open a section at the line of each anchor keyword, one per distinct title.
fn keyword_anchor_split(text: &str, stem: &str) -> Option<Vec<Candidate>> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let lowered: Vec<String> = lines.iter().map(|l| l.to_lowercase()).collect();

    let mut anchors: Vec<(usize, String)> = Vec::new();
    for re in ANCHOR_RES.iter() {
        for (idx, lower) in lowered.iter().enumerate() {
            if !re.is_match(lower) {
                continue;
            }
            let title = clean_title(lines[idx]);
            let duplicate = anchors
                .iter()
                .any(|(i, t)| *i == idx || t.to_lowercase() == title.to_lowercase());
            if !duplicate {
                anchors.push((idx, title));
            }
        }
    }

    if anchors.is_empty() {
        return None;
    }
    anchors.sort_by_key(|(idx, _)| *idx);
    Some(slice_at_anchors(&lines, anchors, Some(stem)))
}

/// Cut `lines` at each anchor line. Lines before the first anchor become a
/// `preamble_title` section when one is given, otherwise they are dropped.
fn slice_at_anchors(
    lines: &[&str],
    anchors: Vec<(usize, String)>,
    preamble_title: Option<&str>,
) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(anchors.len() + 1);

    if let (Some(title), Some((first, _))) = (preamble_title, anchors.first()) {
        let preamble = join_lines(&lines[..*first]);
        if !preamble.is_empty() {
            out.push(Candidate {
                title: title.to_string(),
                content: preamble,
            });
        }
    }

    for (n, (idx, title)) in anchors.iter().enumerate() {
        let end = anchors.get(n + 1).map_or(lines.len(), |(next, _)| *next);
        out.push(Candidate {
            title: title.clone(),
            content: join_lines(&lines[idx + 1..end]),
        });
    }
    out
}

fn join_lines(lines: &[&str]) -> String {
    lines
        .iter()
        .filter(|l| !l.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered, or a short line starting with a capital letter.
pub fn is_boundary(line: &str) -> bool {
    if NUMBERED_LINE_RE.is_match(line) {
        return true;
    }
    let starts_upper = line
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase() || matches!(c, 'Ä' | 'Ö' | 'Ü'));
    line.chars().count() < 80 && line.split_whitespace().count() <= 8 && starts_upper
}

/// Strip leading numbering and a trailing colon.
pub fn clean_title(line: &str) -> String {
    let stripped = LEADING_NUMBER_RE.replace(line.trim(), "");
    stripped.trim().trim_end_matches(':').trim().to_string()
}

fn into_section(candidate: Candidate, ids: &mut dyn IdGenerator) -> Section {
    let id = format!("sec-{}", ids.next_id());
    let mut section = Section::new(id.clone(), candidate.title.clone());
    section.raw_subsections.push(RawSubsection {
        id: format!("{id}-raw"),
        title: candidate.title,
        raw_text: candidate.content.clone(),
    });
    section.content = Some(candidate.content);
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstruct_shared::SequentialIdGenerator;

    fn split(text: &str) -> SplitOutcome {
        extract_sections(
            text,
            "plan.txt",
            &mut SequentialIdGenerator::new(),
            &EngineConfig::default(),
        )
    }

    fn titles(outcome: &SplitOutcome) -> Vec<&str> {
        outcome.sections.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn toc_split_uses_entries() {
        let text = "\
Acme Business Plan

Table of Contents
1. Introduction .... 2
2. Market .... 3
3. Team .... 4
4. Finance .... 5

1. Introduction
we build bikes
2. Market
the market is large
3. Team
two founders
4. Finance
we need money
";
        let outcome = split(text);
        assert_eq!(outcome.strategy, SplitStrategy::TableOfContents);
        assert_eq!(titles(&outcome), vec!["Introduction", "Market", "Team", "Finance"]);
        assert_eq!(outcome.sections[1].content.as_deref(), Some("the market is large"));
    }

    #[test]
    fn three_toc_entries_fall_through() {
        let text = "\
Table of Contents
Introduction .... 2
Market .... 3
Team .... 4

Introduction
we build bikes
";
        let outcome = split(text);
        assert_ne!(outcome.strategy, SplitStrategy::TableOfContents);
    }

    #[test]
    fn rejected_toc_lines_do_not_become_sections() {
        let text = "\
Table of Contents
Introduction .... 2
Market .... 3
Team .... 4

Introduction
we build bikes
";
        let outcome = split(text);
        assert_eq!(outcome.strategy, SplitStrategy::HeadingScan);
        assert_eq!(titles(&outcome), vec!["Introduction"]);
        assert!(outcome.sections.iter().all(|s| !s.title.contains("..")));
        assert_eq!(outcome.sections[0].content.as_deref(), Some("we build bikes"));
    }

    #[test]
    fn heading_scan_synthesizes_first_section() {
        let text = "some preamble text in lower case\n1.1 Overview:\nbody line one\nbody line two\nMarket Outlook\ngrowing fast";
        let outcome = split(text);
        assert_eq!(outcome.strategy, SplitStrategy::HeadingScan);
        assert_eq!(titles(&outcome), vec!["plan", "Overview", "Market Outlook"]);
        assert_eq!(
            outcome.sections[1].content.as_deref(),
            Some("body line one\nbody line two")
        );
    }

    #[test]
    fn sections_carry_ids_and_raw_subsection() {
        let outcome = split("Intro Heading\nbody");
        let section = &outcome.sections[0];
        assert_eq!(section.id, "sec-1");
        assert_eq!(section.raw_subsections.len(), 1);
        assert_eq!(section.raw_subsections[0].id, "sec-1-raw");
        assert_eq!(section.raw_subsections[0].raw_text, "body");
        assert!(!section.is_assigned());
    }

    #[test]
    fn keyword_anchor_fallback() {
        let text = "our team has built three companies before this one\nit knows the field\nthe financial outlook depends on the first grant round\nmore numbers follow";
        let outcome = split(text);
        assert_eq!(outcome.strategy, SplitStrategy::KeywordAnchors);
        assert_eq!(outcome.sections.len(), 2);
        assert!(outcome.sections[0].title.starts_with("our team"));
        assert_eq!(outcome.sections[0].content.as_deref(), Some("it knows the field"));
    }

    #[test]
    fn short_plain_text_is_single_section() {
        let outcome = split("just a few lower case words here");
        assert_eq!(outcome.strategy, SplitStrategy::SingleSection);
        assert_eq!(titles(&outcome), vec!["plan"]);
        assert!(outcome.strategy.is_fallback());
    }

    #[test]
    fn empty_text_still_yields_a_section() {
        let outcome = extract_sections("", "", &mut SequentialIdGenerator::new(), &EngineConfig::default());
        assert_eq!(outcome.sections.len(), 1);
        assert_eq!(outcome.sections[0].title, "Document");
    }

    #[test]
    fn long_undifferentiated_text_is_chunked() {
        let text = (0..2000).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let outcome = split(&text);
        assert_eq!(outcome.strategy, SplitStrategy::SizeChunks);
        assert_eq!(titles(&outcome), vec!["Section 1", "Section 2"]);
    }

    #[test]
    fn boundary_rules() {
        assert!(is_boundary("2.3 Pricing"));
        assert!(is_boundary("4 Team"));
        assert!(is_boundary("EXECUTIVE SUMMARY"));
        assert!(is_boundary("We build bikes."));
        assert!(!is_boundary("3. Pricing"));
        assert!(!is_boundary("lowercase start"));
        assert!(!is_boundary("This heading candidate is far too long to be a title line"));
    }

    #[test]
    fn short_capitalized_sentence_opens_a_section() {
        let outcome = split("Our plan works well.\nwe build bikes in vienna\n");
        assert_eq!(outcome.strategy, SplitStrategy::HeadingScan);
        assert_eq!(titles(&outcome), vec!["Our plan works well."]);
        assert_eq!(
            outcome.sections[0].content.as_deref(),
            Some("we build bikes in vienna")
        );
    }

    #[test]
    fn clean_title_strips_numbering_and_colon() {
        assert_eq!(clean_title("1.2 Market Size:"), "Market Size");
        assert_eq!(clean_title("4. Team"), "Team");
        assert_eq!(clean_title("Risks"), "Risks");
    }
}
