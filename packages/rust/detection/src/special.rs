//! The ten special-section detectors.
//!
//! Every detector is a pure function of the text. Keyword vocabularies are
//! compiled into word-bounded alternations so that short keywords like `toc`
//! do not fire inside ordinary words.

use std::sync::LazyLock;

use regex::Regex;

use docstruct_shared::{DetectionPayload, DetectionResult, SpecialSectionKind};

use crate::toc;

/// Which input shape the detectors are scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectorVariant {
    /// Plain text extracted from an upload.
    #[default]
    Text,
    /// A JSON-stringified content blob.
    Structured,
}

/// Build `\b(?:kw1|kw2|...)\b` from a keyword list.
fn vocabulary(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("valid vocabulary regex")
}

macro_rules! vocab {
    ($name:ident, [$($kw:literal),+ $(,)?]) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| vocabulary(&[$($kw),+]));
    };
}

macro_rules! pattern {
    ($name:ident, $re:literal) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("valid detector regex"));
    };
}

// Title page
vocab!(TITLE_TEXT, [
    "business plan", "geschäftsplan", "company", "unternehmen", "proposal",
    "cover page", "title page",
]);
vocab!(TITLE_STRUCTURED, [
    "business plan", "company", "projektname", "title page", "executive summary",
    "unternehmen", "geschäftsplan", "cover page", "document title", "proposal title",
    "title sheet",
]);
vocab!(TITLE_TOC_VOCAB, ["table of contents", "inhaltsverzeichnis"]);
pattern!(PAGE_NUMBER_RE, r"page \d+|seite \d+|\d+/\d+");

// References
vocab!(REFERENCES_TEXT, [
    "references", "literatur", "bibliography", "works cited", "sources", "quellen",
]);
vocab!(REFERENCES_STRUCTURED, [
    "references", "quellen", "quelle", "literatur", "bibliography", "works cited",
    "sources", "citations", "references list", "source list", "works consulted",
]);
pattern!(REFERENCE_LIST_RE, r"(?m)^\s*\[\d+\]\s+\S");

// Appendices
vocab!(APPENDICES_TEXT, ["appendix", "appendices", "anhang", "annex", "anlage"]);
vocab!(APPENDICES_STRUCTURED, [
    "appendix", "appendices", "anhang", "annex", "attachment", "beilage", "anlagen",
    "supplementary materials", "supporting documents",
]);
pattern!(APPENDIX_NUMBER_RE, r"\b(?:appendix|appendices|anhang|anlage)\s+[a-z\d]\b");

// Tables and data
vocab!(TABLES_TEXT, ["tables", "tabellen"]);
vocab!(TABLES_STRUCTURED, [
    "tables", "tabellen", "data tables", "statistik", "statistics", "table listing",
    "data listing",
]);
pattern!(TABLE_NUMBER_TEXT_RE, r"\b(?:table|tabelle)\s+\d+");
pattern!(TABLE_NUMBER_STRUCTURED_RE, r"\b(?:table|tabelle|chart)\s+\d+");

// Figures and images
vocab!(FIGURES_TEXT, ["figures", "abbildungen", "charts", "graphs"]);
vocab!(FIGURES_STRUCTURED, [
    "figures", "abbildungen", "charts", "graphs", "images", "bilder", "diagrams",
    "grafiken", "figure listing", "visual listing",
]);
pattern!(FIGURE_NUMBER_TEXT_RE, r"\b(?:figure|abbildung|fig\.?)\s+\d+");
pattern!(FIGURE_NUMBER_STRUCTURED_RE, r"\b(?:figure|abbildung|grafik|image|fig\.?)\s+\d+");

// Executive summary
vocab!(EXEC_SUMMARY_TEXT, ["executive summary"]);
vocab!(EXEC_SUMMARY_STRUCTURED, [
    "executive summary", "executive-summary", "executivesummary", "exposé",
    "zusammenfassung", "management summary", "executive overview", "brief overview",
    "key points", "main findings", "highlights",
]);

// Glossary
vocab!(GLOSSARY_VOCAB, [
    "glossary", "glossar", "definitions", "definitionen", "terminology", "begriffe",
    "word list", "vocabulary", "lexicon", "term definition",
]);
pattern!(GLOSSARY_ENTRY_RE, r"(?m)^\s*[A-ZÄÖÜ][A-Za-zÄÖÜäöüß ]{1,99}\s*[:\-–]\s*\S.{9,200}$");

// Legal notices
vocab!(LEGAL_VOCAB, [
    "legal notice", "legal disclaimer", "disclaimer", "copyright", "trademark",
    "patent", "intellectual property", "ip rights", "terms of use", "privacy policy",
    "limitation of liability", "governing law", "jurisdiction",
    "terms and conditions", "rechtlicher hinweis", "haftungsausschluss",
    "urheberrecht", "impressum",
]);
pattern!(LEGAL_TERM_RE, r"\b(?:warrant(?:y|ies)|liabilit(?:y|ies)|damages?|indemnity|confidentiality)\b");

// Financials
vocab!(FINANCIALS_VOCAB, [
    "financial plan", "financial planning", "finanzplan", "finanzierungsplan",
    "financial projections", "financial forecast", "finanzielle planung", "budget",
    "revenue", "expenses", "income statement", "balance sheet", "cash flow",
    "profit & loss", "p&l", "financial statements", "revenue model",
    "cost structure", "break-even", "return on investment", "valuation",
]);
pattern!(
    CURRENCY_RE,
    r"[$€£¥]\s?\d[\d,.]*|\d[\d,.]*\s?(?:[$€£¥%]|usd\b|eur\b|gbp\b|jpy\b)|\b(?:usd|eur|gbp|jpy)\s?\d[\d,.]*"
);

/// Text in original case plus its lower-cased twin.
struct Haystack<'a> {
    original: &'a str,
    lower: String,
}

impl<'a> Haystack<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            original: text,
            lower: text.to_lowercase(),
        }
    }
}

/// Run one detector.
pub fn detect(kind: SpecialSectionKind, text: &str, variant: DetectorVariant) -> DetectionResult {
    run(kind, &Haystack::new(text), variant)
}

/// Run all ten detectors in canonical order.
pub fn detect_all(text: &str, variant: DetectorVariant) -> Vec<(SpecialSectionKind, DetectionResult)> {
    let haystack = Haystack::new(text);
    SpecialSectionKind::ALL
        .into_iter()
        .map(|kind| (kind, run(kind, &haystack, variant)))
        .collect()
}

fn run(kind: SpecialSectionKind, hay: &Haystack<'_>, variant: DetectorVariant) -> DetectionResult {
    match kind {
        SpecialSectionKind::TitlePage => title_page(hay, variant),
        SpecialSectionKind::TableOfContents => toc::detect_toc(hay.original, variant),
        SpecialSectionKind::References => references(hay, variant),
        SpecialSectionKind::Appendices => appendices(hay, variant),
        SpecialSectionKind::TablesData => tables_data(hay, variant),
        SpecialSectionKind::FiguresImages => figures_images(hay, variant),
        SpecialSectionKind::ExecutiveSummary => executive_summary(hay, variant),
        SpecialSectionKind::Glossary => glossary(hay),
        SpecialSectionKind::LegalNotices => legal_notices(hay),
        SpecialSectionKind::Financials => financials(hay),
    }
}

fn pick(variant: DetectorVariant, text: f64, structured: f64) -> f64 {
    match variant {
        DetectorVariant::Text => text,
        DetectorVariant::Structured => structured,
    }
}

fn title_page(hay: &Haystack<'_>, variant: DetectorVariant) -> DetectionResult {
    let vocab = match variant {
        DetectorVariant::Text => &*TITLE_TEXT,
        DetectorVariant::Structured => &*TITLE_STRUCTURED,
    };

    let lower = hay.lower.as_str();
    if vocab.is_match(lower) && !PAGE_NUMBER_RE.is_match(lower) && !TITLE_TOC_VOCAB.is_match(lower)
    {
        return DetectionResult::found(pick(variant, 0.8, 0.85), DetectionPayload::TitlePage);
    }
    DetectionResult::not_found()
}

fn references(hay: &Haystack<'_>, variant: DetectorVariant) -> DetectionResult {
    let vocab = match variant {
        DetectorVariant::Text => &*REFERENCES_TEXT,
        DetectorVariant::Structured => &*REFERENCES_STRUCTURED,
    };

    if vocab.is_match(&hay.lower) {
        return DetectionResult::found(0.85, DetectionPayload::References);
    }
    if REFERENCE_LIST_RE.is_match(&hay.lower) {
        return DetectionResult::found(0.75, DetectionPayload::References);
    }
    DetectionResult::not_found()
}

fn appendices(hay: &Haystack<'_>, variant: DetectorVariant) -> DetectionResult {
    let vocab = match variant {
        DetectorVariant::Text => &*APPENDICES_TEXT,
        DetectorVariant::Structured => &*APPENDICES_STRUCTURED,
    };

    if vocab.is_match(&hay.lower) {
        return DetectionResult::found(pick(variant, 0.85, 0.9), DetectionPayload::Appendices);
    }
    if APPENDIX_NUMBER_RE.is_match(&hay.lower) {
        return DetectionResult::found(pick(variant, 0.85, 0.75), DetectionPayload::Appendices);
    }
    DetectionResult::not_found()
}

fn tables_data(hay: &Haystack<'_>, variant: DetectorVariant) -> DetectionResult {
    let (vocab, numbering) = match variant {
        DetectorVariant::Text => (&*TABLES_TEXT, &*TABLE_NUMBER_TEXT_RE),
        DetectorVariant::Structured => (&*TABLES_STRUCTURED, &*TABLE_NUMBER_STRUCTURED_RE),
    };
    let base = pick(variant, 0.75, 0.8);

    if vocab.is_match(&hay.lower) {
        return DetectionResult::found(base, DetectionPayload::TablesData);
    }
    if numbering.is_match(&hay.lower) {
        return DetectionResult::found(base - 0.05, DetectionPayload::TablesData);
    }
    DetectionResult::not_found()
}

fn figures_images(hay: &Haystack<'_>, variant: DetectorVariant) -> DetectionResult {
    let (vocab, numbering) = match variant {
        DetectorVariant::Text => (&*FIGURES_TEXT, &*FIGURE_NUMBER_TEXT_RE),
        DetectorVariant::Structured => (&*FIGURES_STRUCTURED, &*FIGURE_NUMBER_STRUCTURED_RE),
    };
    let base = pick(variant, 0.75, 0.8);

    if vocab.is_match(&hay.lower) {
        return DetectionResult::found(base, DetectionPayload::FiguresImages);
    }
    if numbering.is_match(&hay.lower) {
        return DetectionResult::found(base - 0.05, DetectionPayload::FiguresImages);
    }
    DetectionResult::not_found()
}

/// Only counts when the earliest keyword sits inside the opening window.
fn executive_summary(hay: &Haystack<'_>, variant: DetectorVariant) -> DetectionResult {
    let (vocab, window, confidence) = match variant {
        DetectorVariant::Text => (&*EXEC_SUMMARY_TEXT, 0.25, 0.8),
        DetectorVariant::Structured => (&*EXEC_SUMMARY_STRUCTURED, 0.2, 0.9),
    };

    let Some(first) = vocab.find(&hay.lower) else {
        return DetectionResult::not_found();
    };

    let limit = hay.lower.len() as f64 * window;
    if (first.start() as f64) < limit {
        return DetectionResult::found(confidence, DetectionPayload::ExecutiveSummary);
    }
    DetectionResult::not_found()
}

fn glossary(hay: &Haystack<'_>) -> DetectionResult {
    if GLOSSARY_VOCAB.is_match(&hay.lower) || GLOSSARY_ENTRY_RE.find_iter(hay.original).count() >= 3
    {
        return DetectionResult::found(0.85, DetectionPayload::Glossary);
    }
    DetectionResult::not_found()
}

fn legal_notices(hay: &Haystack<'_>) -> DetectionResult {
    if LEGAL_VOCAB.is_match(&hay.lower) || LEGAL_TERM_RE.find_iter(&hay.lower).count() > 3 {
        return DetectionResult::found(0.8, DetectionPayload::LegalNotices);
    }
    DetectionResult::not_found()
}

fn financials(hay: &Haystack<'_>) -> DetectionResult {
    if FINANCIALS_VOCAB.is_match(&hay.lower) || CURRENCY_RE.find_iter(&hay.lower).count() > 5 {
        return DetectionResult::found(0.85, DetectionPayload::Financials);
    }
    DetectionResult::not_found()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(kind: SpecialSectionKind, input: &str) -> DetectionResult {
        detect(kind, input, DetectorVariant::Text)
    }

    #[test]
    fn title_page_requires_no_toc_and_no_page_numbers() {
        let cover = "Acme GmbH\nBusiness Plan 2025\nPrepared for the regional fund";
        let result = text(SpecialSectionKind::TitlePage, cover);
        assert!(result.found);
        assert_eq!(result.confidence, 0.8);

        let with_toc = format!("{cover}\nTable of Contents");
        assert!(!text(SpecialSectionKind::TitlePage, &with_toc).found);

        let with_pages = format!("{cover}\nPage 3");
        assert!(!text(SpecialSectionKind::TitlePage, &with_pages).found);

        let structured = detect(SpecialSectionKind::TitlePage, cover, DetectorVariant::Structured);
        assert_eq!(structured.confidence, 0.85);
    }

    #[test]
    fn references_keyword_and_list_pattern() {
        assert_eq!(text(SpecialSectionKind::References, "Bibliography\nSmith 2020").confidence, 0.85);

        let numbered = "[1] Smith, J. Growth.\n[2] Doe, A. Markets.";
        let result = text(SpecialSectionKind::References, numbered);
        assert!(result.found);
        assert_eq!(result.confidence, 0.75);
    }

    #[test]
    fn appendices_confidence_by_variant() {
        let input = "See Appendix B for the CVs.";
        assert_eq!(text(SpecialSectionKind::Appendices, input).confidence, 0.85);
        assert_eq!(
            detect(SpecialSectionKind::Appendices, input, DetectorVariant::Structured).confidence,
            0.9
        );
    }

    #[test]
    fn tables_and_figures_numbering_is_secondary() {
        let tables = text(SpecialSectionKind::TablesData, "Table 3 shows revenue.");
        assert!(tables.found);
        assert!((tables.confidence - 0.7).abs() < 1e-9);

        let figures = text(SpecialSectionKind::FiguresImages, "List of figures");
        assert_eq!(figures.confidence, 0.75);
    }

    #[test]
    fn executive_summary_position_matters() {
        let early = format!("Executive Summary\n{}", "body ".repeat(100));
        assert!(text(SpecialSectionKind::ExecutiveSummary, &early).found);

        let late = format!("{}\nExecutive Summary", "body ".repeat(100));
        let result = text(SpecialSectionKind::ExecutiveSummary, &late);
        assert!(!result.found);
        assert_eq!(result.confidence, 0.1);
    }

    #[test]
    fn executive_summary_window_is_narrower_for_structured_blobs() {
        // keyword starts at byte 22 of 100
        let input = format!("{} executive summary {}", "z".repeat(21), "z".repeat(60));
        assert_eq!(input.len(), 100);

        let plain = text(SpecialSectionKind::ExecutiveSummary, &input);
        assert!(plain.found);
        assert_eq!(plain.confidence, 0.8);

        let structured = detect(
            SpecialSectionKind::ExecutiveSummary,
            &input,
            DetectorVariant::Structured,
        );
        assert!(!structured.found);

        let early = format!("{} executive summary {}", "z".repeat(9), "z".repeat(72));
        let structured = detect(
            SpecialSectionKind::ExecutiveSummary,
            &early,
            DetectorVariant::Structured,
        );
        assert!(structured.found);
        assert_eq!(structured.confidence, 0.9);
    }

    #[test]
    fn glossary_by_term_lines() {
        let input = "KPI: a key performance indicator used below\nCAPEX: capital expenditure for machines\nOPEX: operating expenditure per month\n";
        let result = text(SpecialSectionKind::Glossary, input);
        assert!(result.found);
        assert_eq!(result.confidence, 0.85);

        let two = "KPI: a key performance indicator used below\nCAPEX: capital expenditure for machines\n";
        assert!(!text(SpecialSectionKind::Glossary, two).found);
    }

    #[test]
    fn legal_notices_by_vocabulary_density() {
        let input = "No warranty. Damages excluded. Indemnity applies. Confidentiality kept.";
        assert!(text(SpecialSectionKind::LegalNotices, input).found);
        assert!(!text(SpecialSectionKind::LegalNotices, "damages and warranty only").found);
    }

    #[test]
    fn financials_by_currency_density() {
        let input = "We need €100, €200, €300, €400, €500 and €600 in stages.";
        let result = text(SpecialSectionKind::Financials, input);
        assert!(result.found);
        assert_eq!(result.confidence, 0.85);

        let sparse = "We need €100 and €200.";
        assert!(!text(SpecialSectionKind::Financials, sparse).found);
    }

    #[test]
    fn all_confidences_are_bounded() {
        let samples = ["", "x", "Table of Contents\nA .... 1", "Business Plan\nExecutive Summary"];
        for sample in samples {
            for variant in [DetectorVariant::Text, DetectorVariant::Structured] {
                for (_, result) in detect_all(sample, variant) {
                    assert!((0.0..=1.0).contains(&result.confidence));
                    assert!(result.confidence > 0.0);
                }
            }
        }
    }
}
