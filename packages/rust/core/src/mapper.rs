//! Section-to-document assignment by keyword category.

use tracing::{debug, instrument};

use docstruct_shared::DocumentStructure;

/// Keyword categories in tie-break order. The category name is what gets
/// looked up in a document's `purpose`.
pub const SECTION_CATEGORIES: [(&str, &[&str]); 6] = [
    (
        "financial",
        &["financial", "budget", "forecast", "cash flow", "balance sheet", "p&l", "profit"],
    ),
    (
        "market",
        &["market", "industry", "competitor", "analysis", "potential", "opportunity", "swot"],
    ),
    (
        "team",
        &["team", "management", "experience", "cv", "credentials", "organization", "personnel"],
    ),
    (
        "operational",
        &["operation", "production", "process", "supply", "logistics", "implementation"],
    ),
    (
        "risk",
        &["risk", "mitigation", "assumption", "contingency", "challenge", "sensitivity"],
    ),
    (
        "legal",
        &["legal", "compliance", "regulation", "license", "permit", "governance", "trademark"],
    ),
];

/// Best-scoring category for a title. Equal scores keep the earlier category.
pub fn best_category(title: &str) -> Option<&'static str> {
    let lower = title.to_lowercase();
    let mut best: Option<(&'static str, usize)> = None;

    for (category, keywords) in SECTION_CATEGORIES {
        let score = keywords.iter().filter(|kw| lower.contains(*kw)).count();
        if score > 0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((category, score));
        }
    }

    best.map(|(category, _)| category)
}

/// Assign every unassigned section to a document.
///
/// Assigned sections are never touched, so running this twice is a no-op.
/// Does nothing on a structure without documents.
#[instrument(skip_all, fields(sections = structure.sections.len()))]
pub fn map_sections_to_documents(structure: &mut DocumentStructure) {
    let Some(primary) = structure.primary_document().map(|d| d.id.clone()) else {
        return;
    };

    let mut assigned = 0usize;
    for section in structure.sections.iter_mut().filter(|s| !s.is_assigned()) {
        let target = best_category(&section.title)
            .and_then(|category| {
                structure
                    .documents
                    .iter()
                    .find(|d| d.purpose.to_lowercase().contains(category))
            })
            .map_or_else(|| primary.clone(), |doc| doc.id.clone());

        section.document_id = target;
        assigned += 1;
    }

    debug!(assigned, "sections mapped to documents");
}
