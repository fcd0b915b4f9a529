//! Placement policy for the primary document's sections.

use tracing::{debug, instrument};

use docstruct_shared::{
    ANCILLARY_SECTION_ID, APPENDICES_SECTION_ID, DocumentStructure, FIGURES_IMAGES_SECTION_ID,
    METADATA_SECTION_ID, REFERENCES_SECTION_ID, Section, TABLES_DATA_SECTION_ID,
};

/// Title fragments that pin a section to the very end.
pub const MUST_BE_LAST: [&str; 3] = [
    "introduction to application form",
    "how to apply",
    "submission instructions",
];

/// Title fragments that pull a section to the front of the body.
pub const SHOULD_BE_FIRST: [&str; 3] = ["executive summary", "overview", "introduction"];

/// Canonical IDs that lead the document, in this order.
pub const SPECIAL_FIRST_IDS: [&str; 2] = [METADATA_SECTION_ID, ANCILLARY_SECTION_ID];

/// Canonical IDs that close the body, in this order.
pub const END_SECTION_IDS: [&str; 4] = [
    REFERENCES_SECTION_ID,
    TABLES_DATA_SECTION_ID,
    FIGURES_IMAGES_SECTION_ID,
    APPENDICES_SECTION_ID,
];

pub fn is_must_be_last(title: &str) -> bool {
    let lower = title.to_lowercase();
    MUST_BE_LAST.iter().any(|p| lower.contains(p))
}

fn is_should_be_first(title: &str) -> bool {
    let lower = title.to_lowercase();
    SHOULD_BE_FIRST.iter().any(|p| lower.contains(p))
}

/// Reorder the primary document's sections.
///
/// Result: special-first IDs, should-be-first titles, the rest in input
/// order, end IDs, then must-be-last titles. Sections of other documents
/// follow untouched. A must-be-last title wins over every other rule.
#[instrument(skip_all, fields(sections = structure.sections.len()))]
pub fn order_sections(structure: &mut DocumentStructure) {
    let Some(primary) = structure.primary_document().map(|d| d.id.clone()) else {
        return;
    };

    let sections = std::mem::take(&mut structure.sections);
    let (mine, others): (Vec<Section>, Vec<Section>) =
        sections.into_iter().partition(|s| s.document_id == primary);

    let mut special_first = Vec::new();
    let mut first = Vec::new();
    let mut middle = Vec::new();
    let mut end = Vec::new();
    let mut last = Vec::new();

    for section in mine {
        if is_must_be_last(&section.title) {
            last.push(section);
        } else if SPECIAL_FIRST_IDS.contains(&section.id.as_str()) {
            special_first.push(section);
        } else if END_SECTION_IDS.contains(&section.id.as_str()) {
            end.push(section);
        } else if is_should_be_first(&section.title) {
            first.push(section);
        } else {
            middle.push(section);
        }
    }

    special_first.sort_by_key(|s| rank(&SPECIAL_FIRST_IDS, &s.id));
    end.sort_by_key(|s| rank(&END_SECTION_IDS, &s.id));

    debug!(
        first = special_first.len() + first.len(),
        middle = middle.len(),
        end = end.len(),
        last = last.len(),
        "sections ordered"
    );

    structure.sections = special_first
        .into_iter()
        .chain(first)
        .chain(middle)
        .chain(end)
        .chain(last)
        .chain(others)
        .collect();
}

fn rank(ids: &[&str], id: &str) -> usize {
    ids.iter().position(|x| *x == id).unwrap_or(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstruct_shared::{Document, StructureSource};

    fn structure(sections: &[(&str, &str, &str)]) -> DocumentStructure {
        let mut s = DocumentStructure::empty(StructureSource::Document);
        for id in ["main", "annex"] {
            s.documents.push(Document {
                id: id.into(),
                name: id.into(),
                purpose: String::new(),
                required: true,
                doc_type: None,
            });
        }
        for (id, title, doc) in sections {
            let mut section = Section::new(*id, *title);
            section.document_id = (*doc).into();
            s.sections.push(section);
        }
        s
    }

    fn ids(s: &DocumentStructure) -> Vec<&str> {
        s.sections.iter().map(|x| x.id.as_str()).collect()
    }

    #[test]
    fn canonical_order() {
        let mut s = structure(&[
            ("apply", "How to Apply", "main"),
            ("appendices", "Appendices", "main"),
            ("body", "Market", "main"),
            ("cv", "CVs", "annex"),
            ("references", "References", "main"),
            ("exec", "Executive Summary", "main"),
            ("ancillary", "Table of Contents", "main"),
            ("metadata", "Title Page", "main"),
        ]);

        order_sections(&mut s);
        assert_eq!(
            ids(&s),
            vec!["metadata", "ancillary", "exec", "body", "references", "appendices", "apply", "cv"]
        );
    }

    #[test]
    fn must_be_last_beats_should_be_first() {
        let mut s = structure(&[
            ("intro-form", "Introduction to Application Form", "main"),
            ("intro", "Introduction", "main"),
            ("body", "Team", "main"),
        ]);
        order_sections(&mut s);
        assert_eq!(ids(&s), vec!["intro", "body", "intro-form"]);
    }

    #[test]
    fn middle_keeps_relative_order() {
        let mut s = structure(&[
            ("c", "Gamma", "main"),
            ("a", "Alpha", "main"),
            ("b", "Beta", "main"),
        ]);
        order_sections(&mut s);
        assert_eq!(ids(&s), vec!["c", "a", "b"]);
    }
}
