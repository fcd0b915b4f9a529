//! Fixed section templates to a single-document skeleton.

use tracing::{debug, instrument};

use docstruct_shared::{
    Document, DocumentStructure, Section, SectionType, StructureSource, TemplateSource, slug,
};

use crate::program::MAIN_DOCUMENT_ID;

/// Confidence of a template skeleton; nothing about it is inferred.
pub const TEMPLATE_CONFIDENCE: u8 = 100;

/// One `main_document` holding every template section in template order.
///
/// Template IDs are kept; a blank one becomes `sec_<i>_<slug>`.
#[instrument(skip_all, fields(product = ?template.product_type, sections = template.sections.len()))]
pub fn template_structure(template: &TemplateSource) -> DocumentStructure {
    let mut structure = DocumentStructure::empty(StructureSource::Template);

    let name = template.document_name.trim();
    structure.documents.push(Document {
        id: MAIN_DOCUMENT_ID.into(),
        name: if name.is_empty() { "Document".into() } else { name.into() },
        purpose: template.product_type.document_purpose().into(),
        required: true,
        doc_type: Some("template".into()),
    });

    structure.sections = template
        .sections
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let id = match entry.id.trim() {
                "" => format!("sec_{i}_{}", slug(&entry.title)),
                id => id.to_string(),
            };
            let mut section = Section::new(id, entry.title.clone());
            section.document_id = MAIN_DOCUMENT_ID.into();
            section.required = entry.required;
            section.section_type = if entry.required {
                SectionType::Required
            } else {
                SectionType::Optional
            };
            section
        })
        .collect();

    structure.confidence_score = TEMPLATE_CONFIDENCE;
    debug!(sections = structure.sections.len(), "template skeleton generated");
    structure
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstruct_shared::{ProductType, TemplateSection};

    fn entry(id: &str, title: &str, required: bool) -> TemplateSection {
        TemplateSection {
            id: id.into(),
            title: title.into(),
            required,
        }
    }

    #[test]
    fn builds_one_main_document() {
        let template = TemplateSource {
            product_type: ProductType::Submission,
            document_name: "Acme Business Plan".into(),
            sections: vec![entry("exec", "Executive Summary", true), entry("", "Market", false)],
        };
        let s = template_structure(&template);

        assert_eq!(s.documents.len(), 1);
        assert_eq!(s.documents[0].purpose, "Business plan document");
        assert_eq!(s.documents[0].doc_type.as_deref(), Some("template"));
        assert_eq!(s.metadata.source, StructureSource::Template);
        assert_eq!(s.confidence_score, 100);

        let ids: Vec<&str> = s.sections.iter().map(|x| x.id.as_str()).collect();
        assert_eq!(ids, vec!["exec", "sec_1_market"]);
        assert_eq!(s.sections[1].section_type, SectionType::Optional);
        assert!(s.sections.iter().all(|x| x.document_id == MAIN_DOCUMENT_ID));
    }

    #[test]
    fn blank_document_name_falls_back() {
        let template = TemplateSource {
            product_type: ProductType::Strategy,
            document_name: "  ".into(),
            sections: Vec::new(),
        };
        let s = template_structure(&template);
        assert_eq!(s.documents[0].name, "Document");
        assert_eq!(s.documents[0].purpose, "Strategy document");
        s.validate().expect("valid structure");
    }
}
