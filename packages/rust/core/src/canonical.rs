//! Merging detector verdicts into canonical special sections.

use tracing::{debug, instrument};

use docstruct_shared::{
    DetectionMap, DetectionSource, DocumentStructure, Section, SectionDetection, SpecialSectionKind,
};

/// Add a canonical section for every confidently detected special kind.
///
/// A kind is added only when its verdict is `found`, at least `threshold`
/// confident, and no section with its canonical ID exists yet. Existing
/// sections are never modified. Returns the number of sections added.
#[instrument(skip_all, fields(threshold = threshold, source = ?source))]
pub fn apply_special_sections(
    structure: &mut DocumentStructure,
    detection: &DetectionMap,
    threshold: f64,
    source: DetectionSource,
) -> usize {
    let owner = structure
        .primary_document()
        .map(|d| d.id.clone())
        .unwrap_or_default();

    let mut added = 0;
    for kind in SpecialSectionKind::ALL {
        let Some(result) = detection.kind(kind) else {
            continue;
        };
        if !result.passes(threshold) || structure.has_section(kind.id()) {
            continue;
        }

        let mut section = Section::new(kind.id(), kind.title());
        section.document_id = owner.clone();
        section.section_type = kind.section_type();
        section.required = kind.is_required();
        section.detection = Some(SectionDetection {
            source,
            confidence: result.confidence,
            payload: result.content.clone(),
        });

        debug!(id = kind.id(), confidence = result.confidence, "canonical section added");
        structure.sections.push(section);
        added += 1;
    }

    added
}

/// Force the canonical `type` onto every section that carries a canonical ID.
pub fn enforce_canonical_types(structure: &mut DocumentStructure) {
    for section in &mut structure.sections {
        if let Some(kind) = SpecialSectionKind::from_id(&section.id) {
            section.section_type = kind.section_type();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstruct_shared::{
        DetectionPayload, DetectionResult, Document, SectionType, StructureSource,
        REFERENCES_SECTION_ID,
    };

    fn structure() -> DocumentStructure {
        let mut s = DocumentStructure::empty(StructureSource::Document);
        s.documents.push(Document {
            id: "main".into(),
            name: "Plan".into(),
            purpose: String::new(),
            required: true,
            doc_type: None,
        });
        s
    }

    fn map(entries: &[(SpecialSectionKind, f64)]) -> DetectionMap {
        let mut m = DetectionMap::new();
        for (kind, confidence) in entries {
            m.insert(kind.id(), DetectionResult::found(*confidence, DetectionPayload::References));
        }
        m
    }

    #[test]
    fn adds_confident_sections_with_canonical_shape() {
        let mut s = structure();
        let detection = map(&[
            (SpecialSectionKind::TitlePage, 0.8),
            (SpecialSectionKind::References, 0.85),
        ]);

        let added = apply_special_sections(&mut s, &detection, 0.5, DetectionSource::Upload);
        assert_eq!(added, 2);

        let title = &s.sections[0];
        assert_eq!(title.id, "metadata");
        assert_eq!(title.section_type, SectionType::Metadata);
        assert!(title.required);
        assert_eq!(title.document_id, "main");

        let refs = &s.sections[1];
        assert_eq!(refs.section_type, SectionType::References);
        assert!(!refs.required);
        let detection = refs.detection.as_ref().expect("detection attached");
        assert_eq!(detection.source, DetectionSource::Upload);
        assert_eq!(detection.confidence, 0.85);
    }

    #[test]
    fn below_threshold_is_ignored() {
        let mut s = structure();
        let detection = map(&[(SpecialSectionKind::References, 0.4)]);
        assert_eq!(apply_special_sections(&mut s, &detection, 0.5, DetectionSource::Upload), 0);
        assert_eq!(apply_special_sections(&mut s, &detection, 0.6, DetectionSource::Program), 0);
        assert!(s.sections.is_empty());
    }

    #[test]
    fn existing_section_is_not_overwritten() {
        let mut s = structure();
        let mut authored = Section::new(REFERENCES_SECTION_ID, "My Sources");
        authored.document_id = "main".into();
        authored.section_type = SectionType::References;
        s.sections.push(authored.clone());

        let detection = map(&[(SpecialSectionKind::References, 0.9)]);
        apply_special_sections(&mut s, &detection, 0.5, DetectionSource::Upload);
        apply_special_sections(&mut s, &detection, 0.5, DetectionSource::Upload);

        assert_eq!(s.sections, vec![authored]);
    }

    #[test]
    fn enforce_types_fixes_canonical_ids_only() {
        let mut s = structure();
        let mut wrong = Section::new("ancillary", "Contents");
        wrong.document_id = "main".into();
        s.sections.push(wrong);
        s.sections.push(Section::new("sec-1", "Body"));

        enforce_canonical_types(&mut s);
        assert_eq!(s.sections[0].section_type, SectionType::Ancillary);
        assert_eq!(s.sections[1].section_type, SectionType::Normal);
    }
}
