//! Structure builder: one `DocumentStructure` from any input kind.
//!
//! Every path builds a skeleton, then runs the same passes in a fixed order:
//! mapping, canonicalization, type enforcement, ordering.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use docstruct_shared::{
    ANCILLARY_SECTION_ID, APPENDICES_SECTION_ID, BuildSource, DetectionMap, DetectionSource,
    Document, DocumentStructure, EngineConfig, FundingProgram, METADATA_SECTION_ID,
    ParsedDocumentData, REFERENCES_SECTION_ID, RenderingRules, Section, StructureSource,
    TemplateSource, ThresholdsConfig, file_stem,
};

use crate::program::MAIN_DOCUMENT_ID;
use crate::{canonical, mapper, ordering, overlay, program, template};

/// Confidence assumed for an upload whose parser reported none.
const DEFAULT_UPLOAD_CONFIDENCE: u8 = 70;

/// Knobs for [`build_document_structure`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Run the special-section canonicalizer.
    pub include_special_sections: bool,
    /// Run the section orderer.
    pub apply_ordering: bool,
    /// Canonicalizer and rendering gates.
    pub thresholds: ThresholdsConfig,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            include_special_sections: true,
            apply_ordering: true,
            thresholds: ThresholdsConfig::default(),
        }
    }
}

impl From<&EngineConfig> for BuildOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            thresholds: config.thresholds.clone(),
            ..Self::default()
        }
    }
}

/// Build a fresh structure from `source`.
///
/// `detection` overrides any detection map carried by a parsed document.
/// Never fails: every input converges to a structure with at least one
/// document and no dangling section references.
#[instrument(skip_all, fields(kind = source_kind(source)))]
pub fn build_document_structure(
    source: &BuildSource,
    detection: Option<&DetectionMap>,
    options: &BuildOptions,
) -> DocumentStructure {
    let structure = match source {
        BuildSource::Program(program) => build_from_program(program, detection, options),
        BuildSource::Document(data) => build_from_document(data, detection, options),
        BuildSource::Overlay { existing, program } => {
            build_overlay(existing, program, detection, options)
        }
        BuildSource::Template(template) => build_from_template(template, detection, options),
    };

    info!(
        documents = structure.documents.len(),
        sections = structure.sections.len(),
        warnings = structure.warnings.len(),
        confidence = structure.confidence_score,
        "document structure built"
    );
    structure
}

fn source_kind(source: &BuildSource) -> &'static str {
    match source {
        BuildSource::Program(_) => "program",
        BuildSource::Document(_) => "document",
        BuildSource::Overlay { .. } => "overlay",
        BuildSource::Template(_) => "template",
    }
}

fn build_from_program(
    program: &FundingProgram,
    detection: Option<&DetectionMap>,
    options: &BuildOptions,
) -> DocumentStructure {
    let empty = DetectionMap::new();
    let detection = detection.unwrap_or(&empty);

    let mut structure = program::generate_program_structure(program);
    structure.rendering_rules = rendering_rules(detection, options.thresholds.rendering);

    mapper::map_sections_to_documents(&mut structure);
    if !program.application_requirements.documents.is_empty() {
        program::add_placeholder_sections(&mut structure);
    }

    finish(
        &mut structure,
        detection,
        options.thresholds.program,
        DetectionSource::Program,
        options,
    );
    structure
}

fn build_from_document(
    data: &ParsedDocumentData,
    detection: Option<&DetectionMap>,
    options: &BuildOptions,
) -> DocumentStructure {
    let empty = DetectionMap::new();
    let detection = detection.or(data.detection.as_ref()).unwrap_or(&empty);
    let partial = &data.structure;

    let mut structure = DocumentStructure::empty(StructureSource::Document);
    structure.documents = partial.documents.clone();
    structure.requirements = partial.requirements.clone();
    structure.warnings = partial.warnings.clone();
    structure.confidence_score = partial
        .confidence_score
        .unwrap_or(DEFAULT_UPLOAD_CONFIDENCE)
        .min(100);
    structure.rendering_rules = rendering_rules(detection, options.thresholds.rendering);

    if structure.documents.is_empty() {
        debug!("upload carries no documents, creating main document");
        structure.documents.push(Document {
            id: MAIN_DOCUMENT_ID.into(),
            name: file_stem(&data.metadata.file_name),
            purpose: "Primary document".into(),
            required: true,
            doc_type: Some("core".into()),
        });
    }

    adopt_sections(&mut structure, partial.sections.iter().cloned());

    mapper::map_sections_to_documents(&mut structure);
    finish(
        &mut structure,
        detection,
        options.thresholds.upload,
        DetectionSource::Upload,
        options,
    );
    structure
}

/// Program sections merged into an earlier structure. The overlay result
/// goes through the program-path passes.
fn build_overlay(
    existing: &DocumentStructure,
    program: &FundingProgram,
    detection: Option<&DetectionMap>,
    options: &BuildOptions,
) -> DocumentStructure {
    let empty = DetectionMap::new();
    let mut structure = overlay::overlay_program(existing, program);
    if let Some(detection) = detection {
        structure.rendering_rules = rendering_rules(detection, options.thresholds.rendering);
    }

    let sections = std::mem::take(&mut structure.sections);
    adopt_sections(&mut structure, sections);

    mapper::map_sections_to_documents(&mut structure);
    finish(
        &mut structure,
        detection.unwrap_or(&empty),
        options.thresholds.program,
        DetectionSource::Program,
        options,
    );
    structure
}

fn build_from_template(
    template: &TemplateSource,
    detection: Option<&DetectionMap>,
    options: &BuildOptions,
) -> DocumentStructure {
    let empty = DetectionMap::new();
    let detection = detection.unwrap_or(&empty);

    let mut structure = template::template_structure(template);
    structure.rendering_rules = rendering_rules(detection, options.thresholds.rendering);

    let sections = std::mem::take(&mut structure.sections);
    adopt_sections(&mut structure, sections);

    finish(
        &mut structure,
        detection,
        options.thresholds.program,
        DetectionSource::Program,
        options,
    );
    structure
}

/// Push `sections` into `structure`. Duplicate IDs are dropped and sections
/// pointing at an unknown document are un-assigned, each with a warning.
fn adopt_sections(structure: &mut DocumentStructure, sections: impl IntoIterator<Item = Section>) {
    let known: HashSet<String> = structure.documents.iter().map(|d| d.id.clone()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    for mut section in sections {
        if !seen.insert(section.id.clone()) {
            warn!(id = %section.id, "dropping duplicate section");
            structure
                .warnings
                .push(format!("Duplicate section '{}' was dropped", section.id));
            continue;
        }
        if section.is_assigned() && !known.contains(&section.document_id) {
            warn!(id = %section.id, document = %section.document_id, "dangling document reference");
            structure.warnings.push(format!(
                "Section '{}' referenced unknown document '{}' and was reassigned",
                section.title, section.document_id
            ));
            section.document_id.clear();
        }
        structure.sections.push(section);
    }
}

/// Canonicalize, enforce canonical types, and order.
fn finish(
    structure: &mut DocumentStructure,
    detection: &DetectionMap,
    threshold: f64,
    source: DetectionSource,
    options: &BuildOptions,
) {
    if options.include_special_sections {
        canonical::apply_special_sections(structure, detection, threshold, source);
    }
    canonical::enforce_canonical_types(structure);
    if options.apply_ordering {
        ordering::order_sections(structure);
    }
}

/// Switch each rendering rule on when its signal is confident enough.
pub fn rendering_rules(detection: &DetectionMap, threshold: f64) -> RenderingRules {
    let mut rules = RenderingRules::default();
    rules.title_page.enabled = detection.confidence(METADATA_SECTION_ID) > threshold;
    rules.table_of_contents.enabled = detection.confidence(ANCILLARY_SECTION_ID) > threshold;
    rules.references.enabled = detection.confidence(REFERENCES_SECTION_ID) > threshold;
    rules.appendices.enabled = detection.confidence(APPENDICES_SECTION_ID) > threshold;
    if rules.title_page.enabled {
        rules.title_page.fields = vec!["title".into(), "subtitle".into(), "date".into()];
    }
    rules
}
