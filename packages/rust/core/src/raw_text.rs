//! Raw-text entry point: uploaded text straight to a finished structure.

use tracing::{instrument, warn};

use docstruct_detection::detect_document_structure;
use docstruct_shared::{
    BuildSource, Document, DocumentStructure, EngineConfig, IdGenerator, ParsedDocumentData,
    ParsedDocumentMetadata, PartialStructure, file_stem,
};

use crate::builder::{BuildOptions, build_document_structure};
use crate::splitter::{SplitStrategy, extract_sections};

pub const UPLOAD_DOCUMENT_PURPOSE: &str = "Main document from template upload";

/// Split `content`, detect its structure, and run the document path of the
/// builder.
///
/// Without `base_id` the document ID is drawn from `ids` as well.
#[instrument(skip_all, fields(file = file_name, len = content.len()))]
pub fn raw_text_to_sections(
    content: &str,
    file_name: &str,
    base_id: Option<&str>,
    ids: &mut dyn IdGenerator,
    config: &EngineConfig,
) -> DocumentStructure {
    let outcome = extract_sections(content, file_name, ids, config);
    let base_id = base_id.map_or_else(|| ids.next_id(), str::to_string);
    let document_id = format!("doc-{base_id}");

    let sections = outcome
        .sections
        .into_iter()
        .map(|mut section| {
            section.document_id = document_id.clone();
            section
        })
        .collect::<Vec<_>>();

    let mut warnings = Vec::new();
    if let Some(message) = fallback_warning(outcome.strategy, sections.len()) {
        warn!(strategy = outcome.strategy.as_str(), "{message}");
        warnings.push(message);
    }

    let parsed = ParsedDocumentData {
        structure: PartialStructure {
            documents: vec![Document {
                id: document_id,
                name: file_stem(file_name),
                purpose: UPLOAD_DOCUMENT_PURPOSE.into(),
                required: true,
                doc_type: None,
            }],
            sections,
            requirements: Vec::new(),
            warnings,
            confidence_score: Some(outcome.strategy.confidence_score()),
        },
        metadata: ParsedDocumentMetadata {
            file_name: file_name.to_string(),
        },
        detection: Some(detect_document_structure(content, &config.chunking)),
    };

    build_document_structure(
        &BuildSource::Document(parsed),
        None,
        &BuildOptions::from(config),
    )
}

fn fallback_warning(strategy: SplitStrategy, count: usize) -> Option<String> {
    let message = match strategy {
        SplitStrategy::TableOfContents | SplitStrategy::HeadingScan => return None,
        SplitStrategy::NumberedHeadings => "No headings detected, split on numbered lines".into(),
        SplitStrategy::KeywordAnchors => "No headings detected, split on keyword anchors".into(),
        SplitStrategy::SingleSection => "No sections detected, using fallback chunk".into(),
        SplitStrategy::SizeChunks => {
            format!("No sections detected, split text into {count} fallback chunks")
        }
    };
    Some(message)
}
