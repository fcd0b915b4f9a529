//! Heuristic structure detection for docstruct.
//!
//! Everything in this crate is a pure function of its input text. Detectors
//! never fail; a detector with nothing to report returns
//! [`DetectionResult::not_found`].

pub mod chunking;
pub mod headings;
pub mod special;
pub mod template;
pub mod toc;

use tracing::{debug, instrument};

use docstruct_shared::{
    ChunkingConfig, DetectionMap, DetectionResult, FALLBACK_CHUNKS_SIGNAL,
    NUMBERED_HEADINGS_SIGNAL, STYLING_HEADINGS_SIGNAL, SpecialSectionKind, TEMPLATE_HINT_SIGNAL,
};

pub use chunking::{fallback_chunks, generate_fallback_chunks, word_count};
pub use headings::{detect_numbered_headings, detect_styling_headings, is_styled_heading};
pub use special::{DetectorVariant, detect, detect_all};
pub use template::detect_template_hint;
pub use toc::detect_toc;

/// Single structure pass over uploaded text.
///
/// Runs the heading detectors, all ten special-section detectors, and the
/// template hint. Fallback chunks are added only when neither heading signal
/// fired.
#[instrument(skip_all, fields(len = text.len()))]
pub fn detect_document_structure(text: &str, chunking: &ChunkingConfig) -> DetectionMap {
    let mut map = DetectionMap::new();

    let numbered = detect_numbered_headings(text);
    let styled = detect_styling_headings(text);
    let has_headings = numbered.found || styled.found;
    map.insert(NUMBERED_HEADINGS_SIGNAL, numbered);
    map.insert(STYLING_HEADINGS_SIGNAL, styled);

    insert_special(&mut map, detect_all(text, DetectorVariant::Text));
    map.insert(TEMPLATE_HINT_SIGNAL, detect_template_hint(text));

    if !has_headings {
        debug!("no heading signal, adding fallback chunks");
        map.insert(FALLBACK_CHUNKS_SIGNAL, generate_fallback_chunks(text, chunking));
    }

    let found = map.iter().filter(|(_, r)| r.found).count();
    debug!(signals = map.len(), found, "detection pass complete");
    map
}

/// The ten special-section detectors over plain text.
pub fn detect_special_sections(text: &str, variant: DetectorVariant) -> DetectionMap {
    let mut map = DetectionMap::new();
    insert_special(&mut map, detect_all(text, variant));
    map
}

/// The ten special-section detectors over a structured content blob.
///
/// Strings are scored as-is; any other value is scored on its compact JSON
/// rendering.
pub fn detect_special_sections_in_value(value: &serde_json::Value) -> DetectionMap {
    match value {
        serde_json::Value::String(text) => detect_special_sections(text, DetectorVariant::Structured),
        other => detect_special_sections(&other.to_string(), DetectorVariant::Structured),
    }
}

fn insert_special(map: &mut DetectionMap, results: Vec<(SpecialSectionKind, DetectionResult)>) {
    for (kind, result) in results {
        map.insert(kind.id(), result);
    }
}
