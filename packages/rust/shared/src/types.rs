//! Core domain types for document structures.
//!
//! Everything here serializes to the camelCase JSON contract consumed by the
//! editor, preview, and readiness checks.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DocStructError, Result};

/// Structure format version stamped into every [`StructureMetadata`].
pub const STRUCTURE_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// Canonical IDs
// ---------------------------------------------------------------------------

pub const METADATA_SECTION_ID: &str = "metadata";
pub const ANCILLARY_SECTION_ID: &str = "ancillary";
pub const REFERENCES_SECTION_ID: &str = "references";
pub const APPENDICES_SECTION_ID: &str = "appendices";
pub const TABLES_DATA_SECTION_ID: &str = "tables_data";
pub const FIGURES_IMAGES_SECTION_ID: &str = "figures_images";
pub const EXECUTIVE_SUMMARY_SECTION_ID: &str = "special-section-executive-summary";
pub const GLOSSARY_SECTION_ID: &str = "special-section-glossary";
pub const LEGAL_NOTICES_SECTION_ID: &str = "special-section-legal-notices";
pub const FINANCIALS_SECTION_ID: &str = "special-section-financials";

/// Detection-map keys for non-section signals.
pub const NUMBERED_HEADINGS_SIGNAL: &str = "heading-numbered-patterns";
pub const STYLING_HEADINGS_SIGNAL: &str = "heading-styling-cues";
pub const TEMPLATE_HINT_SIGNAL: &str = "template-document-hint";
pub const FALLBACK_CHUNKS_SIGNAL: &str = "fallback-chunks";

// ---------------------------------------------------------------------------
// SpecialSectionKind
// ---------------------------------------------------------------------------

/// The closed set of special sections the detectors know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialSectionKind {
    TitlePage,
    TableOfContents,
    References,
    Appendices,
    TablesData,
    FiguresImages,
    ExecutiveSummary,
    Glossary,
    LegalNotices,
    Financials,
}

impl SpecialSectionKind {
    /// All kinds in canonicalization order.
    pub const ALL: [SpecialSectionKind; 10] = [
        Self::TitlePage,
        Self::TableOfContents,
        Self::References,
        Self::Appendices,
        Self::TablesData,
        Self::FiguresImages,
        Self::ExecutiveSummary,
        Self::Glossary,
        Self::LegalNotices,
        Self::Financials,
    ];

    /// Canonical section ID (also the detection-map key).
    pub fn id(&self) -> &'static str {
        match self {
            Self::TitlePage => METADATA_SECTION_ID,
            Self::TableOfContents => ANCILLARY_SECTION_ID,
            Self::References => REFERENCES_SECTION_ID,
            Self::Appendices => APPENDICES_SECTION_ID,
            Self::TablesData => TABLES_DATA_SECTION_ID,
            Self::FiguresImages => FIGURES_IMAGES_SECTION_ID,
            Self::ExecutiveSummary => EXECUTIVE_SUMMARY_SECTION_ID,
            Self::Glossary => GLOSSARY_SECTION_ID,
            Self::LegalNotices => LEGAL_NOTICES_SECTION_ID,
            Self::Financials => FINANCIALS_SECTION_ID,
        }
    }

    /// Human-readable title used when the section is synthesized.
    pub fn title(&self) -> &'static str {
        match self {
            Self::TitlePage => "Title Page",
            Self::TableOfContents => "Table of Contents",
            Self::References => "References",
            Self::Appendices => "Appendices",
            Self::TablesData => "Tables and Data",
            Self::FiguresImages => "Figures and Images",
            Self::ExecutiveSummary => "Executive Summary",
            Self::Glossary => "Glossary",
            Self::LegalNotices => "Legal Notices",
            Self::Financials => "Financials",
        }
    }

    /// Section type a section carrying this kind's ID must have.
    pub fn section_type(&self) -> SectionType {
        match self {
            Self::TitlePage => SectionType::Metadata,
            Self::TableOfContents => SectionType::Ancillary,
            Self::References => SectionType::References,
            Self::Appendices => SectionType::Appendices,
            Self::TablesData | Self::FiguresImages => SectionType::Ancillary,
            Self::ExecutiveSummary | Self::Glossary | Self::LegalNotices | Self::Financials => {
                SectionType::Optional
            }
        }
    }

    /// Title page and TOC are structurally mandatory once detected.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::TitlePage | Self::TableOfContents)
    }

    /// Reverse lookup from a canonical section ID.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Confidence reported by every detector that did not fire.
pub const NOT_FOUND_CONFIDENCE: f64 = 0.1;

/// A word-bounded slice of undifferentiated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub title: String,
    pub content: String,
}

/// Kind-specific detail attached to a positive detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectionPayload {
    TitlePage,
    Toc {
        #[serde(default)]
        entries: Vec<String>,
    },
    References,
    Appendices,
    TablesData,
    FiguresImages,
    ExecutiveSummary,
    Glossary,
    LegalNotices,
    Financials,
    NumberedHeadings {
        matches: Vec<String>,
    },
    StylingHeadings {
        matches: Vec<String>,
    },
    DocumentTypeHint {
        document_type: String,
        match_score: u32,
    },
    FallbackChunks {
        chunks: Vec<Chunk>,
    },
}

/// A confidence-scored verdict from one detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub found: bool,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<DetectionPayload>,
}

impl DetectionResult {
    /// Positive verdict. Confidence is clamped into `[0, 1]`.
    pub fn found(confidence: f64, payload: DetectionPayload) -> Self {
        Self {
            found: true,
            confidence: confidence.clamp(0.0, 1.0),
            content: Some(payload),
        }
    }

    /// Negative verdict with residual uncertainty.
    pub fn not_found() -> Self {
        Self {
            found: false,
            confidence: NOT_FOUND_CONFIDENCE,
            content: None,
        }
    }

    /// `found` and at least `threshold` confident.
    pub fn passes(&self, threshold: f64) -> bool {
        self.found && self.confidence >= threshold
    }
}

/// Detection verdicts keyed by canonical signal ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionMap(BTreeMap<String, DetectionResult>);

impl DetectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, result: DetectionResult) {
        self.0.insert(key.into(), result);
    }

    pub fn get(&self, key: &str) -> Option<&DetectionResult> {
        self.0.get(key)
    }

    pub fn kind(&self, kind: SpecialSectionKind) -> Option<&DetectionResult> {
        self.get(kind.id())
    }

    /// Confidence for `key`, or `0.0` when the signal was never evaluated.
    pub fn confidence(&self, key: &str) -> f64 {
        self.get(key).map(|r| r.confidence).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DetectionResult)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Document / Section
// ---------------------------------------------------------------------------

/// A deliverable document within the structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    #[default]
    Normal,
    Metadata,
    References,
    Appendices,
    Ancillary,
    Required,
    Optional,
}

/// Raw text kept alongside a section for the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubsection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub raw_text: String,
}

/// Where a section's detection verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    Upload,
    Program,
}

/// Detection verdict attached to a canonical section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDetection {
    pub source: DetectionSource,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<DetectionPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    /// Owning document. Empty means "not yet assigned".
    #[serde(default)]
    pub document_id: String,
    pub title: String,
    #[serde(default, rename = "type")]
    pub section_type: SectionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub program_critical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<SectionDetection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_subsections: Vec<RawSubsection>,
}

impl Section {
    /// An unassigned `normal` section with no content.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            document_id: String::new(),
            title: title.into(),
            section_type: SectionType::Normal,
            required: false,
            program_critical: false,
            content: None,
            detection: None,
            raw_subsections: Vec::new(),
        }
    }

    pub fn is_assigned(&self) -> bool {
        !self.document_id.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Requirements, validation rules, guidance, rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementScope {
    Section,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Blocker,
    Major,
    Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: String,
    pub scope: RequirementScope,
    pub category: String,
    pub severity: Severity,
    pub rule: String,
    pub target: String,
    pub evidence_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub id: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    pub scope: String,
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGuidance {
    pub section_id: String,
    /// Placeholder until the guidance generator fills it in.
    pub prompt: String,
    #[serde(default)]
    pub checklist: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlePageRule {
    pub enabled: bool,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOfContentsRule {
    pub enabled: bool,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencesRule {
    pub enabled: bool,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendicesRule {
    pub enabled: bool,
    pub max_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderingRules {
    pub title_page: TitlePageRule,
    pub table_of_contents: TableOfContentsRule,
    pub references: ReferencesRule,
    pub appendices: AppendicesRule,
}

impl Default for RenderingRules {
    fn default() -> Self {
        Self {
            title_page: TitlePageRule {
                enabled: false,
                fields: Vec::new(),
            },
            table_of_contents: TableOfContentsRule {
                enabled: false,
                format: "bulleted".into(),
            },
            references: ReferencesRule {
                enabled: false,
                style: "APA".into(),
            },
            appendices: AppendicesRule {
                enabled: false,
                max_count: 10,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentStructure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureSource {
    Program,
    Document,
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureMetadata {
    pub source: StructureSource,
    pub generated_at: DateTime<Utc>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<String>,
}

impl StructureMetadata {
    pub fn now(source: StructureSource) -> Self {
        Self {
            source,
            generated_at: Utc::now(),
            version: STRUCTURE_VERSION.into(),
            program_id: None,
        }
    }
}

/// The canonical aggregate produced by every conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStructure {
    pub documents: Vec<Document>,
    pub sections: Vec<Section>,
    pub requirements: Vec<Requirement>,
    pub validation_rules: Vec<ValidationRule>,
    pub ai_guidance: Vec<AiGuidance>,
    pub rendering_rules: RenderingRules,
    pub conflicts: Vec<String>,
    pub warnings: Vec<String>,
    /// Overall trust, 0–100.
    pub confidence_score: u8,
    pub metadata: StructureMetadata,
}

impl DocumentStructure {
    /// An empty structure stamped with `source` and the current time.
    pub fn empty(source: StructureSource) -> Self {
        Self {
            documents: Vec::new(),
            sections: Vec::new(),
            requirements: Vec::new(),
            validation_rules: Vec::new(),
            ai_guidance: Vec::new(),
            rendering_rules: RenderingRules::default(),
            conflicts: Vec::new(),
            warnings: Vec::new(),
            confidence_score: 0,
            metadata: StructureMetadata::now(source),
        }
    }

    /// The first document, which owns every section nothing else claims.
    pub fn primary_document(&self) -> Option<&Document> {
        self.documents.first()
    }

    pub fn has_document(&self, id: &str) -> bool {
        self.documents.iter().any(|d| d.id == id)
    }

    pub fn has_section(&self, id: &str) -> bool {
        self.sections.iter().any(|s| s.id == id)
    }

    /// Sections owned by `document_id`, in structure order.
    pub fn sections_of<'a>(&'a self, document_id: &'a str) -> impl Iterator<Item = &'a Section> + 'a {
        self.sections
            .iter()
            .filter(move |s| s.document_id == document_id)
    }

    /// Check the structural invariants.
    ///
    /// Violations are programming errors in whatever produced the structure,
    /// so this is meant for tests and for validating externally supplied JSON.
    pub fn validate(&self) -> Result<()> {
        if self.documents.is_empty() {
            return Err(DocStructError::validation("structure has no documents"));
        }

        let doc_ids: HashSet<&str> = self.documents.iter().map(|d| d.id.as_str()).collect();
        let mut seen: HashSet<&str> = HashSet::new();

        for section in &self.sections {
            if !doc_ids.contains(section.document_id.as_str()) {
                return Err(DocStructError::validation(format!(
                    "section '{}' references unknown document '{}'",
                    section.id, section.document_id
                )));
            }
            if !seen.insert(section.id.as_str()) {
                return Err(DocStructError::validation(format!(
                    "duplicate section id '{}'",
                    section.id
                )));
            }
            if let Some(kind) = SpecialSectionKind::from_id(&section.id) {
                if section.section_type != kind.section_type() {
                    return Err(DocStructError::validation(format!(
                        "section '{}' has type {:?}, expected {:?}",
                        section.id,
                        section.section_type,
                        kind.section_type()
                    )));
                }
            }
            if let Some(detection) = &section.detection {
                if !(0.0..=1.0).contains(&detection.confidence) {
                    return Err(DocStructError::validation(format!(
                        "section '{}' detection confidence {} out of range",
                        section.id, detection.confidence
                    )));
                }
            }
        }

        if self.confidence_score > 100 {
            return Err(DocStructError::validation(format!(
                "confidence score {} exceeds 100",
                self.confidence_score
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A document a funding program asks applicants to submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDocument {
    pub document_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub authority: String,
    #[serde(default = "default_true")]
    pub reusable: bool,
}

fn default_format() -> String {
    "pdf".into()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSubsection {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSection {
    pub title: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub subsections: Vec<ProgramSubsection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRequirement {
    /// Statement name, e.g. "balance sheet".
    pub statement: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequirements {
    #[serde(default)]
    pub documents: Vec<ProgramDocument>,
    #[serde(default)]
    pub sections: Vec<ProgramSection>,
    #[serde(default)]
    pub financial_requirements: Vec<FinancialRequirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramAnalysis {
    /// Analyzer trust in the declared requirements, 0–1.
    pub confidence: f64,
}

/// A funding program's declared application requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingProgram {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub funding_types: Vec<String>,
    #[serde(default)]
    pub application_requirements: ApplicationRequirements,
    /// Free-form program-level requirements.
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ProgramAnalysis>,
}

/// The partial structure an upload parser hands over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialStructure {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocumentMetadata {
    #[serde(default)]
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocumentData {
    #[serde(default)]
    pub structure: PartialStructure,
    #[serde(default)]
    pub metadata: ParsedDocumentMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionMap>,
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// What a template-built document is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Submission,
    Strategy,
}

impl ProductType {
    /// Purpose of the main document built from a template of this type.
    pub fn document_purpose(&self) -> &'static str {
        match self {
            Self::Submission => "Business plan document",
            Self::Strategy => "Strategy document",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSection {
    /// Kept as the section ID; a blank one is generated from the title.
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

/// A fixed list of sections for one product type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSource {
    pub product_type: ProductType,
    pub document_name: String,
    #[serde(default)]
    pub sections: Vec<TemplateSection>,
}

/// What a conversion starts from, tagged by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildSource {
    Program(FundingProgram),
    Document(ParsedDocumentData),
    /// Merge a program's declared sections into a structure built earlier.
    Overlay {
        existing: DocumentStructure,
        program: FundingProgram,
    },
    Template(TemplateSource),
}

/// Strip the last extension from a file name; `"Document"` if nothing is left.
pub fn file_stem(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem = match base.rfind('.') {
        Some(idx) => &base[..idx],
        None => base,
    };
    let stem = stem.trim();
    if stem.is_empty() {
        "Document".to_string()
    } else {
        stem.to_string()
    }
}

/// Lower-case, whitespace-to-underscore slug used in generated IDs.
pub fn slug(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}
