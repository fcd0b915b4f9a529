//! Funding-program requirements to an initial structure skeleton.
//!
//! Sections come out unassigned; the mapper places them afterwards.

use tracing::{debug, instrument};

use docstruct_shared::{
    AiGuidance, Document, DocumentStructure, FundingProgram, ProgramDocument, ProgramSection,
    RawSubsection, Requirement, RequirementScope, Section, SectionType, Severity, StructureSource,
    ValidationRule, slug,
};

/// ID of the document created when the input declares none.
pub const MAIN_DOCUMENT_ID: &str = "main_document";

pub const NON_REUSABLE_WARNING: &str = "Some documents cannot be reused for other applications";

/// Build the program skeleton: documents, unassigned sections,
/// requirements, validation rules, AI guidance, warnings, and confidence.
#[instrument(skip_all, fields(program = %program.id))]
pub fn generate_program_structure(program: &FundingProgram) -> DocumentStructure {
    let reqs = &program.application_requirements;
    let mut structure = DocumentStructure::empty(StructureSource::Program);
    structure.metadata.program_id = Some(program.id.clone());

    structure.documents = if reqs.documents.is_empty() {
        vec![main_document(program)]
    } else {
        reqs.documents
            .iter()
            .enumerate()
            .map(|(i, doc)| program_document(i, doc, &program.name))
            .collect()
    };

    structure.sections = reqs
        .sections
        .iter()
        .enumerate()
        .map(|(i, declared)| {
            declared_section(i, format!("sec_{i}_{}", slug(&declared.title)), declared)
        })
        .collect();

    structure.requirements = requirements(program);
    structure.validation_rules = validation_rules(program);
    structure.ai_guidance = structure
        .sections
        .iter()
        .map(|s| section_guidance(s, &program.name))
        .collect();

    if reqs.documents.iter().any(|d| !d.reusable) {
        structure.warnings.push(NON_REUSABLE_WARNING.into());
    }

    structure.confidence_score = match &program.analysis {
        Some(analysis) => (analysis.confidence.clamp(0.0, 1.0) * 100.0).round() as u8,
        None if !reqs.documents.is_empty() && !reqs.sections.is_empty() => 90,
        None => 60,
    };

    debug!(
        documents = structure.documents.len(),
        sections = structure.sections.len(),
        requirements = structure.requirements.len(),
        "program skeleton generated"
    );
    structure
}

/// The single document used when a program declares none.
pub(crate) fn main_document(program: &FundingProgram) -> Document {
    Document {
        id: MAIN_DOCUMENT_ID.into(),
        name: format!("{} Application", program.name),
        purpose: format!("Main document for {}", program.name),
        required: true,
        doc_type: None,
    }
}

/// An unassigned, program-critical section for the `index`-th declared section.
pub(crate) fn declared_section(index: usize, id: String, declared: &ProgramSection) -> Section {
    let mut section = Section::new(id, declared.title.clone());
    section.section_type = if declared.required {
        SectionType::Required
    } else {
        SectionType::Optional
    };
    section.required = declared.required;
    section.program_critical = true;
    section.raw_subsections = declared
        .subsections
        .iter()
        .enumerate()
        .map(|(j, sub)| RawSubsection {
            id: format!("subsec_{index}_{j}_{}", slug(&sub.title)),
            title: sub.title.clone(),
            raw_text: String::new(),
        })
        .collect();
    section
}

fn program_document(index: usize, doc: &ProgramDocument, program_name: &str) -> Document {
    let purpose = doc
        .purpose
        .clone()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| format!("{} required for {program_name}", doc.document_name));

    Document {
        id: format!("doc_{index}_{}", slug(&doc.document_name)),
        name: doc.document_name.clone(),
        purpose,
        required: doc.required,
        doc_type: Some(doc.format.clone()),
    }
}

pub(crate) fn requirements(program: &FundingProgram) -> Vec<Requirement> {
    let reqs = &program.application_requirements;

    let financial = reqs
        .financial_requirements
        .iter()
        .enumerate()
        .map(|(i, fr)| Requirement {
            id: format!("req_financial_{i}"),
            scope: RequirementScope::Section,
            category: "financial".into(),
            severity: Severity::Major,
            rule: format!("Must include {} statement", fr.statement),
            target: fr.statement.clone(),
            evidence_type: "financial_document".into(),
        });

    let documents = reqs
        .documents
        .iter()
        .filter(|d| d.required)
        .enumerate()
        .map(|(i, doc)| Requirement {
            id: format!("req_doc_{i}"),
            scope: RequirementScope::Document,
            category: "formatting".into(),
            severity: Severity::Blocker,
            rule: if doc.authority.is_empty() {
                format!("Document must be in {} format", doc.format)
            } else {
                format!("Document must be in {} format from {}", doc.format, doc.authority)
            },
            target: doc.document_name.clone(),
            evidence_type: "document_submission".into(),
        });

    let program_level = program
        .requirements
        .iter()
        .enumerate()
        .map(|(i, req)| Requirement {
            id: format!("req_program_{i}"),
            scope: RequirementScope::Section,
            category: "general".into(),
            severity: Severity::Major,
            rule: format!("Must address {req} requirement"),
            target: req.clone(),
            evidence_type: "content".into(),
        });

    financial.chain(documents).chain(program_level).collect()
}

pub(crate) fn validation_rules(program: &FundingProgram) -> Vec<ValidationRule> {
    let reqs = &program.application_requirements;

    let presence = reqs
        .documents
        .iter()
        .filter(|d| d.required)
        .enumerate()
        .map(|(i, doc)| ValidationRule {
            id: format!("val_doc_presence_{i}"),
            rule_type: "presence".into(),
            scope: doc.document_name.clone(),
            error_message: format!("{} is required and must be submitted", doc.document_name),
        });

    let financial = reqs
        .financial_requirements
        .iter()
        .enumerate()
        .map(|(i, fr)| ValidationRule {
            id: format!("val_financial_{i}"),
            rule_type: "presence".into(),
            scope: fr.statement.clone(),
            error_message: format!(
                "{} statement is required for financial evaluation",
                fr.statement
            ),
        });

    presence.chain(financial).collect()
}

pub(crate) fn section_guidance(section: &Section, program_name: &str) -> AiGuidance {
    AiGuidance {
        section_id: section.id.clone(),
        prompt: format!(
            "Write detailed content for {} in the context of {program_name}",
            section.title
        ),
        checklist: vec![
            format!("Address {} requirements", section.title),
            "Include relevant details".into(),
            "Follow program guidelines".into(),
        ],
        examples: Vec::new(),
    }
}

/// Give every document that owns no section an `Introduction to <doc>`
/// placeholder. Run after mapping. Returns the number of placeholders added.
pub fn add_placeholder_sections(structure: &mut DocumentStructure) -> usize {
    let empty: Vec<(String, String)> = structure
        .documents
        .iter()
        .filter(|doc| structure.sections_of(&doc.id).next().is_none())
        .map(|doc| (doc.id.clone(), doc.name.clone()))
        .collect();

    for (doc_id, name) in &empty {
        let mut section = Section::new(
            format!("placeholder_{doc_id}_intro"),
            format!("Introduction to {name}"),
        );
        section.document_id = doc_id.clone();
        section.section_type = SectionType::Optional;

        structure.ai_guidance.push(AiGuidance {
            section_id: section.id.clone(),
            prompt: format!("Provide introductory content for the {name} document"),
            checklist: vec![
                format!("Introduce the purpose of {name}"),
                "Outline key considerations for this document".into(),
            ],
            examples: Vec::new(),
        });
        structure.sections.push(section);
    }

    if !empty.is_empty() {
        debug!(count = empty.len(), "placeholder sections added");
    }
    empty.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstruct_shared::{
        ApplicationRequirements, FinancialRequirement, ProgramAnalysis, ProgramSection,
        ProgramSubsection,
    };

    fn declared_doc(name: &str, required: bool, reusable: bool) -> ProgramDocument {
        ProgramDocument {
            document_name: name.into(),
            required,
            purpose: None,
            format: "pdf".into(),
            authority: String::new(),
            reusable,
        }
    }

    fn program() -> FundingProgram {
        FundingProgram {
            id: "aws-seed".into(),
            name: "Seed Grant".into(),
            funding_types: vec!["grant".into()],
            application_requirements: ApplicationRequirements {
                documents: vec![
                    declared_doc("Business Plan", true, true),
                    declared_doc("Financial Statements", true, false),
                ],
                sections: vec![
                    ProgramSection {
                        title: "Market Analysis".into(),
                        required: true,
                        subsections: vec![ProgramSubsection {
                            title: "Target Customers".into(),
                        }],
                    },
                    ProgramSection {
                        title: "Team".into(),
                        required: false,
                        subsections: Vec::new(),
                    },
                ],
                financial_requirements: vec![FinancialRequirement {
                    statement: "balance sheet".into(),
                    description: String::new(),
                }],
            },
            requirements: vec!["innovation".into()],
            analysis: None,
        }
    }

    #[test]
    fn documents_and_sections_get_stable_ids() {
        let s = generate_program_structure(&program());
        let doc_ids: Vec<&str> = s.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(doc_ids, vec!["doc_0_business_plan", "doc_1_financial_statements"]);
        assert_eq!(s.documents[0].purpose, "Business Plan required for Seed Grant");

        assert_eq!(s.sections[0].id, "sec_0_market_analysis");
        assert_eq!(s.sections[0].section_type, SectionType::Required);
        assert_eq!(s.sections[1].section_type, SectionType::Optional);
        assert!(s.sections.iter().all(|x| x.program_critical && !x.is_assigned()));
        assert_eq!(s.sections[0].raw_subsections[0].id, "subsec_0_0_target_customers");
        assert_eq!(s.metadata.program_id.as_deref(), Some("aws-seed"));
    }

    #[test]
    fn requirements_rules_and_guidance() {
        let s = generate_program_structure(&program());
        let req_ids: Vec<&str> = s.requirements.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            req_ids,
            vec!["req_financial_0", "req_doc_0", "req_doc_1", "req_program_0"]
        );
        let val_ids: Vec<&str> = s.validation_rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(val_ids, vec!["val_doc_presence_0", "val_doc_presence_1", "val_financial_0"]);

        assert_eq!(s.ai_guidance.len(), 2);
        assert_eq!(
            s.ai_guidance[0].prompt,
            "Write detailed content for Market Analysis in the context of Seed Grant"
        );
        assert_eq!(s.warnings, vec![NON_REUSABLE_WARNING.to_string()]);
        assert_eq!(s.confidence_score, 90);
    }

    #[test]
    fn empty_program_gets_main_document() {
        let mut p = program();
        p.application_requirements = ApplicationRequirements::default();
        let s = generate_program_structure(&p);
        assert_eq!(s.documents.len(), 1);
        assert_eq!(s.documents[0].id, MAIN_DOCUMENT_ID);
        assert_eq!(s.documents[0].name, "Seed Grant Application");
        assert_eq!(s.confidence_score, 60);
    }

    #[test]
    fn analysis_confidence_wins() {
        let mut p = program();
        p.analysis = Some(ProgramAnalysis { confidence: 0.734 });
        assert_eq!(generate_program_structure(&p).confidence_score, 73);
    }

    #[test]
    fn placeholders_fill_empty_documents() {
        let mut s = generate_program_structure(&program());
        for section in &mut s.sections {
            section.document_id = "doc_0_business_plan".into();
        }
        assert_eq!(add_placeholder_sections(&mut s), 1);

        let placeholder = s.sections.last().expect("placeholder");
        assert_eq!(placeholder.id, "placeholder_doc_1_financial_statements_intro");
        assert_eq!(placeholder.title, "Introduction to Financial Statements");
        assert_eq!(placeholder.document_id, "doc_1_financial_statements");
        assert_eq!(add_placeholder_sections(&mut s), 0);
    }
}
