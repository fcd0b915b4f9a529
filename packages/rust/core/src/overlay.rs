//! Merging a funding program into a structure built earlier.

use tracing::{debug, info, instrument};

use docstruct_shared::{
    DocumentStructure, FundingProgram, SectionType, StructureMetadata, StructureSource, slug,
};

use crate::program;

/// ID prefix of sections added for declared sections the structure lacks.
pub const MISSING_SECTION_PREFIX: &str = "sec_missing_";

/// Overlay `program` onto a copy of `existing`.
///
/// A section whose trimmed title matches a declared section case-insensitively
/// becomes program-critical and picks up the declared `required` flag.
/// Every declared section without a match is appended unassigned as
/// `sec_missing_<slug>`. Program requirements and validation rules are merged
/// by ID, and the metadata is stamped with the program.
#[instrument(skip_all, fields(program = %program.id))]
pub fn overlay_program(existing: &DocumentStructure, program: &FundingProgram) -> DocumentStructure {
    let mut structure = existing.clone();
    structure.metadata = StructureMetadata {
        program_id: Some(program.id.clone()),
        ..StructureMetadata::now(StructureSource::Program)
    };
    if structure.documents.is_empty() {
        structure.documents.push(program::main_document(program));
    }

    let mut added = 0;
    for (i, declared) in program.application_requirements.sections.iter().enumerate() {
        let wanted = normalize(&declared.title);
        let matched = structure
            .sections
            .iter_mut()
            .find(|s| normalize(&s.title) == wanted);

        if let Some(section) = matched {
            section.program_critical = true;
            if declared.required && !section.required {
                section.required = true;
                if section.section_type == SectionType::Normal {
                    section.section_type = SectionType::Required;
                }
            }
            continue;
        }

        let base = format!("{MISSING_SECTION_PREFIX}{}", slug(&declared.title));
        let section = program::declared_section(i, unique_id(&structure, base), declared);
        debug!(id = %section.id, title = %section.title, "missing program section added");
        structure
            .ai_guidance
            .push(program::section_guidance(&section, &program.name));
        structure.sections.push(section);
        added += 1;
    }

    merge_by_id(
        &mut structure.requirements,
        program::requirements(program),
        |r| r.id.as_str(),
    );
    merge_by_id(
        &mut structure.validation_rules,
        program::validation_rules(program),
        |r| r.id.as_str(),
    );

    info!(added, "program overlaid");
    structure
}

fn normalize(title: &str) -> String {
    title.trim().to_lowercase()
}

/// `base`, or `base_<n>` for the first free `n` from 2.
fn unique_id(structure: &DocumentStructure, base: String) -> String {
    if !structure.has_section(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let id = format!("{base}_{n}");
        if !structure.has_section(&id) {
            return id;
        }
        n += 1;
    }
}

fn merge_by_id<T>(into: &mut Vec<T>, extra: Vec<T>, id: impl Fn(&T) -> &str) {
    for item in extra {
        if !into.iter().any(|existing| id(existing) == id(&item)) {
            into.push(item);
        }
    }
}
