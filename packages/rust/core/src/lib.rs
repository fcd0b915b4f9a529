//! Conversion engine for docstruct.
//!
//! Turns a funding program or an uploaded document into a canonical
//! [`DocumentStructure`](docstruct_shared::DocumentStructure). The passes
//! are separate modules so callers can run them individually:
//!
//! - [`splitter`] cuts raw text into sections
//! - [`program`] builds the skeleton of a funding program
//! - [`mapper`] assigns sections to documents
//! - [`canonical`] inserts and normalizes special sections
//! - [`ordering`] places sections within the primary document
//! - [`overlay`] merges a program into an existing structure
//! - [`template`] turns a fixed section list into a skeleton
//! - [`builder`] and [`raw_text`] run the whole chain

pub mod builder;
pub mod canonical;
pub mod mapper;
pub mod ordering;
pub mod overlay;
pub mod program;
pub mod raw_text;
pub mod repository;
pub mod splitter;
pub mod template;

pub use builder::{BuildOptions, build_document_structure, rendering_rules};
pub use canonical::{apply_special_sections, enforce_canonical_types};
pub use mapper::{best_category, map_sections_to_documents};
pub use ordering::order_sections;
pub use overlay::overlay_program;
pub use program::{MAIN_DOCUMENT_ID, add_placeholder_sections, generate_program_structure};
pub use raw_text::raw_text_to_sections;
pub use repository::{InMemoryProgramRepository, ProgramRepository};
pub use splitter::{SplitOutcome, SplitStrategy, extract_sections};
pub use template::template_structure;
