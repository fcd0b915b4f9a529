//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use docstruct_core::{
    BuildOptions, InMemoryProgramRepository, ProgramRepository, build_document_structure,
    raw_text_to_sections,
};
use docstruct_detection::{
    DetectorVariant, detect_document_structure, detect_special_sections,
    detect_special_sections_in_value,
};
use docstruct_shared::{
    BuildSource, DocStructError, DocumentStructure, EngineConfig, FundingProgram,
    ParsedDocumentData, TemplateSource, TimestampIdGenerator, file_stem, init_config, load_config,
    load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docstruct: canonical document structures from programs and uploads.
#[derive(Parser)]
#[command(
    name = "docstruct",
    version,
    about = "Build canonical document structures from funding programs and uploaded documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.docstruct/docstruct.toml.
    #[arg(long, global = true, env = "DOCSTRUCT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Split raw text files into sections and build their structures.
    Split {
        /// Plain-text files to convert.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Base ID for the generated document (`doc-<base-id>`).
        #[arg(long)]
        base_id: Option<String>,

        /// Write `<stem>.structure.json` files here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the detection map for a file.
    Detect {
        /// Text file, or a JSON blob with --structured.
        file: PathBuf,

        /// Treat the input as structured content.
        #[arg(long)]
        structured: bool,

        /// Only run the ten special-section detectors.
        #[arg(long)]
        special_only: bool,
    },

    /// Build a structure from a funding program.
    Program {
        /// JSON file holding one program or an array of programs.
        file: PathBuf,

        /// Program ID to build when the file holds several.
        #[arg(long)]
        id: Option<String>,
    },

    /// List or search the programs in a program file.
    Programs {
        /// JSON file holding one program or an array of programs.
        file: PathBuf,

        /// Case-insensitive match on ID, name, or funding type.
        query: Option<String>,
    },

    /// Build a structure from parsed document data.
    Build {
        /// JSON file holding ParsedDocumentData.
        file: PathBuf,

        /// Skip special-section canonicalization.
        #[arg(long)]
        no_special_sections: bool,

        /// Keep sections in input order.
        #[arg(long)]
        no_ordering: bool,
    },

    /// Merge a funding program's sections into an existing structure.
    Overlay {
        /// JSON file holding a DocumentStructure.
        structure: PathBuf,

        /// JSON file holding one program or an array of programs.
        programs: PathBuf,

        /// Program ID to overlay when the file holds several.
        #[arg(long)]
        id: Option<String>,
    },

    /// Build a structure from a section template.
    Template {
        /// JSON file holding a template (productType, documentName, sections).
        file: PathBuf,
    },

    /// Check a structure JSON file against the structural invariants.
    Validate {
        /// JSON file holding a DocumentStructure.
        file: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docstruct=info",
        1 => "docstruct=debug",
        _ => "docstruct=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries the JSON output, so logs go to stderr
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Split {
            files,
            base_id,
            out,
        } => cmd_split(&files, base_id.as_deref(), out.as_deref(), &config),
        Command::Detect {
            file,
            structured,
            special_only,
        } => cmd_detect(&file, structured, special_only, &config),
        Command::Program { file, id } => cmd_program(&file, id.as_deref(), &config),
        Command::Programs { file, query } => cmd_programs(&file, query.as_deref()),
        Command::Build {
            file,
            no_special_sections,
            no_ordering,
        } => cmd_build(&file, !no_special_sections, !no_ordering, &config),
        Command::Overlay {
            structure,
            programs,
            id,
        } => cmd_overlay(&structure, &programs, id.as_deref(), &config),
        Command::Template { file } => cmd_template(&file, &config),
        Command::Validate { file } => cmd_validate(&file),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_split(
    files: &[PathBuf],
    base_id: Option<&str>,
    out: Option<&Path>,
    config: &EngineConfig,
) -> Result<()> {
    if let Some(dir) = out {
        std::fs::create_dir_all(dir).map_err(|e| DocStructError::io(dir, e))?;
    }

    let progress = (files.len() > 1).then(|| split_progress(files.len())).transpose()?;
    let mut ids = TimestampIdGenerator::new();

    for path in files {
        let file_name = path.to_string_lossy();
        if let Some(bar) = &progress {
            bar.set_message(file_name.to_string());
        }

        let text = read_text(path)?;
        let structure = raw_text_to_sections(&text, &file_name, base_id, &mut ids, config);
        if !structure.warnings.is_empty() {
            warn!(file = %file_name, warnings = ?structure.warnings, "structure degraded");
        }

        match out {
            Some(dir) => {
                let target = dir.join(format!("{}.structure.json", file_stem(&file_name)));
                let json = to_json(&structure, config)?;
                std::fs::write(&target, json).map_err(|e| DocStructError::io(&target, e))?;
                info!(
                    file = %file_name,
                    sections = structure.sections.len(),
                    out = %target.display(),
                    "structure written"
                );
            }
            None => print_json(&structure, config)?,
        }

        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    if let Some(bar) = progress {
        bar.finish_with_message("done");
    }
    Ok(())
}

fn split_progress(total: usize) -> Result<ProgressBar> {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

fn cmd_detect(
    path: &Path,
    structured: bool,
    special_only: bool,
    config: &EngineConfig,
) -> Result<()> {
    let text = read_text(path)?;

    let detection = if structured {
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(DocStructError::from)
            .wrap_err_with(|| format!("'{}' is not valid JSON", path.display()))?;
        detect_special_sections_in_value(&value)
    } else if special_only {
        detect_special_sections(&text, DetectorVariant::Text)
    } else {
        detect_document_structure(&text, &config.chunking)
    };

    let found = detection.iter().filter(|(_, r)| r.found).count();
    info!(file = %path.display(), signals = detection.len(), found, "detection complete");
    print_json(&detection, config)
}

fn cmd_program(path: &Path, id: Option<&str>, config: &EngineConfig) -> Result<()> {
    let program = select_program(path, id)?;

    info!(program = %program.id, "building program structure");
    let source = BuildSource::Program(program);
    let structure = build_document_structure(&source, None, &BuildOptions::from(config));
    print_json(&structure, config)
}

/// The program named by `id`, or the only program in the file.
fn select_program(path: &Path, id: Option<&str>) -> Result<FundingProgram> {
    let repo = load_programs(path)?;

    let program = match id {
        Some(id) => repo
            .get(id)
            .ok_or_else(|| DocStructError::not_found(format!("program '{id}'")))?,
        None => match repo.search("").as_slice() {
            [only] => *only,
            [] => return Err(eyre!("'{}' holds no programs", path.display())),
            many => {
                let ids: Vec<&str> = many.iter().map(|p| p.id.as_str()).collect();
                return Err(eyre!(
                    "'{}' holds {} programs, pick one with --id: {}",
                    path.display(),
                    many.len(),
                    ids.join(", ")
                ));
            }
        },
    };
    Ok(program.clone())
}

fn cmd_programs(path: &Path, query: Option<&str>) -> Result<()> {
    let repo = load_programs(path)?;
    let matches = repo.search(query.unwrap_or(""));

    if matches.is_empty() {
        println!("No matching programs.");
        return Ok(());
    }
    for program in matches {
        println!(
            "  {:<24} {}  [{}]",
            program.id,
            program.name,
            program.funding_types.join(", ")
        );
    }
    Ok(())
}

fn cmd_build(
    path: &Path,
    include_special_sections: bool,
    apply_ordering: bool,
    config: &EngineConfig,
) -> Result<()> {
    let data: ParsedDocumentData = read_json(path)?;
    let options = BuildOptions {
        include_special_sections,
        apply_ordering,
        ..BuildOptions::from(config)
    };

    let structure = build_document_structure(&BuildSource::Document(data), None, &options);
    print_json(&structure, config)
}

fn cmd_overlay(
    structure_path: &Path,
    programs_path: &Path,
    id: Option<&str>,
    config: &EngineConfig,
) -> Result<()> {
    let existing: DocumentStructure = read_json(structure_path)?;
    let program = select_program(programs_path, id)?;

    info!(program = %program.id, sections = existing.sections.len(), "overlaying program");
    let source = BuildSource::Overlay { existing, program };
    let structure = build_document_structure(&source, None, &BuildOptions::from(config));
    print_json(&structure, config)
}

fn cmd_template(path: &Path, config: &EngineConfig) -> Result<()> {
    let template: TemplateSource = read_json(path)?;
    let source = BuildSource::Template(template);
    let structure = build_document_structure(&source, None, &BuildOptions::from(config));
    print_json(&structure, config)
}

fn cmd_validate(path: &Path) -> Result<()> {
    let structure: DocumentStructure = read_json(path)?;
    structure
        .validate()
        .wrap_err_with(|| format!("'{}' failed validation", path.display()))?;

    println!(
        "  {} is valid: {} documents, {} sections, confidence {}",
        path.display(),
        structure.documents.len(),
        structure.sections.len(),
        structure.confidence_score
    );
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &EngineConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

fn read_text(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path).map_err(|e| DocStructError::io(path, e))?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path)?;
    let value = serde_json::from_str(&text)
        .map_err(DocStructError::from)
        .wrap_err_with(|| format!("could not decode '{}'", path.display()))?;
    Ok(value)
}

/// A program file holds either one program or an array of them.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ProgramFile {
    Many(Vec<FundingProgram>),
    One(Box<FundingProgram>),
}

fn load_programs(path: &Path) -> Result<InMemoryProgramRepository> {
    let programs = match read_json::<ProgramFile>(path)? {
        ProgramFile::Many(list) => list,
        ProgramFile::One(program) => vec![*program],
    };
    let mut repo = InMemoryProgramRepository::new();
    for program in programs {
        repo.add(program)?;
    }
    Ok(repo)
}

fn to_json<T: Serialize>(value: &T, config: &EngineConfig) -> Result<String> {
    let json = if config.output.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn print_json<T: Serialize>(value: &T, config: &EngineConfig) -> Result<()> {
    println!("{}", to_json(value, config)?);
    Ok(())
}
