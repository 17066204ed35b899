//! CLI argument parsing for the scaffolding workflow.
//!
//! The CLI is intentionally thin: each command wires the extraction,
//! validation, and generation stages together without embedding policy, so
//! the same engine can sit behind other transports.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint for the scaffolding workflow.
#[derive(Parser, Debug)]
#[command(
    name = "fgen",
    version,
    about = "LM-driven FastAPI project scaffolder",
    after_help = "Commands:\n  analyze \"<idea>\"                  Extract a CPS from a free-text idea\n  validate --cps <file>             Check a CPS structurally and semantically\n  generate --cps <file> --out <dir> Render the project from a CPS\n  refine --cps <file> --project <dir> --feedback \"...\"  Regenerate via LM feedback\n  new \"<idea>\" --out <dir>          Extract, validate, generate, and write\n\nExamples:\n  fgen analyze \"a notes API with user accounts\" --out cps.json\n  fgen validate --cps cps.json\n  fgen generate --cps cps.json --out ./notes_api\n  fgen new \"RAG service over my docs using pinecone\" --out ./docs_rag",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level workflow commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract a CPS JSON document from a free-text project idea
    Analyze(AnalyzeArgs),
    /// Validate a CPS file (structure plus mode-specific consistency rules)
    Validate(ValidateArgs),
    /// Generate a project from a CPS file
    Generate(GenerateArgs),
    /// Regenerate an existing project from user feedback via the LM
    Refine(RefineArgs),
    /// Extract, validate, generate, and write in one pass
    New(NewArgs),
}

/// Analyze command inputs.
#[derive(Parser, Debug)]
#[command(about = "Extract a CPS from a project idea")]
pub struct AnalyzeArgs {
    /// Project idea or description
    pub idea: String,

    /// Output path for the extracted CPS JSON (stdout when omitted)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Validate command inputs.
#[derive(Parser, Debug)]
#[command(about = "Validate a CPS file")]
pub struct ValidateArgs {
    /// Path to a CPS JSON file
    #[arg(long, value_name = "PATH")]
    pub cps: PathBuf,
}

/// Generate command inputs.
#[derive(Parser, Debug)]
#[command(about = "Generate a project from a CPS file")]
pub struct GenerateArgs {
    /// Path to a CPS JSON file
    #[arg(long, value_name = "PATH")]
    pub cps: PathBuf,

    /// Output directory (defaults to ./<project_name>)
    #[arg(long, short, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Directory of *.tmpl files overriding the built-in templates
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Print the path → content map as JSON instead of writing files
    #[arg(long, conflicts_with = "out")]
    pub json: bool,
}

/// Refine command inputs.
#[derive(Parser, Debug)]
#[command(about = "Regenerate a project from feedback via the LM")]
pub struct RefineArgs {
    /// Path to the CPS JSON file the project was generated from
    #[arg(long, value_name = "PATH")]
    pub cps: PathBuf,

    /// Directory holding the current generated project
    #[arg(long, value_name = "DIR")]
    pub project: PathBuf,

    /// Feedback or bug report to apply
    #[arg(long)]
    pub feedback: String,

    /// Output directory for the refined project (defaults to --project)
    #[arg(long, short, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

/// New command inputs: the unified extract → validate → generate path.
#[derive(Parser, Debug)]
#[command(about = "Generate a new project straight from an idea")]
pub struct NewArgs {
    /// Project idea or description
    pub idea: String,

    /// Output directory (defaults to ./<project_name>)
    #[arg(long, short, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Directory of *.tmpl files overriding the built-in templates
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,
}
