use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

mod cli;
mod cps;
mod lm;
mod output;
mod render;
mod select;
mod templates;
mod validate;

use cli::{AnalyzeArgs, Command, GenerateArgs, NewArgs, RefineArgs, RootArgs, ValidateArgs};
use cps::Cps;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    match args.command {
        Command::Analyze(args) => cmd_analyze(args),
        Command::Validate(args) => cmd_validate(args),
        Command::Generate(args) => cmd_generate(args),
        Command::Refine(args) => cmd_refine(args),
        Command::New(args) => cmd_new(args),
    }
}

fn cmd_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = lm::LmConfig::load()?;
    let extracted = lm::extract_cps(&config, &args.idea)?;
    let rendered =
        serde_json::to_string_pretty(&extracted).context("serialize extracted CPS")?;
    match &args.out {
        Some(out) => {
            std::fs::write(out, rendered).with_context(|| format!("write {}", out.display()))?;
            println!("Wrote extracted CPS to {}", out.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> Result<()> {
    let cps = load_cps(&args.cps)?;
    let violations = validate::validate(&cps);
    if violations.is_empty() {
        println!("CPS is valid ({:?} mode).", cps.mode);
        return Ok(());
    }
    for violation in &violations {
        eprintln!("violation: {violation}");
    }
    Err(anyhow!(
        "CPS failed consistency validation with {} violation(s)",
        violations.len()
    ))
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let cps = load_cps(&args.cps)?;
    require_consistent(&cps)?;
    let repo = load_repository(args.templates.as_deref())?;
    let project = render::generate_project(&cps, &repo);
    report_failures(&project.failures);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&project.files).context("serialize file map")?
        );
        return Ok(());
    }

    let out_dir = args
        .out
        .unwrap_or_else(|| PathBuf::from(&cps.project_name));
    let written = output::write_project(&project.files, &cps.project_name, &out_dir)?;
    println!("Generated {written} file(s) in {}", out_dir.display());
    Ok(())
}

fn cmd_refine(args: RefineArgs) -> Result<()> {
    let cps = load_cps(&args.cps)?;
    let current = output::read_project(&args.project)?;
    if current.is_empty() {
        return Err(anyhow!(
            "no files found under {}; generate the project first",
            args.project.display()
        ));
    }

    let config = lm::LmConfig::load()?;
    let refined = lm::refine_project(&config, &cps, &current, &args.feedback)?;

    let out_dir = args.out.unwrap_or(args.project);
    let written = output::write_project(&refined, &cps.project_name, &out_dir)?;
    println!("Refined {written} file(s) in {}", out_dir.display());
    Ok(())
}

fn cmd_new(args: NewArgs) -> Result<()> {
    let config = lm::LmConfig::load()?;
    println!("Extracting project specification...");
    let extracted = lm::extract_cps(&config, &args.idea)?;
    let cps = cps_from_value(extracted)?;
    require_consistent(&cps)?;

    let repo = load_repository(args.templates.as_deref())?;
    let project = render::generate_project(&cps, &repo);
    report_failures(&project.failures);

    let out_dir = args
        .out
        .unwrap_or_else(|| PathBuf::from(&cps.project_name));
    let written = output::write_project(&project.files, &cps.project_name, &out_dir)?;
    println!(
        "Generated {written} file(s) for {} in {}",
        cps.project_name,
        out_dir.display()
    );
    Ok(())
}

fn load_cps(path: &Path) -> Result<Cps> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("read CPS {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parse CPS JSON {}", path.display()))?;
    cps_from_value(value)
}

fn cps_from_value(value: Value) -> Result<Cps> {
    Cps::from_value(value).map_err(|violations| {
        for violation in &violations {
            eprintln!("violation: {violation}");
        }
        anyhow!(
            "CPS failed structural validation with {} violation(s)",
            violations.len()
        )
    })
}

fn require_consistent(cps: &Cps) -> Result<()> {
    let violations = validate::validate(cps);
    if violations.is_empty() {
        return Ok(());
    }
    for violation in &violations {
        eprintln!("violation: {violation}");
    }
    Err(anyhow!(
        "CPS failed consistency validation with {} violation(s)",
        violations.len()
    ))
}

fn load_repository(dir: Option<&Path>) -> Result<BTreeMap<String, String>> {
    match dir {
        Some(dir) => templates::load_templates_dir(dir),
        None => Ok(templates::builtin_templates()),
    }
}

fn report_failures(failures: &[render::RenderFailure]) {
    for failure in failures {
        eprintln!(
            "warning: {} could not be rendered ({}); {} omitted",
            failure.template_id, failure.reason, failure.output_path
        );
    }
}
