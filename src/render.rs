//! Render pipeline: resolve each selected unit against a template repository
//! and fold the per-unit outcomes into a path → content map.
//!
//! The batch never fails as a whole. Each unit ends in exactly one of three
//! states: rendered, intentionally skipped (a declared feature gate is off),
//! or failed (recorded as a diagnostic, path absent, batch continues). The
//! worst case is an incomplete file map, never an error.

use crate::cps::{AuthType, Cps, Feature, HttpMethod, LlmProvider, Mode};
use crate::select::{select_units, TemplateUnit};
use std::collections::BTreeMap;

/// Read-only template source keyed by identifier.
pub trait TemplateRepository {
    fn resolve(&self, id: &str) -> Option<&str>;
}

impl TemplateRepository for BTreeMap<String, String> {
    fn resolve(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

/// Outcome of rendering a single template unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(String),
    Skipped(SkipReason),
    Failed(String),
}

/// Why a selected unit was intentionally left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    FeatureDisabled(Feature),
}

/// Diagnostic record for a unit that failed to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    pub template_id: String,
    pub output_path: String,
    pub reason: String,
}

/// A generated (possibly incomplete) project: best-effort file map plus the
/// diagnostics for anything that could not be rendered.
#[derive(Debug, Clone, Default)]
pub struct GeneratedProject {
    pub files: BTreeMap<String, String>,
    pub failures: Vec<RenderFailure>,
}

/// Select and render every unit for the CPS against the given repository.
pub fn generate_project(cps: &Cps, repo: &dyn TemplateRepository) -> GeneratedProject {
    let base_context = cps_context(cps);
    let mut project = GeneratedProject::default();

    for unit in select_units(cps) {
        match render_unit(cps, &unit, &base_context, repo) {
            RenderOutcome::Rendered(content) => {
                project.files.insert(unit.output_path, content);
            }
            RenderOutcome::Skipped(reason) => {
                tracing::debug!(
                    template = unit.template_id,
                    ?reason,
                    "unit skipped by feature gate"
                );
            }
            RenderOutcome::Failed(reason) => {
                tracing::warn!(template = unit.template_id, %reason, "render failure");
                project.failures.push(RenderFailure {
                    template_id: unit.template_id.to_string(),
                    output_path: unit.output_path,
                    reason,
                });
            }
        }
    }

    project
}

fn render_unit(
    cps: &Cps,
    unit: &TemplateUnit,
    base_context: &BTreeMap<String, String>,
    repo: &dyn TemplateRepository,
) -> RenderOutcome {
    if let Some(feature) = unit.feature_gate {
        if !cps.features.enabled(feature) {
            return RenderOutcome::Skipped(SkipReason::FeatureDisabled(feature));
        }
    }

    let Some(template) = repo.resolve(unit.template_id) else {
        if unit.fallback_empty {
            // Init markers are structurally required even with no content.
            return RenderOutcome::Rendered(String::new());
        }
        return RenderOutcome::Failed(format!("template {:?} not found", unit.template_id));
    };

    let mut context = base_context.clone();
    context.extend(unit.extra_context.clone());
    RenderOutcome::Rendered(substitute(template, &context))
}

/// Replace `{key}` placeholders with their context values. Braces that do not
/// spell a known key (Python dict literals, f-strings) pass through untouched.
fn substitute(template: &str, context: &BTreeMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in context {
        rendered = rendered.replace(&format!("{{{key}}}"), value);
    }
    rendered
}

/// Flatten the full CPS into string-valued context keys.
fn cps_context(cps: &Cps) -> BTreeMap<String, String> {
    let mut context = BTreeMap::new();
    context.insert("project_name".to_string(), cps.project_name.clone());
    context.insert("description".to_string(), cps.description.clone());
    context.insert(
        "llm_provider".to_string(),
        match cps.llm_provider {
            LlmProvider::Openai => "openai".to_string(),
        },
    );
    context.insert(
        "model".to_string(),
        cps.model.clone().unwrap_or_else(|| "gpt-4o".to_string()),
    );
    context.insert(
        "embedding_model".to_string(),
        cps.embedding_model.clone().unwrap_or_default(),
    );
    context.insert(
        "vector_store".to_string(),
        cps.vector_store.clone().unwrap_or_default(),
    );
    context.insert(
        "mode".to_string(),
        match cps.mode {
            Mode::General => "general".to_string(),
            Mode::RagOnly => "rag_only".to_string(),
        },
    );
    context.insert("feature_chat".to_string(), cps.features.chat.to_string());
    context.insert("feature_rag".to_string(), cps.features.rag.to_string());
    context.insert(
        "feature_streaming".to_string(),
        cps.features.streaming.to_string(),
    );
    context.insert(
        "feature_embeddings".to_string(),
        cps.features.embeddings.to_string(),
    );
    context.insert(
        "auth_type".to_string(),
        match cps.auth.auth_type {
            AuthType::None => "none".to_string(),
            AuthType::ApiKey => "api_key".to_string(),
            AuthType::Jwt => "jwt".to_string(),
        },
    );
    context.insert("modules".to_string(), cps.modules.join(", "));
    context.insert(
        "endpoints".to_string(),
        cps.endpoints
            .iter()
            .map(|endpoint| {
                let method = match endpoint.method {
                    HttpMethod::Get => "GET",
                    HttpMethod::Post => "POST",
                };
                format!("{method} {}", endpoint.path)
            })
            .collect::<Vec<_>>()
            .join(", "),
    );
    context
}
