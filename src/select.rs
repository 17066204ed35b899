//! Template selection: mapping a valid CPS to the ordered list of units to
//! render.
//!
//! Selection answers "what belongs to this mode"; whether a selected unit can
//! actually produce content given finer-grained feature flags is the render
//! pipeline's decision, driven by the `feature_gate` declared on each unit.
//! Keeping the two apart makes "selected but intentionally absent" visible.

use crate::cps::{Cps, Feature, Mode};
use std::collections::BTreeMap;

/// Template identifier for the shared per-module template.
pub const MODULE_TEMPLATE: &str = "app/api/module.py";

/// Template identifier for the package-init unit.
pub const INIT_TEMPLATE: &str = "app/__init__.py";

/// One selected (template, output path, context) triple destined for
/// rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUnit {
    /// Identifier resolved against the template repository.
    pub template_id: &'static str,
    /// Output path, always prefixed by `<project_name>/`.
    pub output_path: String,
    /// Per-unit context merged over the CPS context at render time.
    pub extra_context: BTreeMap<String, String>,
    /// Feature that must be enabled for this unit to produce content.
    pub feature_gate: Option<Feature>,
    /// Substitute an empty file when the template cannot be resolved.
    pub fallback_empty: bool,
}

impl TemplateUnit {
    fn new(cps: &Cps, template_id: &'static str) -> TemplateUnit {
        TemplateUnit {
            template_id,
            output_path: format!("{}/{}", cps.project_name, template_id),
            extra_context: BTreeMap::new(),
            feature_gate: None,
            fallback_empty: false,
        }
    }
}

/// Produce the deterministic, ordered selection list for a CPS.
///
/// Same CPS in, same list out: base units, then the mode branch, then one
/// unit per `modules` entry in declaration order (duplicates included).
pub fn select_units(cps: &Cps) -> Vec<TemplateUnit> {
    let mut units = vec![
        TemplateUnit::new(cps, "app/main.py"),
        TemplateUnit::new(cps, "app/core/llm.py"),
        TemplateUnit::new(cps, "app/schemas.py"),
        TemplateUnit {
            fallback_empty: true,
            ..TemplateUnit::new(cps, INIT_TEMPLATE)
        },
        TemplateUnit::new(cps, "requirements.txt"),
        TemplateUnit::new(cps, "README.md"),
        TemplateUnit::new(cps, ".env.example"),
    ];

    match cps.mode {
        Mode::RagOnly => {
            units.push(TemplateUnit::new(cps, "app/api/ingest.py"));
            units.push(TemplateUnit::new(cps, "app/api/query.py"));
            units.push(TemplateUnit::new(cps, "app/core/vector_store.py"));
        }
        Mode::General => {
            units.push(TemplateUnit {
                feature_gate: Some(Feature::Chat),
                ..TemplateUnit::new(cps, "app/api/chat.py")
            });
        }
    }

    for module in &cps.modules {
        let mut extra_context = BTreeMap::new();
        extra_context.insert("module".to_string(), module.clone());
        units.push(TemplateUnit {
            output_path: format!("{}/app/api/{}.py", cps.project_name, module),
            extra_context,
            ..TemplateUnit::new(cps, MODULE_TEMPLATE)
        });
    }

    units
}
