//! Built-in template repository and on-disk template loading.
//!
//! Template content is data, not engine logic; the engine only cares that a
//! repository resolves identifiers. `app/__init__.py` ships no template on
//! purpose: the render pipeline substitutes an empty file for the init unit.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const APP_MAIN_PY: &str = include_str!("../templates/app/main.py.tmpl");
pub const APP_CORE_LLM_PY: &str = include_str!("../templates/app/core/llm.py.tmpl");
pub const APP_SCHEMAS_PY: &str = include_str!("../templates/app/schemas.py.tmpl");
pub const REQUIREMENTS_TXT: &str = include_str!("../templates/requirements.txt.tmpl");
pub const README_MD: &str = include_str!("../templates/README.md.tmpl");
pub const ENV_EXAMPLE: &str = include_str!("../templates/.env.example.tmpl");
pub const APP_API_CHAT_PY: &str = include_str!("../templates/app/api/chat.py.tmpl");
pub const APP_API_INGEST_PY: &str = include_str!("../templates/app/api/ingest.py.tmpl");
pub const APP_API_QUERY_PY: &str = include_str!("../templates/app/api/query.py.tmpl");
pub const APP_CORE_VECTOR_STORE_PY: &str =
    include_str!("../templates/app/core/vector_store.py.tmpl");
pub const APP_API_MODULE_PY: &str = include_str!("../templates/app/api/module.py.tmpl");

const BUILTIN: &[(&str, &str)] = &[
    ("app/main.py", APP_MAIN_PY),
    ("app/core/llm.py", APP_CORE_LLM_PY),
    ("app/schemas.py", APP_SCHEMAS_PY),
    ("requirements.txt", REQUIREMENTS_TXT),
    ("README.md", README_MD),
    (".env.example", ENV_EXAMPLE),
    ("app/api/chat.py", APP_API_CHAT_PY),
    ("app/api/ingest.py", APP_API_INGEST_PY),
    ("app/api/query.py", APP_API_QUERY_PY),
    ("app/core/vector_store.py", APP_CORE_VECTOR_STORE_PY),
    ("app/api/module.py", APP_API_MODULE_PY),
];

/// The compiled-in template repository.
pub fn builtin_templates() -> BTreeMap<String, String> {
    BUILTIN
        .iter()
        .map(|(id, body)| ((*id).to_string(), (*body).to_string()))
        .collect()
}

/// Load a template repository from a directory of `*.tmpl` files.
///
/// The identifier is the path relative to `root` with the `.tmpl` extension
/// stripped, so `<root>/app/main.py.tmpl` resolves as `app/main.py`.
pub fn load_templates_dir(root: &Path) -> Result<BTreeMap<String, String>> {
    let mut templates = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("read templates dir {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "tmpl") {
                let id = template_id(root, &path)?;
                let body = fs::read_to_string(&path)
                    .with_context(|| format!("read template {}", path.display()))?;
                templates.insert(id, body);
            }
        }
    }
    Ok(templates)
}

fn template_id(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("template {} outside root", path.display()))?;
    let mut id = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if let Some(stripped) = id.strip_suffix(".tmpl") {
        id = stripped.to_string();
    }
    Ok(id)
}
