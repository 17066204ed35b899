use serde_json::{json, Value};
use std::path::Path;
use std::process::Command;

fn write_cps(dir: &Path, value: &Value) -> std::path::PathBuf {
    let path = dir.join("cps.json");
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).expect("write cps");
    path
}

fn general_cps(chat: bool) -> Value {
    json!({
        "project_name": "notes_api",
        "description": "A note-taking service",
        "llm_provider": "openai",
        "model": "gpt-4o",
        "mode": "general",
        "features": {"chat": chat, "rag": false, "streaming": false, "embeddings": false},
        "endpoints": [],
        "auth": {"type": "none"},
        "modules": ["users", "billing"]
    })
}

#[test]
fn generate_writes_a_scaffold_from_a_cps_file() {
    let bin = env!("CARGO_BIN_EXE_fgen");
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let cps_path = write_cps(temp_dir.path(), &general_cps(true));
    let out_dir = temp_dir.path().join("scaffold");

    let status = Command::new(bin)
        .arg("generate")
        .arg("--cps")
        .arg(&cps_path)
        .arg("--out")
        .arg(&out_dir)
        .status()
        .expect("run generate");
    assert!(status.success());

    let main_py = std::fs::read_to_string(out_dir.join("app/main.py")).expect("read main.py");
    assert!(main_py.contains("notes_api"));

    let init_py = std::fs::read_to_string(out_dir.join("app/__init__.py")).expect("read init");
    assert!(init_py.is_empty());

    assert!(out_dir.join("app/api/chat.py").is_file());
    assert!(out_dir.join("app/api/users.py").is_file());
    assert!(out_dir.join("app/api/billing.py").is_file());
    assert!(out_dir.join("requirements.txt").is_file());
    assert!(!out_dir.join("app/api/ingest.py").exists());
}

#[test]
fn disabled_chat_is_omitted_from_the_scaffold() {
    let bin = env!("CARGO_BIN_EXE_fgen");
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let cps_path = write_cps(temp_dir.path(), &general_cps(false));
    let out_dir = temp_dir.path().join("scaffold");

    let status = Command::new(bin)
        .arg("generate")
        .arg("--cps")
        .arg(&cps_path)
        .arg("--out")
        .arg(&out_dir)
        .status()
        .expect("run generate");
    assert!(status.success());
    assert!(!out_dir.join("app/api/chat.py").exists());
    assert!(out_dir.join("app/main.py").is_file());
}

#[test]
fn generate_json_prints_the_file_map() {
    let bin = env!("CARGO_BIN_EXE_fgen");
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let cps_path = write_cps(temp_dir.path(), &general_cps(true));

    let output = Command::new(bin)
        .arg("generate")
        .arg("--cps")
        .arg(&cps_path)
        .arg("--json")
        .output()
        .expect("run generate --json");
    assert!(output.status.success());

    let files: Value = serde_json::from_slice(&output.stdout).expect("parse file map");
    let map = files.as_object().expect("file map object");
    assert!(map.contains_key("notes_api/app/main.py"));
    assert!(map.contains_key("notes_api/README.md"));
    assert_eq!(map.get("notes_api/app/__init__.py"), Some(&json!("")));
}

#[test]
fn validate_rejects_an_inconsistent_rag_only_cps() {
    let bin = env!("CARGO_BIN_EXE_fgen");
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let cps = json!({
        "project_name": "kb",
        "description": "knowledge base",
        "llm_provider": "openai",
        "mode": "rag_only",
        "features": {"chat": true, "rag": false, "streaming": false, "embeddings": false},
        "endpoints": [],
        "auth": {"type": "none"}
    });
    let cps_path = write_cps(temp_dir.path(), &cps);

    let output = Command::new(bin)
        .arg("validate")
        .arg("--cps")
        .arg(&cps_path)
        .output()
        .expect("run validate");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("features.rag MUST be true"));
    assert!(stderr.contains("Missing embedding model"));
}

#[test]
fn validate_accepts_a_consistent_rag_only_cps_and_generates_rag_units() {
    let bin = env!("CARGO_BIN_EXE_fgen");
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let cps = json!({
        "project_name": "docs_rag",
        "description": "RAG over documentation",
        "llm_provider": "openai",
        "embedding_model": "text-embedding-3-small",
        "vector_store": "pinecone",
        "mode": "rag_only",
        "features": {"chat": false, "rag": true, "streaming": false, "embeddings": true},
        "endpoints": [],
        "auth": {"type": "api_key"}
    });
    let cps_path = write_cps(temp_dir.path(), &cps);

    let validate_status = Command::new(bin)
        .arg("validate")
        .arg("--cps")
        .arg(&cps_path)
        .status()
        .expect("run validate");
    assert!(validate_status.success());

    let out_dir = temp_dir.path().join("scaffold");
    let generate_status = Command::new(bin)
        .arg("generate")
        .arg("--cps")
        .arg(&cps_path)
        .arg("--out")
        .arg(&out_dir)
        .status()
        .expect("run generate");
    assert!(generate_status.success());

    assert!(out_dir.join("app/api/ingest.py").is_file());
    assert!(out_dir.join("app/api/query.py").is_file());
    assert!(out_dir.join("app/core/vector_store.py").is_file());
    assert!(!out_dir.join("app/api/chat.py").exists());

    let store = std::fs::read_to_string(out_dir.join("app/core/vector_store.py"))
        .expect("read vector store");
    assert!(store.contains("pinecone"));
}

#[test]
fn custom_template_directory_overrides_the_builtins() {
    let bin = env!("CARGO_BIN_EXE_fgen");
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let cps_path = write_cps(temp_dir.path(), &general_cps(false));

    let templates_dir = temp_dir.path().join("templates");
    std::fs::create_dir_all(templates_dir.join("app")).expect("create templates dir");
    std::fs::write(
        templates_dir.join("app/main.py.tmpl"),
        "# custom main for {project_name}\n",
    )
    .expect("write custom template");

    let out_dir = temp_dir.path().join("scaffold");
    let output = Command::new(bin)
        .arg("generate")
        .arg("--cps")
        .arg(&cps_path)
        .arg("--templates")
        .arg(&templates_dir)
        .arg("--out")
        .arg(&out_dir)
        .output()
        .expect("run generate");
    assert!(output.status.success());

    // Only app/main.py resolves; every other non-init unit is reported and
    // omitted, but the batch still completes.
    let main_py = std::fs::read_to_string(out_dir.join("app/main.py")).expect("read main.py");
    assert_eq!(main_py, "# custom main for notes_api\n");
    assert!(!out_dir.join("README.md").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not be rendered"));
}
