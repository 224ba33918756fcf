use super::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn parse(doc: &str) -> Result<ServiceCatalog> {
    ServiceCatalog::parse(doc, Path::new("custom_services.json"))
}

const CONFIGURATOR_DOC: &str = r#"{
  "services": {
    "core": {
      "n8n": {
        "enabled": true,
        "name": "n8n",
        "description": "Workflow automation",
        "dependencies": ["postgres", "n8n-import"]
      },
      "n8n-import": { "enabled": false },
      "ollama": {
        "enabled": true,
        "profiles": { "cpu": "ollama-cpu", "gpu-nvidia": "ollama-gpu", "gpu-amd": "ollama-gpu-amd" },
        "pull_services": { "cpu": "ollama-pull-llama-cpu", "gpu-nvidia": "ollama-pull-llama-gpu" }
      }
    },
    "databases": {
      "postgres": { "enabled": false },
      "supabase": { "enabled": true, "external_compose": true }
    }
  }
}"#;

#[test]
fn test_parse_configurator_document() {
    let catalog = parse(CONFIGURATOR_DOC).unwrap();

    assert_eq!(catalog.len(), 5);
    assert_eq!(catalog.categories(), vec!["core", "databases"]);

    let n8n = catalog.get("n8n").unwrap();
    assert!(n8n.enabled);
    assert_eq!(n8n.dependencies, vec!["postgres", "n8n-import"]);
    assert!(!n8n.external_compose);

    let ollama = catalog.get("ollama").unwrap();
    assert_eq!(ollama.variant_for(RunProfile::GpuNvidia), Some("ollama-gpu"));
    assert_eq!(ollama.pull_companion_for(RunProfile::Cpu), Some("ollama-pull-llama-cpu"));
    assert_eq!(ollama.pull_companion_for(RunProfile::GpuAmd), None);

    assert!(catalog.is_external("supabase"));
    assert!(catalog.is_enabled("supabase"));
    assert!(!catalog.is_enabled("postgres"));
    assert_eq!(catalog.entry("supabase").unwrap().category, "databases");
}

#[test]
fn test_document_order_is_preserved() {
    let catalog = parse(CONFIGURATOR_DOC).unwrap();
    let ids: Vec<&str> = catalog.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["n8n", "n8n-import", "ollama", "postgres", "supabase"]);
}

#[test]
fn test_yaml_document_is_accepted() {
    let yaml = r#"
services:
  utilities:
    searxng:
      enabled: true
"#;
    let catalog = parse(yaml).unwrap();
    assert!(catalog.is_enabled("searxng"));
}

#[test]
fn test_missing_enabled_defaults_to_disabled() {
    let catalog = parse(r#"{"services": {"core": {"flowise": {}}}}"#).unwrap();
    let flowise = catalog.get("flowise").unwrap();
    assert!(!flowise.enabled);
    assert!(flowise.profiles.is_empty());
    assert!(flowise.dependencies.is_empty());
}

#[test]
fn test_empty_documents() {
    assert!(parse("").unwrap().is_empty());
    assert!(parse("{}").unwrap().is_empty());
    assert!(parse(r#"{"services": null}"#).unwrap().is_empty());
    assert!(parse(r#"{"services": {"core": null}}"#).unwrap().is_empty());
}

#[test]
fn test_unknown_root_fields_are_ignored() {
    let catalog = parse(r#"{"version": 2, "services": {"core": {"n8n": {"enabled": true}}}}"#).unwrap();
    assert_eq!(catalog.len(), 1);
}

#[test]
fn test_duplicate_id_across_categories_is_rejected() {
    let doc = r#"{
      "services": {
        "core": { "qdrant": { "enabled": true } },
        "databases": { "qdrant": { "enabled": false } }
      }
    }"#;
    let err = parse(doc).unwrap_err();
    match err {
        LaunchError::DuplicateService { service, first, second } => {
            assert_eq!(service, "qdrant");
            assert_eq!(first, "core");
            assert_eq!(second, "databases");
        }
        other => panic!("expected DuplicateService, got {:?}", other),
    }
}

#[test]
fn test_from_entries_rejects_duplicates() {
    let entry = |category: &str| CatalogEntry {
        category: category.to_string(),
        id: "neo4j".to_string(),
        config: ServiceConfig::default(),
    };
    let result = ServiceCatalog::from_entries(vec![entry("databases"), entry("graphs")]);
    assert!(matches!(result, Err(LaunchError::DuplicateService { .. })));
}

#[test]
fn test_wrong_field_type_names_the_service() {
    let doc = r#"{"services": {"core": {"n8n": {"enabled": "yes please"}}}}"#;
    let err = parse(doc).unwrap_err().to_string();
    assert!(err.contains("services.core.n8n"), "error was: {}", err);
    assert!(err.contains("enabled"), "error was: {}", err);
}

#[test]
fn test_wrong_field_type_reports_line_and_column() {
    let doc = "services:\n  core:\n    n8n:\n      enabled: true\n    flowise:\n      dependencies: 7\n";
    let err = parse(doc).unwrap_err();
    assert!(matches!(err, LaunchError::ConfigParse { .. }), "got {:?}", err);
    let message = err.to_string();
    assert!(message.contains("services.core.flowise.dependencies"), "error was: {}", message);
    assert!(message.contains("Line") && message.contains("Column"), "error was: {}", message);
}

#[test]
fn test_non_mapping_category_is_rejected() {
    let err = parse(r#"{"services": {"core": ["n8n"]}}"#).unwrap_err();
    assert!(err.to_string().contains("services.core"));
}

#[test]
fn test_malformed_document_reports_location() {
    let err = parse("{\"services\": {\n  \"core\": [\n}").unwrap_err();
    assert!(matches!(err, LaunchError::ConfigParse { .. }));
    assert!(err.to_string().contains("Line"));
}

#[test]
fn test_load_missing_file_means_no_configuration() {
    let temp = TempDir::new().unwrap();
    let loaded = ServiceCatalog::load(&temp.path().join("custom_services.json")).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn test_load_reads_file() {
    let temp = TempDir::new().unwrap();
    let path: PathBuf = temp.path().join("custom_services.json");
    std::fs::write(&path, CONFIGURATOR_DOC).unwrap();

    let catalog = ServiceCatalog::load(&path).unwrap().unwrap();
    assert_eq!(catalog.len(), 5);
}

#[test]
fn test_run_profile_strings() {
    assert_eq!(RunProfile::Cpu.as_str(), "cpu");
    assert_eq!(RunProfile::GpuNvidia.to_string(), "gpu-nvidia");
    assert_eq!(RunProfile::GpuAmd.compose_profile(), Some("gpu-amd"));
    assert_eq!(RunProfile::None.compose_profile(), None);
    assert_eq!(RunProfile::default(), RunProfile::Cpu);
    assert_eq!(Environment::default(), Environment::Private);
}
