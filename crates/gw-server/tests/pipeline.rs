//! End-to-end wiring tests: config document in, catalog/executor out.

use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};

use pretty_assertions::assert_eq;

static COUNTER: AtomicU32 = AtomicU32::new(0);

fn write_temp(prefix: &str, extension: &str, doc: &str) -> std::path::PathBuf {
    let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "gw_server_{prefix}_{}_{unique}.{extension}",
        std::process::id()
    ));
    std::fs::File::create(&path).unwrap().write_all(doc.as_bytes()).unwrap();
    path
}

#[tokio::test]
async fn empty_apis_list_builds_an_empty_catalog() {
    let config_path = write_temp("config", "yaml", "apis: []\n");
    let config = gw_config::load_file(&config_path).unwrap();
    let wired = gw_server::wiring::build(&config).await.unwrap();
    assert!(wired.catalog.tools_sorted().is_empty());
    std::fs::remove_file(&config_path).unwrap();
}

#[tokio::test]
async fn openapi_spec_becomes_callable_tools() {
    let spec_path = write_temp(
        "spec",
        "json",
        r#"{"openapi":"3.0.0","info":{"title":"t","version":"1"},
            "paths":{"/pets":{"get":{"operationId":"listPets","responses":{"200":{"description":"ok"}}}}}}"#,
    );
    let config_doc = format!(
        "apis:\n  - name: petstore\n    spec_file: \"{}\"\n    base_url_override: \"https://petstore.example\"\n",
        spec_path.display()
    );
    let config_path = write_temp("config", "yaml", &config_doc);
    let config = gw_config::load_file(&config_path).unwrap();

    let wired = gw_server::wiring::build(&config).await.unwrap();
    let tools = wired.catalog.tools_sorted();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "petstore__listPets");

    std::fs::remove_file(&spec_path).unwrap();
    std::fs::remove_file(&config_path).unwrap();
}

#[tokio::test]
async fn jenkins_hint_builds_context_without_network_fetch() {
    let config_doc =
        "apis:\n  - name: ci\n    spec_type: jenkins\n    base_url_override: \"https://ci.example\"\n";
    let config_path = write_temp("config", "yaml", config_doc);
    let config = gw_config::load_file(&config_path).unwrap();

    let wired = gw_server::wiring::build(&config).await.unwrap();
    assert!(wired.catalog.tools_sorted().iter().any(|t| t.name.contains("root")));
    std::fs::remove_file(&config_path).unwrap();
}

#[tokio::test]
async fn unknown_spec_source_surfaces_as_an_error() {
    let config_doc = "apis:\n  - name: broken\n    spec_url: \"file:///definitely/not/there.json\"\n";
    let config_path = write_temp("config", "yaml", config_doc);
    let config = gw_config::load_file(&config_path).unwrap();

    let result = gw_server::wiring::build(&config).await;
    assert!(result.is_err());
    std::fs::remove_file(&config_path).unwrap();
}
