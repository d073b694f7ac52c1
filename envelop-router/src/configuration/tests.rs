use std::io::Write;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::demo::DemoResolvers;

#[test]
fn empty_configuration_uses_defaults() {
    let configuration = Configuration::from_str("").unwrap();
    assert_eq!(configuration.server.listen, default_listen());
    assert_eq!(configuration.server.graphql_path, "/graphql");
    assert_eq!(configuration.server.health_check_path, "/health");
    assert!(configuration.server.landing_page);
    assert_eq!(configuration.server.parser_recursion_limit, 500);
    let plugins: Vec<_> = configuration.plugins.iter().map(PluginConf::name).collect();
    assert_eq!(
        plugins,
        vec!["validation_cache", "timing", "logging", "authorization"]
    );
}

#[test]
fn full_configuration() {
    let configuration = Configuration::from_str(
        r#"
server:
  listen: 0.0.0.0:4000
  graphql_path: /api
  landing_page: false
  parser_recursion_limit: 64
plugins:
  - authorization:
      header_name: x-token
      expected_value: hunter2
  - timing: {}
"#,
    )
    .unwrap();
    assert_eq!(configuration.server.listen.port(), 4000);
    assert_eq!(configuration.server.graphql_path, "/api");
    assert_eq!(configuration.server.health_check_path, "/health");
    assert!(!configuration.server.landing_page);
    assert_eq!(configuration.server.parser_recursion_limit, 64);
    assert_eq!(
        serde_json::to_value(&configuration.plugins).unwrap(),
        json!([
            {
                "authorization": {
                    "header_name": "x-token",
                    "expected_value": "hunter2",
                    "identity": "Admin"
                }
            },
            { "timing": {} }
        ])
    );
}

#[test]
fn empty_plugin_list_is_kept_empty() {
    let configuration = Configuration::from_str("plugins: []").unwrap();
    assert!(configuration.plugins.is_empty());
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(matches!(
        Configuration::from_str("server:\n  port: 8080"),
        Err(ConfigurationError::DeserializeConfigError(_))
    ));
    assert!(matches!(
        Configuration::from_str("telemetry: {}"),
        Err(ConfigurationError::DeserializeConfigError(_))
    ));
    assert!(matches!(
        Configuration::from_str("plugins:\n  - timing:\n      verbose: true"),
        Err(ConfigurationError::DeserializeConfigError(_))
    ));
}

#[test]
fn paths_are_validated() {
    let error = Configuration::from_str("server:\n  graphql_path: graphql").unwrap_err();
    assert_eq!(
        error.to_string(),
        "invalid 'server.graphql_path': 'graphql' must start with '/'"
    );
    assert!(matches!(
        Configuration::from_str("server:\n  graphql_path: /health"),
        Err(ConfigurationError::InvalidConfiguration { .. })
    ));
}

#[test]
fn validation_cache_capacity_must_be_positive() {
    assert!(Configuration::from_str("plugins:\n  - validation_cache:\n      capacity: 0").is_err());
    assert!(
        Configuration::from_str("plugins:\n  - validation_cache:\n      capacity: null").is_ok()
    );
}

#[test]
fn reads_configuration_files() {
    let path = std::env::temp_dir().join(format!("envelop-config-{}.yaml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "server:\n  landing_page: false").unwrap();
    drop(file);

    let configuration = Configuration::read(&path).unwrap();
    assert!(!configuration.server.landing_page);
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(
        Configuration::read(&path),
        Err(ConfigurationError::ReadFile { .. })
    ));
}

#[test]
fn config_schema_lists_every_plugin() {
    let schema = serde_json::to_string(&generate_config_schema()).unwrap();
    for name in [
        "validation_cache",
        "timing",
        "logging",
        "authorization",
        "parser_recursion_limit",
    ] {
        assert!(schema.contains(name), "{name} missing from the schema");
    }
}

#[tokio::test]
async fn invalid_plugin_configuration_names_the_plugin() {
    let configuration = Configuration::from_str(
        "plugins:\n  - timing: {}\n  - authorization:\n      header_name: \"not valid\"",
    )
    .unwrap();
    let schema = Arc::new(Schema::parse(crate::demo::SCHEMA).unwrap());
    let error = configuration.create_plugins(&schema).await.err().unwrap();
    assert!(matches!(
        error,
        ConfigurationError::PluginConfiguration { ref plugin, .. } if plugin == "authorization"
    ));
}

#[tokio::test]
async fn creates_a_pipeline_in_configured_order() {
    let configuration = Configuration::from_str(
        "server:\n  parser_recursion_limit: 3\nplugins:\n  - logging: {}\n  - timing: {}",
    )
    .unwrap();
    let schema = Arc::new(Schema::parse(crate::demo::SCHEMA).unwrap());
    let pipeline = configuration
        .create_pipeline(schema, Arc::new(DemoResolvers))
        .await
        .unwrap();
    assert_eq!(pipeline.plugin_names(), vec!["logging", "timing"]);

    let deep = crate::graphql::Request::builder()
        .query(format!("{}{}", "{ a ".repeat(10), "}".repeat(10)))
        .build();
    let response = pipeline.run(&Default::default(), deep);
    assert_eq!(
        response.errors[0].extension_code().as_deref(),
        Some("GRAPHQL_PARSING_FAILED")
    );
}
