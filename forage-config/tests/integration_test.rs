//! Integration tests for forage-config

use forage_config::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use temp_env::with_vars;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("forage_config=trace")
        .with_test_writer()
        .try_init();
}

fn write_properties(dir: &Path, file: &str, content: &str) {
    std::fs::write(dir.join(file), content).unwrap();
}

fn demo_schema() -> Arc<ModuleSchema> {
    ModuleSchema::builder("forage-demo", "demo")
        .entry(ConfigEntry::of("forage-demo", "demo.endpoint").required())
        .entry(
            ConfigEntry::of("forage-demo", "demo.retries")
                .with_type(EntryType::Int)
                .with_default("3"),
        )
        .entry(ConfigEntry::of("forage-demo", "demo.mode").with_default("fast"))
        .entry(
            ConfigEntry::of("forage-demo", "demo.token")
                .with_type(EntryType::Password)
                .with_tag(EntryTag::Security),
        )
        .build()
}

#[test]
fn test_precedence_across_all_sources() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_properties(
        dir.path(),
        "forage-demo.properties",
        "# demo module\n\
         demo.endpoint = http://file\n\
         demo.retries: 5\n\
         demo.mode=file\n",
    );

    let context = Arc::new(
        ConfigContext::builder()
            .environment(EnvSource::from_vars([("DEMO_ENDPOINT", "http://env")]))
            .search_dir(dir.path())
            .system_property("demo.endpoint", "http://system")
            .system_property("demo.retries", "7")
            .build(),
    );

    let config = ModuleConfig::with_context(&context, &demo_schema(), None).unwrap();

    assert_eq!(config.required_string("endpoint").unwrap(), "http://env");
    assert_eq!(config.int("retries").unwrap(), Some(7));
    assert_eq!(config.string("mode").unwrap().as_deref(), Some("file"));
    assert_eq!(config.string("token").unwrap(), None);

    let sources: Vec<SourceKind> = ["endpoint", "retries", "mode"]
        .iter()
        .map(|short| config.explain(short).unwrap().unwrap().source)
        .collect();
    assert_eq!(
        sources,
        vec![SourceKind::Environment, SourceKind::SystemProperty, SourceKind::PropertiesFile]
    );
}

#[test]
fn test_jdbc_from_process_environment() {
    let vars = vec![
        ("FORAGE_JDBC_URL", Some("jdbc:postgresql://localhost/forage")),
        ("FORAGE_JDBC_POOL_MAX_SIZE", Some("8")),
    ];

    with_vars(vars, || {
        let context = Arc::new(
            ConfigContext::builder()
                .search_path(Vec::<PathBuf>::new())
                .build(),
        );

        let default = JdbcConfig::with_context(&context, None).unwrap();
        assert_eq!(default.url().unwrap(), "jdbc:postgresql://localhost/forage");
        assert_eq!(default.pool_max_size().unwrap(), 8);
        assert!(default.validate().is_ok());

        let ds1 = JdbcConfig::with_context(&context, Some("ds1")).unwrap();
        let err = ds1.url().unwrap_err();
        assert!(matches!(err, ConfigError::MissingConfiguration { ref key } if key == "ds1.forage.jdbc.url"));
        assert_eq!(ds1.pool_max_size().unwrap(), 20);
    });
}

#[test]
fn test_discovered_datasources_from_process_environment() {
    let vars = vec![
        ("DS1_FORAGE_JDBC_URL", Some("jdbc:h2:mem:one")),
        ("DS2_FORAGE_JDBC_URL", Some("jdbc:h2:mem:two")),
        ("DS2_FORAGE_JDBC_TRANSACTION_ENABLED", Some("true")),
    ];

    with_vars(vars, || {
        let context = Arc::new(
            ConfigContext::builder()
                .search_path(Vec::<PathBuf>::new())
                .build(),
        );

        let prefixes = context.read_prefixes(modules::jdbc::schema()).unwrap();
        assert!(prefixes.contains("ds1"));
        assert!(prefixes.contains("ds2"));

        let ds1 = JdbcConfig::with_context(&context, Some("ds1")).unwrap();
        let ds2 = JdbcConfig::with_context(&context, Some("ds2")).unwrap();
        assert_eq!(ds1.url().unwrap(), "jdbc:h2:mem:one");
        assert_eq!(ds2.url().unwrap(), "jdbc:h2:mem:two");
        assert!(!ds1.transaction_enabled().unwrap());
        assert!(ds2.transaction_enabled().unwrap());
    });
}

#[test]
fn test_multiple_bedrock_models_from_properties_file() {
    let dir = tempfile::tempdir().unwrap();
    write_properties(
        dir.path(),
        "forage-model-bedrock.properties",
        "multi1.bedrock.model.id=X\n\
         multi2.bedrock.model.id=X\n\
         multi2.bedrock.temperature=0.8\n",
    );
    let context = Arc::new(
        ConfigContext::builder()
            .environment(EnvSource::from_vars(Vec::<(String, String)>::new()))
            .search_dir(dir.path())
            .build(),
    );

    let prefixes: Vec<String> = context
        .read_prefixes(modules::bedrock::schema())
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(prefixes, vec!["multi1", "multi2"]);

    let models: Vec<BedrockConfig> = prefixes
        .iter()
        .map(|prefix| BedrockConfig::with_context(&context, Some(prefix)).unwrap())
        .collect();
    assert_eq!(models[0].model_id().unwrap(), "X");
    assert_eq!(models[1].model_id().unwrap(), "X");
    assert_eq!(models[0].temperature().unwrap(), None);
    assert_eq!(models[1].temperature().unwrap(), Some(0.8));
}

#[test]
fn test_named_instances_are_independent() {
    let context = Arc::new(
        ConfigContext::builder()
            .environment(EnvSource::from_vars([
                ("P1_DEMO_ENDPOINT", "http://one"),
                ("P2_DEMO_MODE", "slow"),
            ]))
            .search_path(Vec::<PathBuf>::new())
            .build(),
    );
    let schema = demo_schema();

    let p1 = ModuleConfig::with_context(&context, &schema, Some("p1")).unwrap();
    let p2 = ModuleConfig::with_context(&context, &schema, Some("p2")).unwrap();

    assert_eq!(p1.required_string("endpoint").unwrap(), "http://one");
    assert!(p2.required_string("endpoint").is_err());
    assert_eq!(p1.string("mode").unwrap().as_deref(), Some("fast"));
    assert_eq!(p2.string("mode").unwrap().as_deref(), Some("slow"));

    // Re-building p1 leaves p2 untouched
    let again = ModuleConfig::with_context(&context, &schema, Some("p1")).unwrap();
    assert_eq!(again.required_string("endpoint").unwrap(), "http://one");
    assert_eq!(p2.string("mode").unwrap().as_deref(), Some("slow"));
    assert_eq!(context.registry(&schema).prefixes(), vec!["p1", "p2"]);
}

#[test]
fn test_concurrent_facade_construction() {
    let context = Arc::new(
        ConfigContext::builder()
            .environment(EnvSource::from_vars([
                ("A_DEMO_ENDPOINT", "http://a"),
                ("B_DEMO_ENDPOINT", "http://b"),
                ("C_DEMO_ENDPOINT", "http://c"),
            ]))
            .search_path(Vec::<PathBuf>::new())
            .build(),
    );
    let schema = demo_schema();
    let prefixes = ["a", "b", "c"];

    std::thread::scope(|scope| {
        for round in 0..12 {
            let context = &context;
            let schema = &schema;
            let prefix = prefixes[round % prefixes.len()];
            scope.spawn(move || {
                let config = ModuleConfig::with_context(context, schema, Some(prefix)).unwrap();
                assert_eq!(
                    config.required_string("endpoint").unwrap(),
                    format!("http://{prefix}")
                );
            });
        }
    });

    let registry = context.registry(&schema);
    assert_eq!(registry.len(), schema.len() * (1 + prefixes.len()));
    assert_eq!(registry.prefixes(), vec!["a", "b", "c"]);
}

#[test]
fn test_no_prefixes_without_prefixed_keys() {
    let dir = tempfile::tempdir().unwrap();
    write_properties(
        dir.path(),
        "forage-demo.properties",
        "demo.endpoint=http://file\nunrelated.key=1\n",
    );
    let context = ConfigContext::builder()
        .environment(EnvSource::from_vars([("DEMO_MODE", "slow"), ("PATH", "/usr/bin")]))
        .search_dir(dir.path())
        .system_property("demo.retries", "1")
        .build();

    assert!(read_prefixes(&context, &demo_schema()).unwrap().is_empty());
}

#[test]
fn test_underscore_prefix_discovered_from_environment() {
    let context = Arc::new(
        ConfigContext::builder()
            .environment(EnvSource::from_vars([("MY_DS_FORAGE_JDBC_URL", "jdbc:h2:mem:x")]))
            .search_path(Vec::<PathBuf>::new())
            .build(),
    );

    let prefixes = context.read_prefixes(modules::jdbc::schema()).unwrap();
    assert_eq!(prefixes.into_iter().collect::<Vec<_>>(), vec!["my_ds"]);

    let my_ds = JdbcConfig::with_context(&context, Some("my_ds")).unwrap();
    assert_eq!(my_ds.url().unwrap(), "jdbc:h2:mem:x");
}

#[test]
fn test_env_prefix_folds_into_property_prefix() {
    let dir = tempfile::tempdir().unwrap();
    write_properties(
        dir.path(),
        "forage-jdbc.properties",
        "DS1.forage.jdbc.url=jdbc:h2:mem:file
",
    );
    let context = Arc::new(
        ConfigContext::builder()
            .environment(EnvSource::from_vars([("DS1_FORAGE_JDBC_URL", "jdbc:h2:mem:env")]))
            .search_dir(dir.path())
            .build(),
    );

    let prefixes = context.read_prefixes(modules::jdbc::schema()).unwrap();
    assert_eq!(prefixes.into_iter().collect::<Vec<_>>(), vec!["DS1"]);

    // environment still wins for the property-form prefix
    let ds1 = JdbcConfig::with_context(&context, Some("DS1")).unwrap();
    assert_eq!(ds1.url().unwrap(), "jdbc:h2:mem:env");
}

#[test]
fn test_missing_search_directory_is_not_an_error() {
    let context = Arc::new(
        ConfigContext::builder()
            .environment(EnvSource::from_vars([("QDRANT_COLLECTION_NAME", "docs")]))
            .search_dir("/nonexistent/forage/config")
            .build(),
    );

    let qdrant = QdrantConfig::with_context(&context, None).unwrap();
    assert_eq!(qdrant.collection_name().unwrap(), "docs");
    assert_eq!(qdrant.port().unwrap(), 6334);
    assert!(qdrant.validate().is_ok());
}

#[test]
fn test_snapshot_serializes() {
    let context = Arc::new(
        ConfigContext::builder()
            .environment(EnvSource::from_vars([
                ("DEMO_ENDPOINT", "http://env"),
                ("DEMO_TOKEN", "t0ken"),
            ]))
            .search_path(Vec::<PathBuf>::new())
            .build(),
    );
    let config = ModuleConfig::with_context(&context, &demo_schema(), None).unwrap();

    let json = serde_json::to_value(config.snapshot()).unwrap();
    assert_eq!(json["demo.endpoint"], "http://env");
    assert_eq!(json["demo.retries"], "3");
    assert_eq!(json["demo.token"], "****");

    let source = serde_json::to_value(config.explain("endpoint").unwrap().unwrap().source).unwrap();
    assert_eq!(source, "environment");
}
