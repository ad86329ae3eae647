use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.catalog.backend, "sqlite");
    assert!(config.catalog.path.is_some());
    assert_eq!(config.scheduler.tick_interval_ms, 500);
    assert_eq!(config.scheduler.sweep_interval_secs, 0);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file);
}

#[test]
fn test_catalog_resolved_path_expands_tilde() {
    let catalog = CatalogConfig {
        backend: "sqlite".to_string(),
        path: Some(PathBuf::from("~/jobs.db")),
    };
    let resolved = catalog.resolved_path().unwrap();
    assert!(!resolved.to_string_lossy().starts_with('~'));
    assert!(resolved.ends_with("jobs.db"));
}

#[test]
fn test_logging_resolved_dir_default() {
    let logging = LoggingConfig::default();
    assert!(logging.resolved_dir().ends_with("logs"));
}

#[test]
fn test_partial_scheduler_section_keeps_defaults() {
    let config: Config = toml::from_str(
        r#"
        [scheduler]
        sweep_interval_secs = 30
        "#,
    )
    .unwrap();
    assert_eq!(config.scheduler.sweep_interval_secs, 30);
    assert_eq!(config.scheduler.tick_interval_ms, 500);
    assert_eq!(config.scheduler.shutdown_timeout_secs, 10);
}
