
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = Config::default();
        config.server.port = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "server.port"));
    }

    #[test]
    fn test_validate_unknown_backend() {
        let mut config = Config::default();
        config.catalog.backend = "postgres".to_string();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "catalog.backend"));
    }

    #[test]
    fn test_validate_sqlite_without_path() {
        let mut config = Config::default();
        config.catalog.path = None;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "catalog.path"));
    }

    #[test]
    fn test_validate_memory_backend_warns() {
        let mut config = Config::default();
        config.catalog.backend = "memory".to_string();
        config.catalog.path = None;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "catalog.backend"));
    }

    #[test]
    fn test_validate_zero_tick_interval() {
        let mut config = Config::default();
        config.scheduler.tick_interval_ms = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validate_short_sweep_warning() {
        let mut config = Config::default();
        config.scheduler.sweep_interval_secs = 2;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.path == "scheduler.sweep_interval_secs"));
    }

    #[test]
    fn test_ensure_valid_returns_first_error() {
        let mut config = Config::default();
        config.server.host = String::new();

        match ConfigValidator::ensure_valid(&config) {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "server.host"),
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_error_new() {
        let err = ValidationError::new("server.port", "must be positive");
        assert_eq!(err.path, "server.port");
        assert_eq!(err.message, "must be positive");
    }
