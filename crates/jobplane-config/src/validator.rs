//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const CATALOG_BACKENDS: [&str; 2] = ["sqlite", "memory"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_catalog(config, &mut result);
        Self::validate_scheduler(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    /// Validate and turn the first error into a `ConfigError`.
    pub fn ensure_valid(config: &Config) -> Result<ValidationResult, ConfigError> {
        let result = Self::validate(config)?;
        if let Some(first) = result.errors.first() {
            return Err(ConfigError::InvalidValue {
                field: first.path.clone(),
                message: first.message.clone(),
            });
        }
        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_catalog(config: &Config, result: &mut ValidationResult) {
        let backend = config.catalog.backend.as_str();
        if !CATALOG_BACKENDS.contains(&backend) {
            result.add_error(ValidationError::new(
                "catalog.backend",
                format!(
                    "Unknown catalog backend '{}', valid values: {:?}",
                    backend, CATALOG_BACKENDS
                ),
            ));
        }

        if backend == "sqlite" && config.catalog.path.is_none() {
            result.add_error(ValidationError::new(
                "catalog.path",
                "SQLite catalog requires a database path",
            ));
        }

        if backend == "memory" {
            result.add_warning(ValidationWarning::new(
                "catalog.backend",
                "In-memory catalog loses all jobs on restart",
            ));
        }
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        let scheduler = &config.scheduler;

        if scheduler.tick_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "scheduler.tick_interval_ms",
                "tick_interval_ms must be greater than 0",
            ));
        } else if scheduler.tick_interval_ms < 50 {
            result.add_warning(ValidationWarning::new(
                "scheduler.tick_interval_ms",
                "tick_interval_ms below 50 keeps the dispatch loop busy",
            ));
        }

        if scheduler.sweep_interval_secs > 0 && scheduler.sweep_interval_secs < 10 {
            result.add_warning(ValidationWarning::new(
                "scheduler.sweep_interval_secs",
                "sweep_interval_secs below 10 reconciles the whole catalog very often",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.level.trim().is_empty() {
            result.add_error(ValidationError::new(
                "logging.level",
                "Log level cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
