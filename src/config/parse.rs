use super::types::*;
use crate::config::{env_var_pattern, expand_env_vars, expand_tilde};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(e) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        )),
        other => other,
    })
}

/// Parse and validate config from a YAML string.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;

    expand_paths(&mut config);
    validate_config(&config)?;

    if config.storage.provider == StorageProvider::Gcs && config.storage.credential.is_none() {
        info!("No credential configured, using ambient Google Cloud credentials");
    }

    Ok(config)
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let mut unexpanded_vars: Vec<String> = env_var_pattern()
        .captures_iter(yaml_string)
        .map(|cap| cap[1].to_string())
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    let error_msg = if unexpanded_vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with an actual value",
            unexpanded_vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables\n\
             2. Replace the variables in the config file with actual values",
            unexpanded_vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

fn expand_paths(config: &mut Config) {
    if let Some(credential) = &config.storage.credential {
        config.storage.credential = Some(expand_tilde(credential));
    }
    if let Some(root) = &config.storage.root {
        config.storage.root = Some(expand_tilde(root));
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_output(&config.output, &mut errors);
    validate_storage(&config.storage, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_output(output: &OutputConfig, errors: &mut Vec<String>) {
    if output.bucket.trim().is_empty() {
        errors.push("output.bucket cannot be empty".to_string());
    } else if output.bucket.contains('/') {
        errors.push(format!(
            "output.bucket '{}' must not contain '/'; put path segments in output.prefix",
            output.bucket
        ));
    }

    if output.time_key.is_empty() {
        errors.push("output.time_key cannot be empty".to_string());
    }
}

fn validate_storage(storage: &StorageConfig, errors: &mut Vec<String>) {
    match storage.provider {
        StorageProvider::Local if storage.root.is_none() => {
            errors.push("storage.root is required when storage.provider is 'local'".to_string());
        }
        StorageProvider::Gcs | StorageProvider::Memory if storage.endpoint.is_some() => {
            errors.push(format!(
                "storage.endpoint is only supported for the 's3' provider, not '{}'",
                storage.provider
            ));
        }
        _ => {}
    }

    if let Some(credential) = &storage.credential {
        if storage.provider == StorageProvider::Gcs && !credential.exists() {
            errors.push(format!(
                "storage.credential '{}' does not exist",
                credential.display()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse_config(
            r#"
output:
  bucket: logs-bucket
storage:
  provider: memory
"#,
        )
        .unwrap();

        assert_eq!(config.output.bucket, "logs-bucket");
        assert_eq!(config.output.prefix, "");
        assert_eq!(config.output.time_key, "ts");
        assert_eq!(config.output.on_invalid_key, InvalidKeyPolicy::Fail);
        assert_eq!(config.storage.provider, StorageProvider::Memory);
        assert!(!config.storage.allow_http);
    }

    #[test]
    fn test_all_problems_reported_together() {
        let err = parse_config(
            r#"
output:
  bucket: ""
  time_key: ""
storage:
  provider: local
"#,
        )
        .unwrap_err();

        let ConfigError::ValidationList(errors) = err else {
            panic!("expected validation list, got {:?}", err);
        };
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("output.bucket")));
        assert!(errors.iter().any(|e| e.contains("output.time_key")));
        assert!(errors.iter().any(|e| e.contains("storage.root")));
    }

    #[test]
    fn test_bucket_with_slash_rejected() {
        let err = parse_config(
            r#"
output:
  bucket: logs/app
storage:
  provider: memory
"#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("must not contain '/'"));
    }

    #[test]
    fn test_unknown_provider_is_parse_error() {
        let err = parse_config(
            r#"
output:
  bucket: b
storage:
  provider: ftp
"#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::YamlParse(_)));
    }

    #[test]
    fn test_unset_env_var_is_named() {
        let err = parse_config(
            r#"
output:
  bucket: $env{BUCKETLOG_PARSE_TEST_UNSET}
storage:
  provider: memory
"#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("BUCKETLOG_PARSE_TEST_UNSET"));
    }

    #[test]
    fn test_skip_policy() {
        let config = parse_config(
            r#"
output:
  bucket: b
  on_invalid_key: skip
storage:
  provider: memory
"#,
        )
        .unwrap();

        assert_eq!(config.output.on_invalid_key, InvalidKeyPolicy::Skip);
    }
}
