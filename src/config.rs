use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default nesting depth a single rewrite pass will walk.
pub const DEFAULT_MAX_DEPTH: u32 = 256;

/// Largest accepted `max_depth`. The rewrite walk reserves its worker stack
/// from this bound, so raising it means raising the per-level reservation too.
pub const MAX_DEPTH_LIMIT: u32 = 1024;

/// What to do with a member other than a known size accessor read off a
/// rewritten collection navigation (`c.Tags.Length` on a custom collection).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeAccessorPolicy {
    /// Stop the pass with `UnsupportedSizeAccessor`.
    #[default]
    Fail,
    /// Log a warning and leave the member access as it was.
    PassThrough,
}

#[derive(Debug, Error)]
#[error("unknown size accessor policy `{0}` (expected `fail` or `pass_through`)")]
pub struct UnknownPolicy(String);

impl FromStr for SizeAccessorPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(SizeAccessorPolicy::Fail),
            "pass_through" | "passthrough" | "pass-through" => Ok(SizeAccessorPolicy::PassThrough),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for SizeAccessorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeAccessorPolicy::Fail => write!(f, "fail"),
            SizeAccessorPolicy::PassThrough => write!(f, "pass_through"),
        }
    }
}

/// Navigation rewriter configuration with validation
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriterConfig {
    /// Collection members rewritten to a `Count` aggregate
    #[validate(
        length(min = 1, message = "At least one size accessor is required"),
        custom(function = "validate_accessor_names")
    )]
    pub size_accessors: Vec<String>,

    pub unsupported_size_accessor: SizeAccessorPolicy,

    /// Maximum expression nesting depth a single pass will walk
    #[validate(range(min = 1, max = 1024, message = "Max depth must be between 1 and 1024"))]
    pub max_depth: u32,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            size_accessors: vec!["Count".to_string()],
            unsupported_size_accessor: SizeAccessorPolicy::Fail,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[allow(clippy::ptr_arg)]
fn validate_accessor_names(names: &Vec<String>) -> Result<(), ValidationError> {
    if names.iter().any(|n| n.trim().is_empty()) {
        let mut err = ValidationError::new("empty_size_accessor");
        err.message = Some("Size accessor names cannot be empty".into());
        return Err(err);
    }
    Ok(())
}

impl RewriterConfig {
    pub fn is_size_accessor(&self, member: &str) -> bool {
        self.size_accessors.iter().any(|name| name == member)
    }

    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let size_accessors = match env::var("NAVREWRITE_SIZE_ACCESSORS") {
            Ok(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => defaults.size_accessors,
        };

        let config = Self {
            size_accessors,
            unsupported_size_accessor: parse_env_var("NAVREWRITE_SIZE_ACCESSOR_POLICY", "fail")?,
            max_depth: parse_env_var("NAVREWRITE_MAX_DEPTH", &DEFAULT_MAX_DEPTH.to_string())?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            size_accessors: if cli.size_accessors.is_empty() {
                defaults.size_accessors
            } else {
                cli.size_accessors
            },
            unsupported_size_accessor: cli
                .unsupported_size_accessor
                .unwrap_or(defaults.unsupported_size_accessor),
            max_depth: cli.max_depth.unwrap_or(defaults.max_depth),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides on top of this configuration
    pub fn merge(&mut self, cli: CliConfig) -> Result<(), ConfigError> {
        if !cli.size_accessors.is_empty() {
            self.size_accessors = cli.size_accessors;
        }
        if let Some(policy) = cli.unsupported_size_accessor {
            self.unsupported_size_accessor = policy;
        }
        if let Some(depth) = cli.max_depth {
            self.max_depth = depth;
        }
        self.validate()?;
        Ok(())
    }
}

/// CLI configuration (parsed from command line arguments); unset values keep
/// the underlying configuration's.
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub size_accessors: Vec<String>,
    pub unsupported_size_accessor: Option<SizeAccessorPolicy>,
    pub max_depth: Option<u32>,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
