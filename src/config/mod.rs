pub mod toml_config;

use crate::adapters::datastore::DEFAULT_ENDPOINT;
use crate::core::catalog::MAX_AUTOCOMPLETE_RESULTS;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_required_field, validate_socket_addr,
    validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};

pub use toml_config::TomlConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_KIND: &str = "Product";
pub const DEFAULT_SEARCH_FIELD: &str = "downcase_name";
pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "product-autocomplete")]
#[command(about = "Product autocomplete backend over Cloud Datastore")]
pub struct CliConfig {
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: String,

    #[arg(long, env = "DATASTORE_PROJECT_ID")]
    pub project_id: Option<String>,

    #[arg(long, env = "DATASTORE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub datastore_endpoint: String,

    #[arg(long, env = "DATASTORE_NAMESPACE")]
    pub namespace: Option<String>,

    #[arg(long, env = "DATASTORE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "PRODUCT_KIND", default_value = DEFAULT_KIND)]
    pub kind: String,

    #[arg(long, env = "PRODUCT_SEARCH_FIELD", default_value = DEFAULT_SEARCH_FIELD)]
    pub search_field: String,

    /// Autocomplete suggestions per request, 1 to 5
    #[arg(long, env = "PRODUCT_PAGE_SIZE", default_value = "5")]
    pub page_size: usize,

    /// Path to a TOML configuration file; replaces the flags above when given
    #[arg(short, long, env = "PRODUCT_AUTOCOMPLETE_CONFIG")]
    pub config: Option<String>,

    #[arg(short, long, env = "LOG_VERBOSE", help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, env = "LOG_JSON", help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    fn project_id(&self) -> &str {
        self.project_id.as_deref().unwrap_or_default()
    }

    fn datastore_endpoint(&self) -> &str {
        &self.datastore_endpoint
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn search_field(&self) -> &str {
        &self.search_field
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_required_field("project_id", &self.project_id)?;
        validate_provider(self)
    }
}

/// 共用的設定檢查
pub fn validate_provider(config: &dyn ConfigProvider) -> Result<()> {
    validate_socket_addr("bind_addr", config.bind_addr())?;
    validate_non_empty_string("project_id", config.project_id())?;
    validate_url("datastore_endpoint", config.datastore_endpoint())?;
    validate_non_empty_string("kind", config.kind())?;
    validate_non_empty_string("search_field", config.search_field())?;
    validate_range("page_size", config.page_size(), 1, MAX_AUTOCOMPLETE_RESULTS)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AppError;

    #[test]
    fn test_cli_defaults() {
        let config = CliConfig::parse_from(["product-autocomplete", "--project-id", "demo"]);

        assert_eq!(config.project_id(), "demo");
        assert_eq!(config.kind(), DEFAULT_KIND);
        assert_eq!(config.search_field(), DEFAULT_SEARCH_FIELD);
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
        assert!(config.validate().is_ok());
    }

    fn cli_config() -> CliConfig {
        CliConfig {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            project_id: Some("demo".to_string()),
            datastore_endpoint: DEFAULT_ENDPOINT.to_string(),
            namespace: None,
            access_token: None,
            kind: DEFAULT_KIND.to_string(),
            search_field: DEFAULT_SEARCH_FIELD.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            config: None,
            verbose: false,
            json_logs: false,
        }
    }

    #[test]
    fn test_cli_requires_project_id() {
        let config = CliConfig {
            project_id: None,
            ..cli_config()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::MissingConfigError { field }) if field == "project_id"
        ));
        assert!(cli_config().validate().is_ok());
    }

    #[test]
    fn test_cli_rejects_page_size_above_five() {
        let config = CliConfig {
            page_size: MAX_AUTOCOMPLETE_RESULTS + 1,
            ..cli_config()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::InvalidConfigValueError { field, .. }) if field == "page_size"
        ));
    }

    #[test]
    fn test_cli_rejects_zero_page_size() {
        let config = CliConfig::parse_from([
            "product-autocomplete",
            "--project-id",
            "demo",
            "--page-size",
            "0",
        ]);
        assert!(config.validate().is_err());
    }
}
