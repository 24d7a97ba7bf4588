use crate::adapters::datastore::DEFAULT_ENDPOINT;
use crate::config::{
    validate_provider, DEFAULT_BIND_ADDR, DEFAULT_KIND, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_FIELD,
};
use crate::core::ConfigProvider;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    pub datastore: DatastoreSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind_addr: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreSection {
    pub project_id: String,
    pub endpoint: Option<String>,
    pub namespace: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSection {
    pub kind: Option<String>,
    pub field: Option<String>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATASTORE_ACCESS_TOKEN})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn verbose(&self) -> bool {
        self.logging.verbose.unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.json.unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn bind_addr(&self) -> &str {
        &self.server.bind_addr
    }

    fn project_id(&self) -> &str {
        &self.datastore.project_id
    }

    fn datastore_endpoint(&self) -> &str {
        self.datastore.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn namespace(&self) -> Option<&str> {
        self.datastore.namespace.as_deref()
    }

    fn access_token(&self) -> Option<&str> {
        self.datastore.access_token.as_deref()
    }

    fn kind(&self) -> &str {
        self.search.kind.as_deref().unwrap_or(DEFAULT_KIND)
    }

    fn search_field(&self) -> &str {
        self.search.field.as_deref().unwrap_or(DEFAULT_SEARCH_FIELD)
    }

    fn page_size(&self) -> usize {
        self.search.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
