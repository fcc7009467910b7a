use crate::config::env::{
    KEY_ACCOUNT, KEY_AOS_EXISTING_ENDPOINT, KEY_AOS_REQUIRED, KEY_MAX_AZS, KEY_RAG_JOB_ENABLED,
    KEY_RAG_MODEL_ID, KEY_REGION, KEY_UPLOAD_BUCKET, KEY_VPC_CIDR,
};
use crate::utils::error::{DeployError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub stack: Option<StackSection>,
    pub search: Option<SearchSection>,
    pub storage: Option<StorageSection>,
    pub network: Option<NetworkSection>,
    pub pipeline: Option<PipelineSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackSection {
    pub region: Option<String>,
    pub account: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSection {
    pub required: Option<bool>,
    pub existing_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    pub upload_bucket: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSection {
    pub cidr: Option<String>,
    pub max_azs: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSection {
    pub rag_job: Option<bool>,
    pub rag_model_id: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${CDK_DEFAULT_REGION})；找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DeployError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 攤平成與環境變數相同的鍵，作為最低優先序的來源
    pub fn into_entries(self) -> HashMap<String, String> {
        let mut entries = HashMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                entries.insert(key.to_string(), value);
            }
        };

        let stack = self.stack.unwrap_or_default();
        put(KEY_REGION, stack.region);
        put(KEY_ACCOUNT, stack.account);

        let search = self.search.unwrap_or_default();
        put(KEY_AOS_REQUIRED, search.required.map(|b| b.to_string()));
        put(KEY_AOS_EXISTING_ENDPOINT, search.existing_endpoint);

        let storage = self.storage.unwrap_or_default();
        put(KEY_UPLOAD_BUCKET, storage.upload_bucket);

        let network = self.network.unwrap_or_default();
        put(KEY_VPC_CIDR, network.cidr);
        put(KEY_MAX_AZS, network.max_azs.map(|n| n.to_string()));

        let pipeline = self.pipeline.unwrap_or_default();
        put(KEY_RAG_JOB_ENABLED, pipeline.rag_job.map(|b| b.to_string()));
        put(KEY_RAG_MODEL_ID, pipeline.rag_model_id);

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::{DeployConfig, EndpointMode};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_toml_into_entries() {
        let toml_content = r#"
[stack]
region = "ap-southeast-2"

[search]
required = false
existing_endpoint = "http://external:9200"

[storage]
upload_bucket = "doc-upload"

[network]
max_azs = 3

[pipeline]
rag_job = true
"#;

        let entries = TomlConfig::from_toml_str(toml_content).unwrap().into_entries();
        assert_eq!(entries.get("region").unwrap(), "ap-southeast-2");
        assert_eq!(entries.get("aos_required").unwrap(), "false");
        assert_eq!(entries.get("MAX_AZS").unwrap(), "3");

        let config = DeployConfig::from_map(&entries).unwrap();
        assert_eq!(
            config.endpoint_mode(),
            EndpointMode::Disabled {
                endpoint: "http://external:9200".to_string()
            }
        );
        assert!(config.rag_job_enabled);
        assert_eq!(config.upload_bucket.as_deref(), Some("doc-upload"));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MODERATION_STACK_TEST_REGION", "eu-central-1");

        let toml_content = r#"
[stack]
region = "${MODERATION_STACK_TEST_REGION}"
account = "${MODERATION_STACK_UNSET_ACCOUNT}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let stack = config.stack.unwrap();
        assert_eq!(stack.region.as_deref(), Some("eu-central-1"));
        assert_eq!(
            stack.account.as_deref(),
            Some("${MODERATION_STACK_UNSET_ACCOUNT}")
        );

        std::env::remove_var("MODERATION_STACK_TEST_REGION");
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = TomlConfig::from_toml_str("[stack\nregion = 1");
        assert!(matches!(result, Err(DeployError::TomlError(_))));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[storage]\nupload_bucket = \"file-bucket\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(
            config.storage.unwrap().upload_bucket.as_deref(),
            Some("file-bucket")
        );
    }
}
