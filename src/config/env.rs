use crate::utils::error::{DeployError, Result};
use crate::utils::validation::{
    validate_aws_region, validate_range, validate_s3_bucket_name, validate_vpc_cidr, Validate,
};
use std::collections::HashMap;
use std::path::Path;

pub const KEY_REGION: &str = "region";
pub const KEY_DEFAULT_REGION: &str = "CDK_DEFAULT_REGION";
pub const KEY_AWS_REGION: &str = "AWS_REGION";
pub const KEY_ACCOUNT: &str = "CDK_DEFAULT_ACCOUNT";
pub const KEY_AOS_EXISTING_ENDPOINT: &str = "aos_existing_endpoint";
pub const KEY_AOS_REQUIRED: &str = "aos_required";
pub const KEY_UPLOAD_BUCKET: &str = "UPLOAD_BUCKET";
pub const KEY_VPC_CIDR: &str = "VPC_CIDR";
pub const KEY_MAX_AZS: &str = "MAX_AZS";
pub const KEY_RAG_JOB_ENABLED: &str = "RAG_JOB_ENABLED";
pub const KEY_RAG_MODEL_ID: &str = "RAG_MODEL_ID";

/// 表示「建立新叢集」的端點哨兵值
pub const OPTIONAL_ENDPOINT: &str = "optional";

pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";
pub const DEFAULT_MAX_AZS: usize = 2;
pub const DEFAULT_RAG_MODEL_ID: &str = "anthropic.claude-v2";

/// 搜尋叢集的三選一模式，由配置一次解析
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointMode {
    /// `aos_required = false`：不建叢集也不建 proxy，端點原樣轉交
    Disabled { endpoint: String },
    UseExisting(String),
    CreateNew,
}

impl EndpointMode {
    pub fn resolve(required: Option<&str>, existing_endpoint: Option<&str>) -> Self {
        let existing = existing_endpoint.unwrap_or_default();
        if required == Some("false") {
            return EndpointMode::Disabled {
                endpoint: existing.to_string(),
            };
        }
        if existing.is_empty() || existing == OPTIONAL_ENDPOINT {
            EndpointMode::CreateNew
        } else {
            EndpointMode::UseExisting(existing.to_string())
        }
    }

    pub fn search_enabled(&self) -> bool {
        !matches!(self, EndpointMode::Disabled { .. })
    }
}

/// 部署配置；載入後唯讀
#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
    pub region: Option<String>,
    pub account: Option<String>,
    pub aos_required: Option<String>,
    pub aos_existing_endpoint: Option<String>,
    pub upload_bucket: Option<String>,
    pub vpc_cidr: String,
    pub max_azs: usize,
    pub rag_job_enabled: bool,
    pub rag_model_id: String,
}

impl DeployConfig {
    /// 從字串對應表解析，所有來源最後都走這裡
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| values.get(key).cloned();
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let max_azs = match non_empty(KEY_MAX_AZS) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| DeployError::InvalidConfigValueError {
                    field: KEY_MAX_AZS.to_string(),
                    value: raw.clone(),
                    reason: format!("Must be a positive integer: {}", e),
                })?,
            None => DEFAULT_MAX_AZS,
        };

        let config = Self {
            region: non_empty(KEY_REGION)
                .or_else(|| non_empty(KEY_DEFAULT_REGION))
                .or_else(|| non_empty(KEY_AWS_REGION)),
            account: non_empty(KEY_ACCOUNT),
            aos_required: get(KEY_AOS_REQUIRED),
            aos_existing_endpoint: get(KEY_AOS_EXISTING_ENDPOINT),
            upload_bucket: non_empty(KEY_UPLOAD_BUCKET),
            vpc_cidr: non_empty(KEY_VPC_CIDR).unwrap_or_else(|| DEFAULT_VPC_CIDR.to_string()),
            max_azs,
            rag_job_enabled: non_empty(KEY_RAG_JOB_ENABLED)
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            rag_model_id: non_empty(KEY_RAG_MODEL_ID)
                .unwrap_or_else(|| DEFAULT_RAG_MODEL_ID.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// 將 `.env` 載入行程環境（不覆蓋既有變數）；須在解析 TOML 之前呼叫，
    /// `${VAR}` 替換才看得到其中的變數
    pub fn load_env_file(env_file: Option<&Path>) -> Result<()> {
        match env_file {
            Some(path) => {
                dotenv::from_path(path).map_err(|e| DeployError::ConfigError {
                    message: format!("Failed to load env file {}: {}", path.display(), e),
                })?;
                tracing::debug!("Loaded env file {}", path.display());
            }
            None => {
                if dotenv::dotenv().is_ok() {
                    tracing::debug!("Loaded .env from the working directory");
                }
            }
        }
        Ok(())
    }

    /// 以 `defaults`（TOML）為底層，疊上行程環境變數
    pub fn from_sources(defaults: HashMap<String, String>) -> Result<Self> {
        let mut values = defaults;
        values.extend(std::env::vars());
        Self::from_map(&values)
    }

    pub fn endpoint_mode(&self) -> EndpointMode {
        EndpointMode::resolve(
            self.aos_required.as_deref(),
            self.aos_existing_endpoint.as_deref(),
        )
    }
}

impl Validate for DeployConfig {
    fn validate(&self) -> Result<()> {
        if let Some(region) = &self.region {
            validate_aws_region(KEY_REGION, region)?;
        }

        if let Some(bucket) = &self.upload_bucket {
            validate_s3_bucket_name(KEY_UPLOAD_BUCKET, bucket)?;
        }

        validate_vpc_cidr(KEY_VPC_CIDR, &self.vpc_cidr)?;
        validate_range(KEY_MAX_AZS, self.max_azs, 1, 6)?;

        tracing::debug!("✅ Deployment configuration validation passed");
        Ok(())
    }
}
