use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unit '{unit}' is already part of the composition graph")]
    DuplicateUnit { unit: String },

    #[error("Unit '{unit}' referenced by '{referenced_by}' does not exist in the graph")]
    UnknownUnit { unit: String, referenced_by: String },

    #[error("Unit '{unit}' does not declare an output named '{output}'")]
    UnknownOutput { unit: String, output: String },

    #[error("Output '{name}' is already published")]
    DuplicateOutput { name: String },

    #[error("Dependency cycle detected between units: {}", .units.join(", "))]
    DependencyCycle { units: Vec<String> },

    #[error("Unit '{unit}' cannot materialize before its dependency '{dependency}'")]
    DependencyNotMaterialized { unit: String, dependency: String },

    #[error("Composition graph '{graph}' has already been materialized")]
    AlreadyMaterialized { graph: String },

    #[error("Provisioning of unit '{unit}' failed: {message}")]
    ProvisioningError { unit: String, message: String },

    #[error("Provisioner did not return output '{output}' for unit '{unit}'")]
    MissingProvisionedOutput { unit: String, output: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Graph,
    Provisioning,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeployError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DeployError::ConfigError { .. }
            | DeployError::MissingConfigError { .. }
            | DeployError::InvalidConfigValueError { .. }
            | DeployError::TomlError(_)
            | DeployError::UrlError(_) => ErrorCategory::Configuration,
            DeployError::DuplicateUnit { .. }
            | DeployError::UnknownUnit { .. }
            | DeployError::UnknownOutput { .. }
            | DeployError::DuplicateOutput { .. }
            | DeployError::DependencyCycle { .. }
            | DeployError::DependencyNotMaterialized { .. }
            | DeployError::AlreadyMaterialized { .. } => ErrorCategory::Graph,
            DeployError::ProvisioningError { .. }
            | DeployError::MissingProvisionedOutput { .. }
            | DeployError::ApiError(_) => ErrorCategory::Provisioning,
            DeployError::StorageError { .. }
            | DeployError::IoError(_)
            | DeployError::SerializationError(_)
            | DeployError::ZipError(_)
            | DeployError::CsvError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 配置錯誤在任何資源建立之前就中止
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Graph => ErrorSeverity::High,
            // 外部引擎失敗，部署者可重新執行部署
            ErrorCategory::Provisioning => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            DeployError::MissingConfigError { field } => {
                format!("Set '{}' in the environment, the .env file or the TOML config", field)
            }
            DeployError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' and run again", field)
            }
            DeployError::ConfigError { .. } | DeployError::TomlError(_) | DeployError::UrlError(_) => {
                "Check the configuration file syntax and values".to_string()
            }
            DeployError::DependencyCycle { .. } => {
                "Remove one of the ordering edges between the listed units".to_string()
            }
            DeployError::AlreadyMaterialized { .. } => {
                "Compose a fresh graph for every deployment run".to_string()
            }
            DeployError::ProvisioningError { .. }
            | DeployError::MissingProvisionedOutput { .. }
            | DeployError::ApiError(_) => {
                "Inspect the provisioning engine logs and retry the deployment command".to_string()
            }
            DeployError::IoError(_) | DeployError::StorageError { .. } => {
                "Check that the artifact destination exists and is writable".to_string()
            }
            _ => "Report this as a bug in the stack definition".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Graph => format!("Invalid stack composition: {}", self),
            ErrorCategory::Provisioning => format!("Deployment failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
