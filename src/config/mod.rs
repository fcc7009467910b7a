pub mod env;
#[cfg(feature = "s3")]
pub mod s3;
pub mod storage;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "moderation-stack")]
#[command(about = "Synthesize and deploy the content-moderation infrastructure stack")]
pub struct CliConfig {
    /// Optional TOML file with default configuration values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    #[arg(long, default_value = "moderation-stack")]
    pub stack_name: String,

    /// Region used when the configuration does not name one
    #[arg(long)]
    pub region: Option<String>,

    #[arg(long, default_value = "./cdk.out")]
    pub out_dir: String,

    /// Also upload artifacts to this bucket (prefix = stack name)
    #[cfg(feature = "s3")]
    #[arg(long)]
    pub artifact_bucket: Option<String>,

    /// Provisioning gateway; the simulated engine is used when omitted
    #[arg(long)]
    pub provisioner_url: Option<String>,

    /// Synthesize the assembly without materializing any unit
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Log elapsed time and memory per deployment phase")]
    pub monitor: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl crate::utils::validation::Validate for CliConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        use crate::utils::validation::*;

        validate_non_empty_string("stack_name", &self.stack_name)?;
        validate_path("out_dir", &self.out_dir)?;
        if let Some(region) = &self.region {
            validate_aws_region("region", region)?;
        }
        if let Some(url) = &self.provisioner_url {
            validate_url("provisioner_url", url)?;
        }
        #[cfg(feature = "s3")]
        if let Some(bucket) = &self.artifact_bucket {
            validate_s3_bucket_name("artifact_bucket", bucket)?;
        }
        Ok(())
    }
}
