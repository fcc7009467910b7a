use clap::Parser;
use moderation_stack::core::assembly::write_outputs;
use moderation_stack::domain::ports::Provisioner;
use moderation_stack::utils::error::ErrorSeverity;
use moderation_stack::utils::monitor::DeployMonitor;
use moderation_stack::utils::{logger, validation::Validate};
use moderation_stack::{
    CliConfig, CloudAssembly, CompositionRoot, DeployConfig, DeploymentIdentity, HttpProvisioner,
    LocalStorage, Result, SimulatedProvisioner, TomlConfig,
};
use std::collections::HashMap;

async fn run(cli: &CliConfig, monitor: &DeployMonitor) -> Result<()> {
    // 配置：TOML < .env < 環境變數；.env 先載入，TOML 的 ${VAR} 才能引用它
    DeployConfig::load_env_file(cli.env_file.as_deref())?;
    let defaults = match &cli.config {
        Some(path) => {
            tracing::info!("📄 Loading configuration from {}", path.display());
            TomlConfig::from_file(path)?.into_entries()
        }
        None => HashMap::new(),
    };
    let config = DeployConfig::from_sources(defaults)?;
    monitor.log_phase("configuration");

    let mut identity = DeploymentIdentity::new(cli.stack_name.clone());
    if let Some(region) = &cli.region {
        identity = identity.with_default_region(region.clone());
    }

    let mut composition = CompositionRoot::compose(&config, &identity)?;
    monitor.log_phase("composition");

    let storage = LocalStorage::new(cli.out_dir.clone());
    let assembly = CloudAssembly::synthesize(&composition)?;
    assembly.write_to(&storage).await?;
    tracing::info!(
        "📦 Assembly with {} units written to {}",
        assembly.manifest().units.len(),
        cli.out_dir
    );
    monitor.log_phase("synthesis");

    #[cfg(feature = "s3")]
    let remote = match &cli.artifact_bucket {
        Some(bucket) => {
            let s3 = moderation_stack::S3Storage::from_region(
                &composition.region,
                bucket.clone(),
                cli.stack_name.clone(),
            )
            .await;
            assembly.write_to(&s3).await?;
            tracing::info!("☁️ Assembly uploaded to s3://{}/{}", bucket, cli.stack_name);
            Some(s3)
        }
        None => None,
    };

    if cli.dry_run {
        println!("✅ Dry run complete, assembly written to {}", cli.out_dir);
        return Ok(());
    }

    let provisioner: Box<dyn Provisioner> = match &cli.provisioner_url {
        Some(url) => Box::new(HttpProvisioner::new(url)?),
        None => Box::new(SimulatedProvisioner::new(composition.region.clone())),
    };
    tracing::info!("🚀 Deploying with the {} provisioner", provisioner.name());

    let outputs = composition.deploy(provisioner.as_ref()).await?;
    write_outputs(&storage, &outputs).await?;
    #[cfg(feature = "s3")]
    if let Some(s3) = &remote {
        write_outputs(s3, &outputs).await?;
    }
    monitor.log_phase("deployment");

    println!("✅ Stack '{}' deployed", cli.stack_name);
    for output in outputs.iter() {
        println!("   {} = {}", output.name, output.value);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting moderation-stack CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor = DeployMonitor::new(cli.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    if let Err(e) = run(&cli, &monitor).await {
        tracing::error!(
            "❌ Deployment failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
