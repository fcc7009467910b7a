use moderation_stack::{DeployConfig, DeployError, TomlConfig};
use tempfile::TempDir;

#[test]
fn test_toml_placeholders_resolve_from_env_file() {
    let temp_dir = TempDir::new().unwrap();
    let env_path = temp_dir.path().join(".env");
    std::fs::write(&env_path, "CONFIG_TEST_BUCKET_SUFFIX=qa\n").unwrap();

    let toml_path = temp_dir.path().join("stack.toml");
    std::fs::write(
        &toml_path,
        r#"
[stack]
region = "ap-northeast-1"

[storage]
upload_bucket = "docs-${CONFIG_TEST_BUCKET_SUFFIX}"
"#,
    )
    .unwrap();

    // 與 CLI 相同的順序：.env → TOML → 合併
    DeployConfig::load_env_file(Some(env_path.as_path())).unwrap();
    let defaults = TomlConfig::from_file(&toml_path).unwrap().into_entries();
    let config = DeployConfig::from_sources(defaults).unwrap();

    assert_eq!(config.upload_bucket.as_deref(), Some("docs-qa"));
}

#[test]
fn test_missing_env_file_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = DeployConfig::load_env_file(Some(temp_dir.path().join("missing.env").as_path())).unwrap_err();

    assert!(matches!(err, DeployError::ConfigError { .. }));
}
