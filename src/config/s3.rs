use crate::domain::ports::Storage;
use crate::utils::error::{DeployError, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::Client as S3Client;

/// 以 S3 bucket 作為產物存放位置
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    pub async fn from_region(region: &str, bucket: String, prefix: String) -> Self {
        let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .region(Region::new(region.to_string()))
            .build();
        Self::new(S3Client::from_conf(config), bucket, prefix)
    }

    fn key(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.prefix.trim_end_matches('/'), path)
        }
    }

    fn storage_error(&self, action: &str, path: &str, code: Option<&str>, detail: String) -> DeployError {
        DeployError::StorageError {
            message: format!(
                "Failed to {} s3://{}/{} ({}): {}",
                action,
                self.bucket,
                self.key(path),
                code.unwrap_or("unknown"),
                detail
            ),
        }
    }
}

impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                self.storage_error("read", path, service.code(), service.to_string())
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| self.storage_error("collect", path, None, e.to_string()))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                self.storage_error("write", path, service.code(), service.to_string())
            })?;

        tracing::debug!("☁️ Uploaded {} bytes to s3://{}/{}", data.len(), self.bucket, self.key(path));
        Ok(())
    }
}
