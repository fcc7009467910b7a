use crate::domain::model::ResolvedUnit;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// 產物輸出位置（本機目錄或 S3）
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 外部佈建引擎：實際建立資源並回傳宣告的輸出值
#[async_trait]
pub trait Provisioner: Send + Sync {
    fn name(&self) -> &str;

    async fn provision(&self, unit: &ResolvedUnit) -> Result<HashMap<String, String>>;
}
