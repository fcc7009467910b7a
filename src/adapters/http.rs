use crate::domain::model::ResolvedUnit;
use crate::domain::ports::Provisioner;
use crate::utils::error::{DeployError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

const UNITS_PATH: &str = "units";

#[derive(Debug, Deserialize)]
struct ProvisionResponse {
    #[serde(default)]
    outputs: HashMap<String, String>,
}

/// 將單元 POST 到外部佈建服務，失敗不重試
pub struct HttpProvisioner {
    client: Client,
    endpoint: Url,
}

impl HttpProvisioner {
    pub fn new(base_url: &str) -> Result<Self> {
        validate_url("provisioner_url", base_url)?;

        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            endpoint: base.join(UNITS_PATH)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Provisioner for HttpProvisioner {
    fn name(&self) -> &str {
        "http"
    }

    async fn provision(&self, unit: &ResolvedUnit) -> Result<HashMap<String, String>> {
        tracing::debug!("Sending {} to {}", unit.id, self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(unit)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Provisioner response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeployError::ProvisioningError {
                unit: unit.id.to_string(),
                message: format!("provisioner returned {}: {}", status, body.trim()),
            });
        }

        let body: ProvisionResponse = response.json().await?;
        Ok(body.outputs)
    }
}
