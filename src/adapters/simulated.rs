use crate::domain::model::{ResolvedUnit, UnitId, UnitKind};
use crate::domain::ports::Provisioner;
use crate::utils::error::{DeployError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

const SIMULATED_ACCOUNT: &str = "000000000000";

/// 在行程內產生可預期的資源識別碼，不呼叫任何雲端 API
pub struct SimulatedProvisioner {
    region: String,
    counter: AtomicU32,
    provisioned: Mutex<Vec<UnitId>>,
    fail_on: Option<UnitId>,
}

impl SimulatedProvisioner {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            counter: AtomicU32::new(0),
            provisioned: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    /// 對指定單元回報佈建失敗
    pub fn failing_on(mut self, unit: &str) -> Self {
        self.fail_on = Some(UnitId::new(unit));
        self
    }

    pub fn provisioned(&self) -> Vec<UnitId> {
        self.provisioned
            .lock()
            .map(|units| units.clone())
            .unwrap_or_default()
    }

    fn service(kind: UnitKind) -> &'static str {
        match kind {
            UnitKind::Network | UnitKind::Proxy => "ec2",
            UnitKind::SearchCluster => "es",
            UnitKind::UploadBucket => "s3",
            UnitKind::JobConnection | UnitKind::BatchJob => "glue",
            UnitKind::ContainerFunction => "lambda",
        }
    }

    fn short_name(unit: &ResolvedUnit) -> String {
        unit.id
            .as_str()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
            .replace('_', "-")
    }

    fn fabricate(&self, unit: &ResolvedUnit, output: &str, serial: u32) -> String {
        let token = format!("{:017x}", u64::from(serial).wrapping_mul(0x9e37_79b9_7f4a_7c15) >> 4);
        let from_property = |key: &str| unit.property_str(key).map(str::to_string);
        let name = Self::short_name(unit);

        match output {
            "vpc_id" => format!("vpc-{}", token),
            o if o.starts_with("subnet_") => format!("subnet-{}-{}", token, &o["subnet_".len()..]),
            o if o.starts_with("security_group_") => format!("sg-{}", token),
            "domain_endpoint" => format!("vpc-{}-{}.{}.es.amazonaws.com", name, &token[..8], self.region),
            "public_ip" => format!("203.0.113.{}", serial % 254 + 1),
            "instance_id" => format!("i-{}", token),
            "bucket_name" => from_property("bucket_name").unwrap_or_else(|| format!("{}-{}", name, &token[..8])),
            "job_name" => from_property("job_name").unwrap_or(name),
            "function_name" => from_property("function_name").unwrap_or(name),
            "connection_name" => format!("{}-{}", name, &token[..8]),
            o if o.ends_with("_arn") => format!(
                "arn:aws:{}:{}:{}:{}/{}",
                Self::service(unit.kind),
                self.region,
                SIMULATED_ACCOUNT,
                o.trim_end_matches("_arn"),
                name
            ),
            other => format!("{}-{}", other, token),
        }
    }
}

#[async_trait]
impl Provisioner for SimulatedProvisioner {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn provision(&self, unit: &ResolvedUnit) -> Result<HashMap<String, String>> {
        if self.fail_on.as_ref() == Some(&unit.id) {
            return Err(DeployError::ProvisioningError {
                unit: unit.id.to_string(),
                message: "simulated provisioning failure".to_string(),
            });
        }

        let serial = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let outputs = unit
            .outputs
            .iter()
            .map(|output| (output.clone(), self.fabricate(unit, output, serial)))
            .collect();

        if let Ok(mut provisioned) = self.provisioned.lock() {
            provisioned.push(unit.id.clone());
        }
        tracing::debug!("🧪 Simulated provisioning of {}", unit.id);
        Ok(outputs)
    }
}
