use crate::config::env::{DeployConfig, EndpointMode, KEY_REGION};
use crate::core::graph::CompositionGraph;
use crate::core::units::search_cluster::SEARCH_CLUSTER_UNIT;
use crate::core::units::{
    DataPipelineProps, DataPipelineUnit, ModerationServiceProps, ModerationServiceUnit,
    NetworkProvider, ProxyTarget, ProxyUnit, RagJobSettings, SearchClusterUnit, UploadStorageUnit,
};
use crate::domain::model::{DeploymentOutputs, Value};
use crate::domain::ports::Provisioner;
use crate::utils::error::Result;
use crate::utils::validation::{validate_aws_region, validate_required_field};

pub const OUTPUT_VPC_ID: &str = "vpc_id";
pub const OUTPUT_REGION: &str = "region";
pub const OUTPUT_UPLOAD_BUCKET: &str = "upload_bucket";
pub const OUTPUT_PROXY_ADDRESS: &str = "proxy_address";
pub const OUTPUT_OPENSEARCH_ENDPOINT: &str = "opensearch_endpoint";
pub const OUTPUT_INGEST_JOB_NAME: &str = "ingest_job_name";
pub const OUTPUT_RAG_JOB_NAME: &str = "rag_job_name";
pub const OUTPUT_MODERATOR_FUNCTION: &str = "moderator_function_name";

/// 部署身分：stack 名稱，以及配置未指定時採用的區域
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentIdentity {
    pub stack_name: String,
    pub default_region: Option<String>,
}

impl DeploymentIdentity {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            default_region: None,
        }
    }

    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }
}

/// 組合完成、尚未實體化的部署
#[derive(Debug, Clone)]
pub struct Composition {
    pub graph: CompositionGraph,
    pub region: String,
    pub account: Option<String>,
    pub endpoint_mode: EndpointMode,
}

impl Composition {
    pub async fn deploy(&mut self, provisioner: &dyn Provisioner) -> Result<DeploymentOutputs> {
        self.graph.materialize(provisioner).await
    }
}

pub struct CompositionRoot;

impl CompositionRoot {
    /// 建立整個組合圖；配置錯誤會在任何單元實體化前中止
    pub fn compose(config: &DeployConfig, identity: &DeploymentIdentity) -> Result<Composition> {
        let region = config
            .region
            .clone()
            .or_else(|| identity.default_region.clone());
        let region = validate_required_field(KEY_REGION, &region)?.clone();
        validate_aws_region(KEY_REGION, &region)?;

        let endpoint_mode = config.endpoint_mode();
        tracing::info!(
            "🧩 Composing stack '{}' in {} (search: {:?})",
            identity.stack_name,
            region,
            endpoint_mode
        );

        let mut graph = CompositionGraph::new(identity.stack_name.clone());
        let network = NetworkProvider::build(&mut graph, config, &region)?;

        let (endpoint, proxy) = match &endpoint_mode {
            EndpointMode::Disabled { endpoint } => (Value::literal(endpoint.clone()), None),
            EndpointMode::UseExisting(endpoint) => {
                let proxy = ProxyUnit::build(&mut graph, &network, ProxyTarget::Endpoint(endpoint), &region)?;
                graph.add_dependency(&proxy.unit, network.unit())?;
                (Value::literal(endpoint.clone()), Some(proxy))
            }
            EndpointMode::CreateNew => {
                let proxy = ProxyUnit::build(
                    &mut graph,
                    &network,
                    ProxyTarget::Domain(SEARCH_CLUSTER_UNIT),
                    &region,
                )?;
                graph.add_dependency(&proxy.unit, network.unit())?;
                let cluster = SearchClusterUnit::build(&mut graph, &network)?;
                graph.add_dependency(&cluster.unit, network.unit())?;
                (Value::Ref(cluster.endpoint), Some(proxy))
            }
        };

        let bucket = UploadStorageUnit::build(&mut graph, config.upload_bucket.as_deref())?;

        let pipeline = DataPipelineUnit::build(
            &mut graph,
            DataPipelineProps {
                endpoint: endpoint.clone(),
                region: &region,
                network: &network,
                bucket_name: Some(Value::Ref(bucket.bucket_name.clone())),
                rag: config.rag_job_enabled.then(|| RagJobSettings {
                    model_id: config.rag_model_id.clone(),
                }),
            },
        )?;
        for unit in pipeline.units() {
            graph.add_dependency(unit, network.unit())?;
        }

        let moderation = ModerationServiceUnit::build(
            &mut graph,
            ModerationServiceProps {
                endpoint: endpoint.clone(),
                region: &region,
                network: &network,
            },
        )?;

        graph.publish(OUTPUT_VPC_ID, network.vpc_id().clone())?;
        graph.publish(OUTPUT_REGION, region.clone())?;
        graph.publish(OUTPUT_UPLOAD_BUCKET, bucket.bucket_name.clone())?;
        if let Some(proxy) = &proxy {
            graph.publish(OUTPUT_PROXY_ADDRESS, proxy.dashboards_address())?;
        }
        graph.publish(OUTPUT_OPENSEARCH_ENDPOINT, endpoint)?;
        graph.publish(OUTPUT_INGEST_JOB_NAME, pipeline.ingest_job_name.clone())?;
        if let Some(rag_job_name) = &pipeline.rag_job_name {
            graph.publish(OUTPUT_RAG_JOB_NAME, rag_job_name.clone())?;
        }
        graph.publish(OUTPUT_MODERATOR_FUNCTION, moderation.function_name.clone())?;

        tracing::info!("🧩 Composed {} units", graph.units().len());

        Ok(Composition {
            graph,
            region,
            account: config.account.clone(),
            endpoint_mode,
        })
    }
}
