use crate::core::graph::CompositionGraph;
use crate::core::units::network::NetworkHandles;
use crate::domain::model::{
    OutputRef, PolicyStatement, Property, ProvisioningUnit, UnitId, UnitKind, Value,
};
use crate::utils::error::Result;
use std::collections::BTreeMap;

pub const DATA_PIPELINE_UNIT: &str = "glue-stack";

/// 批次作業的並行上限與重試次數固定，不可配置
pub const MAX_CONCURRENT_RUNS: u32 = 100;
pub const MAX_RETRIES: u32 = 0;

pub const INGEST_JOB_NAME: &str = "ingest_knowledge";
pub const RAG_JOB_NAME: &str = "rag_based_translate";
pub const KNOWLEDGE_INDEX: &str = "rag-data-index";
pub const RAG_INDEX: &str = "rag-translate-index";

const GLUE_VERSION: &str = "1.0";
const PYTHON_VERSION: &str = "3.9";
const INGEST_MODULES: &str = "boto3>=1.28.52,botocore>=1.31.52";
const RAG_MODULES: &str =
    "boto3>=1.28.52,botocore>=1.31.52,opensearch-py>=2.3.1,requests-aws4auth>=1.2.3,numpy>=1.24.4";

const JOB_ACTIONS: &[&str] = &[
    "sagemaker:InvokeEndpointAsync",
    "sagemaker:InvokeEndpoint",
    "s3:List*",
    "s3:Put*",
    "s3:Get*",
    "es:*",
    "bedrock:*",
];

#[derive(Debug, Clone)]
pub struct RagJobSettings {
    pub model_id: String,
}

pub struct DataPipelineProps<'a> {
    pub endpoint: Value,
    pub region: &'a str,
    pub network: &'a NetworkHandles,
    pub bucket_name: Option<Value>,
    pub rag: Option<RagJobSettings>,
}

#[derive(Debug, Clone)]
pub struct DataPipelineHandles {
    pub connection: UnitId,
    pub ingest_job: UnitId,
    pub ingest_job_name: OutputRef,
    pub rag_job: Option<UnitId>,
    pub rag_job_name: Option<OutputRef>,
}

impl DataPipelineHandles {
    pub fn units(&self) -> Vec<&UnitId> {
        let mut units = vec![&self.connection, &self.ingest_job];
        units.extend(self.rag_job.as_ref());
        units
    }
}

struct JobDefinition<'a> {
    construct_id: &'a str,
    job_name: &'a str,
    script: &'a str,
    arguments: BTreeMap<String, Property>,
}

fn job_unit(parent: &UnitId, job: JobDefinition<'_>, connection: OutputRef) -> ProvisioningUnit {
    ProvisioningUnit::new(parent.child(job.construct_id), UnitKind::BatchJob)
        .with_property("job_name", job.job_name)
        .with_property("command", "pythonshell")
        .with_property("glue_version", GLUE_VERSION)
        .with_property("python_version", PYTHON_VERSION)
        .with_property("script", job.script)
        .with_property("max_concurrent_runs", MAX_CONCURRENT_RUNS)
        .with_property("max_retries", MAX_RETRIES)
        .with_property("max_capacity", 1u32)
        .with_property("connections", Property::list([connection]))
        .with_property("default_arguments", Property::Map(job.arguments))
        .with_permission(PolicyStatement::allow_all_resources(JOB_ACTIONS))
        .with_output("job_name")
        .with_output("job_arn")
}

fn common_arguments(props: &DataPipelineProps<'_>, index: &str) -> BTreeMap<String, Property> {
    let mut arguments = BTreeMap::new();
    arguments.insert("--AOS_ENDPOINT".to_string(), Property::from(props.endpoint.clone()));
    arguments.insert("--REGION".to_string(), Property::from(props.region));
    arguments.insert("--AOS_INDEX".to_string(), Property::from(index));
    if let Some(bucket) = &props.bucket_name {
        arguments.insert("--bucket".to_string(), Property::from(bucket.clone()));
    }
    arguments
}

pub struct DataPipelineUnit;

impl DataPipelineUnit {
    pub fn build(graph: &mut CompositionGraph, props: DataPipelineProps<'_>) -> Result<DataPipelineHandles> {
        let parent = UnitId::new(DATA_PIPELINE_UNIT);

        // 兩個作業共用同一個網路連線
        let connection = ProvisioningUnit::new(parent.child("GlueJobConnection"), UnitKind::JobConnection)
            .with_property("connection_type", "NETWORK")
            .with_property("vpc", props.network.vpc_id().clone())
            .with_property("subnet", props.network.primary_subnet().clone())
            .with_property("security_groups", props.network.security_groups_property())
            .with_output("connection_name");
        let connection = graph.add_unit(connection)?;
        let connection_name = graph.output(&connection, "connection_name")?;

        let mut ingest_arguments = common_arguments(&props, KNOWLEDGE_INDEX);
        ingest_arguments.insert("--additional-python-modules".to_string(), Property::from(INGEST_MODULES));
        ingest_arguments.insert("--field_name".to_string(), Property::from("motto"));
        ingest_arguments.insert("--object_key".to_string(), Property::from("kb/moderation_examples.json"));

        let ingest_job = graph.add_unit(job_unit(
            &parent,
            JobDefinition {
                construct_id: "ingest-knowledge-from-s3",
                job_name: INGEST_JOB_NAME,
                script: "code/offline_process/aos_write_job.py",
                arguments: ingest_arguments,
            },
            connection_name.clone(),
        ))?;
        let ingest_job_name = graph.output(&ingest_job, "job_name")?;

        let (rag_job, rag_job_name) = match &props.rag {
            Some(settings) => {
                let mut rag_arguments = common_arguments(&props, RAG_INDEX);
                rag_arguments.insert("--additional-python-modules".to_string(), Property::from(RAG_MODULES));
                rag_arguments.insert("--object_key".to_string(), Property::from("rag/documents.json"));
                rag_arguments.insert("--model_id".to_string(), Property::from(settings.model_id.as_str()));

                let id = graph.add_unit(job_unit(
                    &parent,
                    JobDefinition {
                        construct_id: "rag-based-translate",
                        job_name: RAG_JOB_NAME,
                        script: "code/offline_process/rag_based_translate.py",
                        arguments: rag_arguments,
                    },
                    connection_name,
                ))?;
                let name = graph.output(&id, "job_name")?;
                (Some(id), Some(name))
            }
            None => (None, None),
        };

        tracing::debug!(
            "🧪 Data pipeline declared: {} job(s)",
            if rag_job.is_some() { 2 } else { 1 }
        );

        Ok(DataPipelineHandles {
            connection,
            ingest_job,
            ingest_job_name,
            rag_job,
            rag_job_name,
        })
    }
}
