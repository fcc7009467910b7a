use crate::core::graph::CompositionGraph;
use crate::core::units::data_pipeline::KNOWLEDGE_INDEX;
use crate::core::units::network::NetworkHandles;
use crate::domain::model::{OutputRef, PolicyStatement, Property, ProvisioningUnit, UnitId, UnitKind, Value};
use crate::utils::error::Result;

pub const MODERATION_SERVICE_UNIT: &str = "lambda_moderator";
pub const FUNCTION_NAME: &str = "rag_moderator";

pub const TIMEOUT_SECONDS: u32 = 15 * 60;
pub const MEMORY_SIZE_MB: u32 = 1024;

const FUNCTION_ACTIONS: &[&str] = &["s3:List*", "s3:Put*", "s3:Get*", "es:*", "bedrock:InvokeModel*"];

pub struct ModerationServiceProps<'a> {
    pub endpoint: Value,
    pub region: &'a str,
    pub network: &'a NetworkHandles,
}

#[derive(Debug, Clone)]
pub struct ModerationServiceHandles {
    pub unit: UnitId,
    pub function_name: OutputRef,
}

pub struct ModerationServiceUnit;

impl ModerationServiceUnit {
    pub fn build(graph: &mut CompositionGraph, props: ModerationServiceProps<'_>) -> Result<ModerationServiceHandles> {
        let environment = Property::map([
            ("aos_index", Property::from(KNOWLEDGE_INDEX)),
            ("aos_endpoint", Property::from(props.endpoint)),
            ("region", Property::from(props.region)),
        ]);

        let unit = ProvisioningUnit::new(UnitId::new(MODERATION_SERVICE_UNIT), UnitKind::ContainerFunction)
            .with_property("function_name", FUNCTION_NAME)
            .with_property("image_asset", "code/online_moderator")
            .with_property("runtime", "python3.9")
            .with_property("architecture", "x86_64")
            .with_property("timeout_seconds", TIMEOUT_SECONDS)
            .with_property("memory_size", MEMORY_SIZE_MB)
            .with_property("invocation_type", "RequestResponse")
            .with_property("vpc", props.network.vpc_id().clone())
            .with_property("subnets", props.network.subnets_property())
            .with_property("security_groups", props.network.security_groups_property())
            .with_property("environment", environment)
            .with_permission(PolicyStatement::allow_all_resources(FUNCTION_ACTIONS))
            .with_output("function_name")
            .with_output("function_arn");

        let id = graph.add_unit(unit)?;
        tracing::debug!("🛡️ Moderation function {} declared", id);

        Ok(ModerationServiceHandles {
            function_name: graph.output(&id, "function_name")?,
            unit: id,
        })
    }
}
