use crate::core::graph::CompositionGraph;
use crate::core::units::network::NetworkHandles;
use crate::domain::model::{OutputRef, Property, ProvisioningUnit, UnitId, UnitKind};
use crate::utils::error::Result;

pub const SEARCH_CLUSTER_UNIT: &str = "os-chat-dev";

const ENGINE_VERSION: &str = "OpenSearch_2.11";
const DATA_NODES: u32 = 2;
const DATA_NODE_INSTANCE_TYPE: &str = "r6g.large.search";
const VOLUME_SIZE_GIB: u32 = 100;

#[derive(Debug, Clone)]
pub struct SearchClusterHandles {
    pub unit: UnitId,
    pub endpoint: OutputRef,
}

/// VPC 內的受管搜尋網域；規格固定，不由配置決定
pub struct SearchClusterUnit;

impl SearchClusterUnit {
    pub fn build(graph: &mut CompositionGraph, network: &NetworkHandles) -> Result<SearchClusterHandles> {
        let zone_awareness = network.subnets().len() > 1;

        let unit = ProvisioningUnit::new(UnitId::new(SEARCH_CLUSTER_UNIT), UnitKind::SearchCluster)
            .with_property("domain_name", SEARCH_CLUSTER_UNIT)
            .with_property("engine_version", ENGINE_VERSION)
            .with_property(
                "capacity",
                Property::map([
                    ("data_nodes", Property::from(DATA_NODES)),
                    ("data_node_instance_type", Property::from(DATA_NODE_INSTANCE_TYPE)),
                ]),
            )
            .with_property(
                "ebs",
                Property::map([
                    ("volume_size", Property::from(VOLUME_SIZE_GIB)),
                    ("volume_type", Property::from("gp3")),
                ]),
            )
            .with_property("zone_awareness", zone_awareness)
            .with_property("node_to_node_encryption", true)
            .with_property("encryption_at_rest", true)
            .with_property("enforce_https", true)
            .with_property("removal_policy", "destroy")
            .with_property("vpc", network.vpc_id().clone())
            .with_property("subnets", network.subnets_property())
            .with_property("security_groups", Property::list([network.primary_security_group().clone()]))
            .with_output("domain_endpoint")
            .with_output("domain_arn");

        let id = graph.add_unit(unit)?;
        tracing::debug!("🔎 Search domain {} declared", id);

        Ok(SearchClusterHandles {
            endpoint: graph.output(&id, "domain_endpoint")?,
            unit: id,
        })
    }
}
