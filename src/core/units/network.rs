use crate::config::env::DeployConfig;
use crate::core::graph::CompositionGraph;
use crate::domain::model::{OutputRef, Property, ProvisioningUnit, UnitId, UnitKind};
use crate::utils::error::{DeployError, Result};

pub const NETWORK_UNIT: &str = "vpc-stack";

/// 網路單元的輸出；只能由 [`NetworkProvider::build`] 產生，
/// 因此其他單元無法先於網路建立
#[derive(Debug, Clone)]
pub struct NetworkHandles {
    unit: UnitId,
    vpc_id: OutputRef,
    primary_subnet: OutputRef,
    subnets: Vec<OutputRef>,
    primary_security_group: OutputRef,
    security_groups: Vec<OutputRef>,
}

impl NetworkHandles {
    pub fn unit(&self) -> &UnitId {
        &self.unit
    }

    pub fn vpc_id(&self) -> &OutputRef {
        &self.vpc_id
    }

    /// 依 AZ 排序，至少一個
    pub fn subnets(&self) -> &[OutputRef] {
        &self.subnets
    }

    pub fn primary_subnet(&self) -> &OutputRef {
        &self.primary_subnet
    }

    pub fn security_groups(&self) -> &[OutputRef] {
        &self.security_groups
    }

    pub fn primary_security_group(&self) -> &OutputRef {
        &self.primary_security_group
    }

    pub fn subnets_property(&self) -> Property {
        Property::list(self.subnets.iter().cloned())
    }

    pub fn security_groups_property(&self) -> Property {
        Property::list(self.security_groups.iter().cloned())
    }
}

pub struct NetworkProvider;

impl NetworkProvider {
    pub fn build(graph: &mut CompositionGraph, config: &DeployConfig, region: &str) -> Result<NetworkHandles> {
        if config.max_azs == 0 {
            return Err(DeployError::InvalidConfigValueError {
                field: "MAX_AZS".to_string(),
                value: "0".to_string(),
                reason: "At least one subnet is required".to_string(),
            });
        }

        let mut unit = ProvisioningUnit::new(UnitId::new(NETWORK_UNIT), UnitKind::Network)
            .with_property("cidr", config.vpc_cidr.as_str())
            .with_property("max_azs", config.max_azs as i64)
            .with_property("region", region)
            .with_property("subnet_type", "private_with_egress")
            .with_property("nat_gateways", 1u32)
            .with_output("vpc_id")
            .with_output("security_group_0");
        for i in 0..config.max_azs {
            unit = unit.with_output(&format!("subnet_{}", i));
        }

        let id = graph.add_unit(unit)?;
        let primary_security_group = graph.output(&id, "security_group_0")?;
        let handles = NetworkHandles {
            vpc_id: graph.output(&id, "vpc_id")?,
            primary_subnet: graph.output(&id, "subnet_0")?,
            subnets: (0..config.max_azs)
                .map(|i| graph.output(&id, &format!("subnet_{}", i)))
                .collect::<Result<Vec<_>>>()?,
            security_groups: vec![primary_security_group.clone()],
            primary_security_group,
            unit: id,
        };

        tracing::debug!(
            "🌐 Network {} declared with {} subnet(s) in {}",
            handles.unit,
            handles.subnets.len(),
            region
        );
        Ok(handles)
    }
}
