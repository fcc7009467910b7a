use crate::core::graph::CompositionGraph;
use crate::core::units::network::NetworkHandles;
use crate::domain::model::{OutputRef, Property, ProvisioningUnit, UnitId, UnitKind, Value};
use crate::utils::error::Result;

pub const PROXY_UNIT: &str = "Ec2Stack";

const INSTANCE_TYPE: &str = "t3.micro";
const MACHINE_IMAGE: &str = "amazon-linux-2023";

#[derive(Debug, Clone)]
pub struct ProxyHandles {
    pub unit: UnitId,
    pub public_ip: OutputRef,
}

impl ProxyHandles {
    /// `http://<ip>/_dashboards/`
    pub fn dashboards_address(&self) -> Value {
        Value::Join(vec![
            Value::literal("http://"),
            Value::Ref(self.public_ip.clone()),
            Value::literal("/_dashboards/"),
        ])
    }
}

/// proxy 轉發的對象：本次建立的網域，或配置提供的既有端點
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyTarget<'a> {
    /// 開機時以網域名稱查出 VPC 端點，因此不引用搜尋叢集單元
    Domain(&'a str),
    Endpoint(&'a str),
}

fn endpoint_host(endpoint: &str) -> &str {
    endpoint
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
}

fn user_data(target: ProxyTarget<'_>, region: &str) -> Vec<String> {
    let endpoint = match target {
        ProxyTarget::Domain(domain_name) => format!(
            "ENDPOINT=$(aws opensearch describe-domain --domain-name {} --region {} --query 'DomainStatus.Endpoints.vpc' --output text)",
            domain_name, region
        ),
        ProxyTarget::Endpoint(endpoint) => format!("ENDPOINT={}", endpoint_host(endpoint)),
    };

    vec![
        "#!/bin/bash".to_string(),
        "dnf install -y nginx".to_string(),
        endpoint,
        "cat > /etc/nginx/conf.d/dashboards.conf <<CONF".to_string(),
        "server { listen 80; location /_dashboards { proxy_pass https://$ENDPOINT/_dashboards; } }".to_string(),
        "CONF".to_string(),
        "systemctl enable --now nginx".to_string(),
    ]
}

pub struct ProxyUnit;

impl ProxyUnit {
    pub fn build(
        graph: &mut CompositionGraph,
        network: &NetworkHandles,
        target: ProxyTarget<'_>,
        region: &str,
    ) -> Result<ProxyHandles> {
        let unit = ProvisioningUnit::new(UnitId::new(PROXY_UNIT), UnitKind::Proxy)
            .with_property("instance_type", INSTANCE_TYPE)
            .with_property("machine_image", MACHINE_IMAGE)
            .with_property("vpc", network.vpc_id().clone())
            .with_property("subnet_type", "public")
            .with_property("associate_public_ip", true)
            .with_property("security_group", network.primary_security_group().clone())
            .with_property("user_data", Property::list(user_data(target, region)))
            .with_output("public_ip")
            .with_output("instance_id");

        let id = graph.add_unit(unit)?;
        tracing::debug!("🖥️ Dashboard proxy {} declared for {:?}", id, target);

        Ok(ProxyHandles {
            public_ip: graph.output(&id, "public_ip")?,
            unit: id,
        })
    }
}
