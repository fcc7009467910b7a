use crate::core::graph::CompositionGraph;
use crate::domain::model::{OutputRef, Property, ProvisioningUnit, UnitId, UnitKind};
use crate::utils::error::Result;

pub const UPLOAD_BUCKET_UNIT: &str = "DocUploadBucket";

#[derive(Debug, Clone)]
pub struct UploadStorageHandles {
    pub unit: UnitId,
    pub bucket_name: OutputRef,
}

fn cors_rules() -> Property {
    Property::list([Property::map([
        ("allowed_methods", Property::list(["GET", "POST", "PUT"])),
        ("allowed_origins", Property::list(["*"])),
        ("allowed_headers", Property::list(["*"])),
    ])])
}

pub struct UploadStorageUnit;

impl UploadStorageUnit {
    /// 未指定名稱時由佈建引擎決定
    pub fn build(graph: &mut CompositionGraph, bucket_name: Option<&str>) -> Result<UploadStorageHandles> {
        let mut unit = ProvisioningUnit::new(UnitId::new(UPLOAD_BUCKET_UNIT), UnitKind::UploadBucket)
            .with_property("removal_policy", "destroy")
            .with_property("cors", cors_rules())
            .with_output("bucket_name")
            .with_output("bucket_arn");
        if let Some(name) = bucket_name {
            unit = unit.with_property("bucket_name", name);
        }

        let id = graph.add_unit(unit)?;
        Ok(UploadStorageHandles {
            bucket_name: graph.output(&id, "bucket_name")?,
            unit: id,
        })
    }
}
