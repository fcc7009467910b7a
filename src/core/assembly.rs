use crate::config::env::EndpointMode;
use crate::core::composition::Composition;
use crate::domain::model::{DeploymentOutputs, PolicyStatement, UnitKind};
use crate::domain::ports::Storage;
use crate::utils::error::{DeployError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const ASSEMBLY_ARCHIVE: &str = "assembly.zip";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const EDGES_FILE: &str = "edges.tsv";
pub const OUTPUTS_FILE: &str = "outputs.csv";

const MANIFEST_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitManifest {
    pub id: String,
    pub kind: UnitKind,
    pub depends_on: Vec<String>,
    pub properties: serde_json::Value,
    pub permissions: Vec<PolicyStatement>,
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputManifest {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyManifest {
    pub version: String,
    pub stack: String,
    pub account: Option<String>,
    pub region: String,
    pub endpoint_mode: String,
    pub search_enabled: bool,
    pub synthesized_at: DateTime<Utc>,
    pub order: Vec<String>,
    pub units: Vec<UnitManifest>,
    pub outputs: Vec<OutputManifest>,
}

fn endpoint_mode_label(mode: &EndpointMode) -> &'static str {
    match mode {
        EndpointMode::Disabled { .. } => "disabled",
        EndpointMode::UseExisting(_) => "use_existing",
        EndpointMode::CreateNew => "create_new",
    }
}

/// 組合圖的合成結果，可寫成 zip 交給部署流程
#[derive(Debug, Clone)]
pub struct CloudAssembly {
    manifest: AssemblyManifest,
}

impl CloudAssembly {
    pub fn synthesize(composition: &Composition) -> Result<Self> {
        let graph = &composition.graph;
        let order = graph
            .topological_order()?
            .iter()
            .map(|id| id.to_string())
            .collect();

        let units = graph
            .units()
            .iter()
            .map(|unit| UnitManifest {
                id: unit.id().to_string(),
                kind: unit.kind(),
                depends_on: unit.edges().iter().map(|id| id.to_string()).collect(),
                properties: serde_json::Value::Object(
                    unit.properties()
                        .iter()
                        .map(|(k, v)| (k.clone(), v.template()))
                        .collect(),
                ),
                permissions: unit.permissions().to_vec(),
                outputs: unit.declared_outputs().to_vec(),
            })
            .collect();

        let outputs = graph
            .published()
            .iter()
            .map(|(name, value)| OutputManifest {
                name: name.clone(),
                value: value.template(),
            })
            .collect();

        Ok(Self {
            manifest: AssemblyManifest {
                version: MANIFEST_VERSION.to_string(),
                stack: graph.name().to_string(),
                account: composition.account.clone(),
                region: composition.region.clone(),
                endpoint_mode: endpoint_mode_label(&composition.endpoint_mode).to_string(),
                search_enabled: composition.endpoint_mode.search_enabled(),
                synthesized_at: Utc::now(),
                order,
                units,
                outputs,
            },
        })
    }

    pub fn manifest(&self) -> &AssemblyManifest {
        &self.manifest
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.manifest)?)
    }

    /// 每行一條依賴邊：`unit<TAB>dependency`
    pub fn edges_tsv(&self) -> String {
        let mut lines = vec!["unit\tdepends_on".to_string()];
        for unit in &self.manifest.units {
            for dependency in &unit.depends_on {
                lines.push(format!("{}\t{}", unit.id, dependency));
            }
        }
        lines.join("\n")
    }

    pub fn to_archive(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file(MANIFEST_FILE, SimpleFileOptions::default())?;
        zip.write_all(self.to_json()?.as_bytes())?;

        zip.start_file(EDGES_FILE, SimpleFileOptions::default())?;
        zip.write_all(self.edges_tsv().as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    pub async fn write_to<S: Storage>(&self, storage: &S) -> Result<()> {
        let archive = self.to_archive()?;
        tracing::debug!("📦 Writing assembly archive ({} bytes)", archive.len());
        storage.write_file(ASSEMBLY_ARCHIVE, &archive).await?;
        storage.write_file(MANIFEST_FILE, self.to_json()?.as_bytes()).await?;
        Ok(())
    }
}

pub fn outputs_to_csv(outputs: &DeploymentOutputs) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "value"])?;
    for output in outputs.iter() {
        writer.write_record([output.name.as_str(), output.value.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| DeployError::IoError(e.into_error()))
}

pub async fn write_outputs<S: Storage>(storage: &S, outputs: &DeploymentOutputs) -> Result<()> {
    storage.write_file(OUTPUTS_FILE, &outputs_to_csv(outputs)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::DeployConfig;
    use crate::core::composition::{CompositionRoot, DeploymentIdentity};
    use std::collections::HashMap;
    use std::io::Read;

    fn composition_with(pairs: &[(&str, &str)]) -> Composition {
        let mut values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        values.insert("region".to_string(), "us-east-1".to_string());
        let config = DeployConfig::from_map(&values).unwrap();
        CompositionRoot::compose(&config, &DeploymentIdentity::new("moderation-stack")).unwrap()
    }

    fn composition() -> Composition {
        composition_with(&[])
    }

    #[test]
    fn test_manifest_lists_units_in_materialization_order() {
        let assembly = CloudAssembly::synthesize(&composition()).unwrap();
        let manifest = assembly.manifest();

        assert_eq!(manifest.stack, "moderation-stack");
        assert_eq!(manifest.endpoint_mode, "create_new");
        assert!(manifest.search_enabled);
        assert_eq!(manifest.order.first().map(String::as_str), Some("vpc-stack"));
        assert_eq!(manifest.order.len(), manifest.units.len());

        let endpoint = manifest
            .outputs
            .iter()
            .find(|o| o.name == "opensearch_endpoint")
            .unwrap();
        assert_eq!(endpoint.value["Ref"], "os-chat-dev.domain_endpoint");
    }

    #[test]
    fn test_manifest_marks_disabled_search() {
        let assembly = CloudAssembly::synthesize(&composition_with(&[("aos_required", "false")])).unwrap();
        let manifest = assembly.manifest();

        assert_eq!(manifest.endpoint_mode, "disabled");
        assert!(!manifest.search_enabled);
        assert!(!manifest.units.iter().any(|u| u.kind == UnitKind::Proxy));
    }

    #[test]
    fn test_archive_contains_manifest_and_edges() {
        let assembly = CloudAssembly::synthesize(&composition()).unwrap();
        let archive = assembly.to_archive().unwrap();

        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
        let mut edges = String::new();
        zip.by_name(EDGES_FILE)
            .unwrap()
            .read_to_string(&mut edges)
            .unwrap();
        assert!(edges.starts_with("unit\tdepends_on"));
        assert!(edges.contains("Ec2Stack\tvpc-stack"));

        let mut manifest = String::new();
        zip.by_name(MANIFEST_FILE)
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        let parsed: AssemblyManifest = serde_json::from_str(&manifest).unwrap();
        assert_eq!(parsed.region, "us-east-1");
    }

    #[test]
    fn test_outputs_csv() {
        let mut outputs = DeploymentOutputs::default();
        outputs.push("upload_bucket", "my-bucket");
        outputs.push("proxy_address", "http://203.0.113.7/_dashboards/");

        let csv = String::from_utf8(outputs_to_csv(&outputs).unwrap()).unwrap();
        assert_eq!(
            csv,
            "name,value\nupload_bucket,my-bucket\nproxy_address,http://203.0.113.7/_dashboards/\n"
        );
    }
}
