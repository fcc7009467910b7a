use crate::domain::model::{
    DeploymentOutputs, OutputRef, ProvisioningUnit, ResolvedUnit, UnitId, UnitKind, Value,
};
use crate::domain::ports::Provisioner;
use crate::utils::error::{DeployError, Result};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

/// 一次部署的組合圖：單元、依賴邊與公開輸出
#[derive(Debug, Clone)]
pub struct CompositionGraph {
    name: String,
    units: Vec<ProvisioningUnit>,
    index: HashMap<UnitId, usize>,
    published: Vec<(String, Value)>,
    attempted: bool,
}

impl CompositionGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: Vec::new(),
            index: HashMap::new(),
            published: Vec::new(),
            attempted: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 依插入順序排列的單元
    pub fn units(&self) -> &[ProvisioningUnit] {
        &self.units
    }

    pub fn unit(&self, id: &UnitId) -> Option<&ProvisioningUnit> {
        self.index.get(id).map(|&i| &self.units[i])
    }

    pub fn contains(&self, id: &UnitId) -> bool {
        self.index.contains_key(id)
    }

    pub fn units_of_kind(&self, kind: UnitKind) -> Vec<&ProvisioningUnit> {
        self.units.iter().filter(|u| u.kind() == kind).collect()
    }

    pub fn published(&self) -> &[(String, Value)] {
        &self.published
    }

    pub fn is_materialized(&self) -> bool {
        self.attempted && self.units.iter().all(ProvisioningUnit::is_materialized)
    }

    fn require_unit(&self, id: &UnitId, referenced_by: &str) -> Result<&ProvisioningUnit> {
        self.unit(id).ok_or_else(|| DeployError::UnknownUnit {
            unit: id.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }

    fn check_ref(&self, r: &OutputRef, referenced_by: &str) -> Result<()> {
        self.require_unit(&r.unit, referenced_by)?.output(&r.output)?;
        Ok(())
    }

    /// 加入單元；所有依賴與引用都必須指向已存在的單元
    pub fn add_unit(&mut self, unit: ProvisioningUnit) -> Result<UnitId> {
        let id = unit.id().clone();
        if self.contains(&id) {
            return Err(DeployError::DuplicateUnit {
                unit: id.to_string(),
            });
        }

        if unit.explicit_dependencies().contains(&id)
            || unit.property_refs().iter().any(|r| r.unit == id)
        {
            return Err(DeployError::DependencyCycle {
                units: vec![id.to_string()],
            });
        }

        for dependency in unit.explicit_dependencies() {
            self.require_unit(dependency, id.as_str())?;
        }
        for r in unit.property_refs() {
            self.check_ref(r, id.as_str())?;
        }

        tracing::debug!(
            "➕ Added unit {} ({:?}) with {} edge(s)",
            id,
            unit.kind(),
            unit.edges().len()
        );

        self.index.insert(id.clone(), self.units.len());
        self.units.push(unit);
        Ok(id)
    }

    /// 在兩個既有單元之間加上明確的順序邊：`from` 在 `to` 之後實體化
    pub fn add_dependency(&mut self, from: &UnitId, to: &UnitId) -> Result<()> {
        self.require_unit(to, from.as_str())?;
        if from == to {
            return Err(DeployError::DependencyCycle {
                units: vec![from.to_string()],
            });
        }
        let index = *self
            .index
            .get(from)
            .ok_or_else(|| DeployError::UnknownUnit {
                unit: from.to_string(),
                referenced_by: self.name.clone(),
            })?;
        self.units[index].add_dependency(to.clone());
        Ok(())
    }

    pub fn output(&self, unit: &UnitId, name: &str) -> Result<OutputRef> {
        self.require_unit(unit, &self.name)?.output(name)
    }

    pub fn publish(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        if self.published.iter().any(|(n, _)| n == name) {
            return Err(DeployError::DuplicateOutput {
                name: name.to_string(),
            });
        }
        let value = value.into();
        for r in value.refs() {
            self.check_ref(r, name)?;
        }
        self.published.push((name.to_string(), value));
        Ok(())
    }

    /// Kahn 拓撲排序；同層以插入順序決定先後
    pub fn topological_order(&self) -> Result<Vec<UnitId>> {
        let mut in_degree = vec![0usize; self.units.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.units.len()];

        for (i, unit) in self.units.iter().enumerate() {
            for edge in unit.edges() {
                let target = *self.index.get(&edge).ok_or_else(|| DeployError::UnknownUnit {
                    unit: edge.to_string(),
                    referenced_by: unit.id().to_string(),
                })?;
                in_degree[i] += 1;
                dependents[target].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(self.units.len());

        while let Some(next) = ready.pop_first() {
            order.push(self.units[next].id().clone());
            for &dependent in &dependents[next] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() != self.units.len() {
            let units = in_degree
                .iter()
                .enumerate()
                .filter(|&(_, &d)| d > 0)
                .map(|(i, _)| self.units[i].id().to_string())
                .collect();
            return Err(DeployError::DependencyCycle { units });
        }

        Ok(order)
    }

    fn lookup(&self, requester: &UnitId, r: &OutputRef) -> Result<String> {
        let unit = self.require_unit(&r.unit, requester.as_str())?;
        if !unit.is_materialized() {
            return Err(DeployError::DependencyNotMaterialized {
                unit: requester.to_string(),
                dependency: r.unit.to_string(),
            });
        }
        unit.resolved_output(&r.output)
            .map(str::to_string)
            .ok_or_else(|| DeployError::MissingProvisionedOutput {
                unit: r.unit.to_string(),
                output: r.output.clone(),
            })
    }

    fn resolve_unit(&self, unit: &ProvisioningUnit) -> Result<ResolvedUnit> {
        let lookup = |r: &OutputRef| self.lookup(unit.id(), r);
        let mut properties = serde_json::Map::new();
        for (key, property) in unit.properties() {
            properties.insert(key.clone(), property.resolve(&lookup)?);
        }

        Ok(ResolvedUnit {
            id: unit.id().clone(),
            kind: unit.kind(),
            properties,
            permissions: unit.permissions().to_vec(),
            outputs: unit.declared_outputs().to_vec(),
        })
    }

    /// 依拓撲順序逐一實體化；任何失敗都會中止整個部署
    pub async fn materialize(&mut self, provisioner: &dyn Provisioner) -> Result<DeploymentOutputs> {
        if self.attempted {
            return Err(DeployError::AlreadyMaterialized {
                graph: self.name.clone(),
            });
        }
        let order = self.topological_order()?;
        self.attempted = true;

        tracing::info!(
            "🚀 Materializing {} units of '{}' via {}",
            order.len(),
            self.name,
            provisioner.name()
        );

        for id in order {
            let index = self.index[&id];
            let unit = &self.units[index];

            for dependency in unit.edges() {
                let ready = self.unit(&dependency).is_some_and(|u| u.is_materialized());
                if !ready {
                    return Err(DeployError::DependencyNotMaterialized {
                        unit: id.to_string(),
                        dependency: dependency.to_string(),
                    });
                }
            }

            let resolved = self.resolve_unit(unit)?;
            let start = Instant::now();
            let mut outputs = provisioner.provision(&resolved).await.map_err(|e| {
                tracing::error!("❌ Unit {} failed to materialize: {}", id, e);
                e
            })?;

            for declared in &resolved.outputs {
                if !outputs.contains_key(declared) {
                    return Err(DeployError::MissingProvisionedOutput {
                        unit: id.to_string(),
                        output: declared.clone(),
                    });
                }
            }
            outputs.retain(|key, _| resolved.outputs.contains(key));

            tracing::info!("✅ Materialized {} ({:?}) in {:?}", id, resolved.kind, start.elapsed());
            self.units[index].mark_materialized(outputs);
        }

        let root = UnitId::new(self.name.clone());
        let mut deployment = DeploymentOutputs::default();
        for (name, value) in &self.published {
            let resolved = value.resolve(&|r: &OutputRef| self.lookup(&root, r))?;
            deployment.push(name.clone(), resolved);
        }

        Ok(deployment)
    }
}
