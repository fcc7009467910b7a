use crate::utils::error::{DeployError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// 單元識別碼，巢狀單元以 `parent/child` 表示
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}/{}", self.0, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Network,
    SearchCluster,
    Proxy,
    UploadBucket,
    JobConnection,
    BatchJob,
    ContainerFunction,
}

/// 指向另一個單元輸出的延遲引用，在該單元實體化後才能解析
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub unit: UnitId,
    pub output: String,
}

impl OutputRef {
    pub fn token(&self) -> String {
        format!("{}.{}", self.unit, self.output)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(String),
    Ref(OutputRef),
    Join(Vec<Value>),
}

impl Value {
    pub fn literal(value: impl Into<String>) -> Self {
        Value::Literal(value.into())
    }

    fn collect_refs<'a>(&'a self, refs: &mut Vec<&'a OutputRef>) {
        match self {
            Value::Literal(_) => {}
            Value::Ref(r) => refs.push(r),
            Value::Join(parts) => parts.iter().for_each(|p| p.collect_refs(refs)),
        }
    }

    pub fn refs(&self) -> Vec<&OutputRef> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    pub fn resolve<F>(&self, lookup: &F) -> Result<String>
    where
        F: Fn(&OutputRef) -> Result<String>,
    {
        match self {
            Value::Literal(s) => Ok(s.clone()),
            Value::Ref(r) => lookup(r),
            Value::Join(parts) => parts
                .iter()
                .map(|p| p.resolve(lookup))
                .collect::<Result<Vec<_>>>()
                .map(|resolved| resolved.concat()),
        }
    }

    pub fn template(&self) -> serde_json::Value {
        match self {
            Value::Literal(s) => serde_json::Value::String(s.clone()),
            Value::Ref(r) => serde_json::json!({ "Ref": r.token() }),
            Value::Join(parts) => {
                serde_json::json!({ "Join": parts.iter().map(Value::template).collect::<Vec<_>>() })
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Literal(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Literal(value)
    }
}

impl From<OutputRef> for Value {
    fn from(value: OutputRef) -> Self {
        Value::Ref(value)
    }
}

/// 單元屬性樹；葉節點可以是延遲引用
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Value(Value),
    Number(i64),
    Bool(bool),
    List(Vec<Property>),
    Map(BTreeMap<String, Property>),
}

impl Property {
    pub fn list<I, P>(items: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Property>,
    {
        Property::List(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Property>,
    {
        Property::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn refs(&self) -> Vec<&OutputRef> {
        match self {
            Property::Value(v) => v.refs(),
            Property::Number(_) | Property::Bool(_) => Vec::new(),
            Property::List(items) => items.iter().flat_map(Property::refs).collect(),
            Property::Map(entries) => entries.values().flat_map(Property::refs).collect(),
        }
    }

    pub fn template(&self) -> serde_json::Value {
        match self {
            Property::Value(v) => v.template(),
            Property::Number(n) => serde_json::Value::from(*n),
            Property::Bool(b) => serde_json::Value::Bool(*b),
            Property::List(items) => {
                serde_json::Value::Array(items.iter().map(Property::template).collect())
            }
            Property::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.template()))
                    .collect(),
            ),
        }
    }

    pub fn resolve<F>(&self, lookup: &F) -> Result<serde_json::Value>
    where
        F: Fn(&OutputRef) -> Result<String>,
    {
        Ok(match self {
            Property::Value(v) => serde_json::Value::String(v.resolve(lookup)?),
            Property::Number(n) => serde_json::Value::from(*n),
            Property::Bool(b) => serde_json::Value::Bool(*b),
            Property::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|p| p.resolve(lookup))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Property::Map(entries) => {
                let mut object = serde_json::Map::new();
                for (key, value) in entries {
                    object.insert(key.clone(), value.resolve(lookup)?);
                }
                serde_json::Value::Object(object)
            }
        })
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Property::Value(value)
    }
}

impl From<OutputRef> for Property {
    fn from(value: OutputRef) -> Self {
        Property::Value(Value::Ref(value))
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Property::Value(Value::from(value))
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Property::Value(Value::from(value))
    }
}

impl From<i64> for Property {
    fn from(value: i64) -> Self {
        Property::Number(value)
    }
}

impl From<u32> for Property {
    fn from(value: u32) -> Self {
        Property::Number(i64::from(value))
    }
}

impl From<bool> for Property {
    fn from(value: bool) -> Self {
        Property::Bool(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

impl PolicyStatement {
    /// 對所有資源 (`*`) 授權
    pub fn allow_all_resources(actions: &[&str]) -> Self {
        Self {
            effect: Effect::Allow,
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProvisioningUnit {
    id: UnitId,
    kind: UnitKind,
    properties: BTreeMap<String, Property>,
    outputs: Vec<String>,
    depends_on: BTreeSet<UnitId>,
    permissions: Vec<PolicyStatement>,
    materialized: bool,
    resolved_outputs: HashMap<String, String>,
}

impl ProvisioningUnit {
    pub fn new(id: UnitId, kind: UnitKind) -> Self {
        Self {
            id,
            kind,
            properties: BTreeMap::new(),
            outputs: Vec::new(),
            depends_on: BTreeSet::new(),
            permissions: Vec::new(),
            materialized: false,
            resolved_outputs: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Property>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn with_output(mut self, name: &str) -> Self {
        if !self.outputs.iter().any(|o| o == name) {
            self.outputs.push(name.to_string());
        }
        self
    }

    pub fn with_dependency(mut self, unit: &UnitId) -> Self {
        self.depends_on.insert(unit.clone());
        self
    }

    pub fn with_permission(mut self, statement: PolicyStatement) -> Self {
        self.permissions.push(statement);
        self
    }

    pub fn id(&self) -> &UnitId {
        &self.id
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn properties(&self) -> &BTreeMap<String, Property> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn declared_outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn explicit_dependencies(&self) -> &BTreeSet<UnitId> {
        &self.depends_on
    }

    pub fn permissions(&self) -> &[PolicyStatement] {
        &self.permissions
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub fn resolved_output(&self, name: &str) -> Option<&str> {
        self.resolved_outputs.get(name).map(String::as_str)
    }

    /// 取得已宣告輸出的延遲引用
    pub fn output(&self, name: &str) -> Result<OutputRef> {
        if !self.outputs.iter().any(|o| o == name) {
            return Err(DeployError::UnknownOutput {
                unit: self.id.to_string(),
                output: name.to_string(),
            });
        }
        Ok(OutputRef {
            unit: self.id.clone(),
            output: name.to_string(),
        })
    }

    /// 屬性中引用到的單元（隱含的資料依賴）
    pub fn referenced_units(&self) -> BTreeSet<UnitId> {
        self.properties
            .values()
            .flat_map(Property::refs)
            .map(|r| r.unit.clone())
            .filter(|unit| unit != &self.id)
            .collect()
    }

    pub fn property_refs(&self) -> Vec<&OutputRef> {
        self.properties.values().flat_map(Property::refs).collect()
    }

    /// 明確依賴與隱含依賴的聯集
    pub fn edges(&self) -> BTreeSet<UnitId> {
        let mut edges = self.depends_on.clone();
        edges.extend(self.referenced_units());
        edges
    }

    pub(crate) fn add_dependency(&mut self, unit: UnitId) {
        self.depends_on.insert(unit);
    }

    pub(crate) fn mark_materialized(&mut self, outputs: HashMap<String, String>) {
        self.resolved_outputs = outputs;
        self.materialized = true;
    }
}

/// 交給外部佈建引擎的單元描述，所有引用都已解析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedUnit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub permissions: Vec<PolicyStatement>,
    pub outputs: Vec<String>,
}

impl ResolvedUnit {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedOutput {
    pub name: String,
    pub value: String,
}

/// 部署完成後公開的輸出，保留發佈順序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentOutputs {
    entries: Vec<PublishedOutput>,
}

impl DeploymentOutputs {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push(PublishedOutput {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PublishedOutput> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
