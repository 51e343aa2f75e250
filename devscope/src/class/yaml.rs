//! Declarative schema of device class files.
//!
//! These types mirror the YAML one to one and are deliberately permissive:
//! every cross-field rule (a `snmpget` reader needs an `oid`, a regex must
//! compile, ...) is checked when the definition is converted into the
//! runtime model. Polymorphic nodes (conditions, OID readers, operator
//! values) are parsed by probing which keys are present.
//!
//! ```yaml
//! name: routerOS
//! match:
//!   logical_operator: OR
//!   conditions:
//!     - type: SysDescription
//!       match_mode: contains
//!       values: [RouterOS]
//! identify:
//!   properties:
//!     vendor:
//!       - detection: constant
//!         value: Mikrotik
//! ```

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value as Yaml;

use crate::condition::LogicalOperator;
use crate::matcher::MatchMode;
use crate::model::Component;
use crate::oid::Oid;

/// A scalar from a class file. Numbers and booleans are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scalar(pub String);

impl Scalar {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar(s.to_string())
    }
}

impl Serialize for Scalar {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Yaml::deserialize(deserializer)? {
            Yaml::String(s) => Ok(Scalar(s)),
            Yaml::Number(n) => Ok(Scalar(n.to_string())),
            Yaml::Bool(b) => Ok(Scalar(b.to_string())),
            Yaml::Null => Ok(Scalar(String::new())),
            other => Err(de::Error::custom(format!(
                "expected a scalar, found {}",
                yaml_kind(&other)
            ))),
        }
    }
}

fn yaml_kind(value: &Yaml) -> &'static str {
    match value {
        Yaml::Null => "null",
        Yaml::Bool(_) => "a boolean",
        Yaml::Number(_) => "a number",
        Yaml::String(_) => "a string",
        Yaml::Sequence(_) => "a list",
        Yaml::Mapping(_) => "a mapping",
        Yaml::Tagged(_) => "a tagged value",
    }
}

fn has_key(value: &Yaml, key: &str) -> bool {
    value.as_mapping().is_some_and(|m| m.contains_key(key))
}

/// One device class file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub name: String,

    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionDef>,

    #[serde(default, skip_serializing_if = "IdentifyDef::is_empty")]
    pub identify: IdentifyDef,

    #[serde(default, skip_serializing_if = "ConfigDef::is_empty")]
    pub config: ConfigDef,

    #[serde(default, skip_serializing_if = "ComponentsDef::is_empty")]
    pub components: ComponentsDef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifyDef {
    #[serde(default)]
    pub properties: IdentifyPropertiesDef,
}

impl IdentifyDef {
    fn is_empty(&self) -> bool {
        self.properties == IdentifyPropertiesDef::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifyPropertiesDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_series: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<ReaderList>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDef {
    #[serde(default, skip_serializing_if = "SnmpTuningDef::is_empty")]
    pub snmp: SnmpTuningDef,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub components: IndexMap<Component, bool>,
}

impl ConfigDef {
    fn is_empty(&self) -> bool {
        self.snmp.is_empty() && self.components.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnmpTuningDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_repetitions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_oids: Option<usize>,
}

impl SnmpTuningDef {
    fn is_empty(&self) -> bool {
        self.max_repetitions.is_none() && self.max_oids.is_none()
    }
}

/// A list of readers; a single reader is accepted as a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReaderList(pub Vec<ReaderDef>);

impl<'de> Deserialize<'de> for ReaderList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Yaml::deserialize(deserializer)?;
        let readers = if value.is_sequence() {
            Vec::<ReaderDef>::deserialize(value).map_err(de::Error::custom)?
        } else {
            vec![ReaderDef::deserialize(value).map_err(de::Error::custom)?]
        };
        Ok(ReaderList(readers))
    }
}

/// How a property reader obtains its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionKind {
    #[serde(rename = "snmpget")]
    SnmpGet,
    #[serde(rename = "constant")]
    Constant,
    #[serde(rename = "SysObjectID", alias = "sysObjectID")]
    SysObjectId,
    #[serde(rename = "SysDescription", alias = "sysDescription")]
    SysDescription,
    #[serde(rename = "Vendor", alias = "vendor")]
    Vendor,
    #[serde(rename = "Model", alias = "model")]
    Model,
    #[serde(rename = "ModelSeries", alias = "modelSeries")]
    ModelSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderDef {
    pub detection: DetectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<Oid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_raw_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operators: Vec<OperatorDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_condition: Option<ConditionDef>,
}

/// A match condition: a single probe or a set of conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConditionDef {
    Set(ConditionSetDef),
    Probe(ProbeConditionDef),
}

impl<'de> Deserialize<'de> for ConditionDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Yaml::deserialize(deserializer)?;
        let is_set = has_key(&value, "conditions")
            || value.get("type").and_then(Yaml::as_str) == Some("conditionSet");
        if is_set {
            ConditionSetDef::deserialize(value)
                .map(ConditionDef::Set)
                .map_err(de::Error::custom)
        } else {
            ProbeConditionDef::deserialize(value)
                .map(ConditionDef::Probe)
                .map_err(de::Error::custom)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSetDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<LogicalOperator>,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionKind {
    #[serde(rename = "SysObjectID", alias = "sysObjectID")]
    SysObjectId,
    #[serde(rename = "SysDescription", alias = "sysDescription")]
    SysDescription,
    #[serde(rename = "snmpget")]
    SnmpGet,
    #[serde(rename = "HttpGetBody", alias = "httpGetBody")]
    HttpGetBody,
    #[serde(rename = "Vendor", alias = "vendor")]
    Vendor,
    #[serde(rename = "Model", alias = "model")]
    Model,
    #[serde(rename = "ModelSeries", alias = "modelSeries")]
    ModelSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConditionDef {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<Oid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_raw_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperatorKind {
    Filter,
    Modify,
    Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModifyMethod {
    RegexSubmatch,
    RegexReplace,
    ToUpperCase,
    ToLowerCase,
    Overwrite,
    AddPrefix,
    AddSuffix,
    InsertReadValue,
    Map,
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SwitchValueKind {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "snmpwalkCount")]
    SnmpWalkCount,
}

/// One pipeline step. Which fields apply depends on `type` and
/// `modify_method`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorDef {
    #[serde(rename = "type")]
    pub kind: OperatorKind,

    #[serde(default, alias = "filter_method", skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modify_method: Option<ModifyMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch_mode: Option<MatchMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch_value: Option<SwitchValueKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<OperandDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<MappingsDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_on_mismatch: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_value: Option<ReaderList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<Oid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_result_filter: Option<ResultFilterDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_oid_for_filter: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cases: Vec<CaseDef>,

    #[serde(default, alias = "return_on_error", skip_serializing_if = "Option::is_none")]
    pub return_on_mismatch: Option<bool>,
}

impl OperatorDef {
    /// An operator of `kind` with every option unset.
    pub fn new(kind: OperatorKind) -> Self {
        Self {
            kind,
            match_mode: None,
            modify_method: None,
            switch_mode: None,
            switch_value: None,
            regex: None,
            format: None,
            replace: None,
            value: None,
            mappings: None,
            ignore_on_mismatch: None,
            read_value: None,
            oid: None,
            snmp_result_filter: None,
            use_oid_for_filter: None,
            cases: Vec::new(),
            return_on_mismatch: None,
        }
    }
}

/// Operand of filters and modifiers: a literal or readers producing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperandDef {
    Scalar(Scalar),
    Readers(ReaderList),
}

impl<'de> Deserialize<'de> for OperandDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Yaml::deserialize(deserializer)?;
        if value.is_mapping() || value.is_sequence() {
            ReaderList::deserialize(value)
                .map(OperandDef::Readers)
                .map_err(de::Error::custom)
        } else {
            Scalar::deserialize(value)
                .map(OperandDef::Scalar)
                .map_err(de::Error::custom)
        }
    }
}

/// Mappings of a `map` modifier: a mapping file name or inline pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MappingsDef {
    File(String),
    Inline(IndexMap<Scalar, Scalar>),
}

impl<'de> Deserialize<'de> for MappingsDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Yaml::deserialize(deserializer)? {
            Yaml::String(file) => Ok(MappingsDef::File(file)),
            value @ Yaml::Mapping(_) => IndexMap::<Scalar, Scalar>::deserialize(value)
                .map(MappingsDef::Inline)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "mappings must be a file name or a mapping, found {}",
                yaml_kind(&other)
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFilterDef {
    #[serde(alias = "filter_method")]
    pub match_mode: MatchMode,
    pub value: Scalar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDef {
    pub case: Scalar,
    #[serde(default)]
    pub operators: Vec<OperatorDef>,
}

/// An indexed table reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReaderDef {
    #[serde(default = "snmpwalk")]
    pub detection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Oid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_values: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_empty: Option<bool>,
    #[serde(default)]
    pub values: IndexMap<String, OidReaderDef>,
}

fn snmpwalk() -> String {
    "snmpwalk".to_string()
}

/// A node of a group reader's OID tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OidReaderDef {
    Ignore(IgnoreDef),
    Map(OidMapDef),
    Leaf(LeafDef),
}

impl<'de> Deserialize<'de> for OidReaderDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Yaml::deserialize(deserializer)?;
        if value.get("ignore").and_then(Yaml::as_bool) == Some(true) {
            return Ok(OidReaderDef::Ignore(IgnoreDef { ignore: true }));
        }
        if has_key(&value, "values") {
            OidMapDef::deserialize(value)
                .map(OidReaderDef::Map)
                .map_err(de::Error::custom)
        } else {
            LeafDef::deserialize(value)
                .map(OidReaderDef::Leaf)
                .map_err(de::Error::custom)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoreDef {
    pub ignore: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OidMapDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_values: Option<bool>,
    pub values: IndexMap<String, OidReaderDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafDef {
    pub oid: Oid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_raw_result: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operators: Vec<OperatorDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices_mapping: Option<Box<LeafDef>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentsDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<InterfacesDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ups: Option<UpsDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<TableDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbc: Option<SbcDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<TableDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_health: Option<HardwareHealthDef>,
}

impl ComponentsDef {
    fn is_empty(&self) -> bool {
        *self == ComponentsDef::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfacesDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Oid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<GroupReaderDef>,
}

/// A component that is a single table (`cpu`, `disk`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<GroupReaderDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ReaderList>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procs: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<ReaderList>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_low_voltage_disconnect: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_amperage: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_capacity: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_current: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_remaining_time: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_temperature: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_voltage: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_load: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mains_voltage_applied: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rectifier_current: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_voltage: Option<ReaderList>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SbcDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<GroupReaderDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realms: Option<GroupReaderDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_call_per_second: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_concurrent_sessions: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_local_contacts: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcoding_capacity: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_capacity: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_redundancy: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_health_score: Option<ReaderList>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareHealthDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_monitor_state: Option<ReaderList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fans: Option<GroupReaderDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_supply: Option<GroupReaderDef>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const CLASS: &str = r#"
name: routerOS
match:
  logical_operator: OR
  conditions:
    - type: SysObjectID
      match_mode: startsWith
      values:
        - .1.3.6.1.4.1.14988.1
    - type: SysDescription
      match_mode: contains
      values: [RouterOS]
identify:
  properties:
    vendor:
      detection: constant
      value: Mikrotik
    os_version:
      - detection: SysDescription
        operators:
          - type: modify
            modify_method: regexSubmatch
            regex: 'RouterOS ([0-9.]+)'
            format: "$1"
            return_on_error: true
config:
  snmp:
    max_repetitions: 20
  components:
    interfaces: true
    cpu: false
components:
  interfaces:
    count: 1.3.6.1.2.1.2.1.0
    properties:
      detection: snmpwalk
      values:
        ifDescr:
          oid: 1.3.6.1.2.1.2.2.1.2
        ifSpeed:
          oid: 1.3.6.1.2.1.2.2.1.5
          operators:
            - type: modify
              modify_method: multiply
              value:
                detection: constant
                value: 1000
        radio:
          values:
            level_in:
              oid: 1.3.6.1.4.1.2281.10.5.1.1.2
        ifAlias:
          ignore: true
"#;

    #[test]
    fn test_parse_class_file() {
        let class: ClassDefinition = serde_yaml::from_str(CLASS).unwrap();
        assert_eq!(class.name, "routerOS");

        let Some(ConditionDef::Set(set)) = &class.condition else {
            panic!("expected a condition set");
        };
        assert_eq!(set.logical_operator, Some(LogicalOperator::Or));
        assert_eq!(set.conditions.len(), 2);

        let vendor = class.identify.properties.vendor.as_ref().unwrap();
        assert_eq!(vendor.0.len(), 1);
        assert_eq!(vendor.0[0].value, Some(Scalar::from("Mikrotik")));

        let os = &class.identify.properties.os_version.as_ref().unwrap().0[0];
        assert_eq!(os.operators[0].return_on_mismatch, Some(true));
        assert_eq!(os.operators[0].modify_method, Some(ModifyMethod::RegexSubmatch));

        assert_eq!(class.config.snmp.max_repetitions, Some(20));
        assert_eq!(class.config.components.get(&Component::Cpu), Some(&false));

        let interfaces = class.components.interfaces.as_ref().unwrap();
        let values = &interfaces.properties.as_ref().unwrap().values;
        assert!(matches!(values["ifDescr"], OidReaderDef::Leaf(_)));
        assert!(matches!(values["radio"], OidReaderDef::Map(_)));
        assert!(matches!(values["ifAlias"], OidReaderDef::Ignore(_)));

        let OidReaderDef::Leaf(speed) = &values["ifSpeed"] else {
            panic!("expected a leaf");
        };
        assert!(matches!(speed.operators[0].value, Some(OperandDef::Readers(_))));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let class: ClassDefinition = serde_yaml::from_str(CLASS).unwrap();
        let text = serde_yaml::to_string(&class).unwrap();
        let again: ClassDefinition = serde_yaml::from_str(&text).unwrap();
        assert_eq!(class, again);
    }

    #[test]
    fn test_set_without_type_key() {
        let set: ConditionDef = serde_yaml::from_str(
            "conditions:\n  - type: Vendor\n    match_mode: equals\n    values: [Mikrotik]\n",
        )
        .unwrap();
        assert!(matches!(set, ConditionDef::Set(ConditionSetDef { logical_operator: None, .. })));

        let typed: ConditionDef = serde_yaml::from_str("type: conditionSet\n").unwrap();
        assert!(matches!(typed, ConditionDef::Set(ref s) if s.conditions.is_empty()));
    }

    #[test]
    fn test_inline_mappings_and_scalars() {
        let op: OperatorDef = serde_yaml::from_str(
            "type: modify\nmodify_method: map\nmappings:\n  1: up\n  2: down\nignore_on_mismatch: true\n",
        )
        .unwrap();
        let Some(MappingsDef::Inline(map)) = op.mappings else {
            panic!("expected inline mappings");
        };
        assert_eq!(map.get(&Scalar::from("2")), Some(&Scalar::from("down")));

        let file: OperatorDef =
            serde_yaml::from_str("type: modify\nmodify_method: map\nmappings: ifType.yaml\n").unwrap();
        assert_eq!(file.mappings, Some(MappingsDef::File("ifType.yaml".into())));
    }

    #[test]
    fn test_filter_method_alias() {
        let op: OperatorDef =
            serde_yaml::from_str("type: filter\nfilter_method: '!equals'\nvalue: 0\n").unwrap();
        assert_eq!(op.match_mode, Some(MatchMode::NotEquals));
        assert_eq!(op.value, Some(OperandDef::Scalar(Scalar::from("0"))));
    }
}
