//! Turning class definitions into runtime readers and conditions.
//!
//! Two steps happen here. [`inherit`] folds a parent's definition into its
//! child's where inheritance is declarative (configuration and table
//! readers). [`Converter`] then validates the effective definition and
//! compiles it: regexes are compiled, mapping files resolved and every
//! reader checked against the identify stage it runs in.

use indexmap::IndexMap;

use super::mapping::{MappingStore, from_scalars};
use super::yaml::*;
use super::{Property, SbcField, Table, UpsField};
use crate::condition::{Condition, LogicalOperator};
use crate::context::IdentityField;
use crate::error::ClassError;
use crate::matcher::{MatchMode, StringMatcher, compile};
use crate::operator::{
    ArithmeticOp, Modifier, Operator, OperatorPipeline, Switch, SwitchCase, SwitchValue,
};
use crate::reader::{
    Detection, GroupReader, LeafReader, OidReader, PropertyReader, ReaderSet, Stage,
};
use crate::value::Value;

/// Fold the inheritable parts of `parent` into `child`.
///
/// Scalar configuration is overridden per key. Table readers are merged
/// label by label unless the child sets `inherit_values: false`. Property
/// readers are not merged; the parent's readers act as fallback at read
/// time.
pub(crate) fn inherit(child: &ClassDefinition, parent: &ClassDefinition) -> ClassDefinition {
    let mut merged = child.clone();

    let snmp = &mut merged.config.snmp;
    snmp.max_repetitions = snmp.max_repetitions.or(parent.config.snmp.max_repetitions);
    snmp.max_oids = snmp.max_oids.or(parent.config.snmp.max_oids);

    let mut components = parent.config.components.clone();
    for (component, enabled) in &child.config.components {
        components.insert(*component, *enabled);
    }
    merged.config.components = components;

    let ours = &mut merged.components;
    let theirs = &parent.components;

    if let Some(parent_if) = &theirs.interfaces {
        let child_if = ours.interfaces.get_or_insert_with(InterfacesDef::default);
        child_if.count = child_if.count.clone().or_else(|| parent_if.count.clone());
        child_if.properties =
            merge_group(child_if.properties.take(), parent_if.properties.as_ref());
    }
    if let Some(parent_cpu) = &theirs.cpu {
        let child_cpu = ours.cpu.get_or_insert_with(TableDef::default);
        child_cpu.properties =
            merge_group(child_cpu.properties.take(), parent_cpu.properties.as_ref());
    }
    if let Some(parent_disk) = &theirs.disk {
        let child_disk = ours.disk.get_or_insert_with(TableDef::default);
        child_disk.properties =
            merge_group(child_disk.properties.take(), parent_disk.properties.as_ref());
    }
    if let Some(parent_sbc) = &theirs.sbc {
        let child_sbc = ours.sbc.get_or_insert_with(SbcDef::default);
        child_sbc.agents = merge_group(child_sbc.agents.take(), parent_sbc.agents.as_ref());
        child_sbc.realms = merge_group(child_sbc.realms.take(), parent_sbc.realms.as_ref());
    }
    if let Some(parent_hh) = &theirs.hardware_health {
        let child_hh = ours.hardware_health.get_or_insert_with(HardwareHealthDef::default);
        child_hh.fans = merge_group(child_hh.fans.take(), parent_hh.fans.as_ref());
        child_hh.power_supply =
            merge_group(child_hh.power_supply.take(), parent_hh.power_supply.as_ref());
    }

    merged
}

fn merge_group(
    child: Option<GroupReaderDef>,
    parent: Option<&GroupReaderDef>,
) -> Option<GroupReaderDef> {
    match (child, parent) {
        (None, parent) => parent.cloned().map(strip_ignored_group),
        (Some(child), None) => Some(strip_ignored_group(child)),
        (Some(child), Some(_)) if child.inherit_values == Some(false) => {
            Some(strip_ignored_group(child))
        }
        (Some(child), Some(parent)) => Some(GroupReaderDef {
            detection: child.detection,
            index: child.index.or_else(|| parent.index.clone()),
            inherit_values: child.inherit_values,
            skip_empty: child.skip_empty.or(parent.skip_empty),
            values: merge_values(child.values, &parent.values),
        }),
    }
}

fn merge_values(
    child: IndexMap<String, OidReaderDef>,
    parent: &IndexMap<String, OidReaderDef>,
) -> IndexMap<String, OidReaderDef> {
    let mut merged: IndexMap<String, OidReaderDef> = parent.clone();
    for (label, node) in child {
        let inherited = merged.get(&label).cloned();
        let node = match (node, inherited) {
            (OidReaderDef::Ignore(_), _) => {
                merged.shift_remove(&label);
                continue;
            }
            (OidReaderDef::Map(child_map), Some(OidReaderDef::Map(parent_map)))
                if child_map.inherit_values != Some(false) =>
            {
                OidReaderDef::Map(OidMapDef {
                    inherit_values: child_map.inherit_values,
                    values: merge_values(child_map.values, &parent_map.values),
                })
            }
            (node, _) => node,
        };
        merged.insert(label, node);
    }
    strip_ignored(merged)
}

fn strip_ignored_group(mut group: GroupReaderDef) -> GroupReaderDef {
    group.values = strip_ignored(group.values);
    group
}

fn strip_ignored(values: IndexMap<String, OidReaderDef>) -> IndexMap<String, OidReaderDef> {
    values
        .into_iter()
        .filter_map(|(label, node)| match node {
            OidReaderDef::Ignore(_) => None,
            OidReaderDef::Map(map) => Some((
                label,
                OidReaderDef::Map(OidMapDef {
                    inherit_values: map.inherit_values,
                    values: strip_ignored(map.values),
                }),
            )),
            leaf => Some((label, leaf)),
        })
        .collect()
}

/// Everything a class compiles into.
#[derive(Debug, Default)]
pub(crate) struct Compiled {
    pub condition: Option<Condition>,
    pub properties: std::collections::HashMap<Property, ReaderSet>,
    pub tables: std::collections::HashMap<Table, GroupReader>,
}

/// Compiles one class definition.
pub(crate) struct Converter<'a> {
    class: &'a str,
    mappings: &'a MappingStore,
}

impl<'a> Converter<'a> {
    pub fn new(class: &'a str, mappings: &'a MappingStore) -> Self {
        Self { class, mappings }
    }

    fn invalid(&self, message: impl Into<String>) -> ClassError {
        ClassError::invalid(self.class, message)
    }

    /// Validate and compile an effective definition.
    pub fn compile(&self, def: &ClassDefinition, is_root: bool) -> Result<Compiled, ClassError> {
        if def.name.is_empty() {
            return Err(self.invalid("name must not be empty"));
        }
        if def.name.contains('/') {
            return Err(self.invalid("name must not contain '/'"));
        }

        let mut compiled = Compiled::default();

        if is_root {
            if def.identify.properties != IdentifyPropertiesDef::default() {
                return Err(self.invalid("the root class must not define identify properties"));
            }
        } else {
            let condition = def
                .condition
                .as_ref()
                .ok_or_else(|| self.invalid("missing match condition"))?;
            compiled.condition = Some(self.condition(condition, Stage::Default)?);
        }

        let identify = &def.identify.properties;
        let stages = [
            (Property::Vendor, &identify.vendor, Stage::Vendor),
            (Property::Model, &identify.model, Stage::Model),
            (Property::ModelSeries, &identify.model_series, Stage::ModelSeries),
            (Property::SerialNumber, &identify.serial_number, Stage::Default),
            (Property::OsVersion, &identify.os_version, Stage::Default),
        ];
        for (property, readers, stage) in stages {
            self.add_readers(&mut compiled, property, readers.as_ref(), stage)?;
        }

        let components = &def.components;
        if let Some(interfaces) = &components.interfaces {
            if let Some(count) = &interfaces.count {
                let reader = PropertyReader::new(Detection::SnmpGet {
                    oid: count.clone(),
                    use_raw_result: false,
                });
                compiled
                    .properties
                    .insert(Property::InterfaceCount, ReaderSet::new(vec![reader]));
            }
            self.add_table(&mut compiled, Table::Interfaces, interfaces.properties.as_ref())?;
        }
        if let Some(cpu) = &components.cpu {
            self.add_table(&mut compiled, Table::Cpu, cpu.properties.as_ref())?;
        }
        if let Some(disk) = &components.disk {
            self.add_table(&mut compiled, Table::Disk, disk.properties.as_ref())?;
        }
        if let Some(memory) = &components.memory {
            self.add_default(&mut compiled, Property::MemoryUsage, &memory.usage)?;
        }
        if let Some(server) = &components.server {
            self.add_default(&mut compiled, Property::ServerProcs, &server.procs)?;
            self.add_default(&mut compiled, Property::ServerUsers, &server.users)?;
        }
        if let Some(ups) = &components.ups {
            let fields = [
                (UpsField::AlarmLowVoltageDisconnect, &ups.alarm_low_voltage_disconnect),
                (UpsField::BatteryAmperage, &ups.battery_amperage),
                (UpsField::BatteryCapacity, &ups.battery_capacity),
                (UpsField::BatteryCurrent, &ups.battery_current),
                (UpsField::BatteryRemainingTime, &ups.battery_remaining_time),
                (UpsField::BatteryTemperature, &ups.battery_temperature),
                (UpsField::BatteryVoltage, &ups.battery_voltage),
                (UpsField::CurrentLoad, &ups.current_load),
                (UpsField::MainsVoltageApplied, &ups.mains_voltage_applied),
                (UpsField::RectifierCurrent, &ups.rectifier_current),
                (UpsField::SystemVoltage, &ups.system_voltage),
            ];
            for (field, readers) in fields {
                self.add_default(&mut compiled, Property::Ups(field), readers)?;
            }
        }
        if let Some(sbc) = &components.sbc {
            let fields = [
                (SbcField::GlobalCallPerSecond, &sbc.global_call_per_second),
                (SbcField::GlobalConcurrentSessions, &sbc.global_concurrent_sessions),
                (SbcField::ActiveLocalContacts, &sbc.active_local_contacts),
                (SbcField::TranscodingCapacity, &sbc.transcoding_capacity),
                (SbcField::LicenseCapacity, &sbc.license_capacity),
                (SbcField::SystemRedundancy, &sbc.system_redundancy),
                (SbcField::SystemHealthScore, &sbc.system_health_score),
            ];
            for (field, readers) in fields {
                self.add_default(&mut compiled, Property::Sbc(field), readers)?;
            }
            self.add_table(&mut compiled, Table::SbcAgents, sbc.agents.as_ref())?;
            self.add_table(&mut compiled, Table::SbcRealms, sbc.realms.as_ref())?;
        }
        if let Some(health) = &components.hardware_health {
            self.add_default(
                &mut compiled,
                Property::EnvironmentMonitorState,
                &health.environment_monitor_state,
            )?;
            self.add_table(&mut compiled, Table::Fans, health.fans.as_ref())?;
            self.add_table(&mut compiled, Table::PowerSupply, health.power_supply.as_ref())?;
        }

        Ok(compiled)
    }

    fn add_readers(
        &self,
        compiled: &mut Compiled,
        property: Property,
        readers: Option<&ReaderList>,
        stage: Stage,
    ) -> Result<(), ClassError> {
        if let Some(readers) = readers {
            let set = self.reader_set(readers, stage)?;
            if !set.is_empty() {
                compiled.properties.insert(property, set);
            }
        }
        Ok(())
    }

    fn add_default(
        &self,
        compiled: &mut Compiled,
        property: Property,
        readers: &Option<ReaderList>,
    ) -> Result<(), ClassError> {
        self.add_readers(compiled, property, readers.as_ref(), Stage::Default)
    }

    fn add_table(
        &self,
        compiled: &mut Compiled,
        table: Table,
        def: Option<&GroupReaderDef>,
    ) -> Result<(), ClassError> {
        if let Some(def) = def {
            compiled.tables.insert(table, self.group_reader(def)?);
        }
        Ok(())
    }

    pub fn condition(&self, def: &ConditionDef, stage: Stage) -> Result<Condition, ClassError> {
        match def {
            ConditionDef::Set(set) => {
                if set.conditions.is_empty() {
                    return Err(self.invalid("condition set without conditions"));
                }
                let conditions = set
                    .conditions
                    .iter()
                    .map(|c| self.condition(c, stage))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Condition::Set {
                    operator: set.logical_operator.unwrap_or(LogicalOperator::Or),
                    conditions,
                })
            }
            ConditionDef::Probe(probe) => {
                if probe.values.is_empty() {
                    return Err(self.invalid(format!("{:?} condition without values", probe.kind)));
                }
                // sysObjectID values are written with or without the leading dot
                let values: Vec<Scalar> = match probe.kind {
                    ConditionKind::SysObjectId => probe
                        .values
                        .iter()
                        .map(|v| Scalar::from(v.as_str().trim_start_matches('.')))
                        .collect(),
                    _ => probe.values.clone(),
                };
                let matcher = self.matcher(probe.match_mode.unwrap_or_default(), &values)?;
                Ok(match probe.kind {
                    ConditionKind::SysObjectId => Condition::SysObjectId(matcher),
                    ConditionKind::SysDescription => Condition::SysDescription(matcher),
                    ConditionKind::SnmpGet => Condition::SnmpGet {
                        oid: probe
                            .oid
                            .clone()
                            .ok_or_else(|| self.invalid("snmpget condition without oid"))?,
                        use_raw_result: probe.use_raw_result.unwrap_or(false),
                        matcher,
                    },
                    ConditionKind::HttpGetBody => Condition::HttpGetBody {
                        uri: probe
                            .uri
                            .clone()
                            .ok_or_else(|| self.invalid("HttpGetBody condition without uri"))?,
                        matcher,
                    },
                    ConditionKind::Vendor => self.identity(IdentityField::Vendor, matcher, stage)?,
                    ConditionKind::Model => self.identity(IdentityField::Model, matcher, stage)?,
                    ConditionKind::ModelSeries => {
                        self.identity(IdentityField::ModelSeries, matcher, stage)?
                    }
                })
            }
        }
    }

    fn identity(
        &self,
        field: IdentityField,
        matcher: StringMatcher,
        stage: Stage,
    ) -> Result<Condition, ClassError> {
        self.check_stage(field, stage)?;
        Ok(Condition::Identity { field, matcher })
    }

    fn check_stage(&self, field: IdentityField, stage: Stage) -> Result<(), ClassError> {
        if stage.allows(field) {
            Ok(())
        } else {
            Err(self.invalid(format!("{field} is not available while reading {stage:?}")))
        }
    }

    fn matcher(&self, mode: MatchMode, values: &[Scalar]) -> Result<StringMatcher, ClassError> {
        StringMatcher::new(mode, values.iter().map(|v| v.0.clone()).collect())
    }

    pub fn reader_set(&self, list: &ReaderList, stage: Stage) -> Result<ReaderSet, ClassError> {
        list.0.iter().map(|r| self.reader(r, stage)).collect()
    }

    fn reader(&self, def: &ReaderDef, stage: Stage) -> Result<PropertyReader, ClassError> {
        let detection = match def.detection {
            DetectionKind::Constant => Detection::Constant(Value::from(
                def.value
                    .as_ref()
                    .ok_or_else(|| self.invalid("constant reader without value"))?
                    .as_str(),
            )),
            DetectionKind::SnmpGet => Detection::SnmpGet {
                oid: def
                    .oid
                    .clone()
                    .ok_or_else(|| self.invalid("snmpget reader without oid"))?,
                use_raw_result: def.use_raw_result.unwrap_or(false),
            },
            DetectionKind::SysObjectId => Detection::SysObjectId,
            DetectionKind::SysDescription => Detection::SysDescription,
            DetectionKind::Vendor => self.identity_detection(IdentityField::Vendor, stage)?,
            DetectionKind::Model => self.identity_detection(IdentityField::Model, stage)?,
            DetectionKind::ModelSeries => {
                self.identity_detection(IdentityField::ModelSeries, stage)?
            }
        };

        let mut reader =
            PropertyReader::new(detection).with_operators(self.pipeline(&def.operators, stage)?);
        if let Some(condition) = &def.pre_condition {
            reader = reader.with_pre_condition(self.condition(condition, stage)?);
        }
        Ok(reader)
    }

    fn identity_detection(&self, field: IdentityField, stage: Stage) -> Result<Detection, ClassError> {
        self.check_stage(field, stage)?;
        Ok(Detection::Identity(field))
    }

    pub fn pipeline(
        &self,
        defs: &[OperatorDef],
        stage: Stage,
    ) -> Result<OperatorPipeline, ClassError> {
        defs.iter().map(|d| self.operator(d, stage)).collect()
    }

    fn operator(&self, def: &OperatorDef, stage: Stage) -> Result<Operator, ClassError> {
        let kind = match def.kind {
            OperatorKind::Filter => {
                let value = self.literal(def, "filter")?;
                let mode = def
                    .match_mode
                    .ok_or_else(|| self.invalid("filter operator without match_mode"))?;
                crate::operator::OperatorKind::Filter(StringMatcher::new(mode, vec![value])?)
            }
            OperatorKind::Modify => crate::operator::OperatorKind::Modify(self.modifier(def, stage)?),
            OperatorKind::Switch => crate::operator::OperatorKind::Switch(self.switch(def, stage)?),
        };
        Ok(Operator::new(kind).return_on_mismatch(def.return_on_mismatch.unwrap_or(false)))
    }

    fn literal(&self, def: &OperatorDef, what: &str) -> Result<String, ClassError> {
        match &def.value {
            Some(OperandDef::Scalar(s)) => Ok(s.0.clone()),
            Some(OperandDef::Readers(_)) => {
                Err(self.invalid(format!("{what} operator needs a literal value")))
            }
            None => Err(self.invalid(format!("{what} operator without value"))),
        }
    }

    fn operand(&self, def: &OperatorDef, stage: Stage) -> Result<ReaderSet, ClassError> {
        match &def.value {
            Some(OperandDef::Scalar(s)) => Ok(ReaderSet::new(vec![PropertyReader::new(
                Detection::Constant(Value::from(s.as_str())),
            )])),
            Some(OperandDef::Readers(list)) => self.reader_set(list, stage),
            None => Err(self.invalid("arithmetic operator without value")),
        }
    }

    fn required<'d>(&self, field: &'d Option<String>, message: &str) -> Result<&'d str, ClassError> {
        field.as_deref().ok_or_else(|| self.invalid(message))
    }

    fn modifier(&self, def: &OperatorDef, stage: Stage) -> Result<Modifier, ClassError> {
        let method = def
            .modify_method
            .ok_or_else(|| self.invalid("modify operator without modify_method"))?;
        Ok(match method {
            ModifyMethod::RegexSubmatch => Modifier::RegexSubmatch {
                regex: compile(self.required(&def.regex, "regexSubmatch without regex")?)?,
                format: self.required(&def.format, "regexSubmatch without format")?.to_string(),
            },
            ModifyMethod::RegexReplace => Modifier::RegexReplace {
                regex: compile(self.required(&def.regex, "regexReplace without regex")?)?,
                replace: def.replace.clone().unwrap_or_default(),
            },
            ModifyMethod::ToUpperCase => Modifier::ToUpperCase,
            ModifyMethod::ToLowerCase => Modifier::ToLowerCase,
            ModifyMethod::Overwrite => Modifier::Overwrite(self.literal(def, "overwrite")?),
            ModifyMethod::AddPrefix => Modifier::AddPrefix(self.literal(def, "addPrefix")?),
            ModifyMethod::AddSuffix => Modifier::AddSuffix(self.literal(def, "addSuffix")?),
            ModifyMethod::InsertReadValue => Modifier::InsertReadValue {
                format: self.required(&def.format, "insertReadValue without format")?.to_string(),
                read_value: self.reader_set(
                    def.read_value
                        .as_ref()
                        .ok_or_else(|| self.invalid("insertReadValue without read_value"))?,
                    stage,
                )?,
            },
            ModifyMethod::Map => {
                let mappings = match &def.mappings {
                    Some(MappingsDef::File(name)) => self.mappings.get(name)?,
                    Some(MappingsDef::Inline(map)) => {
                        std::sync::Arc::new(from_scalars(map.clone()))
                    }
                    None => return Err(self.invalid("map operator without mappings")),
                };
                Modifier::Map {
                    mappings,
                    ignore_on_mismatch: def.ignore_on_mismatch.unwrap_or(false),
                }
            }
            ModifyMethod::Add => self.arithmetic(ArithmeticOp::Add, def, stage)?,
            ModifyMethod::Subtract => self.arithmetic(ArithmeticOp::Subtract, def, stage)?,
            ModifyMethod::Multiply => self.arithmetic(ArithmeticOp::Multiply, def, stage)?,
            ModifyMethod::Divide => self.arithmetic(ArithmeticOp::Divide, def, stage)?,
        })
    }

    fn arithmetic(
        &self,
        op: ArithmeticOp,
        def: &OperatorDef,
        stage: Stage,
    ) -> Result<Modifier, ClassError> {
        Ok(Modifier::Arithmetic {
            op,
            operand: self.operand(def, stage)?,
        })
    }

    fn switch(&self, def: &OperatorDef, stage: Stage) -> Result<Switch, ClassError> {
        let mode = def
            .switch_mode
            .ok_or_else(|| self.invalid("switch operator without switch_mode"))?;
        if def.cases.is_empty() {
            return Err(self.invalid("switch operator without cases"));
        }

        let value = match def.switch_value.unwrap_or_default() {
            SwitchValueKind::Default => SwitchValue::Default,
            SwitchValueKind::SnmpWalkCount => SwitchValue::WalkCount {
                oid: def
                    .oid
                    .clone()
                    .ok_or_else(|| self.invalid("snmpwalkCount switch without oid"))?,
                filter: def
                    .snmp_result_filter
                    .as_ref()
                    .map(|f| StringMatcher::new(f.match_mode, vec![f.value.0.clone()]))
                    .transpose()?,
                use_oid: def.use_oid_for_filter.unwrap_or(false),
            },
        };

        let cases = def
            .cases
            .iter()
            .map(|case| {
                Ok(SwitchCase {
                    matcher: StringMatcher::new(mode, vec![case.case.0.clone()])?,
                    operators: self.pipeline(&case.operators, stage)?,
                })
            })
            .collect::<Result<Vec<_>, ClassError>>()?;

        Ok(Switch { value, cases })
    }

    pub fn group_reader(&self, def: &GroupReaderDef) -> Result<GroupReader, ClassError> {
        if def.detection != "snmpwalk" {
            return Err(self.invalid(format!(
                "unsupported group detection '{}'",
                def.detection
            )));
        }
        let mut reader = GroupReader::new(self.oid_tree(&def.values)?)
            .skip_empty(def.skip_empty.unwrap_or(false));
        if let Some(index) = &def.index {
            reader = reader.with_index(index.clone());
        }
        Ok(reader)
    }

    fn oid_tree(
        &self,
        values: &IndexMap<String, OidReaderDef>,
    ) -> Result<IndexMap<String, OidReader>, ClassError> {
        let mut tree = IndexMap::new();
        for (label, node) in values {
            let reader = match node {
                OidReaderDef::Ignore(_) => continue,
                OidReaderDef::Map(map) => OidReader::Map(self.oid_tree(&map.values)?),
                OidReaderDef::Leaf(leaf) => OidReader::Leaf(self.leaf(leaf)?),
            };
            tree.insert(label.clone(), reader);
        }
        Ok(tree)
    }

    fn leaf(&self, def: &LeafDef) -> Result<LeafReader, ClassError> {
        let mut leaf = LeafReader::new(def.oid.clone());
        leaf.use_raw_result = def.use_raw_result.unwrap_or(false);
        leaf.operators = self.pipeline(&def.operators, Stage::Default)?;
        if let Some(mapping) = &def.indices_mapping {
            leaf.indices_mapping = Some(Box::new(self.leaf(mapping)?));
        }
        Ok(leaf)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::OperationContext;

    fn def(yaml: &str) -> ClassDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn compile_err(yaml: &str) -> String {
        let store = MappingStore::new();
        Converter::new("test", &store)
            .compile(&def(yaml), false)
            .unwrap_err()
            .to_string()
    }

    #[test]
    fn test_inherit_config() {
        let parent = def(
            "name: generic\nconfig:\n  snmp:\n    max_repetitions: 10\n    max_oids: 60\n  components:\n    interfaces: true\n    cpu: true\n",
        );
        let child = def(
            "name: x\nconfig:\n  snmp:\n    max_repetitions: 25\n  components:\n    cpu: false\n",
        );
        let merged = inherit(&child, &parent);
        assert_eq!(merged.config.snmp.max_repetitions, Some(25));
        assert_eq!(merged.config.snmp.max_oids, Some(60));
        assert_eq!(merged.config.components.get(&crate::model::Component::Cpu), Some(&false));
        assert_eq!(
            merged.config.components.get(&crate::model::Component::Interfaces),
            Some(&true)
        );
    }

    #[test]
    fn test_inherit_group_values() {
        let parent = def(r#"
name: generic
components:
  interfaces:
    properties:
      values:
        ifDescr: { oid: 1.3.6.1.2.1.2.2.1.2 }
        ifAlias: { oid: 1.3.6.1.2.1.31.1.1.1.18 }
        radio:
          values:
            level_in: { oid: 1.3.6.1.4.1.1.1 }
            level_out: { oid: 1.3.6.1.4.1.1.2 }
"#);
        let child = def(r#"
name: x
components:
  interfaces:
    properties:
      values:
        ifAlias: { ignore: true }
        ifMtu: { oid: 1.3.6.1.2.1.2.2.1.4 }
        radio:
          values:
            level_out: { oid: 1.3.6.1.4.1.9.9 }
"#);
        let merged = inherit(&child, &parent);
        let values = &merged.components.interfaces.unwrap().properties.unwrap().values;
        assert_eq!(values.keys().collect::<Vec<_>>(), vec!["ifDescr", "radio", "ifMtu"]);
        let OidReaderDef::Map(radio) = &values["radio"] else {
            panic!("expected radio map");
        };
        assert_eq!(radio.values.len(), 2);
        let OidReaderDef::Leaf(out) = &radio.values["level_out"] else {
            panic!("expected leaf");
        };
        assert_eq!(out.oid.as_str(), "1.3.6.1.4.1.9.9");
    }

    #[test]
    fn test_inherit_values_false_replaces() {
        let parent = def("name: generic\ncomponents:\n  cpu:\n    properties:\n      values:\n        load: { oid: 1.3.6.1.2.1.25.3.3.1.2 }\n");
        let child = def("name: x\ncomponents:\n  cpu:\n    properties:\n      inherit_values: false\n      values:\n        temperature: { oid: 1.3.6.1.4.1.1 }\n");
        let merged = inherit(&child, &parent);
        let values = &merged.components.cpu.unwrap().properties.unwrap().values;
        assert_eq!(values.keys().collect::<Vec<_>>(), vec!["temperature"]);
    }

    #[test]
    fn test_validation_errors() {
        assert!(compile_err("name: x\n").contains("missing match condition"));
        assert!(compile_err("name: x\nmatch:\n  conditions: []\n").contains("without conditions"));
        assert!(
            compile_err("name: x\nmatch:\n  type: snmpget\n  values: [a]\n").contains("without oid")
        );
        assert!(compile_err("name: x/y\nmatch:\n  type: SysDescription\n  values: [a]\n")
            .contains("'/'"));
        assert!(compile_err(
            "name: x\nmatch:\n  type: SysDescription\n  match_mode: regex\n  values: ['(']\n"
        )
        .contains("Invalid regex"));
    }

    #[test]
    fn test_stage_validation() {
        let err = compile_err(
            "name: x\nmatch:\n  type: SysDescription\n  values: [a]\nidentify:\n  properties:\n    vendor:\n      - detection: Model\n",
        );
        assert!(err.contains("model is not available"));

        // model readers may depend on the vendor
        let store = MappingStore::new();
        let ok = def(
            "name: x\nmatch:\n  type: SysDescription\n  values: [a]\nidentify:\n  properties:\n    model:\n      - detection: Vendor\n",
        );
        assert!(Converter::new("x", &store).compile(&ok, false).is_ok());
    }

    #[test]
    fn test_root_rules() {
        let store = MappingStore::new();
        let converter = Converter::new("generic", &store);
        assert!(converter.compile(&def("name: generic\n"), true).unwrap().condition.is_none());
        let with_identify =
            def("name: generic\nidentify:\n  properties:\n    vendor:\n      detection: constant\n      value: x\n");
        assert!(converter.compile(&with_identify, true).is_err());
    }

    #[test]
    fn test_unknown_mapping_file() {
        assert!(compile_err(
            "name: x\nmatch:\n  type: SysDescription\n  values: [a]\nidentify:\n  properties:\n    model:\n      detection: SysDescription\n      operators:\n        - type: modify\n          modify_method: map\n          mappings: nope.yaml\n"
        )
        .contains("Unknown mapping"));
    }

    #[tokio::test]
    async fn test_compiled_readers_run() {
        let mut store = MappingStore::new();
        store.insert(
            "models.yaml",
            [("CHR".to_string(), "Cloud Hosted Router".to_string())].into_iter().collect(),
        );
        let definition = def(r#"
name: x
match:
  type: SysDescription
  values: [RouterOS]
identify:
  properties:
    model:
      - detection: constant
        value: "RouterOS CHR"
        operators:
          - type: modify
            modify_method: regexSubmatch
            regex: 'RouterOS (\w+)'
            format: "$1"
          - type: modify
            modify_method: map
            mappings: models
          - type: switch
            switch_mode: startsWith
            cases:
              - case: Cloud
                operators:
                  - type: modify
                    modify_method: addSuffix
                    value: " (virtual)"
"#);
        let compiled = Converter::new("x", &store).compile(&definition, false).unwrap();
        let ctx = OperationContext::new();
        let model = compiled.properties[&Property::Model].read(&ctx).await.unwrap();
        assert_eq!(model.to_string(), "Cloud Hosted Router (virtual)");
    }
}
