//! Device classes and the class hierarchy.
//!
//! Device classes are declared in YAML and arranged in a tree rooted at
//! `generic`:
//!
//! ```text
//! classes/
//! ├── generic.yaml          root, matches every device
//! ├── routerOS.yaml         child of generic
//! ├── routerOS/
//! │   └── chr.yaml          child of routerOS  ("routerOS/chr")
//! └── mappings/             lookup tables for map modifiers
//! ```
//!
//! [`HierarchyLoader`] reads such a directory into a [`Hierarchy`], an arena
//! of immutable [`DeviceClass`]es addressed by [`ClassId`].

mod convert;
mod loader;
mod mapping;
pub mod yaml;

pub use loader::HierarchyLoader;
pub use mapping::{Mapping, MappingStore};
pub use yaml::ClassDefinition;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use self::convert::{Converter, inherit};
use crate::condition::Condition;
use crate::context::IdentityField;
use crate::error::ClassError;
use crate::extension::{CodeExtension, ExtensionRegistry};
use crate::model::Component;
use crate::reader::{GroupReader, ReaderSet};

/// Name of the root class.
pub const ROOT_CLASS: &str = "generic";

/// A single-valued property a class can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Vendor,
    Model,
    ModelSeries,
    SerialNumber,
    OsVersion,
    InterfaceCount,
    MemoryUsage,
    ServerProcs,
    ServerUsers,
    Ups(UpsField),
    Sbc(SbcField),
    EnvironmentMonitorState,
}

impl Property {
    /// The identify field this property determines, if any.
    pub fn identity_field(&self) -> Option<IdentityField> {
        match self {
            Property::Vendor => Some(IdentityField::Vendor),
            Property::Model => Some(IdentityField::Model),
            Property::ModelSeries => Some(IdentityField::ModelSeries),
            Property::SerialNumber => Some(IdentityField::SerialNumber),
            Property::OsVersion => Some(IdentityField::OsVersion),
            _ => None,
        }
    }

    /// The component the property belongs to, if any.
    pub fn component(&self) -> Option<Component> {
        match self {
            Property::InterfaceCount => Some(Component::Interfaces),
            Property::MemoryUsage => Some(Component::Memory),
            Property::ServerProcs | Property::ServerUsers => Some(Component::Server),
            Property::Ups(_) => Some(Component::Ups),
            Property::Sbc(_) => Some(Component::Sbc),
            Property::EnvironmentMonitorState => Some(Component::HardwareHealth),
            _ => None,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Vendor => f.write_str("vendor"),
            Property::Model => f.write_str("model"),
            Property::ModelSeries => f.write_str("model_series"),
            Property::SerialNumber => f.write_str("serial_number"),
            Property::OsVersion => f.write_str("os_version"),
            Property::InterfaceCount => f.write_str("interfaces.count"),
            Property::MemoryUsage => f.write_str("memory.usage"),
            Property::ServerProcs => f.write_str("server.procs"),
            Property::ServerUsers => f.write_str("server.users"),
            Property::Ups(field) => write!(f, "ups.{}", field.as_str()),
            Property::Sbc(field) => write!(f, "sbc.{}", field.as_str()),
            Property::EnvironmentMonitorState => {
                f.write_str("hardware_health.environment_monitor_state")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpsField {
    AlarmLowVoltageDisconnect,
    BatteryAmperage,
    BatteryCapacity,
    BatteryCurrent,
    BatteryRemainingTime,
    BatteryTemperature,
    BatteryVoltage,
    CurrentLoad,
    MainsVoltageApplied,
    RectifierCurrent,
    SystemVoltage,
}

impl UpsField {
    pub const ALL: [UpsField; 11] = [
        UpsField::AlarmLowVoltageDisconnect,
        UpsField::BatteryAmperage,
        UpsField::BatteryCapacity,
        UpsField::BatteryCurrent,
        UpsField::BatteryRemainingTime,
        UpsField::BatteryTemperature,
        UpsField::BatteryVoltage,
        UpsField::CurrentLoad,
        UpsField::MainsVoltageApplied,
        UpsField::RectifierCurrent,
        UpsField::SystemVoltage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpsField::AlarmLowVoltageDisconnect => "alarm_low_voltage_disconnect",
            UpsField::BatteryAmperage => "battery_amperage",
            UpsField::BatteryCapacity => "battery_capacity",
            UpsField::BatteryCurrent => "battery_current",
            UpsField::BatteryRemainingTime => "battery_remaining_time",
            UpsField::BatteryTemperature => "battery_temperature",
            UpsField::BatteryVoltage => "battery_voltage",
            UpsField::CurrentLoad => "current_load",
            UpsField::MainsVoltageApplied => "mains_voltage_applied",
            UpsField::RectifierCurrent => "rectifier_current",
            UpsField::SystemVoltage => "system_voltage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SbcField {
    GlobalCallPerSecond,
    GlobalConcurrentSessions,
    ActiveLocalContacts,
    TranscodingCapacity,
    LicenseCapacity,
    SystemRedundancy,
    SystemHealthScore,
}

impl SbcField {
    pub const ALL: [SbcField; 7] = [
        SbcField::GlobalCallPerSecond,
        SbcField::GlobalConcurrentSessions,
        SbcField::ActiveLocalContacts,
        SbcField::TranscodingCapacity,
        SbcField::LicenseCapacity,
        SbcField::SystemRedundancy,
        SbcField::SystemHealthScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SbcField::GlobalCallPerSecond => "global_call_per_second",
            SbcField::GlobalConcurrentSessions => "global_concurrent_sessions",
            SbcField::ActiveLocalContacts => "active_local_contacts",
            SbcField::TranscodingCapacity => "transcoding_capacity",
            SbcField::LicenseCapacity => "license_capacity",
            SbcField::SystemRedundancy => "system_redundancy",
            SbcField::SystemHealthScore => "system_health_score",
        }
    }
}

/// An indexed table a class can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Interfaces,
    Cpu,
    Disk,
    SbcAgents,
    SbcRealms,
    Fans,
    PowerSupply,
}

impl Table {
    pub fn component(&self) -> Component {
        match self {
            Table::Interfaces => Component::Interfaces,
            Table::Cpu => Component::Cpu,
            Table::Disk => Component::Disk,
            Table::SbcAgents | Table::SbcRealms => Component::Sbc,
            Table::Fans | Table::PowerSupply => Component::HardwareHealth,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Table::Interfaces => "interfaces",
            Table::Cpu => "cpu",
            Table::Disk => "disk",
            Table::SbcAgents => "sbc.agents",
            Table::SbcRealms => "sbc.realms",
            Table::Fans => "hardware_health.fans",
            Table::PowerSupply => "hardware_health.power_supply",
        })
    }
}

/// Position of a class in its [`Hierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

/// A compiled device class.
pub struct DeviceClass {
    id: ClassId,
    name: String,
    full_name: String,
    parent: Option<ClassId>,
    children: Vec<ClassId>,
    condition: Option<Condition>,
    try_to_match_last: bool,
    properties: HashMap<Property, ReaderSet>,
    tables: HashMap<Table, GroupReader>,
    components: Vec<Component>,
    max_repetitions: Option<u32>,
    max_oids: Option<usize>,
    extension: Option<Arc<dyn CodeExtension>>,
    definition: ClassDefinition,
}

impl fmt::Debug for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceClass")
            .field("full_name", &self.full_name)
            .field("children", &self.children.len())
            .field("try_to_match_last", &self.try_to_match_last)
            .field("extension", &self.extension.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

impl DeviceClass {
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Name of the class file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slash-joined path below the root (`routerOS/chr`); `generic` for the root.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    pub fn children(&self) -> &[ClassId] {
        &self.children
    }

    /// Match condition; `None` only for the root.
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Whether matching costs a request no sibling shares.
    pub fn try_to_match_last(&self) -> bool {
        self.try_to_match_last
    }

    pub fn readers(&self, property: Property) -> Option<&ReaderSet> {
        self.properties.get(&property)
    }

    pub fn table(&self, table: Table) -> Option<&GroupReader> {
        self.tables.get(&table)
    }

    /// Whether the class (or an ancestor) enables `component`.
    pub fn component_enabled(&self, component: Component) -> bool {
        self.components.contains(&component)
    }

    /// Enabled components in display order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn max_repetitions(&self) -> Option<u32> {
        self.max_repetitions
    }

    pub fn max_oids(&self) -> Option<usize> {
        self.max_oids
    }

    pub fn extension(&self) -> Option<&Arc<dyn CodeExtension>> {
        self.extension.as_ref()
    }

    /// The class file as written, without inherited parts.
    pub fn definition(&self) -> &ClassDefinition {
        &self.definition
    }
}

/// A class definition with its child definitions.
#[derive(Debug, Clone)]
pub struct ClassNode {
    pub definition: ClassDefinition,
    pub children: Vec<ClassNode>,
}

impl ClassNode {
    pub fn new(definition: ClassDefinition) -> Self {
        Self {
            definition,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ClassNode) -> Self {
        self.children.push(child);
        self
    }
}

/// All device classes, rooted at `generic`.
#[derive(Debug)]
pub struct Hierarchy {
    classes: Vec<Arc<DeviceClass>>,
}

impl Hierarchy {
    /// Compile a tree of definitions. `root` becomes the `generic` class.
    pub fn build(
        root: &ClassNode,
        mappings: &MappingStore,
        extensions: &ExtensionRegistry,
    ) -> Result<Self, ClassError> {
        let mut builder = Builder {
            classes: Vec::new(),
            mappings,
            extensions,
        };
        builder.add(root, None)?;
        Ok(Self {
            classes: builder.classes.into_iter().map(Arc::new).collect(),
        })
    }

    /// The `generic` class.
    pub fn root(&self) -> &Arc<DeviceClass> {
        &self.classes[0]
    }

    pub fn get(&self, id: ClassId) -> Option<&Arc<DeviceClass>> {
        self.classes.get(id.0)
    }

    /// Look a class up by its full name; `generic` (or `""`) is the root.
    pub fn find(&self, full_name: &str) -> Option<&Arc<DeviceClass>> {
        if full_name.is_empty() || full_name == ROOT_CLASS {
            return Some(self.root());
        }
        self.classes.iter().find(|c| c.full_name == full_name)
    }

    /// Children of `id`, in directory order.
    pub fn children(&self, id: ClassId) -> impl Iterator<Item = &Arc<DeviceClass>> {
        self.get(id)
            .map(|c| c.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.get(*child))
    }

    /// `id` and its ancestors, innermost first.
    pub fn lineage(&self, id: ClassId) -> Vec<&Arc<DeviceClass>> {
        let mut lineage = Vec::new();
        let mut next = self.get(id);
        while let Some(class) = next {
            lineage.push(class);
            next = class.parent.and_then(|p| self.get(p));
        }
        lineage
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DeviceClass>> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

struct Builder<'a> {
    classes: Vec<DeviceClass>,
    mappings: &'a MappingStore,
    extensions: &'a ExtensionRegistry,
}

impl Builder<'_> {
    fn add(
        &mut self,
        node: &ClassNode,
        parent: Option<(ClassId, &ClassDefinition)>,
    ) -> Result<ClassId, ClassError> {
        let definition = &node.definition;
        let id = ClassId(self.classes.len());
        let full_name = match parent {
            None => ROOT_CLASS.to_string(),
            Some((parent_id, _)) => {
                let parent_name = &self.classes[parent_id.0].full_name;
                if parent_id.0 == 0 {
                    definition.name.clone()
                } else {
                    format!("{parent_name}/{}", definition.name)
                }
            }
        };

        let effective = match parent {
            Some((_, parent_def)) => inherit(definition, parent_def),
            None => definition.clone(),
        };
        let compiled =
            Converter::new(&full_name, self.mappings).compile(&effective, parent.is_none())?;
        let try_to_match_last = compiled
            .condition
            .as_ref()
            .is_some_and(Condition::contains_unique_request);
        let components = Component::ALL
            .into_iter()
            .filter(|c| effective.config.components.get(c) == Some(&true))
            .collect();
        let extension = self.extensions.get(&full_name);
        if let Some(extension) = &extension {
            debug!("class '{full_name}' uses code extension '{}'", extension.name());
        }

        self.classes.push(DeviceClass {
            id,
            name: definition.name.clone(),
            full_name: full_name.clone(),
            parent: parent.map(|(p, _)| p),
            children: Vec::new(),
            condition: compiled.condition,
            try_to_match_last,
            properties: compiled.properties,
            tables: compiled.tables,
            components,
            max_repetitions: effective.config.snmp.max_repetitions,
            max_oids: effective.config.snmp.max_oids,
            extension,
            definition: definition.clone(),
        });

        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let name = &child.definition.name;
            if node.children.iter().filter(|c| &c.definition.name == name).count() > 1 {
                return Err(ClassError::invalid(
                    &full_name,
                    format!("duplicate child class '{name}'"),
                ));
            }
            children.push(self.add(child, Some((id, &effective)))?);
        }
        self.classes[id.0].children = children;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(yaml: &str) -> ClassNode {
        ClassNode::new(serde_yaml::from_str(yaml).unwrap())
    }

    fn tree() -> ClassNode {
        node("name: generic\nconfig:\n  components:\n    interfaces: true\n")
            .with_child(
                node("name: routerOS\nmatch:\n  type: SysDescription\n  values: [RouterOS]\nconfig:\n  components:\n    cpu: true\n")
                    .with_child(node("name: chr\nmatch:\n  type: Model\n  match_mode: equals\n  values: [CHR]\n")),
            )
            .with_child(node(
                "name: ceraos\nmatch:\n  type: snmpget\n  oid: 1.3.6.1.4.1.2281.10.4.1.0\n  values: [IP-10]\n",
            ))
    }

    #[test]
    fn test_build_hierarchy() {
        let hierarchy =
            Hierarchy::build(&tree(), &MappingStore::new(), &ExtensionRegistry::new()).unwrap();
        assert_eq!(hierarchy.len(), 4);
        assert_eq!(hierarchy.root().full_name(), "generic");
        assert!(hierarchy.root().condition().is_none());

        let chr = hierarchy.find("routerOS/chr").unwrap();
        assert_eq!(chr.name(), "chr");
        assert!(chr.component_enabled(Component::Cpu));
        assert!(chr.component_enabled(Component::Interfaces));
        assert!(!chr.component_enabled(Component::Ups));

        let lineage: Vec<&str> = hierarchy.lineage(chr.id()).iter().map(|c| c.full_name()).collect();
        assert_eq!(lineage, vec!["routerOS/chr", "routerOS", "generic"]);

        let children: Vec<&str> =
            hierarchy.children(hierarchy.root().id()).map(|c| c.name()).collect();
        assert_eq!(children, vec!["routerOS", "ceraos"]);

        assert!(hierarchy.find("ceraos").unwrap().try_to_match_last());
        assert!(!hierarchy.find("routerOS").unwrap().try_to_match_last());
        assert!(hierarchy.find("nope").is_none());
    }

    #[test]
    fn test_duplicate_siblings() {
        let root = node("name: generic\n")
            .with_child(node("name: a\nmatch:\n  type: SysDescription\n  values: [x]\n"))
            .with_child(node("name: a\nmatch:\n  type: SysDescription\n  values: [y]\n"));
        let err = Hierarchy::build(&root, &MappingStore::new(), &ExtensionRegistry::new()).unwrap_err();
        assert!(err.to_string().contains("duplicate child class 'a'"));
    }

    #[test]
    fn test_property_names() {
        assert_eq!(Property::Ups(UpsField::BatteryVoltage).to_string(), "ups.battery_voltage");
        assert_eq!(Property::Model.identity_field(), Some(IdentityField::Model));
        assert_eq!(Property::ServerUsers.component(), Some(Component::Server));
        assert_eq!(Table::Fans.component(), Component::HardwareHealth);
    }
}
