//! Per-class façade answering property and component requests.
//!
//! A [`Communicator`] is built for the resolved [`DeviceClass`] and holds the
//! communicators of all its ancestors. Every request walks the chain:
//!
//! ```text
//!  ┌──────────────────────┐  not implemented  ┌──────────────────────┐
//!  │ routerOS/chr         ├──────────────────►│ routerOS             ├──► generic
//!  │ extension ► readers  │                   │ extension ► readers  │
//!  └──────────────────────┘                   └──────────────────────┘
//! ```
//!
//! Within one level the code extension is asked first, then the class's
//! declarative readers. A result that is merely unavailable (not found,
//! pre-condition, did not match) moves on to the next step; any other error
//! is returned to the caller.

mod components;

use std::fmt;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::trace;

use crate::class::{DeviceClass, Hierarchy, Property, Table};
use crate::context::{IdentityField, OperationContext};
use crate::error::{Error, Result};
use crate::extension::CodeExtension;
use crate::model::{Component, FromValue, IdentifyProperties, Interface, apply_value_filters};
use crate::reader::PropertyFilter;
use crate::reader::group::GroupRow;
use crate::value::Value;

/// `ifSpeed` reported by interfaces faster than 4.29 Gbit/s.
const IF_SPEED_SATURATED: u64 = u32::MAX as u64;

/// Request façade of one device class.
pub struct Communicator {
    class: Arc<DeviceClass>,
    extension: Option<Arc<dyn CodeExtension>>,
    parent: Option<Arc<Communicator>>,
}

impl fmt::Debug for Communicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Communicator")
            .field("class", &self.class.full_name())
            .field("extension", &self.extension.as_ref().map(|e| e.name().to_string()))
            .field("parent", &self.parent.as_ref().map(|p| p.class.full_name().to_string()))
            .finish()
    }
}

impl Communicator {
    /// Build the communicator chain for `class`.
    pub fn new(hierarchy: &Hierarchy, class: &Arc<DeviceClass>) -> Arc<Self> {
        let parent = class
            .parent()
            .and_then(|id| hierarchy.get(id))
            .map(|parent| Communicator::new(hierarchy, parent));
        Arc::new(Self {
            class: class.clone(),
            extension: class.extension().cloned(),
            parent,
        })
    }

    /// The device class this communicator answers for.
    pub fn class(&self) -> &Arc<DeviceClass> {
        &self.class
    }

    /// Full name of the class, e.g. `routerOS/chr`.
    pub fn class_name(&self) -> &str {
        self.class.full_name()
    }

    pub fn parent(&self) -> Option<&Arc<Communicator>> {
        self.parent.as_ref()
    }

    /// The same level without its code extension.
    fn base(&self) -> Communicator {
        Communicator {
            class: self.class.clone(),
            extension: None,
            parent: self.parent.clone(),
        }
    }

    /// Read a single property through the chain.
    pub fn property<'a>(
        &'a self,
        ctx: &'a OperationContext,
        property: Property,
    ) -> BoxFuture<'a, Result<Value>> {
        async move {
            if let Some(extension) = &self.extension {
                match extension.get_property(ctx, &self.base(), property).await {
                    Err(e) if e.is_unavailable() => self.fallback("extension", property, &e),
                    other => return other,
                }
            }
            if let Some(readers) = self.class.readers(property) {
                match readers.read(ctx).await {
                    Err(e) if e.is_unavailable() => self.fallback("readers", property, &e),
                    other => return other,
                }
            }
            match &self.parent {
                Some(parent) => parent.property(ctx, property).await,
                None => Err(Error::NotImplemented),
            }
        }
        .boxed()
    }

    /// Interface records through the chain, before speed normalization.
    pub fn interfaces<'a>(
        &'a self,
        ctx: &'a OperationContext,
        filters: &'a [PropertyFilter],
    ) -> BoxFuture<'a, Result<Vec<Interface>>> {
        async move {
            if let Some(extension) = &self.extension {
                match extension.get_interfaces(ctx, &self.base(), filters).await {
                    Err(e) if e.is_unavailable() => self.fallback("extension", "interfaces", &e),
                    other => return other,
                }
            }
            if let Some(reader) = self.class.table(Table::Interfaces) {
                match reader.read(ctx, filters).await {
                    Ok(rows) => return Ok(rows.iter().map(Interface::from_row).collect()),
                    Err(e) if e.is_unavailable() => self.fallback("readers", "interfaces", &e),
                    Err(e) => return Err(e),
                }
            }
            match &self.parent {
                Some(parent) => parent.interfaces(ctx, filters).await,
                None => Err(Error::NotImplemented),
            }
        }
        .boxed()
    }

    /// Rows of a component table through the chain.
    pub fn rows<'a>(
        &'a self,
        ctx: &'a OperationContext,
        table: Table,
        filters: &'a [PropertyFilter],
    ) -> BoxFuture<'a, Result<Vec<GroupRow>>> {
        async move {
            if let Some(extension) = &self.extension {
                match extension.get_rows(ctx, &self.base(), table, filters).await {
                    Err(e) if e.is_unavailable() => self.fallback("extension", table, &e),
                    other => return other,
                }
            }
            if let Some(reader) = self.class.table(table) {
                match reader.read(ctx, filters).await {
                    Err(e) if e.is_unavailable() => self.fallback("readers", table, &e),
                    other => return other,
                }
            }
            match &self.parent {
                Some(parent) => parent.rows(ctx, table, filters).await,
                None => Err(Error::NotImplemented),
            }
        }
        .boxed()
    }

    fn fallback(&self, step: &str, what: impl fmt::Display, error: &Error) {
        trace!(
            "{}: {what} not available from {step} ({}), trying next",
            self.class.full_name(),
            error.kind()
        );
    }

    /// Parse a property, treating "unavailable" as `None`.
    async fn optional<T: FromValue>(
        &self,
        ctx: &OperationContext,
        property: Property,
    ) -> Result<Option<T>> {
        match self.property(ctx, property).await {
            Ok(value) => {
                let parsed = T::from_value(&value);
                if parsed.is_none() {
                    trace!("{}: ignoring unparsable {property} {value:?}", self.class_name());
                }
                Ok(parsed)
            }
            Err(e) if e.is_unavailable() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn string_property(&self, ctx: &OperationContext, property: Property) -> Result<String> {
        Ok(self.property(ctx, property).await?.to_string())
    }

    pub async fn get_vendor(&self, ctx: &OperationContext) -> Result<String> {
        self.string_property(ctx, Property::Vendor).await
    }

    pub async fn get_model(&self, ctx: &OperationContext) -> Result<String> {
        self.string_property(ctx, Property::Model).await
    }

    pub async fn get_model_series(&self, ctx: &OperationContext) -> Result<String> {
        self.string_property(ctx, Property::ModelSeries).await
    }

    pub async fn get_serial_number(&self, ctx: &OperationContext) -> Result<String> {
        self.string_property(ctx, Property::SerialNumber).await
    }

    pub async fn get_os_version(&self, ctx: &OperationContext) -> Result<String> {
        self.string_property(ctx, Property::OsVersion).await
    }

    /// All identify properties; fields the device does not report stay `None`.
    ///
    /// Vendor, model and model series are recorded in the operation context
    /// as they are read, so readers further down can depend on them.
    pub async fn get_identify_properties(
        &self,
        ctx: &OperationContext,
    ) -> Result<IdentifyProperties> {
        let mut properties = IdentifyProperties::default();
        for (property, field) in [
            (Property::Vendor, IdentityField::Vendor),
            (Property::Model, IdentityField::Model),
            (Property::ModelSeries, IdentityField::ModelSeries),
            (Property::SerialNumber, IdentityField::SerialNumber),
            (Property::OsVersion, IdentityField::OsVersion),
        ] {
            let value: Option<String> = self.optional(ctx, property).await?;
            if let Some(value) = &value {
                ctx.set_identity_field(field, value.clone());
            }
            match field {
                IdentityField::Vendor => properties.vendor = value,
                IdentityField::Model => properties.model = value,
                IdentityField::ModelSeries => properties.model_series = value,
                IdentityField::SerialNumber => properties.serial_number = value,
                IdentityField::OsVersion => properties.os_version = value,
            }
        }
        Ok(properties)
    }

    /// Components the class supports.
    pub fn get_available_components(&self) -> Vec<Component> {
        self.class.components().to_vec()
    }

    fn ensure_component(&self, component: Component) -> Result<()> {
        if self.class.component_enabled(component) {
            Ok(())
        } else {
            Err(Error::ComponentNotFound(component.to_string()))
        }
    }

    /// Interface records with normalized speeds.
    pub async fn get_interfaces(
        &self,
        ctx: &OperationContext,
        filters: &[PropertyFilter],
    ) -> Result<Vec<Interface>> {
        self.ensure_component(Component::Interfaces)?;
        let mut interfaces = self.interfaces(ctx, filters).await?;
        interfaces.iter_mut().for_each(normalize_speed);
        apply_value_filters(interfaces, filters)
    }

    /// Number of interfaces, from `interfaces.count` or by reading them all.
    pub async fn get_count_interfaces(&self, ctx: &OperationContext) -> Result<u64> {
        self.ensure_component(Component::Interfaces)?;
        match self.property(ctx, Property::InterfaceCount).await {
            Ok(value) => return Ok(value.to_u64()?),
            Err(e) if e.is_unavailable() => {
                trace!("{}: counting interface rows ({})", self.class_name(), e.kind())
            }
            Err(e) => return Err(e),
        }
        Ok(self.interfaces(ctx, &[]).await?.len() as u64)
    }
}

fn normalize_speed(interface: &mut Interface) {
    if interface.if_speed == Some(IF_SPEED_SATURATED) {
        if let Some(high_speed) = interface.if_high_speed {
            interface.if_speed = Some(high_speed.saturating_mul(1_000_000));
        }
    }
    if let Some(radio) = &mut interface.radio {
        radio.max_bitrate_in = radio.max_bitrate_in.map(|v| v.saturating_mul(1000));
        radio.max_bitrate_out = radio.max_bitrate_out.map(|v| v.saturating_mul(1000));
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::class::yaml::ClassDefinition;
    use crate::class::{ClassNode, MappingStore};
    use crate::error::TransportError;
    use crate::extension::ExtensionRegistry;
    use crate::transport::SnmpValue;
    use crate::transport::mock::MockSnmp;

    const IF_INDEX: &str = "1.3.6.1.2.1.2.2.1.1";
    const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";
    const IF_SPEED: &str = "1.3.6.1.2.1.2.2.1.5";
    const IF_HIGH_SPEED: &str = "1.3.6.1.2.1.31.1.1.1.15";
    const BATTERY_VOLTAGE: &str = "1.3.6.1.4.1.99999.2.1.0";

    const GENERIC: &str = r#"
name: generic
config:
  components:
    interfaces: true
components:
  interfaces:
    properties:
      detection: snmpwalk
      values:
        ifIndex:
          oid: 1.3.6.1.2.1.2.2.1.1
        ifDescr:
          oid: 1.3.6.1.2.1.2.2.1.2
        ifSpeed:
          oid: 1.3.6.1.2.1.2.2.1.5
        ifHighSpeed:
          oid: 1.3.6.1.2.1.31.1.1.1.15
"#;

    const ACME: &str = r#"
name: acme
match:
  type: SysDescription
  values: [ACME]
identify:
  properties:
    vendor:
      - detection: constant
        value: ACME
    model:
      - detection: snmpget
        oid: 1.3.6.1.4.1.99999.1.0
config:
  components:
    ups: true
components:
  ups:
    battery_voltage:
      - detection: snmpget
        oid: 1.3.6.1.4.1.99999.2.1.0
"#;

    const ROUTER: &str = r#"
name: router
match:
  type: Model
  values: [R1]
identify:
  properties:
    model:
      - detection: constant
        value: R1
"#;

    /// Serial numbers come from code, the OS version times out.
    struct Acme;

    #[async_trait]
    impl CodeExtension for Acme {
        fn name(&self) -> &str {
            "acme-test"
        }

        async fn get_property(
            &self,
            _ctx: &OperationContext,
            _base: &Communicator,
            property: Property,
        ) -> Result<Value> {
            match property {
                Property::SerialNumber => Ok(Value::from("S-1")),
                Property::OsVersion => {
                    Err(TransportError::Timeout(std::time::Duration::from_secs(1)).into())
                }
                _ => Err(Error::NotImplemented),
            }
        }

        async fn get_interfaces(
            &self,
            ctx: &OperationContext,
            base: &Communicator,
            filters: &[PropertyFilter],
        ) -> Result<Vec<Interface>> {
            let mut interfaces = base.interfaces(ctx, filters).await?;
            for interface in interfaces.iter_mut() {
                interface.if_alias = Some("acme".to_string());
            }
            Ok(interfaces)
        }
    }

    fn hierarchy(extensions: &ExtensionRegistry) -> Hierarchy {
        let class = |yaml: &str| {
            ClassNode::new(serde_yaml::from_str::<ClassDefinition>(yaml).unwrap())
        };
        let root = class(GENERIC).with_child(class(ACME).with_child(class(ROUTER)));
        Hierarchy::build(&root, &MappingStore::new(), extensions).unwrap()
    }

    fn communicator(hierarchy: &Hierarchy, name: &str) -> Arc<Communicator> {
        Communicator::new(hierarchy, hierarchy.find(name).unwrap())
    }

    fn interfaces_agent() -> Arc<MockSnmp> {
        Arc::new(
            MockSnmp::new()
                .with_column(IF_INDEX, [("1", SnmpValue::Integer(1)), ("2", SnmpValue::Integer(2))])
                .with_column(
                    IF_DESCR,
                    [("1", SnmpValue::string("Ethernet #1")), ("2", SnmpValue::string("Mgmt"))],
                )
                .with_column(
                    IF_SPEED,
                    [
                        ("1", SnmpValue::Unsigned32(u32::MAX)),
                        ("2", SnmpValue::Unsigned32(100_000_000)),
                    ],
                )
                .with_column(
                    IF_HIGH_SPEED,
                    [("1", SnmpValue::Unsigned32(10_000)), ("2", SnmpValue::Unsigned32(100))],
                ),
        )
    }

    #[tokio::test]
    async fn test_property_falls_back_to_parent() {
        let hierarchy = hierarchy(&ExtensionRegistry::new());
        let router = communicator(&hierarchy, "acme/router");
        let ctx = OperationContext::new().with_snmp(Arc::new(MockSnmp::new()));

        assert_eq!(router.parent().unwrap().class_name(), "acme");
        assert_eq!(router.get_vendor(&ctx).await.unwrap(), "ACME");
        assert_eq!(router.get_model(&ctx).await.unwrap(), "R1");
        assert!(matches!(
            router.get_serial_number(&ctx).await,
            Err(Error::NotImplemented)
        ));

        // the model OID is missing, so the request ends at the root
        let acme = communicator(&hierarchy, "acme");
        assert!(matches!(acme.get_model(&ctx).await, Err(Error::NotImplemented)));
    }

    #[tokio::test]
    async fn test_extension_answers_first() {
        let mut extensions = ExtensionRegistry::new();
        extensions.register("acme/router", Arc::new(Acme)).unwrap();
        let hierarchy = hierarchy(&extensions);
        let router = communicator(&hierarchy, "acme/router");
        let ctx = OperationContext::new().with_snmp(Arc::new(MockSnmp::new()));

        assert_eq!(router.get_serial_number(&ctx).await.unwrap(), "S-1");
        assert_eq!(router.get_model(&ctx).await.unwrap(), "R1");
        assert!(router.get_os_version(&ctx).await.unwrap_err().is_network());

        // a network error is not swallowed by the identify summary either
        assert!(router.get_identify_properties(&ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_identify_properties_recorded() {
        let hierarchy = hierarchy(&ExtensionRegistry::new());
        let router = communicator(&hierarchy, "acme/router");
        let ctx = OperationContext::new().with_snmp(Arc::new(MockSnmp::new()));

        let properties = router.get_identify_properties(&ctx).await.unwrap();
        assert_eq!(properties.vendor.as_deref(), Some("ACME"));
        assert_eq!(properties.model.as_deref(), Some("R1"));
        assert_eq!(properties.serial_number, None);
        assert_eq!(ctx.identity_field(IdentityField::Vendor).as_deref(), Some("ACME"));
        assert_eq!(ctx.identity_field(IdentityField::Model).as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_interfaces_speed_normalized_once() {
        let mut extensions = ExtensionRegistry::new();
        extensions.register("acme/router", Arc::new(Acme)).unwrap();
        let hierarchy = hierarchy(&extensions);
        let router = communicator(&hierarchy, "acme/router");
        let ctx = OperationContext::new().with_snmp(interfaces_agent());

        let interfaces = router.get_interfaces(&ctx, &[]).await.unwrap();
        assert_eq!(interfaces.len(), 2);
        assert_eq!(interfaces[0].if_speed, Some(10_000_000_000));
        assert_eq!(interfaces[1].if_speed, Some(100_000_000));
        assert!(interfaces.iter().all(|i| i.if_alias.as_deref() == Some("acme")));
    }

    #[tokio::test]
    async fn test_interfaces_group_filter() {
        let hierarchy = hierarchy(&ExtensionRegistry::new());
        let generic = communicator(&hierarchy, "generic");
        let ctx = OperationContext::new().with_snmp(interfaces_agent());

        let filters = vec![PropertyFilter::group("ifDescr", "Ethernet .*").unwrap()];
        let interfaces = generic.get_interfaces(&ctx, &filters).await.unwrap();
        assert_eq!(interfaces.len(), 1);
        assert_eq!(interfaces[0].if_index, Some(2));
        assert_eq!(interfaces[0].if_descr.as_deref(), Some("Mgmt"));
    }

    #[tokio::test]
    async fn test_count_interfaces_from_rows() {
        let hierarchy = hierarchy(&ExtensionRegistry::new());
        let generic = communicator(&hierarchy, "generic");
        let ctx = OperationContext::new().with_snmp(interfaces_agent());
        assert_eq!(generic.get_count_interfaces(&ctx).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_components() {
        let hierarchy = hierarchy(&ExtensionRegistry::new());
        let generic = communicator(&hierarchy, "generic");
        let router = communicator(&hierarchy, "acme/router");
        assert_eq!(generic.get_available_components(), vec![Component::Interfaces]);
        assert_eq!(
            router.get_available_components(),
            vec![Component::Interfaces, Component::Ups]
        );

        let ctx = OperationContext::new().with_snmp(Arc::new(MockSnmp::new()));
        assert!(matches!(
            generic.get_ups_component(&ctx).await,
            Err(Error::ComponentNotFound(_))
        ));
        assert!(matches!(
            router.get_cpu_component(&ctx).await,
            Err(Error::ComponentNotFound(_))
        ));
        assert!(router.get_ups_component(&ctx).await.unwrap_err().is_not_found());

        let ctx = OperationContext::new().with_snmp(Arc::new(
            MockSnmp::new().with(BATTERY_VOLTAGE, SnmpValue::Integer(54)),
        ));
        let ups = router.get_ups_component(&ctx).await.unwrap();
        assert_eq!(ups.battery_voltage, Some(54.0));
        assert_eq!(ups.battery_current, None);
    }

    #[test]
    fn test_normalize_speed() {
        let mut interface = Interface {
            if_speed: Some(IF_SPEED_SATURATED),
            ..Default::default()
        };
        normalize_speed(&mut interface);
        assert_eq!(interface.if_speed, Some(IF_SPEED_SATURATED));

        interface.if_high_speed = Some(40_000);
        normalize_speed(&mut interface);
        assert_eq!(interface.if_speed, Some(40_000_000_000));
    }
}
