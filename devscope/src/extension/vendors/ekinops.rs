//! Ekinops 360 chassis.
//!
//! Interfaces are named after the pluggable module they sit on:
//!
//! ```text
//! ifDescr  EKINOPS/C600HC/3/PM_1001RR/2
//!                          │     │     └ port
//!                          │     └ module
//!                          └ slot
//! ```
//!
//! The extension shortens `ifName`/`ifDescr` and attaches the optical
//! records of transponder, amplifier and power monitor modules. Module
//! tables are indexed `<slot>.<port>` and served under a separate community.

use async_trait::async_trait;

use super::{Column, decibel_tenths, walk_column, walk_column_with};
use crate::communicator::Communicator;
use crate::context::OperationContext;
use crate::error::Result;
use crate::extension::CodeExtension;
use crate::model::{
    Interface, OpticalAmplifierInterface, OpticalChannel, OpticalOpmInterface,
    OpticalTransponderInterface,
};
use crate::reader::PropertyFilter;

/// Appended to the community for module reads.
pub const MODULE_COMMUNITY_SUFFIX: &str = "_pm";

const TRANSPONDER_TABLE: &str = "1.3.6.1.4.1.20044.10.3.3.1.1";
const AMPLIFIER_TABLE: &str = "1.3.6.1.4.1.20044.30.3.3.1.1";
const OPM_TABLE: &str = "1.3.6.1.4.1.20044.70.3.3.1.1";
const OPM_CHANNEL_POWER: &str = "1.3.6.1.4.1.20044.70.3.4.1.1.3";

/// Extension for the `ekinops` class.
pub struct Ekinops;

#[async_trait]
impl CodeExtension for Ekinops {
    fn name(&self) -> &str {
        "ekinops"
    }

    fn community_suffix(&self) -> Option<&str> {
        Some(MODULE_COMMUNITY_SUFFIX)
    }

    async fn get_interfaces(
        &self,
        ctx: &OperationContext,
        base: &Communicator,
        filters: &[PropertyFilter],
    ) -> Result<Vec<Interface>> {
        let mut interfaces = base.interfaces(ctx, filters).await?;
        let modules = ModuleTables::read(ctx).await?;
        for interface in interfaces.iter_mut() {
            let Some(port) = interface.if_descr.as_deref().and_then(ModulePort::parse) else {
                continue;
            };
            modules.apply(&port, interface);
        }
        Ok(interfaces)
    }
}

/// Position of an interface in the chassis.
#[derive(Debug, PartialEq)]
struct ModulePort {
    slot: String,
    module: String,
    port: String,
}

impl ModulePort {
    fn parse(descr: &str) -> Option<Self> {
        let mut parts = descr.split('/');
        if parts.next()? != "EKINOPS" {
            return None;
        }
        let _chassis = parts.next()?;
        let slot = parts.next()?.to_string();
        let module = parts.next()?.to_string();
        let port = parts.collect::<Vec<_>>().join("/");
        if slot.is_empty() || module.is_empty() || port.is_empty() {
            return None;
        }
        Some(Self { slot, module, port })
    }

    fn index(&self) -> String {
        format!("{}.{}", self.slot, self.port)
    }

    fn identifier(&self) -> String {
        format!("{}/{}", self.slot, self.port)
    }
}

async fn module_column(ctx: &OperationContext, column: &str) -> Result<Column> {
    match ctx.community_client(MODULE_COMMUNITY_SUFFIX) {
        Ok(client) => walk_column_with(ctx, &client, column).await,
        Err(_) => walk_column(ctx, column).await,
    }
}

async fn table_columns<const N: usize>(
    ctx: &OperationContext,
    table: &str,
    columns: [u32; N],
) -> Result<Vec<Column>> {
    let mut result = Vec::with_capacity(N);
    for column in columns {
        result.push(module_column(ctx, &format!("{table}.{column}")).await?);
    }
    Ok(result)
}

#[derive(Default)]
struct ModuleTables {
    transponder: Vec<Column>,
    amplifier: Vec<Column>,
    opm: Vec<Column>,
    opm_channels: Column,
}

impl ModuleTables {
    async fn read(ctx: &OperationContext) -> Result<Self> {
        Ok(Self {
            transponder: table_columns(ctx, TRANSPONDER_TABLE, [2, 3, 4, 5, 6]).await?,
            amplifier: table_columns(ctx, AMPLIFIER_TABLE, [2, 3, 4, 5]).await?,
            opm: table_columns(ctx, OPM_TABLE, [2, 3]).await?,
            opm_channels: module_column(ctx, OPM_CHANNEL_POWER).await?,
        })
    }

    fn apply(&self, port: &ModulePort, interface: &mut Interface) {
        interface.if_descr = Some(format!("{}/{}/{}", port.slot, port.module, port.port));
        interface.if_name = Some(port.identifier());

        let index = port.index();
        let text = |column: &Column| column.get(&index).map(|v| v.to_string());
        let power = |column: &Column| column.get(&index).and_then(decibel_tenths);
        let has_row = |columns: &[Column]| columns.iter().any(|c| c.contains_key(&index));

        if let [label, rx, tx, corrected, uncorrected] = self.transponder.as_slice() {
            if has_row(&self.transponder) {
                interface.optical_transponder = Some(OpticalTransponderInterface {
                    identifier: Some(port.identifier()),
                    label: text(label),
                    rx_power: power(rx),
                    tx_power: power(tx),
                    corrected_fec: corrected.get(&index).and_then(|v| v.to_u64().ok()),
                    uncorrected_fec: uncorrected.get(&index).and_then(|v| v.to_u64().ok()),
                });
            }
        }

        if let [label, rx, tx, gain] = self.amplifier.as_slice() {
            if has_row(&self.amplifier) {
                interface.optical_amplifier = Some(OpticalAmplifierInterface {
                    identifier: Some(port.identifier()),
                    label: text(label),
                    rx_power: power(rx),
                    tx_power: power(tx),
                    gain: power(gain),
                });
            }
        }

        if let [label, rx] = self.opm.as_slice() {
            if has_row(&self.opm) {
                let prefix = format!("{index}.");
                let channels = self
                    .opm_channels
                    .iter()
                    .filter_map(|(key, value)| {
                        key.strip_prefix(&prefix).map(|channel| OpticalChannel {
                            channel: channel.to_string(),
                            rx_power: decibel_tenths(value),
                            tx_power: None,
                        })
                    })
                    .collect();
                interface.optical_opm = Some(OpticalOpmInterface {
                    identifier: Some(port.identifier()),
                    label: text(label),
                    rx_power: power(rx),
                    channels,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::transport::SnmpValue;
    use crate::transport::mock::MockSnmp;

    #[test]
    fn test_parse_descr() {
        assert_eq!(
            ModulePort::parse("EKINOPS/C600HC/3/PM_1001RR/2"),
            Some(ModulePort {
                slot: "3".into(),
                module: "PM_1001RR".into(),
                port: "2".into(),
            })
        );
        assert_eq!(ModulePort::parse("eth0"), None);
        assert_eq!(ModulePort::parse("EKINOPS/C600HC/3"), None);
    }

    #[tokio::test]
    async fn test_module_records_from_community_client() {
        let modules = MockSnmp::new()
            .with_column(
                &format!("{TRANSPONDER_TABLE}.2"),
                [("3.2", SnmpValue::string("Line 1"))],
            )
            .with_column(&format!("{TRANSPONDER_TABLE}.3"), [("3.2", SnmpValue::Integer(-52))])
            .with_column(&format!("{OPM_TABLE}.3"), [("5.1", SnmpValue::Integer(-100))])
            .with_column(
                OPM_CHANNEL_POWER,
                [
                    ("5.1.1", SnmpValue::Integer(-200)),
                    ("5.1.2", SnmpValue::Integer(-210)),
                ],
            );
        let ctx = OperationContext::new()
            .with_snmp(Arc::new(MockSnmp::new()))
            .with_community_client(MODULE_COMMUNITY_SUFFIX, Arc::new(modules));

        let tables = ModuleTables::read(&ctx).await.unwrap();

        let mut transponder = Interface::default();
        let port = ModulePort::parse("EKINOPS/C600HC/3/PM_1001RR/2").unwrap();
        tables.apply(&port, &mut transponder);
        assert_eq!(transponder.if_name.as_deref(), Some("3/2"));
        assert_eq!(transponder.if_descr.as_deref(), Some("3/PM_1001RR/2"));
        let record = transponder.optical_transponder.unwrap();
        assert_eq!(record.label.as_deref(), Some("Line 1"));
        assert_eq!(record.rx_power, Some(-5.2));
        assert_eq!(record.tx_power, None);
        assert!(transponder.optical_amplifier.is_none());

        let mut opm = Interface::default();
        tables.apply(&ModulePort::parse("EKINOPS/C600HC/5/PM_OPM8/1").unwrap(), &mut opm);
        let record = opm.optical_opm.unwrap();
        assert_eq!(record.rx_power, Some(-10.0));
        assert_eq!(record.channels.len(), 2);
        assert_eq!(record.channels[1].channel, "2");
        assert_eq!(record.channels[1].rx_power, Some(-21.0));
    }
}
