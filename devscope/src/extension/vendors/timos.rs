//! Nokia TiMOS (7750 SR and relatives).
//!
//! Service access points are reported per `<service>.<port>.<encapsulation>`.
//! Their traffic is summed per port and attached to the port's interface as
//! the `sap` sub-record.

use std::collections::HashMap;

use async_trait::async_trait;
use log::warn;

use super::{Column, walk_column};
use crate::communicator::Communicator;
use crate::context::OperationContext;
use crate::error::Result;
use crate::extension::CodeExtension;
use crate::model::{Interface, SapInterface};
use crate::reader::PropertyFilter;

const SAP_INGRESS_OCTETS: &str = "1.3.6.1.4.1.6527.3.1.2.4.3.2.1.5";
const SAP_EGRESS_OCTETS: &str = "1.3.6.1.4.1.6527.3.1.2.4.3.2.1.11";

/// Extension for the `timos` class.
pub struct Timos;

#[async_trait]
impl CodeExtension for Timos {
    fn name(&self) -> &str {
        "timos"
    }

    async fn get_interfaces(
        &self,
        ctx: &OperationContext,
        base: &Communicator,
        filters: &[PropertyFilter],
    ) -> Result<Vec<Interface>> {
        let mut interfaces = base.interfaces(ctx, filters).await?;
        let ingress = walk_column(ctx, SAP_INGRESS_OCTETS).await?;
        let egress = walk_column(ctx, SAP_EGRESS_OCTETS).await?;
        attach_saps(&mut interfaces, &ingress, &egress);
        Ok(interfaces)
    }
}

fn attach_saps(interfaces: &mut [Interface], ingress: &Column, egress: &Column) {
    let inbound = sum_per_port(ingress);
    let outbound = sum_per_port(egress);
    if inbound.is_empty() && outbound.is_empty() {
        return;
    }

    for interface in interfaces.iter_mut() {
        let Some(port) = interface.if_index else {
            continue;
        };
        let (inbound, outbound) = (inbound.get(&port).copied(), outbound.get(&port).copied());
        if inbound.is_some() || outbound.is_some() {
            interface.sap = Some(SapInterface { inbound, outbound });
        }
    }
}

fn sum_per_port(column: &Column) -> HashMap<u64, u64> {
    let mut sums: HashMap<u64, u64> = HashMap::new();
    for (index, value) in column {
        let port = index.split('.').nth(1).and_then(|p| p.parse::<u64>().ok());
        match (port, value.to_u64()) {
            (Some(port), Ok(octets)) => {
                let sum = sums.entry(port).or_default();
                *sum = sum.wrapping_add(octets);
            }
            _ => warn!("ignoring malformed SAP row {index} = {value:?}"),
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::value::Value;

    fn column(rows: &[(&str, &str)]) -> Column {
        rows.iter()
            .map(|(index, value)| (index.to_string(), Value::from(*value)))
            .collect()
    }

    #[test]
    fn test_saps_summed_per_port() {
        let ingress = column(&[
            ("100.35684352.10", "1000"),
            ("200.35684352.20", "500"),
            ("100.35717120.10", "7"),
        ]);
        let egress = column(&[("100.35684352.10", "42")]);
        let mut interfaces = vec![
            Interface {
                if_index: Some(35684352),
                ..Default::default()
            },
            Interface {
                if_index: Some(35717120),
                ..Default::default()
            },
            Interface {
                if_index: Some(1),
                ..Default::default()
            },
        ];

        attach_saps(&mut interfaces, &ingress, &egress);

        assert_eq!(
            interfaces[0].sap,
            Some(SapInterface {
                inbound: Some(1500),
                outbound: Some(42)
            })
        );
        assert_eq!(
            interfaces[1].sap,
            Some(SapInterface {
                inbound: Some(7),
                outbound: None
            })
        );
        assert_eq!(interfaces[2].sap, None);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let sums = sum_per_port(&column(&[("100", "1"), ("1.2.3", "x"), ("1.2.4", "5")]));
        assert_eq!(sums.get(&2), Some(&5));
        assert_eq!(sums.len(), 1);
    }
}
