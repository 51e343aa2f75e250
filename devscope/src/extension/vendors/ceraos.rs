//! Ceragon CeraOS IP-10.
//!
//! The radio carries its traffic over the internal `Ethernet #8` port, and
//! the agent reports the counters there. Radio interfaces get a copy of the
//! counters of the first row matching the source pattern.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::communicator::Communicator;
use crate::context::OperationContext;
use crate::error::Result;
use crate::extension::CodeExtension;
use crate::model::Interface;
use crate::reader::PropertyFilter;

static COUNTER_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^ethernet\s*#?\s*8$").expect("valid counter source pattern"));
static RADIO_INTERFACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^radio\s*interface\b").expect("valid radio pattern"));

fn descr_matches(interface: &Interface, pattern: &Regex) -> bool {
    interface
        .if_descr
        .as_deref()
        .is_some_and(|d| pattern.is_match(d.trim()))
}

/// Extension for the `ceraos/ip10` class.
pub struct Ip10;

#[async_trait]
impl CodeExtension for Ip10 {
    fn name(&self) -> &str {
        "ceraos/ip10"
    }

    async fn get_interfaces(
        &self,
        ctx: &OperationContext,
        base: &Communicator,
        filters: &[PropertyFilter],
    ) -> Result<Vec<Interface>> {
        let mut interfaces = base.interfaces(ctx, filters).await?;
        copy_radio_counters(&mut interfaces);
        Ok(interfaces)
    }
}

fn copy_radio_counters(interfaces: &mut [Interface]) {
    let Some(source) = interfaces
        .iter()
        .find(|i| descr_matches(i, &COUNTER_SOURCE))
        .cloned()
    else {
        return;
    };

    for interface in interfaces.iter_mut() {
        if !descr_matches(interface, &RADIO_INTERFACE) {
            continue;
        }
        interface.if_in_octets = source.if_in_octets;
        interface.if_in_ucast_pkts = source.if_in_ucast_pkts;
        interface.if_in_nucast_pkts = source.if_in_nucast_pkts;
        interface.if_in_discards = source.if_in_discards;
        interface.if_in_errors = source.if_in_errors;
        interface.if_out_octets = source.if_out_octets;
        interface.if_out_ucast_pkts = source.if_out_ucast_pkts;
        interface.if_out_nucast_pkts = source.if_out_nucast_pkts;
        interface.if_out_discards = source.if_out_discards;
        interface.if_out_errors = source.if_out_errors;
        interface.if_in_multicast_pkts = source.if_in_multicast_pkts;
        interface.if_in_broadcast_pkts = source.if_in_broadcast_pkts;
        interface.if_out_multicast_pkts = source.if_out_multicast_pkts;
        interface.if_out_broadcast_pkts = source.if_out_broadcast_pkts;
        interface.if_hc_in_octets = source.if_hc_in_octets;
        interface.if_hc_in_ucast_pkts = source.if_hc_in_ucast_pkts;
        interface.if_hc_in_multicast_pkts = source.if_hc_in_multicast_pkts;
        interface.if_hc_in_broadcast_pkts = source.if_hc_in_broadcast_pkts;
        interface.if_hc_out_octets = source.if_hc_out_octets;
        interface.if_hc_out_ucast_pkts = source.if_hc_out_ucast_pkts;
        interface.if_hc_out_multicast_pkts = source.if_hc_out_multicast_pkts;
        interface.if_hc_out_broadcast_pkts = source.if_hc_out_broadcast_pkts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interface(index: u64, descr: &str, in_octets: Option<u64>) -> Interface {
        Interface {
            if_index: Some(index),
            if_descr: Some(descr.into()),
            if_in_octets: in_octets,
            ..Default::default()
        }
    }

    #[test]
    fn test_copies_counters_to_radio() {
        let mut interfaces = vec![
            interface(1, "Ethernet #1", Some(10)),
            interface(8, "Ethernet #8", Some(4711)),
            interface(101, "Radio Interface #0", None),
        ];
        copy_radio_counters(&mut interfaces);
        assert_eq!(interfaces[2].if_in_octets, Some(4711));
        assert_eq!(interfaces[2].if_index, Some(101));
        assert_eq!(interfaces[0].if_in_octets, Some(10));
    }

    #[test]
    fn test_variant_port_names() {
        let mut interfaces = vec![
            interface(8, "ethernet 8", Some(99)),
            interface(101, "RADIO INTERFACE 1", None),
            interface(102, "Radio Interface #2", None),
            interface(18, "Ethernet #18", Some(5)),
        ];
        copy_radio_counters(&mut interfaces);
        assert_eq!(interfaces[1].if_in_octets, Some(99));
        assert_eq!(interfaces[2].if_in_octets, Some(99));
        assert_eq!(interfaces[3].if_in_octets, Some(5));
    }

    #[test]
    fn test_without_source_nothing_changes() {
        let mut interfaces = vec![interface(101, "Radio Interface #0", Some(1))];
        copy_radio_counters(&mut interfaces);
        assert_eq!(interfaces[0].if_in_octets, Some(1));
    }
}
