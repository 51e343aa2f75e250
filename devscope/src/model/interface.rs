//! Interface records (IF-MIB plus vendor sub-records).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{FromValue, field, sub_row};
use crate::reader::group::{GroupRow, Row};
use crate::value::Value;

/// `ifAdminStatus` / `ifOperStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IfStatus {
    Up,
    Down,
    Testing,
    Unknown,
    Dormant,
    NotPresent,
    LowerLayerDown,
}

impl IfStatus {
    /// Map the IF-MIB integer encoding.
    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            1 => IfStatus::Up,
            2 => IfStatus::Down,
            3 => IfStatus::Testing,
            4 => IfStatus::Unknown,
            5 => IfStatus::Dormant,
            6 => IfStatus::NotPresent,
            7 => IfStatus::LowerLayerDown,
            _ => return None,
        })
    }

    /// The textual name used in IF-MIB.
    pub fn as_str(&self) -> &'static str {
        match self {
            IfStatus::Up => "up",
            IfStatus::Down => "down",
            IfStatus::Testing => "testing",
            IfStatus::Unknown => "unknown",
            IfStatus::Dormant => "dormant",
            IfStatus::NotPresent => "notPresent",
            IfStatus::LowerLayerDown => "lowerLayerDown",
        }
    }
}

impl fmt::Display for IfStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromValue for IfStatus {
    fn from_value(value: &Value) -> Option<Self> {
        if let Ok(code) = value.to_i64() {
            return IfStatus::from_code(code);
        }
        let text = value.as_str();
        [
            IfStatus::Up,
            IfStatus::Down,
            IfStatus::Testing,
            IfStatus::Unknown,
            IfStatus::Dormant,
            IfStatus::NotPresent,
            IfStatus::LowerLayerDown,
        ]
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(text.trim()))
    }
}

/// One network interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_descr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_mtu: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_speed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_phys_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_admin_status: Option<IfStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_oper_status: Option<IfStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_last_change: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_in_octets: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_in_ucast_pkts: Option<u64>,
    #[serde(rename = "ifInNUcastPkts", skip_serializing_if = "Option::is_none")]
    pub if_in_nucast_pkts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_in_discards: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_in_errors: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_in_unknown_protos: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_out_octets: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_out_ucast_pkts: Option<u64>,
    #[serde(rename = "ifOutNUcastPkts", skip_serializing_if = "Option::is_none")]
    pub if_out_nucast_pkts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_out_discards: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_out_errors: Option<u64>,
    #[serde(rename = "ifOutQLen", skip_serializing_if = "Option::is_none")]
    pub if_out_qlen: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_in_multicast_pkts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_in_broadcast_pkts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_out_multicast_pkts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_out_broadcast_pkts: Option<u64>,
    #[serde(rename = "ifHCInOctets", skip_serializing_if = "Option::is_none")]
    pub if_hc_in_octets: Option<u64>,
    #[serde(rename = "ifHCInUcastPkts", skip_serializing_if = "Option::is_none")]
    pub if_hc_in_ucast_pkts: Option<u64>,
    #[serde(rename = "ifHCInMulticastPkts", skip_serializing_if = "Option::is_none")]
    pub if_hc_in_multicast_pkts: Option<u64>,
    #[serde(rename = "ifHCInBroadcastPkts", skip_serializing_if = "Option::is_none")]
    pub if_hc_in_broadcast_pkts: Option<u64>,
    #[serde(rename = "ifHCOutOctets", skip_serializing_if = "Option::is_none")]
    pub if_hc_out_octets: Option<u64>,
    #[serde(rename = "ifHCOutUcastPkts", skip_serializing_if = "Option::is_none")]
    pub if_hc_out_ucast_pkts: Option<u64>,
    #[serde(rename = "ifHCOutMulticastPkts", skip_serializing_if = "Option::is_none")]
    pub if_hc_out_multicast_pkts: Option<u64>,
    #[serde(rename = "ifHCOutBroadcastPkts", skip_serializing_if = "Option::is_none")]
    pub if_hc_out_broadcast_pkts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_high_speed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_alias: Option<String>,

    #[serde(rename = "ethernet_like", skip_serializing_if = "Option::is_none")]
    pub ethernet_like: Option<EthernetLikeInterface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radio: Option<RadioInterface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dwdm: Option<DwdmInterface>,
    #[serde(rename = "optical_transponder", skip_serializing_if = "Option::is_none")]
    pub optical_transponder: Option<OpticalTransponderInterface>,
    #[serde(rename = "optical_amplifier", skip_serializing_if = "Option::is_none")]
    pub optical_amplifier: Option<OpticalAmplifierInterface>,
    #[serde(rename = "optical_opm", skip_serializing_if = "Option::is_none")]
    pub optical_opm: Option<OpticalOpmInterface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sap: Option<SapInterface>,
}

impl Interface {
    /// Build an interface from a group-reader row.
    ///
    /// `ifIndex` falls back to the row index when the class does not read it.
    pub fn from_row(row: &GroupRow) -> Self {
        let r = &row.values;
        Interface {
            if_index: field(r, "ifIndex").or_else(|| row.index.parse().ok()),
            if_descr: field(r, "ifDescr"),
            if_type: field(r, "ifType"),
            if_mtu: field(r, "ifMtu"),
            if_speed: field(r, "ifSpeed"),
            if_phys_address: field(r, "ifPhysAddress"),
            if_admin_status: field(r, "ifAdminStatus"),
            if_oper_status: field(r, "ifOperStatus"),
            if_last_change: field(r, "ifLastChange"),
            if_in_octets: field(r, "ifInOctets"),
            if_in_ucast_pkts: field(r, "ifInUcastPkts"),
            if_in_nucast_pkts: field(r, "ifInNUcastPkts"),
            if_in_discards: field(r, "ifInDiscards"),
            if_in_errors: field(r, "ifInErrors"),
            if_in_unknown_protos: field(r, "ifInUnknownProtos"),
            if_out_octets: field(r, "ifOutOctets"),
            if_out_ucast_pkts: field(r, "ifOutUcastPkts"),
            if_out_nucast_pkts: field(r, "ifOutNUcastPkts"),
            if_out_discards: field(r, "ifOutDiscards"),
            if_out_errors: field(r, "ifOutErrors"),
            if_out_qlen: field(r, "ifOutQLen"),
            if_name: field(r, "ifName"),
            if_in_multicast_pkts: field(r, "ifInMulticastPkts"),
            if_in_broadcast_pkts: field(r, "ifInBroadcastPkts"),
            if_out_multicast_pkts: field(r, "ifOutMulticastPkts"),
            if_out_broadcast_pkts: field(r, "ifOutBroadcastPkts"),
            if_hc_in_octets: field(r, "ifHCInOctets"),
            if_hc_in_ucast_pkts: field(r, "ifHCInUcastPkts"),
            if_hc_in_multicast_pkts: field(r, "ifHCInMulticastPkts"),
            if_hc_in_broadcast_pkts: field(r, "ifHCInBroadcastPkts"),
            if_hc_out_octets: field(r, "ifHCOutOctets"),
            if_hc_out_ucast_pkts: field(r, "ifHCOutUcastPkts"),
            if_hc_out_multicast_pkts: field(r, "ifHCOutMulticastPkts"),
            if_hc_out_broadcast_pkts: field(r, "ifHCOutBroadcastPkts"),
            if_high_speed: field(r, "ifHighSpeed"),
            if_alias: field(r, "ifAlias"),
            ethernet_like: sub_row(r, "ethernet_like").map(EthernetLikeInterface::from_row),
            radio: sub_row(r, "radio").map(RadioInterface::from_row),
            dwdm: sub_row(r, "dwdm").map(DwdmInterface::from_row),
            optical_transponder: sub_row(r, "optical_transponder")
                .map(OpticalTransponderInterface::from_row),
            optical_amplifier: sub_row(r, "optical_amplifier")
                .map(OpticalAmplifierInterface::from_row),
            optical_opm: sub_row(r, "optical_opm").map(OpticalOpmInterface::from_row),
            sap: sub_row(r, "sap").map(SapInterface::from_row),
        }
    }
}

/// EtherLike-MIB statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EthernetLikeInterface {
    #[serde(rename = "dot3StatsAlignmentErrors", skip_serializing_if = "Option::is_none")]
    pub alignment_errors: Option<u64>,
    #[serde(rename = "dot3StatsFCSErrors", skip_serializing_if = "Option::is_none")]
    pub fcs_errors: Option<u64>,
    #[serde(rename = "dot3StatsSingleCollisionFrames", skip_serializing_if = "Option::is_none")]
    pub single_collision_frames: Option<u64>,
    #[serde(rename = "dot3StatsMultipleCollisionFrames", skip_serializing_if = "Option::is_none")]
    pub multiple_collision_frames: Option<u64>,
    #[serde(rename = "dot3StatsSQETestErrors", skip_serializing_if = "Option::is_none")]
    pub sqe_test_errors: Option<u64>,
    #[serde(rename = "dot3StatsDeferredTransmissions", skip_serializing_if = "Option::is_none")]
    pub deferred_transmissions: Option<u64>,
    #[serde(rename = "dot3StatsLateCollisions", skip_serializing_if = "Option::is_none")]
    pub late_collisions: Option<u64>,
    #[serde(rename = "dot3StatsExcessiveCollisions", skip_serializing_if = "Option::is_none")]
    pub excessive_collisions: Option<u64>,
    #[serde(rename = "dot3StatsInternalMacTransmitErrors", skip_serializing_if = "Option::is_none")]
    pub internal_mac_transmit_errors: Option<u64>,
    #[serde(rename = "dot3StatsCarrierSenseErrors", skip_serializing_if = "Option::is_none")]
    pub carrier_sense_errors: Option<u64>,
    #[serde(rename = "dot3StatsFrameTooLongs", skip_serializing_if = "Option::is_none")]
    pub frame_too_longs: Option<u64>,
    #[serde(rename = "dot3StatsInternalMacReceiveErrors", skip_serializing_if = "Option::is_none")]
    pub internal_mac_receive_errors: Option<u64>,
    #[serde(rename = "dot3HCStatsFCSErrors", skip_serializing_if = "Option::is_none")]
    pub hc_fcs_errors: Option<u64>,
    #[serde(rename = "etherStatsCRCAlignErrors", skip_serializing_if = "Option::is_none")]
    pub crc_align_errors: Option<u64>,
}

impl EthernetLikeInterface {
    fn from_row(r: &Row) -> Self {
        Self {
            alignment_errors: field(r, "dot3StatsAlignmentErrors"),
            fcs_errors: field(r, "dot3StatsFCSErrors"),
            single_collision_frames: field(r, "dot3StatsSingleCollisionFrames"),
            multiple_collision_frames: field(r, "dot3StatsMultipleCollisionFrames"),
            sqe_test_errors: field(r, "dot3StatsSQETestErrors"),
            deferred_transmissions: field(r, "dot3StatsDeferredTransmissions"),
            late_collisions: field(r, "dot3StatsLateCollisions"),
            excessive_collisions: field(r, "dot3StatsExcessiveCollisions"),
            internal_mac_transmit_errors: field(r, "dot3StatsInternalMacTransmitErrors"),
            carrier_sense_errors: field(r, "dot3StatsCarrierSenseErrors"),
            frame_too_longs: field(r, "dot3StatsFrameTooLongs"),
            internal_mac_receive_errors: field(r, "dot3StatsInternalMacReceiveErrors"),
            hc_fcs_errors: field(r, "dot3HCStatsFCSErrors"),
            crc_align_errors: field(r, "etherStatsCRCAlignErrors"),
        }
    }
}

/// Microwave radio levels and capacity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadioInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_out: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bitrate_out: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bitrate_in: Option<u64>,
}

impl RadioInterface {
    fn from_row(r: &Row) -> Self {
        Self {
            level_out: field(r, "level_out"),
            level_in: field(r, "level_in"),
            max_bitrate_out: field(r, "max_bitrate_out"),
            max_bitrate_in: field(r, "max_bitrate_in"),
        }
    }
}

/// A counter sampled over a time window (`15m`, `1d`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub time: String,
    pub value: u64,
}

/// Power levels of one optical channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpticalChannel {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_power: Option<f64>,
}

/// DWDM line data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DwdmInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrected_fec: Vec<Rate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uncorrected_fec: Vec<Rate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<OpticalChannel>,
}

impl DwdmInterface {
    fn from_row(r: &Row) -> Self {
        Self {
            rx_power: field(r, "rx_power"),
            tx_power: field(r, "tx_power"),
            ..Default::default()
        }
    }
}

/// Optical transponder port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpticalTransponderInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_fec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncorrected_fec: Option<u64>,
}

impl OpticalTransponderInterface {
    fn from_row(r: &Row) -> Self {
        Self {
            identifier: field(r, "identifier"),
            label: field(r, "label"),
            rx_power: field(r, "rx_power"),
            tx_power: field(r, "tx_power"),
            corrected_fec: field(r, "corrected_fec"),
            uncorrected_fec: field(r, "uncorrected_fec"),
        }
    }
}

/// Optical amplifier port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpticalAmplifierInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,
}

impl OpticalAmplifierInterface {
    fn from_row(r: &Row) -> Self {
        Self {
            identifier: field(r, "identifier"),
            label: field(r, "label"),
            rx_power: field(r, "rx_power"),
            tx_power: field(r, "tx_power"),
            gain: field(r, "gain"),
        }
    }
}

/// Optical power monitor port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpticalOpmInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<OpticalChannel>,
}

impl OpticalOpmInterface {
    fn from_row(r: &Row) -> Self {
        Self {
            identifier: field(r, "identifier"),
            label: field(r, "label"),
            rx_power: field(r, "rx_power"),
            channels: Vec::new(),
        }
    }
}

/// Service access point counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SapInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbound: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound: Option<u64>,
}

impl SapInterface {
    fn from_row(r: &Row) -> Self {
        Self {
            inbound: field(r, "inbound"),
            outbound: field(r, "outbound"),
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::reader::group::PropertyNode;

    fn value(v: &str) -> PropertyNode {
        PropertyNode::Value(Value::from(v))
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(IfStatus::from_value(&Value::from("1")), Some(IfStatus::Up));
        assert_eq!(IfStatus::from_value(&Value::from("7")), Some(IfStatus::LowerLayerDown));
        assert_eq!(IfStatus::from_value(&Value::from("notPresent")), Some(IfStatus::NotPresent));
        assert_eq!(IfStatus::from_value(&Value::from("9")), None);
        assert_eq!(IfStatus::Dormant.to_string(), "dormant");
    }

    #[test]
    fn test_from_row_with_sub_record() {
        let mut radio = IndexMap::new();
        radio.insert("level_in".to_string(), value("-42"));
        radio.insert("max_bitrate_in".to_string(), value("180000"));

        let mut values = IndexMap::new();
        values.insert("ifDescr".to_string(), value("radio0"));
        values.insert("ifOperStatus".to_string(), value("1"));
        values.insert("ifHCInOctets".to_string(), value("18446744073709551615"));
        values.insert("radio".to_string(), PropertyNode::Map(radio));

        let interface = Interface::from_row(&GroupRow {
            index: "12".to_string(),
            values,
        });
        assert_eq!(interface.if_index, Some(12));
        assert_eq!(interface.if_descr.as_deref(), Some("radio0"));
        assert_eq!(interface.if_oper_status, Some(IfStatus::Up));
        assert_eq!(interface.if_hc_in_octets, Some(u64::MAX));
        let radio = interface.radio.unwrap();
        assert_eq!(radio.level_in, Some(-42));
        assert_eq!(radio.max_bitrate_in, Some(180_000));
    }

    #[test]
    fn test_serialized_names() {
        let interface = Interface {
            if_hc_in_octets: Some(1),
            if_out_qlen: Some(2),
            if_phys_address: Some("00 1A".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&interface).unwrap();
        assert_eq!(json["ifHCInOctets"], 1);
        assert_eq!(json["ifOutQLen"], 2);
        assert_eq!(json["ifPhysAddress"], "00 1A");
        assert!(json.get("ifDescr").is_none());
    }
}
