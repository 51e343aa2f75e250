//! Non-interface component records.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::field;
use crate::reader::group::GroupRow;

/// A component group a device class may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Interfaces,
    Ups,
    Cpu,
    Memory,
    Sbc,
    Server,
    Disk,
    HardwareHealth,
}

impl Component {
    /// All components, in display order.
    pub const ALL: [Component; 8] = [
        Component::Interfaces,
        Component::Ups,
        Component::Cpu,
        Component::Memory,
        Component::Sbc,
        Component::Server,
        Component::Disk,
        Component::HardwareHealth,
    ];

    /// Name used in class files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Interfaces => "interfaces",
            Component::Ups => "ups",
            Component::Cpu => "cpu",
            Component::Memory => "memory",
            Component::Sbc => "sbc",
            Component::Server => "server",
            Component::Disk => "disk",
            Component::HardwareHealth => "hardware_health",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One CPU (or CPU core).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cpu {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl Cpu {
    pub(crate) fn from_row(row: &GroupRow) -> Self {
        Self {
            load: field(&row.values, "load"),
            temperature: field(&row.values, "temperature"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuComponent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cpus: Vec<Cpu>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryComponent {
    /// Used memory in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<f64>,
}

/// Battery and rectifier readings of a DC power system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_low_voltage_disconnect: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_amperage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_current: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_remaining_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_load: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mains_voltage_applied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rectifier_current: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_voltage: Option<f64>,
}

/// SIP agent of a session border controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SbcAgent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_active_sessions_inbound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_session_rate_inbound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_active_sessions_outbound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_session_rate_outbound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_asr: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
}

impl SbcAgent {
    pub(crate) fn from_row(row: &GroupRow) -> Self {
        let r = &row.values;
        Self {
            hostname: field(r, "hostname"),
            current_active_sessions_inbound: field(r, "current_active_sessions_inbound"),
            current_session_rate_inbound: field(r, "current_session_rate_inbound"),
            current_active_sessions_outbound: field(r, "current_active_sessions_outbound"),
            current_session_rate_outbound: field(r, "current_session_rate_outbound"),
            period_asr: field(r, "period_asr"),
            status: field(r, "status"),
        }
    }
}

/// Realm of a session border controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SbcRealm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_active_sessions_inbound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_session_rate_inbound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_active_sessions_outbound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_session_rate_outbound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_asr: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_local_contacts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SbcRealm {
    pub(crate) fn from_row(row: &GroupRow) -> Self {
        let r = &row.values;
        Self {
            name: field(r, "name"),
            current_active_sessions_inbound: field(r, "current_active_sessions_inbound"),
            current_session_rate_inbound: field(r, "current_session_rate_inbound"),
            current_active_sessions_outbound: field(r, "current_active_sessions_outbound"),
            current_session_rate_outbound: field(r, "current_session_rate_outbound"),
            period_asr: field(r, "period_asr"),
            active_local_contacts: field(r, "active_local_contacts"),
            status: field(r, "status"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SbcComponent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<SbcAgent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub realms: Vec<SbcRealm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_call_per_second: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_concurrent_sessions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_local_contacts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcoding_capacity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_capacity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_redundancy: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_health_score: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<i64>,
}

/// One storage area (hrStorageTable row).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskStorage {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<u64>,
}

impl DiskStorage {
    pub(crate) fn from_row(row: &GroupRow) -> Self {
        let r = &row.values;
        Self {
            storage_type: field(r, "type"),
            description: field(r, "description"),
            available: field(r, "available"),
            used: field(r, "used"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskComponent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storages: Vec<DiskStorage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Fan {
    pub(crate) fn from_row(row: &GroupRow) -> Self {
        Self {
            description: field(&row.values, "description"),
            state: field(&row.values, "state"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerSupply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl PowerSupply {
    pub(crate) fn from_row(row: &GroupRow) -> Self {
        Self {
            description: field(&row.values, "description"),
            state: field(&row.values, "state"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareHealthComponent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_monitor_state: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fans: Vec<Fan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub power_supply: Vec<PowerSupply>,
}
