//! Component records returned by the communicator.
//!
//! Every field is optional: a device that does not report a value leaves it
//! `None` instead of failing the whole record. Records are built from the
//! rows of a group reader, whose labels are the serialized field names
//! (`ifDescr`, `radio/level_in`, ...).

mod components;
mod identify;
mod interface;

pub use components::{
    Component, Cpu, CpuComponent, DiskComponent, DiskStorage, Fan, HardwareHealthComponent,
    MemoryComponent, PowerSupply, SbcAgent, SbcComponent, SbcRealm, ServerComponent,
    UpsComponent,
};
pub use identify::IdentifyProperties;
pub use interface::{
    DwdmInterface, EthernetLikeInterface, IfStatus, Interface, OpticalAmplifierInterface,
    OpticalChannel, OpticalOpmInterface, OpticalTransponderInterface, RadioInterface, Rate,
    SapInterface,
};

use log::trace;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::reader::group::{PropertyNode, Row};
use crate::reader::PropertyFilter;
use crate::value::Value;

/// Parse a row value into a record field type.
pub(crate) trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.to_string())
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.to_u64().ok()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.to_i64().ok()
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.to_f64().ok()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.to_bool().ok()
    }
}

/// Read and parse `key` from a row.
pub(crate) fn field<T: FromValue>(row: &Row, key: &str) -> Option<T> {
    match row.get(key)? {
        PropertyNode::Value(value) => {
            let parsed = T::from_value(value);
            if parsed.is_none() {
                trace!("ignoring unparsable value {value:?} for '{key}'");
            }
            parsed
        }
        PropertyNode::Map(_) => None,
    }
}

/// Nested row stored under `key`.
pub(crate) fn sub_row<'a>(row: &'a Row, key: &str) -> Option<&'a Row> {
    match row.get(key)? {
        PropertyNode::Map(map) => Some(map),
        PropertyNode::Value(_) => None,
    }
}

/// Strip value-filtered fields from already-built records.
///
/// Works on the serialized form, so paths use the same labels as the class
/// files (`ifAlias`, `radio/level_in`).
pub fn apply_value_filters<T>(records: Vec<T>, filters: &[PropertyFilter]) -> Result<Vec<T>>
where
    T: Serialize + DeserializeOwned,
{
    if !filters.iter().any(PropertyFilter::is_value_filter) {
        return Ok(records);
    }

    records
        .into_iter()
        .map(|record| {
            let mut json = serde_json::to_value(&record)
                .map_err(|e| Error::InvalidFilter(format!("record not serializable: {e}")))?;
            for filter in filters {
                filter.apply_to_json(&mut json);
            }
            serde_json::from_value(json)
                .map_err(|e| Error::InvalidFilter(format!("filtered record is invalid: {e}")))
        })
        .collect()
}
