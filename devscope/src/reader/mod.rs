//! Property readers: single values and indexed tables.
//!
//! A [`PropertyReader`] produces one value:
//!
//! ```text
//! [ pre_condition ] ──► detection ──► operators ──► Value
//! ```
//!
//! A [`ReaderSet`] tries several readers in order and returns the first
//! value produced. Tables are read by [`group::GroupReader`].

pub mod group;

pub use group::{GroupReader, GroupRow, LeafReader, OidReader, PropertyNode, Row};

use log::trace;
use regex::Regex;

use crate::condition::Condition;
use crate::context::{IdentityField, OperationContext};
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::operator::OperatorPipeline;
use crate::value::Value;

/// Where a reader gets its raw value from.
#[derive(Debug, Clone)]
pub enum Detection {
    Constant(Value),
    SysObjectId,
    SysDescription,
    SnmpGet { oid: Oid, use_raw_result: bool },
    /// An identify field determined earlier in the operation.
    Identity(IdentityField),
}

impl Detection {
    async fn read(&self, ctx: &OperationContext) -> Result<Value> {
        match self {
            Detection::Constant(value) => Ok(value.clone()),
            Detection::SysObjectId => ctx.sys_object_id().await,
            Detection::SysDescription => ctx.sys_description().await,
            Detection::SnmpGet {
                oid,
                use_raw_result,
            } => Ok(ctx.snmp_get(oid).await?.to_value(*use_raw_result)),
            Detection::Identity(field) => ctx
                .identity_field(*field)
                .map(Value::from)
                .ok_or_else(|| Error::PreCondition(format!("{field} is not determined yet"))),
        }
    }
}

/// Which identify field a reader helps to determine.
///
/// Readers may only depend on identify fields determined at an earlier
/// stage: a model reader may use the vendor, but not the model series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Vendor,
    Model,
    ModelSeries,
    Default,
}

impl Stage {
    /// Whether readers of this stage may depend on `field`.
    pub fn allows(&self, field: IdentityField) -> bool {
        let available = match field {
            IdentityField::Vendor => Stage::Vendor,
            IdentityField::Model => Stage::Model,
            IdentityField::ModelSeries => Stage::ModelSeries,
            IdentityField::SerialNumber | IdentityField::OsVersion => return false,
        };
        available < *self
    }
}

/// Reads one value from the device.
#[derive(Debug, Clone)]
pub struct PropertyReader {
    detection: Detection,
    operators: OperatorPipeline,
    pre_condition: Option<Condition>,
}

impl PropertyReader {
    pub fn new(detection: Detection) -> Self {
        Self {
            detection,
            operators: OperatorPipeline::default(),
            pre_condition: None,
        }
    }

    pub fn with_operators(mut self, operators: OperatorPipeline) -> Self {
        self.operators = operators;
        self
    }

    /// Only read when `condition` holds.
    pub fn with_pre_condition(mut self, condition: Condition) -> Self {
        self.pre_condition = Some(condition);
        self
    }

    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    pub async fn read(&self, ctx: &OperationContext) -> Result<Value> {
        ctx.ensure_active()?;
        if let Some(condition) = &self.pre_condition {
            if !condition.evaluate(ctx).await? {
                return Err(Error::DidNotMatch("pre-condition not met".into()));
            }
        }
        let raw = self.detection.read(ctx).await?;
        self.operators.apply(ctx, raw).await
    }
}

/// Ordered alternatives for one property.
#[derive(Debug, Clone, Default)]
pub struct ReaderSet(Vec<PropertyReader>);

impl ReaderSet {
    pub fn new(readers: Vec<PropertyReader>) -> Self {
        Self(readers)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn readers(&self) -> &[PropertyReader] {
        &self.0
    }

    /// Value of the first reader that succeeds.
    ///
    /// If every reader fails, the first failure that is not a mere
    /// "unavailable" is returned, so a timeout is not hidden behind a
    /// later not-found.
    pub async fn read(&self, ctx: &OperationContext) -> Result<Value> {
        let mut significant: Option<Error> = None;
        let mut last: Option<Error> = None;

        for (i, reader) in self.0.iter().enumerate() {
            match reader.read(ctx).await {
                Ok(value) => return Ok(value),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    trace!("reader {i} failed: {e}");
                    if significant.is_none() && !e.is_unavailable() {
                        significant = Some(e);
                    } else {
                        last = Some(e);
                    }
                }
            }
        }

        Err(significant.or(last).unwrap_or(Error::NotImplemented))
    }
}

impl FromIterator<PropertyReader> for ReaderSet {
    fn from_iter<I: IntoIterator<Item = PropertyReader>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Restricts which rows and fields a table read returns.
#[derive(Debug, Clone)]
pub enum PropertyFilter {
    /// Exclude rows whose value at `key` matches `regex`.
    Group { key: String, regex: Regex },

    /// Drop the field at `path` (`radio/level_in`).
    Value { path: String },

    /// Keep only the listed fields.
    ExclusiveValue { paths: Vec<String> },
}

impl PropertyFilter {
    /// Exclude rows whose `key` matches `regex`.
    pub fn group(key: impl Into<String>, regex: &str) -> Result<Self> {
        let regex = Regex::new(regex)
            .map_err(|e| Error::InvalidFilter(format!("invalid regex '{regex}': {e}")))?;
        Ok(PropertyFilter::Group {
            key: key.into(),
            regex,
        })
    }

    pub fn value(path: impl Into<String>) -> Self {
        PropertyFilter::Value { path: path.into() }
    }

    pub fn exclusive<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyFilter::ExclusiveValue {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the filter removes fields rather than rows.
    pub fn is_value_filter(&self) -> bool {
        matches!(
            self,
            PropertyFilter::Value { .. } | PropertyFilter::ExclusiveValue { .. }
        )
    }

    /// Apply a value filter to a serialized record.
    pub fn apply_to_json(&self, json: &mut serde_json::Value) {
        match self {
            PropertyFilter::Group { .. } => {}
            PropertyFilter::Value { path } => remove_json_path(json, &split_path(path)),
            PropertyFilter::ExclusiveValue { paths } => {
                let paths: Vec<Vec<&str>> = paths.iter().map(|p| split_path(p)).collect();
                retain_json_paths(json, &paths);
            }
        }
    }
}

pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn remove_json_path(json: &mut serde_json::Value, path: &[&str]) {
    let Some(object) = json.as_object_mut() else {
        return;
    };
    match path {
        [] => {}
        [last] => {
            object.remove(*last);
        }
        [first, rest @ ..] => {
            if let Some(child) = object.get_mut(*first) {
                remove_json_path(child, rest);
            }
        }
    }
}

fn retain_json_paths(json: &mut serde_json::Value, paths: &[Vec<&str>]) {
    let Some(object) = json.as_object_mut() else {
        return;
    };
    object.retain(|key, child| {
        let below: Vec<Vec<&str>> = paths
            .iter()
            .filter(|p| p.first() == Some(&key.as_str()))
            .map(|p| p[1..].to_vec())
            .collect();
        if below.is_empty() {
            return false;
        }
        if !below.iter().any(Vec::is_empty) {
            retain_json_paths(child, &below);
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::matcher::{MatchMode, StringMatcher};
    use crate::operator::{Modifier, Operator};
    use crate::transport::mock::MockSnmp;
    use crate::transport::{SYS_DESCRIPTION, SnmpValue};

    fn ctx() -> OperationContext {
        let snmp = MockSnmp::new()
            .with(SYS_DESCRIPTION, SnmpValue::string("RouterOS RB4011"))
            .with("1.3.6.1.4.1.14988.1.1.7.3.0", SnmpValue::OctetString(vec![0x0a, 0xff]));
        OperationContext::new().with_snmp(Arc::new(snmp))
    }

    fn constant(v: &str) -> PropertyReader {
        PropertyReader::new(Detection::Constant(Value::from(v)))
    }

    #[test]
    fn test_stage_ordering() {
        assert!(!Stage::Vendor.allows(IdentityField::Vendor));
        assert!(Stage::Model.allows(IdentityField::Vendor));
        assert!(!Stage::Model.allows(IdentityField::ModelSeries));
        assert!(Stage::Default.allows(IdentityField::ModelSeries));
        assert!(!Stage::Default.allows(IdentityField::OsVersion));
    }

    #[tokio::test]
    async fn test_detections() {
        let ctx = ctx();
        assert_eq!(constant("x").read(&ctx).await.unwrap().to_string(), "x");

        let descr = PropertyReader::new(Detection::SysDescription);
        assert_eq!(descr.read(&ctx).await.unwrap().to_string(), "RouterOS RB4011");

        let raw = PropertyReader::new(Detection::SnmpGet {
            oid: Oid::parse("1.3.6.1.4.1.14988.1.1.7.3.0").unwrap(),
            use_raw_result: true,
        });
        assert_eq!(raw.read(&ctx).await.unwrap().to_string(), "0A FF");

        let vendor = PropertyReader::new(Detection::Identity(IdentityField::Vendor));
        assert!(matches!(vendor.read(&ctx).await, Err(Error::PreCondition(_))));
        ctx.set_identity_field(IdentityField::Vendor, "Mikrotik");
        assert_eq!(vendor.read(&ctx).await.unwrap().to_string(), "Mikrotik");
    }

    #[tokio::test]
    async fn test_pre_condition() {
        let ctx = ctx();
        let condition = Condition::SysDescription(
            StringMatcher::new(MatchMode::Contains, vec!["CHR".into()]).unwrap(),
        );
        let reader = constant("CHR").with_pre_condition(condition);
        assert!(matches!(reader.read(&ctx).await, Err(Error::DidNotMatch(_))));
    }

    #[tokio::test]
    async fn test_reader_set_first_success() {
        let ctx = ctx();
        let filtered = PropertyReader::new(Detection::SysDescription).with_operators(
            OperatorPipeline::new(vec![Operator::filter(
                StringMatcher::new(MatchMode::Contains, vec!["Cisco".into()]).unwrap(),
            )]),
        );
        let set = ReaderSet::new(vec![
            filtered,
            PropertyReader::new(Detection::SysDescription).with_operators(OperatorPipeline::new(
                vec![Operator::modify(Modifier::ToUpperCase)],
            )),
            constant("unused"),
        ]);
        assert_eq!(set.read(&ctx).await.unwrap().to_string(), "ROUTEROS RB4011");
    }

    #[tokio::test]
    async fn test_reader_set_errors() {
        let ctx = OperationContext::new().with_snmp(Arc::new(MockSnmp::new().unreachable()));
        assert!(ReaderSet::default().read(&ctx).await.unwrap_err().is_not_implemented());

        let set: ReaderSet = [
            PropertyReader::new(Detection::Identity(IdentityField::Model)),
            PropertyReader::new(Detection::SysDescription),
            PropertyReader::new(Detection::Identity(IdentityField::Vendor)),
        ]
        .into_iter()
        .collect();
        assert!(set.read(&ctx).await.unwrap_err().is_network());
    }

    #[test]
    fn test_group_filter_rejects_bad_regex() {
        assert!(matches!(
            PropertyFilter::group("ifDescr", "("),
            Err(Error::InvalidFilter(_))
        ));
        assert!(!PropertyFilter::group("ifDescr", "^lo").unwrap().is_value_filter());
    }

    #[test]
    fn test_json_filters() {
        let mut record = json!({
            "ifIndex": "1",
            "ifDescr": "eth0",
            "radio": { "level_in": "-40", "level_out": "10" },
        });
        PropertyFilter::value("radio/level_out").apply_to_json(&mut record);
        PropertyFilter::value("missing/path").apply_to_json(&mut record);
        assert_eq!(
            record,
            json!({ "ifIndex": "1", "ifDescr": "eth0", "radio": { "level_in": "-40" } })
        );

        let mut record = json!({
            "ifIndex": "1",
            "ifDescr": "eth0",
            "radio": { "level_in": "-40", "level_out": "10" },
            "dwdm": { "rx_power": "-3" },
        });
        PropertyFilter::exclusive(["ifDescr", "radio/level_out", "dwdm"]).apply_to_json(&mut record);
        assert_eq!(
            record,
            json!({ "ifDescr": "eth0", "radio": { "level_out": "10" }, "dwdm": { "rx_power": "-3" } })
        );
    }
}
