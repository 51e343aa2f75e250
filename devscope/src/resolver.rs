//! Device class resolution.
//!
//! The resolver walks the hierarchy top-down and descends into the first
//! child whose match condition holds. Siblings are tried in directory order,
//! except that classes whose condition needs a per-device request (SNMP GET,
//! HTTP) are deferred until all cheaper siblings failed:
//!
//! ```text
//! generic
//!  ├── adva          sysObjectID      tried first
//!  ├── routerOS      sysDescr         tried first ──► routerOS/chr ...
//!  └── ups-web       HTTP body        tried last
//! ```
//!
//! After each positive match the class's vendor, model and model series are
//! read into the operation context, so conditions one level deeper can test
//! them.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{debug, trace};

use crate::class::{ClassId, DeviceClass, Hierarchy, Property};
use crate::communicator::Communicator;
use crate::context::{IdentityField, OperationContext};
use crate::error::{Error, Result, TransportError};
use crate::transport::SnmpTransport;

/// Finds the device class of a device.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    hierarchy: &'a Hierarchy,
}

impl<'a> Resolver<'a> {
    pub fn new(hierarchy: &'a Hierarchy) -> Self {
        Self { hierarchy }
    }

    /// Resolve the most specific class matching the device.
    ///
    /// Falls back to the root class if nothing matches but the device
    /// answered at least one probe; a device that answered nothing is
    /// [`TransportError::NoResponse`].
    pub async fn identify(&self, ctx: &OperationContext) -> Result<Arc<DeviceClass>> {
        let tuning = SnmpTuning::clamp(ctx);
        let root = self.hierarchy.root();

        let found = self.identify_level(ctx, root.children().to_vec(), true).await;
        let class = match found {
            Ok(Some(class)) => class,
            Ok(None) if ctx.probe_succeeded() => {
                debug!("no device class matched, using '{}'", root.name());
                root.clone()
            }
            Ok(None) => {
                tuning.restore(None, None);
                return Err(TransportError::NoResponse.into());
            }
            Err(e) => {
                tuning.restore(None, None);
                return Err(e);
            }
        };

        tuning.restore(class.max_repetitions(), class.max_oids());
        debug!("identified device class '{}'", class.full_name());
        Ok(class)
    }

    /// Check whether the device matches the class named `name`.
    ///
    /// Every condition from the root down to the class must hold, which
    /// also records the identity the class's conditions depend on.
    pub async fn match_device_class(&self, ctx: &OperationContext, name: &str) -> Result<bool> {
        let class = self
            .hierarchy
            .find(name)
            .ok_or_else(|| Error::not_found(format!("unknown device class '{name}'")))?;

        let tuning = SnmpTuning::clamp(ctx);
        let mut lineage = self.hierarchy.lineage(class.id());
        lineage.reverse();

        let mut result = Ok(true);
        for level in lineage.into_iter().filter(|c| !c.is_root()) {
            match self.matches(ctx, level).await {
                Ok(true) => {
                    if let Err(e) = self.read_identity(ctx, level).await {
                        result = Err(e);
                        break;
                    }
                }
                Ok(false) => {
                    debug!("device does not match '{}'", level.full_name());
                    result = Ok(false);
                    break;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        tuning.restore(class.max_repetitions(), class.max_oids());
        result
    }

    fn identify_level<'b>(
        &'b self,
        ctx: &'b OperationContext,
        candidates: Vec<ClassId>,
        respect_priority: bool,
    ) -> BoxFuture<'b, Result<Option<Arc<DeviceClass>>>> {
        async move {
            let mut deferred = Vec::new();
            for id in candidates {
                let Some(class) = self.hierarchy.get(id) else {
                    continue;
                };
                if respect_priority && class.try_to_match_last() {
                    trace!("deferring '{}'", class.full_name());
                    deferred.push(id);
                    continue;
                }
                if !self.matches(ctx, class).await? {
                    continue;
                }

                debug!("device matches '{}'", class.full_name());
                if let (Ok(snmp), Some(value)) = (ctx.snmp(), class.max_repetitions()) {
                    snmp.set_max_repetitions(value);
                }
                self.read_identity(ctx, class).await?;

                if !class.children().is_empty() {
                    let children = class.children().to_vec();
                    if let Some(child) = self.identify_level(ctx, children, true).await? {
                        return Ok(Some(child));
                    }
                }
                return Ok(Some(class.clone()));
            }

            if deferred.is_empty() {
                Ok(None)
            } else {
                self.identify_level(ctx, deferred, false).await
            }
        }
        .boxed()
    }

    async fn matches(&self, ctx: &OperationContext, class: &DeviceClass) -> Result<bool> {
        let Some(condition) = class.condition() else {
            return Ok(class.is_root());
        };
        match condition.evaluate(ctx).await {
            Ok(matched) => Ok(matched),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                trace!("{}: match condition failed ({})", class.full_name(), e.kind());
                Ok(false)
            }
        }
    }

    /// Read vendor, model and model series of a matched class.
    async fn read_identity(&self, ctx: &OperationContext, class: &Arc<DeviceClass>) -> Result<()> {
        let communicator = Communicator::new(self.hierarchy, class);
        for (property, field) in [
            (Property::Vendor, IdentityField::Vendor),
            (Property::Model, IdentityField::Model),
            (Property::ModelSeries, IdentityField::ModelSeries),
        ] {
            match communicator.property(ctx, property).await {
                Ok(value) if !value.is_empty() => {
                    trace!("{}: {property} = {value}", class.full_name());
                    ctx.set_identity_field(field, value.to_string());
                }
                Ok(_) => {}
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => trace!("{}: {property} not available ({})", class.full_name(), e.kind()),
            }
        }
        Ok(())
    }
}

/// SNMP tuning saved while identity discovery runs with `max_repetitions = 1`.
struct SnmpTuning {
    snmp: Option<Arc<dyn SnmpTransport>>,
    max_repetitions: u32,
    max_oids: usize,
}

impl SnmpTuning {
    fn clamp(ctx: &OperationContext) -> Self {
        let snmp = ctx.snmp().ok().cloned();
        let (max_repetitions, max_oids) = snmp
            .as_ref()
            .map(|s| (s.max_repetitions(), s.max_oids()))
            .unwrap_or_default();
        if let Some(snmp) = &snmp {
            snmp.set_max_repetitions(1);
        }
        Self {
            snmp,
            max_repetitions,
            max_oids,
        }
    }

    /// Apply the resolved class's tuning, or what was configured before.
    fn restore(&self, max_repetitions: Option<u32>, max_oids: Option<usize>) {
        if let Some(snmp) = &self.snmp {
            snmp.set_max_repetitions(max_repetitions.unwrap_or(self.max_repetitions));
            snmp.set_max_oids(max_oids.unwrap_or(self.max_oids));
        }
    }
}
