//! Per-operation state shared by conditions, readers and operators.
//!
//! One [`OperationContext`] exists per device operation. It owns the
//! transports, the identity discovered so far and the cancellation token,
//! and is passed by reference into every evaluation step:
//!
//! ```text
//!  resolver ──► condition ──► ctx.snmp_get()
//!     │                           │
//!     └─► ctx.set_identity() ◄────┘  (vendor → model → model series)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use log::trace;
use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result, TransportError};
use crate::model::IdentifyProperties;
use crate::oid::Oid;
use crate::transport::{
    HttpTransport, SYS_DESCRIPTION, SYS_OBJECT_ID, SnmpResponse, SnmpTransport,
};
use crate::value::Value;

/// A field of the identify state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityField {
    Vendor,
    Model,
    ModelSeries,
    SerialNumber,
    OsVersion,
}

impl IdentityField {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityField::Vendor => "vendor",
            IdentityField::Model => "model",
            IdentityField::ModelSeries => "model_series",
            IdentityField::SerialNumber => "serial_number",
            IdentityField::OsVersion => "os_version",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transports and evolving state of one device operation.
pub struct OperationContext {
    snmp: Option<Arc<dyn SnmpTransport>>,
    http: Option<Arc<dyn HttpTransport>>,
    community_clients: RwLock<HashMap<String, Arc<dyn SnmpTransport>>>,
    identity: RwLock<IdentifyProperties>,
    http_bodies: RwLock<HashMap<String, Option<String>>>,
    gets_instead_of_walk: AtomicBool,
    probe_succeeded: AtomicBool,
    cancel: CancellationToken,
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationContext {
    /// A context without transports.
    pub fn new() -> Self {
        Self {
            snmp: None,
            http: None,
            community_clients: RwLock::new(HashMap::new()),
            identity: RwLock::new(IdentifyProperties::default()),
            http_bodies: RwLock::new(HashMap::new()),
            gets_instead_of_walk: AtomicBool::new(false),
            probe_succeeded: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `snmp` for SNMP probes and reads.
    pub fn with_snmp(mut self, snmp: Arc<dyn SnmpTransport>) -> Self {
        self.snmp = Some(snmp);
        self
    }

    /// Use `http` for HTTP probes.
    pub fn with_http(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }

    /// Register an SNMP transport opened with `<community><suffix>`.
    pub fn with_community_client(
        self,
        suffix: impl Into<String>,
        snmp: Arc<dyn SnmpTransport>,
    ) -> Self {
        self.add_community_client(suffix, snmp);
        self
    }

    /// Register a community client once the device class is known.
    pub fn add_community_client(&self, suffix: impl Into<String>, snmp: Arc<dyn SnmpTransport>) {
        self.community_clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(suffix.into(), snmp);
    }

    /// Use `cancel` as the operation's cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Whether an SNMP transport is configured.
    pub fn has_snmp(&self) -> bool {
        self.snmp.is_some()
    }

    /// Whether an HTTP transport is configured.
    pub fn has_http(&self) -> bool {
        self.http.is_some()
    }

    /// The SNMP transport.
    pub fn snmp(&self) -> Result<&Arc<dyn SnmpTransport>> {
        self.snmp
            .as_ref()
            .ok_or(Error::Transport(TransportError::Unavailable("SNMP")))
    }

    /// The HTTP transport.
    pub fn http(&self) -> Result<&Arc<dyn HttpTransport>> {
        self.http
            .as_ref()
            .ok_or(Error::Transport(TransportError::Unavailable("HTTP")))
    }

    /// The SNMP transport registered for a community suffix.
    pub fn community_client(&self, suffix: &str) -> Result<Arc<dyn SnmpTransport>> {
        self.community_clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(suffix)
            .cloned()
            .ok_or(Error::Transport(TransportError::Unavailable("SNMP community")))
    }

    /// Whether a client for `suffix` is registered.
    pub fn has_community_client(&self, suffix: &str) -> bool {
        self.community_clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(suffix)
    }

    /// Token cancelling this operation.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fail with [`Error::Cancelled`] once the operation was cancelled.
    pub fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Whether any probe got an answer from the device.
    pub fn probe_succeeded(&self) -> bool {
        self.probe_succeeded.load(Ordering::Relaxed)
    }

    /// A not-found answer still proves the device is talking to us.
    fn mark_probe<T>(&self, result: &Result<T>) {
        if matches!(result, Ok(_)) || matches!(result, Err(e) if e.is_not_found()) {
            self.probe_succeeded.store(true, Ordering::Relaxed);
        }
    }

    /// Whether group readers should GET known indices instead of walking.
    pub fn gets_instead_of_walk(&self) -> bool {
        self.gets_instead_of_walk.load(Ordering::Relaxed)
    }

    pub fn set_gets_instead_of_walk(&self, enabled: bool) {
        self.gets_instead_of_walk.store(enabled, Ordering::Relaxed);
    }

    /// Snapshot of the identify state.
    pub fn identity(&self) -> IdentifyProperties {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// One identify field, if already determined.
    pub fn identity_field(&self, field: IdentityField) -> Option<String> {
        let identity = self.identity.read().unwrap_or_else(PoisonError::into_inner);
        match field {
            IdentityField::Vendor => identity.vendor.clone(),
            IdentityField::Model => identity.model.clone(),
            IdentityField::ModelSeries => identity.model_series.clone(),
            IdentityField::SerialNumber => identity.serial_number.clone(),
            IdentityField::OsVersion => identity.os_version.clone(),
        }
    }

    /// Record an identify field.
    pub fn set_identity_field(&self, field: IdentityField, value: impl Into<String>) {
        let value = Some(value.into());
        let mut identity = self.identity.write().unwrap_or_else(PoisonError::into_inner);
        match field {
            IdentityField::Vendor => identity.vendor = value,
            IdentityField::Model => identity.model = value,
            IdentityField::ModelSeries => identity.model_series = value,
            IdentityField::SerialNumber => identity.serial_number = value,
            IdentityField::OsVersion => identity.os_version = value,
        }
    }

    /// GET one OID. A missing object is [`Error::NotFound`].
    pub async fn snmp_get(&self, oid: &Oid) -> Result<SnmpResponse> {
        self.ensure_active()?;
        let result = self.snmp()?.get(std::slice::from_ref(oid)).await;
        self.mark_probe(&result);
        result?
            .into_iter()
            .next()
            .filter(SnmpResponse::is_successful)
            .ok_or_else(|| Error::not_found(format!("no such object {oid}")))
    }

    /// GET many OIDs in one batch.
    pub async fn snmp_get_many(&self, oids: &[Oid]) -> Result<Vec<SnmpResponse>> {
        self.ensure_active()?;
        let result = self.snmp()?.get(oids).await;
        self.mark_probe(&result);
        result
    }

    /// Walk a subtree.
    pub async fn snmp_walk(&self, oid: &Oid) -> Result<Vec<SnmpResponse>> {
        self.ensure_active()?;
        let result = self.snmp()?.walk(oid).await;
        self.mark_probe(&result);
        result
    }

    /// `sysObjectID.0`.
    pub async fn sys_object_id(&self) -> Result<Value> {
        let oid = Oid::parse(SYS_OBJECT_ID)?;
        Ok(self.snmp_get(&oid).await?.to_value(false))
    }

    /// `sysDescr.0`.
    pub async fn sys_description(&self) -> Result<Value> {
        let oid = Oid::parse(SYS_DESCRIPTION)?;
        Ok(self.snmp_get(&oid).await?.to_value(false))
    }

    /// Body of `GET uri`, fetched once per operation.
    pub async fn http_get_body(&self, uri: &str) -> Result<String> {
        self.ensure_active()?;
        let cached = self
            .http_bodies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
            .cloned();
        match cached {
            Some(Some(body)) => return Ok(body),
            Some(None) => return Err(Error::not_found(format!("HTTP {uri}"))),
            None => {}
        }

        let result = self.http()?.request(Method::GET, uri, None, &[]).await;
        let entry = match &result {
            Ok(response) => Some(Some(response.body.clone())),
            Err(e) if e.is_not_found() => Some(None),
            Err(_) => None,
        };
        self.mark_probe(&result);
        if let Some(entry) = entry {
            trace!("caching HTTP body of {uri}");
            self.http_bodies
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(uri.to_string(), entry);
        }
        result.map(|response| response.body)
    }
}
