//! In-memory transports for tests and offline evaluation of class files.
//!
//! Only built with the `test-util` feature.
//!
//! ```rust
//! use devscope::transport::mock::MockSnmp;
//! use devscope::transport::SnmpValue;
//!
//! let agent = MockSnmp::new()
//!     .with("1.3.6.1.2.1.1.1.0", SnmpValue::string("RouterOS CHR"))
//!     .with("1.3.6.1.2.1.2.2.1.1.1", SnmpValue::Integer(1));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use super::config::SnmpVersion;
use super::response::{HttpResponse, SnmpResponse, SnmpValue};
use super::{HttpTransport, SnmpTransport};
use crate::error::{Error, Result, TransportError};
use crate::oid::Oid;

/// SNMP agent simulated from a static OID table.
pub struct MockSnmp {
    table: BTreeMap<Oid, SnmpValue>,
    version: SnmpVersion,
    delay: Option<Duration>,
    unreachable: AtomicBool,
    max_repetitions: AtomicU32,
    max_oids: AtomicUsize,
    get_calls: AtomicUsize,
    walk_calls: AtomicUsize,
    requested_oids: AtomicUsize,
}

impl Default for MockSnmp {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSnmp {
    /// Create an agent with an empty table.
    pub fn new() -> Self {
        Self {
            table: BTreeMap::new(),
            version: SnmpVersion::V2c,
            delay: None,
            unreachable: AtomicBool::new(false),
            max_repetitions: AtomicU32::new(10),
            max_oids: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            walk_calls: AtomicUsize::new(0),
            requested_oids: AtomicUsize::new(0),
        }
    }

    /// Add an object. Panics on a malformed OID.
    pub fn with(mut self, oid: &str, value: SnmpValue) -> Self {
        let oid = Oid::parse(oid).unwrap_or_else(|e| panic!("mock OID: {e}"));
        self.table.insert(oid, value);
        self
    }

    /// Add one column of a table: `base.index = value` for every entry.
    pub fn with_column<'a>(
        mut self,
        base: &str,
        rows: impl IntoIterator<Item = (&'a str, SnmpValue)>,
    ) -> Self {
        for (index, value) in rows {
            self = self.with(&format!("{base}.{index}"), value);
        }
        self
    }

    /// Report this protocol version.
    pub fn with_version(mut self, version: SnmpVersion) -> Self {
        self.version = version;
        self
    }

    /// Delay every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every request with a timeout.
    pub fn unreachable(self) -> Self {
        self.unreachable.store(true, Ordering::Relaxed);
        self
    }

    /// Number of GET requests served.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::Relaxed)
    }

    /// Number of walks served.
    pub fn walk_calls(&self) -> usize {
        self.walk_calls.load(Ordering::Relaxed)
    }

    /// Number of OIDs requested over all GETs.
    pub fn requested_oids(&self) -> usize {
        self.requested_oids.load(Ordering::Relaxed)
    }

    async fn simulate(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(TransportError::Timeout(self.delay.unwrap_or_default()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl SnmpTransport for MockSnmp {
    async fn get(&self, oids: &[Oid]) -> Result<Vec<SnmpResponse>> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.requested_oids.fetch_add(oids.len(), Ordering::Relaxed);
        self.simulate().await?;

        Ok(oids
            .iter()
            .map(|oid| match self.table.get(oid) {
                Some(value) => SnmpResponse::new(oid.clone(), value.clone()),
                None => SnmpResponse::no_such_object(oid.clone()),
            })
            .collect())
    }

    async fn walk(&self, root: &Oid) -> Result<Vec<SnmpResponse>> {
        self.walk_calls.fetch_add(1, Ordering::Relaxed);
        self.simulate().await?;

        let responses: Vec<SnmpResponse> = self
            .table
            .range(root.clone()..)
            .take_while(|(oid, _)| oid.starts_with(root))
            .filter(|(oid, _)| oid.index_after(root).is_some())
            .map(|(oid, value)| SnmpResponse::new(oid.clone(), value.clone()))
            .collect();

        if responses.is_empty() {
            return Err(Error::not_found(format!("walk of {root} returned no objects")));
        }
        Ok(responses)
    }

    async fn get_next(&self, oid: &Oid) -> Result<SnmpResponse> {
        self.simulate().await?;
        Ok(self
            .table
            .range(oid.clone()..)
            .find(|(candidate, _)| *candidate != oid)
            .map(|(candidate, value)| SnmpResponse::new(candidate.clone(), value.clone()))
            .unwrap_or_else(|| SnmpResponse::new(oid.clone(), SnmpValue::EndOfMibView)))
    }

    fn version(&self) -> SnmpVersion {
        self.version
    }

    fn max_repetitions(&self) -> u32 {
        self.max_repetitions.load(Ordering::Relaxed)
    }

    fn set_max_repetitions(&self, value: u32) {
        self.max_repetitions.store(value, Ordering::Relaxed);
    }

    fn max_oids(&self) -> usize {
        self.max_oids.load(Ordering::Relaxed)
    }

    fn set_max_oids(&self, value: usize) {
        self.max_oids.store(value, Ordering::Relaxed);
    }
}

/// HTTP endpoint simulated from a static URI → body table.
#[derive(Default)]
pub struct MockHttp {
    pages: HashMap<String, HttpResponse>,
    requests: AtomicUsize,
}

impl MockHttp {
    /// Create an endpoint without pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `uri`.
    pub fn with_page(mut self, uri: &str, body: &str) -> Self {
        self.pages.insert(
            uri.to_string(),
            HttpResponse {
                status: 200,
                body: body.to_string(),
            },
        );
        self
    }

    /// Number of requests served.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HttpTransport for MockHttp {
    async fn request(
        &self,
        method: Method,
        uri: &str,
        _body: Option<String>,
        _headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if method != Method::GET {
            return Err(TransportError::HttpStatus {
                uri: uri.to_string(),
                status: 405,
            }
            .into());
        }
        self.pages
            .get(uri)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("HTTP {uri}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(s: &str) -> Oid {
        Oid::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_walk_stays_in_subtree() {
        let mock = MockSnmp::new()
            .with_column(
                "1.3.6.1.2.1.2.2.1.2",
                [("1", SnmpValue::string("lo")), ("10", SnmpValue::string("eth0"))],
            )
            .with("1.3.6.1.2.1.2.2.1.3.1", SnmpValue::Integer(24));

        let rows = mock.walk(&oid("1.3.6.1.2.1.2.2.1.2")).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].oid.as_str(), "1.3.6.1.2.1.2.2.1.2.1");
        assert_eq!(rows[1].value_string(), "eth0");
    }

    #[tokio::test]
    async fn test_get_next() {
        let mock = MockSnmp::new().with("1.3.6.1.2.1.1.1.0", SnmpValue::string("descr"));
        let next = mock.get_next(&oid("1.3.6.1.2.1.1")).await.unwrap();
        assert_eq!(next.oid.as_str(), "1.3.6.1.2.1.1.1.0");

        let end = mock.get_next(&oid("1.3.6.1.2.1.1.1.0")).await.unwrap();
        assert_eq!(end.value, SnmpValue::EndOfMibView);
    }

    #[tokio::test]
    async fn test_mock_http() {
        let http = MockHttp::new().with_page("/status", "ok");
        let page = http.request(Method::GET, "/status", None, &[]).await.unwrap();
        assert_eq!(page.body, "ok");
        assert!(http
            .request(Method::GET, "/missing", None, &[])
            .await
            .unwrap_err()
            .is_not_found());
    }
}
