//! SNMP and HTTP transports.
//!
//! The engine never talks to `snmp2` or `reqwest` directly; it goes through
//! the [`SnmpTransport`] and [`HttpTransport`] traits so conditions and
//! readers can be exercised against the in-memory transports of `mock`
//! (enabled by the `test-util` feature).
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ CachingSnmp  ├──►│  SnmpClient  ├──►│ snmp2 session│
//! └──────────────┘   └──────────────┘   └──────────────┘
//!        ▲
//!        │ discover() picks the first working (version, community, port)
//! ```

mod cache;
pub mod config;
pub mod discovery;
mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
mod response;
mod snmp;

pub use cache::CachingSnmp;
pub use config::{
    AuthProtocol, HttpConfig, PrivProtocol, SecurityLevel, SnmpConfig, SnmpVersion, V3Credentials,
};
pub use discovery::{DiscoveryOptions, discover};
pub use http::HttpClient;
pub use response::{HttpResponse, SnmpResponse, SnmpValue};
pub use snmp::SnmpClient;

use async_trait::async_trait;
use reqwest::Method;

use crate::error::Result;
use crate::oid::Oid;

/// `SNMPv2-MIB::sysObjectID.0`
pub const SYS_OBJECT_ID: &str = "1.3.6.1.2.1.1.2.0";

/// `SNMPv2-MIB::sysDescr.0`
pub const SYS_DESCRIPTION: &str = "1.3.6.1.2.1.1.1.0";

/// SNMP operations used by the engine.
#[async_trait]
pub trait SnmpTransport: Send + Sync {
    /// GET a batch of OIDs.
    ///
    /// The responses keep the request order. A missing object yields a
    /// non-successful response instead of failing the call.
    async fn get(&self, oids: &[Oid]) -> Result<Vec<SnmpResponse>>;

    /// Walk the subtree below `root`.
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the subtree is empty.
    async fn walk(&self, root: &Oid) -> Result<Vec<SnmpResponse>>;

    /// GETNEXT for a single OID.
    async fn get_next(&self, oid: &Oid) -> Result<SnmpResponse>;

    /// Protocol version in use.
    fn version(&self) -> SnmpVersion;

    /// Current GETBULK max-repetitions.
    fn max_repetitions(&self) -> u32;

    /// Change GETBULK max-repetitions for subsequent walks.
    fn set_max_repetitions(&self, value: u32);

    /// Current maximum number of OIDs per GET (0 = unlimited).
    fn max_oids(&self) -> usize;

    /// Change the maximum number of OIDs per GET.
    fn set_max_oids(&self, value: usize);
}

/// HTTP operations used by the engine.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request to `uri` (relative to the configured base URL).
    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse>;
}
