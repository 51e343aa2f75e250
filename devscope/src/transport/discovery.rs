//! Parallel discovery of a working SNMP configuration.
//!
//! Given several versions, communities and ports, every combination is a
//! *candidate*. Candidates are ranked (highest version first, then the
//! order the communities and ports were given in) and probed concurrently
//! with a bounded number of attempts in flight:
//!
//! ```text
//!   rank 0: v2c / "public" / 161   ──► timeout
//!   rank 1: v2c / "secret" / 161   ──► ok        ◄── chosen
//!   rank 2: v1  / "public" / 161   ──► ok        (worse rank, cancelled)
//! ```
//!
//! A successful candidate is returned as soon as every better-ranked
//! candidate has failed. All other attempts are cancelled through their own
//! child tokens; cancelling the parent token aborts the whole discovery.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use log::{debug, trace};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use super::config::{SnmpConfig, SnmpVersion};
use super::snmp::SnmpClient;
use super::{SYS_DESCRIPTION, SYS_OBJECT_ID, SnmpTransport};
use crate::error::{Error, Result, TransportError};
use crate::oid::Oid;

/// The sets of parameters to try.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Protocol versions to try.
    pub versions: Vec<SnmpVersion>,

    /// Communities to try for v1/v2c, in order of preference.
    pub communities: Vec<SecretString>,

    /// Ports to try, in order of preference.
    pub ports: Vec<u16>,

    /// Maximum number of attempts in flight.
    pub concurrency: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            versions: vec![SnmpVersion::V2c, SnmpVersion::V1],
            communities: vec![SecretString::from("public")],
            ports: vec![161],
            concurrency: 4,
        }
    }
}

/// Opens an SNMP transport for one candidate configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a transport. The token cancels this attempt only.
    async fn connect(
        &self,
        config: SnmpConfig,
        cancel: CancellationToken,
    ) -> Result<Arc<dyn SnmpTransport>>;
}

/// Connector that opens real [`SnmpClient`] sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnmpConnector;

#[async_trait]
impl Connector for SnmpConnector {
    async fn connect(
        &self,
        config: SnmpConfig,
        cancel: CancellationToken,
    ) -> Result<Arc<dyn SnmpTransport>> {
        let client = Box::pin(SnmpClient::connect(config, cancel)).await?;
        Ok(Arc::new(client))
    }
}

/// Expand `base` into ranked candidate configurations.
fn candidates(base: &SnmpConfig, options: &DiscoveryOptions) -> Vec<SnmpConfig> {
    let mut versions = options.versions.clone();
    versions.sort_by(|a, b| b.cmp(a));
    versions.dedup();

    let ports = if options.ports.is_empty() {
        vec![base.port]
    } else {
        options.ports.clone()
    };

    let mut out = Vec::new();
    for version in versions {
        if version == SnmpVersion::V3 {
            if base.v3.is_none() {
                trace!("skipping SNMPv3 candidates: no credentials configured");
                continue;
            }
            for &port in &ports {
                out.push(SnmpConfig {
                    version,
                    port,
                    ..base.clone()
                });
            }
            continue;
        }

        let communities = if options.communities.is_empty() {
            vec![base.community.clone()]
        } else {
            options.communities.clone()
        };
        for community in &communities {
            for &port in &ports {
                out.push(SnmpConfig {
                    version,
                    port,
                    community: community.clone(),
                    ..base.clone()
                });
            }
        }
    }
    out
}

/// Connect and check that the agent answers for the system group.
async fn attempt(
    connector: &dyn Connector,
    config: SnmpConfig,
    cancel: CancellationToken,
) -> Result<Arc<dyn SnmpTransport>> {
    let transport = connector.connect(config, cancel).await?;
    let probe = [Oid::parse(SYS_OBJECT_ID)?, Oid::parse(SYS_DESCRIPTION)?];
    let responses = transport.get(&probe).await?;
    if responses.iter().any(|r| r.is_successful()) {
        Ok(transport)
    } else {
        Err(Error::not_found("agent answered without system group"))
    }
}

/// Find the best working SNMP configuration.
///
/// Returns the chosen configuration together with its open transport.
/// The transport keeps a child token of `cancel`, so it stays usable after
/// discovery and is torn down with the parent operation.
pub async fn discover(
    base: &SnmpConfig,
    options: &DiscoveryOptions,
    connector: &dyn Connector,
    cancel: &CancellationToken,
) -> Result<(SnmpConfig, Arc<dyn SnmpTransport>)> {
    let candidates = candidates(base, options);
    if candidates.is_empty() {
        return Err(TransportError::Unavailable("SNMP").into());
    }

    let tokens: Vec<CancellationToken> = candidates.iter().map(|_| cancel.child_token()).collect();
    let mut finished = vec![false; candidates.len()];
    let mut best: Option<(usize, SnmpConfig, Arc<dyn SnmpTransport>)> = None;
    let mut last_error = None;

    debug!(
        "SNMP discovery for {}: {} candidates, {} in parallel",
        base.host,
        candidates.len(),
        options.concurrency.max(1)
    );

    let attempts = candidates.iter().cloned().enumerate().map(|(rank, config)| {
        let token = tokens[rank].clone();
        async move {
            let outcome = attempt(connector, config.clone(), token).await;
            (rank, config, outcome)
        }
    });
    let mut results = stream::iter(attempts).buffer_unordered(options.concurrency.max(1));

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            next = results.next() => next,
        };
        let Some((rank, config, outcome)) = next else {
            break;
        };
        finished[rank] = true;

        match outcome {
            Ok(transport) => {
                trace!(
                    "SNMP discovery: candidate {rank} (version {}, port {}) answered",
                    config.version, config.port
                );
                if best.as_ref().is_none_or(|(current, _, _)| rank < *current) {
                    best = Some((rank, config, transport));
                }
            }
            Err(e) => {
                trace!("SNMP discovery: candidate {rank} failed ({}): {e}", e.kind());
                last_error = Some(e);
            }
        }

        if let Some((winner, _, _)) = &best {
            if finished[..*winner].iter().all(|done| *done) {
                break;
            }
        }
    }
    drop(results);

    let winner = best.as_ref().map(|(rank, _, _)| *rank);
    for (rank, token) in tokens.iter().enumerate() {
        if Some(rank) != winner {
            token.cancel();
        }
    }

    match best {
        Some((rank, config, transport)) => {
            debug!(
                "SNMP discovery for {} chose candidate {rank} (version {}, port {})",
                base.host, config.version, config.port
            );
            Ok((config, transport))
        }
        None => Err(last_error.unwrap_or(TransportError::Unavailable("SNMP").into())),
    }
}
