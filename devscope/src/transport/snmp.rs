//! SNMP client backed by `snmp2`.

use std::io;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use log::{debug, trace};
use secrecy::ExposeSecret;
use snmp2::AsyncSession;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::SnmpTransport;
use super::config::{AuthProtocol, PrivProtocol, SecurityLevel, SnmpConfig, SnmpVersion};
use super::response::{SnmpResponse, SnmpValue};
use crate::error::{Error, Result, TransportError};
use crate::oid::Oid;

/// SNMPv1 error-status `noSuchName`.
const NO_SUCH_NAME: u32 = 2;

/// SNMP client for one agent.
///
/// Requests are serialized over a single UDP session. Every request is
/// retried `retries` times with a timeout that doubles per attempt, and
/// aborts as soon as the client's cancellation token fires.
pub struct SnmpClient {
    config: SnmpConfig,
    session: Mutex<Box<AsyncSession>>,
    max_repetitions: AtomicU32,
    max_oids: AtomicUsize,
    cancel: CancellationToken,
}

enum Request<'a> {
    Get(&'a [snmp2::Oid<'static>]),
    GetNext(&'a snmp2::Oid<'static>),
    GetBulk(&'a snmp2::Oid<'static>, u32),
}

struct Reply {
    error_status: u32,
    responses: Vec<SnmpResponse>,
}

impl SnmpClient {
    /// Open a session to the agent described by `config`.
    ///
    /// For SNMPv3 this also runs engine discovery, so it already talks to
    /// the agent. For v1/v2c no packet is sent yet.
    pub async fn connect(config: SnmpConfig, cancel: CancellationToken) -> Result<Self> {
        let addr = config.socket_addr();
        let budget = config.timeout.saturating_mul(config.retries + 1);

        let open = Box::pin(Self::open_session(&config, &addr));
        let session = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            result = tokio::time::timeout(budget, open) => {
                result.map_err(|_| TransportError::Timeout(budget))??
            }
        };

        debug!(
            "SNMP session to {} opened (version {}, max_repetitions {})",
            addr, config.version, config.max_repetitions
        );

        Ok(Self {
            max_repetitions: AtomicU32::new(config.max_repetitions),
            max_oids: AtomicUsize::new(config.max_oids),
            session: Mutex::new(session),
            config,
            cancel,
        })
    }

    /// Configuration this client was created with.
    pub fn config(&self) -> &SnmpConfig {
        &self.config
    }

    /// The session carries its packet buffers inline, so it lives on the heap.
    async fn open_session(config: &SnmpConfig, addr: &str) -> Result<Box<AsyncSession>> {
        let connection_failed = |source: io::Error| TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        };
        let community = config.community.expose_secret().as_bytes();

        let session = match config.version {
            SnmpVersion::V1 => AsyncSession::new_v1(addr, community, 0)
                .await
                .map_err(connection_failed)?,
            SnmpVersion::V2c => AsyncSession::new_v2c(addr, community, 0)
                .await
                .map_err(connection_failed)?,
            SnmpVersion::V3 => {
                let security = v3_security(config)?;
                let mut session = AsyncSession::new_v3(addr, 0, security)
                    .await
                    .map_err(connection_failed)?;
                session.init().await.map_err(snmp_error)?;
                session
            }
        };

        Ok(Box::new(session))
    }

    /// Send one request, retrying on timeout.
    async fn send(&self, request: Request<'_>) -> Result<Reply> {
        let mut timeout = self.config.timeout;
        let mut attempt = 0;

        loop {
            let outcome = {
                let mut session = self.session.lock().await;
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                    result = tokio::time::timeout(timeout, Self::exchange(&mut session, &request)) => result,
                }
            };

            match outcome {
                Ok(reply) => return reply,
                Err(_) if attempt < self.config.retries => {
                    attempt += 1;
                    timeout = timeout.saturating_mul(2);
                    debug!(
                        "SNMP request to {} timed out, retry {}/{} with {:?}",
                        self.config.host, attempt, self.config.retries, timeout
                    );
                }
                Err(_) => return Err(TransportError::Timeout(timeout).into()),
            }
        }
    }

    async fn exchange(session: &mut AsyncSession, request: &Request<'_>) -> Result<Reply> {
        let pdu = match request {
            Request::Get(oids) => {
                let names: Vec<&snmp2::Oid<'_>> = oids.iter().collect();
                session.get_many(&names).await
            }
            Request::GetNext(oid) => session.getnext(oid).await,
            Request::GetBulk(oid, repetitions) => session.getbulk(&[*oid], 0, *repetitions).await,
        }
        .map_err(snmp_error)?;

        let error_status = pdu.error_status;
        let mut responses = Vec::new();
        for (name, value) in pdu.varbinds {
            let oid = Oid::parse(&name.to_id_string())
                .map_err(|e| TransportError::Snmp(e.to_string()))?;
            responses.push(SnmpResponse::new(oid, convert_value(value)));
        }

        Ok(Reply {
            error_status,
            responses,
        })
    }

    /// GET a single OID, mapping v1 `noSuchName` to a non-successful response.
    async fn get_single(&self, oid: &Oid) -> Result<SnmpResponse> {
        let raw = [to_snmp2(oid)?];
        let reply = self.send(Request::Get(&raw)).await?;
        match reply.error_status {
            0 => reply
                .responses
                .into_iter()
                .next()
                .ok_or_else(|| TransportError::Snmp("empty GET response".into()).into()),
            NO_SUCH_NAME => Ok(SnmpResponse::no_such_object(oid.clone())),
            status => Err(TransportError::Snmp(format!(
                "GET {oid} failed with error status {status}"
            ))
            .into()),
        }
    }
}

#[async_trait]
impl SnmpTransport for SnmpClient {
    async fn get(&self, oids: &[Oid]) -> Result<Vec<SnmpResponse>> {
        let chunk_size = match self.max_oids() {
            0 => oids.len().max(1),
            n => n,
        };

        let mut responses = Vec::with_capacity(oids.len());
        for batch in oids.chunks(chunk_size) {
            let raw = batch.iter().map(to_snmp2).collect::<Result<Vec<_>>>()?;
            let reply = self.send(Request::Get(&raw)).await?;

            if reply.error_status == 0 && reply.responses.len() == batch.len() {
                responses.extend(reply.responses);
            } else if reply.error_status == NO_SUCH_NAME {
                // v1 fails the whole PDU for one missing object
                trace!("GET batch hit noSuchName, retrying {} OIDs one by one", batch.len());
                for oid in batch {
                    responses.push(self.get_single(oid).await?);
                }
            } else {
                return Err(TransportError::Snmp(format!(
                    "GET failed with error status {}",
                    reply.error_status
                ))
                .into());
            }
        }

        Ok(responses)
    }

    async fn walk(&self, root: &Oid) -> Result<Vec<SnmpResponse>> {
        let mut results = Vec::new();
        let mut current = root.clone();

        'walk: loop {
            let raw = to_snmp2(&current)?;
            let reply = if self.config.version == SnmpVersion::V1 {
                self.send(Request::GetNext(&raw)).await?
            } else {
                let repetitions = self.max_repetitions().max(1);
                self.send(Request::GetBulk(&raw, repetitions)).await?
            };

            if reply.error_status == NO_SUCH_NAME || reply.responses.is_empty() {
                break;
            }
            if reply.error_status != 0 {
                return Err(TransportError::Snmp(format!(
                    "walk of {root} failed with error status {}",
                    reply.error_status
                ))
                .into());
            }

            for response in reply.responses {
                if !response.is_successful()
                    || response.oid.index_after(root).is_none()
                    || response.oid.cmp_index(&current).is_le()
                {
                    break 'walk;
                }
                current = response.oid.clone();
                results.push(response);
            }
        }

        if results.is_empty() {
            return Err(Error::not_found(format!("walk of {root} returned no objects")));
        }
        Ok(results)
    }

    async fn get_next(&self, oid: &Oid) -> Result<SnmpResponse> {
        let raw = to_snmp2(oid)?;
        let reply = self.send(Request::GetNext(&raw)).await?;
        if reply.error_status == NO_SUCH_NAME {
            return Ok(SnmpResponse::new(oid.clone(), SnmpValue::EndOfMibView));
        }
        reply
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::Snmp("empty GETNEXT response".into()).into())
    }

    fn version(&self) -> SnmpVersion {
        self.config.version
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

fn to_snmp2(oid: &Oid) -> Result<snmp2::Oid<'static>> {
    snmp2::Oid::from(&oid.components())
        .map_err(|e| TransportError::Snmp(format!("invalid OID {oid}: {e:?}")).into())
}

fn snmp_error(e: snmp2::Error) -> Error {
    TransportError::Snmp(e.to_string()).into()
}

fn convert_value(value: snmp2::Value<'_>) -> SnmpValue {
    use snmp2::Value as Raw;

    match value {
        Raw::Boolean(b) => SnmpValue::Boolean(b),
        Raw::Integer(i) => SnmpValue::Integer(i),
        Raw::OctetString(bytes) => SnmpValue::OctetString(bytes.to_vec()),
        Raw::ObjectIdentifier(oid) => Oid::parse(&oid.to_id_string())
            .map(SnmpValue::ObjectIdentifier)
            .unwrap_or(SnmpValue::Null),
        Raw::IpAddress(ip) => SnmpValue::IpAddress(ip),
        Raw::Counter32(v) => SnmpValue::Counter32(v),
        Raw::Unsigned32(v) => SnmpValue::Unsigned32(v),
        Raw::Timeticks(v) => SnmpValue::TimeTicks(v),
        Raw::Opaque(bytes) => SnmpValue::Opaque(bytes.to_vec()),
        Raw::Counter64(v) => SnmpValue::Counter64(v),
        Raw::NoSuchObject => SnmpValue::NoSuchObject,
        Raw::NoSuchInstance => SnmpValue::NoSuchInstance,
        Raw::EndOfMibView => SnmpValue::EndOfMibView,
        _ => SnmpValue::Null,
    }
}

fn v3_security(config: &SnmpConfig) -> Result<snmp2::v3::Security> {
    use snmp2::v3::{Auth, AuthProtocol as Snmp2AuthProtocol, Cipher, Security};

    let credentials = config
        .v3
        .as_ref()
        .ok_or_else(|| TransportError::Snmp("SNMPv3 requires credentials".into()))?;

    let secret = |s: &Option<secrecy::SecretString>| {
        s.as_ref()
            .map(|p| p.expose_secret().as_bytes().to_vec())
            .unwrap_or_default()
    };
    let auth_password = secret(&credentials.auth_password);

    let security = Security::new(credentials.username.as_bytes(), &auth_password)
        .with_auth_protocol(match credentials.auth_protocol {
            AuthProtocol::Md5 => Snmp2AuthProtocol::Md5,
            AuthProtocol::Sha => Snmp2AuthProtocol::Sha1,
        });

    let auth = match credentials.level {
        SecurityLevel::NoAuthNoPriv => Auth::NoAuthNoPriv,
        SecurityLevel::AuthNoPriv => Auth::AuthNoPriv,
        SecurityLevel::AuthPriv => Auth::AuthPriv {
            cipher: match credentials.priv_protocol {
                PrivProtocol::Des => Cipher::Des,
                PrivProtocol::Aes => Cipher::Aes128,
            },
            privacy_password: secret(&credentials.priv_password),
        },
    };

    Ok(security.with_auth(auth))
}
