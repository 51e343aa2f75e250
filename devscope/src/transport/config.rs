//! SNMP and HTTP connection configuration.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// SNMP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
pub enum SnmpVersion {
    #[serde(rename = "1")]
    V1,
    #[default]
    #[serde(rename = "2c")]
    V2c,
    #[serde(rename = "3")]
    V3,
}

impl std::fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SnmpVersion::V1 => "1",
            SnmpVersion::V2c => "2c",
            SnmpVersion::V3 => "3",
        })
    }
}

/// SNMPv3 security level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SecurityLevel {
    #[default]
    #[serde(rename = "noAuthNoPriv")]
    NoAuthNoPriv,
    #[serde(rename = "authNoPriv")]
    AuthNoPriv,
    #[serde(rename = "authPriv")]
    AuthPriv,
}

/// SNMPv3 authentication protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthProtocol {
    Md5,
    #[default]
    Sha,
}

/// SNMPv3 privacy protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrivProtocol {
    Des,
    #[default]
    Aes,
}

/// SNMPv3 user-based security parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct V3Credentials {
    /// Security level.
    pub level: SecurityLevel,

    /// User name.
    pub username: String,

    /// Authentication protocol.
    pub auth_protocol: AuthProtocol,

    /// Authentication passphrase.
    #[serde(deserialize_with = "optional_secret")]
    pub auth_password: Option<SecretString>,

    /// Privacy protocol.
    pub priv_protocol: PrivProtocol,

    /// Privacy passphrase.
    #[serde(deserialize_with = "optional_secret")]
    pub priv_password: Option<SecretString>,
}

/// SNMP connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnmpConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SNMP port (default: 161).
    pub port: u16,

    /// Protocol version.
    pub version: SnmpVersion,

    /// Community string for v1/v2c.
    #[serde(deserialize_with = "secret")]
    pub community: SecretString,

    /// Credentials for v3.
    pub v3: Option<V3Credentials>,

    /// Timeout of the first attempt; doubled on every retry.
    #[serde(deserialize_with = "duration_secs")]
    pub timeout: Duration,

    /// Number of retries after the first attempt.
    pub retries: u32,

    /// GETBULK max-repetitions used for walks.
    pub max_repetitions: u32,

    /// Maximum number of OIDs per GET request (0 = unlimited).
    pub max_oids: usize,

    /// Cache responses for the lifetime of one operation.
    pub cache: bool,
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 161,
            version: SnmpVersion::V2c,
            community: SecretString::from("public"),
            v3: None,
            timeout: Duration::from_secs(2),
            retries: 1,
            max_repetitions: 10,
            max_oids: 60,
            cache: true,
        }
    }
}

impl SnmpConfig {
    /// Create a configuration for `host` with default settings.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Copy of this configuration using `community` with `suffix` appended.
    pub fn with_community_suffix(&self, suffix: &str) -> Self {
        let community = format!("{}{}", self.community.expose_secret(), suffix);
        Self {
            community: SecretString::from(community),
            ..self.clone()
        }
    }
}

/// HTTP connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Target host.
    pub host: String,

    /// Port; defaults to 80/443 depending on `https`.
    pub port: Option<u16>,

    /// Use HTTPS.
    pub https: bool,

    /// Accept invalid TLS certificates.
    pub insecure: bool,

    /// Basic-auth user name.
    pub username: Option<String>,

    /// Basic-auth password.
    #[serde(deserialize_with = "optional_secret")]
    pub password: Option<SecretString>,

    /// Request timeout.
    #[serde(deserialize_with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: None,
            https: false,
            insecure: false,
            username: None,
            password: None,
            timeout: Duration::from_secs(5),
        }
    }
}

impl HttpConfig {
    /// Create a configuration for `host` with default settings.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Base URL (`scheme://host:port`) requests are resolved against.
    pub fn base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        let port = self.port.unwrap_or(if self.https { 443 } else { 80 });
        format!("{scheme}://{}:{port}", self.host)
    }
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

fn optional_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn duration_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = SnmpConfig::new("10.0.0.1");
        assert_eq!(config.socket_addr(), "10.0.0.1:161");

        let v6 = SnmpConfig::new("2001:db8::1");
        assert_eq!(v6.socket_addr(), "[2001:db8::1]:161");
    }

    #[test]
    fn test_community_suffix() {
        let config = SnmpConfig::new("10.0.0.1").with_community_suffix("@1");
        assert_eq!(config.community.expose_secret(), "public@1");
    }

    #[test]
    fn test_version_ordering() {
        assert!(SnmpVersion::V3 > SnmpVersion::V2c);
        assert!(SnmpVersion::V2c > SnmpVersion::V1);
    }

    #[test]
    fn test_http_base_url() {
        let mut config = HttpConfig::new("device.local");
        assert_eq!(config.base_url(), "http://device.local:80");
        config.https = true;
        config.port = Some(8443);
        assert_eq!(config.base_url(), "https://device.local:8443");
    }

    #[test]
    fn test_deserialize_snmp_config() {
        let config: SnmpConfig = serde_json::from_str(
            r#"{"host": "r1", "version": "3", "timeout": 0.5, "v3": {"level": "authPriv", "username": "mon"}}"#,
        )
        .unwrap();
        assert_eq!(config.version, SnmpVersion::V3);
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.v3.unwrap().level, SecurityLevel::AuthPriv);
        assert_eq!(config.port, 161);
    }
}
