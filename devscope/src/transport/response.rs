//! Owned SNMP and HTTP response types.

use std::fmt;
use std::net::Ipv4Addr;

use crate::oid::Oid;
use crate::value::Value;

/// A decoded SNMP varbind value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Boolean(bool),
    Integer(i64),
    OctetString(Vec<u8>),
    ObjectIdentifier(Oid),
    IpAddress([u8; 4]),
    Counter32(u32),
    Unsigned32(u32),
    TimeTicks(u32),
    Opaque(Vec<u8>),
    Counter64(u64),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl SnmpValue {
    /// Convenience constructor for OCTET STRING values.
    pub fn string(s: &str) -> Self {
        SnmpValue::OctetString(s.as_bytes().to_vec())
    }

    /// Name of the ASN.1 / SMI type.
    pub fn type_name(&self) -> &'static str {
        match self {
            SnmpValue::Boolean(_) => "Boolean",
            SnmpValue::Integer(_) => "Integer",
            SnmpValue::OctetString(_) => "OctetString",
            SnmpValue::ObjectIdentifier(_) => "ObjectIdentifier",
            SnmpValue::IpAddress(_) => "IpAddress",
            SnmpValue::Counter32(_) => "Counter32",
            SnmpValue::Unsigned32(_) => "Gauge32",
            SnmpValue::TimeTicks(_) => "TimeTicks",
            SnmpValue::Opaque(_) => "Opaque",
            SnmpValue::Counter64(_) => "Counter64",
            SnmpValue::Null => "Null",
            SnmpValue::NoSuchObject => "NoSuchObject",
            SnmpValue::NoSuchInstance => "NoSuchInstance",
            SnmpValue::EndOfMibView => "EndOfMibView",
        }
    }
}

/// One varbind returned by an SNMP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpResponse {
    /// The OID the agent answered for.
    pub oid: Oid,

    /// The returned value.
    pub value: SnmpValue,
}

impl SnmpResponse {
    /// Create a new response.
    pub fn new(oid: Oid, value: SnmpValue) -> Self {
        Self { oid, value }
    }

    /// A "no such object" response for `oid`.
    pub fn no_such_object(oid: Oid) -> Self {
        Self::new(oid, SnmpValue::NoSuchObject)
    }

    /// Whether the agent returned an actual value.
    pub fn is_successful(&self) -> bool {
        !matches!(
            self.value,
            SnmpValue::NoSuchObject
                | SnmpValue::NoSuchInstance
                | SnmpValue::Null
                | SnmpValue::EndOfMibView
        )
    }

    /// Value as text.
    ///
    /// OCTET STRINGs are decoded as ISO-8859-1 with non-printing characters
    /// trimmed from both ends.
    pub fn value_string(&self) -> String {
        match &self.value {
            SnmpValue::OctetString(bytes) | SnmpValue::Opaque(bytes) => {
                latin1(bytes).trim_matches(|c: char| c.is_control()).to_string()
            }
            _ => self.scalar_string(),
        }
    }

    /// Value as text, with OCTET STRINGs rendered as hex (`00 1A 2B`).
    pub fn value_string_raw(&self) -> String {
        match &self.value {
            SnmpValue::OctetString(bytes) => hex(bytes),
            _ => self.value_string(),
        }
    }

    /// Convert into an engine [`Value`].
    pub fn to_value(&self, raw: bool) -> Value {
        if raw {
            Value::from(self.value_string_raw())
        } else {
            Value::from(self.value_string())
        }
    }

    fn scalar_string(&self) -> String {
        match &self.value {
            SnmpValue::Boolean(b) => b.to_string(),
            SnmpValue::Integer(i) => i.to_string(),
            SnmpValue::ObjectIdentifier(oid) => oid.to_string(),
            SnmpValue::IpAddress(ip) => Ipv4Addr::from(*ip).to_string(),
            SnmpValue::Counter32(v) | SnmpValue::Unsigned32(v) | SnmpValue::TimeTicks(v) => {
                v.to_string()
            }
            SnmpValue::Counter64(v) => v.to_string(),
            SnmpValue::OctetString(bytes) | SnmpValue::Opaque(bytes) => latin1(bytes),
            SnmpValue::Null
            | SnmpValue::NoSuchObject
            | SnmpValue::NoSuchInstance
            | SnmpValue::EndOfMibView => String::new(),
        }
    }
}

impl fmt::Display for SnmpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {}: {}",
            self.oid,
            self.value.type_name(),
            self.value_string()
        )
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Response of an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status code is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(s: &str) -> Oid {
        Oid::parse(s).unwrap()
    }

    #[test]
    fn test_successful_predicate() {
        assert!(SnmpResponse::new(oid("1.3"), SnmpValue::Integer(0)).is_successful());
        assert!(!SnmpResponse::no_such_object(oid("1.3")).is_successful());
        assert!(!SnmpResponse::new(oid("1.3"), SnmpValue::NoSuchInstance).is_successful());
        assert!(!SnmpResponse::new(oid("1.3"), SnmpValue::Null).is_successful());
    }

    #[test]
    fn test_value_string_trims_non_printing() {
        let r = SnmpResponse::new(oid("1.3"), SnmpValue::OctetString(b"\0eth0\r\n\0".to_vec()));
        assert_eq!(r.value_string(), "eth0");
    }

    #[test]
    fn test_value_string_is_latin1() {
        let r = SnmpResponse::new(oid("1.3"), SnmpValue::OctetString(vec![0x47, 0xE9, 0x72]));
        assert_eq!(r.value_string(), "G\u{e9}r");
    }

    #[test]
    fn test_value_string_raw_hex() {
        let r = SnmpResponse::new(
            oid("1.3"),
            SnmpValue::OctetString(vec![0x00, 0x1a, 0x2b, 0xff]),
        );
        assert_eq!(r.value_string_raw(), "00 1A 2B FF");

        let counter = SnmpResponse::new(oid("1.3"), SnmpValue::Counter64(12));
        assert_eq!(counter.value_string_raw(), "12");
    }

    #[test]
    fn test_scalar_types() {
        let ip = SnmpResponse::new(oid("1.3"), SnmpValue::IpAddress([10, 0, 0, 1]));
        assert_eq!(ip.value_string(), "10.0.0.1");

        let sys_oid = SnmpResponse::new(
            oid("1.3.6.1.2.1.1.2.0"),
            SnmpValue::ObjectIdentifier(oid("1.3.6.1.4.1.9.1.516")),
        );
        assert_eq!(sys_oid.value_string(), "1.3.6.1.4.1.9.1.516");
        assert_eq!(sys_oid.to_value(false).to_string(), "1.3.6.1.4.1.9.1.516");
    }
}
