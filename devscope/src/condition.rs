//! Boolean conditions over probes and the identity discovered so far.
//!
//! Conditions decide which device class a device belongs to and guard
//! property readers. A probe that cannot be answered (no transport, timeout,
//! missing object) makes the condition false; only a missing identity field
//! and cancellation are reported as errors.

use std::fmt;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::context::{IdentityField, OperationContext};
use crate::error::{Error, Result};
use crate::matcher::StringMatcher;
use crate::oid::Oid;

/// How the members of a condition set are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[serde(rename = "AND", alias = "and")]
    And,
    #[default]
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => f.write_str("AND"),
            LogicalOperator::Or => f.write_str("OR"),
        }
    }
}

/// A compiled match condition.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Match `sysObjectID.0`.
    SysObjectId(StringMatcher),

    /// Match `sysDescr.0`.
    SysDescription(StringMatcher),

    /// Match the value of an arbitrary OID.
    SnmpGet {
        oid: Oid,
        use_raw_result: bool,
        matcher: StringMatcher,
    },

    /// Match the body of an HTTP GET.
    HttpGetBody { uri: String, matcher: StringMatcher },

    /// Match an identify field set earlier in the operation.
    Identity {
        field: IdentityField,
        matcher: StringMatcher,
    },

    /// Combine conditions, short-circuiting.
    Set {
        operator: LogicalOperator,
        conditions: Vec<Condition>,
    },
}

impl Condition {
    /// Evaluate against the device behind `ctx`.
    ///
    /// Errors are limited to [`Error::PreCondition`] and [`Error::Cancelled`].
    pub fn evaluate<'a>(&'a self, ctx: &'a OperationContext) -> BoxFuture<'a, Result<bool>> {
        async move {
            match self.probe(ctx).await {
                Ok(matched) => Ok(matched),
                Err(e @ (Error::PreCondition(_) | Error::Cancelled)) => Err(e),
                Err(e) => {
                    trace!("condition {} evaluated to false: {e}", self.describe());
                    Ok(false)
                }
            }
        }
        .boxed()
    }

    async fn probe(&self, ctx: &OperationContext) -> Result<bool> {
        ctx.ensure_active()?;
        match self {
            Condition::SysObjectId(matcher) => {
                let value = ctx.sys_object_id().await?;
                Ok(matcher.matches(&value.as_str()))
            }
            Condition::SysDescription(matcher) => {
                let value = ctx.sys_description().await?;
                Ok(matcher.matches(&value.as_str()))
            }
            Condition::SnmpGet {
                oid,
                use_raw_result,
                matcher,
            } => {
                let value = ctx.snmp_get(oid).await?.to_value(*use_raw_result);
                Ok(matcher.matches(&value.as_str()))
            }
            Condition::HttpGetBody { uri, matcher } => {
                let body = ctx.http_get_body(uri).await?;
                Ok(matcher.matches(&body))
            }
            Condition::Identity { field, matcher } => {
                let value = ctx
                    .identity_field(*field)
                    .ok_or_else(|| Error::PreCondition(format!("{field} is not determined yet")))?;
                Ok(matcher.matches(&value))
            }
            Condition::Set {
                operator,
                conditions,
            } => {
                for condition in conditions {
                    let matched = condition.evaluate(ctx).await?;
                    match operator {
                        LogicalOperator::And if !matched => return Ok(false),
                        LogicalOperator::Or if matched => return Ok(true),
                        _ => {}
                    }
                }
                Ok(*operator == LogicalOperator::And)
            }
        }
    }

    /// Whether evaluating may issue a request only this condition needs
    /// (an SNMP GET of a specific OID or an HTTP request).
    pub fn contains_unique_request(&self) -> bool {
        match self {
            Condition::SnmpGet { .. } | Condition::HttpGetBody { .. } => true,
            Condition::Set { conditions, .. } => {
                conditions.iter().any(Condition::contains_unique_request)
            }
            _ => false,
        }
    }

    fn describe(&self) -> String {
        match self {
            Condition::SysObjectId(m) => format!("sysObjectID {} {:?}", m.mode(), m.values()),
            Condition::SysDescription(m) => format!("sysDescr {} {:?}", m.mode(), m.values()),
            Condition::SnmpGet { oid, matcher, .. } => {
                format!("snmpget {oid} {} {:?}", matcher.mode(), matcher.values())
            }
            Condition::HttpGetBody { uri, matcher } => {
                format!("http {uri} {} {:?}", matcher.mode(), matcher.values())
            }
            Condition::Identity { field, matcher } => {
                format!("{field} {} {:?}", matcher.mode(), matcher.values())
            }
            Condition::Set {
                operator,
                conditions,
            } => format!("{operator} set of {}", conditions.len()),
        }
    }
}
