//! Built-in vendor extensions.

pub mod adva;
pub mod ceraos;
pub mod ekinops;
pub mod timos;

use std::sync::Arc;

use indexmap::IndexMap;
use log::trace;

use crate::context::OperationContext;
use crate::error::Result;
use crate::oid::Oid;
use crate::transport::{SnmpResponse, SnmpTransport};
use crate::value::Value;

/// One walked column as `index → value`, in walk order.
pub(crate) type Column = IndexMap<String, Value>;

/// Walk `column` over the operation's SNMP transport.
///
/// A vendor table the device does not implement yields an empty column.
pub(crate) async fn walk_column(ctx: &OperationContext, column: &str) -> Result<Column> {
    let oid = Oid::parse(column)?;
    match ctx.snmp_walk(&oid).await {
        Ok(responses) => Ok(collect_column(&oid, &responses)),
        Err(e) if e.is_not_found() => {
            trace!("vendor column {column} is empty");
            Ok(Column::new())
        }
        Err(e) => Err(e),
    }
}

/// Like [`walk_column`], over a dedicated transport.
pub(crate) async fn walk_column_with(
    ctx: &OperationContext,
    transport: &Arc<dyn SnmpTransport>,
    column: &str,
) -> Result<Column> {
    ctx.ensure_active()?;
    let oid = Oid::parse(column)?;
    match transport.walk(&oid).await {
        Ok(responses) => Ok(collect_column(&oid, &responses)),
        Err(e) if e.is_not_found() => Ok(Column::new()),
        Err(e) => Err(e),
    }
}

fn collect_column(column: &Oid, responses: &[SnmpResponse]) -> Column {
    responses
        .iter()
        .filter(|r| r.is_successful())
        .filter_map(|r| {
            r.oid
                .index_after(column)
                .map(|index| (index.to_string(), r.to_value(false)))
        })
        .collect()
}

/// Optical power reported in tenths of a dBm.
pub(crate) fn decibel_tenths(value: &Value) -> Option<f64> {
    value.to_i64().ok().map(|v| v as f64 / 10.0)
}
