//! Code extensions for vendors that need imperative post-processing.
//!
//! A device class can be paired with a [`CodeExtension`] registered under
//! the class's full name (`adva/fsp3kr7`, `timos`, ...). The communicator
//! asks the extension first and hands it a `base` communicator for the same
//! class without the extension, so an extension typically reads the
//! declarative result and then patches it:
//!
//! ```text
//!   Communicator::get_interfaces
//!          │
//!          ▼
//!   extension.get_interfaces(ctx, base) ──► base.get_interfaces(ctx)
//!          │                                   (declarative + parents)
//!          ▼
//!   walk vendor tables, merge into rows
//! ```
//!
//! Every method defaults to [`Error::NotImplemented`], which makes the
//! communicator continue with the declarative readers.

mod registry;
pub mod vendors;

pub use registry::ExtensionRegistry;

use async_trait::async_trait;

use crate::class::{Property, Table};
use crate::communicator::Communicator;
use crate::context::OperationContext;
use crate::error::{Error, Result};
use crate::model::Interface;
use crate::reader::PropertyFilter;
use crate::reader::group::GroupRow;
use crate::value::Value;

/// Vendor hooks layered over a declarative device class.
#[async_trait]
pub trait CodeExtension: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Community suffix for an additional SNMP client (`<community><suffix>`).
    fn community_suffix(&self) -> Option<&str> {
        None
    }

    /// Read a single property.
    async fn get_property(
        &self,
        _ctx: &OperationContext,
        _base: &Communicator,
        _property: Property,
    ) -> Result<Value> {
        Err(Error::NotImplemented)
    }

    /// Read the interface records.
    async fn get_interfaces(
        &self,
        _ctx: &OperationContext,
        _base: &Communicator,
        _filters: &[PropertyFilter],
    ) -> Result<Vec<Interface>> {
        Err(Error::NotImplemented)
    }

    /// Read the rows of a non-interface table.
    async fn get_rows(
        &self,
        _ctx: &OperationContext,
        _base: &Communicator,
        _table: Table,
        _filters: &[PropertyFilter],
    ) -> Result<Vec<GroupRow>> {
        Err(Error::NotImplemented)
    }
}
