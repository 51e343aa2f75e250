//! # devscope
//!
//! Declarative device-class resolution and telemetry extraction for network
//! devices reachable over SNMP and HTTP.
//!
//! devscope identifies what a device is by walking a tree of YAML device
//! classes, then reads identity, interfaces and component data the way the
//! resolved class describes it.
//!
//! ## Features
//!
//! - Device classes as data: match conditions, property readers and
//!   operator pipelines in YAML, inherited down the class tree
//! - Async SNMP v1/v2c/v3 via snmp2, with response caching and parallel
//!   discovery of a working version/community/port
//! - HTTP probes via reqwest
//! - Typed records for interfaces, CPU, memory, UPS, SBC, server, disk and
//!   hardware health
//! - Code extensions for vendors that need imperative post-processing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use devscope::{DeviceBuilder, HierarchyLoader, SnmpConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), devscope::Error> {
//!     let hierarchy = HierarchyLoader::new("classes")
//!         .mappings("classes/mappings")
//!         .load()?;
//!
//!     let mut device = DeviceBuilder::new("192.168.1.1")
//!         .snmp(SnmpConfig::new("192.168.1.1"))
//!         .build(Arc::new(hierarchy))
//!         .await?;
//!
//!     let communicator = device.identify().await?;
//!     let ctx = device.context();
//!     println!("class:  {}", communicator.class_name());
//!     println!("vendor: {}", communicator.get_vendor(ctx).await?);
//!     for interface in communicator.get_interfaces(ctx, &[]).await? {
//!         println!("{:?} {:?}", interface.if_descr, interface.if_speed);
//!     }
//!     Ok(())
//! }
//! ```

pub mod class;
pub mod communicator;
pub mod condition;
pub mod context;
pub mod device;
pub mod error;
pub mod extension;
pub mod matcher;
pub mod model;
pub mod oid;
pub mod operator;
pub mod reader;
pub mod resolver;
pub mod transport;
pub mod value;

// Re-export main types for convenience
pub use class::{DeviceClass, Hierarchy, HierarchyLoader};
pub use communicator::Communicator;
pub use context::OperationContext;
pub use device::{Device, DeviceBuilder};
pub use error::{Error, Result};
pub use extension::{CodeExtension, ExtensionRegistry};
pub use reader::PropertyFilter;
pub use resolver::Resolver;
pub use transport::{HttpConfig, SnmpConfig};
pub use value::Value;
