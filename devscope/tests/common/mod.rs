#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use devscope::transport::mock::MockSnmp;
use devscope::transport::{SYS_DESCRIPTION, SYS_OBJECT_ID, SnmpValue};
use devscope::{Device, DeviceBuilder, ExtensionRegistry, Hierarchy, HierarchyLoader};

pub const IF_INDEX: &str = "1.3.6.1.2.1.2.2.1.1";
pub const IF_DESCR: &str = "1.3.6.1.2.1.2.2.1.2";
pub const IF_TYPE: &str = "1.3.6.1.2.1.2.2.1.3";
pub const IF_SPEED: &str = "1.3.6.1.2.1.2.2.1.5";
pub const IF_IN_OCTETS: &str = "1.3.6.1.2.1.2.2.1.10";
pub const IF_HIGH_SPEED: &str = "1.3.6.1.2.1.31.1.1.1.15";
pub const IF_NUMBER: &str = "1.3.6.1.2.1.2.1.0";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn classes_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("classes")
}

pub fn hierarchy() -> Arc<Hierarchy> {
    init_logging();
    let dir = classes_dir();
    let hierarchy = HierarchyLoader::new(&dir)
        .mappings(dir.join("mappings"))
        .extensions(ExtensionRegistry::with_builtin())
        .load()
        .unwrap();
    Arc::new(hierarchy)
}

/// An agent answering the system group.
pub fn agent(sys_object_id: &str, sys_descr: &str) -> MockSnmp {
    MockSnmp::new()
        .with(
            SYS_OBJECT_ID,
            SnmpValue::ObjectIdentifier(sys_object_id.parse().unwrap()),
        )
        .with(SYS_DESCRIPTION, SnmpValue::string(sys_descr))
}

/// Add one IF-MIB row.
pub fn with_interface(agent: MockSnmp, index: u32, descr: &str, speed: u32) -> MockSnmp {
    let i = index.to_string();
    agent
        .with(&format!("{IF_INDEX}.{i}"), SnmpValue::Integer(index.into()))
        .with(&format!("{IF_DESCR}.{i}"), SnmpValue::string(descr))
        .with(&format!("{IF_TYPE}.{i}"), SnmpValue::Integer(6))
        .with(&format!("{IF_SPEED}.{i}"), SnmpValue::Unsigned32(speed))
}

pub async fn device(agent: MockSnmp) -> Device {
    DeviceBuilder::new("192.0.2.1")
        .snmp_transport(Arc::new(agent))
        .build(hierarchy())
        .await
        .unwrap()
}
