//! Identify a device and print what its class can read.
//!
//! # Usage
//!
//! With a known community:
//! ```bash
//! cargo run --example identify -- --host 192.0.2.1 --community public
//! ```
//!
//! Probing several communities in parallel:
//! ```bash
//! cargo run --example identify -- --host 192.0.2.1 --discover public private
//! ```
//!
//! Set `RUST_LOG=devscope=trace` to see every fallback the engine takes.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use devscope::model::Component;
use devscope::transport::DiscoveryOptions;
use devscope::{DeviceBuilder, HierarchyLoader, SnmpConfig};
use secrecy::SecretString;
use serde::Serialize;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let hierarchy = HierarchyLoader::new(&args.classes)
        .mappings(args.classes.join("mappings"))
        .load()?;
    println!("Loaded {} device classes", hierarchy.len());

    let mut config = SnmpConfig::new(&args.host);
    config.port = args.port;
    config.community = SecretString::from(args.community.clone());
    config.timeout = Duration::from_secs(args.timeout);

    let mut builder = DeviceBuilder::new(&args.host).snmp(config);
    if !args.discover.is_empty() {
        builder = builder.discover(DiscoveryOptions {
            communities: args.discover.iter().cloned().map(SecretString::from).collect(),
            ports: vec![args.port],
            ..Default::default()
        });
    }

    let mut device = builder.build(Arc::new(hierarchy)).await?;
    let communicator = device.identify().await?;
    let ctx = device.context();

    println!("\nDevice class: {}", communicator.class_name());
    println!("{}", "-".repeat(50));
    let identity = communicator.get_identify_properties(ctx).await?;
    println!("{}", serde_json::to_string_pretty(&identity)?);

    let components = communicator.get_available_components();
    println!(
        "\nComponents: {}",
        components
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    for component in components {
        let record = match component {
            Component::Interfaces => to_json(communicator.get_interfaces(ctx, &[]).await),
            Component::Cpu => to_json(communicator.get_cpu_component(ctx).await),
            Component::Memory => to_json(communicator.get_memory_component(ctx).await),
            Component::Ups => to_json(communicator.get_ups_component(ctx).await),
            Component::Sbc => to_json(communicator.get_sbc_component(ctx).await),
            Component::Server => to_json(communicator.get_server_component(ctx).await),
            Component::Disk => to_json(communicator.get_disk_component(ctx).await),
            Component::HardwareHealth => {
                to_json(communicator.get_hardware_health_component(ctx).await)
            }
        };

        println!("\n{component}");
        println!("{}", "-".repeat(50));
        match record {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            Err(e) => println!("unavailable: {e}"),
        }
    }

    Ok(())
}

fn to_json<T: Serialize>(record: devscope::Result<T>) -> Result<serde_json::Value, String> {
    let record = record.map_err(|e| e.to_string())?;
    serde_json::to_value(record).map_err(|e| e.to_string())
}

/// Simple argument parser (in production, use clap).
struct Args {
    host: String,
    port: u16,
    community: String,
    discover: Vec<String>,
    classes: PathBuf,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 161u16;
        let mut community = "public".to_string();
        let mut discover = Vec::new();
        let mut classes = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("classes");
        let mut timeout = 2u64;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(161);
                    }
                }
                "--community" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        community = args[i].clone();
                    }
                }
                "--discover" | "-d" => {
                    while i + 1 < args.len() && !args[i + 1].starts_with('-') {
                        i += 1;
                        discover.push(args[i].clone());
                    }
                }
                "--classes" => {
                    i += 1;
                    if i < args.len() {
                        classes = PathBuf::from(&args[i]);
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(2);
                    }
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            host,
            port,
            community,
            discover,
            classes,
            timeout,
        }
    }

    fn print_help() {
        println!("Usage: identify [OPTIONS]");
        println!();
        println!("Options:");
        println!("  -h, --host <HOST>          Device address (default: localhost)");
        println!("  -p, --port <PORT>          SNMP port (default: 161)");
        println!("  -c, --community <NAME>     SNMP community (default: public)");
        println!("  -d, --discover <NAME>...   Probe these communities instead");
        println!("      --classes <DIR>        Device class directory");
        println!("  -t, --timeout <SECS>       Request timeout (default: 2)");
        println!("      --help                 Print help");
    }
}
