//! ADVA FSP 3000 R7.
//!
//! The declarative class reads IF-MIB; this extension adds the DWDM
//! sub-record of every line port:
//!
//! - rx/tx power and FEC counters from per-`ifIndex` performance tables
//! - channel power from the channel table, whose index starts with the
//!   numeric parts of the port's `ifDescr`:
//!
//! ```text
//! ifDescr "CH-1-3-N1"  ─►  key 1.3.1
//! channel row 1.3.1.19590  ─►  port 1.3.1, channel "19590"
//! ```

use async_trait::async_trait;

use super::{decibel_tenths, walk_column};
use crate::communicator::Communicator;
use crate::context::OperationContext;
use crate::error::Result;
use crate::extension::CodeExtension;
use crate::model::{DwdmInterface, Interface, OpticalChannel, Rate};
use crate::reader::PropertyFilter;

const RX_POWER: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.3.1.1";
const TX_POWER: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.3.1.2";
const CORRECTED_FEC_15M: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.7.1.1";
const CORRECTED_FEC_1D: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.7.1.2";
const UNCORRECTED_FEC_15M: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.7.1.3";
const UNCORRECTED_FEC_1D: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.7.1.4";
const CHANNEL_RX_POWER: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.5.1.1";
const CHANNEL_TX_POWER: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.5.1.2";

/// Extension for the `adva/fsp3kr7` class.
pub struct Fsp3kR7;

#[async_trait]
impl CodeExtension for Fsp3kR7 {
    fn name(&self) -> &str {
        "adva/fsp3kr7"
    }

    async fn get_interfaces(
        &self,
        ctx: &OperationContext,
        base: &Communicator,
        filters: &[PropertyFilter],
    ) -> Result<Vec<Interface>> {
        let mut interfaces = base.interfaces(ctx, filters).await?;
        add_power_values(ctx, &mut interfaces).await?;
        add_fec_counters(ctx, &mut interfaces).await?;
        add_channels(ctx, &mut interfaces).await?;
        Ok(interfaces)
    }
}

fn dwdm(interface: &mut Interface) -> &mut DwdmInterface {
    interface.dwdm.get_or_insert_with(DwdmInterface::default)
}

async fn add_power_values(ctx: &OperationContext, interfaces: &mut [Interface]) -> Result<()> {
    let rx = walk_column(ctx, RX_POWER).await?;
    let tx = walk_column(ctx, TX_POWER).await?;

    for interface in interfaces.iter_mut() {
        let Some(index) = interface.if_index.map(|i| i.to_string()) else {
            continue;
        };
        if let Some(power) = rx.get(&index).and_then(decibel_tenths) {
            dwdm(interface).rx_power = Some(power);
        }
        if let Some(power) = tx.get(&index).and_then(decibel_tenths) {
            dwdm(interface).tx_power = Some(power);
        }
    }
    Ok(())
}

async fn add_fec_counters(ctx: &OperationContext, interfaces: &mut [Interface]) -> Result<()> {
    let columns = [
        (CORRECTED_FEC_15M, "15m", true),
        (CORRECTED_FEC_1D, "1d", true),
        (UNCORRECTED_FEC_15M, "15m", false),
        (UNCORRECTED_FEC_1D, "1d", false),
    ];
    for (column, time, corrected) in columns {
        let values = walk_column(ctx, column).await?;
        if values.is_empty() {
            continue;
        }
        for interface in interfaces.iter_mut() {
            let Some(index) = interface.if_index.map(|i| i.to_string()) else {
                continue;
            };
            let Some(value) = values.get(&index).and_then(|v| v.to_u64().ok()) else {
                continue;
            };
            let rate = Rate {
                time: time.to_string(),
                value,
            };
            let dwdm = dwdm(interface);
            if corrected {
                dwdm.corrected_fec.push(rate);
            } else {
                dwdm.uncorrected_fec.push(rate);
            }
        }
    }
    Ok(())
}

async fn add_channels(ctx: &OperationContext, interfaces: &mut [Interface]) -> Result<()> {
    let rx = walk_column(ctx, CHANNEL_RX_POWER).await?;
    let tx = walk_column(ctx, CHANNEL_TX_POWER).await?;
    if rx.is_empty() && tx.is_empty() {
        return Ok(());
    }

    for interface in interfaces.iter_mut() {
        let Some(key) = interface.if_descr.as_deref().and_then(descr_key) else {
            continue;
        };
        let prefix = format!("{key}.");

        let mut channels: Vec<OpticalChannel> = Vec::new();
        for (index, value) in rx.iter() {
            if let Some(channel) = index.strip_prefix(&prefix) {
                channels.push(OpticalChannel {
                    channel: channel.to_string(),
                    rx_power: decibel_tenths(value),
                    tx_power: tx.get(index).and_then(decibel_tenths),
                });
            }
        }
        for (index, value) in tx.iter() {
            if let Some(channel) = index.strip_prefix(&prefix) {
                if !rx.contains_key(index) {
                    channels.push(OpticalChannel {
                        channel: channel.to_string(),
                        rx_power: None,
                        tx_power: decibel_tenths(value),
                    });
                }
            }
        }

        if !channels.is_empty() {
            dwdm(interface).channels = channels;
        }
    }
    Ok(())
}

/// Numeric parts of a channel port's `ifDescr` (`CH-1-3-N1` → `1.3.1`).
fn descr_key(descr: &str) -> Option<String> {
    let rest = descr.strip_prefix("CH-")?;
    let parts: Vec<&str> = rest
        .split('-')
        .map(|part| part.trim_start_matches(|c: char| c.is_ascii_alphabetic()))
        .collect();
    if parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    Some(parts.join("."))
}
