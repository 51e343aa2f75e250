mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;

use common::*;
use devscope::model::Rate;
use devscope::transport::SnmpValue;
use devscope::transport::mock::MockSnmp;
use devscope::{DeviceBuilder, PropertyFilter};

const ADVA_CORRECTED_FEC_15M: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.7.1.1";
const ADVA_CORRECTED_FEC_1D: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.7.1.2";
const ADVA_UNCORRECTED_FEC_1D: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.7.1.4";
const ADVA_RX_POWER: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.3.1.1";
const ADVA_CHANNEL_RX_POWER: &str = "1.3.6.1.4.1.2544.1.11.7.7.2.5.1.1";

#[tokio::test]
async fn test_high_speed_fallback() {
    let snmp = with_interface(
        agent("1.3.6.1.4.1.9.1.516", "Cisco IOS Software"),
        1,
        "TenGigabitEthernet1/1",
        u32::MAX,
    )
    .with(&format!("{IF_HIGH_SPEED}.1"), SnmpValue::Unsigned32(10_000));
    let snmp = with_interface(snmp, 2, "GigabitEthernet0/0", 1_000_000_000)
        .with(&format!("{IF_HIGH_SPEED}.2"), SnmpValue::Unsigned32(1_000));

    let mut device = device(snmp).await;
    let communicator = device.identify().await.unwrap();
    let interfaces = communicator
        .get_interfaces(device.context(), &[])
        .await
        .unwrap();

    assert_eq!(interfaces.len(), 2);
    assert_eq!(interfaces[0].if_speed, Some(10_000_000_000));
    assert_eq!(interfaces[0].if_type.as_deref(), Some("ethernetCsmacd"));
    assert_eq!(interfaces[1].if_speed, Some(1_000_000_000));
}

#[tokio::test]
async fn test_group_filter() {
    let snmp = with_interface(agent("1.3.6.1.4.1.9.1.516", "Cisco"), 1, "Ethernet #1", 100);
    let snmp = with_interface(snmp, 2, "Mgmt", 100);

    let mut device = device(snmp).await;
    let communicator = device.identify().await.unwrap();
    let filters = vec![PropertyFilter::group("ifDescr", "Ethernet .*").unwrap()];
    let interfaces = communicator
        .get_interfaces(device.context(), &filters)
        .await
        .unwrap();

    assert_eq!(interfaces.len(), 1);
    assert_eq!(interfaces[0].if_index, Some(2));
    assert_eq!(interfaces[0].if_descr.as_deref(), Some("Mgmt"));
}

#[tokio::test]
async fn test_count_interfaces() {
    let snmp = with_interface(agent("1.3.6.1.4.1.9.1.516", "Cisco"), 1, "Gi0/0", 100);
    let snmp = with_interface(snmp, 2, "Gi0/1", 100);
    let mut device = device(snmp).await;
    let communicator = device.identify().await.unwrap();
    assert_eq!(
        communicator.get_count_interfaces(device.context()).await.unwrap(),
        2
    );

    let snmp = agent("1.3.6.1.4.1.9.1.516", "Cisco").with(IF_NUMBER, SnmpValue::Integer(48));
    let mut device = common::device(snmp).await;
    let communicator = device.identify().await.unwrap();
    assert_eq!(
        communicator.get_count_interfaces(device.context()).await.unwrap(),
        48
    );
}

#[tokio::test]
async fn test_adva_fec_counters() {
    let snmp = with_interface(agent("1.3.6.1.4.1.2544.1.11.1", "FSP3000R7"), 1, "CH-1-3-N1", 0)
        .with(&format!("{ADVA_CORRECTED_FEC_15M}.1"), SnmpValue::Counter64(12))
        .with(&format!("{ADVA_CORRECTED_FEC_1D}.1"), SnmpValue::Counter64(340))
        .with(&format!("{ADVA_UNCORRECTED_FEC_1D}.1"), SnmpValue::Counter64(1))
        .with(&format!("{ADVA_RX_POWER}.1"), SnmpValue::Integer(-123))
        .with(&format!("{ADVA_CHANNEL_RX_POWER}.1.3.1.19590"), SnmpValue::Integer(-35));
    let snmp = with_interface(snmp, 2, "MGMT", 100_000_000);

    let mut device = device(snmp).await;
    let communicator = device.identify().await.unwrap();
    assert_eq!(communicator.class_name(), "adva/fsp3kr7");
    let interfaces = communicator
        .get_interfaces(device.context(), &[])
        .await
        .unwrap();

    let dwdm = interfaces[0].dwdm.as_ref().unwrap();
    assert_eq!(
        dwdm.corrected_fec,
        vec![
            Rate {
                time: "15m".into(),
                value: 12
            },
            Rate {
                time: "1d".into(),
                value: 340
            },
        ]
    );
    assert_eq!(
        dwdm.uncorrected_fec,
        vec![Rate {
            time: "1d".into(),
            value: 1
        }]
    );
    assert_eq!(dwdm.rx_power, Some(-12.3));
    assert_eq!(dwdm.channels.len(), 1);
    assert_eq!(dwdm.channels[0].channel, "19590");
    assert_eq!(dwdm.channels[0].rx_power, Some(-3.5));
    assert!(interfaces[1].dwdm.is_none());
}

#[tokio::test]
async fn test_ceraos_radio_counters() {
    let snmp = agent("1.3.6.1.4.1.2281.1.10", "IP-10G")
        .with("1.3.6.1.4.1.2281.10.1.1.9.0", SnmpValue::string("IP-10G"))
        .with("1.3.6.1.4.1.2281.10.5.1.1.7.2", SnmpValue::Integer(360));
    let snmp = with_interface(snmp, 1, "Ethernet #8", 1_000_000_000)
        .with(&format!("{IF_IN_OCTETS}.1"), SnmpValue::Counter32(4242));
    let snmp = with_interface(snmp, 2, "Radio Interface #1", 0);

    let mut device = device(snmp).await;
    let communicator = device.identify().await.unwrap();
    assert_eq!(communicator.class_name(), "ceraos/ip10");
    let interfaces = communicator
        .get_interfaces(device.context(), &[])
        .await
        .unwrap();

    let radio = &interfaces[1];
    assert_eq!(radio.if_in_octets, Some(4242));
    assert_eq!(
        radio.radio.as_ref().and_then(|r| r.max_bitrate_in),
        Some(360_000)
    );
}

#[tokio::test]
async fn test_ekinops_modules_over_second_community() {
    let modules = MockSnmp::new()
        .with(
            "1.3.6.1.4.1.20044.10.3.3.1.1.2.3.2",
            SnmpValue::string("Client 2"),
        )
        .with("1.3.6.1.4.1.20044.10.3.3.1.1.3.3.2", SnmpValue::Integer(-21));
    let snmp = with_interface(
        agent("1.3.6.1.4.1.20044.1", "EKINOPS C600HC"),
        1,
        "EKINOPS/C600HC/3/PM_1001RR/2",
        0,
    );

    let mut device = DeviceBuilder::new("192.0.2.1")
        .snmp_transport(Arc::new(snmp))
        .community_transport("_pm", Arc::new(modules))
        .build(hierarchy())
        .await
        .unwrap();
    let communicator = device.identify().await.unwrap();
    let ctx = device.context();
    assert_eq!(communicator.class_name(), "ekinops");
    assert_eq!(communicator.get_model(ctx).await.unwrap(), "C600HC");

    let interfaces = communicator.get_interfaces(ctx, &[]).await.unwrap();
    assert_eq!(interfaces[0].if_name.as_deref(), Some("3/2"));
    let transponder = interfaces[0].optical_transponder.as_ref().unwrap();
    assert_eq!(transponder.label.as_deref(), Some("Client 2"));
    assert_eq!(transponder.rx_power, Some(-2.1));
}

#[tokio::test]
async fn test_timos_saps() {
    let snmp = agent(
        "1.3.6.1.4.1.6527.1.3.17",
        "TiMOS-C-20.10.R1 cpm/hops64 Nokia 7750 SR Copyright (c) 2000-2020 Nokia.",
    )
    .with(
        "1.3.6.1.4.1.6527.3.1.2.4.3.2.1.5.100.35684352.10",
        SnmpValue::Counter64(1000),
    )
    .with(
        "1.3.6.1.4.1.6527.3.1.2.4.3.2.1.11.100.35684352.10",
        SnmpValue::Counter64(2000),
    );
    let snmp = with_interface(snmp, 35684352, "1/1/1", 0);

    let mut device = device(snmp).await;
    let communicator = device.identify().await.unwrap();
    let ctx = device.context();
    assert_eq!(communicator.class_name(), "timos");
    assert_eq!(communicator.get_model(ctx).await.unwrap(), "7750 SR");
    assert_eq!(communicator.get_os_version(ctx).await.unwrap(), "20.10.R1");

    let interfaces = communicator.get_interfaces(ctx, &[]).await.unwrap();
    let sap = interfaces[0].sap.as_ref().unwrap();
    assert_eq!(sap.inbound, Some(1000));
    assert_eq!(sap.outbound, Some(2000));
}

#[test]
fn test_identify_on_default_stack() {
    let worker = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let snmp = with_interface(agent("1.3.6.1.4.1.9.1.516", "Cisco"), 1, "Gi0/0", 100);
                let mut device = DeviceBuilder::new("192.0.2.1")
                    .snmp_transport(Arc::new(snmp))
                    .build(hierarchy())
                    .await
                    .unwrap();
                let communicator = device.identify().await.unwrap();
                communicator
                    .get_interfaces(device.context(), &[])
                    .await
                    .unwrap()
                    .len()
            })
        })
        .unwrap();

    assert_eq!(worker.join().unwrap(), 1);
}
