//! Quirk simulator - applies device quirks to known devices and feeds them
//! consumption readings.
//!
//! Usage: `quirk-sim [KWH]...`

use anyhow::Context;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zigbee_core::cluster::{id, metering_attrs};
use zigbee_core::device::format_ieee;
use zigbee_core::{persistence, Device, DeviceEvent, Endpoint, QuirkRegistry, ZigbeeDevice};

/// A PTVO plug as it shows up after pairing
fn demo_device() -> ZigbeeDevice {
    let mut device = ZigbeeDevice::new([0x5A, 0x3C, 0x1E, 0xFE, 0xFF, 0x8D, 0x15, 0x00], 0x6F21)
        .with_model(ptvo_quirk::PtvoUartDevice::MANUFACTURER, ptvo_quirk::PtvoUartDevice::MODEL)
        .with_endpoint(Endpoint {
            id: 1,
            profile_id: 0x0104,
            device_type: 0xFFFE,
            in_clusters: vec![id::BASIC, id::MULTISTATE_VALUE],
            out_clusters: vec![id::BASIC],
        });
    device.friendly_name = Some("Demo plug".to_string());
    device
}

async fn log_events(name: String, mut rx: broadcast::Receiver<DeviceEvent>) {
    loop {
        match rx.recv().await {
            Ok(DeviceEvent::AttributeUpdated {
                ieee_address,
                endpoint,
                cluster_id,
                attribute_id,
                value,
            }) => {
                tracing::info!(
                    "[{}] {} EP{} cluster={:#06x} attr={:#06x} -> {:?}",
                    name,
                    format_ieee(&ieee_address),
                    endpoint,
                    cluster_id,
                    attribute_id,
                    value
                );
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Event listener for {} lagged by {} events", name, n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "quirk_sim=debug,ptvo_quirk=debug,zigbee_core=debug,info".into()
            }),
        )
        .init();

    let readings = std::env::args()
        .skip(1)
        .map(|arg| {
            arg.parse::<f64>()
                .with_context(|| format!("Invalid kWh reading: {arg}"))
        })
        .collect::<anyhow::Result<Vec<f64>>>()?;

    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());
    let data_path = PathBuf::from(data_dir).join("devices.json");

    let mut known = persistence::load_devices(&data_path).await;
    if known.is_empty() {
        tracing::info!("No known devices, seeding demo PTVO plug");
        known.push(demo_device());
        persistence::save_devices(&data_path, &known)
            .await
            .with_context(|| format!("Failed to save devices to {}", data_path.display()))?;
    }

    let mut registry = QuirkRegistry::new();
    ptvo_quirk::register(&mut registry);

    let devices: Vec<Device> = known
        .into_iter()
        .map(|info| Device::from_discovered(info, &registry))
        .collect();

    let loggers: Vec<_> = devices
        .iter()
        .map(|d| tokio::spawn(log_events(d.info().display_name(), d.subscribe())))
        .collect();

    for device in &devices {
        if device.consumption_bus().listener_count() == 0 {
            continue;
        }
        for reading in &readings {
            let delivered = device.consumption_bus().publish(*reading);
            tracing::debug!(
                "Reading {} kWh delivered to {} listeners on {}",
                reading,
                delivered,
                device.info().display_name()
            );
        }
    }

    let mut summary = Vec::new();
    for device in &devices {
        let metering = device
            .endpoints()
            .find_map(|ep| ep.in_cluster(id::METERING).map(|c| (ep.id, c)));
        let Some((endpoint, cluster)) = metering else {
            continue;
        };

        let attributes: serde_json::Map<String, serde_json::Value> = cluster
            .read_attributes(&[
                metering_attrs::CURRENT_SUMM_DELIVERED,
                metering_attrs::UNIT_OF_MEASURE,
                metering_attrs::MULTIPLIER,
                metering_attrs::DIVISOR,
                metering_attrs::SUMMATION_FORMATTING,
                metering_attrs::METERING_DEVICE_TYPE,
            ])
            .into_iter()
            .map(|record| {
                let value = serde_json::to_value(&record.value).unwrap_or(serde_json::Value::Null);
                (format!("{:#06x}", record.attribute_id), value)
            })
            .collect();

        summary.push(serde_json::json!({
            "device": device.info().display_name(),
            "ieee": device.info().ieee_address_string(),
            "quirk": device.quirk_name(),
            "endpoint": endpoint,
            "metering": attributes,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);

    // Closing the event channels lets the loggers finish
    drop(devices);
    for logger in loggers {
        logger.await?;
    }

    Ok(())
}
