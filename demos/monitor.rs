// SPDX-License-Identifier: MPL-2.0

//! Discovery and status monitoring example.
//!
//! Broadcasts a discovery request, then polls the first device that
//! answered at a fixed interval and prints each report.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example monitor -- [broadcast_address] [interval_secs]
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Limited broadcast, poll every 60 seconds
//! cargo run --example monitor
//!
//! # Subnet broadcast, poll every 10 seconds, with debug logs
//! RUST_LOG=raidar_lib=debug cargo run --example monitor -- 192.168.1.255 10
//! ```

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use raidar_lib::{
    ClientConfig, ClientEvent, EntityKind, Error, NasClient, PollOutcome, StatusReport, describe,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let broadcast: IpAddr = match args.get(1) {
        Some(address) => address.parse()?,
        None => "255.255.255.255".parse()?,
    };
    let interval = Duration::from_secs(match args.get(2) {
        Some(secs) => secs.parse()?,
        None => 60,
    });

    let config = ClientConfig::new()
        .with_broadcast_address(broadcast)
        .with_discovery_window(Duration::from_secs(10));
    let client = NasClient::bind(config).await?;

    let mut events = client.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ClientEvent::DeviceDiscovered { address, .. } => {
                    println!("Found device at {address}");
                }
                ClientEvent::ConnectionLost { address, reason } => {
                    println!("Lost connection to {address}: {reason}");
                }
                _ => {}
            }
        }
    });

    println!("Discovering devices via {broadcast}...");
    let devices = client.discover().await?;
    if devices.is_empty() {
        eprintln!("No device answered");
        std::process::exit(1);
    }

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                client.shutdown();
                return Ok(());
            }
        }

        match client.request_status().await {
            Ok(PollOutcome::Report(report)) => print_report(&report),
            Ok(PollOutcome::TimedOut { notified: false }) => println!("Device still unreachable"),
            Ok(PollOutcome::TimedOut { notified: true } | PollOutcome::Ignored) => {}
            Ok(PollOutcome::Skipped) => println!("Poll skipped ({})", client.state()),
            Err(Error::Shutdown) => return Ok(()),
            // Transport and parse failures are retried on the next tick
            Err(e) => tracing::warn!(error = %e, "Status poll failed"),
        }
    }
}

fn print_report(report: &StatusReport) {
    println!();
    println!(
        "{} ({}) - {} {} [{}]",
        report.name, report.ip, report.software_name, report.software_version, report.model.model
    );
    println!("  Overall: {}", report.criticality());

    for temp in &report.temperatures {
        println!(
            "  Temperature {}: {:.1}C - {}",
            temp.index,
            temp.celsius,
            describe(temp.status, EntityKind::Temperature)
        );
    }
    for fan in &report.fans {
        println!(
            "  Fan {}: {} RPM - {}",
            fan.index,
            fan.rpm,
            describe(fan.status, EntityKind::Fan)
        );
    }
    if let Some(ups) = &report.ups {
        println!("  UPS: {} - {}", ups.description, describe(ups.status, EntityKind::Ups));
    }
    for volume in &report.volumes {
        println!(
            "  Volume {}: RAID {}, {}% used - {}",
            volume.name,
            volume.raid_level,
            volume.used_percent,
            describe(volume.status, EntityKind::Volume)
        );
    }
    for disk in &report.disks {
        println!(
            "  Disk {}: {} - {}",
            disk.channel,
            disk.make_model,
            describe(disk.status, EntityKind::Disk)
        );
    }
}
