// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `RAIDar` Lib - A Rust client for the ReadyNAS `RAIDar` discovery protocol.
//!
//! This library finds ReadyNAS devices on the local network with a UDP
//! broadcast, then polls the first one it found for a health report.
//!
//! # Supported Features
//!
//! - **Discovery**: Broadcast request, de-duplicated device list, early stop
//! - **Polling**: One outstanding request, edge-triggered connection loss
//! - **Status reports**: Temperatures, fans, UPS, volumes, disks, firmware
//! - **Catalog**: Display sentences and severity tiers for every status
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use raidar_lib::{ClientConfig, NasClient, PollOutcome};
//!
//! #[tokio::main]
//! async fn main() -> raidar_lib::Result<()> {
//!     let client = NasClient::bind(
//!         ClientConfig::new().with_discovery_window(Duration::from_secs(10)),
//!     )
//!     .await?;
//!
//!     client.discover().await?;
//!
//!     match client.request_status().await? {
//!         PollOutcome::Report(report) => {
//!             println!("{}: {}", report.name, report.worst_status());
//!         }
//!         PollOutcome::TimedOut { .. } => println!("device unreachable"),
//!         _ => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Events
//!
//! Discovery results, reports and state transitions are also published as
//! [`ClientEvent`]s:
//!
//! ```no_run
//! use raidar_lib::{ClientConfig, ClientEvent, NasClient};
//!
//! # async fn example() -> raidar_lib::Result<()> {
//! let client = NasClient::bind(ClientConfig::new()).await?;
//! let mut events = client.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let ClientEvent::ConnectionLost { address, reason } = event {
//!             eprintln!("{address} lost: {reason}");
//!         }
//!     }
//! });
//! # Ok(())
//! # }
//! ```
//!
//! ## Decoding Without A Socket
//!
//! ```
//! use raidar_lib::{Status, StatusReport};
//!
//! let report: StatusReport =
//!     "mac\tnas\t10.0.0.2\tfan!!0!!status=warn::descr=400RPM\n\tRAIDiator!!version=4.2.0\t0"
//!         .parse()
//!         .unwrap();
//! assert_eq!(report.worst_status(), Status::Warn);
//! assert_eq!(report.software_version, "4.2.0");
//! ```

pub mod catalog;
pub mod client;
pub mod error;
pub mod event;
pub mod protocol;
pub mod report;

pub use catalog::{Criticality, EntityKind, describe};
pub use client::{ClientConfig, ConnectionState, DeviceAddress, NasClient, PollOutcome};
pub use error::{Error, ParseError, ProtocolError, Result};
pub use event::{ClientEvent, EventBus};
pub use protocol::ProtocolVersion;
pub use report::{Status, StatusReport};
