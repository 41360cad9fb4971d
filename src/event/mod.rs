// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notifications emitted by the client.
//!
//! The client publishes a [`ClientEvent`] on its [`EventBus`] after every
//! state transition and for each discovery reply, status report and
//! connection loss. Each qualifying event is published exactly once, after
//! the state change it reflects.
//!
//! # Examples
//!
//! ```no_run
//! use raidar_lib::{ClientConfig, NasClient};
//! use raidar_lib::event::ClientEvent;
//!
//! # async fn example() -> raidar_lib::Result<()> {
//! let client = NasClient::bind(ClientConfig::new()).await?;
//! let mut events = client.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             ClientEvent::StatusReceived { report, .. } => {
//!                 println!("{} is {}", report.name, report.worst_status());
//!             }
//!             ClientEvent::ConnectionLost { address, .. } => {
//!                 println!("lost {address}");
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//! # Ok(())
//! # }
//! ```

mod client_event;
mod event_bus;

pub use client_event::ClientEvent;
pub use event_bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
