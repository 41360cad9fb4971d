// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast discovery.
//!
//! Discovery sends one request to the broadcast address, then listens for
//! the configured window. Every new source address is recorded and
//! announced with a [`ClientEvent::DeviceDiscovered`]. The window closing is
//! the normal way discovery ends and is not reported as an error.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{DeviceAddress, NasClient, Received, is_own_endpoint, is_own_ip};
use crate::client::ConnectionState;
use crate::error::{Error, ProtocolError, Result};
use crate::event::ClientEvent;
use crate::protocol::{HEADER_LEN, MAX_DATAGRAM_LEN, is_status_payload};
use crate::report::decode;

impl NasClient {
    /// Runs discovery to completion and returns every known device.
    ///
    /// The state becomes [`ConnectionState::Discovering`] immediately and
    /// [`ConnectionState::Ready`] at the end of the window if at least one
    /// device is known. With no device it stays `Discovering`.
    ///
    /// # Errors
    ///
    /// - [`Error::Busy`] if another receive is outstanding
    /// - [`Error::Shutdown`] if the client is or gets shut down
    /// - [`Error::Protocol`] if the broadcast cannot be sent or the socket
    ///   fails while listening; the state is left unchanged
    pub async fn discover(&self) -> Result<Vec<DeviceAddress>> {
        let guard = self.begin_discovery()?;
        self.run_discovery(guard).await
    }

    /// Starts discovery in a background task.
    ///
    /// The state is already [`ConnectionState::Discovering`] when this
    /// returns. The task resolves to the same value as
    /// [`discover`](Self::discover).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] or [`Error::Shutdown`] without spawning.
    pub fn start_discovery(&self) -> Result<JoinHandle<Result<Vec<DeviceAddress>>>> {
        let guard = self.begin_discovery()?;
        let client = self.clone();
        Ok(tokio::spawn(async move { client.run_discovery(guard).await }))
    }

    fn begin_discovery(&self) -> Result<OwnedMutexGuard<()>> {
        self.ensure_running()?;
        let guard = Arc::clone(&self.inner.receive_guard)
            .try_lock_owned()
            .map_err(|_| Error::Busy)?;
        self.transition(ConnectionState::Discovering);
        Ok(guard)
    }

    async fn run_discovery(&self, _guard: OwnedMutexGuard<()>) -> Result<Vec<DeviceAddress>> {
        let config = &self.inner.config;
        let target = config.broadcast_target();
        let window = config.discovery_window();

        tracing::info!(
            target = %target,
            window_secs = window.as_secs(),
            "Starting device discovery"
        );

        if let Err(e) = self
            .send(&config.protocol_version().request_payload(), target)
            .await
        {
            tracing::warn!(error = %e, "Failed to send discovery broadcast");
            return Err(e);
        }

        let deadline = Instant::now() + window;
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];

        loop {
            match self.receive(&mut buf, deadline).await {
                Received::Datagram { len, from } => {
                    self.record_reply(from, &buf[..len]);
                    if config
                        .max_devices()
                        .is_some_and(|max| self.inner.devices.read().len() >= max)
                    {
                        tracing::debug!("Device limit reached, ending discovery early");
                        break;
                    }
                }
                Received::TimedOut => break,
                Received::Shutdown => {
                    tracing::debug!("Discovery interrupted by shutdown");
                    return Err(Error::Shutdown);
                }
                Received::Failed(error) => {
                    tracing::warn!(error = %error, "Receive failed during discovery");
                    return Err(ProtocolError::Receive(error).into());
                }
            }
        }

        let devices = self.devices();
        if devices.is_empty() {
            tracing::info!("Discovery window closed without any device");
        } else {
            self.transition(ConnectionState::Ready);
            tracing::info!(count = devices.len(), "Device discovery completed");
        }
        Ok(devices)
    }

    /// Records one discovery reply.
    ///
    /// Returns `true` if the sender was not known before.
    fn record_reply(&self, from: SocketAddr, bytes: &[u8]) -> bool {
        let local = self.inner.local_addr;
        if is_own_endpoint(from, local) || is_own_ip(from.ip(), local) {
            tracing::trace!(from = %from, "Ignoring reply from own address");
            return false;
        }

        let Some(address) = self.inner.devices.write().insert(from.ip()) else {
            tracing::trace!(from = %from, "Ignoring repeated reply");
            return false;
        };

        let is_payload = is_status_payload(bytes.len(), self.inner.config.min_payload_len());
        let (payload, report) = if is_payload {
            let text = String::from_utf8_lossy(bytes.get(HEADER_LEN..).unwrap_or_default());
            let report = match decode(bytes) {
                Ok(report) => Some(Arc::new(report)),
                Err(e) => {
                    tracing::debug!(from = %from, error = %e, "Discovery reply did not decode");
                    None
                }
            };
            (text.into_owned(), report)
        } else {
            (String::new(), None)
        };

        tracing::info!(
            address = %address,
            payload_len = bytes.len(),
            "Discovered device"
        );

        self.inner.events.publish(ClientEvent::DeviceDiscovered {
            address,
            payload,
            report,
        });
        true
    }
}
