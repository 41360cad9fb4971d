// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UDP client for discovering devices and polling their status.
//!
//! A [`NasClient`] owns one UDP socket, the [`ConnectionState`] and the list
//! of discovered devices. Discovery broadcasts a request and records every
//! device that answers within the discovery window. Polling sends the same
//! request to the first discovered device and waits for a single reply.
//!
//! # Receive Discipline
//!
//! Discovery and polling both read from the shared socket. An internal
//! receive guard ensures at most one of them is reading at any time:
//! starting discovery while a receive is outstanding fails with
//! [`Error::Busy`], and a poll issued during one is skipped.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use raidar_lib::{ClientConfig, NasClient, PollOutcome};
//!
//! # async fn example() -> raidar_lib::Result<()> {
//! let config = ClientConfig::new().with_discovery_window(Duration::from_secs(5));
//! let client = NasClient::bind(config).await?;
//!
//! let devices = client.discover().await?;
//! println!("found {} devices", devices.len());
//!
//! if let PollOutcome::Report(report) = client.request_status().await? {
//!     println!("{} runs {}", report.name, report.software_version);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod device_list;
mod discovery;
mod polling;
mod state;

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::time::Instant;

use crate::error::{Error, ProtocolError, Result};
use crate::event::{ClientEvent, EventBus};

pub use config::ClientConfig;
pub use device_list::DeviceAddress;
pub use polling::PollOutcome;
pub use state::ConnectionState;

use device_list::DeviceList;

/// Client for the `RAIDar` discovery and status protocol.
///
/// The client is a cheap handle: clones share the same socket, state and
/// device list, so one clone can run discovery in the background while
/// another reads the state.
#[derive(Debug, Clone)]
pub struct NasClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    socket: UdpSocket,
    local_addr: SocketAddr,
    config: ClientConfig,
    state: RwLock<ConnectionState>,
    devices: RwLock<DeviceList>,
    events: EventBus,
    receive_guard: Arc<Mutex<()>>,
    shutdown: watch::Sender<bool>,
}

/// Result of one bounded receive on the shared socket.
#[derive(Debug)]
enum Received {
    Datagram { len: usize, from: SocketAddr },
    TimedOut,
    Shutdown,
    Failed(io::Error),
}

impl NasClient {
    /// Binds the client socket with broadcast enabled.
    ///
    /// The client starts in [`ConnectionState::Uninitialized`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Bind`] if the socket cannot be bound or
    /// configured.
    pub async fn bind(config: ClientConfig) -> Result<Self> {
        let address = config.local_address();
        let bind_error = |source| ProtocolError::Bind {
            address: address.to_string(),
            source,
        };

        let socket = UdpSocket::bind(address).await.map_err(bind_error)?;
        socket.set_broadcast(true).map_err(bind_error)?;
        let local_addr = socket.local_addr().map_err(bind_error)?;

        tracing::debug!(local = %local_addr, "Bound discovery socket");

        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(Inner {
                socket,
                local_addr,
                events: EventBus::with_capacity(config.event_capacity()),
                config,
                state: RwLock::new(ConnectionState::Uninitialized),
                devices: RwLock::new(DeviceList::default()),
                receive_guard: Arc::new(Mutex::new(())),
                shutdown,
            }),
        })
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the local address of the client socket.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }

    /// Returns a snapshot of the connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    /// Returns a snapshot of the discovered devices, in discovery order.
    #[must_use]
    pub fn devices(&self) -> Vec<DeviceAddress> {
        self.inner.devices.read().to_vec()
    }

    /// Returns the device that polls are sent to: the first one discovered.
    #[must_use]
    pub fn active_device(&self) -> Option<DeviceAddress> {
        self.inner.devices.read().first().cloned()
    }

    /// Subscribes to client events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// Stops the client.
    ///
    /// Any pending receive returns [`Error::Shutdown`] without changing the
    /// connection state or emitting a connection lost event. Later calls
    /// fail with [`Error::Shutdown`].
    pub fn shutdown(&self) {
        tracing::debug!("Shutting down client");
        self.inner.shutdown.send_replace(true);
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_shut_down() {
            Err(Error::Shutdown)
        } else {
            Ok(())
        }
    }

    /// Sets the state and publishes the transition if it changed anything.
    fn transition(&self, to: ConnectionState) {
        let from = std::mem::replace(&mut *self.inner.state.write(), to);
        if from != to {
            tracing::trace!(%from, %to, "Connection state changed");
            self.inner.events.publish(ClientEvent::state_changed(from, to));
        }
    }

    /// Atomically moves to the state chosen by `next`, if it returns one.
    ///
    /// Returns the previous state on success.
    fn transition_if(
        &self,
        next: impl FnOnce(ConnectionState) -> Option<ConnectionState>,
    ) -> Option<ConnectionState> {
        let (from, to) = {
            let mut state = self.inner.state.write();
            let from = *state;
            let to = next(from)?;
            *state = to;
            (from, to)
        };
        if from != to {
            tracing::trace!(%from, %to, "Connection state changed");
            self.inner.events.publish(ClientEvent::state_changed(from, to));
        }
        Some(from)
    }

    async fn send(&self, payload: &[u8], target: SocketAddr) -> Result<()> {
        self.inner
            .socket
            .send_to(payload, target)
            .await
            .map_err(|source| ProtocolError::Send {
                target: target.to_string(),
                source,
            })?;
        Ok(())
    }

    /// Waits for one datagram until `deadline` or shutdown.
    ///
    /// Callers must hold the receive guard.
    async fn receive(&self, buf: &mut [u8], deadline: Instant) -> Received {
        let shutdown = self.inner.shutdown.subscribe();
        if *shutdown.borrow() {
            return Received::Shutdown;
        }

        tokio::select! {
            result = tokio::time::timeout_at(deadline, self.inner.socket.recv_from(buf)) => {
                match result {
                    Ok(Ok((len, from))) => Received::Datagram { len, from },
                    Ok(Err(error)) => Received::Failed(error),
                    Err(_) => Received::TimedOut,
                }
            }
            () = stopped(shutdown) => Received::Shutdown,
        }
    }

    /// Drops every datagram already queued on the socket.
    ///
    /// Replies left over from earlier exchanges would otherwise answer the
    /// next request. Callers must hold the receive guard.
    async fn discard_pending(&self, buf: &mut [u8]) {
        // Let the reactor register datagrams that arrived since the last poll
        tokio::task::yield_now().await;

        let mut discarded = 0usize;
        loop {
            match self.inner.socket.try_recv_from(buf) {
                Ok((_, from)) => {
                    discarded += 1;
                    tracing::trace!(from = %from, "Discarding stale datagram");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::debug!(error = %e, "Stopped draining socket");
                    break;
                }
            }
        }
        if discarded > 0 {
            tracing::debug!(count = discarded, "Discarded stale datagrams");
        }
    }
}

/// Resolves once the shutdown flag is set.
async fn stopped(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            // Sender lives as long as the client
            std::future::pending::<()>().await;
        }
    }
}

/// Returns `true` if `from` is this client's own socket, e.g. the echo of
/// its own broadcast.
fn is_own_endpoint(from: SocketAddr, local: SocketAddr) -> bool {
    from.port() == local.port() && (local.ip().is_unspecified() || from.ip() == local.ip())
}

/// Returns `true` if `ip` is the address the client itself is bound to.
fn is_own_ip(ip: IpAddr, local: SocketAddr) -> bool {
    !local.ip().is_unspecified() && ip == local.ip()
}
