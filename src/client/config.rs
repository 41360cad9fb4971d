// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::event::DEFAULT_CHANNEL_CAPACITY;
use crate::protocol::{
    DEFAULT_DISCOVERY_WINDOW, DEFAULT_MIN_PAYLOAD_LEN, DEFAULT_POLL_TIMEOUT, DEFAULT_PORT,
    ProtocolVersion,
};

/// Configuration for a [`NasClient`](crate::NasClient).
///
/// Every setting has a default matching the vendor tool: port 22081,
/// limited broadcast, a two minute discovery window and a 30 second poll
/// timeout.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use raidar_lib::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_broadcast_address("192.168.1.255".parse().unwrap())
///     .with_discovery_window(Duration::from_secs(10))
///     .with_max_devices(1);
///
/// assert_eq!(config.port(), 22081);
/// assert_eq!(config.discovery_window(), Duration::from_secs(10));
/// assert_eq!(config.poll_timeout(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    port: u16,
    broadcast_address: IpAddr,
    local_address: SocketAddr,
    protocol_version: ProtocolVersion,
    discovery_window: Duration,
    poll_timeout: Duration,
    min_payload_len: usize,
    max_devices: Option<usize>,
    event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            broadcast_address: IpAddr::V4(Ipv4Addr::BROADCAST),
            local_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            protocol_version: ProtocolVersion::default(),
            discovery_window: DEFAULT_DISCOVERY_WINDOW,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            min_payload_len: DEFAULT_MIN_PAYLOAD_LEN,
            max_devices: None,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the remote UDP port devices listen on.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the discovery target, e.g. a subnet-directed broadcast address.
    #[must_use]
    pub fn with_broadcast_address(mut self, address: IpAddr) -> Self {
        self.broadcast_address = address;
        self
    }

    /// Sets the local address to bind. Port 0 lets the OS choose.
    #[must_use]
    pub fn with_local_address(mut self, address: SocketAddr) -> Self {
        self.local_address = address;
        self
    }

    /// Sets the request payload revision.
    #[must_use]
    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    /// Sets how long discovery listens for replies.
    #[must_use]
    pub fn with_discovery_window(mut self, window: Duration) -> Self {
        self.discovery_window = window;
        self
    }

    /// Sets how long a status poll waits for its reply.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Sets the length a reply must exceed to count as a status payload.
    #[must_use]
    pub fn with_min_payload_len(mut self, len: usize) -> Self {
        self.min_payload_len = len;
        self
    }

    /// Ends discovery early once this many devices have answered.
    #[must_use]
    pub fn with_max_devices(mut self, count: usize) -> Self {
        self.max_devices = Some(count);
        self
    }

    /// Sets the event channel capacity (minimum 1).
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Returns the remote UDP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the discovery target address.
    #[must_use]
    pub fn broadcast_address(&self) -> IpAddr {
        self.broadcast_address
    }

    /// Returns the discovery target as a socket address.
    #[must_use]
    pub fn broadcast_target(&self) -> SocketAddr {
        SocketAddr::new(self.broadcast_address, self.port)
    }

    /// Returns the local bind address.
    #[must_use]
    pub fn local_address(&self) -> SocketAddr {
        self.local_address
    }

    /// Returns the request payload revision.
    #[must_use]
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    /// Returns the discovery window.
    #[must_use]
    pub fn discovery_window(&self) -> Duration {
        self.discovery_window
    }

    /// Returns the poll timeout.
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Returns the minimum status payload length.
    #[must_use]
    pub fn min_payload_len(&self) -> usize {
        self.min_payload_len
    }

    /// Returns the early-stop device count, if set.
    #[must_use]
    pub fn max_devices(&self) -> Option<usize> {
        self.max_devices
    }

    /// Returns the event channel capacity.
    #[must_use]
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}
