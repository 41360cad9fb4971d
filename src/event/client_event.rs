// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client event types.

use std::net::IpAddr;
use std::sync::Arc;

use crate::client::{ConnectionState, DeviceAddress};
use crate::report::StatusReport;

/// Events emitted by a [`NasClient`](crate::NasClient).
///
/// Reports are shared behind an [`Arc`] so that every subscriber receives
/// the same decoded value without copying it.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A device answered the discovery broadcast for the first time.
    DeviceDiscovered {
        /// The newly recorded device.
        address: DeviceAddress,
        /// Reply text after the header; empty when the reply was too short
        /// to be a status payload.
        payload: String,
        /// The decoded reply, when the payload decoded cleanly.
        report: Option<Arc<StatusReport>>,
    },

    /// A status poll returned a report.
    StatusReceived {
        /// The polled device.
        address: IpAddr,
        /// The decoded report.
        report: Arc<StatusReport>,
    },

    /// The polled device stopped answering.
    ///
    /// Published once per loss; further timeouts while still lost are silent.
    ConnectionLost {
        /// The polled device.
        address: IpAddr,
        /// Why the connection is considered lost.
        reason: String,
    },

    /// The client moved to another connection state.
    StateChanged {
        /// State before the transition.
        from: ConnectionState,
        /// State after the transition.
        to: ConnectionState,
    },
}

impl ClientEvent {
    /// Returns the device address this event concerns, if any.
    #[must_use]
    pub fn address(&self) -> Option<IpAddr> {
        match self {
            Self::DeviceDiscovered { address, .. } => Some(address.ip()),
            Self::StatusReceived { address, .. } | Self::ConnectionLost { address, .. } => {
                Some(*address)
            }
            Self::StateChanged { .. } => None,
        }
    }

    /// Returns `true` for [`ClientEvent::ConnectionLost`].
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost { .. })
    }

    /// Returns `true` for [`ClientEvent::StateChanged`].
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }

    /// Creates a connection lost event.
    #[must_use]
    pub fn connection_lost(address: IpAddr, reason: impl Into<String>) -> Self {
        Self::ConnectionLost {
            address,
            reason: reason.into(),
        }
    }

    /// Creates a state changed event.
    #[must_use]
    pub fn state_changed(from: ConnectionState, to: ConnectionState) -> Self {
        Self::StateChanged { from, to }
    }
}
