// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection state of a client.

use std::fmt;

/// Where the client is in its discovery and polling cycle.
///
/// ```text
/// Uninitialized -> Discovering -> Ready <-> AwaitingResponse
///                                   ^            |
///                                   |         (timeout, notify)
///                                   |            v
///                 AwaitingReconnect <-> ConnectionLost
///                        |   (timeout, silent)
///                        +--(reply)--> Ready
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No discovery has been started.
    #[default]
    Uninitialized,
    /// Discovery is running, or ended without finding a device.
    Discovering,
    /// A device is known and no request is outstanding.
    Ready,
    /// A status request is outstanding.
    AwaitingResponse,
    /// The last request timed out.
    ConnectionLost,
    /// A request is outstanding while the connection is lost.
    AwaitingReconnect,
}

impl ConnectionState {
    /// Returns `true` if a status request may be issued in this state.
    #[must_use]
    pub const fn can_poll(&self) -> bool {
        matches!(self, Self::Ready | Self::ConnectionLost)
    }

    /// Returns `true` while a request is outstanding.
    #[must_use]
    pub const fn is_awaiting(&self) -> bool {
        matches!(self, Self::AwaitingResponse | Self::AwaitingReconnect)
    }

    /// Returns `true` if the device is considered unreachable.
    #[must_use]
    pub const fn is_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost | Self::AwaitingReconnect)
    }

    /// Returns the state entered when a request is issued from this state.
    #[must_use]
    pub const fn awaiting(&self) -> Option<Self> {
        match self {
            Self::Ready => Some(Self::AwaitingResponse),
            Self::ConnectionLost => Some(Self::AwaitingReconnect),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Discovering => "discovering",
            Self::Ready => "ready",
            Self::AwaitingResponse => "awaiting response",
            Self::ConnectionLost => "connection lost",
            Self::AwaitingReconnect => "awaiting reconnect",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ready_and_lost_can_poll() {
        assert!(ConnectionState::Ready.can_poll());
        assert!(ConnectionState::ConnectionLost.can_poll());
        assert!(!ConnectionState::Uninitialized.can_poll());
        assert!(!ConnectionState::Discovering.can_poll());
        assert!(!ConnectionState::AwaitingResponse.can_poll());
        assert!(!ConnectionState::AwaitingReconnect.can_poll());
    }

    #[test]
    fn awaiting_transitions() {
        assert_eq!(
            ConnectionState::Ready.awaiting(),
            Some(ConnectionState::AwaitingResponse)
        );
        assert_eq!(
            ConnectionState::ConnectionLost.awaiting(),
            Some(ConnectionState::AwaitingReconnect)
        );
        assert_eq!(ConnectionState::Discovering.awaiting(), None);
    }

    #[test]
    fn lost_states() {
        assert!(ConnectionState::AwaitingReconnect.is_lost());
        assert!(ConnectionState::AwaitingReconnect.is_awaiting());
        assert!(!ConnectionState::AwaitingResponse.is_lost());
    }

    #[test]
    fn display() {
        assert_eq!(ConnectionState::AwaitingReconnect.to_string(), "awaiting reconnect");
    }
}
