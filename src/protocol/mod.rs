// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire constants for the `RAIDar` discovery and status protocol.
//!
//! The protocol is a single UDP exchange on port 22081. A client sends a
//! fixed 28-byte request, either broadcast (discovery) or unicast (status
//! poll), and each device answers with an ASCII reply made of a 28-byte
//! header followed by tab-delimited status text.
//!
//! The request bytes carry no parameters. They differ only between the two
//! known revisions of the vendor discovery tool, see [`ProtocolVersion`].

use std::time::Duration;

/// UDP port the devices listen on.
pub const DEFAULT_PORT: u16 = 22081;

/// Size of the binary header that prefixes every reply.
pub const HEADER_LEN: usize = 28;

/// Size of a request datagram.
pub const REQUEST_LEN: usize = 28;

/// Replies of this length or shorter are acknowledgements or noise.
pub const DEFAULT_MIN_PAYLOAD_LEN: usize = 100;

/// How long discovery listens for replies.
pub const DEFAULT_DISCOVERY_WINDOW: Duration = Duration::from_secs(120);

/// How long a status poll waits for its reply.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Receive buffer size; a status reply always fits in one datagram.
pub const MAX_DATAGRAM_LEN: usize = 65_507;

const LEGACY_REQUEST: [u8; REQUEST_LEN] = [
    0x00, 0x00, 0x07, 0xd1, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0xf8, 0x5f, 0xd8, 0x10,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

const CURRENT_REQUEST: [u8; REQUEST_LEN] = [
    0x00, 0x00, 0x0e, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0xf8, 0x5f, 0xd8, 0x10,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Request payload revision.
///
/// Both discovery and polling send the same payload.
///
/// # Examples
///
/// ```
/// use raidar_lib::protocol::{ProtocolVersion, REQUEST_LEN};
///
/// let payload = ProtocolVersion::default().request_payload();
/// assert_eq!(payload.len(), REQUEST_LEN);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolVersion {
    /// Payload understood by older firmware.
    Legacy,
    /// Payload sent by the current discovery tool.
    #[default]
    Current,
    /// A caller-supplied payload.
    Custom([u8; REQUEST_LEN]),
}

impl ProtocolVersion {
    /// Returns the 28-byte request for this revision.
    #[must_use]
    pub const fn request_payload(&self) -> [u8; REQUEST_LEN] {
        match self {
            Self::Legacy => LEGACY_REQUEST,
            Self::Current => CURRENT_REQUEST,
            Self::Custom(bytes) => *bytes,
        }
    }
}

/// Returns `true` if a reply of `len` bytes should be treated as a status
/// payload rather than noise.
#[must_use]
pub const fn is_status_payload(len: usize, min_payload_len: usize) -> bool {
    len > min_payload_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revisions_differ() {
        assert_ne!(
            ProtocolVersion::Legacy.request_payload(),
            ProtocolVersion::Current.request_payload()
        );
    }

    #[test]
    fn custom_payload_is_returned_verbatim() {
        let bytes = [0xab; REQUEST_LEN];
        assert_eq!(ProtocolVersion::Custom(bytes).request_payload(), bytes);
    }

    #[test]
    fn payload_threshold_is_exclusive() {
        assert!(!is_status_payload(100, DEFAULT_MIN_PAYLOAD_LEN));
        assert!(is_status_payload(101, DEFAULT_MIN_PAYLOAD_LEN));
        assert!(!is_status_payload(0, DEFAULT_MIN_PAYLOAD_LEN));
    }
}
