// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `RAIDar` library.
//!
//! Errors are split by layer: transport failures on the UDP socket
//! ([`ProtocolError`]), structural failures while decoding a status reply
//! ([`ParseError`]), and client-level conditions such as a receive already
//! being outstanding.
//!
//! Malformed sub-records inside an otherwise valid reply never produce an
//! error. They decode to entities with [`Status::Unknown`](crate::Status::Unknown).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred on the UDP transport.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A reply could not be decoded into a status report.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Another receive operation (discovery or poll) is already in flight.
    #[error("another receive operation is already in progress")]
    Busy,

    /// The client has been shut down.
    #[error("client has been shut down")]
    Shutdown,
}

/// Errors related to UDP communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Binding or configuring the local socket failed.
    #[error("failed to bind UDP socket on {address}: {source}")]
    Bind {
        /// The local address that was requested.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Sending a datagram failed.
    #[error("failed to send to {target}: {source}")]
    Send {
        /// The destination of the datagram.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Receiving a datagram failed.
    ///
    /// A missing reply is not an error; polling reports it as
    /// [`PollOutcome::TimedOut`](crate::PollOutcome::TimedOut).
    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),
}

/// Errors related to decoding a status reply.
///
/// Only a structurally invalid top-level message is reported. Individual
/// property lines that fail to match are absorbed by the decoder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The reply is shorter than the fixed protocol header.
    #[error("reply of {len} bytes is shorter than the {header}-byte header")]
    TooShort {
        /// Length of the raw reply.
        len: usize,
        /// Required header length.
        header: usize,
    },

    /// Fewer top-level tab-delimited fields than required.
    #[error("expected at least {expected} tab-delimited fields, found {found}")]
    MissingFields {
        /// Minimum number of fields.
        expected: usize,
        /// Number of fields present.
        found: usize,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_display() {
        let err = ParseError::MissingFields {
            expected: 5,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "expected at least 5 tab-delimited fields, found 3"
        );
    }

    #[test]
    fn error_from_parse_error() {
        let err: Error = ParseError::TooShort { len: 4, header: 28 }.into();
        assert!(matches!(err, Error::Parse(ParseError::TooShort { len: 4, .. })));
    }

    #[test]
    fn error_from_protocol_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err: Error = ProtocolError::Receive(io).into();
        assert!(err.to_string().starts_with("protocol error: receive failed"));
    }
}
