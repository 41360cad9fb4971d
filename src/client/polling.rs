// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status polling and connection-lost detection.
//!
//! A poll sends the request to the active device and waits for one reply.
//! A missing reply moves the client to [`ConnectionState::ConnectionLost`].
//! The [`ClientEvent::ConnectionLost`] event is edge triggered: it is only
//! published when the connection was healthy before the poll, so a device
//! that stays offline is reported once no matter how often it is polled.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::time::Instant;

use super::{NasClient, Received};
use crate::client::ConnectionState;
use crate::error::{Error, ProtocolError, Result};
use crate::event::ClientEvent;
use crate::protocol::{MAX_DATAGRAM_LEN, is_status_payload};
use crate::report::{StatusReport, decode};

/// What a call to [`NasClient::request_status`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// No request was sent: no device is known, a request or discovery is
    /// already outstanding, or the state does not allow polling.
    Skipped,
    /// The device answered with a status report.
    Report(Arc<StatusReport>),
    /// A reply arrived but was too short to be a status payload.
    Ignored,
    /// No reply arrived in time.
    ///
    /// `notified` is `true` if this timeout published
    /// [`ClientEvent::ConnectionLost`].
    TimedOut {
        /// Whether a connection lost event was published.
        notified: bool,
    },
}

impl PollOutcome {
    /// Returns the report, if the device answered with one.
    #[must_use]
    pub fn report(&self) -> Option<&StatusReport> {
        match self {
            Self::Report(report) => Some(report),
            _ => None,
        }
    }

    /// Returns `true` if a request was actually sent.
    #[must_use]
    pub fn was_sent(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

impl NasClient {
    /// Requests a status report from the active device.
    ///
    /// Datagrams queued before the request are discarded, and only a reply
    /// from the active device's address counts as the answer.
    ///
    /// Only one request is outstanding at a time. Calls made while the
    /// client is discovering, already waiting for a reply, or before any
    /// device was found return [`PollOutcome::Skipped`] without sending.
    ///
    /// On timeout the state becomes [`ConnectionState::ConnectionLost`].
    /// The first timeout after a healthy exchange publishes
    /// [`ClientEvent::ConnectionLost`]; later ones are silent until a reply
    /// restores [`ConnectionState::Ready`].
    ///
    /// # Errors
    ///
    /// - [`Error::Shutdown`] if the client is or gets shut down
    /// - [`Error::Protocol`] if the request cannot be sent or the socket
    ///   fails; the state returns to `Ready`
    /// - [`Error::Parse`] if the reply cannot be decoded; the state returns
    ///   to `Ready`
    pub async fn request_status(&self) -> Result<PollOutcome> {
        self.ensure_running()?;

        let Ok(_guard) = self.inner.receive_guard.try_lock() else {
            tracing::trace!("Receive outstanding, skipping poll");
            return Ok(PollOutcome::Skipped);
        };

        let Some(device) = self.active_device() else {
            tracing::trace!("No device discovered, skipping poll");
            return Ok(PollOutcome::Skipped);
        };

        let Some(previous) = self.transition_if(|state| state.awaiting()) else {
            tracing::trace!(state = %self.state(), "State does not allow polling");
            return Ok(PollOutcome::Skipped);
        };

        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        self.discard_pending(&mut buf).await;

        let target = SocketAddr::new(device.ip(), self.inner.config.port());
        if let Err(e) = self
            .send(&self.inner.config.protocol_version().request_payload(), target)
            .await
        {
            tracing::warn!(target = %target, error = %e, "Failed to send status request");
            self.transition(ConnectionState::Ready);
            return Err(e);
        }

        let deadline = Instant::now() + self.inner.config.poll_timeout();
        loop {
            match self.receive(&mut buf, deadline).await {
                Received::Datagram { from, .. } if from.ip() != device.ip() => {
                    tracing::trace!(from = %from, "Ignoring datagram from another host");
                }
                Received::Datagram { len, from } => return self.handle_reply(from, &buf[..len]),
                Received::TimedOut => return Ok(self.handle_timeout(previous, target)),
                Received::Shutdown => {
                    tracing::debug!("Poll interrupted by shutdown");
                    return Err(Error::Shutdown);
                }
                Received::Failed(error) => {
                    tracing::warn!(error = %error, "Receive failed while polling");
                    self.transition(ConnectionState::Ready);
                    return Err(ProtocolError::Receive(error).into());
                }
            }
        }
    }

    fn handle_reply(&self, from: SocketAddr, bytes: &[u8]) -> Result<PollOutcome> {
        if !is_status_payload(bytes.len(), self.inner.config.min_payload_len()) {
            tracing::debug!(from = %from, len = bytes.len(), "Ignoring short reply");
            self.transition(ConnectionState::Ready);
            return Ok(PollOutcome::Ignored);
        }

        let report = match decode(bytes) {
            Ok(report) => Arc::new(report),
            Err(e) => {
                tracing::warn!(from = %from, error = %e, "Failed to decode status reply");
                self.transition(ConnectionState::Ready);
                return Err(e.into());
            }
        };

        self.transition(ConnectionState::Ready);
        tracing::debug!(
            from = %from,
            name = %report.name,
            status = %report.worst_status(),
            "Received status report"
        );
        self.inner.events.publish(ClientEvent::StatusReceived {
            address: from.ip(),
            report: Arc::clone(&report),
        });
        Ok(PollOutcome::Report(report))
    }

    fn handle_timeout(&self, previous: ConnectionState, target: SocketAddr) -> PollOutcome {
        self.transition(ConnectionState::ConnectionLost);

        // Only the first timeout after a healthy exchange is reported
        let notified = previous == ConnectionState::Ready;
        if notified {
            let reason = format!("no reply within {:?}", self.inner.config.poll_timeout());
            tracing::warn!(target = %target, reason = %reason, "Connection lost");
            self.inner
                .events
                .publish(ClientEvent::connection_lost(target.ip(), reason));
        } else {
            tracing::debug!(target = %target, "Device still unreachable");
        }
        PollOutcome::TimedOut { notified }
    }
}
