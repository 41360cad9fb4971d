// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health status codes reported for each component.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Health status of a device component.
///
/// Statuses arrive as lowercase words in the `status=` field of a property
/// line. Words this library does not know decode as [`Status::Unknown`].
///
/// # Examples
///
/// ```
/// use raidar_lib::Status;
///
/// assert_eq!(Status::from_wire("resync"), Status::Resync);
/// assert_eq!(Status::from_wire("exploded"), Status::Unknown);
/// assert_eq!(Status::LifeSupport.as_str(), "life_support");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Component is healthy.
    Ok,
    /// Component is unhealthy without a more specific reason.
    NotOk,
    /// Status could not be determined.
    #[default]
    Unknown,
    /// RAID resynchronization in progress.
    Resync,
    /// Component reports a warning.
    Warn,
    /// Running without redundancy or on backup power.
    LifeSupport,
    /// Waiting for a recovery action.
    AwaitingRecovery,
    /// Spare disk that is not part of an array.
    SpareInactive,
    /// Component is absent.
    NotPresent,
    /// Component has failed.
    Fail,
    /// Component is dead.
    Dead,
    /// The device itself stopped answering.
    ConnectionLost,
}

impl Status {
    /// Every status, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Ok,
        Self::NotOk,
        Self::Unknown,
        Self::Resync,
        Self::Warn,
        Self::LifeSupport,
        Self::AwaitingRecovery,
        Self::SpareInactive,
        Self::NotPresent,
        Self::Fail,
        Self::Dead,
        Self::ConnectionLost,
    ];

    /// Decodes a wire status word, falling back to [`Status::Unknown`].
    #[must_use]
    pub fn from_wire(word: &str) -> Self {
        match word.trim() {
            "ok" => Self::Ok,
            "not_ok" => Self::NotOk,
            "resync" => Self::Resync,
            "warn" => Self::Warn,
            "life_support" => Self::LifeSupport,
            "awaiting_recovery" => Self::AwaitingRecovery,
            "spare_inactive" => Self::SpareInactive,
            "not_present" => Self::NotPresent,
            "fail" => Self::Fail,
            "dead" => Self::Dead,
            "connection_lost" => Self::ConnectionLost,
            _ => Self::Unknown,
        }
    }

    /// Returns the wire word for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotOk => "not_ok",
            Self::Unknown => "unknown",
            Self::Resync => "resync",
            Self::Warn => "warn",
            Self::LifeSupport => "life_support",
            Self::AwaitingRecovery => "awaiting_recovery",
            Self::SpareInactive => "spare_inactive",
            Self::NotPresent => "not_present",
            Self::Fail => "fail",
            Self::Dead => "dead",
            Self::ConnectionLost => "connection_lost",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_words_round_trip() {
        for status in Status::ALL {
            assert_eq!(Status::from_wire(status.as_str()), status);
        }
    }

    #[test]
    fn unrecognized_words_are_unknown() {
        assert_eq!(Status::from_wire(""), Status::Unknown);
        assert_eq!(Status::from_wire("OK"), Status::Unknown);
        assert_eq!(Status::from_wire("degraded"), Status::Unknown);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(Status::from_wire(" warn\r"), Status::Warn);
    }

    #[test]
    fn default_is_unknown() {
        assert_eq!(Status::default(), Status::Unknown);
    }
}
