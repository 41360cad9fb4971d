// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structured health reports decoded from status replies.
//!
//! A [`StatusReport`] is produced fresh from every successful poll. Decoding
//! is pure: the same bytes always produce equal reports.
//!
//! # Examples
//!
//! ```
//! use raidar_lib::report::StatusReport;
//! use raidar_lib::{Criticality, Status};
//!
//! let body = "00:0d:a2:01:09:bd\tNASgul\t192.168.1.5\t\
//!     temp!!0!!status=ok::descr=34.0C/93.2F::expected=20-40C/68-104F\n\
//!     disk!!1!!status=dead::descr=Channel 1: ST3320620AS 298 GB\n\
//!     \tRAIDiator!!version=4.1.7\t1";
//!
//! let report: StatusReport = body.parse().unwrap();
//! assert_eq!(report.worst_status(), Status::Dead);
//! assert_eq!(report.criticality(), Criticality::Fatal);
//! assert!(!report.is_healthy());
//! ```

mod decoder;
mod entities;
mod status;

use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::Criticality;
use crate::error::ParseError;

pub use decoder::{
    MIN_FIELDS, PropertyKind, PropertyLine, UNKNOWN_FIRMWARE, UNKNOWN_VERSION, decode, decode_body,
};
pub use entities::{Capacity, Disk, Fan, ModelInfo, Temperature, UNKNOWN_MODEL, Ups, Volume};
pub use status::Status;

/// Health report for one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// MAC address as reported.
    pub hardware_address: String,
    /// Host name of the device.
    pub name: String,
    /// IP address as reported by the device itself.
    pub ip: String,
    /// Hardware model.
    pub model: ModelInfo,
    /// Firmware name, or [`UNKNOWN_FIRMWARE`].
    pub software_name: String,
    /// Firmware version, or [`UNKNOWN_VERSION`].
    pub software_version: String,
    /// Last top-level field after the version string, kept as sent minus
    /// the line terminator. Empty when the reply ends at the version.
    pub boot_flag: String,
    /// Temperature sensors.
    pub temperatures: Vec<Temperature>,
    /// Cooling fans.
    pub fans: Vec<Fan>,
    /// Attached UPS, if the device reported one.
    pub ups: Option<Ups>,
    /// RAID volumes, in wire order.
    pub volumes: Vec<Volume>,
    /// Physical disks, in wire order.
    pub disks: Vec<Disk>,
}

impl StatusReport {
    /// Decodes a raw reply including its 28-byte header.
    ///
    /// # Errors
    ///
    /// See [`decode`].
    pub fn from_bytes(raw: &[u8]) -> Result<Self, ParseError> {
        decode(raw)
    }

    /// Parses the reported IP address.
    #[must_use]
    pub fn ip_addr(&self) -> Option<IpAddr> {
        self.ip.parse().ok()
    }

    /// Returns the volume with the given wire index.
    #[must_use]
    pub fn volume(&self, index: u32) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.index == index)
    }

    /// Returns the disk with the given wire index.
    #[must_use]
    pub fn disk(&self, index: u32) -> Option<&Disk> {
        self.disks.iter().find(|d| d.index == index)
    }

    /// Iterates over the status of every component in the report.
    pub fn statuses(&self) -> impl Iterator<Item = Status> + '_ {
        self.temperatures
            .iter()
            .map(|t| t.status)
            .chain(self.fans.iter().map(|f| f.status))
            .chain(self.ups.iter().map(|u| u.status))
            .chain(self.volumes.iter().map(|v| v.status))
            .chain(self.disks.iter().map(|d| d.status))
    }

    /// Returns the status with the highest criticality.
    ///
    /// An empty report is [`Status::Ok`].
    #[must_use]
    pub fn worst_status(&self) -> Status {
        self.statuses()
            .max_by_key(|status| status.criticality())
            .unwrap_or(Status::Ok)
    }

    /// Returns the highest criticality among all components.
    #[must_use]
    pub fn criticality(&self) -> Criticality {
        self.worst_status().criticality()
    }

    /// Returns `true` if no component needs attention.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.criticality() == Criticality::None
    }
}

impl FromStr for StatusReport {
    type Err = ParseError;

    /// Parses reply text with the header already stripped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_body(s)
    }
}
