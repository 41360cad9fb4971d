// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Devices found by discovery.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

use chrono::{DateTime, Utc};

/// A device that answered a discovery broadcast.
///
/// Two addresses are equal when their IPs are, whenever they were seen.
#[derive(Debug, Clone)]
pub struct DeviceAddress {
    ip: IpAddr,
    discovered_at: DateTime<Utc>,
}

impl DeviceAddress {
    /// Records a device discovered now.
    #[must_use]
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            discovered_at: Utc::now(),
        }
    }

    /// Returns the device IP address.
    #[must_use]
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Returns when the device first answered.
    #[must_use]
    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }
}

impl PartialEq for DeviceAddress {
    fn eq(&self, other: &Self) -> bool {
        self.ip == other.ip
    }
}

impl Eq for DeviceAddress {}

impl Hash for DeviceAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ip.hash(state);
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ip)
    }
}

/// Insertion-ordered set of discovered devices.
///
/// Devices are only ever appended; the first entry is the active device.
#[derive(Debug, Clone, Default)]
pub(crate) struct DeviceList {
    devices: Vec<DeviceAddress>,
}

impl DeviceList {
    /// Appends `ip` unless it is already known.
    ///
    /// Returns the new entry, or `None` for a repeat.
    pub(crate) fn insert(&mut self, ip: IpAddr) -> Option<DeviceAddress> {
        if self.contains(ip) {
            return None;
        }
        let address = DeviceAddress::new(ip);
        self.devices.push(address.clone());
        Some(address)
    }

    pub(crate) fn contains(&self, ip: IpAddr) -> bool {
        self.devices.iter().any(|d| d.ip == ip)
    }

    pub(crate) fn first(&self) -> Option<&DeviceAddress> {
        self.devices.first()
    }

    pub(crate) fn len(&self) -> usize {
        self.devices.len()
    }

    pub(crate) fn to_vec(&self) -> Vec<DeviceAddress> {
        self.devices.clone()
    }
}
