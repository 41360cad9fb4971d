// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Display text and severity for status codes.
//!
//! The catalog maps a [`Status`] seen on a given kind of component to a
//! human-readable sentence, and assigns each status a [`Criticality`] tier.
//! Pairs without a dedicated sentence fall back to a generic "not ok"
//! sentence for that component kind.
//!
//! # Examples
//!
//! ```
//! use raidar_lib::{Criticality, EntityKind, Status, describe};
//!
//! assert_eq!(describe(Status::Resync, EntityKind::Volume), "Volume is resynchronizing");
//! assert_eq!(describe(Status::Resync, EntityKind::Fan), "Fan is not ok");
//! assert_eq!(Status::Dead.criticality(), Criticality::Fatal);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::report::Status;

/// Kind of component a status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// The device as a whole (reachability).
    Device,
    /// A temperature sensor.
    Temperature,
    /// A cooling fan.
    Fan,
    /// An attached UPS.
    Ups,
    /// A RAID volume.
    Volume,
    /// A physical disk.
    Disk,
}

impl EntityKind {
    /// Generic sentence used when no specific one is catalogued.
    #[must_use]
    pub const fn not_ok_text(self) -> &'static str {
        match self {
            Self::Device => "Device is not ok",
            Self::Temperature => "Temperature is not ok",
            Self::Fan => "Fan is not ok",
            Self::Ups => "UPS is not ok",
            Self::Volume => "Volume is not ok",
            Self::Disk => "Disk is not ok",
        }
    }
}

/// Severity tier of a status, ordered from harmless to fatal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Nothing to do.
    #[default]
    None,
    /// Will resolve on its own (resync, recovery in progress).
    Temporary,
    /// Working, but one more fault away from trouble.
    Vulnerable,
    /// Needs intervention.
    Critical,
    /// Data or device is gone.
    Fatal,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Temporary => "temporary",
            Self::Vulnerable => "vulnerable",
            Self::Critical => "critical",
            Self::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

impl Status {
    /// Returns the severity tier of this status.
    #[must_use]
    pub const fn criticality(&self) -> Criticality {
        match self {
            Self::Ok | Self::NotPresent | Self::SpareInactive => Criticality::None,
            Self::Resync | Self::AwaitingRecovery => Criticality::Temporary,
            Self::Warn | Self::LifeSupport | Self::Unknown => Criticality::Vulnerable,
            Self::NotOk | Self::Fail => Criticality::Critical,
            Self::Dead | Self::ConnectionLost => Criticality::Fatal,
        }
    }
}

const ENTRIES: &[(EntityKind, Status, &str)] = &[
    (EntityKind::Device, Status::Ok, "Device is online"),
    (EntityKind::Device, Status::Unknown, "Device status is unknown"),
    (EntityKind::Device, Status::ConnectionLost, "Connection to the device was lost"),
    (EntityKind::Temperature, Status::Ok, "Temperature is normal"),
    (EntityKind::Temperature, Status::Warn, "Temperature is outside the expected range"),
    (EntityKind::Temperature, Status::Fail, "Temperature sensor has failed"),
    (EntityKind::Temperature, Status::NotPresent, "No temperature sensor"),
    (EntityKind::Temperature, Status::Unknown, "Temperature is unknown"),
    (EntityKind::Fan, Status::Ok, "Fan is running"),
    (EntityKind::Fan, Status::Warn, "Fan speed is low"),
    (EntityKind::Fan, Status::Fail, "Fan has failed"),
    (EntityKind::Fan, Status::Dead, "Fan has stopped"),
    (EntityKind::Fan, Status::NotPresent, "No fan installed"),
    (EntityKind::Fan, Status::Unknown, "Fan status is unknown"),
    (EntityKind::Ups, Status::Ok, "UPS is on line power"),
    (EntityKind::Ups, Status::LifeSupport, "UPS is running on battery"),
    (EntityKind::Ups, Status::Warn, "UPS battery is low"),
    (EntityKind::Ups, Status::Fail, "UPS has failed"),
    (EntityKind::Ups, Status::NotPresent, "No UPS attached"),
    (EntityKind::Ups, Status::Unknown, "UPS status is unknown"),
    (EntityKind::Volume, Status::Ok, "Volume is redundant"),
    (EntityKind::Volume, Status::Resync, "Volume is resynchronizing"),
    (EntityKind::Volume, Status::Warn, "Volume is degraded"),
    (EntityKind::Volume, Status::LifeSupport, "Volume has no redundancy left"),
    (EntityKind::Volume, Status::AwaitingRecovery, "Volume is awaiting recovery"),
    (EntityKind::Volume, Status::Fail, "Volume has failed"),
    (EntityKind::Volume, Status::Dead, "Volume is dead"),
    (EntityKind::Volume, Status::Unknown, "Volume status is unknown"),
    (EntityKind::Disk, Status::Ok, "Disk is healthy"),
    (EntityKind::Disk, Status::Resync, "Disk is resynchronizing"),
    (EntityKind::Disk, Status::Warn, "Disk reports warnings"),
    (EntityKind::Disk, Status::AwaitingRecovery, "Disk is awaiting recovery"),
    (EntityKind::Disk, Status::SpareInactive, "Disk is an inactive spare"),
    (EntityKind::Disk, Status::NotPresent, "No disk in this bay"),
    (EntityKind::Disk, Status::Fail, "Disk has failed"),
    (EntityKind::Disk, Status::Dead, "Disk is dead"),
    (EntityKind::Disk, Status::Unknown, "Disk status is unknown"),
];

static CATALOG: LazyLock<HashMap<(EntityKind, Status), &'static str>> = LazyLock::new(|| {
    ENTRIES
        .iter()
        .map(|&(kind, status, text)| ((kind, status), text))
        .collect()
});

/// Returns the display sentence for `status` on a component of `kind`.
#[must_use]
pub fn describe(status: Status, kind: EntityKind) -> &'static str {
    CATALOG
        .get(&(kind, status))
        .copied()
        .unwrap_or_else(|| kind.not_ok_text())
}
