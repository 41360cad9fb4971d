// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Component records carried by a status report.
//!
//! Every record is built from the `<rest>` part of a property line by a
//! `parse(index, rest) -> (Self, bool)` constructor. A constructor never
//! fails: when its pattern does not match, it returns the default record
//! (status [`Status::Unknown`]) together with `false`.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::Status;

static TEMPERATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^status=([a-z_]+)::descr=(-?\d+(?:\.\d+)?)C/(-?\d+(?:\.\d+)?)F(?:::expected=(-?\d+(?:\.\d+)?)-(-?\d+(?:\.\d+)?)C/(-?\d+(?:\.\d+)?)-(-?\d+(?:\.\d+)?)F)?",
    )
    .expect("temperature pattern is valid")
});

static FAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^status=([a-z_]+)::descr=((\d+)\s*RPM.*)$").expect("fan pattern is valid")
});

static UPS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^status=([a-z_]+)::descr=(.*)$").expect("ups pattern is valid")
});

static UPS_BATTERY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)\s*[;(]?\s*Battery charge:\s*([^,;)]+?)\s*[,;]\s*([^)]*?)\s*\)?\s*$")
        .expect("ups battery pattern is valid")
});

static VOLUME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^status=([a-z_]+)::descr=Volume (\S+?):? RAID Level ([^,;]+),\s*([^;]+);\s*(\d+(?:\.\d+)?)\s*([KMGTP]?B)\s*\((\d+)%\)\s*of\s*(\d+(?:\.\d+)?)\s*([KMGTP]?B)\s*used",
    )
    .expect("volume pattern is valid")
});

static DISK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^status=([a-z_]+)::descr=Channel (\d+):\s*(.+?)(?:,\s*(-?\d+(?:\.\d+)?)C/(-?\d+(?:\.\d+)?)F)?(?:,\s*(.+?))?\s*$",
    )
    .expect("disk pattern is valid")
});

static DESCR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"descr=([^:]+)").expect("description pattern is valid"));

static MODEL_MODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"mode=([^:]+)").expect("mode pattern is valid"));

static MODEL_ARCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"arch=([^:]+)").expect("arch pattern is valid"));

/// Model string used when the device does not report one.
pub const UNKNOWN_MODEL: &str = "Unknown model";

/// Returns capture group `i` as a trimmed string, or an empty string.
fn text(caps: &Captures<'_>, i: usize) -> String {
    caps.get(i)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Parses capture group `i` with `.` as the decimal separator.
///
/// `str::parse` never consults the process locale.
fn number(caps: &Captures<'_>, i: usize) -> Option<f64> {
    caps.get(i).and_then(|m| m.as_str().parse().ok())
}

fn status(caps: &Captures<'_>) -> Status {
    caps.get(1)
        .map_or(Status::Unknown, |m| Status::from_wire(m.as_str()))
}

/// A temperature sensor reading.
///
/// # Examples
///
/// ```
/// use raidar_lib::report::Temperature;
/// use raidar_lib::Status;
///
/// let (temp, matched) =
///     Temperature::parse(0, "status=ok::descr=34.0C/93.2F::expected=20-40C/68-104F");
/// assert!(matched);
/// assert_eq!(temp.status, Status::Ok);
/// assert_eq!(temp.celsius, 34.0);
/// assert_eq!(temp.max_expected_celsius, 40.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    /// Position of the sensor in the reply.
    pub index: u32,
    /// Sensor health.
    pub status: Status,
    /// Current reading in Celsius.
    pub celsius: f64,
    /// Current reading in Fahrenheit.
    pub fahrenheit: f64,
    /// Lower bound of the expected range in Celsius.
    pub min_expected_celsius: f64,
    /// Upper bound of the expected range in Celsius.
    pub max_expected_celsius: f64,
    /// Lower bound of the expected range in Fahrenheit.
    pub min_expected_fahrenheit: f64,
    /// Upper bound of the expected range in Fahrenheit.
    pub max_expected_fahrenheit: f64,
    /// Description as reported, e.g. `34.0C/93.2F`.
    pub description: String,
}

impl Temperature {
    /// Builds a temperature record from the text after `temp!!<index>!!`.
    #[must_use]
    pub fn parse(index: u32, rest: &str) -> (Self, bool) {
        let Some(caps) = TEMPERATURE_RE.captures(rest) else {
            return (Self { index, ..Self::default() }, false);
        };

        let reading = Self {
            index,
            status: status(&caps),
            celsius: number(&caps, 2).unwrap_or_default(),
            fahrenheit: number(&caps, 3).unwrap_or_default(),
            min_expected_celsius: number(&caps, 4).unwrap_or_default(),
            max_expected_celsius: number(&caps, 5).unwrap_or_default(),
            min_expected_fahrenheit: number(&caps, 6).unwrap_or_default(),
            max_expected_fahrenheit: number(&caps, 7).unwrap_or_default(),
            description: DESCR_RE
                .captures(rest)
                .map(|descr| text(&descr, 1))
                .unwrap_or_default(),
        };
        (reading, true)
    }

    /// Returns `true` if the current reading lies within the expected range.
    ///
    /// Always `true` when the device did not report a range.
    #[must_use]
    pub fn is_within_expected(&self) -> bool {
        if self.min_expected_celsius == 0.0 && self.max_expected_celsius == 0.0 {
            return true;
        }
        (self.min_expected_celsius..=self.max_expected_celsius).contains(&self.celsius)
    }
}

/// A cooling fan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fan {
    /// Position of the fan in the reply.
    pub index: u32,
    /// Fan health.
    pub status: Status,
    /// Rotation speed.
    pub rpm: u32,
    /// Description as reported, e.g. `2352RPM`.
    pub description: String,
}

impl Fan {
    /// Builds a fan record from the text after `fan!!<index>!!`.
    #[must_use]
    pub fn parse(index: u32, rest: &str) -> (Self, bool) {
        let Some(caps) = FAN_RE.captures(rest) else {
            return (Self { index, ..Self::default() }, false);
        };

        let fan = Self {
            index,
            status: status(&caps),
            rpm: caps
                .get(3)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or_default(),
            description: text(&caps, 2),
        };
        (fan, true)
    }
}

/// An uninterruptible power supply attached to the device.
///
/// Charge and remaining time are kept as reported (`"100%"`,
/// `"46 minutes"`) and are empty when no UPS is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ups {
    /// Position of the UPS in the reply.
    pub index: u32,
    /// UPS health.
    pub status: Status,
    /// Make and model of the UPS.
    pub description: String,
    /// Battery charge.
    pub charge: String,
    /// Estimated runtime on battery.
    pub time_left: String,
}

impl Ups {
    /// Builds a UPS record from the text after `ups!!<index>!!`.
    #[must_use]
    pub fn parse(index: u32, rest: &str) -> (Self, bool) {
        let Some(caps) = UPS_RE.captures(rest) else {
            return (Self { index, ..Self::default() }, false);
        };

        let descr = caps.get(2).map_or("", |m| m.as_str()).trim();
        let (description, charge, time_left) = match UPS_BATTERY_RE.captures(descr) {
            Some(battery) => (text(&battery, 1), text(&battery, 2), text(&battery, 3)),
            None => (descr.to_string(), String::new(), String::new()),
        };

        let ups = Self {
            index,
            status: status(&caps),
            description,
            charge,
            time_left,
        };
        (ups, true)
    }
}

/// A storage amount with the unit the device used to print it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    /// Numeric amount.
    pub amount: f64,
    /// Unit suffix such as `GB` or `TB`.
    pub unit: String,
}

impl Capacity {
    /// Converts the amount to gigabytes (binary multiples).
    ///
    /// Returns `None` for units this library does not recognise.
    #[must_use]
    pub fn gigabytes(&self) -> Option<f64> {
        let factor = match self.unit.as_str() {
            "B" => 1.0 / 1024.0 / 1024.0 / 1024.0,
            "KB" => 1.0 / 1024.0 / 1024.0,
            "MB" => 1.0 / 1024.0,
            "GB" => 1.0,
            "TB" => 1024.0,
            "PB" => 1024.0 * 1024.0,
            _ => return None,
        };
        Some(self.amount * factor)
    }
}

/// A RAID volume.
///
/// # Examples
///
/// ```
/// use raidar_lib::report::Volume;
///
/// let (volume, matched) = Volume::parse(
///     1,
///     "status=ok::descr=Volume C: RAID Level X, Redundant; 130 GB (14%) of 926 GB used",
/// );
/// assert!(matched);
/// assert_eq!(volume.raid_level, "X");
/// assert_eq!(volume.raid_status, "Redundant");
/// assert_eq!(volume.used_percent, 14);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    /// Position of the volume in the reply; not necessarily contiguous.
    pub index: u32,
    /// Volume health.
    pub status: Status,
    /// Volume name, e.g. `C`.
    pub name: String,
    /// RAID level as printed (`X`, `5`, `1`, ...).
    pub raid_level: String,
    /// RAID state text, e.g. `Redundant` or `Degraded`.
    pub raid_status: String,
    /// Space in use.
    pub used: Capacity,
    /// Total space.
    pub total: Capacity,
    /// Space in use, in percent.
    pub used_percent: u8,
}

impl Volume {
    /// Builds a volume record from the text after `volume!!<index>!!`.
    #[must_use]
    pub fn parse(index: u32, rest: &str) -> (Self, bool) {
        let Some(caps) = VOLUME_RE.captures(rest) else {
            return (Self { index, ..Self::default() }, false);
        };

        let volume = Self {
            index,
            status: status(&caps),
            name: text(&caps, 2),
            raid_level: text(&caps, 3),
            raid_status: text(&caps, 4),
            used: Capacity {
                amount: number(&caps, 5).unwrap_or_default(),
                unit: text(&caps, 6),
            },
            total: Capacity {
                amount: number(&caps, 8).unwrap_or_default(),
                unit: text(&caps, 9),
            },
            used_percent: caps
                .get(7)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or_default(),
        };
        (volume, true)
    }
}

/// A physical disk.
///
/// # Examples
///
/// ```
/// use raidar_lib::report::Disk;
///
/// let (disk, matched) = Disk::parse(1, "status=ok::descr=Channel 1: ST3320620AS 298 GB");
/// assert!(matched);
/// assert_eq!(disk.channel, 1);
/// assert_eq!(disk.make_model, "ST3320620AS 298 GB");
/// assert_eq!(disk.celsius, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    /// Position of the disk in the reply; not necessarily contiguous.
    pub index: u32,
    /// Disk health.
    pub status: Status,
    /// Controller channel the disk is attached to.
    pub channel: u32,
    /// Make, model and size as printed.
    pub make_model: String,
    /// Drive temperature in Celsius, if reported.
    pub celsius: Option<f64>,
    /// Drive temperature in Fahrenheit, if reported.
    pub fahrenheit: Option<f64>,
    /// Trailing state text, e.g. `spare`; empty when absent.
    pub state: String,
}

impl Disk {
    /// Builds a disk record from the text after `disk!!<index>!!`.
    #[must_use]
    pub fn parse(index: u32, rest: &str) -> (Self, bool) {
        let Some(caps) = DISK_RE.captures(rest) else {
            return (Self { index, ..Self::default() }, false);
        };

        let disk = Self {
            index,
            status: status(&caps),
            channel: caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or_default(),
            make_model: text(&caps, 3),
            celsius: number(&caps, 4),
            fahrenheit: number(&caps, 5),
            state: text(&caps, 6),
        };
        (disk, true)
    }
}

/// Hardware model information from the `model` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name, or [`UNKNOWN_MODEL`].
    pub model: String,
    /// Product mode, e.g. `pro`; empty when absent.
    pub mode: String,
    /// CPU architecture tag, e.g. `nsp`; empty when absent.
    pub arch: String,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            model: UNKNOWN_MODEL.to_string(),
            mode: String::new(),
            arch: String::new(),
        }
    }
}

impl ModelInfo {
    /// Builds model information from the text after `model!!<index>!!`.
    ///
    /// `mode` and `arch` are picked up independently of the model name.
    #[must_use]
    pub fn parse(rest: &str) -> (Self, bool) {
        let field = |re: &Regex| {
            re.captures(rest)
                .map(|caps| text(&caps, 1))
                .unwrap_or_default()
        };

        let model = field(&DESCR_RE);
        let matched = !model.is_empty();
        let info = Self {
            model: if matched {
                model
            } else {
                UNKNOWN_MODEL.to_string()
            },
            mode: field(&MODEL_MODE_RE),
            arch: field(&MODEL_ARCH_RE),
        };
        (info, matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_uses_dot_decimals() {
        let (temp, matched) =
            Temperature::parse(0, "status=ok::descr=34.0C/93.2F::expected=20-40C/68-104F");
        assert!(matched);
        assert!((temp.celsius - 34.0).abs() < f64::EPSILON);
        assert!((temp.fahrenheit - 93.2).abs() < f64::EPSILON);
        assert!((temp.min_expected_celsius - 20.0).abs() < f64::EPSILON);
        assert!((temp.max_expected_celsius - 40.0).abs() < f64::EPSILON);
        assert!((temp.min_expected_fahrenheit - 68.0).abs() < f64::EPSILON);
        assert!((temp.max_expected_fahrenheit - 104.0).abs() < f64::EPSILON);
        assert_eq!(temp.description, "34.0C/93.2F");
        assert!(temp.is_within_expected());
    }

    #[test]
    fn temperature_comma_decimal_does_not_match() {
        let (temp, matched) = Temperature::parse(2, "status=ok::descr=34,0C/93,2F");
        assert!(!matched);
        assert_eq!(temp.index, 2);
        assert_eq!(temp.status, Status::Unknown);
        assert!(temp.celsius.abs() < f64::EPSILON);
    }

    #[test]
    fn temperature_without_expected_range() {
        let (temp, matched) = Temperature::parse(0, "status=warn::descr=51.5C/124.7F");
        assert!(matched);
        assert_eq!(temp.status, Status::Warn);
        assert!((temp.celsius - 51.5).abs() < f64::EPSILON);
        assert!(temp.is_within_expected());
    }

    #[test]
    fn temperature_out_of_range() {
        let (temp, _) =
            Temperature::parse(0, "status=warn::descr=45.0C/113.0F::expected=0-40C/32-104F");
        assert!(!temp.is_within_expected());
    }

    #[test]
    fn fan_speed() {
        let (fan, matched) = Fan::parse(0, "status=ok::descr=2352RPM");
        assert!(matched);
        assert_eq!(fan.rpm, 2352);
        assert_eq!(fan.description, "2352RPM");
    }

    #[test]
    fn fan_garbage_is_unknown() {
        let (fan, matched) = Fan::parse(0, "status=ok::descr=spinning");
        assert!(!matched);
        assert_eq!(fan, Fan::default());
    }

    #[test]
    fn ups_absent() {
        let (ups, matched) = Ups::parse(1, "status=not_present::descr=");
        assert!(matched);
        assert_eq!(ups.status, Status::NotPresent);
        assert_eq!(ups.charge, "");
        assert_eq!(ups.time_left, "");
    }

    #[test]
    fn ups_with_battery() {
        let (ups, matched) = Ups::parse(
            1,
            "status=ok::descr=APC Back-UPS ES 700 (Battery charge: 100%, 46 minutes)",
        );
        assert!(matched);
        assert_eq!(ups.description, "APC Back-UPS ES 700");
        assert_eq!(ups.charge, "100%");
        assert_eq!(ups.time_left, "46 minutes");
    }

    #[test]
    fn ups_on_battery_with_semicolon() {
        let (ups, _) = Ups::parse(
            1,
            "status=life_support::descr=Back-UPS RS 1500; Battery charge: 62%, 21 minutes",
        );
        assert_eq!(ups.status, Status::LifeSupport);
        assert_eq!(ups.description, "Back-UPS RS 1500");
        assert_eq!(ups.charge, "62%");
        assert_eq!(ups.time_left, "21 minutes");
    }

    #[test]
    fn volume_capacities() {
        let (volume, matched) = Volume::parse(
            3,
            "status=resync::descr=Volume C: RAID Level 5, Degraded; 1.2 TB (67%) of 1.8 TB used",
        );
        assert!(matched);
        assert_eq!(volume.index, 3);
        assert_eq!(volume.status, Status::Resync);
        assert_eq!(volume.name, "C");
        assert_eq!(volume.raid_level, "5");
        assert_eq!(volume.raid_status, "Degraded");
        assert_eq!(volume.used.unit, "TB");
        assert!((volume.used.amount - 1.2).abs() < f64::EPSILON);
        assert!((volume.total.amount - 1.8).abs() < f64::EPSILON);
        assert_eq!(volume.used_percent, 67);
    }

    #[test]
    fn capacity_conversion() {
        let tb = Capacity {
            amount: 2.0,
            unit: "TB".to_string(),
        };
        assert_eq!(tb.gigabytes(), Some(2048.0));

        let odd = Capacity {
            amount: 2.0,
            unit: "XB".to_string(),
        };
        assert_eq!(odd.gigabytes(), None);
    }

    #[test]
    fn disk_with_temperature_and_state() {
        let (disk, matched) = Disk::parse(
            2,
            "status=spare_inactive::descr=Channel 2: WDC WD20EARS 1863 GB, 33C/91F, spare",
        );
        assert!(matched);
        assert_eq!(disk.status, Status::SpareInactive);
        assert_eq!(disk.channel, 2);
        assert_eq!(disk.make_model, "WDC WD20EARS 1863 GB");
        assert_eq!(disk.celsius, Some(33.0));
        assert_eq!(disk.fahrenheit, Some(91.0));
        assert_eq!(disk.state, "spare");
    }

    #[test]
    fn disk_without_channel_is_unknown() {
        let (disk, matched) = Disk::parse(4, "status=ok::descr=empty bay");
        assert!(!matched);
        assert_eq!(disk.index, 4);
        assert_eq!(disk.status, Status::Unknown);
        assert!(disk.make_model.is_empty());
    }

    #[test]
    fn model_fields() {
        let (info, matched) = ModelInfo::parse("mode=pro::descr=ReadyNAS NV::arch=nsp");
        assert!(matched);
        assert_eq!(info.model, "ReadyNAS NV");
        assert_eq!(info.mode, "pro");
        assert_eq!(info.arch, "nsp");
    }

    #[test]
    fn model_defaults_when_missing() {
        let (info, matched) = ModelInfo::parse("mode=pro");
        assert!(!matched);
        assert_eq!(info.model, UNKNOWN_MODEL);
        assert_eq!(info.mode, "pro");
    }
}
