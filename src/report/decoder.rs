// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoder for status replies.
//!
//! A reply is a 28-byte header followed by tab-delimited text:
//!
//! ```text
//! <mac> \t <name> \t <ip> \t <property blob> \t <version string> [\t ...] \t <boot flag>
//! ```
//!
//! The property blob holds one property per line, shaped as
//! `<type>!!<index>!!<rest>`. Lines of any other shape are skipped, and
//! property types this library does not know are ignored.

use std::sync::LazyLock;

use regex::Regex;

use super::entities::{Disk, Fan, ModelInfo, Temperature, Ups, Volume};
use super::StatusReport;
use crate::error::ParseError;
use crate::protocol::HEADER_LEN;

/// Minimum number of top-level fields in a valid reply.
pub const MIN_FIELDS: usize = 5;

/// Firmware name used when the version string carries none.
pub const UNKNOWN_FIRMWARE: &str = "Unknown firmware";

/// Firmware version used when the version string carries none.
pub const UNKNOWN_VERSION: &str = "Unknown version";

static PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]+)!!(\d+)!!(.*)$").expect("property pattern is valid")
});

static SOFTWARE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^!\s][^!]*?)\s*!!").expect("software name pattern is valid")
});

static SOFTWARE_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"version=([^,!\s]+)").expect("software version pattern is valid")
});

/// Property types carried in the property blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// `temp` - a temperature sensor.
    Temperature,
    /// `fan` - a cooling fan.
    Fan,
    /// `ups` - an attached UPS.
    Ups,
    /// `volume` - a RAID volume.
    Volume,
    /// `disk` - a physical disk.
    Disk,
    /// `model` - hardware model information.
    Model,
}

impl PropertyKind {
    const TOKENS: [(&'static str, Self); 6] = [
        ("temp", Self::Temperature),
        ("fan", Self::Fan),
        ("ups", Self::Ups),
        ("volume", Self::Volume),
        ("disk", Self::Disk),
        ("model", Self::Model),
    ];

    /// Looks up the kind for a wire token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::TOKENS
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, kind)| *kind)
    }

    /// Returns the wire token for this kind.
    #[must_use]
    pub fn token(self) -> &'static str {
        Self::TOKENS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("", |(t, _)| t)
    }
}

/// One well-shaped line of the property blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyLine<'a> {
    /// The raw type token.
    pub token: &'a str,
    /// Positional index from the wire.
    pub index: u32,
    /// Everything after the second `!!`.
    pub rest: &'a str,
}

impl<'a> PropertyLine<'a> {
    /// Splits a line into its parts, or `None` if it is not shaped
    /// `<lowercase>!!<digits>!!<rest>`.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let caps = PROPERTY_RE.captures(line)?;
        Some(Self {
            token: caps.get(1)?.as_str(),
            index: caps.get(2)?.as_str().parse().ok()?,
            rest: caps.get(3)?.as_str(),
        })
    }

    /// Returns the property kind, if the token is known.
    #[must_use]
    pub fn kind(&self) -> Option<PropertyKind> {
        PropertyKind::from_token(self.token)
    }
}

/// Decodes a raw reply, header included.
///
/// # Errors
///
/// Returns [`ParseError::TooShort`] if the reply is shorter than the
/// header, and [`ParseError::MissingFields`] if fewer than
/// [`MIN_FIELDS`] tab-delimited fields follow it.
///
/// # Examples
///
/// ```
/// use raidar_lib::report::decode;
///
/// let mut raw = vec![0u8; 28];
/// raw.extend_from_slice(
///     b"00:0d:a2:01:09:bd\tNASgul\t192.168.1.5\tfan!!0!!status=ok::descr=2352RPM\n\tRAIDiator!!version=4.1.7\t1",
/// );
/// let report = decode(&raw).unwrap();
/// assert_eq!(report.name, "NASgul");
/// assert_eq!(report.fans[0].rpm, 2352);
/// ```
pub fn decode(raw: &[u8]) -> Result<StatusReport, ParseError> {
    let body = raw.get(HEADER_LEN..).ok_or(ParseError::TooShort {
        len: raw.len(),
        header: HEADER_LEN,
    })?;
    decode_body(&String::from_utf8_lossy(body))
}

/// Decodes reply text whose header has already been removed.
///
/// # Errors
///
/// Returns [`ParseError::MissingFields`] if fewer than [`MIN_FIELDS`]
/// tab-delimited fields are present.
pub fn decode_body(body: &str) -> Result<StatusReport, ParseError> {
    let fields: Vec<&str> = body.split('\t').collect();
    if fields.len() < MIN_FIELDS {
        return Err(ParseError::MissingFields {
            expected: MIN_FIELDS,
            found: fields.len(),
        });
    }

    let version = fields[4];
    let mut report = StatusReport {
        hardware_address: fields[0].trim().to_string(),
        name: fields[1].trim().to_string(),
        ip: fields[2].trim().to_string(),
        software_name: capture(&SOFTWARE_NAME_RE, version)
            .unwrap_or_else(|| UNKNOWN_FIRMWARE.to_string()),
        software_version: capture(&SOFTWARE_VERSION_RE, version)
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        boot_flag: fields[MIN_FIELDS..]
            .last()
            .map(|f| f.trim_end_matches(['\r', '\n', '\0']).to_string())
            .unwrap_or_default(),
        ..StatusReport::default()
    };

    for line in fields[3].lines() {
        if let Some(property) = PropertyLine::parse(line.trim_end_matches('\r')) {
            apply(&mut report, &property);
        }
    }

    Ok(report)
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Adds one property to the report.
///
/// Sub-entities are kept even when their pattern did not match, so a
/// malformed record shows up with [`Status::Unknown`](super::Status::Unknown)
/// instead of disappearing.
fn apply(report: &mut StatusReport, property: &PropertyLine<'_>) {
    let Some(kind) = property.kind() else {
        return;
    };
    let (index, rest) = (property.index, property.rest);

    match kind {
        PropertyKind::Temperature => report.temperatures.push(Temperature::parse(index, rest).0),
        PropertyKind::Fan => report.fans.push(Fan::parse(index, rest).0),
        PropertyKind::Ups => report.ups = Some(Ups::parse(index, rest).0),
        PropertyKind::Volume => report.volumes.push(Volume::parse(index, rest).0),
        PropertyKind::Disk => report.disks.push(Disk::parse(index, rest).0),
        PropertyKind::Model => report.model = ModelInfo::parse(rest).0,
    }
}
