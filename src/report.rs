/*
 * This file is part of Fortress ID.
 *
 * Copyright (C) 2025 Fortress ID contributors
 *
 * Fortress ID is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Fortress ID is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Fortress ID. If not, see <https://www.gnu.org/licenses/>.
 */

//! Device report
//!
//! Four independent cards, each filled in as its producer finishes. A card
//! is either still loading or ready; a ready card may hold no value, which
//! renders as unavailable.

use std::fmt::Write;
use std::net::{IpAddr, Ipv4Addr};

use fid_core::constants::schema::NOT_AVAILABLE;
use fid_core::{CanonicalHash, FingerprintRecord, SCHEMA_VERSION};
use serde::Serialize;

const PRIVATE_IP_NOTE: &str = "Note: Private IP retrieval relies on the host's peer negotiation \
capabilities and may not always be available or accurate.";

/// Progress of one report stream.
///
/// Serializes as `{"status": "loading"}` or `{"status": "ready", "value": ...}`
/// where a ready card without a value carries `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Loadable<T> {
    #[default]
    Loading,
    /// `None` means the producer finished without a value
    Ready(Option<T>),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Loadable::Ready(Some(value)) => Some(value),
            _ => None,
        }
    }
}

/// The four cards, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    Fingerprint,
    DeviceId,
    PublicIp,
    PrivateIp,
}

impl CardKind {
    pub fn title(self) -> &'static str {
        match self {
            CardKind::Fingerprint => "Device Fingerprint",
            CardKind::DeviceId => "Unique Device ID",
            CardKind::PublicIp => "Public IP Address",
            CardKind::PrivateIp => "Private IP Address",
        }
    }
}

/// A producer's result
#[derive(Debug, Clone)]
pub enum ReportUpdate {
    Fingerprint(Option<FingerprintRecord>),
    DeviceId(Option<CanonicalHash>),
    PublicIp(Option<IpAddr>),
    PrivateIp(Option<Ipv4Addr>),
}

impl ReportUpdate {
    pub fn card(&self) -> CardKind {
        match self {
            ReportUpdate::Fingerprint(_) => CardKind::Fingerprint,
            ReportUpdate::DeviceId(_) => CardKind::DeviceId,
            ReportUpdate::PublicIp(_) => CardKind::PublicIp,
            ReportUpdate::PrivateIp(_) => CardKind::PrivateIp,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeviceReport {
    pub fingerprint: Loadable<FingerprintRecord>,
    pub device_id: Loadable<CanonicalHash>,
    pub public_ip: Loadable<IpAddr>,
    pub private_ip: Loadable<Ipv4Addr>,
}

/// Serialized form of a report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot<'a> {
    /// Version of the fingerprint field set the device ID was derived from
    pub schema_version: u32,
    pub fingerprint: &'a Loadable<FingerprintRecord>,
    pub device_id: &'a Loadable<CanonicalHash>,
    pub public_ip: &'a Loadable<IpAddr>,
    pub private_ip: &'a Loadable<Ipv4Addr>,
    pub complete: bool,
}

impl DeviceReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an update and returns the card it belongs to
    pub fn apply(&mut self, update: ReportUpdate) -> CardKind {
        let card = update.card();
        match update {
            ReportUpdate::Fingerprint(v) => self.fingerprint = Loadable::Ready(v),
            ReportUpdate::DeviceId(v) => self.device_id = Loadable::Ready(v),
            ReportUpdate::PublicIp(v) => self.public_ip = Loadable::Ready(v),
            ReportUpdate::PrivateIp(v) => self.private_ip = Loadable::Ready(v),
        }
        card
    }

    pub fn is_complete(&self) -> bool {
        !(self.fingerprint.is_loading()
            || self.device_id.is_loading()
            || self.public_ip.is_loading()
            || self.private_ip.is_loading())
    }

    pub fn snapshot(&self) -> ReportSnapshot<'_> {
        ReportSnapshot {
            schema_version: SCHEMA_VERSION,
            fingerprint: &self.fingerprint,
            device_id: &self.device_id,
            public_ip: &self.public_ip,
            private_ip: &self.private_ip,
            complete: self.is_complete(),
        }
    }

    /// Renders one card as plain text
    pub fn render_card(&self, kind: CardKind) -> String {
        let mut out = format!("== {} ==\n", kind.title());

        match kind {
            CardKind::Fingerprint => match &self.fingerprint {
                Loadable::Loading => out.push_str("Loading...\n"),
                Loadable::Ready(None) => out.push_str("Unavailable\n"),
                Loadable::Ready(Some(record)) => {
                    for (name, value) in record.field_values() {
                        let _ = writeln!(
                            out,
                            "{}: {}",
                            title_case(name),
                            value.as_deref().unwrap_or(NOT_AVAILABLE)
                        );
                    }
                }
            },
            CardKind::DeviceId => match (&self.device_id, &self.fingerprint) {
                (Loadable::Ready(Some(id)), _) => {
                    let _ = writeln!(out, "{}", id.value);
                    let _ = writeln!(out, "Algorithm: {} | Schema v{}", id.algorithm, SCHEMA_VERSION);
                    if !id.is_cryptographic() {
                        let _ = writeln!(out, "({} fallback, not collision resistant)", id.algorithm);
                    }
                }
                (Loadable::Loading, _) | (_, Loadable::Loading) => out.push_str("Generating...\n"),
                (Loadable::Ready(None), _) => out.push_str("Unavailable\n"),
            },
            CardKind::PublicIp => match &self.public_ip {
                Loadable::Loading => out.push_str("Loading...\n"),
                Loadable::Ready(None) => out.push_str("Unavailable\n"),
                Loadable::Ready(Some(ip)) => {
                    let _ = writeln!(out, "{}", ip);
                }
            },
            CardKind::PrivateIp => {
                match &self.private_ip {
                    Loadable::Loading => out.push_str("Attempting to retrieve...\n"),
                    Loadable::Ready(None) => out.push_str("Unavailable or not permitted by the host.\n"),
                    Loadable::Ready(Some(ip)) => {
                        let _ = writeln!(out, "{}", ip);
                    }
                }
                let _ = writeln!(out, "{}", PRIVATE_IP_NOTE);
            }
        }

        out
    }
}

/// "ScreenResolution" -> "Screen Resolution", "WebGLVendor" -> "Web GL Vendor"
pub fn title_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_lower) {
                out.push(' ');
            }
        }
        if i == 0 {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
