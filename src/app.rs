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

//! Command line options and the three report producers

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use fid_core::{FingerprintCollector, PrivateAddressDiscovery, PublicIpLookup, Settings};
use tokio::sync::mpsc;
use tracing::debug;

use crate::report::ReportUpdate;

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOptions {
    /// Print the final report as JSON instead of cards
    pub json: bool,
    /// Skip the public IP request
    pub offline: bool,
    pub timeout_ms: Option<u64>,
    pub help: bool,
}

impl CliOptions {
    /// Parses arguments, excluding the program name
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "--json" => options.json = true,
                "--offline" => options.offline = true,
                "--timeout-ms" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--timeout-ms requires a value"))?;
                    let ms: u64 = value
                        .as_ref()
                        .parse()
                        .map_err(|_| anyhow!("Invalid --timeout-ms value: {}", value.as_ref()))?;
                    if ms == 0 {
                        bail!("--timeout-ms must be positive");
                    }
                    options.timeout_ms = Some(ms);
                }
                "-h" | "--help" => options.help = true,
                other => bail!("Unknown argument: {}", other),
            }
        }

        Ok(options)
    }

    /// Command line timeout, else the settings value
    pub fn discovery_timeout(&self, settings: &Settings) -> Duration {
        self.timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.discovery_timeout())
    }
}

pub fn print_help() {
    println!("fortress-id {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: fortress-id [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --json             Print the final report as JSON");
    println!("  --offline          Skip the public IP lookup");
    println!("  --timeout-ms <N>   Private address discovery timeout");
    println!("  -h, --help         Show this help");
    println!();
    println!("Environment:");
    println!("  FORTRESS_ID_LOG    Log filter (default: warn)");
}

/// The independent producers behind the report cards
pub struct Producers {
    pub collector: FingerprintCollector,
    pub discovery: PrivateAddressDiscovery,
    /// `None` reports the public address as unavailable without a request
    pub public_ip: Option<PublicIpLookup>,
    pub discovery_timeout: Duration,
}

impl Producers {
    /// Starts every producer. Updates arrive in completion order; the channel
    /// closes once all of them have reported.
    pub fn spawn(self) -> mpsc::UnboundedReceiver<ReportUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();

        let Producers {
            collector,
            discovery,
            public_ip,
            discovery_timeout,
        } = self;

        let fingerprint_tx = tx.clone();
        tokio::spawn(async move {
            let record = collector.collect().await;
            let _ = fingerprint_tx.send(ReportUpdate::Fingerprint(record.clone()));
            let id = collector.hasher().hash_optional(record.as_ref()).await;
            let _ = fingerprint_tx.send(ReportUpdate::DeviceId(id));
        });

        let public_tx = tx.clone();
        tokio::spawn(async move {
            let ip = match public_ip {
                Some(lookup) => lookup.lookup().await,
                None => {
                    debug!("Offline mode, public IP lookup skipped");
                    None
                }
            };
            let _ = public_tx.send(ReportUpdate::PublicIp(ip));
        });

        tokio::spawn(async move {
            let ip = discovery.discover(discovery_timeout).await;
            let _ = tx.send(ReportUpdate::PrivateIp(ip));
        });

        rx
    }
}
