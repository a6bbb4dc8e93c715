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

use std::sync::Arc;

use anyhow::Result;
use fid_core::{
    load_settings, FingerprintCollector, NativeProvider, PrivateAddressDiscovery, PublicIpLookup,
    Settings,
};
use tracing::{info, warn};

use fortress_id::app::{print_help, CliOptions, Producers};
use fortress_id::logger::init_logging;
use fortress_id::report::DeviceReport;

#[tokio::main]
async fn main() -> Result<()> {
    let options = match CliOptions::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(2);
        }
    };
    if options.help {
        print_help();
        return Ok(());
    }

    // Settings pick the default log level, so they load before logging exists
    let loaded = load_settings();
    let settings = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&settings.log_level);
    if let Err(e) = &loaded {
        warn!("Using default settings: {}", e);
    }

    info!("STARTUP: fortress-id {} starting", env!("CARGO_PKG_VERSION"));

    let provider = NativeProvider::new().with_screen(settings.screen());
    let producers = Producers {
        collector: FingerprintCollector::from_provider(Arc::new(provider)),
        discovery: PrivateAddressDiscovery::native(),
        public_ip: (!options.offline).then(|| public_ip_lookup(&settings)),
        discovery_timeout: options.discovery_timeout(&settings),
    };

    let mut updates = producers.spawn();
    let mut report = DeviceReport::new();

    while let Some(update) = updates.recv().await {
        let card = report.apply(update);
        if !options.json {
            println!("{}", report.render_card(card));
        }
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report.snapshot())?);
    }

    Ok(())
}

fn public_ip_lookup(settings: &Settings) -> PublicIpLookup {
    PublicIpLookup::new(settings.public_ip_endpoint.clone(), settings.public_ip_timeout())
}
