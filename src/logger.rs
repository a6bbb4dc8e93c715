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

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `fid_core=debug`
pub const LOG_ENV: &str = "FORTRESS_ID_LOG";

/// Filter directive: the environment wins over the settings file
pub fn log_filter(default_level: &str) -> String {
    std::env::var(LOG_ENV)
        .ok()
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| default_level.to_string())
}

/// Installs the global subscriber. Logs go to stderr; stdout carries the report.
///
/// An unparsable filter falls back to `warn`. Calling this twice is harmless.
pub fn init_logging(default_level: &str) {
    let directive = log_filter(default_level);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Invalid log filter {:?}: {}, using warn", directive, e);
        EnvFilter::new("warn")
    });

    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
