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

//! Fortress ID - device identification report for the local host
//!
//! Collects a device fingerprint, derives a device ID from it, and looks up
//! the host's public and private addresses. Each result is reported as soon
//! as it is ready.

pub mod app;
pub mod logger;
pub mod report;
