// aurora_notifier - Aurora visibility alerts correlated with cloud cover
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! Aurora visibility alerts correlated with local cloud cover
//!
//! ## Features
//!
//! `aurora_notifier` combines two independently published forecasts for a single observer location
//! and shows the result as a desktop notification.
//!
//! * The [OVATION aurora forecast] from the NOAA Space Weather Prediction Center, a global grid of
//!   aurora probabilities at whole degree resolution.
//! * The hourly cloud cover forecast from [Open-Meteo] for the observer location.
//!
//! The aurora probability at the observer is looked up in the grid and the cloud cover is read
//! for the hour that the aurora forecast applies to, giving a message like `Aurora: 12 Cloud: 85`.
//! Either value is shown as `unknown` when its source doesn't cover the location or hour.
//!
//! Place names can be resolved to coordinates using the [Photon] geocoder.
//!
//! [OVATION aurora forecast]: https://www.swpc.noaa.gov/products/aurora-30-minute-forecast
//! [Open-Meteo]: https://open-meteo.com/
//! [Photon]: https://photon.komoot.io/
//!
//! ## Build
//!
//! `aurora_notifier` is a Rust program and must be built from source using a [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! cargo build --release
//! ```
//!
//! Desktop notifications are shown using `notify-send` which must be installed and on the `PATH`.
//!
//! ## Usage
//!
//! ### Run once
//!
//! Show the current status for a latitude and longitude (whole degrees) and exit.
//!
//! ```text
//! ./aurora_notifier --coordinates 69 19
//! ```
//!
//! Or for a place name. The geocoded position is rounded to the nearest whole degree.
//!
//! ```text
//! ./aurora_notifier --location Tromsø
//! ```
//!
//! ### Poll
//!
//! Refresh both forecasts and show a new notification every 15 minutes until the process is stopped.
//!
//! ```text
//! ./aurora_notifier --location Tromsø --update 15
//! ```
//!
//! ### Prometheus
//!
//! When polling, the latest reading can also be exposed as Prometheus metrics at `/metrics` by
//! passing an address to bind to.
//!
//! ```text
//! ./aurora_notifier --location Tromsø --update 15 --bind 127.0.0.1:9783
//! ```
//!

pub mod aurora;
pub mod client;
pub mod cloud;
pub mod correlation;
pub mod error;
pub mod http;
pub mod location;
pub mod metrics;
pub mod notifier;
