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

use crate::client::ClientError;
use std::error;
use std::fmt;

/// Which upstream feed an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Aurora,
    Weather,
    Geocoder,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aurora => write!(f, "aurora"),
            Self::Weather => write!(f, "weather"),
            Self::Geocoder => write!(f, "geocoder"),
        }
    }
}

/// Failures that can happen while refreshing forecasts or resolving the observer.
///
/// A lookup that finds no matching grid point or hour is not an error and is
/// never reported through this type. Lookups return `None` instead.
#[derive(Debug)]
pub enum ForecastError {
    SourceUnavailable(Feed, ClientError),
    LocationNotFound(String),
    InvalidCoordinate { longitude: i32, latitude: i32 },
}

impl fmt::Display for ForecastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable(feed, e) => write!(f, "{} source unavailable: {}", feed, e),
            Self::LocationNotFound(name) => write!(f, "location not found: {}", name),
            Self::InvalidCoordinate { longitude, latitude } => write!(
                f,
                "invalid coordinate longitude={} latitude={}, expected longitude in [-180, 180] and latitude in [-90, 90]",
                longitude, latitude
            ),
        }
    }
}

impl error::Error for ForecastError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::SourceUnavailable(_, e) => Some(e),
            _ => None,
        }
    }
}
