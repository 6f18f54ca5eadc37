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

use crate::client::ForecastSource;
use crate::error::{Feed, ForecastError};
use std::fmt;

/// Integer degree position on the aurora grid.
///
/// Longitude is in `[-180, 180]` and latitude is in `[-90, 90]`. Values built
/// with `Coordinate::new` are checked against these ranges. The antimeridian is
/// always stored as longitude 180 so both spellings of it compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    longitude: i32,
    latitude: i32,
}

impl Coordinate {
    pub fn new(longitude: i32, latitude: i32) -> Result<Self, ForecastError> {
        if (-180..=180).contains(&longitude) && (-90..=90).contains(&latitude) {
            Ok(Coordinate::from_grid(longitude, latitude))
        } else {
            Err(ForecastError::InvalidCoordinate { longitude, latitude })
        }
    }

    /// Build a grid key, mapping 0..=359 feed longitudes into `[-180, 180]` and -180 onto 180.
    pub(crate) fn from_grid(longitude: i32, latitude: i32) -> Self {
        let longitude = match longitude {
            -180 => 180,
            l if l > 180 => l - 360,
            l => l,
        };
        Coordinate { longitude, latitude }
    }

    pub fn longitude(&self) -> i32 {
        self.longitude
    }

    pub fn latitude(&self) -> i32 {
        self.latitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lat={} lon={}", self.latitude, self.longitude)
    }
}

/// Real valued position returned by the geocoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

/// The single place that readings are computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverLocation {
    coordinate: Coordinate,
}

impl ObserverLocation {
    pub fn new(coordinate: Coordinate) -> Self {
        ObserverLocation { coordinate }
    }

    /// Snap a geocoded point to the nearest integer degree.
    ///
    /// The aurora grid is coarser than geocoder precision so up to half a degree
    /// of error in each axis is expected here.
    pub fn from_geocoded(point: GeoPoint) -> Result<Self, ForecastError> {
        let coordinate = Coordinate::new(point.longitude.round() as i32, point.latitude.round() as i32)?;
        Ok(Self::new(coordinate))
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

impl fmt::Display for ObserverLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.coordinate, f)
    }
}

/// Turns place names into coordinates using the geocoder feed.
pub struct GeoResolver<'a> {
    source: &'a dyn ForecastSource,
}

impl<'a> GeoResolver<'a> {
    pub fn new(source: &'a dyn ForecastSource) -> Self {
        GeoResolver { source }
    }

    /// Return the best ranked candidate for `place`.
    ///
    /// Only the first feature returned by the geocoder is considered. No candidates
    /// at all is reported as `ForecastError::LocationNotFound`.
    pub async fn resolve(&self, place: &str) -> Result<GeoPoint, ForecastError> {
        let feed = self
            .source
            .geocode(place)
            .await
            .map_err(|e| ForecastError::SourceUnavailable(Feed::Geocoder, e))?;

        let feature = feed
            .features
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::LocationNotFound(place.to_owned()))?;

        let [longitude, latitude] = feature.geometry.coordinates;
        tracing::debug!(message = "resolved location", place = %place, longitude = longitude, latitude = latitude);

        Ok(GeoPoint { longitude, latitude })
    }
}
