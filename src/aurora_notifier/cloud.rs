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

use crate::client::{ClientError, ForecastSource, WeatherFeed};
use crate::error::{Feed, ForecastError};
use crate::location::Coordinate;

/// Hourly cloud cover percentages keyed by the source's own hour labels.
///
/// Keys are kept exactly as published (`YYYY-MM-DDTHH:MM`) and matched exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloudSeries {
    entries: Vec<(String, Option<u8>)>,
}

impl CloudSeries {
    pub fn new(entries: Vec<(String, Option<u8>)>) -> Self {
        CloudSeries { entries }
    }

    pub fn cover_at(&self, timestamp: &str) -> Option<u8> {
        self.entries
            .iter()
            .find(|(key, _)| key == timestamp)
            .and_then(|(_, cover)| *cover)
    }

    /// First and last hour keys in the series, if it has any entries.
    pub fn horizon(&self) -> Option<(&str, &str)> {
        let first = self.entries.first()?;
        let last = self.entries.last()?;
        Some((first.0.as_str(), last.0.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<WeatherFeed> for CloudSeries {
    type Error = ClientError;

    fn try_from(feed: WeatherFeed) -> Result<Self, Self::Error> {
        let hourly = feed.hourly;
        if hourly.time.len() != hourly.cloudcover.len() {
            return Err(ClientError::Malformed(format!(
                "{} hourly times but {} cloud cover values",
                hourly.time.len(),
                hourly.cloudcover.len()
            )));
        }

        Ok(CloudSeries::new(hourly.time.into_iter().zip(hourly.cloudcover).collect()))
    }
}

/// Cloud cover forecast bound to a single location for its whole lifetime.
#[derive(Debug)]
pub struct CloudForecast {
    location: Coordinate,
    series: CloudSeries,
}

impl CloudForecast {
    pub fn new(location: Coordinate, series: CloudSeries) -> Self {
        CloudForecast { location, series }
    }

    pub async fn fetch(source: &dyn ForecastSource, location: Coordinate) -> Result<Self, ForecastError> {
        Ok(Self::new(location, Self::load(source, location).await?))
    }

    /// Replace the series with the latest forecast for the bound location.
    pub async fn refresh(&mut self, source: &dyn ForecastSource) -> Result<(), ForecastError> {
        self.series = Self::load(source, self.location).await?;
        Ok(())
    }

    async fn load(source: &dyn ForecastSource, location: Coordinate) -> Result<CloudSeries, ForecastError> {
        let series = source
            .cloud_cover(location)
            .await
            .and_then(CloudSeries::try_from)
            .map_err(|e| ForecastError::SourceUnavailable(Feed::Weather, e))?;

        if let Some((first, last)) = series.horizon() {
            tracing::debug!(message = "loaded cloud cover", location = %location, first = %first, last = %last);
        } else {
            tracing::warn!(message = "cloud cover forecast has no hours", location = %location);
        }

        Ok(series)
    }

    pub fn location(&self) -> Coordinate {
        self.location
    }

    /// Cover for the hour keyed by `timestamp`, `None` if that hour is not in the forecast.
    pub fn cover_at(&self, timestamp: &str) -> Option<u8> {
        self.series.cover_at(timestamp)
    }
}
