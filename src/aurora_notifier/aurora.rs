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

use crate::client::{AuroraFeed, ForecastSource};
use crate::error::{Feed, ForecastError};
use crate::location::Coordinate;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Format of the hourly keys used by the cloud cover series, e.g. `2024-03-01T14:00`.
pub const HOUR_BUCKET_FORMAT: &str = "%Y-%m-%dT%H:00";

/// Map a timestamp to the hourly key of the cloud cover series it falls within.
///
/// The zone suffix is dropped, seconds are discarded, and the minutes are forced
/// to `00`. For example `2024-03-01T14:37:00Z` becomes `2024-03-01T14:00`. If the
/// aurora forecast is ever published more often than hourly, any sub-hour offset
/// is lost here.
pub fn hour_bucket(timestamp: DateTime<Utc>) -> String {
    timestamp.format(HOUR_BUCKET_FORMAT).to_string()
}

/// One complete aurora grid along with the times it was computed for.
#[derive(Debug, Clone)]
pub struct AuroraSnapshot {
    observation_time: DateTime<Utc>,
    forecast_time: DateTime<Utc>,
    grid: HashMap<Coordinate, u8>,
}

impl AuroraSnapshot {
    /// Build a snapshot from `(longitude, latitude, probability)` samples.
    ///
    /// Longitudes above 180 are mapped into the `[-180, 180]` range. When a
    /// coordinate appears more than once the first sample wins.
    pub fn new<I>(observation_time: DateTime<Utc>, forecast_time: DateTime<Utc>, samples: I) -> Self
    where
        I: IntoIterator<Item = (i32, i32, u8)>,
    {
        let mut grid = HashMap::new();
        for (longitude, latitude, probability) in samples {
            grid.entry(Coordinate::from_grid(longitude, latitude))
                .or_insert(probability);
        }

        AuroraSnapshot {
            observation_time,
            forecast_time,
            grid,
        }
    }

    pub fn observation_time(&self) -> DateTime<Utc> {
        self.observation_time
    }

    pub fn forecast_time(&self) -> DateTime<Utc> {
        self.forecast_time
    }

    pub fn probability_at(&self, coordinate: Coordinate) -> Option<u8> {
        self.grid.get(&coordinate).copied()
    }

    pub fn aligned_forecast_time(&self) -> String {
        hour_bucket(self.forecast_time)
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

impl From<AuroraFeed> for AuroraSnapshot {
    fn from(feed: AuroraFeed) -> Self {
        AuroraSnapshot::new(feed.observation_time, feed.forecast_time, feed.coordinates)
    }
}

/// Holder for the most recent aurora snapshot.
///
/// The snapshot is only ever swapped for a fully parsed replacement. A failed
/// refresh leaves the previous snapshot in place.
#[derive(Debug)]
pub struct AuroraGrid {
    snapshot: AuroraSnapshot,
}

impl AuroraGrid {
    pub fn new(snapshot: AuroraSnapshot) -> Self {
        AuroraGrid { snapshot }
    }

    /// Create a grid from the current contents of the aurora feed.
    pub async fn fetch(source: &dyn ForecastSource) -> Result<Self, ForecastError> {
        Ok(Self::new(Self::load(source).await?))
    }

    pub async fn refresh(&mut self, source: &dyn ForecastSource) -> Result<(), ForecastError> {
        self.snapshot = Self::load(source).await?;
        Ok(())
    }

    async fn load(source: &dyn ForecastSource) -> Result<AuroraSnapshot, ForecastError> {
        let feed = source
            .aurora()
            .await
            .map_err(|e| ForecastError::SourceUnavailable(Feed::Aurora, e))?;

        let snapshot = AuroraSnapshot::from(feed);
        tracing::debug!(
            message = "loaded aurora grid",
            observation_time = %snapshot.observation_time(),
            forecast_time = %snapshot.forecast_time(),
            points = snapshot.len(),
        );

        Ok(snapshot)
    }

    /// Probability at exactly `coordinate`, `None` if the grid has no sample there.
    pub fn probability_at(&self, coordinate: Coordinate) -> Option<u8> {
        self.snapshot.probability_at(coordinate)
    }

    /// Hourly cloud cover key matching the forecast time of the current snapshot.
    pub fn aligned_forecast_time(&self) -> String {
        self.snapshot.aligned_forecast_time()
    }
}
