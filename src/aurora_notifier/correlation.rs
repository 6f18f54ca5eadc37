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

use crate::aurora::AuroraGrid;
use crate::cloud::CloudForecast;
use crate::location::ObserverLocation;
use std::fmt;

/// Aurora probability and cloud cover for the observer at the aurora forecast hour.
///
/// Either value may be `None` when its source has no entry for the requested
/// coordinate or hour. That is an expected outcome near grid gaps and the end
/// of the cloud forecast, not a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusReading {
    pub aurora_probability: Option<u8>,
    pub cloud_cover: Option<u8>,
}

impl StatusReading {
    pub fn new(aurora_probability: Option<u8>, cloud_cover: Option<u8>) -> Self {
        StatusReading {
            aurora_probability,
            cloud_cover,
        }
    }
}

struct Value(Option<u8>);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "unknown"),
        }
    }
}

impl fmt::Display for StatusReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Aurora: {} Cloud: {}",
            Value(self.aurora_probability),
            Value(self.cloud_cover)
        )
    }
}

/// Combines the aurora grid and cloud forecast for one observer.
///
/// Holds no state besides the observer location. Readings are a pure function
/// of whatever snapshots the two sources currently hold.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    location: ObserverLocation,
}

impl CorrelationEngine {
    pub fn new(location: ObserverLocation) -> Self {
        CorrelationEngine { location }
    }

    pub fn location(&self) -> ObserverLocation {
        self.location
    }

    pub fn reading(&self, aurora: &AuroraGrid, clouds: &CloudForecast) -> StatusReading {
        let coordinate = self.location.coordinate();
        if clouds.location() != coordinate {
            tracing::warn!(
                message = "cloud forecast is for a different location than the observer",
                observer = %coordinate,
                forecast = %clouds.location(),
            );
        }

        let aurora_probability = aurora.probability_at(coordinate);
        let bucket = aurora.aligned_forecast_time();
        let cloud_cover = clouds.cover_at(&bucket);

        StatusReading::new(aurora_probability, cloud_cover)
    }
}
