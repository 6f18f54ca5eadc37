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

use crate::location::Coordinate;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::error;
use std::fmt;

#[derive(Debug)]
pub enum ClientError {
    Internal(reqwest::Error),
    InvalidUrl(String),
    Malformed(String),
    Unexpected(StatusCode, Url),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::InvalidUrl(s) => write!(f, "invalid URL {}", s),
            Self::Malformed(s) => write!(f, "malformed response: {}", s),
            Self::Unexpected(status, url) => write!(f, "unexpected status {} for {}", status, url),
        }
    }
}

impl error::Error for ClientError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            _ => None,
        }
    }
}

/// Source of the raw payloads for the aurora, weather, and geocoder feeds.
///
/// `ApiClient` fetches these over HTTP. Anything else implementing this trait
/// (in-memory fixtures, for example) can be used to drive the same components.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Latest global aurora probability grid.
    async fn aurora(&self) -> Result<AuroraFeed, ClientError>;

    /// Hourly cloud cover forecast for a single location.
    async fn cloud_cover(&self, location: Coordinate) -> Result<WeatherFeed, ClientError>;

    /// Best geocoder candidates for a free-form place name.
    async fn geocode(&self, place: &str) -> Result<GeocoderFeed, ClientError>;
}

#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    aurora_url: Url,
    weather_url: Url,
    geocoder_url: Url,
}

impl ApiClient {
    const USER_AGENT: &'static str = concat!("aurora_notifier/", env!("CARGO_PKG_VERSION"));
    const JSON_RESPONSE: &'static str = "application/json";

    pub fn new(client: Client, aurora_url: &str, weather_url: &str, geocoder_url: &str) -> Result<Self, ClientError> {
        Ok(ApiClient {
            client,
            aurora_url: Self::parse_url(aurora_url)?,
            weather_url: Self::parse_url(weather_url)?,
            geocoder_url: Self::parse_url(geocoder_url)?,
        })
    }

    fn parse_url(url: &str) -> Result<Url, ClientError> {
        Url::parse(url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", url, e)))
    }

    async fn make_request(&self, url: Url) -> Result<Response, ClientError> {
        let res = self
            .client
            .get(url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_RESPONSE)
            .send()
            .await
            .map_err(ClientError::Internal)?;

        let status = res.status();
        if status == StatusCode::OK {
            Ok(res)
        } else {
            Err(ClientError::Unexpected(status, url))
        }
    }

    fn cloud_cover_url(&self, location: Coordinate) -> Url {
        let mut url = self.weather_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &location.latitude().to_string())
            .append_pair("longitude", &location.longitude().to_string())
            .append_pair("hourly", "cloudcover")
            .append_pair("timezone", "GMT");

        url
    }

    fn geocode_url(&self, place: &str) -> Url {
        let encoded_place = utf8_percent_encode(place, NON_ALPHANUMERIC);
        let mut url = self.geocoder_url.clone();
        url.set_query(Some(&format!("q={}&limit=1", encoded_place)));
        url
    }
}

#[async_trait]
impl ForecastSource for ApiClient {
    async fn aurora(&self) -> Result<AuroraFeed, ClientError> {
        let request_url = self.aurora_url.clone();
        tracing::debug!(message = "making aurora grid request", url = %request_url);

        let res = self.make_request(request_url).await?;
        res.json::<AuroraFeed>().await.map_err(ClientError::Internal)
    }

    async fn cloud_cover(&self, location: Coordinate) -> Result<WeatherFeed, ClientError> {
        let request_url = self.cloud_cover_url(location);
        tracing::debug!(message = "making cloud cover request", url = %request_url);

        let res = self.make_request(request_url).await?;
        res.json::<WeatherFeed>().await.map_err(ClientError::Internal)
    }

    async fn geocode(&self, place: &str) -> Result<GeocoderFeed, ClientError> {
        let request_url = self.geocode_url(place);
        tracing::debug!(message = "making geocoder request", url = %request_url);

        let res = self.make_request(request_url).await?;
        res.json::<GeocoderFeed>().await.map_err(ClientError::Internal)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuroraFeed {
    #[serde(alias = "Observation Time")]
    pub observation_time: DateTime<Utc>,
    #[serde(alias = "Forecast Time")]
    pub forecast_time: DateTime<Utc>,
    /// `[longitude, latitude, probability]` samples, longitude in 0..=359
    #[serde(alias = "coordinates")]
    pub coordinates: Vec<(i32, i32, u8)>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WeatherFeed {
    #[serde(alias = "hourly")]
    pub hourly: HourlyCloudCover,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HourlyCloudCover {
    #[serde(alias = "time")]
    pub time: Vec<String>,
    #[serde(alias = "cloudcover", alias = "cloud_cover")]
    pub cloudcover: Vec<Option<u8>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeocoderFeed {
    #[serde(alias = "features")]
    pub features: Vec<Feature>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Feature {
    #[serde(alias = "geometry")]
    pub geometry: Geometry,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Geometry {
    /// `[longitude, latitude]`
    #[serde(alias = "coordinates")]
    pub coordinates: [f64; 2],
}
