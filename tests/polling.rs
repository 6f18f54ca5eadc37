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

use async_trait::async_trait;
use aurora_notifier::client::{AuroraFeed, ClientError, ForecastSource, GeocoderFeed, WeatherFeed};
use aurora_notifier::error::{Feed, ForecastError};
use aurora_notifier::location::{Coordinate, GeoResolver, ObserverLocation};
use aurora_notifier::notifier::{NotificationSink, PollState, PollingNotifier};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const AURORA: &str = r#"{
    "Observation Time": "2024-03-01T14:07:00Z",
    "Forecast Time": "2024-03-01T14:37:00Z",
    "Data Format": "[Longitude, Latitude, Aurora]",
    "coordinates": [[10, 50, 73], [11, 50, 4], [350, 69, 30]]
}"#;

const WEATHER: &str = r#"{
    "hourly": {
        "time": ["2024-03-01T13:00", "2024-03-01T14:00", "2024-03-01T15:00"],
        "cloudcover": [90, 40, 10]
    }
}"#;

const NO_FEATURES: &str = r#"{"type": "FeatureCollection", "features": []}"#;

const TROMSO: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [18.9553, 69.6492]}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-70.0, 40.0]}}
    ]
}"#;

/// In-memory feeds. Aurora requests numbered in `failing_aurora` (starting at 1) fail.
struct FakeSource {
    geocoder: &'static str,
    failing_aurora: Vec<usize>,
    aurora_calls: AtomicUsize,
}

impl FakeSource {
    fn new() -> Self {
        FakeSource {
            geocoder: TROMSO,
            failing_aurora: Vec::new(),
            aurora_calls: AtomicUsize::new(0),
        }
    }

    fn failing(failing_aurora: Vec<usize>) -> Self {
        FakeSource {
            failing_aurora,
            ..Self::new()
        }
    }
}

#[async_trait]
impl ForecastSource for FakeSource {
    async fn aurora(&self) -> Result<AuroraFeed, ClientError> {
        let call = self.aurora_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_aurora.contains(&call) {
            return Err(ClientError::Malformed("unavailable".to_owned()));
        }

        Ok(serde_json::from_str(AURORA).unwrap())
    }

    async fn cloud_cover(&self, _location: Coordinate) -> Result<WeatherFeed, ClientError> {
        Ok(serde_json::from_str(WEATHER).unwrap())
    }

    async fn geocode(&self, _place: &str) -> Result<GeocoderFeed, ClientError> {
        Ok(serde_json::from_str(self.geocoder).unwrap())
    }
}

#[derive(Debug, Clone, Default)]
struct RecordingSink {
    messages: Arc<Mutex<Vec<(String, Duration)>>>,
}

impl RecordingSink {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, message: &str, display: Duration) {
        self.messages.lock().unwrap().push((message.to_owned(), display));
    }
}

fn observer(longitude: i32, latitude: i32) -> ObserverLocation {
    ObserverLocation::new(Coordinate::new(longitude, latitude).unwrap())
}

#[tokio::test]
async fn test_run_once_emits_single_reading() {
    let source = FakeSource::new();
    let sink = RecordingSink::default();

    let mut notifier = PollingNotifier::initialize(&source, observer(10, 50), Box::new(sink.clone()))
        .await
        .unwrap()
        .with_update_minutes(0)
        .with_display(Duration::from_millis(2500));

    assert_eq!(PollState::Idle, notifier.state());
    notifier.run().await;

    assert_eq!(PollState::Stopped, notifier.state());
    assert_eq!(vec!["Aurora: 73 Cloud: 40"], sink.messages());
    assert_eq!(Duration::from_millis(2500), sink.messages.lock().unwrap()[0].1);
}

#[tokio::test]
async fn test_run_once_unknown_values() {
    let source = FakeSource::new();
    let sink = RecordingSink::default();

    let mut notifier = PollingNotifier::initialize(&source, observer(12, 50), Box::new(sink.clone()))
        .await
        .unwrap();
    notifier.run().await;

    assert_eq!(vec!["Aurora: unknown Cloud: 40"], sink.messages());
}

#[tokio::test]
async fn test_run_once_normalized_grid_longitude() {
    let source = FakeSource::new();
    let sink = RecordingSink::default();

    let mut notifier = PollingNotifier::initialize(&source, observer(-10, 69), Box::new(sink.clone()))
        .await
        .unwrap();
    notifier.run().await;

    assert_eq!(vec!["Aurora: 30 Cloud: 40"], sink.messages());
}

#[tokio::test(start_paused = true)]
async fn test_polling_emits_every_interval() {
    let source = FakeSource::new();
    let sink = RecordingSink::default();

    let mut notifier = PollingNotifier::initialize(&source, observer(10, 50), Box::new(sink.clone()))
        .await
        .unwrap()
        .with_update_minutes(5);

    let res = tokio::time::timeout(Duration::from_secs(11 * 60), notifier.run()).await;

    // Polling never finishes on its own
    assert!(res.is_err());
    assert_eq!(3, sink.messages().len());
    assert_eq!(PollState::Running, notifier.state());
    assert_eq!(3, source.aurora_calls.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_polling_skips_failed_refresh() {
    // Call 1 is the initial fetch, call 2 is the refresh at five minutes.
    let source = FakeSource::failing(vec![2]);
    let sink = RecordingSink::default();

    let mut notifier = PollingNotifier::initialize(&source, observer(10, 50), Box::new(sink.clone()))
        .await
        .unwrap()
        .with_update_minutes(5);

    let res = tokio::time::timeout(Duration::from_secs(11 * 60), notifier.run()).await;

    assert!(res.is_err());
    assert_eq!(vec!["Aurora: 73 Cloud: 40", "Aurora: 73 Cloud: 40"], sink.messages());
    assert_eq!(Some(73), notifier.aurora().probability_at(Coordinate::new(10, 50).unwrap()));
}

#[tokio::test(start_paused = true)]
async fn test_polling_survives_persistent_failures() {
    let source = FakeSource::failing((2..100).collect());
    let sink = RecordingSink::default();

    let mut notifier = PollingNotifier::initialize(&source, observer(10, 50), Box::new(sink.clone()))
        .await
        .unwrap()
        .with_update_minutes(5);

    let res = tokio::time::timeout(Duration::from_secs(31 * 60), notifier.run()).await;

    assert!(res.is_err());
    assert_eq!(1, sink.messages().len());
    assert_eq!(7, source.aurora_calls.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_initialize_source_unavailable() {
    let source = FakeSource::failing(vec![1]);
    let res = PollingNotifier::initialize(&source, observer(10, 50), Box::new(RecordingSink::default())).await;

    assert!(matches!(res, Err(ForecastError::SourceUnavailable(Feed::Aurora, _))));
}

#[tokio::test]
async fn test_resolve_uses_first_feature() {
    let source = FakeSource::new();
    let point = GeoResolver::new(&source).resolve("Tromsø").await.unwrap();
    let location = ObserverLocation::from_geocoded(point).unwrap();

    assert_eq!(Coordinate::new(19, 70).unwrap(), location.coordinate());
}

#[tokio::test]
async fn test_resolve_location_not_found() {
    let source = FakeSource {
        geocoder: NO_FEATURES,
        ..FakeSource::new()
    };

    let res = GeoResolver::new(&source).resolve("Nonexistent Place").await;
    match res {
        Err(ForecastError::LocationNotFound(place)) => assert_eq!("Nonexistent Place", place),
        other => panic!("unexpected result {:?}", other),
    }
}
