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

use aurora_notifier::client::ApiClient;
use aurora_notifier::error::ForecastError;
use aurora_notifier::http::RequestContext;
use aurora_notifier::location::{Coordinate, GeoResolver, ObserverLocation};
use aurora_notifier::metrics::PollingMetrics;
use aurora_notifier::notifier::{DesktopSink, NotificationSink, PollingNotifier, StdoutSink};
use clap::{Args, Parser, ValueEnum};
use prometheus_client::registry::Registry;
use reqwest::Client;
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_TIMEOUT_MILLIS: u64 = 5000;
const DEFAULT_DISPLAY_MILLIS: u64 = 1000;
const DEFAULT_AURORA_URL: &str = "https://services.swpc.noaa.gov/json/ovation_aurora_latest.json";
const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DEFAULT_GEOCODER_URL: &str = "https://photon.komoot.io/api/";

#[derive(Debug, Parser)]
#[clap(name = "aurora_notifier", version = clap::crate_version!())]
struct AuroraNotifierApplication {
    #[clap(flatten)]
    location: LocationArgs,

    /// Refresh forecasts and notify at this interval, in minutes. When absent or zero,
    /// notify once and exit.
    #[clap(short = 'u', long = "update", value_name = "MINUTES")]
    update: Option<u64>,

    /// Where to deliver status messages
    #[clap(long, value_enum, default_value_t = SinkKind::Desktop)]
    sink: SinkKind,

    /// How long desktop notifications should be displayed, in milliseconds
    #[clap(long, default_value_t = DEFAULT_DISPLAY_MILLIS)]
    display_millis: u64,

    /// URL of the aurora probability grid
    #[clap(long, default_value_t = DEFAULT_AURORA_URL.into())]
    aurora_url: String,

    /// Base URL for the hourly cloud cover forecast API
    #[clap(long, default_value_t = DEFAULT_WEATHER_URL.into())]
    weather_url: String,

    /// Base URL for the geocoder API used by --location
    #[clap(long, default_value_t = DEFAULT_GEOCODER_URL.into())]
    geocoder_url: String,

    /// Timeout for each request to the aurora, weather, or geocoder APIs, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Address to expose Prometheus metrics on while polling. Metrics are not served
    /// unless an address is given.
    #[clap(long)]
    bind: Option<SocketAddr>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct LocationArgs {
    /// Observer latitude and longitude in whole degrees
    #[clap(short = 'c', long, num_args = 2, value_names = ["LAT", "LON"], allow_negative_numbers = true)]
    coordinates: Option<Vec<i32>>,

    /// Observer place name, resolved with the geocoder
    #[clap(short = 'l', long)]
    location: Option<String>,
}

impl LocationArgs {
    /// Observer given by `--coordinates LAT LON`, if that form was used.
    fn observer(&self) -> Option<Result<ObserverLocation, ForecastError>> {
        match self.coordinates.as_deref() {
            Some(&[latitude, longitude]) => Some(Coordinate::new(longitude, latitude).map(ObserverLocation::new)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    Desktop,
    Stdout,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = AuroraNotifierApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .with_writer(io::stderr)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let client = ApiClient::new(http_client, &opts.aurora_url, &opts.weather_url, &opts.geocoder_url)
        .unwrap_or_else(|e| {
            tracing::error!(message = "unable to initialize API client", error = %e);
            process::exit(1)
        });

    let location = observer_location(&opts.location, &client).await.unwrap_or_else(|e| {
        tracing::error!(message = "unable to determine observer location", error = %e);
        process::exit(1)
    });

    let sink: Box<dyn NotificationSink> = match opts.sink {
        SinkKind::Desktop => Box::new(DesktopSink),
        SinkKind::Stdout => Box::new(StdoutSink),
    };

    let mut registry = Registry::with_prefix("aurora_notifier");
    let metrics = PollingMetrics::new(&mut registry);

    // Fetch both forecasts once before doing anything else. There's nothing to show
    // without them so failing here ends the process instead of waiting for the next tick.
    let mut notifier = PollingNotifier::initialize(&client, location, sink)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(message = "failed to fetch initial forecasts", error = %e);
            process::exit(1)
        })
        .with_update_minutes(opts.update.unwrap_or(0))
        .with_display(Duration::from_millis(opts.display_millis))
        .with_metrics(metrics);

    match opts.bind {
        Some(bind) if notifier.is_polling() => {
            let context = Arc::new(RequestContext::new(registry));
            let handler = aurora_notifier::http::text_metrics(context);
            let server = axum::Server::try_bind(&bind).unwrap_or_else(|e| {
                tracing::error!(message = "error binding to address", address = %bind, error = %e);
                process::exit(1)
            });

            tracing::info!(message = "metrics server started", address = %bind);
            tokio::spawn(async move {
                if let Err(e) = server.serve(handler.into_make_service()).await {
                    tracing::error!(message = "metrics server failed", error = %e);
                }
            });
        }
        Some(bind) => {
            tracing::warn!(message = "ignoring metrics address when running once", address = %bind);
        }
        None => {}
    }

    tokio::select! {
        _ = notifier.run() => {}
        _ = sigterm() => {}
        _ = sigint() => {}
    }

    tracing::info!(message = "shutdown", state = %notifier.state());
    Ok(())
}

async fn observer_location(args: &LocationArgs, client: &ApiClient) -> Result<ObserverLocation, ForecastError> {
    if let Some(location) = args.observer() {
        return location;
    }

    let place = args
        .location
        .as_deref()
        .expect("clap requires exactly one of --coordinates LAT LON or --location NAME");
    let point = GeoResolver::new(client).resolve(place).await?;
    let location = ObserverLocation::from_geocoded(point)?;
    tracing::info!(message = "resolved observer location", place = %place, location = %location);

    Ok(location)
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AuroraNotifierApplication, SinkKind};
    use aurora_notifier::error::ForecastError;
    use aurora_notifier::location::Coordinate;
    use clap::Parser;

    #[test]
    fn test_parse_coordinates() {
        let opts = AuroraNotifierApplication::try_parse_from(["aurora_notifier", "--coordinates", "69", "-19"]).unwrap();
        assert_eq!(Some(vec![69, -19]), opts.location.coordinates);
        assert_eq!(None, opts.location.location);
        assert_eq!(None, opts.update);
        assert_eq!(SinkKind::Desktop, opts.sink);
    }

    #[test]
    fn test_coordinates_are_latitude_then_longitude() {
        let opts = AuroraNotifierApplication::try_parse_from(["aurora_notifier", "--coordinates", "69", "-19"]).unwrap();
        let location = opts.location.observer().unwrap().unwrap();

        assert_eq!(Coordinate::new(-19, 69).unwrap(), location.coordinate());
        assert_eq!(69, location.coordinate().latitude());
        assert_eq!(-19, location.coordinate().longitude());
    }

    #[test]
    fn test_coordinates_out_of_range() {
        let opts = AuroraNotifierApplication::try_parse_from(["aurora_notifier", "--coordinates", "91", "0"]).unwrap();
        assert!(matches!(
            opts.location.observer(),
            Some(Err(ForecastError::InvalidCoordinate { longitude: 0, latitude: 91 }))
        ));
    }

    #[test]
    fn test_location_has_no_coordinate_observer() {
        let opts = AuroraNotifierApplication::try_parse_from(["aurora_notifier", "--location", "Tromsø"]).unwrap();
        assert!(opts.location.observer().is_none());
    }

    #[test]
    fn test_parse_location_with_update() {
        let opts = AuroraNotifierApplication::try_parse_from([
            "aurora_notifier",
            "--location",
            "Tromsø",
            "--update",
            "5",
            "--sink",
            "stdout",
        ])
        .unwrap();
        assert_eq!(Some("Tromsø".to_owned()), opts.location.location);
        assert_eq!(Some(5), opts.update);
        assert_eq!(SinkKind::Stdout, opts.sink);
    }

    #[test]
    fn test_parse_location_required() {
        assert!(AuroraNotifierApplication::try_parse_from(["aurora_notifier"]).is_err());
    }

    #[test]
    fn test_parse_location_exclusive() {
        let res = AuroraNotifierApplication::try_parse_from([
            "aurora_notifier",
            "--coordinates",
            "69",
            "19",
            "--location",
            "Tromsø",
        ]);
        assert!(res.is_err());
    }
}
