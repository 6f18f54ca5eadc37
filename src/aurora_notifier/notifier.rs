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
use crate::client::ForecastSource;
use crate::cloud::CloudForecast;
use crate::correlation::{CorrelationEngine, StatusReading};
use crate::error::ForecastError;
use crate::location::ObserverLocation;
use crate::metrics::PollingMetrics;
use std::fmt;
use std::time::Duration;
use tokio::process::Command;
use tokio::runtime::Handle;

const APP_NAME: &str = "Aurora Notifier";
const DEFAULT_DISPLAY: Duration = Duration::from_millis(1000);

/// Destination for formatted status messages.
///
/// Delivery is fire-and-forget. Implementations must not block the caller, have
/// no way to report failure back to it, and must not assume they are called from
/// within an async runtime.
pub trait NotificationSink {
    fn deliver(&self, message: &str, display: Duration);
}

/// Desktop notifications via `notify-send`.
///
/// Inside a Tokio runtime the child process is reaped by a spawned task. Outside
/// of one the process is started and left to exit on its own, so delivery never
/// panics for lack of a runtime.
#[derive(Debug, Default)]
pub struct DesktopSink;

impl DesktopSink {
    fn command(message: &str, display: Duration) -> std::process::Command {
        let mut cmd = std::process::Command::new("notify-send");
        cmd.arg("--app-name")
            .arg(APP_NAME)
            .arg("--urgency")
            .arg("normal")
            .arg("--expire-time")
            .arg(display.as_millis().to_string())
            .arg(APP_NAME)
            .arg(message);
        cmd
    }
}

impl NotificationSink for DesktopSink {
    fn deliver(&self, message: &str, display: Duration) {
        let mut cmd = Self::command(message, display);

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                if let Err(e) = cmd.spawn() {
                    tracing::debug!(message = "unable to start notify-send", error = %e);
                }
                return;
            }
        };

        // Entering the handle lets the tokio child register with the reactor.
        let _guard = handle.enter();
        match Command::from(cmd).spawn() {
            Ok(mut child) => {
                handle.spawn(async move {
                    match child.wait().await {
                        Ok(status) if status.success() => {}
                        Ok(status) => tracing::debug!(message = "notify-send exited unsuccessfully", status = %status),
                        Err(e) => tracing::debug!(message = "unable to wait for notify-send", error = %e),
                    }
                });
            }
            Err(e) => {
                tracing::debug!(message = "unable to start notify-send", error = %e);
            }
        }
    }
}

/// Writes each message as a line on stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn deliver(&self, message: &str, _display: Duration) {
        println!("{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Drives the correlation engine once or on a fixed interval.
///
/// Each tick correlates the current aurora grid and cloud forecast and hands the
/// formatted reading to the sink. With an interval the notifier sleeps for the
/// full period after each tick, refreshes both sources, and emits again. It never
/// stops on its own in that mode.
pub struct PollingNotifier<'a> {
    source: &'a dyn ForecastSource,
    engine: CorrelationEngine,
    aurora: AuroraGrid,
    clouds: CloudForecast,
    sink: Box<dyn NotificationSink + 'a>,
    metrics: PollingMetrics,
    interval: Option<Duration>,
    display: Duration,
    state: PollState,
}

impl<'a> PollingNotifier<'a> {
    pub fn new(
        source: &'a dyn ForecastSource,
        engine: CorrelationEngine,
        aurora: AuroraGrid,
        clouds: CloudForecast,
        sink: Box<dyn NotificationSink + 'a>,
    ) -> Self {
        PollingNotifier {
            source,
            engine,
            aurora,
            clouds,
            sink,
            metrics: PollingMetrics::default(),
            interval: None,
            display: DEFAULT_DISPLAY,
            state: PollState::Idle,
        }
    }

    /// Fetch both sources for `location` and build a notifier around them.
    ///
    /// Any source failure here is returned to the caller since there is no prior
    /// snapshot to fall back on.
    pub async fn initialize(
        source: &'a dyn ForecastSource,
        location: ObserverLocation,
        sink: Box<dyn NotificationSink + 'a>,
    ) -> Result<PollingNotifier<'a>, ForecastError> {
        let aurora = AuroraGrid::fetch(source).await?;
        let clouds = CloudForecast::fetch(source, location.coordinate()).await?;
        Ok(Self::new(source, CorrelationEngine::new(location), aurora, clouds, sink))
    }

    /// Set the update interval. A zero interval means run exactly once.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = if interval.is_zero() { None } else { Some(interval) };
        self
    }

    /// Set the update interval in minutes, saturating at the largest representable period.
    pub fn with_update_minutes(self, minutes: u64) -> Self {
        self.with_interval(Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// How long the sink should display each message.
    pub fn with_display(mut self, display: Duration) -> Self {
        self.display = display;
        self
    }

    pub fn with_metrics(mut self, metrics: PollingMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn is_polling(&self) -> bool {
        self.interval.is_some()
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn aurora(&self) -> &AuroraGrid {
        &self.aurora
    }

    /// Emit a reading and, if an interval is set, keep refreshing and emitting forever.
    ///
    /// A tick whose refresh fails is logged and skipped. Snapshots from the last
    /// successful refresh stay in place for the next attempt.
    pub async fn run(&mut self) {
        self.state = PollState::Running;
        tracing::info!(
            message = "polling started",
            location = %self.engine.location(),
            interval_secs = self.interval.map(|i| i.as_secs()).unwrap_or(0),
        );

        self.emit();

        while let Some(period) = self.interval {
            tokio::time::sleep(period).await;

            match self.refresh().await {
                Ok(()) => {
                    self.emit();
                }
                Err(e) => {
                    self.metrics.refresh_failure();
                    tracing::error!(message = "failed to refresh forecasts, skipping update", error = %e);
                }
            }
        }

        self.state = PollState::Stopped;
        tracing::info!(message = "polling stopped");
    }

    async fn refresh(&mut self) -> Result<(), ForecastError> {
        self.aurora.refresh(self.source).await?;
        self.clouds.refresh(self.source).await?;
        Ok(())
    }

    fn emit(&self) -> StatusReading {
        let reading = self.engine.reading(&self.aurora, &self.clouds);
        tracing::info!(
            message = "current status",
            aurora = ?reading.aurora_probability,
            cloud = ?reading.cloud_cover,
            forecast_hour = %self.aurora.aligned_forecast_time(),
        );

        self.metrics.reading(&reading);
        self.sink.deliver(&reading.to_string(), self.display);
        reading
    }
}
