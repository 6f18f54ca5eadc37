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

use crate::correlation::StatusReading;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;

/// Holder for metrics that can be set from a `StatusReading` and poll outcomes.
///
/// All metrics are registered upon call to `PollingMetrics::new()`. Values that
/// are unknown in a reading are exported as `NaN` rather than left at their
/// previous value so that a stale probability is never mistaken for a current one.
#[derive(Debug, Clone, Default)]
pub struct PollingMetrics {
    aurora_probability: Gauge<f64, AtomicU64>,
    cloud_cover: Gauge<f64, AtomicU64>,
    readings: Counter,
    refresh_failures: Counter,
}

impl PollingMetrics {
    pub fn new(reg: &mut Registry) -> Self {
        let metrics = Self::default();

        reg.register(
            "aurora_probability_percent",
            "Probability of visible aurora at the observer location (0-100)",
            metrics.aurora_probability.clone(),
        );
        reg.register(
            "cloud_cover_percent",
            "Cloud cover at the observer location for the aurora forecast hour (0-100)",
            metrics.cloud_cover.clone(),
        );
        reg.register(
            "readings",
            "Number of status readings delivered",
            metrics.readings.clone(),
        );
        reg.register(
            "refresh_failures",
            "Number of polling ticks skipped because a source could not be refreshed",
            metrics.refresh_failures.clone(),
        );

        metrics
    }

    pub fn reading(&self, reading: &StatusReading) {
        self.aurora_probability.set(Self::value(reading.aurora_probability));
        self.cloud_cover.set(Self::value(reading.cloud_cover));
        self.readings.inc();
    }

    pub fn refresh_failure(&self) {
        self.refresh_failures.inc();
    }

    fn value(v: Option<u8>) -> f64 {
        v.map(f64::from).unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::PollingMetrics;
    use crate::correlation::StatusReading;
    use prometheus_client::encoding::text::encode;
    use prometheus_client::registry::Registry;

    #[test]
    fn test_reading_exported() {
        let mut registry = Registry::with_prefix("aurora_notifier");
        let metrics = PollingMetrics::new(&mut registry);

        metrics.reading(&StatusReading::new(Some(73), None));
        metrics.refresh_failure();

        let mut buf = String::new();
        encode(&mut buf, &registry).unwrap();

        assert!(buf.contains("aurora_notifier_aurora_probability_percent 73"));
        assert!(buf.contains("aurora_notifier_cloud_cover_percent NaN"));
        assert!(buf.contains("aurora_notifier_readings_total 1"));
        assert!(buf.contains("aurora_notifier_refresh_failures_total 1"));
    }
}
