//! Metric registry holding the current value of every Z-Wave gauge series.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use parking_lot::RwLock;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use tracing::{debug, warn};

use crate::mapping::{GaugeMetric, LAST_UPDATE_METRIC, build_labels};

/// Content type of the rendered exposition text.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Ordered label key/value pairs of a series.
pub type LabelSet = Vec<(String, String)>;

type FloatGauge = Gauge<f64, AtomicU64>;
type GaugeFamily = Family<LabelSet, FloatGauge>;

/// A unique identifier for a gauge series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub metric: GaugeMetric,
    pub labels: LabelSet,
}

/// Handle to a single gauge series. Cloning shares the underlying value.
#[derive(Debug, Clone)]
pub struct SeriesHandle {
    key: SeriesKey,
    gauge: FloatGauge,
}

impl SeriesHandle {
    /// Overwrite the current value.
    pub fn set(&self, value: f64) {
        self.gauge.set(value);
    }

    pub fn get(&self) -> f64 {
        self.gauge.get()
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }
}

/// Thread-safe registry of the exported gauges.
///
/// Series are created on first use and never removed. Values are atomics, so
/// writers never block the scrape path beyond the family map lookup.
pub struct MetricRegistry {
    registry: Registry,
    node_last_active: GaugeFamily,
    sensor_temperature: GaugeFamily,
    sensor_humidity: GaugeFamily,
    sensor_illuminance: GaugeFamily,
    meter_total_consumption: GaugeFamily,
    meter_power: GaugeFamily,
    meter_voltage: GaugeFamily,
    meter_current: GaugeFamily,
    last_update: FloatGauge,
    /// Series created so far.
    series: RwLock<HashSet<SeriesKey>>,
}

impl MetricRegistry {
    /// Create a registry with every Z-Wave gauge registered and no series.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let mut family = |metric: GaugeMetric| {
            let family = GaugeFamily::default();
            registry.register(metric.name(), metric.help(), family.clone());
            family
        };

        let node_last_active = family(GaugeMetric::NodeLastActive);
        let sensor_temperature = family(GaugeMetric::SensorTemperature);
        let sensor_humidity = family(GaugeMetric::SensorHumidity);
        let sensor_illuminance = family(GaugeMetric::SensorIlluminance);
        let meter_total_consumption = family(GaugeMetric::MeterTotalConsumption);
        let meter_power = family(GaugeMetric::MeterPower);
        let meter_voltage = family(GaugeMetric::MeterVoltage);
        let meter_current = family(GaugeMetric::MeterCurrent);

        let last_update = FloatGauge::default();
        registry.register(
            LAST_UPDATE_METRIC,
            "Unix time in seconds of the last processed MQTT message",
            last_update.clone(),
        );

        Self {
            registry,
            node_last_active,
            sensor_temperature,
            sensor_humidity,
            sensor_illuminance,
            meter_total_consumption,
            meter_power,
            meter_voltage,
            meter_current,
            last_update,
            series: RwLock::new(HashSet::new()),
        }
    }

    fn family(&self, metric: GaugeMetric) -> &GaugeFamily {
        match metric {
            GaugeMetric::NodeLastActive => &self.node_last_active,
            GaugeMetric::SensorTemperature => &self.sensor_temperature,
            GaugeMetric::SensorHumidity => &self.sensor_humidity,
            GaugeMetric::SensorIlluminance => &self.sensor_illuminance,
            GaugeMetric::MeterTotalConsumption => &self.meter_total_consumption,
            GaugeMetric::MeterPower => &self.meter_power,
            GaugeMetric::MeterVoltage => &self.meter_voltage,
            GaugeMetric::MeterCurrent => &self.meter_current,
        }
    }

    /// Resolve the series for `metric` with the given label values, creating it
    /// on first use. `label_values` follow [`GaugeMetric::label_names`].
    pub fn get_or_create_series(&self, metric: GaugeMetric, label_values: &[&str]) -> SeriesHandle {
        let key = SeriesKey {
            metric,
            labels: build_labels(metric, label_values),
        };

        let gauge = self.family(metric).get_or_create(&key.labels).clone();

        let is_new = !self.series.read().contains(&key);
        if is_new && self.series.write().insert(key.clone()) {
            debug!(metric = %metric, labels = ?key.labels, "Created series");
        }

        SeriesHandle { key, gauge }
    }

    /// Current value of an existing series, without creating it.
    pub fn value(&self, metric: GaugeMetric, label_values: &[&str]) -> Option<f64> {
        let key = SeriesKey {
            metric,
            labels: build_labels(metric, label_values),
        };

        if !self.series.read().contains(&key) {
            return None;
        }

        Some(self.family(metric).get_or_create(&key.labels).get())
    }

    /// Set the heartbeat gauge.
    pub fn set_last_update(&self, unix_secs: f64) {
        self.last_update.set(unix_secs);
    }

    /// Current heartbeat value; 0 until the first message is processed.
    pub fn last_update(&self) -> f64 {
        self.last_update.get()
    }

    /// Number of labeled series created so far.
    pub fn series_count(&self) -> usize {
        self.series.read().len()
    }

    /// Render all gauges in the OpenMetrics text exposition format.
    pub fn render(&self) -> String {
        let mut output = String::with_capacity(1024 + self.series_count() * 100);

        if let Err(e) = encode(&mut output, &self.registry) {
            warn!(error = %e, "Failed to encode metrics");
        }

        output
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a shareable registry handle.
pub type SharedRegistry = Arc<MetricRegistry>;
