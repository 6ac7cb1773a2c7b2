//! Mapping from Z-Wave readings to Prometheus gauges.

use zwave_common::reading::{MeterKind, SensorKind};

/// Name of the unlabeled heartbeat gauge.
pub const LAST_UPDATE_METRIC: &str = "zwave_last_update";

/// Labeled gauges exported for Z-Wave readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GaugeMetric {
    NodeLastActive,
    SensorTemperature,
    SensorHumidity,
    SensorIlluminance,
    MeterTotalConsumption,
    MeterPower,
    MeterVoltage,
    MeterCurrent,
}

impl GaugeMetric {
    /// Every labeled gauge, in registration order.
    pub const ALL: [GaugeMetric; 8] = [
        GaugeMetric::NodeLastActive,
        GaugeMetric::SensorTemperature,
        GaugeMetric::SensorHumidity,
        GaugeMetric::SensorIlluminance,
        GaugeMetric::MeterTotalConsumption,
        GaugeMetric::MeterPower,
        GaugeMetric::MeterVoltage,
        GaugeMetric::MeterCurrent,
    ];

    /// Gauge receiving a multilevel sensor reading.
    pub fn for_sensor(kind: SensorKind) -> Self {
        match kind {
            SensorKind::Temperature => GaugeMetric::SensorTemperature,
            SensorKind::Humidity => GaugeMetric::SensorHumidity,
            SensorKind::Illuminance => GaugeMetric::SensorIlluminance,
        }
    }

    /// Gauge receiving an electric meter reading.
    pub fn for_meter(kind: MeterKind) -> Self {
        match kind {
            MeterKind::TotalConsumption => GaugeMetric::MeterTotalConsumption,
            MeterKind::Power => GaugeMetric::MeterPower,
            MeterKind::Voltage => GaugeMetric::MeterVoltage,
            MeterKind::Current => GaugeMetric::MeterCurrent,
        }
    }

    /// Exposed metric name.
    pub fn name(&self) -> &'static str {
        match self {
            GaugeMetric::NodeLastActive => "zwave_node_last_active",
            GaugeMetric::SensorTemperature => "zwave_sensor_temperature",
            GaugeMetric::SensorHumidity => "zwave_sensor_humidity",
            GaugeMetric::SensorIlluminance => "zwave_sensor_illuminance",
            GaugeMetric::MeterTotalConsumption => "zwave_power_meter_total_consumption_kwh",
            GaugeMetric::MeterPower => "zwave_power_meter_power_watts",
            GaugeMetric::MeterVoltage => "zwave_power_meter_voltage_volts",
            GaugeMetric::MeterCurrent => "zwave_power_meter_current_amps",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            GaugeMetric::NodeLastActive => "Unix time in seconds the node was last active",
            GaugeMetric::SensorTemperature => "Air temperature reported by the sensor",
            GaugeMetric::SensorHumidity => "Relative humidity reported by the sensor",
            GaugeMetric::SensorIlluminance => "Illuminance reported by the sensor",
            GaugeMetric::MeterTotalConsumption => "Total energy consumed in kWh",
            GaugeMetric::MeterPower => "Instantaneous power in watts",
            GaugeMetric::MeterVoltage => "Voltage in volts",
            GaugeMetric::MeterCurrent => "Current in amperes",
        }
    }

    /// Label names, in exposition order.
    pub fn label_names(&self) -> &'static [&'static str] {
        match self {
            GaugeMetric::NodeLastActive => &["node"],
            GaugeMetric::SensorTemperature
            | GaugeMetric::SensorHumidity
            | GaugeMetric::SensorIlluminance => &["sensor"],
            GaugeMetric::MeterTotalConsumption
            | GaugeMetric::MeterPower
            | GaugeMetric::MeterVoltage
            | GaugeMetric::MeterCurrent => &["meter", "endpoint"],
        }
    }
}

impl std::fmt::Display for GaugeMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Pair label names with their values.
///
/// Extra values, or missing ones, are a caller bug; the shorter side wins.
pub fn build_labels(metric: GaugeMetric, values: &[&str]) -> Vec<(String, String)> {
    debug_assert_eq!(
        metric.label_names().len(),
        values.len(),
        "label count mismatch for {}",
        metric
    );

    metric
        .label_names()
        .iter()
        .zip(values)
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_mapping() {
        assert_eq!(
            GaugeMetric::for_sensor(SensorKind::Temperature).name(),
            "zwave_sensor_temperature"
        );
        assert_eq!(
            GaugeMetric::for_sensor(SensorKind::Humidity).name(),
            "zwave_sensor_humidity"
        );
        assert_eq!(
            GaugeMetric::for_sensor(SensorKind::Illuminance).name(),
            "zwave_sensor_illuminance"
        );
    }

    #[test]
    fn test_meter_mapping() {
        assert_eq!(
            GaugeMetric::for_meter(MeterKind::TotalConsumption).name(),
            "zwave_power_meter_total_consumption_kwh"
        );
        assert_eq!(
            GaugeMetric::for_meter(MeterKind::Power).name(),
            "zwave_power_meter_power_watts"
        );
        assert_eq!(
            GaugeMetric::for_meter(MeterKind::Voltage).name(),
            "zwave_power_meter_voltage_volts"
        );
        assert_eq!(
            GaugeMetric::for_meter(MeterKind::Current).name(),
            "zwave_power_meter_current_amps"
        );
    }

    #[test]
    fn test_label_names() {
        assert_eq!(GaugeMetric::NodeLastActive.label_names(), &["node"]);
        assert_eq!(GaugeMetric::SensorHumidity.label_names(), &["sensor"]);
        assert_eq!(GaugeMetric::MeterPower.label_names(), &["meter", "endpoint"]);
    }

    #[test]
    fn test_build_labels_keeps_order() {
        let labels = build_labels(GaugeMetric::MeterPower, &["outlet", "endpoint_0"]);

        assert_eq!(
            labels,
            vec![
                ("meter".to_string(), "outlet".to_string()),
                ("endpoint".to_string(), "endpoint_0".to_string()),
            ]
        );
    }

    #[test]
    fn test_metric_names_are_unique() {
        let mut names: Vec<_> = GaugeMetric::ALL.iter().map(|m| m.name()).collect();
        names.push(LAST_UPDATE_METRIC);
        names.sort();
        names.dedup();

        assert_eq!(names.len(), GaugeMetric::ALL.len() + 1);
    }
}
