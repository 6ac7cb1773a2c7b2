//! Reading kinds carried by Z-Wave JS topics.
//!
//! Multilevel sensors are identified by name and electric meters by the
//! numeric property key Z-Wave JS publishes under `value/<code>`.

use std::time::{SystemTime, UNIX_EPOCH};

/// Multilevel sensor readings the exporter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Temperature,
    Humidity,
    Illuminance,
}

impl SensorKind {
    /// Resolve the Z-Wave JS sensor name (last topic segment).
    ///
    /// Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Air_temperature" => Some(Self::Temperature),
            "Humidity" => Some(Self::Humidity),
            "Illuminance" => Some(Self::Illuminance),
            _ => None,
        }
    }

    /// Z-Wave JS sensor name for this reading.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "Air_temperature",
            Self::Humidity => "Humidity",
            Self::Illuminance => "Illuminance",
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Electric meter readings, keyed by the Z-Wave JS meter property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeterKind {
    /// kWh consumed.
    TotalConsumption,
    /// W.
    Power,
    /// V.
    Voltage,
    /// A.
    Current,
}

impl MeterKind {
    /// Resolve the meter property key (last topic segment).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "65537" => Some(Self::TotalConsumption),
            "66049" => Some(Self::Power),
            "66561" => Some(Self::Voltage),
            "66817" => Some(Self::Current),
            _ => None,
        }
    }

    /// Property key published by Z-Wave JS for this reading.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TotalConsumption => "65537",
            Self::Power => "66049",
            Self::Voltage => "66561",
            Self::Current => "66817",
        }
    }
}

impl std::fmt::Display for MeterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Format a meter endpoint number as the `endpoint` label value.
pub fn endpoint_label(endpoint: &str) -> String {
    format!("endpoint_{}", endpoint)
}

/// Get the current time in seconds since Unix epoch, with sub-second precision.
///
/// Returns 0 if system time is before Unix epoch (should never happen in practice).
pub fn current_timestamp_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_kind_from_name() {
        assert_eq!(
            SensorKind::from_name("Air_temperature"),
            Some(SensorKind::Temperature)
        );
        assert_eq!(SensorKind::from_name("Humidity"), Some(SensorKind::Humidity));
        assert_eq!(
            SensorKind::from_name("Illuminance"),
            Some(SensorKind::Illuminance)
        );
        assert_eq!(SensorKind::from_name("air_temperature"), None);
        assert_eq!(SensorKind::from_name("ThisMetricDoesntExist"), None);
    }

    #[test]
    fn test_meter_kind_from_code() {
        assert_eq!(
            MeterKind::from_code("65537"),
            Some(MeterKind::TotalConsumption)
        );
        assert_eq!(MeterKind::from_code("66049"), Some(MeterKind::Power));
        assert_eq!(MeterKind::from_code("66561"), Some(MeterKind::Voltage));
        assert_eq!(MeterKind::from_code("66817"), Some(MeterKind::Current));
        assert_eq!(MeterKind::from_code("99999"), None);
        assert_eq!(MeterKind::Power.to_string(), "66049");
    }

    #[test]
    fn test_endpoint_label() {
        assert_eq!(endpoint_label("0"), "endpoint_0");
        assert_eq!(endpoint_label("12"), "endpoint_12");
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        // 2024-01-01T00:00:00Z
        assert!(current_timestamp_secs() > 1_704_067_200.0);
    }
}
