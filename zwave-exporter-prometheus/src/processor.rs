//! Turns a single MQTT message into at most one gauge update.

use parking_lot::RwLock;
use tracing::{debug, info};
use zwave_common::payload::{DecodeError, PayloadShape, decode_value};
use zwave_common::reading::{MeterKind, SensorKind, current_timestamp_secs, endpoint_label};
use zwave_common::topic::{ParsedTopic, classify_topic};

use crate::mapping::GaugeMetric;
use crate::registry::SharedRegistry;

/// What processing did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A gauge series was set.
    Recorded(GaugeMetric),
    /// Known topic shape, but the sensor name or meter code is not exported.
    UnknownReading,
    /// The topic matches no known shape.
    UnmatchedTopic,
}

/// Processor statistics.
#[derive(Debug, Clone, Default)]
pub struct ProcessorStats {
    /// Total messages handed to the processor.
    pub messages_received: u64,
    /// Messages that set a gauge.
    pub readings_recorded: u64,
    /// Messages with a known topic shape but an unexported reading.
    pub unknown_readings: u64,
    /// Messages on topics matching no known shape.
    pub unmatched_topics: u64,
    /// Messages whose payload failed to decode.
    pub decode_errors: u64,
}

/// Classifies, decodes and records Z-Wave messages into the registry.
pub struct MessageProcessor {
    registry: SharedRegistry,
    stats: RwLock<ProcessorStats>,
}

impl MessageProcessor {
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            stats: RwLock::new(ProcessorStats::default()),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Process one message.
    ///
    /// Unmatched topics and unexported readings are not errors. The heartbeat
    /// is set on every call that returns `Ok`; a decode error leaves every
    /// gauge untouched.
    pub fn process(&self, topic: &str, payload: &[u8]) -> Result<(), DecodeError> {
        info!(
            topic = %topic,
            payload = %String::from_utf8_lossy(payload),
            "received message"
        );

        self.stats.write().messages_received += 1;

        let outcome = match self.dispatch(topic, payload) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.stats.write().decode_errors += 1;
                return Err(e);
            }
        };

        {
            let mut stats = self.stats.write();
            match outcome {
                Outcome::Recorded(_) => stats.readings_recorded += 1,
                Outcome::UnknownReading => stats.unknown_readings += 1,
                Outcome::UnmatchedTopic => stats.unmatched_topics += 1,
            }
        }

        self.registry.set_last_update(current_timestamp_secs());

        Ok(())
    }

    fn dispatch(&self, topic: &str, payload: &[u8]) -> Result<Outcome, DecodeError> {
        let Some(parsed) = classify_topic(topic) else {
            info!(topic = %topic, "unknown topic");
            return Ok(Outcome::UnmatchedTopic);
        };

        let value = decode_value(payload, PayloadShape::for_kind(parsed.kind()))?;
        debug!(kind = %parsed.kind(), device = %parsed.device(), value, "decoded reading");

        match parsed {
            ParsedTopic::LastActive { device } => {
                let metric = GaugeMetric::NodeLastActive;
                // Milliseconds to seconds.
                self.registry
                    .get_or_create_series(metric, &[device])
                    .set(value / 1000.0);
                Ok(Outcome::Recorded(metric))
            }
            ParsedTopic::SensorMultilevel { device, sensor } => {
                let Some(kind) = SensorKind::from_name(sensor) else {
                    info!(
                        sensor = %device,
                        metric = %sensor,
                        value,
                        "unknown sensor_multilevel sensor reading"
                    );
                    return Ok(Outcome::UnknownReading);
                };

                let metric = GaugeMetric::for_sensor(kind);
                self.registry
                    .get_or_create_series(metric, &[device])
                    .set(value);
                Ok(Outcome::Recorded(metric))
            }
            ParsedTopic::Meter {
                device,
                endpoint,
                code,
            } => {
                let endpoint = endpoint_label(endpoint);
                let Some(kind) = MeterKind::from_code(code) else {
                    info!(
                        sensor = %device,
                        metric = %code,
                        endpoint = %endpoint,
                        value,
                        "unknown meter sensor reading"
                    );
                    return Ok(Outcome::UnknownReading);
                };

                let metric = GaugeMetric::for_meter(kind);
                self.registry
                    .get_or_create_series(metric, &[device, endpoint.as_str()])
                    .set(value);
                Ok(Outcome::Recorded(metric))
            }
        }
    }

    /// Get processor statistics.
    pub fn stats(&self) -> ProcessorStats {
        self.stats.read().clone()
    }
}
