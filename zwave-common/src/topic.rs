//! Z-Wave JS MQTT topic namespace.
//!
//! Z-Wave JS UI publishes value updates under
//! `zwave/<device>/<command_class>/endpoint_<n>/<property>[/<key>]`.
//! Only three shapes carry readings the exporter turns into gauges; every
//! other topic classifies as `None`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Root of the Z-Wave JS topic hierarchy.
pub const TOPIC_PREFIX: &str = "zwave";

/// Wildcard filter covering the whole Z-Wave JS hierarchy.
///
/// # Example
/// ```
/// use zwave_common::topic::all_topics_wildcard;
///
/// assert_eq!(all_topics_wildcard(), "zwave/#");
/// ```
pub fn all_topics_wildcard() -> String {
    format!("{}/#", TOPIC_PREFIX)
}

/// Kind of a recognized topic, which also selects the payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    LastActive,
    SensorMultilevel,
    Meter,
}

impl TopicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicKind::LastActive => "last_active",
            TopicKind::SensorMultilevel => "sensor_multilevel",
            TopicKind::Meter => "meter",
        }
    }
}

impl std::fmt::Display for TopicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifiers extracted from a recognized topic, borrowed from the topic string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTopic<'a> {
    /// `zwave/<device>/lastActive`
    LastActive { device: &'a str },
    /// `zwave/<device>/sensor_multilevel/endpoint_0/<sensor>`
    SensorMultilevel { device: &'a str, sensor: &'a str },
    /// `zwave/<device>/meter/endpoint_<endpoint>/value/<code>`
    Meter {
        device: &'a str,
        endpoint: &'a str,
        code: &'a str,
    },
}

impl<'a> ParsedTopic<'a> {
    pub fn kind(&self) -> TopicKind {
        match self {
            ParsedTopic::LastActive { .. } => TopicKind::LastActive,
            ParsedTopic::SensorMultilevel { .. } => TopicKind::SensorMultilevel,
            ParsedTopic::Meter { .. } => TopicKind::Meter,
        }
    }

    /// Device (node) name, the second topic segment.
    pub fn device(&self) -> &'a str {
        match self {
            ParsedTopic::LastActive { device }
            | ParsedTopic::SensorMultilevel { device, .. }
            | ParsedTopic::Meter { device, .. } => device,
        }
    }
}

type Extractor = for<'t> fn(&Captures<'t>) -> Option<ParsedTopic<'t>>;

/// One classification rule: a whole-topic pattern and its identifier extraction.
struct TopicRule {
    pattern: Regex,
    extract: Extractor,
}

fn extract_last_active<'t>(caps: &Captures<'t>) -> Option<ParsedTopic<'t>> {
    Some(ParsedTopic::LastActive {
        device: caps.get(1)?.as_str(),
    })
}

fn extract_sensor_multilevel<'t>(caps: &Captures<'t>) -> Option<ParsedTopic<'t>> {
    Some(ParsedTopic::SensorMultilevel {
        device: caps.get(1)?.as_str(),
        sensor: caps.get(2)?.as_str(),
    })
}

fn extract_meter<'t>(caps: &Captures<'t>) -> Option<ParsedTopic<'t>> {
    Some(ParsedTopic::Meter {
        device: caps.get(1)?.as_str(),
        endpoint: caps.get(2)?.as_str(),
        code: caps.get(3)?.as_str(),
    })
}

// Evaluated in order, first match wins.
static RULES: Lazy<Vec<TopicRule>> = Lazy::new(|| {
    vec![
        TopicRule {
            pattern: Regex::new(r"^zwave/([^/]+)/lastActive$").unwrap(),
            extract: extract_last_active,
        },
        // Only the root endpoint of multilevel sensors is exported.
        TopicRule {
            pattern: Regex::new(r"^zwave/([^/]+)/sensor_multilevel/endpoint_0/([^/]+)$").unwrap(),
            extract: extract_sensor_multilevel,
        },
        TopicRule {
            pattern: Regex::new(r"^zwave/([^/]+)/meter/endpoint_([0-9]+)/value/([^/]+)$").unwrap(),
            extract: extract_meter,
        },
    ]
});

/// Classify a topic against the known Z-Wave JS reading shapes.
///
/// Returns `None` for any topic that carries no exported reading.
///
/// # Example
/// ```
/// use zwave_common::topic::{ParsedTopic, classify_topic};
///
/// let parsed = classify_topic("zwave/bathroom_sensor/lastActive").unwrap();
/// assert_eq!(parsed, ParsedTopic::LastActive { device: "bathroom_sensor" });
/// assert!(classify_topic("zwave/bathroom_sensor/status").is_none());
/// ```
pub fn classify_topic(topic: &str) -> Option<ParsedTopic<'_>> {
    RULES.iter().find_map(|rule| {
        rule.pattern
            .captures(topic)
            .and_then(|caps| (rule.extract)(&caps))
    })
}

/// Builder for Z-Wave JS reading topics of a single device.
#[derive(Debug, Clone)]
pub struct TopicBuilder {
    prefix: String,
    device: String,
}

impl TopicBuilder {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            prefix: TOPIC_PREFIX.to_string(),
            device: device.into(),
        }
    }

    /// `zwave/<device>/lastActive`
    pub fn last_active(&self) -> String {
        format!("{}/{}/lastActive", self.prefix, self.device)
    }

    /// `zwave/<device>/sensor_multilevel/endpoint_<endpoint>/<sensor>`
    pub fn sensor_multilevel(&self, endpoint: u32, sensor: &str) -> String {
        format!(
            "{}/{}/sensor_multilevel/endpoint_{}/{}",
            self.prefix, self.device, endpoint, sensor
        )
    }

    /// `zwave/<device>/meter/endpoint_<endpoint>/value/<code>`
    pub fn meter(&self, endpoint: u32, code: &str) -> String {
        format!(
            "{}/{}/meter/endpoint_{}/value/{}",
            self.prefix, self.device, endpoint, code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_last_active() {
        let parsed = classify_topic("zwave/bathroom_sensor/lastActive").unwrap();

        assert_eq!(parsed.kind(), TopicKind::LastActive);
        assert_eq!(parsed.device(), "bathroom_sensor");
    }

    #[test]
    fn test_classify_sensor_multilevel() {
        let parsed =
            classify_topic("zwave/bathroom_sensor/sensor_multilevel/endpoint_0/Air_temperature")
                .unwrap();

        assert_eq!(
            parsed,
            ParsedTopic::SensorMultilevel {
                device: "bathroom_sensor",
                sensor: "Air_temperature",
            }
        );
    }

    #[test]
    fn test_classify_sensor_other_endpoint_unmatched() {
        assert!(
            classify_topic("zwave/bathroom_sensor/sensor_multilevel/endpoint_1/Air_temperature")
                .is_none()
        );
    }

    #[test]
    fn test_classify_meter() {
        let parsed = classify_topic("zwave/sowa_power_outlet/meter/endpoint_2/value/66049").unwrap();

        assert_eq!(
            parsed,
            ParsedTopic::Meter {
                device: "sowa_power_outlet",
                endpoint: "2",
                code: "66049",
            }
        );
        assert_eq!(parsed.kind(), TopicKind::Meter);
    }

    #[test]
    fn test_classify_meter_non_numeric_endpoint_unmatched() {
        assert!(classify_topic("zwave/outlet/meter/endpoint_x/value/66049").is_none());
    }

    #[test]
    fn test_classify_unmatched() {
        assert!(classify_topic("zwave/bathroom_sensor/status").is_none());
        assert!(classify_topic("zwave/bathroom_sensor/lastActive/extra").is_none());
        assert!(classify_topic("other/bathroom_sensor/lastActive").is_none());
        assert!(classify_topic("zwave//lastActive").is_none());
        assert!(classify_topic("prefix/zwave/bathroom_sensor/lastActive").is_none());
        assert!(classify_topic("").is_none());
    }

    #[test]
    fn test_device_cannot_contain_slash() {
        assert!(classify_topic("zwave/floor/bathroom/lastActive").is_none());
    }

    #[test]
    fn test_topic_builder() {
        let builder = TopicBuilder::new("kitchen");

        assert_eq!(builder.last_active(), "zwave/kitchen/lastActive");
        assert_eq!(
            builder.sensor_multilevel(0, "Humidity"),
            "zwave/kitchen/sensor_multilevel/endpoint_0/Humidity"
        );
        assert_eq!(
            builder.meter(1, "66561"),
            "zwave/kitchen/meter/endpoint_1/value/66561"
        );
    }

    #[test]
    fn test_all_topics_wildcard() {
        assert_eq!(all_topics_wildcard(), "zwave/#");
    }
}
