//! Integration tests for zwave-common library.

use zwave_common::{
    MeterKind, ParsedTopic, PayloadShape, SensorKind, TopicBuilder, TopicKind, classify_topic,
    decode_float, decode_integer, endpoint_label,
};

#[test]
fn test_topic_building_and_classification() {
    let builder = TopicBuilder::new("bathroom_sensor");

    let topic = builder.last_active();
    let parsed = classify_topic(&topic).expect("lastActive should classify");
    assert_eq!(parsed.kind(), TopicKind::LastActive);
    assert_eq!(parsed.device(), "bathroom_sensor");

    let topic = builder.sensor_multilevel(0, "Humidity");
    let parsed = classify_topic(&topic).expect("sensor should classify");
    match parsed {
        ParsedTopic::SensorMultilevel { device, sensor } => {
            assert_eq!(device, "bathroom_sensor");
            assert_eq!(SensorKind::from_name(sensor), Some(SensorKind::Humidity));
        }
        other => panic!("unexpected classification: {:?}", other),
    }

    let topic = builder.meter(3, MeterKind::Voltage.code());
    match classify_topic(&topic).expect("meter should classify") {
        ParsedTopic::Meter {
            device,
            endpoint,
            code,
        } => {
            assert_eq!(device, "bathroom_sensor");
            assert_eq!(endpoint_label(endpoint), "endpoint_3");
            assert_eq!(MeterKind::from_code(code), Some(MeterKind::Voltage));
        }
        other => panic!("unexpected classification: {:?}", other),
    }
}

#[test]
fn test_classification_selects_payload_shape() {
    let cases = [
        (
            "zwave/bathroom_sensor/lastActive",
            r#"{"time":1711922310802,"value":1711922310552}"#,
        ),
        (
            "zwave/bathroom_sensor/sensor_multilevel/endpoint_0/Air_temperature",
            r#"{"time":1735855076246,"value":25.5}"#,
        ),
        (
            "zwave/sowa_power_outlet/meter/endpoint_0/value/66049",
            r#"{"time":1735906853203,"value":3.395}"#,
        ),
    ];

    for (topic, payload) in cases {
        let parsed = classify_topic(topic).expect("topic should classify");
        match PayloadShape::for_kind(parsed.kind()) {
            PayloadShape::Integer => {
                let reading = decode_integer(payload.as_bytes()).expect("integer payload");
                assert_eq!(reading.value, 1711922310552);
            }
            PayloadShape::Float => {
                let reading = decode_float(payload.as_bytes()).expect("float payload");
                assert!(reading.value == 25.5 || reading.value == 3.395);
            }
        }
    }
}

#[test]
fn test_unrelated_traffic_is_unmatched() {
    let topics = [
        "zwave/_CLIENTS/ZWAVE_GATEWAY-zwave-js-ui/status",
        "zwave/bathroom_sensor/status",
        "zwave/bathroom_sensor/notification/endpoint_0/Home_Security/Motion_sensor_status",
        "zwave/bathroom_sensor/battery/endpoint_0/level",
        "zwave/bathroom_sensor/sensor_multilevel/endpoint_1/Air_temperature",
        "homeassistant/status",
    ];

    for topic in topics {
        assert!(classify_topic(topic).is_none(), "{} should not match", topic);
    }
}

#[test]
fn test_device_names_with_special_characters() {
    let devices = ["living-room", "sensor.01", "node_12", "Küche"];

    for device in devices {
        let topic = TopicBuilder::new(device).last_active();
        let parsed = classify_topic(&topic).unwrap();
        assert_eq!(parsed.device(), device);
    }
}
