//! Decoding of Z-Wave JS value payloads.
//!
//! Z-Wave JS UI publishes values as `{"time": <ms epoch>, "value": <value>}`.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::topic::TopicKind;

/// Expected JSON shape of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{"time": <int>, "value": <int>}`
    Integer,
    /// `{"time": <int>, "value": <float>}`
    Float,
}

impl PayloadShape {
    /// Payload shape published for a topic kind.
    pub fn for_kind(kind: TopicKind) -> Self {
        match kind {
            TopicKind::LastActive => PayloadShape::Integer,
            TopicKind::SensorMultilevel | TopicKind::Meter => PayloadShape::Float,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadShape::Integer => "integer",
            PayloadShape::Float => "float",
        }
    }
}

impl std::fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A timestamped value as published by Z-Wave JS.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Reading<T> {
    /// Unix epoch milliseconds of the update. Informational only.
    pub time: i64,
    pub value: T,
}

/// `lastActive` reading: value is a Unix epoch in milliseconds.
pub type IntegerReading = Reading<i64>;

/// Sensor and meter reading.
pub type FloatReading = Reading<f64>;

/// A payload did not match its expected shape.
#[derive(Debug, Error)]
#[error("invalid {shape} payload: {source}")]
pub struct DecodeError {
    pub shape: PayloadShape,
    #[source]
    pub source: serde_json::Error,
}

fn decode<T: DeserializeOwned>(data: &[u8], shape: PayloadShape) -> Result<T, DecodeError> {
    serde_json::from_slice(data).map_err(|source| DecodeError { shape, source })
}

/// Decode an integer-valued payload.
pub fn decode_integer(data: &[u8]) -> Result<IntegerReading, DecodeError> {
    decode(data, PayloadShape::Integer)
}

/// Decode a float-valued payload. Integer values are accepted.
pub fn decode_float(data: &[u8]) -> Result<FloatReading, DecodeError> {
    decode(data, PayloadShape::Float)
}

/// Decode a payload of the given shape and return its value.
///
/// Integer values are converted exactly up to 2^53, which covers
/// millisecond timestamps.
pub fn decode_value(data: &[u8], shape: PayloadShape) -> Result<f64, DecodeError> {
    match shape {
        PayloadShape::Integer => decode_integer(data).map(|reading| reading.value as f64),
        PayloadShape::Float => decode_float(data).map(|reading| reading.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integer() {
        let reading = decode_integer(br#"{"time":1711922310802,"value":1711922310552}"#).unwrap();

        assert_eq!(reading.time, 1711922310802);
        assert_eq!(reading.value, 1711922310552);
    }

    #[test]
    fn test_decode_float() {
        let reading = decode_float(br#"{"time":1735855076246,"value":25.5}"#).unwrap();

        assert_eq!(reading.time, 1735855076246);
        assert_eq!(reading.value, 25.5);
    }

    #[test]
    fn test_decode_float_accepts_integer_value() {
        let reading = decode_float(br#"{"time":1735855076298,"value":30}"#).unwrap();

        assert_eq!(reading.value, 30.0);
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let reading =
            decode_float(br#"{"time":1735855076298,"value":3.395,"unit":"W"}"#).unwrap();

        assert_eq!(reading.value, 3.395);
    }

    #[test]
    fn test_decode_integer_rejects_float_value() {
        let err = decode_integer(br#"{"time":1711922310802,"value":17.5}"#).unwrap_err();

        assert_eq!(err.shape, PayloadShape::Integer);
        assert!(err.to_string().starts_with("invalid integer payload"));
    }

    #[test]
    fn test_decode_missing_field() {
        assert!(decode_float(br#"{"time":1735855076298}"#).is_err());
        assert!(decode_float(br#"{"value":1.0}"#).is_err());
    }

    #[test]
    fn test_decode_wrong_type() {
        assert!(decode_float(br#"{"time":1735855076298,"value":"warm"}"#).is_err());
        assert!(decode_float(br#"{"time":1735855076298,"value":null}"#).is_err());
    }

    #[test]
    fn test_decode_not_json() {
        let err = decode_float(b"25.5 degrees").unwrap_err();

        assert_eq!(err.shape, PayloadShape::Float);
        assert!(decode_float(b"").is_err());
        assert!(decode_float(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_decode_value_by_shape() {
        let payload = br#"{"time":1711922310802,"value":1711922310552}"#;

        assert_eq!(
            decode_value(payload, PayloadShape::Integer).unwrap(),
            1711922310552.0
        );
        assert_eq!(
            decode_value(br#"{"time":1,"value":3.395}"#, PayloadShape::Float).unwrap(),
            3.395
        );

        let err = decode_value(br#"{"time":1,"value":3.395}"#, PayloadShape::Integer).unwrap_err();
        assert_eq!(err.shape, PayloadShape::Integer);
    }

    #[test]
    fn test_shape_for_kind() {
        assert_eq!(
            PayloadShape::for_kind(TopicKind::LastActive),
            PayloadShape::Integer
        );
        assert_eq!(
            PayloadShape::for_kind(TopicKind::SensorMultilevel),
            PayloadShape::Float
        );
        assert_eq!(PayloadShape::for_kind(TopicKind::Meter), PayloadShape::Float);
    }
}
