//! Prometheus exporter for Z-Wave JS readings published over MQTT.
//!
//! Subscribes to the `zwave/#` topic hierarchy, turns node activity,
//! multilevel sensor and electric meter readings into gauges, and serves
//! them on an HTTP `/metrics` endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   MQTT Broker   │────>│   Subscriber    │────>│    Processor    │────>│    Registry     │
//! │    (zwave/#)    │     │  (event loop)   │     │ (classify, map) │     │    (gauges)     │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘     └────────┬────────┘
//!                                                                                  │
//!                                                                         ┌────────v────────┐
//!                                                                         │   HTTP Server   │
//!                                                                         │   (/metrics)    │
//!                                                                         └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! MOSQUITTO_BROKER=tcp://mosquitto:1883 MOSQUITTO_CLIENT_ID=zwave-exporter \
//! MOSQUITTO_USERNAME=exporter MOSQUITTO_PASSWORD=secret \
//! zwave-exporter-prometheus
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod config;
pub mod http;
pub mod mapping;
pub mod processor;
pub mod registry;
pub mod subscriber;

pub use config::{ConfigOverrides, ExporterConfig};
pub use http::HttpServer;
pub use mapping::GaugeMetric;
pub use processor::{MessageProcessor, ProcessorStats};
pub use registry::{MetricRegistry, SharedRegistry};
pub use subscriber::{IncomingMessage, MqttSubscriber, SubscriptionState};
