//! MQTT subscription loop feeding the message processor.
//!
//! The broker session is persistent (`clean_session = false`), so once the
//! first subscription is acknowledged the broker keeps it across reconnects
//! and the event loop only needs to be polled again.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, Publish, QoS,
    SubscribeReasonCode,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use zwave_common::config::MqttConfig;

use crate::processor::MessageProcessor;

/// Request queue capacity of the MQTT client.
const CLIENT_CAPACITY: usize = 64;

/// Lifecycle of the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Waiting for the broker to accept the connection.
    Connecting,
    /// Subscription acknowledged, message loop not started yet.
    Subscribed,
    /// Messages are being processed.
    Receiving,
    /// Shutdown requested, disconnecting from the broker.
    Disconnecting,
    /// The subscriber has exited.
    Stopped,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::Connecting => "connecting",
            SubscriptionState::Subscribed => "subscribed",
            SubscriptionState::Receiving => "receiving",
            SubscriptionState::Disconnecting => "disconnecting",
            SubscriptionState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message delivered by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl IncomingMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

impl From<Publish> for IncomingMessage {
    fn from(publish: Publish) -> Self {
        Self {
            topic: publish.topic,
            payload: publish.payload.to_vec(),
        }
    }
}

/// Why the message loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The shutdown signal fired.
    Shutdown,
    /// No more messages can arrive.
    ChannelClosed,
}

/// Subscribes to the Z-Wave topic hierarchy and processes every message.
pub struct MqttSubscriber {
    processor: Arc<MessageProcessor>,
    mqtt: MqttConfig,
    state: watch::Sender<SubscriptionState>,
}

impl MqttSubscriber {
    /// Create a new subscriber.
    pub fn new(processor: Arc<MessageProcessor>, mqtt: MqttConfig) -> Self {
        let (state, _) = watch::channel(SubscriptionState::Connecting);
        Self {
            processor,
            mqtt,
            state,
        }
    }

    /// Watch the subscription state.
    pub fn state(&self) -> watch::Receiver<SubscriptionState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: SubscriptionState) {
        debug!(state = %state, "Subscription state changed");
        self.state.send_replace(state);
    }

    fn mqtt_options(&self) -> anyhow::Result<MqttOptions> {
        let address = self.mqtt.broker_address()?;

        let mut options = MqttOptions::new(&self.mqtt.client_id, address.host, address.port);
        options.set_credentials(&self.mqtt.username, &self.mqtt.password);
        options.set_clean_session(false);
        options.set_keep_alive(Duration::from_secs(self.mqtt.keep_alive_secs));

        Ok(options)
    }

    /// Run the subscriber until the shutdown signal is received.
    ///
    /// Failing to connect or subscribe within the configured timeouts is
    /// fatal and returned as an error.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let result = if *shutdown.borrow() {
            Ok(())
        } else {
            self.session(&mut shutdown).await
        };

        self.set_state(SubscriptionState::Stopped);
        info!("Subscriber stopped");
        result
    }

    async fn session(&self, shutdown: &mut watch::Receiver<bool>) -> anyhow::Result<()> {
        self.set_state(SubscriptionState::Connecting);
        let options = self.mqtt_options()?;

        info!(
            broker = %self.mqtt.broker,
            client_id = %self.mqtt.client_id,
            "Connecting to MQTT broker..."
        );
        let (client, mut eventloop) = AsyncClient::new(options, CLIENT_CAPACITY);

        let connect_timeout = Duration::from_secs(self.mqtt.connect_timeout_secs);
        let session_present = tokio::time::timeout(connect_timeout, wait_for_connack(&mut eventloop))
            .await
            .with_context(|| format!("timed out connecting to {}", self.mqtt.broker))??;
        info!(session_present, "Connected to MQTT broker");

        client
            .subscribe(&self.mqtt.topic, QoS::ExactlyOnce)
            .await
            .context("couldn't queue subscription")?;

        // Retained or queued messages can arrive before the SubAck.
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscribe_timeout = Duration::from_secs(self.mqtt.subscribe_timeout_secs);
        tokio::time::timeout(subscribe_timeout, wait_for_suback(&mut eventloop, &tx))
            .await
            .with_context(|| format!("timed out subscribing to {}", self.mqtt.topic))??;
        self.set_state(SubscriptionState::Subscribed);
        info!(topic = %self.mqtt.topic, "Subscribed, waiting for Z-Wave messages...");

        let reconnect_delay = Duration::from_secs(self.mqtt.reconnect_delay_secs);
        let pump = tokio::spawn(pump_events(eventloop, tx, reconnect_delay));

        self.set_state(SubscriptionState::Receiving);
        let exit = process_messages(&self.processor, &mut rx, shutdown).await;

        self.set_state(SubscriptionState::Disconnecting);
        self.disconnect(&client, pump).await;

        match exit {
            LoopExit::Shutdown => Ok(()),
            LoopExit::ChannelClosed => bail!("MQTT event loop stopped unexpectedly"),
        }
    }

    async fn disconnect(&self, client: &AsyncClient, pump: JoinHandle<()>) {
        if let Err(e) = client.disconnect().await {
            debug!(error = %e, "Couldn't queue disconnect");
        }

        let timeout = Duration::from_millis(self.mqtt.disconnect_timeout_ms);
        let abort = pump.abort_handle();
        if tokio::time::timeout(timeout, pump).await.is_err() {
            warn!(
                timeout_ms = self.mqtt.disconnect_timeout_ms,
                "MQTT disconnect timed out"
            );
            abort.abort();
        }
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> anyhow::Result<bool> {
    loop {
        match eventloop
            .poll()
            .await
            .context("couldn't connect to MQTT broker")?
        {
            Event::Incoming(Packet::ConnAck(ack)) => return Ok(ack.session_present),
            event => trace!(?event, "MQTT event before ConnAck"),
        }
    }
}

async fn wait_for_suback(
    eventloop: &mut EventLoop,
    tx: &mpsc::UnboundedSender<IncomingMessage>,
) -> anyhow::Result<()> {
    loop {
        match eventloop
            .poll()
            .await
            .context("MQTT connection failed while subscribing")?
        {
            Event::Incoming(Packet::SubAck(ack)) => {
                if ack
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure))
                {
                    bail!("broker rejected subscription: {:?}", ack.return_codes);
                }
                return Ok(());
            }
            Event::Incoming(Packet::Publish(publish)) => {
                // The receiver is held by the caller for the whole session.
                let _ = tx.send(publish.into());
            }
            event => trace!(?event, "MQTT event before SubAck"),
        }
    }
}

/// Poll the event loop until the client disconnects, forwarding publishes.
async fn pump_events(
    mut eventloop: EventLoop,
    tx: mpsc::UnboundedSender<IncomingMessage>,
    reconnect_delay: Duration,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if tx.send(publish.into()).is_err() {
                    debug!("Message receiver dropped, stopping event loop");
                    break;
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!(
                    session_present = ack.session_present,
                    "Reconnected to MQTT broker"
                );
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("Disconnect sent");
                break;
            }
            Ok(event) => trace!(?event, "MQTT event"),
            Err(ConnectionError::RequestsDone) => break,
            Err(e) => {
                warn!(error = %e, "MQTT connection error, retrying");
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}

/// Process messages one at a time until shutdown or until the sender side
/// is gone. A message that fails to process is logged and skipped.
pub async fn process_messages(
    processor: &MessageProcessor,
    messages: &mut mpsc::UnboundedReceiver<IncomingMessage>,
    shutdown: &mut watch::Receiver<bool>,
) -> LoopExit {
    if *shutdown.borrow() {
        return LoopExit::Shutdown;
    }

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutdown signal received, stopping subscriber");
                    return LoopExit::Shutdown;
                }
            }

            message = messages.recv() => {
                let Some(message) = message else {
                    return LoopExit::ChannelClosed;
                };

                if let Err(e) = processor.process(&message.topic, &message.payload) {
                    error!(
                        topic = %message.topic,
                        payload = %String::from_utf8_lossy(&message.payload),
                        error = %e,
                        "couldn't process mqtt message"
                    );
                }
            }
        }
    }
}
