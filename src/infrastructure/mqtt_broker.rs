// MQTT broker adapter on rumqttc
use crate::application::error::AppError;
use crate::application::upstream::BrokerClient;
use crate::domain::sensor::BrokerEvent;
use async_trait::async_trait;
use reqwest::Url;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::{mpsc, OnceCell};
use tracing::{info, warn};

const PROVIDER: &str = "MQTT";
const DEFAULT_PORT: u16 = 1883;
const KEEP_ALIVE: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Parse `mqtt://[user:password@]host[:port]` into client options.
pub fn mqtt_options(broker_url: &str, client_id: &str) -> Result<MqttOptions, AppError> {
    let url = Url::parse(broker_url)
        .map_err(|e| AppError::Configuration(format!("invalid MQTT broker URL '{broker_url}': {e}")))?;
    if !matches!(url.scheme(), "mqtt" | "tcp") {
        return Err(AppError::Configuration(format!(
            "unsupported MQTT broker URL scheme '{}'",
            url.scheme()
        )));
    }
    let host = url
        .host_str()
        .ok_or_else(|| AppError::Configuration(format!("MQTT broker URL '{broker_url}' has no host")))?;

    let mut options = MqttOptions::new(client_id, host, url.port().unwrap_or(DEFAULT_PORT));
    options.set_keep_alive(KEEP_ALIVE);
    if !url.username().is_empty() {
        let username = urlencoding::decode(url.username())
            .map_err(|e| AppError::Configuration(format!("invalid MQTT username: {e}")))?;
        let password = urlencoding::decode(url.password().unwrap_or_default())
            .map_err(|e| AppError::Configuration(format!("invalid MQTT password: {e}")))?;
        options.set_credentials(username, password);
    }
    Ok(options)
}

/// Shared broker connection, opened on the first subscription.
pub struct MqttBroker {
    options: MqttOptions,
    events: mpsc::Sender<BrokerEvent>,
    client: OnceCell<AsyncClient>,
}

impl MqttBroker {
    pub fn new(options: MqttOptions, events: mpsc::Sender<BrokerEvent>) -> Self {
        Self {
            options,
            events,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> &AsyncClient {
        self.client
            .get_or_init(|| async {
                let (host, port) = self.options.broker_address();
                info!("Connecting to MQTT broker at {}:{}", host, port);
                let (client, eventloop) = AsyncClient::new(self.options.clone(), REQUEST_CHANNEL_CAPACITY);
                tokio::spawn(forward_events(eventloop, self.events.clone()));
                client
            })
            .await
    }
}

fn translate(event: Event) -> Option<BrokerEvent> {
    match event {
        Event::Incoming(Packet::ConnAck(_)) => Some(BrokerEvent::Connected),
        Event::Incoming(Packet::Publish(publish)) => Some(BrokerEvent::Message {
            topic: publish.topic,
            payload: publish.payload.to_vec(),
        }),
        _ => None,
    }
}

/// Drive the rumqttc event loop and forward what the sensor bridge needs.
/// The event loop reconnects by itself on the next poll after an error.
async fn forward_events(mut eventloop: EventLoop, events: mpsc::Sender<BrokerEvent>) {
    loop {
        let event = match eventloop.poll().await {
            Ok(event) => translate(event),
            Err(e) => {
                warn!("MQTT connection error: {}", e);
                if events.send(BrokerEvent::Disconnected).await.is_err() {
                    break;
                }
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }
        };
        if let Some(event) = event {
            if events.send(event).await.is_err() {
                break;
            }
        }
    }
}

#[async_trait]
impl BrokerClient for MqttBroker {
    async fn subscribe(&self, topic: &str) -> Result<(), AppError> {
        self.client()
            .await
            .subscribe(topic, QoS::AtMostOnce)
            .await
            .map_err(|e| AppError::transport(PROVIDER, "SUBSCRIBE", topic, e))
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), AppError> {
        self.client()
            .await
            .unsubscribe(topic)
            .await
            .map_err(|e| AppError::transport(PROVIDER, "UNSUBSCRIBE", topic, e))
    }
}
