// Sensor service - Lazy broker subscriptions and waiting for sensor values
//
// Each configured sensor moves Uninitialized -> Subscribing -> Active. A
// request for an uninitialized sensor subscribes to its topic and waits on
// a watch channel until the broker delivers a value or the response timeout
// elapses. Sensors nobody has asked about for `unsubscribe_after` are
// unsubscribed when their next message arrives.
use crate::application::error::AppError;
use crate::application::upstream::BrokerClient;
use crate::domain::sensor::{BrokerEvent, SensorReading, SubscriptionStatus};
use crate::infrastructure::config::SensorConfig;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{error, info, warn};

struct SensorSlot {
    topic: String,
    status: SubscriptionStatus,
    last_used: Option<DateTime<Utc>>,
    latest: watch::Sender<Option<SensorReading>>,
}

impl SensorSlot {
    fn new(topic: &str) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            topic: topic.to_string(),
            status: SubscriptionStatus::Uninitialized,
            last_used: None,
            latest,
        }
    }

    fn reset(&mut self) {
        self.status = SubscriptionStatus::Uninitialized;
        self.latest.send_replace(None);
    }
}

pub struct SensorService {
    broker: Arc<dyn BrokerClient>,
    clock: Arc<dyn Clock>,
    sensors: Vec<SensorConfig>,
    states: Mutex<HashMap<String, SensorSlot>>,
    response_timeout: Duration,
    unsubscribe_after: Option<TimeDelta>,
}

impl SensorService {
    /// `unsubscribe_after` of zero disables inactivity eviction.
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        clock: Arc<dyn Clock>,
        sensors: Vec<SensorConfig>,
        response_timeout: Duration,
        unsubscribe_after: Duration,
    ) -> Self {
        Self {
            broker,
            clock,
            sensors,
            states: Mutex::new(HashMap::new()),
            response_timeout,
            unsubscribe_after: TimeDelta::from_std(unsubscribe_after)
                .ok()
                .filter(|window| *window > TimeDelta::zero()),
        }
    }

    pub async fn latest_reading(&self, sensor_id: &str) -> Result<SensorReading, AppError> {
        let config = self
            .sensors
            .iter()
            .find(|sensor| sensor.id == sensor_id)
            .ok_or_else(|| AppError::NotFound(format!("no configuration found for sensor '{sensor_id}'")))?;

        let (mut receiver, subscribe_topic) = {
            let mut states = self.states.lock().await;
            let slot = states
                .entry(sensor_id.to_string())
                .or_insert_with(|| SensorSlot::new(&config.topic));
            slot.last_used = Some(self.clock.utc());
            let needs_subscription = slot.status == SubscriptionStatus::Uninitialized;
            if needs_subscription {
                slot.reset();
                slot.status = SubscriptionStatus::Subscribing;
            }
            (slot.latest.subscribe(), needs_subscription.then(|| slot.topic.clone()))
        };

        if let Some(topic) = subscribe_topic {
            info!("Subscribing to MQTT topic '{}' for sensor '{}'", topic, sensor_id);
            if let Err(e) = self.broker.subscribe(&topic).await {
                if let Some(slot) = self.states.lock().await.get_mut(sensor_id) {
                    slot.reset();
                }
                return Err(e);
            }
        }

        let waited = tokio::time::timeout(self.response_timeout, async {
            receiver.wait_for(Option::is_some).await.map(|value| value.clone())
        })
        .await;

        match waited {
            Ok(Ok(Some(reading))) => Ok(reading),
            _ => Err(AppError::Timeout(format!("sensor '{sensor_id}' data"))),
        }
    }

    pub async fn handle_event(&self, event: BrokerEvent) {
        match event {
            BrokerEvent::Connected => info!("MQTT broker connection established"),
            BrokerEvent::Disconnected => {
                warn!("MQTT broker connection lost, sensors will re-subscribe on next request");
                for slot in self.states.lock().await.values_mut() {
                    slot.status = SubscriptionStatus::Uninitialized;
                }
            }
            BrokerEvent::Message { topic, payload } => self.handle_message(&topic, &payload).await,
        }
    }

    async fn handle_message(&self, topic: &str, payload: &[u8]) {
        let now = self.clock.utc();
        let reading = SensorReading {
            value: String::from_utf8_lossy(payload).into_owned(),
            timestamp: now,
        };

        let mut inactive = Vec::new();
        let unsubscribe = {
            let mut states = self.states.lock().await;
            let mut matched = false;
            for (sensor_id, slot) in states.iter_mut() {
                if slot.status == SubscriptionStatus::Uninitialized || slot.topic != topic {
                    continue;
                }
                matched = true;
                slot.status = SubscriptionStatus::Active;
                slot.latest.send_replace(Some(reading.clone()));

                let idle = slot.last_used.map(|last_used| now - last_used);
                if let (Some(idle), Some(window)) = (idle, self.unsubscribe_after) {
                    if idle > window {
                        slot.reset();
                        inactive.push(sensor_id.clone());
                    }
                }
            }
            if !matched {
                warn!("Received an MQTT message from an unexpected topic: {}", topic);
            }

            // The topic stays subscribed while any sensor on it is still read
            !inactive.is_empty()
                && !states
                    .values()
                    .any(|slot| slot.topic == topic && slot.status != SubscriptionStatus::Uninitialized)
        };

        if !unsubscribe {
            return;
        }
        match self.broker.unsubscribe(topic).await {
            Ok(()) => info!(
                "Unsubscribed from MQTT topic '{}' because sensors {:?} have not been read recently",
                topic, inactive
            ),
            Err(e) => error!("Failed to unsubscribe from MQTT topic '{}': {}", topic, e),
        }
    }

    /// Consume broker events until the connection task goes away.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<BrokerEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
    }

    #[cfg(test)]
    async fn status(&self, sensor_id: &str) -> Option<SubscriptionStatus> {
        self.states.lock().await.get(sensor_id).map(|slot| slot.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_cache::test_clock::MutableClock;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex as StdMutex;
    use tokio::time::Instant;

    const TOPIC: &str = "home/balcony/temperature";

    #[derive(Default)]
    struct FakeBroker {
        subscribed: StdMutex<Vec<String>>,
        unsubscribed: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl BrokerClient for FakeBroker {
        async fn subscribe(&self, topic: &str) -> Result<(), AppError> {
            self.subscribed.lock().unwrap().push(topic.to_string());
            Ok(())
        }

        async fn unsubscribe(&self, topic: &str) -> Result<(), AppError> {
            self.unsubscribed.lock().unwrap().push(topic.to_string());
            Ok(())
        }
    }

    fn sensor(id: &str) -> SensorConfig {
        SensorConfig {
            id: id.to_string(),
            title: Some("Balcony".to_string()),
            topic: TOPIC.to_string(),
            decimals: Some(1),
            unit_postfix: Some("°C".to_string()),
        }
    }

    fn setup() -> (Arc<FakeBroker>, Arc<MutableClock>, SensorService) {
        setup_with(vec![sensor("balcony")])
    }

    fn setup_with(sensors: Vec<SensorConfig>) -> (Arc<FakeBroker>, Arc<MutableClock>, SensorService) {
        let broker = Arc::new(FakeBroker::default());
        let clock = Arc::new(MutableClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
        let service = SensorService::new(
            broker.clone(),
            clock.clone(),
            sensors,
            Duration::from_secs(30),
            Duration::from_secs(60 * 60),
        );
        (broker, clock, service)
    }

    fn message(value: &str) -> BrokerEvent {
        BrokerEvent::Message {
            topic: TOPIC.to_string(),
            payload: value.as_bytes().to_vec(),
        }
    }

    async fn read_with_message(service: &SensorService, value: &str) -> SensorReading {
        let (reading, _) = tokio::join!(service.latest_reading("balcony"), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            service.handle_event(message(value)).await;
        });
        reading.unwrap()
    }

    #[tokio::test]
    async fn test_unknown_sensor_is_not_found() {
        let (broker, _clock, service) = setup();
        let result = service.latest_reading("kitchen").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(broker.subscribed.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_arrival_resolves_request() {
        let (broker, clock, service) = setup();

        let reading = read_with_message(&service, "21.5").await;

        assert_eq!(reading.value, "21.5");
        assert_eq!(reading.timestamp, clock.utc());
        assert_eq!(*broker.subscribed.lock().unwrap(), vec![TOPIC.to_string()]);
        assert_eq!(service.status("balcony").await, Some(SubscriptionStatus::Active));

        // Active sensors answer from the latest value without subscribing again
        let again = service.latest_reading("balcony").await.unwrap();
        assert_eq!(again.value, "21.5");
        assert_eq!(broker.subscribed.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_thirty_seconds() {
        let (_broker, _clock, service) = setup();
        let started = Instant::now();

        let result = service.latest_reading("balcony").await;

        assert!(matches!(result, Err(AppError::Timeout(_))));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(30), "resolved too early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(31), "resolved too late: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_sensor_unsubscribed_on_next_message() {
        let (broker, clock, service) = setup();
        read_with_message(&service, "20.0").await;

        clock.advance(TimeDelta::minutes(30));
        service.handle_event(message("20.1")).await;
        assert!(broker.unsubscribed.lock().unwrap().is_empty());

        clock.advance(TimeDelta::minutes(31));
        service.handle_event(message("20.2")).await;
        assert_eq!(*broker.unsubscribed.lock().unwrap(), vec![TOPIC.to_string()]);
        assert_eq!(service.status("balcony").await, Some(SubscriptionStatus::Uninitialized));

        let reading = read_with_message(&service, "19.8").await;
        assert_eq!(reading.value, "19.8");
        assert_eq!(broker.subscribed.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_topic_stays_subscribed_while_another_sensor_reads_it() {
        let (broker, clock, service) = setup_with(vec![sensor("balcony"), sensor("balcony-display")]);
        let (first, second, _) = tokio::join!(
            service.latest_reading("balcony"),
            service.latest_reading("balcony-display"),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                service.handle_event(message("20.0")).await;
            }
        );
        assert_eq!(first.unwrap().value, "20.0");
        assert_eq!(second.unwrap().value, "20.0");

        // Only the display keeps reading
        clock.advance(TimeDelta::minutes(61));
        service.latest_reading("balcony-display").await.unwrap();
        service.handle_event(message("20.5")).await;

        assert!(broker.unsubscribed.lock().unwrap().is_empty());
        assert_eq!(service.status("balcony").await, Some(SubscriptionStatus::Uninitialized));
        assert_eq!(
            service.status("balcony-display").await,
            Some(SubscriptionStatus::Active)
        );
        assert_eq!(service.latest_reading("balcony-display").await.unwrap().value, "20.5");

        // Once the display goes idle too the topic is dropped and nothing stays active
        clock.advance(TimeDelta::minutes(61));
        service.handle_event(message("20.7")).await;
        assert_eq!(*broker.unsubscribed.lock().unwrap(), vec![TOPIC.to_string()]);
        assert_eq!(
            service.status("balcony-display").await,
            Some(SubscriptionStatus::Uninitialized)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_forces_resubscribe() {
        let (broker, _clock, service) = setup();
        read_with_message(&service, "20.0").await;

        service.handle_event(BrokerEvent::Disconnected).await;
        assert_eq!(service.status("balcony").await, Some(SubscriptionStatus::Uninitialized));

        let reading = read_with_message(&service, "20.4").await;
        assert_eq!(reading.value, "20.4");
        assert_eq!(broker.subscribed.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unexpected_topic_is_ignored() {
        let (_broker, _clock, service) = setup();
        service
            .handle_event(BrokerEvent::Message {
                topic: "elsewhere".to_string(),
                payload: b"1".to_vec(),
            })
            .await;
        assert_eq!(service.status("balcony").await, None);
    }
}
