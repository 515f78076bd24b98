// Sensor domain models
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Latest value published for a sensor, as received from the broker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Uninitialized,
    /// Subscribe request sent, no value received yet.
    Subscribing,
    Active,
}

/// Events the broker connection feeds into the sensor bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    Connected,
    Message { topic: String, payload: Vec<u8> },
    Disconnected,
}
