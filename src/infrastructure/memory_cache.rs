// In-memory TTL cache used for raw provider responses and parsed results
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;

struct Slot<V> {
    value: Arc<V>,
    expires_at: DateTime<Utc>,
}

/// Key/value cache where every entry carries its own time-to-live.
/// Expired entries are dropped on access and by [`TtlCache::purge_expired`].
pub struct TtlCache<V> {
    entries: DashMap<String, Slot<V>>,
    clock: Arc<dyn Clock>,
}

impl<V> TtlCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let now = self.clock.utc();
        self.entries.remove_if(key, |_, slot| slot.expires_at <= now);
        self.entries.get(key).map(|slot| Arc::clone(&slot.value))
    }

    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) -> Arc<V> {
        let value = Arc::new(value);
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = self
            .clock
            .utc()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(
            key.into(),
            Slot {
                value: Arc::clone(&value),
                expires_at,
            },
        );
        value
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.utc();
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use chrono::{DateTime, Local, TimeDelta, Utc};
    use mockable::Clock;
    use std::sync::Mutex;

    /// Wall clock that only moves when told to.
    pub struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        pub fn advance(&self, delta: TimeDelta) {
            *self.0.lock().unwrap() += delta;
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::MutableClock;
    use super::*;
    use chrono::TimeZone;

    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()))
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let clock = clock();
        let cache = TtlCache::new(clock.clone());
        cache.insert("key", 7, Duration::from_secs(60));

        clock.advance(TimeDelta::seconds(59));
        assert_eq!(cache.get("key").as_deref(), Some(&7));

        clock.advance(TimeDelta::seconds(1));
        assert_eq!(cache.get("key"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_insert_replaces_value_and_ttl() {
        let clock = clock();
        let cache = TtlCache::new(clock.clone());
        cache.insert("key", "old", Duration::from_secs(10));
        cache.insert("key", "new", Duration::from_secs(100));

        clock.advance(TimeDelta::seconds(50));
        assert_eq!(cache.get("key").as_deref(), Some(&"new"));
    }

    #[test]
    fn test_purge_expired() {
        let clock = clock();
        let cache = TtlCache::new(clock.clone());
        cache.insert("short", 1, Duration::from_secs(5));
        cache.insert("long", 2, Duration::from_secs(500));

        clock.advance(TimeDelta::seconds(10));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("long").is_some());
    }
}
