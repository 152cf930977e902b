//! Alert rate limiting through a shared last-alert timestamp.
//!
//! Read-then-write without compare-and-swap: two processes checking at the
//! same moment can both be allowed to alert. Store failures fail open.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use vigil_core::epoch_millis;
use vigil_retry::{RetryPolicy, retry};
use vigil_state::KvStore;

/// Store reads and writes: 2 attempts, 300 ms apart.
pub const STORE_RETRY: RetryPolicy = RetryPolicy::attempts(2, Duration::from_millis(300));

/// Permits at most one alert per cooldown window.
pub struct AlertLimiter {
    store: Arc<dyn KvStore>,
    key: String,
    cooldown: Duration,
    retry_policy: RetryPolicy,
}

impl AlertLimiter {
    pub fn new(store: Arc<dyn KvStore>, key: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            cooldown,
            retry_policy: STORE_RETRY,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Decide whether an alert may be sent now, recording it if so.
    pub async fn should_alert(&self) -> bool {
        self.should_alert_at(epoch_millis()).await
    }

    /// [`should_alert`](Self::should_alert) with an explicit clock.
    pub async fn should_alert_at(&self, now_ms: u64) -> bool {
        let cooldown_ms = self.cooldown.as_millis() as u64;
        let key = self.key.as_str();
        let store = &self.store;

        let stored = match retry("alert-store get", self.retry_policy, |_| store.get(key)).await {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "alert store unreadable, allowing alert");
                return true;
            }
        };

        if let Some(raw) = stored {
            match parse_timestamp(&raw) {
                Some(last) if last > now_ms.saturating_add(cooldown_ms) => {
                    warn!(%key, last, now_ms, "last-alert timestamp is far in the future, ignoring it");
                }
                Some(last) if now_ms.saturating_sub(last) <= cooldown_ms => {
                    debug!(%key, last, now_ms, "alert suppressed inside cooldown window");
                    return false;
                }
                Some(_) => {}
                None => {
                    warn!(%key, value = %raw, "unparseable last-alert timestamp, ignoring it");
                }
            }
        }

        let now = now_ms.to_string();
        if let Err(e) = retry("alert-store set", self.retry_policy, |_| store.set(key, &now)).await {
            warn!(%key, error = %e, "failed to record alert timestamp, allowing alert");
        }
        true
    }
}

/// Epoch milliseconds written either as an integer or as a JSON number.
fn parse_timestamp(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<u64>() {
        return Some(ms);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;
    use vigil_state::{MemoryStore, StoreError, StoreResult};

    const MINUTE: u64 = 60_000;
    const COOLDOWN: Duration = Duration::from_secs(15 * 60);
    const T0: u64 = 1_700_000_000_000;

    /// Store double whose reads and/or writes always fail.
    #[derive(Default)]
    struct FailingStore {
        fail_get: bool,
        fail_set: bool,
        gets: AtomicU32,
        sets: AtomicU32,
        stamps: Mutex<Vec<Instant>>,
        inner: MemoryStore,
    }

    #[async_trait]
    impl KvStore for FailingStore {
        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.stamps.lock().unwrap().push(Instant::now());
            if self.fail_get {
                return Err(StoreError::Request("connection reset".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.stamps.lock().unwrap().push(Instant::now());
            if self.fail_set {
                return Err(StoreError::Request("connection reset".to_string()));
            }
            self.inner.set(key, value).await
        }
    }

    fn limiter(store: Arc<dyn KvStore>) -> AlertLimiter {
        AlertLimiter::new(store, "health:last_alert", COOLDOWN)
    }

    #[tokio::test]
    async fn permits_then_suppresses_then_permits_after_window() {
        let store = Arc::new(MemoryStore::new());
        let limiter = limiter(store.clone());

        assert!(limiter.should_alert_at(T0).await);
        assert!(!limiter.should_alert_at(T0 + MINUTE).await);
        assert!(limiter.should_alert_at(T0 + 15 * MINUTE + 1).await);

        let stored = store.get("health:last_alert").await.unwrap();
        assert_eq!(stored, Some((T0 + 15 * MINUTE + 1).to_string()));
    }

    #[tokio::test]
    async fn window_boundary_is_exclusive() {
        let limiter = limiter(Arc::new(MemoryStore::new()));
        assert!(limiter.should_alert_at(T0).await);
        assert!(!limiter.should_alert_at(T0 + 15 * MINUTE).await);
    }

    #[tokio::test]
    async fn suppressed_call_does_not_extend_window() {
        let store = Arc::new(MemoryStore::new());
        let limiter = limiter(store.clone());

        assert!(limiter.should_alert_at(T0).await);
        assert!(!limiter.should_alert_at(T0 + 10 * MINUTE).await);
        assert_eq!(
            store.get("health:last_alert").await.unwrap(),
            Some(T0.to_string())
        );
        assert!(limiter.should_alert_at(T0 + 16 * MINUTE).await);
    }

    #[tokio::test]
    async fn should_alert_uses_wall_clock() {
        let limiter = limiter(Arc::new(MemoryStore::new()));
        assert!(limiter.should_alert().await);
        assert!(!limiter.should_alert().await);
    }

    #[tokio::test(start_paused = true)]
    async fn fails_open_when_store_is_down() {
        let store = Arc::new(FailingStore {
            fail_get: true,
            fail_set: true,
            ..FailingStore::default()
        });
        let limiter = limiter(store.clone());

        assert!(limiter.should_alert_at(T0).await);
        assert!(limiter.should_alert_at(T0 + MINUTE).await);
        // Two attempts per read; no write once the read has failed.
        assert_eq!(store.gets.load(Ordering::SeqCst), 4);
        assert_eq!(store.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn store_calls_retry_once_after_300ms() {
        assert_eq!(STORE_RETRY, RetryPolicy::new(1, Duration::from_millis(300)));

        let store = Arc::new(FailingStore {
            fail_get: true,
            ..FailingStore::default()
        });
        let start = Instant::now();
        assert!(limiter(store.clone()).should_alert_at(T0).await);
        assert_eq!(Instant::now() - start, Duration::from_millis(300));
        let stamps = store.stamps.lock().unwrap().clone();
        assert_eq!(stamps.len(), 2);
        assert_eq!(stamps[1] - stamps[0], Duration::from_millis(300));

        let store = Arc::new(FailingStore {
            fail_set: true,
            ..FailingStore::default()
        });
        assert!(limiter(store.clone()).should_alert_at(T0).await);
        // One read, then two writes 300 ms apart.
        let stamps = store.stamps.lock().unwrap().clone();
        assert_eq!(stamps.len(), 3);
        assert_eq!(stamps[1], stamps[0]);
        assert_eq!(stamps[2] - stamps[1], Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn fails_open_when_write_fails() {
        let store = Arc::new(FailingStore {
            fail_set: true,
            ..FailingStore::default()
        });
        let limiter = limiter(store.clone());

        assert!(limiter.should_alert_at(T0).await);
        assert_eq!(store.sets.load(Ordering::SeqCst), 2);
        // Nothing was recorded, so the next check alerts again.
        assert!(limiter.should_alert_at(T0 + MINUTE).await);
    }

    #[tokio::test]
    async fn garbage_timestamp_is_treated_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set("health:last_alert", "yesterday").await.unwrap();
        assert!(limiter(store).should_alert_at(T0).await);
    }

    #[tokio::test]
    async fn far_future_timestamp_is_ignored_but_small_skew_suppresses() {
        let store = Arc::new(MemoryStore::new());
        let limiter = limiter(store.clone());

        store
            .set("health:last_alert", &(T0 + 60 * MINUTE).to_string())
            .await
            .unwrap();
        assert!(limiter.should_alert_at(T0).await);

        store
            .set("health:last_alert", &(T0 + MINUTE).to_string())
            .await
            .unwrap();
        assert!(!limiter.should_alert_at(T0).await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let prod = AlertLimiter::new(store.clone(), "prod:last_alert", COOLDOWN);
        let staging = AlertLimiter::new(store, "staging:last_alert", COOLDOWN);

        assert!(prod.should_alert_at(T0).await);
        assert!(staging.should_alert_at(T0).await);
        assert!(!prod.should_alert_at(T0 + 1).await);
    }

    #[test]
    fn parses_integer_and_float_timestamps() {
        assert_eq!(parse_timestamp("1700000000000"), Some(T0));
        assert_eq!(parse_timestamp(" 1700000000000\n"), Some(T0));
        assert_eq!(parse_timestamp("1.7e12"), Some(T0));
        assert_eq!(parse_timestamp("-5"), None);
        assert_eq!(parse_timestamp("NaN"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
