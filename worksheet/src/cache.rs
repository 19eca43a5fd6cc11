//! TTL cache for system-default assumptions
//!
//! Owned by the caller; time comes from an injected [`Clock`].

use chrono::{DateTime, Duration, Utc};
use shared::AssumptionSet;

use crate::client::DefaultsSource;
use crate::error::WorksheetResult;

/// Wall-clock source
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CachedDefaults {
    value: AssumptionSet,
    fetched_at: DateTime<Utc>,
}

pub struct DefaultsCache<C: Clock = SystemClock> {
    clock: C,
    ttl: Duration,
    entry: Option<CachedDefaults>,
}

impl DefaultsCache<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(SystemClock, ttl)
    }
}

impl<C: Clock> DefaultsCache<C> {
    pub fn with_clock(clock: C, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            entry: None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        match &self.entry {
            Some(entry) => {
                let age = self.clock.now() - entry.fetched_at;
                age >= Duration::zero() && age < self.ttl
            }
            None => false,
        }
    }

    /// Cached defaults, only while fresh
    pub fn peek(&self) -> Option<&AssumptionSet> {
        if self.is_fresh() {
            self.entry.as_ref().map(|e| &e.value)
        } else {
            None
        }
    }

    pub fn store(&mut self, value: AssumptionSet) {
        self.entry = Some(CachedDefaults {
            value,
            fetched_at: self.clock.now(),
        });
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Fresh cached defaults, or a refresh from `source`.
    ///
    /// A failed refresh serves the stale value when one exists.
    pub async fn get_or_refresh<S>(&mut self, source: &S) -> WorksheetResult<AssumptionSet>
    where
        S: DefaultsSource + ?Sized,
    {
        if let Some(value) = self.peek() {
            return Ok(value.clone());
        }

        match source.fetch_defaults().await {
            Ok(value) => {
                tracing::debug!("Refreshed assumption defaults");
                self.store(value.clone());
                Ok(value)
            }
            Err(e) => match &self.entry {
                Some(stale) => {
                    tracing::warn!(error = %e, "Defaults refresh failed, serving stale values");
                    Ok(stale.value.clone())
                }
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorksheetError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

    impl ManualClock {
        fn start() -> Self {
            Self(Arc::new(Mutex::new(Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap())))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl DefaultsSource for CountingSource {
        async fn fetch_defaults(&self) -> WorksheetResult<AssumptionSet> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(WorksheetError::Network("offline".into()));
            }
            Ok(AssumptionSet {
                loan_term_years: 30 - n as u32 * 5,
                ..AssumptionSet::default()
            })
        }
    }

    #[tokio::test]
    async fn reuses_value_within_ttl() {
        let clock = ManualClock::start();
        let mut cache = DefaultsCache::with_clock(clock.clone(), Duration::minutes(15));
        let source = CountingSource::new(false);

        let first = cache.get_or_refresh(&source).await.unwrap();
        clock.advance(Duration::minutes(14));
        let second = cache.get_or_refresh(&source).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refreshes_after_ttl() {
        let clock = ManualClock::start();
        let mut cache = DefaultsCache::with_clock(clock.clone(), Duration::minutes(15));
        let source = CountingSource::new(false);

        cache.get_or_refresh(&source).await.unwrap();
        clock.advance(Duration::minutes(15));
        assert!(!cache.is_fresh());

        let refreshed = cache.get_or_refresh(&source).await.unwrap();
        assert_eq!(refreshed.loan_term_years, 25);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn serves_stale_value_when_refresh_fails() {
        let clock = ManualClock::start();
        let mut cache = DefaultsCache::with_clock(clock.clone(), Duration::minutes(15));
        cache.store(AssumptionSet::default());
        clock.advance(Duration::hours(2));

        let value = cache.get_or_refresh(&CountingSource::new(true)).await.unwrap();
        assert_eq!(value, AssumptionSet::default());
        assert!(cache.peek().is_none());
    }

    #[tokio::test]
    async fn empty_cache_surfaces_refresh_error() {
        let mut cache = DefaultsCache::with_clock(ManualClock::start(), Duration::minutes(15));
        let err = cache.get_or_refresh(&CountingSource::new(true)).await.unwrap_err();
        assert_eq!(err.code(), "NETWORK_ERROR");
    }

    #[test]
    fn invalidate_drops_entry() {
        let mut cache = DefaultsCache::with_clock(ManualClock::start(), Duration::minutes(15));
        cache.store(AssumptionSet::default());
        assert!(cache.peek().is_some());
        cache.invalidate();
        assert!(!cache.is_fresh());
    }
}
