//! TTL-cached conversion rate store.
//!
//! Rates are admin-managed database records. Every consumer goes through
//! this store, which keeps a process-wide cache for five minutes (by
//! default) and degrades to a hard-coded table when persistence is empty or
//! unreachable. `get_rates` is infallible by design: a missing rate must
//! degrade to "no reward", never break the surrounding orchestration.
//!
//! Multiple instances each keep their own cache, so cross-instance staleness
//! up to the TTL is expected. Concurrent refreshes race benignly; a
//! redundant reload produces the same table.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tier_rewards_core::{default_rate_table, RateRepository, RateTable};
use tokio::sync::RwLock;

/// Injected time source so cache expiry is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CachedTable {
    rates: RateTable,
    loaded_at: DateTime<Utc>,
}

/// Database-backed conversion rate store with an in-process TTL cache.
pub struct ConversionRateStore {
    repo: Arc<dyn RateRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    cache: RwLock<Option<CachedTable>>,
}

impl ConversionRateStore {
    /// Creates a store with the default 5-minute TTL and system clock.
    #[must_use]
    pub fn new(repo: Arc<dyn RateRepository>) -> Self {
        Self {
            repo,
            clock: Arc::new(SystemClock),
            ttl: Duration::seconds(300),
            cache: RwLock::new(None),
        }
    }

    /// Overrides the cache TTL.
    #[must_use]
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl = Duration::seconds(i64::try_from(ttl_secs).unwrap_or(300));
        self
    }

    /// Overrides the time source. Used by tests to step past the TTL.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the effective rate table.
    ///
    /// Serves the cache while fresh; otherwise reloads from persistence.
    /// An empty table or a storage failure degrades to the hard-coded
    /// defaults (or the last good cache) with a warning, never an error.
    pub async fn get_rates(&self) -> RateTable {
        let now = self.clock.now();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if now - cached.loaded_at < self.ttl {
                    return cached.rates.clone();
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref() {
            if now - cached.loaded_at < self.ttl {
                return cached.rates.clone();
            }
        }

        match self.load_from_repo().await {
            Ok(rates) => {
                let table = rates.clone();
                *cache = Some(CachedTable {
                    rates,
                    loaded_at: now,
                });
                table
            }
            Err(e) => {
                tracing::error!("Failed to load conversion rates: {e:#}");
                // Prefer the last good (stale) table over defaults; do not
                // refresh the timestamp so the next call retries storage.
                cache.as_ref().map_or_else(default_rate_table, |cached| {
                    cached.rates.clone()
                })
            }
        }
    }

    /// Clears the cache so the next `get_rates` reloads from persistence.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn load_from_repo(&self) -> Result<RateTable> {
        let records = self.repo.fetch_all().await?;
        if records.is_empty() {
            tracing::warn!("No conversion rates in storage, using default table");
            return Ok(default_rate_table());
        }
        Ok(records
            .into_iter()
            .map(|r| (r.network, r.rate_to_usd))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tier_rewards_core::{ConversionRate, Network};

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Utc::now()),
            })
        }

        fn advance_secs(&self, secs: i64) {
            let mut now = self.now.lock().unwrap();
            *now += Duration::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    struct CountingRepo {
        fetches: AtomicUsize,
        rates: Vec<ConversionRate>,
        fail: bool,
    }

    impl CountingRepo {
        fn with_rates(rates: Vec<ConversionRate>) -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                rates,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                rates: Vec::new(),
                fail: true,
            })
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateRepository for CountingRepo {
        async fn fetch_all(&self) -> Result<Vec<ConversionRate>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("storage unavailable");
            }
            Ok(self.rates.clone())
        }

        async fn upsert(&self, _network: Network, _rate_to_usd: Decimal) -> Result<()> {
            Ok(())
        }
    }

    fn btc_rate(rate: Decimal) -> ConversionRate {
        ConversionRate {
            network: Network::Btc,
            rate_to_usd: rate,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn second_call_within_ttl_hits_cache() {
        let repo = CountingRepo::with_rates(vec![btc_rate(dec!(50000))]);
        let store = ConversionRateStore::new(repo.clone());

        let first = store.get_rates().await;
        let second = store.get_rates().await;

        assert_eq!(repo.fetch_count(), 1);
        assert_eq!(first, second);
        assert_eq!(first.get(&Network::Btc), Some(&dec!(50000)));
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let repo = CountingRepo::with_rates(vec![btc_rate(dec!(50000))]);
        let store = ConversionRateStore::new(repo.clone());

        store.get_rates().await;
        store.invalidate().await;
        store.get_rates().await;

        assert_eq!(repo.fetch_count(), 2);
    }

    #[tokio::test]
    async fn ttl_expiry_forces_reload() {
        let clock = ManualClock::new();
        let repo = CountingRepo::with_rates(vec![btc_rate(dec!(50000))]);
        let store = ConversionRateStore::new(repo.clone())
            .with_ttl(300)
            .with_clock(clock.clone());

        store.get_rates().await;
        clock.advance_secs(299);
        store.get_rates().await;
        assert_eq!(repo.fetch_count(), 1);

        clock.advance_secs(2);
        store.get_rates().await;
        assert_eq!(repo.fetch_count(), 2);
    }

    #[tokio::test]
    async fn empty_storage_falls_back_to_defaults() {
        let repo = CountingRepo::with_rates(Vec::new());
        let store = ConversionRateStore::new(repo);

        let rates = store.get_rates().await;

        assert_eq!(rates.get(&Network::Btc), Some(&dec!(45000)));
        assert_eq!(rates.get(&Network::Usdt), Some(&dec!(1)));
        assert_eq!(rates.len(), Network::ALL.len());
    }

    #[tokio::test]
    async fn storage_error_falls_back_to_defaults() {
        let repo = CountingRepo::failing();
        let store = ConversionRateStore::new(repo.clone());

        let rates = store.get_rates().await;

        assert_eq!(rates.get(&Network::Eth), Some(&dec!(3000)));
        // No cache was written, so the next call retries storage.
        store.get_rates().await;
        assert_eq!(repo.fetch_count(), 2);
    }
}
