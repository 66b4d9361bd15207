//! Time-bounded memoization of forecast responses.

use async_trait::async_trait;
use std::{collections::HashMap, time::Duration};
use tokio::{sync::Mutex, time::Instant};

use crate::{
    error::ForecastError,
    forecast::{ForecastSource, RawForecastPayload, location_param},
    model::{Coordinates, Units},
};

type CacheKey = (String, Units);

#[derive(Debug)]
struct Entry {
    payload: RawForecastPayload,
    stored_at: Instant,
}

/// Wraps a forecast source and replays successful responses for the same
/// location and units while they are younger than `ttl`.
#[derive(Debug)]
pub struct CachedForecast<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl<S: ForecastSource> CachedForecast<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self { inner, ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of stored responses, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl<S: ForecastSource> ForecastSource for CachedForecast<S> {
    async fn fetch(
        &self,
        coords: &Coordinates,
        units: Units,
    ) -> Result<RawForecastPayload, ForecastError> {
        if self.ttl.is_zero() {
            return self.inner.fetch(coords, units).await;
        }

        let key = (location_param(coords), units);

        {
            let mut entries = self.entries.lock().await;
            let fresh = entries
                .get(&key)
                .filter(|entry| entry.stored_at.elapsed() < self.ttl)
                .map(|entry| entry.payload.clone());

            if let Some(payload) = fresh {
                tracing::debug!(location = %key.0, "forecast served from cache");
                return Ok(payload);
            }
            entries.remove(&key);
        }

        let payload = self.inner.fetch(coords, units).await?;

        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        entries.insert(key, Entry { payload: payload.clone(), stored_at: Instant::now() });

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ForecastSource for CountingSource {
        async fn fetch(
            &self,
            _coords: &Coordinates,
            units: Units,
        ) -> Result<RawForecastPayload, ForecastError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ForecastError::RateLimited);
            }
            Ok(RawForecastPayload::new(format!("{units}-{n}")))
        }
    }

    fn london() -> Coordinates {
        Coordinates { latitude: 51.51, longitude: -0.13, display_name: "London".into() }
    }

    fn oslo() -> Coordinates {
        Coordinates { latitude: 59.91, longitude: 10.75, display_name: "Oslo".into() }
    }

    #[tokio::test(start_paused = true)]
    async fn replays_within_ttl_and_refetches_after() {
        let cache = CachedForecast::new(CountingSource::default(), Duration::from_secs(600));

        let first = cache.fetch(&london(), Units::Metric).await.unwrap();
        let second = cache.fetch(&london(), Units::Metric).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(601)).await;

        let third = cache.fetch(&london(), Units::Metric).await.unwrap();
        assert_eq!(third.as_str(), "metric-1");
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_dropped_on_insert() {
        let cache = CachedForecast::new(CountingSource::default(), Duration::from_secs(600));

        cache.fetch(&london(), Units::Metric).await.unwrap();
        cache.fetch(&london(), Units::Imperial).await.unwrap();
        assert_eq!(cache.len().await, 2);

        tokio::time::advance(Duration::from_secs(601)).await;

        cache.fetch(&oslo(), Units::Metric).await.unwrap();
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn units_are_part_of_the_key() {
        let cache = CachedForecast::new(CountingSource::default(), Duration::from_secs(600));

        cache.fetch(&london(), Units::Metric).await.unwrap();
        let imperial = cache.fetch(&london(), Units::Imperial).await.unwrap();
        assert_eq!(imperial.as_str(), "imperial-1");
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let source = CountingSource { fail: true, ..Default::default() };
        let cache = CachedForecast::new(source, Duration::from_secs(600));

        assert!(cache.fetch(&london(), Units::Metric).await.is_err());
        assert!(cache.fetch(&london(), Units::Metric).await.is_err());
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let cache = CachedForecast::new(CountingSource::default(), Duration::ZERO);

        cache.fetch(&london(), Units::Metric).await.unwrap();
        cache.fetch(&london(), Units::Metric).await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clear_drops_entries() {
        let cache = CachedForecast::new(CountingSource::default(), Duration::from_secs(600));

        cache.fetch(&london(), Units::Metric).await.unwrap();
        cache.clear().await;
        cache.fetch(&london(), Units::Metric).await.unwrap();
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    }
}
