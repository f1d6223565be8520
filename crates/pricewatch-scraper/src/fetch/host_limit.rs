use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps simultaneous requests per host across every caller sharing a
/// [`crate::Fetcher`].
#[derive(Debug)]
pub(crate) struct HostLimiter {
    per_host: usize,
    hosts: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl HostLimiter {
    pub(crate) fn new(per_host: usize) -> Self {
        Self {
            per_host: per_host.max(1),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Wait for a request slot on `host`. The slot is released when the
    /// returned permit is dropped.
    pub(crate) async fn acquire(&self, host: &str) -> Option<OwnedSemaphorePermit> {
        let semaphore = {
            let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                hosts
                    .entry(host.to_ascii_lowercase())
                    .or_insert_with(|| Arc::new(Semaphore::new(self.per_host))),
            )
        };
        semaphore.acquire_owned().await.ok()
    }

    #[cfg(test)]
    fn available(&self, host: &str) -> Option<usize> {
        let hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        hosts
            .get(&host.to_ascii_lowercase())
            .map(|s| s.available_permits())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn blocks_once_host_is_saturated() {
        let limiter = HostLimiter::new(2);
        let _a = limiter.acquire("shop.example.com").await.unwrap();
        let _b = limiter.acquire("shop.example.com").await.unwrap();
        assert_eq!(limiter.available("shop.example.com"), Some(0));

        let third =
            tokio::time::timeout(Duration::from_millis(50), limiter.acquire("shop.example.com"))
                .await;
        assert!(third.is_err(), "third permit should wait");
    }

    #[tokio::test]
    async fn hosts_are_independent_and_case_insensitive() {
        let limiter = HostLimiter::new(1);
        let _a = limiter.acquire("Shop.Example.com").await.unwrap();
        assert_eq!(limiter.available("shop.example.com"), Some(0));

        let other = tokio::time::timeout(
            Duration::from_millis(50),
            limiter.acquire("other.example.com"),
        )
        .await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn dropping_permit_frees_slot() {
        let limiter = HostLimiter::new(1);
        let permit = limiter.acquire("shop.example.com").await.unwrap();
        drop(permit);
        assert_eq!(limiter.available("shop.example.com"), Some(1));
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        let limiter = HostLimiter::new(0);
        assert_eq!(limiter.per_host, 1);
    }
}
