//! Response cache decorator for SNMP transports.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use log::trace;

use super::SnmpTransport;
use super::config::SnmpVersion;
use super::response::SnmpResponse;
use crate::error::{Error, Result};
use crate::oid::Oid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    Get,
    GetNext,
    Walk,
}

#[derive(Debug, Clone)]
enum Entry {
    One(SnmpResponse),
    Many(Vec<SnmpResponse>),
    NotFound,
}

/// Caches SNMP outcomes per (operation, OID) for the lifetime of one operation.
///
/// Successful responses and "no such object" outcomes are both cached;
/// transport failures are not. The cache is the only shared mutable state
/// inside one device operation and sits behind a read/write lock.
pub struct CachingSnmp {
    inner: Arc<dyn SnmpTransport>,
    entries: RwLock<HashMap<(Op, Oid), Entry>>,
}

impl CachingSnmp {
    /// Wrap `inner` with an empty cache.
    pub fn new(inner: Arc<dyn SnmpTransport>) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, op: Op, oid: &Oid) -> Option<Entry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(op, oid.clone()))
            .cloned()
    }

    fn store(&self, op: Op, oid: Oid, entry: Entry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((op, oid), entry);
    }
}

#[async_trait]
impl SnmpTransport for CachingSnmp {
    async fn get(&self, oids: &[Oid]) -> Result<Vec<SnmpResponse>> {
        let mut cached: Vec<Option<SnmpResponse>> = Vec::with_capacity(oids.len());
        let mut missing = Vec::new();

        for oid in oids {
            match self.lookup(Op::Get, oid) {
                Some(Entry::One(response)) => cached.push(Some(response)),
                _ => {
                    cached.push(None);
                    missing.push(oid.clone());
                }
            }
        }

        if !missing.is_empty() {
            trace!("SNMP cache: {} of {} OIDs not cached", missing.len(), oids.len());
            let fetched = self.inner.get(&missing).await?;
            let mut fetched = fetched.into_iter();
            for (slot, oid) in cached.iter_mut().filter(|s| s.is_none()).zip(&missing) {
                let response = fetched
                    .next()
                    .unwrap_or_else(|| SnmpResponse::no_such_object(oid.clone()));
                self.store(Op::Get, oid.clone(), Entry::One(response.clone()));
                *slot = Some(response);
            }
        }

        Ok(cached.into_iter().flatten().collect())
    }

    async fn walk(&self, root: &Oid) -> Result<Vec<SnmpResponse>> {
        match self.lookup(Op::Walk, root) {
            Some(Entry::Many(responses)) => return Ok(responses),
            Some(Entry::NotFound) => {
                return Err(Error::not_found(format!("walk of {root} returned no objects")));
            }
            _ => {}
        }

        match self.inner.walk(root).await {
            Ok(responses) => {
                self.store(Op::Walk, root.clone(), Entry::Many(responses.clone()));
                Ok(responses)
            }
            Err(e) if e.is_not_found() => {
                self.store(Op::Walk, root.clone(), Entry::NotFound);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_next(&self, oid: &Oid) -> Result<SnmpResponse> {
        if let Some(Entry::One(response)) = self.lookup(Op::GetNext, oid) {
            return Ok(response);
        }
        let response = self.inner.get_next(oid).await?;
        self.store(Op::GetNext, oid.clone(), Entry::One(response.clone()));
        Ok(response)
    }

    fn version(&self) -> SnmpVersion {
        self.inner.version()
    }

    fn max_repetitions(&self) -> u32 {
        self.inner.max_repetitions()
    }

    fn set_max_repetitions(&self, value: u32) {
        self.inner.set_max_repetitions(value);
    }

    fn max_oids(&self) -> usize {
        self.inner.max_oids()
    }

    fn set_max_oids(&self, value: usize) {
        self.inner.set_max_oids(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockSnmp;
    use crate::transport::SnmpValue;

    fn oid(s: &str) -> Oid {
        Oid::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_poisoned_lock_keeps_caching() {
        let mock = Arc::new(MockSnmp::new().with("1.3.6.1.2.1.1.5.0", SnmpValue::string("r1")));
        let cache = CachingSnmp::new(mock.clone());
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _entries = cache.entries.write().unwrap();
            panic!("writer died");
        }));
        assert!(cache.entries.is_poisoned());

        cache.get(&[oid("1.3.6.1.2.1.1.5.0")]).await.unwrap();
        let again = cache.get(&[oid("1.3.6.1.2.1.1.5.0")]).await.unwrap();
        assert_eq!(again[0].value_string(), "r1");
        assert_eq!(mock.get_calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_is_cached_including_missing() {
        let mock = Arc::new(MockSnmp::new().with("1.3.6.1.2.1.1.5.0", SnmpValue::string("r1")));
        let cache = CachingSnmp::new(mock.clone());

        let first = cache
            .get(&[oid("1.3.6.1.2.1.1.5.0"), oid("1.3.6.1.2.1.1.6.0")])
            .await
            .unwrap();
        assert!(first[0].is_successful());
        assert!(!first[1].is_successful());

        let second = cache
            .get(&[oid("1.3.6.1.2.1.1.6.0"), oid("1.3.6.1.2.1.1.5.0")])
            .await
            .unwrap();
        assert_eq!(second[1].value_string(), "r1");
        assert!(!second[0].is_successful());
        assert_eq!(mock.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_partial_hit_fetches_only_missing() {
        let mock = Arc::new(
            MockSnmp::new()
                .with("1.3.6.1.2.1.1.5.0", SnmpValue::string("r1"))
                .with("1.3.6.1.2.1.1.6.0", SnmpValue::string("rack 4")),
        );
        let cache = CachingSnmp::new(mock.clone());

        cache.get(&[oid("1.3.6.1.2.1.1.5.0")]).await.unwrap();
        let both = cache
            .get(&[oid("1.3.6.1.2.1.1.5.0"), oid("1.3.6.1.2.1.1.6.0")])
            .await
            .unwrap();
        assert_eq!(both[0].value_string(), "r1");
        assert_eq!(both[1].value_string(), "rack 4");
        assert_eq!(mock.get_calls(), 2);
        assert_eq!(mock.requested_oids(), 2);
    }

    #[tokio::test]
    async fn test_walk_not_found_is_cached() {
        let mock = Arc::new(MockSnmp::new());
        let cache = CachingSnmp::new(mock.clone());

        assert!(cache.walk(&oid("1.3.6.1.2.1.2.2.1.2")).await.unwrap_err().is_not_found());
        assert!(cache.walk(&oid("1.3.6.1.2.1.2.2.1.2")).await.unwrap_err().is_not_found());
        assert_eq!(mock.walk_calls(), 1);
    }

    #[tokio::test]
    async fn test_network_errors_are_not_cached() {
        let mock = Arc::new(MockSnmp::new().unreachable());
        let cache = CachingSnmp::new(mock.clone());

        assert!(cache.walk(&oid("1.3.6.1.2.1.1")).await.unwrap_err().is_network());
        assert!(cache.walk(&oid("1.3.6.1.2.1.1")).await.unwrap_err().is_network());
        assert_eq!(mock.walk_calls(), 2);
        assert!(cache.is_empty());
    }
}
