//! Concurrent registry mapping `(session token, capability)` to mocks.
//!
//! One registry instance is shared (as `Arc<MockRegistry>`) by the test
//! driver, which registers mocks, and by the request routing layer, which
//! looks them up while serving a tagged request.
//!
//! # Locking
//!
//! Two levels of `RwLock`:
//! - the session map, taken for read on every operation and for write only
//!   when a session first appears or is evicted
//! - one entry map per session, so work under different tokens never
//!   contends on the same lock
//!
//! Poisoned locks are recovered rather than propagated; every critical
//! section leaves the maps consistent.

use crate::error::RegistryError;
use crate::mock::{MockHandle, MockSet, Resettable};
use crate::types::{CapabilityId, SessionToken};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

struct RegistryEntry {
    /// Holds an `Arc<C>` for the capability `C` of the key.
    instance: Arc<dyn Any + Send + Sync>,
    resettable: Arc<dyn Resettable>,
}

struct SessionSlot {
    entries: RwLock<HashMap<CapabilityId, RegistryEntry>>,
    /// Milliseconds since the registry epoch of the last register or lookup.
    last_access_ms: AtomicU64,
}

impl SessionSlot {
    fn new(now_ms: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            last_access_ms: AtomicU64::new(now_ms),
        }
    }

    fn touch(&self, now_ms: u64) {
        self.last_access_ms.fetch_max(now_ms, Ordering::Relaxed);
    }
}

/// Shared store of mocks, isolated per session token.
pub struct MockRegistry {
    sessions: RwLock<HashMap<SessionToken, Arc<SessionSlot>>>,
    epoch: Instant,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            epoch: Instant::now(),
        }
    }

    /// Declare a session before any mock is registered under it.
    ///
    /// Returns `false` if the token is already live. Two test sessions
    /// sharing a token would see each other's mocks, so this is logged as a
    /// warning; the existing session is kept.
    pub fn open_session(&self, token: &SessionToken) -> bool {
        let now = self.now_ms();
        let mut sessions = write(&self.sessions);

        if let Some(slot) = sessions.get(token) {
            slot.touch(now);
            warn!(target: "isolator.registry", token = %token, "Session token already in use");
            return false;
        }

        sessions.insert(token.clone(), Arc::new(SessionSlot::new(now)));
        debug!(target: "isolator.registry", token = %token, "Session opened");
        true
    }

    /// Register `handle` as the mock for capability `C` under `token`.
    ///
    /// Replaces any mock previously registered for the same pair.
    pub fn register<C>(&self, token: &SessionToken, handle: &MockHandle<C>)
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let capability = CapabilityId::of::<C>();
        let entry = RegistryEntry {
            instance: Arc::new(Arc::clone(handle.instance())),
            resettable: Arc::clone(handle.resettable()),
        };

        let replaced = self.insert_entry(token, capability, entry);

        if replaced {
            debug!(
                target: "isolator.registry",
                token = %token,
                capability = %capability,
                "Mock replaced"
            );
        } else {
            debug!(
                target: "isolator.registry",
                token = %token,
                capability = %capability,
                "Mock registered"
            );
        }
    }

    /// Look up the mock registered for capability `C` under `token`.
    ///
    /// Returns the same `Arc` that was registered, not a copy.
    ///
    /// # Errors
    ///
    /// - `RegistryError::LookupMiss` - nothing is registered for the pair
    pub fn lookup<C>(&self, token: &SessionToken) -> Result<Arc<C>, RegistryError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let capability = CapabilityId::of::<C>();
        let miss = || RegistryError::LookupMiss {
            token: token.clone(),
            capability,
        };

        let slot = self.slot(token).ok_or_else(miss)?;
        slot.touch(self.now_ms());

        let entries = read(&slot.entries);
        entries
            .get(&capability)
            .and_then(|entry| entry.instance.downcast_ref::<Arc<C>>())
            .cloned()
            .ok_or_else(miss)
    }

    /// Reset every mock in `mocks` without removing any registry entry.
    pub fn reset(&self, mocks: &MockSet) {
        for mock in mocks.iter() {
            mock.reset();
        }
        debug!(target: "isolator.registry", count = mocks.len(), "Mocks reset");
    }

    /// Reset every mock registered under `token`. Returns how many were reset.
    pub fn reset_session(&self, token: &SessionToken) -> usize {
        let Some(slot) = self.slot(token) else {
            return 0;
        };

        // Collect first so mock code never runs under the entry lock.
        let mocks: Vec<Arc<dyn Resettable>> = read(&slot.entries)
            .values()
            .map(|entry| Arc::clone(&entry.resettable))
            .collect();

        for mock in &mocks {
            mock.reset();
        }
        mocks.len()
    }

    /// Remove a session and all of its mocks. Returns how many mocks were dropped.
    #[instrument(skip_all, fields(token = %token))]
    pub fn evict(&self, token: &SessionToken) -> usize {
        let removed = write(&self.sessions).remove(token);

        match removed {
            Some(slot) => {
                let count = read(&slot.entries).len();
                debug!(target: "isolator.registry", token = %token, mocks = count, "Session evicted");
                count
            }
            None => 0,
        }
    }

    /// Evict sessions with no register or lookup for longer than `max_idle`.
    ///
    /// Returns the number of sessions evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = self.now_ms();
        let max_idle_ms = u64::try_from(max_idle.as_millis()).unwrap_or(u64::MAX);

        let mut sessions = write(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, slot| {
            now.saturating_sub(slot.last_access_ms.load(Ordering::Relaxed)) <= max_idle_ms
        });
        let evicted = before - sessions.len();

        if evicted > 0 {
            info!(
                target: "isolator.registry",
                evicted,
                remaining = sessions.len(),
                "Evicted idle sessions"
            );
        }
        evicted
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        read(&self.sessions).len()
    }

    /// Whether `token` has a live session.
    #[must_use]
    pub fn contains_session(&self, token: &SessionToken) -> bool {
        read(&self.sessions).contains_key(token)
    }

    /// Number of mocks registered under `token`.
    #[must_use]
    pub fn mock_count(&self, token: &SessionToken) -> usize {
        self.slot(token)
            .map_or(0, |slot| read(&slot.entries).len())
    }

    fn slot(&self, token: &SessionToken) -> Option<Arc<SessionSlot>> {
        read(&self.sessions).get(token).cloned()
    }

    /// Insert `entry` into the live slot for `token`, creating the slot if needed.
    ///
    /// The session map guard is held across the insert so an eviction can
    /// never detach the slot between lookup and write.
    fn insert_entry(
        &self,
        token: &SessionToken,
        capability: CapabilityId,
        entry: RegistryEntry,
    ) -> bool {
        let now = self.now_ms();

        {
            let sessions = read(&self.sessions);
            if let Some(slot) = sessions.get(token) {
                slot.touch(now);
                return write(&slot.entries).insert(capability, entry).is_some();
            }
        }

        let mut sessions = write(&self.sessions);
        let slot = sessions
            .entry(token.clone())
            .or_insert_with(|| Arc::new(SessionSlot::new(now)));
        slot.touch(now);
        let replaced = write(&slot.entries).insert(capability, entry).is_some();
        replaced
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl std::fmt::Debug for MockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRegistry")
            .field("sessions", &self.session_count())
            .finish_non_exhaustive()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    trait Greeter: Send + Sync {
        fn greet(&self, name: &str) -> String;
    }

    trait Ledger: Send + Sync {
        fn balance(&self) -> i64;
    }

    #[derive(Default)]
    struct MockGreeter {
        reply: Mutex<Option<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockGreeter {
        fn stub(&self, reply: &str) {
            *self.reply.lock().unwrap() = Some(reply.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Greeter for MockGreeter {
        fn greet(&self, name: &str) -> String {
            self.calls.lock().unwrap().push(name.to_string());
            self.reply.lock().unwrap().clone().unwrap_or_default()
        }
    }

    impl Resettable for MockGreeter {
        fn reset(&self) {
            *self.reply.lock().unwrap() = None;
            self.calls.lock().unwrap().clear();
        }
    }

    struct FixedLedger(i64);

    impl Ledger for FixedLedger {
        fn balance(&self) -> i64 {
            self.0
        }
    }

    impl Resettable for FixedLedger {
        fn reset(&self) {}
    }

    fn greeter() -> (Arc<MockGreeter>, MockHandle<dyn Greeter>) {
        let mock = Arc::new(MockGreeter::default());
        let handle = MockHandle::<dyn Greeter>::new(mock.clone(), mock.clone());
        (mock, handle)
    }

    fn token(raw: &str) -> SessionToken {
        SessionToken::parse(raw).unwrap()
    }

    #[test]
    fn test_lookup_returns_registered_instance() {
        let registry = MockRegistry::new();
        let tok = token("tokA");
        let (_, handle) = greeter();

        registry.register(&tok, &handle);
        let found = registry.lookup::<dyn Greeter>(&tok).unwrap();

        assert!(Arc::ptr_eq(&found, handle.instance()));
    }

    #[test]
    fn test_other_token_cannot_see_mock() {
        let registry = MockRegistry::new();
        let (_, handle) = greeter();
        registry.register(&token("tokA"), &handle);

        let result = registry.lookup::<dyn Greeter>(&token("tokB"));

        assert_eq!(
            result.err(),
            Some(RegistryError::LookupMiss {
                token: token("tokB"),
                capability: CapabilityId::of::<dyn Greeter>(),
            })
        );
    }

    #[test]
    fn test_unregistered_capability_misses_in_live_session() {
        let registry = MockRegistry::new();
        let tok = token("tokA");
        let (_, handle) = greeter();
        registry.register(&tok, &handle);

        assert!(matches!(
            registry.lookup::<dyn Ledger>(&tok),
            Err(RegistryError::LookupMiss { .. })
        ));
    }

    #[test]
    fn test_reregistration_replaces_previous_mock() {
        let registry = MockRegistry::new();
        let tok = token("tokA");
        let (_, first) = greeter();
        let (_, second) = greeter();

        registry.register(&tok, &first);
        registry.register(&tok, &second);

        let found = registry.lookup::<dyn Greeter>(&tok).unwrap();
        assert!(Arc::ptr_eq(&found, second.instance()));
        assert!(!Arc::ptr_eq(&found, first.instance()));
        assert_eq!(registry.mock_count(&tok), 1);
    }

    #[test]
    fn test_capabilities_are_independent_under_one_token() {
        let registry = MockRegistry::new();
        let tok = token("tokA");
        let (_, greeter_handle) = greeter();
        let ledger = Arc::new(FixedLedger(42));

        registry.register(&tok, &greeter_handle);
        registry.register(&tok, &MockHandle::<dyn Ledger>::new(ledger.clone(), ledger));

        assert_eq!(registry.lookup::<dyn Ledger>(&tok).unwrap().balance(), 42);
        assert!(registry.lookup::<dyn Greeter>(&tok).is_ok());
        assert_eq!(registry.mock_count(&tok), 2);
    }

    #[test]
    fn test_reset_clears_only_given_mocks() {
        let registry = MockRegistry::new();
        let (mock_a, handle_a) = greeter();
        let (mock_b, handle_b) = greeter();
        registry.register(&token("tokA"), &handle_a);
        registry.register(&token("tokB"), &handle_b);

        mock_a.stub("hello A");
        mock_b.stub("hello B");
        mock_a.greet("alice");
        mock_b.greet("bob");

        let mut set = MockSet::new();
        set.push(handle_a.resettable().clone());
        registry.reset(&set);

        assert!(mock_a.calls().is_empty());
        assert_eq!(mock_a.greet("x"), "");
        assert_eq!(mock_b.calls(), vec!["bob".to_string()]);
        assert_eq!(mock_b.greet("y"), "hello B");

        // Entries survive a reset
        assert!(registry.lookup::<dyn Greeter>(&token("tokA")).is_ok());
    }

    #[test]
    fn test_reset_session_resets_all_mocks_of_token() {
        let registry = MockRegistry::new();
        let tok = token("tokA");
        let (mock, handle) = greeter();
        registry.register(&tok, &handle);
        mock.greet("alice");

        assert_eq!(registry.reset_session(&tok), 1);
        assert!(mock.calls().is_empty());
        assert_eq!(registry.reset_session(&token("unknown")), 0);
    }

    #[test]
    fn test_open_session_detects_reuse() {
        let registry = MockRegistry::new();
        let tok = token("tokA");

        assert!(registry.open_session(&tok));
        assert!(!registry.open_session(&tok));
        assert!(registry.contains_session(&tok));
        assert_eq!(registry.session_count(), 1);
    }

    #[test]
    fn test_evict_removes_session() {
        let registry = MockRegistry::new();
        let tok = token("tokA");
        let (_, handle) = greeter();
        registry.register(&tok, &handle);

        assert_eq!(registry.evict(&tok), 1);
        assert!(!registry.contains_session(&tok));
        assert!(registry.lookup::<dyn Greeter>(&tok).is_err());
        assert_eq!(registry.evict(&tok), 0);
    }

    #[test]
    fn test_evict_idle_keeps_recent_sessions() {
        let registry = MockRegistry::new();
        let (_, handle) = greeter();
        registry.register(&token("tokA"), &handle);

        assert_eq!(registry.evict_idle(Duration::from_secs(60)), 0);
        assert_eq!(registry.session_count(), 1);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(registry.evict_idle(Duration::from_millis(5)), 1);
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn test_concurrent_sessions_stay_isolated() {
        let registry = Arc::new(MockRegistry::new());

        std::thread::scope(|scope| {
            for i in 0..16 {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    let tok = token(&format!("tok-{i}"));
                    let expected = format!("reply-{i}");
                    for _ in 0..50 {
                        let (mock, handle) = greeter();
                        mock.stub(&expected);
                        registry.register(&tok, &handle);
                        let found = registry.lookup::<dyn Greeter>(&tok).unwrap();
                        assert_eq!(found.greet("x"), expected);
                    }
                });
            }
        });

        assert_eq!(registry.session_count(), 16);
        for i in 0..16 {
            assert_eq!(registry.mock_count(&token(&format!("tok-{i}"))), 1);
        }
    }

    #[test]
    fn test_register_on_stale_session_survives_concurrent_sweep() {
        use std::sync::atomic::AtomicBool;

        let registry = Arc::new(MockRegistry::new());
        let ttl = Duration::from_millis(200);
        let tokens: Vec<SessionToken> = (0..200).map(|i| token(&format!("stale-{i}"))).collect();
        for tok in &tokens {
            registry.open_session(tok);
        }
        std::thread::sleep(ttl + Duration::from_millis(50));

        let stop = AtomicBool::new(false);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                while !stop.load(Ordering::Relaxed) {
                    registry.evict_idle(ttl);
                }
            });

            let lost: Vec<&SessionToken> = tokens
                .iter()
                .filter(|tok| {
                    let (_, handle) = greeter();
                    registry.register(tok, &handle);
                    // A just-touched session is never idle
                    registry.lookup::<dyn Greeter>(tok).is_err()
                })
                .collect();
            stop.store(true, Ordering::Relaxed);

            assert!(lost.is_empty(), "mocks lost to the sweeper: {lost:?}");
        });
    }
}
