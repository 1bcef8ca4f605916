//! Seam between the registry and whatever mocking library a suite uses.
//!
//! The core needs exactly two things from a mock: a way to create one for a
//! capability ([`MockFactory`]) and a way to clear its recorded state
//! ([`Resettable`]). Everything else (stubbing, verification) stays with the
//! mocking library.
//!
//! # Example
//!
//! ```rust
//! use isolator_common::{MockFactory, MockHandle, Resettable};
//! use std::sync::{Arc, Mutex};
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! #[derive(Default)]
//! struct MockClock {
//!     stubbed: Mutex<Option<u64>>,
//! }
//!
//! impl Clock for MockClock {
//!     fn now(&self) -> u64 {
//!         self.stubbed.lock().map(|s| s.unwrap_or(0)).unwrap_or(0)
//!     }
//! }
//!
//! impl Resettable for MockClock {
//!     fn reset(&self) {
//!         if let Ok(mut stubbed) = self.stubbed.lock() {
//!             *stubbed = None;
//!         }
//!     }
//! }
//!
//! let factory = || {
//!     let mock = Arc::new(MockClock::default());
//!     MockHandle::<dyn Clock>::new(mock.clone(), mock)
//! };
//! let handle = MockFactory::<dyn Clock>::create(&factory);
//! assert_eq!(handle.instance().now(), 0);
//! ```

use std::fmt;
use std::sync::Arc;

/// Clears recorded interactions and stubbed behaviour of a mock.
pub trait Resettable: Send + Sync {
    /// Return the mock to its freshly created state.
    fn reset(&self);
}

/// A mock viewed both as capability `C` and as something resettable.
///
/// Both views point at the same allocation.
pub struct MockHandle<C: ?Sized> {
    instance: Arc<C>,
    resettable: Arc<dyn Resettable>,
}

impl<C: ?Sized> MockHandle<C> {
    /// Pair a capability view with the resettable view of the same mock.
    pub fn new(instance: Arc<C>, resettable: Arc<dyn Resettable>) -> Self {
        Self {
            instance,
            resettable,
        }
    }

    /// The mock as the capability the service will call.
    pub fn instance(&self) -> &Arc<C> {
        &self.instance
    }

    /// The mock as a resettable object.
    pub fn resettable(&self) -> &Arc<dyn Resettable> {
        &self.resettable
    }
}

impl<M: Resettable + 'static> MockHandle<M> {
    /// Handle for a mock whose capability is its own concrete type.
    pub fn from_mock(mock: Arc<M>) -> Self {
        Self {
            instance: Arc::clone(&mock),
            resettable: mock,
        }
    }
}

impl<C: ?Sized> Clone for MockHandle<C> {
    fn clone(&self) -> Self {
        Self {
            instance: Arc::clone(&self.instance),
            resettable: Arc::clone(&self.resettable),
        }
    }
}

impl<C: ?Sized> fmt::Debug for MockHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockHandle")
            .field("capability", &std::any::type_name::<C>())
            .finish_non_exhaustive()
    }
}

/// Creates fresh mocks of capability `C`.
///
/// Implemented for any `Fn() -> MockHandle<C>` closure, so a suite can plug
/// in whatever mocking library it prefers.
pub trait MockFactory<C: ?Sized>: Send + Sync {
    /// Create a new mock with no recorded state.
    fn create(&self) -> MockHandle<C>;
}

impl<C: ?Sized, F> MockFactory<C> for F
where
    F: Fn() -> MockHandle<C> + Send + Sync,
{
    fn create(&self) -> MockHandle<C> {
        self()
    }
}

/// Ordered set of mocks owned by one test session.
///
/// Used only to drive bulk reset; lookups always go through the registry.
#[derive(Default, Clone)]
pub struct MockSet {
    mocks: Vec<Arc<dyn Resettable>>,
}

impl MockSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a mock for bulk reset.
    pub fn push(&mut self, mock: Arc<dyn Resettable>) {
        self.mocks.push(mock);
    }

    /// Number of tracked mocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mocks.len()
    }

    /// Whether no mocks are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mocks.is_empty()
    }

    /// Iterate over tracked mocks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Resettable>> {
        self.mocks.iter()
    }
}

impl fmt::Debug for MockSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSet")
            .field("len", &self.mocks.len())
            .finish()
    }
}
