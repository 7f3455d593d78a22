//! Return-value and instance factories
//!
//! A factory decides what an intercepted call or construction yields. The
//! built-in policies fabricate child surrogates: [`UniqueFactory`] derives a
//! new one every time, [`SingletonFactory`] derives one and keeps returning
//! it. Any closure with the right signature is a factory too, see
//! [`from_fn`].

use crate::error::MockError;
use crate::handler::Handler;
use crate::heap::MockHeap;
use objmock_core::{HandlerId, MockRef, Value};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Policy producing the result of a call or construction
pub trait ValueFactory: Send + Sync {
    /// Produce a value for `arguments` on behalf of the handler in `cx`
    ///
    /// # Errors
    /// Whatever the policy wants to surface to the caller of the trap
    fn produce(&self, arguments: &[Value], cx: &mut FactoryContext<'_>) -> Result<Value, MockError>;
}

impl<F> ValueFactory for F
where
    F: Fn(&[Value], &mut FactoryContext<'_>) -> Result<Value, MockError> + Send + Sync,
{
    fn produce(&self, arguments: &[Value], cx: &mut FactoryContext<'_>) -> Result<Value, MockError> {
        self(arguments, cx)
    }
}

/// Factory shared between a handler and the children derived from it
pub type SharedFactory = Arc<dyn ValueFactory>;

/// Wrap a closure as a shared factory
pub fn from_fn<F>(f: F) -> SharedFactory
where
    F: Fn(&[Value], &mut FactoryContext<'_>) -> Result<Value, MockError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Factory returning a clone of `value` on every invocation
#[must_use]
pub fn fixed(value: Value) -> SharedFactory {
    from_fn(move |_, _| Ok(value.clone()))
}

/// Factory failing with `message` on every invocation
pub fn failing(message: impl Into<String>) -> SharedFactory {
    let message = message.into();
    from_fn(move |_, _| Err(MockError::factory(message.clone())))
}

/// Access to the heap granted to a factory while its trap runs
///
/// The heap is already locked by the trap, so factories must work through
/// this context rather than through [`Mock`](crate::Mock) handles.
pub struct FactoryContext<'a> {
    heap: &'a mut MockHeap,
    handler: HandlerId,
}

impl<'a> FactoryContext<'a> {
    pub(crate) fn new(heap: &'a mut MockHeap, handler: HandlerId) -> Self {
        Self { heap, handler }
    }

    /// Handler whose trap invoked the factory
    #[inline]
    #[must_use]
    pub fn handler_id(&self) -> HandlerId {
        self.handler
    }

    /// State of the invoking handler
    ///
    /// # Errors
    /// [`MockError::UnknownHandler`] if the handler is not in the heap
    pub fn handler(&self) -> Result<&Handler, MockError> {
        self.heap.handler(self.handler)
    }

    /// Check if `obj` lives in the heap the trap runs on
    #[inline]
    #[must_use]
    pub fn owns(&self, obj: MockRef) -> bool {
        self.heap.owns(obj)
    }

    /// Derive a child of the invoking handler, bind and register it
    ///
    /// # Errors
    /// Heap lookup or allocation failures
    pub fn derive_child(&mut self) -> Result<MockRef, MockError> {
        self.heap.derive_child(self.handler)
    }

    /// Whole heap, for factories that delegate to other surrogates
    pub fn heap(&mut self) -> &mut MockHeap {
        self.heap
    }
}

impl fmt::Debug for FactoryContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryContext")
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

/// Factory returning a newly derived child surrogate on every invocation
#[derive(Debug, Default, Clone, Copy)]
pub struct UniqueFactory;

impl UniqueFactory {
    /// Create shared instance
    #[must_use]
    pub fn shared() -> SharedFactory {
        Arc::new(Self)
    }
}

impl ValueFactory for UniqueFactory {
    fn produce(&self, _arguments: &[Value], cx: &mut FactoryContext<'_>) -> Result<Value, MockError> {
        cx.derive_child().map(Value::Mock)
    }
}

/// Factory deriving one child surrogate and returning it forever after
///
/// Arguments are ignored. The cache lives in the factory, so every handler
/// sharing the factory gets the same surrogate. A factory shared between
/// heaps keeps one surrogate per heap.
#[derive(Debug, Default)]
pub struct SingletonFactory {
    cached: Mutex<Vec<MockRef>>,
}

impl SingletonFactory {
    /// Create factory with an empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create shared instance
    #[must_use]
    pub fn shared() -> SharedFactory {
        Arc::new(Self::new())
    }

    /// Surrogates returned so far, one per heap
    #[must_use]
    pub fn cached(&self) -> Vec<MockRef> {
        self.cached.lock().clone()
    }
}

impl ValueFactory for SingletonFactory {
    fn produce(&self, _arguments: &[Value], cx: &mut FactoryContext<'_>) -> Result<Value, MockError> {
        let mut cached = self.cached.lock();
        if let Some(obj) = cached.iter().copied().find(|obj| cx.owns(*obj)) {
            return Ok(Value::Mock(obj));
        }
        let obj = cx.derive_child()?;
        cached.push(obj);
        Ok(Value::Mock(obj))
    }
}

/// Built-in factory policy, as named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactoryPolicy {
    /// [`UniqueFactory`]
    Unique,
    /// [`SingletonFactory`]
    Singleton,
}

impl FactoryPolicy {
    /// Build a fresh factory for this policy
    #[must_use]
    pub fn build(self) -> SharedFactory {
        match self {
            Self::Unique => UniqueFactory::shared(),
            Self::Singleton => SingletonFactory::shared(),
        }
    }
}
