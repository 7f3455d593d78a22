//! Object/handler registry
//!
//! Provides [`Registry`], the queryable two-way association between
//! surrogates and the handlers that intercept them.

use crate::value::{HandlerId, MockRef};
use indexmap::IndexMap;
use parking_lot::RwLock;

/// Registry lookup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Surrogate was never registered
    #[error("object not found: {0}")]
    ObjectNotFound(MockRef),

    /// Handler was never registered
    #[error("handler not found: {0}")]
    HandlerNotFound(HandlerId),
}

/// Two-way surrogate/handler association
///
/// Both directions sit behind one lock so a registration is never observed
/// half-applied. Registrations overwrite; there is no per-entry removal.
#[derive(Debug, Default)]
pub struct Registry {
    inner: RwLock<Bindings>,
}

#[derive(Debug, Default)]
struct Bindings {
    object_to_handler: IndexMap<MockRef, HandlerId>,
    handler_to_object: IndexMap<HandlerId, MockRef>,
}

impl Registry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `object` with `handler` in both directions
    pub fn register(&self, object: MockRef, handler: HandlerId) {
        let mut inner = self.inner.write();
        inner.object_to_handler.insert(object, handler);
        inner.handler_to_object.insert(handler, object);
        tracing::trace!(%object, %handler, "registered");
    }

    /// Handler intercepting `object`
    ///
    /// # Errors
    /// [`RegistryError::ObjectNotFound`] if `object` is not registered
    pub fn handler_by_object(&self, object: MockRef) -> Result<HandlerId, RegistryError> {
        self.inner
            .read()
            .object_to_handler
            .get(&object)
            .copied()
            .ok_or(RegistryError::ObjectNotFound(object))
    }

    /// Surrogate intercepted by `handler`
    ///
    /// # Errors
    /// [`RegistryError::HandlerNotFound`] if `handler` is not registered
    pub fn object_by_handler(&self, handler: HandlerId) -> Result<MockRef, RegistryError> {
        self.inner
            .read()
            .handler_to_object
            .get(&handler)
            .copied()
            .ok_or(RegistryError::HandlerNotFound(handler))
    }

    /// Snapshot of registered surrogates
    #[must_use]
    pub fn objects(&self) -> Vec<MockRef> {
        self.inner.read().handler_to_object.values().copied().collect()
    }

    /// Snapshot of registered handlers
    #[must_use]
    pub fn handlers(&self) -> Vec<HandlerId> {
        self.inner.read().object_to_handler.values().copied().collect()
    }

    /// Check if `object` is registered
    #[inline]
    #[must_use]
    pub fn contains_object(&self, object: MockRef) -> bool {
        self.inner.read().object_to_handler.contains_key(&object)
    }

    /// Check if `handler` is registered
    #[inline]
    #[must_use]
    pub fn contains_handler(&self, handler: HandlerId) -> bool {
        self.inner.read().handler_to_object.contains_key(&handler)
    }

    /// Number of registered surrogates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().object_to_handler.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().object_to_handler.is_empty()
    }

    /// Forget every registration
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.object_to_handler.clear();
        inner.handler_to_object.clear();
        tracing::debug!("registry cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_data() -> Registry {
        let registry = Registry::new();
        registry.register(MockRef(1), HandlerId(1));
        registry.register(MockRef(2), HandlerId(2));
        registry
    }

    #[test]
    fn registry_new_empty() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn registry_contains_data() {
        let registry = with_data();
        let objects = registry.objects();
        assert!(objects.contains(&MockRef(1)));
        assert!(objects.contains(&MockRef(2)));
        assert!(!objects.contains(&MockRef(3)));
    }

    #[test]
    fn registry_empty_after_clear() {
        let registry = with_data();
        registry.clear();
        assert!(registry.objects().is_empty());
        assert!(registry.handlers().is_empty());
    }

    #[test]
    fn registry_object_by_handler() {
        let registry = with_data();
        assert_eq!(registry.object_by_handler(HandlerId(1)), Ok(MockRef(1)));
        assert_eq!(registry.object_by_handler(HandlerId(2)), Ok(MockRef(2)));
    }

    #[test]
    fn registry_handler_by_object() {
        let registry = with_data();
        assert_eq!(registry.handler_by_object(MockRef(1)), Ok(HandlerId(1)));
        assert_eq!(registry.handler_by_object(MockRef(2)), Ok(HandlerId(2)));
    }

    #[test]
    fn registry_unknown_handler() {
        let registry = with_data();
        assert_eq!(
            registry.object_by_handler(HandlerId(3)),
            Err(RegistryError::HandlerNotFound(HandlerId(3)))
        );
    }

    #[test]
    fn registry_unknown_object() {
        let registry = with_data();
        assert_eq!(
            registry.handler_by_object(MockRef(3)),
            Err(RegistryError::ObjectNotFound(MockRef(3)))
        );
    }

    #[test]
    fn registry_last_write_wins() {
        let registry = with_data();
        registry.register(MockRef(1), HandlerId(9));
        assert_eq!(registry.handler_by_object(MockRef(1)), Ok(HandlerId(9)));
        assert_eq!(registry.object_by_handler(HandlerId(9)), Ok(MockRef(1)));

        // the replaced handler keeps its stale inverse entry
        assert_eq!(registry.object_by_handler(HandlerId(1)), Ok(MockRef(1)));
        assert_eq!(registry.objects(), vec![MockRef(1), MockRef(2), MockRef(1)]);
        assert_eq!(registry.handlers(), vec![HandlerId(9), HandlerId(2)]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_error_names_key_kind() {
        assert_eq!(
            RegistryError::ObjectNotFound(MockRef(7)).to_string(),
            "object not found: mock#7"
        );
        assert_eq!(
            RegistryError::HandlerNotFound(HandlerId(7)).to_string(),
            "handler not found: handler#7"
        );
    }
}
