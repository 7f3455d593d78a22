//! Entry point: building root mocks and finding deep children
//!
//! A [`MockSpace`] owns one heap and a current registry. Every [`Mock`]
//! handed out is a surrogate in that heap plus a shared pointer to it, so the
//! handle can be cloned and moved freely.

use crate::config::MockConfig;
use crate::error::MockError;
use crate::factory::SharedFactory;
use crate::handler::{Handler, HandlerOptions, IgnoredProperties, Target};
use crate::heap::MockHeap;
use objmock_core::{EmulatedPrototype, HandlerId, MockRef, Registry, Report, TypeTag, Value};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard, RwLock};
use std::fmt;
use std::sync::Arc;

/// Per-mock overrides of the space defaults
///
/// Every field left `None` takes the value from the space's
/// [`MockConfig`] (or, for the registry, the space's current registry).
#[derive(Default, Clone)]
pub struct MockOptions {
    auto_create: Option<bool>,
    emulated_prototype: Option<EmulatedPrototype>,
    instance_factory: Option<SharedFactory>,
    return_value_factory: Option<SharedFactory>,
    registry: Option<Arc<Registry>>,
    target: Option<Target>,
    parent: Option<HandlerId>,
    ignored_properties: Option<IgnoredProperties>,
}

impl MockOptions {
    /// Options with every field defaulted
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With auto-create flag
    #[must_use]
    pub fn auto_create(mut self, enabled: bool) -> Self {
        self.auto_create = Some(enabled);
        self
    }

    /// With emulated prototype
    #[must_use]
    pub fn emulated_prototype(mut self, tag: impl Into<TypeTag>) -> Self {
        self.emulated_prototype = Some(EmulatedPrototype::Tag(tag.into()));
        self
    }

    /// With instance factory
    #[must_use]
    pub fn instance_factory(mut self, factory: SharedFactory) -> Self {
        self.instance_factory = Some(factory);
        self
    }

    /// With return-value factory
    #[must_use]
    pub fn return_value_factory(mut self, factory: SharedFactory) -> Self {
        self.return_value_factory = Some(factory);
        self
    }

    /// With registry
    #[must_use]
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// With backing target
    #[must_use]
    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// With parent handler
    #[must_use]
    pub fn parent(mut self, parent: HandlerId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// With ignored property names
    #[must_use]
    pub fn ignored_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_properties = Some(Arc::new(names.into_iter().map(Into::into).collect()));
        self
    }
}

impl fmt::Debug for MockOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockOptions")
            .field("auto_create", &self.auto_create)
            .field("emulated_prototype", &self.emulated_prototype)
            .field("target", &self.target)
            .field("parent", &self.parent)
            .field("ignored_properties", &self.ignored_properties)
            .finish_non_exhaustive()
    }
}

/// Owner of a mock heap and its current registry
pub struct MockSpace {
    config: MockConfig,
    heap: Arc<Mutex<MockHeap>>,
    registry: RwLock<Arc<Registry>>,
}

impl MockSpace {
    /// Create space with default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create space with custom configuration
    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            heap: Arc::new(Mutex::new(MockHeap::new())),
            registry: RwLock::new(Arc::new(Registry::new())),
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Registry used by new mocks and path lookups
    #[must_use]
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry.read())
    }

    /// Swap the registry used by new mocks and path lookups
    ///
    /// Mocks created earlier keep registering their children in the registry
    /// they were created with.
    pub fn set_registry(&self, registry: Arc<Registry>) {
        *self.registry.write() = registry;
        tracing::debug!("registry swapped");
    }

    /// Create a root mock
    ///
    /// # Errors
    /// [`MockError::HeapExhausted`]
    pub fn mock(&self, options: MockOptions) -> Result<Mock, MockError> {
        let handler_options = self.extract_handler_options(options);
        let object = self.heap.lock().spawn(handler_options)?;
        tracing::debug!(%object, "created mock");
        Ok(Mock {
            heap: Arc::clone(&self.heap),
            object,
        })
    }

    /// Handle for a surrogate of this space
    ///
    /// # Errors
    /// [`MockError::UnknownObject`] if `object` is not from this space
    pub fn wrap(&self, object: MockRef) -> Result<Mock, MockError> {
        self.heap.lock().resolve(object)?;
        Ok(Mock {
            heap: Arc::clone(&self.heap),
            object,
        })
    }

    /// Locked view of a handler
    ///
    /// The heap stays locked while the guard lives; drop it before touching
    /// any [`Mock`] of this space.
    ///
    /// # Errors
    /// [`MockError::UnknownHandler`]
    pub fn handler(&self, id: HandlerId) -> Result<MappedMutexGuard<'_, Handler>, MockError> {
        MutexGuard::try_map(self.heap.lock(), |heap| heap.handler_mut(id).ok())
            .map_err(|_| MockError::UnknownHandler(id))
    }

    /// Handler of the descendant of `root` found by following a dotted path
    ///
    /// Each segment is read straight from the current target, without
    /// interception, and must hold a surrogate known to the current registry.
    ///
    /// # Errors
    /// [`MockError::UnknownObject`] if `root` belongs to another space,
    /// [`MockError::Registry`] if `root` is not registered,
    /// [`MockError::PathNotMocked`] naming the path up to the first segment
    /// that does not resolve
    pub fn deep_child_handler(&self, root: &Mock, path: &str) -> Result<HandlerId, MockError> {
        if !Arc::ptr_eq(&root.heap, &self.heap) {
            return Err(MockError::UnknownObject(root.object));
        }
        let registry = self.registry();
        let heap = self.heap.lock();
        let mut current = registry.handler_by_object(root.object)?;
        let mut traversed: Vec<&str> = Vec::new();

        for segment in path.split('.') {
            traversed.push(segment);
            current = heap
                .handler(current)?
                .target()
                .get(segment)
                .and_then(Value::as_mock)
                .and_then(|child| registry.handler_by_object(child).ok())
                .ok_or_else(|| MockError::PathNotMocked {
                    path: traversed.join("."),
                })?;
        }

        Ok(current)
    }

    fn extract_handler_options(&self, options: MockOptions) -> HandlerOptions {
        let registry = options.registry.unwrap_or_else(|| self.registry());
        let return_value_factory = options
            .return_value_factory
            .unwrap_or_else(|| self.config.return_value_policy.build());
        let instance_factory = options
            .instance_factory
            .unwrap_or_else(|| self.config.instance_policy.build());

        let mut handler_options = HandlerOptions::new(registry, return_value_factory, instance_factory)
            .with_target(options.target.unwrap_or_else(|| Target::new(self.config.root_kind)))
            .with_emulated_prototype(options.emulated_prototype.unwrap_or_default())
            .with_auto_create(options.auto_create.unwrap_or(self.config.auto_create))
            .with_ignored_properties(
                options
                    .ignored_properties
                    .unwrap_or_else(|| Arc::new(self.config.ignored_properties.clone())),
            );
        if let Some(parent) = options.parent {
            handler_options = handler_options.with_parent(parent);
        }
        handler_options
    }
}

impl Default for MockSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSpace")
            .field("config", &self.config)
            .field("handlers", &self.heap.lock().len())
            .finish_non_exhaustive()
    }
}

/// A surrogate object
///
/// Every method is a trapped operation on the surrogate's handler, except the
/// accessors at the bottom which only inspect it. Methods lock the heap for
/// their duration and must not be called from inside a factory.
#[derive(Clone)]
pub struct Mock {
    heap: Arc<Mutex<MockHeap>>,
    object: MockRef,
}

impl Mock {
    /// Surrogate handle
    #[inline]
    #[must_use]
    pub fn object(&self) -> MockRef {
        self.object
    }

    /// Read `property`
    ///
    /// # Errors
    /// Heap allocation failures while auto-creating
    pub fn get(&self, property: &str) -> Result<Value, MockError> {
        let mut heap = self.heap.lock();
        let id = heap.resolve(self.object)?;
        heap.get(id, property)
    }

    /// Read `property` and wrap the surrogate it holds
    ///
    /// # Errors
    /// [`MockError::NotAMock`] if the property holds a plain value
    pub fn child(&self, property: &str) -> Result<Mock, MockError> {
        let value = self.get(property)?;
        self.expect_mock(property, &value)
    }

    /// Write `property`
    ///
    /// # Errors
    /// [`MockError::UnknownObject`]
    pub fn set(&self, property: &str, value: impl Into<Value>) -> Result<bool, MockError> {
        let mut heap = self.heap.lock();
        let id = heap.resolve(self.object)?;
        heap.set(id, property, value.into())
    }

    /// Remove `property`
    ///
    /// # Errors
    /// [`MockError::UnknownObject`]
    pub fn delete(&self, property: &str) -> Result<bool, MockError> {
        let mut heap = self.heap.lock();
        let id = heap.resolve(self.object)?;
        heap.delete(id, property)
    }

    /// Call the surrogate
    ///
    /// # Errors
    /// Failures raised by the return-value factory
    pub fn call(&self, arguments: Vec<Value>) -> Result<Value, MockError> {
        let mut heap = self.heap.lock();
        let id = heap.resolve(self.object)?;
        heap.apply(id, arguments)
    }

    /// Call the surrogate and wrap the surrogate it returns
    ///
    /// # Errors
    /// Factory failures, or [`MockError::NotAMock`] for a plain result
    pub fn call_mock(&self, arguments: Vec<Value>) -> Result<Mock, MockError> {
        let value = self.call(arguments)?;
        self.expect_mock("()", &value)
    }

    /// Construct the surrogate
    ///
    /// # Errors
    /// Failures raised by the instance factory
    pub fn construct(&self, arguments: Vec<Value>) -> Result<Value, MockError> {
        let mut heap = self.heap.lock();
        let id = heap.resolve(self.object)?;
        heap.construct(id, arguments)
    }

    /// Type the surrogate presents itself as
    ///
    /// # Errors
    /// [`MockError::UnknownObject`]
    pub fn prototype_of(&self) -> Result<TypeTag, MockError> {
        let heap = self.heap.lock();
        heap.prototype_of(heap.resolve(self.object)?)
    }

    /// Check if the surrogate presents itself as `tag`
    ///
    /// # Errors
    /// [`MockError::UnknownObject`]
    pub fn instance_of(&self, tag: &TypeTag) -> Result<bool, MockError> {
        Ok(self.prototype_of()? == *tag)
    }

    /// Handler intercepting this surrogate
    ///
    /// Works after the registry was cleared.
    ///
    /// # Errors
    /// [`MockError::UnknownObject`]
    pub fn handler_id(&self) -> Result<HandlerId, MockError> {
        self.heap.lock().resolve(self.object)
    }

    /// Snapshot of the access history
    ///
    /// # Errors
    /// [`MockError::UnknownObject`]
    pub fn report(&self) -> Result<Report, MockError> {
        self.with_handler(|h| h.report().clone())
    }

    /// Run `f` on this surrogate's handler, e.g. to swap a factory
    ///
    /// `f` runs with the heap locked and must not use any [`Mock`].
    ///
    /// # Errors
    /// [`MockError::UnknownObject`]
    pub fn with_handler<R>(&self, f: impl FnOnce(&mut Handler) -> R) -> Result<R, MockError> {
        let mut heap = self.heap.lock();
        let id = heap.resolve(self.object)?;
        Ok(f(heap.handler_mut(id)?))
    }

    /// Handle for another surrogate of the same heap held in `value`
    #[must_use]
    pub fn wrap(&self, value: &Value) -> Option<Mock> {
        let object = value.as_mock()?;
        self.heap.lock().resolve(object).ok()?;
        Some(Mock {
            heap: Arc::clone(&self.heap),
            object,
        })
    }

    fn expect_mock(&self, property: &str, value: &Value) -> Result<Mock, MockError> {
        self.wrap(value).ok_or_else(|| MockError::NotAMock {
            property: property.to_string(),
            found: value.type_name(),
        })
    }
}

impl PartialEq for Mock {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object && Arc::ptr_eq(&self.heap, &other.heap)
    }
}

impl Eq for Mock {}

// Handles are unique across heaps, so a matching ref is this very surrogate.
impl PartialEq<Value> for Mock {
    fn eq(&self, other: &Value) -> bool {
        other.as_mock() == Some(self.object)
    }
}

impl From<&Mock> for Value {
    fn from(mock: &Mock) -> Self {
        Value::Mock(mock.object)
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mock").field(&self.object).finish()
    }
}

impl fmt::Display for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.object)
    }
}
