//! Arena of handlers and surrogates
//!
//! [`MockHeap`] owns every [`Handler`] and binds each surrogate to the
//! handler that intercepts it, the way a proxy object carries its handler
//! slot. This binding is what trapped operations dispatch through; the
//! [`Registry`](objmock_core::Registry) is the separate, queryable mapping and
//! may be cleared without breaking any surrogate.
//!
//! Handles are drawn from process-wide counters, so surrogates and handlers of
//! different heaps never share an id and one registry can serve many heaps.

use crate::error::MockError;
use crate::factory::FactoryContext;
use crate::handler::{Handler, HandlerOptions};
use indexmap::IndexMap;
use objmock_core::{Call, Construct, HandlerId, MockRef, PropertyGet, TypeTag, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_HANDLER: AtomicU32 = AtomicU32::new(0);
static NEXT_OBJECT: AtomicU32 = AtomicU32::new(0);

fn next_id(counter: &AtomicU32) -> Result<u32, MockError> {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
        .map_err(|_| MockError::HeapExhausted)
}

/// Arena of handlers and surrogate bindings
#[derive(Debug, Default)]
pub struct MockHeap {
    handlers: IndexMap<HandlerId, Handler>,
    /// `bindings[surrogate]` is the handler intercepting that surrogate
    bindings: IndexMap<MockRef, HandlerId>,
}

impl MockHeap {
    /// Create empty heap
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handler
    ///
    /// # Errors
    /// [`MockError::HeapExhausted`] when ids run out
    pub fn alloc_handler(&mut self, options: HandlerOptions) -> Result<HandlerId, MockError> {
        let id = HandlerId(next_id(&NEXT_HANDLER)?);
        self.handlers.insert(id, Handler::new(id, options));
        Ok(id)
    }

    /// Create a surrogate intercepted by `handler`
    ///
    /// # Errors
    /// [`MockError::UnknownHandler`] or [`MockError::HeapExhausted`]
    pub fn bind(&mut self, handler: HandlerId) -> Result<MockRef, MockError> {
        self.handler(handler)?;
        let obj = MockRef(next_id(&NEXT_OBJECT)?);
        self.bindings.insert(obj, handler);
        Ok(obj)
    }

    /// Handler bound to `obj`
    ///
    /// # Errors
    /// [`MockError::UnknownObject`] if `obj` was not created by this heap
    pub fn resolve(&self, obj: MockRef) -> Result<HandlerId, MockError> {
        self.bindings
            .get(&obj)
            .copied()
            .ok_or(MockError::UnknownObject(obj))
    }

    /// Check if `obj` was created by this heap
    #[inline]
    #[must_use]
    pub fn owns(&self, obj: MockRef) -> bool {
        self.bindings.contains_key(&obj)
    }

    /// Handler by id
    ///
    /// # Errors
    /// [`MockError::UnknownHandler`] if `id` was not allocated by this heap
    pub fn handler(&self, id: HandlerId) -> Result<&Handler, MockError> {
        self.handlers.get(&id).ok_or(MockError::UnknownHandler(id))
    }

    /// Mutable handler by id
    ///
    /// # Errors
    /// [`MockError::UnknownHandler`] if `id` was not allocated by this heap
    pub fn handler_mut(&mut self, id: HandlerId) -> Result<&mut Handler, MockError> {
        self.handlers.get_mut(&id).ok_or(MockError::UnknownHandler(id))
    }

    /// Number of handlers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handler was allocated
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Allocate a handler, bind a surrogate to it and register the pair
    ///
    /// # Errors
    /// Allocation failures
    pub fn spawn(&mut self, options: HandlerOptions) -> Result<MockRef, MockError> {
        let registry = Arc::clone(&options.registry);
        let id = self.alloc_handler(options)?;
        let obj = self.bind(id)?;
        registry.register(obj, id);
        Ok(obj)
    }

    /// Derive a registered child surrogate of `parent`
    ///
    /// # Errors
    /// Unknown parent or allocation failures
    pub fn derive_child(&mut self, parent: HandlerId) -> Result<MockRef, MockError> {
        let options = self.handler(parent)?.make_child();
        let obj = self.spawn(options)?;
        tracing::debug!(%parent, child = %obj, "derived child");
        Ok(obj)
    }

    // -- traps -------------------------------------------------------------

    /// Trap for property reads
    ///
    /// Missing properties are filled with a fresh child surrogate first when
    /// auto-create is on; `was_defined` still describes the state before.
    ///
    /// # Errors
    /// Unknown handler or allocation failures
    pub fn get(&mut self, id: HandlerId, property: &str) -> Result<Value, MockError> {
        let handler = self.handler(id)?;
        if handler.is_ignored(property) {
            return Ok(handler.target().read(property));
        }

        let was_defined = handler.target().contains(property);
        if !was_defined && handler.auto_create() {
            let child = self.derive_child(id)?;
            self.handler_mut(id)?
                .target_mut()
                .insert(property, Value::Mock(child));
        }

        let handler = self.handler_mut(id)?;
        let value = handler.target().read(property);
        handler.report_mut().add_access_record(PropertyGet {
            property: property.to_string(),
            value: value.clone(),
            was_defined,
        });
        tracing::trace!(handler = %id, property, was_defined, "get");
        Ok(value)
    }

    /// Trap for property writes
    ///
    /// # Errors
    /// [`MockError::UnknownHandler`]
    pub fn set(&mut self, id: HandlerId, property: &str, value: Value) -> Result<bool, MockError> {
        Ok(self.handler_mut(id)?.set(property, value))
    }

    /// Trap for property removal
    ///
    /// # Errors
    /// [`MockError::UnknownHandler`]
    pub fn delete(&mut self, id: HandlerId, property: &str) -> Result<bool, MockError> {
        Ok(self.handler_mut(id)?.delete(property))
    }

    /// Trap for calls; the result comes from the return-value factory
    ///
    /// # Errors
    /// Unknown handler, or whatever the factory fails with (then nothing is
    /// recorded)
    pub fn apply(&mut self, id: HandlerId, arguments: Vec<Value>) -> Result<Value, MockError> {
        let factory = Arc::clone(self.handler(id)?.return_value_factory());
        let return_value = factory.produce(&arguments, &mut FactoryContext::new(self, id))?;
        self.handler_mut(id)?.report_mut().add_access_record(Call {
            arguments,
            return_value: return_value.clone(),
        });
        tracing::trace!(handler = %id, "apply");
        Ok(return_value)
    }

    /// Trap for constructions; the instance comes from the instance factory
    ///
    /// # Errors
    /// Unknown handler, or whatever the factory fails with (then nothing is
    /// recorded)
    pub fn construct(&mut self, id: HandlerId, arguments: Vec<Value>) -> Result<Value, MockError> {
        let factory = Arc::clone(self.handler(id)?.instance_factory());
        let instance = factory.produce(&arguments, &mut FactoryContext::new(self, id))?;
        self.handler_mut(id)?
            .report_mut()
            .add_access_record(Construct { arguments });
        tracing::trace!(handler = %id, "construct");
        Ok(instance)
    }

    /// Trap for prototype queries
    ///
    /// # Errors
    /// [`MockError::UnknownHandler`]
    pub fn prototype_of(&self, id: HandlerId) -> Result<TypeTag, MockError> {
        Ok(self.handler(id)?.prototype_of())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{fixed, from_fn, SingletonFactory, UniqueFactory};
    use objmock_core::{AccessRecord, EmulatedPrototype, Registry, TypeTag};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn setup() -> (MockHeap, HandlerId, Arc<Registry>) {
        let registry = Arc::new(Registry::new());
        let mut heap = MockHeap::new();
        let options = HandlerOptions::new(
            Arc::clone(&registry),
            SingletonFactory::shared(),
            UniqueFactory::shared(),
        );
        let id = heap.alloc_handler(options).unwrap();
        (heap, id, registry)
    }

    #[test]
    fn get_missing_without_auto_create_is_undefined() {
        let (mut heap, id, _) = setup();
        heap.handler_mut(id).unwrap().set_auto_create(false);
        let v = heap.get(id, "bar").unwrap();
        assert_eq!(v, Value::Undefined);
        assert_eq!(
            heap.handler(id).unwrap().report().history(),
            &[AccessRecord::Get(PropertyGet {
                property: "bar".into(),
                value: Value::Undefined,
                was_defined: false,
            })]
        );
    }

    #[test]
    fn get_existing_returns_value() {
        let (mut heap, id, _) = setup();
        heap.handler_mut(id)
            .unwrap()
            .target_mut()
            .insert("bar", Value::Float(0.25));
        let v = heap.get(id, "bar").unwrap();
        assert_eq!(v, Value::Float(0.25));
        assert_eq!(
            heap.handler(id).unwrap().report().property_gets()[0],
            &PropertyGet {
                property: "bar".into(),
                value: Value::Float(0.25),
                was_defined: true,
            }
        );
    }

    #[test]
    fn get_missing_auto_creates_registered_child() {
        let (mut heap, id, registry) = setup();
        let v = heap.get(id, "child").unwrap();
        let obj = v.as_mock().unwrap();
        let child = registry.handler_by_object(obj).unwrap();
        assert_eq!(registry.object_by_handler(child), Ok(obj));
        assert_eq!(heap.handler(child).unwrap().parent(), Some(id));

        let record = heap.handler(id).unwrap().report().property_gets()[0].clone();
        assert!(!record.was_defined);
        assert_eq!(record.value, v);
    }

    #[test]
    fn auto_create_is_idempotent() {
        let (mut heap, id, registry) = setup();
        let first = heap.get(id, "child").unwrap();
        let second = heap.get(id, "child").unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        let gets = heap.handler(id).unwrap().report().property_gets();
        assert!(!gets[0].was_defined);
        assert!(gets[1].was_defined);
    }

    #[test]
    fn ignored_property_is_not_intercepted() {
        let (mut heap, id, registry) = setup();
        let ignored: BTreeSet<String> = ["jasmineToString".to_string()].into();
        let options = heap.handler(id).unwrap().make_child().with_ignored_properties(Arc::new(ignored));
        let other = heap.alloc_handler(options).unwrap();

        let v = heap.get(other, "jasmineToString").unwrap();
        assert_eq!(v, Value::Undefined);
        assert!(heap.handler(other).unwrap().report().is_empty());
        assert!(!heap.handler(other).unwrap().target().contains("jasmineToString"));
        assert!(registry.is_empty());
    }

    #[test]
    fn apply_uses_factory_and_records() {
        let (mut heap, id, _) = setup();
        heap.handler_mut(id)
            .unwrap()
            .set_return_value_factory(from_fn(move |args, cx| {
                assert_eq!(cx.handler_id(), id);
                Ok(Value::List(args.to_vec()))
            }));
        let args = vec![Value::from("foo"), Value::from("bar")];
        let result = heap.apply(id, args.clone()).unwrap();
        assert_eq!(result, Value::List(args.clone()));
        assert_eq!(
            heap.handler(id).unwrap().report().history(),
            &[AccessRecord::Apply(Call {
                arguments: args.clone(),
                return_value: Value::List(args),
            })]
        );
    }

    #[test]
    fn apply_failure_is_not_recorded() {
        let (mut heap, id, _) = setup();
        heap.handler_mut(id)
            .unwrap()
            .set_return_value_factory(crate::factory::failing("nope"));
        assert!(heap.apply(id, vec![]).is_err());
        assert!(!heap.handler(id).unwrap().report().is_called());
    }

    #[test]
    fn construct_uses_instance_factory_and_records_arguments_only() {
        let (mut heap, id, _) = setup();
        heap.handler_mut(id)
            .unwrap()
            .set_instance_factory(fixed(Value::from("instance")));
        let instance = heap.construct(id, vec![1.into(), 2.into()]).unwrap();
        assert_eq!(instance, Value::from("instance"));
        assert_eq!(
            heap.handler(id).unwrap().report().history(),
            &[AccessRecord::Construct(Construct {
                arguments: vec![1.into(), 2.into()],
            })]
        );
    }

    #[test]
    fn prototype_query_is_not_recorded() {
        let (mut heap, id, _) = setup();
        heap.handler_mut(id)
            .unwrap()
            .set_emulated_prototype(EmulatedPrototype::Tag(TypeTag::new("Client")));
        assert_eq!(heap.prototype_of(id).unwrap(), TypeTag::new("Client"));
        assert!(heap.handler(id).unwrap().report().is_empty());
    }

    #[test]
    fn binding_survives_registry_clear() {
        let (mut heap, id, registry) = setup();
        let obj = heap.get(id, "child").unwrap().as_mock().unwrap();
        registry.clear();
        let child = heap.resolve(obj).unwrap();
        assert!(heap.apply(child, vec![]).is_ok());
        assert!(registry.handler_by_object(obj).is_err());
    }

    #[test]
    fn heaps_never_share_handles() {
        let (mut first, first_id, registry) = setup();
        let mut second = MockHeap::new();
        let options = first.handler(first_id).unwrap().make_child();
        let second_obj = second.spawn(options).unwrap();
        let first_obj = first.get(first_id, "child").unwrap().as_mock().unwrap();

        assert_ne!(first_obj, second_obj);
        assert!(first.owns(first_obj) && !first.owns(second_obj));
        assert!(matches!(first.resolve(second_obj), Err(MockError::UnknownObject(_))));
        let second_id = second.resolve(second_obj).unwrap();
        assert!(matches!(first.handler(second_id), Err(MockError::UnknownHandler(_))));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unknown_ids_fail() {
        let heap = MockHeap::new();
        assert!(matches!(heap.resolve(MockRef(4)), Err(MockError::UnknownObject(_))));
        assert!(matches!(heap.handler(HandlerId(4)), Err(MockError::UnknownHandler(_))));
    }
}
