//! Interception state of one surrogate
//!
//! A [`Handler`] owns the backing [`Target`] a surrogate reads and writes,
//! the [`Report`] of everything done to it, and the policies used when it is
//! called or constructed. The traps that need to allocate children or run
//! factories live on [`MockHeap`](crate::heap::MockHeap); the ones that only
//! touch this handler live here.

use crate::factory::SharedFactory;
use indexmap::IndexMap;
use objmock_core::{
    EmulatedPrototype, HandlerId, PropertyDelete, PropertyName, PropertySet, Registry, Report,
    TargetKind, TypeTag, Value,
};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Property names read straight from the target, never intercepted
pub type IgnoredProperties = Arc<BTreeSet<String>>;

/// Backing storage of a surrogate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Target {
    kind: TargetKind,
    properties: IndexMap<PropertyName, Value>,
}

impl Target {
    /// Create empty target of the given kind
    #[inline]
    #[must_use]
    pub fn new(kind: TargetKind) -> Self {
        Self {
            kind,
            properties: IndexMap::new(),
        }
    }

    /// Empty plain object
    #[must_use]
    pub fn plain() -> Self {
        Self::new(TargetKind::Object)
    }

    /// Empty callable object
    #[must_use]
    pub fn callable() -> Self {
        Self::new(TargetKind::Function)
    }

    /// With a property preset
    #[must_use]
    pub fn with_property(mut self, name: impl Into<PropertyName>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Real structural kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Check if `name` is present
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Value of `name`, if present
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Value of `name`, [`Value::Undefined`] if absent
    #[must_use]
    pub fn read(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }

    /// Store `value` at `name`, returning the previous value
    pub fn insert(&mut self, name: impl Into<PropertyName>, value: Value) -> Option<Value> {
        self.properties.insert(name.into(), value)
    }

    /// Remove `name`, returning its value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.properties.shift_remove(name)
    }

    /// Property names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Number of properties
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if target has no properties
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Everything needed to build a [`Handler`]
#[derive(Clone)]
pub struct HandlerOptions {
    /// Initial backing storage
    pub target: Target,
    /// Registry children are registered in
    pub registry: Arc<Registry>,
    /// Policy for calls
    pub return_value_factory: SharedFactory,
    /// Policy for constructions
    pub instance_factory: SharedFactory,
    /// Prototype reported instead of the target's real type
    pub emulated_prototype: EmulatedPrototype,
    /// Handler this one was derived from
    pub parent: Option<HandlerId>,
    /// Create children on reads of missing properties
    pub auto_create: bool,
    /// Property names that bypass interception
    pub ignored_properties: IgnoredProperties,
}

impl HandlerOptions {
    /// Options for a root handler over an empty plain target
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        return_value_factory: SharedFactory,
        instance_factory: SharedFactory,
    ) -> Self {
        Self {
            target: Target::plain(),
            registry,
            return_value_factory,
            instance_factory,
            emulated_prototype: EmulatedPrototype::NoEmulation,
            parent: None,
            auto_create: true,
            ignored_properties: IgnoredProperties::default(),
        }
    }

    /// With backing target
    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// With emulated prototype
    #[must_use]
    pub fn with_emulated_prototype(mut self, prototype: EmulatedPrototype) -> Self {
        self.emulated_prototype = prototype;
        self
    }

    /// With parent handler
    #[must_use]
    pub fn with_parent(mut self, parent: HandlerId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// With auto-create flag
    #[must_use]
    pub fn with_auto_create(mut self, enabled: bool) -> Self {
        self.auto_create = enabled;
        self
    }

    /// With ignored property names
    #[must_use]
    pub fn with_ignored_properties(mut self, names: IgnoredProperties) -> Self {
        self.ignored_properties = names;
        self
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("target", &self.target)
            .field("emulated_prototype", &self.emulated_prototype)
            .field("parent", &self.parent)
            .field("auto_create", &self.auto_create)
            .field("ignored_properties", &self.ignored_properties)
            .finish_non_exhaustive()
    }
}

/// Interception state of one surrogate
pub struct Handler {
    id: HandlerId,
    target: Target,
    report: Report,
    registry: Arc<Registry>,
    return_value_factory: SharedFactory,
    instance_factory: SharedFactory,
    emulated_prototype: EmulatedPrototype,
    parent: Option<HandlerId>,
    auto_create: bool,
    ignored_properties: IgnoredProperties,
}

impl Handler {
    pub(crate) fn new(id: HandlerId, options: HandlerOptions) -> Self {
        Self {
            id,
            target: options.target,
            report: Report::new(),
            registry: options.registry,
            return_value_factory: options.return_value_factory,
            instance_factory: options.instance_factory,
            emulated_prototype: options.emulated_prototype,
            parent: options.parent,
            auto_create: options.auto_create,
            ignored_properties: options.ignored_properties,
        }
    }

    /// Options for a child of this handler
    ///
    /// The child shares the registry, both factories and the ignored names,
    /// gets a fresh plain target, no prototype emulation and auto-create on.
    #[must_use]
    pub fn make_child(&self) -> HandlerOptions {
        HandlerOptions {
            target: Target::plain(),
            registry: Arc::clone(&self.registry),
            return_value_factory: Arc::clone(&self.return_value_factory),
            instance_factory: Arc::clone(&self.instance_factory),
            emulated_prototype: EmulatedPrototype::NoEmulation,
            parent: Some(self.id),
            auto_create: true,
            ignored_properties: Arc::clone(&self.ignored_properties),
        }
    }

    /// Id of this handler in its heap
    #[inline]
    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Backing storage
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Backing storage, for setup that must not be recorded
    #[inline]
    pub fn target_mut(&mut self) -> &mut Target {
        &mut self.target
    }

    /// Access history
    #[inline]
    #[must_use]
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Access history, for clearing between test phases
    #[inline]
    pub fn report_mut(&mut self) -> &mut Report {
        &mut self.report
    }

    /// Registry shared with every handler derived from this one
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Policy for calls
    #[inline]
    #[must_use]
    pub fn return_value_factory(&self) -> &SharedFactory {
        &self.return_value_factory
    }

    /// Replace the policy for calls
    pub fn set_return_value_factory(&mut self, factory: SharedFactory) {
        self.return_value_factory = factory;
    }

    /// Policy for constructions
    #[inline]
    #[must_use]
    pub fn instance_factory(&self) -> &SharedFactory {
        &self.instance_factory
    }

    /// Replace the policy for constructions
    pub fn set_instance_factory(&mut self, factory: SharedFactory) {
        self.instance_factory = factory;
    }

    /// Emulated prototype
    #[inline]
    #[must_use]
    pub fn emulated_prototype(&self) -> &EmulatedPrototype {
        &self.emulated_prototype
    }

    /// Replace the emulated prototype
    pub fn set_emulated_prototype(&mut self, prototype: impl Into<EmulatedPrototype>) {
        self.emulated_prototype = prototype.into();
    }

    /// Handler this one was derived from
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<HandlerId> {
        self.parent
    }

    /// Whether missing properties are created on read
    #[inline]
    #[must_use]
    pub fn auto_create(&self) -> bool {
        self.auto_create
    }

    /// Turn auto-creation on or off
    pub fn set_auto_create(&mut self, enabled: bool) {
        self.auto_create = enabled;
    }

    /// Check if `property` bypasses interception
    #[inline]
    #[must_use]
    pub fn is_ignored(&self, property: &str) -> bool {
        self.ignored_properties.contains(property)
    }

    /// Trap for property writes
    pub fn set(&mut self, property: &str, value: Value) -> bool {
        let created = self.target.contains(property);
        let old_value = self.target.read(property);
        self.report.add_access_record(PropertySet {
            property: property.to_string(),
            value: value.clone(),
            old_value,
            created,
        });
        tracing::trace!(handler = %self.id, property, "set");
        self.target.insert(property, value);
        true
    }

    /// Trap for property removal
    pub fn delete(&mut self, property: &str) -> bool {
        self.report.add_access_record(PropertyDelete {
            property: property.to_string(),
        });
        tracing::trace!(handler = %self.id, property, "delete");
        self.target.remove(property);
        true
    }

    /// Trap for prototype queries; never recorded
    #[must_use]
    pub fn prototype_of(&self) -> TypeTag {
        match &self.emulated_prototype {
            EmulatedPrototype::NoEmulation => self.target.kind().tag(),
            EmulatedPrototype::Tag(tag) => tag.clone(),
        }
    }

    /// Check if the prototype query answers `tag`
    #[must_use]
    pub fn instance_of(&self, tag: &TypeTag) -> bool {
        self.prototype_of() == *tag
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("report", &self.report)
            .field("emulated_prototype", &self.emulated_prototype)
            .field("parent", &self.parent)
            .field("auto_create", &self.auto_create)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::fixed;
    use objmock_core::{AccessRecord, PropertySet};
    use pretty_assertions::assert_eq;

    fn handler() -> Handler {
        let options = HandlerOptions::new(
            Arc::new(Registry::new()),
            fixed(Value::Null),
            fixed(Value::Null),
        )
        .with_emulated_prototype(EmulatedPrototype::Tag(TypeTag::new("Emulated")));
        Handler::new(HandlerId(0), options)
    }

    #[test]
    fn created_from_options() {
        let h = handler();
        assert_eq!(h.parent(), None);
        assert_eq!(h.emulated_prototype(), &EmulatedPrototype::Tag(TypeTag::new("Emulated")));
        assert!(h.auto_create());
        assert!(h.report().is_empty());
    }

    #[test]
    fn make_child_inherits_policies() {
        let h = handler();
        let child = h.make_child();
        assert_eq!(child.parent, Some(h.id()));
        assert!(Arc::ptr_eq(&child.registry, h.registry()));
        assert!(Arc::ptr_eq(&child.return_value_factory, h.return_value_factory()));
        assert!(Arc::ptr_eq(&child.instance_factory, h.instance_factory()));
        assert_eq!(child.emulated_prototype, EmulatedPrototype::NoEmulation);
        assert!(child.auto_create);
        assert!(child.target.is_empty());
    }

    #[test]
    fn set_on_missing_property() {
        let mut h = handler();
        assert!(h.set("property", "foo".into()));
        assert_eq!(h.target().get("property"), Some(&Value::from("foo")));
        assert_eq!(
            h.report().history(),
            &[AccessRecord::Set(PropertySet {
                property: "property".into(),
                value: "foo".into(),
                old_value: Value::Undefined,
                created: false,
            })]
        );
    }

    #[test]
    fn set_on_existing_property() {
        let mut h = handler();
        h.target_mut().insert("property", Value::Int(458));
        h.set("property", "foo".into());
        assert_eq!(h.target().read("property"), Value::from("foo"));
        assert_eq!(
            h.report().history(),
            &[AccessRecord::Set(PropertySet {
                property: "property".into(),
                value: "foo".into(),
                old_value: Value::Int(458),
                created: true,
            })]
        );
    }

    #[test]
    fn delete_removes_and_records() {
        let mut h = handler();
        h.target_mut().insert("foo", Value::Int(10));
        assert!(h.delete("foo"));
        assert!(!h.target().contains("foo"));
        assert_eq!(
            h.report().history(),
            &[AccessRecord::Delete(PropertyDelete {
                property: "foo".into()
            })]
        );
    }

    #[test]
    fn prototype_emulated() {
        let h = handler();
        assert_eq!(h.prototype_of(), TypeTag::new("Emulated"));
        assert!(h.instance_of(&TypeTag::new("Emulated")));
        assert!(h.report().is_empty());
    }

    #[test]
    fn prototype_falls_back_to_target_kind() {
        let mut h = handler();
        h.set_emulated_prototype(EmulatedPrototype::NoEmulation);
        assert_eq!(h.prototype_of(), TypeTag::object());
    }

    #[test]
    fn target_keeps_insertion_order() {
        let target = Target::callable().with_property("b", 1).with_property("a", 2);
        assert_eq!(target.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(target.kind(), TargetKind::Function);
    }
}
