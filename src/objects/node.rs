//! Nodes and the root object
//!
//! Every class and every instance is a [`Node`]. A node owns its attribute
//! table and holds a reference to exactly one ancestor; lookups that miss
//! the own table continue up the ancestor chain until the root.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::mixin::{selected_keys, MixPolicy, PropertySource};
use super::{Method, Property, PropertyDescriptor, PropertyMap, Slot, Value};
use crate::config::ModelConfig;
use crate::error::{ObjectError, Result};

/// Whether a node is a class or an instance. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Class,
    Instance,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Class => "class",
            Kind::Instance => "instance",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State only classes created by `extend` carry
#[derive(Debug, Default)]
pub(crate) struct ClassState {
    pub(crate) ivars: RefCell<PropertyMap>,
    pub(crate) serial: Cell<u64>,
}

struct NodeInner {
    kind: Kind,
    name: String,
    ancestor: Option<Node>,
    config: Rc<ModelConfig>,
    properties: RefCell<PropertyMap>,
    class: Option<ClassState>,
}

/// A class or instance in a delegation chain.
///
/// `Node` is a shared handle: cloning it yields another handle to the same
/// object. Compare identity with [`Node::ptr_eq`] or `==`.
#[derive(Clone)]
pub struct Node(Rc<NodeInner>);

thread_local! {
    static ROOT: Node = Node::new_root(&ModelConfig::default());
}

/// The default root object of the current thread
pub fn root() -> Node {
    ROOT.with(Node::clone)
}

impl Node {
    pub(crate) fn alloc(
        kind: Kind,
        name: String,
        ancestor: Option<Node>,
        config: Rc<ModelConfig>,
        properties: PropertyMap,
        class: Option<ClassState>,
    ) -> Self {
        Node(Rc::new(NodeInner {
            kind,
            name,
            ancestor,
            config,
            properties: RefCell::new(properties),
            class,
        }))
    }

    /// Build a root object. It is frozen before being returned.
    ///
    /// Most code should use [`root()`]; separate roots are for hosts that
    /// want a differently configured hierarchy.
    pub fn new_root(config: &ModelConfig) -> Self {
        let properties = PropertyMap::new()
            .with("objectName", config.root_name.as_str())
            .with("isClass", true)
            .with_getter("isInstance", |this, _| Ok(Value::from(this.is_instance())))
            .with_getter("objectType", |this, _| Ok(Value::from(this.object_type())))
            .with_descriptor(
                "super",
                PropertyDescriptor::new()
                    .value(Value::Undefined)
                    .writable(true)
                    .configurable(true),
            )
            .with_method("toString", |this, _| Ok(Value::from(this.to_string())));

        let node = Node::alloc(
            Kind::Class,
            config.root_name.clone(),
            None,
            Rc::new(config.clone()),
            properties,
            None,
        );
        node.freeze();
        debug!(name = %config.root_name, "created root object");
        node
    }

    /// `objectName`
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Class or instance
    pub fn kind(&self) -> Kind {
        self.0.kind
    }

    /// `isClass`: true for classes, the root included
    pub fn is_class(&self) -> bool {
        self.0.kind == Kind::Class
    }

    /// True for nodes made by `create` or `clone_instance`
    pub fn is_instance(&self) -> bool {
        self.0.kind == Kind::Instance
    }

    /// `"class"` or `"instance"`
    pub fn object_type(&self) -> &'static str {
        self.0.kind.as_str()
    }

    /// Whether this node ends its chain
    pub fn is_root(&self) -> bool {
        self.0.ancestor.is_none()
    }

    /// The next node in the delegation chain (`super`)
    pub fn ancestor(&self) -> Option<&Node> {
        self.0.ancestor.as_ref()
    }

    pub(crate) fn config(&self) -> &Rc<ModelConfig> {
        &self.0.config
    }

    pub(crate) fn class_state(&self) -> Option<&ClassState> {
        self.0.class.as_ref()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `self` appears in the ancestor chain of `other`
    pub fn is_prototype_of(&self, other: &Node) -> bool {
        let mut current = other.ancestor();
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.ancestor();
        }
        false
    }

    /// Iterate from this node up to the root, inclusive
    pub fn chain(&self) -> impl Iterator<Item = Node> {
        std::iter::successors(Some(self.clone()), |n| n.ancestor().cloned())
    }

    // ---- attribute access ----

    /// Find an attribute on this node or, failing that, on the nearest
    /// ancestor holding it
    pub fn lookup(&self, key: &str) -> Option<Property> {
        self.chain().find_map(|node| {
            let properties = node.0.properties.borrow();
            properties.get(key).cloned()
        })
    }

    /// Read an attribute through the chain. Accessors run with `self` as
    /// receiver; missing attributes read as [`Value::Undefined`].
    pub fn get(&self, key: &str) -> Result<Value> {
        match self.lookup(key).map(|p| p.slot) {
            Some(Slot::Data { value, .. }) => Ok(value),
            Some(Slot::Accessor { get: Some(g), .. }) => g.call(self, &[]),
            Some(Slot::Accessor { get: None, .. }) | None => Ok(Value::Undefined),
        }
    }

    /// Assign an attribute.
    ///
    /// Read-only attributes (own or inherited) refuse; inherited setters run
    /// with `self` as receiver; anything else lands in the own table.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match self.assignment_setter(key)? {
            Some(setter) => setter.call(self, &[value]).map(|_| ()),
            None => self.0.properties.borrow_mut().assign(key, value),
        }
    }

    /// Where an assignment to `key` lands: a setter found on the chain, or
    /// (`None`) the own table. Refusals are reported without side effects.
    fn assignment_setter(&self, key: &str) -> Result<Option<Method>> {
        match self.lookup(key).map(|p| p.slot) {
            Some(Slot::Accessor { set: Some(s), .. }) => Ok(Some(s)),
            Some(Slot::Accessor { set: None, .. }) | Some(Slot::Data { writable: false, .. }) => {
                Err(ObjectError::NotWritable(key.to_string()))
            }
            Some(Slot::Data { writable: true, .. }) | None => {
                if !self.has_own_property(key) && !self.is_extensible() {
                    return Err(ObjectError::NotExtensible(key.to_string()));
                }
                Ok(None)
            }
        }
    }

    /// Look up a method through the chain and call it on `self`
    pub fn call(&self, key: &str, args: &[Value]) -> Result<Value> {
        match self.get(key)? {
            Value::Method(m) => m.call(self, args),
            _ => Err(ObjectError::invalid_argument(format!(
                "{}.{} is not a method",
                self, key
            ))),
        }
    }

    /// Remove an own attribute. Returns whether one was present.
    pub fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.0.properties.borrow_mut().remove(key)?.is_some())
    }

    /// Whether `key` is in the own table
    pub fn has_own_property(&self, key: &str) -> bool {
        self.0.properties.borrow().contains_key(key)
    }

    /// Whether `key` resolves anywhere on the chain
    pub fn has_property(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Every own key, in definition order
    pub fn own_keys(&self) -> Vec<String> {
        self.0
            .properties
            .borrow()
            .keys()
            .map(str::to_string)
            .collect()
    }

    /// Enumerable own keys, in definition order
    pub fn keys(&self) -> Vec<String> {
        self.0
            .properties
            .borrow()
            .enumerable_keys()
            .map(str::to_string)
            .collect()
    }

    /// Complete descriptor of an own attribute
    pub fn get_own_property_descriptor(&self, key: &str) -> Option<PropertyDescriptor> {
        self.0.properties.borrow().get(key).map(Property::descriptor)
    }

    /// Copy of the own attribute table
    pub fn own_property_table(&self) -> PropertyMap {
        self.0.properties.borrow().clone()
    }

    // ---- definition facade ----

    /// Define or reshape an own attribute with exactly `descriptor`
    pub fn define_property(&self, key: &str, descriptor: PropertyDescriptor) -> Result<&Self> {
        self.0.properties.borrow_mut().define(key, &descriptor)?;
        Ok(self)
    }

    /// Define several own attributes; none are applied if one fails
    pub fn define_properties<'a, I>(&self, descriptors: I) -> Result<&Self>
    where
        I: IntoIterator<Item = (&'a str, PropertyDescriptor)>,
    {
        let descriptors: Vec<_> = descriptors.into_iter().collect();
        self.0
            .properties
            .borrow_mut()
            .define_many(descriptors.iter().map(|(k, d)| (*k, d)))?;
        Ok(self)
    }

    /// Copy attributes of `source` into this node.
    ///
    /// The default policy copies enumerable keys by assignment without
    /// touching keys this node already owns. Assignment follows [`Node::set`]:
    /// inherited read-only attributes refuse and inherited setters run.
    /// Only the copied keys are written; nothing is written if a key is
    /// refused.
    pub fn mixin<S>(&self, source: &S, policy: Option<MixPolicy>) -> Result<&Self>
    where
        S: PropertySource + ?Sized,
    {
        if self.is_root() {
            return Err(ObjectError::invalid_operation(format!(
                "Object {} cannot be mixed",
                self
            )));
        }
        let policy = policy.unwrap_or_default();
        let (table, keys) = selected_keys(source, policy, |key| self.has_own_property(key))?;

        if policy.define {
            // Validate on a copy, then commit the copied keys alone
            let mut staged = self.own_property_table();
            for key in &keys {
                if let Some(prop) = table.get(key) {
                    staged.define(key, &prop.descriptor())?;
                }
            }
            let mut properties = self.0.properties.borrow_mut();
            for key in &keys {
                if let Some(prop) = staged.get(key) {
                    properties.insert(key, prop.clone());
                }
            }
        } else {
            // Source getters all run before the first write
            let mut values = Vec::with_capacity(keys.len());
            for key in &keys {
                values.push((key.as_str(), source.read(key, &table)?));
            }
            for (key, _) in &values {
                self.assignment_setter(key)?;
            }
            // A failing setter stops the copy at that key
            for (key, value) in values {
                self.set(key, value)?;
            }
        }
        debug!(target_node = %self, ?policy, "mixin applied");
        Ok(self)
    }

    // ---- extensibility ----

    /// Make every own attribute permanent and read-only and refuse new ones
    pub fn freeze(&self) {
        self.0.properties.borrow_mut().freeze();
    }

    pub fn is_frozen(&self) -> bool {
        self.0.properties.borrow().is_frozen()
    }

    /// Refuse new own attributes from now on
    pub fn prevent_extensions(&self) {
        self.0.properties.borrow_mut().prevent_extensions();
    }

    pub fn is_extensible(&self) -> bool {
        self.0.properties.borrow().is_extensible()
    }
}

/// Accessor installed on classes: a class's own counter, or undefined for
/// any receiver without one
pub(crate) fn instance_count_getter() -> Method {
    Method::new(|this, _| Ok(this.instance_count().map(Value::from).unwrap_or_default()))
}

/// `[class Person]`, `[instance person-1]`
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.object_type(), self.name())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}
