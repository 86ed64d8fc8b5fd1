//! Attributes, visibility descriptors and attribute tables

use super::{Method, Value};
use crate::error::{ObjectError, Result};

/// Storage half of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Data { value: Value, writable: bool },
    Accessor {
        get: Option<Method>,
        set: Option<Method>,
    },
}

/// A stored attribute: its slot plus visibility
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub slot: Slot,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    /// Writable, enumerable, configurable data; what plain assignment creates
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            slot: Slot::Data {
                value: value.into(),
                writable: true,
            },
            enumerable: true,
            configurable: true,
        }
    }

    /// Read-only, hidden, permanent data
    pub fn fixed(value: impl Into<Value>) -> Self {
        Self {
            slot: Slot::Data {
                value: value.into(),
                writable: false,
            },
            enumerable: false,
            configurable: false,
        }
    }

    /// Enumerable, configurable read-only accessor
    pub fn getter(get: Method) -> Self {
        Self {
            slot: Slot::Accessor {
                get: Some(get),
                set: None,
            },
            enumerable: true,
            configurable: true,
        }
    }

    /// Stored value, `None` for accessors
    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Data { value, .. } => Some(value),
            Slot::Accessor { .. } => None,
        }
    }

    /// Data attribute that accepts assignment
    pub fn is_writable(&self) -> bool {
        matches!(self.slot, Slot::Data { writable: true, .. })
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.slot, Slot::Accessor { .. })
    }

    /// Full descriptor of this attribute
    pub fn descriptor(&self) -> PropertyDescriptor {
        let mut desc = PropertyDescriptor {
            enumerable: Some(self.enumerable),
            configurable: Some(self.configurable),
            ..Default::default()
        };
        match &self.slot {
            Slot::Data { value, writable } => {
                desc.value = Some(value.clone());
                desc.writable = Some(*writable);
            }
            Slot::Accessor { get, set } => {
                desc.get = get.clone();
                desc.set = set.clone();
            }
        }
        desc
    }
}

/// Partial attribute descriptor, used to define or reshape attributes.
///
/// Absent flags default to `false` when the attribute is new and are left
/// alone when it already exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDescriptor {
    pub value: Option<Value>,
    pub writable: Option<bool>,
    pub get: Option<Method>,
    pub set: Option<Method>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Descriptor with every field unset
    pub fn new() -> Self {
        Self::default()
    }

    /// Writable, enumerable, configurable data
    pub fn data(value: impl Into<Value>) -> Self {
        Self::new()
            .value(value)
            .writable(true)
            .enumerable(true)
            .configurable(true)
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    pub fn getter(mut self, get: Method) -> Self {
        self.get = Some(get);
        self
    }

    pub fn setter(mut self, set: Method) -> Self {
        self.set = Some(set);
        self
    }

    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    /// Names a getter or setter
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// Names a value or writable flag
    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    fn validate(&self, key: &str) -> Result<()> {
        if self.is_accessor() && self.is_data() {
            return Err(ObjectError::invalid_argument(format!(
                "invalid property descriptor for '{}': cannot both specify accessors and a value or writable attribute",
                key
            )));
        }
        Ok(())
    }

    /// Build a fresh attribute, missing fields defaulting to false/undefined
    fn to_property(&self) -> Property {
        let slot = if self.is_accessor() {
            Slot::Accessor {
                get: self.get.clone(),
                set: self.set.clone(),
            }
        } else {
            Slot::Data {
                value: self.value.clone().unwrap_or_default(),
                writable: self.writable.unwrap_or(false),
            }
        };
        Property {
            slot,
            enumerable: self.enumerable.unwrap_or(false),
            configurable: self.configurable.unwrap_or(false),
        }
    }

    /// Check a redefinition against the current attribute and build the
    /// merged result
    fn apply_to(&self, key: &str, current: &Property) -> Result<Property> {
        let rejected = || Err(ObjectError::NotConfigurable(key.to_string()));

        if !current.configurable {
            if self.configurable == Some(true) {
                return rejected();
            }
            if self.enumerable.is_some_and(|e| e != current.enumerable) {
                return rejected();
            }
            match &current.slot {
                Slot::Data { value, writable } => {
                    if self.is_accessor() {
                        return rejected();
                    }
                    if !writable {
                        if self.writable == Some(true) {
                            return rejected();
                        }
                        if self.value.as_ref().is_some_and(|v| v != value) {
                            return rejected();
                        }
                    }
                }
                Slot::Accessor { get, set } => {
                    if self.is_data() {
                        return rejected();
                    }
                    if self.get.as_ref().is_some_and(|g| Some(g) != get.as_ref()) {
                        return rejected();
                    }
                    if self.set.as_ref().is_some_and(|s| Some(s) != set.as_ref()) {
                        return rejected();
                    }
                }
            }
        }

        let slot = match &current.slot {
            Slot::Data { .. } if self.is_accessor() => Slot::Accessor {
                get: self.get.clone(),
                set: self.set.clone(),
            },
            Slot::Accessor { .. } if self.is_data() => Slot::Data {
                value: self.value.clone().unwrap_or_default(),
                writable: self.writable.unwrap_or(false),
            },
            Slot::Data { value, writable } => Slot::Data {
                value: self.value.clone().unwrap_or_else(|| value.clone()),
                writable: self.writable.unwrap_or(*writable),
            },
            Slot::Accessor { get, set } => Slot::Accessor {
                get: self.get.clone().or_else(|| get.clone()),
                set: self.set.clone().or_else(|| set.clone()),
            },
        };

        Ok(Property {
            slot,
            enumerable: self.enumerable.unwrap_or(current.enumerable),
            configurable: self.configurable.unwrap_or(current.configurable),
        })
    }
}

/// Insertion-ordered table of own attributes
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, Property)>,
    extensible: bool,
}

impl Default for PropertyMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyMap {
    /// Empty, extensible table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            extensible: true,
        }
    }

    /// Builder: plain writable/enumerable/configurable data attribute
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, Property::data(value));
        self
    }

    /// Builder: method attribute
    pub fn with_method<F>(self, key: &str, f: F) -> Self
    where
        F: Fn(&super::Node, &[Value]) -> Result<Value> + 'static,
    {
        self.with(key, Method::new(f))
    }

    /// Builder: read-only accessor attribute
    pub fn with_getter<F>(mut self, key: &str, f: F) -> Self
    where
        F: Fn(&super::Node, &[Value]) -> Result<Value> + 'static,
    {
        self.insert(key, Property::getter(Method::new(f)));
        self
    }

    /// Builder: attribute from a descriptor
    pub fn with_descriptor(mut self, key: &str, desc: PropertyDescriptor) -> Self {
        self.insert(key, desc.to_property());
        self
    }

    /// Number of own attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attribute stored under `key`
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Property> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Value of a data attribute
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(|p| p.value())
    }

    /// All own keys, in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Enumerable own keys, in insertion order
    pub fn enumerable_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, _)| k.as_str())
    }

    /// Keys and attributes, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p))
    }

    /// Raw insert or replace, bypassing visibility checks
    pub(crate) fn insert(&mut self, key: &str, property: Property) {
        match self.get_mut(key) {
            Some(existing) => *existing = property,
            None => self.entries.push((key.to_string(), property)),
        }
    }

    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    pub fn prevent_extensions(&mut self) {
        self.extensible = false;
    }

    /// No additions, and every attribute read-only and permanent
    pub fn freeze(&mut self) {
        self.extensible = false;
        for (_, p) in &mut self.entries {
            p.configurable = false;
            if let Slot::Data { writable, .. } = &mut p.slot {
                *writable = false;
            }
        }
    }

    pub fn is_frozen(&self) -> bool {
        !self.extensible
            && self
                .entries
                .iter()
                .all(|(_, p)| !p.configurable && !p.is_writable())
    }

    /// Define or reshape `key` per `desc`, honoring the current attribute's
    /// visibility and the table's extensibility
    pub fn define(&mut self, key: &str, desc: &PropertyDescriptor) -> Result<()> {
        desc.validate(key)?;
        match self.get(key) {
            Some(current) => {
                let merged = desc.apply_to(key, current)?;
                self.insert(key, merged);
            }
            None => {
                if !self.extensible {
                    return Err(ObjectError::NotExtensible(key.to_string()));
                }
                self.insert(key, desc.to_property());
            }
        }
        Ok(())
    }

    /// Define several attributes; nothing changes unless all succeed
    pub fn define_many<'a, I>(&mut self, descriptors: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a PropertyDescriptor)>,
    {
        let mut staged = self.clone();
        for (key, desc) in descriptors {
            staged.define(key, desc)?;
        }
        *self = staged;
        Ok(())
    }

    /// Assign a data value, keeping the attribute's visibility, or add a
    /// plain attribute if the key is new
    pub fn assign(&mut self, key: &str, value: Value) -> Result<()> {
        match self.get_mut(key) {
            Some(Property {
                slot: Slot::Data { value: v, writable },
                ..
            }) => {
                if !*writable {
                    return Err(ObjectError::NotWritable(key.to_string()));
                }
                *v = value;
                Ok(())
            }
            Some(_) => Err(ObjectError::NotWritable(key.to_string())),
            None => {
                if !self.extensible {
                    return Err(ObjectError::NotExtensible(key.to_string()));
                }
                self.entries.push((key.to_string(), Property::data(value)));
                Ok(())
            }
        }
    }

    /// Remove `key`; permanent attributes refuse
    pub fn remove(&mut self, key: &str) -> Result<Option<Property>> {
        let Some(idx) = self.entries.iter().position(|(k, _)| k == key) else {
            return Ok(None);
        };
        if !self.entries[idx].1.configurable {
            return Err(ObjectError::NotConfigurable(key.to_string()));
        }
        Ok(Some(self.entries.remove(idx).1))
    }
}

/// Plain JSON objects become tables of plain attributes
impl TryFrom<&serde_json::Value> for PropertyMap {
    type Error = ObjectError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(map
                .iter()
                .fold(PropertyMap::new(), |acc, (k, v)| acc.with(k, v.clone()))),
            other => Err(ObjectError::invalid_argument(format!(
                "source must be an object: {}",
                other
            ))),
        }
    }
}
