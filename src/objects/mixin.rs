//! Property copy engine
//!
//! Copies attributes from any [`PropertySource`] into an attribute table
//! under one of the [`MixPolicy`] combinations:
//! - enumerable keys only, or every own key
//! - preserve keys the target already owns, or overwrite them
//! - assign values, or copy complete descriptors

use tracing::trace;

use super::{Node, PropertyDescriptor, PropertyMap, Slot, Value};
use crate::error::{ObjectError, Result};

/// How [`mix_properties`] treats each source key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixPolicy {
    /// Copy non-enumerable keys too
    pub all: bool,
    /// Replace keys the target already owns
    pub overwrite: bool,
    /// Copy the whole descriptor instead of assigning the value
    pub define: bool,
}

impl MixPolicy {
    /// Enumerable only, non-destructive, by assignment
    pub fn new() -> Self {
        Self::default()
    }

    /// Include non-enumerable keys
    pub fn all(mut self) -> Self {
        self.all = true;
        self
    }

    /// Replace keys the target owns
    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    /// Copy descriptors instead of values
    pub fn define(mut self) -> Self {
        self.define = true;
        self
    }
}

/// Something attributes can be copied out of.
///
/// Dynamic values that are not attribute containers (arrays, strings,
/// numbers, null, methods) fail with [`ObjectError::InvalidArgument`].
pub trait PropertySource {
    /// Snapshot of the own attribute table
    fn own_properties(&self) -> Result<PropertyMap>;

    /// Current value of an own attribute, as plain assignment would read it
    fn read(&self, key: &str, table: &PropertyMap) -> Result<Value> {
        Ok(table.value(key).cloned().unwrap_or_default())
    }
}

impl PropertySource for PropertyMap {
    fn own_properties(&self) -> Result<PropertyMap> {
        Ok(self.clone())
    }
}

impl PropertySource for serde_json::Value {
    fn own_properties(&self) -> Result<PropertyMap> {
        PropertyMap::try_from(self)
    }
}

/// Accessors run against the node itself
impl PropertySource for Node {
    fn own_properties(&self) -> Result<PropertyMap> {
        Ok(self.own_property_table())
    }

    fn read(&self, key: &str, _table: &PropertyMap) -> Result<Value> {
        self.get(key)
    }
}

impl PropertySource for Value {
    fn own_properties(&self) -> Result<PropertyMap> {
        match self {
            Value::Json(v) => v.own_properties(),
            Value::Object(node) => node.own_properties(),
            other => Err(ObjectError::invalid_argument(format!(
                "source must be an object: {}",
                other
            ))),
        }
    }

    fn read(&self, key: &str, table: &PropertyMap) -> Result<Value> {
        match self {
            Value::Object(node) => node.read(key, table),
            _ => Ok(table.value(key).cloned().unwrap_or_default()),
        }
    }
}

/// Copy attributes from `source` into `target` according to `policy`.
///
/// Nothing in `target` changes unless every selected key is copied.
pub fn mix_properties<'t, S>(
    target: &'t mut PropertyMap,
    source: &S,
    policy: MixPolicy,
) -> Result<&'t mut PropertyMap>
where
    S: PropertySource + ?Sized,
{
    let (table, keys) = selected_keys(source, policy, |key| target.contains_key(key))?;

    let mut staged = target.clone();
    for key in &keys {
        if policy.define {
            if let Some(prop) = table.get(key) {
                staged.define(key, &prop.descriptor())?;
            }
        } else {
            let value = source.read(key, &table)?;
            staged.assign(key, value)?;
        }
        trace!(key = key.as_str(), define = policy.define, "mixed property");
    }

    *target = staged;
    Ok(target)
}

/// Snapshot `source` and list the keys `policy` copies from it, given which
/// keys the target already owns
pub(crate) fn selected_keys<S>(
    source: &S,
    policy: MixPolicy,
    owns: impl Fn(&str) -> bool,
) -> Result<(PropertyMap, Vec<String>)>
where
    S: PropertySource + ?Sized,
{
    let table = source.own_properties()?;
    let keys: Vec<String> = if policy.all {
        table.keys().map(str::to_string).collect()
    } else {
        table.enumerable_keys().map(str::to_string).collect()
    };
    let keys = keys
        .into_iter()
        .filter(|key| policy.overwrite || !owns(key))
        .collect();
    Ok((table, keys))
}

/// Reshape every own attribute of `target` with the same partial descriptor
pub fn define_all_properties<'t>(
    target: &'t mut PropertyMap,
    descriptor: &PropertyDescriptor,
) -> Result<&'t mut PropertyMap> {
    let keys: Vec<String> = target.keys().map(str::to_string).collect();
    let mut staged = target.clone();
    for key in &keys {
        // A value or writable flag makes no sense on an accessor
        let desc = match staged.get(key).map(|p| &p.slot) {
            Some(Slot::Accessor { .. }) if descriptor.is_data() => PropertyDescriptor {
                value: None,
                writable: None,
                ..descriptor.clone()
            },
            _ => descriptor.clone(),
        };
        staged.define(key, &desc)?;
    }
    *target = staged;
    Ok(target)
}
