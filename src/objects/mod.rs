//! Object model - classes and instances built from delegation chains

mod class;
mod mixin;
mod node;
mod property;
mod value;

pub use class::ClassDef;
pub use mixin::{define_all_properties, mix_properties, MixPolicy, PropertySource};
pub use node::{root, Kind, Node};
pub use property::{Property, PropertyDescriptor, PropertyMap, Slot};
pub use value::{Method, Value};
