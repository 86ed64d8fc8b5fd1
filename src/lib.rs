//! prototyper - a minimal prototype-based object model
//!
//! Classes are objects too: the root object is extended into classes, classes
//! are extended into subclasses and create instances, and every lookup that
//! misses a node's own attributes is delegated to its ancestor.
//!
//! ```
//! use prototyper::{root, ClassDef, PropertyMap, Value};
//!
//! let person = root()
//!     .extend(
//!         "Person",
//!         ClassDef::new().instance_vars(PropertyMap::new().with("name", "Unnamed")),
//!     )
//!     .unwrap();
//! let someone = person.create(&[]).unwrap();
//!
//! assert_eq!(someone.to_string(), "[instance person-1]");
//! assert_eq!(someone.get("name").unwrap(), Value::from("Unnamed"));
//! ```

pub mod config;
pub mod error;
pub mod objects;

pub use config::ModelConfig;
pub use error::{ObjectError, Result};
pub use objects::{
    define_all_properties, mix_properties, root, ClassDef, Kind, Method, MixPolicy, Node,
    Property, PropertyDescriptor, PropertyMap, PropertySource, Slot, Value,
};
