//! Class construction and instantiation

use tracing::debug;

use super::mixin::{mix_properties, MixPolicy};
use super::node::{instance_count_getter, ClassState};
use super::{Kind, Node, Property, PropertyDescriptor, PropertyMap, Value};
use crate::error::{ObjectError, Result};

/// Everything a new class is built from besides its name
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    /// Declared defaults every instance receives
    pub instance_vars: Option<PropertyMap>,
    /// Members of the class node itself, reachable by its instances
    pub class_vars: Option<PropertyMap>,
    /// Descriptor overrides applied to `instance_vars`
    pub ivar_descriptors: Vec<(String, PropertyDescriptor)>,
    /// Descriptor overrides applied to the class's own attributes
    pub cvar_descriptors: Vec<(String, PropertyDescriptor)>,
}

impl ClassDef {
    /// Empty definition: no variables, no overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the declared instance variables
    pub fn instance_vars(mut self, vars: PropertyMap) -> Self {
        self.instance_vars = Some(vars);
        self
    }

    /// Set the class's own members
    pub fn class_vars(mut self, vars: PropertyMap) -> Self {
        self.class_vars = Some(vars);
        self
    }

    /// Reshape one instance variable after the copy
    pub fn ivar_descriptor(mut self, key: &str, desc: PropertyDescriptor) -> Self {
        self.ivar_descriptors.push((key.to_string(), desc));
        self
    }

    /// Reshape one class member after the copy
    pub fn cvar_descriptor(mut self, key: &str, desc: PropertyDescriptor) -> Self {
        self.cvar_descriptors.push((key.to_string(), desc));
        self
    }
}

/// Identity attributes every node owns
fn identity(name: &str, is_class: bool, ancestor: &Node) -> PropertyMap {
    let mut props = PropertyMap::new();
    props.insert("objectName", Property::fixed(name));
    props.insert("isClass", Property::fixed(is_class));
    props.insert("super", Property::fixed(ancestor.clone()));
    props
}

fn apply_descriptors(target: &mut PropertyMap, descriptors: &[(String, PropertyDescriptor)]) -> Result<()> {
    target.define_many(descriptors.iter().map(|(k, d)| (k.as_str(), d)))
}

impl Node {
    /// Create a class whose ancestor is this class.
    ///
    /// Instance variables are copied by value (enumerable keys, last
    /// definition wins); class variables are copied with their full
    /// descriptors, accessors included. Descriptor overrides run last.
    pub fn extend(&self, name: &str, def: ClassDef) -> Result<Node> {
        if self.is_instance() {
            return Err(ObjectError::invalid_operation(format!(
                "Object {} cannot be extended, clone it instead",
                self
            )));
        }
        if name.is_empty() {
            return Err(ObjectError::invalid_argument(
                "name must be a non-empty string",
            ));
        }

        let mut properties = identity(name, true, self);
        properties.insert(
            "instanceCount",
            Property {
                enumerable: true,
                configurable: false,
                ..Property::getter(instance_count_getter())
            },
        );

        let mut ivars = PropertyMap::new();
        if let Some(vars) = &def.instance_vars {
            mix_properties(&mut ivars, vars, MixPolicy::new().overwrite())?;
        }
        if let Some(vars) = &def.class_vars {
            mix_properties(
                &mut properties,
                vars,
                MixPolicy::new().all().overwrite().define(),
            )?;
        }
        apply_descriptors(&mut ivars, &def.ivar_descriptors)?;
        apply_descriptors(&mut properties, &def.cvar_descriptors)?;

        let class = Node::alloc(
            Kind::Class,
            name.to_string(),
            Some(self.clone()),
            self.config().clone(),
            properties,
            Some(ClassState {
                ivars: ivars.into(),
                ..Default::default()
            }),
        );
        debug!(class = %class, parent = %self, "extended class");
        Ok(class)
    }

    /// Create an instance of this class.
    ///
    /// The instance receives every enumerable instance variable declared
    /// along the chain, nearest class first, then its `initialize` method (if any) is
    /// called with `args`. Errors from `initialize` are returned as-is.
    pub fn create(&self, args: &[Value]) -> Result<Node> {
        let Some(state) = self.class_state() else {
            return Err(ObjectError::invalid_operation(format!(
                "Object {} cannot create instances",
                self
            )));
        };

        let serial = state.serial.get() + 1;
        state.serial.set(serial);

        let instance = self.instantiate(serial, PropertyMap::new())?;
        debug!(instance = %instance, class = %self, "created instance");

        if let Value::Method(init) = instance.get("initialize")? {
            init.call(&instance, args)?;
        }
        Ok(instance)
    }

    /// Create a sibling of this instance carrying copies of its own
    /// attributes. The initializer is not run.
    pub fn clone_instance(&self) -> Result<Node> {
        let class = match self.ancestor() {
            Some(class) if self.is_instance() => class,
            _ => {
                return Err(ObjectError::invalid_operation(format!(
                    "Object {} cannot be cloned, try extend",
                    self
                )))
            }
        };
        let Some(state) = class.class_state() else {
            return Err(ObjectError::invalid_operation(format!(
                "Object {} has no class to clone from",
                self
            )));
        };

        let serial = state.serial.get() + 1;
        state.serial.set(serial);

        let copy = class.instantiate(serial, self.own_property_table())?;
        debug!(instance = %copy, from = %self, "cloned instance");
        Ok(copy)
    }

    /// Build an instance node numbered `serial`, seeded with `own` (identity
    /// attributes excluded) and then the declared instance variables
    fn instantiate(&self, serial: u64, own: PropertyMap) -> Result<Node> {
        let name = format!(
            "{}{}{}",
            self.name().to_lowercase().replace(' ', ""),
            self.config().serial_separator,
            serial
        );

        let mut properties = identity(&name, false, self);
        mix_properties(&mut properties, &own, MixPolicy::new().all().define())?;
        // Hidden iVars stay on the class
        for class in self.chain() {
            if let Some(state) = class.class_state() {
                let ivars = state.ivars.borrow().clone();
                mix_properties(&mut properties, &ivars, MixPolicy::new().define())?;
            }
        }

        Ok(Node::alloc(
            Kind::Instance,
            name,
            Some(self.clone()),
            self.config().clone(),
            properties,
            None,
        ))
    }

    /// Copy of the declared instance variables. `None` for the root and for
    /// instances.
    pub fn ivars(&self) -> Option<PropertyMap> {
        self.class_state().map(|s| s.ivars.borrow().clone())
    }

    /// Number of instances created from this exact class. `None` for the
    /// root and for instances.
    pub fn instance_count(&self) -> Option<u64> {
        self.class_state().map(|s| s.serial.get())
    }

    fn ivars_state(&self) -> Result<&ClassState> {
        self.class_state().ok_or_else(|| {
            ObjectError::invalid_operation(format!("Object {} does not make use of iVars", self))
        })
    }

    /// Define or reshape one declared instance variable
    pub fn define_ivar(&self, key: &str, descriptor: PropertyDescriptor) -> Result<&Self> {
        self.ivars_state()?.ivars.borrow_mut().define(key, &descriptor)?;
        Ok(self)
    }

    /// Define several instance variables; none are applied if one fails
    pub fn define_ivars<'a, I>(&self, descriptors: I) -> Result<&Self>
    where
        I: IntoIterator<Item = (&'a str, PropertyDescriptor)>,
    {
        let state = self.ivars_state()?;
        let descriptors: Vec<_> = descriptors.into_iter().collect();
        state
            .ivars
            .borrow_mut()
            .define_many(descriptors.iter().map(|(k, d)| (*k, d)))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root;

    fn person() -> Node {
        root()
            .extend(
                "Person",
                ClassDef::new()
                    .instance_vars(
                        PropertyMap::new()
                            .with("name", "Unnamed")
                            .with("happiness", 10i64),
                    )
                    .class_vars(PropertyMap::new().with_method("initialize", |this, args| {
                        if let Some(name) = args.first() {
                            this.set("name", name.clone())?;
                        }
                        Ok(Value::Undefined)
                    })),
            )
            .unwrap()
    }

    #[test]
    fn test_extend() {
        let person = person();
        assert!(person.is_class());
        assert_eq!(person.name(), "Person");
        assert!(person.ancestor().unwrap().ptr_eq(&root()));
        assert_eq!(person.to_string(), "[class Person]");
        assert_eq!(person.instance_count(), Some(0));

        let ivars = person.ivars().unwrap();
        assert_eq!(ivars.value("name"), Some(&Value::from("Unnamed")));
        assert_eq!(ivars.value("happiness"), Some(&Value::from(10i64)));
    }

    #[test]
    fn test_extend_rejects_empty_name() {
        let err = root().extend("", ClassDef::new()).unwrap_err();
        assert!(matches!(err, ObjectError::InvalidArgument(_)));
    }

    #[test]
    fn test_create_names_and_counts() {
        let person = person();
        let a = person.create(&["Mechi".into()]).unwrap();
        let b = person.create(&["Clau".into()]).unwrap();
        assert_eq!(a.name(), "person-1");
        assert_eq!(b.name(), "person-2");
        assert_eq!(a.to_string(), "[instance person-1]");
        assert_eq!(person.instance_count(), Some(2));
        assert_eq!(a.get("name").unwrap(), Value::from("Mechi"));
        assert_eq!(a.get("happiness").unwrap(), Value::from(10i64));
    }

    #[test]
    fn test_create_on_root_fails() {
        let err = root().create(&[]).unwrap_err();
        assert!(matches!(err, ObjectError::InvalidOperation(_)));
        assert_eq!(err.to_string(), "Object [class Prototyper] cannot create instances");
    }

    #[test]
    fn test_instances_have_no_class_state() {
        let mechi = person().create(&[]).unwrap();
        assert!(mechi.ivars().is_none());
        assert!(mechi.instance_count().is_none());
        assert!(mechi.get("instanceCount").unwrap().is_undefined());
        assert!(matches!(mechi.create(&[]), Err(ObjectError::InvalidOperation(_))));
    }

    #[test]
    fn test_define_ivar_requires_class() {
        let desc = PropertyDescriptor::data(0i64);
        assert!(matches!(
            root().define_ivar("age", desc.clone()),
            Err(ObjectError::InvalidOperation(_))
        ));
        let person = person();
        let mechi = person.create(&[]).unwrap();
        assert!(matches!(
            mechi.define_ivar("age", desc.clone()),
            Err(ObjectError::InvalidOperation(_))
        ));

        person.define_ivar("age", desc).unwrap();
        assert_eq!(person.create(&[]).unwrap().get("age").unwrap(), Value::from(0i64));
    }

    #[test]
    fn test_clone_instance() {
        let person = person();
        let mechi = person.create(&["Mechi".into()]).unwrap();
        mechi.set("happiness", 50i64).unwrap();

        let twin = mechi.clone_instance().unwrap();
        assert_eq!(twin.name(), "person-2");
        assert!(twin.is_instance());
        assert!(twin.ancestor().unwrap().ptr_eq(&person));
        assert_eq!(twin.get("name").unwrap(), Value::from("Mechi"));
        assert_eq!(twin.get("happiness").unwrap(), Value::from(50i64));

        twin.set("happiness", 0i64).unwrap();
        assert_eq!(mechi.get("happiness").unwrap(), Value::from(50i64));
    }

    #[test]
    fn test_clone_class_fails() {
        let err = person().clone_instance().unwrap_err();
        assert!(matches!(err, ObjectError::InvalidOperation(_)));
        assert_eq!(err.to_string(), "Object [class Person] cannot be cloned, try extend");
        assert!(root().clone_instance().is_err());
    }
}
