//! Shared fixtures: a small Person -> Developer -> Javascript Developer
//! hierarchy built the way a consumer of the object model would.

#![allow(dead_code)]

use std::sync::Once;

use anyhow::anyhow;
use prototyper::{root, ClassDef, Method, Node, PropertyDescriptor, PropertyMap, Result, Value};
use serde_json::json;

static TRACING: Once = Once::new();

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "prototyper=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Run the `initialize` defined on `class` with `this` as receiver
fn call_initializer(this: &Node, class: &Node, args: &[Value]) -> Result<Value> {
    match class.get("initialize")? {
        Value::Method(init) => init.call(this, args),
        _ => Ok(Value::Undefined),
    }
}

/// Person: name, age, happiness; `initialize(name, age?)`
pub fn person() -> Node {
    init_tracing();
    let is_happy = Method::new(|this, _| {
        let happiness = this.get("happiness")?.as_i64().unwrap_or(0);
        let threshold = this.get("happinessThreshold")?.as_i64().unwrap_or(0);
        Ok(Value::from(happiness >= threshold))
    });

    root()
        .extend(
            "Person",
            ClassDef::new()
                .instance_vars(
                    PropertyMap::new()
                        .with("name", "Unnamed")
                        .with("age", 0i64)
                        .with("happiness", 10i64)
                        .with("happinessThreshold", 100i64),
                )
                .class_vars(
                    PropertyMap::new()
                        .with_descriptor(
                            "isHappy",
                            PropertyDescriptor::new().getter(is_happy).enumerable(true),
                        )
                        .with_method("initialize", |this, args| {
                            let name = args.first().cloned().unwrap_or_default();
                            if !name.is_truthy() {
                                return Err(anyhow!("name is required").into());
                            }
                            this.set("name", name)?;
                            if let Some(age) = args.get(1).filter(|a| a.is_truthy()) {
                                this.set("age", age.clone())?;
                            }
                            Ok(Value::Undefined)
                        })
                        .with_method("sayName", |this, _| {
                            Ok(Value::from(format!("My name is {}", this.get("name")?)))
                        })
                        .with_method("beHappier", |this, _| {
                            let happiness = this.get("happiness")?.as_i64().unwrap_or(0);
                            this.set("happiness", happiness + 10)?;
                            Ok(Value::Undefined)
                        }),
                )
                .ivar_descriptor(
                    "happinessThreshold",
                    PropertyDescriptor::new().writable(false),
                )
                .cvar_descriptor(
                    "beHappier",
                    PropertyDescriptor::new().writable(false).configurable(false),
                ),
        )
        .expect("Person class")
}

/// Developer: adds languages; `initialize(name, age?, languages?)`
pub fn developer(person: &Node) -> Node {
    let parent = person.clone();
    person
        .extend(
            "Developer",
            ClassDef::new()
                .instance_vars(
                    PropertyMap::new()
                        .with("languages", json!([]))
                        .with("mainLanguage", json!({"name": "C", "hours": 10})),
                )
                .class_vars(PropertyMap::new().with_method("initialize", move |this, args| {
                    call_initializer(this, &parent, &args[..args.len().min(2)])?;

                    let main = this.get("mainLanguage")?.as_json().cloned().unwrap_or_default();
                    let mut languages = vec![main];
                    if let Some(extra) = args.get(2).and_then(|v| v.as_json()?.as_array().cloned()) {
                        languages.extend(extra);
                    }
                    // Read-only but configurable: redefine instead of assign
                    this.define_property(
                        "languages",
                        PropertyDescriptor::new().value(json!(languages)),
                    )?;
                    Ok(Value::Undefined)
                }))
                .ivar_descriptor("languages", PropertyDescriptor::new().writable(false))
                .ivar_descriptor("mainLanguage", PropertyDescriptor::new().writable(false)),
        )
        .expect("Developer class")
}

/// Javascript Developer: `initialize(name, age?, languages?, expertise?)`
pub fn javascript_developer(developer: &Node) -> Node {
    let parent = developer.clone();
    developer
        .extend(
            "Javascript Developer",
            ClassDef::new()
                .instance_vars(
                    PropertyMap::new()
                        .with("node", false)
                        .with("es5", false)
                        .with("html5", false),
                )
                .class_vars(PropertyMap::new().with_method("initialize", move |this, args| {
                    call_initializer(this, &parent, &args[..args.len().min(3)])?;

                    let expertise = args.get(3).and_then(|v| v.as_json()?.as_object().cloned());
                    if let Some(expertise) = expertise {
                        for key in ["node", "es5", "html5"] {
                            if expertise.get(key).and_then(|f| f.as_bool()) == Some(true) {
                                this.set(key, true)?;
                            }
                        }
                    }
                    Ok(Value::Undefined)
                }))
                .ivar_descriptor(
                    "mainLanguage",
                    PropertyDescriptor::new()
                        .value(json!({"name": "Javascript", "hours": 10}))
                        .writable(false)
                        .enumerable(true)
                        .configurable(true),
                ),
        )
        .expect("Javascript Developer class")
}
