//! Attribute values

use std::fmt;
use std::rc::Rc;

use super::Node;
use crate::error::Result;

type MethodFn = dyn Fn(&Node, &[Value]) -> Result<Value>;

/// A callable attribute. The receiver is always passed explicitly as the
/// first argument.
#[derive(Clone)]
pub struct Method(Rc<MethodFn>);

impl Method {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Node, &[Value]) -> Result<Value> + 'static,
    {
        Method(Rc::new(f))
    }

    /// Invoke with `receiver` bound as the object the method runs on
    pub fn call(&self, receiver: &Node, args: &[Value]) -> Result<Value> {
        (self.0)(receiver, args)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Method) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// The value held by a data attribute
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value; what a lookup of a missing attribute yields
    #[default]
    Undefined,
    /// Plain data
    Json(serde_json::Value),
    Method(Method),
    /// Reference to another node
    Object(Node),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(|v| v.as_str())
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_json().and_then(|v| v.as_i64())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_json().and_then(|v| v.as_f64())
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_json().and_then(|v| v.as_bool())
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Value::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Node> {
        match self {
            Value::Object(node) => Some(node),
            _ => None,
        }
    }

    /// JavaScript-style truthiness, used by initializers checking arguments
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Json(v) => match v {
                serde_json::Value::Null => false,
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
                serde_json::Value::String(s) => !s.is_empty(),
                _ => true,
            },
            Value::Method(_) | Value::Object(_) => true,
        }
    }
}

/// Data compares by value; methods and nodes by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Method(a), Value::Method(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Json(serde_json::Value::String(s)) => write!(f, "{}", s),
            Value::Json(v) => write!(f, "{}", v),
            Value::Method(_) => write!(f, "[method]"),
            Value::Object(node) => write!(f, "{}", node),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Json(serde_json::Value::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Json(serde_json::Value::String(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Json(serde_json::Value::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Json(serde_json::Value::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Json(serde_json::Value::from(n))
    }
}

impl From<Method> for Value {
    fn from(m: Method) -> Self {
        Value::Method(m)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Object(node)
    }
}
