//! Native values carried between rows and domain objects.
//!
//! A [`Value`] is what one column of a decoded row holds. Primitive kinds map
//! one-to-one onto Rust scalars; structured values are kept type-erased in an
//! [`Object`] together with the name they are tagged with in storage.

use crate::error::{TabError, TabResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// One decoded column value.
#[derive(Debug, Clone)]
pub enum Value {
    /// SQL NULL
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    /// Untagged JSON array or object found in storage.
    Json(serde_json::Value),
    /// A structured value that travels inside a `{type, body}` envelope.
    Object(Object),
}

impl Value {
    /// Wrap a structured value, tagging it with its Rust type name.
    pub fn object<T>(value: T) -> Self
    where
        T: Serialize + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        Value::Object(Object::new(value))
    }

    /// Wrap a structured value under an explicit type name.
    pub fn object_named<T>(type_name: impl Into<Arc<str>>, value: T) -> Self
    where
        T: Serialize + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        Value::Object(Object::named(type_name, value))
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Text(_) => "text",
            Value::Json(_) => "json",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive kinds are stored as bare scalars; everything else is structured.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::I8(_)
                | Value::I16(_)
                | Value::I32(_)
                | Value::I64(_)
                | Value::F32(_)
                | Value::F64(_)
                | Value::Text(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Clone the structured value out if it is a `T`.
    pub fn to_object<T: Clone + 'static>(&self) -> Option<T> {
        self.as_object()?.downcast_ref::<T>().cloned()
    }

    /// Convert to a JSON value (structured values yield their body).
    pub fn to_json(&self) -> TabResult<serde_json::Value> {
        use serde_json::Value as Json;
        Ok(match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::I8(v) => Json::from(*v),
            Value::I16(v) => Json::from(*v),
            Value::I32(v) => Json::from(*v),
            Value::I64(v) => Json::from(*v),
            Value::F32(v) => Json::from(*v),
            Value::F64(v) => Json::from(*v),
            Value::Text(s) => Json::String(s.clone()),
            Value::Json(j) => j.clone(),
            Value::Object(o) => o.to_json()?,
        })
    }

    /// Deserialize the value into any serde type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> TabResult<T> {
        serde_json::from_value(self.to_json()?)
            .map_err(|e| TabError::decode(format!("{} value: {}", self.kind(), e)))
    }

    fn as_number(&self) -> Option<Number> {
        match *self {
            Value::I8(v) => Some(Number::Int(i64::from(v))),
            Value::I16(v) => Some(Number::Int(i64::from(v))),
            Value::I32(v) => Some(Number::Int(i64::from(v))),
            Value::I64(v) => Some(Number::Int(v)),
            Value::F32(v) => Some(Number::F32(v)),
            Value::F64(v) => Some(Number::F64(v)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    F32(f32),
    F64(f64),
}

fn int_eq_float(i: i64, f: f64) -> bool {
    f.fract() == 0.0 && i as f64 == f && f as i64 == i
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::F32(a), Number::F32(b)) => a == b,
            (Number::F64(a), Number::F64(b)) => a == b,
            (Number::F32(a), Number::F64(b)) | (Number::F64(b), Number::F32(a)) => b as f32 == a,
            (Number::Int(i), Number::F64(f)) | (Number::F64(f), Number::Int(i)) => int_eq_float(i, f),
            (Number::Int(i), Number::F32(f)) | (Number::F32(f), Number::Int(i)) => {
                int_eq_float(i, f64::from(f))
            }
        }
    }
}

/// Numbers compare by value across widths; everything else compares within its kind.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

trait ErasedObject: fmt::Debug + Send + Sync {
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
    fn eq_erased(&self, other: &dyn ErasedObject) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T> ErasedObject for T
where
    T: Serialize + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn eq_erased(&self, other: &dyn ErasedObject) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| o == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type-erased structured value plus the type name it is tagged with.
#[derive(Clone)]
pub struct Object {
    type_name: Arc<str>,
    inner: Arc<dyn ErasedObject>,
}

impl Object {
    /// Wrap `value`, tagging it with `std::any::type_name::<T>()`.
    pub fn new<T>(value: T) -> Self
    where
        T: Serialize + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        Self::named(std::any::type_name::<T>(), value)
    }

    /// Wrap `value` under an explicit type name.
    pub fn named<T>(type_name: impl Into<Arc<str>>, value: T) -> Self
    where
        T: Serialize + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            inner: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// `TypeId` of the wrapped Rust value.
    pub fn type_id(&self) -> TypeId {
        let any: &dyn Any = (*self.inner).as_any();
        Any::type_id(any)
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (*self.inner).as_any().downcast_ref::<T>()
    }

    /// Serialize the wrapped value to its JSON body.
    pub fn to_json(&self) -> TabResult<serde_json::Value> {
        (*self.inner)
            .to_json()
            .map_err(|e| TabError::encode(format!("{}: {}", self.type_name, e)))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        (*self.inner).eq_erased(&*other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type", &self.type_name)
            .field("value", &self.inner)
            .finish()
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Text,
    serde_json::Value => Json,
    Object => Object,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Conversion out of a decoded [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> TabResult<Self>;
}

fn unexpected<T>(expected: &str, found: &Value) -> TabResult<T> {
    Err(TabError::decode(format!(
        "expected {}, found {}",
        expected,
        found.kind()
    )))
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> TabResult<Self> {
                    let wide: i64 = match value {
                        Value::I8(v) => i64::from(v),
                        Value::I16(v) => i64::from(v),
                        Value::I32(v) => i64::from(v),
                        Value::I64(v) => v,
                        Value::F64(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => f as i64,
                        Value::F32(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => f as i64,
                        other => return unexpected(stringify!($ty), &other),
                    };
                    <$ty>::try_from(wide).map_err(|_| {
                        TabError::decode(format!("{} out of range for {}", wide, stringify!($ty)))
                    })
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64);

impl FromValue for f64 {
    fn from_value(value: Value) -> TabResult<Self> {
        match value.as_number() {
            Some(Number::Int(v)) => Ok(v as f64),
            Some(Number::F32(v)) => Ok(f64::from(v)),
            Some(Number::F64(v)) => Ok(v),
            None => unexpected("f64", &value),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> TabResult<Self> {
        match value.as_number() {
            Some(Number::Int(v)) => Ok(v as f32),
            Some(Number::F32(v)) => Ok(v),
            Some(Number::F64(v)) => Ok(v as f32),
            None => unexpected("f32", &value),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> TabResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => unexpected("bool", &other),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> TabResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => unexpected("text", &other),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> TabResult<Self> {
        Ok(value)
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> TabResult<Self> {
        value.to_json()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> TabResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn numbers_compare_across_widths() {
        assert_eq!(Value::I8(5), Value::I32(5));
        assert_eq!(Value::I64(42), Value::I16(42));
        assert_eq!(Value::F32(0.1), Value::F64(0.1));
        assert_eq!(Value::I32(3), Value::F64(3.0));
        assert_ne!(Value::I32(3), Value::F64(3.5));
        assert_ne!(Value::I32(1), Value::Bool(true));
        assert_ne!(Value::Text("1".into()), Value::I32(1));
    }

    #[test]
    fn objects_compare_by_inner_value() {
        let a = Value::object(Point { x: 1, y: 2 });
        let b = Value::object_named("legacy.Point", Point { x: 1, y: 2 });
        assert_eq!(a, b);
        assert_ne!(a, Value::object(Point { x: 2, y: 2 }));
        assert_ne!(a, Value::object("not a point".to_string()));
    }

    #[test]
    fn object_downcasts_to_its_type() {
        let value = Value::object(Point { x: 3, y: 4 });
        assert_eq!(value.to_object::<Point>(), Some(Point { x: 3, y: 4 }));
        assert_eq!(value.to_object::<String>(), None);

        let object = value.as_object().unwrap();
        assert_eq!(object.type_id(), TypeId::of::<Point>());
        assert!(object.type_name().ends_with("Point"));
    }

    #[test]
    fn from_value_narrows_with_range_check() {
        assert_eq!(i16::from_value(Value::I32(300)).unwrap(), 300);
        assert!(i8::from_value(Value::I32(300)).is_err());
        assert_eq!(i64::from_value(Value::F64(3e9)).unwrap(), 3_000_000_000);
        assert!(i32::from_value(Value::Text("1".into())).is_err());
    }

    #[test]
    fn from_value_handles_floats_and_options() {
        assert_eq!(f64::from_value(Value::I32(2)).unwrap(), 2.0);
        assert_eq!(f32::from_value(Value::F64(0.5)).unwrap(), 0.5);
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(Value::Text("u1".into())).unwrap(),
            Some("u1".to_string())
        );
    }

    #[test]
    fn deserialize_reads_structured_and_json_values() {
        let value = Value::object(Point { x: 1, y: 2 });
        assert_eq!(value.deserialize::<Point>().unwrap(), Point { x: 1, y: 2 });

        let json = Value::Json(serde_json::json!({"x": 5, "y": 6}));
        assert_eq!(json.deserialize::<Point>().unwrap(), Point { x: 5, y: 6 });
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }
}
