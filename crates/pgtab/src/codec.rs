//! Tagged text codec for column values.
//!
//! Every value is stored as a single text token:
//! - primitives as bare JSON scalars (`30`, `true`, `"u1"`)
//! - structured values inside an envelope `{"body": <json>, "type": <name>}`,
//!   re-serialized as a JSON string so the envelope survives typeless storage.
//!
//! Decoding needs a [`TypeRegistry`] to turn an envelope's type name back into a
//! concrete Rust type. The codec is a plain value: build one, wrap it in an `Arc`
//! and hand it to every table that should share the registry.
//!
//! ```ignore
//! let mut registry = TypeRegistry::new();
//! registry.register::<Address>();
//! let codec = ValueCodec::new(registry);
//!
//! let text = codec.encode(&Value::object(address))?;
//! let back = codec.decode(&text)?;
//! ```

use crate::error::{TabError, TabResult};
use crate::model::TableModel;
use crate::value::{FromValue, Object, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a structured value from an envelope body.
pub type DecodeTarget = Arc<dyn Fn(serde_json::Value) -> TabResult<Object> + Send + Sync>;

/// Maps envelope type names to decode targets.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    targets: HashMap<String, DecodeTarget>,
    names: HashMap<TypeId, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `std::any::type_name::<T>()`.
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: Serialize + DeserializeOwned + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        self.register_as::<T>(std::any::type_name::<T>())
    }

    /// Register `T` under an explicit name.
    ///
    /// Use this for names that must stay stable across crate renames, or to read
    /// envelopes written by another system. The last name registered for a type
    /// is the one used when encoding it.
    pub fn register_as<T>(&mut self, name: impl Into<String>) -> &mut Self
    where
        T: Serialize + DeserializeOwned + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        let name = name.into();
        let tag: Arc<str> = Arc::from(name.as_str());
        let target: DecodeTarget = Arc::new(move |body| {
            let value: T = serde_json::from_value(body)
                .map_err(|e| TabError::decode(format!("body of '{}': {}", tag, e)))?;
            Ok(Object::named(tag.clone(), value))
        });
        self.names.insert(TypeId::of::<T>(), name.clone());
        self.targets.insert(name, target);
        self
    }

    /// Register every structured field type of a table model.
    pub fn register_model<M: TableModel>(&mut self) -> &mut Self {
        M::register_types(self);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<T>(mut self) -> Self
    where
        T: Serialize + DeserializeOwned + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        self.register::<T>();
        self
    }

    /// Look up the decode target for an envelope type name.
    pub fn resolve(&self, name: &str) -> TabResult<&DecodeTarget> {
        self.targets
            .get(name)
            .ok_or_else(|| TabError::UnknownType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    /// Name a registered Rust type is encoded under.
    pub fn name_of(&self, type_id: TypeId) -> Option<&str> {
        self.names.get(&type_id).map(String::as_str)
    }

    /// Registered type names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

/// Order in which a bare JSON number is tried against the numeric kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumberLadder {
    /// Smallest exact kind: i32, then i64, then f64.
    #[default]
    Exact,
    /// Historical order: i32, f64, f32, i64, i8, i16.
    Legacy,
}

impl NumberLadder {
    fn parse(self, text: &str) -> Option<Value> {
        match self {
            NumberLadder::Exact => text
                .parse::<i32>()
                .map(Value::I32)
                .or_else(|_| text.parse::<i64>().map(Value::I64))
                .ok()
                .or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(Value::F64)
                }),
            NumberLadder::Legacy => text
                .parse::<i32>()
                .ok()
                .map(Value::I32)
                .or_else(|| text.parse::<f64>().ok().map(Value::F64))
                .or_else(|| text.parse::<f32>().ok().map(Value::F32))
                .or_else(|| text.parse::<i64>().ok().map(Value::I64))
                .or_else(|| text.parse::<i8>().ok().map(Value::I8))
                .or_else(|| text.parse::<i16>().ok().map(Value::I16)),
        }
    }
}

/// Encodes values to tagged text and decodes them back.
#[derive(Debug, Clone, Default)]
pub struct ValueCodec {
    registry: TypeRegistry,
    ladder: NumberLadder,
}

impl ValueCodec {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            ladder: NumberLadder::default(),
        }
    }

    pub fn with_number_ladder(mut self, ladder: NumberLadder) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn number_ladder(&self) -> NumberLadder {
        self.ladder
    }

    /// Encode a value to its tagged text form.
    ///
    /// Only structured values can fail, when their serializer does.
    pub fn encode(&self, value: &Value) -> TabResult<String> {
        Ok(match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::I8(v) => v.to_string(),
            Value::I16(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::F32(v) if v.is_finite() => to_json_text(v)?,
            Value::F32(v) => non_finite_text(f64::from(*v)).to_string(),
            Value::F64(v) if v.is_finite() => to_json_text(v)?,
            Value::F64(v) => non_finite_text(*v).to_string(),
            Value::Text(s) => to_json_text(s)?,
            Value::Json(j) => j.to_string(),
            Value::Object(o) => to_json_text(&self.envelope(o)?)?,
        })
    }

    /// Decode tagged text back into a value.
    ///
    /// Accepts both the quoted envelope written by [`encode`](Self::encode) and
    /// the escaped envelope written by [`to_storage`](Self::to_storage).
    pub fn decode(&self, text: &str) -> TabResult<Value> {
        let text = text.trim();
        if text.contains("type") && text.contains("body") {
            if let Some((name, body)) = parse_envelope(text) {
                let target = self.registry.resolve(&name)?;
                return target(body).map(Value::Object);
            }
        }
        Ok(self.decode_primitive(text))
    }

    /// Decode and convert in one step.
    pub fn decode_as<T: FromValue>(&self, text: &str) -> TabResult<T> {
        T::from_value(self.decode(text)?)
    }

    /// Text stored in a column for `value`; `None` is SQL NULL.
    pub fn to_storage(&self, value: &Value) -> TabResult<Option<String>> {
        let stored = match value {
            Value::Null => return Ok(None),
            Value::Text(s) if self.reads_back_as_text(s) => s.clone(),
            Value::Object(o) => {
                let quoted = to_json_text(&self.envelope(o)?)?;
                strip_outer_quotes(&quoted).to_string()
            }
            other => self.encode(other)?,
        };
        Ok(Some(stored))
    }

    /// Text stored in a `JSON`/`JSONB` column for `value`; `None` is SQL NULL.
    ///
    /// Always a valid JSON document: text as a JSON string, structured values
    /// as the bare envelope. Non-finite floats have no JSON form and fail.
    pub fn to_json_storage(&self, value: &Value) -> TabResult<Option<String>> {
        let stored = match value {
            Value::Null => return Ok(None),
            Value::Object(o) => self.envelope(o)?,
            Value::F32(v) if !v.is_finite() => {
                return Err(TabError::encode(format!("{} has no JSON form", v)));
            }
            Value::F64(v) if !v.is_finite() => {
                return Err(TabError::encode(format!("{} has no JSON form", v)));
            }
            other => self.encode(other)?,
        };
        Ok(Some(stored))
    }

    /// Read a stored column back; SQL NULL becomes [`Value::Null`].
    pub fn from_storage(&self, stored: Option<&str>) -> TabResult<Value> {
        match stored {
            Some(text) => self.decode(text),
            None => Ok(Value::Null),
        }
    }

    /// Storage text as a single-quoted SQL literal, for the textual statement forms.
    pub fn sql_literal(&self, value: &Value) -> TabResult<String> {
        Ok(match self.to_storage(value)? {
            Some(text) => format!("'{}'", text.replace('\'', "''")),
            None => "NULL".to_string(),
        })
    }

    fn envelope(&self, object: &Object) -> TabResult<String> {
        let name = if self.registry.contains(object.type_name()) {
            object.type_name()
        } else {
            self.registry
                .name_of(object.type_id())
                .unwrap_or(object.type_name())
        };
        let body = object.to_json()?;
        Ok(serde_json::json!({ "type": name, "body": body }).to_string())
    }

    fn reads_back_as_text(&self, s: &str) -> bool {
        matches!(self.decode(s), Ok(Value::Text(ref t)) if t == s)
    }

    fn decode_primitive(&self, text: &str) -> Value {
        if let Some(value) = self.parse_scalar(text) {
            return value;
        }
        let unescaped = unescape_quotes(text);
        if unescaped != text {
            if let Some(value) = self.parse_scalar(&unescaped) {
                return value;
            }
        }
        if let Some(value) = parse_non_finite(text) {
            return value;
        }
        Value::Text(unescaped)
    }

    fn parse_scalar(&self, text: &str) -> Option<Value> {
        use serde_json::Value as Json;
        let json: Json = serde_json::from_str(text).ok()?;
        Some(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => self
                .ladder
                .parse(text)
                .unwrap_or_else(|| Value::Json(Json::Number(n))),
            Json::String(s) => Value::Text(s),
            other => Value::Json(other),
        })
    }
}

fn to_json_text<T: Serialize + ?Sized>(value: &T) -> TabResult<String> {
    serde_json::to_string(value).map_err(|e| TabError::encode(e.to_string()))
}

fn non_finite_text(v: f64) -> &'static str {
    if v.is_nan() {
        "NaN"
    } else if v > 0.0 {
        "inf"
    } else {
        "-inf"
    }
}

fn parse_non_finite(text: &str) -> Option<Value> {
    match text {
        "NaN" => Some(Value::F64(f64::NAN)),
        "inf" | "Infinity" => Some(Value::F64(f64::INFINITY)),
        "-inf" | "-Infinity" => Some(Value::F64(f64::NEG_INFINITY)),
        _ => None,
    }
}

fn unescape_quotes(text: &str) -> String {
    text.replace("\\\"", "\"")
}

fn strip_outer_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(text)
}

/// Find a `{type, body}` envelope in `text`, whichever escaping layer it was written with.
fn parse_envelope(text: &str) -> Option<(String, serde_json::Value)> {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
        let found = match json {
            serde_json::Value::String(inner) => envelope_from_str(&inner),
            other => envelope_parts(other),
        };
        if found.is_some() {
            return found;
        }
    }

    if let Ok(inner) = serde_json::from_str::<String>(&format!("\"{}\"", text)) {
        if let Some(found) = envelope_from_str(&inner) {
            return Some(found);
        }
    }

    if let Some(found) = envelope_from_str(strip_outer_quotes(text)) {
        return Some(found);
    }

    envelope_from_str(&unescape_quotes(text))
}

fn envelope_from_str(text: &str) -> Option<(String, serde_json::Value)> {
    serde_json::from_str(text).ok().and_then(envelope_parts)
}

fn envelope_parts(json: serde_json::Value) -> Option<(String, serde_json::Value)> {
    let serde_json::Value::Object(mut map) = json else {
        return None;
    };
    if map.len() != 2 {
        return None;
    }
    let name = match map.get("type") {
        Some(serde_json::Value::String(name)) => name.clone(),
        _ => return None,
    };
    let body = map.remove("body")?;
    Some((name, body))
}
