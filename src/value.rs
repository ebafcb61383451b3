//! Runtime values the schema engine walks.
//!
//! A superset of JSON: besides the JSON kinds it carries dates, regular
//! expressions, callables and class instances, plus an explicit `Undefined`
//! for "no value at all". Reading a missing key yields `Undefined`, so absent
//! and undefined are the same thing everywhere in this crate.
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::class::Class;

static UNDEFINED: Value = Value::Undefined;

// --------------------------------- Types ---------------------------------- //

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
    Date(DateTime<Utc>),
    RegExp(RegExp),
    Function(Function),
    Instance(Instance),
}

/// Insertion-ordered property map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object(IndexMap<String, Value>);

/// A compiled regular expression. Two regexps are equal when their sources are.
#[derive(Clone, Debug)]
pub struct RegExp(regex::Regex);

/// A named, shared callable. Equality is identity.
#[derive(Clone)]
pub struct Function {
    name: Option<String>,
    call: Arc<dyn Fn(&[Value]) -> Value + Send + Sync>,
}

/// An object built by a [`Class`]; remembers which class made it.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    class: Class,
    fields: Object,
}

// --------------------------------- Value ---------------------------------- //

impl Value {
    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(xs) => Some(xs),
            _ => None,
        }
    }

    /// The property map of an object or class instance.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            Value::Instance(i) => Some(&i.fields),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(o) => Some(o),
            Value::Instance(i) => Some(&mut i.fields),
            _ => None,
        }
    }

    /// Read a property. Values without properties read as `Undefined`.
    pub fn get(&self, name: &str) -> &Value {
        match self.as_object() {
            Some(o) => o.get(name),
            None => &UNDEFINED,
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.as_object_mut().and_then(|o| o.get_mut(name))
    }

    /// Write a property. Writes to values without properties are dropped,
    /// the same as assigning onto a primitive; returns whether it stuck.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.as_object_mut() {
            Some(o) => {
                o.set(name, value);
                true
            }
            None => false,
        }
    }

    /// Lossy conversion back to JSON: dates become RFC 3339 strings, regexps
    /// their source, non-finite numbers, functions and `Undefined` become null.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Number(n) => json_number(*n),
            Value::String(s) => J::String(s.clone()),
            Value::Array(xs) => J::Array(xs.iter().map(Value::to_json).collect()),
            Value::Object(o) => o.to_json(),
            Value::Instance(i) => i.fields.to_json(),
            Value::Date(d) => J::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::RegExp(r) => J::String(r.source().to_string()),
        }
    }
}

// prefer emitting integers when exact
fn json_number(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else {
        write!(f, "{n}")
    }
}

/// String coercion as it shows up in error messages.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Array(xs) => {
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    // null and undefined elements print as empty
                    if !matches!(x, Value::Null | Value::Undefined) {
                        write!(f, "{x}")?;
                    }
                }
                Ok(())
            }
            Value::Object(_) | Value::Instance(_) => f.write_str("[object Object]"),
            Value::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::RegExp(r) => write!(f, "/{}/", r.source()),
            Value::Function(func) => write!(f, "function {}", func.name().unwrap_or("")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Array(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs {
                    seq.serialize_element(x)?;
                }
                seq.end()
            }
            Value::Object(o) => o.serialize(serializer),
            Value::Instance(i) => i.fields.serialize(serializer),
            other => other.to_json().serialize(serializer),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(b),
            J::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            J::String(s) => Value::String(s),
            J::Array(xs) => Value::Array(xs.into_iter().map(Value::from).collect()),
            J::Object(m) => {
                Value::Object(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(xs: Vec<Value>) -> Self {
        Value::Array(xs)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<RegExp> for Value {
    fn from(r: RegExp) -> Self {
        Value::RegExp(r)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Instance> for Value {
    fn from(i: Instance) -> Self {
        Value::Instance(i)
    }
}

// --------------------------------- Object --------------------------------- //

impl Object {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Missing keys read as `Undefined`.
    pub fn get(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&UNDEFINED)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// True when the key holds anything other than `Undefined`.
    pub fn contains(&self, key: &str) -> bool {
        !self.get(key).is_undefined()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy over every key of `other` that is undefined here. Present values,
    /// falsy ones included, are never overwritten.
    pub fn set_defaults(&mut self, other: &Object) {
        for (key, value) in other.iter() {
            if !self.contains(key) {
                self.0.insert(key.to_string(), value.clone());
            }
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ---------------------- Regexp / function / instance ---------------------- //

impl RegExp {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(source).map(Self)
    }

    pub fn source(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for RegExp {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source()
    }
}

impl From<regex::Regex> for RegExp {
    fn from(r: regex::Regex) -> Self {
        Self(r)
    }
}

impl Function {
    pub fn new<F>(name: impl Into<String>, call: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            call: Arc::new(call),
        }
    }

    pub fn anonymous<F>(call: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: None,
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.call)(args)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Instance {
    pub(crate) fn new(class: Class, fields: Object) -> Self {
        Self { class, fields }
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn fields(&self) -> &Object {
        &self.fields
    }

    pub fn into_fields(self) -> Object {
        self.fields
    }
}

// --------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_keys_read_as_undefined() {
        let v = Value::from(json!({"a": 1}));
        assert_eq!(v.get("a"), &Value::Number(1.0));
        assert!(v.get("b").is_undefined());
        assert!(Value::from("text").get("length").is_undefined());
    }

    #[test]
    fn writes_to_primitives_are_dropped() {
        let mut v = Value::from(27);
        assert!(!v.set("x", Value::from(1)));
        assert_eq!(v, Value::Number(27.0));

        let mut o = Value::object();
        assert!(o.set("x", Value::from(1)));
        assert_eq!(o.get("x"), &Value::Number(1.0));
    }

    #[test]
    fn json_objects_keep_document_order() {
        let v = Value::from(json!({"z": 1, "a": 2, "m": 3}));
        let keys: Vec<&str> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(v.to_json(), json!({"z": 1, "a": 2, "m": 3}));
    }

    #[test]
    fn display_matches_message_coercion() {
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(27).to_string(), "27");
        assert_eq!(Value::from(7.62).to_string(), "7.62");
        assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::from(json!([1, null, "a"])).to_string(), "1,,a");
        assert_eq!(Value::object().to_string(), "[object Object]");
        assert_eq!(
            Value::from(RegExp::new("[a-z]").unwrap()).to_string(),
            "/[a-z]/"
        );
    }

    #[test]
    fn set_defaults_never_overwrites_present_values() {
        let mut o: Object = [("a", Value::from(false)), ("b", Value::Undefined)]
            .into_iter()
            .collect();
        let other: Object = [
            ("a", Value::from(true)),
            ("b", Value::from(2)),
            ("c", Value::from("x")),
        ]
        .into_iter()
        .collect();
        o.set_defaults(&other);
        assert_eq!(o.get("a"), &Value::Bool(false));
        assert_eq!(o.get("b"), &Value::Number(2.0));
        assert_eq!(o.get("c"), &Value::from("x"));
    }

    #[test]
    fn functions_compare_by_identity() {
        let f = Function::new("double", |args| match args.first() {
            Some(Value::Number(n)) => Value::Number(n * 2.0),
            _ => Value::Undefined,
        });
        let g = Function::new("double", |_| Value::Undefined);
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
        assert_eq!(f.call(&[Value::from(4)]), Value::Number(8.0));
    }

    #[test]
    fn only_exact_i64_range_serializes_as_integer() {
        assert_eq!(Value::from(-4.0).to_json(), json!(-4));
        // 2^63 is one past i64::MAX and must not saturate
        let two_pow_63 = 9_223_372_036_854_775_808.0_f64;
        assert_eq!(Value::from(two_pow_63).to_json(), json!(two_pow_63));
        assert!(Value::from(two_pow_63).to_json().is_f64());
        assert_eq!(Value::from(f64::INFINITY).to_json(), json!(null));
    }

    #[test]
    fn serializes_as_json() {
        let mut o = Object::new();
        o.set(
            "when",
            Value::Date(DateTime::<Utc>::from_timestamp(0, 0).unwrap()),
        );
        o.set("n", Value::from(3));
        o.set("skip", Value::Undefined);
        let text = serde_json::to_string(&Value::Object(o)).unwrap();
        assert_eq!(
            text,
            r#"{"when":"1970-01-01T00:00:00.000Z","n":3,"skip":null}"#
        );
    }
}
