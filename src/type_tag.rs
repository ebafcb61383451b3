//! Canonical type tags for runtime values.
//!
//! `classify` is total: every value maps to exactly one tag. Numbers collapse
//! to `number` unless numeric distinction is requested, in which case they
//! split into `nan`, `infinity`, `integer` and `float`.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::value::Value;

// ------------------------------- Tags ------------------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Object,
    String,
    Array,
    Date,
    Number,
    Integer,
    Float,
    NaN,
    Infinity,
    RegExp,
    Function,
    Boolean,
    Null,
    Undefined,
}

impl TypeTag {
    pub const ALL: [TypeTag; 14] = [
        TypeTag::Object,
        TypeTag::String,
        TypeTag::Array,
        TypeTag::Date,
        TypeTag::Number,
        TypeTag::Integer,
        TypeTag::Float,
        TypeTag::NaN,
        TypeTag::Infinity,
        TypeTag::RegExp,
        TypeTag::Function,
        TypeTag::Boolean,
        TypeTag::Null,
        TypeTag::Undefined,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Object => "object",
            TypeTag::String => "string",
            TypeTag::Array => "array",
            TypeTag::Date => "date",
            TypeTag::Number => "number",
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::NaN => "nan",
            TypeTag::Infinity => "infinity",
            TypeTag::RegExp => "regexp",
            TypeTag::Function => "function",
            TypeTag::Boolean => "boolean",
            TypeTag::Null => "null",
            TypeTag::Undefined => "undefined",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypeTag(pub String);

impl fmt::Display for UnknownTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown type tag: {}", self.0)
    }
}

impl std::error::Error for UnknownTypeTag {}

impl FromStr for TypeTag {
    type Err = UnknownTypeTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTypeTag(s.to_string()))
    }
}

// --------------------------- Native markers ------------------------------- //

/// The built-in constructors that can stand in for a type tag in a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeType {
    Object,
    String,
    Array,
    Date,
    Number,
    RegExp,
    Function,
    Boolean,
}

/// Read-only registry: native marker name -> (marker, canonical tag).
static REGISTRY: Lazy<HashMap<&'static str, (NativeType, TypeTag)>> = Lazy::new(|| {
    HashMap::from([
        ("Object", (NativeType::Object, TypeTag::Object)),
        ("String", (NativeType::String, TypeTag::String)),
        ("Array", (NativeType::Array, TypeTag::Array)),
        ("Date", (NativeType::Date, TypeTag::Date)),
        ("Number", (NativeType::Number, TypeTag::Number)),
        ("RegExp", (NativeType::RegExp, TypeTag::RegExp)),
        ("Function", (NativeType::Function, TypeTag::Function)),
        ("Boolean", (NativeType::Boolean, TypeTag::Boolean)),
    ])
});

impl NativeType {
    pub fn name(self) -> &'static str {
        match self {
            NativeType::Object => "Object",
            NativeType::String => "String",
            NativeType::Array => "Array",
            NativeType::Date => "Date",
            NativeType::Number => "Number",
            NativeType::RegExp => "RegExp",
            NativeType::Function => "Function",
            NativeType::Boolean => "Boolean",
        }
    }

    pub fn tag(self) -> TypeTag {
        REGISTRY[self.name()].1
    }
}

/// Look up a native marker by constructor name (`"String"`, `"Date"`, ...).
pub fn native_type_for(name: &str) -> Option<NativeType> {
    REGISTRY.get(name).map(|(native, _)| *native)
}

// ------------------------------ Classify ---------------------------------- //

pub fn classify(value: &Value, distinguish_numerics: bool) -> TypeTag {
    match value {
        Value::Undefined => TypeTag::Undefined,
        Value::Null => TypeTag::Null,
        Value::Number(n) if distinguish_numerics => {
            if n.is_nan() {
                TypeTag::NaN
            } else if n.is_infinite() {
                TypeTag::Infinity
            } else if n.fract() == 0.0 {
                TypeTag::Integer
            } else {
                TypeTag::Float
            }
        }
        Value::Number(_) => TypeTag::Number,
        Value::Bool(_) => TypeTag::Boolean,
        Value::String(_) => TypeTag::String,
        Value::Array(_) => TypeTag::Array,
        Value::Object(_) | Value::Instance(_) => TypeTag::Object,
        Value::Date(_) => TypeTag::Date,
        Value::RegExp(_) => TypeTag::RegExp,
        Value::Function(_) => TypeTag::Function,
    }
}

/// Anything but `null` and `undefined`. `0`, `false` and `""` all have a value.
pub fn has_value(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Undefined)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Function, Object, RegExp};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn registry_maps_native_markers() {
        assert_eq!(NativeType::Object.tag().as_str(), "object");
        assert_eq!(NativeType::Array.tag().as_str(), "array");
        assert_eq!(NativeType::Date.tag().as_str(), "date");
        assert_eq!(NativeType::Function.tag().as_str(), "function");
        assert_eq!(NativeType::RegExp.tag().as_str(), "regexp");
        assert_eq!(NativeType::Boolean.tag().as_str(), "boolean");
        assert_eq!(NativeType::String.tag().as_str(), "string");
        assert_eq!(NativeType::Number.tag().as_str(), "number");
        assert_eq!(native_type_for("Date"), Some(NativeType::Date));
        assert_eq!(native_type_for("date"), None);
    }

    #[test]
    fn classify_plain() {
        let date = Utc.with_ymd_and_hms(2011, 1, 11, 0, 0, 0).unwrap();
        let cases = [
            (Value::Undefined, "undefined"),
            (Value::Null, "null"),
            (Value::from(f64::NAN), "number"),
            (Value::from("test string"), "string"),
            (Value::from(date), "date"),
            (Value::from(Function::new("test", |_| Value::Undefined)), "function"),
            (Value::from(true), "boolean"),
            (Value::from(false), "boolean"),
            (Value::from(-1), "number"),
            (Value::from(0), "number"),
            (Value::from(9999), "number"),
            (Value::from(json!([1, 2, 3])), "array"),
            (Value::from(RegExp::new("[a-z]").unwrap()), "regexp"),
            (Value::from(Object::new()), "object"),
            (Value::from(json!({"foo": "bar"})), "object"),
        ];
        for (value, tag) in cases {
            assert_eq!(classify(&value, false).as_str(), tag, "{value:?}");
        }
    }

    #[test]
    fn classify_distinguishes_numerics_on_request() {
        assert_eq!(classify(&Value::from(f64::NAN), true), TypeTag::NaN);
        assert_eq!(
            classify(&Value::from(f64::INFINITY), true),
            TypeTag::Infinity
        );
        assert_eq!(
            classify(&Value::from(f64::NEG_INFINITY), true),
            TypeTag::Infinity
        );
        assert_eq!(classify(&Value::from(1), true), TypeTag::Integer);
        assert_eq!(classify(&Value::from(1.5), true), TypeTag::Float);
        assert_eq!(classify(&Value::from(1), false), TypeTag::Number);
        // non-numbers are unaffected by the flag
        assert_eq!(classify(&Value::from("1"), true), TypeTag::String);
    }

    #[test]
    fn has_value_only_rejects_null_and_undefined() {
        assert!(!has_value(&Value::Null));
        assert!(!has_value(&Value::Undefined));
        let present = [
            json!(0),
            json!(false),
            json!(""),
            json!({}),
            json!([]),
            json!(27),
        ];
        for v in present {
            assert!(has_value(&Value::from(v)));
        }
    }

    #[test]
    fn tags_parse_from_lowercase_names() {
        assert_eq!("integer".parse::<TypeTag>(), Ok(TypeTag::Integer));
        assert_eq!("regexp".parse::<TypeTag>(), Ok(TypeTag::RegExp));
        assert!("Number".parse::<TypeTag>().is_err());
    }
}
