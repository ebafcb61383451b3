//! Schemas described as JSON documents.
//!
//! Type markers are strings (`"String"`, `"Number"`, ... name the native types,
//! anything else is a tag taken verbatim) or one-element arrays of markers.
//! Property entries are markers or attribute objects. Validators and parent
//! schemas can't be written in JSON; attach them through [`SchemaOptions`] in code.
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;

use crate::error::{Result, SchemaError};
use crate::schema::{
    Descriptor, DescriptorAttributes, PropertyDecl, Schema, SchemaOptions, Shape, TypeDecl,
};
use crate::type_tag::native_type_for;
use crate::value::Value;

const ATTRIBUTES: &str = "descriptor: attributes argument: ";
const OPTIONS: &str = "schema: arguments: options: ";
const SHAPE: &str = "schema: arguments: descriptors: ";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    required: Option<bool>,
}

#[derive(Deserialize)]
struct RawAttributes {
    name: Option<String>,
    /// Outer `None`: key absent. `Some(None)`: explicit `null`.
    #[serde(default, deserialize_with = "present")]
    required: Option<Option<bool>>,
    #[serde(flatten)]
    rest: IndexMap<String, Json>,
}

fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Deserialize with JSON-path context in error messages.
fn from_json_with_path<T: DeserializeOwned>(json: &Json, context: &str) -> Result<T> {
    match serde_path_to_error::deserialize::<_, T>(json) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            let message = format!("at JSON path {path} → {}", err.into_inner());
            Err(SchemaError::configuration(context, message))
        }
    }
}

impl TypeDecl {
    /// Never fails; unusable markers are reported when the declaration is resolved.
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::String(name) => match native_type_for(name) {
                Some(native) => TypeDecl::Native(native),
                None => TypeDecl::Tag(name.clone()),
            },
            Json::Array(items) => TypeDecl::Array(items.iter().map(TypeDecl::from_json).collect()),
            other => TypeDecl::Value(Value::from(other.clone())),
        }
    }
}

impl DescriptorAttributes {
    /// `{"name": ..., "type": ..., "required": ..., "default": ...}`; any other
    /// key is kept as extra metadata.
    pub fn from_json(json: &Json) -> Result<Self> {
        if !json.is_object() {
            return Err(SchemaError::configuration(ATTRIBUTES, "missing or invalid"));
        }
        let RawAttributes {
            name,
            required,
            mut rest,
        } = from_json_with_path(json, ATTRIBUTES)?;
        if rest.contains_key("validator") {
            return Err(SchemaError::configuration(
                ATTRIBUTES,
                "validator: functions cannot be described in JSON",
            ));
        }
        // null is a real default and an invalid type, so neither can go through Option
        let default = rest.shift_remove("default").map(Value::from);
        let type_decl = rest.shift_remove("type").as_ref().map(TypeDecl::from_json);
        Ok(Self {
            name,
            type_decl,
            // an explicit null reads as "not required" and blocks the schema-wide default
            required: required.map(|r| r.unwrap_or(false)),
            default,
            validator: None,
            extra: rest.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        })
    }
}

impl SchemaOptions {
    /// Only `required` can be given in JSON. Unknown keys are an error.
    pub fn from_json(json: &Json) -> Result<Self> {
        if !json.is_object() {
            return Err(SchemaError::configuration(OPTIONS, "must be of type [object]"));
        }
        let RawOptions { required } = from_json_with_path(json, OPTIONS)?;
        Ok(Self {
            required,
            ..Self::default()
        })
    }
}

impl Shape {
    /// An object maps names to markers or attribute objects; an array is a list
    /// of attribute objects that each carry their own `name`.
    pub fn from_json(json: &Json) -> Result<Self> {
        match json {
            Json::Object(entries) => {
                let mut properties = IndexMap::with_capacity(entries.len());
                for (name, entry) in entries {
                    let decl = match entry {
                        Json::String(_) | Json::Array(_) => {
                            PropertyDecl::Type(TypeDecl::from_json(entry))
                        }
                        Json::Object(_) => {
                            PropertyDecl::Attributes(DescriptorAttributes::from_json(entry)?)
                        }
                        _ => {
                            let message = format!("{name}: invalid descriptor");
                            return Err(SchemaError::configuration(SHAPE, message));
                        }
                    };
                    properties.insert(name.clone(), decl);
                }
                Ok(Shape::Properties(properties))
            }
            Json::Array(items) => items
                .iter()
                .map(|item| Descriptor::new(DescriptorAttributes::from_json(item)?))
                .collect::<Result<Vec<_>>>()
                .map(Shape::Descriptors),
            _ => Err(SchemaError::configuration(SHAPE, "must be of type [object]")),
        }
    }
}

impl Schema {
    pub fn from_json(options: Option<&Json>, shape: &Json) -> Result<Self> {
        let options = match options {
            Some(json) if !json.is_null() => SchemaOptions::from_json(json)?,
            _ => SchemaOptions::default(),
        };
        Schema::with_options(options, Shape::from_json(shape)?)
    }
}
