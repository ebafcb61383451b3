//! One named property's contract: type, requiredness, default and validator.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Result, SchemaError};
use crate::schema::type_spec::{TypeDecl, TypeSpec};
use crate::type_tag::{classify, has_value};
use crate::value::Value;

pub type Validator = Arc<dyn Fn(&Value, &Descriptor) -> bool + Send + Sync>;

const CONTEXT: &str = "descriptor: attributes argument: ";

// --------------------------------- Types ---------------------------------- //

/// Raw, unresolved descriptor input.
#[derive(Clone, Default)]
pub struct DescriptorAttributes {
    pub name: Option<String>,
    pub type_decl: Option<TypeDecl>,
    pub required: Option<bool>,
    pub default: Option<Value>,
    pub validator: Option<Validator>,
    /// Arbitrary caller metadata, carried along untouched.
    pub extra: IndexMap<String, Value>,
}

#[derive(Clone)]
pub struct Descriptor {
    name: String,
    type_spec: Option<TypeSpec>,
    required: Option<bool>,
    default: Option<Value>,
    validator: Option<Validator>,
    extra: IndexMap<String, Value>,
}

// ------------------------------- Attributes ------------------------------- //

impl DescriptorAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn of_type(mut self, decl: impl Into<TypeDecl>) -> Self {
        self.type_decl = Some(decl.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Descriptor) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn shared_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for DescriptorAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorAttributes")
            .field("name", &self.name)
            .field("type_decl", &self.type_decl)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .field("extra", &self.extra)
            .finish()
    }
}

// ------------------------------- Descriptor ------------------------------- //

impl Descriptor {
    pub fn new(attributes: DescriptorAttributes) -> Result<Self> {
        let DescriptorAttributes {
            name,
            type_decl,
            required,
            default,
            validator,
            extra,
        } = attributes;
        let Some(name) = name else {
            return Err(SchemaError::configuration(
                CONTEXT,
                "missing required attribute: name",
            ));
        };
        let type_spec = type_decl.map(|decl| decl.resolve(CONTEXT)).transpose()?;
        Ok(Self {
            name,
            type_spec,
            required,
            // an undefined default is no default
            default: default.filter(|d| !d.is_undefined()),
            validator,
            extra,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_spec(&self) -> Option<&TypeSpec> {
        self.type_spec.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    /// `None` when requiredness was never declared (and may still be inherited).
    pub fn required(&self) -> Option<bool> {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn extras(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.extra.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_array_of(&self) -> bool {
        self.type_spec.as_ref().is_some_and(TypeSpec::is_array_of)
    }

    pub fn is_schema_type(&self) -> bool {
        self.type_spec
            .as_ref()
            .is_some_and(TypeSpec::is_schema_type)
    }

    pub fn is_class_type(&self) -> bool {
        self.type_spec.as_ref().is_some_and(TypeSpec::is_class_type)
    }

    pub fn description(&self) -> String {
        format!("{} property", self.name)
    }

    pub(crate) fn fill_required(&mut self, required: Option<bool>) {
        if self.required.is_none() {
            self.required = required;
        }
    }

    pub(crate) fn fill_validator(&mut self, validator: Option<&Validator>) {
        if self.validator.is_none() {
            self.validator = validator.cloned();
        }
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    /// Take every attribute the parent defines and this descriptor doesn't.
    /// Nested schemas on both sides are merged instead of replaced.
    pub(crate) fn inherit_from(&mut self, parent: &Descriptor) -> Result<()> {
        if let Some(spec) = &parent.type_spec {
            let merged = match &self.type_spec {
                None => Some(spec.clone()),
                Some(own) => own.merged_with(spec)?,
            };
            if merged.is_some() {
                self.type_spec = merged;
            }
        }
        self.fill_required(parent.required);
        self.fill_validator(parent.validator.as_ref());
        if self.default.is_none() {
            self.default = parent.default.clone();
        }
        for (key, value) in &parent.extra {
            self.extra
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        Ok(())
    }

    /// Default, check and write back this descriptor's property on `target`.
    pub fn get_set_value(&self, target: &mut Value) -> Result<()> {
        if !has_value(target) {
            return Err(SchemaError::Evaluation {
                property: self.name.clone(),
                message: format!("cannot evaluate, object is {target}"),
            });
        }

        if target.get(&self.name).is_undefined() {
            if let Some(default) = &self.default {
                target.set(&self.name, default.clone());
            }
        }

        // nested schemas replace every other check
        if let Some(TypeSpec::Schema(schema)) = &self.type_spec {
            tracing::trace!("{}: delegating to nested schema", self.name);
            match target.get_mut(&self.name) {
                Some(slot) => schema.validate_mut(slot)?,
                None => {
                    let mut value = Value::Undefined;
                    schema.validate_mut(&mut value)?;
                    target.set(&self.name, value);
                }
            }
            return Ok(());
        }

        let value = target.get(&self.name);
        if !has_value(value) {
            if self.is_required() {
                return Err(self.error(format!("is required but is {value}")));
            }
            return Ok(());
        }

        if let Some(validator) = &self.validator {
            if !validator(value, self) {
                return Err(self.error(format!("{value} failed validation")));
            }
        }

        match &self.type_spec {
            None => Ok(()),
            Some(spec) if spec.is_any() => Ok(()),
            Some(TypeSpec::ArrayOf(inner)) => {
                if value.as_array().is_none() {
                    return Err(self.error(format!("{value} is not of type [array]")));
                }
                let Some(items) = target.get_mut(&self.name).and_then(Value::as_array_mut) else {
                    return Ok(());
                };
                for item in items.iter_mut() {
                    match inner.as_ref() {
                        TypeSpec::Schema(schema) => schema.validate_mut(item)?,
                        scalar => self.check_type(scalar, item)?,
                    }
                }
                Ok(())
            }
            Some(spec) => self.check_type(spec, value),
        }
    }

    /// Scalar type check of one value against one spec.
    pub fn check_type(&self, spec: &TypeSpec, value: &Value) -> Result<()> {
        match spec {
            TypeSpec::Class(class) => {
                if class.is_instance(value) {
                    return Ok(());
                }
                let class_name = spec.class_name().unwrap_or("required class");
                let message = format!("{value} is not an instance of {class_name}");
                Err(self.error(message))
            }
            TypeSpec::Primitive(tag) => {
                if tag == super::type_spec::ANY
                    || classify(value, true).as_str() == tag
                    || classify(value, false).as_str() == tag
                {
                    return Ok(());
                }
                Err(self.error(format!("{value} is not of type [{tag}]")))
            }
            TypeSpec::Schema(schema) => schema.validate(value.clone()).map(|_| ()),
            TypeSpec::ArrayOf(inner) => match value.as_array() {
                Some(items) => items
                    .iter()
                    .try_for_each(|item| self.check_type(inner, item)),
                None => Err(self.error(format!("{value} is not of type [array]"))),
            },
        }
    }

    fn error(&self, message: String) -> SchemaError {
        tracing::debug!("{}: {}", self.description(), message);
        SchemaError::Validation {
            property: self.name.clone(),
            message,
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("type_spec", &self.type_spec)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .field("extra", &self.extra)
            .finish()
    }
}

// --------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;
    use crate::schema::{Schema, Shape};
    use crate::type_tag::NativeType;
    use crate::value::{Function, RegExp};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn descriptor(attributes: DescriptorAttributes) -> Descriptor {
        Descriptor::new(attributes).unwrap()
    }

    fn typed(name: &str, decl: impl Into<TypeDecl>) -> Descriptor {
        descriptor(DescriptorAttributes::named(name).of_type(decl))
    }

    fn obj(v: serde_json::Value) -> Value {
        Value::from(v)
    }

    #[test]
    fn name_is_mandatory() {
        let attributes = DescriptorAttributes::new().of_type(NativeType::String);
        let err = Descriptor::new(attributes).unwrap_err();
        assert_eq!(
            err.to_string(),
            "descriptor: attributes argument: missing required attribute: name"
        );
    }

    #[test]
    fn extra_metadata_is_kept() {
        let d = descriptor(DescriptorAttributes::named("title").extra("label", "Title"));
        assert_eq!(d.extra("label"), Some(&Value::from("Title")));
        assert_eq!(d.description(), "title property");
    }

    #[test]
    fn leaves_conforming_objects_alone() {
        let d = typed("name", NativeType::String);
        let conforming = [
            json!({"name": "jane"}),
            json!({}),
            json!({"other": true}),
            json!({"name": "jane", "other": true}),
        ];
        for v in conforming {
            let mut target = obj(v.clone());
            d.get_set_value(&mut target).unwrap();
            assert_eq!(target, obj(v));
        }
    }

    #[test]
    fn absent_target_cannot_be_evaluated() {
        let d = descriptor(DescriptorAttributes::named("x"));
        let err = d.get_set_value(&mut Value::Null).unwrap_err();
        assert!(err.is_evaluation());
        assert_eq!(
            err.to_string(),
            "Descriptor: x: cannot evaluate, object is null"
        );
    }

    #[test]
    fn default_fills_only_absent_properties() {
        let d = descriptor(
            DescriptorAttributes::named("text")
                .of_type(NativeType::String)
                .default_value("link"),
        );
        let mut empty = Value::object();
        d.get_set_value(&mut empty).unwrap();
        assert_eq!(empty, obj(json!({"text": "link"})));

        let mut custom = obj(json!({"text": "custom"}));
        d.get_set_value(&mut custom).unwrap();
        assert_eq!(custom, obj(json!({"text": "custom"})));

        // null is present-but-empty, not absent
        let mut null = obj(json!({"text": null}));
        d.get_set_value(&mut null).unwrap();
        assert_eq!(null.get("text"), &Value::Null);
    }

    #[test]
    fn required_rejects_null_and_missing() {
        let d = descriptor(
            DescriptorAttributes::named("name")
                .of_type(NativeType::String)
                .required(true),
        );
        let err = d.get_set_value(&mut Value::object()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "name property: is required but is undefined"
        );
        assert!(d.get_set_value(&mut obj(json!({"name": null}))).is_err());
        assert!(d.get_set_value(&mut obj(json!({"name": ""}))).is_ok());
    }

    #[test]
    fn validator_sees_value_and_descriptor() {
        let d = descriptor(DescriptorAttributes::named("age").validator(|value, descriptor| {
            descriptor.name() == "age" && value.as_f64().is_some_and(|n| n >= 0.0)
        }));
        assert!(d.get_set_value(&mut obj(json!({"age": 3}))).is_ok());
        let err = d.get_set_value(&mut obj(json!({"age": -3}))).unwrap_err();
        assert_eq!(err.to_string(), "age property: -3 failed validation");
        // validators never run on absent values
        assert!(d.get_set_value(&mut Value::object()).is_ok());
    }

    #[test]
    fn distinguishes_every_native_type() {
        let class = Class::builder("TestClass").build();
        let instance = class.construct(Value::object()).unwrap();
        let date = Utc.with_ymd_and_hms(2011, 1, 11, 0, 0, 0).unwrap();
        let function = Function::new("test", |_| Value::Undefined);
        let regexp = RegExp::new("[a-z]").unwrap();
        let cases: Vec<(TypeDecl, Value)> = vec![
            (NativeType::Boolean.into(), Value::from(true)),
            (NativeType::Number.into(), Value::from(-1)),
            (NativeType::Array.into(), obj(json!([1, 2, 3]))),
            (NativeType::Date.into(), Value::from(date)),
            (NativeType::String.into(), Value::from("test string")),
            (NativeType::Object.into(), Value::object()),
            (NativeType::Function.into(), Value::from(function)),
            (NativeType::RegExp.into(), Value::from(regexp)),
            (class.clone().into(), instance),
            ("integer".into(), Value::from(99)),
            ("float".into(), Value::from(7.62)),
        ];

        for (i, (decl, valid)) in cases.iter().enumerate() {
            let d = typed("p", decl.clone());
            let mut target = Value::object();
            target.set("p", valid.clone());
            d.get_set_value(&mut target).unwrap();

            let list = typed("p", TypeDecl::array_of(decl.clone()));
            let mut target = Value::object();
            target.set("p", Value::Array(vec![valid.clone()]));
            list.get_set_value(&mut target).unwrap();

            for (j, (_, invalid)) in cases.iter().enumerate() {
                if i == j {
                    continue;
                }
                let mut target = Value::object();
                target.set("p", invalid.clone());
                let result = d.get_set_value(&mut target);
                // plain numbers accept integers and floats alike, and every
                // class instance is also an object
                let tolerated = matches!((i, j), (1, 9) | (1, 10) | (9, 1) | (5, 8));
                assert_eq!(result.is_ok(), tolerated, "type #{i} against value #{j}");
            }
        }
    }

    #[test]
    fn numbers_of_the_wrong_kind_fail() {
        let d = typed("n", "integer");
        let err = d.get_set_value(&mut obj(json!({"n": 1.5}))).unwrap_err();
        assert_eq!(err.to_string(), "n property: 1.5 is not of type [integer]");
        let number = typed("n", NativeType::Number);
        assert!(number.get_set_value(&mut obj(json!({"n": false}))).is_err());
        assert!(number.get_set_value(&mut obj(json!({"n": 0}))).is_ok());
    }

    #[test]
    fn array_of_checks_every_element() {
        let d = typed("tags", TypeDecl::array_of(NativeType::String));
        let mut strings = obj(json!({"tags": ["a", "b"]}));
        assert!(d.get_set_value(&mut strings).is_ok());
        assert!(d.get_set_value(&mut obj(json!({"tags": []}))).is_ok());
        let mut scalar = obj(json!({"tags": "not-an-array"}));
        let err = d.get_set_value(&mut scalar).unwrap_err();
        assert_eq!(
            err.to_string(),
            "tags property: not-an-array is not of type [array]"
        );
        assert!(d.get_set_value(&mut obj(json!({"tags": [1, 2]}))).is_err());
    }

    #[test]
    fn array_of_schema_rewrites_elements() {
        let size = DescriptorAttributes::new()
            .of_type(NativeType::Number)
            .default_value(1);
        let item = Schema::new(Shape::new().property("size", size)).unwrap();
        let d = typed("items", TypeDecl::array_of(item));
        let mut target = obj(json!({"items": [{}, {"size": 4}, null]}));
        d.get_set_value(&mut target).unwrap();
        let expected = json!({"items": [{"size": 1}, {"size": 4}, {"size": 1}]});
        assert_eq!(target, obj(expected));
    }

    #[test]
    fn nested_schema_replaces_other_checks() {
        let age = DescriptorAttributes::new()
            .of_type(NativeType::Number)
            .required(true);
        let inner = Schema::new(Shape::new().property("age", age)).unwrap();
        // not required, yet the nested schema's own requirements apply
        let d = typed("person", inner);
        let err = d.get_set_value(&mut Value::object()).unwrap_err();
        assert_eq!(err.property(), Some("age"));
        let mut target = obj(json!({"person": {"age": 27}}));
        d.get_set_value(&mut target).unwrap();
        assert_eq!(target, obj(json!({"person": {"age": 27}})));
    }

    #[test]
    fn any_accepts_everything_but_still_requires() {
        let d = descriptor(
            DescriptorAttributes::named("x")
                .of_type("any")
                .required(true),
        );
        assert!(d.get_set_value(&mut obj(json!({"x": 27}))).is_ok());
        assert!(d.get_set_value(&mut obj(json!({"x": "jane"}))).is_ok());
        assert!(d.get_set_value(&mut Value::object()).is_err());
    }
}
