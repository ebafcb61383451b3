//! Declared property types, raw and resolved.
//!
//! A [`TypeDecl`] is whatever the caller wrote in the `type` slot. It is
//! resolved exactly once, when the descriptor is built, into the closed
//! [`TypeSpec`] union that validation dispatches on.
use crate::class::Class;
use crate::error::{Result, SchemaError};
use crate::schema::Schema;
use crate::type_tag::NativeType;
use crate::value::Value;

/// The `"any"` tag: accept every value, skip type checking.
pub const ANY: &str = "any";

#[derive(Clone, Debug)]
pub enum TypeDecl {
    /// A tag name taken verbatim (`"string"`, `"integer"`, `"any"`, ...).
    Tag(String),
    Native(NativeType),
    Class(Class),
    Schema(Schema),
    /// `[X]`: a sequence whose elements are all `X`. Exactly one element.
    Array(Vec<TypeDecl>),
    /// A runtime value used as a type marker. Only strings and one-element
    /// arrays of markers are meaningful; anything else is an invalid type.
    Value(Value),
}

#[derive(Clone, Debug)]
pub enum TypeSpec {
    Primitive(String),
    Class(Class),
    Schema(Schema),
    /// Never wraps another `ArrayOf`.
    ArrayOf(Box<TypeSpec>),
}

impl TypeDecl {
    pub fn array_of(inner: impl Into<TypeDecl>) -> Self {
        TypeDecl::Array(vec![inner.into()])
    }

    fn is_array(&self) -> bool {
        matches!(self, TypeDecl::Array(_) | TypeDecl::Value(Value::Array(_)))
    }

    /// Resolve into a [`TypeSpec`]. `context` prefixes configuration errors.
    pub fn resolve(self, context: &str) -> Result<TypeSpec> {
        match self {
            TypeDecl::Tag(tag) if tag.is_empty() => {
                Err(SchemaError::configuration(context, "invalid type"))
            }
            TypeDecl::Tag(tag) => Ok(TypeSpec::Primitive(tag)),
            TypeDecl::Native(native) => Ok(TypeSpec::Primitive(native.tag().as_str().to_string())),
            TypeDecl::Class(class) => Ok(TypeSpec::Class(class)),
            TypeDecl::Schema(schema) => Ok(TypeSpec::Schema(schema)),
            TypeDecl::Array(items) => resolve_array(items, context),
            TypeDecl::Value(Value::String(tag)) => TypeDecl::Tag(tag).resolve(context),
            TypeDecl::Value(Value::Array(items)) => {
                resolve_array(items.into_iter().map(TypeDecl::Value).collect(), context)
            }
            TypeDecl::Value(_) => Err(SchemaError::configuration(context, "invalid type")),
        }
    }
}

fn resolve_array(mut items: Vec<TypeDecl>, context: &str) -> Result<TypeSpec> {
    if items.len() != 1 {
        return Err(SchemaError::configuration(
            context,
            "type array must contain exactly one element specifying type",
        ));
    }
    let inner = items.remove(0);
    if inner.is_array() {
        return Err(SchemaError::configuration(
            context,
            "nested type arrays are not supported",
        ));
    }
    Ok(TypeSpec::ArrayOf(Box::new(inner.resolve(context)?)))
}

impl TypeSpec {
    pub fn is_any(&self) -> bool {
        matches!(self, TypeSpec::Primitive(tag) if tag == ANY)
    }

    pub fn is_array_of(&self) -> bool {
        matches!(self, TypeSpec::ArrayOf(_))
    }

    /// The spec elements are checked against: the inner spec for arrays.
    pub fn element(&self) -> &TypeSpec {
        match self {
            TypeSpec::ArrayOf(inner) => inner,
            other => other,
        }
    }

    pub fn is_schema_type(&self) -> bool {
        matches!(self.element(), TypeSpec::Schema(_))
    }

    pub fn is_class_type(&self) -> bool {
        matches!(self.element(), TypeSpec::Class(_))
    }

    /// Name used in class-type errors; anonymous classes read "required class".
    pub fn class_name(&self) -> Option<&str> {
        match self.element() {
            TypeSpec::Class(class) => Some(class.name().unwrap_or("required class")),
            _ => None,
        }
    }

    /// When both sides carry a nested schema in the same position, the child's
    /// nested schema extended by the parent's. `None` means keep the child's.
    pub(crate) fn merged_with(&self, parent: &TypeSpec) -> Result<Option<TypeSpec>> {
        match (self, parent) {
            (TypeSpec::Schema(child), TypeSpec::Schema(parent)) => {
                if child.ptr_eq(parent) {
                    return Ok(None);
                }
                Ok(Some(TypeSpec::Schema(child.extended_by(parent)?)))
            }
            (TypeSpec::ArrayOf(child), TypeSpec::ArrayOf(parent)) => Ok(child
                .merged_with(parent)?
                .map(|inner| TypeSpec::ArrayOf(Box::new(inner)))),
            _ => Ok(None),
        }
    }
}

impl From<&str> for TypeDecl {
    fn from(tag: &str) -> Self {
        TypeDecl::Tag(tag.to_string())
    }
}

impl From<String> for TypeDecl {
    fn from(tag: String) -> Self {
        TypeDecl::Tag(tag)
    }
}

impl From<NativeType> for TypeDecl {
    fn from(native: NativeType) -> Self {
        TypeDecl::Native(native)
    }
}

impl From<Class> for TypeDecl {
    fn from(class: Class) -> Self {
        TypeDecl::Class(class)
    }
}

impl From<Schema> for TypeDecl {
    fn from(schema: Schema) -> Self {
        TypeDecl::Schema(schema)
    }
}

impl From<Vec<TypeDecl>> for TypeDecl {
    fn from(items: Vec<TypeDecl>) -> Self {
        TypeDecl::Array(items)
    }
}

impl From<Value> for TypeDecl {
    fn from(value: Value) -> Self {
        TypeDecl::Value(value)
    }
}
