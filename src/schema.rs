//! Schemas: ordered descriptor lists that default and check whole objects.
//!
//! A schema is built once, from either a shape (property name → type marker or
//! attribute set) or a ready list of descriptors, optionally extending a parent.
//! Validation walks the descriptors in declaration order, mutating the target in
//! place, and stops at the first failure.
pub mod descriptor;
pub mod extend;
pub mod type_spec;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::class::Class;
use crate::error::{Result, SchemaError};
use crate::type_tag::{NativeType, has_value};
use crate::value::Value;

pub use descriptor::{Descriptor, DescriptorAttributes, Validator};
pub use extend::extend_descriptors;
pub use type_spec::{ANY, TypeDecl, TypeSpec};

const CONTEXT: &str = "schema: descriptors: ";

// --------------------------------- Types ---------------------------------- //

/// Cheap to clone; clones share the same descriptor list.
#[derive(Clone)]
pub struct Schema {
    descriptors: Arc<[Descriptor]>,
}

/// Schema-wide defaults plus an optional parent to extend.
#[derive(Clone, Default)]
pub struct SchemaOptions {
    /// Filled into derived descriptors that don't declare `required`.
    pub required: Option<bool>,
    /// Filled into derived descriptors that don't declare a validator. Shared, not copied.
    pub validator: Option<Validator>,
    pub extends: Option<Schema>,
}

/// One entry of a shape: a bare type marker, a full attribute set, or a
/// descriptor that is already built.
#[derive(Clone, Debug)]
pub enum PropertyDecl {
    Type(TypeDecl),
    Attributes(DescriptorAttributes),
    /// Taken as is: schema options are not filled into it.
    Descriptor(Descriptor),
}

#[derive(Clone, Debug)]
pub enum Shape {
    Properties(IndexMap<String, PropertyDecl>),
    Descriptors(Vec<Descriptor>),
}

// --------------------------------- Schema --------------------------------- //

impl Schema {
    pub fn new(shape: impl Into<Shape>) -> Result<Self> {
        Self::with_options(SchemaOptions::default(), shape)
    }

    pub fn with_options(options: SchemaOptions, shape: impl Into<Shape>) -> Result<Self> {
        let mut descriptors = match shape.into() {
            Shape::Descriptors(descriptors) => descriptors,
            Shape::Properties(properties) => to_descriptors(properties, &options)?,
        };
        let extended = options.extends.is_some();
        if let Some(parent) = &options.extends {
            descriptors = extend_descriptors(descriptors, parent.descriptors())?;
        }
        if descriptors.is_empty() {
            return Err(SchemaError::configuration(CONTEXT, "contains no values"));
        }
        tracing::debug!(
            "schema built with {} descriptors (extended: {extended})",
            descriptors.len()
        );
        Ok(Self {
            descriptors: descriptors.into(),
        })
    }

    /// This schema's descriptors extended by `parent`'s, as a new schema.
    pub fn extended_by(&self, parent: &Schema) -> Result<Self> {
        Self::with_options(
            SchemaOptions::new().extends(parent.clone()),
            Shape::Descriptors(self.descriptors.to_vec()),
        )
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.iter().find(|d| d.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(Descriptor::name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Whether both handles point at the same schema.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.descriptors, &other.descriptors)
    }

    /// Validate in place. An absent target is replaced by an empty object first.
    pub fn validate_mut(&self, target: &mut Value) -> Result<()> {
        if !has_value(target) {
            *target = Value::object();
        }
        for descriptor in self.descriptors.iter() {
            tracing::trace!("applying {}", descriptor.description());
            descriptor.get_set_value(target)?;
        }
        Ok(())
    }

    /// Validate `target` and hand it back, defaults filled.
    pub fn validate(&self, mut target: Value) -> Result<Value> {
        self.validate_mut(&mut target)?;
        Ok(target)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("descriptors", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

fn to_descriptors(
    properties: IndexMap<String, PropertyDecl>,
    options: &SchemaOptions,
) -> Result<Vec<Descriptor>> {
    let mut descriptors = Vec::with_capacity(properties.len());
    for (name, decl) in properties {
        let mut attributes = match decl {
            PropertyDecl::Type(decl) => DescriptorAttributes::new().of_type(decl),
            PropertyDecl::Attributes(attributes) => attributes,
            PropertyDecl::Descriptor(mut descriptor) => {
                descriptor.rename(name);
                descriptors.push(descriptor);
                continue;
            }
        };
        attributes.name = Some(name);
        let mut descriptor = Descriptor::new(attributes)?;
        descriptor.fill_required(options.required);
        descriptor.fill_validator(options.validator.as_ref());
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}

// -------------------------------- Options --------------------------------- //

impl SchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Descriptor) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn extends(mut self, parent: Schema) -> Self {
        self.extends = Some(parent);
        self
    }
}

impl fmt::Debug for SchemaOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaOptions")
            .field("required", &self.required)
            .field("validator", &self.validator.as_ref().map(|_| "<fn>"))
            .field("extends", &self.extends)
            .finish()
    }
}

// --------------------------------- Shapes --------------------------------- //

impl Shape {
    pub fn new() -> Self {
        Shape::Properties(IndexMap::new())
    }

    /// Add (or replace) a property. A descriptor-list shape becomes a property
    /// map whose existing descriptors are still taken as is; resolution errors
    /// surface when the schema is built.
    pub fn property(self, name: impl Into<String>, decl: impl Into<PropertyDecl>) -> Self {
        match self {
            Shape::Properties(mut properties) => {
                properties.insert(name.into(), decl.into());
                Shape::Properties(properties)
            }
            Shape::Descriptors(descriptors) => {
                let mut properties = IndexMap::with_capacity(descriptors.len() + 1);
                for d in descriptors {
                    // first occurrence of a name wins, as in extension
                    properties
                        .entry(d.name().to_string())
                        .or_insert(PropertyDecl::Descriptor(d));
                }
                properties.insert(name.into(), decl.into());
                Shape::Properties(properties)
            }
        }
    }
}

impl Default for Shape {
    fn default() -> Self {
        Shape::new()
    }
}

impl From<Vec<Descriptor>> for Shape {
    fn from(descriptors: Vec<Descriptor>) -> Self {
        Shape::Descriptors(descriptors)
    }
}

impl From<IndexMap<String, PropertyDecl>> for Shape {
    fn from(properties: IndexMap<String, PropertyDecl>) -> Self {
        Shape::Properties(properties)
    }
}

impl From<Descriptor> for PropertyDecl {
    fn from(d: Descriptor) -> Self {
        PropertyDecl::Descriptor(d)
    }
}

impl From<TypeSpec> for TypeDecl {
    fn from(spec: TypeSpec) -> Self {
        match spec {
            TypeSpec::Primitive(tag) => TypeDecl::Tag(tag),
            TypeSpec::Class(class) => TypeDecl::Class(class),
            TypeSpec::Schema(schema) => TypeDecl::Schema(schema),
            TypeSpec::ArrayOf(inner) => TypeDecl::array_of(TypeDecl::from(*inner)),
        }
    }
}

impl From<TypeDecl> for PropertyDecl {
    fn from(decl: TypeDecl) -> Self {
        PropertyDecl::Type(decl)
    }
}

impl From<DescriptorAttributes> for PropertyDecl {
    fn from(attributes: DescriptorAttributes) -> Self {
        PropertyDecl::Attributes(attributes)
    }
}

impl From<NativeType> for PropertyDecl {
    fn from(native: NativeType) -> Self {
        PropertyDecl::Type(native.into())
    }
}

impl From<&str> for PropertyDecl {
    fn from(tag: &str) -> Self {
        PropertyDecl::Type(tag.into())
    }
}

impl From<Class> for PropertyDecl {
    fn from(class: Class) -> Self {
        PropertyDecl::Type(class.into())
    }
}

impl From<Schema> for PropertyDecl {
    fn from(schema: Schema) -> Self {
        PropertyDecl::Type(schema.into())
    }
}

impl From<Vec<TypeDecl>> for PropertyDecl {
    fn from(items: Vec<TypeDecl>) -> Self {
        PropertyDecl::Type(items.into())
    }
}

// --------------------------------- Tests ---------------------------------- //
