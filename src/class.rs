//! Classes whose instances are checked against one or more schemas.
//!
//! A class wraps a constructor. Constructing runs, in order: optional argument
//! validation, the constructor, optional argument propagation, then instance
//! validation against every implemented schema in declaration order.
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::schema::Schema;
use crate::type_tag::has_value;
use crate::value::{Instance, Object, Value};

/// Receives the constructor argument and the fresh instance's fields.
pub type Constructor = Arc<dyn Fn(&Value, &mut Object) -> Result<()> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassOptions {
    /// Validate the constructor argument against each schema before construction.
    pub validate_args: bool,
    /// Validate the constructed instance against each schema.
    pub validate_instance: bool,
    /// Copy argument properties the constructor left undefined onto the instance.
    pub propagate_args: bool,
}

impl Default for ClassOptions {
    fn default() -> Self {
        Self {
            validate_args: false,
            validate_instance: true,
            propagate_args: false,
        }
    }
}

#[derive(Clone)]
pub struct Class {
    inner: Arc<ClassInner>,
}

struct ClassInner {
    name: Option<String>,
    interfaces: Vec<Schema>,
    options: ClassOptions,
    constructor: Option<Constructor>,
}

pub struct ClassBuilder {
    name: Option<String>,
    interfaces: Vec<Schema>,
    options: ClassOptions,
    constructor: Option<Constructor>,
}

// -------------------------------- Builder --------------------------------- //

impl ClassBuilder {
    pub fn implements(mut self, schema: Schema) -> Self {
        self.interfaces.push(schema);
        self
    }

    pub fn options(mut self, options: ClassOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate_args(mut self, yes: bool) -> Self {
        self.options.validate_args = yes;
        self
    }

    pub fn validate_instance(mut self, yes: bool) -> Self {
        self.options.validate_instance = yes;
        self
    }

    pub fn propagate_args(mut self, yes: bool) -> Self {
        self.options.propagate_args = yes;
        self
    }

    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &mut Object) -> Result<()> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Class {
        Class {
            inner: Arc::new(ClassInner {
                name: self.name,
                interfaces: self.interfaces,
                options: self.options,
                constructor: self.constructor,
            }),
        }
    }
}

// --------------------------------- Class ---------------------------------- //

impl Class {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: Some(name.into()),
            interfaces: Vec::new(),
            options: ClassOptions::default(),
            constructor: None,
        }
    }

    pub fn anonymous() -> ClassBuilder {
        ClassBuilder {
            name: None,
            interfaces: Vec::new(),
            options: ClassOptions::default(),
            constructor: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn interfaces(&self) -> &[Schema] {
        &self.inner.interfaces
    }

    pub fn options(&self) -> ClassOptions {
        self.inner.options
    }

    pub fn ptr_eq(&self, other: &Class) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_instance(&self, value: &Value) -> bool {
        matches!(value, Value::Instance(instance) if instance.class().ptr_eq(self))
    }

    /// Build an instance from `args`. Any schema failure aborts construction.
    pub fn construct(&self, args: impl Into<Value>) -> Result<Value> {
        let ClassInner { interfaces, options, constructor, .. } = self.inner.as_ref();

        let mut args = args.into();
        if !has_value(&args) {
            args = Value::object();
        }
        if options.validate_args {
            for schema in interfaces {
                schema.validate_mut(&mut args)?;
            }
        }

        let mut fields = Object::new();
        match constructor {
            Some(constructor) => constructor(&args, &mut fields)?,
            // generic constructor: take the argument's properties as-is
            None => {
                if let Some(source) = args.as_object() {
                    fields.set_defaults(source);
                }
            }
        }
        if options.propagate_args {
            if let Some(source) = args.as_object() {
                fields.set_defaults(source);
            }
        }

        let mut instance = Value::Instance(Instance::new(self.clone(), fields));
        if options.validate_instance {
            for schema in interfaces {
                if let Err(err) = schema.validate_mut(&mut instance) {
                    let name = self.name().unwrap_or("anonymous");
                    tracing::debug!("{name} instance rejected: {err}");
                    return Err(err);
                }
            }
        }
        Ok(instance)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.inner.name)
            .field("interfaces", &self.inner.interfaces.len())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}
