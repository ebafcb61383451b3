//! Runtime shape descriptions for plain data.
//!
//! Describe the properties an object should have (type, requiredness, default,
//! custom validator), compose descriptions through inheritance, then validate
//! live values against them. Validation fills defaults in place and fails fast
//! on the first bad property.
//!
//! ```
//! use ntype::{DescriptorAttributes, NativeType, Schema, SchemaOptions, Shape, Value};
//! use serde_json::json;
//!
//! let text = DescriptorAttributes::new()
//!     .of_type(NativeType::String)
//!     .default_value("link");
//! let link = Schema::with_options(
//!     SchemaOptions::new().required(true),
//!     Shape::new()
//!         .property("url", NativeType::String)
//!         .property("text", text),
//! )?;
//! let out = link.validate(Value::from(json!({"url": "site.com"})))?;
//! assert_eq!(out.to_json(), json!({"url": "site.com", "text": "link"}));
//! assert!(link.validate(Value::from(json!({"url": 42}))).is_err());
//! # Ok::<(), ntype::SchemaError>(())
//! ```
pub mod class;
pub mod error;
pub mod json;
pub mod schema;
pub mod type_tag;
pub mod value;

pub use class::{Class, ClassBuilder, ClassOptions, Constructor};
pub use error::{Result, SchemaError};
pub use schema::{
    Descriptor, DescriptorAttributes, PropertyDecl, Schema, SchemaOptions, Shape, TypeDecl,
    TypeSpec, Validator, extend_descriptors,
};
pub use type_tag::{NativeType, TypeTag, classify, has_value, native_type_for};
pub use value::{Function, Instance, Object, RegExp, Value};
