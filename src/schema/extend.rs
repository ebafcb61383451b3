//! Schema inheritance: a named union of descriptors, child wins on conflict.
//!
//! For a name both sides declare, each attribute the child leaves unset is
//! taken from the parent. Parent-only descriptors are placed in front of the
//! child's, in parent order. The parent list is only ever read.
use std::collections::HashMap;

use crate::error::{Result, SchemaError};
use crate::schema::descriptor::Descriptor;

const CONTEXT: &str = "schema.extend_descriptors: ";

pub fn extend_descriptors(
    mut descriptors: Vec<Descriptor>,
    parent: &[Descriptor],
) -> Result<Vec<Descriptor>> {
    if parent.is_empty() {
        return Ok(descriptors);
    }
    if descriptors.is_empty() {
        return Err(SchemaError::configuration(
            CONTEXT,
            "descriptors must have at least one element",
        ));
    }

    // first declaration of a name wins the slot
    let mut index = HashMap::<String, usize>::new();
    for (i, d) in descriptors.iter().enumerate() {
        index.entry(d.name().to_string()).or_insert(i);
    }

    let mut inherited = Vec::<Descriptor>::new();
    for ancestor in parent {
        match index.get(ancestor.name()) {
            Some(&i) => {
                tracing::trace!("{}: merging inherited attributes", ancestor.name());
                descriptors[i].inherit_from(ancestor)?;
            }
            None => inherited.push(ancestor.clone()),
        }
    }

    if inherited.is_empty() {
        return Ok(descriptors);
    }
    inherited.extend(descriptors);
    Ok(inherited)
}
