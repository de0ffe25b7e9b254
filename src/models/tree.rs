//! Plain in-memory configuration tree
//!
//! Backends keep their node hierarchy in this shape; it is also the on-disk
//! JSON layout of a domain snapshot.

use super::config::{AttributeValue, ConfigPath};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTree {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, ConfigTree>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, name: impl Into<String>, child: ConfigTree) -> Self {
        self.children.insert(name.into(), child);
        self
    }

    /// Walk `path` from this node.
    ///
    /// On failure returns the zero-based index of the first missing segment.
    pub fn lookup(&self, path: &ConfigPath) -> Result<&ConfigTree, usize> {
        let mut node = self;
        for (index, segment) in path.segments().iter().enumerate() {
            node = node.children.get(segment).ok_or(index)?;
        }
        Ok(node)
    }

    pub fn lookup_mut(&mut self, path: &ConfigPath) -> Result<&mut ConfigTree, usize> {
        let mut node = self;
        for (index, segment) in path.segments().iter().enumerate() {
            node = node.children.get_mut(segment).ok_or(index)?;
        }
        Ok(node)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Overwrite an existing attribute, returning the previous value.
    ///
    /// Returns `None` without inserting when the attribute is not declared on this node.
    pub fn replace_attribute(&mut self, name: &str, value: AttributeValue) -> Option<AttributeValue> {
        self.attributes
            .get_mut(name)
            .map(|slot| std::mem::replace(slot, value))
    }
}
