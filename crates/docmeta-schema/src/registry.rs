//! Read-only name registries consulted during compilation.
//!
//! The compiler never owns the type or id-generator implementations; it only
//! asks whether a name is known. Callers inject registries at construction.

use std::collections::BTreeSet;

/// Field type names known out of the box.
pub const BUILTIN_TYPES: &[&str] = &[
    "bin_data",
    "boolean",
    "date",
    "float",
    "integer",
    "raw",
    "serialized",
    "string",
];

/// Id generator names known out of the box.
pub const BUILTIN_ID_GENERATORS: &[&str] = &["native", "none", "sequence"];

///
/// TypeRegistry
///

pub trait TypeRegistry {
    fn exists(&self, name: &str) -> bool;
}

///
/// IdGeneratorRegistry
///

pub trait IdGeneratorRegistry {
    fn exists(&self, name: &str) -> bool;
}

///
/// NameRegistry
/// A plain set of names, usable as either registry.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NameRegistry {
    names: BTreeSet<String>,
}

impl NameRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn builtin_types() -> Self {
        Self::from_names(BUILTIN_TYPES.iter().copied())
    }

    #[must_use]
    pub fn builtin_id_generators() -> Self {
        Self::from_names(BUILTIN_ID_GENERATORS.iter().copied())
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Register a name; returns false if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> Extend<S> for NameRegistry {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

impl TypeRegistry for NameRegistry {
    fn exists(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl IdGeneratorRegistry for NameRegistry {
    fn exists(&self, name: &str) -> bool {
        self.contains(name)
    }
}
