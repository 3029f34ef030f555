//! Metadata resolution compiler for document classes.
//!
//! Raw per-class declarations go in, one globally consistent [`Schema`]
//! comes out. Resolution runs in five ordered stages (see [`build`]); any
//! failed invariant aborts the whole compile.

pub mod build;
pub mod error;
pub mod metadata;
pub mod node;
pub mod registry;
pub mod validate;

pub use build::{Compiler, RawSchema, compile};
pub use error::{CompileError, ErrorKind, Location};
pub use metadata::MetadataFactory;
pub use node::Schema;
pub use registry::{IdGeneratorRegistry, NameRegistry, TypeRegistry};

/// Discriminator field used by polymorphic associations that do not name one.
pub const DEFAULT_DISCRIMINATOR_FIELD: &str = "_documentClass";

/// Discriminator field used by inheritable roots that do not name one.
pub const DEFAULT_INHERITABLE_FIELD: &str = "type";

/// Id generator assigned to persistable classes that do not declare one.
pub const DEFAULT_ID_GENERATOR: &str = "native";

/// Suffix of the hidden backing field synthesized for every reference.
pub const REFERENCE_FIELD_SUFFIX: &str = "_reference_field";

/// Field type of synthesized reference backing fields.
pub const REFERENCE_FIELD_TYPE: &str = "raw";

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        error::{CompileError, Location},
        node::*,
    };
    pub use indexmap::IndexMap;
    pub use serde::Serialize;
    pub use serde_json::Value;
    pub use std::collections::BTreeMap;
}
