use crate::prelude::*;

///
/// Inheritable
/// Marks a class as an inheritance root.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Inheritable {
    #[serde(rename = "type")]
    pub ty: InheritanceType,

    /// Discriminator field stored on every record of the family.
    pub field: String,

    /// Discriminator value -> subclass, filled during inheritance resolution.
    pub values: BTreeMap<String, String>,
}

///
/// Inheritance
/// Marks a class as a subclass of `class`.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Inheritance {
    pub class: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Copied from the inheritance root once resolved.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<InheritanceType>,

    /// Copied from the inheritance root once resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Inheritance {
    #[must_use]
    pub fn new(class: &str, value: Option<&str>) -> Self {
        Self {
            class: class.to_string(),
            value: value.map(ToString::to_string),
            ty: None,
            field: None,
        }
    }
}

///
/// IdGenerator
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IdGenerator {
    pub name: String,
    pub options: IndexMap<String, Value>,

    /// False when the generator was filled in as the default.
    #[serde(skip)]
    pub explicit: bool,
}

impl IdGenerator {
    #[must_use]
    pub fn default_native() -> Self {
        Self {
            name: crate::DEFAULT_ID_GENERATOR.to_string(),
            options: IndexMap::new(),
            explicit: false,
        }
    }
}
