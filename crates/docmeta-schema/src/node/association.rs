use crate::prelude::*;
use serde::ser::{SerializeMap, Serializer};

///
/// AssociationTarget
///
/// Either a concrete class, or a polymorphic target resolved at runtime
/// through a discriminator field (optionally restricted to a value map).
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssociationTarget {
    Class(String),
    Polymorphic {
        discriminator_field: String,
        discriminator_map: Option<IndexMap<String, String>>,
    },
}

impl AssociationTarget {
    #[must_use]
    pub const fn is_polymorphic(&self) -> bool {
        matches!(self, Self::Polymorphic { .. })
    }

    #[must_use]
    pub fn class(&self) -> Option<&str> {
        match self {
            Self::Class(class) => Some(class),
            Self::Polymorphic { .. } => None,
        }
    }

    /// Classes this target can name statically, deduplicated in map order.
    /// A polymorphic target without a map names none.
    #[must_use]
    pub fn known_classes(&self) -> Vec<&str> {
        match self {
            Self::Class(class) => vec![class.as_str()],
            Self::Polymorphic {
                discriminator_map: Some(map),
                ..
            } => {
                let mut classes: Vec<&str> = Vec::with_capacity(map.len());
                for class in map.values() {
                    if !classes.contains(&class.as_str()) {
                        classes.push(class);
                    }
                }
                classes
            }
            Self::Polymorphic { .. } => Vec::new(),
        }
    }
}

impl Serialize for AssociationTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Class(class) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("class", class)?;
                map.end()
            }
            Self::Polymorphic {
                discriminator_field,
                discriminator_map,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("polymorphic", &true)?;
                map.serialize_entry("discriminatorField", discriminator_field)?;
                match discriminator_map {
                    Some(values) => map.serialize_entry("discriminatorMap", values)?,
                    None => map.serialize_entry("discriminatorMap", &false)?,
                }
                map.end()
            }
        }
    }
}

///
/// Reference
/// Forward reference stored through a hidden backing field.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(flatten)]
    pub target: AssociationTarget,

    /// Name of the synthesized backing field.
    pub field: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<DeleteAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited: Option<bool>,

    #[serde(flatten)]
    pub options: IndexMap<String, Value>,
}

///
/// Embedded
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Embedded {
    #[serde(flatten)]
    pub target: AssociationTarget,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited: Option<bool>,

    #[serde(flatten)]
    pub options: IndexMap<String, Value>,
}

///
/// Relation
/// Inverse side of a reference declared on the target class.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(flatten)]
    pub target: AssociationTarget,

    pub reference: String,

    #[serde(flatten)]
    pub options: IndexMap<String, Value>,
}

///
/// ThroughRelation
/// Many-to-many relation through a pivot class.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThroughRelation {
    pub class: String,
    pub through: String,
    pub local: String,
    pub foreign: String,

    #[serde(flatten)]
    pub options: IndexMap<String, Value>,
}

///
/// Inherit
/// Members that can be copied down an inheritance chain.
///

pub trait Inherit {
    fn mark_inherited(&mut self);
}

impl Inherit for Field {
    fn mark_inherited(&mut self) {
        self.inherited = Some(true);
    }
}

impl Inherit for Reference {
    fn mark_inherited(&mut self) {
        self.inherited = Some(true);
    }
}

impl Inherit for Embedded {
    fn mark_inherited(&mut self) {
        self.inherited = Some(true);
    }
}
