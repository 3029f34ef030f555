use crate::prelude::*;
use derive_more::Display;

///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[display("one")]
    One,
    #[display("many")]
    Many,
}

///
/// ClassKind
/// Every class is exactly one of these.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ClassKind {
    #[display("embeddable")]
    Embeddable,
    #[display("persistable root")]
    PersistableRoot,
    #[display("persistable subclass")]
    PersistableSubclass,
}

///
/// DeleteAction
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteAction {
    #[display("cascade")]
    Cascade,
    #[display("unset")]
    Unset,
}

impl DeleteAction {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cascade" => Some(Self::Cascade),
            "unset" => Some(Self::Unset),
            _ => None,
        }
    }

    // reference-many only ever accepts unset; cascade is one-only
    #[must_use]
    pub const fn allowed_for(cardinality: Cardinality) -> &'static [Self] {
        match cardinality {
            Cardinality::One => &[Self::Unset, Self::Cascade],
            Cardinality::Many => &[Self::Unset],
        }
    }

    #[must_use]
    pub fn is_allowed_for(self, cardinality: Cardinality) -> bool {
        Self::allowed_for(cardinality).contains(&self)
    }
}

///
/// InheritanceType
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InheritanceType {
    #[default]
    #[display("single")]
    Single,
}

impl InheritanceType {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            _ => None,
        }
    }
}
