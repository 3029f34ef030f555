use crate::prelude::*;
use std::ops::Not;

///
/// Field
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(rename = "type")]
    pub ty: String,

    pub db_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited: Option<bool>,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub reference_field: bool,

    /// Declared keys the compiler does not interpret, kept for the emitter.
    #[serde(flatten)]
    pub options: IndexMap<String, Value>,
}

impl Field {
    #[must_use]
    pub fn new(ty: &str, db_name: &str) -> Self {
        Self {
            ty: ty.to_string(),
            db_name: db_name.to_string(),
            inherited: None,
            reference_field: false,
            options: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn is_inherited(&self) -> bool {
        self.inherited == Some(true)
    }
}
