use crate::prelude::*;

///
/// OnDeleteRule
///
/// Cascade edge attached to a target class: deleting an instance of the
/// class holding this rule must clean up `reference_name` on `class`.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnDeleteRule {
    /// Class that declares the reference.
    pub class: String,
    pub reference_name: String,
    pub reference_type: Cardinality,
    pub polymorphic: bool,
    pub delete_action: DeleteAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator_map: Option<IndexMap<String, String>>,
}
