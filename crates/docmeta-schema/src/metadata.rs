//! Metadata-factory descriptor: the one artifact persisted from a compile.

use crate::prelude::*;
use serde::Serializer;

///
/// MetadataFactory
///
/// Borrowed view over a resolved [`Schema`], keyed by class name. Computed
/// keys carry a leading underscore.
///

#[derive(Debug, Serialize)]
pub struct MetadataFactory<'a> {
    name: String,
    classes: BTreeMap<&'a str, bool>,
    info: BTreeMap<&'a str, ClassInfo<'a>>,
}

impl<'a> MetadataFactory<'a> {
    #[must_use]
    pub fn new(name: &str, schema: &'a Schema) -> Self {
        let classes = schema
            .classes()
            .map(|(class_name, class)| (class_name, class.is_embedded))
            .collect();
        let info = schema
            .classes()
            .map(|(class_name, class)| (class_name, ClassInfo::new(class)))
            .collect();

        Self {
            name: name.to_string(),
            classes,
            info,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class name -> is embedded.
    #[must_use]
    pub const fn classes(&self) -> &BTreeMap<&'a str, bool> {
        &self.classes
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

///
/// ClassInfo
///

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassInfo<'a> {
    is_embedded: bool,

    #[serde(flatten)]
    storage: Option<StorageInfo<'a>>,

    #[serde(serialize_with = "or_false")]
    inheritable: Option<&'a Inheritable>,

    #[serde(serialize_with = "or_false")]
    inheritance: Option<&'a Inheritance>,

    fields: &'a IndexMap<String, Field>,

    #[serde(rename = "_has_references")]
    has_references: bool,

    #[serde(rename = "_has_groups")]
    has_groups: bool,

    references_one: &'a IndexMap<String, Reference>,
    references_many: &'a IndexMap<String, Reference>,
    embeddeds_one: &'a IndexMap<String, Embedded>,
    embeddeds_many: &'a IndexMap<String, Embedded>,

    #[serde(flatten)]
    relations: Option<RelationInfo<'a>>,

    indexes: &'a [Index],

    #[serde(rename = "_indexes")]
    resolved_indexes: &'a [Index],

    events: &'a Events,

    #[serde(rename = "_parent_events")]
    parent_events: &'a Events,

    #[serde(rename = "_on_delete")]
    on_delete: &'a [OnDeleteRule],

    #[serde(skip_serializing_if = "Option::is_none")]
    id_generator: Option<&'a IdGenerator>,
}

impl<'a> ClassInfo<'a> {
    fn new(class: &'a ClassConfig) -> Self {
        let persistable = class.is_persistable();

        Self {
            is_embedded: class.is_embedded,
            storage: persistable.then(|| StorageInfo {
                connection: class.connection.as_deref(),
                collection: class.collection.as_deref(),
            }),
            inheritable: class.inheritable.as_ref(),
            inheritance: class.inheritance.as_ref(),
            fields: &class.fields,
            has_references: class.has_references,
            has_groups: class.has_groups,
            references_one: &class.references_one,
            references_many: &class.references_many,
            embeddeds_one: &class.embeddeds_one,
            embeddeds_many: &class.embeddeds_many,
            relations: persistable.then(|| RelationInfo {
                relations_one: &class.relations_one,
                relations_many_one: &class.relations_many_one,
                relations_many_many: &class.relations_many_many,
                relations_many_through: &class.relations_many_through,
            }),
            indexes: &class.indexes,
            resolved_indexes: &class.resolved_indexes,
            events: &class.events,
            parent_events: &class.parent_events,
            on_delete: &class.on_delete_rules,
            id_generator: class.id_generator.as_ref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct StorageInfo<'a> {
    connection: Option<&'a str>,
    collection: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelationInfo<'a> {
    relations_one: &'a IndexMap<String, Relation>,
    relations_many_one: &'a IndexMap<String, Relation>,
    relations_many_many: &'a IndexMap<String, Relation>,
    relations_many_through: &'a IndexMap<String, ThroughRelation>,
}

// or_false
// absent inheritance settings are written as `false`, not null
#[allow(clippy::ref_option)]
fn or_false<T: Serialize, S: Serializer>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => value.serialize(serializer),
        None => serializer.serialize_bool(false),
    }
}
