//! Stage 1: fill per-class defaults and expand shorthand forms.
//!
//! After this stage every scalar class setting, field, index and event list
//! has a single typed shape. Association groups are only checked to be maps
//! here; their members are resolved by the association stage.

use crate::{
    DEFAULT_INHERITABLE_FIELD,
    build::{
        RawSchema,
        declaration::{Declaration, describe, to_bool},
    },
    prelude::*,
    registry::{IdGeneratorRegistry, TypeRegistry},
    validate::naming,
};
use serde_json::Map;
use tracing::{debug, warn};

const CLASS_KEYS: &[&str] = &[
    "collection",
    "connection",
    "embeddedsMany",
    "embeddedsOne",
    "events",
    "fields",
    "idGenerator",
    "indexes",
    "inheritable",
    "inheritance",
    "isEmbedded",
    "isFile",
    "referencesMany",
    "referencesOne",
    "relationsManyMany",
    "relationsManyOne",
    "relationsManyThrough",
    "relationsOne",
    "useBatchInsert",
];

const FIELD_KEYS: &[&str] = &["type", "dbName", "inherited", "referenceField"];

///
/// RawAssociations
/// Association groups as declared, keyed by association name.
///

#[derive(Clone, Debug, Default)]
pub struct RawAssociations {
    pub references_one: Map<String, Value>,
    pub references_many: Map<String, Value>,
    pub embeddeds_one: Map<String, Value>,
    pub embeddeds_many: Map<String, Value>,
    pub relations_one: Map<String, Value>,
    pub relations_many_one: Map<String, Value>,
    pub relations_many_many: Map<String, Value>,
    pub relations_many_through: Map<String, Value>,
}

impl RawAssociations {
    fn has_relations(&self) -> bool {
        !(self.relations_one.is_empty()
            && self.relations_many_one.is_empty()
            && self.relations_many_many.is_empty()
            && self.relations_many_through.is_empty())
    }
}

///
/// NormalizedClass
///

#[derive(Clone, Debug)]
pub struct NormalizedClass {
    pub config: ClassConfig,
    pub associations: RawAssociations,
}

/// Normalize every raw declaration, in class-name order.
pub fn normalize_all(
    raw: &RawSchema,
    types: &dyn TypeRegistry,
    id_generators: &dyn IdGeneratorRegistry,
) -> Result<BTreeMap<String, NormalizedClass>, CompileError> {
    let mut classes = BTreeMap::new();

    for (name, value) in raw {
        let class = normalize_class(name, value, types, id_generators)?;
        classes.insert(name.clone(), class);
    }

    Ok(classes)
}

/// Normalize one raw class declaration.
pub fn normalize_class(
    name: &str,
    value: &Value,
    types: &dyn TypeRegistry,
    id_generators: &dyn IdGeneratorRegistry,
) -> Result<NormalizedClass, CompileError> {
    naming::validate_class_name(name)?;
    let decl = Declaration::class(name, value)?;

    for key in decl.keys().filter(|key| !CLASS_KEYS.contains(key)) {
        warn!(class = name, key, "ignoring unknown class key");
    }

    let is_embedded = decl.flag("isEmbedded", false)?;
    let mut config = ClassConfig::new(name, is_embedded);

    // inheritance
    config.inheritable = parse_inheritable(&decl)?;
    config.inheritance = parse_inheritance(&decl)?;
    if is_embedded && (config.inheritable.is_some() || config.inheritance.is_some()) {
        return Err(CompileError::invariant(
            Location::class(name),
            "embedded classes cannot use inheritance",
        ));
    }

    // storage
    if !is_embedded {
        config.use_batch_insert = decl.flag("useBatchInsert", false)?;
        config.connection = decl.non_empty_string("connection")?;
        config.collection = Some(match decl.non_empty_string("collection")? {
            Some(collection) => collection,
            None => default_collection(name),
        });
        config.id_generator = Some(parse_id_generator(&decl, id_generators)?);
    }
    config.is_file = decl.flag("isFile", false)?;

    // members
    let subclass = config.inheritance.is_some();
    if let Some(fields) = decl.map("fields")? {
        for (field_name, field) in fields {
            let field = normalize_field(name, field_name, field, subclass, types)?;
            config.fields.insert(field_name.clone(), field);
        }
    }
    config.indexes = parse_indexes(&decl)?;
    config.events = parse_events(&decl)?;

    let associations = RawAssociations {
        references_one: group(&decl, "referencesOne")?,
        references_many: group(&decl, "referencesMany")?,
        embeddeds_one: group(&decl, "embeddedsOne")?,
        embeddeds_many: group(&decl, "embeddedsMany")?,
        relations_one: group(&decl, "relationsOne")?,
        relations_many_one: group(&decl, "relationsManyOne")?,
        relations_many_many: group(&decl, "relationsManyMany")?,
        relations_many_through: group(&decl, "relationsManyThrough")?,
    };
    if is_embedded && associations.has_relations() {
        return Err(CompileError::invariant(
            Location::class(name),
            "embedded classes cannot declare relations",
        ));
    }

    debug!(
        class = name,
        kind = %config.kind(),
        fields = config.fields.len(),
        "class normalized"
    );

    Ok(NormalizedClass {
        config,
        associations,
    })
}

/// Normalize one field declaration. A bare string is shorthand for
/// `{type: <string>}`; normalizing an already-normalized field is a no-op.
pub fn normalize_field(
    class: &str,
    name: &str,
    value: &Value,
    subclass: bool,
    types: &dyn TypeRegistry,
) -> Result<Field, CompileError> {
    let expanded;
    let value = match value {
        Value::String(ty) => {
            expanded = serde_json::json!({ "type": ty });
            &expanded
        }
        other => other,
    };

    let decl = Declaration::member(class, name, value)?;
    let ty = decl.required_string("type")?;
    if !types.exists(&ty) {
        return Err(CompileError::unknown(
            decl.location(),
            format!("type '{ty}' does not exist"),
        ));
    }

    let db_name = decl.string("dbName")?.unwrap_or_else(|| name.to_string());
    let inherited = match decl.get("inherited") {
        Some(Value::Bool(inherited)) => Some(*inherited),
        Some(other) => {
            return Err(CompileError::malformed(
                decl.location(),
                format!("'inherited' must be a boolean, found {}", describe(other)),
            ));
        }
        None => subclass.then_some(false),
    };

    Ok(Field {
        ty,
        db_name,
        inherited,
        reference_field: decl.flag("referenceField", false)?,
        options: decl.extra(FIELD_KEYS),
    })
}

/// Default collection name: the class name lower-cased, with namespace
/// separators replaced by underscores.
#[must_use]
pub fn default_collection(class: &str) -> String {
    class.replace("::", "_").replace('\\', "_").to_lowercase()
}

// parse_inheritable
fn parse_inheritable(decl: &Declaration) -> Result<Option<Inheritable>, CompileError> {
    let Some(value) = decl.get("inheritable") else {
        return Ok(None);
    };
    if to_bool(value) == Some(false) {
        return Ok(None);
    }

    let inner = Declaration::member(decl.class_name(), "inheritable", value)?;
    let ty = inner.required_string("type")?;
    let ty = InheritanceType::parse(&ty).ok_or_else(|| {
        CompileError::invariant(
            inner.location(),
            format!("inheritable type '{ty}' is not valid, only 'single' is supported"),
        )
    })?;
    let field = inner
        .non_empty_string("field")?
        .unwrap_or_else(|| DEFAULT_INHERITABLE_FIELD.to_string());

    Ok(Some(Inheritable {
        ty,
        field,
        values: BTreeMap::new(),
    }))
}

// parse_inheritance
fn parse_inheritance(decl: &Declaration) -> Result<Option<Inheritance>, CompileError> {
    let Some(value) = decl.get("inheritance") else {
        return Ok(None);
    };
    if to_bool(value) == Some(false) {
        return Ok(None);
    }

    let inner = Declaration::member(decl.class_name(), "inheritance", value)?;
    let class = inner.required_string("class")?;
    let discriminator = inner.scalar("value")?;

    Ok(Some(Inheritance::new(&class, discriminator.as_deref())))
}

// parse_id_generator
fn parse_id_generator(
    decl: &Declaration,
    id_generators: &dyn IdGeneratorRegistry,
) -> Result<IdGenerator, CompileError> {
    let generator = match decl.get("idGenerator") {
        None => IdGenerator::default_native(),
        Some(Value::String(name)) => IdGenerator {
            name: name.clone(),
            options: IndexMap::new(),
            explicit: true,
        },
        Some(value @ Value::Object(_)) => {
            let inner = Declaration::member(decl.class_name(), "idGenerator", value)?;
            let options = inner
                .map("options")?
                .map(|options| {
                    options
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default();

            IdGenerator {
                name: inner.required_string("name")?,
                options,
                explicit: true,
            }
        }
        Some(other) => {
            return Err(CompileError::malformed(
                decl.location(),
                format!(
                    "idGenerator is neither a string nor a map, found {}",
                    describe(other)
                ),
            ));
        }
    };

    if !id_generators.exists(&generator.name) {
        return Err(CompileError::unknown(
            decl.location(),
            format!("id generator '{}' does not exist", generator.name),
        ));
    }

    Ok(generator)
}

// parse_indexes
// accepts a list of indexes, or a map of index name -> index
fn parse_indexes(decl: &Declaration) -> Result<Vec<Index>, CompileError> {
    let class = decl.class_name();

    match decl.get("indexes") {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_index(class, &format!("indexes[{i}]"), None, item))
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, item)| parse_index(class, name, Some(name), item))
            .collect(),
        Some(other) => Err(CompileError::malformed(
            decl.location(),
            format!("'indexes' must be a list or a map, found {}", describe(other)),
        )),
    }
}

fn parse_index(
    class: &str,
    label: &str,
    name: Option<&str>,
    value: &Value,
) -> Result<Index, CompileError> {
    let decl = Declaration::member(class, label, value)?;
    let keys = decl
        .map("keys")?
        .ok_or_else(|| CompileError::missing(decl.location(), "keys"))?;
    if keys.is_empty() {
        return Err(CompileError::malformed(
            decl.location(),
            "index declares no keys",
        ));
    }

    Ok(Index {
        name: name.map(ToString::to_string),
        keys: keys.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        options: decl.extra(&["keys"]),
    })
}

// parse_events
fn parse_events(decl: &Declaration) -> Result<Events, CompileError> {
    let mut events = Events::default();
    let Some(map) = decl.map("events")? else {
        return Ok(events);
    };

    for (key, value) in map {
        let location = Location::member(decl.class_name(), key);
        let event = Event::from_key(key)
            .ok_or_else(|| CompileError::malformed(location.clone(), "unknown lifecycle event"))?;

        let handlers = match value {
            Value::Null => Vec::new(),
            Value::String(handler) => vec![handler.clone()],
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(ToString::to_string).ok_or_else(|| {
                        CompileError::malformed(
                            location.clone(),
                            format!("event handler must be a string, found {}", describe(item)),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(CompileError::malformed(
                    location,
                    format!("event handlers must be a list, found {}", describe(other)),
                ));
            }
        };

        events.get_mut(event).extend(handlers);
    }

    Ok(events)
}

// group
fn group(decl: &Declaration, key: &str) -> Result<Map<String, Value>, CompileError> {
    Ok(decl.map(key)?.cloned().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, registry::NameRegistry};
    use serde_json::json;

    fn normalize(name: &str, value: Value) -> Result<NormalizedClass, CompileError> {
        normalize_class(
            name,
            &value,
            &NameRegistry::builtin_types(),
            &NameRegistry::builtin_id_generators(),
        )
    }

    fn field(value: Value, subclass: bool) -> Result<Field, CompileError> {
        normalize_field(
            "Article",
            "title",
            &value,
            subclass,
            &NameRegistry::builtin_types(),
        )
    }

    #[test]
    fn shorthand_field_expands_with_defaults() {
        let field = field(json!("string"), false).expect("shorthand is valid");

        assert_eq!(field, Field::new("string", "title"));
    }

    #[test]
    fn subclass_fields_default_inherited_to_false() {
        let field = field(json!({ "type": "integer", "dbName": "t" }), true).expect("valid");

        assert_eq!(field.inherited, Some(false));
        assert_eq!(field.db_name, "t");
    }

    #[test]
    fn normalizing_a_normalized_field_is_a_noop() {
        let declared = json!({ "type": "string", "dbName": "name" });
        let once = field(declared.clone(), false).expect("valid");
        let rendered = serde_json::to_value(&once).expect("serializes");
        let twice = field(rendered.clone(), false).expect("still valid");

        assert_eq!(rendered, declared);
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_type_and_bad_db_name_fail() {
        let err = field(json!("money"), false).expect_err("unknown type");
        assert_eq!(err.kind(), ErrorKind::UnknownReference);

        let err = field(json!({ "type": "string", "dbName": 3 }), false).expect_err("bad dbName");
        assert_eq!(err.kind(), ErrorKind::MalformedDeclaration);

        let err = field(json!({ "dbName": "t" }), false).expect_err("no type");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredKey);

        let err = field(json!(12), false).expect_err("not a map");
        assert_eq!(err.kind(), ErrorKind::MalformedDeclaration);
    }

    #[test]
    fn persistable_defaults_are_filled() {
        let class = normalize("Model\\Article", json!({})).expect("empty class is valid");
        let config = class.config;

        assert_eq!(config.collection.as_deref(), Some("model_article"));
        assert_eq!(config.connection, None);
        assert!(!config.use_batch_insert);
        assert_eq!(
            config.id_generator.as_ref().map(|g| g.name.as_str()),
            Some("native")
        );
        assert!(config.events.is_empty());
    }

    #[test]
    fn embedded_classes_carry_no_storage() {
        let class = normalize(
            "Address",
            json!({ "isEmbedded": "1", "collection": "ignored", "fields": { "zip": "string" } }),
        )
        .expect("valid embedded class");

        assert!(class.config.is_embedded);
        assert_eq!(class.config.collection, None);
        assert_eq!(class.config.id_generator, None);
    }

    #[test]
    fn non_canonical_flags_fail() {
        let err = normalize("Article", json!({ "isEmbedded": "yes" })).expect_err("bad flag");
        assert_eq!(err.kind(), ErrorKind::MalformedDeclaration);

        let err = normalize("Article", json!({ "useBatchInsert": 2 })).expect_err("bad flag");
        assert_eq!(err.kind(), ErrorKind::MalformedDeclaration);

        let err = normalize("Article", json!({ "isFile": "true" })).expect_err("bad flag");
        assert_eq!(err.kind(), ErrorKind::MalformedDeclaration);

        for key in ["isEmbedded", "useBatchInsert", "isFile"] {
            let err = normalize("Article", json!({ key: null })).expect_err("null flag");
            assert_eq!(err.kind(), ErrorKind::MalformedDeclaration, "{key}");
        }
    }

    #[test]
    fn id_generator_shapes() {
        let class = normalize(
            "Article",
            json!({ "idGenerator": { "name": "sequence", "options": { "start": 10 } } }),
        )
        .expect("map form is valid");
        let generator = class.config.id_generator.expect("persistable");
        assert_eq!(generator.name, "sequence");
        assert_eq!(generator.options.get("start"), Some(&json!(10)));
        assert!(generator.explicit);

        let err = normalize("Article", json!({ "idGenerator": 5 })).expect_err("bad shape");
        assert_eq!(err.kind(), ErrorKind::MalformedDeclaration);

        let err = normalize("Article", json!({ "idGenerator": "uuid" })).expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::UnknownReference);

        let err = normalize(
            "Article",
            json!({ "idGenerator": { "name": "none", "options": [] } }),
        )
        .expect_err("options must be a map");
        assert_eq!(err.kind(), ErrorKind::MalformedDeclaration);
    }

    #[test]
    fn inheritable_requires_single_type() {
        let class = normalize("Article", json!({ "inheritable": { "type": "single" } }))
            .expect("valid root");
        let inheritable = class.config.inheritable.expect("root");
        assert_eq!(inheritable.field, "type");

        let err = normalize("Article", json!({ "inheritable": { "field": "kind" } }))
            .expect_err("missing type");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredKey);

        let err = normalize("Article", json!({ "inheritable": { "type": "multiple" } }))
            .expect_err("unsupported type");
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn embedded_classes_cannot_use_inheritance_or_relations() {
        let err = normalize(
            "Address",
            json!({ "isEmbedded": true, "inheritance": { "class": "Base", "value": "a" } }),
        )
        .expect_err("embedded subclass");
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        let err = normalize(
            "Address",
            json!({ "isEmbedded": true, "relationsOne": { "owner": { "class": "User", "reference": "address" } } }),
        )
        .expect_err("embedded relation");
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn indexes_and_events_are_typed() {
        let class = normalize(
            "Article",
            json!({
                "indexes": [{ "keys": { "slug": 1 }, "options": { "unique": true } }],
                "events": { "preInsert": ["stamp", "audit"], "postDelete": "purge" },
            }),
        )
        .expect("valid");

        assert_eq!(class.config.indexes.len(), 1);
        assert!(class.config.indexes[0].options.contains_key("options"));
        assert_eq!(class.config.events.pre_insert, vec!["stamp", "audit"]);
        assert_eq!(class.config.events.post_delete, vec!["purge"]);

        let err = normalize("Article", json!({ "indexes": [{ "unique": true }] }))
            .expect_err("index without keys");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredKey);

        let err = normalize("Article", json!({ "events": { "preSave": [] } }))
            .expect_err("unknown event");
        assert_eq!(err.kind(), ErrorKind::MalformedDeclaration);
    }
}
