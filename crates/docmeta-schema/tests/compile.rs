use docmeta_schema::{
    CompileError, ErrorKind, NameRegistry, RawSchema, Schema, compile,
    prelude::{Cardinality, DeleteAction},
};
use serde_json::{Value, json};

fn raw(value: Value) -> RawSchema {
    let Value::Object(map) = value else {
        panic!("test input must be a map");
    };

    map.into_iter().collect()
}

fn try_compile(value: Value) -> Result<Schema, CompileError> {
    compile(
        &raw(value),
        &NameRegistry::builtin_types(),
        &NameRegistry::builtin_id_generators(),
    )
}

fn blog() -> Value {
    json!({
        "Article": {
            "inheritable": { "type": "single" },
            "fields": { "title": "string", "body": { "type": "string", "dbName": "b" } },
            "referencesOne": { "author": { "class": "Author", "onDelete": "unset" } },
            "embeddedsOne": { "source": { "class": "Source" } },
            "events": { "preInsert": ["stamp"] },
        },
        "News": {
            "inheritance": { "class": "Article", "value": "news" },
            "fields": { "body": "raw", "agency": "string" },
            "events": { "preInsert": "notify" },
        },
        "Review": {
            "inheritance": { "class": "Article", "value": "review" },
            "fields": { "score": "integer" },
        },
        "Author": {
            "fields": { "name": "string" },
            "relationsManyOne": { "articles": { "class": "Article", "reference": "author" } },
        },
        "Source": { "isEmbedded": true, "fields": { "url": "string" } },
    })
}

#[test]
fn subclass_fields_are_a_superset_of_the_parent() {
    let schema = try_compile(blog()).expect("valid blog schema");
    let article = schema.get("Article").expect("declared");
    let news = schema.get("News").expect("declared");

    for (name, field) in &article.fields {
        let inherited = news.fields.get(name).expect("parent field is inherited");
        if name == "body" {
            assert_eq!(inherited.ty, "raw", "own declaration overrides");
            assert_eq!(inherited.inherited, Some(false));
        } else {
            assert_eq!(inherited.ty, field.ty);
            assert!(inherited.is_inherited(), "{name} should be marked inherited");
        }
    }

    assert!(news.references_one["author"].inherited == Some(true));
    assert!(news.embeddeds_one["source"].inherited == Some(true));
    assert_eq!(news.fields["agency"].inherited, Some(false));
}

#[test]
fn subclass_shares_the_root_collection_and_events() {
    let schema = try_compile(blog()).expect("valid blog schema");
    let news = schema.get("News").expect("declared");

    assert_eq!(news.collection.as_deref(), Some("article"));
    assert_eq!(news.parent_events.pre_insert, vec!["stamp"]);
    assert_eq!(news.events.pre_insert, vec!["notify"]);

    let values = &schema
        .get("Article")
        .and_then(|article| article.inheritable.as_ref())
        .expect("root")
        .values;
    assert_eq!(values.len(), 2);
    assert_eq!(values.get("review").map(String::as_str), Some("Review"));
}

#[test]
fn duplicate_discriminator_value_is_an_invariant_violation() {
    let mut value = blog();
    value["Review"]["inheritance"]["value"] = json!("news");

    let err = try_compile(value).expect_err("duplicate discriminator");
    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    assert_eq!(err.class(), Some("Review"));
}

#[test]
fn has_references_through_a_three_level_embed_chain() {
    let schema = try_compile(json!({
        "Outer": { "embeddedsOne": { "middle": { "class": "Middle" } } },
        "Middle": { "isEmbedded": true, "embeddedsOne": { "inner": { "class": "Inner" } } },
        "Inner": { "isEmbedded": true, "referencesOne": { "owner": { "class": "Outer" } } },
        "Lonely": { "fields": { "name": "string" } },
    }))
    .expect("acyclic embeds");

    for class in ["Outer", "Middle", "Inner"] {
        assert!(schema.get(class).expect("declared").has_references, "{class}");
    }
    assert!(!schema.get("Lonely").expect("declared").has_references);
}

#[test]
fn embedded_index_keys_are_prefixed_with_the_embed_name() {
    let schema = try_compile(json!({
        "User": { "embeddedsOne": { "address": { "class": "Address" } } },
        "Address": { "isEmbedded": true, "indexes": [{ "keys": { "zip": 1 } }] },
    }))
    .expect("valid schema");

    let user = schema.get("User").expect("declared");
    let keys: Vec<_> = user
        .resolved_indexes
        .iter()
        .map(|index| index.keys.clone())
        .collect();

    assert!(keys.iter().any(|k| serde_json::to_value(k).ok() == Some(json!({ "address.zip": 1 }))));
    assert!(user.indexes.is_empty(), "declared indexes are untouched");
}

#[test]
fn unset_reference_produces_one_rule_on_the_target() {
    let schema = try_compile(json!({
        "Article": { "referencesOne": { "author": { "class": "Author", "onDelete": "unset" } } },
        "Author": {},
    }))
    .expect("valid schema");

    let rules = &schema.get("Author").expect("declared").on_delete_rules;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].class, "Article");
    assert_eq!(rules[0].reference_name, "author");
    assert_eq!(rules[0].reference_type, Cardinality::One);
    assert_eq!(rules[0].delete_action, DeleteAction::Unset);
    assert!(!rules[0].polymorphic);
}

#[test]
fn polymorphic_cascade_without_a_map_reaches_every_class() {
    let schema = try_compile(json!({
        "Comment": { "referencesOne": { "subject": { "polymorphic": true, "onDelete": "cascade" } } },
        "Article": {},
        "Photo": {},
        "Tag": { "isEmbedded": true },
    }))
    .expect("valid schema");

    let edges: usize = schema
        .classes()
        .map(|(_, class)| class.on_delete_rules.len())
        .sum();
    assert_eq!(edges, schema.len());

    let rule = &schema.get("Photo").expect("declared").on_delete_rules[0];
    assert!(rule.polymorphic);
    assert_eq!(rule.discriminator_field.as_deref(), Some("_documentClass"));
}

#[test]
fn mutual_embeds_fail_with_a_dependency_cycle() {
    let err = try_compile(json!({
        "A": { "isEmbedded": true, "embeddedsOne": { "b": { "class": "B" } } },
        "B": { "isEmbedded": true, "embeddedsOne": { "a": { "class": "A" } } },
    }))
    .expect_err("cyclic embeds");

    assert_eq!(err.kind(), ErrorKind::DependencyCycle);
    assert!(err.to_string().contains("A, B"), "{err}");
}

#[test]
fn cascade_on_reference_many_is_rejected() {
    let err = try_compile(json!({
        "Article": { "referencesMany": { "tags": { "class": "Tag", "onDelete": "cascade" } } },
        "Tag": {},
    }))
    .expect_err("cascade is one-only");

    assert_eq!(err.kind(), ErrorKind::InvariantViolation);
}

#[test]
fn errors_name_the_offending_class_and_member() {
    let err = try_compile(json!({
        "Article": { "fields": { "title": { "type": "money" } } },
    }))
    .expect_err("unknown type");

    assert_eq!(err.kind(), ErrorKind::UnknownReference);
    let rendered = err.to_string();
    assert!(rendered.contains("'title' of class 'Article'"), "{rendered}");
}

#[test]
fn extra_registry_names_are_accepted() {
    let mut types = NameRegistry::builtin_types();
    types.insert("money");
    let mut ids = NameRegistry::builtin_id_generators();
    ids.insert("uuid");

    let schema = compile(
        &raw(json!({
            "Invoice": { "idGenerator": "uuid", "fields": { "total": "money" } },
        })),
        &types,
        &ids,
    )
    .expect("extra names registered");

    let invoice = schema.get("Invoice").expect("declared");
    assert_eq!(
        invoice.id_generator.as_ref().map(|g| g.name.as_str()),
        Some("uuid")
    );
}

#[test]
fn compiling_twice_is_deterministic() {
    let first = try_compile(blog()).expect("valid");
    let second = try_compile(blog()).expect("valid");

    assert_eq!(first, second);
}

#[test]
fn has_groups_through_an_embed_chain() {
    let schema = try_compile(json!({
        "Outer": { "embeddedsOne": { "mid": { "class": "Mid" } } },
        "Mid": { "isEmbedded": true, "embeddedsMany": { "items": { "class": "Item" } } },
        "Item": { "isEmbedded": true, "fields": { "name": "string" } },
    }))
    .expect("acyclic embeds");

    assert!(schema.get("Outer").expect("declared").has_groups);
    assert!(schema.get("Mid").expect("declared").has_groups);
    assert!(!schema.get("Item").expect("declared").has_groups);
    assert!(!schema.get("Outer").expect("declared").has_references);
}

#[test]
fn discriminator_map_drives_embeds_and_delete_rules() {
    let schema = try_compile(json!({
        "Page": {
            "embeddedsOne": {
                "block": {
                    "polymorphic": true,
                    "discriminatorMap": { "t": "TextBlock", "i": "ImageBlock" },
                },
            },
        },
        "TextBlock": { "isEmbedded": true, "fields": { "body": "string" } },
        "ImageBlock": {
            "isEmbedded": true,
            "referencesOne": { "file": { "class": "Asset" } },
            "indexes": [{ "keys": { "file_reference_field": 1 } }],
        },
        "Asset": {},
        "Like": {
            "referencesOne": {
                "subject": {
                    "polymorphic": true,
                    "discriminatorMap": { "p": "Page", "a": "Asset", "asset": "Asset" },
                    "onDelete": "cascade",
                },
            },
        },
    }))
    .expect("valid schema");

    let page = schema.get("Page").expect("declared");
    assert!(page.has_references, "reached through the mapped ImageBlock");
    let keys: Vec<_> = page
        .resolved_indexes
        .iter()
        .map(|index| serde_json::to_value(&index.keys).ok())
        .collect();
    assert_eq!(keys, vec![Some(json!({ "block.file_reference_field": 1 }))]);

    for class in ["Page", "Asset"] {
        let rules = &schema.get(class).expect("declared").on_delete_rules;
        assert_eq!(rules.len(), 1, "{class} gets one rule");
        assert_eq!(rules[0].class, "Like");
        assert_eq!(rules[0].delete_action, DeleteAction::Cascade);
        assert!(rules[0].polymorphic);
        assert!(rules[0].discriminator_map.is_some());
    }
    for class in ["TextBlock", "ImageBlock", "Like"] {
        assert!(schema.get(class).expect("declared").on_delete_rules.is_empty(), "{class}");
    }
}

#[test]
fn null_flags_are_malformed() {
    for key in ["isEmbedded", "useBatchInsert", "isFile"] {
        let err = try_compile(json!({ "Article": { key: null } })).expect_err("null is not a flag");

        assert_eq!(err.kind(), ErrorKind::MalformedDeclaration, "{key}");
        assert_eq!(err.class(), Some("Article"));
    }
}

#[test]
fn subclass_keeps_its_own_id_generator() {
    let schema = try_compile(json!({
        "Root": { "inheritable": { "type": "single" } },
        "Sub": { "inheritance": { "class": "Root", "value": "s" }, "idGenerator": "sequence" },
        "Plain": { "inheritance": { "class": "Root", "value": "p" } },
    }))
    .expect("valid schema");

    let generator = |class: &str| {
        schema
            .get(class)
            .and_then(|class| class.id_generator.as_ref())
            .map(|generator| generator.name.clone())
    };
    assert_eq!(generator("Sub").as_deref(), Some("sequence"));
    assert_eq!(generator("Plain").as_deref(), Some("native"));
}
