//! The five resolution stages, run in order over the whole class set:
//!
//! 1. [`normalize`] fills defaults and expands shorthand declarations.
//! 2. [`association`] resolves references, embeds and relations.
//! 3. [`inheritance`] merges inherited members, parents first.
//! 4. [`global`] computes embed-dependent properties by bounded sweeps.
//! 5. [`on_delete`] attaches cascade edges to target classes.

pub mod association;
pub(crate) mod declaration;
pub mod global;
pub mod inheritance;
pub mod normalize;
pub mod on_delete;

use crate::{
    prelude::*,
    registry::{IdGeneratorRegistry, TypeRegistry},
    validate::relation,
};
use tracing::info;

/// Raw class declarations keyed by class name.
pub type RawSchema = BTreeMap<String, Value>;

///
/// Compiler
///
/// Holds the registries a compile consults. Compiling is deterministic:
/// identical input always yields an identical [`Schema`] or the same error.
///

#[derive(Clone, Copy)]
pub struct Compiler<'a> {
    types: &'a dyn TypeRegistry,
    id_generators: &'a dyn IdGeneratorRegistry,
}

impl<'a> Compiler<'a> {
    #[must_use]
    pub fn new(types: &'a dyn TypeRegistry, id_generators: &'a dyn IdGeneratorRegistry) -> Self {
        Self {
            types,
            id_generators,
        }
    }

    pub fn compile(&self, raw: &RawSchema) -> Result<Schema, CompileError> {
        info!(classes = raw.len(), "compiling schema");

        let normalized = normalize::normalize_all(raw, self.types, self.id_generators)?;
        info!(classes = normalized.len(), "stage 1: declarations normalized");

        let mut classes = association::resolve_all(normalized)?;
        info!(classes = classes.len(), "stage 2: associations resolved");

        inheritance::resolve_all(&mut classes)?;
        relation::validate_inverse_relations(&classes)?;
        info!(
            subclasses = classes.values().filter(|c| c.is_subclass()).count(),
            "stage 3: inheritance resolved"
        );

        global::resolve_all(&mut classes)?;
        info!(
            with_references = classes.values().filter(|c| c.has_references).count(),
            with_groups = classes.values().filter(|c| c.has_groups).count(),
            "stage 4: global properties resolved"
        );

        let edges = on_delete::build_all(&mut classes)?;
        info!(edges, "stage 5: onDelete graph built");

        Ok(Schema::new(classes))
    }
}

/// Compile `raw` against the given registries.
pub fn compile(
    raw: &RawSchema,
    types: &dyn TypeRegistry,
    id_generators: &dyn IdGeneratorRegistry,
) -> Result<Schema, CompileError> {
    Compiler::new(types, id_generators).compile(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, registry::NameRegistry};
    use serde_json::json;

    fn raw(value: Value) -> RawSchema {
        let Value::Object(map) = value else {
            panic!("test input must be a map");
        };

        map.into_iter().collect()
    }

    #[test]
    fn compile_runs_every_stage() {
        let types = NameRegistry::builtin_types();
        let ids = NameRegistry::builtin_id_generators();
        let compiler = Compiler::new(&types, &ids);

        let schema = compiler
            .compile(&raw(json!({
                "Article": {
                    "fields": { "title": "string" },
                    "referencesOne": { "author": { "class": "Author", "onDelete": "cascade" } },
                    "embeddedsMany": { "comments": { "class": "Comment" } },
                },
                "Author": { "relationsManyOne": { "articles": { "class": "Article", "reference": "author" } } },
                "Comment": { "isEmbedded": true, "indexes": [{ "keys": { "date": -1 } }] },
            })))
            .expect("valid schema");

        let article = schema.get("Article").expect("declared");
        assert!(article.has_references);
        assert!(article.has_groups);
        assert_eq!(article.resolved_indexes[0].to_string(), "{comments.date: -1}");

        let author = schema.get("Author").expect("declared");
        assert_eq!(author.on_delete_rules.len(), 1);
        assert_eq!(schema.embedded().count(), 1);
    }

    #[test]
    fn compile_checks_inverse_relations_after_inheritance() {
        let types = NameRegistry::builtin_types();
        let ids = NameRegistry::builtin_id_generators();

        let err = compile(
            &raw(json!({
                "Article": {},
                "Author": { "relationsOne": { "article": { "class": "Article", "reference": "author" } } },
            })),
            &types,
            &ids,
        )
        .expect_err("Article has no author reference");

        assert_eq!(err.kind(), ErrorKind::UnknownReference);
        assert_eq!(err.class(), Some("Author"));
    }
}
