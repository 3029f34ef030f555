use crate::prelude::*;

// Validate that every inverse relation with a concrete target points at a
// reference the target actually holds, inherited references included.
pub fn validate_inverse_relations(
    classes: &BTreeMap<String, ClassConfig>,
) -> Result<(), CompileError> {
    for (name, class) in classes.iter().filter(|(_, class)| class.is_persistable()) {
        let relations = class
            .relations_one
            .iter()
            .chain(&class.relations_many_one)
            .chain(&class.relations_many_many);

        for (relation_name, relation) in relations {
            let Some(target) = relation.target.class() else {
                continue;
            };
            let Some(target_class) = classes.get(target) else {
                return Err(CompileError::unknown(
                    Location::member(name, relation_name),
                    format!("target class '{target}' does not exist"),
                ));
            };

            let reference = relation.reference.as_str();
            if !target_class.references_one.contains_key(reference)
                && !target_class.references_many.contains_key(reference)
            {
                return Err(CompileError::unknown(
                    Location::member(name, relation_name),
                    format!("class '{target}' has no reference named '{reference}'"),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn schema(reference: &str) -> BTreeMap<String, ClassConfig> {
        let mut author = ClassConfig::new("Author", false);
        author.relations_many_one.insert(
            "articles".to_string(),
            Relation {
                target: AssociationTarget::Class("Article".to_string()),
                reference: reference.to_string(),
                options: IndexMap::new(),
            },
        );

        let mut article = ClassConfig::new("Article", false);
        article.references_one.insert(
            "author".to_string(),
            Reference {
                target: AssociationTarget::Class("Author".to_string()),
                field: "author_reference_field".to_string(),
                on_delete: None,
                inherited: None,
                options: IndexMap::new(),
            },
        );

        BTreeMap::from([
            ("Article".to_string(), article),
            ("Author".to_string(), author),
        ])
    }

    #[test]
    fn relation_to_existing_reference_passes() {
        validate_inverse_relations(&schema("author")).expect("reference exists");
    }

    #[test]
    fn relation_to_missing_reference_fails() {
        let err = validate_inverse_relations(&schema("writer")).expect_err("no such reference");

        assert_eq!(err.kind(), ErrorKind::UnknownReference);
        assert!(err.to_string().contains("'articles' of class 'Author'"), "{err}");
    }
}
