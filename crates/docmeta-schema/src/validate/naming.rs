use crate::prelude::*;

/// Data names a generated document class already uses for its own accessors.
pub const RESERVED_NAMES: &[&str] = &[
    "collection",
    "document_data",
    "fields_modified",
    "id",
    "query_for_save",
    "repository",
    "runtime",
];

#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

pub fn validate_class_name(name: &str) -> Result<(), CompileError> {
    if name.trim().is_empty() {
        return Err(CompileError::malformed(
            Location::class(name),
            "class name is empty",
        ));
    }

    Ok(())
}

// validate_data_names
// relations are only data on persistable classes, see ClassConfig::data_names
pub fn validate_data_names(class: &ClassConfig) -> Result<(), CompileError> {
    for name in class.data_names() {
        if name.is_empty() {
            return Err(CompileError::malformed(
                Location::class(&class.name),
                "data name is empty",
            ));
        }
        if is_reserved(name) {
            return Err(CompileError::invariant(
                Location::member(&class.name, name),
                format!("'{name}' is a reserved name"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn reserved_field_name_fails() {
        let mut class = ClassConfig::new("Article", false);
        class.fields.insert("id".to_string(), Field::new("string", "id"));

        let err = validate_data_names(&class).expect_err("id is reserved");
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        assert!(err.to_string().contains("'id' of class 'Article'"), "{err}");
    }

    #[test]
    fn relations_on_embedded_classes_are_not_checked() {
        let mut class = ClassConfig::new("Address", true);
        class.relations_one.insert(
            "repository".to_string(),
            Relation {
                target: AssociationTarget::Class("User".to_string()),
                reference: "address".to_string(),
                options: IndexMap::new(),
            },
        );

        validate_data_names(&class).expect("relations are not data on embedded classes");
    }

    #[test]
    fn blank_class_name_fails() {
        let err = validate_class_name("  ").expect_err("blank");
        assert_eq!(err.kind(), ErrorKind::MalformedDeclaration);
    }
}
