//! Stage 2: validate and complete reference, embed and relation descriptors.

use crate::{
    DEFAULT_DISCRIMINATOR_FIELD, REFERENCE_FIELD_SUFFIX, REFERENCE_FIELD_TYPE,
    build::{
        declaration::{Declaration, describe},
        normalize::NormalizedClass,
    },
    prelude::*,
    validate::naming,
};
use serde_json::Map;
use tracing::debug;

const TARGET_KEYS: &[&str] = &[
    "class",
    "polymorphic",
    "discriminatorField",
    "discriminatorMap",
];
const REFERENCE_KEYS: &[&str] = &["field", "onDelete", "inherited"];
const RELATION_KEYS: &[&str] = &["reference"];
const THROUGH_KEYS: &[&str] = &["class", "through", "local", "foreign"];

///
/// Role
/// What an association target is used for; decides which classes qualify.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Role {
    Embed,
    Reference,
    Relation,
}

///
/// Catalog
/// Every declared class name, with its embedded flag.
///

struct Catalog {
    classes: BTreeMap<String, bool>,
}

impl Catalog {
    fn new(classes: &BTreeMap<String, NormalizedClass>) -> Self {
        Self {
            classes: classes
                .iter()
                .map(|(name, class)| (name.clone(), class.config.is_embedded))
                .collect(),
        }
    }

    // check
    // embeds may only point at embedded classes
    fn check(&self, location: &Location, class: &str, role: Role) -> Result<(), CompileError> {
        match self.classes.get(class) {
            None => Err(CompileError::unknown(
                location.clone(),
                format!("target class '{class}' does not exist"),
            )),
            Some(false) if role == Role::Embed => Err(CompileError::unknown(
                location.clone(),
                format!("target class '{class}' is not an embedded class"),
            )),
            Some(_) => Ok(()),
        }
    }
}

/// Resolve the associations of every class, in class-name order.
pub fn resolve_all(
    classes: BTreeMap<String, NormalizedClass>,
) -> Result<BTreeMap<String, ClassConfig>, CompileError> {
    let catalog = Catalog::new(&classes);
    let mut resolved = BTreeMap::new();

    for (name, class) in classes {
        let config = resolve_class(class, &catalog)?;
        naming::validate_data_names(&config)?;

        debug!(
            class = %name,
            references = config.references_one.len() + config.references_many.len(),
            embeds = config.embeddeds_one.len() + config.embeddeds_many.len(),
            "associations resolved"
        );
        resolved.insert(name, config);
    }

    Ok(resolved)
}

fn resolve_class(class: NormalizedClass, catalog: &Catalog) -> Result<ClassConfig, CompileError> {
    let NormalizedClass {
        mut config,
        associations,
    } = class;
    let subclass = config.is_subclass();

    // references, each with its backing field
    for (cardinality, group) in [
        (Cardinality::One, &associations.references_one),
        (Cardinality::Many, &associations.references_many),
    ] {
        for (name, value) in group {
            let reference = resolve_reference(&config.name, name, value, subclass, catalog)?;
            let backing = backing_field(name, reference.inherited);
            config.fields.insert(reference.field.clone(), backing);

            match cardinality {
                Cardinality::One => config.references_one.insert(name.clone(), reference),
                Cardinality::Many => config.references_many.insert(name.clone(), reference),
            };
        }
    }

    // embeds
    config.embeddeds_one = resolve_group(&config.name, &associations.embeddeds_one, |n, v| {
        resolve_embedded(&config.name, n, v, subclass, catalog)
    })?;
    config.embeddeds_many = resolve_group(&config.name, &associations.embeddeds_many, |n, v| {
        resolve_embedded(&config.name, n, v, subclass, catalog)
    })?;

    // inverse relations
    config.relations_one = resolve_group(&config.name, &associations.relations_one, |n, v| {
        resolve_relation(&config.name, n, v, catalog)
    })?;
    config.relations_many_one =
        resolve_group(&config.name, &associations.relations_many_one, |n, v| {
            resolve_relation(&config.name, n, v, catalog)
        })?;
    config.relations_many_many =
        resolve_group(&config.name, &associations.relations_many_many, |n, v| {
            resolve_relation(&config.name, n, v, catalog)
        })?;
    config.relations_many_through =
        resolve_group(&config.name, &associations.relations_many_through, |n, v| {
            resolve_through(&config.name, n, v, catalog)
        })?;

    Ok(config)
}

fn resolve_group<T>(
    class: &str,
    group: &Map<String, Value>,
    mut resolve: impl FnMut(&str, &Value) -> Result<T, CompileError>,
) -> Result<IndexMap<String, T>, CompileError> {
    let mut resolved = IndexMap::with_capacity(group.len());

    for (name, value) in group {
        if name.is_empty() {
            return Err(CompileError::malformed(
                Location::class(class),
                "association name is empty",
            ));
        }
        resolved.insert(name.clone(), resolve(name, value)?);
    }

    Ok(resolved)
}

// resolve_target
// a concrete class wins over the polymorphic form
fn resolve_target(
    decl: &Declaration,
    role: Role,
    catalog: &Catalog,
) -> Result<AssociationTarget, CompileError> {
    let location = decl.location();

    if let Some(class) = decl.non_empty_string("class")? {
        catalog.check(&location, &class, role)?;
        return Ok(AssociationTarget::Class(class));
    }

    if !decl.flag("polymorphic", false)? {
        return Err(CompileError::missing(location, "class"));
    }

    let discriminator_field = decl
        .non_empty_string("discriminatorField")?
        .unwrap_or_else(|| DEFAULT_DISCRIMINATOR_FIELD.to_string());

    let discriminator_map = match decl.get("discriminatorMap") {
        None | Some(Value::Bool(false)) => None,
        Some(Value::Object(map)) => {
            let mut values = IndexMap::with_capacity(map.len());
            for (value, class) in map {
                let Some(class) = class.as_str() else {
                    return Err(CompileError::malformed(
                        location,
                        format!(
                            "discriminator map entry '{value}' must name a class, found {}",
                            describe(class)
                        ),
                    ));
                };
                catalog.check(&location, class, role)?;
                values.insert(value.clone(), class.to_string());
            }

            (!values.is_empty()).then_some(values)
        }
        Some(other) => {
            return Err(CompileError::malformed(
                location,
                format!("'discriminatorMap' must be a map, found {}", describe(other)),
            ));
        }
    };

    Ok(AssociationTarget::Polymorphic {
        discriminator_field,
        discriminator_map,
    })
}

fn resolve_reference(
    class: &str,
    name: &str,
    value: &Value,
    subclass: bool,
    catalog: &Catalog,
) -> Result<Reference, CompileError> {
    let decl = Declaration::member(class, name, value)?;
    let target = resolve_target(&decl, Role::Reference, catalog)?;

    let field = decl
        .non_empty_string("field")?
        .unwrap_or_else(|| format!("{name}{REFERENCE_FIELD_SUFFIX}"));

    let on_delete = match decl.get("onDelete") {
        None => None,
        Some(Value::String(action)) => Some(DeleteAction::parse(action).ok_or_else(|| {
            CompileError::invariant(
                decl.location(),
                format!("onDelete action '{action}' is not valid"),
            )
        })?),
        Some(other) => {
            return Err(CompileError::malformed(
                decl.location(),
                format!("'onDelete' must be a string, found {}", describe(other)),
            ));
        }
    };

    Ok(Reference {
        target,
        field,
        on_delete,
        inherited: inherited_flag(&decl, subclass)?,
        options: extra(&decl, &[TARGET_KEYS, REFERENCE_KEYS]),
    })
}

fn resolve_embedded(
    class: &str,
    name: &str,
    value: &Value,
    subclass: bool,
    catalog: &Catalog,
) -> Result<Embedded, CompileError> {
    let decl = Declaration::member(class, name, value)?;

    Ok(Embedded {
        target: resolve_target(&decl, Role::Embed, catalog)?,
        inherited: inherited_flag(&decl, subclass)?,
        options: extra(&decl, &[TARGET_KEYS, &["inherited"]]),
    })
}

fn resolve_relation(
    class: &str,
    name: &str,
    value: &Value,
    catalog: &Catalog,
) -> Result<Relation, CompileError> {
    let decl = Declaration::member(class, name, value)?;
    let target = resolve_target(&decl, Role::Relation, catalog)?;

    Ok(Relation {
        target,
        reference: decl.required_string("reference")?,
        options: extra(&decl, &[TARGET_KEYS, RELATION_KEYS]),
    })
}

fn resolve_through(
    class: &str,
    name: &str,
    value: &Value,
    catalog: &Catalog,
) -> Result<ThroughRelation, CompileError> {
    let decl = Declaration::member(class, name, value)?;
    let location = decl.location();

    let target = decl.required_string("class")?;
    let through = decl.required_string("through")?;
    let local = decl.required_string("local")?;
    let foreign = decl.required_string("foreign")?;
    catalog.check(&location, &target, Role::Relation)?;
    catalog.check(&location, &through, Role::Relation)?;

    Ok(ThroughRelation {
        class: target,
        through,
        local,
        foreign,
        options: decl.extra(THROUGH_KEYS),
    })
}

// inherited_flag
// explicit flags must be booleans; subclasses default to false
fn inherited_flag(decl: &Declaration, subclass: bool) -> Result<Option<bool>, CompileError> {
    match decl.get("inherited") {
        None => Ok(subclass.then_some(false)),
        Some(Value::Bool(inherited)) => Ok(Some(*inherited)),
        Some(other) => Err(CompileError::malformed(
            decl.location(),
            format!("'inherited' must be a boolean, found {}", describe(other)),
        )),
    }
}

fn backing_field(name: &str, inherited: Option<bool>) -> Field {
    Field {
        inherited,
        reference_field: true,
        ..Field::new(REFERENCE_FIELD_TYPE, name)
    }
}

fn extra(decl: &Declaration, known: &[&[&str]]) -> IndexMap<String, Value> {
    let known: Vec<&str> = known.iter().flat_map(|keys| keys.iter().copied()).collect();

    decl.extra(&known)
}
