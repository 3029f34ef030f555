//! Stage 3: resolve single-collection inheritance.
//!
//! Classes are visited parent-first, so by the time a subclass is resolved
//! its parent already carries every member inherited from further up.

use crate::prelude::*;
use tracing::debug;

const STAGE: &str = "inheritance";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mark {
    Visiting,
    Done,
}

///
/// Inherited
/// Everything a subclass takes from its ancestors.
///

struct Inherited {
    fields: IndexMap<String, Field>,
    references_one: IndexMap<String, Reference>,
    references_many: IndexMap<String, Reference>,
    embeddeds_one: IndexMap<String, Embedded>,
    embeddeds_many: IndexMap<String, Embedded>,
    root: String,
    inheritable: Inheritable,
    collection: Option<String>,
    id_generator: Option<IdGenerator>,
    parent_events: Events,

    // inheritable ancestors that record this subclass's discriminator value
    registrars: Vec<String>,
}

/// Resolve every subclass, parents before children.
pub fn resolve_all(classes: &mut BTreeMap<String, ClassConfig>) -> Result<(), CompileError> {
    let order = dependency_order(classes)?;

    for name in &order {
        resolve_class(classes, name)?;
    }

    Ok(())
}

/// Class names ordered so every parent comes before its subclasses.
/// Roots are visited in name order, each followed depth-first.
pub fn dependency_order(
    classes: &BTreeMap<String, ClassConfig>,
) -> Result<Vec<String>, CompileError> {
    let mut marks = BTreeMap::new();
    let mut order = Vec::with_capacity(classes.len());

    for name in classes.keys() {
        visit(name, classes, &mut marks, &mut order)?;
    }

    Ok(order)
}

fn visit<'a>(
    name: &'a str,
    classes: &'a BTreeMap<String, ClassConfig>,
    marks: &mut BTreeMap<&'a str, Mark>,
    order: &mut Vec<String>,
) -> Result<(), CompileError> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            return Err(CompileError::DependencyCycle {
                stage: STAGE,
                classes: marks
                    .iter()
                    .filter(|(_, mark)| **mark == Mark::Visiting)
                    .map(|(name, _)| (*name).to_string())
                    .collect(),
            });
        }
        None => {}
    }

    let Some(class) = classes.get(name) else {
        return Ok(());
    };
    marks.insert(name, Mark::Visiting);

    if let Some(parent) = class.parent() {
        let Some((parent, _)) = classes.get_key_value(parent) else {
            return Err(CompileError::unknown(
                Location::member(name, "inheritance"),
                format!("parent class '{parent}' does not exist"),
            ));
        };
        visit(parent, classes, marks, order)?;
    }

    marks.insert(name, Mark::Done);
    order.push(name.to_string());

    Ok(())
}

fn resolve_class(
    classes: &mut BTreeMap<String, ClassConfig>,
    name: &str,
) -> Result<(), CompileError> {
    let Some(class) = classes.get(name) else {
        return Ok(());
    };
    let Some(inheritance) = &class.inheritance else {
        return Ok(());
    };
    let value = inheritance
        .value
        .clone()
        .ok_or_else(|| CompileError::missing(Location::member(name, "inheritance"), "value"))?;

    let inherited = collect_inherited(classes, name, &inheritance.class)?;

    // Phase 1: register the discriminator value up the chain.
    for registrar in &inherited.registrars {
        let values = classes
            .get_mut(registrar)
            .and_then(|class| class.inheritable.as_mut())
            .map(|inheritable| &mut inheritable.values);

        if let Some(values) = values {
            if let Some(existing) = values.get(&value) {
                return Err(CompileError::invariant(
                    Location::member(name, "inheritance"),
                    format!(
                        "discriminator value '{value}' is already used by class '{existing}' under '{registrar}'"
                    ),
                ));
            }
            values.insert(value.clone(), name.to_string());
        }
    }

    // Phase 2: merge members into the subclass.
    let Some(class) = classes.get_mut(name) else {
        return Ok(());
    };

    class.fields = merge(inherited.fields, std::mem::take(&mut class.fields));
    class.references_one = merge(
        inherited.references_one,
        std::mem::take(&mut class.references_one),
    );
    class.references_many = merge(
        inherited.references_many,
        std::mem::take(&mut class.references_many),
    );
    class.embeddeds_one = merge(
        inherited.embeddeds_one,
        std::mem::take(&mut class.embeddeds_one),
    );
    class.embeddeds_many = merge(
        inherited.embeddeds_many,
        std::mem::take(&mut class.embeddeds_many),
    );

    class.collection = inherited.collection;
    // an explicit ancestor generator wins, then the class's own
    let own = class.id_generator.take().filter(|generator| generator.explicit);
    class.id_generator = match inherited.id_generator {
        Some(generator) if generator.explicit => Some(generator),
        fallback => own.or(fallback),
    };
    class.parent_events = inherited.parent_events;

    if let Some(inheritance) = class.inheritance.as_mut() {
        inheritance.ty = Some(inherited.inheritable.ty);
        inheritance.field = Some(inherited.inheritable.field.clone());
    }

    debug!(
        class = name,
        root = %inherited.root,
        value = %value,
        fields = class.fields.len(),
        "subclass resolved"
    );

    Ok(())
}

// collect_inherited
// single inheritance: the immediate parent must be the inheritable root
fn collect_inherited(
    classes: &BTreeMap<String, ClassConfig>,
    name: &str,
    parent_name: &str,
) -> Result<Inherited, CompileError> {
    let location = || Location::member(name, "inheritance");

    let parent = classes.get(parent_name).ok_or_else(|| {
        CompileError::unknown(
            location(),
            format!("parent class '{parent_name}' does not exist"),
        )
    })?;

    let Some(inheritable) = &parent.inheritable else {
        let message = if parent.is_subclass() {
            format!(
                "single inheritance does not work with multiple inheritance: '{parent_name}' is a subclass but not inheritable"
            )
        } else {
            format!("class '{parent_name}' is not inheritable and has no inheritance")
        };

        return Err(CompileError::invariant(location(), message));
    };

    // root first, then every ancestor above it
    let chain = ancestors(classes, parent_name);

    let id_generator = chain
        .iter()
        .rev()
        .find_map(|ancestor| {
            ancestor
                .id_generator
                .as_ref()
                .filter(|generator| generator.explicit)
        })
        .or(parent.id_generator.as_ref())
        .cloned();

    let mut parent_events = Events::default();
    for ancestor in chain.iter().rev() {
        parent_events.append(&ancestor.events);
    }

    let registrars = chain
        .iter()
        .filter(|ancestor| ancestor.inheritable.is_some())
        .map(|ancestor| ancestor.name.clone())
        .collect();

    Ok(Inherited {
        fields: parent.fields.clone(),
        references_one: parent.references_one.clone(),
        references_many: parent.references_many.clone(),
        embeddeds_one: parent.embeddeds_one.clone(),
        embeddeds_many: parent.embeddeds_many.clone(),
        root: parent_name.to_string(),
        inheritable: inheritable.clone(),
        collection: parent.collection.clone(),
        id_generator,
        parent_events,
        registrars,
    })
}

fn ancestors<'a>(classes: &'a BTreeMap<String, ClassConfig>, from: &str) -> Vec<&'a ClassConfig> {
    let mut chain = Vec::new();
    let mut current = classes.get(from);

    while let Some(class) = current {
        if chain.len() > classes.len() {
            break;
        }
        chain.push(class);
        current = class.parent().and_then(|parent| classes.get(parent));
    }

    chain
}

// merge
// own members override inherited ones in place; new ones go last
fn merge<T: Inherit>(inherited: IndexMap<String, T>, own: IndexMap<String, T>) -> IndexMap<String, T> {
    let mut merged: IndexMap<String, T> = inherited
        .into_iter()
        .map(|(name, mut member)| {
            member.mark_inherited();
            (name, member)
        })
        .collect();

    for (name, member) in own {
        merged.insert(name, member);
    }

    merged
}
