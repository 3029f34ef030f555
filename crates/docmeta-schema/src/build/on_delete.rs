//! Stage 5: turn `onDelete` policies into cascade edges on target classes.

use crate::prelude::*;
use tracing::debug;

///
/// Edge
/// A rule waiting to be attached to its target class.
///

struct Edge {
    target: String,
    rule: OnDeleteRule,
}

/// Attach every cascade edge and return how many were attached.
pub fn build_all(classes: &mut BTreeMap<String, ClassConfig>) -> Result<usize, CompileError> {
    // Phase 1: collect edges against the read-only class set.
    let mut edges = Vec::new();
    for (owner, class) in classes.iter() {
        for (cardinality, name, reference) in class.references() {
            collect_edges(classes, owner, cardinality, name, reference, &mut edges)?;
        }
    }

    // Phase 2: attach them.
    let count = edges.len();
    for Edge { target, rule } in edges {
        if let Some(class) = classes.get_mut(&target) {
            class.on_delete_rules.push(rule);
        }
    }

    Ok(count)
}

fn collect_edges(
    classes: &BTreeMap<String, ClassConfig>,
    owner: &str,
    cardinality: Cardinality,
    name: &str,
    reference: &Reference,
    edges: &mut Vec<Edge>,
) -> Result<(), CompileError> {
    let Some(action) = reference.on_delete else {
        return Ok(());
    };

    if !action.is_allowed_for(cardinality) {
        let allowed = DeleteAction::allowed_for(cardinality)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        return Err(CompileError::invariant(
            Location::member(owner, name),
            format!("onDelete action '{action}' is not valid for a reference {cardinality} (allowed: {allowed})"),
        ));
    }

    let (discriminator_field, discriminator_map) = match &reference.target {
        AssociationTarget::Class(_) => (None, None),
        AssociationTarget::Polymorphic {
            discriminator_field,
            discriminator_map,
        } => (Some(discriminator_field.clone()), discriminator_map.clone()),
    };

    let rule = OnDeleteRule {
        class: owner.to_string(),
        reference_name: name.to_string(),
        reference_type: cardinality,
        polymorphic: reference.target.is_polymorphic(),
        delete_action: action,
        discriminator_field,
        discriminator_map,
    };

    // a polymorphic target without a map could be any class at runtime
    let targets: Vec<&str> = match &reference.target {
        AssociationTarget::Polymorphic {
            discriminator_map: None,
            ..
        } => classes.keys().map(String::as_str).collect(),
        target => target.known_classes(),
    };

    debug!(
        class = owner,
        reference = name,
        action = %action,
        targets = targets.len(),
        "onDelete edges"
    );

    for target in targets {
        edges.push(Edge {
            target: target.to_string(),
            rule: rule.clone(),
        });
    }

    Ok(())
}
