//! Stage 4: whole-graph properties that depend on embedded classes.
//!
//! Each property runs its own bounded sweep: a class resolves once every
//! class it embeds has resolved, and a full pass without progress means the
//! embed graph has a cycle.

use crate::prelude::*;
use tracing::debug;

pub const HAS_REFERENCES: &str = "hasReferences";
pub const HAS_GROUPS: &str = "hasGroups";
pub const RESOLVED_INDEXES: &str = "resolvedIndexes";

/// Compute and store every derived property.
pub fn resolve_all(classes: &mut BTreeMap<String, ClassConfig>) -> Result<(), CompileError> {
    let has_references = sweep(classes, HAS_REFERENCES, |class, resolved: &BTreeMap<String, bool>| {
        let mut value = class.declares_references();
        for (_, embedded) in class.embedded_dependencies() {
            value |= *resolved.get(embedded)?;
        }

        Some(value)
    })?;

    let has_groups = sweep(classes, HAS_GROUPS, |class, resolved: &BTreeMap<String, bool>| {
        let mut value = class.declares_groups();
        for (_, embedded) in class.embedded_dependencies() {
            value |= *resolved.get(embedded)?;
        }

        Some(value)
    })?;

    let mut indexes = sweep(classes, RESOLVED_INDEXES, resolve_indexes)?;

    for (name, class) in classes.iter_mut() {
        class.has_references = has_references.get(name).copied().unwrap_or_default();
        class.has_groups = has_groups.get(name).copied().unwrap_or_default();
        class.resolved_indexes = indexes.remove(name).unwrap_or_default();
    }

    Ok(())
}

// resolve_indexes
// own indexes first, then each embed's resolved indexes under its name
fn resolve_indexes(class: &ClassConfig, resolved: &BTreeMap<String, Vec<Index>>) -> Option<Vec<Index>> {
    let mut indexes = class.indexes.clone();

    for (embed_name, embedded) in class.embedded_dependencies() {
        for index in resolved.get(embedded)? {
            let lifted = index.prefixed(embed_name);
            if !indexes.contains(&lifted) {
                indexes.push(lifted);
            }
        }
    }

    Some(indexes)
}

/// Repeat full passes over `classes` until every class has a value.
///
/// `compute` returns `None` to defer a class whose dependencies are not yet
/// resolved. A pass that resolves nothing fails with a dependency cycle
/// naming every class still unresolved.
pub fn sweep<T>(
    classes: &BTreeMap<String, ClassConfig>,
    property: &'static str,
    compute: impl Fn(&ClassConfig, &BTreeMap<String, T>) -> Option<T>,
) -> Result<BTreeMap<String, T>, CompileError> {
    let mut resolved = BTreeMap::new();
    let mut passes = 0_usize;

    while resolved.len() < classes.len() {
        passes += 1;
        let mut progressed = false;

        for (name, class) in classes {
            if resolved.contains_key(name) {
                continue;
            }
            if let Some(value) = compute(class, &resolved) {
                resolved.insert(name.clone(), value);
                progressed = true;
            }
        }

        if !progressed {
            let stalled: Vec<String> = classes
                .keys()
                .filter(|name| !resolved.contains_key(*name))
                .cloned()
                .collect();
            debug!(property, passes, stalled = stalled.len(), "sweep stalled");

            return Err(CompileError::DependencyCycle {
                stage: property,
                classes: stalled,
            });
        }
    }

    debug!(property, passes, "fixed point reached");

    Ok(resolved)
}
