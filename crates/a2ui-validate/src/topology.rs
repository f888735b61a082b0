use a2ui_protocol::ROOT_ID;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::integrity::component_id;
use crate::references::component_references;
use crate::ReferenceMap;
use crate::ValidationError;

/// Check that the reference graph is a tree-like DAG rooted at `root`.
///
/// Self-references are reported while the adjacency list is built, before
/// any cycle search. Skipped entirely when there is no `root` component.
pub fn check_topology(
    components: &[Value],
    references: &ReferenceMap,
) -> Result<(), ValidationError> {
    let mut adjacency: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    let mut all_ids: FxHashSet<&str> = FxHashSet::default();

    for component in components {
        let Some(id) = component_id(component) else {
            continue;
        };
        all_ids.insert(id);
        let edges = adjacency.entry(id).or_default();

        for reference in component_references(component, references) {
            if reference.target == id {
                return Err(ValidationError::SelfReference {
                    component: id.to_string(),
                    field: reference.field.to_string(),
                });
            }
            edges.push(reference.target);
        }
    }

    if !all_ids.contains(ROOT_ID) {
        return Ok(());
    }

    let visited = walk_from_root(&adjacency)?;

    let mut orphans: Vec<String> = all_ids
        .difference(&visited)
        .map(|id| (*id).to_string())
        .collect();
    if orphans.is_empty() {
        return Ok(());
    }
    orphans.sort();
    Err(ValidationError::OrphanComponent { orphans })
}

/// Depth-first search from `root` with an explicit stack of
/// `(node, next edge index)` frames. A back edge to a node still on the
/// stack is a cycle.
fn walk_from_root<'a>(
    adjacency: &FxHashMap<&'a str, Vec<&'a str>>,
) -> Result<FxHashSet<&'a str>, ValidationError> {
    let mut visited = FxHashSet::default();
    let mut on_stack = FxHashSet::default();
    let mut stack: Vec<(&str, usize)> = Vec::new();

    visited.insert(ROOT_ID);
    on_stack.insert(ROOT_ID);
    stack.push((ROOT_ID, 0));

    while let Some((node, next)) = stack.last_mut() {
        let neighbor = adjacency
            .get(*node)
            .and_then(|edges| edges.get(*next))
            .copied();
        *next += 1;

        match neighbor {
            Some(neighbor) if !visited.contains(neighbor) => {
                visited.insert(neighbor);
                on_stack.insert(neighbor);
                stack.push((neighbor, 0));
            }
            Some(neighbor) if on_stack.contains(neighbor) => {
                return Err(ValidationError::CircularReference {
                    component: neighbor.to_string(),
                });
            }
            Some(_) => {}
            None => {
                let node = *node;
                on_stack.remove(node);
                stack.pop();
            }
        }
    }

    Ok(visited)
}
