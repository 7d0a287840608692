//! Topological ordering with a stable tie-break

use std::collections::{BTreeSet, HashMap};

use crate::errors::{WorkflowError, WorkflowResult};

/// Kahn's algorithm where the eligible set is keyed by insertion index, so
/// among tasks that are ready at the same time the earliest-inserted one is
/// always emitted first.
pub fn topological_order(
    nodes: &[String],
    dependencies: &HashMap<String, Vec<String>>,
) -> WorkflowResult<Vec<String>> {
    let position: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    // Reverse edges: dependency -> dependents
    let mut dependents: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut remaining: Vec<usize> = vec![0; nodes.len()];

    for (i, id) in nodes.iter().enumerate() {
        for dep in dependencies.get(id).into_iter().flatten() {
            if position.contains_key(dep.as_str()) {
                remaining[i] += 1;
                dependents.entry(dep.as_str()).or_default().push(i);
            }
        }
    }

    let mut eligible: BTreeSet<usize> = remaining
        .iter()
        .enumerate()
        .filter(|(_, &count)| count == 0)
        .map(|(i, _)| i)
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(next) = eligible.pop_first() {
        let id = &nodes[next];
        order.push(id.clone());
        for &dependent in dependents.get(id.as_str()).into_iter().flatten() {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                eligible.insert(dependent);
            }
        }
    }

    if order.len() != nodes.len() {
        let stuck: Vec<String> = nodes
            .iter()
            .filter(|id| !order.contains(id))
            .cloned()
            .collect();
        return Err(WorkflowError::Cycle(stuck));
    }

    Ok(order)
}
