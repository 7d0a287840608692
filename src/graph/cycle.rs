//! Cycle detection for the dependency graph

use std::collections::{HashMap, HashSet};

/// Depth-first search with "visiting" / "visited" marks, started from each
/// node in insertion order. Returns the first cycle found as a path whose
/// first and last elements are the same task.
pub fn find_cycle(nodes: &[String], dependencies: &HashMap<String, Vec<String>>) -> Option<Vec<String>> {
    let mut visited = HashSet::new();
    let mut visiting = HashSet::new();
    let mut path = Vec::new();

    for id in nodes {
        if visited.contains(id.as_str()) {
            continue;
        }
        if let Some(cycle) = visit(id, dependencies, &mut visited, &mut visiting, &mut path) {
            return Some(cycle);
        }
    }

    None
}

fn visit<'a>(
    id: &'a str,
    dependencies: &'a HashMap<String, Vec<String>>,
    visited: &mut HashSet<&'a str>,
    visiting: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visiting.insert(id);
    path.push(id);

    for dep in dependencies.get(id).into_iter().flatten() {
        if visiting.contains(dep.as_str()) {
            let start = path.iter().position(|p| *p == dep.as_str()).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(dep.clone());
            return Some(cycle);
        }
        if !visited.contains(dep.as_str()) {
            if let Some(cycle) = visit(dep, dependencies, visited, visiting, path) {
                return Some(cycle);
            }
        }
    }

    path.pop();
    visiting.remove(id);
    visited.insert(id);
    None
}
