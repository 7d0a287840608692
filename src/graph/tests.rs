//! Tests for the dependency graph

use super::*;

fn task(id: &str, deps: Vec<&str>, status: TaskStatus) -> Task {
    Task::new(id, id)
        .with_dependencies(deps.into_iter().map(String::from).collect())
        .with_status(status)
}

fn done(id: &str, deps: Vec<&str>) -> Task {
    task(id, deps, TaskStatus::Completed)
}

#[test]
fn test_linear_chain_orders_prerequisites_first() {
    let tasks = vec![
        done("001", vec![]),
        done("002", vec!["001"]),
        done("003", vec!["002"]),
    ];

    assert_eq!(publish_order(&tasks).unwrap(), vec!["001", "002", "003"]);
}

#[test]
fn test_dependencies_declared_out_of_order() {
    let tasks = vec![
        done("c", vec!["a", "b"]),
        done("a", vec![]),
        done("b", vec!["a"]),
    ];

    assert_eq!(publish_order(&tasks).unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_two_node_cycle_is_rejected() {
    let tasks = vec![done("001", vec!["002"]), done("002", vec!["001"])];

    let err = publish_order(&tasks).unwrap_err();
    match err {
        WorkflowError::Cycle(path) => {
            assert_eq!(path.first(), path.last());
            assert!(path.contains(&"001".to_string()));
            assert!(path.contains(&"002".to_string()));
        }
        other => panic!("expected cycle, got {other}"),
    }
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let tasks = vec![done("001", vec![]), done("002", vec!["002"])];

    let err = publish_order(&tasks).unwrap_err();
    assert!(matches!(err, WorkflowError::Cycle(ref path) if path == &["002", "002"]));
}

#[test]
fn test_longer_cycle_reports_path() {
    let tasks = vec![
        done("a", vec!["c"]),
        done("b", vec!["a"]),
        done("c", vec!["b"]),
    ];

    let err = DependencyGraph::from_tasks(&tasks).validate().unwrap_err();
    assert_eq!(err.to_string(), "circular dependency detected: a -> c -> b -> a");
}

#[test]
fn test_empty_set_yields_empty_order() {
    assert!(publish_order(&[]).unwrap().is_empty());
}

#[test]
fn test_independent_tasks_keep_insertion_order() {
    let tasks = vec![
        done("020", vec![]),
        done("010", vec![]),
        done("030", vec!["010"]),
        done("005", vec![]),
    ];

    let first = publish_order(&tasks).unwrap();
    assert_eq!(first, vec!["020", "010", "030", "005"]);

    for _ in 0..10 {
        assert_eq!(publish_order(&tasks).unwrap(), first);
    }
}

#[test]
fn test_dependency_on_unfinished_task_is_reported() {
    let tasks = vec![
        task("001", vec![], TaskStatus::InProgress),
        done("002", vec!["001"]),
    ];

    let err = publish_order(&tasks).unwrap_err();
    match err {
        WorkflowError::MissingDependency { task, dependency } => {
            assert_eq!(task, "002");
            assert_eq!(dependency, "001");
        }
        other => panic!("expected missing dependency, got {other}"),
    }
}

#[test]
fn test_restriction_ignores_abandoned_tasks_without_edges() {
    let tasks = vec![
        done("001", vec![]),
        task("002", vec![], TaskStatus::Abandoned),
        done("003", vec!["001"]),
    ];

    let graph = DependencyGraph::with_status(&tasks, TaskStatus::Completed);
    assert_eq!(graph.len(), 2);
    assert!(!graph.contains("002"));
    assert_eq!(graph.order().unwrap(), vec!["001", "003"]);
}

#[test]
fn test_every_task_follows_its_dependencies() {
    let tasks = vec![
        done("e", vec!["b", "d"]),
        done("d", vec!["a"]),
        done("c", vec![]),
        done("b", vec!["a", "c"]),
        done("a", vec![]),
    ];

    let order = publish_order(&tasks).unwrap();
    let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
    for t in &tasks {
        for dep in &t.dependencies {
            assert!(pos(dep.as_str()) < pos(t.id.as_str()), "{dep} must precede {}", t.id);
        }
    }
}

#[test]
fn test_duplicate_edges_are_counted_once() {
    let tasks = vec![done("a", vec![]), done("b", vec!["a", "a"])];
    assert_eq!(publish_order(&tasks).unwrap(), vec!["a", "b"]);
}
