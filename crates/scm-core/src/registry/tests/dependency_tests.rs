use crate::registry::dependency::{DependencyError, DependencyGraph, DependencyGraphBuilder};

fn graph(components: &[(&str, &[&str])]) -> Result<DependencyGraph, DependencyError> {
    let mut builder = DependencyGraphBuilder::new();
    for (name, deps) in components {
        builder.add_component(name, deps.iter());
    }
    builder.build()
}

#[test]
fn test_chain_orders_dependencies_first() {
    let graph = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &[])]).unwrap();
    assert_eq!(graph.overall_order().unwrap(), vec!["C", "B", "A"]);
}

#[test]
fn test_independent_nodes_keep_insertion_order() {
    let graph = graph(&[("x", &[]), ("y", &[]), ("z", &[])]).unwrap();
    assert_eq!(graph.overall_order().unwrap(), vec!["x", "y", "z"]);
}

#[test]
fn test_diamond_follows_declaration_order() {
    // top depends on left then right; both depend on base
    let graph = graph(&[
        ("top", &["left", "right"]),
        ("left", &["base"]),
        ("right", &["base"]),
        ("base", &[]),
    ])
    .unwrap();
    assert_eq!(graph.overall_order().unwrap(), vec!["base", "left", "right", "top"]);
}

#[test]
fn test_order_is_deterministic() {
    let components: &[(&str, &[&str])] = &[("a", &["c"]), ("b", &[]), ("c", &["b"]), ("d", &["a", "b"])];
    let first = graph(components).unwrap().overall_order().unwrap();
    for _ in 0..10 {
        assert_eq!(graph(components).unwrap().overall_order().unwrap(), first);
    }
    assert_eq!(first, vec!["b", "c", "a", "d"]);
}

#[test]
fn test_missing_dependency_names_both_ends() {
    let err = graph(&[("A", &["B"])]).unwrap_err();
    assert_eq!(
        err,
        DependencyError::MissingDependency {
            dependent: "A".to_string(),
            dependency: "B".to_string(),
        }
    );
    assert_eq!(err.to_string(), "'A' cannot find dependency 'B'");
}

#[test]
fn test_builder_accepts_forward_references() {
    let mut builder = DependencyGraphBuilder::new();
    builder.add_dependency("app", "db");
    builder.add_node("app").add_node("db");
    let graph = builder.build().unwrap();
    assert_eq!(graph.dependencies_of("app"), ["db".to_string()]);
}

#[test]
fn test_three_node_cycle_lists_path() {
    let graph = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])]).unwrap();
    let err = graph.overall_order().unwrap_err();
    assert_eq!(
        err,
        DependencyError::Cycle(vec!["A".into(), "B".into(), "C".into(), "A".into()])
    );
    assert!(graph.has_cycles());
}

#[test]
fn test_cycle_path_starts_at_reentered_node() {
    let graph = graph(&[("entry", &["A"]), ("A", &["B"]), ("B", &["A"])]).unwrap();
    assert_eq!(graph.find_cycle(), Some(vec!["A".into(), "B".into(), "A".into()]));
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let graph = graph(&[("A", &["A"])]).unwrap();
    assert_eq!(graph.find_cycle(), Some(vec!["A".to_string(), "A".to_string()]));
}

#[test]
fn test_direct_graph_operations() {
    let mut graph = DependencyGraph::new();
    graph.add_node("a");
    graph.add_node("b");
    graph.add_node("a");
    assert_eq!(graph.len(), 2);

    graph.add_dependency("a", "b").unwrap();
    graph.add_dependency("a", "b").unwrap();
    assert_eq!(graph.dependencies_of("a").len(), 1, "duplicate edges are ignored");
    assert!(graph.dependencies_of("b").is_empty());

    assert_eq!(
        graph.add_dependency("ghost", "a"),
        Err(DependencyError::UnknownNode("ghost".to_string()))
    );
    assert!(!graph.has_cycles());
}

#[test]
fn test_empty_graph() {
    let graph = DependencyGraph::new();
    assert!(graph.is_empty());
    assert!(graph.overall_order().unwrap().is_empty());
}
