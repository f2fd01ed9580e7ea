//! Tests for topology queries: history, future, between, islands,
//! seeds, ends and path ordering.
mod common;
use common::*;
use kairo::prelude::*;

#[test]
fn test_adjacent_nodes_one_hop() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let (a, b, c, d) = diamond(&mut graph, &catalogue);

    let downstream = graph.adjacent_nodes(a, true, false).unwrap();
    assert_eq!(downstream.len(), 2);
    assert!(downstream.contains(&b) && downstream.contains(&c));

    let upstream = graph.adjacent_nodes(d, false, true).unwrap();
    assert_eq!(upstream.len(), 2);
    assert!(upstream.contains(&b) && upstream.contains(&c));

    let both = graph.adjacent_nodes(b, true, true).unwrap();
    assert!(both.contains(&a) && both.contains(&d));
}

#[test]
fn test_history_and_future_are_transitive() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let (a, b, c, d) = diamond(&mut graph, &catalogue);

    let history = graph.nodes_in_history(d).unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.contains(&a) && history.contains(&b) && history.contains(&c));
    // The node itself is never part of its own closure.
    assert!(!history.contains(&d));

    let future = graph.nodes_in_future(a).unwrap();
    assert_eq!(future.len(), 3);
    assert!(future.contains(&d));
}

#[test]
fn test_nodes_between_diamond() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let (a, b, c, d) = diamond(&mut graph, &catalogue);

    let inner = graph.nodes_between(&[a, d], false).unwrap();
    let inner: Vec<NodeId> = inner.into_iter().collect();
    assert_eq!(inner, vec![b, c]);

    let full = graph.nodes_between(&[a, d], true).unwrap();
    assert_eq!(full.len(), 4);
}

#[test]
fn test_seed_and_end_nodes_in_creation_order() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let chain = pass_chain(&mut graph, &catalogue, &["a", "b"]);
    let lone = graph.create_node(&catalogue, "pass", "lone").unwrap();

    assert_eq!(graph.seed_nodes(), vec![chain[0], lone]);
    assert_eq!(graph.end_nodes(), vec![chain[1], lone]);
}

#[test]
fn test_islands_split_disjoint_chains() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let left = pass_chain(&mut graph, &catalogue, &["a", "b"]);
    let right = pass_chain(&mut graph, &catalogue, &["x", "y"]);

    let all = [left[0], left[1], right[0], right[1]];
    let islands = graph.islands(&all).unwrap();
    assert_eq!(islands.len(), 2);
    assert!(islands[0].contains(&left[0]) && islands[0].contains(&left[1]));
    assert!(islands[1].contains(&right[0]) && islands[1].contains(&right[1]));
}

#[test]
fn test_islands_bridge_through_unselected_nodes() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let chain = pass_chain(&mut graph, &catalogue, &["a", "b", "c"]);

    // a and c are joined through the unselected b, so they share an
    // island even though b is not in the input.
    let islands = graph.islands(&[chain[0], chain[2]]).unwrap();
    assert_eq!(islands.len(), 1);
    assert_eq!(islands[0].len(), 2);
}

#[test]
fn test_islands_ignore_edge_direction() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let s = graph.create_node(&catalogue, "pass", "s").unwrap();
    let d = graph.create_node(&catalogue, "merge", "d").unwrap();
    let s2 = graph.create_node(&catalogue, "pass", "s2").unwrap();
    graph
        .connect(AttrRef::output(s, "result"), AttrRef::input(d, "lhs"))
        .unwrap();
    graph
        .connect(AttrRef::output(s2, "result"), AttrRef::input(d, "rhs"))
        .unwrap();

    // s and s2 only meet at their shared sink.
    let islands = graph.islands(&[s, s2]).unwrap();
    assert_eq!(islands.len(), 1);
}

#[test]
fn test_contained_edges_exclude_selection() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let chain = pass_chain(&mut graph, &catalogue, &["a", "b", "c", "d"]);

    // Only the b -> c edge lies strictly between a and d.
    let contained = graph.contained_edges(&[chain[0], chain[3]]).unwrap();
    assert_eq!(contained.len(), 1);
    let edge = graph.edge(contained[0]).unwrap();
    assert_eq!(edge.source_node(), chain[1]);
    assert_eq!(edge.dest_node(), chain[2]);
}

#[test]
fn test_longest_path_picks_longer_branch() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    // Two chains of different length out of a shared seed.
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let b = graph.create_node(&catalogue, "pass", "b").unwrap();
    let c = graph.create_node(&catalogue, "pass", "c").unwrap();
    let short = graph.create_node(&catalogue, "pass", "short").unwrap();
    link(&mut graph, a, b);
    link(&mut graph, b, c);
    link(&mut graph, a, short);

    let seeds = graph.seed_nodes();
    let ends = graph.end_nodes();
    let longest = graph.longest_path(&seeds, &ends).unwrap();
    assert_eq!(longest, vec![a, b, c]);
}

#[test]
fn test_order_nodes_recovers_dependency_order() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let (a, b, c, d) = diamond(&mut graph, &catalogue);

    let ordered = graph.order_nodes(&[d, c, a, b]).unwrap();
    assert_eq!(ordered[0], a);
    assert_eq!(ordered[3], d);
    // Parallel branches fall back to creation order.
    assert_eq!(ordered, vec![a, b, c, d]);
}

#[test]
fn test_queries_are_deterministic_across_calls() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let (a, d) = {
        let (a, _, _, d) = diamond(&mut graph, &catalogue);
        (a, d)
    };

    let first = graph.nodes_between(&[a, d], true).unwrap();
    for _ in 0..10 {
        let again = graph.nodes_between(&[a, d], true).unwrap();
        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            again.iter().collect::<Vec<_>>()
        );
    }
}
