//! Tests for structural graph operations: nodes, edges, legality,
//! attribute-edge cleanup, node sets and events.
mod common;
use common::*;
use kairo::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_add_and_remove_node() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.node(a).unwrap().name(), "a");
    assert_eq!(graph.node_by_name("a").unwrap().uid(), a);

    let removed = graph.remove_node(a).unwrap();
    assert_eq!(removed.name(), "a");
    assert_eq!(graph.node_count(), 0);
    assert!(matches!(graph.node(a), Err(GraphError::NodeNotFound(_))));
}

#[test]
fn test_duplicate_node_name_rejected() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    graph.create_node(&catalogue, "pass", "a").unwrap();
    let err = graph.create_node(&catalogue, "pass", "a").unwrap_err();
    assert!(matches!(err, GraphError::DuplicateName { .. }));
    assert_eq!(graph.node_count(), 1);
}

#[test]
fn test_rename_node_keeps_uid() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let b = graph.create_node(&catalogue, "pass", "b").unwrap();

    graph.rename_node(a, "renamed").unwrap();
    assert_eq!(graph.node(a).unwrap().name(), "renamed");

    let err = graph.rename_node(b, "renamed").unwrap_err();
    assert!(matches!(err, GraphError::DuplicateName { .. }));
}

#[test]
fn test_unknown_node_type_rejected() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let err = graph.create_node(&catalogue, "bogus", "a").unwrap_err();
    assert!(matches!(err, GraphError::UnknownNodeType(_)));
}

#[test]
fn test_connect_records_edge_and_type() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let b = graph.create_node(&catalogue, "pass", "b").unwrap();

    let source = AttrRef::output(a, "result");
    let dest = AttrRef::input(b, "value");
    let edge_id = graph.connect(source.clone(), dest.clone()).unwrap();

    let edge = graph.edge(edge_id).unwrap();
    assert_eq!(edge.source(), &source);
    assert_eq!(edge.dest(), &dest);
    // The edge inherits the source attribute's type.
    assert_eq!(edge.data_type(), DataType::Float);
    assert_eq!(edge.opposite(&source), Some(&dest));

    assert_eq!(graph.find_edge(&source, &dest), Some(edge_id));
    assert_eq!(graph.attr_edges(&dest).len(), 1);
    assert_eq!(graph.node_edges(a, true).len(), 1);
    assert_eq!(graph.node_edges(a, false).len(), 0);
}

#[test]
fn test_connected_attribute_queries() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let d = graph.create_node(&catalogue, "merge", "d").unwrap();
    let e = graph.create_node(&catalogue, "merge", "e").unwrap();
    graph
        .connect(AttrRef::output(a, "result"), AttrRef::input(d, "lhs"))
        .unwrap();
    graph
        .connect(AttrRef::output(a, "result"), AttrRef::input(e, "rhs"))
        .unwrap();

    // One output fans out to two inputs but is reported once.
    assert_eq!(graph.connected_outputs(a), vec![AttrRef::output(a, "result")]);
    assert_eq!(graph.connected_inputs(d), vec![AttrRef::input(d, "lhs")]);
    assert!(graph.connected_inputs(a).is_empty());
}

#[test]
fn test_connect_to_missing_attribute_rejected() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let b = graph.create_node(&catalogue, "pass", "b").unwrap();

    let err = graph
        .connect(AttrRef::output(a, "nope"), AttrRef::input(b, "value"))
        .unwrap_err();
    assert!(matches!(err, GraphError::AttrNotFound { .. }));
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_self_loop_rejected() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();

    let err = graph
        .connect(AttrRef::output(a, "result"), AttrRef::input(a, "value"))
        .unwrap_err();
    match err {
        GraphError::IllegalConnection { reason, .. } => {
            assert_eq!(reason, ConnectionRejection::SelfLoop)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_wrong_direction_rejected() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let b = graph.create_node(&catalogue, "pass", "b").unwrap();

    let err = graph
        .connect(AttrRef::input(a, "value"), AttrRef::input(b, "value"))
        .unwrap_err();
    match err {
        GraphError::IllegalConnection { reason, .. } => {
            assert_eq!(reason, ConnectionRejection::WrongDirection)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_cycle_rejected_and_edges_unchanged() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let nodes = pass_chain(&mut graph, &catalogue, &["a", "b", "c"]);
    let (a, c) = (nodes[0], nodes[2]);
    let before: Vec<EdgeId> = graph.edges().map(|e| e.id()).collect();

    // Closing the chain back onto its head would create a cycle.
    let err = graph
        .connect(AttrRef::output(c, "result"), AttrRef::input(a, "value"))
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::IllegalConnection {
            reason: ConnectionRejection::SourceInDestFuture,
            ..
        }
    ));
    let after: Vec<EdgeId> = graph.edges().map(|e| e.id()).collect();
    assert_eq!(before, after);
}

#[test]
fn test_acyclic_off_allows_cycle() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    graph.set_acyclic(false);
    let nodes = pass_chain(&mut graph, &catalogue, &["a", "b"]);

    graph
        .connect(
            AttrRef::output(nodes[1], "result"),
            AttrRef::input(nodes[0], "value"),
        )
        .unwrap();
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn test_incoming_edge_is_replaced_not_stacked() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let s1 = graph.create_node(&catalogue, "pass", "s1").unwrap();
    let s2 = graph.create_node(&catalogue, "pass", "s2").unwrap();
    let d = graph.create_node(&catalogue, "pass", "d").unwrap();

    let first = link(&mut graph, s1, d);
    let second = link(&mut graph, s2, d);

    assert!(matches!(graph.edge(first), Err(GraphError::EdgeNotFound(_))));
    let dest = AttrRef::input(d, "value");
    let incident = graph.attr_edges(&dest);
    assert_eq!(incident.len(), 1);
    assert_eq!(incident[0].id(), second);
    assert_eq!(incident[0].source_node(), s2);
}

#[test]
fn test_disconnect_clears_both_index_sides() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let nodes = pass_chain(&mut graph, &catalogue, &["a", "b"]);
    let edge = graph.edges().next().unwrap().id();

    graph.disconnect(edge).unwrap();
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.attr_edges(&AttrRef::output(nodes[0], "result")).is_empty());
    assert!(graph.attr_edges(&AttrRef::input(nodes[1], "value")).is_empty());
}

#[test]
fn test_remove_node_destroys_touching_edges() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let nodes = pass_chain(&mut graph, &catalogue, &["a", "b", "c"]);
    graph.add_node_to_set(nodes[1], "group").unwrap();

    graph.remove_node(nodes[1]).unwrap();
    assert_eq!(graph.edge_count(), 0);
    assert!(!graph.node_set("group").unwrap().contains(nodes[1]));
}

#[test]
fn test_remove_attribute_destroys_its_edges() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let b = graph.create_node(&catalogue, "pass", "b").unwrap();
    link(&mut graph, a, b);

    graph
        .remove_attribute(b, AttrRole::Input, &AttrPath::new("value"))
        .unwrap();
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.node(b).unwrap().get_input("value").is_none());
}

#[test]
fn test_remove_attribute_destroys_reversed_role_edges() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    graph.set_acyclic(false);
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let b = graph.create_node(&catalogue, "pass", "b").unwrap();

    // With acyclic mode off an input attribute may feed an edge.
    graph
        .connect(AttrRef::input(a, "value"), AttrRef::input(b, "value"))
        .unwrap();

    graph
        .remove_attribute(a, AttrRole::Input, &AttrPath::new("value"))
        .unwrap();
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.attr_edges(&AttrRef::input(b, "value")).is_empty());
}

#[test]
fn test_role_root_cannot_be_removed() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let err = graph
        .remove_attribute(a, AttrRole::Input, &AttrPath::root())
        .unwrap_err();
    assert!(matches!(err, GraphError::AttrNotFound { .. }));
}

#[test]
fn test_match_array_preserves_surviving_edges() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let src = graph.create_node(&catalogue, "pass", "src").unwrap();
    let sink = graph.create_node(&catalogue, "pass", "sink").unwrap();

    graph
        .add_attribute(
            sink,
            AttrRole::Input,
            &AttrPath::root(),
            AttrSpec::new("items", DataType::Float).array(),
        )
        .unwrap();
    let items = AttrPath::new("items");
    graph
        .add_attribute(sink, AttrRole::Input, &items, AttrSpec::new("keep", DataType::Float))
        .unwrap();
    graph
        .add_attribute(sink, AttrRole::Input, &items, AttrSpec::new("drop", DataType::Float))
        .unwrap();

    let kept_edge = graph
        .connect(
            AttrRef::output(src, "result"),
            AttrRef::input(sink, "items.keep"),
        )
        .unwrap();
    let dropped_edge = graph
        .connect(
            AttrRef::output(src, "result"),
            AttrRef::input(sink, "items.drop"),
        )
        .unwrap();

    graph
        .match_array_to_spec(
            sink,
            AttrRole::Input,
            &items,
            &[ArrayEntry::new("keep"), ArrayEntry::new("new")],
        )
        .unwrap();

    assert!(graph.edge(kept_edge).is_ok());
    assert!(matches!(
        graph.edge(dropped_edge),
        Err(GraphError::EdgeNotFound(_))
    ));
    let names: Vec<String> = graph
        .node(sink)
        .unwrap()
        .attr(AttrRole::Input, &items)
        .unwrap()
        .children()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(names, vec!["keep", "new"]);
}

#[test]
fn test_node_sets() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let b = graph.create_node(&catalogue, "pass", "b").unwrap();

    // Sets are created on demand.
    graph.add_node_to_set(a, "left").unwrap();
    graph.add_node_to_set(b, "left").unwrap();
    graph.add_node_to_set(a, "right").unwrap();

    assert_eq!(graph.node_set_names(), vec!["left", "right"]);
    assert_eq!(graph.node_set("left").unwrap().len(), 2);
    assert_eq!(graph.nodes_in_set("left").unwrap(), vec![a, b]);
    assert_eq!(graph.sets_containing(a), vec!["left", "right"]);

    graph.remove_node_from_set(a, "right").unwrap();
    assert!(graph.node_set("right").unwrap().is_empty());
    assert!(matches!(
        graph.remove_node_from_set(a, "right"),
        Err(GraphError::NodeNotFound(_))
    ));
    assert!(matches!(
        graph.remove_node_from_set(a, "bogus"),
        Err(GraphError::SetNotFound(_))
    ));
}

#[test]
fn test_events_fire_in_mutation_order() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    graph.observe(Box::new(move |event| {
        let tag = match event {
            GraphEvent::NodeAdded { .. } => "node+",
            GraphEvent::NodeRemoved { .. } => "node-",
            GraphEvent::EdgeAdded { .. } => "edge+",
            GraphEvent::EdgeRemoved { .. } => "edge-",
            GraphEvent::AttributesChanged { .. } => "attrs",
            GraphEvent::StateChanged { .. } => "state",
        };
        sink.borrow_mut().push(tag.to_string());
    }));

    let a = graph.create_node(&catalogue, "pass", "a").unwrap();
    let b = graph.create_node(&catalogue, "pass", "b").unwrap();
    link(&mut graph, a, b);
    graph.remove_node(b).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec!["node+", "node+", "edge+", "edge-", "node-"]
    );
}

#[test]
fn test_replacement_emits_removal_before_addition() {
    let catalogue = test_catalogue();
    let mut graph = Graph::new("g");
    let s1 = graph.create_node(&catalogue, "pass", "s1").unwrap();
    let s2 = graph.create_node(&catalogue, "pass", "s2").unwrap();
    let d = graph.create_node(&catalogue, "pass", "d").unwrap();
    link(&mut graph, s1, d);

    let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = order.clone();
    graph.observe(Box::new(move |event| match event {
        GraphEvent::EdgeAdded { .. } => sink.borrow_mut().push("added"),
        GraphEvent::EdgeRemoved { .. } => sink.borrow_mut().push("removed"),
        _ => {}
    }));

    link(&mut graph, s2, d);
    assert_eq!(*order.borrow(), vec!["removed", "added"]);
}
