// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use geo::{line_string, polygon, LineString, Polygon};
use landr::{
    Attributes, Classifier, EntityRef, FeatureLayer, LandrEntity, LayerType, LineStringGraph,
    PolygonGraph, Relationship,
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
}

fn network(lines: Vec<LineString<f64>>) -> LineStringGraph {
    let mut graph = LineStringGraph::new();
    for (id, line) in (0u32..).zip(lines) {
        graph.add_line(line, id, Attributes::default()).unwrap();
    }
    graph
}

fn row_of_fields() -> PolygonGraph {
    PolygonGraph::from_polygons([
        rect(0.0, 0.0, 1.0, 1.0),
        rect(1.0, 0.0, 2.0, 1.0),
        rect(2.0, 0.0, 3.0, 1.0),
    ])
    .unwrap()
}

#[test]
fn zero_contact_length_is_rejected_for_touches() {
    let mut graph = row_of_fields();
    let hedges = network(vec![line_string![(x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]);
    for contact in [0.0, -1.0, f64::NAN] {
        let classifier = Classifier::new(0.1, contact);
        assert!(matches!(
            classifier.compute_line_neighbours(&mut graph, &hedges, Relationship::Touches),
            Err(landr::Error::ZeroContactLength)
        ));
        assert!(matches!(
            classifier.compute_neighbours_with_barriers(&mut graph, &hedges, Relationship::Touches),
            Err(landr::Error::ZeroContactLength)
        ));
    }
    let first = graph.face_by_id(0).unwrap();
    assert!(graph.face(first).unwrap().line_neighbours().is_none());
}

#[test]
fn hedge_on_a_shared_edge_is_a_neighbour_of_both_fields() {
    let mut graph = row_of_fields();
    let hedges = network(vec![
        line_string![(x: 1.0, y: 0.1), (x: 1.0, y: 0.9)],
        line_string![(x: 10.0, y: 10.0), (x: 11.0, y: 10.0)],
    ]);
    let hedge = hedges.line_by_id(0).unwrap();

    let classifier = Classifier::new(0.05, 0.5);
    classifier
        .compute_line_neighbours(&mut graph, &hedges, Relationship::Touches)
        .unwrap();

    let left = graph.face_by_id(0).unwrap();
    let middle = graph.face_by_id(1).unwrap();
    let right = graph.face_by_id(2).unwrap();
    let shared = graph.common_edges(left, middle)[0];

    let on_left = graph.face(left).unwrap().line_neighbours().unwrap();
    assert_eq!(on_left, &[(hedge, Some(shared))]);
    let on_middle = graph.face(middle).unwrap().line_neighbours().unwrap();
    assert_eq!(on_middle, &[(hedge, Some(shared))]);
    assert!(graph.face(right).unwrap().line_neighbours().unwrap().is_empty());

    let everything = graph.all_neighbours(left);
    assert_eq!(
        everything,
        vec![EntityRef::Area(middle), EntityRef::Line(hedge)]
    );

    // A longer contact length than the hedge drops it again.
    Classifier::new(0.05, 0.9)
        .compute_line_neighbours(&mut graph, &hedges, Relationship::Touches)
        .unwrap();
    assert!(graph.face(left).unwrap().line_neighbours().unwrap().is_empty());
}

#[test]
fn intersecting_stream_is_found_through_the_buffer() {
    let mut graph = row_of_fields();
    let streams = network(vec![line_string![(x: 2.5, y: -1.0), (x: 2.5, y: 2.0)]]);
    let stream = streams.line_by_id(0).unwrap();

    Classifier::new(0.6, 1.0)
        .compute_line_neighbours(&mut graph, &streams, Relationship::Intersects)
        .unwrap();

    let ids_with_stream: Vec<u32> = graph
        .faces_ordered_by_id()
        .filter(|f| {
            f.line_neighbours()
                .is_some_and(|n| n.iter().any(|(l, _)| *l == stream))
        })
        .map(|f| f.id())
        .collect();
    assert_eq!(ids_with_stream, vec![1, 2]);
}

#[test]
fn barrier_severs_only_the_edge_it_runs_along() {
    let mut graph = row_of_fields();
    let walls = network(vec![line_string![(x: 2.0, y: 0.0), (x: 2.0, y: 1.0)]]);

    Classifier::new(0.05, 0.5)
        .compute_neighbours_with_barriers(&mut graph, &walls, Relationship::Contains)
        .unwrap();

    let left = graph.face_by_id(0).unwrap();
    let middle = graph.face_by_id(1).unwrap();
    let right = graph.face_by_id(2).unwrap();
    assert_eq!(graph.ordered_neighbour_ids(left), vec![1]);
    assert_eq!(graph.ordered_neighbour_ids(middle), vec![0]);
    assert!(graph.ordered_neighbour_ids(right).is_empty());
    assert_eq!(graph.edge_count(), 6);

    assert!(matches!(
        Classifier::new(0.05, 0.5).compute_neighbours_with_barriers(
            &mut graph,
            &walls,
            Relationship::Intersects
        ),
        Err(landr::Error::RelationshipNotAllowed(_))
    ));
}

#[test]
fn flow_prefers_a_downstream_field() {
    let graph = row_of_fields();
    let streams = LineStringGraph::new();
    let mut flow = FeatureLayer::new("flow", LayerType::Line);
    flow.push(
        line_string![(x: 0.5, y: 0.5), (x: 1.5, y: 0.5)].into(),
        Attributes::default(),
    )
    .unwrap();

    let left = graph.face_by_id(0).unwrap();
    let middle = graph.face_by_id(1).unwrap();
    let partner = Classifier::new(0.1, 0.5)
        .compute_neighbour_by_line_topology(&graph, left, &flow, &streams)
        .unwrap()
        .unwrap();
    assert_eq!(partner.entity, EntityRef::Area(middle));
    assert_relative_eq!(partner.length, 1.0);

    // Nothing starts in the last field.
    let right = graph.face_by_id(2).unwrap();
    assert!(Classifier::new(0.1, 0.5)
        .compute_neighbour_by_line_topology(&graph, right, &flow, &streams)
        .unwrap()
        .is_none());
}

#[test]
fn flow_reaches_a_stream_beyond_an_isolated_field() {
    let mut graph = PolygonGraph::from_polygons([rect(0.0, 0.0, 1.0, 1.0)]).unwrap();
    let streams = network(vec![line_string![(x: 1.2, y: -1.0), (x: 1.2, y: 2.0)]]);
    let stream = streams.line_by_id(0).unwrap();
    let classifier = Classifier::new(0.5, 0.5);
    classifier
        .compute_line_neighbours(&mut graph, &streams, Relationship::Intersects)
        .unwrap();

    let mut flow = FeatureLayer::new("flow", LayerType::Line);
    flow.push(
        line_string![(x: 0.5, y: 0.5), (x: 2.0, y: 0.5)].into(),
        Attributes::default(),
    )
    .unwrap();

    let field = graph.face_by_id(0).unwrap();
    let partner = classifier
        .compute_neighbour_by_line_topology(&graph, field, &flow, &streams)
        .unwrap()
        .unwrap();
    assert_eq!(partner.entity, EntityRef::Line(stream));
    assert_relative_eq!(partner.length, 0.7, epsilon = 1e-9);

    let polygons = FeatureLayer::new("fields", LayerType::Polygon);
    assert!(matches!(
        classifier.compute_neighbour_by_line_topology(&graph, field, &polygons, &streams),
        Err(landr::Error::NotLineLayer(_))
    ));
}

#[test]
fn line_network_links_downstream() {
    let streams = network(vec![
        line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
        line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)],
        line_string![(x: 1.0, y: 1.0), (x: 1.0, y: 0.0)],
    ]);
    let first = streams.line_by_id(0).unwrap();
    let second = streams.line_by_id(1).unwrap();
    let tributary = streams.line_by_id(2).unwrap();
    assert_eq!(streams.downstream(first).unwrap(), vec![second]);
    assert_eq!(streams.downstream(tributary).unwrap(), vec![second]);
    assert_eq!(streams.upstream(second).unwrap(), vec![first, tributary]);
    assert_eq!(streams.node_count(), 4);
}
