// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use geo::{polygon, LineString, Polygon};
use landr::kernel::difference;
use landr::{
    Attributes, Error, FeatureLayer, LandrConfig, LandrEntity, LayerType, PolygonGraph,
};

fn square(x0: f64, y0: f64) -> Polygon<f64> {
    polygon![
        (x: x0, y: y0),
        (x: x0 + 1.0, y: y0),
        (x: x0 + 1.0, y: y0 + 1.0),
        (x: x0, y: y0 + 1.0),
    ]
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    for shorter in permutations(n - 1) {
        for pos in 0..=shorter.len() {
            let mut p = shorter.clone();
            p.insert(pos, n - 1);
            result.push(p);
        }
    }
    result
}

/// Builds a graph inserting `shapes[i]` with identifier `i` in `order`.
fn build(shapes: &[Polygon<f64>], order: &[usize]) -> PolygonGraph {
    let mut graph = PolygonGraph::new();
    for &i in order {
        graph
            .add_polygon(shapes[i].clone(), i as u32, Attributes::default())
            .unwrap();
    }
    graph
}

/// Sorted `(low id, high id)` pairs of neighbouring faces.
fn adjacency(graph: &PolygonGraph) -> Vec<(u32, u32)> {
    let mut pairs = Vec::new();
    for face in graph.faces() {
        for other in graph.ordered_neighbour_ids(face.key()) {
            if face.id() < other {
                pairs.push((face.id(), other));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

fn ring_of(graph: &PolygonGraph, id: u32) -> LineString<f64> {
    let key = graph.face_by_id(id).unwrap();
    graph.face(key).unwrap().polygon().exterior().clone()
}

#[test]
fn l_shape_in_every_insertion_order() {
    // 0 is the corner, 1 sits to its right and 2 above it.
    let shapes = [square(0.0, 0.0), square(1.0, 0.0), square(0.0, 1.0)];
    let orders = permutations(3);
    assert_eq!(orders.len(), 6);

    for order in orders {
        let graph = build(&shapes, &order);
        let corner = graph.face_by_id(0).unwrap();
        let right = graph.face_by_id(1).unwrap();
        let top = graph.face_by_id(2).unwrap();

        assert_eq!(graph.ordered_neighbour_ids(corner), vec![1, 2], "order {order:?}");
        assert_eq!(graph.ordered_neighbour_ids(right), vec![0], "order {order:?}");
        assert_eq!(graph.ordered_neighbour_ids(top), vec![0], "order {order:?}");

        assert_relative_eq!(graph.common_boundary_length(corner, right), 1.0);
        assert_relative_eq!(graph.common_boundary_length(corner, top), 1.0);
        assert_relative_eq!(graph.common_boundary_length(right, corner), 1.0);
        assert_eq!(graph.common_edges(corner, right).len(), 1);

        assert_eq!(graph.edge_count(), 5, "order {order:?}");
        assert!(graph.is_complete(), "order {order:?}");
    }
}

#[test]
fn grid_end_state_does_not_depend_on_order() {
    let shapes = [
        square(0.0, 0.0),
        square(1.0, 0.0),
        square(0.0, 1.0),
        square(1.0, 1.0),
    ];
    let reference = build(&shapes, &[0, 1, 2, 3]);
    let expected = adjacency(&reference);
    assert_eq!(expected, vec![(0, 1), (0, 2), (1, 3), (2, 3)]);
    assert_eq!(reference.edge_count(), 8);
    assert_eq!(reference.node_count(), 5);

    for order in permutations(4) {
        let graph = build(&shapes, &order);
        assert_eq!(graph.edge_count(), reference.edge_count(), "order {order:?}");
        assert_eq!(graph.node_count(), reference.node_count(), "order {order:?}");
        assert_eq!(adjacency(&graph), expected, "order {order:?}");
        assert!(graph.is_complete(), "order {order:?}");
    }
}

#[test]
fn shared_edges_lie_on_both_rings() {
    // Faces of different sizes so shared edges are partial sides.
    let shapes = vec![
        polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 1.0), (x: 0.0, y: 1.0)],
        polygon![(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 3.0), (x: 1.0, y: 3.0)],
        polygon![(x: 2.0, y: 1.0), (x: 4.0, y: 1.0), (x: 4.0, y: 2.0), (x: 2.0, y: 2.0)],
        polygon![(x: 4.0, y: 0.0), (x: 5.0, y: 0.0), (x: 5.0, y: 2.0), (x: 4.0, y: 2.0)],
    ];
    let graph = PolygonGraph::from_polygons(shapes).unwrap();

    let mut shared = 0;
    for (_, edge) in graph.edges() {
        if !edge.is_shared() {
            continue;
        }
        shared += 1;
        for face in edge.faces() {
            let ring = graph.face(*face).unwrap().polygon().exterior().clone();
            assert!(
                difference(edge.line(), &[ring]).unwrap() == Some(Vec::new()),
                "edge {:?} leaves face {}",
                edge.line(),
                graph.face(*face).unwrap().id()
            );
        }
    }
    assert_eq!(shared, 5);
    assert!(graph.is_complete());

    let base = graph.face_by_id(0).unwrap();
    assert_eq!(graph.ordered_neighbour_ids(base), vec![1, 2, 3]);
    let tall = graph.face_by_id(1).unwrap();
    let block = graph.face_by_id(2).unwrap();
    assert_relative_eq!(graph.common_boundary_length(tall, block), 1.0);
    let side = graph.face_by_id(3).unwrap();
    assert_relative_eq!(graph.common_boundary_length(block, side), 1.0);
    assert_relative_eq!(graph.common_boundary_length(base, side), 1.0);
}

#[test]
fn segment_inside_an_edge_finds_that_edge() {
    let graph = build(&[square(0.0, 0.0), square(1.0, 0.0)], &[0, 1]);
    let left = graph.face_by_id(0).unwrap();
    let right = graph.face_by_id(1).unwrap();
    let shared = graph.common_edges(left, right)[0];

    let inside: LineString<f64> = vec![(1.0, 0.2), (1.0, 0.4)].into();
    assert_eq!(graph.find_edge_line_intersecting_with(left, &inside), Some(shared));
    assert_eq!(graph.find_edge_line_intersecting_with(right, &inside), Some(shared));

    let bottom: LineString<f64> = vec![(0.2, 0.0), (0.4, 0.0)].into();
    let found = graph.find_edge_line_intersecting_with(left, &bottom).unwrap();
    assert_ne!(found, shared);
    let rest = difference(&bottom, &[graph.edge(found).unwrap().line().clone()]).unwrap();
    assert_eq!(rest, Some(Vec::new()));
    assert_eq!(graph.neighbour_with_common_edge(left, found), None);
    assert_eq!(graph.neighbour_with_common_edge(left, shared), Some(right));

    let outside: LineString<f64> = vec![(5.0, 5.0), (6.0, 5.0)].into();
    assert_eq!(graph.find_edge_line_intersecting_with(left, &outside), None);
}

#[test]
fn failed_insertion_leaves_the_graph_untouched() {
    let mut graph = build(&[square(0.0, 0.0), square(0.0, 1.0)], &[0, 1]);
    let left = graph.face_by_id(0).unwrap();
    // Strip the left square of the edge along its right side, so the
    // shared boundary of the next square has nothing to split.
    let right_side = graph
        .face(left)
        .unwrap()
        .edges()
        .iter()
        .copied()
        .find(|ek| {
            let line = graph.edge(*ek).unwrap().line();
            line.0.iter().any(|c| c.x == 1.0 && c.y == 0.0)
        })
        .unwrap();
    graph.detach_edge(left, right_side).unwrap();

    let faces = graph.face_count();
    let edges = graph.edge_count();
    let nodes = graph.node_count();
    let left_edges = graph.face(left).unwrap().edges().to_vec();

    let err = graph
        .add_polygon(square(1.0, 0.0), 2, Attributes::default())
        .unwrap_err();
    assert!(matches!(err, Error::EdgeNotFound { face: 0, inserting: 2, .. }));
    assert!(err.to_string().contains("while inserting face 2"));

    assert_eq!(graph.face_count(), faces);
    assert_eq!(graph.edge_count(), edges);
    assert_eq!(graph.node_count(), nodes);
    assert_eq!(graph.face_by_id(2), None);
    assert_eq!(graph.face(left).unwrap().edges(), left_edges.as_slice());
    assert!(graph.faces().all(|f| f.id() != 2));
}

#[test]
fn sliver_remainder_does_not_abort_insertion() {
    let shapes = [
        polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
        polygon![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 0.5), (x: 1.0, y: 0.5)],
        polygon![(x: 1.0, y: 1.0 - 1e-10), (x: 2.0, y: 1.0 - 1e-10), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0)],
        polygon![(x: 1.0, y: 0.5), (x: 2.0, y: 0.5), (x: 2.0, y: 1.0 - 2e-10), (x: 1.0, y: 1.0 - 2e-10)],
    ];
    let graph = build(&shapes, &[0, 1, 2, 3]);
    assert_eq!(graph.face_count(), 4);
    assert!(graph.is_complete());
    let left = graph.face_by_id(0).unwrap();
    assert!(graph.ordered_neighbour_ids(left).contains(&3));
}

#[test]
fn faces_with_holes_use_their_exterior() {
    let with_hole = polygon!(
        exterior: [(x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 3.0), (x: 0.0, y: 3.0)],
        interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 2.0)]],
    );
    let graph = PolygonGraph::from_polygons([with_hole, square(3.0, 0.0)]).unwrap();
    assert!(graph.is_complete());
    let ring = ring_of(&graph, 0);
    assert!(ring.is_closed());
    let a = graph.face_by_id(0).unwrap();
    let b = graph.face_by_id(1).unwrap();
    assert_relative_eq!(graph.common_boundary_length(a, b), 1.0);
    assert_relative_eq!(graph.face(a).unwrap().area(), 8.0);
}

#[test]
fn graph_from_layer_uses_configured_id_field() {
    let mut layer = FeatureLayer::new("parcels", LayerType::Polygon);
    for x in 0..3 {
        layer
            .push(square(x as f64, 0.0).into(), Attributes::default())
            .unwrap();
    }
    let config = LandrConfig::default();
    assert!(PolygonGraph::from_layer_with_config(&layer, &config).is_err());

    layer.set_index_int_field(&config.id_field, 1);
    let graph = PolygonGraph::from_layer_with_config(&layer, &config).unwrap();
    assert_eq!(graph.face_count(), 3);
    let middle = graph.face_by_id(2).unwrap();
    assert_eq!(graph.ordered_neighbour_ids(middle), vec![1, 3]);

    let lines = FeatureLayer::new("streams", LayerType::Line);
    assert!(matches!(
        PolygonGraph::from_layer(&lines, "SELF_ID"),
        Err(landr::Error::NotPolygonLayer(_))
    ));
}

#[test]
fn rebuild_and_json_copies_match() {
    let shapes = [square(0.0, 0.0), square(1.0, 0.0), square(0.0, 1.0)];
    let graph = build(&shapes, &[2, 0, 1]);
    let copy = graph.rebuild().unwrap();
    let loaded = PolygonGraph::from_json(&graph.to_json().unwrap()).unwrap();
    for other in [&copy, &loaded] {
        assert_eq!(other.edge_count(), graph.edge_count());
        assert_eq!(adjacency(other), adjacency(&graph));
        let ids: Vec<u32> = other.faces().map(|f| f.id()).collect();
        assert_eq!(ids, vec![2, 0, 1]);
    }
}
