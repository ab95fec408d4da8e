// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Graph nodes and boundary edges.
//!
//! An [`Edge`] is one maximal boundary line. It is owned by the graph's edge
//! arena and referenced by key from the one face (outer boundary) or two
//! faces (shared boundary) it bounds. Each edge carries two opposing
//! directed arcs between its endpoint [`Node`]s, so the node set forms a
//! planar graph that can be walked in either direction.

use geo::{Coord, LineString};
use smallvec::SmallVec;

use crate::kernel::line_length;
use crate::keys::{EdgeKey, FaceKey, NodeKey};

/// A graph vertex at an exact coordinate.
#[derive(Debug, Clone)]
pub struct Node {
    pub coord: Coord<f64>,
    /// Outgoing arcs, as (edge, index into `Edge::arcs`).
    pub(crate) out_arcs: Vec<(EdgeKey, usize)>,
}

impl Node {
    pub(crate) fn new(coord: Coord<f64>) -> Self {
        Self {
            coord,
            out_arcs: Vec::new(),
        }
    }

    /// Number of edge ends attached to this node.
    pub fn degree(&self) -> usize {
        self.out_arcs.len()
    }

    /// Edges leaving this node (an edge looping back to this node appears twice).
    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.out_arcs.iter().map(|(edge, _)| *edge)
    }
}

/// One direction of travel along an edge.
#[derive(Debug, Clone, Copy)]
pub struct DirectedArc {
    pub from: NodeKey,
    pub to: NodeKey,
    /// The second coordinate along the arc, giving its leaving direction.
    pub direction_point: Coord<f64>,
    /// `true` when the arc follows the edge line's own orientation.
    pub forward: bool,
}

impl DirectedArc {
    /// Leaving angle in radians, measured from the positive x axis.
    pub fn angle(&self, from: Coord<f64>) -> f64 {
        (self.direction_point.y - from.y).atan2(self.direction_point.x - from.x)
    }
}

/// A boundary line shared by one or two faces.
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) line: LineString<f64>,
    pub(crate) faces: SmallVec<[FaceKey; 2]>,
    pub(crate) arcs: [DirectedArc; 2],
}

impl Edge {
    /// The edge geometry.
    pub fn line(&self) -> &LineString<f64> {
        &self.line
    }

    /// Faces this edge bounds: one on the outer boundary, two when shared.
    pub fn faces(&self) -> &[FaceKey] {
        &self.faces
    }

    /// Returns `true` if two faces share this edge.
    pub fn is_shared(&self) -> bool {
        self.faces.len() > 1
    }

    /// The face on the other side of this edge from `face`, if any.
    pub fn other_face(&self, face: FaceKey) -> Option<FaceKey> {
        if self.faces.len() < 2 {
            return None;
        }
        self.faces.iter().copied().find(|f| *f != face)
    }

    /// The two opposing directed arcs (forward first).
    pub fn arcs(&self) -> &[DirectedArc; 2] {
        &self.arcs
    }

    pub fn start_node(&self) -> NodeKey {
        self.arcs[0].from
    }

    pub fn end_node(&self) -> NodeKey {
        self.arcs[0].to
    }

    pub fn length(&self) -> f64 {
        line_length(&self.line)
    }

    pub fn start_coord(&self) -> Coord<f64> {
        self.line.0[0]
    }

    pub fn end_coord(&self) -> Coord<f64> {
        self.line.0[self.line.0.len() - 1]
    }

    /// Returns `true` if both edges connect the same pair of endpoints.
    pub fn is_coincident(&self, other: &Edge) -> bool {
        let (a0, a1) = (self.start_coord(), self.end_coord());
        let (b0, b1) = (other.start_coord(), other.end_coord());
        (a0 == b0 && a1 == b1) || (a0 == b1 && a1 == b0)
    }

    /// Returns `true` if the edges have at least one endpoint in common.
    pub fn shares_endpoint_with(&self, other: &Edge) -> bool {
        let (a0, a1) = (self.start_coord(), self.end_coord());
        let (b0, b1) = (other.start_coord(), other.end_coord());
        a0 == b0 || a0 == b1 || a1 == b0 || a1 == b1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;
    use slotmap::SlotMap;

    fn edge(line: LineString<f64>) -> Edge {
        let mut nodes: SlotMap<NodeKey, ()> = SlotMap::with_key();
        let (a, b) = (nodes.insert(()), nodes.insert(()));
        let n = line.0.len();
        Edge {
            arcs: [
                DirectedArc { from: a, to: b, direction_point: line.0[1], forward: true },
                DirectedArc { from: b, to: a, direction_point: line.0[n - 2], forward: false },
            ],
            line,
            faces: SmallVec::new(),
        }
    }

    #[test]
    fn coincidence_needs_both_endpoints() {
        let e1 = edge(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]);
        let e2 = edge(line_string![(x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)]);
        let e3 = edge(line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)]);
        assert!(e1.is_coincident(&e2));
        assert!(!e1.is_coincident(&e3));
        assert!(e1.shares_endpoint_with(&e3));
    }

    #[test]
    fn other_face_of_unshared_edge_is_none() {
        let mut faces: SlotMap<FaceKey, ()> = SlotMap::with_key();
        let (f, g) = (faces.insert(()), faces.insert(()));
        let mut e = edge(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]);
        e.faces.push(f);
        assert!(!e.is_shared());
        assert_eq!(e.other_face(f), None);
        e.faces.push(g);
        assert_eq!(e.other_face(f), Some(g));
        assert_eq!(e.other_face(g), Some(f));
    }

    #[test]
    fn arc_angle() {
        let e = edge(line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 2.0)]);
        let angle = e.arcs()[0].angle(Coord { x: 0.0, y: 0.0 });
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
