// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The polygon graph: owner of all nodes, edges and faces.
//!
//! Storage follows the arena pattern: slot maps with generational keys hold
//! every entity, faces and edges refer to each other by key, and dropping the
//! graph releases everything exactly once. Faces are indexed both by
//! insertion order and by their stable identifier.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::attributes::AttrValue;
use crate::edge::{Edge, Node};
use crate::face::Face;
use crate::kernel::CoordKey;
use crate::keys::{EdgeKey, FaceKey, NodeKey};

/// A planar subdivision built from polygon features.
///
/// # Example
///
/// ```
/// use geo::polygon;
/// use landr::PolygonGraph;
///
/// let graph = PolygonGraph::from_polygons([
///     polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
///     polygon![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0)],
/// ])
/// .unwrap();
///
/// assert_eq!(graph.face_count(), 2);
/// assert_eq!(graph.edge_count(), 3);
/// assert!(graph.is_complete());
/// ```
#[derive(Debug, Default)]
pub struct PolygonGraph {
    pub(crate) nodes: SlotMap<NodeKey, Node>,
    pub(crate) node_index: FxHashMap<CoordKey, NodeKey>,
    pub(crate) edges: SlotMap<EdgeKey, Edge>,
    pub(crate) faces: SlotMap<FaceKey, Face>,
    pub(crate) order: Vec<FaceKey>,
    pub(crate) by_id: BTreeMap<u32, FaceKey>,
}

impl PolygonGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Face operations ---

    /// Returns the face for the given key, or `None` if not found.
    pub fn face(&self, key: FaceKey) -> Option<&Face> {
        self.faces.get(key)
    }

    /// Mutable access to a face, for attribute updates.
    pub fn face_mut(&mut self, key: FaceKey) -> Option<&mut Face> {
        self.faces.get_mut(key)
    }

    /// Looks up a face by its stable identifier.
    pub fn face_by_id(&self, id: u32) -> Option<FaceKey> {
        self.by_id.get(&id).copied()
    }

    /// Face keys in insertion order.
    pub fn face_keys(&self) -> &[FaceKey] {
        &self.order
    }

    /// Faces in insertion order.
    pub fn faces(&self) -> impl Iterator<Item = &Face> + '_ {
        self.order.iter().filter_map(|k| self.faces.get(*k))
    }

    /// Faces in ascending identifier order.
    pub fn faces_ordered_by_id(&self) -> impl Iterator<Item = &Face> + '_ {
        self.by_id.values().filter_map(|k| self.faces.get(*k))
    }

    pub fn face_count(&self) -> usize {
        self.order.len()
    }

    // --- Edge operations ---

    /// Returns the edge for the given key, or `None` if not found.
    pub fn edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge)> + '_ {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // --- Node operations ---

    /// Returns the node for the given key, or `None` if not found.
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Number of edge ends meeting at a node.
    pub fn node_degree(&self, key: NodeKey) -> Option<usize> {
        self.nodes.get(key).map(Node::degree)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Attributes ---

    /// Declares `name` on every face, with a null value where it is missing.
    pub fn add_attribute(&mut self, name: &str) {
        for face in self.faces.values_mut() {
            face.attributes.entry(name.to_string()).or_insert(AttrValue::Null);
        }
    }

    /// Drops `name` from every face.
    pub fn remove_attribute(&mut self, name: &str) {
        for face in self.faces.values_mut() {
            face.attributes.remove(name);
        }
    }

    /// Returns `true` if every face's edges reproduce its exterior ring.
    pub fn is_complete(&self) -> bool {
        self.order.iter().all(|f| self.is_face_complete(*f))
    }

    /// Deletes an edge and unlinks its arcs from their nodes.
    ///
    /// Faces still listing the edge are not touched; callers detach first.
    pub(crate) fn remove_edge(&mut self, key: EdgeKey) -> Option<Edge> {
        let edge = self.edges.remove(key)?;
        for arc in edge.arcs() {
            if let Some(node) = self.nodes.get_mut(arc.from) {
                node.out_arcs.retain(|(e, _)| *e != key);
            }
        }
        Some(edge)
    }
}
