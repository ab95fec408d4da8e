// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adjacency queries over a built polygon graph.
//!
//! All neighbour information is derived from shared edges through the lazily
//! computed per-face [`NeighbourMap`].

use crate::face::NeighbourMap;
use crate::graph::PolygonGraph;
use crate::keys::{EdgeKey, EntityRef, FaceKey, LineKey};

impl PolygonGraph {
    /// Neighbouring faces of `face` with the edges shared with each.
    ///
    /// Computed on first use after the face's edges last changed.
    pub fn neighbours(&self, face: FaceKey) -> Option<&NeighbourMap> {
        let f = self.faces.get(face)?;
        Some(
            f.neighbours
                .get_or_init(|| NeighbourMap::compute(face, &f.edges, &self.edges)),
        )
    }

    /// Identifiers of the neighbours of `face`, ascending.
    pub fn ordered_neighbour_ids(&self, face: FaceKey) -> Vec<u32> {
        let Some(map) = self.neighbours(face) else {
            return Vec::new();
        };
        let mut ids: Vec<u32> = map
            .faces()
            .filter_map(|k| self.faces.get(k))
            .map(|f| f.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Edges shared by `face` and `other` (empty if they are not neighbours).
    pub fn common_edges(&self, face: FaceKey, other: FaceKey) -> Vec<EdgeKey> {
        self.neighbours(face)
            .and_then(|map| map.get(other))
            .map(<[EdgeKey]>::to_vec)
            .unwrap_or_default()
    }

    /// Total length of the boundary shared by `face` and `other`.
    pub fn common_boundary_length(&self, face: FaceKey, other: FaceKey) -> f64 {
        self.neighbours(face)
            .and_then(|map| map.get(other))
            .map(|edges| self.edges_length(edges))
            .unwrap_or(0.0)
    }

    /// Neighbours of `face` with their shared boundary length, shortest
    /// first. Equal lengths keep ascending identifier order.
    pub fn neighbours_by_boundary_length(&self, face: FaceKey) -> Vec<(FaceKey, f64)> {
        let Some(map) = self.neighbours(face) else {
            return Vec::new();
        };
        let mut result: Vec<(FaceKey, u32, f64)> = map
            .iter()
            .filter_map(|(k, edges)| Some((k, self.faces.get(k)?.id, self.edges_length(edges))))
            .collect();
        result.sort_by_key(|(_, id, _)| *id);
        result.sort_by(|a, b| a.2.total_cmp(&b.2));
        result.into_iter().map(|(k, _, len)| (k, len)).collect()
    }

    /// Area neighbours followed by the line neighbours recorded by the last
    /// classification of `face`.
    pub fn all_neighbours(&self, face: FaceKey) -> Vec<EntityRef> {
        let mut result: Vec<EntityRef> = self
            .neighbours(face)
            .map(|map| map.faces().map(EntityRef::Area).collect())
            .unwrap_or_default();
        let mut seen: Vec<LineKey> = Vec::new();
        let lines = self
            .faces
            .get(face)
            .and_then(|f| f.line_neighbours())
            .unwrap_or_default();
        for (line, _) in lines {
            if !seen.contains(line) {
                seen.push(*line);
                result.push(EntityRef::Line(*line));
            }
        }
        result
    }

    fn edges_length(&self, edges: &[EdgeKey]) -> f64 {
        edges
            .iter()
            .filter_map(|e| self.edges.get(*e))
            .map(|e| e.length())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{polygon, Polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    /// A 3x1 strip (id 0) with three unit squares on top (ids 1..=3) and
    /// a wide block (id 4) under its left two thirds.
    fn strip() -> PolygonGraph {
        PolygonGraph::from_polygons([
            rect(0.0, 0.0, 3.0, 1.0),
            rect(2.0, 1.0, 3.0, 2.0),
            rect(1.0, 1.0, 2.0, 2.0),
            rect(0.0, 1.0, 1.0, 2.0),
            rect(0.0, -1.0, 2.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn neighbour_ids_are_sorted() {
        let graph = strip();
        let base = graph.face_by_id(0).unwrap();
        assert_eq!(graph.ordered_neighbour_ids(base), vec![1, 2, 3, 4]);
        let middle = graph.face_by_id(2).unwrap();
        assert_eq!(graph.ordered_neighbour_ids(middle), vec![0, 1, 3]);
    }

    #[test]
    fn boundary_lengths() {
        let graph = strip();
        let base = graph.face_by_id(0).unwrap();
        let block = graph.face_by_id(4).unwrap();
        assert_relative_eq!(graph.common_boundary_length(base, block), 2.0);
        assert_relative_eq!(graph.common_boundary_length(block, base), 2.0);

        let far = graph.face_by_id(1).unwrap();
        assert_eq!(graph.common_boundary_length(far, block), 0.0);
        assert!(graph.common_edges(far, block).is_empty());
    }

    #[test]
    fn ordering_by_boundary_length() {
        let graph = strip();
        let base = graph.face_by_id(0).unwrap();
        let ordered: Vec<u32> = graph
            .neighbours_by_boundary_length(base)
            .into_iter()
            .map(|(k, _)| graph.face(k).unwrap().id)
            .collect();
        assert_eq!(ordered, vec![1, 2, 3, 4]);
    }

    #[test]
    fn all_neighbours_without_classification_are_areas() {
        let graph = strip();
        let middle = graph.face_by_id(2).unwrap();
        let all = graph.all_neighbours(middle);
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|e| e.as_face().is_some()));
    }
}
