// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON snapshots of polygon graphs.
//!
//! A snapshot lists nodes, edges and faces with sequential ids in place of
//! slot map keys. Faces are written in insertion order. Only the face
//! polygons and attributes are read back: loading re-inserts the faces in
//! that order and derives edges and nodes again.

use geo::{Coord, LineString, Polygon};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::error::{Error, Result};
use crate::graph::PolygonGraph;

/// Serializable representation of a polygon graph.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
    pub faces: Vec<FaceSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub id: usize,
    pub start: usize,
    pub end: usize,
    pub coordinates: Vec<[f64; 2]>,
    /// Identifiers of the faces this edge bounds.
    pub faces: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FaceSnapshot {
    pub id: u32,
    #[serde(default)]
    pub attributes: Attributes,
    pub exterior: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interiors: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub edges: Vec<usize>,
}

fn coords(line: &LineString<f64>) -> Vec<[f64; 2]> {
    line.coords().map(|c| [c.x, c.y]).collect()
}

fn line(coords: &[[f64; 2]]) -> LineString<f64> {
    coords.iter().map(|&[x, y]| Coord { x, y }).collect()
}

impl PolygonGraph {
    /// Serializes the graph to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Creates a serializable snapshot of the graph.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let mut node_ids = FxHashMap::default();
        let nodes: Vec<NodeSnapshot> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, (k, n))| {
                node_ids.insert(k, i);
                NodeSnapshot {
                    id: i,
                    x: n.coord.x,
                    y: n.coord.y,
                }
            })
            .collect();

        let mut edge_ids = FxHashMap::default();
        let edges: Vec<EdgeSnapshot> = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, (k, e))| {
                edge_ids.insert(k, i);
                EdgeSnapshot {
                    id: i,
                    start: node_ids.get(&e.start_node()).copied().unwrap_or_default(),
                    end: node_ids.get(&e.end_node()).copied().unwrap_or_default(),
                    coordinates: coords(e.line()),
                    faces: e
                        .faces()
                        .iter()
                        .filter_map(|f| self.faces.get(*f))
                        .map(|f| f.id)
                        .collect(),
                }
            })
            .collect();

        let faces = self
            .faces()
            .map(|f| FaceSnapshot {
                id: f.id,
                attributes: f.attributes.clone(),
                exterior: coords(f.polygon.exterior()),
                interiors: f.polygon.interiors().iter().map(coords).collect(),
                edges: f.edges.iter().filter_map(|e| edge_ids.get(e).copied()).collect(),
            })
            .collect();

        GraphSnapshot {
            nodes,
            edges,
            faces,
        }
    }

    /// Deserializes a graph from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: GraphSnapshot =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::from_snapshot(&snapshot)
    }

    /// Rebuilds a graph from the faces of a snapshot.
    pub fn from_snapshot(snap: &GraphSnapshot) -> Result<Self> {
        let mut graph = Self::new();
        for face in &snap.faces {
            let polygon = Polygon::new(
                line(&face.exterior),
                face.interiors.iter().map(|ring| line(ring)).collect(),
            );
            graph.add_polygon(polygon, face.id, face.attributes.clone())?;
        }
        Ok(graph)
    }
}
