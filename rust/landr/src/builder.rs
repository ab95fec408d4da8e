// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incremental construction of the polygon graph.
//!
//! Each inserted polygon is compared against every face already in the graph.
//! Where the two exterior rings run together, one shared edge is created and
//! the existing face's boundary is re-split around it. Whatever part of the
//! new ring is left over becomes the new face's outer edges. The graph is
//! consistent after every insertion, not only at the end.

use geo::{Geometry, LineString, Polygon};
use smallvec::SmallVec;

use crate::attributes::Attributes;
use crate::config::LandrConfig;
use crate::dataset::{FeatureLayer, LayerType};
use crate::edge::{DirectedArc, Edge, Node};
use crate::entity::LandrEntity;
use crate::error::{Error, Result};
use crate::face::Face;
use crate::graph::PolygonGraph;
use crate::kernel::predicates::shares_boundary_line;
use crate::kernel::{
    describe_line, difference, overlaps_linearly, remove_repeated_points, shared_lines,
    validity_error_polygon, CoordKey,
};
use crate::keys::{EdgeKey, FaceKey, NodeKey};

impl PolygonGraph {
    /// Builds a graph from a polygon layer, reading face identifiers from the
    /// integer attribute `id_field`.
    pub fn from_layer(layer: &FeatureLayer, id_field: &str) -> Result<Self> {
        if layer.layer_type() != LayerType::Polygon {
            return Err(Error::NotPolygonLayer(layer.name().to_string()));
        }
        layer.ensure_parsed()?;

        let mut graph = Self::new();
        for feature in layer.features() {
            let id = feature
                .attributes
                .get(id_field)
                .and_then(|v| v.as_int())
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| Error::MissingIdField {
                    fid: feature.fid,
                    field: id_field.to_string(),
                })?;
            let Geometry::Polygon(polygon) = &feature.geometry else {
                return Err(Error::GeometryTypeMismatch { fid: feature.fid });
            };
            graph.insert_polygon(polygon.clone(), id, feature.attributes.clone())?;
        }
        graph.remove_unused_nodes();

        tracing::debug!(
            layer = layer.name(),
            faces = graph.face_count(),
            edges = graph.edge_count(),
            nodes = graph.node_count(),
            "built polygon graph"
        );
        Ok(graph)
    }

    /// [`from_layer`](Self::from_layer) with the identifier field taken from
    /// the configuration.
    pub fn from_layer_with_config(layer: &FeatureLayer, config: &LandrConfig) -> Result<Self> {
        Self::from_layer(layer, &config.id_field)
    }

    /// Builds a graph from bare polygons, numbering faces from 0 in order.
    pub fn from_polygons<I>(polygons: I) -> Result<Self>
    where
        I: IntoIterator<Item = Polygon<f64>>,
    {
        let mut graph = Self::new();
        for (id, polygon) in (0u32..).zip(polygons) {
            graph.insert_polygon(polygon, id, Attributes::default())?;
        }
        graph.remove_unused_nodes();
        Ok(graph)
    }

    /// Builds an independent copy of this graph by re-inserting every face in
    /// its original order.
    pub fn rebuild(&self) -> Result<Self> {
        let mut graph = Self::new();
        for face in self.faces() {
            graph.insert_polygon(face.polygon.clone(), face.id(), face.attributes.clone())?;
        }
        graph.remove_unused_nodes();
        Ok(graph)
    }

    /// Inserts one polygon as a new face with identifier `id`.
    ///
    /// An invalid polygon is still inserted, with a warning; check
    /// [`is_face_complete`](Self::is_face_complete) before relying on its
    /// edges. Every split the insertion needs is checked before the graph is
    /// touched, so when an error is returned the graph is as it was.
    pub fn add_polygon(
        &mut self,
        polygon: Polygon<f64>,
        id: u32,
        attributes: Attributes,
    ) -> Result<FaceKey> {
        let face = self.insert_polygon(polygon, id, attributes)?;
        self.remove_unused_nodes();
        Ok(face)
    }

    fn insert_polygon(
        &mut self,
        polygon: Polygon<f64>,
        id: u32,
        attributes: Attributes,
    ) -> Result<FaceKey> {
        if self.by_id.contains_key(&id) {
            return Err(Error::DuplicateFaceId(id));
        }
        let valid = match validity_error_polygon(&polygon) {
            Some(reason) => {
                tracing::warn!(face = id, %reason, "inserting invalid polygon");
                false
            }
            None => true,
        };

        let plan = self.plan_insertion(&polygon, id)?;
        let face = self
            .faces
            .insert_with_key(|key| Face::new(key, id, polygon, attributes, valid));

        let mut shared = 0;
        for (other, segments) in plan.shared {
            for segment in segments {
                let edge = self.create_edge(&segment)?;
                self.attach_edge(face, edge)?;
                // The new edge is not on `other` yet, so it cannot be split.
                self.remove_segment(other, id, &segment)?;
                self.attach_edge(other, edge)?;
                shared += 1;
            }
        }
        for rest in &plan.outer {
            let edge = self.create_edge(rest)?;
            self.attach_edge(face, edge)?;
        }

        self.order.push(face);
        self.by_id.insert(id, face);
        tracing::debug!(
            face = id,
            shared,
            edges = self.faces[face].edges.len(),
            "inserted polygon"
        );
        Ok(face)
    }

    /// Works out the shared segments and outer edges of a polygon about to
    /// be inserted as face `id`, replaying every split of an existing face
    /// on copies of its edge lines.
    fn plan_insertion(&self, polygon: &Polygon<f64>, id: u32) -> Result<InsertionPlan> {
        let ring = polygon.exterior();
        let mut shared = Vec::new();
        let mut all_shared: Vec<LineString<f64>> = Vec::new();
        for &other in &self.order {
            let existing = &self.faces[other];
            if !shares_boundary_line(polygon, &existing.polygon) {
                continue;
            }
            let segments = shared_lines(ring, existing.polygon.exterior())?;
            if segments.is_empty() {
                continue;
            }

            let mut lines: Vec<LineString<f64>> = existing
                .edges
                .iter()
                .filter_map(|ek| self.edges.get(*ek))
                .map(|e| e.line.clone())
                .collect();
            for segment in &segments {
                let (hit, mut kept): (Vec<_>, Vec<_>) = lines
                    .into_iter()
                    .partition(|line| overlaps_linearly(segment, line));
                if hit.is_empty() {
                    return Err(Error::EdgeNotFound {
                        face: existing.id,
                        inserting: id,
                        segment: describe_line(segment),
                    });
                }
                for line in &hit {
                    kept.extend(split_off(line, segment, existing.id, id)?);
                }
                kept.push(segment.clone());
                lines = kept;
            }

            all_shared.extend(segments.iter().cloned());
            shared.push((other, segments));
        }

        let outer = split_off_all(ring, &all_shared, id, id)?;
        Ok(InsertionPlan { shared, outer })
    }

    /// Creates an unattached edge along `line`, reusing the nodes at its
    /// endpoints.
    pub(crate) fn create_edge(&mut self, line: &LineString<f64>) -> Result<EdgeKey> {
        let line = remove_repeated_points(line);
        let n = line.0.len();
        if n < 2 {
            return Err(Error::EmptyLine);
        }
        let from = self.node_at(line.0[0]);
        let to = self.node_at(line.0[n - 1]);
        let arcs = [
            DirectedArc {
                from,
                to,
                direction_point: line.0[1],
                forward: true,
            },
            DirectedArc {
                from: to,
                to: from,
                direction_point: line.0[n - 2],
                forward: false,
            },
        ];
        let key = self.edges.insert(Edge {
            line,
            faces: SmallVec::new(),
            arcs,
        });
        self.nodes[from].out_arcs.push((key, 0));
        self.nodes[to].out_arcs.push((key, 1));
        Ok(key)
    }

    fn node_at(&mut self, coord: geo::Coord<f64>) -> NodeKey {
        let nodes = &mut self.nodes;
        *self
            .node_index
            .entry(CoordKey::from(coord))
            .or_insert_with(|| nodes.insert(Node::new(coord)))
    }

    /// Takes `segment` out of the boundary of `face` on behalf of face
    /// `inserting`.
    ///
    /// Every edge of the face running along the segment is detached; what is
    /// left of each is merged and re-attached to `face` as new edges. All
    /// remainders are computed before the first edge is detached.
    pub(crate) fn remove_segment(
        &mut self,
        face: FaceKey,
        inserting: u32,
        segment: &LineString<f64>,
    ) -> Result<()> {
        let f = self.faces.get(face).ok_or(Error::FaceNotFound(face))?;
        let face_id = f.id;
        let mut splits = Vec::new();
        for &old in &f.edges {
            let Some(edge) = self.edges.get(old) else {
                continue;
            };
            if overlaps_linearly(segment, &edge.line) {
                splits.push((old, split_off(&edge.line, segment, face_id, inserting)?));
            }
        }
        if splits.is_empty() {
            return Err(Error::EdgeNotFound {
                face: face_id,
                inserting,
                segment: describe_line(segment),
            });
        }

        for (old, remainder) in splits {
            self.detach_edge(face, old)?;
            for piece in &remainder {
                let edge = self.create_edge(piece)?;
                self.attach_edge(face, edge)?;
            }
            tracing::debug!(face = face_id, remainder = remainder.len(), "split edge");
        }
        Ok(())
    }

    /// Drops nodes no edge ends at. Returns how many were removed.
    pub fn remove_unused_nodes(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|_, node| node.degree() > 0);
        let nodes = &self.nodes;
        self.node_index.retain(|_, key| nodes.contains_key(*key));
        let removed = before - self.nodes.len();
        if removed > 0 {
            tracing::debug!(removed, "pruned unused nodes");
        }
        removed
    }
}

/// What inserting one polygon does to the graph.
struct InsertionPlan {
    /// Existing faces sharing boundary with the new one, with the shared
    /// segments in creation order.
    shared: Vec<(FaceKey, Vec<LineString<f64>>)>,
    /// The new face's boundary left over once shared segments are removed.
    outer: Vec<LineString<f64>>,
}

/// What is left of `line` once `segment` is taken out of it.
fn split_off(
    line: &LineString<f64>,
    segment: &LineString<f64>,
    face: u32,
    inserting: u32,
) -> Result<Vec<LineString<f64>>> {
    let remainder = difference(line, std::slice::from_ref(segment))?;
    linear_remainder(remainder, face, inserting, segment)
}

/// What is left of `ring` once every shared segment is taken out of it.
fn split_off_all(
    ring: &LineString<f64>,
    segments: &[LineString<f64>],
    face: u32,
    inserting: u32,
) -> Result<Vec<LineString<f64>>> {
    let remainder = difference(ring, segments)?;
    linear_remainder(remainder, face, inserting, ring)
}

/// Rejects a difference that is not linework. An empty remainder is fine:
/// the line was covered entirely.
fn linear_remainder(
    remainder: Option<Vec<LineString<f64>>>,
    face: u32,
    inserting: u32,
    removed: &LineString<f64>,
) -> Result<Vec<LineString<f64>>> {
    remainder.ok_or_else(|| Error::NonLinearDifference {
        face,
        inserting,
        segment: describe_line(removed),
    })
}
