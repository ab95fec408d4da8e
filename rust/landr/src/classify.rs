// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relationships between polygon faces and line networks.
//!
//! Lines are classified against a buffered copy of each face boundary
//! ([`Relationship`]). The same thresholds are used by the barrier variant,
//! which severs area adjacency where a line runs along a shared edge, and by
//! the flow query, which follows a directional line out of a face.

use geo::{BoundingRect, Geometry, LineString, Point, Rect};
use rustc_hash::FxHashMap;

use crate::config::LandrConfig;
use crate::dataset::{FeatureLayer, LayerType};
use crate::entity::LandrEntity;
use crate::error::{Error, Result};
use crate::graph::PolygonGraph;
use crate::kernel::buffer::DEFAULT_QUADRANT_SEGMENTS;
use crate::kernel::predicates::{covers_point, distance};
use crate::kernel::{line_length, prefix_until_intersection, Buffer};
use crate::keys::{EdgeKey, EntityRef, FaceKey, LineKey};
use crate::line_graph::LineStringGraph;

/// How a line must relate to a face boundary to count as a neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// The line lies wholly within the buffered boundary.
    Contains,
    /// The line meets the buffered boundary anywhere.
    Intersects,
    /// The line runs inside a buffered boundary edge for more than the
    /// contact length.
    Touches,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Contains => "CONTAINS",
            Relationship::Intersects => "INTERSECTS",
            Relationship::Touches => "TOUCHES",
        }
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downstream partner of a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowPartner {
    pub entity: EntityRef,
    /// Length of the flow path from the face to the partner.
    pub length: f64,
}

/// Buffer and threshold settings for line classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    pub buffer_distance: f64,
    pub contact_length: f64,
    pub quadrant_segments: usize,
    pub flow_end_tolerance: f64,
}

impl Classifier {
    pub fn new(buffer_distance: f64, contact_length: f64) -> Self {
        Self {
            buffer_distance,
            contact_length,
            quadrant_segments: DEFAULT_QUADRANT_SEGMENTS,
            flow_end_tolerance: LandrConfig::default().flow_end_tolerance,
        }
    }

    pub fn from_config(config: &LandrConfig) -> Self {
        Self {
            buffer_distance: config.buffer_distance,
            contact_length: config.contact_length,
            quadrant_segments: config.buffer_quadrant_segments,
            flow_end_tolerance: config.flow_end_tolerance,
        }
    }

    fn check(&self, relationship: Relationship) -> Result<()> {
        if relationship == Relationship::Touches
            && (self.contact_length <= 0.0 || self.contact_length.is_nan())
        {
            return Err(Error::ZeroContactLength);
        }
        Ok(())
    }

    fn buffer<'a>(&self, lines: impl IntoIterator<Item = &'a LineString<f64>>) -> Result<Buffer> {
        Buffer::around_lines(lines, self.buffer_distance, self.quadrant_segments)
    }

    /// Records, on every face, the lines of `lines` standing in
    /// `relationship` to its boundary.
    ///
    /// Replaces the result of any earlier classification. For `Contains` and
    /// `Touches` each entry names the boundary edge the line was matched
    /// against; a `Contains` line that no single edge buffer holds is
    /// recorded without an edge.
    pub fn compute_line_neighbours(
        &self,
        graph: &mut PolygonGraph,
        lines: &LineStringGraph,
        relationship: Relationship,
    ) -> Result<()> {
        self.check(relationship)?;
        for face in graph.face_keys().to_vec() {
            let found = self.classify_face(graph, face, lines, relationship)?;
            tracing::debug!(
                face = ?face,
                relationship = relationship.as_str(),
                lines = found.len(),
                "classified face"
            );
            if let Some(f) = graph.faces.get_mut(face) {
                f.line_neighbours = Some(found);
            }
        }
        Ok(())
    }

    fn classify_face(
        &self,
        graph: &PolygonGraph,
        face: FaceKey,
        lines: &LineStringGraph,
        relationship: Relationship,
    ) -> Result<Vec<(LineKey, Option<EdgeKey>)>> {
        let mut found = Vec::new();
        let Some(f) = graph.face(face) else {
            return Ok(found);
        };
        let Some(reach) = f.polygon().bounding_rect().map(|r| grow(r, self.buffer_distance)) else {
            return Ok(found);
        };
        let candidates: Vec<(LineKey, &LineString<f64>)> = lines
            .lines()
            .map(|(k, l)| (k, l.line()))
            .filter(|(_, l)| l.bounding_rect().is_some_and(|r| rects_meet(&r, &reach)))
            .collect();
        if candidates.is_empty() {
            return Ok(found);
        }

        let edge_buffers = || -> Result<Vec<(EdgeKey, Buffer)>> {
            let mut buffers = Vec::with_capacity(f.edges().len());
            for ek in f.edges() {
                if let Some(edge) = graph.edge(*ek) {
                    buffers.push((*ek, self.buffer(std::iter::once(edge.line()))?));
                }
            }
            Ok(buffers)
        };
        let rings = f.geometry().boundary();

        match relationship {
            Relationship::Contains => {
                let face_buffer = self.buffer(&rings)?;
                let edges = edge_buffers()?;
                for (lk, line) in candidates {
                    if !face_buffer.contains_line(line)? {
                        continue;
                    }
                    let before = found.len();
                    for (ek, buffer) in &edges {
                        if buffer.contains_line(line)? {
                            found.push((lk, Some(*ek)));
                        }
                    }
                    if found.len() == before {
                        found.push((lk, None));
                    }
                }
            }
            Relationship::Intersects => {
                let face_buffer = self.buffer(&rings)?;
                for (lk, line) in candidates {
                    if face_buffer.intersects_line(line)? {
                        found.push((lk, None));
                    }
                }
            }
            Relationship::Touches => {
                let edges = edge_buffers()?;
                for (lk, line) in candidates {
                    for (ek, buffer) in &edges {
                        if buffer.clipped_length(line)? > self.contact_length {
                            found.push((lk, Some(*ek)));
                        }
                    }
                }
            }
        }
        Ok(found)
    }

    /// Removes area adjacency across every shared edge a barrier line runs
    /// along.
    ///
    /// Only `Contains` and `Touches` are meaningful here. The severed
    /// adjacency lives in the neighbour index, so any later edge change on a
    /// face restores it.
    pub fn compute_neighbours_with_barriers(
        &self,
        graph: &mut PolygonGraph,
        barriers: &LineStringGraph,
        relationship: Relationship,
    ) -> Result<()> {
        if relationship == Relationship::Intersects {
            return Err(Error::RelationshipNotAllowed(relationship.as_str()));
        }
        self.check(relationship)?;

        let mut barred: FxHashMap<EdgeKey, bool> = FxHashMap::default();
        for face in graph.face_keys().to_vec() {
            let Some(map) = graph.neighbours(face) else {
                continue;
            };
            let mut severed: Vec<FaceKey> = Vec::new();
            for (neighbour, shared) in map.iter() {
                for ek in shared {
                    let is_barred = match barred.get(ek) {
                        Some(known) => *known,
                        None => {
                            let known = self.edge_is_barred(graph, *ek, barriers, relationship)?;
                            barred.insert(*ek, known);
                            known
                        }
                    };
                    if is_barred {
                        severed.push(neighbour);
                        break;
                    }
                }
            }
            if severed.is_empty() {
                continue;
            }
            tracing::debug!(face = ?face, severed = severed.len(), "barriers severed adjacency");
            if let Some(map) = graph.faces.get_mut(face).and_then(|f| f.neighbours.get_mut()) {
                for neighbour in severed {
                    map.remove(neighbour);
                }
            }
        }
        Ok(())
    }

    fn edge_is_barred(
        &self,
        graph: &PolygonGraph,
        edge: EdgeKey,
        barriers: &LineStringGraph,
        relationship: Relationship,
    ) -> Result<bool> {
        let Some(e) = graph.edge(edge) else {
            return Ok(false);
        };
        let buffer = self.buffer(std::iter::once(e.line()))?;
        for (_, barrier) in barriers.lines() {
            let hit = match relationship {
                Relationship::Contains => buffer.contains_line(barrier.line())?,
                Relationship::Touches => buffer.clipped_length(barrier.line())? > self.contact_length,
                Relationship::Intersects => false,
            };
            if hit {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Finds where water leaving `face` goes.
    ///
    /// The first line of `flow` that starts inside the face is followed. A
    /// neighbouring face covering its end is the partner, with the full line
    /// length. Otherwise the first line neighbour (from the last
    /// classification) that the flow line reaches is the partner, with the
    /// length up to the contact. `None` means the outflow is undefined.
    pub fn compute_neighbour_by_line_topology(
        &self,
        graph: &PolygonGraph,
        face: FaceKey,
        flow: &FeatureLayer,
        network: &LineStringGraph,
    ) -> Result<Option<FlowPartner>> {
        if flow.layer_type() != LayerType::Line {
            return Err(Error::NotLineLayer(flow.name().to_string()));
        }
        flow.ensure_parsed()?;
        let f = graph.face(face).ok_or(Error::FaceNotFound(face))?;

        let Some(line) = flow
            .lines()
            .map(|(_, l)| l)
            .find(|l| l.0.first().is_some_and(|c| covers_point(f.polygon(), *c)))
        else {
            return Ok(None);
        };
        let Some(&end) = line.0.last() else {
            return Ok(None);
        };

        if let Some(map) = graph.neighbours(face) {
            let downstream = map
                .faces()
                .find(|n| graph.face(*n).is_some_and(|g| covers_point(g.polygon(), end)));
            if let Some(neighbour) = downstream {
                return Ok(Some(FlowPartner {
                    entity: EntityRef::Area(neighbour),
                    length: line_length(line),
                }));
            }
        }

        let end_point = Geometry::Point(Point::from(end));
        for (lk, _) in f.line_neighbours().unwrap_or_default() {
            let Some(target) = network.line(*lk) else {
                continue;
            };
            let length = match prefix_until_intersection(line, target.line()) {
                Some(prefix) => line_length(&prefix),
                None => {
                    let target = Geometry::LineString(target.line().clone());
                    if distance(&end_point, &target)? > self.flow_end_tolerance {
                        continue;
                    }
                    line_length(line)
                }
            };
            return Ok(Some(FlowPartner {
                entity: EntityRef::Line(*lk),
                length,
            }));
        }
        Ok(None)
    }
}

fn grow(rect: Rect<f64>, by: f64) -> Rect<f64> {
    let by = by.max(0.0);
    Rect::new(
        (rect.min().x - by, rect.min().y - by),
        (rect.max().x + by, rect.max().y + by),
    )
}

fn rects_meet(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x && b.min().x <= a.max().x && a.min().y <= b.max().y && b.min().y <= a.max().y
}
