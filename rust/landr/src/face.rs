// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Faces and the face/edge bookkeeping of a [`PolygonGraph`].
//!
//! A [`Face`] owns its input polygon and attribute row, and references its
//! boundary edges by key. The neighbour index (neighbour face → shared edges)
//! is derived from those edges. It is computed lazily on the first query and
//! dropped by every edge attach/detach, so it never goes stale.
//!
//! ## Single writer
//!
//! The index lives in a `std::cell::OnceCell`, which makes `Face` (and so the
//! graph) `!Sync`: queries through `&PolygonGraph` may fill the cache, but a
//! graph can never be shared across threads. Mutation requires `&mut`.

use std::cell::OnceCell;

use geo::{Geometry, LineString, Polygon};
use slotmap::SlotMap;

use crate::attributes::Attributes;
use crate::edge::Edge;
use crate::entity::{EntityGeometry, LandrEntity};
use crate::error::{Error, Result};
use crate::graph::PolygonGraph;
use crate::kernel::predicates::equals_topo;
use crate::kernel::{merge_lines, overlaps_linearly};
use crate::keys::{EdgeKey, FaceKey, LineKey};

/// Neighbour faces of a face with the edges shared with each, in the order
/// the neighbours are first met along the face's edge list.
#[derive(Debug, Clone, Default)]
pub struct NeighbourMap {
    entries: Vec<(FaceKey, Vec<EdgeKey>)>,
}

impl NeighbourMap {
    pub(crate) fn compute(face: FaceKey, boundary: &[EdgeKey], edges: &SlotMap<EdgeKey, Edge>) -> Self {
        let mut map = Self::default();
        for &ek in boundary {
            let Some(other) = edges.get(ek).and_then(|e| e.other_face(face)) else {
                continue;
            };
            match map.entries.iter_mut().find(|(f, _)| *f == other) {
                Some((_, shared)) => shared.push(ek),
                None => map.entries.push((other, vec![ek])),
            }
        }
        map
    }

    /// Edges shared with `neighbour`, if it is a neighbour.
    pub fn get(&self, neighbour: FaceKey) -> Option<&[EdgeKey]> {
        self.entries
            .iter()
            .find(|(f, _)| *f == neighbour)
            .map(|(_, edges)| edges.as_slice())
    }

    pub fn contains(&self, neighbour: FaceKey) -> bool {
        self.get(neighbour).is_some()
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.entries.iter().map(|(f, _)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FaceKey, &[EdgeKey])> + '_ {
        self.entries.iter().map(|(f, e)| (*f, e.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn remove(&mut self, neighbour: FaceKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(f, _)| *f != neighbour);
        before != self.entries.len()
    }
}

/// A polygon unit of the landscape graph.
#[derive(Debug)]
pub struct Face {
    pub(crate) key: FaceKey,
    pub(crate) id: u32,
    pub(crate) polygon: Polygon<f64>,
    pub(crate) attributes: Attributes,
    pub(crate) edges: Vec<EdgeKey>,
    pub(crate) valid: bool,
    pub(crate) neighbours: OnceCell<NeighbourMap>,
    /// Line neighbours recorded by the last classification, with the
    /// boundary edge they were matched against (if any).
    pub(crate) line_neighbours: Option<Vec<(LineKey, Option<EdgeKey>)>>,
}

impl Face {
    pub(crate) fn new(
        key: FaceKey,
        id: u32,
        polygon: Polygon<f64>,
        attributes: Attributes,
        valid: bool,
    ) -> Self {
        Self {
            key,
            id,
            polygon,
            attributes,
            edges: Vec::new(),
            valid,
            neighbours: OnceCell::new(),
            line_neighbours: None,
        }
    }

    pub fn key(&self) -> FaceKey {
        self.key
    }

    /// The input polygon.
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Boundary edges, in attachment order.
    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    /// `false` if the polygon failed validity checking on insertion.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Line neighbours from the last line classification, or `None` if the
    /// face has not been classified since its edges last changed.
    pub fn line_neighbours(&self) -> Option<&[(LineKey, Option<EdgeKey>)]> {
        self.line_neighbours.as_deref()
    }

    fn invalidate(&mut self) {
        self.neighbours = OnceCell::new();
        self.line_neighbours = None;
    }
}

impl LandrEntity for Face {
    fn id(&self) -> u32 {
        self.id
    }

    fn geometry(&self) -> EntityGeometry<'_> {
        EntityGeometry::Area(&self.polygon)
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl PolygonGraph {
    /// Adds `edge` to the boundary of `face`.
    ///
    /// Records the face on the edge and drops the face's neighbour index.
    pub fn attach_edge(&mut self, face: FaceKey, edge: EdgeKey) -> Result<()> {
        if !self.faces.contains_key(face) {
            return Err(Error::FaceNotFound(face));
        }
        let e = self.edges.get_mut(edge).ok_or(Error::EdgeKeyNotFound(edge))?;
        if !e.faces.contains(&face) {
            e.faces.push(face);
        }
        let f = &mut self.faces[face];
        f.edges.push(edge);
        f.invalidate();
        Ok(())
    }

    /// Removes `edge` from the boundary of `face`.
    ///
    /// The edge is deleted from the graph once no face references it any
    /// more. Fails with [`Error::EdgeNotOnFace`] if the edge is not on the
    /// face's boundary.
    pub fn detach_edge(&mut self, face: FaceKey, edge: EdgeKey) -> Result<()> {
        let f = self.faces.get_mut(face).ok_or(Error::FaceNotFound(face))?;
        let pos = f
            .edges
            .iter()
            .position(|e| *e == edge)
            .ok_or(Error::EdgeNotOnFace(f.id))?;
        f.edges.remove(pos);
        f.invalidate();

        let orphaned = match self.edges.get_mut(edge) {
            Some(e) => {
                e.faces.retain(|k| *k != face);
                e.faces.is_empty()
            }
            None => false,
        };
        if orphaned {
            self.remove_edge(edge);
        }
        Ok(())
    }

    /// Returns `true` if the face's current edges, merged into maximal lines,
    /// reproduce its exterior ring.
    pub fn is_face_complete(&self, face: FaceKey) -> bool {
        let Some(f) = self.faces.get(face) else {
            return false;
        };
        let lines: Vec<LineString<f64>> = f
            .edges
            .iter()
            .filter_map(|ek| self.edges.get(*ek))
            .map(|e| e.line.clone())
            .collect();
        let merged = match merge_lines(lines) {
            Ok(merged) => merged,
            Err(err) => {
                tracing::warn!(face = f.id, %err, "could not merge boundary edges");
                return false;
            }
        };
        match merged.as_slice() {
            [line] => equals_topo(
                &Geometry::LineString(line.clone()),
                &Geometry::LineString(f.polygon.exterior().clone()),
            ),
            _ => false,
        }
    }

    /// First boundary edge of `face` (in edge-list order) sharing a piece of
    /// line with `segment`.
    pub fn find_edge_line_intersecting_with(
        &self,
        face: FaceKey,
        segment: &LineString<f64>,
    ) -> Option<EdgeKey> {
        let f = self.faces.get(face)?;
        f.edges.iter().copied().find(|ek| {
            self.edges
                .get(*ek)
                .is_some_and(|e| overlaps_linearly(segment, &e.line))
        })
    }

    /// The neighbour of `face` across `edge`, according to the neighbour index.
    pub fn neighbour_with_common_edge(&self, face: FaceKey, edge: EdgeKey) -> Option<FaceKey> {
        self.neighbours(face)?
            .iter()
            .find(|(_, shared)| shared.contains(&edge))
            .map(|(neighbour, _)| neighbour)
    }

    /// Joins the lines of two edges that meet end to end.
    ///
    /// The result starts with `edge` unless `other` must come first to keep
    /// the shared endpoint in the middle.
    pub fn merge_edges(&self, edge: EdgeKey, other: EdgeKey) -> Result<LineString<f64>> {
        let a = self.edges.get(edge).ok_or(Error::EdgeKeyNotFound(edge))?;
        let b = self.edges.get(other).ok_or(Error::EdgeKeyNotFound(other))?;
        if !a.shares_endpoint_with(b) {
            return Err(Error::EdgesNotCoincident);
        }

        let a_coords = &a.line.0;
        let b_coords = &b.line.0;
        let reversed = |c: &Vec<_>| c.iter().rev().copied().collect::<Vec<_>>();

        let coords = if a.end_coord() == b.start_coord() {
            join(a_coords.clone(), b_coords.clone())
        } else if a.start_coord() == b.end_coord() {
            join(b_coords.clone(), a_coords.clone())
        } else if a.end_coord() == b.end_coord() {
            join(a_coords.clone(), reversed(b_coords))
        } else {
            join(reversed(b_coords), a_coords.clone())
        };
        Ok(LineString::new(coords))
    }
}

fn join<T>(mut head: Vec<T>, tail: Vec<T>) -> Vec<T> {
    head.extend(tail.into_iter().skip(1));
    head
}
