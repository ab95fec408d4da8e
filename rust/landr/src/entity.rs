// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capabilities shared by area and line entities.
//!
//! Faces of a [`PolygonGraph`](crate::PolygonGraph) and lines of a
//! [`LineStringGraph`](crate::LineStringGraph) both implement
//! [`LandrEntity`]. Code that must tell them apart matches on
//! [`EntityGeometry`] or on an [`EntityRef`](crate::EntityRef) instead of
//! inspecting concrete types.

use geo::{Coord, LineString, Polygon};

use crate::attributes::{AttrValue, Attributes};
use crate::kernel::line_length;

/// Borrowed geometry of an entity.
#[derive(Debug, Clone, Copy)]
pub enum EntityGeometry<'a> {
    Area(&'a Polygon<f64>),
    Line(&'a LineString<f64>),
}

impl EntityGeometry<'_> {
    /// Boundary linework: the rings of an area, or the line itself.
    pub fn boundary(&self) -> Vec<LineString<f64>> {
        match self {
            EntityGeometry::Area(p) => std::iter::once(p.exterior().clone())
                .chain(p.interiors().iter().cloned())
                .collect(),
            EntityGeometry::Line(l) => vec![(*l).clone()],
        }
    }
}

/// The capability set of a landscape entity.
pub trait LandrEntity {
    /// Stable identifier.
    fn id(&self) -> u32;

    fn geometry(&self) -> EntityGeometry<'_>;

    fn attributes(&self) -> &Attributes;

    fn attributes_mut(&mut self) -> &mut Attributes;

    /// Area for area entities, 0 for lines.
    fn area(&self) -> f64 {
        use geo::Area;
        match self.geometry() {
            EntityGeometry::Area(p) => p.unsigned_area(),
            EntityGeometry::Line(_) => 0.0,
        }
    }

    /// Perimeter of the exterior ring, or length of a line.
    fn length(&self) -> f64 {
        match self.geometry() {
            EntityGeometry::Area(p) => line_length(p.exterior()),
            EntityGeometry::Line(l) => line_length(l),
        }
    }

    fn centroid(&self) -> Option<Coord<f64>> {
        use geo::Centroid;
        match self.geometry() {
            EntityGeometry::Area(p) => p.centroid().map(|c| c.0),
            EntityGeometry::Line(l) => l.centroid().map(|c| c.0),
        }
    }

    /// Returns the attribute value, or `None` if it was never declared.
    fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes().get(name)
    }

    /// Sets a declared attribute. Returns `false` (and changes nothing) if the
    /// attribute was never declared on this entity.
    fn set_attribute(&mut self, name: &str, value: AttrValue) -> bool {
        match self.attributes_mut().get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
