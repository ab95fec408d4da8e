// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory feature layers.
//!
//! A [`FeatureLayer`] is the boundary with whatever reads and writes spatial
//! files: an ordered list of features of a single geometry type, each with a
//! stable `fid` and an attribute row. Layers round-trip through a small
//! GeoJSON-like document:
//!
//! ```json
//! {
//!   "name": "parcels",
//!   "geometry_type": "Polygon",
//!   "features": [
//!     { "fid": 0, "attributes": { "SELF_ID": 1 },
//!       "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] } }
//!   ]
//! }
//! ```
//!
//! `geometry_type` may be omitted when the layer has at least one feature.

use std::cell::Cell;

use geo::{Coord, Geometry, LineString, Point, Polygon};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::attributes::{AttrValue, Attributes};
use crate::error::{Error, Result};
use crate::kernel::validity_error;

/// Geometry type shared by all features of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerType {
    Point,
    #[serde(rename = "LineString")]
    Line,
    Polygon,
}

impl LayerType {
    fn of(geometry: &Geometry<f64>) -> Option<Self> {
        match geometry {
            Geometry::Point(_) => Some(LayerType::Point),
            Geometry::LineString(_) => Some(LayerType::Line),
            Geometry::Polygon(_) => Some(LayerType::Polygon),
            _ => None,
        }
    }
}

/// One feature of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub fid: u64,
    pub attributes: Attributes,
    pub geometry: Geometry<f64>,
}

/// An ordered, single-typed collection of features.
#[derive(Debug, Clone)]
pub struct FeatureLayer {
    name: String,
    layer_type: LayerType,
    features: Vec<Feature>,
    /// `None` once `u64::MAX` has been handed out.
    next_fid: Option<u64>,
    /// Cleared by every geometry write; set again once all geometries have
    /// passed validation.
    validated: Cell<bool>,
}

impl FeatureLayer {
    pub fn new(name: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            name: name.into(),
            layer_type,
            features: Vec::new(),
            next_fid: Some(0),
            validated: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layer_type(&self) -> LayerType {
        self.layer_type
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features in layer order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, fid: u64) -> Option<&Feature> {
        self.features.iter().find(|f| f.fid == fid)
    }

    /// Appends a feature and returns its new fid.
    pub fn push(&mut self, geometry: Geometry<f64>, attributes: Attributes) -> Result<u64> {
        let fid = self
            .next_fid
            .ok_or_else(|| Error::FidsExhausted(self.name.clone()))?;
        self.check_type(fid, &geometry)?;
        self.features.push(Feature {
            fid,
            attributes,
            geometry,
        });
        self.next_fid = fid.checked_add(1);
        self.validated.set(false);
        Ok(fid)
    }

    /// Replaces the geometry of feature `fid`.
    ///
    /// Returns `Ok(false)` if there is no such feature.
    pub fn set_geometry(&mut self, fid: u64, geometry: Geometry<f64>) -> Result<bool> {
        self.check_type(fid, &geometry)?;
        let Some(feature) = self.features.iter_mut().find(|f| f.fid == fid) else {
            return Ok(false);
        };
        feature.geometry = geometry;
        self.validated.set(false);
        Ok(true)
    }

    /// Sets one attribute of feature `fid`. Returns `false` if there is no
    /// such feature.
    pub fn set_attribute(&mut self, fid: u64, name: &str, value: AttrValue) -> bool {
        match self.features.iter_mut().find(|f| f.fid == fid) {
            Some(feature) => {
                feature.attributes.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Writes sequential integers starting at `begin_at` into field `name`,
    /// in layer order.
    pub fn set_index_int_field(&mut self, name: &str, begin_at: i64) {
        for (value, feature) in (begin_at..).zip(self.features.iter_mut()) {
            feature.attributes.insert(name.to_string(), AttrValue::Int(value));
        }
    }

    /// Validates every geometry unless nothing changed since the last
    /// successful validation.
    pub fn ensure_parsed(&self) -> Result<()> {
        if self.validated.get() {
            return Ok(());
        }
        for feature in &self.features {
            if let Some(reason) = validity_error(&feature.geometry) {
                return Err(Error::InvalidGeometry {
                    fid: feature.fid,
                    reason,
                });
            }
        }
        self.validated.set(true);
        Ok(())
    }

    /// `(fid, polygon)` pairs of a polygon layer.
    pub fn polygons(&self) -> impl Iterator<Item = (u64, &Polygon<f64>)> + '_ {
        self.features.iter().filter_map(|f| match &f.geometry {
            Geometry::Polygon(p) => Some((f.fid, p)),
            _ => None,
        })
    }

    /// `(fid, line)` pairs of a line layer.
    pub fn lines(&self) -> impl Iterator<Item = (u64, &LineString<f64>)> + '_ {
        self.features.iter().filter_map(|f| match &f.geometry {
            Geometry::LineString(l) => Some((f.fid, l)),
            _ => None,
        })
    }

    fn check_type(&self, fid: u64, geometry: &Geometry<f64>) -> Result<()> {
        if LayerType::of(geometry) != Some(self.layer_type) {
            return Err(Error::GeometryTypeMismatch { fid });
        }
        Ok(())
    }

    // --- JSON ---

    /// Reads a layer from its JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: LayerDoc =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        let features: Vec<Feature> = doc
            .features
            .into_iter()
            .map(|f| Feature {
                fid: f.fid,
                attributes: f.attributes,
                geometry: f.geometry.into(),
            })
            .collect();

        let layer_type = match doc.geometry_type {
            Some(t) => t,
            None => features
                .first()
                .and_then(|f| LayerType::of(&f.geometry))
                .ok_or_else(|| Error::UnsupportedLayerType(doc.name.clone()))?,
        };

        let mut layer = Self::new(doc.name, layer_type);
        let mut seen = FxHashSet::default();
        for feature in &features {
            if !seen.insert(feature.fid) {
                return Err(Error::DuplicateFid(feature.fid));
            }
            layer.check_type(feature.fid, &feature.geometry)?;
        }
        layer.next_fid = match features.iter().map(|f| f.fid).max() {
            Some(last) => last.checked_add(1),
            None => Some(0),
        };
        layer.features = features;
        Ok(layer)
    }

    /// Writes the layer as a JSON document.
    pub fn to_json(&self) -> Result<String> {
        let doc = LayerDoc {
            name: self.name.clone(),
            geometry_type: Some(self.layer_type),
            features: self
                .features
                .iter()
                .map(|f| FeatureDoc {
                    fid: f.fid,
                    attributes: f.attributes.clone(),
                    geometry: GeometryDoc::from(&f.geometry),
                })
                .collect(),
        };
        serde_json::to_string(&doc).map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[derive(Serialize, Deserialize)]
struct LayerDoc {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    geometry_type: Option<LayerType>,
    features: Vec<FeatureDoc>,
}

#[derive(Serialize, Deserialize)]
struct FeatureDoc {
    fid: u64,
    #[serde(default)]
    attributes: Attributes,
    geometry: GeometryDoc,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeometryDoc {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
}

fn to_line(coords: Vec<[f64; 2]>) -> LineString<f64> {
    coords.into_iter().map(|[x, y]| Coord { x, y }).collect()
}

fn from_line(line: &LineString<f64>) -> Vec<[f64; 2]> {
    line.coords().map(|c| [c.x, c.y]).collect()
}

impl From<GeometryDoc> for Geometry<f64> {
    fn from(doc: GeometryDoc) -> Self {
        match doc {
            GeometryDoc::Point([x, y]) => Geometry::Point(Point::new(x, y)),
            GeometryDoc::LineString(coords) => Geometry::LineString(to_line(coords)),
            GeometryDoc::Polygon(rings) => {
                let mut rings = rings.into_iter().map(to_line);
                let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
                Geometry::Polygon(Polygon::new(exterior, rings.collect()))
            }
        }
    }
}

impl From<&Geometry<f64>> for GeometryDoc {
    fn from(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(p) => GeometryDoc::Point([p.x(), p.y()]),
            Geometry::LineString(l) => GeometryDoc::LineString(from_line(l)),
            Geometry::Polygon(p) => GeometryDoc::Polygon(
                std::iter::once(p.exterior())
                    .chain(p.interiors())
                    .map(from_line)
                    .collect(),
            ),
            // Layers only ever hold the three types above.
            _ => GeometryDoc::LineString(Vec::new()),
        }
    }
}
