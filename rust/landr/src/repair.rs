// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology checks and repairs on raw feature layers.
//!
//! Detection works pairwise over the features of one layer and reports each
//! unordered pair once, as `(earlier fid, later fid)`. Repairs write straight
//! into the layer: a failure part way through leaves the features already
//! rewritten as they are.

use std::fmt;

use geo::{Area, BoundingRect, Coord, Geometry, LineString, Polygon, Rect};
use geos::Geom;

use crate::config::LandrConfig;
use crate::dataset::{FeatureLayer, LayerType};
use crate::error::{Error, Result};
use crate::kernel::convert::{from_geos, to_geos};
use crate::kernel::validity_error;
use crate::spatial::SpatialIndex;

/// Tolerances for the repair passes.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOptions {
    pub snap_tolerance: f64,
    pub gap_threshold: f64,
    /// Upper bound on overlap cleaning iterations.
    pub max_passes: usize,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self::from_config(&LandrConfig::default())
    }
}

impl RepairOptions {
    pub fn from_config(config: &LandrConfig) -> Self {
        Self {
            snap_tolerance: config.snap_tolerance,
            gap_threshold: config.gap_threshold,
            max_passes: 1000,
        }
    }
}

fn require_lines_or_polygons(layer: &FeatureLayer) -> Result<()> {
    match layer.layer_type() {
        LayerType::Polygon | LayerType::Line => Ok(()),
        LayerType::Point => Err(Error::UnsupportedLayerType(layer.name().to_string())),
    }
}

fn bounds_within(a: Option<Rect<f64>>, b: Option<Rect<f64>>, by: f64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            a.min().x - by <= b.max().x
                && b.min().x - by <= a.max().x
                && a.min().y - by <= b.max().y
                && b.min().y - by <= a.max().y
        }
        _ => false,
    }
}

/// A feature converted once for the pairwise GEOS predicates.
struct Candidate {
    fid: u64,
    bounds: Option<Rect<f64>>,
    geometry: geos::Geometry,
}

fn candidates<'a>(
    features: impl IntoIterator<Item = (u64, &'a Geometry<f64>)>,
) -> Result<Vec<Candidate>> {
    features
        .into_iter()
        .map(|(fid, geometry)| {
            Ok(Candidate {
                fid,
                bounds: geometry.bounding_rect(),
                geometry: to_geos(geometry)?,
            })
        })
        .collect()
}

fn overlap_pairs(items: &[Candidate]) -> Result<Vec<(u64, u64)>> {
    let mut pairs = Vec::new();
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            if bounds_within(a.bounds, b.bounds, 0.0) && a.geometry.overlaps(&b.geometry)? {
                pairs.push((a.fid, b.fid));
            }
        }
    }
    Ok(pairs)
}

/// Pairs closer than `threshold` that neither coincide, touch nor overlap.
/// Crossing lines and nested polygons are at distance zero and count.
fn gap_pairs(items: &[Candidate], threshold: f64) -> Result<Vec<(u64, u64)>> {
    let mut pairs = Vec::new();
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            if !bounds_within(a.bounds, b.bounds, threshold) {
                continue;
            }
            let (ga, gb) = (&a.geometry, &b.geometry);
            if !ga.equals(gb)?
                && !ga.touches(gb)?
                && !ga.overlaps(gb)?
                && ga.distance(gb)? < threshold
            {
                pairs.push((a.fid, b.fid));
            }
        }
    }
    Ok(pairs)
}

fn layer_candidates(layer: &FeatureLayer) -> Result<Vec<Candidate>> {
    candidates(layer.features().iter().map(|f| (f.fid, &f.geometry)))
}

/// Pairs of features whose geometries overlap.
pub fn find_overlaps(layer: &FeatureLayer) -> Result<Vec<(u64, u64)>> {
    require_lines_or_polygons(layer)?;
    layer.ensure_parsed()?;
    overlap_pairs(&layer_candidates(layer)?)
}

/// Pairs of features closer than `threshold` that are not equal, touching
/// or overlapping.
pub fn find_gaps(layer: &FeatureLayer, threshold: f64) -> Result<Vec<(u64, u64)>> {
    require_lines_or_polygons(layer)?;
    layer.ensure_parsed()?;
    gap_pairs(&layer_candidates(layer)?, threshold)
}

/// Fids of features whose geometry equals that of an earlier feature.
pub fn find_duplicate_geometries(layer: &FeatureLayer) -> Result<Vec<u64>> {
    require_lines_or_polygons(layer)?;
    layer.ensure_parsed()?;
    let items = layer_candidates(layer)?;
    let mut duplicates = Vec::new();
    for (j, b) in items.iter().enumerate() {
        for a in &items[..j] {
            if a.bounds == b.bounds && a.geometry.equals(&b.geometry)? {
                duplicates.push(b.fid);
                break;
            }
        }
    }
    Ok(duplicates)
}

/// Outcome of [`check_topology`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyReport {
    pub layer: String,
    pub threshold: f64,
    /// `(fid, reason)` of every invalid geometry.
    pub invalid: Vec<(u64, String)>,
    pub overlaps: Vec<(u64, u64)>,
    pub gaps: Vec<(u64, u64)>,
}

impl TopologyReport {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty() && self.overlaps.is_empty() && self.gaps.is_empty()
    }
}

impl fmt::Display for TopologyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Topology report for layer '{}'", self.layer)?;
        writeln!(f, "Invalid geometries: {}", self.invalid.len())?;
        for (fid, reason) in &self.invalid {
            writeln!(f, "  feature {fid}: {reason}")?;
        }
        writeln!(f, "Overlaps: {}", self.overlaps.len())?;
        for (a, b) in &self.overlaps {
            writeln!(f, "  features {a} and {b}")?;
        }
        writeln!(f, "Gaps (closer than {}): {}", self.threshold, self.gaps.len())?;
        for (a, b) in &self.gaps {
            writeln!(f, "  features {a} and {b}")?;
        }
        Ok(())
    }
}

/// Reports invalid geometries, overlaps and gaps closer than `threshold`.
///
/// Unlike the other passes this does not stop at the first invalid
/// geometry: invalid features are listed and left out of the pair checks.
pub fn check_topology(layer: &FeatureLayer, threshold: f64) -> Result<TopologyReport> {
    require_lines_or_polygons(layer)?;
    let mut report = TopologyReport {
        layer: layer.name().to_string(),
        threshold,
        ..Default::default()
    };
    let mut valid = Vec::new();
    for feature in layer.features() {
        match validity_error(&feature.geometry) {
            Some(reason) => {
                tracing::warn!(layer = layer.name(), fid = feature.fid, %reason, "invalid geometry");
                report.invalid.push((feature.fid, reason));
            }
            None => valid.push((feature.fid, &feature.geometry)),
        }
    }
    let valid = candidates(valid)?;
    report.overlaps = overlap_pairs(&valid)?;
    report.gaps = gap_pairs(&valid, threshold)?;
    Ok(report)
}

/// Moves vertices onto a nearby vertex of another feature.
///
/// Polygon layers snap every ring vertex, line layers only line endpoints.
/// A vertex moves when another feature's vertex is closer than `tolerance`
/// but not exactly on it. Features are processed in layer order and later
/// features see earlier ones at their snapped positions. Returns the number
/// of vertices moved.
pub fn snap_vertices(layer: &mut FeatureLayer, tolerance: f64) -> Result<usize> {
    require_lines_or_polygons(layer)?;
    layer.ensure_parsed()?;
    if tolerance <= 0.0 {
        return Ok(0);
    }

    let mut index = SpatialIndex::new(tolerance);
    for (owner, feature) in layer.features().iter().enumerate() {
        for coord in snappable(&feature.geometry) {
            index.insert(owner, coord);
        }
    }

    let mut moved = 0;
    let mut next_id = 0;
    let mut updates = Vec::new();
    for (owner, feature) in layer.features().iter().enumerate() {
        let mut geometry = feature.geometry.clone();
        let mut changed = false;
        for_each_snappable(&mut geometry, |coord| {
            let id = next_id;
            next_id += 1;
            if let Some(target) = index.nearest_foreign(*coord, owner, tolerance) {
                *coord = target;
                index.relocate(id, target);
                moved += 1;
                changed = true;
            }
        });
        if changed {
            updates.push((feature.fid, geometry));
        }
    }

    for (fid, geometry) in updates {
        layer.set_geometry(fid, geometry)?;
    }
    tracing::debug!(layer = layer.name(), moved, "snapped vertices");
    Ok(moved)
}

/// Vertices taking part in snapping, in the order
/// [`for_each_snappable`] visits them.
fn snappable(geometry: &Geometry<f64>) -> Vec<Coord<f64>> {
    let mut coords = Vec::new();
    let mut copy = geometry.clone();
    for_each_snappable(&mut copy, |c| coords.push(*c));
    coords
}

fn for_each_snappable(geometry: &mut Geometry<f64>, mut visit: impl FnMut(&mut Coord<f64>)) {
    match geometry {
        Geometry::Polygon(polygon) => {
            polygon.exterior_mut(|ring| visit_ring(ring, &mut visit));
            polygon.interiors_mut(|holes| {
                for ring in holes {
                    visit_ring(ring, &mut visit);
                }
            });
        }
        Geometry::LineString(line) => {
            let n = line.0.len();
            if n > 0 {
                visit(&mut line.0[0]);
            }
            if n > 1 {
                visit(&mut line.0[n - 1]);
            }
        }
        _ => {}
    }
}

/// Visits every ring vertex once; the closing vertex follows the first.
fn visit_ring(ring: &mut LineString<f64>, visit: &mut impl FnMut(&mut Coord<f64>)) {
    let n = ring.0.len();
    let closed = n > 1 && ring.0[0] == ring.0[n - 1];
    let distinct = if closed { n - 1 } else { n };
    for coord in ring.0.iter_mut().take(distinct) {
        visit(coord);
    }
    if closed {
        ring.0[n - 1] = ring.0[0];
    }
}

/// Removes overlaps between polygons.
///
/// Takes the first overlapping pair `(a, b)`, replaces `a` by `a - b`, snaps
/// `b` onto the new boundary of `a` and repeats until no overlap is left. A
/// final [`snap_vertices`] pass closes near misses. Returns the number of
/// pairs cleaned.
pub fn clean_overlaps(layer: &mut FeatureLayer, options: &RepairOptions) -> Result<usize> {
    if layer.layer_type() != LayerType::Polygon {
        return Err(Error::NotPolygonLayer(layer.name().to_string()));
    }

    let mut cleaned = 0;
    let mut last: Option<(u64, u64)> = None;
    loop {
        let Some(&(a, b)) = find_overlaps(layer)?.first() else {
            break;
        };
        if last == Some((a, b)) || cleaned >= options.max_passes {
            tracing::warn!(layer = layer.name(), a, b, "overlap could not be removed");
            break;
        }
        last = Some((a, b));

        let (Some(pa), Some(pb)) = (polygon_of(layer, a), polygon_of(layer, b)) else {
            break;
        };
        let pb = to_geos(&Geometry::Polygon(pb))?;
        let rest = to_geos(&Geometry::Polygon(pa))?.difference(&pb)?;
        let remainder = largest_part(from_geos(&rest)?).ok_or_else(|| Error::InvalidGeometry {
            fid: a,
            reason: format!("entirely covered by feature {b}"),
        })?;
        let target = to_geos(&Geometry::Polygon(remainder.clone()))?;
        let snapped = pb.snap(&target, options.snap_tolerance)?;
        let snapped = largest_part(from_geos(&snapped)?).ok_or_else(|| Error::InvalidGeometry {
            fid: b,
            reason: format!("collapsed when snapped to feature {a}"),
        })?;

        layer.set_geometry(a, remainder.into())?;
        layer.set_geometry(b, snapped.into())?;
        cleaned += 1;
        tracing::debug!(layer = layer.name(), a, b, "cleaned overlap");
    }

    snap_vertices(layer, options.snap_tolerance)?;
    Ok(cleaned)
}

fn polygon_of(layer: &FeatureLayer, fid: u64) -> Option<Polygon<f64>> {
    match &layer.feature(fid)?.geometry {
        Geometry::Polygon(p) => Some(p.clone()),
        _ => None,
    }
}

/// The largest polygon of an overlay result. Anything that is not a
/// polygon is dropped.
fn largest_part(geometry: Geometry<f64>) -> Option<Polygon<f64>> {
    let parts = match geometry {
        Geometry::Polygon(p) => vec![p],
        Geometry::MultiPolygon(mp) => mp.0,
        Geometry::GeometryCollection(gc) => gc
            .0
            .into_iter()
            .filter_map(|g| match g {
                Geometry::Polygon(p) => Some(p),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    if parts.len() > 1 {
        tracing::warn!(parts = parts.len(), "difference split a polygon, keeping the largest part");
    }
    parts
        .into_iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
}
