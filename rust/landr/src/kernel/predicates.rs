// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial predicates used while building and querying the graph.
//!
//! Dimension-dependent tests are DE-9IM patterns evaluated with
//! `geo::Relate`, which needs no conversion. Distances come from GEOS.

use geo::{BoundingRect, Coord, Geometry, Intersects, Point, Polygon, Relate};
use geos::Geom;

use super::convert::to_geos;
use crate::error::Result;

/// Matches a 9-character DE-9IM pattern against the relation of `a` and `b`.
///
/// A malformed pattern never matches.
pub fn relate_pattern(a: &Geometry<f64>, b: &Geometry<f64>, pattern: &str) -> bool {
    a.relate(b).matches(pattern).unwrap_or(false)
}

/// Boundaries meet along a line and interiors are disjoint: the cheap test
/// for "these two polygons are neighbours".
pub fn shares_boundary_line(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    if !bounds_touch(a, b) {
        return false;
    }
    a.relate(b).matches("FFTF1****").unwrap_or(false)
}

fn bounds_touch(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(ra), Some(rb)) => {
            ra.min().x <= rb.max().x
                && rb.min().x <= ra.max().x
                && ra.min().y <= rb.max().y
                && rb.min().y <= ra.max().y
        }
        _ => false,
    }
}

/// Topological equality.
pub fn equals_topo(a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
    relate_pattern(a, b, "T*F**FFF*")
}

/// `polygon` covers `point` (interior or boundary).
pub fn covers_point(polygon: &Polygon<f64>, point: Coord<f64>) -> bool {
    polygon.intersects(&Point::from(point))
}

/// Minimum Euclidean distance between two geometries.
pub fn distance(a: &Geometry<f64>, b: &Geometry<f64>) -> Result<f64> {
    Ok(to_geos(a)?.distance(&to_geos(b)?)?)
}
