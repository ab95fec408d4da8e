// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Moving geometries between `geo` and GEOS.
//!
//! The graph and the layers hold `geo` types. Operations that GEOS does
//! better (overlay, merging, buffers, validity, snapping) convert on the way
//! in and back on the way out. Coordinates pass through unchanged.

use geo::{Geometry, GeometryCollection, LineString, MultiLineString};
use geos::Geom;

use crate::error::Result;

/// Converts a `geo` geometry to GEOS.
pub fn to_geos(geometry: &Geometry<f64>) -> Result<geos::Geometry> {
    Ok(geos::Geometry::try_from(geometry)?)
}

pub fn line_to_geos(line: &LineString<f64>) -> Result<geos::Geometry> {
    to_geos(&Geometry::LineString(line.clone()))
}

/// Collects `lines` into one GEOS multi line string.
pub fn lines_to_geos<'a>(
    lines: impl IntoIterator<Item = &'a LineString<f64>>,
) -> Result<geos::Geometry> {
    let lines = MultiLineString::new(lines.into_iter().cloned().collect());
    to_geos(&Geometry::MultiLineString(lines))
}

/// Converts a GEOS geometry back to `geo`. Empty geometries of any kind
/// become an empty collection.
pub fn from_geos(geometry: &geos::Geometry) -> Result<Geometry<f64>> {
    if geometry.is_empty()? {
        return Ok(Geometry::GeometryCollection(GeometryCollection(Vec::new())));
    }
    Ok(Geometry::try_from(geometry)?)
}

/// The line strings of a lineal geometry, or `None` if it has a point or an
/// area part. An empty geometry is lineal with no lines.
pub fn lineal_parts(geometry: Geometry<f64>) -> Option<Vec<LineString<f64>>> {
    match geometry {
        Geometry::Line(line) => Some(vec![line.into()]),
        Geometry::LineString(line) => Some(vec![line]),
        Geometry::MultiLineString(lines) => Some(lines.0),
        Geometry::GeometryCollection(parts) => {
            let mut lines = Vec::new();
            for part in parts.0 {
                lines.extend(lineal_parts(part)?);
            }
            Some(lines)
        }
        _ => None,
    }
}

/// The line strings of any geometry, dropping points and areas.
pub fn line_parts(geometry: Geometry<f64>) -> Vec<LineString<f64>> {
    match geometry {
        Geometry::Line(line) => vec![line.into()],
        Geometry::LineString(line) => vec![line],
        Geometry::MultiLineString(lines) => lines.0,
        Geometry::GeometryCollection(parts) => parts.0.into_iter().flat_map(line_parts).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon};

    #[test]
    fn coordinates_survive_the_round_trip() {
        let line = line_string![(x: 0.1, y: 0.2), (x: 1.0 / 3.0, y: 2.0), (x: 5.0, y: -1e-10)];
        let back = from_geos(&line_to_geos(&line).unwrap()).unwrap();
        assert_eq!(back, Geometry::LineString(line));
    }

    #[test]
    fn empty_results_become_empty_collections() {
        let a = line_to_geos(&line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]).unwrap();
        let b = line_to_geos(&line_string![(x: 0.0, y: 5.0), (x: 1.0, y: 5.0)]).unwrap();
        let nothing = from_geos(&a.intersection(&b).unwrap()).unwrap();
        assert_eq!(lineal_parts(nothing), Some(Vec::new()));
    }

    #[test]
    fn points_and_areas_are_not_lineal() {
        assert!(lineal_parts(Geometry::Point(point!(x: 1.0, y: 1.0))).is_none());
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let mixed = Geometry::GeometryCollection(GeometryCollection(vec![
            Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]),
            Geometry::Polygon(square),
        ]));
        assert!(lineal_parts(mixed.clone()).is_none());
        assert_eq!(line_parts(mixed).len(), 1);
    }
}
