// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Simple-feature validity with human-readable reasons, as GEOS reports it.

use geo::{Geometry, LineString, Polygon};
use geos::Geom;

use super::convert::to_geos;

/// Returns why `geometry` is invalid, or `None` if it is valid.
///
/// Polygonal and linear geometries are checked; other kinds are accepted.
/// A geometry GEOS refuses to build at all (an unclosed ring, a line with a
/// single point) is invalid, with the refusal as the reason.
pub fn validity_error(geometry: &Geometry<f64>) -> Option<String> {
    match geometry {
        Geometry::Polygon(_)
        | Geometry::MultiPolygon(_)
        | Geometry::LineString(_)
        | Geometry::MultiLineString(_) => {}
        _ => return None,
    }
    let geometry = match to_geos(geometry) {
        Ok(g) => g,
        Err(err) => return Some(err.to_string()),
    };
    if geometry.is_valid() {
        return None;
    }
    Some(
        geometry
            .is_valid_reason()
            .unwrap_or_else(|err| format!("Invalid geometry ({err})")),
    )
}

pub fn validity_error_polygon(polygon: &Polygon<f64>) -> Option<String> {
    validity_error(&Geometry::Polygon(polygon.clone()))
}

pub fn validity_error_line(line: &LineString<f64>) -> Option<String> {
    validity_error(&Geometry::LineString(line.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon, Coord};

    #[test]
    fn square_is_valid() {
        let p = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        assert!(validity_error_polygon(&p).is_none());
    }

    #[test]
    fn bow_tie_is_invalid() {
        let p = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)];
        let reason = validity_error_polygon(&p).unwrap();
        assert!(reason.contains("Self-intersection"));
    }

    #[test]
    fn flat_ring_is_invalid() {
        let p = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        assert!(validity_error_polygon(&p).is_some());
    }

    #[test]
    fn hole_outside_its_shell_is_invalid() {
        let p = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 10.0, y: 10.0), (x: 11.0, y: 10.0), (x: 11.0, y: 11.0), (x: 10.0, y: 11.0)]],
        );
        let reason = validity_error_polygon(&p).unwrap();
        assert!(reason.contains("Hole lies outside shell"));

        let inside = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 2.0)]],
        );
        assert!(validity_error_polygon(&inside).is_none());
    }

    #[test]
    fn repeated_points_are_tolerated() {
        let p = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        assert!(validity_error_polygon(&p).is_none());
    }

    #[test]
    fn non_finite_coordinates_are_invalid() {
        let mut line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        line.0.push(Coord { x: f64::NAN, y: 1.0 });
        assert!(validity_error_line(&line).is_some());
    }

    #[test]
    fn line_needs_two_distinct_points() {
        assert!(validity_error_line(&line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 0.0)]).is_some());
        assert!(validity_error_line(&line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]).is_none());
    }
}
