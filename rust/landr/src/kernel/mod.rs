// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar geometry kernel.
//!
//! Geometry types, DE-9IM relate patterns and point/area predicates come
//! from `geo`. Line overlay and merging, buffers, validity reasons and
//! snapping go through GEOS ([`convert`] moves geometries across).
//!
//! Graph nodes are deduplicated by exact coordinate equality, so linework
//! handed to the graph must keep input coordinates. GEOS overlay does: the
//! ends of a collinear overlap are vertices of one of the inputs.

pub mod buffer;
pub mod convert;
pub mod overlay;
pub mod predicates;
pub mod validity;

use geo::{Coord, Line, LineString};
use nalgebra::Vector2;

pub use buffer::Buffer;
pub use overlay::{
    difference, merge_lines, overlaps_linearly, prefix_until_intersection, shared_lines,
};
pub use validity::{validity_error, validity_error_line, validity_error_polygon};

/// Exact-equality hash key for a coordinate.
///
/// `-0.0` and `0.0` map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey(u64, u64);

impl From<Coord<f64>> for CoordKey {
    fn from(c: Coord<f64>) -> Self {
        CoordKey((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits())
    }
}

/// Euclidean length of a line string.
pub fn line_length(line: &LineString<f64>) -> f64 {
    line.lines().map(segment_length).sum()
}

pub(crate) fn segment_length(segment: Line<f64>) -> f64 {
    Vector2::new(segment.dx(), segment.dy()).norm()
}

/// Returns a copy of `line` without consecutive duplicate coordinates.
pub fn remove_repeated_points(line: &LineString<f64>) -> LineString<f64> {
    let mut coords = line.0.clone();
    coords.dedup();
    LineString::new(coords)
}

/// Number of distinct consecutive coordinates of a line.
pub(crate) fn distinct_len(line: &LineString<f64>) -> usize {
    remove_repeated_points(line).0.len()
}

/// Euclidean distance between two coordinates.
pub fn coord_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Vector2::new(b.x - a.x, b.y - a.y).norm()
}

/// Renders a line as WKT for error messages and logs.
pub fn describe_line(line: &LineString<f64>) -> String {
    let coords: Vec<String> = line.coords().map(|c| format!("{} {}", c.x, c.y)).collect();
    format!("LINESTRING({})", coords.join(", "))
}
