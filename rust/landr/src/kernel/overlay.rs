// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line overlay and merging.
//!
//! Shared boundaries, remainders and merged edge chains come from GEOS
//! overlay (`intersection`, `difference`) followed by `line_merge`, which
//! joins fragments through every node where exactly two of them meet.
//!
//! Merged output is sorted lexicographically by start coordinate, then end
//! coordinate, so callers that take "the first" line get the same answer
//! whatever order GEOS produced the fragments in.

use std::cmp::Ordering;

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Geometry, Line, LineString, Relate};
use geos::Geom;
use nalgebra::Vector2;

use super::convert::{from_geos, line_parts, line_to_geos, lineal_parts, lines_to_geos};
use super::remove_repeated_points;
use crate::error::Result;

/// Merges `lines` into maximal lines.
///
/// Consecutive duplicate coordinates are removed first and lines with fewer
/// than two distinct coordinates are dropped. A set of fragments forming a
/// closed loop yields one closed line.
pub fn merge_lines<I>(lines: I) -> Result<Vec<LineString<f64>>>
where
    I: IntoIterator<Item = LineString<f64>>,
{
    let lines: Vec<LineString<f64>> = lines
        .into_iter()
        .map(|line| remove_repeated_points(&line))
        .filter(|line| line.0.len() >= 2)
        .collect();
    if lines.is_empty() {
        return Ok(Vec::new());
    }
    let merged = lines_to_geos(&lines)?.line_merge()?;
    let mut merged: Vec<LineString<f64>> = line_parts(from_geos(&merged)?)
        .into_iter()
        .map(|line| remove_repeated_points(&line))
        .filter(|line| line.0.len() >= 2)
        .collect();
    merged.sort_by(compare_lines);
    Ok(merged)
}

/// Returns the maximal lines along which `a` and `b` coincide.
///
/// Point contacts are ignored: only overlaps with positive length count.
pub fn shared_lines(a: &LineString<f64>, b: &LineString<f64>) -> Result<Vec<LineString<f64>>> {
    let common = line_to_geos(a)?.intersection(&line_to_geos(b)?)?;
    merge_lines(line_parts(from_geos(&common)?))
}

/// Returns `true` if `a` and `b` share a piece of line with positive length.
pub fn overlaps_linearly(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    Geometry::LineString(a.clone())
        .relate(&Geometry::LineString(b.clone()))
        .matches("1********")
        .unwrap_or(false)
}

/// Removes from `subject` every portion that coincides with one of `cutters`
/// and merges what is left into maximal lines.
///
/// `Ok(Some(vec![]))` means the subject is entirely covered by the cutters.
/// `Ok(None)` means the difference has a part that is not a line.
pub fn difference(
    subject: &LineString<f64>,
    cutters: &[LineString<f64>],
) -> Result<Option<Vec<LineString<f64>>>> {
    let subject = line_to_geos(subject)?;
    let rest = if cutters.is_empty() {
        subject
    } else {
        subject.difference(&lines_to_geos(cutters)?)?
    };
    match lineal_parts(from_geos(&rest)?) {
        Some(parts) => Ok(Some(merge_lines(parts)?)),
        None => Ok(None),
    }
}

/// Parameter of `c` projected onto `segment` (0 at start, 1 at end).
fn param(segment: &Line<f64>, c: Coord<f64>) -> f64 {
    let d = Vector2::new(segment.dx(), segment.dy());
    let len2 = d.norm_squared();
    if len2 == 0.0 {
        return 0.0;
    }
    Vector2::new(c.x - segment.start.x, c.y - segment.start.y).dot(&d) / len2
}

/// Returns the part of `line` from its start up to its first contact with
/// `other`, or `None` if the two never meet.
pub fn prefix_until_intersection(
    line: &LineString<f64>,
    other: &LineString<f64>,
) -> Option<LineString<f64>> {
    let mut prefix = Vec::new();
    for segment in line.lines() {
        prefix.push(segment.start);
        let first_hit = other
            .lines()
            .filter_map(|o| match line_intersection(segment, o)? {
                LineIntersection::SinglePoint { intersection, .. } => Some(intersection),
                LineIntersection::Collinear { intersection } => {
                    if param(&segment, intersection.start) <= param(&segment, intersection.end) {
                        Some(intersection.start)
                    } else {
                        Some(intersection.end)
                    }
                }
            })
            .min_by(|a, b| param(&segment, *a).total_cmp(&param(&segment, *b)));
        if let Some(hit) = first_hit {
            prefix.push(hit);
            return Some(LineString::new(prefix));
        }
    }
    None
}

fn compare_coords(a: &Coord<f64>, b: &Coord<f64>) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

fn compare_lines(a: &LineString<f64>, b: &LineString<f64>) -> Ordering {
    let (a0, b0) = (a.0[0], b.0[0]);
    let (a1, b1) = (a.0[a.0.len() - 1], b.0[b.0.len() - 1]);
    compare_coords(&a0, &b0).then(compare_coords(&a1, &b1))
}
