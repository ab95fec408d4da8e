// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buffers around linework, computed by GEOS with round caps and joins.

use geo::LineString;
use geos::Geom;

use super::convert::{line_to_geos, lines_to_geos};
use crate::error::Result;

/// Default arc resolution, matching the usual GIS default.
pub const DEFAULT_QUADRANT_SEGMENTS: usize = 8;

/// Polygonal region within a distance of some linework.
///
/// A non-positive distance yields an empty buffer, which holds, meets and
/// clips nothing.
#[derive(Clone)]
pub struct Buffer {
    region: Option<geos::Geometry>,
}

impl Buffer {
    /// Buffers `lines` by `distance`, approximating arcs with
    /// `quadrant_segments` segments per quarter circle.
    pub fn around_lines<'a>(
        lines: impl IntoIterator<Item = &'a LineString<f64>>,
        distance: f64,
        quadrant_segments: usize,
    ) -> Result<Self> {
        let lines: Vec<&LineString<f64>> = lines.into_iter().collect();
        if distance <= 0.0 || distance.is_nan() || lines.is_empty() {
            return Ok(Self { region: None });
        }
        let quadrant_segments = i32::try_from(quadrant_segments.max(1)).unwrap_or(i32::MAX);
        let region = lines_to_geos(lines)?.buffer(distance, quadrant_segments)?;
        Ok(Self {
            region: Some(region),
        })
    }

    /// Buffers a single line.
    pub fn around_line(
        line: &LineString<f64>,
        distance: f64,
        quadrant_segments: usize,
    ) -> Result<Self> {
        Self::around_lines(std::iter::once(line), distance, quadrant_segments)
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_none()
    }

    /// Area of the buffered region.
    pub fn area(&self) -> Result<f64> {
        match &self.region {
            Some(region) => Ok(region.area()?),
            None => Ok(0.0),
        }
    }

    /// Length of the part of `line` inside the buffer.
    pub fn clipped_length(&self, line: &LineString<f64>) -> Result<f64> {
        let Some(region) = &self.region else {
            return Ok(0.0);
        };
        Ok(region.intersection(&line_to_geos(line)?)?.length()?)
    }

    /// Returns `true` if `line` lies entirely within the buffer.
    pub fn contains_line(&self, line: &LineString<f64>) -> Result<bool> {
        match &self.region {
            Some(region) => Ok(region.covers(&line_to_geos(line)?)?),
            None => Ok(false),
        }
    }

    /// Returns `true` if `line` touches or crosses the buffer.
    pub fn intersects_line(&self, line: &LineString<f64>) -> Result<bool> {
        match &self.region {
            Some(region) => Ok(region.intersects(&line_to_geos(line)?)?),
            None => Ok(false),
        }
    }
}
