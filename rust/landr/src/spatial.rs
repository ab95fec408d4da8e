// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hash for tolerance-based vertex lookup.
//!
//! Used by vertex snapping to find, for a vertex of one feature, the closest
//! vertex of any other feature. Points can be moved after insertion so the
//! index always reflects already-snapped positions.

use geo::Coord;
use rustc_hash::FxHashMap;

use crate::kernel::coord_distance;

/// A grid of square cells of side `cell_size` holding owned points.
///
/// Queries look at the 3x3 cell neighbourhood, so they are exact for any
/// tolerance up to `cell_size`.
#[derive(Debug)]
pub struct SpatialIndex {
    cell_size: f64,
    grid: FxHashMap<(i64, i64), Vec<usize>>,
    /// `(owner, position)` per point id.
    points: Vec<(usize, Coord<f64>)>,
}

impl SpatialIndex {
    /// Creates an empty index. Non-positive sizes fall back to 1.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { 1.0 },
            grid: FxHashMap::default(),
            points: Vec::new(),
        }
    }

    /// Inserts a point belonging to `owner` and returns its id. Ids are
    /// handed out sequentially from 0.
    pub fn insert(&mut self, owner: usize, coord: Coord<f64>) -> usize {
        let id = self.points.len();
        let cell = self.cell_coords(coord);
        self.points.push((owner, coord));
        self.grid.entry(cell).or_default().push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Current position of point `id`.
    pub fn position(&self, id: usize) -> Option<Coord<f64>> {
        self.points.get(id).map(|(_, c)| *c)
    }

    /// Moves point `id` to `coord`.
    pub fn relocate(&mut self, id: usize, coord: Coord<f64>) {
        let Some(&(_, old)) = self.points.get(id) else {
            return;
        };
        let (from, to) = (self.cell_coords(old), self.cell_coords(coord));
        if from != to {
            if let Some(ids) = self.grid.get_mut(&from) {
                ids.retain(|i| *i != id);
            }
            self.grid.entry(to).or_default().push(id);
        }
        self.points[id].1 = coord;
    }

    /// Closest point of another owner closer than `tolerance` to `coord`
    /// that is not already at `coord`. Ties go to the earliest inserted point.
    pub fn nearest_foreign(
        &self,
        coord: Coord<f64>,
        owner: usize,
        tolerance: f64,
    ) -> Option<Coord<f64>> {
        self.near(coord, tolerance)
            .filter(|(o, c, _, _)| *o != owner && *c != coord)
            .min_by(|a, b| a.2.total_cmp(&b.2).then(a.3.cmp(&b.3)))
            .map(|(_, c, _, _)| c)
    }

    /// `(owner, position)` of every point closer than `tolerance` to `coord`.
    pub fn find_all_near(&self, coord: Coord<f64>, tolerance: f64) -> Vec<(usize, Coord<f64>)> {
        self.near(coord, tolerance).map(|(o, c, _, _)| (o, c)).collect()
    }

    fn near(
        &self,
        coord: Coord<f64>,
        tolerance: f64,
    ) -> impl Iterator<Item = (usize, Coord<f64>, f64, usize)> + '_ {
        let (cx, cy) = self.cell_coords(coord);
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(move |cell| self.grid.get(&cell))
            .flatten()
            .filter_map(move |&id| {
                let (owner, c) = self.points[id];
                let d = coord_distance(coord, c);
                (d < tolerance).then_some((owner, c, d, id))
            })
    }

    fn cell_coords(&self, c: Coord<f64>) -> (i64, i64) {
        (
            (c.x / self.cell_size).floor() as i64,
            (c.y / self.cell_size).floor() as i64,
        )
    }
}
