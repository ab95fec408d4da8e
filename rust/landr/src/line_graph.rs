// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Graph of linear network features (streams, roads, hedges).
//!
//! Lines are never split or merged. Each line is connected to the nodes at
//! its start and end coordinate, so a network can be walked downstream
//! (along digitizing direction) or upstream.

use std::collections::BTreeMap;

use geo::{Coord, Geometry, LineString};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::attributes::Attributes;
use crate::dataset::{FeatureLayer, LayerType};
use crate::entity::{EntityGeometry, LandrEntity};
use crate::error::{Error, Result};
use crate::kernel::{distinct_len, remove_repeated_points, CoordKey};
use crate::keys::{LineKey, NodeKey};

/// A line feature of the network.
#[derive(Debug, Clone)]
pub struct LineEntity {
    id: u32,
    line: LineString<f64>,
    attributes: Attributes,
    start: NodeKey,
    end: NodeKey,
}

impl LineEntity {
    pub fn line(&self) -> &LineString<f64> {
        &self.line
    }

    pub fn start_node(&self) -> NodeKey {
        self.start
    }

    pub fn end_node(&self) -> NodeKey {
        self.end
    }
}

impl LandrEntity for LineEntity {
    fn id(&self) -> u32 {
        self.id
    }

    fn geometry(&self) -> EntityGeometry<'_> {
        EntityGeometry::Line(&self.line)
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

#[derive(Debug, Clone)]
struct LineNode {
    coord: Coord<f64>,
    /// Lines starting here.
    outgoing: Vec<LineKey>,
    /// Lines ending here.
    incoming: Vec<LineKey>,
}

/// Network of line entities connected at shared endpoints.
#[derive(Debug, Default)]
pub struct LineStringGraph {
    nodes: SlotMap<NodeKey, LineNode>,
    node_index: FxHashMap<CoordKey, NodeKey>,
    lines: SlotMap<LineKey, LineEntity>,
    order: Vec<LineKey>,
    by_id: BTreeMap<u32, LineKey>,
}

impl LineStringGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the network from a line layer, reading identifiers from the
    /// integer attribute `id_field`.
    pub fn from_layer(layer: &FeatureLayer, id_field: &str) -> Result<Self> {
        if layer.layer_type() != LayerType::Line {
            return Err(Error::NotLineLayer(layer.name().to_string()));
        }
        layer.ensure_parsed()?;

        let mut graph = Self::new();
        for feature in layer.features() {
            let id = feature
                .attributes
                .get(id_field)
                .and_then(|v| v.as_int())
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| Error::MissingIdField {
                    fid: feature.fid,
                    field: id_field.to_string(),
                })?;
            let Geometry::LineString(line) = &feature.geometry else {
                return Err(Error::GeometryTypeMismatch { fid: feature.fid });
            };
            graph.add_line(line.clone(), id, feature.attributes.clone())?;
        }
        tracing::debug!(
            layer = layer.name(),
            lines = graph.line_count(),
            nodes = graph.node_count(),
            "built line graph"
        );
        Ok(graph)
    }

    /// Adds a line with identifier `id`.
    pub fn add_line(
        &mut self,
        line: LineString<f64>,
        id: u32,
        attributes: Attributes,
    ) -> Result<LineKey> {
        if self.by_id.contains_key(&id) {
            return Err(Error::DuplicateLineId(id));
        }
        if distinct_len(&line) < 2 {
            return Err(Error::EmptyLine);
        }
        let line = remove_repeated_points(&line);
        let start = self.node_at(line.0[0]);
        let end = self.node_at(line.0[line.0.len() - 1]);

        let key = self.lines.insert(LineEntity {
            id,
            line,
            attributes,
            start,
            end,
        });
        self.nodes[start].outgoing.push(key);
        self.nodes[end].incoming.push(key);
        self.order.push(key);
        self.by_id.insert(id, key);
        Ok(key)
    }

    fn node_at(&mut self, coord: Coord<f64>) -> NodeKey {
        let nodes = &mut self.nodes;
        *self.node_index.entry(CoordKey::from(coord)).or_insert_with(|| {
            nodes.insert(LineNode {
                coord,
                outgoing: Vec::new(),
                incoming: Vec::new(),
            })
        })
    }

    pub fn line(&self, key: LineKey) -> Option<&LineEntity> {
        self.lines.get(key)
    }

    pub fn line_mut(&mut self, key: LineKey) -> Option<&mut LineEntity> {
        self.lines.get_mut(key)
    }

    pub fn line_by_id(&self, id: u32) -> Option<LineKey> {
        self.by_id.get(&id).copied()
    }

    /// Lines in insertion order, with their keys.
    pub fn lines(&self) -> impl Iterator<Item = (LineKey, &LineEntity)> + '_ {
        self.order
            .iter()
            .filter_map(|k| self.lines.get(*k).map(|l| (*k, l)))
    }

    /// Coordinate of a network node.
    pub fn node_coord(&self, key: NodeKey) -> Option<Coord<f64>> {
        self.nodes.get(key).map(|n| n.coord)
    }

    /// Lines starting where `line` ends.
    pub fn downstream(&self, line: LineKey) -> Result<Vec<LineKey>> {
        let entity = self.lines.get(line).ok_or(Error::LineNotFound(line))?;
        Ok(self.nodes[entity.end]
            .outgoing
            .iter()
            .copied()
            .filter(|k| *k != line)
            .collect())
    }

    /// Lines ending where `line` starts.
    pub fn upstream(&self, line: LineKey) -> Result<Vec<LineKey>> {
        let entity = self.lines.get(line).ok_or(Error::LineNotFound(line))?;
        Ok(self.nodes[entity.start]
            .incoming
            .iter()
            .copied()
            .filter(|k| *k != line)
            .collect())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
