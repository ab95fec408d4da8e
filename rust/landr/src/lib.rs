// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # LandR
//!
//! Landscape topology for land-representation models.
//!
//! Independent polygon features are assembled into a planar graph in which
//! every boundary stretch between two neighbouring polygons is a single
//! shared edge referenced by both faces. On top of that graph the crate
//! answers adjacency questions (neighbours, shared boundary length), relates
//! faces to line networks such as streams or hedges (including barriers that
//! sever adjacency and downstream flow partners), and offers a repair pass
//! for raw layers (overlaps, gaps, near-miss vertices).
//!
//! Nodes, edges and faces live in slot maps owned by [`PolygonGraph`] and
//! refer to each other by key. A graph is single-writer: per-face neighbour
//! indexes are cached lazily in cells, so graphs are not `Sync`.

pub mod attributes;
mod builder;
pub mod classify;
pub mod config;
pub mod dataset;
pub mod edge;
pub mod entity;
pub mod error;
pub mod face;
pub mod graph;
pub mod kernel;
pub mod keys;
pub mod line_graph;
mod query;
pub mod repair;
pub mod serialization;
pub mod spatial;

pub use attributes::{AttrValue, Attributes};
pub use classify::{Classifier, FlowPartner, Relationship};
pub use config::LandrConfig;
pub use dataset::{Feature, FeatureLayer, LayerType};
pub use edge::{DirectedArc, Edge, Node};
pub use entity::{EntityGeometry, LandrEntity};
pub use error::{Error, Result};
pub use face::{Face, NeighbourMap};
pub use graph::PolygonGraph;
pub use keys::{EdgeKey, EntityKind, EntityRef, FaceKey, LineKey, NodeKey};
pub use line_graph::{LineEntity, LineStringGraph};
pub use repair::{RepairOptions, TopologyReport};
