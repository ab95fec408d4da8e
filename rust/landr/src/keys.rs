// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key types for arena-based storage.
//!
//! Nodes, edges, faces and line entities live in `slotmap::SlotMap`s owned by
//! their graph. Keys stay valid (and never alias a newer entity) after other
//! entries are removed, so faces and edges can reference each other by key
//! without any ownership between them.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a graph node (a coordinate where edges meet).
    pub struct NodeKey;

    /// Key for an edge (a maximal boundary line shared by one or two faces).
    pub struct EdgeKey;

    /// Key for a face (one input polygon).
    pub struct FaceKey;

    /// Key for a line entity of a line graph.
    pub struct LineKey;
}

/// A handle to any landscape entity: an area (face) or a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Area(FaceKey),
    Line(LineKey),
}

impl EntityRef {
    /// Returns the entity kind.
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Area(_) => EntityKind::Area,
            EntityRef::Line(_) => EntityKind::Line,
        }
    }

    /// The face key, if this is an area entity.
    pub fn as_face(&self) -> Option<FaceKey> {
        match self {
            EntityRef::Area(k) => Some(*k),
            EntityRef::Line(_) => None,
        }
    }

    /// The line key, if this is a line entity.
    pub fn as_line(&self) -> Option<LineKey> {
        match self {
            EntityRef::Area(_) => None,
            EntityRef::Line(k) => Some(*k),
        }
    }
}

/// Discriminant for entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Area = 0,
    Line = 1,
}

impl EntityKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Area => "Area",
            EntityKind::Line => "Line",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FaceKey> for EntityRef {
    fn from(k: FaceKey) -> Self {
        EntityRef::Area(k)
    }
}

impl From<LineKey> for EntityRef {
    fn from(k: LineKey) -> Self {
        EntityRef::Line(k)
    }
}
