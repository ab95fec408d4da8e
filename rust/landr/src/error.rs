// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for graph construction, classification and layer repair.

use crate::keys::{EdgeKey, FaceKey, LineKey};

/// Result type alias for landscape topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, querying or repairing topology.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operation needs a polygon layer.
    #[error("layer '{0}' is not of polygon type")]
    NotPolygonLayer(String),

    /// The operation needs a line layer.
    #[error("layer '{0}' is not of line type")]
    NotLineLayer(String),

    /// The layer is neither polygon nor line typed.
    #[error("layer '{0}' is neither of line nor of polygon type")]
    UnsupportedLayerType(String),

    /// A feature's geometry kind does not match its layer type.
    #[error("feature {fid} does not have the geometry type of its layer")]
    GeometryTypeMismatch { fid: u64 },

    /// `Touches` needs a strictly positive contact length.
    #[error("contact length must be greater than 0 for the Touches relationship")]
    ZeroContactLength,

    /// The relationship cannot be used by this classification.
    #[error("relationship {0} is not allowed here")]
    RelationshipNotAllowed(&'static str),

    /// No boundary edge of the face intersects the segment being removed.
    ///
    /// `face` is the face whose boundary is being split and `inserting` the
    /// face whose insertion needed the split.
    #[error(
        "cannot remove segment {segment} from face {face} while inserting face {inserting}: \
         no edge intersects it"
    )]
    EdgeNotFound {
        face: u32,
        inserting: u32,
        segment: String,
    },

    /// Removing a segment from an edge left something that is not linework.
    #[error(
        "cannot remove segment {segment} from face {face} while inserting face {inserting}: \
         difference is not line typed"
    )]
    NonLinearDifference {
        face: u32,
        inserting: u32,
        segment: String,
    },

    /// The edge is not part of the face's boundary.
    #[error("edge is not on the boundary of face {0}")]
    EdgeNotOnFace(u32),

    /// The two edges do not share an endpoint.
    #[error("edges are not coincident")]
    EdgesNotCoincident,

    /// A geometry failed validity checking.
    #[error("geometry of feature {fid} is invalid: {reason}")]
    InvalidGeometry { fid: u64, reason: String },

    /// The identifier field is missing or not an integer.
    #[error("feature {fid} has no integer '{field}' field")]
    MissingIdField { fid: u64, field: String },

    /// Two faces were given the same identifier.
    #[error("face identifier {0} is already used")]
    DuplicateFaceId(u32),

    /// Two features of a layer document share a fid.
    #[error("fid {0} is used by more than one feature")]
    DuplicateFid(u64),

    /// The layer has handed out the largest representable fid.
    #[error("layer '{0}' has no fid left to assign")]
    FidsExhausted(String),

    /// Two lines were given the same identifier.
    #[error("line identifier {0} is already used")]
    DuplicateLineId(u32),

    /// A line with fewer than two distinct coordinates.
    #[error("line has fewer than two distinct coordinates")]
    EmptyLine,

    /// Face key not found in the graph.
    #[error("face not found: {0:?}")]
    FaceNotFound(FaceKey),

    /// Edge key not found in the graph.
    #[error("edge not found: {0:?}")]
    EdgeKeyNotFound(EdgeKey),

    /// Line key not found in the line graph.
    #[error("line not found: {0:?}")]
    LineNotFound(LineKey),

    /// The GEOS geometry engine reported a failure.
    #[error("geometry engine error: {0}")]
    Geos(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<geos::Error> for Error {
    fn from(err: geos::Error) -> Self {
        Error::Geos(err.to_string())
    }
}
