// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerances and field names shared by graph construction, classification
//! and repair, loaded from environment variables or JSON.

use serde::{Deserialize, Serialize};

use crate::kernel::buffer::DEFAULT_QUADRANT_SEGMENTS;

/// Landscape topology configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandrConfig {
    /// Integer attribute holding the stable face/line identifier.
    pub id_field: String,
    /// Distance under which a vertex is snapped onto another feature's vertex.
    pub snap_tolerance: f64,
    /// Distance under which two disjoint features are reported as a gap.
    pub gap_threshold: f64,
    /// Buffer distance around face boundaries for line classification.
    pub buffer_distance: f64,
    /// Minimum contact length for the `Touches` relationship.
    pub contact_length: f64,
    /// Distance under which a flow line part is considered to reach a line.
    pub flow_end_tolerance: f64,
    /// Arc resolution of buffers, in segments per quarter circle.
    pub buffer_quadrant_segments: usize,
}

impl Default for LandrConfig {
    fn default() -> Self {
        Self {
            id_field: "SELF_ID".to_string(),
            snap_tolerance: 0.01,
            gap_threshold: 0.1,
            buffer_distance: 0.5,
            contact_length: 1.0,
            flow_end_tolerance: 1e-4,
            buffer_quadrant_segments: DEFAULT_QUADRANT_SEGMENTS,
        }
    }
}

impl LandrConfig {
    /// Load configuration from `LANDR_*` environment variables, falling back
    /// to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            id_field: std::env::var("LANDR_ID_FIELD").unwrap_or(defaults.id_field),
            snap_tolerance: env_or("LANDR_SNAP_TOLERANCE", defaults.snap_tolerance),
            gap_threshold: env_or("LANDR_GAP_THRESHOLD", defaults.gap_threshold),
            buffer_distance: env_or("LANDR_BUFFER_DISTANCE", defaults.buffer_distance),
            contact_length: env_or("LANDR_CONTACT_LENGTH", defaults.contact_length),
            flow_end_tolerance: env_or("LANDR_FLOW_END_TOLERANCE", defaults.flow_end_tolerance),
            buffer_quadrant_segments: env_or(
                "LANDR_BUFFER_QUADRANT_SEGMENTS",
                defaults.buffer_quadrant_segments,
            ),
        }
    }

    /// Parse configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::Error::Serialization(e.to_string()))
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
