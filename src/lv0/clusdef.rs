// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cluster definitions and the repair of corrupted detector cluster headers.

use std::collections::HashMap;

use crate::constants::CHANNEL_SIZE;

/// Orbits up to and including this one are read without cluster repair,
/// unless explicitly requested.
pub const LAST_ORBIT_WITHOUT_CLUSTER_CORRECTION: i32 = 4151;

/// The expected geometry of one cluster of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterDef {
    pub chan_id: u8,
    pub clus_id: u8,
    pub start: u16,
    pub length: u16,
}

/// Cluster definitions per state ID.
#[derive(Debug, Clone, Default)]
pub struct ClusterDefTable {
    by_state: HashMap<u8, Vec<ClusterDef>>,
}

impl ClusterDefTable {
    pub fn new() -> ClusterDefTable {
        ClusterDefTable::default()
    }

    pub fn insert(&mut self, state_id: u8, defs: Vec<ClusterDef>) {
        self.by_state.insert(state_id, defs);
    }

    pub fn get(&self, state_id: u8) -> &[ClusterDef] {
        self.by_state
            .get(&state_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Should detector clusters be checked against their definitions?
///
/// `no_cluster_correction` is the value of `NO_CLUSTER_CORRECTION`. When it is
/// unset, only orbits after [`LAST_ORBIT_WITHOUT_CLUSTER_CORRECTION`] are
/// checked; a value starting with '0' forces the check, anything else
/// disables it.
pub fn cluster_correction_enabled(no_cluster_correction: Option<&str>, abs_orbit: i32) -> bool {
    match no_cluster_correction {
        None => abs_orbit > LAST_ORBIT_WITHOUT_CLUSTER_CORRECTION,
        Some(s) => s.starts_with('0'),
    }
}

/// The header fields of one cluster, as they are compared with the
/// definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClusterKey {
    pub chan_id: u8,
    pub clus_id: u8,
    pub start: u16,
    pub length: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClusterCheck {
    Unchanged,
    Repaired {
        field: &'static str,
        from: u16,
        to: u16,
        fixed: ClusterKey,
    },
    Failed,
}

/// Check a cluster header against the definitions of its state. A header
/// that matches a definition in all but one field is repaired; the fields
/// are tried in the order cluster ID, channel ID, start, length.
///
/// When the check is disabled only obviously corrupt clusters (longer than a
/// channel) are examined.
pub(crate) fn check_cluster(key: ClusterKey, defs: &[ClusterDef], enabled: bool) -> ClusterCheck {
    if !enabled && usize::from(key.length) <= CHANNEL_SIZE {
        return ClusterCheck::Unchanged;
    }
    if defs.is_empty() {
        return if usize::from(key.length) <= CHANNEL_SIZE {
            ClusterCheck::Unchanged
        } else {
            ClusterCheck::Failed
        };
    }

    let same_chan = |d: &ClusterDef| d.chan_id == key.chan_id;
    let same_clus = |d: &ClusterDef| d.clus_id == key.clus_id;
    let same_start = |d: &ClusterDef| d.start == key.start;
    let same_length = |d: &ClusterDef| d.length == key.length;

    if defs
        .iter()
        .any(|d| same_chan(d) && same_clus(d) && same_start(d) && same_length(d))
    {
        return ClusterCheck::Unchanged;
    }
    if let Some(d) = defs
        .iter()
        .find(|d| same_chan(d) && same_start(d) && same_length(d))
    {
        return ClusterCheck::Repaired {
            field: "ID of cluster",
            from: key.clus_id.into(),
            to: d.clus_id.into(),
            fixed: ClusterKey {
                clus_id: d.clus_id,
                ..key
            },
        };
    }
    if let Some(d) = defs
        .iter()
        .find(|d| same_clus(d) && same_start(d) && same_length(d))
    {
        return ClusterCheck::Repaired {
            field: "ID of channel",
            from: key.chan_id.into(),
            to: d.chan_id.into(),
            fixed: ClusterKey {
                chan_id: d.chan_id,
                ..key
            },
        };
    }
    if let Some(d) = defs
        .iter()
        .find(|d| same_chan(d) && same_clus(d) && same_length(d))
    {
        return ClusterCheck::Repaired {
            field: "start",
            from: key.start,
            to: d.start,
            fixed: ClusterKey {
                start: d.start,
                ..key
            },
        };
    }
    if let Some(d) = defs
        .iter()
        .find(|d| same_chan(d) && same_clus(d) && same_start(d))
    {
        return ClusterCheck::Repaired {
            field: "length",
            from: key.length,
            to: d.length,
            fixed: ClusterKey {
                length: d.length,
                ..key
            },
        };
    }

    ClusterCheck::Failed
}
