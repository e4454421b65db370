// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The outward orbit search shared by the database adapters.

/// Maximum orbit distance of a fitted dark record.
pub const MAX_FITTED_ORBIT_DISTANCE: i32 = 21;

/// State darks must come from an orbit closer than this.
pub const STATE_ORBIT_RADIUS: i32 = 14;

/// Fitted dark records below this quality are never used.
pub const MIN_QUALITY: i32 = 40;

/// A fitted dark record of at least this quality ends the search.
pub const GOOD_QUALITY: i32 = 70;

/// Which neighbour of the requested orbit is tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchOrder {
    /// 0, +1, -1, +2, -2, ...
    LaterFirst,

    /// 0, -1, +1, -2, +2, ...
    EarlierFirst,
}

/// Orbit offsets in search order, up to and including `max_delta`.
pub(crate) fn search_offsets(order: SearchOrder, max_delta: i32) -> impl Iterator<Item = i32> {
    std::iter::successors(Some(0i32), move |&d| {
        let next = match order {
            SearchOrder::LaterFirst => {
                if d > 0 {
                    -d
                } else {
                    1 - d
                }
            }
            SearchOrder::EarlierFirst => {
                if d < 0 {
                    -d
                } else {
                    -(d + 1)
                }
            }
        };
        (next.abs() <= max_delta).then(|| next)
    })
}

/// A fitted dark record seen during the search.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FitCandidate<T> {
    pub orbit: i32,
    pub quality: i32,
    pub saa: bool,
    pub item: T,
}

/// Walk outward from `orbit` and pick the best fitted dark record. Records
/// in the SAA are skipped. A record is taken when its quality reaches the
/// best quality seen so far (starting at [`MIN_QUALITY`]); with
/// `replace_on_tie` false it must exceed it. The search stops at the first
/// record of [`GOOD_QUALITY`] or better.
pub(crate) fn select_fitted<T, E, F>(
    orbit: i32,
    replace_on_tie: bool,
    mut candidates_at: F,
) -> Result<Option<FitCandidate<T>>, E>
where
    F: FnMut(i32) -> Result<Vec<FitCandidate<T>>, E>,
{
    let mut best: Option<FitCandidate<T>> = None;
    let mut best_quality = MIN_QUALITY;
    for delta in search_offsets(SearchOrder::LaterFirst, MAX_FITTED_ORBIT_DISTANCE) {
        for c in candidates_at(orbit + delta)? {
            if c.saa {
                continue;
            }
            let accept = if replace_on_tie {
                c.quality >= best_quality
            } else {
                c.quality > best_quality
            };
            if accept {
                best_quality = c.quality;
                best = Some(c);
            }
        }
        if best_quality >= GOOD_QUALITY {
            break;
        }
    }
    Ok(best)
}
