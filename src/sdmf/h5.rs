// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! HDF5 access shared by the version 3.0 and 3.1 adapters.

use std::ops::Range;
use std::path::Path;

use hdf5::{File, Group, H5Type};
use ndarray::{s, Array1};

use super::{SdmfError, SdmfVersion};

/// At most this many metaTable rows are used for one orbit.
pub(crate) const MAX_NUM_META_INDEX: usize = 32;

pub(crate) fn open(path: &Path) -> Result<File, SdmfError> {
    File::open(path).map_err(|err| SdmfError::Hdf5Open {
        path: path.to_path_buf(),
        err,
    })
}

/// Rows of the metaTable of `group` that belong to `orbit`, using the
/// sorted `orbitList`/`orbitIndex` datasets.
pub(crate) fn meta_index(group: &Group, orbit: i32) -> Result<Vec<usize>, SdmfError> {
    if !group.link_exists("orbitList") {
        return Ok(vec![]);
    }
    let orbit_list = group.dataset("orbitList")?.read_raw::<i32>()?;
    let orbit_index = group.dataset("orbitIndex")?.read_raw::<i32>()?;
    Ok(orbit_index
        .iter()
        .filter_map(|&i| usize::try_from(i).ok())
        .filter(|&i| orbit_list.get(i) == Some(&orbit))
        .take(MAX_NUM_META_INDEX)
        .collect())
}

/// The whole metaTable of `group`.
pub(crate) fn meta_table<T: H5Type>(group: &Group) -> Result<Vec<T>, SdmfError> {
    Ok(group.dataset("metaTable")?.read_raw::<T>()?)
}

/// Read `pixels` of record `index` from a dataset stored as
/// \[pixels, records\].
pub(crate) fn read_column(
    version: SdmfVersion,
    group: &Group,
    name: &str,
    pixels: Range<usize>,
    index: usize,
) -> Result<Array1<f32>, SdmfError> {
    let ds = group.dataset(name)?;
    let shape = ds.shape();
    if shape.len() != 2 || shape[0] < pixels.end || shape[1] <= index {
        return Err(SdmfError::BadShape {
            version,
            name: name.to_string(),
            shape,
        });
    }
    Ok(ds.read_slice_1d::<f32, _>(s![pixels, index])?)
}

/// Read `pixels` of record `index` from an extendible dataset stored as
/// \[records, pixels\].
pub(crate) fn read_row(
    version: SdmfVersion,
    group: &Group,
    name: &str,
    pixels: Range<usize>,
    index: usize,
) -> Result<Array1<f32>, SdmfError> {
    let ds = group.dataset(name)?;
    let shape = ds.shape();
    if shape.len() != 2 || shape[0] <= index || shape[1] < pixels.end {
        return Err(SdmfError::BadShape {
            version,
            name: name.to_string(),
            shape,
        });
    }
    Ok(ds.read_slice_1d::<f32, _>(s![index, pixels])?)
}
