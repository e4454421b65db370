// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Memory-effect and non-linearity correction tables.

use ndarray::Array2;

use crate::constants::{SCIENCE_PIXELS, VIS_CHANNELS};

/// Round a signal to a table index; negative values give 0.
pub fn round_us(value: f32) -> u16 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= f32::from(u16::MAX) {
        u16::MAX
    } else {
        (value + 0.5) as u16
    }
}

/// Tabulated corrections indexed by the rounded signal \[BU\].
pub trait MemNlinTables: Send + Sync {
    /// Memory-effect correction of visible `channel` (1-5).
    fn memory(&self, channel: u8, signal: u16) -> f32;

    /// Index of the non-linearity curve of an absolute pixel (0-8191).
    fn nlin_curve(&self, pixel: usize) -> u8;

    /// Non-linearity correction of `curve`.
    fn nonlinearity(&self, curve: u8, signal: u16) -> f32;
}

/// Correction tables held in memory. Out-of-range lookups clamp to the
/// table edges.
#[derive(Debug, Clone)]
pub struct CorrectionTables {
    /// One row per visible channel.
    pub memory: Array2<f32>,
    /// The curve index of every science pixel.
    pub curve: Vec<u8>,
    /// One row per curve.
    pub nlin: Array2<f32>,
}

impl CorrectionTables {
    /// Tables with a constant memory correction and no non-linearity.
    pub fn constant(memory: f32, len: usize) -> CorrectionTables {
        CorrectionTables {
            memory: Array2::from_elem((VIS_CHANNELS, len), memory),
            curve: vec![0; SCIENCE_PIXELS],
            nlin: Array2::zeros((1, len)),
        }
    }

    /// Read `MemTable` from the memory-correction file and `nLinTable` and
    /// `CurveIndex` from the non-linearity file.
    #[cfg(feature = "hdf5")]
    pub fn from_hdf5(
        memcorr: &std::path::Path,
        nlcorr: &std::path::Path,
    ) -> Result<CorrectionTables, super::SdmfError> {
        let memory = hdf5::File::open(memcorr)?
            .dataset("MemTable")?
            .read_2d::<f32>()?;
        let file = hdf5::File::open(nlcorr)?;
        let nlin = file.dataset("nLinTable")?.read_2d::<f32>()?;
        let curve = file.dataset("CurveIndex")?.read_raw::<u8>()?;
        log::info!("applied memory correction (SRON-SCIA-PhE-RP-011)");
        Ok(CorrectionTables {
            memory,
            curve,
            nlin,
        })
    }
}

fn clamped(table: &Array2<f32>, row: usize, col: u16) -> f32 {
    let (rows, cols) = table.dim();
    if rows == 0 || cols == 0 {
        return 0.0;
    }
    table[[row.min(rows - 1), usize::from(col).min(cols - 1)]]
}

impl MemNlinTables for CorrectionTables {
    fn memory(&self, channel: u8, signal: u16) -> f32 {
        clamped(&self.memory, usize::from(channel.max(1) - 1), signal)
    }

    fn nlin_curve(&self, pixel: usize) -> u8 {
        self.curve.get(pixel).copied().unwrap_or(0)
    }

    fn nonlinearity(&self, curve: u8, signal: u16) -> f32 {
        clamped(&self.nlin, usize::from(curve), signal)
    }
}
