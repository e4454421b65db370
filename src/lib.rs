// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Decoding and calibration of SCIAMACHY Level-0 and Level-1 data.

The crate decodes raw Level-0 instrument source packets ([`lv0`]), derives
housekeeping quantities from them ([`housekeeping`]), looks up dark-current
parameters in the SDMF databases ([`sdmf`]), calibrates Level-1c spectral
records ([`calibration`]) and classifies orbits by data quality
([`quality`]).
 */

pub mod batch;
pub mod calibration;
mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod housekeeping;
pub mod lv0;
pub mod quality;
pub mod sdmf;

// Re-exports.
pub use cli::{Sciacal, SciacalError};
pub use config::Config;
pub use error::{SciaError, Severity};
