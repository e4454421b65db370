// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Look up dark-current parameters in the SDMF database selected by the
//! environment.

use clap::Parser;
use log::{info, warn};
use ndarray::Array1;
use serde::Serialize;

use super::SciacalError;
use crate::{
    config::Config,
    error::SciaError,
    sdmf::{open_database, SdmfVersion},
};

/// Look up the dark parameters of an orbit in the SDMF database. The
/// database version and location come from USE_SDMF_VERSION and
/// SDMF24_PATH, SDMF30_PATH or SDMF31_PATH.
#[derive(Parser, Debug)]
pub struct SdmfDarkArgs {
    /// The absolute orbit to look up.
    #[clap(long)]
    orbit: i32,

    /// The channel (1-8), or 0 for all channels.
    #[clap(long, default_value = "8")]
    channel: u8,

    /// Look up the averaged dark signal of this dark state instead of the
    /// fitted analog offset and leakage current.
    #[clap(long)]
    state: Option<u8>,

    /// Print the result as JSON.
    #[clap(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct DarkSummary {
    version: String,
    found: bool,
    /// The orbit the data was taken from.
    orbit: Option<i32>,
    quality: Option<i32>,
    /// Mean values over the pixels with a finite value.
    means: Vec<(&'static str, f32)>,
}

fn finite_mean(a: &Array1<f32>) -> f32 {
    let (sum, n) = a
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0u32), |(s, n), &v| (s + f64::from(v), n + 1));
    if n == 0 {
        f32::NAN
    } else {
        (sum / f64::from(n)) as f32
    }
}

impl SdmfDarkArgs {
    fn lookup(&self, config: &Config) -> Result<DarkSummary, SciaError> {
        let db = open_database(config, None)?;
        let version: SdmfVersion = db.version();
        let summary = match self.state {
            Some(state_id) => {
                let dark = db.state_dark(state_id, self.channel, self.orbit)?;
                DarkSummary {
                    version: version.to_string(),
                    found: dark.found,
                    orbit: dark.orbit,
                    quality: None,
                    means: vec![
                        ("signal", finite_mean(&dark.signal)),
                        ("noise", finite_mean(&dark.noise)),
                    ],
                }
            }
            None => {
                let dark = db.resolve(self.channel, self.orbit)?;
                DarkSummary {
                    version: version.to_string(),
                    found: dark.found,
                    orbit: dark.orbit,
                    quality: dark.quality,
                    means: vec![
                        ("analog offset", finite_mean(&dark.analog_offset)),
                        ("leakage current", finite_mean(&dark.dark_current)),
                    ],
                }
            }
        };
        Ok(summary)
    }

    pub fn run(&self) -> Result<(), SciacalError> {
        let config = Config::from_env()?;
        let summary = self.lookup(&config)?;

        if self.json {
            println!("{}", serde_json::to_string(&summary)?);
            return Ok(());
        }
        if !summary.found {
            warn!(
                "No SDMF (v{}) dark data found near orbit {}",
                summary.version, self.orbit
            );
            return Ok(());
        }
        match summary.orbit {
            Some(o) => info!("Applied SDMF Dark data (v{}) of orbit: {o}", summary.version),
            None => info!("Applied SDMF Dark data (v{})", summary.version),
        }
        if let Some(q) = summary.quality {
            info!("  quality: {q}");
        }
        for (name, mean) in &summary.means {
            info!("  mean {name}: {mean:.4}");
        }
        Ok(())
    }
}
