// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Show the bitmask of a list of calibration flags and the stages it runs.

use clap::Parser;
use itertools::Itertools;
use log::info;

use super::SciacalError;
use crate::calibration::{CalibFlags, Pipeline, FLAG_NAMES};

lazy_static::lazy_static! {
    static ref FLAGS_HELP: String =
        format!("Comma-separated calibration flags. Besides ATBD, SRON and NONE, valid names are: {}", *FLAG_NAMES);
}

/// Show the calibration bitmask for a list of flag names.
#[derive(Parser, Debug)]
pub struct FlagsArgs {
    #[clap(name = "NAMES", help = FLAGS_HELP.as_str())]
    names: String,

    /// Print the result as JSON.
    #[clap(long)]
    json: bool,
}

#[derive(serde::Serialize)]
struct FlagsSummary {
    mask: u32,
    names: Vec<&'static str>,
    stages: Vec<String>,
}

impl FlagsArgs {
    pub fn run(&self) -> Result<(), SciacalError> {
        let flags: CalibFlags = self.names.parse()?;
        let pipeline = Pipeline::from_flags(flags);
        let stages = pipeline.stages();

        if self.json {
            let summary = FlagsSummary {
                mask: flags.bits(),
                names: flags.names(),
                stages: stages.iter().map(|s| s.to_string()).collect(),
            };
            println!("{}", serde_json::to_string(&summary)?);
            return Ok(());
        }

        info!("Calibration mask: 0x{:08X} ({})", flags.bits(), flags.bits());
        info!("Flags: {flags}");
        if stages.is_empty() {
            info!("No calibration stages run");
        } else {
            info!("Stages: {}", stages.iter().join(", "));
            info!(
                "Variants: dark {:?}, PPG {:?}, reflectance {:?}, BDPM {:?}",
                pipeline.dark, pipeline.ppg, pipeline.refl, pipeline.bdpm
            );
        }
        Ok(())
    }
}
