// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Print the data quality of orbits.

use clap::Parser;
use log::{info, warn};

use super::SciacalError;
use crate::quality::{classify, parse_orbit, Quality, QualityError};

/// Classify absolute orbits against the known periods of unavailable,
/// decontamination and recovery data.
#[derive(Parser, Debug)]
pub struct QualityArgs {
    /// Absolute orbit numbers.
    #[clap(name = "ORBITS", required = true, allow_hyphen_values = true)]
    orbits: Vec<String>,

    /// Print the classifications as JSON.
    #[clap(long)]
    json: bool,
}

impl QualityArgs {
    pub fn run(&self) -> Result<(), SciacalError> {
        let mut results: Vec<Quality> = Vec::with_capacity(self.orbits.len());
        for s in &self.orbits {
            let quality = match parse_orbit(s) {
                Ok(orbit) => classify(orbit),
                Err(e @ QualityError::OrbitOutOfRange(orbit)) => {
                    warn!("{e}");
                    classify(orbit)
                }
                Err(e) => return Err(e.into()),
            };
            results.push(quality);
        }

        if self.json {
            println!("{}", serde_json::to_string(&results)?);
        } else {
            for q in &results {
                match q.period {
                    Some(p) => info!(
                        "orbit {:>5}: {} ({}) in {}-{}",
                        q.orbit,
                        q.class,
                        q.class.code(),
                        p.start,
                        p.end
                    ),
                    None => info!("orbit {:>5}: {} ({})", q.orbit, q.class, q.class.code()),
                }
            }
        }
        Ok(())
    }
}
