// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Decode raw Level-0 packet streams and print the housekeeping of every
//! state execution.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, log, warn, Level};
use serde::Serialize;

use super::SciacalError;
use crate::{
    batch::process_products,
    error::{SciaError, Severity},
    housekeeping::{det_pet, ObmMode, Pet, StateHousekeeping},
    lv0::{
        read_aux, read_det, read_pmd, scan_packets, select_packets, AllocStrategy,
        DetReadOptions, Lv0Warning, Mds0Info, PacketType, BAND_ALL,
    },
    quality::{classify, QualityClass},
};

/// Decode raw Level-0 packet streams and print their housekeeping.
#[derive(Parser, Debug)]
pub struct Lv0DumpArgs {
    /// Files holding a stream of Level-0 packets.
    #[clap(name = "FILES", required = true, parse(from_os_str))]
    files: Vec<PathBuf>,

    /// Decode only the channels with their bit set (bit 0 is channel 1).
    #[clap(long, default_value = "255")]
    chan_mask: u8,

    /// The absolute orbit of the data. Only used to report the data quality.
    #[clap(long)]
    orbit: Option<i32>,

    /// Derive the OBM temperature from the radiator word instead of the
    /// azimuth and elevation thermistors.
    #[clap(long)]
    legacy_obm: bool,

    /// Print the housekeeping as JSON.
    #[clap(long)]
    json: bool,
}

/// The pixel exposure time of one channel.
#[derive(Debug, Serialize)]
struct ChannelPet {
    channel: u8,
    pet: Pet,
}

/// Everything printed for one state execution.
#[derive(Debug, Serialize)]
struct StateDump {
    state_index: u16,
    num_aux: usize,
    num_det: usize,
    num_pmd: usize,
    housekeeping: StateHousekeeping,
    pet: Vec<ChannelPet>,
}

#[derive(Debug, Serialize)]
struct ProductDump {
    file: PathBuf,
    states: Vec<StateDump>,
}

fn log_warning(path: &Path, w: &Lv0Warning) {
    let level = match w.severity() {
        Severity::Info => Level::Info,
        _ => Level::Warn,
    };
    log!(level, "{}: {w}", path.display());
}

fn dump_state(
    reader: &mut BufReader<File>,
    path: &Path,
    state: &[Mds0Info],
    opts: &DetReadOptions,
    obm_mode: ObmMode,
) -> Result<Option<StateDump>, SciaError> {
    let aux = read_aux(
        reader,
        &select_packets(state, PacketType::Aux),
        AllocStrategy::CalleeAllocates,
    )?;
    let det = read_det(
        reader,
        &select_packets(state, PacketType::Det),
        opts,
        AllocStrategy::CalleeAllocates,
    )?;
    let pmd = read_pmd(
        reader,
        &select_packets(state, PacketType::Pmd),
        AllocStrategy::CalleeAllocates,
    )?;
    for w in aux
        .warnings
        .iter()
        .chain(det.warnings.iter())
        .chain(pmd.warnings.iter())
    {
        log_warning(path, w);
    }

    let housekeeping =
        match StateHousekeeping::new(&aux.records, &det.records, &pmd.records, obm_mode)? {
            Some(hk) => hk,
            None => return Ok(None),
        };
    let pet = det
        .records
        .first()
        .map(|d| {
            d.data_src
                .iter()
                .map(|src| ChannelPet {
                    channel: src.hdr.id(),
                    pet: det_pet(&src.hdr),
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(Some(StateDump {
        state_index: state.first().map(|i| i.state_index).unwrap_or(0),
        num_aux: aux.records.len(),
        num_det: det.records.len(),
        num_pmd: pmd.records.len(),
        housekeeping,
        pet,
    }))
}

fn dump_product(
    path: &Path,
    opts: &DetReadOptions,
    obm_mode: ObmMode,
) -> Result<ProductDump, SciaError> {
    let mut reader = BufReader::new(File::open(path)?);
    let infos = scan_packets(&mut reader, 0, None)?;
    debug!("{}: {} packets", path.display(), infos.len());

    let mut states = vec![];
    for state_index in infos.iter().map(|i| i.state_index).unique() {
        let state: Vec<Mds0Info> = infos
            .iter()
            .filter(|i| i.state_index == state_index)
            .copied()
            .collect();
        match dump_state(&mut reader, path, &state, opts, obm_mode)? {
            Some(s) => states.push(s),
            None => debug!(
                "{}: state execution {state_index} has no detector packets",
                path.display()
            ),
        }
    }
    Ok(ProductDump {
        file: path.to_path_buf(),
        states,
    })
}

fn print_product(dump: &ProductDump) {
    info!("{}: {} states", dump.file.display(), dump.states.len());
    for s in &dump.states {
        let hk = &s.housekeeping;
        info!(
            "  state {:02} (#{}) at MJD2000 {:.6}: {} DET, {} AUX, {} PMD packets",
            hk.state_id, s.state_index, hk.jday, s.num_det, s.num_aux, s.num_pmd
        );
        info!(
            "    OBM {:.2} K, PMD {:.2} K, ASM {:.3}, ESM {:.3}",
            hk.obm_temp, hk.pmd_temp, hk.asm_angle, hk.esm_angle
        );
        info!(
            "    detector temperatures [K]: {}",
            hk.det_temp.iter().map(|t| format!("{t:.2}")).join(" ")
        );
        for c in &s.pet {
            if c.pet.vir_chan_b > 0 {
                info!(
                    "    channel {} PET {:.5} s, {:.5} s from pixel {}",
                    c.channel, c.pet.pet[0], c.pet.pet[1], c.pet.vir_chan_b
                );
            } else {
                info!("    channel {} PET {:.5} s", c.channel, c.pet.pet[0]);
            }
        }
    }
}

impl Lv0DumpArgs {
    pub fn run(&self) -> Result<(), SciacalError> {
        if let Some(orbit) = self.orbit {
            let quality = classify(orbit);
            match quality.class {
                QualityClass::Ok => debug!("Orbit {orbit} has no known quality problems"),
                class => warn!("Orbit {orbit} is flagged {class}"),
            }
        }
        if self.chan_mask != BAND_ALL {
            debug!("Decoding only channels in mask 0x{:02X}", self.chan_mask);
        }

        let opts = DetReadOptions {
            chan_mask: self.chan_mask,
            ..Default::default()
        };
        let obm_mode = if self.legacy_obm {
            ObmMode::Legacy
        } else {
            ObmMode::Sost
        };
        let report = process_products(&self.files, |path| dump_product(path, &opts, obm_mode));

        if self.json {
            let dumps: Vec<&ProductDump> = report.processed.iter().map(|(_, d)| d).collect();
            println!("{}", serde_json::to_string(&dumps)?);
        } else {
            for (_, dump) in &report.processed {
                print_product(dump);
            }
        }

        if report.has_fatal() {
            return Err(SciacalError::Lv0Dump(format!(
                "{} of {} files could not be decoded",
                report.failed.len(),
                report.num_products()
            )));
        }
        Ok(())
    }
}
