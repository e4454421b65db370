// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::io::Cursor;

use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Array2};

use super::*;
use crate::{
    config::Config,
    constants::{CHANNEL_SIZE, SCIENCE_PIXELS},
    lv0::{
        read_det,
        scan_packets,
        tests::{det_packet, TestChannel, TestCluster},
        AllocStrategy, DetReadOptions, Mjd,
    },
    sdmf::{CorrectionTables, MemoryDarkDb, SdmfVersion},
};

fn header() -> ProductHeader {
    ProductHeader {
        product: "SCI_NL__1PNPDE20040101_000000_000000000000_00000_00000_0000.N1".to_string(),
        proc_stage: "N".to_string(),
        init_version: "SCIA/6.03".to_string(),
        sensing_start: "01-JAN-2004 00:00:00.000000".to_string(),
        abs_orbit: 9500,
    }
}

fn keydata() -> MemoryKeyData {
    MemoryKeyData {
        sip: Some(Sip::default()),
        ..Default::default()
    }
}

fn nadir(state_id: u8) -> StateInfo {
    StateInfo {
        state_id,
        source: Source::Nadir,
        orbit_phase: 0.3,
    }
}

/// A record of `num_obs` readouts of the first `num_pixels` pixels of
/// `chan_id`, all with the value `value`.
fn record(chan_id: u8, num_pixels: usize, num_obs: usize, value: f32) -> Mds1c {
    let mut rec = Mds1c::new(1, 0, chan_id, 0, num_pixels, num_obs);
    rec.pixel_val.fill(value);
    rec
}

struct Run<'a> {
    config: Config,
    keydata: &'a dyn KeyData,
    sdmf: Option<&'a dyn crate::sdmf::DarkDatabase>,
    sdmf_keydata: Option<&'a dyn SdmfKeyData>,
    tables: Option<&'a dyn crate::sdmf::MemNlinTables>,
}

impl<'a> Run<'a> {
    fn new(keydata: &'a dyn KeyData) -> Run<'a> {
        Run {
            config: Config::default(),
            keydata,
            sdmf: None,
            sdmf_keydata: None,
            tables: None,
        }
    }

    fn calibrate(
        &self,
        flags: CalibFlags,
        state: &StateInfo,
        records: &mut [Mds1c],
    ) -> Result<(), CalibrationError> {
        let ctx = CalibContext {
            config: &self.config,
            keydata: self.keydata,
            sdmf: self.sdmf,
            sdmf_keydata: self.sdmf_keydata,
            tables: self.tables,
        };
        let mut params = FileParams::new();
        calibrate_state(&ctx, &mut params, &header(), flags, state, records)
    }
}

fn failed_stage(result: Result<(), CalibrationError>) -> (Stage, CalibrationError) {
    match result {
        Err(CalibrationError::Stage { stage, err }) => (stage, *err),
        other => panic!("expected a stage error, got {other:?}"),
    }
}

#[test]
fn test_end_to_end_memory_then_dark() {
    let channel = |id, samples: Vec<u32>| TestChannel {
        id,
        bcps: 0,
        command: 0,
        clusters: vec![TestCluster {
            id: 1,
            co_adding: 1,
            start: 100,
            samples,
        }],
    };
    let raw = [[100u32, 200, 300], [110, 210, 310], [120, 220, 320]];
    let mut stream = vec![];
    for (i, samples) in raw.iter().enumerate() {
        let isp = Mjd {
            days: 1500,
            secnd: i as u32,
            musec: 0,
        };
        stream.extend(det_packet(
            8,
            i as u32,
            isp,
            &[channel(1, samples.to_vec()), channel(2, samples.to_vec())],
        ));
    }
    let mut cursor = Cursor::new(stream);
    let infos = scan_packets(&mut cursor, 0, None).unwrap();
    let read = read_det(
        &mut cursor,
        &infos,
        &DetReadOptions::default(),
        AllocStrategy::CalleeAllocates,
    )
    .unwrap();
    let dets = read.records.to_vec();
    assert_eq!(dets.len(), 3);

    let mut records = Mds1c::from_det_state(&dets, Source::Nadir).unwrap();
    assert_eq!(records.len(), 2);
    for (rec, chan_id) in records.iter().zip([1, 2]) {
        assert_eq!(rec.chan_id, chan_id);
        assert_eq!(rec.num_obs(), 3);
        assert_eq!(rec.num_pixels(), 3);
        assert_eq!(rec.first_channel_pixel(), 100);
        assert_eq!(rec.coaddf, 1);
        assert_abs_diff_eq!(rec.pet, 0.03125);
    }

    let dark_signal = 5.0;
    let mem_corr = 2.0;
    let keydata = MemoryKeyData {
        dark_averages: vec![DarkAverage {
            state_id: 8,
            saa: false,
            setup: vec![
                ChannelSetup {
                    channel: 1,
                    pet: 0.03125,
                    coaddf: 1,
                },
                ChannelSetup {
                    channel: 2,
                    pet: 0.03125,
                    coaddf: 1,
                },
            ],
            dark_spec: Array1::from_elem(SCIENCE_PIXELS, dark_signal),
            sdev_dark_spec: Array1::ones(SCIENCE_PIXELS),
        }],
        ..keydata()
    };
    let tables = CorrectionTables::constant(mem_corr, 1 << 16);
    let mut run = Run::new(&keydata);
    run.tables = Some(&tables);

    let flags = CalibFlags::VIS_MEM | CalibFlags::DARK | CalibFlags::ADARK;
    assert_eq!(
        Pipeline::from_flags(flags).stages(),
        vec![Stage::MemoryCorrection, Stage::Dark]
    );
    assert_eq!(Pipeline::from_flags(flags).dark, DarkStrategy::State);
    run.calibrate(flags, &nadir(8), &mut records).unwrap();

    for rec in &records {
        let expected = Array2::from_shape_fn((3, 3), |(nobs, np)| {
            raw[nobs][np] as f32 - mem_corr - f32::from(rec.coaddf) * dark_signal
        });
        assert_abs_diff_eq!(rec.pixel_val, expected, epsilon = 1e-5);
        // No other stage touched the records.
        assert!(rec.pixel_err.iter().all(|&e| e == 0.0));
        assert!(rec.pixel_wv.iter().all(|&w| w == 0.0));
        assert_eq!(rec.rad_units, 0);
    }
}

#[test]
fn test_no_flags_is_a_noop() {
    // Not even the SIP is needed.
    let keydata = MemoryKeyData::default();
    let mut records = vec![record(1, 4, 2, 7.0)];
    Run::new(&keydata)
        .calibrate(CalibFlags::NONE, &nadir(1), &mut records)
        .unwrap();
    assert!(records[0].pixel_val.iter().all(|&v| v == 7.0));
}

#[test]
fn test_missing_sip_is_fatal() {
    let keydata = MemoryKeyData::default();
    let mut records = vec![record(1, 4, 2, 7.0)];
    let result = Run::new(&keydata).calibrate(CalibFlags::ETALON, &nadir(1), &mut records);
    assert!(matches!(result, Err(CalibrationError::MissingKeyData("SIP"))));
}

#[test]
fn test_stage_order() {
    let stages = Pipeline::from_flags(CalibFlags::SRON | CalibFlags::CALC_ERROR).stages();
    assert_eq!(
        stages,
        vec![
            Stage::MemoryCorrection,
            Stage::Nonlinearity,
            Stage::Dark,
            Stage::Ppg,
            Stage::Etalon,
            Stage::Straylight,
            Stage::Accuracy,
            Stage::Wavelength,
            Stage::Polarisation,
            Stage::Radiance,
            Stage::BadPixelMask,
        ]
    );
    let pipeline = Pipeline::from_flags(CalibFlags::SRON);
    assert_eq!(pipeline.dark, DarkStrategy::Sron);
    assert_eq!(pipeline.ppg, PpgStrategy::Sron);
    assert_eq!(pipeline.bdpm, BdpmStrategy::Sron);
    assert_eq!(pipeline.refl, ReflStrategy::Atbd);

    let pipeline = Pipeline::from_flags(CalibFlags::ATBD);
    assert_eq!(pipeline.dark, DarkStrategy::Atbd);
    assert_eq!(pipeline.ppg, PpgStrategy::Atbd);
    assert_eq!(pipeline.bdpm, BdpmStrategy::Atbd);

    // The state dark wins over the SRON dark.
    let pipeline = Pipeline::from_flags(CalibFlags::SRON | CalibFlags::ADARK);
    assert_eq!(pipeline.dark, DarkStrategy::State);
}

#[test]
fn test_sron_noise_excludes_spectral_accuracy() {
    let both = Pipeline::from_flags(CalibFlags::SRON_NOISE | CalibFlags::CALC_ERROR).stages();
    assert_eq!(both, vec![Stage::Noise]);
    let error_only = Pipeline::from_flags(CalibFlags::CALC_ERROR).stages();
    assert_eq!(error_only, vec![Stage::Accuracy]);

    // Without channel 8 records the SRON noise leaves the variance alone, and
    // the precision is not calculated on top of it.
    let keydata = keydata();
    let run = Run::new(&keydata);
    let mut records = vec![record(1, 4, 2, 7.0)];
    records[0].pixel_err.fill(4.0);
    run.calibrate(
        CalibFlags::SRON_NOISE | CalibFlags::CALC_ERROR,
        &nadir(1),
        &mut records,
    )
    .unwrap();
    assert!(records[0].pixel_err.iter().all(|&e| e == 4.0));

    run.calibrate(CalibFlags::CALC_ERROR, &nadir(1), &mut records)
        .unwrap();
    assert!(records[0].pixel_err.iter().all(|&e| e == 2.0));
}

#[test]
fn test_sron_noise_without_dark_states() {
    let keydata = keydata();
    let db = MemoryDarkDb::new();
    let mut run = Run::new(&keydata);
    run.sdmf = Some(&db);
    let mut records = vec![record(8, 4, 2, 7.0)];
    let (stage, err) = failed_stage(run.calibrate(CalibFlags::SRON_NOISE, &nadir(1), &mut records));
    assert_eq!(stage, Stage::Noise);
    assert!(matches!(err, CalibrationError::NoDarkParameters(9500)));
}

#[test]
fn test_scale_variants() {
    let mut header = header();
    let flags = CalibFlags::VIS_MEM | CalibFlags::SRON_MEM_NLIN;
    assert_eq!(
        scale_variants(&header, flags),
        (ScaleVariant::Patch, ScaleVariant::Atbd)
    );
    assert_eq!(
        scale_variants(&header, flags | CalibFlags::IR_NLIN),
        (ScaleVariant::Patch, ScaleVariant::Patch)
    );
    assert_eq!(
        scale_variants(&header, CalibFlags::VIS_MEM | CalibFlags::IR_NLIN),
        (ScaleVariant::Atbd, ScaleVariant::Atbd)
    );

    header.init_version.clear();
    assert_eq!(
        scale_variants(&header, flags),
        (ScaleVariant::Old, ScaleVariant::Old)
    );
    header.proc_stage = PATCH_PROC_STAGE.to_string();
    assert_eq!(
        scale_variants(&header, CalibFlags::NONE),
        (ScaleVariant::Patch, ScaleVariant::Patch)
    );
}

#[test]
fn test_file_params_reinit() {
    let keydata = keydata();
    let header = header();
    let flags = CalibFlags::ATBD;
    let mut params = FileParams::new();
    assert!(params.needs_reinit(&header, flags, SdmfVersion::V30));

    params.init(&header, flags, SdmfVersion::V30, &keydata).unwrap();
    assert!(params.init_file);
    assert_eq!(params.abs_orbit, 9500);
    // Errors are not calculated.
    assert_eq!(params.ppg_error, -1.0);
    assert!(!params.needs_reinit(&header, flags, SdmfVersion::V30));

    params.init(&header, flags, SdmfVersion::V30, &keydata).unwrap();
    assert!(!params.init_file);

    assert!(params.needs_reinit(&header, flags | CalibFlags::CALC_ERROR, SdmfVersion::V30));
    assert!(params.needs_reinit(&header, flags, SdmfVersion::V24));
    let mut other = header.clone();
    other.product.push('x');
    assert!(params.needs_reinit(&other, flags, SdmfVersion::V30));

    let keydata = MemoryKeyData {
        sip: Some(Sip {
            ppg_error: 0.01,
            stray_error: 0.02,
            ..Sip::default()
        }),
        ..Default::default()
    };
    params
        .init(&header, flags | CalibFlags::CALC_ERROR, SdmfVersion::V30, &keydata)
        .unwrap();
    assert!(params.init_file);
    assert_eq!(params.ppg_error, 0.01);
    assert_eq!(params.stray_error, 0.02);
}

#[test]
fn test_decode_correction() {
    use super::memlin::decode_correction;

    assert_eq!(decode_correction(ScaleVariant::Old, 3, 10), 20.0);
    assert_eq!(decode_correction(ScaleVariant::Atbd, 3, 3), 50.0);
    assert_eq!(decode_correction(ScaleVariant::Patch, 5, -37), 0.0);
    assert_eq!(decode_correction(ScaleVariant::Old, 6, -2), 125.0);
    assert_eq!(decode_correction(ScaleVariant::Atbd, 7, 126), 0.0);
    assert_eq!(decode_correction(ScaleVariant::Atbd, 8, 127), 1.25);
}

#[test]
fn test_encoded_memory_correction() {
    let keydata = keydata();
    let mut rec = record(1, 3, 2, 1000.0);
    rec.coaddf = 2;
    rec.encoded_corr = Some(Array2::from_elem((2, 3), 3));
    let mut ir = record(6, 3, 2, 1000.0);
    ir.encoded_corr = Some(Array2::from_elem((2, 3), -2));
    let mut records = vec![rec, ir];
    // No tables are needed for encoded corrections.
    Run::new(&keydata)
        .calibrate(
            CalibFlags::VIS_MEM | CalibFlags::IR_NLIN,
            &nadir(1),
            &mut records,
        )
        .unwrap();
    // 2 * 1.25 * (3 + 37)
    assert!(records[0].pixel_val.iter().all(|&v| v == 900.0));
    // 1.25 * (-2 + 102)
    assert!(records[1].pixel_val.iter().all(|&v| v == 875.0));
}

#[test]
fn test_memory_correction_needs_tables() {
    let keydata = keydata();
    let mut records = vec![record(2, 3, 2, 1000.0)];
    let (stage, err) = failed_stage(Run::new(&keydata).calibrate(
        CalibFlags::VIS_MEM,
        &nadir(1),
        &mut records,
    ));
    assert_eq!(stage, Stage::MemoryCorrection);
    assert!(matches!(err, CalibrationError::MissingTables(Stage::MemoryCorrection)));
    assert_eq!(err.severity(), crate::error::Severity::Fatal);
}

#[test]
fn test_error_stops_the_pipeline() {
    // The ATBD dark needs the CLCP; the etalon after it must not run.
    let keydata = MemoryKeyData {
        ppg: Some(PpgGads {
            ppg_fact: Array1::ones(SCIENCE_PIXELS),
            etalon_fact: Array1::from_elem(SCIENCE_PIXELS, 2.0),
            bad_pixel: vec![0; SCIENCE_PIXELS],
        }),
        ..keydata()
    };
    let mut records = vec![record(1, 3, 1, 10.0)];
    let (stage, err) = failed_stage(Run::new(&keydata).calibrate(
        CalibFlags::DARK | CalibFlags::ETALON,
        &nadir(1),
        &mut records,
    ));
    assert_eq!(stage, Stage::Dark);
    assert!(matches!(err, CalibrationError::MissingKeyData("CLCP")));
    assert!(records[0].pixel_val.iter().all(|&v| v == 10.0));
}

#[test]
fn test_sron_dark_needs_database() {
    let keydata = keydata();
    let mut records = vec![record(1, 3, 1, 10.0)];
    let (stage, err) = failed_stage(Run::new(&keydata).calibrate(
        CalibFlags::DARK | CalibFlags::SRON_DARK,
        &nadir(1),
        &mut records,
    ));
    assert_eq!(stage, Stage::Dark);
    assert!(matches!(err, CalibrationError::MissingDatabase(Stage::Dark)));
}

#[test]
fn test_atbd_dark() {
    let keydata = MemoryKeyData {
        clcp: Some(Clcp {
            fpn: Array1::ones(SCIENCE_PIXELS),
            fpn_error: Array1::zeros(SCIENCE_PIXELS),
            lc: Array1::from_elem(SCIENCE_PIXELS, 2.0),
            lc_error: Array1::zeros(SCIENCE_PIXELS),
            mean_noise: Array1::zeros(SCIENCE_PIXELS),
        }),
        ..keydata()
    };
    let mut rec = record(1, 3, 2, 10.0);
    rec.coaddf = 2;
    rec.pet = 0.5;
    let mut records = vec![rec];
    let run = Run::new(&keydata);
    run.calibrate(CalibFlags::AO | CalibFlags::DARK, &nadir(1), &mut records)
        .unwrap();
    // coaddf * AO + coaddf * pet * LC
    assert!(records[0].pixel_val.iter().all(|&v| v == 6.0));

    // Only the analog offset.
    let mut records = vec![record(1, 3, 2, 10.0)];
    run.calibrate(CalibFlags::AO, &nadir(1), &mut records).unwrap();
    assert!(records[0].pixel_val.iter().all(|&v| v == 9.0));
}

#[test]
fn test_vlcp_interval() {
    let vlcp = |orbit_phase| Vlcp {
        orbit_phase,
        var_lc: Array1::zeros(3 * CHANNEL_SIZE),
        var_lc_error: Array1::zeros(3 * CHANNEL_SIZE),
        solar_stray: Array1::zeros(SCIENCE_PIXELS),
        solar_stray_error: Array1::zeros(SCIENCE_PIXELS),
    };
    let table = vec![vlcp(0.2), vlcp(0.6)];

    let (lo, hi, frac) = super::dark::vlcp_interval(&table, 0.6).unwrap();
    assert_eq!((lo, hi), (0, 1));
    assert_abs_diff_eq!(frac, 0.5, epsilon = 1e-5);

    // Wraps around the start of the orbit.
    let (lo, hi, frac) = super::dark::vlcp_interval(&table, 0.1).unwrap();
    assert_eq!((lo, hi), (1, 0));
    assert_abs_diff_eq!(frac, 0.5, epsilon = 1e-5);

    assert!(super::dark::vlcp_interval(&[], 0.5).is_none());
}

fn dark_average(channel: u8, pet: f32, value: f32) -> DarkAverage {
    let mut dark_spec = Array1::zeros(SCIENCE_PIXELS);
    let offs = usize::from(channel - 1) * CHANNEL_SIZE;
    dark_spec
        .slice_mut(ndarray::s![offs..offs + CHANNEL_SIZE])
        .fill(value);
    DarkAverage {
        state_id: 8,
        saa: false,
        setup: vec![ChannelSetup {
            channel,
            pet,
            coaddf: 1,
        }],
        dark_spec,
        sdev_dark_spec: Array1::zeros(SCIENCE_PIXELS),
    }
}

#[test]
fn test_state_dark_pet_interpolation() {
    let keydata = MemoryKeyData {
        dark_averages: vec![dark_average(1, 0.5, 10.0), dark_average(1, 1.5, 30.0)],
        ..keydata()
    };
    let run = Run::new(&keydata);
    let flags = CalibFlags::DARK | CalibFlags::ADARK;

    let mut rec = record(1, 3, 1, 100.0);
    rec.pet = 1.0;
    let mut exact = record(1, 3, 1, 100.0);
    exact.pet = 1.5;
    // Only one side: the nearest dark is used.
    let mut beyond = record(1, 3, 1, 100.0);
    beyond.pet = 2.0;
    // Channel 2 has no dark at all and is left alone.
    let mut none = record(2, 3, 1, 100.0);
    none.pet = 1.0;

    let mut records = vec![rec, exact, beyond, none];
    run.calibrate(flags, &nadir(8), &mut records).unwrap();
    assert_abs_diff_eq!(records[0].pixel_val[[0, 0]], 80.0, epsilon = 1e-4);
    assert_abs_diff_eq!(records[1].pixel_val[[0, 0]], 70.0, epsilon = 1e-4);
    assert_abs_diff_eq!(records[2].pixel_val[[0, 0]], 70.0, epsilon = 1e-4);
    assert_eq!(records[3].pixel_val[[0, 0]], 100.0);
}

#[test]
fn test_state_dark_error() {
    let mut avg = dark_average(1, 0.5, 10.0);
    avg.sdev_dark_spec.fill(2.0);
    let keydata = MemoryKeyData {
        dark_averages: vec![avg],
        sip: Some(Sip {
            electron_bu: [5.0; 8],
            ..Sip::default()
        }),
        ..Default::default()
    };
    let mut rec = record(1, 2, 1, 60.0);
    rec.pet = 0.5;
    let mut records = vec![rec];
    Run::new(&keydata)
        .calibrate(
            CalibFlags::DARK | CalibFlags::ADARK | CalibFlags::CALC_ERROR,
            &nadir(8),
            &mut records,
        )
        .unwrap();
    assert_abs_diff_eq!(records[0].pixel_val[[0, 0]], 50.0, epsilon = 1e-4);
    // The DARK_AVERAGE weight enters the noise: sdev^2 = (10 * 2)^2 / 10.
    // Shot noise (60 - 10) / 5 + 40, times 5, then the square root.
    assert_abs_diff_eq!(records[0].pixel_err[[0, 0]], 250f32.sqrt(), epsilon = 1e-3);
}

#[test]
fn test_limb_dark() {
    let limb = |state_id| {
        let mut rec = Mds1c::new(state_id, 0, 1, 0, 2, 4);
        rec.source = Source::Limb;
        rec.pet = 1.0;
        for (nobs, mut row) in rec.pixel_val.rows_mut().into_iter().enumerate() {
            row.fill(10.0 * (nobs + 1) as f32);
        }
        rec
    };

    // 0.5 + 1.5 / (coaddf * pet) readouts: the last two.
    let mut rec = limb(28);
    assert_eq!(super::dark::apply_limb_dark(&mut rec), 2);
    assert_eq!(rec.pixel_val.column(0).to_vec(), vec![-25.0, -15.0, -5.0, 5.0]);

    // State 27 has its dark readouts at the start.
    let mut rec = limb(27);
    assert_eq!(super::dark::apply_limb_dark(&mut rec), 2);
    assert_eq!(rec.pixel_val.column(1).to_vec(), vec![-5.0, 5.0, 15.0, 25.0]);
}

#[test]
fn test_ppg_and_etalon() {
    let mut ppg_fact = Array1::from_elem(SCIENCE_PIXELS, 2.0);
    ppg_fact[1] = 0.0;
    let keydata = MemoryKeyData {
        ppg: Some(PpgGads {
            ppg_fact,
            etalon_fact: Array1::from_elem(SCIENCE_PIXELS, 0.5),
            bad_pixel: vec![0; SCIENCE_PIXELS],
        }),
        ..keydata()
    };
    let run = Run::new(&keydata);
    let mut records = vec![record(1, 3, 1, 8.0)];
    run.calibrate(CalibFlags::CORR_PPG, &nadir(1), &mut records)
        .unwrap();
    assert_eq!(records[0].pixel_val.row(0).to_vec(), vec![4.0, 0.0, 4.0]);

    run.calibrate(CalibFlags::ETALON, &nadir(1), &mut records)
        .unwrap();
    assert_eq!(records[0].pixel_val.row(0).to_vec(), vec![8.0, 0.0, 8.0]);
}

#[test]
fn test_sron_ppg_without_sdmf_data() {
    let keydata = keydata();
    let sdmf = MemorySdmfKeyData::default();
    let mut run = Run::new(&keydata);
    run.sdmf_keydata = Some(&sdmf);
    let mut records = vec![record(8, 3, 1, 8.0)];
    run.calibrate(
        CalibFlags::CORR_PPG | CalibFlags::SRON_PPG,
        &nadir(1),
        &mut records,
    )
    .unwrap();
    assert!(records[0].pixel_val.iter().all(|&v| v == 8.0));
}

#[test]
fn test_straylight() {
    let keydata = MemoryKeyData {
        sip: Some(Sip {
            stray_error: 0.1,
            ..Sip::default()
        }),
        ..Default::default()
    };
    let mut rec = record(3, 2, 2, 50.0);
    rec.stray = Some(Array2::from_elem((2, 2), 20));
    rec.stray_scale = 5;
    rec.pixel_err.fill(1.0);
    let mut records = vec![rec, record(3, 2, 2, 50.0)];
    Run::new(&keydata)
        .calibrate(
            CalibFlags::STRAY | CalibFlags::SRON_NOISE | CalibFlags::CALC_ERROR,
            &nadir(1),
            &mut records,
        )
        .unwrap();
    assert!(records[0].pixel_val.iter().all(|&v| v == 40.0));
    // 1 + (0.1 * 0.5 * 20)^2
    assert!(records[0].pixel_err.iter().all(|&e| (e - 2.0).abs() < 1e-6));
    // No straylight, nothing to do.
    assert!(records[1].pixel_val.iter().all(|&v| v == 50.0));
}

/// BASE wavelengths equal to the pixel number and one SCP record that
/// shifts channel 1 by 1 nm.
fn wave_keydata() -> MemoryKeyData {
    let mut coeffs = [0.0; 5 * 8];
    coeffs[0] = 1.0;
    let mut wv_error_calib = [0.0; 8];
    wv_error_calib[0] = 0.01;
    MemoryKeyData {
        base: Some(Array1::from_shape_fn(SCIENCE_PIXELS, |i| i as f32)),
        scp: vec![Scp {
            orbit_phase: 0.0,
            coeffs,
            wv_error_calib,
        }],
        ..keydata()
    }
}

#[test]
fn test_wavelength_grid() {
    let keydata = wave_keydata();
    let grid = WaveGrid::new(&keydata, 0.3).unwrap();
    assert_eq!(grid.science[0], 1.0);
    assert_eq!(grid.science[1023], 1024.0);
    assert_eq!(grid.science[1024], 1024.0);
    assert_eq!(grid.error[5], 0.01);
    assert_eq!(grid.error[2000], 0.0);

    let mut records = vec![Mds1c::new(1, 0, 2, 10, 2, 1)];
    Run::new(&keydata)
        .calibrate(CalibFlags::CALIB_WAVE, &nadir(1), &mut records)
        .unwrap();
    assert_eq!(records[0].pixel_wv.to_vec(), vec![1034.0, 1035.0]);

    let missing = keydata_without_scp();
    assert!(matches!(
        WaveGrid::new(&missing, 0.3),
        Err(CalibrationError::MissingKeyData("SCP"))
    ));
}

fn keydata_without_scp() -> MemoryKeyData {
    MemoryKeyData {
        scp: vec![],
        ..wave_keydata()
    }
}

#[test]
fn test_radiance_and_polarisation() {
    let keydata = MemoryKeyData {
        rspn: vec![
            Rspn {
                ang_esm: 10.0,
                sensitivity: Array1::from_elem(SCIENCE_PIXELS, 2.0),
            },
            Rspn {
                ang_esm: -10.0,
                sensitivity: Array1::from_elem(SCIENCE_PIXELS, 4.0),
            },
        ],
        pspn: vec![Pspn {
            ang_esm: 0.0,
            mu2: Array1::from_elem(SCIENCE_PIXELS, 0.5),
            mu3: Array1::zeros(SCIENCE_PIXELS),
        }],
        sip: Some(Sip {
            alpha0_esm: 360.0,
            ..Sip::default()
        }),
        ..wave_keydata()
    };
    let run = Run::new(&keydata);

    // ESM angle 0: halfway between the two RSPN records.
    let mut rec = record(1, 2, 1, 3.0);
    rec.pet = 0.5;
    let mut limb = record(1, 2, 1, 3.0);
    limb.source = Source::Limb;
    let mut records = vec![rec, limb];
    run.calibrate(CalibFlags::RAD, &nadir(1), &mut records)
        .unwrap();
    assert_abs_diff_eq!(records[0].pixel_val[[0, 0]], 2.0, epsilon = 1e-6);
    assert_eq!(records[0].rad_units, -1);
    assert_eq!(records[1].pixel_val[[0, 0]], 3.0);

    let mut rec = record(1, 2, 1, 3.0);
    rec.polarisation = Some(Polarisation {
        q: Array2::ones((1, 2)),
        u: Array2::zeros((1, 2)),
    });
    // Without polarisation values the record is left alone.
    let mut records = vec![rec, record(1, 2, 1, 3.0)];
    run.calibrate(CalibFlags::POL, &nadir(1), &mut records)
        .unwrap();
    assert_abs_diff_eq!(records[0].pixel_val[[0, 1]], 2.0, epsilon = 1e-6);
    assert_eq!(records[1].pixel_val[[0, 1]], 3.0);
}

fn srs_keydata(mean_sun: Array1<f32>) -> MemoryKeyData {
    MemoryKeyData {
        srs: vec![Srs {
            wvlen_sun: Array1::from_shape_fn(SCIENCE_PIXELS, |i| i as f32),
            mean_sun,
            dopp_shift: 0.0,
        }],
        ..keydata()
    }
}

fn reflectance_record(source: Source) -> Mds1c {
    let mut rec = record(1, 3, 1, 4.0);
    rec.source = source;
    rec.pixel_wv = array![0.0, 1.0, 2.0];
    rec
}

#[test]
fn test_reflectance() {
    let mut mean_sun = Array1::from_elem(SCIENCE_PIXELS, 2.0);
    mean_sun[1] = 0.0;
    let keydata = srs_keydata(mean_sun);
    let mut nadir_rec = reflectance_record(Source::Nadir);
    nadir_rec.geometry[0].sun_zenith = 60.0;
    let mut records = vec![nadir_rec, reflectance_record(Source::Limb)];
    records[1].pixel_val[[0, 2]] = 0.0;
    Run::new(&keydata)
        .calibrate(CalibFlags::DIVIDE_SUN, &nadir(1), &mut records)
        .unwrap();

    let pi = std::f32::consts::PI;
    // π I / (cos(60°) S)
    assert_abs_diff_eq!(records[0].pixel_val[[0, 0]], 4.0 * pi, epsilon = 1e-4);
    assert!(records[0].pixel_val[[0, 1]].is_nan());
    assert_abs_diff_eq!(records[1].pixel_val[[0, 0]], 2.0 * pi, epsilon = 1e-4);
    // A zero signal is not normal.
    assert!(records[1].pixel_val[[0, 2]].is_nan());
}

#[test]
fn test_sron_reflectance_needs_smr() {
    let keydata = srs_keydata(Array1::from_elem(SCIENCE_PIXELS, 2.0));
    let empty = MemorySdmfKeyData::default();
    let sdmf = MemorySdmfKeyData {
        smr: BTreeMap::from([(9000, Array1::from_elem(SCIENCE_PIXELS, 4.0))]),
        ..Default::default()
    };
    let mut run = Run::new(&keydata);
    run.sdmf_keydata = Some(&empty);
    let flags = CalibFlags::DIVIDE_SUN | CalibFlags::SRON_SUN;
    let mut records = vec![reflectance_record(Source::Monitor)];
    let (stage, err) = failed_stage(run.calibrate(flags, &nadir(1), &mut records));
    assert_eq!(stage, Stage::Reflectance);
    assert!(matches!(err, CalibrationError::NoSolarSpectrum(9500)));

    run.sdmf_keydata = Some(&sdmf);
    let mut records = vec![reflectance_record(Source::Monitor)];
    run.calibrate(flags, &nadir(1), &mut records).unwrap();
    assert_abs_diff_eq!(
        records[0].pixel_val[[0, 0]],
        std::f32::consts::PI,
        epsilon = 1e-4
    );
}

#[test]
fn test_bad_pixel_mask() {
    let mut bad_pixel = vec![0; SCIENCE_PIXELS];
    bad_pixel[1] = 1;
    let keydata = MemoryKeyData {
        ppg: Some(PpgGads {
            ppg_fact: Array1::ones(SCIENCE_PIXELS),
            etalon_fact: Array1::ones(SCIENCE_PIXELS),
            bad_pixel,
        }),
        ..keydata()
    };
    let mut sdmf_mask = vec![0; SCIENCE_PIXELS];
    sdmf_mask[2] = 1;
    let sdmf = MemorySdmfKeyData {
        bdpm: BTreeMap::from([(FIRST_VALID_SDMF_BDPM, sdmf_mask)]),
        ..Default::default()
    };
    let empty = MemorySdmfKeyData::default();
    let mut run = Run::new(&keydata);
    let mut records = vec![record(1, 3, 2, 5.0)];
    run.calibrate(CalibFlags::MASK_BDPM, &nadir(1), &mut records)
        .unwrap();
    let col = records[0].pixel_val.column(1).to_owned();
    assert!(col.iter().all(|v| v.is_nan()));
    assert!(records[0].pixel_val.column(0).iter().all(|&v| v == 5.0));

    // The SDMF mask replaces the product mask.
    run.sdmf_keydata = Some(&sdmf);
    let mut records = vec![record(1, 3, 2, 5.0)];
    run.calibrate(
        CalibFlags::MASK_BDPM | CalibFlags::SRON_BDPM,
        &nadir(1),
        &mut records,
    )
    .unwrap();
    assert!(records[0].pixel_val.column(2).iter().all(|v| v.is_nan()));
    assert!(records[0].pixel_val.column(1).iter().all(|&v| v == 5.0));

    // No SDMF mask: the product mask is used.
    run.sdmf_keydata = Some(&empty);
    let mut records = vec![record(1, 3, 2, 5.0)];
    run.calibrate(
        CalibFlags::MASK_BDPM | CalibFlags::SRON_BDPM,
        &nadir(1),
        &mut records,
    )
    .unwrap();
    assert!(records[0].pixel_val.column(1).iter().all(|v| v.is_nan()));
}

#[test]
fn test_transmission_average() {
    use super::trans::transmission_average;

    let trans = [f32::NAN, 4.0, f32::NAN, 2.0, 3.0];
    // NaNs become 1 and 0: [1, 4, 0, 2, 3], the third smallest is 2.
    assert_eq!(transmission_average(&trans, 0..=4), Some(2.0));
    assert_eq!(transmission_average(&trans, 1..=1), Some(4.0));
    assert_eq!(transmission_average(&trans, 3..=4), Some(2.0));
    assert_eq!(transmission_average(&trans, 3..=9), None);
}

#[test]
fn test_transmission_correction() {
    let keydata = keydata();
    let mut trans = Array1::ones(CHANNEL_SIZE);
    trans.slice_mut(ndarray::s![0..5]).assign(&array![f32::NAN, 4.0, f32::NAN, 2.0, 3.0]);
    let sdmf = MemorySdmfKeyData {
        transmission: BTreeMap::from([(9000, trans)]),
        ..Default::default()
    };
    let empty = MemorySdmfKeyData::default();
    let mut run = Run::new(&keydata);
    run.config.trans_range = 0..=4;
    run.sdmf_keydata = Some(&sdmf);
    let mut records = vec![record(8, 3, 1, 10.0), record(3, 3, 1, 10.0)];
    run.calibrate(CalibFlags::SRON_TRANS, &nadir(1), &mut records)
        .unwrap();
    assert!(records.iter().all(|r| r.pixel_val.iter().all(|&v| v == 5.0)));

    // No transmission for the orbit: nothing happens.
    run.sdmf_keydata = Some(&empty);
    let mut records = vec![record(8, 3, 1, 10.0)];
    run.calibrate(CalibFlags::SRON_TRANS, &nadir(1), &mut records)
        .unwrap();
    assert!(records[0].pixel_val.iter().all(|&v| v == 10.0));
}

#[test]
fn test_flag_names_round_trip() {
    let flags: CalibFlags = "VIS_MEM,DARK,ADARK".parse().unwrap();
    assert_eq!(flags, CalibFlags::VIS_MEM | CalibFlags::DARK | CalibFlags::ADARK);
    assert!("NOT_A_FLAG".parse::<CalibFlags>().is_err());
}

#[test]
fn test_flag_bits_and_names() {
    assert_eq!(CalibFlags::VIS_MEM.bits(), 0x1);
    assert_eq!(CalibFlags::ADARK.bits(), 0x100);
    assert_eq!(CalibFlags::SRON_TRANS.bits(), 0x800_0000);
    assert_eq!(CalibFlags::MFAC_H5_RAD.bits(), 0x8000_0000);
    assert_eq!(CalibFlags::all().bits(), u32::MAX);
    assert_eq!(CalibFlags::ATBD.bits(), 0x0055_5875);

    // Names come out in bit order, predefined sets are never named.
    let flags = CalibFlags::SRON_NOISE | CalibFlags::VIS_MEM | CalibFlags::DARK;
    assert_eq!(flags.names(), ["VIS_MEM", "DARK", "SRON_NOISE"]);
    assert_eq!(flags.to_string(), "VIS_MEM,DARK,SRON_NOISE");
    assert_eq!(CalibFlags::NONE.to_string(), "NONE");
    assert_eq!(CalibFlags::all().names().len(), 32);
    assert!(FLAG_NAMES.starts_with("VIS_MEM, SRON_MEM_NLIN, IR_NLIN"));

    assert_eq!("atbd".parse::<CalibFlags>().unwrap(), CalibFlags::ATBD);
    assert_eq!(
        " sron , sron_noise".parse::<CalibFlags>().unwrap(),
        CalibFlags::SRON | CalibFlags::SRON_NOISE
    );
    assert_eq!("".parse::<CalibFlags>().unwrap(), CalibFlags::NONE);
    assert_eq!(CalibFlags::default(), CalibFlags::NONE);
}

#[test]
fn test_empty_mask_runs_no_stage() {
    // Every set contains the empty set; no stage may be selected by it.
    assert!(CalibFlags::ATBD.contains(CalibFlags::NONE));
    assert!(!CalibFlags::ATBD.intersects(CalibFlags::NONE));
    assert!(Pipeline::from_flags(CalibFlags::NONE).stages().is_empty());
    assert_eq!(
        Pipeline::from_flags(CalibFlags::NONE).dark,
        DarkStrategy::Atbd
    );
}
