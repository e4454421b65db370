// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;
use crate::{
    error::Severity,
    lv0::{
        Bcp, BenchWord, ChannelHeader, DetSrc, Mjd, PmdPacket, AUX_SYNC, CHANNEL_SYNC, PMD_SYNC,
    },
};

fn isp() -> Mjd {
    Mjd {
        days: 1000,
        secnd: 10,
        musec: 500_000,
    }
}

fn channel(id: u8, command: u32, temp: u16) -> ChannelHeader {
    ChannelHeader {
        sync: CHANNEL_SYNC,
        channel: u16::from(id) << 12,
        bcps: 12,
        command,
        temp,
        ..Default::default()
    }
}

fn det(state_id: u8, channels: &[(u8, u16)]) -> Mds0Det {
    let mut det = Mds0Det::default();
    det.annotation.isp = isp();
    det.data_hdr.state_id = state_id;
    det.data_src = channels
        .iter()
        .map(|&(id, temp)| DetSrc {
            hdr: channel(id, 0, temp),
            clusters: vec![],
        })
        .collect();
    det
}

fn aux(config_id: u8, bench: u16) -> Mds0Aux {
    let mut aux = Mds0Aux::default();
    aux.annotation.isp = isp();
    aux.data_hdr.state_id = 8;
    aux.data_hdr.rdv = u16::from(config_id);
    for frame in aux.frames.iter_mut() {
        frame.bench_rad = BenchWord(bench);
        frame.bench_elv = BenchWord(bench);
        frame.bench_az = BenchWord(bench);
        for (i, bcp) in frame.bcp.iter_mut().enumerate() {
            *bcp = Bcp {
                sync: AUX_SYNC,
                bcps: i as u16,
                // azimuth 0x12345, elevation 0x6789A
                encoder: [0x12, 0x34, 0x50, 0x06, 0x78, 0x9A],
                ..Default::default()
            };
        }
    }
    aux
}

fn pmd(temp: u16) -> Mds0Pmd {
    let mut pmd = Mds0Pmd::default();
    pmd.annotation.isp = isp();
    pmd.data_hdr.state_id = 8;
    pmd.temp = temp;
    pmd.packets = vec![PmdPacket::default(); 200];
    pmd
}

#[test]
fn test_bench_temperature() {
    assert_abs_diff_eq!(
        bench_temperature(BenchSensor::Radiator, BenchWord(0x1000)),
        303.203128571705,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        bench_temperature(BenchSensor::Elevation, BenchWord(0x0800)),
        345.63980159072037,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        bench_temperature(BenchSensor::Azimuth, BenchWord(0x0C00)),
        315.988611609395,
        epsilon = 1e-9
    );

    // Status bit set.
    assert!(bench_temperature(BenchSensor::Radiator, BenchWord(0x1001)).is_nan());
    // A zero code gives a negative resistance.
    assert!(bench_temperature(BenchSensor::Radiator, BenchWord(0)).is_nan());
}

#[test]
fn test_aux_temperatures() {
    let temps = aux_temperatures(&aux(0, 0x0C00));
    for t in temps {
        assert_abs_diff_eq!(t, 316.5371788695644, epsilon = 1e-3);
    }
    assert!(aux_temperatures(&aux(0, 0)).iter().all(|t| t.is_nan()));
}

#[test]
fn test_obm_temperature_modes() {
    let packets = [aux(0, 0x0C00), aux(0, 0x0C00)];
    assert_abs_diff_eq!(
        state_obm_temperature(&packets, ObmMode::Sost),
        313.7811192535067,
        epsilon = 1e-3
    );
    assert_abs_diff_eq!(
        state_obm_temperature(&packets, ObmMode::Legacy),
        316.68861160939497,
        epsilon = 1e-3
    );

    // Invalid frames don't count.
    let mut mixed = aux(0, 0x0C00);
    mixed.frames[0].bench_az = BenchWord(1);
    mixed.frames[1].bench_elv = BenchWord(1);
    assert_abs_diff_eq!(
        state_obm_temperature(&[mixed], ObmMode::Sost),
        313.7811192535067,
        epsilon = 1e-3
    );

    assert!(state_obm_temperature(&[], ObmMode::Sost).is_nan());
    assert!(state_obm_temperature(&[aux(0, 0)], ObmMode::Legacy).is_nan());
}

#[test]
fn test_detector_temperature_table() {
    // Exactly on the first entry.
    assert_abs_diff_eq!(detector_temperature(1, 0).unwrap(), 179.0);
    // Exactly on the second entry and half way to the third.
    assert_abs_diff_eq!(detector_temperature(1, 17876).unwrap(), 180.0);
    assert_abs_diff_eq!(detector_temperature(1, 18094).unwrap(), 182.5);
    // The last entry.
    assert_abs_diff_eq!(detector_temperature(8, 65535).unwrap(), 331.0);
    assert_abs_diff_eq!(detector_temperature(3, 20601).unwrap(), 210.0);
    assert_abs_diff_eq!(detector_temperature(7, 12994).unwrap(), 130.0);

    let err = detector_temperature(9, 100).unwrap_err();
    assert_eq!(err, HousekeepingError::InvalidChannelId(9));
    assert_eq!(err.severity(), Severity::Warning);
    assert!(detector_temperature(0, 100).is_err());
}

#[test]
fn test_pmd_temperature_clamps() {
    assert_abs_diff_eq!(pmd_temperature(&pmd(1008)), 273.15 + 60.0, epsilon = 1e-4);
    // Below the first entry: no extrapolation.
    assert_abs_diff_eq!(pmd_temperature(&pmd(500)), 273.15 + 60.0, epsilon = 1e-4);
    assert_abs_diff_eq!(pmd_temperature(&pmd(1385)), 273.15 + 52.5, epsilon = 1e-4);
    // The last entry and above it.
    assert_abs_diff_eq!(pmd_temperature(&pmd(30884)), 273.15 - 55.0, epsilon = 1e-4);
    assert_abs_diff_eq!(pmd_temperature(&pmd(40000)), 273.15 - 55.0, epsilon = 1e-4);
}

#[test]
fn test_state_det_temperatures_skip_absent_channels() {
    let packets = [det(8, &[(1, 17876), (3, 20601)]), det(8, &[(1, 18312)])];
    let temps = state_det_temperatures(&packets);
    assert_abs_diff_eq!(temps[0], 182.5);
    assert!(temps[1].is_nan());
    assert_abs_diff_eq!(temps[2], 210.0);
    assert!(temps[7].is_nan());

}

#[test]
fn test_det_temperatures_bad_channel_id_is_nan() {
    // Channel IDs 0 and 12 can't be placed; the valid channel is kept.
    let packet = det(8, &[(0, 100), (3, 20601), (12, 0)]);
    let temps = det_temperatures(&packet);
    assert_abs_diff_eq!(temps[2], 210.0);
    assert!(temps
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 2)
        .all(|(_, t)| t.is_nan()));

    // A state whose only packet has a bad ID averages to NaN.
    let temps = state_det_temperatures(&[det(8, &[(12, 0)])]);
    assert!(temps.iter().all(|t| t.is_nan()));
}

#[test]
fn test_readout_delay() {
    assert_abs_diff_eq!(readout_delay(1).unwrap(), 86.0 / 256.0);
    assert_abs_diff_eq!(readout_delay(59).unwrap(), 111.0 / 256.0);
    assert_abs_diff_eq!(readout_delay(61).unwrap(), 303.0 / 256.0);
    assert_abs_diff_eq!(readout_delay(69).unwrap(), 111.0 / 256.0);
    assert_abs_diff_eq!(readout_delay(70).unwrap(), 303.0 / 256.0);
    assert_eq!(
        readout_delay(0).unwrap_err(),
        HousekeepingError::InvalidStateId(0)
    );
    assert!(readout_delay(71).is_err());
}

#[test]
fn test_packet_times() {
    let base = 10.5 + 86.0 / 256.0;

    let d = det(8, &[(1, 0)]);
    assert_abs_diff_eq!(
        det_time(&d).unwrap(),
        1000.0 + (base + 12.0 / 16.0) / 86400.0,
        epsilon = 1e-12
    );

    // The first BCP has bcps 0.
    let mut a = aux(0, 0);
    assert_abs_diff_eq!(aux_time(&a).unwrap(), 1000.0 + base / 86400.0, epsilon = 1e-12);
    a.frames[0].bcp[0].sync = 0;
    assert_abs_diff_eq!(
        aux_time(&a).unwrap(),
        1000.0 + (base + 1.0 / 16.0) / 86400.0,
        epsilon = 1e-12
    );
    let times = aux_times(&a).unwrap();
    assert_eq!(times.len(), 80);
    assert!(times[0].is_nan());
    assert!(times[1].is_finite());

    for frame in a.frames.iter_mut() {
        for bcp in frame.bcp.iter_mut() {
            bcp.sync = 0;
        }
    }
    assert!(aux_time(&a).unwrap().is_nan());

    let mut p = pmd(0);
    assert!(pmd_time(&p).unwrap().is_nan());
    p.packets[3] = PmdPacket {
        sync: PMD_SYNC,
        bcps: 32,
        time: 7,
        ..Default::default()
    };
    let delay = (7.0 / 500.0 - 12.5) / 1e3 + 2.0;
    assert_abs_diff_eq!(
        pmd_time(&p).unwrap(),
        1000.0 + (base + delay) / 86400.0,
        epsilon = 1e-12
    );
    let times = pmd_times(&p).unwrap();
    assert_eq!(times.len(), 200);
    assert_eq!(times.iter().filter(|t| t.is_finite()).count(), 1);
}

#[test]
fn test_jday_to_epoch() {
    let epoch = jday_to_epoch(0.5).unwrap();
    assert_abs_diff_eq!(epoch.to_mjd_utc_days(), 51544.5, epsilon = 1e-9);
    assert!(jday_to_epoch(f64::NAN).is_none());
}

#[test]
fn test_scan_angles() {
    let (asm, esm) = scan_angles(&aux(3, 0));
    assert_eq!(asm.len(), 80);
    assert_abs_diff_eq!(asm[0], -66.2386175, epsilon = 1e-4);
    assert_abs_diff_eq!(esm[0], 219.316625, epsilon = 1e-4);

    let (asm, esm) = scan_angles(&aux(2, 0));
    assert_abs_diff_eq!(asm[5], -18.18943 + 41.9428125, epsilon = 1e-4);
    assert_abs_diff_eq!(esm[5], -109.2425 + 238.550625, epsilon = 1e-4);

    let mut a = aux(3, 0);
    a.frames[0].bcp[0].sync = 0;
    a.frames[0].bcp[1].encoder = [0, 0, 0, 0x06, 0x78, 0x9A];
    let (asm, esm) = scan_angles(&a);
    assert!(asm[0].is_nan() && esm[0].is_nan());
    assert!(asm[1].is_nan());
    assert!(esm[1].is_finite());

    // The half-valid BCP doesn't enter the average.
    let (asm_avg, esm_avg) = state_angles(&[a]);
    assert_abs_diff_eq!(asm_avg, -66.2386175, epsilon = 1e-3);
    assert_abs_diff_eq!(esm_avg, 219.316625, epsilon = 1e-3);

    let (asm_avg, esm_avg) = state_angles(&[]);
    assert!(asm_avg.is_nan() && esm_avg.is_nan());
}

fn vis_command(etf: u32, sec: u32, ratio: u32) -> u32 {
    (etf << 18) | (sec << 7) | (ratio << 2)
}

fn ir_command(etf: u32, mode: u32, pet: u32) -> u32 {
    (etf << 18) | (mode << 16) | (pet << 2)
}

#[test]
fn test_pet_visible_channels() {
    let pet = det_pet(&channel(2, vis_command(0, 0, 0), 0));
    assert_abs_diff_eq!(pet.pet[0], 31.25e-3);
    assert!(pet.pet[1].is_nan());
    assert_eq!(pet.vir_chan_b, 0);

    let pet = det_pet(&channel(5, vis_command(4, 1, 2), 0));
    assert_abs_diff_eq!(pet.pet[0], 0.25);
    assert_eq!(pet.vir_chan_b, 0);

    // A virtual channel.
    let pet = det_pet(&channel(1, vis_command(4, 3, 2), 0));
    assert_abs_diff_eq!(pet.pet[0], 0.5);
    assert_abs_diff_eq!(pet.pet[1], 0.25);
    assert_eq!(pet.vir_chan_b, 6);
}

#[test]
fn test_pet_infrared_channels() {
    let pet = det_pet(&channel(6, ir_command(0, 0, 0), 0));
    assert_abs_diff_eq!(pet.pet[0], 31.25e-3);

    let pet = det_pet(&channel(7, ir_command(2, 0, 9), 0));
    assert_abs_diff_eq!(pet.pet[0], 0.125);

    // Hot mode.
    let pet = det_pet(&channel(8, ir_command(2, 1, 4), 0));
    assert_abs_diff_eq!(pet.pet[0], 4.5e-4, epsilon = 1e-9);
    assert_eq!(pet.vir_chan_b, 0);

    let pet = det_pet(&channel(8, ir_command(2, 2, 4), 0));
    assert!(pet.pet[0].is_nan());
}

#[test]
fn test_pet_bad_sync_is_nan() {
    let mut hdr = channel(1, vis_command(4, 0, 0), 0);
    hdr.sync = 0x1234;
    let pet = det_pet(&hdr);
    assert!(pet.pet[0].is_nan() && pet.pet[1].is_nan());
    assert_eq!(
        HousekeepingError::ChannelSync(0x1234).severity(),
        Severity::Warning
    );
}

#[test]
fn test_state_summary() {
    let summary = StateHousekeeping::new(
        &[aux(3, 0x0C00)],
        &[det(8, &[(1, 17876)])],
        &[pmd(1008)],
        ObmMode::Sost,
    )
    .unwrap()
    .unwrap();
    assert_eq!(summary.state_id, 8);
    assert_abs_diff_eq!(summary.det_temp[0], 180.0);
    assert_abs_diff_eq!(summary.pmd_temp, 333.15, epsilon = 1e-4);
    assert_abs_diff_eq!(summary.asm_angle, -66.2386175, epsilon = 1e-3);

    assert!(StateHousekeeping::new(&[], &[], &[], ObmMode::Sost)
        .unwrap()
        .is_none());
}
