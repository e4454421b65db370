// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use tempfile::TempDir;

use sciacal::lv0::{PacketType, CHANNEL_SYNC, CLUSTER_SYNC};

use crate::{get_cmd_output, json_line, sciacal};

/// A detector packet of state 8 with channel 1 holding one cluster of three
/// samples.
fn det_packet(secnd: u32) -> Vec<u8> {
    let mut v = vec![];
    // Data field header.
    v.write_u16::<BigEndian>(0).unwrap();
    v.push(1);
    v.push(8);
    v.write_u32::<BigEndian>(secnd * 16).unwrap();
    v.write_u16::<BigEndian>(0).unwrap();
    v.write_u16::<BigEndian>((PacketType::Det as u16) << 12)
        .unwrap();
    // BCPS, PMTC header, orbit vector and number of channels.
    v.write_u16::<BigEndian>(12).unwrap();
    v.extend([0; 18]);
    v.extend([0; 32]);
    v.write_u16::<BigEndian>(1).unwrap();
    // Channel header.
    v.write_u16::<BigEndian>(CHANNEL_SYNC).unwrap();
    v.write_u16::<BigEndian>((1 << 12) | 1).unwrap();
    v.write_u16::<BigEndian>(12).unwrap();
    v.write_u32::<BigEndian>(0).unwrap();
    v.extend([0; 6]);
    // Cluster.
    v.write_u16::<BigEndian>(CLUSTER_SYNC).unwrap();
    v.write_u16::<BigEndian>(0).unwrap();
    v.push(2);
    v.push(1);
    v.write_u16::<BigEndian>(0).unwrap();
    v.write_u16::<BigEndian>(3).unwrap();
    for s in [100, 200, 300] {
        v.write_u16::<BigEndian>(s).unwrap();
    }

    let mut packet = vec![];
    // Annotation.
    packet.write_i32::<BigEndian>(1000).unwrap();
    packet.write_u32::<BigEndian>(10).unwrap();
    packet.write_u32::<BigEndian>(0).unwrap();
    packet.extend([0; 20]);
    // Packet header.
    packet.write_u16::<BigEndian>(0x036A).unwrap();
    packet.write_u16::<BigEndian>(0).unwrap();
    packet
        .write_u16::<BigEndian>((v.len() - 1) as u16)
        .unwrap();
    packet.extend(v);
    packet
}

fn write_stream(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    for i in 0..3 {
        f.write_all(&det_packet(10 + i)).unwrap();
    }
    path
}

#[test]
fn test_lv0_dump_text() {
    let dir = TempDir::new().unwrap();
    let path = write_stream(&dir, "state8.lv0");
    let cmd = sciacal()
        .args(["lv0-dump", &path.display().to_string()])
        .ok();
    let failed = cmd.is_err();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(!failed, "{stderr}");
    assert!(stdout.contains("1 states"), "{stdout}");
    assert!(stdout.contains("state 08 (#1)"), "{stdout}");
    assert!(stdout.contains("3 DET, 0 AUX, 0 PMD packets"), "{stdout}");
    assert!(stdout.contains("channel 1 PET 0.03125 s"), "{stdout}");
}

#[test]
fn test_lv0_dump_json() {
    let dir = TempDir::new().unwrap();
    let path = write_stream(&dir, "state8.lv0");
    let cmd = sciacal()
        .args(["lv0-dump", "--json", &path.display().to_string()])
        .ok();
    let failed = cmd.is_err();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(!failed, "{stderr}");

    let json: serde_json::Value = serde_json::from_str(json_line(&stdout)).unwrap();
    let state = &json[0]["states"][0];
    assert_eq!(state["num_det"], 3);
    assert_eq!(state["housekeeping"]["state_id"], 8);
    assert_eq!(state["pet"][0]["channel"], 1);
    assert_eq!(state["pet"][0]["pet"]["pet"][0], 0.03125);
}

#[test]
fn test_lv0_dump_continues_after_a_bad_file() {
    let dir = TempDir::new().unwrap();
    let good = write_stream(&dir, "good.lv0");
    let truncated = dir.path().join("truncated.lv0");
    std::fs::write(&truncated, &det_packet(10)[..50]).unwrap();

    let cmd = sciacal()
        .args([
            "lv0-dump",
            &truncated.display().to_string(),
            &good.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (stdout, stderr) = get_cmd_output(cmd);
    // The good file is still decoded.
    assert!(stdout.contains("state 08 (#1)"), "{stdout}");
    assert!(
        stderr.contains("1 of 2 files could not be decoded"),
        "{stderr}"
    );
}
