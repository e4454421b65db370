// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use indoc::indoc;

use crate::{get_cmd_output, json_line, sciacal};

#[test]
fn test_flags_text() {
    let cmd = sciacal().args(["flags", "VIS_MEM,dark"]).ok();
    let failed = cmd.is_err();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(!failed, "{stderr}");

    let expected = indoc! {"
        Calibration mask: 0x00000021 (33)
        Flags: VIS_MEM,DARK
        Stages: memory correction, dark correction
        Variants: dark Atbd, PPG Atbd, reflectance Atbd, BDPM Atbd
    "};
    for line in expected.lines() {
        assert!(stdout.contains(line), "missing '{line}' in:\n{stdout}");
    }
}

#[test]
fn test_flags_json() {
    let cmd = sciacal()
        .args(["flags", "--json", "SRON_NOISE,CALC_ERROR,ADARK"])
        .ok();
    let failed = cmd.is_err();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(!failed, "{stderr}");

    let json: serde_json::Value = serde_json::from_str(json_line(&stdout)).unwrap();
    assert_eq!(json["mask"], 0x100 | 0x2000000 | 0x4000000);
    // ADARK alone selects no dark stage; the noise replaces the accuracy.
    assert_eq!(json["stages"], serde_json::json!(["SRON noise"]));
}

#[test]
fn test_flags_unknown_name() {
    let cmd = sciacal().args(["flags", "VIS_MEM,BOGUS"]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Unknown calibration flag 'BOGUS'"), "{stderr}");
}
