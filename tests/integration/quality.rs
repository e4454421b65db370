// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use indoc::indoc;

use crate::{get_cmd_output, json_line, sciacal};

#[test]
fn test_quality_text() {
    let cmd = sciacal()
        .args(["quality", "14890", "9500", "9890", "10000"])
        .ok();
    let failed = cmd.is_err();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(!failed, "{stderr}");

    let expected = indoc! {"
        14890: UNAVAIL (3) in 14882-14898
        9500: DECON (1) in 9407-9673
        9890: RECOVER (2) in 9883-9899
        10000: OK (0)
    "};
    for line in expected.lines() {
        assert!(stdout.contains(line), "missing '{line}' in:\n{stdout}");
    }
}

#[test]
fn test_quality_json() {
    let cmd = sciacal().args(["quality", "--json", "9420"]).ok();
    let failed = cmd.is_err();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(!failed, "{stderr}");

    let json: serde_json::Value = serde_json::from_str(json_line(&stdout)).unwrap();
    assert_eq!(json[0]["orbit"], 9420);
    assert_eq!(json[0]["class"], "UNAVAIL");
    assert_eq!(json[0]["period"]["start"], 9412);
    assert_eq!(json[0]["period"]["end"], 9426);
}

#[test]
fn test_quality_out_of_range_orbit_is_unknown() {
    let cmd = sciacal().args(["quality", "--", "-3"]).ok();
    let failed = cmd.is_err();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(!failed, "{stderr}");
    assert!(stdout.contains("-3: UNKNOWN (255)"), "{stdout}");
}

#[test]
fn test_quality_invalid_orbit() {
    let cmd = sciacal().args(["quality", "abc"]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("'abc' is not an absolute orbit number"),
        "{stderr}"
    );
}
