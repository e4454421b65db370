// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{get_cmd_output, json_line, sciacal};

#[test]
fn test_sdmf_dark_invalid_version() {
    let cmd = sciacal()
        .env("USE_SDMF_VERSION", "5.0")
        .args(["sdmf-dark", "--orbit", "9500"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("Valid values for USE_SDMF_VERSION: 2.4, 3.0 or 3.1 (got '5.0')"),
        "{stderr}"
    );
}

#[test]
fn test_sdmf_dark_missing_database() {
    let dir = TempDir::new().unwrap();
    let cmd = sciacal()
        .env("USE_SDMF_VERSION", "2.4")
        .env("SDMF24_PATH", dir.path())
        .args(["sdmf-dark", "--orbit", "9500"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Couldn't open SDMF file"), "{stderr}");
}

#[test]
fn test_sdmf_dark_nothing_found() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("MonitorList.dat"), []).unwrap();
    let cmd = sciacal()
        .env("USE_SDMF_VERSION", "2.4")
        .env("SDMF24_PATH", dir.path())
        .args(["sdmf-dark", "--json", "--orbit", "9500", "--channel", "2"])
        .ok();
    let failed = cmd.is_err();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(!failed, "{stderr}");

    let json: serde_json::Value = serde_json::from_str(json_line(&stdout)).unwrap();
    assert_eq!(json["version"], "2.4");
    assert_eq!(json["found"], false);
    assert!(json["orbit"].is_null());
}

#[cfg(not(feature = "hdf5"))]
#[test]
fn test_sdmf_dark_needs_hdf5() {
    let cmd = sciacal()
        .env("USE_SDMF_VERSION", "3.1")
        .args(["sdmf-dark", "--orbit", "9500"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("compiled without HDF5 support"),
        "{stderr}"
    );
}
