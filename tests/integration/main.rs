// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod flags;
mod lv0_dump;
mod quality;
mod sdmf_dark;

use std::process::Output;
use std::str::from_utf8;

use assert_cmd::{output::OutputError, Command};

fn sciacal() -> Command {
    Command::cargo_bin("sciacal").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// The single line of stdout that holds JSON output. Log lines start with a
/// bracketed timestamp.
fn json_line(stdout: &str) -> &str {
    stdout
        .lines()
        .find(|l| l.starts_with("[{") || l.starts_with('{'))
        .unwrap_or_else(|| panic!("no JSON in output:\n{stdout}"))
}
