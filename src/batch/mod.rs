// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Processing of many products in one invocation. A product that fails is
//! reported and skipped; the remaining products are still processed.


use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::error::{SciaError, Severity};

/// A product that could not be processed.
#[derive(Debug)]
pub struct ProductFailure {
    pub path: PathBuf,
    pub severity: Severity,
    pub error: SciaError,
}

/// The outcome of [`process_products`].
#[derive(Debug)]
pub struct BatchReport<T> {
    pub processed: Vec<(PathBuf, T)>,
    pub failed: Vec<ProductFailure>,
}

impl<T> BatchReport<T> {
    pub fn num_products(&self) -> usize {
        self.processed.len() + self.failed.len()
    }

    /// Did any product fail with a fatal error?
    pub fn has_fatal(&self) -> bool {
        self.failed.iter().any(|f| f.severity == Severity::Fatal)
    }
}

/// Run `f` on every product in `paths`, in order.
pub fn process_products<P, T, F>(paths: &[P], mut f: F) -> BatchReport<T>
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> Result<T, SciaError>,
{
    let mut report = BatchReport {
        processed: Vec::with_capacity(paths.len()),
        failed: vec![],
    };
    for path in paths {
        let path = path.as_ref();
        debug!("Processing '{}'", path.display());
        match f(path) {
            Ok(v) => report.processed.push((path.to_path_buf(), v)),
            Err(e) => {
                let severity = e.severity();
                match severity {
                    Severity::Fatal => error!("{}: {e}", path.display()),
                    Severity::Warning => warn!("{}: {e}", path.display()),
                    Severity::Info => info!("{}: {e}", path.display()),
                }
                report.failed.push(ProductFailure {
                    path: path.to_path_buf(),
                    severity,
                    error: e,
                });
            }
        }
    }
    if !report.failed.is_empty() {
        info!(
            "{} of {} products could not be processed",
            report.failed.len(),
            report.num_products()
        );
    }
    report
}
