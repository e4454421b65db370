// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Conversion of radiance to reflectance with a solar reference spectrum.

use log::debug;
use ndarray::Array1;

use super::{
    interp::akima, require, CalibContext, CalibrationError, FileParams, Mds1c, ReflStrategy,
    Source, Stage, Srs,
};
use crate::constants::{CHANNEL_SIZE, DEG2RAD, PI};

/// Solar spectrum values at or below this are not trusted.
const MIN_SOLAR: f64 = 10e-15;

/// Speed of light expressed in the unit of the Doppler shift of the SRS.
const DOPPLER_SCALE: f64 = 500.0;

/// The solar spectrum used for a product: wavelength grid and mean
/// irradiance of all science pixels.
struct SolarSpectrum<'a> {
    srs: &'a Srs,
    mean_sun: Array1<f32>,
}

impl SolarSpectrum<'_> {
    /// The solar spectrum interpolated to the wavelengths of `rec`.
    fn fit(&self, rec: &Mds1c, doppler: bool) -> Result<Vec<f64>, CalibrationError> {
        let offs = usize::from(rec.chan_id.saturating_sub(1)) * CHANNEL_SIZE;
        let range = offs..offs + CHANNEL_SIZE;
        let wv = self.srs.wvlen_sun.as_slice().and_then(|s| s.get(range.clone()));
        let sun = self.mean_sun.as_slice().and_then(|s| s.get(range));
        let (wv, sun) = match (wv, sun) {
            (Some(wv), Some(sun)) => (wv, sun),
            _ => return Err(CalibrationError::IncompleteKeyData("SRS")),
        };
        let corr = if doppler {
            1.0 + f64::from(self.srs.dopp_shift) / DOPPLER_SCALE
        } else {
            1.0
        };
        let xa: Vec<f64> = wv.iter().map(|&w| f64::from(w) * corr).collect();
        let ya: Vec<f64> = sun.iter().map(|&s| f64::from(s)).collect();
        let x: Vec<f64> = rec.pixel_wv.iter().map(|&w| f64::from(w)).collect();
        Ok(akima(&xa, &ya, &x))
    }
}

/// Replace the signal by π·I / (μ₀·S), or NaN when either value is not a
/// normal number or the solar spectrum is too small.
fn normalise(rec: &mut Mds1c, sun: &[f64]) {
    for (nobs, mut row) in rec.pixel_val.rows_mut().into_iter().enumerate() {
        let mu0 = if rec.source == Source::Nadir {
            let sza = rec.geometry.get(nobs).map(|g| g.sun_zenith).unwrap_or(0.0);
            (f64::from(sza) * DEG2RAD).cos()
        } else {
            1.0
        };
        for (sig, &s) in row.iter_mut().zip(sun.iter()) {
            *sig = if sig.is_normal() && s.is_normal() && s > MIN_SOLAR {
                (PI * f64::from(*sig) / (mu0 * s)) as f32
            } else {
                f32::NAN
            };
        }
    }
}

/// Divide the radiance by the solar irradiance.
///
/// Both variants use the wavelength grid of the solar reference spectrum
/// selected by the SIP; the SRON variant replaces its irradiance by the
/// SDMF solar mean reference spectrum of the orbit. Only nadir states are
/// Doppler corrected and divided by the cosine of the solar zenith angle.
pub(crate) fn correct_reflectance(
    ctx: &CalibContext,
    strategy: ReflStrategy,
    params: &FileParams,
    records: &mut [Mds1c],
) -> Result<(), CalibrationError> {
    let index = usize::from(params.level_2_smr[0]);
    let srs = require(ctx.keydata.srs().get(index), "SRS")?;
    let mean_sun = match strategy {
        ReflStrategy::Atbd => srs.mean_sun.clone(),
        ReflStrategy::Sron => {
            let sdmf = ctx
                .sdmf_keydata
                .ok_or(CalibrationError::MissingDatabase(Stage::Reflectance))?;
            sdmf.smr(params.abs_orbit)?
                .ok_or(CalibrationError::NoSolarSpectrum(params.abs_orbit))?
        }
    };
    debug!("reflectance with solar spectrum {index} ({strategy:?})");
    let spectrum = SolarSpectrum { srs, mean_sun };

    for rec in records.iter_mut() {
        let sun = spectrum.fit(rec, rec.source == Source::Nadir)?;
        normalise(rec, &sun);
    }
    Ok(())
}
