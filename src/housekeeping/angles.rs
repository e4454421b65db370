// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Azimuth and elevation scan mirror angles.

use crate::lv0::{Mds0Aux, AUX_SYNC, NUM_LV0_AUX_BCP, NUM_LV0_AUX_PMTC_FRAME};

/// Degrees per encoder count.
const SCALE_FACTOR: f64 = 360.0 / 640000.0;

/// Encoder offsets (azimuth, elevation) in degrees. They depend on which of
/// the two mirror configurations was active.
fn encoder_offsets(config_id: u8) -> (f64, f64) {
    if config_id % 2 == 1 {
        (-108.18143, -19.2340)
    } else {
        (-18.18943, -109.2425)
    }
}

/// Azimuth (ASM) and elevation (ESM) scan mirror angles of every BCP of an
/// auxiliary packet. Angles of BCPs without a valid sync word, or with a
/// zero encoder count, are NaN.
pub fn scan_angles(aux: &Mds0Aux) -> (Vec<f32>, Vec<f32>) {
    let (azi_off, ele_off) = encoder_offsets(aux.data_hdr.config_id());
    let n = NUM_LV0_AUX_PMTC_FRAME * NUM_LV0_AUX_BCP;
    let mut asm = Vec::with_capacity(n);
    let mut esm = Vec::with_capacity(n);
    for bcp in aux.frames.iter().flat_map(|f| f.bcp.iter()) {
        let (mut a, mut e) = (f32::NAN, f32::NAN);
        if bcp.sync == AUX_SYNC {
            let azi = bcp.azi_encode_cntr();
            let ele = bcp.ele_encode_cntr();
            if azi != 0 {
                a = (azi_off + SCALE_FACTOR * f64::from(azi)) as f32;
            }
            if ele != 0 {
                e = (ele_off + SCALE_FACTOR * f64::from(ele)) as f32;
            }
        }
        asm.push(a);
        esm.push(e);
    }
    (asm, esm)
}

/// Average scan mirror angles over the auxiliary packets of a state. Only
/// BCPs where both angles are valid contribute. NaN when no BCP does.
pub fn state_angles(aux: &[Mds0Aux]) -> (f32, f32) {
    let mut count = 0u32;
    let (mut asm_sum, mut esm_sum) = (0.0f64, 0.0f64);
    for packet in aux {
        let (asm, esm) = scan_angles(packet);
        for (a, e) in asm.into_iter().zip(esm) {
            if a.is_normal() && e.is_normal() {
                count += 1;
                asm_sum += f64::from(a);
                esm_sum += f64::from(e);
            }
        }
    }
    if count == 0 {
        (f32::NAN, f32::NAN)
    } else {
        (
            (asm_sum / f64::from(count)) as f32,
            (esm_sum / f64::from(count)) as f32,
        )
    }
}
