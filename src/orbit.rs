// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The reference orbit.
//!
//! One point per keyframe, the zoom centre, is iterated at full
//! precision.  Each step is rounded to an f64 and stored; the orbit
//! values are bounded by the escape radius, so nothing is lost that
//! the per-pixel iterator could use.  Every pixel of the keyframe then
//! iterates only its small offset from this orbit.

use num::Complex;

use crate::precision::HighPrecisionReal;

/// The fixed-precision trace of the zoom centre.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceOrbit {
    /// `points[n]` is z_n rounded to f64, starting with z_0 = 0.  The
    /// table always holds `escape_index + 1` entries so that the
    /// pixel iterator, which looks one step ahead, can read
    /// `points[escape_index]` before it rebases.
    pub points: Vec<Complex<f64>>,
    /// The first n for which |z_n|² exceeded the escape radius², or
    /// the iteration cap if the centre never escaped.
    pub escape_index: usize,
    /// Whether the centre escaped before the cap.
    pub escaped: bool,
}

impl ReferenceOrbit {
    /// Iterate z ← z² + c from z = 0 at the precision of `center`.
    pub fn compute<R: HighPrecisionReal>(
        center: &(R, R),
        max_iterations: usize,
        radius: f64,
    ) -> ReferenceOrbit {
        let precision = center.0.precision().max(center.1.precision());
        let radius_sq = R::from_f64(radius * radius, precision);
        let two = R::from_f64(2.0, precision);

        let mut points = Vec::with_capacity(max_iterations + 1);
        let mut re = R::zero(precision);
        let mut im = R::zero(precision);
        let mut escape_index = max_iterations;
        let mut escaped = false;

        for n in 0..max_iterations {
            points.push(Complex::new(re.to_f64(), im.to_f64()));

            let next_im = two.mul(&re).mul(&im).add(&center.1);
            let next_re = re.square().sub(&im.square()).add(&center.0);
            re = next_re;
            im = next_im;

            if re.square().add(&im.square()) > radius_sq {
                escape_index = n + 1;
                escaped = true;
                break;
            }
        }
        points.push(Complex::new(re.to_f64(), im.to_f64()));

        ReferenceOrbit {
            points,
            escape_index,
            escaped,
        }
    }
}
