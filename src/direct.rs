// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The plain escape-time iteration, with no perturbation and no
//! arbitrary precision.  It falls apart somewhere around a
//! magnification of 10^13, but above that it's the ground truth the
//! perturbation iterator has to agree with, so the tests lean on it.

use num::Complex;

use crate::palette::{Palette, IN_SET};
use crate::perturbation::PixelOutcome;
use crate::planes::PixelPlane;

/// Iterate z ← z² + c from zero.  Reports the same (iteration, z)
/// pair the perturbation iterator does: the iteration counter is
/// the number of completed steps before the escaping one.
pub fn iterate(c: Complex<f64>, max_iterations: usize, radius: f64) -> PixelOutcome {
    let radius_sq = radius * radius;
    let mut z = Complex::new(0.0, 0.0);
    for iteration in 0..max_iterations {
        z = z * z + c;
        if z.norm_sqr() > radius_sq {
            return PixelOutcome::Escaped { iteration, z };
        }
    }
    PixelOutcome::Bounded
}

/// Render a whole image, single threaded, directly in f64.
pub fn render(
    plane: &PixelPlane,
    center: Complex<f64>,
    max_iterations: usize,
    radius: f64,
    palette: &Palette,
) -> Vec<u8> {
    let mut pixels = vec![0u8; plane.len() * 3];
    for (index, rgb) in pixels.chunks_mut(3).enumerate() {
        let c = center + plane.pixel_to_offset(&plane.index_to_pixel(index));
        let color = match iterate(c, max_iterations, radius) {
            PixelOutcome::Escaped { iteration, z } => palette.color(iteration, z),
            PixelOutcome::Bounded => IN_SET,
        };
        rgb.copy_from_slice(&color);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        assert_eq!(iterate(Complex::new(0.0, 0.0), 500, 100.0), PixelOutcome::Bounded);
    }

    #[test]
    fn two_escapes_on_the_fourth_step() {
        // 2, 6, 38, 1446
        match iterate(Complex::new(2.0, 0.0), 500, 100.0) {
            PixelOutcome::Escaped { iteration, z } => {
                assert_eq!(iteration, 3);
                assert_eq!(z, Complex::new(1446.0, 0.0));
            }
            PixelOutcome::Bounded => panic!("2 + 0i escaped"),
        }
    }

    #[test]
    fn render_colors_the_interior_black() {
        let plane = PixelPlane::new(8, 8, 0.01);
        let pixels = render(&plane, Complex::new(-0.2, 0.0), 200, 100.0, &Palette::default());
        assert_eq!(pixels.len(), 8 * 8 * 3);
        assert!(pixels.iter().all(|&v| v == 0));
    }
}
