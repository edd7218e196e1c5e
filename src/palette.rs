// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Smooth colouring of escaped points.
//!
//! Two ingredients make the bands disappear: a large escape radius,
//! and turning the discrete iteration count into a continuous one
//! using how far past the radius the point landed.  The continuous
//! value then walks a cyclic palette with linear interpolation
//! between neighbouring entries.

use num::{clamp, Complex};

/// RGB triple.
pub type Rgb = [u8; 3];

/// Black, for points that never escape.
pub const IN_SET: Rgb = [0, 0, 0];

const DEFAULT_PALETTE: [[f64; 3]; 12] = [
    [255.0, 0.0, 0.0],
    [0.0, 0.0, 0.0],
    [255.0, 255.0, 0.0],
    [255.0, 255.0, 255.0],
    [0.0, 255.0, 0.0],
    [0.0, 0.0, 0.0],
    [0.0, 255.0, 255.0],
    [255.0, 255.0, 255.0],
    [0.0, 0.0, 255.0],
    [0.0, 0.0, 0.0],
    [255.0, 0.0, 255.0],
    [255.0, 255.0, 255.0],
];

/// Iterations per palette entry.
const ITERATIONS_PER_ENTRY: f64 = 40.0;

/// A cyclic palette indexed by smoothed iteration count.
#[derive(Clone, Debug)]
pub struct Palette {
    entries: Vec<[f64; 3]>,
    stretch: f64,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            entries: DEFAULT_PALETTE.to_vec(),
            stretch: ITERATIONS_PER_ENTRY,
        }
    }
}

impl Palette {
    /// Number of entries before the palette repeats.
    pub fn period(&self) -> usize {
        self.entries.len()
    }

    /// The continuous palette position of a point that escaped after
    /// `iteration` steps landing at `z`.
    pub fn smooth(&self, iteration: usize, z: Complex<f64>) -> f64 {
        (iteration as f64 + 2.0 - z.norm_sqr().ln().log2()) / self.stretch
    }

    /// Colour for a continuous palette position.  Positions one period
    /// apart give identical colours, negative positions included.
    pub fn sample(&self, smooth: f64) -> Rgb {
        let whole = smooth.floor();
        let lerp = smooth - whole;
        let count = self.entries.len() as i64;
        let lookup0 = (whole as i64).rem_euclid(count) as usize;
        let lookup1 = (lookup0 + 1) % self.entries.len();
        let (a, b) = (self.entries[lookup0], self.entries[lookup1]);
        let mut rgb = [0u8; 3];
        for c in 0..3 {
            rgb[c] = clamp(a[c] + (b[c] - a[c]) * lerp, 0.0, 255.0) as u8;
        }
        rgb
    }

    /// Colour an escaped point.
    pub fn color(&self, iteration: usize, z: Complex<f64>) -> Rgb {
        self.sample(self.smooth(iteration, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_hit_exactly() {
        let p = Palette::default();
        assert_eq!(p.sample(0.0), [255, 0, 0]);
        assert_eq!(p.sample(2.0), [255, 255, 0]);
        assert_eq!(p.sample(8.0), [0, 0, 255]);
    }

    #[test]
    fn midpoints_interpolate() {
        let p = Palette::default();
        // halfway from red to black
        assert_eq!(p.sample(0.5), [127, 0, 0]);
        // halfway from magenta to white
        assert_eq!(p.sample(10.5), [255, 127, 255]);
    }

    #[test]
    fn palette_wraps_without_a_seam() {
        let p = Palette::default();
        // between the last entry (white) and the first (red)
        assert_eq!(p.sample(11.5), [255, 127, 127]);
    }

    #[test]
    fn colors_cycle_with_the_palette_period() {
        let p = Palette::default();
        let period = p.period() as f64;
        for &s in &[0.25, 3.75, 7.5, 11.125, -2.5] {
            assert_eq!(p.sample(s), p.sample(s + period), "smooth = {}", s);
            assert_eq!(p.sample(s), p.sample(s + 3.0 * period), "smooth = {}", s);
        }
    }

    #[test]
    fn color_is_stable() {
        let p = Palette::default();
        let z = Complex::new(123.0, -45.0);
        assert_eq!(p.color(77, z), p.color(77, z));
    }

    #[test]
    fn smooth_increases_with_iteration() {
        let p = Palette::default();
        let z = Complex::new(150.0, 0.0);
        assert!(p.smooth(11, z) > p.smooth(10, z));
        assert!((p.smooth(50, z) - p.smooth(10, z) - 1.0).abs() < 1e-12);
    }
}
