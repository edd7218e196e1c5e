// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Perturbation iteration.
//!
//! Rather than iterate every pixel at hundreds of bits of precision,
//! we iterate the difference between the pixel's orbit and the
//! reference orbit of the zoom centre.  With Z the reference and
//! z = Z + δz the pixel,
//!
//! ```text
//!     δz' = δz·(δz + 2Z) + δc
//! ```
//!
//! and δz, δc are small enough to live in an f64 no matter how deep
//! the zoom.  The catch is that the f64 delta goes bad ("glitches")
//! when the true point gets smaller than the delta, or when the
//! reference runs out.  Either way we rebase: the true point becomes
//! the new delta, and the reference restarts from Z_0 = 0.

use log::debug;
use num::Complex;

use crate::errors::RenderError;
use crate::orbit::ReferenceOrbit;
use crate::palette::{Palette, Rgb, IN_SET};
use crate::planes::{Pixel, PixelPlane};
use crate::precision::HighPrecisionReal;

/// How a single pixel's iteration ended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PixelOutcome {
    /// The point left the escape radius.  `iteration` steps completed
    /// before the escaping one; `z` is where it landed.
    Escaped {
        /// Completed iterations before escape.
        iteration: usize,
        /// The escaping point.
        z: Complex<f64>,
    },
    /// The point stayed inside for the whole iteration budget.
    Bounded,
}

/// What happened on one perturbation step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Step {
    /// The true point passed the escape radius.
    Escaped(Complex<f64>),
    /// The delta was replaced with the true point and the reference
    /// index went back to zero.
    Rebased,
    /// Nothing special; keep going.
    Continued,
}

/// The two coupled values a pixel carries between steps.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PerturbationState {
    /// Offset of the pixel's orbit from the reference orbit.
    pub dz: Complex<f64>,
    /// Position in the reference orbit.
    pub ref_idx: usize,
}

impl Default for PerturbationState {
    fn default() -> Self {
        PerturbationState {
            dz: Complex::new(0.0, 0.0),
            ref_idx: 0,
        }
    }
}

impl PerturbationState {
    /// Advance one iteration.  `ref_idx` must be below the orbit's
    /// escape index on entry, which every rebase guarantees.
    #[inline]
    pub fn step(&mut self, orbit: &ReferenceOrbit, dc: Complex<f64>, radius_sq: f64) -> Step {
        let reference = orbit.points[self.ref_idx];
        self.dz = self.dz * (self.dz + reference + reference) + dc;
        self.ref_idx += 1;

        let z = orbit.points[self.ref_idx] + self.dz;
        let sqrlen = z.norm_sqr();
        if sqrlen > radius_sq {
            Step::Escaped(z)
        } else if sqrlen < self.dz.norm_sqr() || self.ref_idx >= orbit.escape_index {
            self.dz = z;
            self.ref_idx = 0;
            Step::Rebased
        } else {
            Step::Continued
        }
    }
}

/// Iterate a single pixel whose offset from the reference point is `dc`.
pub fn iterate_pixel(
    orbit: &ReferenceOrbit,
    dc: Complex<f64>,
    max_iterations: usize,
    radius: f64,
) -> PixelOutcome {
    let radius_sq = radius * radius;
    let mut state = PerturbationState::default();
    for iteration in 0..max_iterations {
        if let Step::Escaped(z) = state.step(orbit, dc, radius_sq) {
            return PixelOutcome::Escaped { iteration, z };
        }
    }
    PixelOutcome::Bounded
}

/// Everything needed to render one keyframe.  Built when the keyframe
/// is due and dropped when its pixels are done; nothing in here
/// outlives the keyframe.
#[derive(Debug)]
pub struct KeyframeRenderContext {
    /// The zoom centre's orbit.
    pub orbit: ReferenceOrbit,
    /// Geometry of the buffer being rendered.
    pub plane: PixelPlane,
    /// Iteration cap.
    pub max_iterations: usize,
    /// Escape radius.
    pub radius: f64,
    /// Colours for escaped points.
    pub palette: Palette,
}

impl KeyframeRenderContext {
    /// Compute the reference orbit for `center` and set up a
    /// `width` × `height` grid whose pixels are `multiplier` apart.
    pub fn new<R: HighPrecisionReal>(
        center: &(R, R),
        multiplier: &R,
        width: usize,
        height: usize,
        max_iterations: usize,
        radius: f64,
        palette: Palette,
    ) -> KeyframeRenderContext {
        let orbit = ReferenceOrbit::compute(center, max_iterations, radius);
        debug!(
            "reference orbit at ({}, {}): {} points, escape index {}",
            center.0,
            center.1,
            orbit.points.len(),
            orbit.escape_index
        );
        KeyframeRenderContext {
            orbit,
            plane: PixelPlane::new(width, height, multiplier.to_f64()),
            max_iterations,
            radius,
            palette,
        }
    }

    /// Iterate one pixel.
    pub fn pixel(&self, pixel: &Pixel) -> PixelOutcome {
        let dc = self.plane.pixel_to_offset(pixel);
        iterate_pixel(&self.orbit, dc, self.max_iterations, self.radius)
    }

    /// Colour one pixel.
    pub fn color(&self, pixel: &Pixel) -> Rgb {
        match self.pixel(pixel) {
            PixelOutcome::Escaped { iteration, z } => self.palette.color(iteration, z),
            PixelOutcome::Bounded => IN_SET,
        }
    }

    /// Fill `pixels` (RGB, row major) with the whole image.  The rows
    /// are split into one contiguous band per thread; pixels don't
    /// depend on each other, so the only synchronisation is the join
    /// at the end of the scope.
    pub fn render(&self, pixels: &mut [u8], threads: usize) -> Result<(), RenderError> {
        if pixels.len() != self.plane.len() * 3 {
            return Err(RenderError::config(format!(
                "pixel buffer holds {} bytes, a {}x{} image needs {}",
                pixels.len(),
                self.plane.integral_plane.0,
                self.plane.integral_plane.1,
                self.plane.len() * 3
            )));
        }
        if self.plane.is_empty() {
            return Ok(());
        }

        let width = self.plane.integral_plane.0;
        let height = self.plane.integral_plane.1;
        let threads = threads.max(1).min(height);
        let rows_per_band = (height + threads - 1) / threads;

        crossbeam::scope(|spawner| {
            for (band, chunk) in pixels.chunks_mut(rows_per_band * width * 3).enumerate() {
                let first = band * rows_per_band * width;
                spawner.spawn(move |_| self.render_span(chunk, first));
            }
        })
        .map_err(|_| RenderError::WorkerPanicked)
    }

    fn render_span(&self, chunk: &mut [u8], first: usize) {
        for (i, rgb) in chunk.chunks_mut(3).enumerate() {
            let pixel = self.plane.index_to_pixel(first + i);
            rgb.copy_from_slice(&self.color(&pixel));
        }
    }
}
