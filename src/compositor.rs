// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Frames from keyframes.
//!
//! Rendering a deep zoom frame by frame means one full-precision render
//! per frame.  Instead we render a keyframe at twice the linear
//! resolution of the output, and every frame until the magnification
//! has doubled is just a crop-and-downscale of that keyframe.  To hide
//! the switch from one keyframe to the next, the next keyframe (which
//! covers the middle half of the current one at twice the detail) is
//! cross-faded in over the same stretch of frames.
//!
//! Both steps are done as a forward mapping: every keyframe pixel is
//! projected into the output frame as a small square and its colour is
//! added to each output pixel the square overlaps, weighted by the area
//! of the overlap.  The output is accumulated in f64 and quantized at
//! the end.
//!
//! Z0, the zoom fraction, is the current multiplier over the keyframe
//! multiplier.  It runs from 1 (the frame is the whole keyframe) down
//! towards 0.5 (the frame is the middle half, and from then on the next
//! keyframe takes over).

use itertools::iproduct;
use num::clamp;
use std::ops::Range;

use crate::errors::RenderError;

/// One rendered keyframe: RGB bytes, row major, at twice the linear
/// resolution of the output frames.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeBuffer {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl KeyframeBuffer {
    /// A black keyframe.
    pub fn new(width: usize, height: usize) -> Self {
        KeyframeBuffer {
            width,
            height,
            pixels: vec![0; width * height * 3],
        }
    }

    /// A keyframe sized for frames of `width` × `height`.
    pub fn for_frame(width: usize, height: usize) -> Self {
        KeyframeBuffer::new(width * 2, height * 2)
    }

    #[inline]
    fn rgb(&self, x: usize, y: usize) -> [f64; 3] {
        let i = 3 * (x + y * self.width);
        [
            f64::from(self.pixels[i]),
            f64::from(self.pixels[i + 1]),
            f64::from(self.pixels[i + 2]),
        ]
    }
}

/// The per-frame scratch buffer both passes add into.
#[derive(Clone, Debug)]
pub struct FrameAccumulator {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl FrameAccumulator {
    /// A zeroed accumulator for `width` × `height` frames.
    pub fn new(width: usize, height: usize) -> Self {
        FrameAccumulator {
            width,
            height,
            data: vec![0.0; width * height * 3],
        }
    }

    /// Frame width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The raw channel values.
    pub fn channels(&self) -> &[f64] {
        &self.data
    }

    /// Reset to black.
    pub fn clear(&mut self) {
        for v in self.data.iter_mut() {
            *v = 0.0;
        }
    }

    /// Round every channel to the nearest integer and clamp it into a
    /// byte.  `out` must be the same length as the accumulator.
    pub fn quantize(&self, out: &mut [u8]) -> Result<(), RenderError> {
        if out.len() != self.data.len() {
            return Err(RenderError::config(format!(
                "frame buffer holds {} bytes, a {}x{} frame needs {}",
                out.len(),
                self.width,
                self.height,
                self.data.len()
            )));
        }
        for (byte, v) in out.iter_mut().zip(self.data.iter()) {
            *byte = clamp(v.round(), 0.0, 255.0) as u8;
        }
        Ok(())
    }

    fn scale(&mut self, x: usize, y: usize, factor: f64) {
        let i = 3 * (x + y * self.width);
        for v in &mut self.data[i..i + 3] {
            *v *= factor;
        }
    }
}

/// A run of whole rows of the accumulator, starting at `first_row`.
/// During the parallel part of a scatter each thread holds one of
/// these, so no two threads can touch the same output pixel.
struct Window<'a> {
    data: &'a mut [f64],
    first_row: usize,
    width: usize,
}

impl<'a> Window<'a> {
    #[inline]
    fn add(&mut self, x: usize, y: usize, rgb: [f64; 3], weight: f64) {
        let i = 3 * (x + (y - self.first_row) * self.width);
        self.data[i] += rgb[0] * weight;
        self.data[i + 1] += rgb[1] * weight;
        self.data[i + 2] += rgb[2] * weight;
    }
}

/// The output cells (along one axis) covered by a square that starts
/// at `start` and is `size` wide, with the length of each overlap.
/// Cells outside `0..limit` are dropped.
fn overlap(start: f64, size: f64, limit: usize) -> impl Iterator<Item = (usize, f64)> + Clone {
    let end = start + size;
    let first = clamp(start.floor(), 0.0, limit as f64) as usize;
    let last = clamp(end.ceil(), first as f64, limit as f64) as usize;
    (first..last).filter_map(move |i| {
        let cell = i as f64;
        let length = end.min(cell + 1.0) - start.max(cell);
        if length > 0.0 {
            Some((i, length))
        } else {
            None
        }
    })
}

/// The output rows a source row touches: the same thing as `overlap`,
/// but as a range.
fn row_span(start: f64, size: f64, limit: usize) -> Range<usize> {
    let first = clamp(start.floor(), 0.0, limit as f64) as usize;
    let last = clamp((start + size).ceil(), first as f64, limit as f64) as usize;
    first..last
}

/// Run `splat` over every source row in `sources`, in parallel.
///
/// Source rows are cut into one contiguous band per thread, and each
/// band is given exclusive ownership of the output rows starting where
/// its first source row lands.  A source row whose footprint lies
/// entirely inside its band's output rows is scattered by that band's
/// thread.  The rest, the few rows at the bottom of each band that
/// spill into the next band's output, are scattered afterwards on the
/// calling thread.  Every output pixel therefore has exactly one
/// writer at a time, without locks.
fn scatter<S, F>(
    acc: &mut FrameAccumulator,
    sources: Range<usize>,
    threads: usize,
    span: S,
    splat: F,
) -> Result<(), RenderError>
where
    S: Fn(usize) -> Range<usize>,
    F: Fn(usize, &mut Window) + Sync,
{
    let count = sources.end.saturating_sub(sources.start);
    if count == 0 || acc.data.is_empty() {
        return Ok(());
    }
    let (width, height) = (acc.width, acc.height);
    let threads = threads.max(1).min(count);

    let starts: Vec<usize> = (0..=threads)
        .map(|k| sources.start + count * k / threads)
        .collect();
    let mut owned = vec![0; threads + 1];
    for k in 1..threads {
        owned[k] = span(starts[k]).start.max(owned[k - 1]).min(height);
    }
    owned[threads] = height;

    let mut interior: Vec<Vec<usize>> = vec![vec![]; threads];
    let mut boundary: Vec<usize> = vec![];
    for k in 0..threads {
        for y in starts[k]..starts[k + 1] {
            let rows = span(y);
            if rows.start >= rows.end || (rows.start >= owned[k] && rows.end <= owned[k + 1]) {
                interior[k].push(y);
            } else {
                boundary.push(y);
            }
        }
    }

    let mut windows = Vec::with_capacity(threads);
    let mut rest: &mut [f64] = &mut acc.data[..];
    for k in 0..threads {
        let len = (owned[k + 1] - owned[k]) * width * 3;
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
        windows.push(Window {
            data: head,
            first_row: owned[k],
            width,
        });
        rest = tail;
    }

    let splat = &splat;
    crossbeam::scope(|spawner| {
        for (mut window, rows) in windows.into_iter().zip(interior.iter()) {
            spawner.spawn(move |_| {
                for &y in rows {
                    splat(y, &mut window);
                }
            });
        }
    })
    .map_err(|_| RenderError::WorkerPanicked)?;

    let mut whole = Window {
        data: &mut acc.data[..],
        first_row: 0,
        width,
    };
    for y in boundary {
        splat(y, &mut whole);
    }
    Ok(())
}

/// Pass 1: crop the middle `z0` of the current keyframe and scale it
/// to the frame.  Each keyframe pixel becomes a square `0.5 / z0`
/// output pixels wide.
fn zoom_current(
    acc: &mut FrameAccumulator,
    z0: f64,
    current: &KeyframeBuffer,
    threads: usize,
) -> Result<(), RenderError> {
    let (width, height) = (acc.width, acc.height);
    let (w, h) = (width as f64, height as f64);
    let s = 0.5 / z0;
    let (dx, dy) = ((z0 - 1.0) * w, (z0 - 1.0) * h);

    // only the keyframe pixels inside the crop contribute
    let xlo = (w * (1.0 - z0)).floor() as usize;
    let xhi = ((w * (1.0 + z0)).ceil() as usize).min(current.width);
    let ylo = (h * (1.0 - z0)).floor() as usize;
    let yhi = ((h * (1.0 + z0)).ceil() as usize).min(current.height);

    scatter(
        acc,
        ylo..yhi,
        threads,
        |y| row_span(s * (y as f64 + dy), s, height),
        |y, window| {
            let ys: Vec<(usize, f64)> = overlap(s * (y as f64 + dy), s, height).collect();
            for x in xlo..xhi {
                let rgb = current.rgb(x, y);
                for (ix, ax) in overlap(s * (x as f64 + dx), s, width) {
                    for &(iy, ay) in &ys {
                        window.add(ix, iy, rgb, ax * ay);
                    }
                }
            }
        },
    )
}

/// Pass 2: fade in the next keyframe.  It covers the middle half of
/// the current one, so its pixels are squares `0.25 / z0` output
/// pixels wide.  Whatever pass 1 left under it is first scaled down
/// by the fraction of each output pixel it covers times the blend
/// weight, so the two passes always sum to a convex combination.
fn blend_next(
    acc: &mut FrameAccumulator,
    z0: f64,
    next: &KeyframeBuffer,
    threads: usize,
) -> Result<(), RenderError> {
    let t = 2.0 - 2.0 * z0;
    if t <= 0.0 {
        return Ok(());
    }
    let (width, height) = (acc.width, acc.height);
    let (w, h) = (width as f64, height as f64);
    let s = 0.25 / z0;
    let px = |x: usize| s * (x as f64 - w) + w * 0.5;
    let py = |y: usize| s * (y as f64 - h) + h * 0.5;

    let columns = (0..next.width).filter(|&x| px(x) + s > 0.0 && px(x) < w);
    let rows = (0..next.height).filter(|&y| py(y) + s > 0.0 && py(y) < h);
    let (xlo, xhi) = match (columns.clone().next(), columns.last()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Ok(()),
    };
    let (ylo, yhi) = match (rows.clone().next(), rows.last()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Ok(()),
    };

    // the part of the frame the next keyframe lands on, edge pixels
    // weighted by how much of them it covers
    let (cx0, cx1) = (px(xlo).max(0.0), (px(xhi) + s).min(w));
    let (cy0, cy1) = (py(ylo).max(0.0), (py(yhi) + s).min(h));
    let covered_x: Vec<(usize, f64)> = overlap(cx0, cx1 - cx0, width).collect();
    let covered_y: Vec<(usize, f64)> = overlap(cy0, cy1 - cy0, height).collect();
    for (&(iy, ay), &(ix, ax)) in iproduct!(covered_y.iter(), covered_x.iter()) {
        acc.scale(ix, iy, 1.0 - ax * ay * t);
    }

    scatter(
        acc,
        ylo..yhi + 1,
        threads,
        |y| row_span(py(y), s, height),
        |y, window| {
            let ys: Vec<(usize, f64)> = overlap(py(y), s, height).collect();
            for x in xlo..=xhi {
                let rgb = next.rgb(x, y);
                for (ix, ax) in overlap(px(x), s, width) {
                    for &(iy, ay) in &ys {
                        window.add(ix, iy, rgb, ax * ay * t);
                    }
                }
            }
        },
    )
}

/// Synthesize one frame into `acc` from the keyframe pair.  `z0` is
/// clamped to [0.5, 1]; outside that range the pair doesn't cover the
/// frame.
pub fn compose(
    acc: &mut FrameAccumulator,
    z0: f64,
    current: &KeyframeBuffer,
    next: &KeyframeBuffer,
    threads: usize,
) -> Result<(), RenderError> {
    for keyframe in &[current, next] {
        if keyframe.width != acc.width * 2 || keyframe.height != acc.height * 2 {
            return Err(RenderError::config(format!(
                "a {}x{} keyframe can't make {}x{} frames",
                keyframe.width, keyframe.height, acc.width, acc.height
            )));
        }
    }
    let z0 = clamp(z0, 0.5, 1.0);
    acc.clear();
    zoom_current(acc, z0, current, threads)?;
    blend_next(acc, z0, next, threads)
}
