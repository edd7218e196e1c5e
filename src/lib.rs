#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Deep Mandelbrot zoom renderer
//!
//! A zoom into the Mandelbrot set soon runs out of `f64`: by a
//! magnification of around 10^13 neighbouring pixels have the same
//! coordinates.  Iterating every pixel in arbitrary precision works but
//! is painfully slow.  This crate does the usual two things to make a
//! deep zoom affordable.
//!
//! First, perturbation.  Only the zoom centre is iterated at high
//! precision; every pixel iterates its small offset from that
//! reference orbit in plain `f64`, rebasing onto the start of the
//! reference whenever the offset stops being trustworthy.
//!
//! Second, keyframes.  Rather than render every frame of a video, we
//! render a keyframe at twice the output resolution each time the
//! magnification doubles.  The frames in between are area-weighted
//! downscales of the keyframe, cross-faded into the next keyframe so
//! the switch doesn't show.
//!
//! Frames come out as a stream of binary PPMs, ready for ffmpeg.

#[macro_use]
extern crate failure;
extern crate crossbeam;
extern crate dashu_float;
extern crate image;
extern crate itertools;
extern crate log;
extern crate num;

pub mod compositor;
pub mod direct;
pub mod errors;
pub mod orbit;
pub mod palette;
pub mod params;
pub mod perturbation;
pub mod planes;
pub mod precision;
pub mod render;
pub mod schedule;
pub mod sink;

pub use errors::RenderError;
pub use params::{Mode, RenderParameters};
pub use precision::{BigFloat, HighPrecisionReal};
pub use render::{render, render_image, render_video};
pub use sink::{FfmpegSink, PpmSink};
