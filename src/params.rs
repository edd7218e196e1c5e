// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! What to render.  High-precision values are kept as the strings the
//! user typed, and only parsed once the precision they're to be parsed
//! at is known.

use std::fmt;
use std::str::FromStr;

use crate::errors::RenderError;
use crate::precision::{BigFloat, HighPrecisionReal};
use crate::schedule::base_multiplier;

/// Below this the pixel deltas are finer than the centre.
pub const MIN_PRECISION: usize = 53;

/// Still image or zoom video.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Mode {
    /// One frame at the start zoom.
    Image,
    /// A zoom from the start zoom to the end zoom.
    Video,
}

impl FromStr for Mode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Mode::Image),
            "video" => Ok(Mode::Video),
            _ => Err(RenderError::config(format!(
                "unrecognized format '{}', supported formats are ['image', 'video']",
                s
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Image => write!(f, "image"),
            Mode::Video => write!(f, "video"),
        }
    }
}

/// A complete render request.
#[derive(Clone, Debug)]
pub struct RenderParameters {
    /// Image or video.
    pub mode: Mode,
    /// Real part of the zoom centre, as decimal text.
    pub center_real: String,
    /// Imaginary part of the zoom centre, as decimal text.
    pub center_imag: String,
    /// Output width in pixels.
    pub width: usize,
    /// Output height in pixels.
    pub height: usize,
    /// Iteration cap.
    pub iterations: usize,
    /// Escape radius.
    pub radius: f64,
    /// Bits of precision for the centre and the multiplier.
    pub precision: usize,
    /// Magnification of the (first) frame, as decimal text.
    pub start_zoom: String,
    /// Magnification of the last frame.  Video only.
    pub end_zoom: Option<String>,
    /// Number of frames.  Video only.
    pub frames: Option<usize>,
    /// Frames per second.  Video only; only the encoder cares.
    pub framerate: Option<u32>,
    /// Worker threads.
    pub threads: usize,
}

impl Default for RenderParameters {
    fn default() -> Self {
        RenderParameters {
            mode: Mode::Image,
            center_real: "-0.75".to_string(),
            center_imag: "0.0".to_string(),
            width: 1920,
            height: 1080,
            iterations: 1000,
            radius: 100.0,
            precision: 200,
            start_zoom: "1.0".to_string(),
            end_zoom: None,
            frames: None,
            framerate: None,
            threads: 1,
        }
    }
}

fn missing(long: &str, short: char) -> RenderError {
    RenderError::config(format!(
        "format 'video' requires parameter '--{}' or '-{}' but it is missing",
        long, short
    ))
}

impl RenderParameters {
    /// Check everything that can be checked before rendering starts.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::config(format!(
                "image size {}x{} is empty",
                self.width, self.height
            )));
        }
        if self.iterations == 0 {
            return Err(RenderError::config("iteration count must be at least 1"));
        }
        if !(self.radius > 2.0) {
            return Err(RenderError::config(format!(
                "escape radius {} must be greater than 2",
                self.radius
            )));
        }
        if self.precision < MIN_PRECISION {
            return Err(RenderError::config(format!(
                "precision must be at least {} bits",
                MIN_PRECISION
            )));
        }
        if self.threads == 0 {
            return Err(RenderError::config("thread count must be at least 1"));
        }
        let _: (BigFloat, BigFloat) = self.center()?;
        let start: BigFloat = self.zoom(&self.start_zoom)?;

        if self.mode == Mode::Video {
            let end_zoom = self.end_zoom.as_ref().ok_or_else(|| missing("ezoom", 'Z'))?;
            let end: BigFloat = self.zoom(end_zoom)?;
            let frames = self.frames.ok_or_else(|| missing("frames", 'f'))?;
            let framerate = self.framerate.ok_or_else(|| missing("framerate", 'F'))?;
            if frames == 0 {
                return Err(RenderError::config("a video needs at least one frame"));
            }
            if framerate == 0 {
                return Err(RenderError::config("framerate must be at least 1"));
            }
            if end < start {
                return Err(RenderError::config(format!(
                    "ending zoom {} is shallower than starting zoom {}; zooming out is not supported",
                    end_zoom, self.start_zoom
                )));
            }
        }
        Ok(())
    }

    /// The zoom centre at the configured precision.
    pub fn center<R: HighPrecisionReal>(&self) -> Result<(R, R), RenderError> {
        Ok((
            R::parse(&self.center_real, self.precision)?,
            R::parse(&self.center_imag, self.precision)?,
        ))
    }

    fn zoom<R: HighPrecisionReal>(&self, text: &str) -> Result<R, RenderError> {
        let zoom = R::parse(text, self.precision)?;
        if zoom > R::zero(self.precision) {
            Ok(zoom)
        } else {
            Err(RenderError::config(format!("zoom {} must be positive", text)))
        }
    }

    /// Size of the buffers the perturbation renderer fills: the output
    /// size for an image, twice that for the keyframes of a video.
    pub fn render_size(&self) -> (usize, usize) {
        match self.mode {
            Mode::Image => (self.width, self.height),
            Mode::Video => (self.width * 2, self.height * 2),
        }
    }

    fn multiplier<R: HighPrecisionReal>(&self, zoom: &str) -> Result<R, RenderError> {
        let (w, h) = self.render_size();
        let base = R::from_f64(base_multiplier(w, h), self.precision);
        Ok(base.div(&self.zoom::<R>(zoom)?))
    }

    /// Pixel spacing of the first frame (or keyframe).
    pub fn start_multiplier<R: HighPrecisionReal>(&self) -> Result<R, RenderError> {
        self.multiplier(&self.start_zoom)
    }

    /// Pixel spacing of the last frame.  Video only.
    pub fn end_multiplier<R: HighPrecisionReal>(&self) -> Result<R, RenderError> {
        match self.end_zoom {
            Some(ref zoom) => self.multiplier(zoom),
            None => Err(missing("ezoom", 'Z')),
        }
    }
}
