// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Which multiplier each frame is rendered at, and when a new keyframe
//! is due.
//!
//! The multiplier falls geometrically from start to end, so the zoom
//! appears to move at a constant speed.  Keyframes are rendered at
//! successive halvings of the starting multiplier; a keyframe pair
//! serves every frame whose multiplier lies in
//! `(keyframe_multiplier / 2, keyframe_multiplier]`.

use crate::precision::HighPrecisionReal;

/// Complex-plane width of one pixel at zoom 1, for a `width` × `height`
/// buffer.  Chosen so the whole set fits the short side of the buffer.
pub fn base_multiplier(width: usize, height: usize) -> f64 {
    if width < height {
        0.00375 * 1080.0 / width as f64
    } else {
        0.00375 * 720.0 / height as f64
    }
}

/// The multiplier and keyframe bookkeeping for one video.
#[derive(Clone, Debug)]
pub struct ZoomSchedule<R> {
    start_multiplier: R,
    end_multiplier: R,
    /// The multiplier of the frame at `frame_index`.
    pub multiplier: R,
    /// The multiplier of the current keyframe.
    pub keyframe_multiplier: R,
    /// The multiplier of the next keyframe.
    pub half_keyframe_multiplier: R,
    /// The next frame to emit.
    pub frame_index: usize,
    /// Frames in the whole video.
    pub frames_total: usize,
}

impl<R: HighPrecisionReal> ZoomSchedule<R> {
    /// A schedule whose first keyframe, and first frame, are at
    /// `start_multiplier`.
    pub fn new(start_multiplier: R, end_multiplier: R, frames_total: usize) -> Self {
        let two = R::from_f64(2.0, start_multiplier.precision());
        ZoomSchedule {
            multiplier: start_multiplier.clone(),
            keyframe_multiplier: start_multiplier.clone(),
            half_keyframe_multiplier: start_multiplier.div(&two),
            start_multiplier,
            end_multiplier,
            frame_index: 0,
            frames_total,
        }
    }

    /// `start · (end / start)^(frame / (frames_total − 1))`.  A one
    /// frame video stays at the start.
    pub fn multiplier_at(&self, frame: usize) -> R {
        if self.frames_total <= 1 || frame == 0 {
            return self.start_multiplier.clone();
        }
        let precision = self.start_multiplier.precision();
        let exponent = R::from_f64(frame as f64 / (self.frames_total - 1) as f64, precision);
        let ratio = self.end_multiplier.div(&self.start_multiplier);
        self.start_multiplier.mul(&ratio.pow(&exponent))
    }

    /// Whether every frame has been emitted.
    pub fn is_finished(&self) -> bool {
        self.frame_index >= self.frames_total
    }

    /// Whether the frame at `frame_index` can still be made from the
    /// current keyframe pair.
    pub fn in_current_keyframe(&self) -> bool {
        !self.is_finished() && self.multiplier > self.half_keyframe_multiplier
    }

    /// Z0 for the frame at `frame_index`: the current multiplier over
    /// the keyframe's.  In (0.5, 1] while `in_current_keyframe`.
    pub fn zoom_fraction(&self) -> f64 {
        self.multiplier.div(&self.keyframe_multiplier).to_f64()
    }

    /// Move on to the next frame.
    pub fn advance_frame(&mut self) {
        self.frame_index += 1;
        if !self.is_finished() {
            self.multiplier = self.multiplier_at(self.frame_index);
        }
    }

    /// The next keyframe becomes the current one.
    pub fn advance_keyframe(&mut self) {
        let two = R::from_f64(2.0, self.half_keyframe_multiplier.precision());
        self.keyframe_multiplier = self.half_keyframe_multiplier.clone();
        self.half_keyframe_multiplier = self.half_keyframe_multiplier.div(&two);
    }
}
