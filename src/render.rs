// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The top-level image and video loops.

use log::info;
use std::io::Write;
use std::mem;
use std::time::Instant;

use crate::compositor::{compose, FrameAccumulator, KeyframeBuffer};
use crate::errors::RenderError;
use crate::palette::Palette;
use crate::params::{Mode, RenderParameters};
use crate::perturbation::KeyframeRenderContext;
use crate::precision::{BigFloat, HighPrecisionReal};
use crate::schedule::ZoomSchedule;
use crate::sink::PpmSink;

/// Render the zoom centre at `multiplier` into `buffer`, at the
/// buffer's size.
pub fn render_keyframe<R: HighPrecisionReal>(
    params: &RenderParameters,
    center: &(R, R),
    multiplier: &R,
    buffer: &mut KeyframeBuffer,
) -> Result<(), RenderError> {
    let context = KeyframeRenderContext::new(
        center,
        multiplier,
        buffer.width,
        buffer.height,
        params.iterations,
        params.radius,
        Palette::default(),
    );
    context.render(&mut buffer.pixels, params.threads)
}

/// Render a single still at the start zoom and write it to `sink`.
pub fn render_image<R: HighPrecisionReal, W: Write>(
    params: &RenderParameters,
    sink: &mut PpmSink<W>,
) -> Result<(), RenderError> {
    params.validate()?;
    let center: (R, R) = params.center()?;
    let multiplier: R = params.start_multiplier()?;

    let started = Instant::now();
    let mut image = KeyframeBuffer::new(params.width, params.height);
    render_keyframe(params, &center, &multiplier, &mut image)?;
    info!(
        "time taken for image to render: {:.4}s",
        started.elapsed().as_secs_f64()
    );
    sink.write_frame(&image.pixels, image.width, image.height)
}

/// Render the whole zoom and write every frame to `sink`, in order.
///
/// Two keyframes are alive at any time.  Each pass of the outer loop
/// retires the older one, renders a new one at half the multiplier,
/// and then emits every frame the pair can serve.
pub fn render_video<R: HighPrecisionReal, W: Write>(
    params: &RenderParameters,
    sink: &mut PpmSink<W>,
) -> Result<(), RenderError> {
    params.validate()?;
    if params.mode != Mode::Video {
        return Err(RenderError::config("render_video needs a video request"));
    }
    let frames = params
        .frames
        .ok_or_else(|| RenderError::config("a video needs a frame count"))?;
    let center: (R, R) = params.center()?;
    let mut schedule = ZoomSchedule::new(
        params.start_multiplier::<R>()?,
        params.end_multiplier::<R>()?,
        frames,
    );

    let (width, height) = (params.width, params.height);
    let mut current = KeyframeBuffer::for_frame(width, height);
    let mut next = KeyframeBuffer::for_frame(width, height);
    let mut accumulator = FrameAccumulator::new(width, height);
    let mut frame = vec![0u8; width * height * 3];

    let started = Instant::now();
    let mut keyframes = 1;
    render_keyframe(params, &center, &schedule.keyframe_multiplier, &mut next)?;
    info!(
        "keyframe 1 done rendering! {:.3}s",
        started.elapsed().as_secs_f64()
    );

    while !schedule.is_finished() {
        mem::swap(&mut current, &mut next);

        let keyframe_started = Instant::now();
        render_keyframe(params, &center, &schedule.half_keyframe_multiplier, &mut next)?;
        keyframes += 1;
        info!(
            "keyframe {} done rendering! {:.3}s",
            keyframes,
            keyframe_started.elapsed().as_secs_f64()
        );

        let frames_started = Instant::now();
        let first = schedule.frame_index;
        while schedule.in_current_keyframe() {
            compose(
                &mut accumulator,
                schedule.zoom_fraction(),
                &current,
                &next,
                params.threads,
            )?;
            accumulator.quantize(&mut frame)?;
            sink.write_frame(&frame, width, height)?;
            schedule.advance_frame();
        }
        if schedule.frame_index > first {
            info!(
                "frames {}-{} done rendering! {:.3}s",
                first + 1,
                schedule.frame_index,
                frames_started.elapsed().as_secs_f64()
            );
        }
        schedule.advance_keyframe();
    }

    info!(
        "{} frames from {} keyframes in {:.3}s",
        sink.frames(),
        keyframes,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Render `params` at full precision, whichever mode it asks for.
pub fn render<W: Write>(params: &RenderParameters, sink: &mut PpmSink<W>) -> Result<(), RenderError> {
    match params.mode {
        Mode::Image => render_image::<BigFloat, W>(params, sink),
        Mode::Video => render_video::<BigFloat, W>(params, sink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_video(frames: usize) -> RenderParameters {
        RenderParameters {
            mode: Mode::Video,
            width: 24,
            height: 16,
            iterations: 100,
            precision: 64,
            end_zoom: Some("20".to_string()),
            frames: Some(frames),
            framerate: Some(10),
            threads: 3,
            ..RenderParameters::default()
        }
    }

    fn frame_bytes(params: &RenderParameters) -> usize {
        params.width * params.height * 3
    }

    #[test]
    fn image_writes_one_frame() {
        let params = RenderParameters {
            width: 20,
            height: 10,
            iterations: 50,
            threads: 2,
            ..RenderParameters::default()
        };
        let mut sink = PpmSink::new(Vec::new());
        render_image::<f64, _>(&params, &mut sink).unwrap();
        assert_eq!(sink.frames(), 1);
        assert!(sink.finish().unwrap().len() > frame_bytes(&params));
    }

    #[test]
    fn video_writes_every_frame() {
        for &frames in &[1, 2, 9] {
            let params = small_video(frames);
            let mut sink = PpmSink::new(Vec::new());
            render_video::<BigFloat, _>(&params, &mut sink).unwrap();
            assert_eq!(sink.frames(), frames);
        }
    }

    #[test]
    fn first_frame_of_a_video_is_the_downscaled_keyframe() {
        let params = small_video(5);
        let center: (f64, f64) = params.center().unwrap();
        let multiplier: f64 = params.start_multiplier().unwrap();
        let mut keyframe = KeyframeBuffer::for_frame(24, 16);
        render_keyframe(&params, &center, &multiplier, &mut keyframe).unwrap();
        let mut accumulator = FrameAccumulator::new(24, 16);
        compose(&mut accumulator, 1.0, &keyframe, &keyframe, 1).unwrap();
        let mut expected = vec![0u8; frame_bytes(&params)];
        accumulator.quantize(&mut expected).unwrap();

        let mut sink = PpmSink::new(Vec::new());
        render_video::<f64, _>(&params, &mut sink).unwrap();
        let bytes = sink.finish().unwrap();
        let header = bytes.len() / 5 - frame_bytes(&params);
        assert_eq!(&bytes[header..header + frame_bytes(&params)], &expected[..]);
    }

    #[test]
    fn video_rejects_image_requests() {
        let mut sink = PpmSink::new(Vec::new());
        let params = RenderParameters::default();
        assert!(render_video::<f64, _>(&params, &mut sink).is_err());
        assert_eq!(sink.frames(), 0);
    }

    #[test]
    fn invalid_requests_write_nothing() {
        let params = RenderParameters {
            frames: None,
            ..small_video(3)
        };
        let mut sink = PpmSink::new(Vec::new());
        assert!(render(&params, &mut sink).is_err());
        assert!(sink.finish().unwrap().is_empty());
    }
}
