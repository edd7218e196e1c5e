// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate deepzoom;
extern crate image;
extern crate num;
extern crate num_cpus;

use deepzoom::palette::Palette;
use deepzoom::planes::PixelPlane;
use deepzoom::schedule::base_multiplier;
use deepzoom::{direct, Mode, PpmSink, RenderParameters};
use image::pnm::PNMDecoder;
use image::ImageDecoder;
use num::Complex;
use std::io::Cursor;

fn zoom(center: (&str, &str), size: usize, frames: usize) -> RenderParameters {
    RenderParameters {
        mode: Mode::Video,
        center_real: center.0.to_string(),
        center_imag: center.1.to_string(),
        width: size,
        height: size,
        iterations: 200,
        precision: 128,
        start_zoom: "1.0".to_string(),
        end_zoom: Some("1000.0".to_string()),
        frames: Some(frames),
        framerate: Some(25),
        threads: num_cpus::get(),
        ..RenderParameters::default()
    }
}

/// Render the whole video and split the stream back into frames.
fn frames_of(params: &RenderParameters) -> Vec<Vec<u8>> {
    let mut sink = PpmSink::new(Vec::new());
    deepzoom::render(params, &mut sink).unwrap();
    let stream = sink.finish().unwrap();
    let count = params.frames.unwrap();
    assert_eq!(stream.len() % count, 0, "frames are not all the same size");
    stream
        .chunks(stream.len() / count)
        .map(|chunk| {
            let decoder = PNMDecoder::new(Cursor::new(chunk)).unwrap();
            let (width, height) = decoder.dimensions();
            assert_eq!((width as usize, height as usize), (params.width, params.height));
            decoder.read_image().unwrap()
        })
        .collect()
}

fn black_fraction(frame: &[u8]) -> f64 {
    let black = frame
        .chunks(3)
        .filter(|p| p.iter().all(|&v| v == 0))
        .count();
    black as f64 / (frame.len() / 3) as f64
}

#[test]
fn fifty_frame_zoom_into_the_neck() {
    let params = zoom(("-0.75", "0.0"), 256, 50);
    let frames = frames_of(&params);
    assert_eq!(frames.len(), 50);
    for frame in &frames {
        assert_eq!(frame.len(), 256 * 256 * 3);
    }

    // frame 0 is the first keyframe, 2x2 averaged; the keyframe should
    // agree with a plain f64 render at this depth
    let spacing = base_multiplier(512, 512);
    let plane = PixelPlane::new(512, 512, spacing);
    let reference = direct::render(
        &plane,
        Complex::new(-0.75, 0.0),
        200,
        100.0,
        &Palette::default(),
    );
    let mut close = 0;
    for y in 0..256 {
        for x in 0..256 {
            let matches = (0..3).all(|c| {
                let sum: f64 = [(0, 0), (1, 0), (0, 1), (1, 1)]
                    .iter()
                    .map(|(dx, dy)| f64::from(reference[3 * ((2 * x + dx) + (2 * y + dy) * 512) + c]))
                    .sum();
                let expected = (sum / 4.0).round() as i32;
                (i32::from(frames[0][3 * (x + y * 256) + c]) - expected).abs() <= 2
            });
            if matches {
                close += 1;
            }
        }
    }
    assert!(close as f64 > 0.98 * 256.0 * 256.0, "only {} pixels match", close);

    assert!(black_fraction(&frames[0]) > 0.05);
    assert!(black_fraction(&frames[0]) < 0.5);
    assert_ne!(frames[0], frames[49]);
}

#[test]
fn deep_frames_keep_their_detail() {
    let params = zoom(("-1.25066", "0.02012"), 128, 20);
    let frames = frames_of(&params);
    assert_eq!(frames.len(), 20);
    let last = &frames[19];
    let black = black_fraction(last);
    assert!(black > 0.02 && black < 0.98, "{} of the last frame is black", black);
    // something other than black and one flat colour
    let first = &last[..3];
    assert!(last
        .chunks(3)
        .any(|p| p != first && p.iter().any(|&v| v != 0)));
}
