// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Where finished frames go.  Every frame is written as a binary PPM,
//! one after another, which is what `ffmpeg -f image2pipe -c:v ppm`
//! reads.  The stream can go to a file, to stdout, or straight into an
//! `ffmpeg` child process.

use image::pnm::{PNMEncoder, PNMSubtype, SampleEncoding};
use image::ColorType;
use log::{debug, warn};
use std::io::{self, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

use crate::errors::RenderError;
use crate::params::{Mode, RenderParameters};

/// Writes a stream of PPM frames.
pub struct PpmSink<W: Write> {
    writer: W,
    frames: usize,
}

impl<W: Write> PpmSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        PpmSink { writer, frames: 0 }
    }

    /// Frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Append one `width` × `height` RGB frame.
    pub fn write_frame(
        &mut self,
        pixels: &[u8],
        width: usize,
        height: usize,
    ) -> Result<(), RenderError> {
        if pixels.len() != width * height * 3 {
            return Err(RenderError::config(format!(
                "frame holds {} bytes, a {}x{} frame needs {}",
                pixels.len(),
                width,
                height,
                width * height * 3
            )));
        }
        let mut encoder = PNMEncoder::new(&mut self.writer)
            .with_subtype(PNMSubtype::Pixmap(SampleEncoding::Binary));
        encoder.encode(pixels, width as u32, height as u32, ColorType::RGB(8))?;
        self.frames += 1;
        Ok(())
    }

    /// Flush, and hand back the writer.
    pub fn finish(mut self) -> Result<W, RenderError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// The ffmpeg arguments that turn a PPM stream into `output`.
pub fn ffmpeg_args(params: &RenderParameters, output: &str) -> Vec<String> {
    let mut args: Vec<String> = vec!["-f".into(), "image2pipe".into()];
    if params.mode == Mode::Video {
        args.push("-framerate".into());
        args.push(params.framerate.unwrap_or(30).to_string());
    }
    args.extend(["-c:v", "ppm", "-i", "-"].iter().map(|s| s.to_string()));
    match params.mode {
        Mode::Image => {
            args.push(output.into());
            args.extend(["-update", "true"].iter().map(|s| s.to_string()));
        }
        Mode::Video => {
            args.extend(["-c:v", "libx264", "-crf", "18", "-vf"].iter().map(|s| s.to_string()));
            args.push(format!("scale={}:{},format=yuv420p", params.width, params.height));
            args.extend(["-movflags", "+faststart"].iter().map(|s| s.to_string()));
            args.push(output.into());
        }
    }
    args.push("-y".into());
    args
}

/// A running `ffmpeg` reading frames on its stdin.
pub struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfmpegSink {
    /// Start `program` (normally `ffmpeg`) encoding into `output`.
    pub fn spawn(
        program: &str,
        params: &RenderParameters,
        output: &str,
    ) -> Result<Self, RenderError> {
        let args = ffmpeg_args(params, output);
        debug!("spawning {} {}", program, args.join(" "));
        let mut command = Command::new(program);
        command.args(&args);
        FfmpegSink::start(command, program)
    }

    fn start(mut command: Command, program: &str) -> Result<Self, RenderError> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RenderError::SinkUnavailable(format!("{}: {}", program, e)))?;
        match child.stdin.take() {
            Some(stdin) => Ok(FfmpegSink {
                child,
                stdin: Some(stdin),
            }),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(RenderError::SinkUnavailable(format!("{} has no stdin", program)))
            }
        }
    }

    /// Close the pipe and wait for the encoder to finish.
    pub fn wait(mut self) -> Result<ExitStatus, RenderError> {
        self.stdin.take();
        let status = self.child.wait()?;
        if status.success() {
            Ok(status)
        } else {
            Err(RenderError::SinkUnavailable(format!("encoder exited with {}", status)))
        }
    }

    fn pipe(&mut self) -> io::Result<&mut ChildStdin> {
        self.stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "encoder pipe is closed"))
    }
}

// A sink dropped before `wait` means the render failed.  The encoder
// is stopped rather than left to finish a truncated file.
impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            warn!("stopping encoder {} after an incomplete stream", self.child.id());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl Write for FfmpegSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pipe()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.pipe()?.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::pnm::PNMDecoder;
    use image::ImageDecoder;
    use std::io::Cursor;

    #[test]
    fn frames_are_binary_ppm() {
        let mut sink = PpmSink::new(Vec::new());
        let pixels: Vec<u8> = (0..4 * 3 * 3).map(|v| v as u8).collect();
        sink.write_frame(&pixels, 4, 3).unwrap();
        assert_eq!(sink.frames(), 1);
        let bytes = sink.finish().unwrap();
        assert_eq!(&bytes[..2], b"P6");
        assert_eq!(&bytes[bytes.len() - pixels.len()..], &pixels[..]);

        let decoder = PNMDecoder::new(Cursor::new(bytes)).unwrap();
        assert_eq!(decoder.dimensions(), (4, 3));
        assert_eq!(decoder.read_image().unwrap(), pixels);
    }

    #[test]
    fn frames_follow_each_other() {
        let mut sink = PpmSink::new(Vec::new());
        let a = vec![10u8; 2 * 2 * 3];
        let b = vec![20u8; 2 * 2 * 3];
        sink.write_frame(&a, 2, 2).unwrap();
        sink.write_frame(&b, 2, 2).unwrap();
        let bytes = sink.finish().unwrap();
        let header = bytes.len() / 2 - a.len();
        assert_eq!(bytes.len(), 2 * (header + a.len()));
        assert_eq!(&bytes[header..header + a.len()], &a[..]);
        assert_eq!(&bytes[bytes.len() - b.len()..], &b[..]);
    }

    #[test]
    fn wrong_sized_frames_are_rejected() {
        let mut sink = PpmSink::new(Vec::new());
        assert!(sink.write_frame(&[0u8; 5], 2, 2).is_err());
        assert_eq!(sink.frames(), 0);
    }

    #[test]
    fn video_arguments() {
        let params = RenderParameters {
            mode: Mode::Video,
            width: 640,
            height: 360,
            framerate: Some(24),
            ..RenderParameters::default()
        };
        let args = ffmpeg_args(&params, "zoom.mp4").join(" ");
        assert_eq!(
            args,
            "-f image2pipe -framerate 24 -c:v ppm -i - -c:v libx264 -crf 18 \
             -vf scale=640:360,format=yuv420p -movflags +faststart zoom.mp4 -y"
        );
    }

    #[test]
    fn image_arguments() {
        let args = ffmpeg_args(&RenderParameters::default(), "still.png").join(" ");
        assert_eq!(args, "-f image2pipe -c:v ppm -i - still.png -update true -y");
    }

    #[test]
    fn missing_encoder_is_a_sink_error() {
        let params = RenderParameters::default();
        match FfmpegSink::spawn("/nonexistent/ffmpeg-for-tests", &params, "out.png") {
            Err(RenderError::SinkUnavailable(_)) => (),
            Err(e) => panic!("wrong error: {}", e),
            Ok(_) => panic!("spawned a program that doesn't exist"),
        }
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn abandoned_encoder_is_stopped() {
        let mut command = Command::new("sleep");
        command.arg("30");
        let sink = FfmpegSink::start(command, "sleep").unwrap();
        let proc_entry = format!("/proc/{}", sink.child.id());
        assert!(std::path::Path::new(&proc_entry).exists());
        drop(sink);
        assert!(!std::path::Path::new(&proc_entry).exists());
    }

    #[test]
    #[cfg(unix)]
    fn finished_encoder_reports_its_status() {
        let mut sink = FfmpegSink::start(Command::new("cat"), "cat").unwrap();
        sink.write_all(b"P6").unwrap();
        assert!(sink.wait().unwrap().success());

        let mut failing = Command::new("sh");
        failing.args(&["-c", "cat > /dev/null; exit 3"]);
        let sink = FfmpegSink::start(failing, "sh").unwrap();
        match sink.wait() {
            Err(RenderError::SinkUnavailable(_)) => (),
            other => panic!("expected an encoder failure, got {:?}", other.map(|s| s.code())),
        }
    }
}
