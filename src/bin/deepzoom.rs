// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate deepzoom;
extern crate env_logger;
extern crate log;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use deepzoom::{FfmpegSink, Mode, PpmSink, RenderError, RenderParameters};
use env_logger::Env;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter};
use std::str::FromStr;

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const FORMAT: &str = "format";
const OUTPUT: &str = "output";
const WIDTH: &str = "width";
const HEIGHT: &str = "height";
const ITERATIONS: &str = "iters";
const REAL: &str = "real";
const IMAG: &str = "imag";
const ZOOM: &str = "zoom";
const PRECISION: &str = "prec";
const END_ZOOM: &str = "ezoom";
const FRAMES: &str = "frames";
const FRAMERATE: &str = "framerate";
const THREADS: &str = "threads";
const NO_LOG: &str = "no-log";
const FFMPEG: &str = "ffmpeg";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("deepzoom")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Renders deep zooms into the Mandelbrot set")
        .arg(
            Arg::with_name(FORMAT)
                .required(true)
                .index(1)
                .help("How the Mandelbrot set should be rendered: 'image' or 'video'"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .index(2)
                .help("Output file, or '-' for stdout"),
        )
        .arg(
            Arg::with_name(WIDTH)
                .long(WIDTH)
                .short("w")
                .takes_value(true)
                .default_value("1920")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        65_535,
                        "Could not parse width",
                        "Width must be between 1 and 65535",
                    )
                })
                .help("Width of render in pixels"),
        )
        .arg(
            Arg::with_name(HEIGHT)
                .long(HEIGHT)
                .short("h")
                .takes_value(true)
                .default_value("1080")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        65_535,
                        "Could not parse height",
                        "Height must be between 1 and 65535",
                    )
                })
                .help("Height of render in pixels"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        100_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 100000000",
                    )
                })
                .help("Iteration count"),
        )
        .arg(
            Arg::with_name(REAL)
                .long(REAL)
                .short("x")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.75")
                .help("Position on real axis"),
        )
        .arg(
            Arg::with_name(IMAG)
                .long(IMAG)
                .short("y")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0.0")
                .help("Position on imaginary axis"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("1.0")
                .help("Magnification"),
        )
        .arg(
            Arg::with_name(PRECISION)
                .long(PRECISION)
                .short("p")
                .takes_value(true)
                .default_value("200")
                .validator(|s| {
                    validate_range(
                        &s,
                        deepzoom::params::MIN_PRECISION,
                        1 << 20,
                        "Could not parse precision",
                        "Precision must be between 53 and 1048576 bits",
                    )
                })
                .help("Precision (in bits) of multiprecision variables"),
        )
        .arg(
            Arg::with_name(END_ZOOM)
                .long(END_ZOOM)
                .short("Z")
                .takes_value(true)
                .help("Ending magnification (video only)"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .long(FRAMES)
                .short("f")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        usize::max_value(),
                        "Could not parse frame count",
                        "Frame count must be at least 1",
                    )
                })
                .help("Number of frames (video only)"),
        )
        .arg(
            Arg::with_name(FRAMERATE)
                .long(FRAMERATE)
                .short("F")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1000,
                        "Could not parse framerate",
                        "Framerate must be between 1 and 1000",
                    )
                })
                .help("Framerate (video only)"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads * 4,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads * 4),
                    )
                })
                .help("Number of threads to use in renderer [default: one per CPU]"),
        )
        .arg(
            Arg::with_name(NO_LOG)
                .long(NO_LOG)
                .short("l")
                .help("Disable progress logging"),
        )
        .arg(
            Arg::with_name(FFMPEG)
                .long(FFMPEG)
                .help("Pipe frames into ffmpeg, which writes the output file"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &'static str) -> Result<Option<T>, RenderError> {
    match matches.value_of(name) {
        None => Ok(None),
        Some(s) => T::from_str(s).map(Some).map_err(|_| RenderError::Parse {
            what: name,
            value: s.to_string(),
        }),
    }
}

fn required<T: FromStr>(matches: &ArgMatches, name: &'static str) -> Result<T, RenderError> {
    value(matches, name)?.ok_or_else(|| RenderError::Configuration(format!("missing --{}", name)))
}

fn text(matches: &ArgMatches, name: &'static str) -> Result<String, RenderError> {
    required::<String>(matches, name)
}

fn parameters(matches: &ArgMatches) -> Result<RenderParameters, RenderError> {
    Ok(RenderParameters {
        mode: Mode::from_str(&text(matches, FORMAT)?)?,
        center_real: text(matches, REAL)?,
        center_imag: text(matches, IMAG)?,
        width: required(matches, WIDTH)?,
        height: required(matches, HEIGHT)?,
        iterations: required(matches, ITERATIONS)?,
        precision: required(matches, PRECISION)?,
        start_zoom: text(matches, ZOOM)?,
        end_zoom: value(matches, END_ZOOM)?,
        frames: value(matches, FRAMES)?,
        framerate: value(matches, FRAMERATE)?,
        threads: value(matches, THREADS)?.unwrap_or_else(num_cpus::get),
        ..RenderParameters::default()
    })
}

fn run(matches: &ArgMatches) -> Result<(), RenderError> {
    let params = parameters(matches)?;
    params.validate()?;
    let output = text(matches, OUTPUT)?;
    info!(
        "{} of {}x{} at ({}, {}) on {} threads",
        params.mode,
        params.width,
        params.height,
        params.center_real,
        params.center_imag,
        params.threads
    );

    if matches.is_present(FFMPEG) {
        let mut sink = PpmSink::new(FfmpegSink::spawn("ffmpeg", &params, &output)?);
        deepzoom::render(&params, &mut sink)?;
        sink.finish()?.wait()?;
    } else if output == "-" {
        let stdout = io::stdout();
        let mut sink = PpmSink::new(stdout.lock());
        deepzoom::render(&params, &mut sink)?;
        sink.finish()?;
    } else {
        let file = File::create(&output)
            .map_err(|e| RenderError::SinkUnavailable(format!("{}: {}", output, e)))?;
        let mut sink = PpmSink::new(BufWriter::new(file));
        deepzoom::render(&params, &mut sink)?;
        sink.finish()?;
    }
    Ok(())
}

fn main() {
    let matches = args();
    let filter = if matches.is_present(NO_LOG) { "warn" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    if let Err(e) = run(&matches) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
