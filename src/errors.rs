// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can stop a render.  There is no recovery path for
//! any of these: a render either completes and flushes every frame,
//! or it aborts and whatever was written is garbage.

use std::io;

/// The single error type for the library.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The request doesn't describe a render we can do.
    #[fail(display = "{}", _0)]
    Configuration(String),

    /// A numeric argument could not be read.
    #[fail(display = "could not parse {} from '{}'", what, value)]
    Parse {
        /// Which argument was being read.
        what: &'static str,
        /// The text that failed to parse.
        value: String,
    },

    /// The encoder process or output file could not be opened.
    #[fail(display = "failed opening pixel sink: {}", _0)]
    SinkUnavailable(String),

    /// Writing to the sink failed partway through.
    #[fail(display = "i/o error: {}", _0)]
    Io(#[cause] io::Error),

    /// A render thread panicked; its rows are undefined.
    #[fail(display = "a render worker panicked")]
    WorkerPanicked,
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        RenderError::Io(err)
    }
}

impl RenderError {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        RenderError::Configuration(msg.into())
    }
}
