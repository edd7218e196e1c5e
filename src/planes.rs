// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PixelPlane struct, which describes a relationship
//! between a rectangle on the integral plane, with an origin at 0,0
//! in the upper left corner, and a small neighborhood of the complex
//! plane around the zoom centre.
//!
//! Note that the complex side of the mapping is *relative*: the
//! absolute centre of a deep zoom doesn't fit in an f64, but the
//! distance from the centre to any pixel on screen does.  That
//! distance is all the perturbation iterator needs.
use num::Complex;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the x, y of a pixel in a region.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels to their offset from the centre of the image, in
/// complex-plane units.  The imaginary axis points up, so rows further
/// down the image have more negative offsets.
#[derive(Debug, Clone)]
pub struct PixelPlane {
    /// Size of the pixel grid.
    pub integral_plane: IntegralPlane,
    /// Width (and height) of one pixel in the complex plane.
    pub spacing: f64,
}

impl PixelPlane {
    /// Constructor.  Takes the size of the image and the size of one
    /// pixel in the complex plane.
    pub fn new(width: usize, height: usize, spacing: f64) -> PixelPlane {
        PixelPlane {
            integral_plane: IntegralPlane(width, height),
            spacing,
        }
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Given the linear offset of a pixel in a row-major buffer,
    /// return its column and row.
    pub fn index_to_pixel(&self, index: usize) -> Pixel {
        Pixel(index % self.integral_plane.0, index / self.integral_plane.0)
    }

    /// The offset of a pixel's centre from the image centre.  Pixel
    /// centres sit half a pixel in from the grid lines, so for an even
    /// sized image no pixel lands exactly on the centre.
    pub fn pixel_to_offset(&self, pixel: &Pixel) -> Complex<f64> {
        let (width, height) = (self.integral_plane.0 as f64, self.integral_plane.1 as f64);
        Complex::new(
            self.spacing * ((pixel.0 as f64) - width * 0.5 + 0.5),
            -self.spacing * ((pixel.1 as f64) - height * 0.5 + 0.5),
        )
    }
}
