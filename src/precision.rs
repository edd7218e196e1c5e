// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The arbitrary-precision scalar.
//!
//! Deep zooms need more bits than an `f64` has for two things only:
//! the coordinates of the zoom centre, and the multiplier (the size of
//! a pixel in the complex plane).  Everything else runs at ordinary
//! precision.  The renderer is written against the `HighPrecisionReal`
//! trait so the scalar can be swapped; `BigFloat` is the real one, and
//! `f64` implements the trait too, which is handy for shallow renders
//! and for checking the perturbation code against a direct iteration.

use dashu_float::round::mode::Zero;
use dashu_float::{DBig, FBig};
use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;

use crate::errors::RenderError;

/// What the renderer needs from a high-precision real number.
pub trait HighPrecisionReal: Clone + PartialOrd + Send + Sync + fmt::Display {
    /// Parse a decimal string at the given precision (in bits).
    fn parse(s: &str, precision: usize) -> Result<Self, RenderError>;
    /// Lift an `f64` into a value of the given precision.  `v` must be
    /// finite; infinities and NaN have no high-precision counterpart.
    fn from_f64(v: f64, precision: usize) -> Self;
    /// Precision in bits.
    fn precision(&self) -> usize;
    /// `self + other`
    fn add(&self, other: &Self) -> Self;
    /// `self - other`
    fn sub(&self, other: &Self) -> Self;
    /// `self * other`
    fn mul(&self, other: &Self) -> Self;
    /// `self / other`
    fn div(&self, other: &Self) -> Self;
    /// `self` raised to a real power.  `self` must be positive.
    fn pow(&self, exponent: &Self) -> Self;
    /// Round to the nearest `f64`.
    fn to_f64(&self) -> f64;

    /// Zero at the given precision.
    fn zero(precision: usize) -> Self {
        Self::from_f64(0.0, precision)
    }

    /// `self * self`
    fn square(&self) -> Self {
        self.mul(self)
    }
}

impl HighPrecisionReal for f64 {
    fn parse(s: &str, _precision: usize) -> Result<Self, RenderError> {
        s.trim().parse::<f64>().map_err(|_| RenderError::Parse {
            what: "real number",
            value: s.to_string(),
        })
    }

    fn from_f64(v: f64, _precision: usize) -> Self {
        v
    }

    fn precision(&self) -> usize {
        53
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn mul(&self, other: &Self) -> Self {
        self * other
    }

    fn div(&self, other: &Self) -> Self {
        self / other
    }

    fn pow(&self, exponent: &Self) -> Self {
        f64::powf(*self, *exponent)
    }

    fn to_f64(&self) -> f64 {
        *self
    }
}

/// A binary floating point number with an explicit precision, backed
/// by `dashu_float::FBig`.
#[derive(Clone, Debug)]
pub struct BigFloat {
    value: FBig,
    precision: usize,
}

impl BigFloat {
    fn wrap(value: FBig, precision: usize) -> Self {
        let value = value.with_precision(precision).value();
        BigFloat { value, precision }
    }

    fn combine(&self, other: &Self, value: FBig) -> Self {
        BigFloat::wrap(value, self.precision.max(other.precision))
    }
}

impl HighPrecisionReal for BigFloat {
    /// The string goes straight from decimal to binary at the target
    /// precision; going through an `f64` first would throw away the
    /// digits that make a deep zoom possible.
    fn parse(s: &str, precision: usize) -> Result<Self, RenderError> {
        let decimal = s.trim().parse::<DBig>().map_err(|_| RenderError::Parse {
            what: "real number",
            value: s.to_string(),
        })?;
        let binary = decimal
            .with_base_and_precision::<2>(precision)
            .value()
            .with_rounding::<Zero>();
        Ok(BigFloat::wrap(binary, precision))
    }

    /// Non-finite input trips a debug assertion.  Release builds turn
    /// it into zero.
    fn from_f64(v: f64, precision: usize) -> Self {
        debug_assert!(v.is_finite(), "BigFloat::from_f64 given {}", v);
        let value = if v == 0.0 || !v.is_finite() {
            FBig::ZERO
        } else {
            FBig::try_from(v).unwrap_or(FBig::ZERO)
        };
        BigFloat::wrap(value, precision)
    }

    fn precision(&self) -> usize {
        self.precision
    }

    fn add(&self, other: &Self) -> Self {
        self.combine(other, &self.value + &other.value)
    }

    fn sub(&self, other: &Self) -> Self {
        self.combine(other, &self.value - &other.value)
    }

    fn mul(&self, other: &Self) -> Self {
        self.combine(other, &self.value * &other.value)
    }

    fn div(&self, other: &Self) -> Self {
        self.combine(other, &self.value / &other.value)
    }

    fn pow(&self, exponent: &Self) -> Self {
        self.combine(exponent, self.value.powf(&exponent.value))
    }

    fn to_f64(&self) -> f64 {
        self.value.to_f64().value()
    }
}

impl PartialEq for BigFloat {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl fmt::Display for BigFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
